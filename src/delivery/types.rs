use serde::{Deserialize, Serialize};

/// How a completed transfer relates to earlier deliveries at this node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryClass {
    /// First time this id is delivered here
    NewDelivery,
    /// The id was already in the ledger; the node is relaying a repeat
    RepeatRelay,
    /// An application stage pointed the message at another destination
    RetargetedPassthrough,
}

impl DeliveryClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryClass::NewDelivery => "new_delivery",
            DeliveryClass::RepeatRelay => "repeat_relay",
            DeliveryClass::RetargetedPassthrough => "retargeted_passthrough",
        }
    }
}

impl std::fmt::Display for DeliveryClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the boolean first-delivery flag handed to listeners is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryFlagMode {
    /// True only for [`DeliveryClass::NewDelivery`]
    #[default]
    Classified,
    /// Always true, whatever the class
    AlwaysAsserted,
}

/// Delivery indication passed to listeners on transfer completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub class: DeliveryClass,
    pub first_delivery: bool,
}

impl Delivery {
    pub fn new(class: DeliveryClass, mode: DeliveryFlagMode) -> Self {
        let first_delivery = match mode {
            DeliveryFlagMode::Classified => class == DeliveryClass::NewDelivery,
            DeliveryFlagMode::AlwaysAsserted => true,
        };
        Self {
            class,
            first_delivery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classified_flag() {
        let mode = DeliveryFlagMode::Classified;
        assert!(Delivery::new(DeliveryClass::NewDelivery, mode).first_delivery);
        assert!(!Delivery::new(DeliveryClass::RepeatRelay, mode).first_delivery);
        assert!(!Delivery::new(DeliveryClass::RetargetedPassthrough, mode).first_delivery);
    }

    #[test]
    fn test_always_asserted_flag() {
        let delivery = Delivery::new(DeliveryClass::RepeatRelay, DeliveryFlagMode::AlwaysAsserted);
        assert!(delivery.first_delivery);
        assert_eq!(delivery.class, DeliveryClass::RepeatRelay);
    }
}
