use crate::message::{Message, NodeId};

/// Result of one transform stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageVerdict {
    /// Hand this message to the next stage
    Pass(Message),
    /// Stop the chain
    Drop,
}

/// Result of driving a whole chain
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    /// Every stage passed a message on (or the chain was empty)
    Survived(Message),
    /// A stage dropped the message
    Dropped {
        /// The message as it entered the chain
        original: Message,
        /// Position of the dropping stage in the chain
        stage: usize,
    },
}

/// A unit of application logic that may rewrite or veto a message
pub trait TransformStage {
    fn name(&self) -> &str {
        "stage"
    }

    /// Handle `message` arriving at `host`
    fn handle(&self, message: Message, host: &NodeId) -> StageVerdict;
}

impl<F> TransformStage for F
where
    F: Fn(Message, &NodeId) -> StageVerdict,
{
    fn handle(&self, message: Message, host: &NodeId) -> StageVerdict {
        self(message, host)
    }
}
