use crate::message::{Message, NodeId};
use crate::pipeline::types::{ChainOutcome, StageVerdict, TransformStage};
use std::collections::HashMap;

type BoxedStage = Box<dyn TransformStage>;

#[derive(Default)]
pub struct ApplicationPipeline {
    by_app: HashMap<String, Vec<BoxedStage>>,
    wildcard: Vec<BoxedStage>,
}

impl ApplicationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage to the chain for `app_id`, or to the wildcard chain when `None`
    pub fn register(&mut self, app_id: Option<&str>, stage: impl TransformStage + 'static) {
        let stage: BoxedStage = Box::new(stage);
        match app_id {
            Some(id) => self.by_app.entry(id.to_string()).or_default().push(stage),
            None => self.wildcard.push(stage),
        }
    }

    /// Ordered chain for `app_id`: its own stages, then the wildcard stages
    pub fn chain_for<'a>(
        &'a self,
        app_id: Option<&str>,
    ) -> impl Iterator<Item = &'a dyn TransformStage> + 'a {
        app_id
            .and_then(|id| self.by_app.get(id))
            .into_iter()
            .flatten()
            .chain(self.wildcard.iter())
            .map(|stage| -> &'a dyn TransformStage { &**stage })
    }

    pub fn chain_len(&self, app_id: Option<&str>) -> usize {
        self.chain_for(app_id).count()
    }

    /// Drive `message` through its chain at `host`
    pub fn run(&self, message: Message, host: &NodeId) -> ChainOutcome {
        let app_id = message.app_id.clone();
        if self.chain_len(app_id.as_deref()) == 0 {
            return ChainOutcome::Survived(message);
        }

        let original = message.clone();
        let mut current = message;

        for (index, stage) in self.chain_for(app_id.as_deref()).enumerate() {
            match stage.handle(current, host) {
                StageVerdict::Pass(next) => current = next,
                StageVerdict::Drop => {
                    tracing::debug!(
                        "Stage {} ({}) dropped message {} at {}",
                        index,
                        stage.name(),
                        original.id,
                        host
                    );
                    return ChainOutcome::Dropped {
                        original,
                        stage: index,
                    };
                }
            }
        }

        ChainOutcome::Survived(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn message(app: Option<&str>) -> Message {
        let m = Message::new("M1", "H1".into(), "H9".into(), &b"hi"[..], 0.0);
        match app {
            Some(app) => m.with_app_id(app),
            None => m,
        }
    }

    fn append(suffix: &'static str) -> impl Fn(Message, &NodeId) -> StageVerdict {
        move |m: Message, _: &NodeId| {
            let mut payload = m.payload.to_vec();
            payload.extend_from_slice(suffix.as_bytes());
            StageVerdict::Pass(m.with_payload(payload))
        }
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let pipeline = ApplicationPipeline::new();
        let m = message(Some("chat"));

        assert_eq!(
            pipeline.run(m.clone(), &"H2".into()),
            ChainOutcome::Survived(m)
        );
    }

    #[test]
    fn test_stages_run_in_order() {
        let mut pipeline = ApplicationPipeline::new();
        pipeline.register(Some("chat"), append("-a"));
        pipeline.register(Some("chat"), append("-b"));
        pipeline.register(None, append("-w"));

        match pipeline.run(message(Some("chat")), &"H2".into()) {
            ChainOutcome::Survived(m) => assert_eq!(&m.payload[..], b"hi-a-b-w"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_message_without_app_gets_wildcard_only() {
        let mut pipeline = ApplicationPipeline::new();
        pipeline.register(Some("chat"), append("-chat"));
        pipeline.register(None, append("-w"));

        assert_eq!(pipeline.chain_len(None), 1);
        assert_eq!(pipeline.chain_len(Some("chat")), 2);
        assert_eq!(pipeline.chain_len(Some("other")), 1);

        match pipeline.run(message(None), &"H2".into()) {
            ChainOutcome::Survived(m) => assert_eq!(&m.payload[..], b"hi-w"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_drop_stops_chain_and_keeps_original() {
        let calls = Rc::new(Cell::new(0));
        let after = calls.clone();

        let mut pipeline = ApplicationPipeline::new();
        pipeline.register(Some("chat"), append("-a"));
        pipeline.register(Some("chat"), |_: Message, _: &NodeId| StageVerdict::Drop);
        pipeline.register(Some("chat"), move |m: Message, _: &NodeId| {
            after.set(after.get() + 1);
            StageVerdict::Pass(m)
        });

        let m = message(Some("chat"));
        let outcome = pipeline.run(m.clone(), &"H2".into());

        assert_eq!(
            outcome,
            ChainOutcome::Dropped {
                original: m,
                stage: 1
            }
        );
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_stage_sees_host() {
        let mut pipeline = ApplicationPipeline::new();
        pipeline.register(None, |m: Message, host: &NodeId| {
            StageVerdict::Pass(m.retarget(host.clone()))
        });

        match pipeline.run(message(None), &"H7".into()) {
            ChainOutcome::Survived(m) => assert_eq!(m.to, NodeId::new("H7")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
