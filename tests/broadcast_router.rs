use dtn_broadcast::events::ListenerResult;
use dtn_broadcast::{
    BroadcastRouter, Delivery, DeliveryClass, EventLog, FinalOutcome, ListenerError, Message,
    MessageListener, NodeId, RouterConfigBuilder, RouterError, RouterEvent, SimClock,
    StageVerdict,
};

fn router(host: &str, clock: &SimClock) -> BroadcastRouter {
    let config = RouterConfigBuilder::new(host).build().unwrap();
    BroadcastRouter::new(config, clock.clone()).unwrap()
}

fn message(id: &str, to: &str) -> Message {
    Message::new(id, "H0".into(), to.into(), &b"hello"[..], 0.0)
}

fn stage(router: &mut BroadcastRouter, m: &Message, from: &str) {
    let code = router.receive_message(m, &from.into()).unwrap();
    assert!(code.is_accepted(), "{} refused: {:?}", m.id, code);
}

/// Chat stage on H1 appends a suffix; the result is delivered and retained
#[test]
fn test_chat_suffix_completion() {
    let clock = SimClock::at(10.0);
    let mut h1 = router("H1", &clock);
    h1.add_application(Some("chat"), |m: Message, _: &NodeId| {
        let mut payload = m.payload.to_vec();
        payload.extend_from_slice(b"-chat");
        StageVerdict::Pass(m.with_payload(payload))
    });

    stage(&mut h1, &message("M1", "H7").with_app_id("chat"), "H2");
    clock.set(25.0);

    let completion = h1.complete_transfer("M1", &"H2".into()).unwrap();
    let finalized = completion.message();

    assert_eq!(&finalized.payload[..], b"hello-chat");
    assert_eq!(finalized.receive_time, 25.0);
    assert!(h1.ledger().contains("M1"));
    assert!(h1.has_message("M1"));
    assert_eq!(&h1.get_message("M1").unwrap().payload[..], b"hello-chat");
}

/// No app id and an empty wildcard chain: only the receive time changes
#[test]
fn test_empty_chain_identity() {
    let clock = SimClock::at(3.0);
    let mut h1 = router("H1", &clock);
    let m2 = message("m2", "H4");
    stage(&mut h1, &m2, "H2");

    let mut arrived = m2.clone();
    arrived.add_hop(&"H1".into());
    arrived.receive_time = 3.0;

    let completion = h1.complete_transfer("m2", &"H2".into()).unwrap();
    assert_eq!(completion.message(), &arrived);
    assert!(matches!(completion.outcome, FinalOutcome::Deliver(_)));
}

#[test]
fn test_unknown_transfer_is_violation() {
    let clock = SimClock::new();
    let mut h1 = router("H1", &clock);

    match h1.complete_transfer("MX", &"H9".into()) {
        Err(RouterError::ProtocolViolation {
            message_id, from, ..
        }) => {
            assert_eq!(message_id, "MX");
            assert_eq!(from, "H9");
        }
        other => panic!("expected protocol violation, got {:?}", other),
    }
}

#[test]
fn test_staging_entry_completes_once() {
    let clock = SimClock::new();
    let mut h1 = router("H1", &clock);

    for id in ["A", "B", "C"] {
        stage(&mut h1, &message(id, "H5"), "H2");
        h1.complete_transfer(id, &"H2".into()).unwrap();

        let err = h1.complete_transfer(id, &"H2".into()).unwrap_err();
        assert!(err.is_fatal());
    }
}

/// A late drop yields the arrived message, not the intermediate rewrite
#[test]
fn test_drop_falls_back_to_original() {
    let clock = SimClock::at(7.0);
    let mut h1 = router("H1", &clock);
    h1.add_application(Some("filter"), |m: Message, _: &NodeId| {
        StageVerdict::Pass(m.with_payload(&b"rewritten"[..]))
    });
    h1.add_application(Some("filter"), |_: Message, _: &NodeId| StageVerdict::Drop);

    stage(&mut h1, &message("M1", "H3").with_app_id("filter"), "H2");
    let completion = h1.complete_transfer("M1", &"H2".into()).unwrap();

    assert_eq!(&completion.message().payload[..], b"hello");
    assert_eq!(completion.message().receive_time, 7.0);
    assert_eq!(completion.class(), Some(DeliveryClass::NewDelivery));
    assert!(h1.has_message("M1"));
    assert_eq!(h1.stats().pipeline_drops, 1);
}

/// App stages run before wildcard stages
#[test]
fn test_app_chain_then_wildcard() {
    let clock = SimClock::new();
    let mut h1 = router("H1", &clock);
    h1.add_application(None, |m: Message, _: &NodeId| {
        let mut payload = m.payload.to_vec();
        payload.extend_from_slice(b"+any");
        StageVerdict::Pass(m.with_payload(payload))
    });
    h1.add_application(Some("chat"), |m: Message, _: &NodeId| {
        let mut payload = m.payload.to_vec();
        payload.extend_from_slice(b"+chat");
        StageVerdict::Pass(m.with_payload(payload))
    });

    stage(&mut h1, &message("M1", "H3").with_app_id("chat"), "H2");
    stage(&mut h1, &message("M2", "H3"), "H2");

    let chat = h1.complete_transfer("M1", &"H2".into()).unwrap();
    let plain = h1.complete_transfer("M2", &"H2".into()).unwrap();

    assert_eq!(&chat.message().payload[..], b"hello+chat+any");
    assert_eq!(&plain.message().payload[..], b"hello+any");
}

/// Messages addressed to this host, elsewhere, or retargeted are all kept
#[test]
fn test_retention_ignores_destination() {
    let clock = SimClock::new();
    let mut h1 = router("H1", &clock);
    h1.add_application(Some("route"), |m: Message, _: &NodeId| {
        StageVerdict::Pass(m.retarget("H9".into()))
    });

    stage(&mut h1, &message("self", "H1"), "H2");
    stage(&mut h1, &message("other", "H4"), "H2");
    stage(&mut h1, &message("moved", "H4").with_app_id("route"), "H2");

    for id in ["self", "other", "moved"] {
        h1.complete_transfer(id, &"H2".into()).unwrap();
        assert!(h1.has_message(id), "{} not retained", id);
        assert!(h1.ledger().contains(id));
    }
    assert_eq!(h1.message_count(), 3);
}

#[test]
fn test_repeat_completion_keeps_ledger_single() {
    let clock = SimClock::new();
    let mut h1 = router("H1", &clock);
    let m = message("M1", "H5");

    stage(&mut h1, &m, "H2");
    stage(&mut h1, &m, "H3");
    h1.complete_transfer("M1", &"H2".into()).unwrap();
    let repeat = h1.complete_transfer("M1", &"H3".into()).unwrap();

    assert_eq!(repeat.class(), Some(DeliveryClass::RepeatRelay));
    assert_eq!(h1.ledger().len(), 1);
    assert!(h1.is_delivered(&m));
}

#[test]
fn test_listener_sees_classification() {
    let clock = SimClock::new();
    let mut h1 = router("H1", &clock);
    let log = EventLog::new();
    h1.add_listener(log.clone());
    let m = message("M1", "H5");

    stage(&mut h1, &m, "H2");
    stage(&mut h1, &m, "H3");
    h1.complete_transfer("M1", &"H2".into()).unwrap();
    h1.complete_transfer("M1", &"H3".into()).unwrap();

    let flags: Vec<(DeliveryClass, bool, String)> = log
        .events()
        .into_iter()
        .filter_map(|event| match event {
            RouterEvent::Transferred { delivery, from, to, .. } => {
                assert_eq!(to, NodeId::new("H1"));
                Some((delivery.class, delivery.first_delivery, from.to_string()))
            }
            _ => None,
        })
        .collect();

    assert_eq!(
        flags,
        vec![
            (DeliveryClass::NewDelivery, true, "H2".to_string()),
            (DeliveryClass::RepeatRelay, false, "H3".to_string()),
        ]
    );
}

struct RejectingListener;

impl MessageListener for RejectingListener {
    fn name(&self) -> &str {
        "rejecting"
    }

    fn message_transferred(
        &mut self,
        _message: &Message,
        _from: &NodeId,
        _to: &NodeId,
        _delivery: Delivery,
    ) -> ListenerResult<()> {
        Err(ListenerError::failed("rejecting", "report sink closed"))
    }
}

/// A failing listener surfaces to the caller after state is committed
#[test]
fn test_listener_failure_propagates() {
    let clock = SimClock::new();
    let mut h1 = router("H1", &clock);
    let log = EventLog::new();
    h1.add_listener(RejectingListener);
    h1.add_listener(log.clone());

    stage(&mut h1, &message("M1", "H5"), "H2");
    let err = h1.complete_transfer("M1", &"H2".into()).unwrap_err();

    assert!(matches!(err, RouterError::Listener(_)));
    assert!(!err.is_fatal());
    assert!(h1.ledger().contains("M1"));
    assert!(h1.has_message("M1"));
    assert_eq!(log.kinds(), vec!["transfer_started"]);

    // The failed round left nothing queued behind
    assert!(h1.complete_transfer("M1", &"H2".into()).is_err());
    assert_eq!(log.kinds(), vec!["transfer_started"]);
}

/// Listener calls during completion see the committed ledger and buffer
#[test]
fn test_events_delivered_after_commit() {
    let clock = SimClock::new();
    let mut h1 = router("H1", &clock);
    let log = EventLog::new();
    h1.add_listener(log.clone());

    stage(&mut h1, &message("M1", "H5"), "H2");
    assert_eq!(log.kinds(), vec!["transfer_started"]);

    h1.complete_transfer("M1", &"H2".into()).unwrap();
    assert_eq!(log.kinds(), vec!["transfer_started", "transferred"]);

    match log.events().last() {
        Some(RouterEvent::Transferred { message, .. }) => {
            assert_eq!(message.path, vec![NodeId::new("H0"), NodeId::new("H1")]);
        }
        other => panic!("unexpected event {:?}", other),
    }
}
