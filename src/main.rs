use anyhow::{Context, Result};
use dtn_broadcast::metrics::{install_exporter, render_metrics};
use dtn_broadcast::{
    BroadcastRouter, Clock, Delivery, ListenerError, Message, MessageListener, NodeId,
    RouterConfig, SimClock, StageVerdict,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Logs every finalized transfer
struct DeliveryPrinter;

impl MessageListener for DeliveryPrinter {
    fn name(&self) -> &str {
        "delivery-printer"
    }

    fn message_transferred(
        &mut self,
        message: &Message,
        from: &NodeId,
        to: &NodeId,
        delivery: Delivery,
    ) -> Result<(), ListenerError> {
        info!(
            "{} -> {}: {} [{}] first={} payload={:?}",
            from,
            to,
            message.id,
            delivery.class,
            delivery.first_delivery,
            String::from_utf8_lossy(&message.payload)
        );
        Ok(())
    }
}

/// Offer everything `sender` carries to `receiver`, one second per transfer
fn contact(
    sender: &mut BroadcastRouter,
    receiver: &mut BroadcastRouter,
    clock: &SimClock,
) -> Result<usize> {
    let from = sender.host().clone();
    let mut completed = 0;

    for message in sender.messages_by_queue_mode() {
        let code = receiver.receive_message(&message, &from)?;
        if !code.is_accepted() {
            println!(
                "   {} -> {}: {} refused ({})",
                from,
                receiver.host(),
                message.id,
                code.as_str()
            );
            continue;
        }

        clock.advance(1.0);
        receiver.complete_transfer(&message.id, &from)?;
        completed += 1;
    }

    Ok(completed)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    install_exporter().context("failed to install metrics exporter")?;

    let base = match std::env::args().nth(1) {
        Some(path) => RouterConfig::from_file(&path)
            .with_context(|| format!("failed to load router config from {}", path))?,
        None => RouterConfig::default(),
    };

    println!("\n╔════════════════════════════════════════════╗");
    println!("║      DTN Broadcast Router - Contact Demo   ║");
    println!("╚════════════════════════════════════════════╝\n");

    let clock = SimClock::new();
    let node = |host: &str| -> Result<BroadcastRouter> {
        let config = RouterConfig {
            host: host.into(),
            persistence_path: base.persistence_path.as_ref().map(|p| p.join(host)),
            ..base.clone()
        };
        Ok(BroadcastRouter::new(config, clock.clone())?)
    };

    let mut h1 = node("H1")?;
    let mut h2 = node("H2")?;
    let mut h3 = node("H3")?;

    for router in [&mut h1, &mut h2, &mut h3] {
        router.add_listener(DeliveryPrinter);
    }

    // H2 tags chat messages it handles
    h2.add_application(Some("chat"), |m: Message, _: &NodeId| {
        let mut payload = m.payload.to_vec();
        payload.extend_from_slice(b"-chat");
        StageVerdict::Pass(m.with_payload(payload))
    });

    // H3 answers chat messages back to their source
    h3.add_application(Some("chat"), |m: Message, _: &NodeId| {
        let source = m.from.clone();
        StageVerdict::Pass(m.retarget(source))
    });

    let now = clock.now();
    h1.create_new_message(
        Message::new("M1", "H1".into(), "H3".into(), &b"hello"[..], now).with_app_id("chat"),
    )?;
    h1.create_new_message(Message::new("M2", "H1".into(), "H2".into(), &b"status"[..], now))?;
    h1.create_new_message(
        Message::new("M3", "H1".into(), "H3".into(), &b"short-lived"[..], now).with_ttl(1),
    )?;
    println!("📨 H1 created {} messages\n", h1.message_count());

    println!("📡 Contact H1 -> H2");
    let n = contact(&mut h1, &mut h2, &clock)?;
    println!("   {} transfers completed\n", n);

    println!("📡 Contact H2 -> H3");
    let n = contact(&mut h2, &mut h3, &clock)?;
    println!("   {} transfers completed\n", n);

    println!("📡 Contact H3 -> H1");
    let n = contact(&mut h3, &mut h1, &clock)?;
    println!("   {} transfers completed\n", n);

    clock.advance(120.0);
    for router in [&mut h1, &mut h2, &mut h3] {
        let expired = router.drop_expired()?;
        if !expired.is_empty() {
            println!("⏱  {} dropped expired {:?}", router.host(), expired);
        }
    }

    println!("\n📊 Statistics at t={}s:", clock.now());
    for router in [&h1, &h2, &h3] {
        println!(
            "   {}: {} buffered, {} delivered ids",
            router.host(),
            router.message_count(),
            router.ledger().len()
        );
        println!("      {}", router.stats());
    }

    if let Some(rendered) = render_metrics() {
        println!("\n📈 Metrics:\n{}", rendered);
    }

    Ok(())
}
