use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use broadcast_engine::{
    ChannelEventSink, EngineConfig, EngineEvent, EngineHandle, EnhanceError, Enhancer,
};
use pretty_assertions::assert_eq;

const WAIT: Duration = Duration::from_secs(5);

struct UnavailableEnhancer;

#[async_trait]
impl Enhancer for UnavailableEnhancer {
    async fn enhance(&self, _text: &str) -> Result<String, EnhanceError> {
        Err(EnhanceError::Timeout)
    }
}

fn start_engine() -> (EngineHandle, Receiver<EngineEvent>) {
    broadcast_logging::initialize_for_tests();
    let (tx, rx) = channel();
    let config = EngineConfig {
        simulation_interval: Duration::from_millis(5),
        pairing_delay: Duration::from_millis(5),
        simulation_seed: Some(11),
        ..EngineConfig::default()
    };
    let engine = EngineHandle::with_enhancer(
        config,
        Arc::new(UnavailableEnhancer),
        Arc::new(ChannelEventSink::new(tx)),
    )
    .unwrap();
    (engine, rx)
}

/// Collects events until `stop` matches, failing after [`WAIT`].
fn collect_until(
    events: &Receiver<EngineEvent>,
    stop: impl Fn(&EngineEvent) -> bool,
) -> Vec<EngineEvent> {
    let deadline = Instant::now() + WAIT;
    let mut collected = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let event = events.recv_timeout(remaining).expect("engine event in time");
        let done = stop(&event);
        collected.push(event);
        if done {
            return collected;
        }
    }
}

#[test]
fn simulation_runs_to_completion() {
    let (mut engine, events) = start_engine();
    engine.start_simulation(1, 3);

    let collected = collect_until(&events, |event| {
        matches!(event, EngineEvent::SimulationFinished { .. })
    });
    let ticks = collected
        .iter()
        .filter(|event| matches!(event, EngineEvent::SimulatorTick { campaign_id: 1, .. }))
        .count();
    assert_eq!(ticks, 3);
    assert_eq!(
        collected.last(),
        Some(&EngineEvent::SimulationFinished { campaign_id: 1 })
    );

    engine.shutdown();
}

#[test]
fn emitting_without_a_relay_fails_the_campaign() {
    let (engine, events) = start_engine();
    engine.emit_campaign(4, 1, vec!["+966500000000".to_string()], "Hi".to_string());

    let collected = collect_until(&events, |event| {
        matches!(event, EngineEvent::RelayEmitFailed { .. })
    });
    assert_eq!(
        collected.last(),
        Some(&EngineEvent::RelayEmitFailed {
            campaign_id: 4,
            reason: "no live relay connection".to_string(),
        })
    );
}

#[test]
fn failed_enhancement_returns_the_original_text() {
    let (engine, events) = start_engine();
    engine.enhance("buy now");

    let collected = collect_until(&events, |event| matches!(event, EngineEvent::Enhanced { .. }));
    assert_eq!(
        collected.last(),
        Some(&EngineEvent::Enhanced {
            text: "buy now".to_string()
        })
    );
}

#[test]
fn pairing_timer_reports_its_connection() {
    let (engine, events) = start_engine();
    engine.start_pairing_timer(6);

    let collected = collect_until(&events, |event| {
        matches!(event, EngineEvent::PairingTimerElapsed { .. })
    });
    assert_eq!(
        collected.last(),
        Some(&EngineEvent::PairingTimerElapsed { connection: 6 })
    );
}

#[test]
fn unsupported_recipient_file_reports_an_error() {
    let (engine, events) = start_engine();
    engine.read_recipient_file("contacts.pdf");

    let collected = collect_until(&events, |event| {
        matches!(event, EngineEvent::RecipientFile { .. })
    });
    match collected.last() {
        Some(EngineEvent::RecipientFile { path, result }) => {
            assert_eq!(path, "contacts.pdf");
            assert!(result.is_err());
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn shutdown_is_idempotent() {
    let (mut engine, _events) = start_engine();
    engine.start_simulation(2, 100);
    engine.shutdown();
    engine.shutdown();
}
