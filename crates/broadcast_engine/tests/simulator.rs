use std::sync::{Arc, Mutex};
use std::time::Duration;

use broadcast_engine::{spawn_simulation, EngineEvent, EventSink};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PERIOD: Duration = Duration::from_millis(1500);

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[tokio::test(start_paused = true)]
async fn emits_one_seeded_draw_per_recipient_then_finishes() {
    let sink = Arc::new(RecordingSink::default());
    let _handle = spawn_simulation(7, 3, PERIOD, StdRng::seed_from_u64(42), sink.clone());

    tokio::time::sleep(PERIOD * 3 + Duration::from_millis(100)).await;

    let mut expected_draws = StdRng::seed_from_u64(42);
    let mut expected: Vec<EngineEvent> = (0..3)
        .map(|_| EngineEvent::SimulatorTick {
            campaign_id: 7,
            draw: expected_draws.random(),
        })
        .collect();
    expected.push(EngineEvent::SimulationFinished { campaign_id: 7 });

    assert_eq!(sink.take(), expected);
}

#[tokio::test(start_paused = true)]
async fn first_tick_waits_one_period() {
    let sink = Arc::new(RecordingSink::default());
    let _handle = spawn_simulation(1, 2, PERIOD, StdRng::seed_from_u64(1), sink.clone());

    tokio::time::sleep(PERIOD - Duration::from_millis(100)).await;
    assert!(sink.take().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    let events = sink.take();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        EngineEvent::SimulatorTick { campaign_id: 1, draw } if (0.0..1.0).contains(&draw)
    ));
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_timer() {
    let sink = Arc::new(RecordingSink::default());
    let handle = spawn_simulation(3, 5, PERIOD, StdRng::seed_from_u64(9), sink.clone());

    tokio::time::sleep(PERIOD + Duration::from_millis(100)).await;
    assert_eq!(sink.take().len(), 1);

    drop(handle);
    tokio::time::sleep(PERIOD * 10).await;
    assert!(sink.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn empty_campaign_finishes_immediately() {
    let sink = Arc::new(RecordingSink::default());
    let _handle = spawn_simulation(4, 0, PERIOD, StdRng::seed_from_u64(0), sink.clone());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        sink.take(),
        vec![EngineEvent::SimulationFinished { campaign_id: 4 }]
    );
}
