use std::sync::Arc;
use std::time::Duration;

use broadcast_logging::{broadcast_debug, broadcast_info};
use rand::Rng;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{CampaignId, EngineEvent, EventSink};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Running simulator for one campaign. Dropping the handle stops the timer.
pub struct SimulationHandle {
    campaign_id: CampaignId,
    cancel: CancellationToken,
}

impl SimulationHandle {
    pub fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawns the simulator task on the current tokio runtime.
///
/// Emits exactly one [`EngineEvent::SimulatorTick`] per recipient, one
/// `period` apart, followed by [`EngineEvent::SimulationFinished`]. Late
/// ticks are skipped rather than bunched up.
pub fn spawn_simulation<R>(
    campaign_id: CampaignId,
    recipient_count: usize,
    period: Duration,
    mut rng: R,
    sink: Arc<dyn EventSink>,
) -> SimulationHandle
where
    R: Rng + Send + 'static,
{
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let period = period.max(MIN_PERIOD);

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        for tick in 0..recipient_count {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    broadcast_debug!(
                        "Simulation for campaign {} cancelled after {} ticks",
                        campaign_id,
                        tick
                    );
                    return;
                }
                _ = ticker.tick() => {}
            }
            let draw: f64 = rng.random();
            sink.emit(EngineEvent::SimulatorTick { campaign_id, draw });
        }

        broadcast_info!(
            "Simulation for campaign {} finished ({} recipients)",
            campaign_id,
            recipient_count
        );
        sink.emit(EngineEvent::SimulationFinished { campaign_id });
    });

    SimulationHandle {
        campaign_id,
        cancel,
    }
}
