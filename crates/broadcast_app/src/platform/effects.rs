use std::ops::ControlFlow;
use std::sync::{mpsc, Arc};
use std::thread;

use broadcast_core::{DeliveryStatus, Effect, Msg, StatusReport};
use broadcast_engine::{
    ChannelEventSink, ConnectionId, EngineConfig, EngineError, EngineEvent, EngineHandle,
    RelayEvent, StatusUpdate, WireStatus,
};
use broadcast_logging::{broadcast_debug, broadcast_info, broadcast_warn};

/// Executes core effects on the engine and feeds engine events back as
/// messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, msg_tx: mpsc::Sender<Msg>) -> Result<Self, EngineError> {
        let (event_tx, event_rx) = mpsc::channel();
        let engine = EngineHandle::new(config, Arc::new(ChannelEventSink::new(event_tx)))?;
        spawn_event_loop(event_rx, msg_tx);
        Ok(Self { engine })
    }

    /// Returns `Break` once a shutdown effect has been seen.
    pub fn run(&mut self, effects: Vec<Effect>) -> ControlFlow<()> {
        for effect in effects {
            match effect {
                Effect::StartSimulation {
                    campaign_id,
                    recipient_count,
                } => self.engine.start_simulation(campaign_id, recipient_count),
                Effect::StopSimulation { campaign_id } => self.engine.stop_simulation(campaign_id),
                Effect::EmitCampaign {
                    campaign_id,
                    connection,
                    recipients,
                    message,
                } => {
                    broadcast_info!(
                        "Emitting campaign {} to {} recipients over connection {}",
                        campaign_id,
                        recipients.len(),
                        connection
                    );
                    self.engine
                        .emit_campaign(campaign_id, connection, recipients, message);
                }
                Effect::OpenRelay {
                    connection,
                    address,
                } => self.engine.open_relay(connection, address),
                Effect::CloseRelay => self.engine.close_relay(),
                Effect::StartPairingTimer { connection } => {
                    self.engine.start_pairing_timer(connection)
                }
                Effect::EnhanceMessage { text } => self.engine.enhance(text),
                Effect::ReadRecipientFile { path } => self.engine.read_recipient_file(path),
                Effect::Shutdown => {
                    self.engine.shutdown();
                    return ControlFlow::Break(());
                }
            }
        }
        ControlFlow::Continue(())
    }
}

fn spawn_event_loop(event_rx: mpsc::Receiver<EngineEvent>, msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        for event in event_rx {
            let Some(msg) = event_to_msg(event) else {
                continue;
            };
            if msg_tx.send(msg).is_err() {
                break;
            }
        }
        broadcast_debug!("Engine event loop finished");
    });
}

fn event_to_msg(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::SimulatorTick { campaign_id, draw } => {
            Msg::SimulatorTick { campaign_id, draw }
        }
        EngineEvent::SimulationFinished { campaign_id } => {
            broadcast_debug!("Simulator for campaign {} drained", campaign_id);
            return None;
        }
        EngineEvent::Relay { connection, event } => relay_event_to_msg(connection, event),
        EngineEvent::RelayEmitFailed {
            campaign_id,
            reason,
        } => Msg::RelayEmitFailed {
            campaign_id,
            reason,
        },
        EngineEvent::PairingTimerElapsed { connection } => {
            Msg::StandaloneArtifactReady { connection }
        }
        EngineEvent::Enhanced { text } => Msg::EnhanceFinished(text),
        EngineEvent::RecipientFile { path, result } => match result {
            Ok(contents) => Msg::RecipientFileLoaded(contents),
            Err(err) => {
                broadcast_warn!("Recipient file {} rejected: {}", path, err);
                Msg::RecipientFileFailed(err.to_string())
            }
        },
    };
    Some(msg)
}

fn relay_event_to_msg(connection: ConnectionId, event: RelayEvent) -> Msg {
    match event {
        RelayEvent::Connected => Msg::RelayConnected { connection },
        RelayEvent::PairingArtifact(artifact) => Msg::RelayArtifact {
            connection,
            artifact,
        },
        RelayEvent::Ready => Msg::RelayReady { connection },
        RelayEvent::Disconnected { reason } => Msg::RelayDisconnected { connection, reason },
        RelayEvent::ConnectFailed(reason) => Msg::RelayConnectFailed { connection, reason },
        RelayEvent::Status(update) => Msg::DeliveryReported {
            connection,
            report: status_report(update),
        },
    }
}

fn status_report(update: StatusUpdate) -> StatusReport {
    StatusReport {
        identifier: update.number,
        index: update.index,
        status: map_status(update.status),
        error: update.error,
        campaign_id: update.campaign_id,
    }
}

fn map_status(status: WireStatus) -> DeliveryStatus {
    match status {
        WireStatus::Pending => DeliveryStatus::Pending,
        WireStatus::Sending => DeliveryStatus::Sending,
        WireStatus::Sent => DeliveryStatus::Sent,
        WireStatus::Failed => DeliveryStatus::Failed,
    }
}
