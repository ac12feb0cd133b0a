use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use broadcast_logging::{broadcast_debug, broadcast_info, broadcast_warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{
    enhance_or_original, read_recipient_file, spawn_simulation, CampaignId, ConnectionId,
    EngineEvent, EnhanceSettings, Enhancer, EventSink, GeminiEnhancer, RelayConnection,
    RelayEvent, SimulationHandle,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub simulation_interval: Duration,
    /// Delay before the standalone pairing artifact appears.
    pub pairing_delay: Duration,
    /// Fixed seed for reproducible simulator draws.
    pub simulation_seed: Option<u64>,
    pub enhance: EnhanceSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            simulation_interval: Duration::from_millis(1500),
            pairing_delay: Duration::from_millis(1500),
            simulation_seed: None,
            enhance: EnhanceSettings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
}

enum EngineCommand {
    StartSimulation {
        campaign_id: CampaignId,
        recipient_count: usize,
    },
    StopSimulation {
        campaign_id: CampaignId,
    },
    OpenRelay {
        connection: ConnectionId,
        address: String,
    },
    CloseRelay,
    EmitCampaign {
        campaign_id: CampaignId,
        connection: ConnectionId,
        recipients: Vec<String>,
        message: String,
    },
    StartPairingTimer {
        connection: ConnectionId,
    },
    Enhance {
        text: String,
    },
    ReadRecipientFile {
        path: String,
    },
    Shutdown,
}

/// Handle to the engine thread. Dropping it shuts the engine down, which
/// cancels the simulator and closes the relay connection.
pub struct EngineHandle {
    cmd_tx: UnboundedSender<EngineCommand>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let enhancer = Arc::new(GeminiEnhancer::new(config.enhance.clone()));
        Self::with_enhancer(config, enhancer, sink)
    }

    pub fn with_enhancer(
        config: EngineConfig,
        enhancer: Arc<dyn Enhancer>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = unbounded_channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let worker = Worker {
            config,
            enhancer,
            sink,
            simulation: None,
            relay: None,
        };

        let worker = thread::Builder::new()
            .name("broadcast-engine".to_string())
            .spawn(move || runtime.block_on(worker.run(cmd_rx)))?;

        Ok(Self {
            cmd_tx,
            worker: Some(worker),
        })
    }

    pub fn start_simulation(&self, campaign_id: CampaignId, recipient_count: usize) {
        self.send(EngineCommand::StartSimulation {
            campaign_id,
            recipient_count,
        });
    }

    pub fn stop_simulation(&self, campaign_id: CampaignId) {
        self.send(EngineCommand::StopSimulation { campaign_id });
    }

    pub fn open_relay(&self, connection: ConnectionId, address: impl Into<String>) {
        self.send(EngineCommand::OpenRelay {
            connection,
            address: address.into(),
        });
    }

    pub fn close_relay(&self) {
        self.send(EngineCommand::CloseRelay);
    }

    pub fn emit_campaign(
        &self,
        campaign_id: CampaignId,
        connection: ConnectionId,
        recipients: Vec<String>,
        message: String,
    ) {
        self.send(EngineCommand::EmitCampaign {
            campaign_id,
            connection,
            recipients,
            message,
        });
    }

    pub fn start_pairing_timer(&self, connection: ConnectionId) {
        self.send(EngineCommand::StartPairingTimer { connection });
    }

    pub fn enhance(&self, text: impl Into<String>) {
        self.send(EngineCommand::Enhance { text: text.into() });
    }

    pub fn read_recipient_file(&self, path: impl Into<String>) {
        self.send(EngineCommand::ReadRecipientFile { path: path.into() });
    }

    /// Stops the engine thread and waits for it. Safe to call twice.
    pub fn shutdown(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                broadcast_warn!("Engine thread panicked during shutdown");
            }
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            broadcast_warn!("Engine command dropped: engine is not running");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    config: EngineConfig,
    enhancer: Arc<dyn Enhancer>,
    sink: Arc<dyn EventSink>,
    simulation: Option<SimulationHandle>,
    relay: Option<RelayConnection>,
}

impl Worker {
    async fn run(mut self, mut cmd_rx: UnboundedReceiver<EngineCommand>) {
        while let Some(command) = cmd_rx.recv().await {
            if let EngineCommand::Shutdown = command {
                break;
            }
            self.handle(command);
        }
        broadcast_info!("Engine shutting down");
        self.simulation = None;
        self.relay = None;
    }

    fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::StartSimulation {
                campaign_id,
                recipient_count,
            } => {
                let rng = match self.config.simulation_seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(campaign_id)),
                    None => StdRng::from_os_rng(),
                };
                broadcast_info!(
                    "Starting simulation for campaign {} ({} recipients)",
                    campaign_id,
                    recipient_count
                );
                // Replacing the handle cancels any previous simulation.
                self.simulation = Some(spawn_simulation(
                    campaign_id,
                    recipient_count,
                    self.config.simulation_interval,
                    rng,
                    self.sink.clone(),
                ));
            }
            EngineCommand::StopSimulation { campaign_id } => {
                let matches = self
                    .simulation
                    .as_ref()
                    .is_some_and(|handle| handle.campaign_id() == campaign_id);
                if matches {
                    broadcast_debug!("Stopping simulation for campaign {}", campaign_id);
                    self.simulation = None;
                }
            }
            EngineCommand::OpenRelay {
                connection,
                address,
            } => self.open_relay(connection, &address),
            EngineCommand::CloseRelay => {
                if let Some(relay) = self.relay.take() {
                    broadcast_info!("Closing relay connection {}", relay.connection());
                }
            }
            EngineCommand::EmitCampaign {
                campaign_id,
                connection,
                recipients,
                message,
            } => {
                let result = match &self.relay {
                    Some(relay) if relay.connection() == connection && relay.is_alive() => relay
                        .start_campaign(campaign_id, recipients, message)
                        .map_err(|err| err.to_string()),
                    _ => Err("no live relay connection".to_string()),
                };
                if let Err(reason) = result {
                    broadcast_warn!("Campaign {} not sent: {}", campaign_id, reason);
                    self.sink.emit(EngineEvent::RelayEmitFailed {
                        campaign_id,
                        reason,
                    });
                }
            }
            EngineCommand::StartPairingTimer { connection } => {
                let sink = self.sink.clone();
                let delay = self.config.pairing_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    sink.emit(EngineEvent::PairingTimerElapsed { connection });
                });
            }
            EngineCommand::Enhance { text } => {
                let sink = self.sink.clone();
                let enhancer = self.enhancer.clone();
                tokio::spawn(async move {
                    let text = enhance_or_original(enhancer.as_ref(), &text).await;
                    sink.emit(EngineEvent::Enhanced { text });
                });
            }
            EngineCommand::ReadRecipientFile { path } => {
                let sink = self.sink.clone();
                tokio::spawn(async move {
                    let result = read_recipient_file(&PathBuf::from(&path)).await;
                    sink.emit(EngineEvent::RecipientFile { path, result });
                });
            }
            EngineCommand::Shutdown => {}
        }
    }

    /// At most one connection is live; a new connection id replaces it.
    fn open_relay(&mut self, connection: ConnectionId, address: &str) {
        if let Some(existing) = &self.relay {
            if existing.connection() == connection && existing.address() == address {
                broadcast_debug!("Relay connection {} already open", connection);
                return;
            }
        }
        self.relay = None;

        match RelayConnection::open(connection, address, self.sink.clone()) {
            Ok(relay) => {
                broadcast_info!("Opening relay connection {} to {}", connection, address);
                self.relay = Some(relay);
            }
            Err(err) => {
                broadcast_warn!("Relay connection {} not opened: {}", connection, err);
                self.sink.emit(EngineEvent::Relay {
                    connection,
                    event: RelayEvent::ConnectFailed(err.to_string()),
                });
            }
        }
    }
}
