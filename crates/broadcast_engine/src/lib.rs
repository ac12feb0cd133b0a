//! Broadcast engine: effect execution for the campaign dashboard.
//!
//! Owns every long-lived IO resource (simulator timer, relay connection) and
//! reports back through an [`EventSink`].
mod engine;
mod enhance;
mod ingest;
mod relay;
mod simulator;
mod sink;
mod types;

pub use engine::{EngineConfig, EngineError, EngineHandle};
pub use enhance::{
    build_prompt, enhance_or_original, EnhanceError, EnhanceSettings, Enhancer, GeminiEnhancer,
    DEFAULT_ENHANCE_ENDPOINT, DEFAULT_ENHANCE_MODEL,
};
pub use ingest::{read_recipient_file, IngestError, SUPPORTED_EXTENSIONS};
pub use relay::{relay_ws_url, RelayConnection, RelayError};
pub use simulator::{spawn_simulation, SimulationHandle};
pub use sink::{ChannelEventSink, EventSink};
pub use types::{CampaignId, ConnectionId, EngineEvent, RelayEvent, StatusUpdate, WireStatus};
