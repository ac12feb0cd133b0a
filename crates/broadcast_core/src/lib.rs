//! Broadcast core: pure campaign state machine and view-model helpers.
mod delivery;
mod effect;
mod msg;
mod recipients;
mod session;
mod state;
mod update;
mod view_model;

pub use delivery::{
    outcome_for_draw, Campaign, CampaignId, CampaignStats, DeliveryMode, DeliveryStatus,
    StatusReport, TickOutcome, SIMULATED_FAILURE_DETAIL, SIMULATED_FAILURE_RATE,
};
pub use effect::Effect;
pub use msg::Msg;
pub use recipients::{extract_identifiers, parse_recipients, Recipient, MIN_IDENTIFIER_LEN};
pub use session::{
    ConnectionId, PairingMode, PairingSession, SessionState, DEFAULT_RELAY_ADDRESS,
    STANDALONE_PAIRING_ARTIFACT,
};
pub use state::{ActiveView, AppState, VALIDATION_NOTICE};
pub use update::update;
pub use view_model::{AppViewModel, CampaignView, RecipientRowView};
