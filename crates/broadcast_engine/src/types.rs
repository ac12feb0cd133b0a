use serde::Deserialize;

use crate::IngestError;

pub type CampaignId = u64;
pub type ConnectionId = u64;

/// Delivery status as spelled on the relay wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireStatus {
    Pending,
    Sending,
    Sent,
    Failed,
}

/// Payload of an inbound `message-status` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusUpdate {
    pub number: String,
    pub status: WireStatus,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub error: Option<String>,
    /// Echo of the `campaignId` sent with `start_campaign`.
    #[serde(default, rename = "campaignId")]
    pub campaign_id: Option<CampaignId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// Websocket handshake completed.
    Connected,
    PairingArtifact(String),
    Ready,
    Disconnected { reason: Option<String> },
    ConnectFailed(String),
    Status(StatusUpdate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SimulatorTick {
        campaign_id: CampaignId,
        draw: f64,
    },
    SimulationFinished {
        campaign_id: CampaignId,
    },
    Relay {
        connection: ConnectionId,
        event: RelayEvent,
    },
    RelayEmitFailed {
        campaign_id: CampaignId,
        reason: String,
    },
    PairingTimerElapsed {
        connection: ConnectionId,
    },
    /// Result of an enhancement request; the original text when it failed.
    Enhanced {
        text: String,
    },
    RecipientFile {
        path: String,
        result: Result<String, IngestError>,
    },
}
