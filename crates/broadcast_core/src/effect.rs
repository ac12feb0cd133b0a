use crate::{CampaignId, ConnectionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartSimulation {
        campaign_id: CampaignId,
        recipient_count: usize,
    },
    StopSimulation {
        campaign_id: CampaignId,
    },
    /// Hand the whole campaign to the relay as one `start_campaign` event.
    EmitCampaign {
        campaign_id: CampaignId,
        connection: ConnectionId,
        recipients: Vec<String>,
        message: String,
    },
    OpenRelay {
        connection: ConnectionId,
        address: String,
    },
    CloseRelay,
    /// Arm the standalone pairing delay.
    StartPairingTimer {
        connection: ConnectionId,
    },
    EnhanceMessage {
        text: String,
    },
    ReadRecipientFile {
        path: String,
    },
    Shutdown,
}
