use crate::{ActiveView, CampaignId, ConnectionId, PairingMode, StatusReport};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the recipient list (newline separated).
    RecipientsInputChanged(String),
    /// User edited the message body.
    MessageChanged(String),
    /// User asked to import recipients from a file.
    RecipientFileRequested(String),
    /// File contents arrived from the engine.
    RecipientFileLoaded(String),
    RecipientFileFailed(String),
    /// User clicked Enhance.
    EnhanceClicked,
    /// Enhancement finished; carries the original text when it failed.
    EnhanceFinished(String),
    /// User clicked Start; `started_at` is stamped by the caller.
    StartClicked { started_at: String },
    ViewSelected(ActiveView),
    /// Pairing UI opened.
    PairingOpened,
    /// Pairing UI closed by the user.
    PairingClosed,
    /// Manual confirmation in standalone pairing.
    PairingConfirmed,
    PairingModeChanged(PairingMode),
    /// Standalone pairing delay elapsed.
    StandaloneArtifactReady { connection: ConnectionId },
    RelayConnected { connection: ConnectionId },
    RelayArtifact {
        connection: ConnectionId,
        artifact: String,
    },
    RelayReady { connection: ConnectionId },
    RelayDisconnected {
        connection: ConnectionId,
        reason: Option<String>,
    },
    RelayConnectFailed {
        connection: ConnectionId,
        reason: String,
    },
    /// Per-recipient status pushed by the relay.
    DeliveryReported {
        connection: ConnectionId,
        report: StatusReport,
    },
    RelayEmitFailed {
        campaign_id: CampaignId,
        reason: String,
    },
    /// One simulator tick with its uniform draw in `[0, 1)`.
    SimulatorTick { campaign_id: CampaignId, draw: f64 },
    QuitRequested,
    /// Input that changes nothing, such as a blank command line.
    NoOp,
}
