pub type ConnectionId = u64;

pub const DEFAULT_RELAY_ADDRESS: &str = "http://localhost:3000";

/// Artifact published by the standalone pairing flow.
pub const STANDALONE_PAIRING_ARTIFACT: &str = "BROADCAST_STANDALONE_SESSION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    ConnectedToRelay,
    PairingReady,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PairingMode {
    /// Timer-driven artifact plus manual confirmation, no backend.
    #[default]
    Standalone,
    Relay { address: String },
}

impl PairingMode {
    pub fn relay_address(&self) -> Option<&str> {
        match self {
            PairingMode::Standalone => None,
            PairingMode::Relay { address } => Some(address),
        }
    }
}

/// Pairing state owned by [`crate::AppState`].
///
/// `connection` is the id of the relay connection the state was opened
/// with; relay events carrying any other id are stale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PairingSession {
    mode: PairingMode,
    state: SessionState,
    artifact: Option<String>,
    pairing_open: bool,
    connection: Option<ConnectionId>,
    next_connection: ConnectionId,
}

impl PairingSession {
    pub fn new(mode: PairingMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> &PairingMode {
        &self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }

    pub fn is_pairing_open(&self) -> bool {
        self.pairing_open
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    /// Authenticated over a live relay connection.
    pub fn can_relay(&self) -> bool {
        self.state == SessionState::Authenticated
            && self.connection.is_some()
            && matches!(self.mode, PairingMode::Relay { .. })
    }

    pub fn is_current(&self, connection: ConnectionId) -> bool {
        self.connection == Some(connection)
    }

    pub(crate) fn open_pairing(&mut self) {
        self.pairing_open = true;
        self.state = SessionState::Connecting;
        self.artifact = None;
    }

    /// Allocates the id for a fresh relay connection.
    pub(crate) fn begin_connection(&mut self) -> ConnectionId {
        self.next_connection += 1;
        self.connection = Some(self.next_connection);
        self.next_connection
    }

    pub(crate) fn close_pairing(&mut self) {
        self.pairing_open = false;
    }

    pub(crate) fn set_mode(&mut self, mode: PairingMode) {
        self.mode = mode;
    }

    pub(crate) fn on_connected(&mut self) {
        self.state = SessionState::ConnectedToRelay;
    }

    pub(crate) fn on_artifact(&mut self, artifact: String) {
        self.artifact = Some(artifact);
        self.state = SessionState::PairingReady;
    }

    pub(crate) fn on_ready(&mut self) {
        self.state = SessionState::Authenticated;
        self.artifact = None;
        self.pairing_open = false;
    }

    /// Back to `Disconnected`; forgets the artifact and the connection.
    pub(crate) fn reset(&mut self) {
        self.state = SessionState::Disconnected;
        self.artifact = None;
        self.connection = None;
    }
}
