use crate::{ActiveView, CampaignId, CampaignStats, DeliveryMode, DeliveryStatus, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub view: ActiveView,
    pub session: SessionState,
    /// `None` in standalone pairing mode.
    pub relay_address: Option<String>,
    pub pairing_open: bool,
    pub pairing_artifact: Option<String>,
    pub recipients_input: String,
    /// Recipients the current input would produce.
    pub recipient_count: usize,
    pub message: String,
    pub enhancing: bool,
    pub can_enhance: bool,
    pub notice: Option<String>,
    pub stats: CampaignStats,
    pub campaign: Option<CampaignView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignView {
    pub id: CampaignId,
    pub message: String,
    pub started_at: String,
    pub mode: DeliveryMode,
    pub progress_percent: u8,
    pub rows: Vec<RecipientRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientRowView {
    pub identifier: String,
    pub display_name: Option<String>,
    pub status: DeliveryStatus,
    pub error_detail: Option<String>,
}
