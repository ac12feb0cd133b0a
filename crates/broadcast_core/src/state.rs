use crate::view_model::{AppViewModel, CampaignView, RecipientRowView};
use crate::{parse_recipients, Campaign, CampaignId, CampaignStats, PairingMode, PairingSession};

pub const VALIDATION_NOTICE: &str = "at least one recipient and a message body are required";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    /// Composer.
    #[default]
    Dashboard,
    /// Live tracker for the active campaign.
    Campaigns,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    view: ActiveView,
    recipients_input: String,
    message: String,
    enhancing: bool,
    notice: Option<String>,
    session: PairingSession,
    campaign: Option<Campaign>,
    last_campaign_id: CampaignId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pairing_mode(mode: PairingMode) -> Self {
        Self {
            session: PairingSession::new(mode),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let campaign = self.campaign.as_ref().map(|campaign| CampaignView {
            id: campaign.id(),
            message: campaign.message().to_string(),
            started_at: campaign.started_at().to_string(),
            mode: campaign.mode(),
            progress_percent: campaign.stats().progress_percent(),
            rows: campaign
                .recipients()
                .iter()
                .map(|recipient| RecipientRowView {
                    identifier: recipient.identifier.clone(),
                    display_name: recipient.display_name.clone(),
                    status: recipient.status,
                    error_detail: recipient.error_detail.clone(),
                })
                .collect(),
        });

        AppViewModel {
            view: self.view,
            session: self.session.state(),
            relay_address: self.session.mode().relay_address().map(ToOwned::to_owned),
            pairing_open: self.session.is_pairing_open(),
            pairing_artifact: self.session.artifact().map(ToOwned::to_owned),
            recipients_input: self.recipients_input.clone(),
            recipient_count: parse_recipients(&self.recipients_input).len(),
            message: self.message.clone(),
            enhancing: self.enhancing,
            can_enhance: !self.enhancing && !self.message.trim().is_empty(),
            notice: self.notice.clone(),
            stats: self.stats(),
            campaign,
        }
    }

    /// Stats of the active campaign, all zero before the first dispatch.
    pub fn stats(&self) -> CampaignStats {
        self.campaign
            .as_ref()
            .map(Campaign::stats)
            .unwrap_or_default()
    }

    pub fn campaign(&self) -> Option<&Campaign> {
        self.campaign.as_ref()
    }

    pub fn session(&self) -> &PairingSession {
        &self.session
    }

    pub fn active_view(&self) -> ActiveView {
        self.view
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn recipients_input(&self) -> &str {
        &self.recipients_input
    }

    pub fn is_enhancing(&self) -> bool {
        self.enhancing
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn session_mut(&mut self) -> &mut PairingSession {
        &mut self.session
    }

    pub(crate) fn campaign_mut(&mut self) -> Option<&mut Campaign> {
        self.campaign.as_mut()
    }

    pub(crate) fn set_view(&mut self, view: ActiveView) {
        if self.view != view {
            self.view = view;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_recipients_input(&mut self, input: String) {
        if self.recipients_input != input {
            self.recipients_input = input;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_message(&mut self, message: String) {
        if self.message != message {
            self.message = message;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_enhancing(&mut self, enhancing: bool) {
        if self.enhancing != enhancing {
            self.enhancing = enhancing;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_notice(&mut self, notice: Option<String>) {
        if self.notice != notice {
            self.notice = notice;
            self.mark_dirty();
        }
    }

    pub(crate) fn next_campaign_id(&mut self) -> CampaignId {
        self.last_campaign_id += 1;
        self.last_campaign_id
    }

    /// Replaces the active campaign; the previous one is dropped, not archived.
    pub(crate) fn install_campaign(&mut self, campaign: Campaign) {
        self.campaign = Some(campaign);
        self.mark_dirty();
    }
}
