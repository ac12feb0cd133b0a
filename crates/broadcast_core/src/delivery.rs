//! Delivery status engine: owns the recipient array of the active campaign
//! and keeps the aggregate counters consistent with it.
//!
//! Every mutation goes through a method here that changes the recipient
//! array first and then recomputes [`CampaignStats`] from scratch.

use crate::Recipient;

pub type CampaignId = u64;

/// Draws below this value fail a simulated delivery.
pub const SIMULATED_FAILURE_RATE: f64 = 0.05;

pub const SIMULATED_FAILURE_DETAIL: &str = "simulated delivery failure";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Sending,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Sent | DeliveryStatus::Failed)
    }
}

/// Outcome of one simulator draw.
pub fn outcome_for_draw(draw: f64) -> DeliveryStatus {
    if draw >= SIMULATED_FAILURE_RATE {
        DeliveryStatus::Sent
    } else {
        DeliveryStatus::Failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CampaignStats {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub pending: usize,
}

impl CampaignStats {
    pub fn from_recipients(recipients: &[Recipient]) -> Self {
        let mut stats = CampaignStats {
            total: recipients.len(),
            ..CampaignStats::default()
        };
        for recipient in recipients {
            match recipient.status {
                DeliveryStatus::Sent => stats.sent += 1,
                DeliveryStatus::Failed => stats.failed += 1,
                DeliveryStatus::Pending | DeliveryStatus::Sending => stats.pending += 1,
            }
        }
        stats
    }

    pub fn completed(&self) -> usize {
        self.sent + self.failed
    }

    /// Rounded share of recipients in a terminal status, 0 for an empty campaign.
    pub fn progress_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let percent = (self.completed() as f64 / self.total as f64 * 100.0).round();
        percent.clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Simulated,
    Relay,
}

/// One status update pushed by the relay for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub identifier: String,
    pub index: Option<usize>,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    /// Campaign the relay says the report belongs to, when it echoes one.
    pub campaign_id: Option<CampaignId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Applied {
        index: usize,
        status: DeliveryStatus,
    },
    /// The cursor already passed the last recipient; nothing changed.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
    id: CampaignId,
    recipients: Vec<Recipient>,
    message: String,
    started_at: String,
    mode: DeliveryMode,
    cursor: usize,
    stats: CampaignStats,
}

impl Campaign {
    /// Starts a campaign with every recipient reset to `Pending`.
    pub fn new(
        id: CampaignId,
        recipients: Vec<Recipient>,
        message: impl Into<String>,
        started_at: impl Into<String>,
        mode: DeliveryMode,
    ) -> Self {
        let recipients: Vec<Recipient> = recipients
            .into_iter()
            .map(|mut recipient| {
                recipient.status = DeliveryStatus::Pending;
                recipient.error_detail = None;
                recipient
            })
            .collect();
        let stats = CampaignStats::from_recipients(&recipients);
        Self {
            id,
            recipients,
            message: message.into(),
            started_at: started_at.into(),
            mode,
            cursor: 0,
            stats,
        }
    }

    pub fn id(&self) -> CampaignId {
        self.id
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn started_at(&self) -> &str {
        &self.started_at
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub fn stats(&self) -> CampaignStats {
        self.stats
    }

    pub fn is_complete(&self) -> bool {
        self.stats.pending == 0
    }

    /// Applies one simulator draw to the recipient under the cursor.
    pub fn apply_draw(&mut self, draw: f64) -> TickOutcome {
        let index = self.cursor;
        let Some(recipient) = self.recipients.get_mut(index) else {
            return TickOutcome::Exhausted;
        };

        let status = outcome_for_draw(draw);
        recipient.status = status;
        recipient.error_detail =
            (status == DeliveryStatus::Failed).then(|| SIMULATED_FAILURE_DETAIL.to_string());
        self.cursor += 1;
        self.recompute();
        TickOutcome::Applied { index, status }
    }

    /// Simulator cursor has visited every recipient.
    pub fn simulation_finished(&self) -> bool {
        self.cursor >= self.recipients.len()
    }

    /// Applies a relay status report. Returns the index that changed, if any.
    ///
    /// Terminal recipients never change again, so repeated or late reports
    /// for them are dropped. Reports tagged with another campaign's id are
    /// dropped as well.
    pub fn apply_report(&mut self, report: &StatusReport) -> Option<usize> {
        if report.campaign_id.is_some_and(|id| id != self.id) {
            return None;
        }
        let index = self.locate(report)?;
        let recipient = &mut self.recipients[index];
        match report.status {
            DeliveryStatus::Pending => return None,
            DeliveryStatus::Sending if recipient.status == DeliveryStatus::Sending => return None,
            _ => {}
        }

        recipient.status = report.status;
        recipient.error_detail = match report.status {
            DeliveryStatus::Failed => Some(
                report
                    .error
                    .clone()
                    .unwrap_or_else(|| "delivery failed".to_string()),
            ),
            _ => None,
        };
        self.recompute();
        Some(index)
    }

    /// Marks every non-terminal recipient as failed with the given detail.
    pub fn fail_outstanding(&mut self, detail: &str) -> usize {
        let mut changed = 0;
        for recipient in self
            .recipients
            .iter_mut()
            .filter(|recipient| !recipient.status.is_terminal())
        {
            recipient.status = DeliveryStatus::Failed;
            recipient.error_detail = Some(detail.to_string());
            changed += 1;
        }
        self.cursor = self.recipients.len();
        self.recompute();
        changed
    }

    fn locate(&self, report: &StatusReport) -> Option<usize> {
        let positional = report.index.filter(|&index| {
            self.recipients
                .get(index)
                .is_some_and(|recipient| recipient.identifier == report.identifier)
        });
        let index = positional.or_else(|| {
            self.recipients.iter().position(|recipient| {
                recipient.identifier == report.identifier && !recipient.status.is_terminal()
            })
        })?;
        (!self.recipients[index].status.is_terminal()).then_some(index)
    }

    fn recompute(&mut self) {
        self.stats = CampaignStats::from_recipients(&self.recipients);
    }
}
