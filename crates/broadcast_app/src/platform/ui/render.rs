use std::fmt::Write;

use broadcast_core::{
    ActiveView, AppViewModel, CampaignView, DeliveryMode, DeliveryStatus, SessionState,
};

const RULE: &str = "------------------------------------------------------------";

pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        "Broadcast | {} | Session: {} | Pairing: {}",
        view_label(view.view),
        session_label(view.session),
        view.relay_address.as_deref().unwrap_or("standalone")
    );
    if view.pairing_open {
        render_pairing(&mut out, view);
    }
    if let Some(notice) = &view.notice {
        let _ = writeln!(out, "! {notice}");
    }

    match view.view {
        ActiveView::Dashboard => render_dashboard(&mut out, view),
        ActiveView::Campaigns => match &view.campaign {
            Some(campaign) => render_campaign(&mut out, campaign),
            None => {
                let _ = writeln!(out, "No campaign yet.");
            }
        },
        ActiveView::Settings => render_settings(&mut out, view),
    }
    out
}

fn render_pairing(out: &mut String, view: &AppViewModel) {
    match (&view.pairing_artifact, view.session) {
        (_, SessionState::Authenticated) => {
            let _ = writeln!(out, "[pairing] linked");
        }
        (Some(artifact), _) => {
            let _ = writeln!(out, "[pairing] scan: {artifact}");
        }
        (None, _) => {
            let _ = writeln!(out, "[pairing] waiting for pairing code...");
        }
    }
}

fn render_dashboard(out: &mut String, view: &AppViewModel) {
    let stats = &view.stats;
    let _ = writeln!(
        out,
        "Total: {} | Sent: {} | Failed: {} | Pending: {}",
        stats.total, stats.sent, stats.failed, stats.pending
    );
    let _ = writeln!(out, "Recipients: {}", view.recipient_count);
    let message = if view.message.is_empty() {
        "(empty)"
    } else {
        view.message.as_str()
    };
    let _ = writeln!(out, "Message: {message}");
    if view.enhancing {
        let _ = writeln!(out, "Enhancing message...");
    }
}

fn render_campaign(out: &mut String, campaign: &CampaignView) {
    let mode = match campaign.mode {
        DeliveryMode::Simulated => "simulated",
        DeliveryMode::Relay => "relay",
    };
    let _ = writeln!(
        out,
        "Campaign #{} ({mode}) started {} | {}%",
        campaign.id, campaign.started_at, campaign.progress_percent
    );
    let _ = writeln!(out, "Message: {}", campaign.message);
    for (index, row) in campaign.rows.iter().enumerate() {
        let name = row.display_name.as_deref().unwrap_or("-");
        let _ = write!(
            out,
            "{:>4}  {:<16} {:<20} {}",
            index + 1,
            row.identifier,
            name,
            status_label(row.status)
        );
        if let Some(detail) = &row.error_detail {
            let _ = write!(out, " ({detail})");
        }
        out.push('\n');
    }
}

fn render_settings(out: &mut String, view: &AppViewModel) {
    let _ = writeln!(
        out,
        "Relay: {}",
        view.relay_address.as_deref().unwrap_or("off (standalone pairing)")
    );
    let _ = writeln!(
        out,
        "Enhancement: {}",
        if view.can_enhance { "available" } else { "enter a message first" }
    );
}

fn view_label(view: ActiveView) -> &'static str {
    match view {
        ActiveView::Dashboard => "Dashboard",
        ActiveView::Campaigns => "Campaigns",
        ActiveView::Settings => "Settings",
    }
}

pub fn session_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Disconnected => "Disconnected",
        SessionState::Connecting => "Connecting",
        SessionState::ConnectedToRelay => "Connected",
        SessionState::PairingReady => "Awaiting scan",
        SessionState::Authenticated => "Linked",
    }
}

pub fn status_label(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Pending => "Pending",
        DeliveryStatus::Sending => "Sending",
        DeliveryStatus::Sent => "Sent",
        DeliveryStatus::Failed => "Failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_core::{update, AppState, Effect, Msg, STANDALONE_PAIRING_ARTIFACT};

    fn state_with_campaign() -> AppState {
        let state = AppState::new();
        let (state, _) = update(
            state,
            Msg::RecipientsInputChanged("+966500000000, Sara\n+14155552671".to_string()),
        );
        let (state, _) = update(state, Msg::MessageChanged("Hello".to_string()));
        let (state, _) = update(
            state,
            Msg::StartClicked {
                started_at: "2026-01-01T00:00:00Z".to_string(),
            },
        );
        state
    }

    #[test]
    fn dashboard_shows_counters() {
        let (state, _) = update(AppState::new(), Msg::MessageChanged("Hi".to_string()));
        let text = render(&state.view());
        assert!(text.contains("Session: Disconnected"));
        assert!(text.contains("Total: 0 | Sent: 0 | Failed: 0 | Pending: 0"));
        assert!(text.contains("Message: Hi"));
    }

    #[test]
    fn campaign_rows_show_status_and_detail() {
        let state = state_with_campaign();
        let campaign_id = state.campaign().map(|campaign| campaign.id()).unwrap();
        let (state, _) = update(state, Msg::SimulatorTick { campaign_id, draw: 0.01 });

        let text = render(&state.view());
        assert!(text.contains("Campaign #"));
        assert!(text.contains("50%"));
        assert!(text.contains("Sara"));
        assert!(text.contains("Failed ("));
        assert!(text.contains("Pending"));
    }

    #[test]
    fn pairing_panel_shows_artifact() {
        let (state, effects) = update(AppState::new(), Msg::PairingOpened);
        assert!(render(&state.view()).contains("waiting for pairing code"));

        let connection = match effects.as_slice() {
            [Effect::StartPairingTimer { connection }] => *connection,
            other => panic!("unexpected effects {other:?}"),
        };
        let (state, _) = update(state, Msg::StandaloneArtifactReady { connection });
        let expected = format!("[pairing] scan: {STANDALONE_PAIRING_ARTIFACT}");
        assert!(render(&state.view()).contains(&expected));

        let (state, _) = update(state, Msg::PairingConfirmed);
        assert!(render(&state.view()).contains("Session: Linked"));
    }
}
