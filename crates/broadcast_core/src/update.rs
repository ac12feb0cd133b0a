use crate::{
    extract_identifiers, parse_recipients, ActiveView, AppState, Campaign, CampaignId,
    ConnectionId, DeliveryMode, Effect, Msg, PairingMode, SessionState, StatusReport, TickOutcome,
    STANDALONE_PAIRING_ARTIFACT, VALIDATION_NOTICE,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RecipientsInputChanged(input) => {
            state.set_recipients_input(input);
            Vec::new()
        }
        Msg::MessageChanged(message) => {
            state.set_message(message);
            Vec::new()
        }
        Msg::RecipientFileRequested(path) => vec![Effect::ReadRecipientFile { path }],
        Msg::RecipientFileLoaded(contents) => {
            let identifiers = extract_identifiers(&contents);
            if identifiers.is_empty() {
                state.set_notice(Some("no phone numbers found in file".to_string()));
            } else {
                state.set_notice(Some(format!("loaded {} numbers", identifiers.len())));
                state.set_recipients_input(identifiers.join("\n"));
            }
            Vec::new()
        }
        Msg::RecipientFileFailed(reason) => {
            state.set_notice(Some(format!("could not read file: {reason}")));
            Vec::new()
        }
        Msg::EnhanceClicked => {
            if state.is_enhancing() || state.message().trim().is_empty() {
                return (state, Vec::new());
            }
            state.set_enhancing(true);
            vec![Effect::EnhanceMessage {
                text: state.message().to_string(),
            }]
        }
        Msg::EnhanceFinished(text) => {
            state.set_enhancing(false);
            state.set_message(text);
            Vec::new()
        }
        Msg::StartClicked { started_at } => start_campaign(&mut state, started_at),
        Msg::ViewSelected(view) => {
            state.set_view(view);
            Vec::new()
        }
        Msg::PairingOpened => {
            let session = state.session();
            if session.is_pairing_open() || session.state() == SessionState::Authenticated {
                return (state, Vec::new());
            }
            open_pairing(&mut state)
        }
        Msg::PairingClosed => close_pairing(&mut state),
        Msg::PairingConfirmed => {
            let session = state.session();
            let confirmable = session.is_pairing_open()
                && session.state() == SessionState::PairingReady
                && *session.mode() == PairingMode::Standalone;
            if confirmable {
                state.session_mut().on_ready();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PairingModeChanged(mode) => change_pairing_mode(&mut state, mode),
        Msg::StandaloneArtifactReady { connection } => {
            let session = state.session();
            let waiting = session.is_pairing_open()
                && session.is_current(connection)
                && session.state() == SessionState::Connecting
                && *session.mode() == PairingMode::Standalone;
            if waiting {
                state
                    .session_mut()
                    .on_artifact(STANDALONE_PAIRING_ARTIFACT.to_string());
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RelayConnected { connection } => {
            if is_live_relay(&state, connection)
                && state.session().state() == SessionState::Connecting
            {
                state.session_mut().on_connected();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RelayArtifact {
            connection,
            artifact,
        } => {
            let awaiting = matches!(
                state.session().state(),
                SessionState::Connecting
                    | SessionState::ConnectedToRelay
                    | SessionState::PairingReady
            );
            if is_live_relay(&state, connection) && awaiting {
                state.session_mut().on_artifact(artifact);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RelayReady { connection } => {
            if is_live_relay(&state, connection)
                && state.session().state() != SessionState::Disconnected
            {
                state.session_mut().on_ready();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RelayDisconnected { connection, reason } => {
            if is_live_relay(&state, connection) {
                let reason = reason.unwrap_or_else(|| "connection closed".to_string());
                drop_relay_session(&mut state, &format!("relay disconnected: {reason}"));
            }
            Vec::new()
        }
        Msg::RelayConnectFailed { connection, reason } => {
            if is_live_relay(&state, connection) {
                drop_relay_session(&mut state, &format!("relay connection failed: {reason}"));
            }
            Vec::new()
        }
        Msg::DeliveryReported { connection, report } => {
            if is_live_relay(&state, connection) {
                apply_report(&mut state, &report);
            }
            Vec::new()
        }
        Msg::RelayEmitFailed {
            campaign_id,
            reason,
        } => {
            if let Some(campaign) = active_campaign(&mut state, campaign_id, DeliveryMode::Relay) {
                campaign.fail_outstanding(&format!("relay unavailable: {reason}"));
                let notice = format!("campaign could not be handed to the relay: {reason}");
                state.set_notice(Some(notice));
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SimulatorTick { campaign_id, draw } => {
            // Ticks from a superseded campaign never reach the active one.
            match active_campaign(&mut state, campaign_id, DeliveryMode::Simulated) {
                Some(campaign) => {
                    let applied = matches!(campaign.apply_draw(draw), TickOutcome::Applied { .. });
                    let finished = campaign.simulation_finished();
                    if applied {
                        state.mark_dirty();
                    }
                    if finished {
                        vec![Effect::StopSimulation { campaign_id }]
                    } else {
                        Vec::new()
                    }
                }
                None => Vec::new(),
            }
        }
        Msg::QuitRequested => vec![Effect::Shutdown],
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_campaign(state: &mut AppState, started_at: String) -> Vec<Effect> {
    let recipients = parse_recipients(state.recipients_input());
    if recipients.is_empty() || state.message().trim().is_empty() {
        state.set_notice(Some(VALIDATION_NOTICE.to_string()));
        return Vec::new();
    }

    let mut effects = Vec::with_capacity(2);
    if let Some(previous) = state.campaign() {
        if previous.mode() == DeliveryMode::Simulated && !previous.simulation_finished() {
            effects.push(Effect::StopSimulation {
                campaign_id: previous.id(),
            });
        }
    }

    let campaign_id = state.next_campaign_id();
    let message = state.message().to_string();
    let relay_connection = state
        .session()
        .can_relay()
        .then(|| state.session().connection())
        .flatten();

    let mode = match relay_connection {
        Some(connection) => {
            effects.push(Effect::EmitCampaign {
                campaign_id,
                connection,
                recipients: recipients
                    .iter()
                    .map(|recipient| recipient.identifier.clone())
                    .collect(),
                message: message.clone(),
            });
            DeliveryMode::Relay
        }
        None => {
            effects.push(Effect::StartSimulation {
                campaign_id,
                recipient_count: recipients.len(),
            });
            DeliveryMode::Simulated
        }
    };

    state.install_campaign(Campaign::new(
        campaign_id,
        recipients,
        message,
        started_at,
        mode,
    ));
    state.set_notice(None);
    state.set_view(ActiveView::Campaigns);
    effects
}

fn open_pairing(state: &mut AppState) -> Vec<Effect> {
    let session = state.session_mut();
    session.open_pairing();
    let connection = session.begin_connection();
    let effect = match session.mode() {
        PairingMode::Standalone => Effect::StartPairingTimer { connection },
        PairingMode::Relay { address } => Effect::OpenRelay {
            connection,
            address: address.clone(),
        },
    };
    state.mark_dirty();
    vec![effect]
}

fn close_pairing(state: &mut AppState) -> Vec<Effect> {
    if !state.session().is_pairing_open() {
        return Vec::new();
    }
    state.session_mut().close_pairing();
    state.mark_dirty();

    if state.session().state() == SessionState::Authenticated {
        return Vec::new();
    }
    let relay = matches!(state.session().mode(), PairingMode::Relay { .. });
    state.session_mut().reset();
    if relay {
        vec![Effect::CloseRelay]
    } else {
        Vec::new()
    }
}

fn change_pairing_mode(state: &mut AppState, mode: PairingMode) -> Vec<Effect> {
    if *state.session().mode() == mode {
        return Vec::new();
    }

    let mut effects = Vec::new();
    let had_relay = matches!(state.session().mode(), PairingMode::Relay { .. })
        && state.session().connection().is_some();
    if had_relay {
        effects.push(Effect::CloseRelay);
        fail_relay_campaign(state, "relay address changed");
    }

    let reopen = state.session().is_pairing_open();
    let session = state.session_mut();
    session.reset();
    session.close_pairing();
    session.set_mode(mode);
    state.mark_dirty();

    if reopen {
        effects.extend(open_pairing(state));
    }
    effects
}

fn is_live_relay(state: &AppState, connection: ConnectionId) -> bool {
    let session = state.session();
    session.is_current(connection) && matches!(session.mode(), PairingMode::Relay { .. })
}

/// Disconnect or connect failure on the current relay connection.
fn drop_relay_session(state: &mut AppState, notice: &str) {
    let session = state.session_mut();
    session.reset();
    session.close_pairing();
    fail_relay_campaign(state, notice);
    state.set_notice(Some(notice.to_string()));
    state.mark_dirty();
}

/// A relay-driven campaign cannot progress without its connection.
fn fail_relay_campaign(state: &mut AppState, detail: &str) {
    if let Some(campaign) = state.campaign_mut() {
        if campaign.mode() == DeliveryMode::Relay && !campaign.is_complete() {
            campaign.fail_outstanding(detail);
            state.mark_dirty();
        }
    }
}

fn apply_report(state: &mut AppState, report: &StatusReport) {
    let Some(campaign) = state.campaign_mut() else {
        return;
    };
    if campaign.mode() != DeliveryMode::Relay {
        return;
    }
    if campaign.apply_report(report).is_some() {
        state.mark_dirty();
    }
}

fn active_campaign(
    state: &mut AppState,
    campaign_id: CampaignId,
    mode: DeliveryMode,
) -> Option<&mut Campaign> {
    state
        .campaign_mut()
        .filter(|campaign| campaign.id() == campaign_id && campaign.mode() == mode)
}
