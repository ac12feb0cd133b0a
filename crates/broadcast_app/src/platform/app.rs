use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use broadcast_core::{update, AppState, Msg};
use broadcast_logging::{broadcast_info, broadcast_warn};
use chrono::Utc;

use super::config::{self, AppConfig, LOG_FILENAME};
use super::effects::EffectRunner;
use super::ui::commands::{parse_command, Command, HELP};
use super::ui::render::render;

pub fn run_app() -> anyhow::Result<()> {
    let config_path = config::config_path();
    let loaded = config::load_config(&config_path);
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        Ok(None) | Err(_) => AppConfig::default(),
    };

    broadcast_logging::initialize(
        config.log_destination.into(),
        config.level_filter(),
        &PathBuf::from(LOG_FILENAME),
    );
    match loaded {
        Ok(Some(_)) => broadcast_info!("Loaded configuration from {:?}", config_path),
        Ok(None) => broadcast_info!("No {:?}, using default configuration", config_path),
        Err(err) => broadcast_warn!("Ignoring configuration: {:#}", err),
    }

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let engine_config = config.engine_config(config.api_key_from_env());
    let mut runner =
        EffectRunner::new(engine_config, msg_tx.clone()).context("failed to start engine")?;

    spawn_input_reader(msg_tx);

    let mut state = AppState::with_pairing_mode(config.pairing_mode());
    print_view(&state);
    println!("Type `help` for commands.");

    while let Ok(msg) = msg_rx.recv() {
        let (next, effects) = update(state, msg);
        state = next;
        if state.consume_dirty() {
            print_view(&state);
        }
        if let ControlFlow::Break(()) = runner.run(effects) {
            break;
        }
    }

    broadcast_info!("Dashboard closed");
    Ok(())
}

fn print_view(state: &AppState) {
    let mut stdout = io::stdout().lock();
    let _ = stdout.write_all(render(&state.view()).as_bytes());
    let _ = stdout.flush();
}

/// Reads commands from stdin. End of input quits the dashboard.
fn spawn_input_reader(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let msg = match parse_command(&line) {
                Ok(Command::Send(msg)) => msg,
                Ok(Command::Start) => Msg::StartClicked {
                    started_at: Utc::now().to_rfc3339(),
                },
                Ok(Command::Help) => {
                    println!("{HELP}");
                    continue;
                }
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            };
            if msg_tx.send(msg).is_err() {
                return;
            }
        }
        let _ = msg_tx.send(Msg::QuitRequested);
    });
}
