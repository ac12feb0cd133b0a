//! Parsing of dashboard commands typed on stdin.

use broadcast_core::{ActiveView, Msg, PairingMode, DEFAULT_RELAY_ADDRESS};

pub const HELP: &str = "\
Commands:
  numbers <line>[; <line>...]   replace the recipient list (`number[, name]` per line)
  load <path>                   import numbers from a .csv, .xls, .xlsx or .txt file
  message <text>                set the message body
  enhance                       rewrite the message with the enhancement service
  start                         launch a campaign
  pair                          open the pairing panel
  tap                           confirm the standalone pairing
  cancel                        close the pairing panel
  relay [<address>|off]         pair through a relay, or back to standalone
  view dashboard|campaigns|settings
  help
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(Msg),
    /// Needs a timestamp from the caller before it becomes a message.
    Start,
    Help,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let msg = match verb.to_ascii_lowercase().as_str() {
        "numbers" => Msg::RecipientsInputChanged(
            rest.split(';')
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        "load" if !rest.is_empty() => Msg::RecipientFileRequested(rest.to_string()),
        "load" => return Err("usage: load <path>".to_string()),
        "message" => Msg::MessageChanged(rest.to_string()),
        "enhance" => Msg::EnhanceClicked,
        "start" => return Ok(Command::Start),
        "pair" => Msg::PairingOpened,
        "tap" => Msg::PairingConfirmed,
        "cancel" => Msg::PairingClosed,
        "relay" => Msg::PairingModeChanged(parse_relay(rest)),
        "view" => Msg::ViewSelected(parse_view(rest)?),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => Msg::QuitRequested,
        "" => Msg::NoOp,
        other => return Err(format!("unknown command {other:?}, try `help`")),
    };
    Ok(Command::Send(msg))
}

fn parse_relay(arg: &str) -> PairingMode {
    match arg {
        "off" | "standalone" => PairingMode::Standalone,
        "" => PairingMode::Relay {
            address: DEFAULT_RELAY_ADDRESS.to_string(),
        },
        address => PairingMode::Relay {
            address: address.to_string(),
        },
    }
}

fn parse_view(arg: &str) -> Result<ActiveView, String> {
    match arg.to_ascii_lowercase().as_str() {
        "dashboard" | "home" => Ok(ActiveView::Dashboard),
        "campaigns" | "campaign" => Ok(ActiveView::Campaigns),
        "settings" => Ok(ActiveView::Settings),
        _ => Err("usage: view dashboard|campaigns|settings".to_string()),
    }
}
