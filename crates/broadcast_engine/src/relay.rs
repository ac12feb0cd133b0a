//! Websocket client for the delivery relay.
//!
//! Frames are JSON text messages of the form `{"event": <name>, "data": <payload>}`.
//! The handshake and socket close are reported as `Connected` and
//! `Disconnected` events, alongside the relay's own `pairing-artifact`,
//! `ready`, `disconnect` and `message-status` events.

use std::sync::Arc;

use broadcast_logging::{broadcast_debug, broadcast_info, broadcast_warn};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{CampaignId, ConnectionId, EngineEvent, EventSink, RelayEvent, StatusUpdate};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("invalid relay address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("relay connection is closed")]
    ConnectionClosed,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
enum InboundFrame {
    PairingArtifact(String),
    Ready,
    Disconnect,
    MessageStatus(StatusUpdate),
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data")]
enum OutboundFrame {
    #[serde(rename = "start_campaign")]
    StartCampaign {
        #[serde(rename = "campaignId")]
        campaign_id: CampaignId,
        recipients: Vec<String>,
        message: String,
    },
}

struct Outbound {
    campaign_id: CampaignId,
    frame: OutboundFrame,
}

/// Maps a configured relay address to its websocket URL.
///
/// `http`/`https` become `ws`/`wss`; `ws`/`wss` pass through.
pub fn relay_ws_url(address: &str) -> Result<Url, RelayError> {
    let invalid = |reason: String| RelayError::InvalidAddress {
        address: address.to_string(),
        reason,
    };
    let mut url = Url::parse(address.trim()).map_err(|err| invalid(err.to_string()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(invalid(format!("unsupported scheme {other}"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| invalid("cannot switch scheme".to_string()))?;
    Ok(url)
}

/// One live relay connection. Dropping it closes the socket.
pub struct RelayConnection {
    connection: ConnectionId,
    address: String,
    outbound: UnboundedSender<Outbound>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RelayConnection {
    /// Starts connecting in the background on the current tokio runtime.
    pub fn open(
        connection: ConnectionId,
        address: &str,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, RelayError> {
        let url = relay_ws_url(address)?;
        let (outbound, outbound_rx) = unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_connection(
            connection,
            url,
            outbound_rx,
            cancel.clone(),
            sink,
        ));

        Ok(Self {
            connection,
            address: address.to_string(),
            outbound,
            cancel,
            task,
        })
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }

    /// Queues the `start_campaign` event. Write failures surface later as
    /// [`EngineEvent::RelayEmitFailed`].
    pub fn start_campaign(
        &self,
        campaign_id: CampaignId,
        recipients: Vec<String>,
        message: String,
    ) -> Result<(), RelayError> {
        self.outbound
            .send(Outbound {
                campaign_id,
                frame: OutboundFrame::StartCampaign {
                    campaign_id,
                    recipients,
                    message,
                },
            })
            .map_err(|_| RelayError::ConnectionClosed)
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_connection(
    connection: ConnectionId,
    url: Url,
    mut outbound: UnboundedReceiver<Outbound>,
    cancel: CancellationToken,
    sink: Arc<dyn EventSink>,
) {
    let emit = |event: RelayEvent| sink.emit(EngineEvent::Relay { connection, event });

    let stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = connect_async(url.as_str()) => match result {
            Ok((stream, _response)) => stream,
            Err(err) => {
                broadcast_warn!("Relay connection {} to {} failed: {}", connection, url, err);
                emit(RelayEvent::ConnectFailed(err.to_string()));
                return;
            }
        },
    };

    broadcast_info!("Relay connection {} open to {}", connection, url);
    emit(RelayEvent::Connected);
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                broadcast_debug!("Relay connection {} closed locally", connection);
                let _ = write.send(Message::Close(None)).await;
                return;
            }
            Some(Outbound { campaign_id, frame }) = outbound.recv() => {
                let sent = match serde_json::to_string(&frame) {
                    Ok(json) => write
                        .send(Message::text(json))
                        .await
                        .map_err(|err| err.to_string()),
                    Err(err) => Err(err.to_string()),
                };
                match sent {
                    Ok(()) => broadcast_info!("Campaign {} handed to relay", campaign_id),
                    Err(reason) => {
                        broadcast_warn!(
                            "Campaign {} could not be sent to relay: {}",
                            campaign_id,
                            reason
                        );
                        sink.emit(EngineEvent::RelayEmitFailed { campaign_id, reason });
                    }
                }
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => match decode_frame(text.as_str()) {
                    Some(RelayEvent::Disconnected { reason }) => {
                        emit(RelayEvent::Disconnected { reason });
                        let _ = write.send(Message::Close(None)).await;
                        return;
                    }
                    Some(event) => emit(event),
                    None => {}
                },
                Some(Ok(Message::Close(close))) => {
                    let reason = close
                        .map(|frame| frame.reason.as_str().to_string())
                        .filter(|reason| !reason.is_empty());
                    emit(RelayEvent::Disconnected { reason });
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    broadcast_warn!("Relay connection {} errored: {}", connection, err);
                    emit(RelayEvent::Disconnected { reason: Some(err.to_string()) });
                    return;
                }
                None => {
                    emit(RelayEvent::Disconnected { reason: None });
                    return;
                }
            },
        }
    }
}

fn decode_frame(text: &str) -> Option<RelayEvent> {
    match serde_json::from_str::<InboundFrame>(text) {
        Ok(InboundFrame::PairingArtifact(artifact)) => Some(RelayEvent::PairingArtifact(artifact)),
        Ok(InboundFrame::Ready) => Some(RelayEvent::Ready),
        Ok(InboundFrame::Disconnect) => Some(RelayEvent::Disconnected {
            reason: Some("relay requested disconnect".to_string()),
        }),
        Ok(InboundFrame::MessageStatus(update)) => Some(RelayEvent::Status(update)),
        Err(err) => {
            broadcast_debug!("Ignoring relay frame {:?}: {}", text, err);
            None
        }
    }
}
