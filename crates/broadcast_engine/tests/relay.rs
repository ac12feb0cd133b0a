use std::sync::Arc;
use std::time::Duration;

use broadcast_engine::{
    EngineEvent, EventSink, RelayConnection, RelayError, RelayEvent, StatusUpdate, WireStatus,
};
use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{accept_async, tungstenite::Message};

const WAIT: Duration = Duration::from_secs(5);

struct ForwardingSink(UnboundedSender<EngineEvent>);

impl EventSink for ForwardingSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.0.send(event);
    }
}

fn forwarding_sink() -> (Arc<dyn EventSink>, UnboundedReceiver<EngineEvent>) {
    let (tx, rx) = unbounded_channel();
    (Arc::new(ForwardingSink(tx)), rx)
}

async fn next_relay_event(
    events: &mut UnboundedReceiver<EngineEvent>,
    expected: u64,
) -> RelayEvent {
    let event = tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("relay event in time")
        .expect("sink still open");
    match event {
        EngineEvent::Relay { connection, event } => {
            assert_eq!(connection, expected);
            event
        }
        other => panic!("unexpected engine event {other:?}"),
    }
}

#[tokio::test]
async fn pairs_sends_campaign_and_reports_status() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::text(r#"{"event":"pairing-artifact","data":"2@qr-payload"}"#))
            .await
            .unwrap();
        ws.send(Message::text(r#"{"event":"ready"}"#)).await.unwrap();

        let campaign: Value = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break serde_json::from_str(text.as_str()).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("relay expected a campaign, got {other:?}"),
            }
        };

        ws.send(Message::text(
            r#"{"event":"message-status","data":{"number":"+966500000000","status":"sent","index":0,"campaignId":1}}"#,
        ))
        .await
        .unwrap();
        ws.close(None).await.unwrap();
        campaign
    });

    let (sink, mut events) = forwarding_sink();
    let relay = RelayConnection::open(9, &address, sink).unwrap();
    assert_eq!(relay.connection(), 9);

    assert_eq!(next_relay_event(&mut events, 9).await, RelayEvent::Connected);
    assert_eq!(
        next_relay_event(&mut events, 9).await,
        RelayEvent::PairingArtifact("2@qr-payload".to_string())
    );
    assert_eq!(next_relay_event(&mut events, 9).await, RelayEvent::Ready);

    relay
        .start_campaign(1, vec!["+966500000000".to_string()], "Hello".to_string())
        .unwrap();

    assert_eq!(
        next_relay_event(&mut events, 9).await,
        RelayEvent::Status(StatusUpdate {
            number: "+966500000000".to_string(),
            status: WireStatus::Sent,
            index: Some(0),
            error: None,
            campaign_id: Some(1),
        })
    );
    assert!(matches!(
        next_relay_event(&mut events, 9).await,
        RelayEvent::Disconnected { .. }
    ));

    let campaign = tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(
        campaign,
        json!({
            "event": "start_campaign",
            "data": {
                "campaignId": 1,
                "recipients": ["+966500000000"],
                "message": "Hello"
            }
        })
    );
}

#[tokio::test]
async fn relay_disconnect_event_ends_the_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("ws://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::text(r#"{"event":"disconnect"}"#)).await.unwrap();
        // Drain until the client closes.
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (sink, mut events) = forwarding_sink();
    let relay = RelayConnection::open(2, &address, sink).unwrap();

    assert_eq!(next_relay_event(&mut events, 2).await, RelayEvent::Connected);
    assert_eq!(
        next_relay_event(&mut events, 2).await,
        RelayEvent::Disconnected {
            reason: Some("relay requested disconnect".to_string())
        }
    );

    tokio::time::timeout(WAIT, async {
        while relay.is_alive() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connection task stops");
}

#[tokio::test]
async fn dropping_the_connection_closes_the_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => {}
            }
        }
    });

    let (sink, mut events) = forwarding_sink();
    let relay = RelayConnection::open(5, &address, sink).unwrap();
    assert_eq!(next_relay_event(&mut events, 5).await, RelayEvent::Connected);

    drop(relay);
    tokio::time::timeout(WAIT, server)
        .await
        .expect("server sees the close")
        .unwrap();
}

#[tokio::test]
async fn unreachable_relay_reports_connect_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let (sink, mut events) = forwarding_sink();
    let _relay = RelayConnection::open(3, &address, sink).unwrap();

    assert!(matches!(
        next_relay_event(&mut events, 3).await,
        RelayEvent::ConnectFailed(_)
    ));
}

#[tokio::test]
async fn invalid_address_is_rejected_up_front() {
    let (sink, _events) = forwarding_sink();
    let err = RelayConnection::open(1, "ftp://relay.example.com", sink).err();
    assert!(matches!(err, Some(RelayError::InvalidAddress { .. })));
}

#[tokio::test]
async fn secure_addresses_reach_the_tls_handshake() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("https://{}", listener.local_addr().unwrap());

    // Accepts the TCP connection and hangs up without speaking TLS.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let (sink, mut events) = forwarding_sink();
    let _relay = RelayConnection::open(8, &address, sink).unwrap();

    match next_relay_event(&mut events, 8).await {
        RelayEvent::ConnectFailed(reason) => {
            assert!(
                !reason.contains("TLS support not compiled in"),
                "wss connect stopped before TLS: {reason}"
            );
        }
        other => panic!("expected a failed handshake, got {other:?}"),
    }
    tokio::time::timeout(WAIT, server)
        .await
        .expect("relay dialled the listener")
        .unwrap();
}
