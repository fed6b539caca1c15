//! Socket task for the chat channel
//!
//! Connects to the server with the session token on the upgrade request,
//! then pumps frames both ways until cancelled or the transport drops.
//! Connection failures surface as a `Disconnected` event; the screen
//! shows the absence of the connected indicator rather than a banner.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::channel::{ChannelEvent, ChannelHandle};
use crate::core::wire::WireEvent;

/// Spawn the socket task for one session. The returned handle is the
/// only way to reach the connection; cancelling it ends the task.
pub fn spawn(
    ws_url: String,
    token: String,
    events: mpsc::UnboundedSender<ChannelEvent>,
) -> ChannelHandle {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let handle = ChannelHandle {
        outbound: outbound_tx,
        cancel: cancel.clone(),
    };

    tokio::spawn(async move {
        run(ws_url, token, events, outbound_rx, cancel).await;
    });

    handle
}

async fn run(
    ws_url: String,
    token: String,
    events: mpsc::UnboundedSender<ChannelEvent>,
    mut outbound: mpsc::UnboundedReceiver<WireEvent>,
    cancel: CancellationToken,
) {
    let request = match build_handshake(&ws_url, &token) {
        Ok(request) => request,
        Err(e) => {
            warn!("invalid websocket handshake request: {e}");
            let _ = events.send(ChannelEvent::Disconnected);
            return;
        }
    };

    let ws_stream = tokio::select! {
        connected = connect_async(request) => match connected {
            Ok((stream, _)) => stream,
            Err(e) => {
                debug!("websocket handshake failed: {e}");
                let _ = events.send(ChannelEvent::Disconnected);
                return;
            }
        },
        _ = cancel.cancelled() => return,
    };

    let _ = events.send(ChannelEvent::Connected);
    let (mut sink, mut stream) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(WsMessage::Close(None)).await;
                break;
            }
            command = outbound.recv() => match command {
                Some(event) => match event.encode() {
                    Ok(frame) => {
                        if sink.send(WsMessage::Text(frame)).await.is_err() {
                            let _ = events.send(ChannelEvent::Disconnected);
                            break;
                        }
                    }
                    Err(e) => warn!("dropping unencodable frame: {e}"),
                },
                // The manager dropped its handle; treat it as teardown.
                None => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => dispatch_frame(&text, &events),
                Some(Ok(WsMessage::Ping(payload))) => {
                    let _ = sink.send(WsMessage::Pong(payload)).await;
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    let _ = events.send(ChannelEvent::Disconnected);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("websocket read failed: {e}");
                    let _ = events.send(ChannelEvent::Disconnected);
                    break;
                }
            },
        }
    }
}

fn build_handshake(
    ws_url: &str,
    token: &str,
) -> Result<Request, Box<dyn std::error::Error + Send + Sync>> {
    let mut request = ws_url.into_client_request()?;
    let bearer = HeaderValue::from_str(&format!("Bearer {token}"))?;
    request.headers_mut().insert(AUTHORIZATION, bearer);
    Ok(request)
}

fn dispatch_frame(text: &str, events: &mpsc::UnboundedSender<ChannelEvent>) {
    match WireEvent::decode(text) {
        Ok(WireEvent::ReceiveMessage(message)) => {
            let _ = events.send(ChannelEvent::Message(message));
        }
        Ok(WireEvent::SystemNotification { message }) => {
            let _ = events.send(ChannelEvent::SystemNotice(message));
        }
        Ok(WireEvent::SendMessage { .. }) => {
            debug!("ignoring send-message frame from server");
        }
        Err(e) => debug!("ignoring malformed frame: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_carries_the_bearer_token() {
        let request = build_handshake("ws://chat.example.com/ws", "t1").expect("handshake");
        let auth = request
            .headers()
            .get(AUTHORIZATION)
            .expect("authorization header");
        assert_eq!(auth.to_str().expect("ascii"), "Bearer t1");
    }

    #[test]
    fn inbound_chat_frames_become_message_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch_frame(
            r#"{"event":"receive-message","data":{"username":"bob","text":"hey","timestamp":"2026-08-08T12:00:00Z"}}"#,
            &tx,
        );

        match rx.try_recv().expect("event") {
            ChannelEvent::Message(message) => assert_eq!(message.text, "hey"),
            other => panic!("expected message event, got {other:?}"),
        }
    }

    #[test]
    fn system_frames_become_notice_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch_frame(
            r#"{"event":"system-notification","data":{"message":"bob joined"}}"#,
            &tx,
        );

        match rx.try_recv().expect("event") {
            ChannelEvent::SystemNotice(message) => assert_eq!(message, "bob joined"),
            other => panic!("expected notice event, got {other:?}"),
        }
    }

    #[test]
    fn malformed_frames_are_dropped_silently() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch_frame("not json", &tx);
        dispatch_frame(r#"{"event":"send-message","data":{"text":"loopback"}}"#, &tx);
        assert!(rx.try_recv().is_err());
    }
}
