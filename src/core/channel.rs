//! Chat channel manager
//!
//! Owns one socket connection for one authenticated session and presents
//! the reconciled, append-only message log. Locally-originated sends are
//! echoed immediately with a correlation id; the server's echo of the
//! same message is suppressed while that id is still pending.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::message::ChatMessage;
use crate::core::wire::WireEvent;

/// How long a pending send waits for its server echo before the echo is
/// treated as an independent message again.
const ECHO_SUPPRESS_WINDOW: Duration = Duration::from_secs(10);

/// Everything the channel can observe once the handshake starts.
#[derive(Debug)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    Message(ChatMessage),
    SystemNotice(String),
}

/// Handle to the socket task. Owned exclusively by one manager and
/// closed, never reused.
#[derive(Debug)]
pub struct ChannelHandle {
    pub outbound: mpsc::UnboundedSender<WireEvent>,
    pub cancel: CancellationToken,
}

struct PendingSend {
    id: Uuid,
    text: String,
    sent_at: Instant,
}

pub struct ChannelManager {
    username: String,
    handle: Option<ChannelHandle>,
    log: Vec<ChatMessage>,
    pending: Vec<PendingSend>,
    connected: bool,
    closed: bool,
}

impl ChannelManager {
    pub fn open(username: impl Into<String>, handle: ChannelHandle) -> Self {
        Self {
            username: username.into(),
            handle: Some(handle),
            log: Vec::new(),
            pending: Vec::new(),
            connected: false,
            closed: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.log
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Apply one channel event. A closed manager ignores everything: no
    /// log append can happen after teardown.
    pub fn handle_event(&mut self, event: ChannelEvent) {
        if self.closed {
            return;
        }
        match event {
            ChannelEvent::Connected => self.connected = true,
            ChannelEvent::Disconnected => self.connected = false,
            ChannelEvent::Message(message) => {
                if self.consumes_pending_echo(&message) {
                    return;
                }
                self.log.push(message);
            }
            ChannelEvent::SystemNotice(text) => {
                self.log.push(ChatMessage::system(text));
            }
        }
    }

    /// Submit text typed by the local user. Returns the correlation id of
    /// the send, or `None` when the submit is inert (blank input, no
    /// connection, or a torn-down channel). Fire-and-forget: there is no
    /// retry on failure.
    pub fn send(&mut self, input: &str) -> Option<Uuid> {
        if self.closed || !self.connected || input.trim().is_empty() {
            return None;
        }
        let handle = self.handle.as_ref()?;

        let id = Uuid::new_v4();
        handle
            .outbound
            .send(WireEvent::SendMessage {
                text: input.to_string(),
            })
            .ok()?;

        self.pending.push(PendingSend {
            id,
            text: input.to_string(),
            sent_at: Instant::now(),
        });
        self.log
            .push(ChatMessage::local_echo(self.username.clone(), input, id));
        Some(id)
    }

    /// Whether an inbound message is the server's echo of one of our own
    /// still-pending sends. Matches by correlation id when the server
    /// carries it through, by sender+text otherwise; either way the
    /// pending entry is consumed, so a repeated identical message still
    /// displays.
    fn consumes_pending_echo(&mut self, message: &ChatMessage) -> bool {
        let now = Instant::now();
        self.pending
            .retain(|p| now.duration_since(p.sent_at) <= ECHO_SUPPRESS_WINDOW);

        if message.is_system || message.username != self.username {
            return false;
        }
        let position = match message.client_id {
            Some(id) => self.pending.iter().position(|p| p.id == id),
            None => self.pending.iter().position(|p| p.text == message.text),
        };
        match position {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Tear down the connection. Idempotent; the underlying socket is
    /// cancelled exactly once because the handle is dropped here.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.connected = false;
        self.pending.clear();
        if let Some(handle) = self.handle.take() {
            handle.cancel.cancel();
        }
    }

    #[cfg(test)]
    fn age_pending(&mut self, by: Duration) {
        for pending in &mut self.pending {
            pending.sent_at = pending
                .sent_at
                .checked_sub(by)
                .expect("instant underflow in test");
        }
    }
}

impl Drop for ChannelManager {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_manager() -> (ChannelManager, mpsc::UnboundedReceiver<WireEvent>) {
        let (manager, rx, _cancel) = manager_with_cancel();
        (manager, rx)
    }

    fn manager_with_cancel() -> (
        ChannelManager,
        mpsc::UnboundedReceiver<WireEvent>,
        CancellationToken,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = ChannelHandle {
            outbound: tx,
            cancel: cancel.clone(),
        };
        let mut manager = ChannelManager::open("al", handle);
        manager.handle_event(ChannelEvent::Connected);
        (manager, rx, cancel)
    }

    fn inbound(username: &str, text: &str) -> ChatMessage {
        ChatMessage {
            username: username.to_string(),
            text: text.to_string(),
            timestamp: chrono::Utc::now(),
            is_system: false,
            client_id: None,
        }
    }

    #[test]
    fn send_echoes_locally_and_emits_one_wire_event() {
        let (mut manager, mut rx) = connected_manager();

        assert!(manager.send("hi").is_some());

        assert_eq!(manager.messages().len(), 1);
        let echo = &manager.messages()[0];
        assert_eq!(echo.username, "al");
        assert_eq!(echo.text, "hi");
        assert!(!echo.is_system);
        assert!(echo.client_id.is_some());

        assert_eq!(
            rx.try_recv().expect("one frame"),
            WireEvent::SendMessage {
                text: "hi".to_string()
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn blank_input_is_inert() {
        let (mut manager, mut rx) = connected_manager();

        assert!(manager.send("").is_none());
        assert!(manager.send("   \t ").is_none());

        assert!(manager.messages().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn sending_before_the_handshake_is_inert() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = ChannelHandle {
            outbound: tx,
            cancel: CancellationToken::new(),
        };
        let mut manager = ChannelManager::open("al", handle);

        assert!(manager.send("hi").is_none());
        assert!(manager.messages().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn sending_after_disconnect_is_inert() {
        let (mut manager, mut rx) = connected_manager();
        manager.handle_event(ChannelEvent::Disconnected);

        assert!(manager.send("hi").is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn log_preserves_arrival_order_across_all_producers() {
        let (mut manager, _rx) = connected_manager();

        manager.handle_event(ChannelEvent::Message(inbound("bob", "first")));
        manager.handle_event(ChannelEvent::SystemNotice("carol joined".to_string()));
        assert!(manager.send("second").is_some());
        manager.handle_event(ChannelEvent::Message(inbound("bob", "third")));

        let texts: Vec<&str> = manager.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "carol joined", "second", "third"]);
    }

    #[test]
    fn system_notifications_are_wrapped() {
        let (mut manager, _rx) = connected_manager();
        manager.handle_event(ChannelEvent::SystemNotice("bob joined".to_string()));

        let entry = &manager.messages()[0];
        assert_eq!(entry.username, "System");
        assert_eq!(entry.text, "bob joined");
        assert!(entry.is_system);
    }

    #[test]
    fn server_echo_of_a_pending_send_is_suppressed_once() {
        let (mut manager, _rx) = connected_manager();
        assert!(manager.send("hi").is_some());

        manager.handle_event(ChannelEvent::Message(inbound("al", "hi")));
        assert_eq!(manager.messages().len(), 1);

        // The pending entry was consumed, so the same words sent by us
        // again later (here: arriving without a fresh send) append.
        manager.handle_event(ChannelEvent::Message(inbound("al", "hi")));
        assert_eq!(manager.messages().len(), 2);
    }

    #[test]
    fn server_echo_matches_by_correlation_id_when_present() {
        let (mut manager, _rx) = connected_manager();
        let id = manager.send("hi").expect("send accepted");

        let mut echo = inbound("al", "hi");
        echo.client_id = Some(id);
        manager.handle_event(ChannelEvent::Message(echo));

        assert_eq!(manager.messages().len(), 1);
    }

    #[test]
    fn same_text_from_another_user_is_not_suppressed() {
        let (mut manager, _rx) = connected_manager();
        assert!(manager.send("hi").is_some());

        manager.handle_event(ChannelEvent::Message(inbound("bob", "hi")));
        assert_eq!(manager.messages().len(), 2);
    }

    #[test]
    fn echoes_outside_the_window_append_normally() {
        let (mut manager, _rx) = connected_manager();
        assert!(manager.send("hi").is_some());
        manager.age_pending(ECHO_SUPPRESS_WINDOW + Duration::from_secs(1));

        manager.handle_event(ChannelEvent::Message(inbound("al", "hi")));
        assert_eq!(manager.messages().len(), 2);
    }

    #[test]
    fn close_cancels_the_socket_exactly_once() {
        let (mut manager, _rx, cancel) = manager_with_cancel();
        assert!(!cancel.is_cancelled());

        manager.close();
        assert!(cancel.is_cancelled());

        // Idempotent: a second close finds no handle left to cancel.
        manager.close();
    }

    #[test]
    fn nothing_lands_in_the_log_after_close() {
        let (mut manager, mut rx) = connected_manager();
        assert!(manager.send("before").is_some());
        manager.close();

        manager.handle_event(ChannelEvent::Message(inbound("bob", "late")));
        manager.handle_event(ChannelEvent::SystemNotice("late notice".to_string()));
        assert!(manager.send("after").is_none());

        let texts: Vec<&str> = manager.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["before"]);

        // "before" went out; nothing after the close did.
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropping_the_manager_releases_the_connection() {
        let (manager, _rx, cancel) = manager_with_cancel();
        drop(manager);
        assert!(cancel.is_cancelled());
    }
}
