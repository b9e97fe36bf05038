//! The single-task actor owning every connection's state, the event
//! registry, and the in-memory collaborators behind dispatch.
//!
//! Connection I/O tasks never touch protocol state directly: they forward
//! raw bytes and lifecycle events here over an unbounded channel, and the
//! hub writes replies back out through each connection's own outbox.

use std::collections::HashMap;

use tokio::sync::mpsc;

use core::auth::AuthConfig;
use core::connection::Connection;
use core::dialect;
use core::dispatch::{self, Outcome};
use core::error::ReplyCode;
use core::events::{EventKind, Registry};
use core::framing::MultilineCollector;
use core::logbridge::LogMessage;
use core::writer;

use crate::reference::ReferenceCollaborators;

/// Opaque per-connection identity, assigned by the listener loop.
pub type ConnId = u64;

/// Everything the hub can be told by a connection task or the log bridge.
pub enum ToHub {
    /// A connection was accepted; `outbox` carries reply bytes back to its
    /// writer half.
    Accepted {
        /// Connection identity.
        id: ConnId,
        /// Channel the hub uses to send bytes back to this connection.
        outbox: mpsc::UnboundedSender<Vec<u8>>,
    },
    /// Bytes read from a connection's socket.
    Data {
        /// Which connection these bytes belong to.
        id: ConnId,
        /// The bytes themselves.
        bytes: Vec<u8>,
    },
    /// A connection's socket closed.
    Disconnected {
        /// Which connection closed.
        id: ConnId,
    },
    /// A log message forwarded from the tracing bridge, already past the
    /// suppression check.
    Log(LogMessage),
}

struct PendingMultiline {
    command: String,
    header: Vec<u8>,
    collector: MultilineCollector,
}

struct HubConnection {
    conn: Connection,
    pending_multiline: Option<PendingMultiline>,
    outbox: mpsc::UnboundedSender<Vec<u8>>,
    dialect_checked: bool,
}

/// Owns every connection, the event-subscription registry, and the
/// reference collaborator implementations; processes one message at a
/// time, so no locking is needed anywhere in the protocol engine.
pub struct Hub {
    auth: AuthConfig,
    connections: HashMap<ConnId, HubConnection>,
    registry: Registry<ConnId>,
    collaborators: ReferenceCollaborators,
}

impl Hub {
    /// Creates a hub that accepts connections under `auth`. `config_file_path`
    /// is reported back through `GETINFO config-file`.
    #[must_use]
    pub fn new(auth: AuthConfig, config_file_path: Option<String>) -> Self {
        Self {
            auth,
            connections: HashMap::new(),
            registry: Registry::new(),
            collaborators: ReferenceCollaborators::new(config_file_path),
        }
    }

    /// Runs the actor loop until every sender half of `inbox` is dropped.
    pub async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<ToHub>) {
        while let Some(message) = inbox.recv().await {
            self.handle(message);
        }
    }

    fn handle(&mut self, message: ToHub) {
        match message {
            ToHub::Accepted { id, outbox } => {
                self.connections.insert(
                    id,
                    HubConnection {
                        conn: Connection::new(),
                        pending_multiline: None,
                        outbox,
                        dialect_checked: false,
                    },
                );
            }
            ToHub::Data { id, bytes } => self.handle_data(id, &bytes),
            ToHub::Disconnected { id } => self.close_connection(id),
            ToHub::Log(message) => self.handle_log(message),
        }
    }

    fn handle_data(&mut self, id: ConnId, bytes: &[u8]) {
        let Some(hub_conn) = self.connections.get_mut(&id) else {
            return;
        };
        if !hub_conn.dialect_checked {
            hub_conn.dialect_checked = true;
            if let Some(err) = dialect::reject_if_unsupported(dialect::classify(bytes)) {
                self.send(id, writer::single(ReplyCode::Internal, &err.to_string()));
                self.close_connection(id);
                return;
            }
        }
        if hub_conn.conn.reader_mut().feed(bytes).is_err() {
            self.close_connection(id);
            return;
        }
        loop {
            let Some(hub_conn) = self.connections.get_mut(&id) else {
                return;
            };
            let Some(line) = hub_conn.conn.reader_mut().take_line() else {
                return;
            };
            self.handle_line(id, line);
        }
    }

    fn handle_line(&mut self, id: ConnId, line: Vec<u8>) {
        let pending = match self.connections.get_mut(&id) {
            Some(hub_conn) => hub_conn.pending_multiline.take(),
            None => return,
        };

        if let Some(mut pending) = pending {
            match pending.collector.push_line(line) {
                Some(body) => {
                    let outcome = {
                        let mut collaborators = self.collaborators.as_dispatch_collaborators();
                        dispatch::dispatch_multiline(&mut collaborators, &pending.command, &pending.header, &body)
                    };
                    self.apply_outcome(id, outcome);
                }
                None => {
                    if let Some(hub_conn) = self.connections.get_mut(&id) {
                        hub_conn.pending_multiline = Some(pending);
                    }
                }
            }
            return;
        }

        let outcome = {
            let mut collaborators = self.collaborators.as_dispatch_collaborators();
            let Some(hub_conn) = self.connections.get_mut(&id) else {
                return;
            };
            dispatch::dispatch_line(&mut hub_conn.conn, &self.auth, &mut collaborators, &line)
        };
        self.apply_outcome(id, outcome);
    }

    fn apply_outcome(&mut self, id: ConnId, outcome: Outcome) {
        match outcome {
            Outcome::Reply { bytes, close, events } => {
                self.send(id, bytes);
                for event in events {
                    self.fanout(event.kind, &event.body, event.extra.as_deref());
                }
                if close {
                    self.close_connection(id);
                } else {
                    self.sync_registered_events(id);
                }
            }
            Outcome::AwaitMultiline { command, header } => {
                if let Some(hub_conn) = self.connections.get_mut(&id) {
                    hub_conn.pending_multiline = Some(PendingMultiline {
                        command,
                        header,
                        collector: MultilineCollector::new(),
                    });
                }
            }
        }
    }

    fn handle_log(&mut self, message: LogMessage) {
        let kind = message.severity.event_kind();
        self.fanout(kind, &message.text, None);
    }

    fn send(&self, id: ConnId, bytes: Vec<u8>) {
        if let Some(hub_conn) = self.connections.get(&id) {
            let _ = hub_conn.outbox.send(bytes);
        }
    }

    fn fanout(&self, kind: EventKind, body: &str, extra: Option<&str>) {
        for (id, format) in self.registry.interested_in(kind) {
            let line = writer::event_line(kind, format, body, extra);
            self.send(id, line);
        }
    }

    fn sync_registered_events(&mut self, id: ConnId) {
        if let Some(hub_conn) = self.connections.get(&id) {
            let mask = hub_conn.conn.event_mask();
            let format = hub_conn.conn.event_format();
            self.registry.set_events(id, mask, format);
        }
    }

    fn close_connection(&mut self, id: ConnId) {
        self.connections.remove(&id);
        self.registry.remove(id);
    }
}

/// Forwards already-suppression-checked `tracing` events into the hub,
/// where they become `LOG*` events for subscribed controllers.
#[derive(Clone)]
pub struct HubLogSink {
    tx: mpsc::UnboundedSender<ToHub>,
}

impl HubLogSink {
    /// Wraps a sender into the hub's inbox.
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<ToHub>) -> Self {
        Self { tx }
    }
}

impl logging::LogSink for HubLogSink {
    fn deliver(&self, message: LogMessage) {
        let _ = self.tx.send(ToHub::Log(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::auth::AuthConfig;
    use core::logbridge::Severity;

    async fn spawn_hub() -> mpsc::UnboundedSender<ToHub> {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Hub::new(AuthConfig::default(), None);
        tokio::spawn(hub.run(rx));
        tx
    }

    async fn connect(hub_tx: &mpsc::UnboundedSender<ToHub>, id: ConnId) -> mpsc::UnboundedReceiver<Vec<u8>> {
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        hub_tx.send(ToHub::Accepted { id, outbox: outbox_tx }).unwrap();
        outbox_rx
    }

    #[tokio::test]
    async fn authenticate_then_quit_round_trips() {
        let hub_tx = spawn_hub().await;
        let mut outbox = connect(&hub_tx, 1).await;

        hub_tx
            .send(ToHub::Data {
                id: 1,
                bytes: b"AUTHENTICATE\r\n".to_vec(),
            })
            .unwrap();
        assert_eq!(outbox.recv().await.unwrap(), b"250 OK\r\n");

        hub_tx
            .send(ToHub::Data {
                id: 1,
                bytes: b"QUIT\r\n".to_vec(),
            })
            .unwrap();
        assert_eq!(outbox.recv().await.unwrap(), b"250 closing connection\r\n");
    }

    #[tokio::test]
    async fn subscribed_connection_receives_launched_circuit_event() {
        let hub_tx = spawn_hub().await;
        let mut outbox = connect(&hub_tx, 1).await;

        hub_tx
            .send(ToHub::Data {
                id: 1,
                bytes: b"AUTHENTICATE\r\n".to_vec(),
            })
            .unwrap();
        outbox.recv().await.unwrap();

        hub_tx
            .send(ToHub::Data {
                id: 1,
                bytes: b"SETEVENTS CIRC\r\n".to_vec(),
            })
            .unwrap();
        outbox.recv().await.unwrap();

        hub_tx
            .send(ToHub::Data {
                id: 1,
                bytes: b"EXTENDCIRCUIT 0 relay1\r\n".to_vec(),
            })
            .unwrap();
        let command_reply = outbox.recv().await.unwrap();
        assert!(command_reply.starts_with(b"250 EXTENDED"));
        assert_eq!(outbox.recv().await.unwrap(), b"650 CIRC 1 LAUNCHED\r\n");
    }

    #[tokio::test]
    async fn extended_subscriber_receives_the_at_tail_plain_subscriber_does_not() {
        let hub_tx = spawn_hub().await;
        let mut plain = connect(&hub_tx, 1).await;
        let mut extended = connect(&hub_tx, 2).await;

        for (id, outbox) in [(1u64, &mut plain), (2u64, &mut extended)] {
            hub_tx
                .send(ToHub::Data {
                    id,
                    bytes: b"AUTHENTICATE\r\n".to_vec(),
                })
                .unwrap();
            outbox.recv().await.unwrap();
        }

        hub_tx
            .send(ToHub::Data {
                id: 2,
                bytes: b"USEFEATURE EXTENDED_EVENTS\r\n".to_vec(),
            })
            .unwrap();
        extended.recv().await.unwrap();

        for id in [1u64, 2u64] {
            hub_tx
                .send(ToHub::Data {
                    id,
                    bytes: b"SETEVENTS CIRC\r\n".to_vec(),
                })
                .unwrap();
        }
        plain.recv().await.unwrap();
        extended.recv().await.unwrap();

        hub_tx
            .send(ToHub::Data {
                id: 1,
                bytes: b"EXTENDCIRCUIT 0 relay1\r\n".to_vec(),
            })
            .unwrap();
        let command_reply = plain.recv().await.unwrap();
        assert!(command_reply.starts_with(b"250 EXTENDED"));

        assert_eq!(plain.recv().await.unwrap(), b"650 CIRC 1 LAUNCHED\r\n");
        assert_eq!(
            extended.recv().await.unwrap(),
            b"650 CIRC 1 LAUNCHED @PURPOSE=GENERAL\r\n"
        );
    }

    #[tokio::test]
    async fn legacy_binary_dialect_is_rejected_and_closes_the_connection() {
        let hub_tx = spawn_hub().await;
        let mut outbox = connect(&hub_tx, 1).await;

        hub_tx
            .send(ToHub::Data {
                id: 1,
                bytes: vec![0x80, 0x01, 0x02, 0x03],
            })
            .unwrap();

        let reply = outbox.recv().await.unwrap();
        assert!(reply.starts_with(b"551"), "expected an internal-error frame, got {reply:?}");
        assert!(outbox.recv().await.is_none(), "connection should have been closed");
    }

    #[tokio::test]
    async fn log_message_fans_out_to_subscribed_connection() {
        let hub_tx = spawn_hub().await;
        let mut outbox = connect(&hub_tx, 1).await;

        hub_tx
            .send(ToHub::Data {
                id: 1,
                bytes: b"AUTHENTICATE\r\n".to_vec(),
            })
            .unwrap();
        outbox.recv().await.unwrap();

        hub_tx
            .send(ToHub::Data {
                id: 1,
                bytes: b"SETEVENTS ERR\r\n".to_vec(),
            })
            .unwrap();
        outbox.recv().await.unwrap();

        hub_tx
            .send(ToHub::Log(LogMessage {
                severity: Severity::Err,
                text: "disk nearly full".to_string(),
            }))
            .unwrap();
        assert_eq!(outbox.recv().await.unwrap(), b"650 ERR disk nearly full\r\n");
    }

    #[tokio::test]
    async fn unsubscribed_connection_does_not_receive_events() {
        let hub_tx = spawn_hub().await;
        let mut outbox = connect(&hub_tx, 1).await;

        hub_tx
            .send(ToHub::Data {
                id: 1,
                bytes: b"AUTHENTICATE\r\n".to_vec(),
            })
            .unwrap();
        outbox.recv().await.unwrap();

        hub_tx
            .send(ToHub::Data {
                id: 1,
                bytes: b"EXTENDCIRCUIT 0 relay1\r\n".to_vec(),
            })
            .unwrap();
        let command_reply = outbox.recv().await.unwrap();
        assert!(command_reply.starts_with(b"250 EXTENDED"));
        assert!(outbox.try_recv().is_err(), "no event should have been forwarded");
    }
}
