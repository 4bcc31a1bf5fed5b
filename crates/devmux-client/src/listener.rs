use std::collections::VecDeque;

use tracing::{debug, warn};

use devmux_wire::{
    DetachRecord, DeviceRecord, Envelope, MessageKind, MuxRequest, ResultRecord, MSG_ATTACHED,
    MSG_DETACHED, TAG_LISTEN,
};

use crate::connection::{ClientConfig, Connection};
use crate::error::{ClientError, Result};
use crate::router::Reply;

/// An unsolicited device change reported by the daemon.
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    Attached(DeviceRecord),
    Detached(u64),
}

/// Subscribes to the daemon's attach/detach notification stream.
pub struct NotificationListener {
    config: ClientConfig,
}

impl NotificationListener {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Open a dedicated socket, send `Listen`, and await the daemon's
    /// acknowledgment. A nonzero result code refuses the subscription.
    ///
    /// The daemon may emit notifications for already-attached devices in
    /// the same read that carries the acknowledgment; those are queued and
    /// come out of the returned iterator first.
    pub fn subscribe(&self) -> Result<Notifications> {
        let mut connection = Connection::connect(&self.config)?;
        connection.send(&MuxRequest::listen(), TAG_LISTEN)?;

        let mut pending = VecDeque::new();
        let mut acked = false;
        while !acked {
            for envelope in connection.read_envelopes()? {
                if envelope.tag == TAG_LISTEN && !acked {
                    let ack = <ResultRecord as Reply>::decode(&envelope.body)?;
                    if !ack.ok() {
                        return Err(ClientError::RequestRefused { code: ack.number });
                    }
                    acked = true;
                    debug!("listen subscription acknowledged");
                } else {
                    pending.push_back(envelope);
                }
            }
        }

        Ok(Notifications {
            connection,
            pending,
            done: false,
        })
    }
}

/// A blocking stream of [`DeviceEvent`]s. Unbounded; ends only when the
/// connection fails, after which the iterator yields the error once and
/// then `None` forever.
#[derive(Debug)]
pub struct Notifications {
    connection: Connection,
    pending: VecDeque<Envelope>,
    done: bool,
}

impl Iterator for Notifications {
    type Item = Result<DeviceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            while let Some(envelope) = self.pending.pop_front() {
                if let Some(event) = classify(&envelope.body) {
                    return Some(Ok(event));
                }
            }
            match self.connection.read_envelopes() {
                Ok(envelopes) => self.pending.extend(envelopes),
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Sort one unsolicited message into an event, or drop it. Messages of
/// foreign kinds and bodies that do not decode are logged and skipped;
/// the stream itself never fails over a single bad message.
fn classify(body: &plist::Value) -> Option<DeviceEvent> {
    let kind: MessageKind = match plist::from_value(body) {
        Ok(kind) => kind,
        Err(err) => {
            warn!(error = %err, "dropping unreadable notification");
            return None;
        }
    };
    match kind.message_type.as_str() {
        MSG_ATTACHED => match plist::from_value::<DeviceRecord>(body) {
            Ok(record) => Some(DeviceEvent::Attached(record)),
            Err(err) => {
                warn!(error = %err, "dropping malformed attach notification");
                None
            }
        },
        MSG_DETACHED => match plist::from_value::<DetachRecord>(body) {
            Ok(record) => Some(DeviceEvent::Detached(record.device_id)),
            Err(err) => {
                warn!(error = %err, "dropping malformed detach notification");
                None
            }
        },
        other => {
            debug!(message_type = other, "ignoring notification");
            None
        }
    }
}
