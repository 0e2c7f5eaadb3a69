//! Reassembles messages from their text frames.

use tracing::{trace, warn};

use crate::error::ProtocolError;
use crate::message::Message;
use crate::protocol::Protocol;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Pending {
    #[default]
    Header,
    Metadata {
        header: String,
    },
    Content {
        header: String,
        metadata: String,
    },
}

/// Consumes frames in the order header, metadata, content and yields a
/// [`Message`] after each content frame.
///
/// A frame that fails to parse discards the partially received message; the
/// next frame is treated as a new header.
#[derive(Debug, Clone)]
pub struct Receiver {
    protocol: Protocol,
    pending: Pending,
}

impl Receiver {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            pending: Pending::Header,
        }
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Whether no frames of a partial message are held.
    pub fn is_idle(&self) -> bool {
        self.pending == Pending::Header
    }

    pub fn consume(&mut self, fragment: &str) -> Result<Option<Message>, ProtocolError> {
        match std::mem::take(&mut self.pending) {
            Pending::Header => {
                if let Err(e) = serde_json::from_str::<serde_json::Value>(fragment) {
                    warn!(error = %e, "discarding unparseable header frame");
                    return Err(e.into());
                }
                trace!("received header frame");
                self.pending = Pending::Metadata {
                    header: fragment.to_owned(),
                };
                Ok(None)
            }
            Pending::Metadata { header } => {
                trace!("received metadata frame");
                self.pending = Pending::Content {
                    header,
                    metadata: fragment.to_owned(),
                };
                Ok(None)
            }
            Pending::Content { header, metadata } => {
                match self.protocol.assemble(&header, &metadata, fragment) {
                    Ok(message) => Ok(Some(message)),
                    Err(e) => {
                        warn!(error = %e, "discarding malformed message");
                        Err(e)
                    }
                }
            }
        }
    }
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new(Protocol::default())
    }
}
