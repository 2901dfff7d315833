//! Transport boundary and the channel-backed implementation.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::core::{EngineError, PlayerId, Result};

use super::message::{Delivery, Outbound, Response};

/// Moves messages between the engine and the participants.
///
/// `receive` blocks until a reply is available. It returns `Ok(None)` when
/// the transport knows no reply will ever come.
pub trait Transport {
    /// Push a message to every participant.
    fn broadcast(&mut self, message: Outbound) -> Result<()>;

    /// Push a message to one participant.
    fn notify(&mut self, to: PlayerId, message: Outbound) -> Result<()>;

    /// Next inbound reply.
    fn receive(&mut self) -> Result<Option<Response>>;
}

/// The participant side of a [`ChannelTransport`].
#[derive(Clone, Debug)]
pub struct ClientEnd {
    /// Everything the engine sends.
    pub outbound: Receiver<Delivery>,
    /// Where replies go.
    pub inbound: Sender<Response>,
}

/// Transport over crossbeam channels, for hosts that run the participants on
/// other threads.
///
/// ## Example
///
/// ```
/// use rust_sgs::core::PlayerId;
/// use rust_sgs::response::{ChannelTransport, MessageKind, Outbound, Transport};
///
/// let (mut transport, client) = ChannelTransport::new();
/// transport
///     .broadcast(Outbound { identifier: MessageKind::GameOver, request: None, payload: serde_json::Value::Null })
///     .unwrap();
///
/// let delivery = client.outbound.recv().unwrap();
/// assert_eq!(delivery.to, None);
/// ```
#[derive(Debug)]
pub struct ChannelTransport {
    outbound: Sender<Delivery>,
    inbound: Receiver<Response>,
}

impl ChannelTransport {
    /// Create a connected transport and client end.
    #[must_use]
    pub fn new() -> (Self, ClientEnd) {
        let (out_tx, out_rx) = unbounded();
        let (in_tx, in_rx) = unbounded();
        (
            Self {
                outbound: out_tx,
                inbound: in_rx,
            },
            ClientEnd {
                outbound: out_rx,
                inbound: in_tx,
            },
        )
    }

    fn send(&self, delivery: Delivery) -> Result<()> {
        self.outbound
            .send(delivery)
            .map_err(|_| EngineError::TransportClosed)
    }
}

impl Transport for ChannelTransport {
    fn broadcast(&mut self, message: Outbound) -> Result<()> {
        self.send(Delivery { to: None, message })
    }

    fn notify(&mut self, to: PlayerId, message: Outbound) -> Result<()> {
        self.send(Delivery {
            to: Some(to),
            message,
        })
    }

    fn receive(&mut self) -> Result<Option<Response>> {
        self.inbound
            .recv()
            .map(Some)
            .map_err(|_| EngineError::TransportClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::message::{MessageKind, Reply, RequestId, RequestKind};

    #[test]
    fn test_round_trip_through_channels() {
        let (mut transport, client) = ChannelTransport::new();

        transport
            .notify(
                PlayerId::new(1),
                Outbound {
                    identifier: MessageKind::Request(RequestKind::Peach),
                    request: Some(RequestId(1)),
                    payload: serde_json::Value::Null,
                },
            )
            .unwrap();

        let delivery = client.outbound.recv().unwrap();
        assert_eq!(delivery.to, Some(PlayerId::new(1)));

        client
            .inbound
            .send(Response {
                request: RequestId(1),
                kind: RequestKind::Peach,
                from: PlayerId::new(1),
                reply: Reply::Decline,
            })
            .unwrap();

        let response = transport.receive().unwrap().unwrap();
        assert_eq!(response.request, RequestId(1));
    }

    #[test]
    fn test_closed_client_is_an_error() {
        let (mut transport, client) = ChannelTransport::new();
        drop(client);

        assert!(matches!(transport.receive(), Err(EngineError::TransportClosed)));
        let sent = transport.broadcast(Outbound {
            identifier: MessageKind::GameOver,
            request: None,
            payload: serde_json::Value::Null,
        });
        assert!(matches!(sent, Err(EngineError::TransportClosed)));
    }
}
