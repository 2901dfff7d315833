//! Deterministic in-process transport for bots and tests.
//!
//! Replies are scripted per `(RequestKind, PlayerId)` key with a latency.
//! Requests with no script left fall back to an optional responder closure;
//! without one the request simply never gets an answer. Pending replies are
//! delivered in `(send time + latency, send order)` order, so races between
//! participants are reproducible.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::{PlayerId, Result};

use super::message::{Delivery, MessageKind, Outbound, Reply, RequestKind, Response};
use super::transport::Transport;

type Responder = Box<dyn FnMut(PlayerId, &Outbound) -> Option<Reply>>;

/// Shared record of everything a [`ScriptedTransport`] was asked to send.
#[derive(Clone, Debug, Default)]
pub struct Outbox(Rc<RefCell<Vec<Delivery>>>);

impl Outbox {
    /// Every delivery so far, oldest first.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.0.borrow().clone()
    }

    /// Deliveries carrying `identifier`.
    #[must_use]
    pub fn of_kind(&self, identifier: MessageKind) -> Vec<Delivery> {
        self.0
            .borrow()
            .iter()
            .filter(|d| d.message.identifier == identifier)
            .cloned()
            .collect()
    }

    /// Requests of `kind` sent to `player`.
    #[must_use]
    pub fn requests_to(&self, kind: RequestKind, player: PlayerId) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|d| d.to == Some(player) && d.message.identifier == MessageKind::Request(kind))
            .count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, delivery: Delivery) {
        self.0.borrow_mut().push(delivery);
    }
}

/// Transport answering from a script.
///
/// ## Example
///
/// ```
/// use rust_sgs::core::PlayerId;
/// use rust_sgs::response::{Reply, RequestKind, ResponseCoordinator, ScriptedTransport};
///
/// let mut transport = ScriptedTransport::new();
/// transport.script(RequestKind::Peach, PlayerId::new(1), Reply::Decline);
///
/// let mut responses = ResponseCoordinator::new(Box::new(transport));
/// let reply = responses
///     .await_one(RequestKind::Peach, PlayerId::new(1), serde_json::Value::Null)
///     .unwrap();
/// assert!(reply.is_decline());
/// ```
pub struct ScriptedTransport {
    scripts: FxHashMap<(RequestKind, PlayerId), VecDeque<(Reply, u64)>>,
    fallback: Option<Responder>,
    pending: BTreeMap<(u64, u64), Response>,
    clock: u64,
    sent: u64,
    outbox: Outbox,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("scripts", &self.scripts)
            .field("fallback", &self.fallback.is_some())
            .field("pending", &self.pending.len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scripts: FxHashMap::default(),
            fallback: None,
            pending: BTreeMap::new(),
            clock: 0,
            sent: 0,
            outbox: Outbox::default(),
        }
    }

    /// Queue an immediate answer for the next request of `kind` to `player`.
    pub fn script(&mut self, kind: RequestKind, player: PlayerId, reply: Reply) -> &mut Self {
        self.script_after(kind, player, reply, 0)
    }

    /// Queue an answer that arrives `latency` ticks after the request.
    pub fn script_after(
        &mut self,
        kind: RequestKind,
        player: PlayerId,
        reply: Reply,
        latency: u64,
    ) -> &mut Self {
        self.scripts
            .entry((kind, player))
            .or_default()
            .push_back((reply, latency));
        self
    }

    /// Answer unscripted requests with `responder` (builder pattern).
    #[must_use]
    pub fn with_fallback(
        mut self,
        responder: impl FnMut(PlayerId, &Outbound) -> Option<Reply> + 'static,
    ) -> Self {
        self.fallback = Some(Box::new(responder));
        self
    }

    /// Handle to the record of sent messages.
    #[must_use]
    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Scripted answers not yet consumed.
    #[must_use]
    pub fn unused_scripts(&self) -> usize {
        self.scripts.values().map(VecDeque::len).sum()
    }

    fn answer(&mut self, to: PlayerId, kind: RequestKind, message: &Outbound) -> Option<(Reply, u64)> {
        if let Some(next) = self.scripts.get_mut(&(kind, to)).and_then(VecDeque::pop_front) {
            return Some(next);
        }
        let responder = self.fallback.as_mut()?;
        responder(to, message).map(|reply| (reply, 0))
    }
}

impl Transport for ScriptedTransport {
    fn broadcast(&mut self, message: Outbound) -> Result<()> {
        self.outbox.push(Delivery { to: None, message });
        Ok(())
    }

    fn notify(&mut self, to: PlayerId, message: Outbound) -> Result<()> {
        if let (MessageKind::Request(kind), Some(request)) = (message.identifier, message.request) {
            if let Some((reply, latency)) = self.answer(to, kind, &message) {
                self.sent += 1;
                self.pending.insert(
                    (self.clock + latency, self.sent),
                    Response {
                        request,
                        kind,
                        from: to,
                        reply,
                    },
                );
            }
        }
        self.outbox.push(Delivery {
            to: Some(to),
            message,
        });
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Response>> {
        Ok(self.pending.pop_first().map(|((at, _), response)| {
            self.clock = self.clock.max(at);
            response
        }))
    }
}
