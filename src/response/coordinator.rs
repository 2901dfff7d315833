//! Request groups over a transport.
//!
//! At most one request is outstanding per `(RequestKind, PlayerId)` key. A
//! new request on a key supersedes the old one, and a race that resolves
//! invalidates the rest of its group, so a late reply can never answer a
//! later, unrelated request on the same key.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{EngineError, PlayerId, Result};

use super::message::{MessageKind, Outbound, RequestId, RequestKind, Response};
use super::transport::Transport;

/// Join discipline of a request group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinMode {
    /// Collect a reply from every member.
    WaitForAll,
    /// Stop at the first reply the acceptance check approves.
    RaceToFirst,
}

/// A request that has been sent and not yet answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PendingRequest {
    pub id: RequestId,
    pub kind: RequestKind,
    pub player: PlayerId,
}

/// Result of [`ResponseCoordinator::gather`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupOutcome {
    /// The accepted reply of a race.
    pub winner: Option<Response>,
    /// Every reply consumed by the group, in arrival order, winner included.
    pub responses: Vec<Response>,
}

impl GroupOutcome {
    /// The reply of one member, if it arrived.
    #[must_use]
    pub fn from_player(&self, player: PlayerId) -> Option<&Response> {
        self.responses.iter().find(|r| r.from == player)
    }
}

/// Tracks outstanding requests and joins their replies.
pub struct ResponseCoordinator {
    transport: Box<dyn Transport>,
    outstanding: FxHashMap<(RequestKind, PlayerId), RequestId>,
    next_request: u64,
}

impl std::fmt::Debug for ResponseCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCoordinator")
            .field("outstanding", &self.outstanding)
            .field("next_request", &self.next_request)
            .finish()
    }
}

impl ResponseCoordinator {
    #[must_use]
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            outstanding: FxHashMap::default(),
            next_request: 0,
        }
    }

    /// Push a message to everyone.
    pub fn broadcast(&mut self, identifier: MessageKind, payload: serde_json::Value) -> Result<()> {
        self.transport.broadcast(Outbound {
            identifier,
            request: None,
            payload,
        })
    }

    /// Push a message to one participant.
    pub fn notify(
        &mut self,
        to: PlayerId,
        identifier: MessageKind,
        payload: serde_json::Value,
    ) -> Result<()> {
        self.transport.notify(
            to,
            Outbound {
                identifier,
                request: None,
                payload,
            },
        )
    }

    /// Send a request, superseding any outstanding one on the same key.
    pub fn ask(
        &mut self,
        kind: RequestKind,
        to: PlayerId,
        payload: serde_json::Value,
    ) -> Result<PendingRequest> {
        self.next_request += 1;
        let id = RequestId(self.next_request);
        if let Some(previous) = self.outstanding.insert((kind, to), id) {
            log::debug!("{} supersedes {} for {:?} to {}", id, previous, kind, to);
        }
        self.transport.notify(
            to,
            Outbound {
                identifier: MessageKind::Request(kind),
                request: Some(id),
                payload,
            },
        )?;
        Ok(PendingRequest {
            id,
            kind,
            player: to,
        })
    }

    /// Drop an outstanding request; its reply will be discarded.
    pub fn invalidate(&mut self, request: &PendingRequest) {
        if self.outstanding.get(&(request.kind, request.player)) == Some(&request.id) {
            self.outstanding.remove(&(request.kind, request.player));
        }
    }

    /// Whether `request` is still the live request on its key.
    #[must_use]
    pub fn is_outstanding(&self, request: &PendingRequest) -> bool {
        self.outstanding.get(&(request.kind, request.player)) == Some(&request.id)
    }

    /// Join the replies of a request group.
    ///
    /// With [`JoinMode::RaceToFirst`] the first reply `accept` approves wins
    /// and every other member is invalidated. Rejected replies (declines)
    /// are still collected. With [`JoinMode::WaitForAll`] `accept` is not
    /// consulted.
    ///
    /// Replies that belong to no live member of the group are discarded.
    pub fn gather(
        &mut self,
        requests: &[PendingRequest],
        mode: JoinMode,
        mut accept: impl FnMut(&Response) -> bool,
    ) -> Result<GroupOutcome> {
        let mut waiting: Vec<PendingRequest> = requests
            .iter()
            .filter(|r| self.is_outstanding(r))
            .copied()
            .collect();
        let mut outcome = GroupOutcome::default();

        while let Some(first) = waiting.first().copied() {
            let response = self.transport.receive()?.ok_or(EngineError::Stalled {
                kind: first.kind,
                player: first.player,
            })?;

            let Some(index) = waiting
                .iter()
                .position(|r| r.id == response.request && r.player == response.from)
            else {
                log::debug!(
                    "discarding stale {:?} reply from {} to {}",
                    response.kind,
                    response.from,
                    response.request
                );
                continue;
            };

            let member = waiting.remove(index);
            self.invalidate(&member);

            let won = mode == JoinMode::RaceToFirst && accept(&response);
            outcome.responses.push(response.clone());
            if won {
                outcome.winner = Some(response);
                for loser in waiting.drain(..) {
                    self.invalidate(&loser);
                }
            }
        }

        Ok(outcome)
    }

    /// Ask one participant and wait for the answer.
    pub fn await_one(
        &mut self,
        kind: RequestKind,
        to: PlayerId,
        payload: serde_json::Value,
    ) -> Result<Response> {
        let request = self.ask(kind, to, payload)?;
        let outcome = self.gather(&[request], JoinMode::WaitForAll, |_| true)?;
        outcome
            .responses
            .into_iter()
            .next()
            .ok_or(EngineError::Stalled { kind, player: to })
    }
}
