//! Asynchronous responses from remote participants.
//!
//! ## Key Types
//!
//! - [`ResponseCoordinator`]: Outstanding requests, supersession, request groups
//! - [`JoinMode`]: Wait-for-all or race-to-first-acceptable
//! - [`Transport`]: The boundary; [`ChannelTransport`] for threaded hosts,
//!   [`ScriptedTransport`] for bots and tests
//! - [`Outbound`] / [`Response`]: Serializable wire types
//!
//! There is no timeout. A transport that will never deliver a reply makes the
//! waiting request fail with `EngineError::Stalled`.

mod coordinator;
mod message;
mod scripted;
mod transport;

pub use coordinator::{GroupOutcome, JoinMode, PendingRequest, ResponseCoordinator};
pub use message::{Delivery, MessageKind, Outbound, Reply, RequestId, RequestKind, Response};
pub use scripted::{Outbox, ScriptedTransport};
pub use transport::{ChannelTransport, ClientEnd, Transport};
