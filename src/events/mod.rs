//! Events and the stage catalog.
//!
//! ## Key Types
//!
//! - [`GameEventKind`]: Tagged category of game action
//! - [`Stage`]: One interception point, owned by exactly one kind
//! - [`GameEvent`]: In-flight event with cancellation flag and middleware
//! - [`EventPayload`]: Kind-specific data, one struct per kind

mod event;
mod payload;
mod stage;

pub use event::{EventId, GameEvent};
pub use payload::{
    AimData, CardDropData, CardEffectData, CardLostData, CardResponseData, CardUseData,
    DamageData, DrawCardData, DyingData, EventPayload, GameStartData, JudgeData, LoseHpData,
    MoveReason, ObtainCardData, PhaseChangeData, PinDianData, PinDianResult, PlayerDiedData,
    RecoverData, SkillEffectData, SkillUseData, Targets,
};
pub use stage::{GameEventKind, Stage};
