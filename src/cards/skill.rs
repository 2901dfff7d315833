//! Card behaviour.
//!
//! Every card name may carry a [`CardSkill`], looked up through the catalog
//! when the card is used. The session calls into it at fixed points of a card
//! use:
//!
//! 1. `on_use` at `CardUsing` (may rewrite the target list)
//! 2. `before_effect` once, on the template every per-target effect copies
//!    its middleware from
//! 3. `on_effect` at `CardEffecting`, once per target
//! 4. `after_effect` once all targets resolved
//!
//! `on_effect_rejected` replaces `on_effect` for an effect a counter card
//! cancelled in its countering window. Effects stopped any other way get
//! neither call.

use crate::core::{PlayerId, Result};
use crate::events::GameEvent;
use crate::session::Session;

/// Behaviour attached to a card name.
pub trait CardSkill {
    /// Whether `user` may play the card on their own initiative.
    fn can_use_actively(&self, _session: &Session, _user: PlayerId) -> bool {
        true
    }

    /// Whether a play-phase use may name these targets.
    fn accepts_targets(&self, _session: &Session, _user: PlayerId, _targets: &[PlayerId]) -> bool {
        true
    }

    /// Runs inside the `CardUse` event.
    fn on_use(&self, _session: &mut Session, _event: &mut GameEvent) -> Result<()> {
        Ok(())
    }

    /// Runs once before any effect, on the effect template.
    fn before_effect(&self, _session: &mut Session, _template: &mut GameEvent) -> Result<()> {
        Ok(())
    }

    /// Resolves the card against one target.
    fn on_effect(&self, _session: &mut Session, _event: &mut GameEvent) -> Result<()> {
        Ok(())
    }

    /// Runs once after every effect resolved.
    fn after_effect(&self, _session: &mut Session, _template: &mut GameEvent) -> Result<()> {
        Ok(())
    }

    /// Runs for an effect countered in its countering window.
    fn on_effect_rejected(&self, _session: &mut Session, _event: &mut GameEvent) -> Result<()> {
        Ok(())
    }
}
