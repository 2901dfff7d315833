//! The rule dispatcher's data side.
//!
//! Rules plug into the stage pipeline by declaring which stages they listen
//! on, a condition, and a priority. The registry is the only thing the
//! interpreter consults; there is no per-ability dispatch through traits.
//!
//! ## Example Usage
//!
//! ```
//! use rust_sgs::core::PlayerId;
//! use rust_sgs::events::Stage;
//! use rust_sgs::rules::{Rule, RuleCondition, RuleRegistry};
//!
//! let mut registry = RuleRegistry::new();
//!
//! // "When you take damage, draw a card"
//! let id = registry.register(
//!     Rule::new("feedback", Stage::AfterDamagedEffect, |session, event, ctx| {
//!         if let (Some(owner), Some(_)) = (ctx.owner, event.damage()) {
//!             session.draw_cards(owner, 1)?;
//!         }
//!         Ok(())
//!     })
//!     .with_owner(PlayerId::new(0))
//!     .with_condition(RuleCondition::OwnerIsTarget),
//! );
//!
//! assert!(registry.get(id).is_some());
//! ```

mod condition;
mod outcome;
mod registry;

pub use condition::{ConditionContext, ConditionEvaluator, RuleCondition};
pub use outcome::{evaluate_winners, GameResult, Seat};
pub use registry::{PhaseLimit, Rule, RuleContext, RuleHandler, RuleId, RuleRegistry};
