//! Rule conditions.
//!
//! A rule subscribed to a stage only fires when its condition holds for the
//! in-flight event. Conditions are plain data so they can be inspected and
//! serialized; anything they cannot express goes into the rule's handler.

use serde::{Deserialize, Serialize};

use crate::cards::{CardCatalog, CardCategory};
use crate::core::PlayerId;
use crate::events::GameEvent;

/// Filter a rule applies to the event before its handler runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleCondition {
    /// Fires for every event at the subscribed stages.
    Always,
    /// Parked rule; stays registered but never fires.
    Never,

    ActorIs(PlayerId),
    TargetIncludes(PlayerId),
    /// The rule's owner is the event's actor. False for ownerless rules.
    OwnerIsActor,
    /// The rule's owner is among the event's targets. False for ownerless rules.
    OwnerIsTarget,

    /// The event's card resolves to this name, virtual cards included.
    CardNamed(String),
    CardCategory(CardCategory),
    /// The event came from this skill, directly or through a rule it owns.
    SkillNamed(String),

    All(Vec<RuleCondition>),
    Any(Vec<RuleCondition>),
    Not(Box<RuleCondition>),
}

impl RuleCondition {
    pub fn all(conditions: impl IntoIterator<Item = RuleCondition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    pub fn any(conditions: impl IntoIterator<Item = RuleCondition>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    /// Matches exactly when `self` does not.
    pub fn inverted(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            Self::Always => Self::Never,
            Self::Never => Self::Always,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Narrow `self` by `extra`, flattening nested conjunctions.
    pub fn and(self, extra: RuleCondition) -> Self {
        match (self, extra) {
            (Self::Always, only) | (only, Self::Always) => only,
            (Self::All(mut left), Self::All(right)) => {
                left.extend(right);
                Self::All(left)
            }
            (Self::All(mut left), single) => {
                left.push(single);
                Self::All(left)
            }
            (first, second) => Self::All(vec![first, second]),
        }
    }
}

/// What a condition is checked against.
pub struct ConditionContext<'a> {
    pub event: &'a GameEvent,
    /// Owner of the rule under test; `None` for global rules.
    pub owner: Option<PlayerId>,
    /// Resolves card references to names and categories.
    pub catalog: &'a CardCatalog,
}

impl<'a> ConditionContext<'a> {
    pub fn new(event: &'a GameEvent, catalog: &'a CardCatalog) -> Self {
        Self {
            event,
            owner: None,
            catalog,
        }
    }

    /// Evaluate on behalf of a rule owner.
    #[must_use]
    pub fn for_owner(mut self, owner: Option<PlayerId>) -> Self {
        self.owner = owner;
        self
    }
}

/// Stateless checker for [`RuleCondition`]s.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    pub fn evaluate(condition: &RuleCondition, ctx: &ConditionContext) -> bool {
        let payload = &ctx.event.payload;
        match condition {
            RuleCondition::ActorIs(player) => payload.actor() == Some(*player),

            RuleCondition::TargetIncludes(player) => payload.targets().contains(player),

            RuleCondition::OwnerIsActor => ctx.owner.is_some() && payload.actor() == ctx.owner,

            RuleCondition::OwnerIsTarget => ctx
                .owner
                .is_some_and(|owner| payload.targets().contains(&owner)),

            RuleCondition::CardNamed(name) => payload
                .card()
                .is_some_and(|card| ctx.catalog.is_named(card, name)),

            RuleCondition::CardCategory(category) => payload.card().is_some_and(|card| {
                ctx.catalog
                    .definition(card)
                    .is_ok_and(|d| d.category == *category)
            }),

            RuleCondition::SkillNamed(name) => {
                payload.skill() == Some(name.as_str())
                    || ctx.event.triggered_by.as_deref() == Some(name.as_str())
            }

            RuleCondition::All(conditions) => conditions.iter().all(|c| Self::evaluate(c, ctx)),

            RuleCondition::Any(conditions) => conditions.iter().any(|c| Self::evaluate(c, ctx)),

            RuleCondition::Not(inner) => !Self::evaluate(inner, ctx),

            RuleCondition::Always => true,

            RuleCondition::Never => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardRef, CardSuit};
    use crate::events::{CardUseData, DamageData};
    use smallvec::smallvec;

    fn damage(from: u8, to: u8) -> GameEvent {
        GameEvent::new(DamageData {
            from: Some(PlayerId::new(from)),
            to: PlayerId::new(to),
            amount: 1,
            cards: Vec::new(),
            by_skill: None,
        })
    }

    #[test]
    fn test_player_filters() {
        let catalog = CardCatalog::new();
        let event = damage(0, 1);
        let ctx = ConditionContext::new(&event, &catalog).for_owner(Some(PlayerId::new(1)));

        assert!(ConditionEvaluator::evaluate(&RuleCondition::ActorIs(PlayerId::new(0)), &ctx));
        assert!(ConditionEvaluator::evaluate(&RuleCondition::TargetIncludes(PlayerId::new(1)), &ctx));
        assert!(ConditionEvaluator::evaluate(&RuleCondition::OwnerIsTarget, &ctx));
        assert!(!ConditionEvaluator::evaluate(&RuleCondition::OwnerIsActor, &ctx));
    }

    #[test]
    fn test_owner_filters_need_owner() {
        let catalog = CardCatalog::new();
        let event = damage(0, 1);
        let ctx = ConditionContext::new(&event, &catalog);

        assert!(!ConditionEvaluator::evaluate(&RuleCondition::OwnerIsActor, &ctx));
        assert!(!ConditionEvaluator::evaluate(&RuleCondition::OwnerIsTarget, &ctx));
    }

    #[test]
    fn test_card_filters() {
        let mut catalog = CardCatalog::new();
        let id = catalog.register("barbarian-invasion", CardSuit::Spade, 7, CardCategory::Trick);
        let event = GameEvent::new(CardUseData {
            from: PlayerId::new(0),
            card: CardRef::Physical(id),
            targets: smallvec![PlayerId::new(1)],
            to_cards: Vec::new(),
            responding_to: None,
        });
        let ctx = ConditionContext::new(&event, &catalog);

        assert!(ConditionEvaluator::evaluate(
            &RuleCondition::CardNamed("barbarian-invasion".to_string()),
            &ctx
        ));
        assert!(ConditionEvaluator::evaluate(&RuleCondition::CardCategory(CardCategory::Trick), &ctx));
        assert!(!ConditionEvaluator::evaluate(&RuleCondition::CardCategory(CardCategory::Basic), &ctx));
    }

    #[test]
    fn test_combinators() {
        let catalog = CardCatalog::new();
        let event = damage(0, 1);
        let ctx = ConditionContext::new(&event, &catalog);

        let both = RuleCondition::ActorIs(PlayerId::new(0)).and(RuleCondition::TargetIncludes(PlayerId::new(1)));
        assert!(ConditionEvaluator::evaluate(&both, &ctx));

        let either = RuleCondition::any([RuleCondition::Never, RuleCondition::Always]);
        assert!(ConditionEvaluator::evaluate(&either, &ctx));

        let neither = RuleCondition::any([RuleCondition::Never, RuleCondition::ActorIs(PlayerId::new(3))]);
        assert!(!ConditionEvaluator::evaluate(&neither, &ctx));
        assert!(ConditionEvaluator::evaluate(&neither.inverted(), &ctx));
    }

    #[test]
    fn test_and_flattens_and_drops_always() {
        let actor = RuleCondition::ActorIs(PlayerId::new(0));
        assert_eq!(RuleCondition::Always.and(actor.clone()), actor);

        let three = actor
            .clone()
            .and(RuleCondition::OwnerIsTarget)
            .and(RuleCondition::all([RuleCondition::Never]));
        assert_eq!(
            three,
            RuleCondition::All(vec![actor, RuleCondition::OwnerIsTarget, RuleCondition::Never])
        );
        assert_eq!(RuleCondition::Never.inverted(), RuleCondition::Always);
        assert_eq!(RuleCondition::OwnerIsActor.inverted().inverted(), RuleCondition::OwnerIsActor);
    }
}
