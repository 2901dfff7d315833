//! Rule registry.
//!
//! Rules are tagged handler records subscribed to stages. Abilities register
//! them when they enter play and remove them when their owner dies; the
//! interpreter asks the registry which rules fire at each stage.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{PlayerId, PlayerPhase, Result};
use crate::events::{GameEvent, Stage};
use crate::session::Session;

use super::condition::{ConditionContext, ConditionEvaluator, RuleCondition};

/// Unique identifier for a rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleId(pub u32);

impl RuleId {
    /// Create a new rule ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rule({})", self.0)
    }
}

/// What a handler knows about why it runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleContext {
    pub rule: RuleId,
    pub name: String,
    pub owner: Option<PlayerId>,
    pub stage: Stage,
}

/// Rule body. May mutate or cancel the event and dispatch nested events.
pub type RuleHandler = Rc<dyn Fn(&mut Session, &mut GameEvent, &RuleContext) -> Result<()>>;

/// Per-phase firing limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseLimit {
    pub limit: u32,
    pub refresh_at: PlayerPhase,
    pub used: u32,
}

/// A rule definition.
///
/// ## Example
///
/// ```
/// use rust_sgs::events::Stage;
/// use rust_sgs::rules::{Rule, RuleCondition};
///
/// // "Whenever you are damaged, cancel it" - once per game.
/// let rule = Rule::new("iron-skin", Stage::DamageEffect, |_, event, _| {
///     event.terminate();
///     Ok(())
/// })
/// .with_condition(RuleCondition::OwnerIsTarget)
/// .with_uses(1);
///
/// assert!(rule.can_fire());
/// ```
#[derive(Clone)]
pub struct Rule {
    /// Unique identifier, assigned on registration.
    pub id: RuleId,

    /// Human-readable name (ability name, usually).
    pub name: String,

    /// Player whose ability this is. `None` for table-wide rules.
    /// Rules of dead owners never fire.
    pub owner: Option<PlayerId>,

    /// Stages this rule listens on.
    pub stages: Vec<Stage>,

    /// Additional filter on the event.
    pub condition: RuleCondition,

    /// Higher fires first. Ties break by registration order.
    pub priority: i32,

    /// Is this rule currently active?
    pub enabled: bool,

    /// How many times can this rule fire? `None` = unlimited.
    pub uses_remaining: Option<u32>,

    /// Optional limit per phase.
    pub phase_limit: Option<PhaseLimit>,

    handler: RuleHandler,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("stages", &self.stages)
            .field("condition", &self.condition)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("uses_remaining", &self.uses_remaining)
            .field("phase_limit", &self.phase_limit)
            .finish_non_exhaustive()
    }
}

impl Rule {
    /// Create a new rule listening on one stage.
    pub fn new(
        name: impl Into<String>,
        stage: Stage,
        handler: impl Fn(&mut Session, &mut GameEvent, &RuleContext) -> Result<()> + 'static,
    ) -> Self {
        Self {
            id: RuleId::new(0),
            name: name.into(),
            owner: None,
            stages: vec![stage],
            condition: RuleCondition::Always,
            priority: 0,
            enabled: true,
            uses_remaining: None,
            phase_limit: None,
            handler: Rc::new(handler),
        }
    }

    /// Subscribe to one more stage.
    #[must_use]
    pub fn also_on(mut self, stage: Stage) -> Self {
        if !self.stages.contains(&stage) {
            self.stages.push(stage);
        }
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: RuleCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Higher fires first; ties keep registration order.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Retire the rule after `uses` firings.
    #[must_use]
    pub fn with_uses(mut self, uses: u32) -> Self {
        self.uses_remaining = Some(uses);
        self
    }

    /// At most `limit` firings until any player next enters `refresh_at`.
    #[must_use]
    pub fn with_phase_limit(mut self, limit: u32, refresh_at: PlayerPhase) -> Self {
        self.phase_limit = Some(PhaseLimit {
            limit,
            refresh_at,
            used: 0,
        });
        self
    }

    #[must_use]
    pub fn can_fire(&self) -> bool {
        self.enabled
            && self.uses_remaining.is_none_or(|u| u > 0)
            && self.phase_limit.is_none_or(|p| p.used < p.limit)
    }

    /// Count one firing against both limits.
    pub fn consume(&mut self) {
        if let Some(uses) = self.uses_remaining.as_mut() {
            *uses = uses.saturating_sub(1);
        }
        if let Some(limit) = self.phase_limit.as_mut() {
            limit.used += 1;
        }
    }

    #[must_use]
    pub fn handler(&self) -> RuleHandler {
        Rc::clone(&self.handler)
    }
}

/// Registry for rules, indexed by stage.
#[derive(Clone, Debug, Default)]
pub struct RuleRegistry {
    /// All registered rules.
    rules: FxHashMap<RuleId, Rule>,

    /// Index by stage for fast lookup.
    by_stage: FxHashMap<Stage, Vec<RuleId>>,

    /// Last rule ID allocated.
    next_id: u32,
}

impl RuleRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, returns its ID.
    pub fn register(&mut self, mut rule: Rule) -> RuleId {
        self.next_id += 1;
        let id = RuleId::new(self.next_id);
        rule.id = id;

        for stage in &rule.stages {
            self.by_stage.entry(*stage).or_default().push(id);
        }

        self.rules.insert(id, rule);
        id
    }

    /// Unregister a rule.
    pub fn unregister(&mut self, id: RuleId) -> Option<Rule> {
        let rule = self.rules.remove(&id)?;
        for stage in &rule.stages {
            if let Some(list) = self.by_stage.get_mut(stage) {
                list.retain(|&rid| rid != id);
                if list.is_empty() {
                    self.by_stage.remove(stage);
                }
            }
        }
        Some(rule)
    }

    /// Get a rule by ID.
    #[must_use]
    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    /// Get a mutable rule by ID.
    pub fn get_mut(&mut self, id: RuleId) -> Option<&mut Rule> {
        self.rules.get_mut(&id)
    }

    /// Rules listening on `stage` whose condition holds, sorted by priority
    /// (higher first), then by ID for stability.
    ///
    /// `is_alive` filters out rules of dead owners.
    pub fn find_rules(
        &self,
        stage: Stage,
        ctx: &ConditionContext,
        is_alive: impl Fn(PlayerId) -> bool,
    ) -> Vec<RuleId> {
        let Some(ids) = self.by_stage.get(&stage) else {
            return Vec::new();
        };

        let mut results: Vec<(i32, RuleId)> = ids
            .iter()
            .filter_map(|id| self.rules.get(id))
            .filter(|rule| rule.can_fire())
            .filter(|rule| rule.owner.is_none_or(&is_alive))
            .filter(|rule| {
                let owned = ConditionContext::new(ctx.event, ctx.catalog).for_owner(rule.owner);
                ConditionEvaluator::evaluate(&rule.condition, &owned)
            })
            .map(|rule| (rule.priority, rule.id))
            .collect();

        results.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        results.into_iter().map(|(_, id)| id).collect()
    }

    /// Rules owned by a player.
    pub fn rules_for_owner(&self, owner: PlayerId) -> Vec<&Rule> {
        self.rules
            .values()
            .filter(|r| r.owner == Some(owner))
            .collect()
    }

    /// Remove all rules owned by a player.
    pub fn remove_for_owner(&mut self, owner: PlayerId) {
        let to_remove: Vec<_> = self
            .rules
            .iter()
            .filter(|(_, r)| r.owner == Some(owner))
            .map(|(&id, _)| id)
            .collect();

        for id in to_remove {
            self.unregister(id);
        }
    }

    /// Reset per-phase counters of rules refreshing at `phase`.
    pub fn refresh_phase(&mut self, phase: PlayerPhase) {
        for rule in self.rules.values_mut() {
            if let Some(ref mut limit) = rule.phase_limit {
                if limit.refresh_at == phase {
                    limit.used = 0;
                }
            }
        }
    }

    /// Enable or disable a rule.
    pub fn set_enabled(&mut self, id: RuleId, enabled: bool) {
        if let Some(rule) = self.rules.get_mut(&id) {
            rule.enabled = enabled;
        }
    }

    /// Get total rule count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate all rules.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardCatalog;
    use crate::events::DamageData;

    fn noop(name: &str, stage: Stage) -> Rule {
        Rule::new(name, stage, |_, _, _| Ok(()))
    }

    fn damage_to(seat: u8) -> GameEvent {
        GameEvent::new(DamageData {
            from: None,
            to: PlayerId::new(seat),
            amount: 1,
            cards: Vec::new(),
            by_skill: None,
        })
    }

    #[test]
    fn test_register_assigns_ids() {
        let mut registry = RuleRegistry::new();
        let a = registry.register(noop("a", Stage::DamageStart));
        let b = registry.register(noop("b", Stage::DamageStart));

        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(a).map(|r| r.name.as_str()), Some("a"));
    }

    #[test]
    fn test_priority_then_id_order() {
        let mut registry = RuleRegistry::new();
        let low = registry.register(noop("low", Stage::DamageEffect));
        let high = registry.register(noop("high", Stage::DamageEffect).with_priority(5));
        let low_later = registry.register(noop("low-later", Stage::DamageEffect));

        let catalog = CardCatalog::new();
        let event = damage_to(1);
        let ctx = ConditionContext::new(&event, &catalog);

        let found = registry.find_rules(Stage::DamageEffect, &ctx, |_| true);
        assert_eq!(found, vec![high, low, low_later]);
    }

    #[test]
    fn test_condition_uses_owner() {
        let mut registry = RuleRegistry::new();
        let mine = registry.register(
            noop("mine", Stage::DamageEffect)
                .with_owner(PlayerId::new(1))
                .with_condition(RuleCondition::OwnerIsTarget),
        );
        registry.register(
            noop("theirs", Stage::DamageEffect)
                .with_owner(PlayerId::new(2))
                .with_condition(RuleCondition::OwnerIsTarget),
        );

        let catalog = CardCatalog::new();
        let event = damage_to(1);
        let ctx = ConditionContext::new(&event, &catalog);

        assert_eq!(registry.find_rules(Stage::DamageEffect, &ctx, |_| true), vec![mine]);
    }

    #[test]
    fn test_dead_owner_never_fires() {
        let mut registry = RuleRegistry::new();
        registry.register(noop("ghost", Stage::DamageEffect).with_owner(PlayerId::new(3)));

        let catalog = CardCatalog::new();
        let event = damage_to(1);
        let ctx = ConditionContext::new(&event, &catalog);

        assert!(registry
            .find_rules(Stage::DamageEffect, &ctx, |p| p != PlayerId::new(3))
            .is_empty());
    }

    #[test]
    fn test_uses_and_phase_limit() {
        let mut rule = noop("limited", Stage::DamageStart)
            .with_uses(2)
            .with_phase_limit(1, PlayerPhase::Play);

        assert!(rule.can_fire());
        rule.consume();
        assert!(!rule.can_fire());

        let mut registry = RuleRegistry::new();
        let id = registry.register(rule);
        registry.refresh_phase(PlayerPhase::Draw);
        assert!(!registry.get(id).unwrap().can_fire());
        registry.refresh_phase(PlayerPhase::Play);
        assert!(registry.get(id).unwrap().can_fire());

        registry.get_mut(id).unwrap().consume();
        registry.refresh_phase(PlayerPhase::Play);
        assert!(!registry.get(id).unwrap().can_fire());
    }

    #[test]
    fn test_unregister_and_remove_for_owner() {
        let mut registry = RuleRegistry::new();
        let a = registry.register(noop("a", Stage::OnAim).also_on(Stage::AfterAim));
        registry.register(noop("b", Stage::OnAim).with_owner(PlayerId::new(0)));
        registry.register(noop("c", Stage::AfterAim).with_owner(PlayerId::new(0)));

        assert!(registry.unregister(a).is_some());
        assert!(registry.unregister(a).is_none());
        assert_eq!(registry.rules_for_owner(PlayerId::new(0)).len(), 2);

        registry.remove_for_owner(PlayerId::new(0));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_disabled_rule_is_skipped() {
        let mut registry = RuleRegistry::new();
        let id = registry.register(noop("off", Stage::DamageStart));
        registry.set_enabled(id, false);

        let catalog = CardCatalog::new();
        let event = damage_to(0);
        let ctx = ConditionContext::new(&event, &catalog);
        assert!(registry.find_rules(Stage::DamageStart, &ctx, |_| true).is_empty());
    }
}
