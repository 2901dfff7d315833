//! Character abilities and their catalog.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::{EngineError, PlayerId, PlayerPhase, Result};
use crate::events::GameEvent;
use crate::rules::Rule;
use crate::session::Session;

/// A character ability.
///
/// Active abilities run through a `SkillUse` event followed by a
/// `SkillEffect` event. Passive ones contribute stage rules through
/// [`rules`](Skill::rules), installed when a player gains the ability.
pub trait Skill {
    fn name(&self) -> &str;

    /// Phase at which the per-phase use counter resets.
    fn refresh_at(&self) -> Option<PlayerPhase> {
        None
    }

    /// Uses allowed between refreshes. `None` is unlimited.
    fn uses_per_phase(&self) -> Option<u32> {
        None
    }

    /// Extra activation check on top of the per-phase limit.
    fn can_use(&self, _session: &Session, _user: PlayerId) -> bool {
        true
    }

    /// Runs inside the `SkillUse` event.
    fn on_use(&self, _session: &mut Session, _event: &mut GameEvent) -> Result<()> {
        Ok(())
    }

    /// Runs inside the `SkillEffect` event.
    fn on_effect(&self, _session: &mut Session, _event: &mut GameEvent) -> Result<()> {
        Ok(())
    }

    /// Stage subscriptions installed for `owner`.
    fn rules(&self, _owner: PlayerId) -> Vec<Rule> {
        Vec::new()
    }
}

/// Registry of abilities by name.
#[derive(Default)]
pub struct SkillCatalog {
    skills: FxHashMap<String, Rc<dyn Skill>>,
}

impl std::fmt::Debug for SkillCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.skills.keys().collect();
        names.sort();
        f.debug_struct("SkillCatalog").field("skills", &names).finish()
    }
}

impl SkillCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ability under its own name, replacing any previous one.
    pub fn register(&mut self, skill: Rc<dyn Skill>) {
        self.skills.insert(skill.name().to_string(), skill);
    }

    pub fn get(&self, name: &str) -> Result<Rc<dyn Skill>> {
        self.skills
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownSkill(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.skills.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Stage;

    struct Steady;

    impl Skill for Steady {
        fn name(&self) -> &str {
            "steady"
        }

        fn rules(&self, owner: PlayerId) -> Vec<Rule> {
            vec![Rule::new("steady", Stage::DamageStart, |_, _, _| Ok(())).with_owner(owner)]
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut catalog = SkillCatalog::new();
        catalog.register(Rc::new(Steady));

        assert!(catalog.contains("steady"));
        assert_eq!(catalog.len(), 1);
        let skill = catalog.get("steady").unwrap();
        assert_eq!(skill.refresh_at(), None);
        assert_eq!(skill.rules(PlayerId::new(2))[0].owner, Some(PlayerId::new(2)));
    }

    #[test]
    fn test_unknown_skill() {
        let catalog = SkillCatalog::new();
        assert!(matches!(catalog.get("nope"), Err(EngineError::UnknownSkill(name)) if name == "nope"));
    }
}
