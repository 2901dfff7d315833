//! The event interpreter.
//!
//! `dispatch` pushes the event's stage sequence on the scheduler and walks it.
//! At each stage it runs the subscribed rules, then the kind's handler, then
//! the caller's hook, checking for cancellation before and after each of the
//! three. Rules and handlers may dispatch nested events; those run to
//! completion on top of the scheduler before control comes back.
//!
//! A cancellation check also merges cross-event cancellations requested
//! through [`Session::terminate_event`] and treats game over as terminal.

use crate::core::Result;
use crate::events::{EventId, GameEvent, GameEventKind, Stage};
use crate::rules::{ConditionContext, ConditionEvaluator, RuleContext};

use super::{handlers, Session};

/// Caller-supplied post-processor, run after the handler at every stage.
pub type StageHook<'a> = dyn FnMut(&mut Session, &mut GameEvent, Stage) -> Result<()> + 'a;

impl Session {
    /// Resolve an event through all of its stages and hand it back.
    ///
    /// The returned event reflects every mutation made along the way;
    /// [`GameEvent::is_terminated`] tells whether it was cancelled.
    pub fn dispatch(&mut self, event: GameEvent) -> Result<GameEvent> {
        self.dispatch_with(event, |_, _, _| Ok(()))
    }

    /// [`dispatch`](Self::dispatch) with a hook run after each stage handler.
    pub fn dispatch_with(
        &mut self,
        mut event: GameEvent,
        mut hook: impl FnMut(&mut Session, &mut GameEvent, Stage) -> Result<()>,
    ) -> Result<GameEvent> {
        self.next_event += 1;
        event.id = EventId(self.next_event);
        let kind = event.kind();
        log::debug!("dispatching {} ({:?})", event.id, kind);

        self.in_flight.push(event.id);
        let stopped_at = self.iterate_each_stage(&mut event, &mut hook);
        self.in_flight.pop();
        self.stages.skip_event_process(kind);
        self.pending_terminations.remove(&event.id);

        if let Some(stage) = stopped_at? {
            log::debug!("{} stopped at {:?}", event.id, stage);
        }
        self.after_event(&mut event)?;
        Ok(event)
    }

    /// Request cancellation of an in-flight event. Takes effect at that
    /// event's next checkpoint; unknown or finished events are ignored.
    pub fn terminate_event(&mut self, id: EventId) {
        if self.in_flight.contains(&id) {
            self.pending_terminations.insert(id);
        } else {
            log::debug!("{} is not in flight, nothing to terminate", id);
        }
    }

    /// Whether `id` is still being dispatched.
    #[must_use]
    pub fn is_in_flight(&self, id: EventId) -> bool {
        self.in_flight.contains(&id)
    }

    /// Run every rule subscribed to `stage` against `event`.
    ///
    /// Rules run by descending priority, then registration order. Each rule
    /// is re-checked right before it runs, so a rule disabled, removed or
    /// orphaned by an earlier one is skipped, and a cancelled event runs no
    /// further rules.
    pub fn trigger(&mut self, event: &mut GameEvent, stage: Stage) -> Result<()> {
        let candidates = {
            let ctx = ConditionContext::new(event, self.room.catalog());
            self.rules
                .find_rules(stage, &ctx, |p| self.room.is_alive(p))
        };

        for id in candidates {
            if self.should_stop(event) {
                break;
            }
            let Some(rule) = self.rules.get(id) else {
                continue;
            };
            if !rule.can_fire() || rule.owner.is_some_and(|o| !self.room.is_alive(o)) {
                continue;
            }
            let ctx = ConditionContext::new(event, self.room.catalog()).for_owner(rule.owner);
            if !ConditionEvaluator::evaluate(&rule.condition, &ctx) {
                continue;
            }

            let context = RuleContext {
                rule: id,
                name: rule.name.clone(),
                owner: rule.owner,
                stage,
            };
            let handler = rule.handler();
            if let Some(rule) = self.rules.get_mut(id) {
                rule.consume();
            }

            log::debug!("{} fires on {} at {:?}", context.name, event.id, stage);
            handler(self, event, &context)?;
        }
        Ok(())
    }

    /// Cancellation checkpoint.
    pub(super) fn should_stop(&mut self, event: &mut GameEvent) -> bool {
        if self.pending_terminations.remove(&event.id) {
            event.terminate();
        }
        event.is_terminated() || self.game_over.is_some()
    }

    /// Walk the stages. Returns the stage the event stopped at, or `None`
    /// when it ran to the end.
    fn iterate_each_stage(
        &mut self,
        event: &mut GameEvent,
        hook: &mut StageHook<'_>,
    ) -> Result<Option<Stage>> {
        let kind = event.kind();
        let mut stage = self.stages.involve(kind);

        loop {
            if self.should_stop(event) {
                return Ok(Some(stage));
            }
            self.trigger(event, stage)?;
            if self.should_stop(event) {
                return Ok(Some(stage));
            }
            handlers::handle(self, event, stage)?;
            if self.should_stop(event) {
                return Ok(Some(stage));
            }
            hook(self, event, stage)?;
            if self.should_stop(event) {
                return Ok(Some(stage));
            }

            match self.stages.peek_next() {
                Some(next) if self.stages.is_inside_event(kind, next) => {
                    stage = self.stages.next()?;
                }
                _ => return Ok(None),
            }
        }
    }

    /// Follow-ups that run once an event left the scheduler.
    fn after_event(&mut self, event: &mut GameEvent) -> Result<()> {
        match event.kind() {
            GameEventKind::Dying => self.after_dying(event),
            GameEventKind::PlayerDied => self.after_player_died(event),
            GameEventKind::Judge => {
                let tag = handlers::judge_tag(event.id);
                self.room.release_processing(&tag);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
