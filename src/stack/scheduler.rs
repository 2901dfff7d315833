//! The stage scheduler.
//!
//! An explicit stack of stage-sequence frames. Dispatching an event pushes a
//! frame; a nested event pushes another on top, runs to exhaustion and pops,
//! leaving the parent's cursor exactly where it was.

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result};
use crate::events::{GameEventKind, Stage};

use super::sequence::StageSequence;

/// One event's place in its stage sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Frame {
    sequence: StageSequence,
    cursor: usize,
}

impl Frame {
    fn current(&self) -> Stage {
        // A frame is never built from an empty sequence and the cursor never
        // moves past the last stage.
        self.sequence.as_slice()[self.cursor]
    }

    fn remaining(&self) -> &[Stage] {
        &self.sequence.as_slice()[self.cursor..]
    }
}

/// Cursor over the pending stages of every event currently in flight.
///
/// ## Example
///
/// ```
/// use rust_sgs::events::{GameEventKind, Stage};
/// use rust_sgs::stack::{StageScheduler, StageSequence};
///
/// let mut scheduler = StageScheduler::new();
/// assert_eq!(scheduler.involve(GameEventKind::Damage), Stage::DamageStart);
/// scheduler.next().unwrap();
/// scheduler.next().unwrap();
///
/// // A dying nests inside the damage.
/// scheduler.insert(StageSequence::for_kind(GameEventKind::Dying)).unwrap();
/// assert_eq!(scheduler.current(), Some(Stage::PrePlayerDying));
/// scheduler.complete();
///
/// assert_eq!(scheduler.current(), Some(Stage::DamagedEffect));
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StageScheduler {
    frames: Vec<Frame>,
}

impl StageScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a new event of `kind`; returns its first stage.
    pub fn involve(&mut self, kind: GameEventKind) -> Stage {
        let sequence = StageSequence::for_kind(kind);
        let first = kind.first_stage();
        self.frames.push(Frame { sequence, cursor: 0 });
        first
    }

    /// Push an arbitrary sequence ahead of the cursor.
    pub fn insert(&mut self, sequence: StageSequence) -> Result<Stage> {
        let first = sequence.get(0).ok_or(EngineError::EmptyStageSequence)?;
        self.frames.push(Frame { sequence, cursor: 0 });
        Ok(first)
    }

    /// Splice extra stages right after the current stage of the innermost
    /// event of `kind`.
    pub fn insert_stages(&mut self, kind: GameEventKind, stages: &[Stage]) -> Result<()> {
        if let Some(&stage) = stages.iter().find(|s| s.kind() != kind) {
            return Err(EngineError::StageKindMismatch { kind, stage });
        }
        let frame = self
            .frames
            .iter_mut()
            .rev()
            .find(|f| f.sequence.kind() == kind)
            .ok_or(EngineError::NoActiveEvent)?;
        frame.sequence.insert_after(frame.cursor, stages);
        Ok(())
    }

    /// Stage currently being executed.
    #[must_use]
    pub fn current(&self) -> Option<Stage> {
        self.frames.last().map(Frame::current)
    }

    /// Kind owning the front of the queue.
    #[must_use]
    pub fn current_kind(&self) -> Option<GameEventKind> {
        self.frames.last().map(|f| f.sequence.kind())
    }

    /// Stage that `next` would move to, without moving.
    #[must_use]
    pub fn peek_next(&self) -> Option<Stage> {
        let frame = self.frames.last()?;
        frame.sequence.get(frame.cursor + 1)
    }

    /// Advance the innermost event to its next stage.
    ///
    /// Fails with `NoActiveEvent` when nothing is in flight or the innermost
    /// event has no stage left.
    pub fn next(&mut self) -> Result<Stage> {
        let frame = self.frames.last_mut().ok_or(EngineError::NoActiveEvent)?;
        let stage = frame
            .sequence
            .get(frame.cursor + 1)
            .ok_or(EngineError::NoActiveEvent)?;
        frame.cursor += 1;
        Ok(stage)
    }

    /// Whether `stage` is still pending (or running) in the innermost event
    /// of `kind`.
    #[must_use]
    pub fn is_inside_event(&self, kind: GameEventKind, stage: Stage) -> bool {
        stage.kind() == kind
            && self
                .frames
                .iter()
                .rev()
                .find(|f| f.sequence.kind() == kind)
                .is_some_and(|f| f.remaining().contains(&stage))
    }

    /// Pop the innermost event after its last stage ran.
    pub fn complete(&mut self) {
        self.frames.pop();
    }

    /// Drop the innermost event of `kind` and everything nested above it.
    /// No-op when no such event is in flight.
    pub fn skip_event_process(&mut self, kind: GameEventKind) {
        if let Some(index) = self.frames.iter().rposition(|f| f.sequence.kind() == kind) {
            self.frames.truncate(index);
        }
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Number of events in flight.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_involve_and_walk() {
        let mut scheduler = StageScheduler::new();
        let mut seen = vec![scheduler.involve(GameEventKind::Judge)];
        while scheduler.peek_next().is_some() {
            seen.push(scheduler.next().unwrap());
        }
        assert_eq!(seen, GameEventKind::Judge.stages());
        assert!(matches!(scheduler.next(), Err(EngineError::NoActiveEvent)));
    }

    #[test]
    fn test_next_without_event_fails() {
        let mut scheduler = StageScheduler::new();
        assert!(matches!(scheduler.next(), Err(EngineError::NoActiveEvent)));
    }

    #[test]
    fn test_nested_frame_restores_parent_cursor() {
        let mut scheduler = StageScheduler::new();
        scheduler.involve(GameEventKind::Damage);
        scheduler.next().unwrap();
        scheduler.next().unwrap();

        scheduler.involve(GameEventKind::Dying);
        assert_eq!(scheduler.current_kind(), Some(GameEventKind::Dying));
        assert_eq!(scheduler.depth(), 2);
        scheduler.next().unwrap();
        scheduler.next().unwrap();
        scheduler.complete();

        assert_eq!(scheduler.current(), Some(Stage::DamagedEffect));
        assert_eq!(scheduler.peek_next(), Some(Stage::AfterDamagedEffect));
    }

    #[test]
    fn test_is_inside_event() {
        let mut scheduler = StageScheduler::new();
        scheduler.involve(GameEventKind::CardEffect);
        scheduler.next().unwrap();

        assert!(scheduler.is_inside_event(GameEventKind::CardEffect, Stage::CardEffecting));
        assert!(scheduler.is_inside_event(GameEventKind::CardEffect, Stage::BeforeCardEffect));
        assert!(!scheduler.is_inside_event(GameEventKind::CardEffect, Stage::PreCardEffect));
        assert!(!scheduler.is_inside_event(GameEventKind::Damage, Stage::DamageStart));
    }

    #[test]
    fn test_skip_event_process_drops_nested() {
        let mut scheduler = StageScheduler::new();
        scheduler.involve(GameEventKind::CardUse);
        scheduler.involve(GameEventKind::CardEffect);
        scheduler.involve(GameEventKind::Damage);

        scheduler.skip_event_process(GameEventKind::CardEffect);
        assert_eq!(scheduler.depth(), 1);
        assert_eq!(scheduler.current(), Some(Stage::PreCardUse));

        scheduler.skip_event_process(GameEventKind::Recover);
        assert_eq!(scheduler.depth(), 1);
    }

    #[test]
    fn test_skip_after_clear_is_noop() {
        let mut scheduler = StageScheduler::new();
        scheduler.involve(GameEventKind::PlayerDied);
        scheduler.clear();
        scheduler.skip_event_process(GameEventKind::PlayerDied);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_insert_stages_repeats_stage() {
        let mut scheduler = StageScheduler::new();
        scheduler.involve(GameEventKind::CardEffect);
        scheduler.next().unwrap();
        scheduler.next().unwrap();

        scheduler
            .insert_stages(GameEventKind::CardEffect, &[Stage::CardEffecting])
            .unwrap();

        assert_eq!(scheduler.next().unwrap(), Stage::CardEffecting);
        assert_eq!(scheduler.next().unwrap(), Stage::AfterCardEffect);
    }

    #[test]
    fn test_insert_stages_rejects_foreign_stage() {
        let mut scheduler = StageScheduler::new();
        scheduler.involve(GameEventKind::CardEffect);
        let err = scheduler
            .insert_stages(GameEventKind::CardEffect, &[Stage::DamageStart])
            .unwrap_err();
        assert!(matches!(err, EngineError::StageKindMismatch { .. }));
    }

    #[test]
    fn test_insert_custom_sequence() {
        let mut scheduler = StageScheduler::new();
        let seq = StageSequence::new([Stage::BeforeLoseHp, Stage::LosingHp]).unwrap();
        assert_eq!(scheduler.insert(seq).unwrap(), Stage::BeforeLoseHp);
        assert_eq!(scheduler.next().unwrap(), Stage::LosingHp);
        assert_eq!(scheduler.peek_next(), None);
    }
}
