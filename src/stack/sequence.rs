//! Stage sequences: the unit the scheduler pushes.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{EngineError, Result};
use crate::events::{GameEventKind, Stage};

/// An ordered run of stages, all owned by one event kind.
///
/// ```
/// use rust_sgs::events::{GameEventKind, Stage};
/// use rust_sgs::stack::StageSequence;
///
/// let seq = StageSequence::for_kind(GameEventKind::Dying);
/// assert_eq!(seq.len(), 3);
///
/// let bad = StageSequence::new(vec![Stage::OnAim, Stage::PlayerDying]);
/// assert!(bad.is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSequence {
    kind: GameEventKind,
    stages: SmallVec<[Stage; 8]>,
}

impl StageSequence {
    /// The full catalog sequence of `kind`.
    #[must_use]
    pub fn for_kind(kind: GameEventKind) -> Self {
        Self {
            kind,
            stages: kind.stages().iter().copied().collect(),
        }
    }

    /// Build from explicit stages. They must be non-empty and share a kind.
    pub fn new(stages: impl IntoIterator<Item = Stage>) -> Result<Self> {
        let stages: SmallVec<[Stage; 8]> = stages.into_iter().collect();
        let kind = stages.first().ok_or(EngineError::EmptyStageSequence)?.kind();
        if let Some(&stage) = stages.iter().find(|s| s.kind() != kind) {
            return Err(EngineError::StageKindMismatch { kind, stage });
        }
        Ok(Self { kind, stages })
    }

    #[must_use]
    pub fn kind(&self) -> GameEventKind {
        self.kind
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Stage> {
        self.stages.get(index).copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Stage] {
        &self.stages
    }

    pub(crate) fn insert_after(&mut self, index: usize, extra: &[Stage]) {
        let at = (index + 1).min(self.stages.len());
        self.stages.insert_many(at, extra.iter().copied());
    }
}
