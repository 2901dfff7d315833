//! The stage catalog.
//!
//! Every event kind resolves through a fixed, ordered list of stages. Each
//! stage belongs to exactly one kind; cross-kind composition happens only by
//! nesting a second event (a damage nests a dying).
//!
//! ```
//! use rust_sgs::events::{GameEventKind, Stage};
//!
//! let stages = GameEventKind::Damage.stages();
//! assert_eq!(stages.first(), Some(&Stage::DamageStart));
//! assert!(stages.iter().all(|s| s.kind() == GameEventKind::Damage));
//! ```

use serde::{Deserialize, Serialize};

/// A tagged category of game action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameEventKind {
    GameStart,
    PhaseChange,
    CardUse,
    Aim,
    CardEffect,
    CardResponse,
    Damage,
    Dying,
    PlayerDied,
    Judge,
    PinDian,
    DrawCard,
    CardDrop,
    CardLost,
    ObtainCard,
    SkillUse,
    SkillEffect,
    LoseHp,
    Recover,
}

/// One named interception point within an event kind's resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    // GameStart
    BeforeGameStart,
    GameStarting,
    AfterGameStarted,

    // PhaseChange
    BeforePhaseChange,
    PhaseChanged,
    AfterPhaseChanged,

    // CardUse
    PreCardUse,
    CardUsing,
    AfterCardUsed,
    CardUseFinished,

    // Aim
    OnAim,
    AfterAim,

    // CardEffect
    PreCardEffect,
    BeforeCardEffect,
    CardEffecting,
    AfterCardEffect,

    // CardResponse
    PreCardResponse,
    CardResponding,
    AfterCardResponded,

    // Damage
    DamageStart,
    DamageEffect,
    DamagedEffect,
    AfterDamagedEffect,
    DamageFinished,

    // Dying
    PrePlayerDying,
    PlayerDying,
    AfterPlayerDying,

    // PlayerDied
    PrePlayerDied,
    PlayerDied,
    AfterPlayerDied,

    // Judge
    BeforeJudge,
    OnJudge,
    JudgeEffect,
    AfterJudgeEffect,

    // PinDian
    BeforePinDian,
    PinDianEffect,
    AfterPinDianEffect,

    // DrawCard
    BeforeDrawCard,
    CardDrawing,
    AfterCardDrawn,

    // CardDrop
    BeforeCardDrop,
    CardDropping,
    AfterCardDropped,

    // CardLost
    BeforeCardLoseEffect,
    CardLosing,
    AfterCardLostEffect,

    // ObtainCard
    BeforeObtainCardEffect,
    CardObtaining,
    AfterCardObtained,

    // SkillUse
    BeforeSkillUse,
    SkillUsing,
    AfterSkillUsed,

    // SkillEffect
    BeforeSkillEffect,
    SkillEffecting,
    AfterSkillEffected,

    // LoseHp
    BeforeLoseHp,
    LosingHp,
    AfterLostHp,

    // Recover
    BeforeRecoverEffect,
    RecoverEffecting,
    AfterRecoverEffect,
}

impl GameEventKind {
    /// Every kind, in declaration order.
    pub const ALL: [GameEventKind; 19] = [
        Self::GameStart,
        Self::PhaseChange,
        Self::CardUse,
        Self::Aim,
        Self::CardEffect,
        Self::CardResponse,
        Self::Damage,
        Self::Dying,
        Self::PlayerDied,
        Self::Judge,
        Self::PinDian,
        Self::DrawCard,
        Self::CardDrop,
        Self::CardLost,
        Self::ObtainCard,
        Self::SkillUse,
        Self::SkillEffect,
        Self::LoseHp,
        Self::Recover,
    ];

    /// The declared stage order for this kind.
    #[must_use]
    pub fn stages(self) -> &'static [Stage] {
        use Stage::*;
        match self {
            Self::GameStart => &[BeforeGameStart, GameStarting, AfterGameStarted],
            Self::PhaseChange => &[BeforePhaseChange, PhaseChanged, AfterPhaseChanged],
            Self::CardUse => &[PreCardUse, CardUsing, AfterCardUsed, CardUseFinished],
            Self::Aim => &[OnAim, AfterAim],
            Self::CardEffect => &[PreCardEffect, BeforeCardEffect, CardEffecting, AfterCardEffect],
            Self::CardResponse => &[PreCardResponse, CardResponding, AfterCardResponded],
            Self::Damage => &[
                DamageStart,
                DamageEffect,
                DamagedEffect,
                AfterDamagedEffect,
                DamageFinished,
            ],
            Self::Dying => &[PrePlayerDying, PlayerDying, AfterPlayerDying],
            Self::PlayerDied => &[PrePlayerDied, PlayerDied, AfterPlayerDied],
            Self::Judge => &[BeforeJudge, OnJudge, JudgeEffect, AfterJudgeEffect],
            Self::PinDian => &[BeforePinDian, PinDianEffect, AfterPinDianEffect],
            Self::DrawCard => &[BeforeDrawCard, CardDrawing, AfterCardDrawn],
            Self::CardDrop => &[BeforeCardDrop, CardDropping, AfterCardDropped],
            Self::CardLost => &[BeforeCardLoseEffect, CardLosing, AfterCardLostEffect],
            Self::ObtainCard => &[BeforeObtainCardEffect, CardObtaining, AfterCardObtained],
            Self::SkillUse => &[BeforeSkillUse, SkillUsing, AfterSkillUsed],
            Self::SkillEffect => &[BeforeSkillEffect, SkillEffecting, AfterSkillEffected],
            Self::LoseHp => &[BeforeLoseHp, LosingHp, AfterLostHp],
            Self::Recover => &[BeforeRecoverEffect, RecoverEffecting, AfterRecoverEffect],
        }
    }

    /// First stage of the kind.
    #[must_use]
    pub fn first_stage(self) -> Stage {
        self.stages()[0]
    }
}

impl Stage {
    /// The event kind that owns this stage.
    #[must_use]
    pub fn kind(self) -> GameEventKind {
        use Stage::*;
        match self {
            BeforeGameStart | GameStarting | AfterGameStarted => GameEventKind::GameStart,
            BeforePhaseChange | PhaseChanged | AfterPhaseChanged => GameEventKind::PhaseChange,
            PreCardUse | CardUsing | AfterCardUsed | CardUseFinished => GameEventKind::CardUse,
            OnAim | AfterAim => GameEventKind::Aim,
            PreCardEffect | BeforeCardEffect | CardEffecting | AfterCardEffect => {
                GameEventKind::CardEffect
            }
            PreCardResponse | CardResponding | AfterCardResponded => GameEventKind::CardResponse,
            DamageStart | DamageEffect | DamagedEffect | AfterDamagedEffect | DamageFinished => {
                GameEventKind::Damage
            }
            PrePlayerDying | PlayerDying | AfterPlayerDying => GameEventKind::Dying,
            PrePlayerDied | PlayerDied | AfterPlayerDied => GameEventKind::PlayerDied,
            BeforeJudge | OnJudge | JudgeEffect | AfterJudgeEffect => GameEventKind::Judge,
            BeforePinDian | PinDianEffect | AfterPinDianEffect => GameEventKind::PinDian,
            BeforeDrawCard | CardDrawing | AfterCardDrawn => GameEventKind::DrawCard,
            BeforeCardDrop | CardDropping | AfterCardDropped => GameEventKind::CardDrop,
            BeforeCardLoseEffect | CardLosing | AfterCardLostEffect => GameEventKind::CardLost,
            BeforeObtainCardEffect | CardObtaining | AfterCardObtained => GameEventKind::ObtainCard,
            BeforeSkillUse | SkillUsing | AfterSkillUsed => GameEventKind::SkillUse,
            BeforeSkillEffect | SkillEffecting | AfterSkillEffected => GameEventKind::SkillEffect,
            BeforeLoseHp | LosingHp | AfterLostHp => GameEventKind::LoseHp,
            BeforeRecoverEffect | RecoverEffecting | AfterRecoverEffect => GameEventKind::Recover,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_stage_belongs_to_its_kind() {
        for kind in GameEventKind::ALL {
            assert!(!kind.stages().is_empty());
            for stage in kind.stages() {
                assert_eq!(stage.kind(), kind, "{} listed under {:?}", stage, kind);
            }
        }
    }

    #[test]
    fn test_stages_are_not_shared() {
        let mut seen = std::collections::HashSet::new();
        for kind in GameEventKind::ALL {
            for stage in kind.stages() {
                assert!(seen.insert(*stage), "{} appears twice", stage);
            }
        }
    }

    #[test]
    fn test_damage_order() {
        assert_eq!(
            GameEventKind::Damage.stages(),
            &[
                Stage::DamageStart,
                Stage::DamageEffect,
                Stage::DamagedEffect,
                Stage::AfterDamagedEffect,
                Stage::DamageFinished,
            ]
        );
        assert_eq!(GameEventKind::Dying.first_stage(), Stage::PrePlayerDying);
    }
}
