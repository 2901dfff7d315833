//! Kind-specific event data.
//!
//! One struct per event kind. `EventPayload` wraps them; the `payload!`
//! macro below generates the `From` conversions and the typed accessors on
//! [`GameEvent`](super::GameEvent).

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cards::{CardId, CardRef};
use crate::core::{PlayerId, PlayerPhase};

use super::event::EventId;
use super::stage::GameEventKind;

/// Target list. Most actions hit one to four players.
pub type Targets = SmallVec<[PlayerId; 4]>;

/// Why cards left or entered a player's areas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveReason {
    CardUse,
    CardResponse,
    CardDrop,
    PinDian,
    Judge,
    /// Taken by another player.
    Obtained,
    Draw,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStartData {
    pub player: PlayerId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChangeData {
    pub from: Option<PlayerPhase>,
    pub to: PlayerPhase,
    pub from_player: Option<PlayerId>,
    pub to_player: PlayerId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardUseData {
    pub from: PlayerId,
    pub card: CardRef,
    pub targets: Targets,
    /// Cards aimed at, for cards that target cards (a counter).
    pub to_cards: Vec<CardRef>,
    /// The card effect this use answers, if any.
    pub responding_to: Option<EventId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AimData {
    pub from: PlayerId,
    pub card: CardRef,
    pub targets: Targets,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEffectData {
    /// `None` for delayed tricks resolving in their victim's judge phase.
    pub from: Option<PlayerId>,
    pub card: CardRef,
    pub targets: Targets,
    pub to_cards: Vec<CardRef>,
    pub responding_to: Option<EventId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardResponseData {
    pub from: PlayerId,
    pub card: CardRef,
    pub responding_to: Option<EventId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageData {
    pub from: Option<PlayerId>,
    pub to: PlayerId,
    pub amount: u32,
    pub cards: Vec<CardRef>,
    pub by_skill: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DyingData {
    pub dying: PlayerId,
    pub killed_by: Option<PlayerId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDiedData {
    pub player: PlayerId,
    pub killed_by: Option<PlayerId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeData {
    pub to: PlayerId,
    /// Filled in at `OnJudge`.
    pub judge_card: Option<CardId>,
    pub by_card: Option<CardRef>,
    pub by_skill: Option<String>,
}

/// Outcome of a pin-dian.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinDianResult {
    /// Strictly highest card; `None` on a tie for the top or when fewer
    /// than two cards were shown.
    pub winner: Option<PlayerId>,
    /// What every participant showed, initiator first.
    pub cards: Vec<(PlayerId, CardId)>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinDianData {
    pub from: PlayerId,
    pub targets: Targets,
    /// Filled in at `PinDianEffect`.
    pub result: Option<PinDianResult>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCardData {
    pub to: PlayerId,
    pub amount: u32,
    /// Filled in at `CardDrawing`.
    pub cards: Vec<CardId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDropData {
    pub from: PlayerId,
    pub cards: Vec<CardRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardLostData {
    pub from: PlayerId,
    pub cards: Vec<CardRef>,
    pub reason: MoveReason,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObtainCardData {
    pub to: PlayerId,
    pub cards: Vec<CardRef>,
    pub from: Option<PlayerId>,
    pub reason: MoveReason,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillUseData {
    pub from: PlayerId,
    pub skill: String,
    pub targets: Targets,
    pub cards: Vec<CardRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEffectData {
    pub from: PlayerId,
    pub skill: String,
    pub targets: Targets,
    pub cards: Vec<CardRef>,
    /// Event the ability fired on, for triggered abilities.
    pub triggered_on: Option<EventId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoseHpData {
    pub to: PlayerId,
    pub amount: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverData {
    pub to: PlayerId,
    pub amount: u32,
    pub from: Option<PlayerId>,
}

macro_rules! payload {
    ($($variant:ident($data:ident) => $get:ident, $get_mut:ident;)*) => {
        /// Kind-specific data of a [`GameEvent`](super::GameEvent).
        #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
        pub enum EventPayload {
            $($variant($data),)*
        }

        impl EventPayload {
            /// The event kind this payload belongs to.
            #[must_use]
            pub fn kind(&self) -> GameEventKind {
                match self {
                    $(Self::$variant(_) => GameEventKind::$variant,)*
                }
            }
        }

        $(
            impl From<$data> for EventPayload {
                fn from(data: $data) -> Self {
                    Self::$variant(data)
                }
            }
        )*

        impl super::GameEvent {
            $(
                #[must_use]
                pub fn $get(&self) -> Option<&$data> {
                    match &self.payload {
                        EventPayload::$variant(data) => Some(data),
                        _ => None,
                    }
                }

                pub fn $get_mut(&mut self) -> Option<&mut $data> {
                    match &mut self.payload {
                        EventPayload::$variant(data) => Some(data),
                        _ => None,
                    }
                }
            )*
        }
    };
}

payload! {
    GameStart(GameStartData) => game_start, game_start_mut;
    PhaseChange(PhaseChangeData) => phase_change, phase_change_mut;
    CardUse(CardUseData) => card_use, card_use_mut;
    Aim(AimData) => aim, aim_mut;
    CardEffect(CardEffectData) => card_effect, card_effect_mut;
    CardResponse(CardResponseData) => card_response, card_response_mut;
    Damage(DamageData) => damage, damage_mut;
    Dying(DyingData) => dying, dying_mut;
    PlayerDied(PlayerDiedData) => player_died, player_died_mut;
    Judge(JudgeData) => judge, judge_mut;
    PinDian(PinDianData) => pin_dian, pin_dian_mut;
    DrawCard(DrawCardData) => draw_card, draw_card_mut;
    CardDrop(CardDropData) => card_drop, card_drop_mut;
    CardLost(CardLostData) => card_lost, card_lost_mut;
    ObtainCard(ObtainCardData) => obtain_card, obtain_card_mut;
    SkillUse(SkillUseData) => skill_use, skill_use_mut;
    SkillEffect(SkillEffectData) => skill_effect, skill_effect_mut;
    LoseHp(LoseHpData) => lose_hp, lose_hp_mut;
    Recover(RecoverData) => recover, recover_mut;
}

impl EventPayload {
    /// The player performing the action, if any.
    #[must_use]
    pub fn actor(&self) -> Option<PlayerId> {
        match self {
            Self::GameStart(d) => Some(d.player),
            Self::PhaseChange(d) => Some(d.to_player),
            Self::CardUse(d) => Some(d.from),
            Self::Aim(d) => Some(d.from),
            Self::CardEffect(d) => d.from,
            Self::CardResponse(d) => Some(d.from),
            Self::Damage(d) => d.from,
            Self::Dying(d) => d.killed_by,
            Self::PlayerDied(d) => d.killed_by,
            Self::Judge(d) => Some(d.to),
            Self::PinDian(d) => Some(d.from),
            Self::DrawCard(d) => Some(d.to),
            Self::CardDrop(d) => Some(d.from),
            Self::CardLost(d) => Some(d.from),
            Self::ObtainCard(d) => Some(d.to),
            Self::SkillUse(d) => Some(d.from),
            Self::SkillEffect(d) => Some(d.from),
            Self::LoseHp(d) => Some(d.to),
            Self::Recover(d) => d.from,
        }
    }

    /// The players affected by the action.
    #[must_use]
    pub fn targets(&self) -> Targets {
        let one = |p: PlayerId| -> Targets { smallvec::smallvec![p] };
        match self {
            Self::GameStart(d) => one(d.player),
            Self::PhaseChange(d) => one(d.to_player),
            Self::CardUse(d) => d.targets.clone(),
            Self::Aim(d) => d.targets.clone(),
            Self::CardEffect(d) => d.targets.clone(),
            Self::CardResponse(d) => one(d.from),
            Self::Damage(d) => one(d.to),
            Self::Dying(d) => one(d.dying),
            Self::PlayerDied(d) => one(d.player),
            Self::Judge(d) => one(d.to),
            Self::PinDian(d) => d.targets.clone(),
            Self::DrawCard(d) => one(d.to),
            Self::CardDrop(d) => one(d.from),
            Self::CardLost(d) => one(d.from),
            Self::ObtainCard(d) => one(d.to),
            Self::SkillUse(d) => d.targets.clone(),
            Self::SkillEffect(d) => d.targets.clone(),
            Self::LoseHp(d) => one(d.to),
            Self::Recover(d) => one(d.to),
        }
    }

    /// The card being used, aimed, resolved or played in response.
    #[must_use]
    pub fn card(&self) -> Option<CardRef> {
        match self {
            Self::CardUse(d) => Some(d.card),
            Self::Aim(d) => Some(d.card),
            Self::CardEffect(d) => Some(d.card),
            Self::CardResponse(d) => Some(d.card),
            Self::Judge(d) => d.by_card,
            _ => None,
        }
    }

    /// Skill name for skill events.
    #[must_use]
    pub fn skill(&self) -> Option<&str> {
        match self {
            Self::SkillUse(d) => Some(&d.skill),
            Self::SkillEffect(d) => Some(&d.skill),
            Self::Damage(d) => d.by_skill.as_deref(),
            Self::Judge(d) => d.by_skill.as_deref(),
            _ => None,
        }
    }
}
