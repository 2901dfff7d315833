//! Turn and phase driver.
//!
//! Each living player takes a turn of four phases in fixed order. Entering
//! a phase is itself a `PhaseChange` event, so rules can react to or cancel
//! the transition; a cancelled transition skips the phase body. Turns rotate
//! through the living seats until one side has won.

use std::collections::VecDeque;

use serde_json::json;

use crate::cards::CardRef;
use crate::core::{EngineError, PlayerCardsArea, PlayerId, PlayerPhase, PlayerRole, Result};
use crate::events::{
    CardEffectData, CardUseData, GameEvent, GameStartData, PhaseChangeData, SkillUseData, Stage,
    Targets,
};
use crate::response::{JoinMode, Reply, RequestKind};
use crate::rules::GameResult;
use crate::skills::CharacterOffer;
use crate::zones::CardLocation;

use super::Session;

/// Whose turn it is and how far it got.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnState {
    pub player: PlayerId,

    /// `None` between phases.
    pub phase: Option<PlayerPhase>,

    /// Turns started so far, counting from 1.
    pub turn: u32,

    remaining: VecDeque<PlayerPhase>,
}

impl TurnState {
    fn new(player: PlayerId) -> Self {
        Self {
            player,
            phase: None,
            turn: 1,
            remaining: VecDeque::new(),
        }
    }

    /// Phases of the current turn not entered yet.
    pub fn remaining(&self) -> impl Iterator<Item = PlayerPhase> + '_ {
        self.remaining.iter().copied()
    }
}

impl Session {
    // === Accessors ===

    pub fn turn_state(&self) -> Result<&TurnState> {
        self.turn.as_ref().ok_or(EngineError::NotStarted)
    }

    fn turn_state_mut(&mut self) -> Result<&mut TurnState> {
        self.turn.as_mut().ok_or(EngineError::NotStarted)
    }

    /// The player whose turn it is.
    pub fn current_player(&self) -> Result<PlayerId> {
        Ok(self.turn_state()?.player)
    }

    /// The phase in progress, `None` between phases.
    pub fn current_phase(&self) -> Result<Option<PlayerPhase>> {
        Ok(self.turn_state()?.phase)
    }

    /// The player whose phase is in progress, `None` between phases.
    pub fn current_phase_player(&self) -> Result<Option<PlayerId>> {
        let turn = self.turn_state()?;
        Ok(turn.phase.map(|_| turn.player))
    }

    /// The stage the innermost running event is at.
    pub fn current_stage(&self) -> Result<Option<Stage>> {
        self.turn_state()?;
        Ok(self.stages.current())
    }

    /// Drop a phase of the current turn that has not been entered yet.
    pub fn skip_phase(&mut self, phase: PlayerPhase) -> Result<()> {
        let turn = self.turn_state_mut()?;
        turn.remaining.retain(|&p| p != phase);
        log::debug!("{} skips the {} phase", turn.player, phase);
        Ok(())
    }

    // === Character draft ===

    /// Let every seat pick a character from the roster.
    ///
    /// The lord seat (seat 0 when nobody holds the role) picks first from
    /// the lord characters. Every other seat is then offered its own
    /// `character_candidates` random characters, disjoint from each other and
    /// from the lord's pick, and all of them answer at once. A reply naming
    /// nothing on offer takes the first candidate.
    fn choose_characters(&mut self) -> Result<()> {
        if self.characters.is_empty() {
            return Ok(());
        }
        let seats = self.room.player_count();
        let lord = PlayerId::all(seats)
            .find(|&seat| self.room.player(seat).is_ok_and(|p| p.role == PlayerRole::Lord))
            .unwrap_or(PlayerId::new(0));

        let mut lord_names: Vec<String> =
            self.characters.iter().filter(|c| c.lord).map(|c| c.name.clone()).collect();
        if lord_names.is_empty() {
            lord_names = self.characters.iter().map(|c| c.name.clone()).collect();
        }
        let offer = CharacterOffer {
            candidates: lord_names,
            role: self.room.player(lord)?.role,
            lord: None,
        };
        let response = self.await_response(RequestKind::ChooseCharacter, lord, &offer)?;
        let Some(lord_pick) = offer.resolve(picked_name(&response.reply)).map(str::to_string) else {
            return Ok(());
        };
        self.apply_character(lord, &lord_pick)?;

        let mut pool: Vec<String> = self
            .characters
            .iter()
            .filter(|c| c.name != lord_pick)
            .map(|c| c.name.clone())
            .collect();
        self.character_rng.shuffle(&mut pool);

        let mut offers = Vec::new();
        let mut requests = Vec::new();
        for seat in lord.seats_from(seats).skip(1) {
            let take = self.config.character_candidates.min(pool.len());
            if take == 0 {
                log::warn!("no character left to offer {}", seat);
                continue;
            }
            let offer = CharacterOffer {
                candidates: pool.drain(..take).collect(),
                role: self.room.player(seat)?.role,
                lord: Some((lord, lord_pick.clone())),
            };
            requests.push(self.ask(RequestKind::ChooseCharacter, seat, &offer)?);
            offers.push((seat, offer));
        }

        let outcome = self.gather(&requests, JoinMode::WaitForAll, |_| true)?;
        for (seat, offer) in &offers {
            let reply = outcome.from_player(*seat).and_then(|r| picked_name(&r.reply));
            if let Some(name) = offer.resolve(reply) {
                self.apply_character(*seat, name)?;
            }
        }
        Ok(())
    }

    /// Seat `name` on `seat`: its health replaces the seat's, and its
    /// abilities are granted.
    fn apply_character(&mut self, seat: PlayerId, name: &str) -> Result<()> {
        let character = self
            .characters
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownCharacter(name.to_string()))?;
        let player = self.room.player_mut(seat)?;
        player.character = Some(character.name.clone());
        player.max_hp = character.max_hp;
        player.hp = character.max_hp;
        for skill in &character.skills {
            self.grant_skill(seat, skill)?;
        }
        log::info!("{} plays {}", seat, character.name);
        Ok(())
    }

    // === Match loop ===

    /// Draft characters, shuffle the pile and deal the opening hands, one
    /// `GameStart` per seat. Starting twice is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if self.turn.is_some() {
            return Ok(());
        }
        self.choose_characters()?;
        if self.config.shuffle_pile {
            self.room.shuffle_draw_pile();
        }
        self.turn = Some(TurnState::new(PlayerId::new(0)));

        let deal = self.config.opening_hand_size;
        for player in PlayerId::all(self.room.player_count()) {
            self.dispatch_with(GameEvent::new(GameStartData { player }), move |session, _, stage| {
                if stage == Stage::BeforeGameStart && deal > 0 {
                    session.draw_cards(player, deal)?;
                }
                Ok(())
            })?;
        }
        log::info!("match started with {} players", self.room.player_count());
        Ok(())
    }

    /// Play turns until the match is decided. Starts the match if needed.
    pub fn run(&mut self) -> Result<GameResult> {
        self.start()?;
        loop {
            if let Some(result) = &self.game_over {
                return Ok(result.clone());
            }
            if self.room.alive_players().len() <= 1 {
                let result = self.room.game_winners().unwrap_or(GameResult::Draw);
                self.finish(result)?;
                continue;
            }
            let turn = self.turn_state()?.turn;
            if self.config.max_turns.is_some_and(|max| turn > max) {
                log::info!("turn cap of {} reached", turn - 1);
                self.finish(GameResult::Draw)?;
                continue;
            }

            self.play_turn()?;
            self.turn_to_next_player()?;
        }
    }

    /// Play the current player's turn through its phases.
    pub fn play_turn(&mut self) -> Result<()> {
        let player = self.current_player()?;
        {
            let turn = self.turn_state_mut()?;
            turn.phase = None;
            turn.remaining = PlayerPhase::TURN_ORDER.into_iter().collect();
        }
        log::debug!("turn {} of {}", self.turn_state()?.turn, player);

        while let Some(phase) = self.turn_state_mut()?.remaining.pop_front() {
            if self.game_over.is_some() || !self.room.is_alive(player) {
                break;
            }
            let from = self.turn_state()?.phase;
            let change = self.dispatch_with(
                GameEvent::new(PhaseChangeData {
                    from,
                    to: phase,
                    from_player: from.map(|_| player),
                    to_player: player,
                }),
                move |session, _, stage| {
                    if stage == Stage::PhaseChanged {
                        session.enter_phase(player, phase)?;
                    }
                    Ok(())
                },
            )?;
            if change.is_terminated() {
                log::debug!("{} phase of {} cancelled", phase, player);
                continue;
            }
            self.on_phase(player, phase)?;
        }

        self.turn_state_mut()?.phase = None;
        Ok(())
    }

    /// Pass the turn to the next living seat. Returns the new current player.
    pub fn turn_to_next_player(&mut self) -> Result<PlayerId> {
        let current = self.current_player()?;
        let next = current
            .seats_from(self.room.player_count())
            .skip(1)
            .find(|&p| self.room.is_alive(p))
            .unwrap_or(current);

        let turn = self.turn_state_mut()?;
        turn.player = next;
        turn.phase = None;
        turn.remaining.clear();
        turn.turn += 1;
        Ok(next)
    }

    /// Caller hook of a phase change: the phase is entered.
    fn enter_phase(&mut self, player: PlayerId, phase: PlayerPhase) -> Result<()> {
        self.turn_state_mut()?.phase = Some(phase);
        self.room.player_mut(player)?.card_use_history.clear();

        for seat in self.room.alive_players() {
            let refreshed: Vec<String> = self
                .room
                .player(seat)?
                .skills
                .iter()
                .filter(|name| {
                    self.skills
                        .get(name)
                        .is_ok_and(|skill| skill.refresh_at() == Some(phase))
                })
                .cloned()
                .collect();
            let uses = &mut self.room.player_mut(seat)?.ability_uses;
            for name in refreshed {
                uses.remove(&name);
            }
        }
        self.rules.refresh_phase(phase);

        log::debug!("{} enters the {} phase", player, phase);
        Ok(())
    }

    fn on_phase(&mut self, player: PlayerId, phase: PlayerPhase) -> Result<()> {
        match phase {
            PlayerPhase::Judge => self.judge_phase(player),
            PlayerPhase::Draw => {
                let amount = self.config.draw_per_phase;
                self.draw_cards(player, amount).map(|_| ())
            }
            PlayerPhase::Play => self.play_phase(player),
            PlayerPhase::Discard => self.discard_phase(player),
        }
    }

    /// Resolve pending delayed tricks, most recent first, then bury them.
    fn judge_phase(&mut self, player: PlayerId) -> Result<()> {
        let area = CardLocation::Area(player, PlayerCardsArea::Judge);
        let mut pending = self.room.cards_in_area(player, PlayerCardsArea::Judge);
        pending.reverse();

        for card in pending {
            if self.game_over.is_some() || !self.room.is_alive(player) {
                break;
            }
            if !self.room.zones().is_in(card, area) {
                continue;
            }
            let tag = self.processing_tag("delayed");
            self.room.add_processing_cards(&tag, &[card]);
            let resolved = self.dispatch(GameEvent::new(CardEffectData {
                from: None,
                card: CardRef::Physical(card),
                targets: smallvec::smallvec![player],
                to_cards: Vec::new(),
                responding_to: None,
            }));
            self.room.release_processing(&tag);
            resolved?;
        }
        Ok(())
    }

    /// Ask for actions until the player ends the phase. Illegal actions are
    /// answered with the same request again.
    fn play_phase(&mut self, player: PlayerId) -> Result<()> {
        while self.game_over.is_none() && self.room.is_alive(player) {
            let hand = self.room.hand(player);
            let response = self.await_response(
                RequestKind::PlayCardOrSkill,
                player,
                &json!({ "phase": PlayerPhase::Play, "hand": hand }),
            )?;

            let accepted = match response.reply {
                Reply::EndPhase | Reply::Decline => return Ok(()),
                Reply::UseCard { card, targets } => self.try_use_card(player, card, targets)?,
                Reply::UseSkill {
                    skill,
                    targets,
                    cards,
                } => self.try_use_skill(player, skill, targets, cards)?,
                Reply::Card(_) | Reply::Cards(_) | Reply::Option(_) => false,
            };
            if !accepted {
                log::warn!("illegal play from {}, asking again", player);
            }
        }
        Ok(())
    }

    fn try_use_card(&mut self, player: PlayerId, card: CardRef, targets: Targets) -> Result<bool> {
        if !self.room.holds(player, card, PlayerCardsArea::Hand)
            || targets.iter().any(|&t| !self.room.is_alive(t))
        {
            return Ok(false);
        }
        let Some(skill) = self.room.catalog().skill_for(card) else {
            return Ok(false);
        };
        if !skill.can_use_actively(self, player) || !skill.accepts_targets(self, player, &targets) {
            return Ok(false);
        }

        self.use_card(CardUseData {
            from: player,
            card,
            targets,
            to_cards: Vec::new(),
            responding_to: None,
        })?;
        Ok(true)
    }

    fn try_use_skill(
        &mut self,
        player: PlayerId,
        skill: String,
        targets: Targets,
        cards: Vec<CardRef>,
    ) -> Result<bool> {
        if !self.can_use_skill(player, &skill)
            || targets.iter().any(|&t| !self.room.is_alive(t))
            || cards
                .iter()
                .any(|&c| !PlayerCardsArea::ALL.iter().any(|&a| self.room.holds(player, c, a)))
        {
            return Ok(false);
        }

        self.use_skill(SkillUseData {
            from: player,
            skill,
            targets,
            cards,
        })?;
        Ok(true)
    }

    /// Ask for exactly the excess number of hand cards until a valid choice
    /// arrives, then drop them.
    fn discard_phase(&mut self, player: PlayerId) -> Result<()> {
        while self.game_over.is_none() && self.room.is_alive(player) {
            let hand = self.room.hand(player);
            let limit = self.room.player(player)?.hand_limit();
            if hand.len() <= limit {
                return Ok(());
            }
            let excess = hand.len() - limit;

            let response = self.await_response(
                RequestKind::CardDrop,
                player,
                &json!({ "count": excess, "hand": hand }),
            )?;
            match response.reply {
                Reply::Cards(cards) if is_exact_choice(&cards, &hand, excess) => {
                    let cards = cards.into_iter().map(CardRef::Physical).collect();
                    self.drop_cards(player, cards)?;
                    return Ok(());
                }
                other => log::warn!(
                    "{} answered {:?} to a discard of {}, asking again",
                    player,
                    other,
                    excess
                ),
            }
        }
        Ok(())
    }
}

/// `count` distinct cards, all from `hand`.
fn picked_name(reply: &Reply) -> Option<&str> {
    match reply {
        Reply::Option(name) => Some(name.as_str()),
        _ => None,
    }
}

fn is_exact_choice<T: PartialEq>(chosen: &[T], hand: &[T], count: usize) -> bool {
    chosen.len() == count
        && chosen.iter().all(|c| hand.contains(c))
        && chosen
            .iter()
            .enumerate()
            .all(|(i, c)| !chosen[..i].contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_choice() {
        let hand = [1, 2, 3, 4];
        assert!(is_exact_choice(&[2, 4], &hand, 2));
        assert!(!is_exact_choice(&[2], &hand, 2));
        assert!(!is_exact_choice(&[2, 2], &hand, 2));
        assert!(!is_exact_choice(&[2, 9], &hand, 2));
    }

    #[test]
    fn test_turn_state_starts_between_phases() {
        let state = TurnState::new(PlayerId::new(1));
        assert_eq!(state.phase, None);
        assert_eq!(state.turn, 1);
        assert_eq!(state.remaining().count(), 0);
    }
}
