//! Composite protocols and action helpers.
//!
//! Everything here is built from nested dispatches: a card use is a
//! `CardLost`, a `CardUse`, an `Aim` and one `CardEffect` per target; a rescue
//! is a sequence of card uses; a counter is a card use answering an effect.
//! The helpers (`damage`, `draw_cards`, ...) are what rules and card
//! behaviour call to act on the game.

use serde_json::json;

use crate::cards::standard::{NULLIFICATION, PEACH};
use crate::cards::{CardCategory, CardId, CardRef};
use crate::core::{PlayerCardsArea, PlayerId, Result};
use crate::events::{
    AimData, CardDropData, CardEffectData, CardLostData, CardResponseData, CardUseData, DamageData, DrawCardData,
    EventId, GameEvent, JudgeData, LoseHpData, MoveReason, ObtainCardData, PinDianData,
    PinDianResult, RecoverData, SkillEffectData, SkillUseData, Targets,
};
use crate::response::{JoinMode, MessageKind, Reply, RequestKind};
use crate::zones::CardLocation;

use super::Session;

impl Session {
    // === Action helpers ===

    /// Deal damage. Returns the resolved event.
    pub fn damage(
        &mut self,
        from: Option<PlayerId>,
        to: PlayerId,
        amount: u32,
        cards: Vec<CardRef>,
    ) -> Result<GameEvent> {
        self.dispatch(GameEvent::new(DamageData {
            from,
            to,
            amount,
            cards,
            by_skill: None,
        }))
    }

    /// Restore hit points, capped at the maximum.
    pub fn recover(&mut self, to: PlayerId, amount: u32, from: Option<PlayerId>) -> Result<GameEvent> {
        self.dispatch(GameEvent::new(RecoverData { to, amount, from }))
    }

    /// Lose hit points without a source.
    pub fn lose_hp(&mut self, to: PlayerId, amount: u32) -> Result<GameEvent> {
        self.dispatch(GameEvent::new(LoseHpData { to, amount }))
    }

    /// Draw from the pile into `to`'s hand. Returns the cards drawn.
    pub fn draw_cards(&mut self, to: PlayerId, amount: u32) -> Result<Vec<CardId>> {
        let event = self.dispatch(GameEvent::new(DrawCardData {
            to,
            amount,
            cards: Vec::new(),
        }))?;
        Ok(event.draw_card().map(|d| d.cards.clone()).unwrap_or_default())
    }

    /// Discard cards from `from`'s areas to the drop stack.
    pub fn drop_cards(&mut self, from: PlayerId, cards: Vec<CardRef>) -> Result<GameEvent> {
        self.dispatch(GameEvent::new(CardDropData { from, cards }))
    }

    /// Move cards into `to`'s hand.
    pub fn obtain_cards(
        &mut self,
        to: PlayerId,
        cards: Vec<CardRef>,
        from: Option<PlayerId>,
        reason: MoveReason,
    ) -> Result<GameEvent> {
        self.dispatch(GameEvent::new(ObtainCardData {
            to,
            cards,
            from,
            reason,
        }))
    }

    /// Flip a judgment for `to`. Returns the judge card, or `None` when the
    /// judgment was cancelled or the piles ran dry.
    pub fn judge(
        &mut self,
        to: PlayerId,
        by_card: Option<CardRef>,
        by_skill: Option<&str>,
    ) -> Result<Option<CardId>> {
        let event = self.dispatch(GameEvent::new(JudgeData {
            to,
            judge_card: None,
            by_card,
            by_skill: by_skill.map(str::to_string),
        }))?;
        if event.is_terminated() {
            return Ok(None);
        }
        Ok(event.judge().and_then(|j| j.judge_card))
    }

    /// Run a pin-dian between `from` and `targets`.
    pub fn pin_dian(&mut self, from: PlayerId, targets: Targets) -> Result<Option<PinDianResult>> {
        let event = self.dispatch(GameEvent::new(PinDianData {
            from,
            targets,
            result: None,
        }))?;
        Ok(event.pin_dian().and_then(|d| d.result.clone()))
    }

    /// Reveal cards from the pile into the processing area under `tag`.
    pub fn reveal_cards(&mut self, amount: usize, tag: &str) -> Result<Vec<CardId>> {
        let revealed = self.room.draw_from_pile(amount, tag);
        self.broadcast(MessageKind::PoolUpdate, &json!({ "pool": revealed, "picker": null }))?;
        Ok(revealed)
    }

    /// Ask `player` to play a card named `name` in response. Returns the
    /// card played, or `None` on a decline or an invalid offer.
    pub fn respond_with(
        &mut self,
        player: PlayerId,
        name: &str,
        responding_to: Option<EventId>,
    ) -> Result<Option<CardRef>> {
        if !self.room.is_alive(player) {
            return Ok(None);
        }
        let response = self.await_response(
            RequestKind::CardResponse,
            player,
            &json!({ "card": name, "responding_to": responding_to }),
        )?;
        let Some(card) = self.room.offered_card(player, &response.reply, name) else {
            return Ok(None);
        };

        let tag = self.processing_tag(&card.tag());
        self.lose_into_processing(player, card, MoveReason::CardResponse, &tag)?;
        let event = self.dispatch(GameEvent::new(CardResponseData {
            from: player,
            card,
            responding_to,
        }));
        self.room.release_processing(&tag);
        Ok((!event?.is_terminated()).then_some(card))
    }

    /// Move a card out of `from`'s areas and flag what arrived in the
    /// processing area under `tag`.
    fn lose_into_processing(
        &mut self,
        from: PlayerId,
        card: CardRef,
        reason: MoveReason,
        tag: &str,
    ) -> Result<Vec<CardId>> {
        let physical = self.room.catalog().expand(card)?;
        if physical.is_empty() {
            return Ok(Vec::new());
        }
        self.dispatch(GameEvent::new(CardLostData {
            from,
            cards: vec![card],
            reason,
        }))?;
        let in_flight: Vec<CardId> = physical
            .into_iter()
            .filter(|&c| self.room.zones().is_in(c, CardLocation::Processing))
            .collect();
        self.room.add_processing_cards(tag, &in_flight);
        Ok(in_flight)
    }

    // === Card and skill use ===

    /// Use a card: lose it into processing, resolve the `CardUse`, then aim
    /// and resolve one effect per surviving target.
    ///
    /// Equipment goes to the user's equip area at `CardUsing`; delayed tricks
    /// go to the first target's judge area instead of resolving now.
    pub fn use_card(&mut self, data: CardUseData) -> Result<()> {
        let definition = self.room.catalog().definition(data.card)?.clone();
        let tag = self.processing_tag(&data.card.tag());
        let in_flight = self.lose_into_processing(data.from, data.card, MoveReason::CardUse, &tag)?;
        self.room
            .player_mut(data.from)?
            .card_use_history
            .push(definition.name.clone());

        let used = self.dispatch(GameEvent::new(data))?;
        let resolved = self.resolve_card_use(&used, definition.category, &in_flight);
        self.room.release_processing(&tag);
        resolved
    }

    fn resolve_card_use(
        &mut self,
        used: &GameEvent,
        category: CardCategory,
        in_flight: &[CardId],
    ) -> Result<()> {
        if used.is_terminated() || self.game_over.is_some() {
            return Ok(());
        }
        let Some(data) = used.card_use().cloned() else {
            return Ok(());
        };

        match category {
            CardCategory::Equip => return Ok(()),
            CardCategory::DelayedTrick => {
                if let Some(&target) = data.targets.first().filter(|&&t| self.room.is_alive(t)) {
                    for &card in in_flight {
                        if self.room.zones().is_in(card, CardLocation::Processing) {
                            self.room.move_to_area(card, target, PlayerCardsArea::Judge);
                        }
                    }
                }
                return Ok(());
            }
            CardCategory::Basic | CardCategory::Trick => {}
        }

        let skill = self.room.catalog().skill_for(data.card);
        let mut template = GameEvent::new(CardEffectData {
            from: Some(data.from),
            card: data.card,
            targets: data.targets.clone(),
            to_cards: data.to_cards.clone(),
            responding_to: data.responding_to,
        });
        if let Some(skill) = &skill {
            skill.before_effect(self, &mut template)?;
        }

        let targets: Option<Targets> = if data.targets.is_empty() {
            // Cards aimed at cards, not players.
            Some(Targets::new())
        } else {
            let aim = self.dispatch(GameEvent::new(AimData {
                from: data.from,
                card: data.card,
                targets: data.targets.clone(),
            }))?;
            (!aim.is_terminated()).then(|| aim.aim().map(|a| a.targets.clone()).unwrap_or_default())
        };

        if let Some(targets) = targets {
            let per_target: Vec<Targets> = if targets.is_empty() {
                vec![Targets::new()]
            } else {
                targets.iter().map(|&t| smallvec::smallvec![t]).collect()
            };
            for targets in per_target {
                if self.game_over.is_some() {
                    return Ok(());
                }
                if targets.iter().any(|&t| !self.room.is_alive(t)) {
                    continue;
                }
                let Some(base) = template.card_effect() else {
                    break;
                };
                let mut effect = GameEvent::new(CardEffectData {
                    targets,
                    ..base.clone()
                });
                effect.disresponsive = template.disresponsive;
                effect.inherit_middleware(&template);
                self.dispatch(effect)?;
            }
        }

        if let Some(skill) = &skill {
            if self.game_over.is_none() {
                skill.after_effect(self, &mut template)?;
            }
        }
        Ok(())
    }

    /// Activate an ability: `SkillUse`, then `SkillEffect`. Counts towards
    /// the ability's per-phase limit once the use went through.
    pub fn use_skill(&mut self, data: SkillUseData) -> Result<()> {
        self.skills.get(&data.skill)?;
        let used = self.dispatch(GameEvent::new(data))?;
        if used.is_terminated() || self.game_over.is_some() {
            return Ok(());
        }
        let Some(data) = used.skill_use().cloned() else {
            return Ok(());
        };

        *self
            .room
            .player_mut(data.from)?
            .ability_uses
            .entry(data.skill.clone())
            .or_default() += 1;

        self.dispatch(GameEvent::new(SkillEffectData {
            from: data.from,
            skill: data.skill,
            targets: data.targets,
            cards: data.cards,
            triggered_on: None,
        }))?;
        Ok(())
    }

    // === Composite protocols ===

    /// Countering window, run at `BeforeCardEffect` of a trick.
    ///
    /// Every living holder of a counter card is asked at once; the first
    /// real offer wins the race and is used as a card answering this effect.
    /// That use runs its own window, so counters can be countered. When the
    /// counter lands, the card's `on_effect_rejected` runs for this effect.
    pub(super) fn countering_window(&mut self, event: &mut GameEvent) -> Result<()> {
        if event.disresponsive {
            return Ok(());
        }
        let Some(effect) = event.card_effect().cloned() else {
            return Ok(());
        };
        if !self.room.catalog().definition(effect.card)?.category.is_trick() {
            return Ok(());
        }

        let start = effect
            .from
            .or_else(|| self.turn.as_ref().map(|t| t.player))
            .unwrap_or(PlayerId::new(0));
        let holders: Vec<PlayerId> = self
            .room
            .alive_players_from(start)
            .into_iter()
            .filter(|&p| self.room.has_card_named(p, NULLIFICATION))
            .collect();
        if holders.is_empty() {
            return Ok(());
        }

        let payload = json!({
            "event": event.id,
            "card": effect.card,
            "from": effect.from,
            "targets": effect.targets,
        });
        let requests = holders
            .iter()
            .map(|&p| self.ask(RequestKind::CounterCard, p, &payload))
            .collect::<Result<Vec<_>>>()?;

        let room = &self.room;
        let outcome = self.responses.gather(&requests, JoinMode::RaceToFirst, |r| {
            room.offered_card(r.from, &r.reply, NULLIFICATION).is_some()
        })?;
        let Some(winner) = outcome.winner else {
            return Ok(());
        };
        let Some(counter) = self.room.offered_card(winner.from, &winner.reply, NULLIFICATION) else {
            return Ok(());
        };

        log::debug!("{} answers {} with {}", winner.from, event.id, counter);
        self.use_card(CardUseData {
            from: winner.from,
            card: counter,
            targets: Targets::new(),
            to_cards: vec![effect.card],
            responding_to: Some(event.id),
        })?;

        if self.should_stop(event) && self.game_over.is_none() {
            log::debug!("{} was countered", event.id);
            self.reject_effect(event)?;
        }
        Ok(())
    }

    /// Rescue loop, run at `PlayerDying`.
    ///
    /// Living players are asked in turn order starting from the victim. Each
    /// may keep offering rescue cards until they decline; the loop ends as
    /// soon as the victim is back above zero.
    pub(super) fn rescue(&mut self, event: &mut GameEvent) -> Result<()> {
        let Some(data) = event.dying().cloned() else {
            return Ok(());
        };
        self.broadcast_event(event)?;

        for savior in self.room.alive_players_from(data.dying) {
            loop {
                let hp = self.room.player(data.dying)?.hp;
                if hp > 0 {
                    return Ok(());
                }
                if self.game_over.is_some() || !self.room.is_alive(savior) {
                    break;
                }

                let response = self.await_response(
                    RequestKind::Peach,
                    savior,
                    &json!({ "dying": data.dying, "hp": hp }),
                )?;
                let Some(card) = self.room.offered_card(savior, &response.reply, PEACH) else {
                    break;
                };
                self.use_card(CardUseData {
                    from: savior,
                    card,
                    targets: smallvec::smallvec![data.dying],
                    to_cards: Vec::new(),
                    responding_to: None,
                })?;
            }
        }
        Ok(())
    }

    /// Pin-dian, run at `PinDianEffect`.
    ///
    /// Every participant is asked at once and all replies are awaited. A
    /// missing or invalid card defaults to the participant's first hand card.
    /// The strictly highest number wins; a shared top number, or fewer than
    /// two cards shown, has no winner.
    pub(super) fn pin_dian_effect(&mut self, event: &mut GameEvent) -> Result<()> {
        let Some(data) = event.pin_dian().cloned() else {
            return Ok(());
        };
        let mut participants = vec![data.from];
        for &target in &data.targets {
            if !participants.contains(&target) {
                participants.push(target);
            }
        }
        participants.retain(|&p| self.room.is_alive(p));

        let payload = json!({ "event": event.id, "from": data.from, "targets": data.targets });
        let requests = participants
            .iter()
            .map(|&p| self.ask(RequestKind::PinDianCard, p, &payload))
            .collect::<Result<Vec<_>>>()?;
        let outcome = self.gather(&requests, JoinMode::WaitForAll, |_| true)?;

        let tag = self.processing_tag("pin-dian");
        let mut shown = Vec::with_capacity(participants.len());
        for player in participants {
            let hand = self.room.hand(player);
            let offered = outcome.from_player(player).and_then(|r| match r.reply {
                Reply::Card(CardRef::Physical(id)) if hand.contains(&id) => Some(id),
                _ => None,
            });
            let Some(card) = offered.or_else(|| hand.first().copied()) else {
                log::warn!("{} has no card to show", player);
                continue;
            };
            self.lose_into_processing(player, card.into(), MoveReason::PinDian, &tag)?;
            shown.push((player, card));
        }

        let mut numbers = Vec::with_capacity(shown.len());
        for &(player, card) in &shown {
            numbers.push((player, self.room.catalog().get(card)?.number));
        }
        let top = numbers.iter().map(|&(_, n)| n).max();
        let best: Vec<PlayerId> = numbers
            .iter()
            .filter(|&&(_, n)| Some(n) == top)
            .map(|&(p, _)| p)
            .collect();
        // A duel needs at least two cards on the table.
        let winner = match best.as_slice() {
            [single] if shown.len() > 1 => Some(*single),
            _ => None,
        };

        if let Some(pin_dian) = event.pin_dian_mut() {
            pin_dian.result = Some(PinDianResult {
                winner,
                cards: shown,
            });
        }
        let broadcast = self.broadcast_event(event);
        self.room.release_processing(&tag);
        broadcast
    }
}
