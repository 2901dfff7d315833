//! Per-kind stage handlers.
//!
//! Each event kind does its work at one or two of its stages; everything
//! else is a pure interception point for rules. Handlers re-filter dead
//! players before applying an effect, since anyone may have died between
//! the event's creation and its effect stage.

use serde_json::json;

use crate::cards::{CardCategory, CardRef};
use crate::core::{PlayerCardsArea, PlayerRole, Result};
use crate::events::{CardLostData, DyingData, EventId, GameEvent, MoveReason, PlayerDiedData, Stage};
use crate::response::MessageKind;
use crate::zones::CardLocation;

use super::Session;

/// Processing tag holding a judgment's card.
pub(super) fn judge_tag(id: EventId) -> String {
    format!("judge-{}", id.0)
}

pub(super) fn handle(session: &mut Session, event: &mut GameEvent, stage: Stage) -> Result<()> {
    match stage {
        Stage::GameStarting
        | Stage::PhaseChanged
        | Stage::CardResponding
        | Stage::JudgeEffect
        | Stage::AfterSkillUsed => session.broadcast_event(event),
        Stage::CardUsing => card_using(session, event),
        Stage::OnAim => on_aim(session, event),
        Stage::BeforeCardEffect => session.countering_window(event),
        Stage::CardEffecting => card_effecting(session, event),
        Stage::DamagedEffect => damaged_effect(session, event),
        Stage::PlayerDying => session.rescue(event),
        Stage::PlayerDied => player_died(session, event),
        Stage::OnJudge => on_judge(session, event),
        Stage::PinDianEffect => session.pin_dian_effect(event),
        Stage::CardDrawing => card_drawing(session, event),
        Stage::CardDropping => card_dropping(session, event),
        Stage::CardLosing => card_losing(session, event),
        Stage::CardObtaining => card_obtaining(session, event),
        Stage::SkillUsing => skill_using(session, event),
        Stage::SkillEffecting => skill_effecting(session, event),
        Stage::LosingHp => losing_hp(session, event),
        Stage::RecoverEffecting => recover_effecting(session, event),
        _ => Ok(()),
    }
}

fn card_using(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let Some(data) = event.card_use().cloned() else {
        return Ok(());
    };
    let definition = session.room.catalog().definition(data.card)?.clone();

    if definition.category == CardCategory::Equip {
        let physical = session.room.catalog().expand(data.card)?;
        let previous = session.room.cards_in_area(data.from, PlayerCardsArea::Equip);
        session.room.bury(&previous);
        for card in physical {
            session.room.move_to_area(card, data.from, PlayerCardsArea::Equip);
        }
    } else if let Some(skill) = session.room.catalog().skill_for(data.card) {
        skill.on_use(session, event)?;
    }

    if event.message.is_none() {
        let targets: Vec<String> = event
            .card_use()
            .map(|d| d.targets.iter().map(ToString::to_string).collect())
            .unwrap_or_default();
        event.message = Some(if targets.is_empty() {
            format!("{} uses {}", data.from, definition.name)
        } else {
            format!("{} uses {} on {}", data.from, definition.name, targets.join(", "))
        });
    }
    session.broadcast_event(event)
}

fn on_aim(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let room = &session.room;
    let Some(aim) = event.aim_mut() else {
        return Ok(());
    };
    aim.targets.retain(|p| room.is_alive(*p));
    if aim.targets.is_empty() {
        event.terminate();
    }
    Ok(())
}

fn card_effecting(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let room = &session.room;
    let Some(effect) = event.card_effect_mut() else {
        return Ok(());
    };
    let had_targets = !effect.targets.is_empty();
    effect.targets.retain(|p| room.is_alive(*p));
    let card = effect.card;
    if had_targets && effect.targets.is_empty() {
        log::debug!("{} lost every target", event.id);
        event.terminate();
        return Ok(());
    }

    match session.room.catalog().skill_for(card) {
        Some(skill) => skill.on_effect(session, event),
        None => Ok(()),
    }
}

fn damaged_effect(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let room = &session.room;
    let Some(damage) = event.damage_mut() else {
        return Ok(());
    };
    if !room.is_alive(damage.to) {
        event.terminate();
        return Ok(());
    }
    if damage.from.is_some_and(|from| !room.is_alive(from)) {
        damage.from = None;
    }
    let (to, from, amount) = (damage.to, damage.from, damage.amount);

    let victim = session.room.player_mut(to)?;
    victim.hp -= amount as i32;
    let hp = victim.hp;
    session.broadcast_event(event)?;

    if hp <= 0 {
        session.dispatch(GameEvent::new(DyingData {
            dying: to,
            killed_by: from,
        }))?;
    }
    Ok(())
}

fn player_died(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let Some(data) = event.player_died().cloned() else {
        return Ok(());
    };
    let victim = session.room.player_mut(data.player)?;
    if victim.dead {
        return Ok(());
    }
    victim.dead = true;
    log::info!("{} ({:?}) died", data.player, victim.role);

    session.broadcast_event(event)?;
    session.rules.remove_for_owner(data.player);

    let cards: Vec<CardRef> = session
        .room
        .all_cards_of(data.player)
        .into_iter()
        .map(CardRef::Physical)
        .collect();
    if !cards.is_empty() {
        session.drop_cards(data.player, cards)?;
    }

    if let Some(result) = session.room.game_winners() {
        session.finish(result)?;
    }
    Ok(())
}

fn on_judge(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let tag = judge_tag(event.id);
    let flipped = session.room.draw_from_pile(1, &tag);
    if let Some(judge) = event.judge_mut() {
        judge.judge_card = flipped.first().copied();
    }
    Ok(())
}

fn card_drawing(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let Some(data) = event.draw_card().cloned() else {
        return Ok(());
    };
    if !session.room.is_alive(data.to) {
        event.terminate();
        return Ok(());
    }

    let tag = session.processing_tag("draw");
    let cards = session.room.draw_from_pile(data.amount as usize, &tag);
    if let Some(draw) = event.draw_card_mut() {
        draw.cards.clone_from(&cards);
    }

    let identifier = MessageKind::Event(event.kind());
    session.broadcast(
        identifier,
        &json!({ "id": event.id, "to": data.to, "amount": cards.len() }),
    )?;
    session.notify(data.to, identifier, &json!({ "id": event.id, "cards": cards }))?;

    let refs = cards.into_iter().map(CardRef::Physical).collect();
    session.obtain_cards(data.to, refs, None, MoveReason::Draw)?;
    session.room.release_processing(&tag);
    Ok(())
}

fn card_dropping(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let Some(data) = event.card_drop().cloned() else {
        return Ok(());
    };
    session.broadcast_event(event)?;

    let lost = session.dispatch(GameEvent::new(CardLostData {
        from: data.from,
        cards: data.cards,
        reason: MoveReason::CardDrop,
    }))?;
    let Some(lost_data) = lost.card_lost() else {
        return Ok(());
    };

    // Only what actually left the owner's areas is buried.
    let physical = session.room.catalog().expand_all(&lost_data.cards)?;
    let dropped: Vec<_> = physical
        .into_iter()
        .filter(|&c| session.room.zones().is_in(c, CardLocation::Processing))
        .collect();
    session.room.bury(&dropped);
    Ok(())
}

fn card_losing(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let Some(data) = event.card_lost().cloned() else {
        return Ok(());
    };
    let physical = session.room.catalog().expand_all(&data.cards)?;

    let mut lost = Vec::with_capacity(physical.len());
    for card in physical {
        match session.room.card_owner(card) {
            Some((owner, _)) if owner == data.from => {
                session.room.move_to_processing(card);
                lost.push(CardRef::Physical(card));
            }
            _ => log::debug!("{} does not hold {}, not losing it", data.from, card),
        }
    }
    if let Some(data) = event.card_lost_mut() {
        data.cards = lost;
    }
    session.broadcast_event(event)
}

fn card_obtaining(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let Some(data) = event.obtain_card().cloned() else {
        return Ok(());
    };
    if !session.room.is_alive(data.to) {
        event.terminate();
        return Ok(());
    }
    let physical = session.room.catalog().expand_all(&data.cards)?;

    let mut obtained = Vec::with_capacity(physical.len());
    for card in physical {
        if session.room.card_owner(card).is_some() && session.room.is_card_on_processing(card) {
            log::debug!("{} is owned and in flight, skipping", card);
            continue;
        }
        session.room.move_to_area(card, data.to, PlayerCardsArea::Hand);
        obtained.push(CardRef::Physical(card));
    }
    if let Some(data) = event.obtain_card_mut() {
        data.cards = obtained;
    }
    session.broadcast_event(event)
}

fn skill_using(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let Some(name) = event.skill_use().map(|d| d.skill.clone()) else {
        return Ok(());
    };
    let skill = session.skills.get(&name)?;
    skill.on_use(session, event)
}

fn skill_effecting(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let Some(name) = event.skill_effect().map(|d| d.skill.clone()) else {
        return Ok(());
    };
    let skill = session.skills.get(&name)?;
    skill.on_effect(session, event)
}

fn losing_hp(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let Some(data) = event.lose_hp().cloned() else {
        return Ok(());
    };
    if !session.room.is_alive(data.to) {
        event.terminate();
        return Ok(());
    }
    let player = session.room.player_mut(data.to)?;
    player.hp -= data.amount as i32;
    let hp = player.hp;
    session.broadcast_event(event)?;

    if hp <= 0 {
        session.dispatch(GameEvent::new(DyingData {
            dying: data.to,
            killed_by: None,
        }))?;
    }
    Ok(())
}

fn recover_effecting(session: &mut Session, event: &mut GameEvent) -> Result<()> {
    let Some(data) = event.recover().cloned() else {
        return Ok(());
    };
    if !session.room.is_alive(data.to) {
        event.terminate();
        return Ok(());
    }
    let player = session.room.player_mut(data.to)?;
    player.hp = (player.hp + data.amount as i32).min(player.max_hp);
    session.broadcast_event(event)
}

impl Session {
    /// Push an event's state to every participant.
    pub fn broadcast_event(&mut self, event: &GameEvent) -> Result<()> {
        self.broadcast(
            MessageKind::Event(event.kind()),
            &json!({
                "id": event.id,
                "payload": &event.payload,
                "message": &event.message,
            }),
        )
    }

    /// A dying player nobody rescued dies.
    pub(super) fn after_dying(&mut self, event: &GameEvent) -> Result<()> {
        let Some(data) = event.dying() else {
            return Ok(());
        };
        if self.game_over.is_some() {
            return Ok(());
        }
        let player = self.room.player(data.dying)?;
        if player.is_alive() && player.hp <= 0 {
            self.dispatch(GameEvent::new(PlayerDiedData {
                player: data.dying,
                killed_by: data.killed_by,
            }))?;
        }
        Ok(())
    }

    /// Whoever kills a rebel draws the bonus.
    pub(super) fn after_player_died(&mut self, event: &GameEvent) -> Result<()> {
        let Some(data) = event.player_died() else {
            return Ok(());
        };
        if self.game_over.is_some() {
            return Ok(());
        }
        let Some(killer) = data.killed_by else {
            return Ok(());
        };
        let victim = self.room.player(data.player)?;
        if victim.dead && victim.role == PlayerRole::Rebel && self.room.is_alive(killer) {
            let bonus = self.config.rebel_kill_bonus;
            self.draw_cards(killer, bonus)?;
        }
        Ok(())
    }

    /// A card effect its counter cancelled.
    pub(super) fn reject_effect(&mut self, event: &mut GameEvent) -> Result<()> {
        let Some(card) = event.card_effect().map(|e| e.card) else {
            return Ok(());
        };
        match self.room.catalog().skill_for(card) {
            Some(skill) => skill.on_effect_rejected(self, event),
            None => Ok(()),
        }
    }
}
