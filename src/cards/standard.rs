//! Reference card set.
//!
//! Just enough cards to drive the built-in protocols: a counter card for the
//! countering window, a rescue card for the dying loop, a draft card, a
//! delayed trick and an equipment piece. Hosts register their own content on
//! top of this through [`CardCatalog::register_skill`].

use std::rc::Rc;

use serde_json::json;

use crate::core::{PlayerCardsArea, PlayerId, PlayerPhase, Result};
use crate::events::{GameEvent, MoveReason, Targets};
use crate::response::{MessageKind, Reply, RequestKind};
use crate::session::Session;

use super::definition::{CardCategory, CardId, CardSuit};
use super::reference::CardRef;
use super::registry::CardCatalog;
use super::skill::CardSkill;

pub const SLASH: &str = "slash";
pub const JINK: &str = "jink";
pub const PEACH: &str = "peach";
pub const NULLIFICATION: &str = "nullification";
pub const BARBARIAN_INVASION: &str = "barbarian-invasion";
pub const AMAZING_GRACE: &str = "amazing-grace";
pub const INDULGENCE: &str = "indulgence";
pub const CROSSBOW: &str = "crossbow";

/// Middleware key under which a draft stores its processing tag.
pub const DRAFT_POOL: &str = "draft-pool";

/// Attach the reference behaviour to every reference card name.
pub fn install(catalog: &mut CardCatalog) {
    catalog.register_skill(SLASH, Rc::new(Slash));
    catalog.register_skill(JINK, Rc::new(Passive));
    catalog.register_skill(PEACH, Rc::new(Peach));
    catalog.register_skill(NULLIFICATION, Rc::new(Nullification));
    catalog.register_skill(BARBARIAN_INVASION, Rc::new(BarbarianInvasion));
    catalog.register_skill(AMAZING_GRACE, Rc::new(AmazingGrace));
    catalog.register_skill(INDULGENCE, Rc::new(Indulgence));
    catalog.register_skill(CROSSBOW, Rc::new(Equipment));
}

/// Register a reference deck, returned in registration order.
pub fn standard_deck(catalog: &mut CardCatalog) -> Vec<CardId> {
    let mut deck = Vec::new();
    let mut add = |name: &str, suit: CardSuit, numbers: std::ops::RangeInclusive<u8>, category| {
        for number in numbers {
            deck.push(catalog.register(name, suit, number, category));
        }
    };

    add(SLASH, CardSuit::Spade, 2..=10, CardCategory::Basic);
    add(SLASH, CardSuit::Club, 2..=11, CardCategory::Basic);
    add(SLASH, CardSuit::Diamond, 6..=9, CardCategory::Basic);
    add(JINK, CardSuit::Heart, 2..=6, CardCategory::Basic);
    add(JINK, CardSuit::Diamond, 2..=5, CardCategory::Basic);
    add(JINK, CardSuit::Diamond, 10..=11, CardCategory::Basic);
    add(PEACH, CardSuit::Heart, 7..=9, CardCategory::Basic);
    add(PEACH, CardSuit::Heart, 12..=12, CardCategory::Basic);
    add(PEACH, CardSuit::Diamond, 12..=12, CardCategory::Basic);
    add(NULLIFICATION, CardSuit::Spade, 11..=11, CardCategory::Trick);
    add(NULLIFICATION, CardSuit::Club, 12..=13, CardCategory::Trick);
    add(NULLIFICATION, CardSuit::Diamond, 13..=13, CardCategory::Trick);
    add(BARBARIAN_INVASION, CardSuit::Spade, 7..=7, CardCategory::Trick);
    add(BARBARIAN_INVASION, CardSuit::Spade, 13..=13, CardCategory::Trick);
    add(BARBARIAN_INVASION, CardSuit::Club, 7..=7, CardCategory::Trick);
    add(AMAZING_GRACE, CardSuit::Heart, 3..=4, CardCategory::Trick);
    add(INDULGENCE, CardSuit::Spade, 6..=6, CardCategory::DelayedTrick);
    add(INDULGENCE, CardSuit::Club, 6..=6, CardCategory::DelayedTrick);
    add(INDULGENCE, CardSuit::Heart, 6..=6, CardCategory::DelayedTrick);
    add(CROSSBOW, CardSuit::Club, 1..=1, CardCategory::Equip);
    add(CROSSBOW, CardSuit::Diamond, 1..=1, CardCategory::Equip);

    deck
}

/// Every target of a card effect, or nothing for events of another kind.
fn effect_targets(event: &GameEvent) -> (Option<PlayerId>, Targets, Option<CardRef>) {
    match event.card_effect() {
        Some(effect) => (effect.from, effect.targets.clone(), Some(effect.card)),
        None => (None, Targets::new(), None),
    }
}

fn single_other_target(session: &Session, user: PlayerId, targets: &[PlayerId]) -> bool {
    matches!(targets, [target] if *target != user && session.room().is_alive(*target))
}

/// Cards only ever played in response.
struct Passive;

impl CardSkill for Passive {
    fn can_use_actively(&self, _session: &Session, _user: PlayerId) -> bool {
        false
    }
}

/// Equipment: moved to the equip area at `CardUsing`, no effect of its own.
struct Equipment;

impl CardSkill for Equipment {
    fn accepts_targets(&self, _session: &Session, _user: PlayerId, targets: &[PlayerId]) -> bool {
        targets.is_empty()
    }
}

struct Slash;

impl CardSkill for Slash {
    fn can_use_actively(&self, session: &Session, user: PlayerId) -> bool {
        let Ok(player) = session.room().player(user) else {
            return false;
        };
        let armed = session
            .room()
            .cards_in_area(user, PlayerCardsArea::Equip)
            .into_iter()
            .any(|c| session.room().catalog().is_named(CardRef::Physical(c), CROSSBOW));
        armed || player.times_used(SLASH) == 0
    }

    fn accepts_targets(&self, session: &Session, user: PlayerId, targets: &[PlayerId]) -> bool {
        single_other_target(session, user, targets)
    }

    fn on_effect(&self, session: &mut Session, event: &mut GameEvent) -> Result<()> {
        let (from, targets, card) = effect_targets(event);
        for target in targets {
            if session.respond_with(target, JINK, Some(event.id))?.is_some() {
                continue;
            }
            session.damage(from, target, 1, card.into_iter().collect())?;
        }
        Ok(())
    }
}

struct Peach;

impl CardSkill for Peach {
    fn can_use_actively(&self, session: &Session, user: PlayerId) -> bool {
        session
            .room()
            .player(user)
            .is_ok_and(|p| p.hp < p.max_hp)
    }

    fn accepts_targets(&self, _session: &Session, user: PlayerId, targets: &[PlayerId]) -> bool {
        targets.is_empty() || targets == [user]
    }

    fn on_use(&self, _session: &mut Session, event: &mut GameEvent) -> Result<()> {
        if let Some(data) = event.card_use_mut() {
            if data.targets.is_empty() {
                data.targets.push(data.from);
            }
        }
        Ok(())
    }

    fn on_effect(&self, session: &mut Session, event: &mut GameEvent) -> Result<()> {
        let (from, targets, _) = effect_targets(event);
        for target in targets {
            session.recover(target, 1, from)?;
        }
        Ok(())
    }
}

/// Counter card: cancels the effect it answers.
struct Nullification;

impl CardSkill for Nullification {
    fn can_use_actively(&self, _session: &Session, _user: PlayerId) -> bool {
        false
    }

    fn on_effect(&self, session: &mut Session, event: &mut GameEvent) -> Result<()> {
        if let Some(countered) = event.card_effect().and_then(|e| e.responding_to) {
            log::debug!("{} counters {}", event.id, countered);
            session.terminate_event(countered);
        }
        Ok(())
    }
}

struct BarbarianInvasion;

impl CardSkill for BarbarianInvasion {
    fn accepts_targets(&self, _session: &Session, _user: PlayerId, targets: &[PlayerId]) -> bool {
        targets.is_empty()
    }

    fn on_use(&self, session: &mut Session, event: &mut GameEvent) -> Result<()> {
        if let Some(data) = event.card_use_mut() {
            data.targets = session
                .room()
                .alive_players_from(data.from)
                .into_iter()
                .filter(|&p| p != data.from)
                .collect();
        }
        Ok(())
    }

    fn on_effect(&self, session: &mut Session, event: &mut GameEvent) -> Result<()> {
        let (from, targets, card) = effect_targets(event);
        for target in targets {
            if session.respond_with(target, SLASH, Some(event.id))?.is_some() {
                continue;
            }
            session.damage(from, target, 1, card.into_iter().collect())?;
        }
        Ok(())
    }
}

/// Five-grain draft: reveal one card per participant, each picks one in
/// turn order, leftovers are buried.
struct AmazingGrace;

impl AmazingGrace {
    fn pool(session: &Session, tag: &str) -> Vec<CardId> {
        session
            .room()
            .processing_cards(tag)
            .iter()
            .copied()
            .filter(|&c| session.room().card_owner(c).is_none())
            .collect()
    }
}

impl CardSkill for AmazingGrace {
    fn accepts_targets(&self, _session: &Session, _user: PlayerId, targets: &[PlayerId]) -> bool {
        targets.is_empty()
    }

    fn on_use(&self, session: &mut Session, event: &mut GameEvent) -> Result<()> {
        if let Some(data) = event.card_use_mut() {
            data.targets = session.room().alive_players_from(data.from).into_iter().collect();
        }
        Ok(())
    }

    fn before_effect(&self, session: &mut Session, template: &mut GameEvent) -> Result<()> {
        let amount = template.card_effect().map_or(0, |e| e.targets.len());
        let tag = session.processing_tag(AMAZING_GRACE);
        session.reveal_cards(amount, &tag)?;
        template.set_middleware(DRAFT_POOL, &tag)
    }

    fn on_effect(&self, session: &mut Session, event: &mut GameEvent) -> Result<()> {
        let Some(tag) = event.middleware::<String>(DRAFT_POOL) else {
            return Ok(());
        };
        let (_, targets, _) = effect_targets(event);
        for picker in targets {
            let pool = Self::pool(session, &tag);
            let Some(&first) = pool.first() else {
                return Ok(());
            };
            session.broadcast(MessageKind::PoolUpdate, &json!({ "pool": pool, "picker": picker }))?;

            let response =
                session.await_response(RequestKind::AmazingGracePick, picker, &json!({ "pool": pool }))?;
            let pick = match response.reply {
                Reply::Card(CardRef::Physical(id)) if pool.contains(&id) => id,
                _ => first,
            };
            session.obtain_cards(picker, vec![pick.into()], None, MoveReason::Obtained)?;
        }
        Ok(())
    }

    fn after_effect(&self, session: &mut Session, template: &mut GameEvent) -> Result<()> {
        let Some(tag) = template.middleware::<String>(DRAFT_POOL) else {
            return Ok(());
        };
        let buried = session.room_mut().release_processing(&tag);
        session.broadcast(MessageKind::PoolFinished, &json!({ "buried": buried }))
    }
}

/// Delayed trick: skip the play phase unless the judgment is a heart.
struct Indulgence;

impl CardSkill for Indulgence {
    fn accepts_targets(&self, session: &Session, user: PlayerId, targets: &[PlayerId]) -> bool {
        single_other_target(session, user, targets)
            && !session
                .room()
                .cards_in_area(targets[0], PlayerCardsArea::Judge)
                .into_iter()
                .any(|c| session.room().catalog().is_named(CardRef::Physical(c), INDULGENCE))
    }

    fn on_effect(&self, session: &mut Session, event: &mut GameEvent) -> Result<()> {
        let (_, targets, card) = effect_targets(event);
        for target in targets {
            let Some(judged) = session.judge(target, card, None)? else {
                continue;
            };
            if session.room().catalog().get(judged)?.suit != CardSuit::Heart {
                session.skip_phase(PlayerPhase::Play)?;
            }
        }
        Ok(())
    }
}
