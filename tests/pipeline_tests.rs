//! Stage pipeline integration tests.
//!
//! These tests drive events through the interpreter and check stage order,
//! cancellation, nesting, stage insertion and dead-target filtering.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use common::{basic, declining, p, table, trick, Table};
use rust_sgs::cards::standard::{BARBARIAN_INVASION, JINK, PEACH, SLASH};
use rust_sgs::cards::{CardCategory, CardId, CardRef};
use rust_sgs::core::{EngineError, PlayerCardsArea, PlayerPhase, PlayerRole};
use rust_sgs::events::{
    AimData, CardDropData, CardEffectData, CardLostData, CardResponseData, CardUseData, DamageData,
    DrawCardData, DyingData, GameEvent, GameEventKind, GameStartData, JudgeData, LoseHpData,
    MoveReason, ObtainCardData, PhaseChangeData, PinDianData, PlayerDiedData, RecoverData,
    SkillEffectData, SkillUseData, Stage, Targets,
};
use rust_sgs::response::RequestKind;
use rust_sgs::rules::Rule;
use rust_sgs::skills::Skill;
use rust_sgs::stack::StageScheduler;
use rust_sgs::zones::CardLocation;

const FFA: [PlayerRole; 3] = [PlayerRole::Unknown; 3];

fn damage(to: u8) -> GameEvent {
    GameEvent::new(DamageData {
        from: None,
        to: p(to),
        amount: 1,
        cards: Vec::new(),
        by_skill: None,
    })
}

/// Ability with no behaviour, so skill events have something to look up.
struct Idle;

impl Skill for Idle {
    fn name(&self) -> &str {
        "idle"
    }
}

/// Three seats, seat 0 holding one plain card, two cards left in the pile.
fn any_kind_table() -> Table {
    let deck = [basic("token", 5), basic(SLASH, 3), basic(JINK, 4)];
    let mut table = table(&FFA, &deck, declining());
    let token = table.cards[0];
    table.give(p(0), token);
    table.session.register_skill(Rc::new(Idle));
    table
}

/// The smallest event of `kind` that resolves without side conditions.
fn event_of(kind: GameEventKind, token: CardId) -> GameEvent {
    let card = CardRef::Physical(token);
    let target: Targets = smallvec::smallvec![p(1)];
    match kind {
        GameEventKind::GameStart => GameEvent::new(GameStartData { player: p(0) }),
        GameEventKind::PhaseChange => GameEvent::new(PhaseChangeData {
            from: None,
            to: PlayerPhase::Play,
            from_player: None,
            to_player: p(0),
        }),
        GameEventKind::CardUse => GameEvent::new(CardUseData {
            from: p(0),
            card,
            targets: target,
            to_cards: Vec::new(),
            responding_to: None,
        }),
        GameEventKind::Aim => GameEvent::new(AimData {
            from: p(0),
            card,
            targets: target,
        }),
        GameEventKind::CardEffect => GameEvent::new(CardEffectData {
            from: Some(p(0)),
            card,
            targets: target,
            to_cards: Vec::new(),
            responding_to: None,
        }),
        GameEventKind::CardResponse => GameEvent::new(CardResponseData {
            from: p(1),
            card,
            responding_to: None,
        }),
        GameEventKind::Damage => damage(1),
        GameEventKind::Dying => GameEvent::new(DyingData {
            dying: p(1),
            killed_by: None,
        }),
        GameEventKind::PlayerDied => GameEvent::new(PlayerDiedData {
            player: p(1),
            killed_by: None,
        }),
        GameEventKind::Judge => GameEvent::new(JudgeData {
            to: p(1),
            judge_card: None,
            by_card: None,
            by_skill: None,
        }),
        GameEventKind::PinDian => GameEvent::new(PinDianData {
            from: p(0),
            targets: target,
            result: None,
        }),
        GameEventKind::DrawCard => GameEvent::new(DrawCardData {
            to: p(1),
            amount: 1,
            cards: Vec::new(),
        }),
        GameEventKind::CardDrop => GameEvent::new(CardDropData {
            from: p(1),
            cards: Vec::new(),
        }),
        GameEventKind::CardLost => GameEvent::new(CardLostData {
            from: p(1),
            cards: Vec::new(),
            reason: MoveReason::CardDrop,
        }),
        GameEventKind::ObtainCard => GameEvent::new(ObtainCardData {
            to: p(1),
            cards: Vec::new(),
            from: None,
            reason: MoveReason::Draw,
        }),
        GameEventKind::SkillUse => GameEvent::new(SkillUseData {
            from: p(0),
            skill: "idle".to_string(),
            targets: Targets::new(),
            cards: Vec::new(),
        }),
        GameEventKind::SkillEffect => GameEvent::new(SkillEffectData {
            from: p(0),
            skill: "idle".to_string(),
            targets: Targets::new(),
            cards: Vec::new(),
            triggered_on: None,
        }),
        GameEventKind::LoseHp => GameEvent::new(LoseHpData { to: p(1), amount: 1 }),
        GameEventKind::Recover => GameEvent::new(RecoverData {
            to: p(1),
            amount: 1,
            from: None,
        }),
    }
}

// =============================================================================
// Stage Order
// =============================================================================

proptest! {
    /// Walking a lone event visits every declared stage once, in order.
    #[test]
    fn scheduler_visits_each_stage_once(index in 0usize..GameEventKind::ALL.len()) {
        let kind = GameEventKind::ALL[index];
        let mut scheduler = StageScheduler::new();

        let mut seen = vec![scheduler.involve(kind)];
        while scheduler.peek_next().is_some() {
            seen.push(scheduler.next().unwrap());
        }
        scheduler.complete();

        prop_assert_eq!(seen.as_slice(), kind.stages());
        prop_assert!(scheduler.is_empty());
    }

    /// Cancelling at stage k runs exactly the stages up to k, and the effect
    /// only lands if k comes after the effect stage.
    #[test]
    fn cancel_at_stage_stops_later_stages(k in 0usize..5) {
        let mut table = table(&FFA, &[], declining());
        let stages = GameEventKind::Damage.stages();
        let cancel_at = stages[k];

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let mut rule = Rule::new("watch", stages[0], move |_, event, ctx| {
            log.borrow_mut().push(ctx.stage);
            if ctx.stage == cancel_at {
                event.terminate();
            }
            Ok(())
        });
        for &stage in &stages[1..] {
            rule = rule.also_on(stage);
        }
        table.session.register_rule(rule);

        let event = table.session.dispatch(damage(1)).unwrap();
        let seen = seen.borrow().clone();

        prop_assert!(event.is_terminated());
        prop_assert_eq!(seen.as_slice(), &stages[..=k]);
        let damaged = stages[..k].contains(&Stage::DamagedEffect);
        prop_assert_eq!(table.hp(p(1)), if damaged { 3 } else { 4 });
        prop_assert!(table.session.stages().is_empty());
    }

    /// Every kind dispatched through the session visits its stages in
    /// order, and cancelling at stage k runs no stage after k.
    #[test]
    fn every_kind_stops_where_cancelled(index in 0usize..GameEventKind::ALL.len(), cut in 0usize..8) {
        let kind = GameEventKind::ALL[index];
        let stages = kind.stages();
        // One past the last stage means nobody cancels.
        let k = cut % (stages.len() + 1);
        let cancel_at = stages.get(k).copied();

        let mut table = any_kind_table();
        let token = table.cards[0];
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let mut rule = Rule::new("watch", stages[0], move |_, event, ctx| {
            log.borrow_mut().push(ctx.stage);
            if Some(ctx.stage) == cancel_at {
                event.terminate();
            }
            Ok(())
        });
        for &stage in &stages[1..] {
            rule = rule.also_on(stage);
        }
        table.session.register_rule(rule);

        let event = table.session.dispatch(event_of(kind, token)).unwrap();
        let seen = seen.borrow().clone();

        match cancel_at {
            Some(_) => {
                prop_assert!(event.is_terminated());
                prop_assert_eq!(seen.as_slice(), &stages[..=k]);
            }
            None => {
                prop_assert!(!event.is_terminated());
                prop_assert_eq!(seen.as_slice(), stages);
            }
        }
        prop_assert!(table.session.stages().is_empty());
    }
}

/// Test that a rule with higher priority runs first.
#[test]
fn test_rules_run_by_priority_then_registration() {
    let mut table = table(&FFA, &[], declining());
    let order = Rc::new(RefCell::new(Vec::new()));

    for (name, priority) in [("low", 0), ("high", 5), ("low-later", 0)] {
        let log = Rc::clone(&order);
        table.session.register_rule(
            Rule::new(name, Stage::DamageStart, move |_, _, _| {
                log.borrow_mut().push(name);
                Ok(())
            })
            .with_priority(priority),
        );
    }

    table.session.dispatch(damage(0)).unwrap();
    assert_eq!(*order.borrow(), vec!["high", "low", "low-later"]);
}

// =============================================================================
// Nesting
// =============================================================================

/// Test that a nested event runs on top of its parent and the parent
/// resumes exactly where it was.
#[test]
fn test_nested_event_resumes_parent() {
    let mut table = table(&FFA, &[], declining());
    let observed = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&observed);
    table.session.register_rule(Rule::new("heal-on-hit", Stage::DamageEffect, move |session, _, _| {
        let inner = Rc::clone(&log);
        session.dispatch_with(
            GameEvent::new(RecoverData {
                to: p(2),
                amount: 1,
                from: None,
            }),
            move |session, _, stage| {
                inner
                    .borrow_mut()
                    .push((stage, session.stages().depth(), session.stages().current()));
                Ok(())
            },
        )?;
        log.borrow_mut().push((
            Stage::DamageEffect,
            session.stages().depth(),
            session.stages().current(),
        ));
        Ok(())
    }));

    table.set_hp(p(2), 2);
    table.session.dispatch(damage(1)).unwrap();

    let observed = observed.borrow();
    assert_eq!(observed.len(), 4);
    for &(stage, depth, current) in &observed[..3] {
        assert_eq!(depth, 2);
        assert_eq!(current, Some(stage));
    }
    assert_eq!(observed[3], (Stage::DamageEffect, 1, Some(Stage::DamageEffect)));
    assert_eq!(table.hp(p(1)), 3);
    assert_eq!(table.hp(p(2)), 3);
}

/// Test that inserting a stage makes it run again.
#[test]
fn test_inserted_stage_runs_twice() {
    let mut table = table(&FFA, &[], declining());
    table.session.register_rule(
        Rule::new("double", Stage::DamagedEffect, |session, _, _| {
            session.insert_stages(GameEventKind::Damage, &[Stage::DamagedEffect])
        })
        .with_uses(1),
    );

    table.session.dispatch(damage(1)).unwrap();
    assert_eq!(table.hp(p(1)), 2);
}

/// Test that insertion checks the kind and needs a running event.
#[test]
fn test_insert_stages_errors() {
    let mut table = table(&FFA, &[], declining());
    assert!(matches!(
        table.session.insert_stages(GameEventKind::Damage, &[Stage::DamagedEffect]),
        Err(EngineError::NoActiveEvent)
    ));

    table.session.register_rule(Rule::new("wrong", Stage::DamageStart, |session, _, _| {
        let result = session.insert_stages(GameEventKind::Damage, &[Stage::PlayerDying]);
        assert!(matches!(result, Err(EngineError::StageKindMismatch { .. })));
        Ok(())
    }));
    table.session.dispatch(damage(1)).unwrap();
}

/// Test that the turn accessors refuse to answer before the match starts.
#[test]
fn test_accessors_before_start() {
    let mut table = table(&FFA, &[], declining());
    assert!(matches!(table.session.current_player(), Err(EngineError::NotStarted)));
    assert!(matches!(table.session.current_phase(), Err(EngineError::NotStarted)));
    assert!(matches!(table.session.current_stage(), Err(EngineError::NotStarted)));
    assert!(matches!(
        table.session.skip_phase(PlayerPhase::Play),
        Err(EngineError::NotStarted)
    ));

    table.session.start().unwrap();
    assert_eq!(table.session.current_player().unwrap(), p(0));
    assert_eq!(table.session.current_stage().unwrap(), None);
}

// =============================================================================
// Dead Targets
// =============================================================================

/// Test that a target killed between use and effect is skipped.
#[test]
fn test_dead_target_filtered_at_aim() {
    let mut table = table(&FFA, &[trick(BARBARIAN_INVASION, 7)], declining());
    let invasion = table.cards[0];
    table.give(p(0), invasion);

    table.session.register_rule(Rule::new("ambush", Stage::AfterCardUsed, |session, _, _| {
        session.room_mut().player_mut(p(2))?.dead = true;
        Ok(())
    }));

    table
        .session
        .use_card(CardUseData {
            from: p(0),
            card: invasion.into(),
            targets: Targets::new(),
            to_cards: Vec::new(),
            responding_to: None,
        })
        .unwrap();

    assert_eq!(table.outbox.requests_to(RequestKind::CardResponse, p(1)), 1);
    assert_eq!(table.outbox.requests_to(RequestKind::CardResponse, p(2)), 0);
    assert_eq!(table.hp(p(1)), 3);
    assert_eq!(table.hp(p(2)), 4);
}

/// Test that an aim left with no living target cancels every effect.
#[test]
fn test_aim_without_targets_resolves_nothing() {
    let mut table = table(&FFA, &[basic(SLASH, 5)], declining());
    let slash = table.cards[0];
    table.give(p(0), slash);

    table.session.register_rule(Rule::new("vanish", Stage::AfterCardUsed, |session, _, _| {
        session.room_mut().player_mut(p(1))?.dead = true;
        Ok(())
    }));

    table
        .session
        .use_card(CardUseData {
            from: p(0),
            card: slash.into(),
            targets: smallvec::smallvec![p(1)],
            to_cards: Vec::new(),
            responding_to: None,
        })
        .unwrap();

    assert_eq!(table.outbox.requests_to(RequestKind::CardResponse, p(1)), 0);
    assert_eq!(table.hp(p(1)), 4);
    assert!(table.session.room().zones().is_in(slash, CardLocation::DropStack));
}

// =============================================================================
// Virtual Cards
// =============================================================================

/// Test that a virtual card moves the physical cards behind it.
#[test]
fn test_virtual_card_expands_to_physical() {
    let mut table = table(&FFA, &[basic(JINK, 3), basic(PEACH, 9)], declining());
    let (jink, peach) = (table.cards[0], table.cards[1]);
    table.give(p(0), jink);
    table.give(p(0), peach);

    let slash = table
        .session
        .room_mut()
        .catalog_mut()
        .create_virtual(SLASH, CardCategory::Basic, vec![jink, peach], Some("twin-blades"))
        .unwrap();
    assert!(table.session.room().holds(p(0), slash, PlayerCardsArea::Hand));

    table
        .session
        .use_card(CardUseData {
            from: p(0),
            card: slash,
            targets: smallvec::smallvec![p(1)],
            to_cards: Vec::new(),
            responding_to: None,
        })
        .unwrap();

    assert_eq!(table.hp(p(1)), 3);
    assert!(table.session.room().hand(p(0)).is_empty());
    for card in [jink, peach] {
        assert!(table.session.room().zones().is_in(card, CardLocation::DropStack));
        assert!(!table.session.room().is_card_on_processing(card));
    }
    assert!(matches!(slash, CardRef::Virtual(_)));
}
