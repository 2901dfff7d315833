use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_sgs::core::{MatchConfig, PlayerId, PlayerRole};
use rust_sgs::events::{DamageData, GameEvent, GameEventKind, Stage};
use rust_sgs::response::{Reply, ScriptedTransport};
use rust_sgs::rules::Rule;
use rust_sgs::stack::StageScheduler;
use rust_sgs::Session;

fn walk_nested(depth: usize) {
    let mut scheduler = StageScheduler::new();
    for _ in 0..depth {
        scheduler.involve(GameEventKind::Damage);
        scheduler.next().unwrap();
    }
    while !scheduler.is_empty() {
        while scheduler.peek_next().is_some() {
            black_box(scheduler.next().unwrap());
        }
        scheduler.complete();
    }
}

fn session(rules: usize) -> Session {
    let transport = ScriptedTransport::new().with_fallback(|_, _| Some(Reply::Decline));
    let mut session = Session::builder()
        .with_config(MatchConfig::new().with_seed(1))
        .with_transport(Box::new(transport))
        .with_player("a", PlayerRole::Unknown, i32::MAX)
        .with_player("b", PlayerRole::Unknown, i32::MAX)
        .build()
        .unwrap();
    for i in 0..rules {
        session.register_rule(
            Rule::new(format!("noop-{}", i), Stage::DamageEffect, |_, _, _| Ok(()))
                .with_priority(i as i32 % 3),
        );
    }
    session
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_walk");
    for depth in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| walk_nested(depth))
        });
    }
    group.finish();

    let mut group = c.benchmark_group("dispatch_damage");
    for rules in [0usize, 8, 64] {
        let mut session = session(rules);
        group.bench_with_input(BenchmarkId::from_parameter(rules), &rules, |b, _| {
            b.iter(|| {
                let event = GameEvent::new(DamageData {
                    from: None,
                    to: PlayerId::new(1),
                    amount: 1,
                    cards: Vec::new(),
                    by_skill: None,
                });
                black_box(session.dispatch(event).unwrap())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
