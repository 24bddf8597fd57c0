// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
#![allow(missing_docs)]
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use guardian_engine::{
    compute_report_reward, AccountRegistry, ActivityStats, HazardCategory, LevelDefinition,
    LevelTable, MissionInstance, MissionKind, RewardEngine, SeverityEstimate, UserAccount,
};

fn bench_report_reward(c: &mut Criterion) {
    c.bench_function("compute_report_reward", |b| {
        b.iter(|| {
            for score in 1..=10 {
                black_box(compute_report_reward(black_box(score)).unwrap());
            }
        })
    });
}

fn bench_level_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_for");
    for size in [5u32, 100, 10_000] {
        let levels: Vec<LevelDefinition> = (0..size)
            .map(|i| LevelDefinition::new(i + 1, format!("L{i}"), u64::from(i) * 1_000))
            .collect();
        let table = LevelTable::new(levels).unwrap();
        let top = i64::from(size) * 1_000;
        group.bench_with_input(BenchmarkId::from_parameter(size), &table, |b, table| {
            b.iter(|| black_box(table.level_for(black_box(top / 2)).unwrap()))
        });
    }
    group.finish();
}

fn bench_mission_update(c: &mut Criterion) {
    c.bench_function("mission_update_progress", |b| {
        b.iter(|| {
            let mut mission = MissionInstance::new("m", "u", MissionKind::PeakReduction, 0);
            for step in 1..=20 {
                black_box(mission.update_progress(f64::from(step), 1).unwrap());
            }
        })
    });
}

fn bench_submit_report(c: &mut Criterion) {
    let engine = RewardEngine::default();
    let estimate = SeverityEstimate::new(8, 0.9);
    let stats = ActivityStats::default();
    c.bench_function("submit_report", |b| {
        b.iter(|| {
            let mut account = UserAccount::new("u", 0);
            black_box(
                engine
                    .submit_report(&mut account, &estimate, HazardCategory::Tilting, "r", &stats, 1)
                    .unwrap(),
            );
        })
    });
}

fn bench_registry_leaderboard(c: &mut Criterion) {
    let registry = AccountRegistry::default();
    for i in 0..1_000u64 {
        let id = format!("guardian-{i}");
        registry.open(&id, 0);
        registry
            .apply_points(&id, i * 37 % 5_000, guardian_engine::RewardSource::DailyBonus, 0)
            .unwrap();
    }
    c.bench_function("leaderboard_top_10_of_1000", |b| {
        b.iter(|| black_box(registry.leaderboard(10)))
    });
}

criterion_group!(
    benches,
    bench_report_reward,
    bench_level_lookup,
    bench_mission_update,
    bench_submit_report,
    bench_registry_leaderboard
);
criterion_main!(benches);
