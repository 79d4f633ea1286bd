//! End-to-end benchmarks: full random-vs-random games and the hot
//! forward-model operations
//!
//! Run with `--no-default-features` to measure without the logging
//! format! overhead.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use everdell_engine::core::PlayerId;
use everdell_engine::game::{
    new_game, GameLoop, Observer, PlayerController, RandomController, VerbosityLevel,
};

fn controllers(players: usize, seed: u64) -> Vec<Box<dyn PlayerController>> {
    (0..players)
        .map(|i| {
            Box::new(RandomController::new(
                PlayerId::new(i as u8),
                seed.wrapping_add(i as u64),
            )) as Box<dyn PlayerController>
        })
        .collect()
}

fn bench_full_game(c: &mut Criterion) {
    let mut seed = 0u64;
    c.bench_function("full_random_game_2p", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            let mut game = new_game(2, seed).expect("setup");
            game.logger.set_verbosity(VerbosityLevel::Silent);
            let mut game_loop = GameLoop::new(game, controllers(2, seed))
                .expect("loop")
                .with_max_actions(20_000);
            black_box(game_loop.run().expect("run"))
        })
    });
}

fn bench_legal_actions(c: &mut Criterion) {
    let mut game = new_game(4, 17).expect("setup");
    game.logger.set_verbosity(VerbosityLevel::Silent);
    c.bench_function("legal_actions_opening", |b| {
        b.iter(|| black_box(game.legal_actions()))
    });
}

fn bench_state_copies(c: &mut Criterion) {
    let mut game = new_game(4, 23).expect("setup");
    game.logger.set_verbosity(VerbosityLevel::Silent);
    c.bench_function("exact_clone", |b| b.iter(|| black_box(game.clone())));

    let mut seed = 0u64;
    c.bench_function("observer_copy", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(game.observer_copy(Observer::Player(PlayerId::new(0)), seed))
        })
    });
}

criterion_group!(
    benches,
    bench_full_game,
    bench_legal_actions,
    bench_state_copies
);
criterion_main!(benches);
