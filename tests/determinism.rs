//! Determinism and copy-equivalence: the properties tree search relies on

use everdell_engine::core::PlayerId;
use everdell_engine::game::{
    new_game, GameEndReason, GameLoop, PlayerController, RandomController, VerbosityLevel,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use similar_asserts::assert_eq;

fn random_controllers(players: usize, seed: u64) -> Vec<Box<dyn PlayerController>> {
    (0..players)
        .map(|i| {
            Box::new(RandomController::new(
                PlayerId::new(i as u8),
                seed.wrapping_add(i as u64),
            )) as Box<dyn PlayerController>
        })
        .collect()
}

#[test]
fn test_full_game_replays_identically() {
    let run = |seed: u64| {
        let mut game = new_game(2, seed).unwrap();
        game.logger.set_verbosity(VerbosityLevel::Silent);
        let mut game_loop = GameLoop::new(game, random_controllers(2, 1000 + seed)).unwrap();
        let result = game_loop.run().unwrap();
        (
            serde_json::to_value(game_loop.game()).unwrap(),
            result.scores,
        )
    };

    let (state_a, scores_a) = run(77);
    let (state_b, scores_b) = run(77);
    assert_eq!(state_a, state_b);
    assert_eq!(scores_a, scores_b);
}

#[test]
fn test_clone_tracks_the_original_step_for_step() {
    let mut game = new_game(3, 13).unwrap();
    game.logger.set_verbosity(VerbosityLevel::Silent);
    let mut copy = game.clone();
    let mut rng = StdRng::seed_from_u64(4);

    for _ in 0..200 {
        let legal = game.legal_actions();
        assert_eq!(legal, copy.legal_actions());
        if legal.is_empty() {
            break;
        }
        let action = legal[rng.gen_range(0..legal.len())].clone();
        game.apply(&action).unwrap();
        copy.apply(&action).unwrap();
        assert_eq!(
            serde_json::to_value(&game).unwrap(),
            serde_json::to_value(&copy).unwrap()
        );
    }
}

#[test]
fn test_workers_are_conserved() {
    let mut game = new_game(2, 91).unwrap();
    game.logger.set_verbosity(VerbosityLevel::Silent);
    let mut rng = StdRng::seed_from_u64(8);

    for _ in 0..400 {
        let legal = game.legal_actions();
        if legal.is_empty() {
            break;
        }
        let action = legal[rng.gen_range(0..legal.len())].clone();
        game.apply(&action).unwrap();

        for player in &game.players {
            let placed: u8 = game
                .board
                .iter()
                .filter_map(|&id| game.location(id).ok())
                .map(|loc| loc.workers.iter().filter(|&&p| p == player.id).count() as u8)
                .sum();
            assert_eq!(
                player.workers + placed,
                player.workers_total,
                "{} lost or duplicated a worker",
                player.id
            );
        }
    }
}

#[test]
fn test_random_games_reach_the_end() {
    let mut finished = 0;
    for seed in 0..5 {
        let mut game = new_game(2, seed).unwrap();
        game.logger.set_verbosity(VerbosityLevel::Silent);
        let mut game_loop = GameLoop::new(game, random_controllers(2, seed))
            .unwrap()
            .with_max_actions(20_000);
        let result = game_loop.run().unwrap();
        if result.end_reason == GameEndReason::Finished {
            finished += 1;
            assert!(game_loop.game().final_scores.is_some());
        }
    }
    assert!(finished >= 4, "only {finished}/5 games finished");
}

#[test]
fn test_scoring_breakdown_adds_up() {
    let mut game = new_game(2, 3).unwrap();
    game.logger.set_verbosity(VerbosityLevel::Silent);
    let mut game_loop = GameLoop::new(game, random_controllers(2, 3))
        .unwrap()
        .with_max_actions(20_000);
    let result = game_loop.run().unwrap();

    for score in &result.scores {
        let sum: i32 = score.breakdown().iter().map(|(_, v)| v).sum();
        assert_eq!(sum, score.total);
    }
}
