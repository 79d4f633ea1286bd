//! Information-hiding observer copies for imperfect-information search

use everdell_engine::core::{CardName, PlayerId};
use everdell_engine::game::{new_game, GameState, Observer, VerbosityLevel};
use similar_asserts::assert_eq;

const P0: PlayerId = PlayerId::new(0);
const P1: PlayerId = PlayerId::new(1);

fn quiet_game(players: usize, seed: u64) -> GameState {
    let mut game = new_game(players, seed).unwrap();
    game.logger.set_verbosity(VerbosityLevel::Silent);
    game
}

/// Multiset of identities in a card-id list
fn names(state: &GameState, ids: impl IntoIterator<Item = everdell_engine::core::CardId>) -> Vec<CardName> {
    let mut out: Vec<CardName> = ids
        .into_iter()
        .map(|id| state.card(id).unwrap().name)
        .collect();
    out.sort();
    out
}

#[test]
fn test_all_observer_copy_is_exact() {
    let game = quiet_game(3, 21);
    let copy = game.observer_copy(Observer::All, 999);
    assert_eq!(
        serde_json::to_value(&game).unwrap(),
        serde_json::to_value(&copy).unwrap()
    );
}

#[test]
fn test_player_copy_preserves_what_the_observer_sees() {
    let game = quiet_game(3, 34);
    let copy = game.observer_copy(Observer::Player(P0), 7);

    // Own hand, public zones, and bookkeeping are untouched
    assert_eq!(game.player(P0).hand, copy.player(P0).hand);
    assert_eq!(game.meadow, copy.meadow);
    assert_eq!(game.discard, copy.discard);
    assert_eq!(game.board, copy.board);
    assert_eq!(game.current_player, copy.current_player);
    for (a, b) in game.players.iter().zip(&copy.players) {
        assert_eq!(a.village, b.village);
        assert_eq!(a.resources, b.resources);
        assert_eq!(a.hand.len(), b.hand.len(), "hand sizes are public");
    }
    // The main random stream is never consumed by redeterminization
    assert_eq!(game.rng, copy.rng);
}

#[test]
fn test_player_copy_preserves_the_hidden_multiset() {
    let game = quiet_game(3, 55);
    let copy = game.observer_copy(Observer::Player(P1), 1234);

    let hidden = |state: &GameState, observer: PlayerId| {
        let mut ids: Vec<_> = state.deck.clone();
        for player in &state.players {
            if player.id != observer {
                ids.extend(player.hand.iter().copied());
            }
        }
        names(state, ids)
    };
    assert_eq!(hidden(&game, P1), hidden(&copy, P1));
}

#[test]
fn test_same_seed_same_redeal() {
    let game = quiet_game(2, 62);
    let a = game.observer_copy(Observer::Player(P0), 5);
    let b = game.observer_copy(Observer::Player(P0), 5);
    assert_eq!(
        serde_json::to_value(&a).unwrap(),
        serde_json::to_value(&b).unwrap()
    );
}

#[test]
fn test_copy_offers_the_same_top_level_actions() {
    let game = quiet_game(2, 70);
    // The player to move sees their own hand, so their menu is identical
    let copy = game.observer_copy(Observer::Player(game.player_to_move()), 11);
    assert_eq!(game.legal_actions(), copy.legal_actions());
}
