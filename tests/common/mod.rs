//! Shared helpers for integration tests: state surgery to set up exact
//! scenarios without replaying whole games

use everdell_engine::core::{CardId, CardName, LocationId, LocationKind, PlayerId};
use everdell_engine::game::GameState;

/// Pull the first copy of `name` out of the deck
pub fn take_from_deck(state: &mut GameState, name: CardName) -> CardId {
    let pos = state
        .deck
        .iter()
        .position(|&id| {
            state
                .card(id)
                .map(|card| card.name == name)
                .unwrap_or(false)
        })
        .unwrap_or_else(|| panic!("{name} not left in the deck"));
    state.deck.remove(pos)
}

/// Move a copy of `name` from the deck into a player's hand
pub fn give_hand_card(state: &mut GameState, player: PlayerId, name: CardName) -> CardId {
    let id = take_from_deck(state, name);
    state.player_mut(player).hand.push(id);
    id
}

/// Find the board location matching `pred`
pub fn find_location(state: &GameState, pred: fn(&LocationKind) -> bool) -> LocationId {
    state
        .board
        .iter()
        .copied()
        .find(|&id| {
            state
                .location(id)
                .map(|loc| pred(&loc.kind))
                .unwrap_or(false)
        })
        .expect("no board location matches")
}
