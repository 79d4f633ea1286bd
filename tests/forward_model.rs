//! Forward-model scenarios: worker placement, play legality, season
//! gating, and multi-step decision chains

mod common;

use common::{find_location, give_hand_card, take_from_deck};
use everdell_engine::core::{
    BasicLocation, CardName, LocationKind, PlayerId, Resource, ResourceMap,
};
use everdell_engine::game::{new_game, Action, CardZone, Payment, VerbosityLevel};
use smallvec::smallvec;

const P0: PlayerId = PlayerId::new(0);
const P1: PlayerId = PlayerId::new(1);

fn quiet_game(players: usize, seed: u64) -> everdell_engine::game::GameState {
    let mut game = new_game(players, seed).unwrap();
    game.logger.set_verbosity(VerbosityLevel::Silent);
    game
}

#[test]
fn test_three_twig_location_gains_three_twig() {
    let mut game = quiet_game(2, 11);
    let spot = find_location(&game, |k| {
        matches!(k, LocationKind::Basic(BasicLocation::ThreeTwig))
    });

    game.apply(&Action::PlaceWorker { location: spot }).unwrap();

    assert_eq!(game.player(P0).resources.get(Resource::Twig), 3);
    assert_eq!(game.player(P0).workers, 1);
    assert!(!game.is_decision_pending());
    // The turn moved on
    assert_eq!(game.current_player, P1);
    // The spot is exclusive and now full
    assert!(!game.location(spot).unwrap().is_free_for(P1));
}

#[test]
fn test_legal_actions_is_pure_and_deterministic() {
    let game = quiet_game(3, 23);
    let before = serde_json::to_value(&game).unwrap();
    let first = game.legal_actions();
    let second = game.legal_actions();
    let after = serde_json::to_value(&game).unwrap();

    assert_eq!(first, second);
    assert_eq!(before, after, "enumeration must not mutate the state");
    assert!(!first.is_empty());
}

#[test]
fn test_illegal_action_rejected_without_mutation() {
    let mut game = quiet_game(2, 5);
    let before = serde_json::to_value(&game).unwrap();

    // Workers are unspent, so resting is not on the menu yet
    assert!(game.apply(&Action::AdvanceSeason).is_err());
    assert_eq!(before, serde_json::to_value(&game).unwrap());
}

#[test]
fn test_season_advance_gated_on_zero_workers() {
    let mut game = quiet_game(2, 31);
    assert!(!game.legal_actions().contains(&Action::AdvanceSeason));

    // Burn both workers on shared spots
    for _ in 0..2 {
        game.current_player = P0;
        let spot = game
            .legal_actions()
            .into_iter()
            .find_map(|a| match a {
                Action::PlaceWorker { location } => Some(location),
                _ => None,
            })
            .expect("a free location");
        game.apply(&Action::PlaceWorker { location: spot }).unwrap();
        // Some locations open a decision chain; answer until quiet
        while game.is_decision_pending() {
            let choice = game.legal_actions().into_iter().next().unwrap();
            game.apply(&choice).unwrap();
        }
    }

    game.current_player = P0;
    assert_eq!(game.player(P0).workers, 0);
    assert!(game.legal_actions().contains(&Action::AdvanceSeason));

    game.apply(&Action::AdvanceSeason).unwrap();
    while game.is_decision_pending() {
        let choice = game.legal_actions().into_iter().next().unwrap();
        game.apply(&choice).unwrap();
    }
    use everdell_engine::core::Season;
    assert_eq!(game.player(P0).season, Season::Spring);
    // Spring: 2 + 1 workers, all recalled
    assert_eq!(game.player(P0).workers, 3);
}

#[test]
fn test_unique_card_blocked_in_village() {
    let mut game = quiet_game(2, 17);
    let first = give_hand_card(&mut game, P0, CardName::ClockTower);
    let second = give_hand_card(&mut game, P0, CardName::ClockTower);
    game.player_mut(P0).resources += CardName::ClockTower.cost() + CardName::ClockTower.cost();

    game.apply(&Action::PlayCard {
        card: first,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();

    game.current_player = P0;
    let replay = Action::PlayCard {
        card: second,
        source: CardZone::Hand,
        payment: Payment::Resources,
    };
    assert!(!game.legal_actions().contains(&replay));
    assert!(game.apply(&replay).is_err());
}

#[test]
fn test_occupancy_houses_a_critter_for_free() {
    let mut game = quiet_game(2, 29);
    let farm = give_hand_card(&mut game, P0, CardName::Farm);
    let husband = give_hand_card(&mut game, P0, CardName::Husband);
    game.player_mut(P0).resources += CardName::Farm.cost();

    game.apply(&Action::PlayCard {
        card: farm,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();
    // Farm production fired on play
    let berries_after_farm = game.player(P0).resources.get(Resource::Berry);

    game.current_player = P0;
    game.apply(&Action::PlayCard {
        card: husband,
        source: CardZone::Hand,
        payment: Payment::Occupancy,
    })
    .unwrap();

    assert_eq!(
        game.player(P0).resources.get(Resource::Berry),
        berries_after_farm,
        "occupancy pays nothing"
    );
    assert_eq!(game.card(farm).unwrap().occupant, Some(husband));
    assert!(game.card(husband).unwrap().paid);
}

#[test]
fn test_paired_couple_shares_a_village_slot() {
    let mut game = quiet_game(2, 41);
    let husband = give_hand_card(&mut game, P0, CardName::Husband);
    let wife = give_hand_card(&mut game, P0, CardName::Wife);
    game.player_mut(P0).resources += CardName::Husband.cost() + CardName::Wife.cost();

    game.apply(&Action::PlayCard {
        card: husband,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();
    assert_eq!(game.village_size(P0), 1);

    game.current_player = P0;
    game.apply(&Action::PlayCard {
        card: wife,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();

    // Two cards, one slot: the pair bonus is granted exactly once
    assert_eq!(game.player(P0).village.len(), 2);
    assert_eq!(game.village_size(P0), 1);
    assert_eq!(game.card(husband).unwrap().partner, Some(wife));
    assert_eq!(game.card(wife).unwrap().partner, Some(husband));
}

#[test]
fn test_peddler_trade_is_atomic_across_the_chain() {
    let mut game = quiet_game(2, 37);
    let peddler = give_hand_card(&mut game, P0, CardName::Peddler);
    game.player_mut(P0).resources += CardName::Peddler.cost();
    game.player_mut(P0).resources.add(Resource::Twig, 1);
    game.player_mut(P0).resources.add(Resource::Resin, 1);

    game.apply(&Action::PlayCard {
        card: peddler,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();

    // Step 1: what to pay; nothing is deducted yet
    assert!(game.is_decision_pending());
    let pay = Action::ChooseResources(ResourceMap::single(Resource::Twig, 1));
    assert!(game.legal_actions().contains(&pay));
    game.apply(&pay).unwrap();
    assert_eq!(
        game.player(P0).resources.get(Resource::Twig),
        1,
        "the trade settles in one step, not piecemeal"
    );

    // Step 2: the gain; both legs settle together
    assert!(game.is_decision_pending());
    let gain = Action::ChooseResources(ResourceMap::single(Resource::Pebble, 1));
    game.apply(&gain).unwrap();

    assert!(!game.is_decision_pending());
    assert_eq!(game.player(P0).resources.get(Resource::Twig), 0);
    assert_eq!(game.player(P0).resources.get(Resource::Resin), 1);
    assert_eq!(game.player(P0).resources.get(Resource::Pebble), 1);
}

#[test]
fn test_basic_event_claim_and_gate() {
    let mut game = quiet_game(2, 43);
    // Three production cards gate the green event
    for _ in 0..3 {
        let id = common::take_from_deck(&mut game, CardName::Farm);
        game.card_mut(id).unwrap().paid = true;
        game.player_mut(P0).village.push(id);
    }
    use everdell_engine::core::CardColor;
    let event = find_location(&game, |k| {
        matches!(k, LocationKind::BasicEvent(CardColor::Production))
    });

    // P1 has no production cards and cannot claim
    game.current_player = P1;
    assert!(!game
        .legal_actions()
        .contains(&Action::PlaceWorker { location: event }));

    game.current_player = P0;
    game.apply(&Action::PlaceWorker { location: event }).unwrap();
    assert_eq!(game.location(event).unwrap().claimed_by, Some(P0));
    assert_eq!(game.player(P0).events_achieved, 1);

    // Claimed events are closed to everyone
    game.current_player = P1;
    assert!(!game
        .legal_actions()
        .contains(&Action::PlaceWorker { location: event }));
}

#[test]
fn test_wanderer_takes_no_village_slot() {
    let mut game = quiet_game(2, 47);
    let wanderer = give_hand_card(&mut game, P0, CardName::Wanderer);
    game.player_mut(P0).resources += CardName::Wanderer.cost();
    let hand_before = game.player(P0).hand.len();

    game.apply(&Action::PlayCard {
        card: wanderer,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();

    assert_eq!(game.village_size(P0), 0);
    assert_eq!(game.player(P0).village.len(), 1);
    // Draw 3, minus the wanderer leaving the hand
    assert_eq!(game.player(P0).hand.len(), hand_before - 1 + 3);
}

#[test]
fn test_bard_scores_discarded_cards() {
    let mut game = quiet_game(2, 53);
    let bard = give_hand_card(&mut game, P0, CardName::Bard);
    game.player_mut(P0).resources += CardName::Bard.cost();

    game.apply(&Action::PlayCard {
        card: bard,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();

    assert!(game.is_decision_pending());
    let victims: smallvec::SmallVec<[_; 4]> =
        game.player(P0).hand.iter().copied().take(2).collect();
    let discard_two = Action::ChooseCards(victims);
    assert!(game.legal_actions().contains(&discard_two));
    game.apply(&discard_two).unwrap();

    assert_eq!(game.player(P0).point_tokens, 2);
    assert!(!game.is_decision_pending());
}

#[test]
fn test_decline_only_offered_on_optional_steps() {
    let mut game = quiet_game(2, 59);
    let bard = give_hand_card(&mut game, P0, CardName::Bard);
    game.player_mut(P0).resources += CardName::Bard.cost();
    game.apply(&Action::PlayCard {
        card: bard,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();

    // The bard's discard is non-strict: the empty selection is the way
    // out, not a Decline
    let legal = game.legal_actions();
    assert!(!legal.contains(&Action::Decline));
    assert!(legal.contains(&Action::ChooseCards(smallvec![])));
}

#[test]
fn test_crane_discount_lands_on_the_shortfall() {
    let mut game = quiet_game(2, 67);
    let crane = give_hand_card(&mut game, P0, CardName::Crane);
    let castle = give_hand_card(&mut game, P0, CardName::Castle);
    game.player_mut(P0).resources += CardName::Crane.cost();
    game.apply(&Action::PlayCard {
        card: crane,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();

    // 3 twig / 3 resin / 1 pebble cannot pay the castle outright, and
    // only covers it at a discount if the cut lands on the pebbles
    let mut pool = ResourceMap::new();
    pool.set(Resource::Twig, 3);
    pool.set(Resource::Resin, 3);
    pool.set(Resource::Pebble, 1);
    game.player_mut(P0).resources = pool;

    game.current_player = P0;
    let build = Action::PlayCard {
        card: castle,
        source: CardZone::Hand,
        payment: Payment::Crane,
    };
    assert!(game.legal_actions().contains(&build));
    game.apply(&build).unwrap();

    assert!(game.village_has(P0, CardName::Castle));
    // Crane builds are the crane's last act
    assert!(!game.village_has(P0, CardName::Crane));
    // The cut covered the pebble shortfall, then fell on a twig
    assert_eq!(game.player(P0).resources, ResourceMap::single(Resource::Twig, 2));
}

#[test]
fn test_unpairing_reclaims_the_shared_slot_once() {
    let mut game = quiet_game(2, 71);
    let husband = give_hand_card(&mut game, P0, CardName::Husband);
    let wife = give_hand_card(&mut game, P0, CardName::Wife);
    game.player_mut(P0).resources += CardName::Husband.cost() + CardName::Wife.cost();

    game.apply(&Action::PlayCard {
        card: husband,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();
    game.current_player = P0;
    game.apply(&Action::PlayCard {
        card: wife,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();
    assert_eq!(game.village_size(P0), 1);

    game.remove_from_village(P0, husband).unwrap();

    // The link is gone from both sides and the slot comes back once
    assert_eq!(game.card(wife).unwrap().partner, None);
    assert_eq!(game.card(husband).unwrap().partner, None);
    assert_eq!(game.player(P0).village.len(), 1);
    assert_eq!(game.village_size(P0), 1);
}

#[test]
fn test_university_cannot_salvage_itself() {
    let mut game = quiet_game(2, 73);
    let farm = give_hand_card(&mut game, P0, CardName::Farm);
    let university = give_hand_card(&mut game, P0, CardName::University);
    game.player_mut(P0).resources += CardName::Farm.cost() + CardName::University.cost();

    game.apply(&Action::PlayCard {
        card: farm,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();
    game.current_player = P0;
    game.apply(&Action::PlayCard {
        card: university,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();

    game.current_player = P0;
    let spot = game.card(university).unwrap().destination.unwrap();
    game.apply(&Action::PlaceWorker { location: spot }).unwrap();

    assert!(game.is_decision_pending());
    let legal = game.legal_actions();
    assert!(legal.contains(&Action::ChooseCards(smallvec![farm])));
    assert!(!legal.contains(&Action::ChooseCards(smallvec![university])));
}

#[test]
fn test_cemetery_tops_up_a_short_discard_pile_from_the_deck() {
    let mut game = quiet_game(2, 79);
    let cemetery = give_hand_card(&mut game, P0, CardName::Cemetery);
    game.player_mut(P0).resources += CardName::Cemetery.cost();
    game.apply(&Action::PlayCard {
        card: cemetery,
        source: CardZone::Hand,
        payment: Payment::Resources,
    })
    .unwrap();

    // Two cards in the discard pile, the rest must come off the deck
    let buried_a = take_from_deck(&mut game, CardName::Farm);
    let buried_b = take_from_deck(&mut game, CardName::Mine);
    game.discard = vec![buried_a, buried_b];

    game.current_player = P0;
    let spot = game.card(cemetery).unwrap().destination.unwrap();
    game.apply(&Action::PlaceWorker { location: spot }).unwrap();

    assert!(game.is_decision_pending());
    assert_eq!(game.revealed.len(), 4);
    assert!(game.revealed.contains(&buried_a));
    assert!(game.revealed.contains(&buried_b));
    assert!(game.discard.is_empty());
}
