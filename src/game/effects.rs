//! Effect resolution: card plays, location activations, and the
//! continuation dispatch that resumes suspended decision chains
//!
//! Effects never hold live references; everything is looked up by id at
//! resolution time. An effect that needs input pushes a decision step and
//! returns; `resolve_decision` picks the chain back up when the answer
//! arrives through `apply`.

use crate::core::{
    CardColor, CardId, CardKind, CardName, Location, LocationEffect, LocationId, LocationKind,
    PlayerId, Resource, ResourceMap,
};
use crate::game::actions::{Action, CardZone, Payment};
use crate::game::decision::{
    CardFilter, CardPool, Continuation, DecisionKind, EffectSource, PendingDecision, ResourceFilter,
};
use crate::game::state::GameState;
use crate::log_if_verbose;
use crate::{EverdellError, Result};
use smallvec::{smallvec, SmallVec};

impl GameState {
    // ---- card play ----

    pub(crate) fn execute_play_card(
        &mut self,
        player: PlayerId,
        card_id: CardId,
        zone: CardZone,
        payment: Payment,
    ) -> Result<()> {
        if payment == Payment::Dungeon {
            // The prisoner is chosen before anything moves; removal,
            // payment, and placement all happen in the continuation
            let dungeon_id = self
                .find_in_village(player, CardName::Dungeon)
                .ok_or_else(|| {
                    EverdellError::InvalidAction(format!("{player} has no dungeon"))
                })?;
            self.push_decision(PendingDecision {
                player,
                source: EffectSource::Card(dungeon_id),
                kind: DecisionKind::ChooseCards {
                    pool: CardPool::OwnVillage,
                    filter: CardFilter::UnimprisonedCritters,
                    count: 1,
                    strict: true,
                },
                continuation: Continuation::DungeonImprison {
                    card: card_id,
                    from_meadow: zone == CardZone::Meadow,
                },
            });
            return Ok(());
        }

        self.remove_from_zone(player, card_id, zone)?;
        self.pay_for_card(player, card_id, payment)?;
        self.card_mut(card_id)?.paid = true;
        self.finish_card_play(player, card_id)
    }

    fn remove_from_zone(&mut self, player: PlayerId, card_id: CardId, zone: CardZone) -> Result<()> {
        match zone {
            CardZone::Hand => self.remove_from_hand(player, card_id),
            CardZone::Meadow => {
                self.remove_from_meadow(card_id)?;
                self.refill_meadow();
                Ok(())
            }
        }
    }

    fn pay_for_card(&mut self, player: PlayerId, card_id: CardId, payment: Payment) -> Result<()> {
        let name = self.card(card_id)?.name;
        let cost = name.cost();
        match payment {
            Payment::Resources => {
                if !self.player_mut(player).resources.pay(&cost) {
                    let swapped = self.judge_swap(player, &cost).ok_or_else(|| {
                        EverdellError::InvalidAction(format!("{player} cannot afford {name}"))
                    })?;
                    if !self.player_mut(player).resources.pay(&swapped) {
                        return Err(EverdellError::InvalidAction(format!(
                            "{player} cannot afford {name}"
                        )));
                    }
                }
                Ok(())
            }
            Payment::Occupancy => {
                let home_id = self
                    .player(player)
                    .village
                    .iter()
                    .copied()
                    .find(|&id| self.card(id).map(|c| c.can_house(name)).unwrap_or(false))
                    .ok_or_else(|| {
                        EverdellError::InvalidAction(format!("no home for {name} in {player}'s village"))
                    })?;
                self.card_mut(home_id)?.occupant = Some(card_id);
                log_if_verbose!(self, "{player}'s {name} moves in for free");
                Ok(())
            }
            Payment::Crane => {
                self.pay_discounted(player, name, 3)?;
                self.discard_named_from_village(player, CardName::Crane)
            }
            Payment::Innkeeper => {
                self.pay_discounted(player, name, 3)?;
                self.discard_named_from_village(player, CardName::Innkeeper)
            }
            Payment::Dungeon => Err(EverdellError::InvalidAction(
                "dungeon payment resolves through its decision step".to_string(),
            )),
        }
    }

    fn pay_discounted(&mut self, player: PlayerId, name: CardName, discount: u8) -> Result<()> {
        let pool = self.player(player).resources;
        let cut = name.cost().discounted_toward(&pool, discount);
        if !self.player_mut(player).resources.pay(&cut) {
            return Err(EverdellError::InvalidAction(format!(
                "{player} cannot afford {name} even at a discount"
            )));
        }
        Ok(())
    }

    fn discard_named_from_village(&mut self, player: PlayerId, name: CardName) -> Result<()> {
        let id = self.find_in_village(player, name).ok_or_else(|| {
            EverdellError::InvalidAction(format!("{name} is not in {player}'s village"))
        })?;
        self.remove_from_village(player, id)?;
        self.discard_card(id)
    }

    /// The card is paid and container-free: route it into a village and
    /// fire its effect and the passive play triggers
    fn finish_card_play(&mut self, player: PlayerId, card_id: CardId) -> Result<()> {
        let name = self.card(card_id)?.name;
        self.logger.log_normal(&format!("{player} plays {name}"));
        if name == CardName::Fool {
            let eligible: SmallVec<[PlayerId; 3]> = self
                .other_players(player)
                .into_iter()
                .filter(|&t| {
                    !self.village_has(t, CardName::Fool)
                        && self.village_size(t) < self.params.village_limit as usize
                })
                .collect();
            if eligible.is_empty() {
                self.discard_card(card_id)?;
            } else {
                self.revealed.push(card_id);
                self.push_decision(PendingDecision {
                    player,
                    source: EffectSource::Card(card_id),
                    kind: DecisionKind::ChoosePlayer { eligible },
                    continuation: Continuation::FoolPlace { card: card_id },
                });
            }
        } else {
            self.place_card_in_village(player, card_id)?;
            self.run_on_play_effect(player, card_id)?;
        }
        self.run_play_triggers(player, card_id)
    }

    pub(crate) fn place_card_in_village(&mut self, player: PlayerId, card_id: CardId) -> Result<()> {
        let name = self.card(card_id)?.name;
        self.player_mut(player).village.push(card_id);

        // Husband/wife pairing: first unpaired partner, play order
        let partner_name = match name {
            CardName::Husband => Some(CardName::Wife),
            CardName::Wife => Some(CardName::Husband),
            _ => None,
        };
        if let Some(partner_name) = partner_name {
            let partner = self
                .player(player)
                .village
                .iter()
                .copied()
                .find(|&id| {
                    id != card_id
                        && self
                            .card(id)
                            .map(|c| c.name == partner_name && c.partner.is_none())
                            .unwrap_or(false)
                });
            if let Some(partner_id) = partner {
                self.card_mut(card_id)?.partner = Some(partner_id);
                self.card_mut(partner_id)?.partner = Some(card_id);
                log_if_verbose!(self, "{player}'s couple now shares a village slot");
            }
        }

        if name.data().creates_destination {
            let loc_id = self.next_location_id();
            let mut loc = Location::card_destination(loc_id, name, player);
            if self.second_slot_unlocked(player, name) {
                loc.capacity = 2;
            }
            self.register_location(loc);
            self.card_mut(card_id)?.destination = Some(loc_id);
        }

        // A critter arriving can retroactively unlock a second slot on a
        // destination already in the village
        let unlocks = match name {
            CardName::Monk => Some(CardName::Monastery),
            CardName::Undertaker => Some(CardName::Cemetery),
            _ => None,
        };
        if let Some(target) = unlocks {
            if let Some(target_id) = self.find_in_village(player, target) {
                if let Some(loc_id) = self.card(target_id)?.destination {
                    self.location_mut(loc_id)?.capacity = 2;
                }
            }
        }
        Ok(())
    }

    fn second_slot_unlocked(&self, player: PlayerId, name: CardName) -> bool {
        match name {
            CardName::Monastery => self.village_has(player, CardName::Monk),
            CardName::Cemetery => self.village_has(player, CardName::Undertaker),
            _ => false,
        }
    }

    // ---- on-play effects ----

    fn run_on_play_effect(&mut self, player: PlayerId, card_id: CardId) -> Result<()> {
        let name = self.card(card_id)?.name;
        if name.is_production() {
            return self.run_card_production(player, card_id);
        }
        let source = EffectSource::Card(card_id);
        match name {
            CardName::Wanderer => {
                self.draw_to_hand(player, 3);
            }
            CardName::Bard => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseCards {
                    pool: CardPool::Hand,
                    filter: CardFilter::Any,
                    count: 5,
                    strict: false,
                },
                continuation: Continuation::BardDiscard,
            }),
            CardName::PostalPigeon => {
                let revealed = self.reveal_from_deck(2);
                if !revealed.is_empty() {
                    self.push_decision(PendingDecision {
                        player,
                        source,
                        kind: DecisionKind::ChooseCards {
                            pool: CardPool::Revealed(revealed.clone()),
                            filter: CardFilter::PlayableFreeMaxPoints(3),
                            count: 1,
                            strict: false,
                        },
                        continuation: Continuation::PostalPigeonPlay { revealed },
                    });
                }
            }
            CardName::Ranger => {
                let eligible: SmallVec<[LocationId; 8]> = self
                    .board
                    .iter()
                    .copied()
                    .filter(|&id| {
                        self.location(id)
                            .map(|l| l.workers.contains(&player))
                            .unwrap_or(false)
                    })
                    .collect();
                self.push_decision(PendingDecision {
                    player,
                    source,
                    kind: DecisionKind::ChooseLocation {
                        eligible,
                        optional: true,
                    },
                    continuation: Continuation::RangerFrom,
                });
            }
            CardName::Undertaker => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseCards {
                    pool: CardPool::Meadow,
                    filter: CardFilter::Any,
                    count: 3,
                    strict: true,
                },
                continuation: Continuation::UndertakerDiscard,
            }),
            CardName::Ruins => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseCards {
                    pool: CardPool::OwnVillage,
                    filter: CardFilter::Kind(CardKind::Construction),
                    count: 1,
                    strict: true,
                },
                continuation: Continuation::Salvage {
                    refund_bonus_points: 0,
                    draw: 2,
                },
            }),
            CardName::Shepherd => {
                self.player_mut(player).resources.add(Resource::Berry, 3);
                if let Some(chapel_id) = self.find_in_village(player, CardName::Chapel) {
                    let tokens = self.card(chapel_id)?.tokens;
                    self.player_mut(player).point_tokens += tokens as i32;
                }
            }
            // Governance, prosperity, and destination cards have no
            // immediate effect; their value is passive or visited
            _ => {}
        }
        Ok(())
    }

    /// Fire a green card's production effect for `player`.
    ///
    /// Shared between playing the card, the seasonal production event, and
    /// copy effects (the copying player receives the output and their own
    /// village satisfies any conditions, except pairing, which is read
    /// from the copied instance).
    pub(crate) fn run_card_production(&mut self, player: PlayerId, card_id: CardId) -> Result<()> {
        let name = self.card(card_id)?.name;
        let source = EffectSource::Card(card_id);
        match name {
            CardName::Farm => self.player_mut(player).resources.add(Resource::Berry, 1),
            CardName::Mine => self.player_mut(player).resources.add(Resource::Pebble, 1),
            CardName::ResinRefinery => self.player_mut(player).resources.add(Resource::Resin, 1),
            CardName::TwigBarge => self.player_mut(player).resources.add(Resource::Twig, 2),
            CardName::GeneralStore => {
                let berries = if self.village_has(player, CardName::Farm) { 2 } else { 1 };
                self.player_mut(player).resources.add(Resource::Berry, berries);
            }
            CardName::BargeToad => {
                let farms = self.count_named(player, CardName::Farm) as u8;
                self.player_mut(player)
                    .resources
                    .add(Resource::Twig, 2 * farms);
            }
            CardName::Fairgrounds => {
                self.draw_to_hand(player, 2);
            }
            CardName::Husband => {
                let paired = self.card(card_id)?.partner.is_some();
                if paired && self.village_has(player, CardName::Farm) {
                    self.push_decision(PendingDecision {
                        player,
                        source,
                        kind: DecisionKind::ChooseResources {
                            max: 1,
                            strict: true,
                            from_owned: false,
                            allowed: ResourceFilter::Any,
                        },
                        continuation: Continuation::GainChosen,
                    });
                }
            }
            CardName::Storehouse => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseBundle {
                    options: smallvec![
                        ResourceMap::single(Resource::Twig, 3),
                        ResourceMap::single(Resource::Resin, 2),
                        ResourceMap::single(Resource::Pebble, 1),
                        ResourceMap::single(Resource::Berry, 2),
                    ],
                },
                continuation: Continuation::StorehouseStash,
            }),
            CardName::Peddler => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseResources {
                    max: 2,
                    strict: false,
                    from_owned: true,
                    allowed: ResourceFilter::Any,
                },
                continuation: Continuation::PeddlerPay,
            }),
            CardName::Teacher => {
                let drawn = self.reveal_from_deck(2);
                if !drawn.is_empty() {
                    self.push_decision(PendingDecision {
                        player,
                        source,
                        kind: DecisionKind::ChooseCards {
                            pool: CardPool::Revealed(drawn.clone()),
                            filter: CardFilter::Any,
                            count: 1,
                            strict: true,
                        },
                        continuation: Continuation::TeacherKeep { drawn },
                    });
                }
            }
            CardName::ChipSweep => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseCards {
                    pool: CardPool::OwnVillage,
                    filter: CardFilter::ActivatableProduction,
                    count: 1,
                    strict: true,
                },
                continuation: Continuation::ActivateProduction,
            }),
            CardName::MinerMole => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseCards {
                    pool: CardPool::OtherVillages,
                    filter: CardFilter::ActivatableProduction,
                    count: 1,
                    strict: true,
                },
                continuation: Continuation::ActivateProduction,
            }),
            CardName::Monk => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseResources {
                    max: 2,
                    strict: false,
                    from_owned: true,
                    allowed: ResourceFilter::Only(Resource::Berry),
                },
                continuation: Continuation::MonkGive,
            }),
            CardName::Doctor => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseResources {
                    max: 3,
                    strict: false,
                    from_owned: true,
                    allowed: ResourceFilter::Only(Resource::Berry),
                },
                continuation: Continuation::PayForPoints,
            }),
            CardName::Woodcarver => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseResources {
                    max: 3,
                    strict: false,
                    from_owned: true,
                    allowed: ResourceFilter::Only(Resource::Twig),
                },
                continuation: Continuation::PayForPoints,
            }),
            _ => {}
        }
        Ok(())
    }

    /// Passive triggers owned by the playing player's village, fired after
    /// every card they play regardless of how the play was initiated
    fn run_play_triggers(&mut self, player: PlayerId, played: CardId) -> Result<()> {
        let played_kind = self.card(played)?.kind();
        let village = self.player(player).village.clone();
        for card_id in village {
            if card_id == played {
                continue;
            }
            match self.card(card_id)?.name {
                CardName::Historian => {
                    self.draw_to_hand(player, 1);
                }
                CardName::Shopkeeper if played_kind == CardKind::Critter => {
                    self.player_mut(player).resources.add(Resource::Berry, 1);
                }
                CardName::Courthouse if played_kind == CardKind::Construction => {
                    self.push_decision(PendingDecision {
                        player,
                        source: EffectSource::Card(card_id),
                        kind: DecisionKind::ChooseResources {
                            max: 1,
                            strict: true,
                            from_owned: false,
                            allowed: ResourceFilter::NonBerry,
                        },
                        continuation: Continuation::GainChosen,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    // ---- location activation ----

    pub(crate) fn run_location_effect(&mut self, player: PlayerId, loc_id: LocationId) -> Result<()> {
        let effect = self.location(loc_id)?.effect;
        self.run_effect_descriptor(player, EffectSource::Location(loc_id), effect)
    }

    /// The central interpreter for location effect descriptors
    fn run_effect_descriptor(
        &mut self,
        player: PlayerId,
        source: EffectSource,
        effect: LocationEffect,
    ) -> Result<()> {
        match effect {
            LocationEffect::Gain { resources, cards } => {
                self.player_mut(player).resources += resources;
                self.draw_to_hand(player, cards);
                log_if_verbose!(self, "{player} gains {resources} and {cards} card(s)");
            }
            LocationEffect::GainAnyResources { count, cards } => {
                self.draw_to_hand(player, cards);
                self.push_decision(PendingDecision {
                    player,
                    source,
                    kind: DecisionKind::ChooseResources {
                        max: count,
                        strict: true,
                        from_owned: false,
                        allowed: ResourceFilter::Any,
                    },
                    continuation: Continuation::GainChosen,
                });
            }
            LocationEffect::DiscardForResources {
                max_cards,
                resources_per_card,
                cards_per_resource,
            } => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseCards {
                    pool: CardPool::Hand,
                    filter: CardFilter::Any,
                    count: max_cards,
                    strict: false,
                },
                continuation: Continuation::DiscardForResources {
                    resources_per_card,
                    cards_per_resource,
                },
            }),
            LocationEffect::CopyBasicLocation { cards } => {
                self.draw_to_hand(player, cards);
                let eligible = self.locations_of(|kind| matches!(kind, LocationKind::Basic(_)));
                self.push_decision(PendingDecision {
                    player,
                    source,
                    kind: DecisionKind::ChooseLocation {
                        eligible,
                        optional: false,
                    },
                    continuation: Continuation::CopyLocation,
                });
            }
            LocationEffect::Journey { points } => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseCards {
                    pool: CardPool::Hand,
                    filter: CardFilter::Any,
                    count: points,
                    strict: true,
                },
                continuation: Continuation::JourneyDiscard { points },
            }),
            LocationEffect::ClaimEvent { color, points: _ } => {
                let loc_id = self.source_location(source)?;
                self.location_mut(loc_id)?.claimed_by = Some(player);
                self.player_mut(player).events_achieved += 1;
                self.logger
                    .log_normal(&format!("{player} achieves the {color} event"));
            }
            LocationEffect::CardEffect(name) => {
                let loc_id = self.source_location(source)?;
                self.run_card_destination_effect(player, name, loc_id)?;
            }
        }
        Ok(())
    }

    /// Effects of worker spots owned by played destination cards
    fn run_card_destination_effect(
        &mut self,
        player: PlayerId,
        name: CardName,
        loc_id: LocationId,
    ) -> Result<()> {
        let owner = self.location(loc_id)?.owner;
        let source = EffectSource::Location(loc_id);
        // Open destinations reward their owner when a visitor drops by
        if let Some(owner) = owner {
            if owner != player && name.data().open_destination {
                self.player_mut(owner).point_tokens += 1;
            }
        }
        match name {
            CardName::Inn => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseCards {
                    pool: CardPool::MeadowPlayable { discount: 3 },
                    filter: CardFilter::Any,
                    count: 1,
                    strict: true,
                },
                continuation: Continuation::InnPlay { discount: 3 },
            }),
            CardName::PostOffice => {
                let eligible: SmallVec<[PlayerId; 3]> =
                    self.other_players(player).into_iter().collect();
                self.push_decision(PendingDecision {
                    player,
                    source,
                    kind: DecisionKind::ChoosePlayer { eligible },
                    continuation: Continuation::PostOfficeTarget,
                });
            }
            CardName::Lookout => {
                let eligible = self.locations_of(|kind| {
                    matches!(kind, LocationKind::Basic(_) | LocationKind::Forest(_))
                });
                self.push_decision(PendingDecision {
                    player,
                    source,
                    kind: DecisionKind::ChooseLocation {
                        eligible,
                        optional: false,
                    },
                    continuation: Continuation::CopyLocation,
                });
            }
            CardName::Queen => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseCards {
                    pool: CardPool::HandAndMeadow,
                    filter: CardFilter::PlayableFreeMaxPoints(3),
                    count: 1,
                    strict: false,
                },
                continuation: Continuation::QueenPlay,
            }),
            CardName::Monastery => self.push_decision(PendingDecision {
                player,
                source,
                kind: DecisionKind::ChooseResources {
                    max: 2,
                    strict: true,
                    from_owned: true,
                    allowed: ResourceFilter::Any,
                },
                continuation: Continuation::MonasteryGive,
            }),
            CardName::Cemetery => {
                // Reveals come from the discard pile first, topped up
                // from the deck when it runs short
                let mut revealed: SmallVec<[CardId; 4]> = SmallVec::new();
                while revealed.len() < 4 {
                    match self.discard.pop() {
                        Some(id) => {
                            self.revealed.push(id);
                            revealed.push(id);
                        }
                        None => break,
                    }
                }
                let short = 4 - revealed.len() as u8;
                if short > 0 {
                    revealed.extend(self.reveal_from_deck(short));
                }
                if !revealed.is_empty() {
                    self.push_decision(PendingDecision {
                        player,
                        source,
                        kind: DecisionKind::ChooseCards {
                            pool: CardPool::Revealed(revealed.clone()),
                            filter: CardFilter::PlayableFree,
                            count: 1,
                            strict: false,
                        },
                        continuation: Continuation::CemeteryPlay { revealed },
                    });
                }
            }
            CardName::University => {
                // Sourced from the card itself so the occupied
                // University is never its own salvage target
                let university_id = self.card_owning_location(loc_id)?;
                self.push_decision(PendingDecision {
                    player,
                    source: EffectSource::Card(university_id),
                    kind: DecisionKind::ChooseCards {
                        pool: CardPool::OwnVillage,
                        filter: CardFilter::Any,
                        count: 1,
                        strict: true,
                    },
                    continuation: Continuation::Salvage {
                        refund_bonus_points: 1,
                        draw: 0,
                    },
                });
            }
            CardName::Chapel => {
                let chapel_id = self.card_owning_location(loc_id)?;
                self.card_mut(chapel_id)?.tokens += 1;
                let tokens = self.card(chapel_id)?.tokens;
                self.draw_to_hand(player, 2 * tokens);
            }
            CardName::Storehouse => {
                let store_id = self.card_owning_location(loc_id)?;
                let stash = self.card(store_id)?.stored;
                self.card_mut(store_id)?.stored = ResourceMap::new();
                self.player_mut(player).resources += stash;
                log_if_verbose!(self, "{player} collects {stash} from the storehouse");
            }
            other => {
                return Err(EverdellError::InvalidAction(format!(
                    "{other} owns no destination effect"
                )))
            }
        }
        Ok(())
    }

    // ---- continuation dispatch ----

    /// Resume the chain a popped decision belongs to with the chosen
    /// answer. Total over every continuation shape.
    pub(crate) fn resolve_decision(
        &mut self,
        decision: PendingDecision,
        action: &Action,
    ) -> Result<()> {
        let player = decision.player;
        if matches!(action, Action::Decline) {
            // Only the season-advance window carries mandatory followup
            if matches!(decision.continuation, Continuation::ClockTowerThenFinish) {
                return self.finish_season(player);
            }
            return Ok(());
        }

        match decision.continuation {
            Continuation::GainChosen => {
                let gained = expect_resources(action)?;
                self.player_mut(player).resources += gained;
            }
            Continuation::DrawChosenToHand => {
                let chosen = expect_cards(action)?;
                for &card_id in &chosen {
                    self.remove_from_meadow(card_id)?;
                    self.gain_card_to_hand(player, card_id)?;
                }
                self.refill_meadow();
            }
            Continuation::DiscardForResources {
                resources_per_card,
                cards_per_resource,
            } => {
                let chosen = expect_cards(action)?;
                for &card_id in &chosen {
                    self.remove_from_hand(player, card_id)?;
                    self.discard_card(card_id)?;
                }
                let gained =
                    (chosen.len() as u8 / cards_per_resource.max(1)) * resources_per_card;
                if gained > 0 {
                    self.push_decision(PendingDecision {
                        player,
                        source: decision.source,
                        kind: DecisionKind::ChooseResources {
                            max: gained,
                            strict: true,
                            from_owned: false,
                            allowed: ResourceFilter::Any,
                        },
                        continuation: Continuation::GainChosen,
                    });
                }
            }
            Continuation::CopyLocation => {
                let copied = expect_location(action)?;
                let effect = self.location(copied)?.effect;
                self.run_effect_descriptor(player, decision.source, effect)?;
            }
            Continuation::BardDiscard => {
                let chosen = expect_cards(action)?;
                for &card_id in &chosen {
                    self.remove_from_hand(player, card_id)?;
                    self.discard_card(card_id)?;
                }
                self.player_mut(player).point_tokens += chosen.len() as i32;
            }
            Continuation::PayForPoints => {
                let paid = expect_resources(action)?;
                if !self.player_mut(player).resources.pay(&paid) {
                    return Err(EverdellError::InvalidAction(format!(
                        "{player} cannot pay {paid}"
                    )));
                }
                self.player_mut(player).point_tokens += paid.total() as i32;
            }
            Continuation::MonkGive => {
                let given = expect_resources(action)?;
                let berries = given.get(Resource::Berry);
                if berries > 0 {
                    let eligible: SmallVec<[PlayerId; 3]> =
                        self.other_players(player).into_iter().collect();
                    self.push_decision(PendingDecision {
                        player,
                        source: decision.source,
                        kind: DecisionKind::ChoosePlayer { eligible },
                        continuation: Continuation::MonkDeliver { berries },
                    });
                }
            }
            Continuation::MonkDeliver { berries } => {
                let target = expect_player(action)?;
                if !self.player_mut(player).resources.sub(Resource::Berry, berries) {
                    return Err(EverdellError::InvalidAction(format!(
                        "{player} no longer holds {berries} berries"
                    )));
                }
                self.player_mut(target).resources.add(Resource::Berry, berries);
                self.player_mut(player).point_tokens += 2 * berries as i32;
            }
            Continuation::PeddlerPay => {
                let paid = expect_resources(action)?;
                if !paid.is_empty() {
                    self.push_decision(PendingDecision {
                        player,
                        source: decision.source,
                        kind: DecisionKind::ChooseResources {
                            max: paid.total() as u8,
                            strict: true,
                            from_owned: false,
                            allowed: ResourceFilter::Any,
                        },
                        continuation: Continuation::PeddlerGain { paid },
                    });
                }
            }
            Continuation::PeddlerGain { paid } => {
                // Both legs of the trade settle here, in one step
                let gained = expect_resources(action)?;
                if !self.player_mut(player).resources.pay(&paid) {
                    return Err(EverdellError::InvalidAction(format!(
                        "{player} no longer holds {paid}"
                    )));
                }
                self.player_mut(player).resources += gained;
            }
            Continuation::TeacherKeep { drawn } => {
                let chosen = expect_cards(action)?;
                for &card_id in &chosen {
                    self.remove_from_revealed(card_id)?;
                    self.gain_card_to_hand(player, card_id)?;
                }
                let leftover = drawn.iter().copied().find(|id| !chosen.contains(id));
                if let Some(give) = leftover {
                    let eligible: SmallVec<[PlayerId; 3]> =
                        self.other_players(player).into_iter().collect();
                    self.push_decision(PendingDecision {
                        player,
                        source: decision.source,
                        kind: DecisionKind::ChoosePlayer { eligible },
                        continuation: Continuation::TeacherGive { card: give },
                    });
                }
            }
            Continuation::TeacherGive { card } => {
                let target = expect_player(action)?;
                self.remove_from_revealed(card)?;
                self.gain_card_to_hand(target, card)?;
            }
            Continuation::FoolPlace { card } => {
                let target = expect_player(action)?;
                self.remove_from_revealed(card)?;
                self.place_card_in_village(target, card)?;
                self.logger.log_normal(&format!(
                    "{player}'s fool wanders into {target}'s village"
                ));
            }
            Continuation::PostalPigeonPlay { revealed } => {
                let chosen = expect_cards(action)?;
                if let Some(&played) = chosen.first() {
                    self.remove_from_revealed(played)?;
                    self.card_mut(played)?.paid = true;
                    self.finish_card_play(player, played)?;
                }
                for &card_id in &revealed {
                    if chosen.contains(&card_id) {
                        continue;
                    }
                    self.remove_from_revealed(card_id)?;
                    self.discard_card(card_id)?;
                }
            }
            Continuation::ActivateProduction => {
                let chosen = expect_cards(action)?;
                if let Some(&card_id) = chosen.first() {
                    self.run_card_production(player, card_id)?;
                }
            }
            Continuation::RangerFrom => {
                let from = expect_location(action)?;
                let eligible: SmallVec<[LocationId; 8]> = self
                    .board
                    .iter()
                    .copied()
                    .filter(|&id| {
                        id != from
                            && self.worker_placement_legal(player, id)
                            && self
                                .location(id)
                                .map(|l| l.is_free_for(player))
                                .unwrap_or(false)
                    })
                    .collect();
                self.push_decision(PendingDecision {
                    player,
                    source: decision.source,
                    kind: DecisionKind::ChooseLocation {
                        eligible,
                        optional: false,
                    },
                    continuation: Continuation::RangerTo { from },
                });
            }
            Continuation::RangerTo { from } => {
                let to = expect_location(action)?;
                if !self.location_mut(from)?.remove_worker(player) {
                    return Err(EverdellError::InvalidAction(format!(
                        "{player} has no worker to move"
                    )));
                }
                self.location_mut(to)?.place_worker(player);
                self.run_location_effect(player, to)?;
            }
            Continuation::UndertakerDiscard => {
                let chosen = expect_cards(action)?;
                for &card_id in &chosen {
                    self.remove_from_meadow(card_id)?;
                    self.discard_card(card_id)?;
                }
                self.refill_meadow();
                self.push_decision(PendingDecision {
                    player,
                    source: decision.source,
                    kind: DecisionKind::ChooseCards {
                        pool: CardPool::Meadow,
                        filter: CardFilter::Any,
                        count: 1,
                        strict: true,
                    },
                    continuation: Continuation::UndertakerTake,
                });
            }
            Continuation::UndertakerTake => {
                let chosen = expect_cards(action)?;
                for &card_id in &chosen {
                    self.remove_from_meadow(card_id)?;
                    self.gain_card_to_hand(player, card_id)?;
                }
                self.refill_meadow();
            }
            Continuation::Salvage {
                refund_bonus_points,
                draw,
            } => {
                let chosen = expect_cards(action)?;
                if let Some(&card_id) = chosen.first() {
                    let refund = self.card(card_id)?.name.cost();
                    self.remove_from_village(player, card_id)?;
                    self.discard_card(card_id)?;
                    self.player_mut(player).resources += refund;
                    self.player_mut(player).point_tokens += refund_bonus_points as i32;
                    self.draw_to_hand(player, draw);
                    if refund_bonus_points > 0 {
                        self.push_decision(PendingDecision {
                            player,
                            source: decision.source,
                            kind: DecisionKind::ChooseResources {
                                max: 1,
                                strict: true,
                                from_owned: false,
                                allowed: ResourceFilter::Any,
                            },
                            continuation: Continuation::SalvageBonus,
                        });
                    }
                }
            }
            Continuation::SalvageBonus => {
                let gained = expect_resources(action)?;
                self.player_mut(player).resources += gained;
            }
            Continuation::StorehouseStash => {
                let stash = expect_resources(action)?;
                let card_id = source_card(decision.source)?;
                self.card_mut(card_id)?.stored += stash;
            }
            Continuation::DungeonImprison { card, from_meadow } => {
                let chosen = expect_cards(action)?;
                let prisoner = *chosen.first().ok_or_else(|| {
                    EverdellError::InvalidAction("the dungeon needs a prisoner".to_string())
                })?;
                self.remove_from_village(player, prisoner)?;
                let dungeon_id = source_card(decision.source)?;
                self.card_mut(dungeon_id)?.imprisoned.push(prisoner);

                let zone = if from_meadow {
                    CardZone::Meadow
                } else {
                    CardZone::Hand
                };
                self.remove_from_zone(player, card, zone)?;
                let name = self.card(card)?.name;
                self.pay_discounted(player, name, 3)?;
                self.card_mut(card)?.paid = true;
                self.finish_card_play(player, card)?;
            }
            Continuation::InnPlay { discount } => {
                let chosen = expect_cards(action)?;
                if let Some(&card_id) = chosen.first() {
                    self.remove_from_meadow(card_id)?;
                    self.refill_meadow();
                    let name = self.card(card_id)?.name;
                    self.pay_discounted(player, name, discount)?;
                    self.card_mut(card_id)?.paid = true;
                    self.finish_card_play(player, card_id)?;
                }
            }
            Continuation::PostOfficeTarget => {
                let target = expect_player(action)?;
                self.push_decision(PendingDecision {
                    player,
                    source: decision.source,
                    kind: DecisionKind::ChooseCards {
                        pool: CardPool::Hand,
                        filter: CardFilter::Any,
                        count: 2,
                        strict: true,
                    },
                    continuation: Continuation::PostOfficeGive { target },
                });
            }
            Continuation::PostOfficeGive { target } => {
                let chosen = expect_cards(action)?;
                for &card_id in &chosen {
                    self.remove_from_hand(player, card_id)?;
                    self.gain_card_to_hand(target, card_id)?;
                }
                self.push_decision(PendingDecision {
                    player,
                    source: decision.source,
                    kind: DecisionKind::ChooseCards {
                        pool: CardPool::Hand,
                        filter: CardFilter::Any,
                        count: self.params.hand_limit,
                        strict: false,
                    },
                    continuation: Continuation::PostOfficeDiscard,
                });
            }
            Continuation::PostOfficeDiscard => {
                let chosen = expect_cards(action)?;
                for &card_id in &chosen {
                    self.remove_from_hand(player, card_id)?;
                    self.discard_card(card_id)?;
                }
                let space =
                    (self.params.hand_limit as usize).saturating_sub(self.player(player).hand.len());
                self.draw_to_hand(player, space as u8);
            }
            Continuation::MonasteryGive => {
                let given = expect_resources(action)?;
                if !given.is_empty() {
                    let eligible: SmallVec<[PlayerId; 3]> =
                        self.other_players(player).into_iter().collect();
                    self.push_decision(PendingDecision {
                        player,
                        source: decision.source,
                        kind: DecisionKind::ChoosePlayer { eligible },
                        continuation: Continuation::MonasteryDeliver { given },
                    });
                }
            }
            Continuation::MonasteryDeliver { given } => {
                let target = expect_player(action)?;
                if !self.player_mut(player).resources.pay(&given) {
                    return Err(EverdellError::InvalidAction(format!(
                        "{player} no longer holds {given}"
                    )));
                }
                self.player_mut(target).resources += given;
                // The full tithe of two earns the points
                if given.total() == 2 {
                    self.player_mut(player).point_tokens += 4;
                }
            }
            Continuation::CemeteryPlay { revealed } => {
                let chosen = expect_cards(action)?;
                if let Some(&played) = chosen.first() {
                    self.remove_from_revealed(played)?;
                    self.card_mut(played)?.paid = true;
                    self.finish_card_play(player, played)?;
                }
                for &card_id in &revealed {
                    if chosen.contains(&card_id) {
                        continue;
                    }
                    self.remove_from_revealed(card_id)?;
                    self.discard_card(card_id)?;
                }
            }
            Continuation::QueenPlay => {
                let chosen = expect_cards(action)?;
                if let Some(&card_id) = chosen.first() {
                    if self.player(player).hand.contains(&card_id) {
                        self.remove_from_hand(player, card_id)?;
                    } else {
                        self.remove_from_meadow(card_id)?;
                        self.refill_meadow();
                    }
                    self.card_mut(card_id)?.paid = true;
                    self.finish_card_play(player, card_id)?;
                }
            }
            Continuation::JourneyDiscard { points } => {
                let chosen = expect_cards(action)?;
                for &card_id in &chosen {
                    self.remove_from_hand(player, card_id)?;
                    self.discard_card(card_id)?;
                }
                self.player_mut(player).point_tokens += points as i32;
                self.logger
                    .log_normal(&format!("{player} completes a {points}-point journey"));
            }
            Continuation::ClockTowerThenFinish => {
                let activated = expect_location(action)?;
                let tower_id = source_card(decision.source)?;
                let tower = self.card_mut(tower_id)?;
                tower.tokens = tower.tokens.saturating_sub(1);
                self.run_location_effect(player, activated)?;
                self.finish_season(player)?;
            }
        }
        Ok(())
    }

    // ---- candidate pools ----

    /// Resolve a card pool and filter to a concrete candidate list, in
    /// deterministic container order
    pub(crate) fn resolve_card_pool(
        &self,
        player: PlayerId,
        source: EffectSource,
        pool: &CardPool,
        filter: CardFilter,
    ) -> Vec<CardId> {
        let mut candidates: Vec<CardId> = match pool {
            CardPool::Hand => self.player(player).hand.clone(),
            CardPool::Meadow => self.meadow.clone(),
            CardPool::Revealed(ids) => ids
                .iter()
                .copied()
                .filter(|id| self.revealed.contains(id))
                .collect(),
            CardPool::OwnVillage => self.player(player).village.clone(),
            CardPool::OtherVillages => self
                .other_players(player)
                .into_iter()
                .flat_map(|p| self.player(p).village.clone())
                .collect(),
            CardPool::HandAndMeadow => {
                let mut out = self.player(player).hand.clone();
                out.extend_from_slice(&self.meadow);
                out
            }
            CardPool::MeadowPlayable { discount } => {
                let pool = self.player(player).resources;
                self.meadow
                    .iter()
                    .copied()
                    .filter(|&id| {
                        self.card(id)
                            .map(|c| {
                                pool.covers(&c.name.cost().discounted_toward(&pool, *discount))
                                    && self.free_play_legal(player, c.name)
                            })
                            .unwrap_or(false)
                    })
                    .collect()
            }
        };
        candidates.retain(|&id| self.card_passes_filter(player, id, filter, source));
        candidates
    }

    fn card_passes_filter(
        &self,
        player: PlayerId,
        card_id: CardId,
        filter: CardFilter,
        source: EffectSource,
    ) -> bool {
        let Ok(card) = self.card(card_id) else {
            return false;
        };
        if let EffectSource::Card(src) = source {
            if src == card_id {
                return false;
            }
        }
        match filter {
            CardFilter::Any => true,
            CardFilter::Kind(kind) => card.kind() == kind,
            // Copier identities are excluded so activation chains stay finite
            CardFilter::ActivatableProduction => {
                card.color() == CardColor::Production
                    && !matches!(card.name, CardName::ChipSweep | CardName::MinerMole)
            }
            CardFilter::UnimprisonedCritters => card.is_critter(),
            CardFilter::MaxPoints(limit) => card.name.base_points() <= limit,
            CardFilter::PlayableFree => self.free_play_legal(player, card.name),
            CardFilter::PlayableFreeMaxPoints(limit) => {
                card.name.base_points() <= limit && self.free_play_legal(player, card.name)
            }
        }
    }

    /// Space and uniqueness for a zero-cost play
    fn free_play_legal(&self, player: PlayerId, name: CardName) -> bool {
        if name == CardName::Fool {
            return self.fool_target_exists(player);
        }
        !self.unique_blocked(player, name) && self.fits_in_village(player, name)
    }

    // ---- small helpers ----

    fn locations_of(&self, pred: impl Fn(LocationKind) -> bool) -> SmallVec<[LocationId; 8]> {
        self.board
            .iter()
            .copied()
            .filter(|&id| self.location(id).map(|l| pred(l.kind)).unwrap_or(false))
            .collect()
    }

    /// Draw `n` cards face up into the transient reveal buffer
    fn reveal_from_deck(&mut self, n: u8) -> SmallVec<[CardId; 4]> {
        let mut out: SmallVec<[CardId; 4]> = SmallVec::new();
        for _ in 0..n {
            match self.draw_from_deck() {
                Some(id) => {
                    self.revealed.push(id);
                    out.push(id);
                }
                None => break,
            }
        }
        out
    }

    /// The village card whose companion location this is
    fn card_owning_location(&self, loc_id: LocationId) -> Result<CardId> {
        let owner = self
            .location(loc_id)?
            .owner
            .ok_or_else(|| EverdellError::ComponentNotFound(loc_id.as_u32()))?;
        self.player(owner)
            .village
            .iter()
            .copied()
            .find(|&id| {
                self.card(id)
                    .map(|c| c.destination == Some(loc_id))
                    .unwrap_or(false)
            })
            .ok_or(EverdellError::ComponentNotFound(loc_id.as_u32()))
    }

    fn source_location(&self, source: EffectSource) -> Result<LocationId> {
        match source {
            EffectSource::Location(id) => Ok(id),
            _ => Err(EverdellError::InvalidAction(
                "effect source is not a location".to_string(),
            )),
        }
    }

    pub(crate) fn remove_from_hand(&mut self, player: PlayerId, card_id: CardId) -> Result<()> {
        let hand = &mut self.player_mut(player).hand;
        let pos = hand.iter().position(|&id| id == card_id).ok_or_else(|| {
            EverdellError::InvalidAction(format!("card {card_id} is not in {player}'s hand"))
        })?;
        hand.remove(pos);
        Ok(())
    }

    pub(crate) fn remove_from_meadow(&mut self, card_id: CardId) -> Result<()> {
        let pos = self
            .meadow
            .iter()
            .position(|&id| id == card_id)
            .ok_or_else(|| {
                EverdellError::InvalidAction(format!("card {card_id} is not in the meadow"))
            })?;
        self.meadow.remove(pos);
        Ok(())
    }

    fn remove_from_revealed(&mut self, card_id: CardId) -> Result<()> {
        let pos = self
            .revealed
            .iter()
            .position(|&id| id == card_id)
            .ok_or_else(|| {
                EverdellError::InvalidAction(format!("card {card_id} is not revealed"))
            })?;
        self.revealed.remove(pos);
        Ok(())
    }

    /// Add a card to a hand, or to the discard pile when the hand is full
    pub(crate) fn gain_card_to_hand(&mut self, player: PlayerId, card_id: CardId) -> Result<()> {
        if self.player(player).hand.len() < self.params.hand_limit as usize {
            self.player_mut(player).hand.push(card_id);
            Ok(())
        } else {
            self.discard_card(card_id)
        }
    }

    pub(crate) fn count_named(&self, player: PlayerId, name: CardName) -> usize {
        self.player(player)
            .village
            .iter()
            .filter(|&&id| self.card(id).map(|c| c.name == name).unwrap_or(false))
            .count()
    }
}

fn expect_resources(action: &Action) -> Result<ResourceMap> {
    match action {
        Action::ChooseResources(map) => Ok(*map),
        other => Err(EverdellError::InvalidAction(format!(
            "expected a resource choice, got {other:?}"
        ))),
    }
}

fn expect_cards(action: &Action) -> Result<SmallVec<[CardId; 4]>> {
    match action {
        Action::ChooseCards(cards) => Ok(cards.clone()),
        other => Err(EverdellError::InvalidAction(format!(
            "expected a card choice, got {other:?}"
        ))),
    }
}

fn expect_player(action: &Action) -> Result<PlayerId> {
    match action {
        Action::ChoosePlayer(player) => Ok(*player),
        other => Err(EverdellError::InvalidAction(format!(
            "expected a player choice, got {other:?}"
        ))),
    }
}

fn expect_location(action: &Action) -> Result<LocationId> {
    match action {
        Action::ChooseLocation(location) => Ok(*location),
        other => Err(EverdellError::InvalidAction(format!(
            "expected a location choice, got {other:?}"
        ))),
    }
}

fn source_card(source: EffectSource) -> Result<CardId> {
    match source {
        EffectSource::Card(id) => Ok(id),
        _ => Err(EverdellError::InvalidAction(
            "effect source is not a card".to_string(),
        )),
    }
}
