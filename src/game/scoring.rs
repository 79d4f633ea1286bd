//! End-of-game scoring
//!
//! Scores are computed exactly once, when the last player takes the
//! end-of-game marker. Nothing here mutates state; the breakdown is kept
//! per named source category so drivers can report more than a total.

use crate::core::{CardColor, CardKind, CardName, PlayerId, Resource};
use crate::game::state::GameState;
use crate::Result;
use serde::{Deserialize, Serialize};

/// One player's final score, split by source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player: PlayerId,
    /// Printed values and on-card point tokens of village cards
    pub card_points: i32,
    /// Point tokens gathered during play (journeys, effects)
    pub point_tokens: i32,
    /// Purple end-of-game bonuses
    pub prosperity: i32,
    /// Achieved basic events
    pub events: i32,
    pub total: i32,
}

impl PlayerScore {
    /// Named breakdown for reporting
    pub fn breakdown(&self) -> [(&'static str, i32); 4] {
        [
            ("cards", self.card_points),
            ("tokens", self.point_tokens),
            ("prosperity", self.prosperity),
            ("events", self.events),
        ]
    }
}

const EVENT_POINTS: i32 = 3;

impl GameState {
    /// Score every player. Imprisoned cards are not in any village and do
    /// not score.
    pub fn compute_final_scores(&self) -> Result<Vec<PlayerScore>> {
        self.players
            .iter()
            .map(|p| self.score_player(p.id))
            .collect()
    }

    fn score_player(&self, player: PlayerId) -> Result<PlayerScore> {
        let mut card_points = 0i32;
        let mut prosperity = 0i32;
        for &card_id in &self.player(player).village {
            let card = self.card(card_id)?;
            card_points += card.points as i32 + card.tokens as i32;
            let paired = card.partner.is_some();
            prosperity += self.prosperity_bonus(player, card.name, paired)?;
        }
        let point_tokens = self.player(player).point_tokens;
        let events = EVENT_POINTS * self.player(player).events_achieved as i32;
        let total = card_points + point_tokens + prosperity + events;
        Ok(PlayerScore {
            player,
            card_points,
            point_tokens,
            prosperity,
            events,
            total,
        })
    }

    fn prosperity_bonus(&self, player: PlayerId, name: CardName, paired: bool) -> Result<i32> {
        let bonus = match name {
            CardName::Castle => self.count_village(player, |c: &VillageCard| {
                c.kind == CardKind::Construction && !c.unique
            })?,
            CardName::Palace => self.count_village(player, |c| {
                c.kind == CardKind::Construction && c.unique
            })?,
            CardName::School => {
                self.count_village(player, |c| c.kind == CardKind::Critter && !c.unique)?
            }
            CardName::Theatre => {
                self.count_village(player, |c| c.kind == CardKind::Critter && c.unique)?
            }
            CardName::Evertree => {
                self.count_village(player, |c| c.color == CardColor::Prosperity)?
            }
            CardName::King => self.player(player).events_achieved as i32,
            CardName::Architect => {
                let pool = self.player(player).resources;
                (pool.get(Resource::Resin) as i32 + pool.get(Resource::Pebble) as i32).min(6)
            }
            CardName::Wife => {
                if paired {
                    3
                } else {
                    0
                }
            }
            _ => 0,
        };
        Ok(bonus)
    }

    fn count_village(
        &self,
        player: PlayerId,
        pred: impl Fn(&VillageCard) -> bool,
    ) -> Result<i32> {
        let mut count = 0;
        for &card_id in &self.player(player).village {
            let card = self.card(card_id)?;
            let summary = VillageCard {
                kind: card.kind(),
                color: card.color(),
                unique: card.is_unique(),
            };
            if pred(&summary) {
                count += 1;
            }
        }
        Ok(count)
    }
}

struct VillageCard {
    kind: CardKind,
    color: CardColor,
    unique: bool,
}
