use serde::{Deserialize, Serialize};

use crate::deck::Deck;
use crate::errors::EngineError;
use crate::hand::{Hand, Side};
use crate::rules::{banker_draws, player_draws, Outcome, NATURAL_TOTAL};

/// Final hands and outcome of one dealt round.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub player: Hand,
    pub banker: Hand,
    pub player_total: u8,
    pub banker_total: u8,
    pub outcome: Outcome,
}

impl RoundResult {
    /// Either side reached 8 or 9 on the first two cards.
    pub fn is_natural(&self) -> bool {
        self.player.is_natural() || self.banker.is_natural()
    }
}

/// Resolution engine that deals baccarat rounds from an owned shoe.
///
/// # Examples
///
/// ```
/// use baccarat_engine::engine::Engine;
///
/// let mut engine = Engine::new(Some(12345));
/// let result = engine.play_round().expect("round resolves");
/// assert!(result.player_total <= 9 && result.banker_total <= 9);
/// assert!((2..=3).contains(&result.player.cards().len()));
/// ```
#[derive(Debug)]
pub struct Engine {
    /// Shoe the rounds are dealt from
    deck: Deck,
    /// Rounds dealt so far
    rounds: u64,
}

impl Engine {
    /// `None` keys the deck from operating system entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let deck = match seed {
            Some(seed) => Deck::new_with_seed(seed),
            None => Deck::new(),
        };
        Self::with_deck(deck)
    }

    pub fn with_deck(deck: Deck) -> Self {
        Self { deck, rounds: 0 }
    }

    pub fn play_round(&mut self) -> Result<RoundResult, EngineError> {
        let mut player = Hand::new(Side::Player);
        let mut banker = Hand::new(Side::Banker);

        // initial deal alternates player, banker
        for _ in 0..2 {
            player.push(self.deck.draw())?;
            banker.push(self.deck.draw())?;
        }

        let mut player_total = player.total();
        let mut banker_total = banker.total();

        if player_total < NATURAL_TOTAL && banker_total < NATURAL_TOTAL {
            let mut player_third = None;
            if player_draws(player_total) {
                let card = self.deck.draw();
                player.push(card)?;
                player_third = Some(card.value());
                player_total = player.total();
            }

            if banker_draws(banker_total, player_third) {
                banker.push(self.deck.draw())?;
                banker_total = banker.total();
            }
        }

        for hand in [&player, &banker] {
            if hand.cards().len() < 2 {
                return Err(EngineError::IncompleteHand {
                    side: hand.side(),
                    held: hand.cards().len(),
                });
            }
        }

        self.rounds += 1;
        Ok(RoundResult {
            outcome: Outcome::from_totals(player_total, banker_total),
            player,
            banker,
            player_total,
            banker_total,
        })
    }

    pub fn rounds_played(&self) -> u64 {
        self.rounds
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(None)
    }
}
