use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};

/// Below this many undealt cards the deck is replaced before the next draw.
pub const RESHUFFLE_THRESHOLD: usize = 10;

pub const DECK_SIZE: usize = 52;

#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
    position: usize,
    rng: ChaCha20Rng,
    reshuffles: u64,
}

impl Deck {
    /// Shuffled deck keyed from operating system entropy.
    pub fn new() -> Self {
        let rng = ChaCha20Rng::from_rng(&mut rand::rng());
        Self::with_rng(rng)
    }

    /// Shuffled deck with a reproducible order. Intended for tests and
    /// simulations; production rounds use [`Deck::new`].
    pub fn new_with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha20Rng::seed_from_u64(seed))
    }

    /// Full deck whose first draws are `top`, in order, followed by the
    /// remaining cards shuffled with `seed`.
    pub fn stacked(seed: u64, top: &[Card]) -> Self {
        let mut deck = Self::new_with_seed(seed);
        for (slot, card) in top.iter().enumerate() {
            if let Some(idx) = deck.cards[slot..].iter().position(|c| c == card) {
                deck.cards.swap(slot, slot + idx);
            }
        }
        deck
    }

    fn with_rng(rng: ChaCha20Rng) -> Self {
        let mut deck = Self {
            cards: full_deck(),
            position: 0,
            rng,
            reshuffles: 0,
        };
        deck.shuffle();
        deck
    }

    pub fn shuffle(&mut self) {
        self.cards = full_deck();
        self.cards.shuffle(&mut self.rng);
        self.position = 0;
    }

    /// Removes the top card, replacing the whole deck first when fewer than
    /// [`RESHUFFLE_THRESHOLD`] cards remain.
    pub fn draw(&mut self) -> Card {
        if self.remaining() < RESHUFFLE_THRESHOLD {
            self.shuffle();
            self.reshuffles += 1;
        }
        let c = self.cards[self.position];
        self.position += 1;
        c
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }

    /// Number of times the deck has been replaced by a fresh one.
    pub fn reshuffles(&self) -> u64 {
        self.reshuffles
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}
