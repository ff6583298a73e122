use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cards::{format_cards, Card};
use crate::errors::EngineError;

pub const MAX_HAND_CARDS: usize = 3;

/// The two hands dealt every round.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Banker,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => f.write_str("Player"),
            Side::Banker => f.write_str("Banker"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    side: Side,
    cards: Vec<Card>,
}

impl Hand {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            cards: Vec::with_capacity(MAX_HAND_CARDS),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn push(&mut self, card: Card) -> Result<(), EngineError> {
        if self.cards.len() >= MAX_HAND_CARDS {
            return Err(EngineError::HandFull {
                side: self.side,
                held: self.cards.len(),
            });
        }
        self.cards.push(card);
        Ok(())
    }

    /// Sum of card values mod 10, always taken over the whole hand.
    pub fn total(&self) -> u8 {
        hand_total(&self.cards)
    }

    /// Two-card 8 or 9.
    pub fn is_natural(&self) -> bool {
        self.cards.len() == 2 && self.total() >= 8
    }

    pub fn third_card(&self) -> Option<Card> {
        self.cards.get(2).copied()
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_cards(&self.cards))
    }
}

pub fn hand_total(cards: &[Card]) -> u8 {
    let sum: u32 = cards.iter().map(|c| u32::from(c.value())).sum();
    (sum % 10) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    fn card(rank: Rank) -> Card {
        Card::new(Suit::Diamonds, rank)
    }

    #[test]
    fn total_keeps_only_the_units_digit() {
        let mut hand = Hand::new(Side::Player);
        hand.push(card(Rank::Seven)).unwrap();
        hand.push(card(Rank::Six)).unwrap();
        assert_eq!(hand.total(), 3);
        hand.push(card(Rank::Nine)).unwrap();
        assert_eq!(hand.total(), 2);
    }

    #[test]
    fn fourth_card_is_rejected() {
        let mut hand = Hand::new(Side::Banker);
        for _ in 0..3 {
            hand.push(card(Rank::King)).unwrap();
        }
        let err = hand.push(card(Rank::Ace)).unwrap_err();
        assert_eq!(
            err,
            EngineError::HandFull {
                side: Side::Banker,
                held: 3
            }
        );
        assert_eq!(hand.cards().len(), 3);
    }

    #[test]
    fn natural_requires_exactly_two_cards() {
        let mut hand = Hand::new(Side::Player);
        hand.push(card(Rank::Four)).unwrap();
        hand.push(card(Rank::Four)).unwrap();
        assert!(hand.is_natural());
        hand.push(card(Rank::Ten)).unwrap();
        assert!(!hand.is_natural());
    }
}
