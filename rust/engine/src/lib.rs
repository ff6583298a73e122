//! # baccarat-engine: Punto Banco Resolution Core
//!
//! Deals baccarat rounds from a ChaCha20-shuffled shoe, applies the
//! third-card tableau and prices winning stakes. The crate is synchronous and
//! performs no I/O; scheduling and settlement live in `baccarat-rooms`.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and point values
//! - [`deck`] - Shoe with automatic replacement below ten cards
//! - [`hand`] - Player and Banker hands and their mod-10 totals
//! - [`rules`] - Third-card tableau, outcomes and the payout table
//! - [`engine`] - Round dealing and [`engine::RoundResult`]
//! - [`errors`] - Engine invariant violations
//!
//! ## Quick Start
//!
//! ```rust
//! use baccarat_engine::engine::Engine;
//! use baccarat_engine::rules::{payout, BetChoice};
//!
//! let mut engine = Engine::new(Some(42));
//! let result = engine.play_round().expect("round resolves");
//! let returned = payout(1000, BetChoice::Banker, result.outcome);
//! assert!(returned == 0 || returned == 1950);
//! ```
//!
//! ## Reproducible Shoes
//!
//! Production engines key the shoe from OS entropy with `Engine::new(None)`.
//! A seed gives an identical sequence of rounds:
//!
//! ```rust
//! use baccarat_engine::engine::Engine;
//!
//! let mut a = Engine::new(Some(7));
//! let mut b = Engine::new(Some(7));
//! assert_eq!(a.play_round().unwrap(), b.play_round().unwrap());
//! ```

pub mod cards;
pub mod deck;
pub mod engine;
pub mod errors;
pub mod hand;
pub mod rules;
