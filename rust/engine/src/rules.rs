use serde::{Deserialize, Serialize};
use std::fmt;

/// Pre-draw totals at or above this end the round with no third cards.
pub const NATURAL_TOTAL: u8 = 8;

/// Result of comparing the final Player and Banker totals.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    PlayerWin,
    BankerWin,
    Tie,
}

impl Outcome {
    pub fn from_totals(player_total: u8, banker_total: u8) -> Self {
        match player_total.cmp(&banker_total) {
            std::cmp::Ordering::Greater => Outcome::PlayerWin,
            std::cmp::Ordering::Less => Outcome::BankerWin,
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::PlayerWin => f.write_str("Player"),
            Outcome::BankerWin => f.write_str("Banker"),
            Outcome::Tie => f.write_str("Tie"),
        }
    }
}

/// The outcome a participant stakes on.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetChoice {
    Player,
    Banker,
    Tie,
}

impl BetChoice {
    pub fn all() -> [BetChoice; 3] {
        [BetChoice::Player, BetChoice::Banker, BetChoice::Tie]
    }

    pub fn wins_on(self, outcome: Outcome) -> bool {
        matches!(
            (self, outcome),
            (BetChoice::Player, Outcome::PlayerWin)
                | (BetChoice::Banker, Outcome::BankerWin)
                | (BetChoice::Tie, Outcome::Tie)
        )
    }
}

impl fmt::Display for BetChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetChoice::Player => f.write_str("Player"),
            BetChoice::Banker => f.write_str("Banker"),
            BetChoice::Tie => f.write_str("Tie"),
        }
    }
}

impl std::str::FromStr for BetChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "player" | "p" => Ok(BetChoice::Player),
            "banker" | "b" => Ok(BetChoice::Banker),
            "tie" | "t" => Ok(BetChoice::Tie),
            other => Err(format!("unknown bet choice: {other}")),
        }
    }
}

/// Player stands on 6 and 7 and draws on 0 through 5.
pub fn player_draws(player_total: u8) -> bool {
    player_total <= 5
}

/// Banker third-card decision.
///
/// `player_third` is the value of the Player's third card, or `None` when the
/// Player stood. When the Player stood, Banker totals 3 through 6 stand; only
/// 0, 1 and 2 draw.
///
/// # Examples
///
/// ```
/// use baccarat_engine::rules::banker_draws;
///
/// assert!(banker_draws(3, Some(7)));
/// assert!(!banker_draws(3, Some(8)));
/// assert!(banker_draws(6, Some(6)));
/// assert!(!banker_draws(5, None));
/// assert!(banker_draws(2, None));
/// ```
pub fn banker_draws(banker_total: u8, player_third: Option<u8>) -> bool {
    match (banker_total, player_third) {
        (0..=2, _) => true,
        (_, None) => false,
        (3, Some(v)) => v != 8,
        (4, Some(v)) => (2..=7).contains(&v),
        (5, Some(v)) => (4..=7).contains(&v),
        (6, Some(v)) => (6..=7).contains(&v),
        _ => false,
    }
}

/// Gross amount returned for a winning stake, computed in integer arithmetic.
///
/// Player pays 2x, Banker pays 1.95x truncated toward zero, Tie pays 8x.
/// A losing choice returns 0.
///
/// # Examples
///
/// ```
/// use baccarat_engine::rules::{payout, BetChoice, Outcome};
///
/// assert_eq!(payout(1000, BetChoice::Banker, Outcome::BankerWin), 1950);
/// assert_eq!(payout(1000, BetChoice::Player, Outcome::BankerWin), 0);
/// assert_eq!(payout(101, BetChoice::Banker, Outcome::BankerWin), 196);
/// ```
pub fn payout(stake: u64, choice: BetChoice, outcome: Outcome) -> u64 {
    if !choice.wins_on(outcome) {
        return 0;
    }
    match choice {
        BetChoice::Player => stake.saturating_mul(2),
        BetChoice::Banker => stake.saturating_mul(195) / 100,
        BetChoice::Tie => stake.saturating_mul(8),
    }
}
