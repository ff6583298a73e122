//! Room-facing text: bet summaries, countdowns and round results.

use baccarat_engine::engine::RoundResult;
use baccarat_engine::rules::BetChoice;

use crate::notifier::CancelReason;
use crate::session::Wager;

pub const NO_BETS_YET: &str = "No bets yet.";
pub const ROUND_CANCELLED: &str = "❌ No bets were placed, the round was cancelled.";
pub const ROUND_ABORTED: &str =
    "⚠️ The deal could not be completed. The round was cancelled and no bets were settled.";

pub fn cancellation(reason: CancelReason) -> &'static str {
    match reason {
        CancelReason::NoWagers => ROUND_CANCELLED,
        CancelReason::DealFailed => ROUND_ABORTED,
    }
}

/// `1234567` → `1,234,567`
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn choice_emoji(choice: BetChoice) -> &'static str {
    match choice {
        BetChoice::Player => "👤",
        BetChoice::Banker => "🏦",
        BetChoice::Tie => "🤝",
    }
}

pub fn bet_summary(wagers: &[Wager], totals: &[(BetChoice, u64)]) -> String {
    if wagers.is_empty() {
        return NO_BETS_YET.to_string();
    }

    let mut out = wagers
        .iter()
        .map(|w| {
            format!(
                "👤 {}: {} {}",
                w.display_name,
                w.choice,
                format_amount(w.amount)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let totals: Vec<String> = totals
        .iter()
        .filter(|(_, total)| *total > 0)
        .map(|(choice, total)| {
            format!(
                "{} {}: {}",
                choice_emoji(*choice),
                choice,
                format_amount(*total)
            )
        })
        .collect();
    if !totals.is_empty() {
        out.push_str("\n\n📊 Total bets:\n");
        out.push_str(&totals.join("\n"));
    }
    out
}

pub fn round_opened(remaining: u64, summary: &str) -> String {
    format!(
        "⏰ A new round is open!\n\n🎯 Betting time: {remaining}s\n💰 Current bets:\n{summary}"
    )
}

pub fn countdown(remaining: u64, summary: &str) -> String {
    format!("⏰ {remaining}s remaining\n💰 Current bets:\n{summary}")
}

/// Result line for one settled wager; `payout` is the gross amount returned.
pub fn settlement_line(wager: &Wager, payout: u64) -> String {
    if payout > 0 {
        let profit = payout.saturating_sub(wager.amount);
        format!(
            "✅ {}: {} {} → +{}",
            wager.display_name,
            wager.choice,
            format_amount(wager.amount),
            format_amount(profit)
        )
    } else {
        format!(
            "❌ {}: {} {} → -{}",
            wager.display_name,
            wager.choice,
            format_amount(wager.amount),
            format_amount(wager.amount)
        )
    }
}

pub fn round_result(result: &RoundResult, lines: &[String]) -> String {
    format!(
        "🎲 Round result:\n\n👤 Player: {} (total {})\n🏦 Banker: {} (total {})\n\n🏆 Winner: {}\n\n💰 Bets:\n{}",
        result.player,
        result.player_total,
        result.banker,
        result.banker_total,
        result.outcome,
        lines.join("\n")
    )
}
