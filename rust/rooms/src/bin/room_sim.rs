//! Single-room round simulation
//!
//! Usage: cargo run -p baccarat_rooms --bin baccarat-room-sim -- [--room ID] [--json]
//!
//! Configuration comes from `BACCARAT_CONFIG` and the `BACCARAT_*`
//! environment overrides.

use baccarat_engine::rules::BetChoice;
use baccarat_rooms::{config, ChannelNotifier, MemoryLedger, RoomEvent, RoundScheduler};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

const STARTING_BALANCE: u64 = 10_000;

struct ScriptedWager {
    delay_secs: u64,
    participant: &'static str,
    name: &'static str,
    choice: BetChoice,
    amount: u64,
}

const SCRIPT: &[ScriptedWager] = &[
    ScriptedWager {
        delay_secs: 0,
        participant: "1001",
        name: "Alice",
        choice: BetChoice::Banker,
        amount: 1000,
    },
    ScriptedWager {
        delay_secs: 2,
        participant: "1002",
        name: "Bob",
        choice: BetChoice::Tie,
        amount: 500,
    },
    ScriptedWager {
        delay_secs: 1,
        participant: "1001",
        name: "Alice",
        choice: BetChoice::Player,
        amount: 1500,
    },
];

/// Play one scripted round in a single room
#[derive(Parser, Debug)]
#[command(name = "baccarat-room-sim", version)]
struct Args {
    /// Room to play in
    #[arg(short, long, default_value = "sim-room")]
    room: String,
    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Args { room, json } = Args::parse();

    baccarat_rooms::init_logging(json)?;

    let resolved = config::load_with_sources()?;
    tracing::info!(
        window_seconds = resolved.config.window_length_seconds,
        window_source = ?resolved.sources.window_length_seconds,
        min_wager = resolved.config.min_wager,
        max_wager = resolved.config.max_wager,
        "configuration loaded"
    );

    let ledger = Arc::new(MemoryLedger::new());
    for wager in SCRIPT {
        ledger.open_account(wager.participant, STARTING_BALANCE);
    }
    let notifier = ChannelNotifier::new();
    let mut subscription = notifier.subscribe(room.clone());

    let scheduler =
        RoundScheduler::with_engine(resolved.config, ledger.clone(), Arc::new(notifier.clone()))?;

    let bettor = scheduler.clone();
    let bet_room = room.clone();
    tokio::spawn(async move {
        for wager in SCRIPT {
            tokio::time::sleep(Duration::from_secs(wager.delay_secs)).await;
            match bettor
                .place_wager(
                    &bet_room,
                    wager.participant,
                    wager.name,
                    wager.choice,
                    wager.amount,
                )
                .await
            {
                Ok(receipt) => println!(
                    "{} -> {:?} ({}s left)",
                    wager.name, receipt.status, receipt.remaining_seconds
                ),
                Err(err) => println!("{} -> refused: {err}", wager.name),
            }
        }
    });

    loop {
        tokio::select! {
            event = subscription.receiver.recv() => {
                let Some(event) = event else { break };
                println!("{}\n", event.text());
                let closed = matches!(
                    event,
                    RoomEvent::RoundResult { .. } | RoomEvent::RoundCancelled { .. }
                );
                if closed {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let stopped = scheduler.shutdown();
                tracing::warn!(stopped, "interrupted, open rounds discarded");
                break;
            }
        }
    }

    for record in ledger.records() {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}
