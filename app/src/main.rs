// In app/src/main.rs

use anyhow::{Context, Result};
use api_client::{ClobClient, LiveConnector};
use app_config::Settings;
use clap::{Parser, Subcommand};
use core_types::{simulate, BookSource, OrderTicket, Side, TokenId};
use events::WsMessage;
use execution::{ExecutionCoordinator, LivePriceGuard};
use risk::PreTradeValidator;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::prelude::*;
use web_server::{AppState, WsCache};

use self::tracing_layer::WsBroadcastLayer;
mod tracing_layer;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Market-order execution engine for prediction markets.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connects the database and serves the HTTP/WebSocket API.
    Serve,

    /// Prints the normalized order book for a token.
    Book {
        #[arg(short, long)]
        token_id: String,
    },

    /// Simulates a market order against the current book. Nothing is validated or settled.
    Quote {
        #[arg(short, long)]
        token_id: String,

        /// "buy" or "sell".
        #[arg(short, long)]
        side: Side,

        #[arg(long)]
        size: Decimal,
    },

    /// Runs a market order through validation and settlement.
    Execute {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        market_id: String,

        #[arg(short, long)]
        token_id: String,

        #[arg(long)]
        outcome: String,

        #[arg(short, long)]
        side: Side,

        #[arg(long)]
        size: Decimal,

        /// The price the order was quoted at, checked by the live guard.
        #[arg(long)]
        price: Option<Decimal>,

        /// Re-check the price against the live market channel before settling.
        #[arg(long)]
        live_guard: bool,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = app_config::load_settings().context("failed to load settings")?;

    // --- WebSocket and Tracing Setup ---
    let (ws_tx, _) = broadcast::channel::<WsMessage>(1024);
    let ws_cache = web_server::new_ws_cache();
    init_tracing(&settings, ws_tx.clone(), ws_cache.clone());

    tracing::info!(environment = %settings.app.environment, "Starting execution engine");

    match cli.command {
        Commands::Serve => serve(settings, ws_tx, ws_cache).await?,
        Commands::Book { token_id } => handle_book(&settings, token_id).await?,
        Commands::Quote {
            token_id,
            side,
            size,
        } => handle_quote(&settings, token_id, side, size).await?,
        Commands::Execute {
            user_id,
            market_id,
            token_id,
            outcome,
            side,
            size,
            price,
            live_guard,
        } => {
            let ticket = OrderTicket {
                user_id: Some(user_id),
                market_id: Some(market_id),
                token_id: Some(token_id),
                outcome: Some(outcome),
                side: Some(side),
                order_type: None,
                requested_size: Some(size),
                price,
            };
            handle_execute(&settings, ticket, live_guard, ws_tx).await?;
        }
    }

    Ok(())
}

fn init_tracing(settings: &Settings, ws_tx: broadcast::Sender<WsMessage>, ws_cache: WsCache) {
    let level = tracing::Level::from_str(&settings.app.log_level).unwrap_or(tracing::Level::INFO);
    let targets = tracing_subscriber::filter::Targets::new()
        .with_target("sqlx::query", tracing::Level::WARN) // Disable sqlx query debug logs
        .with_default(level);

    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(targets.clone());
    let ws_layer = WsBroadcastLayer::new(ws_tx, ws_cache).with_filter(targets);
    tracing_subscriber::registry().with(fmt_layer).with(ws_layer).init();
}

/// Builds the coordinator shared by `serve` and `execute`.
async fn build_coordinator(
    settings: &Settings,
    books: Arc<dyn BookSource>,
    live_guard: bool,
    ws_tx: broadcast::Sender<WsMessage>,
) -> Result<ExecutionCoordinator> {
    let db = Arc::new(database::connect(&settings.database).await?);
    tracing::info!("Database connection established and migrations are up-to-date.");

    let validator = PreTradeValidator::new(db.clone(), db.clone(), settings.execution.store_timeout());
    let mut coordinator =
        ExecutionCoordinator::new(Arc::new(validator), books, db).with_events(ws_tx);

    if live_guard {
        let live = LiveConnector::new(&settings.venue, settings.execution.live_guard_timeout());
        coordinator = coordinator.with_live_guard(LivePriceGuard::new(
            Arc::new(live),
            settings.execution.price_tolerance,
        ));
    }
    Ok(coordinator)
}

// --- "Serve" Subcommand Logic ---

async fn serve(
    settings: Settings,
    ws_tx: broadcast::Sender<WsMessage>,
    ws_cache: WsCache,
) -> Result<()> {
    let books: Arc<dyn BookSource> = Arc::new(api_client::new(&settings.venue)?);
    // The HTTP surface always runs with the live guard.
    let coordinator = build_coordinator(&settings, books.clone(), true, ws_tx.clone()).await?;

    let state = AppState {
        coordinator: Arc::new(coordinator),
        books,
        ws_tx,
        ws_cache,
    };
    web_server::run(&settings.server, state).await?;
    Ok(())
}

// --- "Book" Subcommand Logic ---

async fn handle_book(settings: &Settings, token_id: String) -> Result<()> {
    let client = ClobClient::new(&settings.venue)?;
    let book = client.get_order_book(&TokenId(token_id)).await?;

    let fmt_opt = |v: Option<Decimal>| v.map_or_else(|| "-".to_string(), |d| d.to_string());
    println!("Token:    {}", book.token_id);
    println!("Best bid: {}", fmt_opt(book.best_bid().map(|l| l.price)));
    println!("Best ask: {}", fmt_opt(book.best_ask().map(|l| l.price)));
    println!("Spread:   {}", fmt_opt(book.spread));
    println!("Mid:      {}", fmt_opt(book.mid));
    println!();
    println!("{:>12} {:>14}   {:>12} {:>14}", "BID", "SIZE", "ASK", "SIZE");
    let rows = book.bids.len().max(book.asks.len());
    for i in 0..rows {
        let bid = book.bids.get(i);
        let ask = book.asks.get(i);
        println!(
            "{:>12} {:>14}   {:>12} {:>14}",
            fmt_opt(bid.map(|l| l.price)),
            fmt_opt(bid.map(|l| l.size)),
            fmt_opt(ask.map(|l| l.price)),
            fmt_opt(ask.map(|l| l.size)),
        );
    }
    Ok(())
}

// --- "Quote" Subcommand Logic ---

async fn handle_quote(settings: &Settings, token_id: String, side: Side, size: Decimal) -> Result<()> {
    if size <= Decimal::ZERO {
        anyhow::bail!("size must be positive, got {size}");
    }
    let client = ClobClient::new(&settings.venue)?;
    let book = client.get_order_book(&TokenId(token_id)).await?;

    let fill = simulate(book.levels_for(side), size);
    if !fill.is_complete() {
        tracing::warn!(
            requested = %fill.requested_size,
            filled = %fill.filled_size,
            "Book cannot fill the full size; an execution would be rejected"
        );
    }
    println!("{}", serde_json::to_string_pretty(&fill)?);
    Ok(())
}

// --- "Execute" Subcommand Logic ---

async fn handle_execute(
    settings: &Settings,
    ticket: OrderTicket,
    live_guard: bool,
    ws_tx: broadcast::Sender<WsMessage>,
) -> Result<()> {
    let books: Arc<dyn BookSource> = Arc::new(ClobClient::new(&settings.venue)?);
    let coordinator = build_coordinator(settings, books, live_guard, ws_tx).await?;

    match coordinator.execute_ticket(ticket).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(err) => anyhow::bail!("{}: {}", err.code(), err),
    }
}
