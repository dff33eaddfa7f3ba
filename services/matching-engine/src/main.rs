//! matching-node
//!
//! Runs every configured market and feeds it newline-delimited JSON intents
//! from stdin. Settlement and book events are written to stdout as JSON
//! lines; logs go to stderr.

use anyhow::Context;
use matching_engine::{BookEvent, ChannelSettlement, EngineConfig, Exchange, SettlementEvent};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use types::ids::MarketId;
use types::order::{Order, OrderAction};

#[derive(Debug, Deserialize)]
struct IntentLine {
    market: MarketId,
    action: OrderAction,
    order: Order,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Output {
    Settlement(SettlementEvent),
    Book(BookEvent),
}

/// Decode one intent line, rejecting orders no book should see
fn parse_intent(line: &str) -> anyhow::Result<IntentLine> {
    let intent: IntentLine = serde_json::from_str(line).context("malformed intent")?;
    anyhow::ensure!(
        intent.order.is_well_formed(),
        "order {} has a price/type mismatch or an off-side quantity",
        intent.order.id
    );
    Ok(intent)
}

fn load_config() -> anyhow::Result<EngineConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ENGINE_CONFIG").ok());
    match path {
        Some(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path)),
        None => {
            tracing::warn!("no config given, running with defaults and no markets");
            Ok(EngineConfig::default())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;
    tracing::info!(markets = config.markets.len(), "Starting matching node");

    let (output_tx, mut output_rx) = mpsc::unbounded_channel::<Output>();
    let (settlement_tx, mut settlement_rx) = mpsc::unbounded_channel();
    let (book_tx, mut book_rx) = mpsc::unbounded_channel();

    let mut exchange = Exchange::new(config).with_book_events(book_tx);
    exchange.open_configured(|market| {
        ChannelSettlement::with_sender(market.clone(), settlement_tx.clone())
    })?;
    drop(settlement_tx);

    let settlement_out = output_tx.clone();
    let settlement_forward = tokio::spawn(async move {
        while let Some(event) = settlement_rx.recv().await {
            let _ = settlement_out.send(Output::Settlement(event));
        }
    });
    let book_out = output_tx;
    let book_forward = tokio::spawn(async move {
        while let Some(event) = book_rx.recv().await {
            let _ = book_out.send(Output::Book(event));
        }
    });
    let printer = tokio::spawn(async move {
        while let Some(output) = output_rx.recv().await {
            match serde_json::to_string(&output) {
                Ok(line) => println!("{}", line),
                Err(err) => tracing::error!(%err, "failed to encode event"),
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut submitted: u64 = 0;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let intent = match parse_intent(&line) {
            Ok(intent) => intent,
            Err(err) => {
                tracing::warn!(err = %format!("{:#}", err), "skipping intent");
                continue;
            }
        };
        match exchange.submit(&intent.market, intent.order, intent.action).await {
            Ok(()) => submitted += 1,
            Err(err) => tracing::warn!(%err, "intent rejected"),
        }
    }

    tracing::info!(submitted, "Input exhausted, shutting down");
    for book in exchange.shutdown().await {
        tracing::info!(
            market = %book.market(),
            asks = book.asks().order_count(),
            bids = book.bids().order_count(),
            "final book"
        );
    }

    settlement_forward.await?;
    book_forward.await?;
    printer.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(side: &str, amount: &str, funds: &str) -> String {
        format!(
            r#"{{"market":"XIN/USDT","action":"CREATE","order":{{
            "id":"01890a5d-ac96-774b-bcce-b302099a8057","user_id":"u","side":"{}",
            "order_type":"LIMIT","price":"100","remaining_amount":"{}","filled_amount":"0",
            "remaining_funds":"{}","filled_funds":"0","filled_price":"0",
            "created_at":"2024-01-01T00:00:00Z"}}}}"#,
            side, amount, funds
        )
    }

    #[test]
    fn test_parse_intent_accepts_ask() {
        let intent = parse_intent(&line("ASK", "5", "0")).unwrap();
        assert_eq!(intent.market, MarketId::new("XIN/USDT"));
        assert_eq!(intent.action, OrderAction::Create);
        assert_eq!(intent.order.remaining_amount.to_string(), "5");
    }

    #[test]
    fn test_parse_intent_rejects_negative_amount() {
        assert!(parse_intent(&line("ASK", "-5", "0")).is_err());
        assert!(parse_intent(&line("BID", "0", "-1000")).is_err());
    }

    #[test]
    fn test_parse_intent_rejects_off_side_quantity() {
        assert!(parse_intent(&line("ASK", "5", "1000")).is_err());
        assert!(parse_intent(&line("BID", "5", "1000")).is_err());
        assert!(parse_intent(&line("BID", "0", "1000")).is_ok());
    }
}
