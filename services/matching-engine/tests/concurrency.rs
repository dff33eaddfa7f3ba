//! Concurrency test
//!
//! Independent markets run on separate actors with no shared state; each
//! market's intents are applied strictly in submission order.

use chrono::Utc;
use matching_engine::{
    spawn_book, ActorOptions, Book, ChannelSettlement, EngineConfig, Exchange, MarketConfig,
    Settlement, SettlementEvent,
};
use std::collections::HashMap;
use tokio::sync::mpsc;
use types::errors::EngineError;
use types::ids::{MarketId, OrderId, TradeId};
use types::numeric::{Precision, Price, Quantity};
use types::order::{Order, OrderAction, OrderType};

fn ask(price: u64, amount: u64) -> Order {
    Order::ask(
        OrderId::new(),
        "seller",
        OrderType::Limit,
        Price::from_u64(price),
        Quantity::from_u64(amount),
        Utc::now(),
    )
}

fn bid(price: u64, funds: u64) -> Order {
    Order::bid(
        OrderId::new(),
        "buyer",
        OrderType::Limit,
        Price::from_u64(price),
        Quantity::from_u64(funds),
        Utc::now(),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_markets() {
    let bases = ["XIN", "ETH", "SOL", "DOGE"];
    let (settlement_tx, mut settlement_rx) = mpsc::unbounded_channel();
    let mut exchange = Exchange::new(EngineConfig::default());
    for base in bases {
        let config = MarketConfig::new(base, "USDT", Precision::new(2, 2));
        let settlement = ChannelSettlement::with_sender(config.market_id(), settlement_tx.clone());
        exchange.open_market(config, settlement).unwrap();
    }
    drop(settlement_tx);

    let exchange = std::sync::Arc::new(exchange);
    let tasks: Vec<_> = bases
        .iter()
        .map(|base| {
            let exchange = exchange.clone();
            let market = MarketId::from_pair(base, "USDT");
            tokio::spawn(async move {
                for _ in 0..500 {
                    exchange.submit(&market, ask(50, 1), OrderAction::Create).await.unwrap();
                    exchange.submit(&market, bid(50, 50), OrderAction::Create).await.unwrap();
                }
                exchange.handle(&market).unwrap().flush().await.unwrap();
                market
            })
        })
        .collect();
    for task in tasks {
        let market = task.await.unwrap();
        let snapshot = exchange.snapshot(&market).unwrap();
        assert!(snapshot.asks.is_empty() && snapshot.bids.is_empty());
    }

    let exchange = std::sync::Arc::try_unwrap(exchange).ok().unwrap();
    assert_eq!(exchange.shutdown().await.len(), 4);

    let mut trades: HashMap<MarketId, usize> = HashMap::new();
    while let Some(event) = settlement_rx.recv().await {
        match event {
            SettlementEvent::TradeExecuted(trade) => *trades.entry(trade.market).or_default() += 1,
            SettlementEvent::OrderCancelled(cancel) => panic!("unexpected cancel {:?}", cancel),
        }
    }
    assert_eq!(trades.len(), 4);
    assert!(trades.values().all(|&count| count == 500));
}

#[tokio::test]
async fn test_submit_waits_for_capacity() {
    let market = MarketId::new("XIN/USDT");
    let (settlement, mut settled) = ChannelSettlement::new(market.clone());
    let book = Book::new(market, Precision::new(2, 2), settlement);
    let options = ActorOptions {
        mailbox_capacity: 2,
        snapshot_depth: 0,
    };
    let (handle, task) = spawn_book(book, options);

    // Far more intents than the mailbox holds; none may be lost
    for _ in 0..100 {
        handle.submit(ask(10, 1), OrderAction::Create).await.unwrap();
    }
    handle.submit(bid(10, 1000), OrderAction::Create).await.unwrap();
    handle.flush().await.unwrap();
    drop(handle);
    let book = task.await.unwrap();

    assert!(book.asks().is_empty());
    assert!(book.bids().is_empty());
    let mut trades = 0;
    while let Ok(event) = settled.try_recv() {
        assert!(matches!(event, SettlementEvent::TradeExecuted(_)));
        trades += 1;
    }
    assert_eq!(trades, 100);
}

#[tokio::test]
async fn test_try_submit_never_drops_silently() {
    let market = MarketId::new("XIN/USDT");
    let (settlement, _settled) = ChannelSettlement::new(market.clone());
    let book = Book::new(market, Precision::new(2, 2), settlement);
    let options = ActorOptions {
        mailbox_capacity: 4,
        snapshot_depth: 0,
    };
    let (handle, task) = spawn_book(book, options);

    let mut accepted = 0;
    let mut rejected = 0;
    for _ in 0..16 {
        match handle.try_submit(ask(10, 1), OrderAction::Create) {
            Ok(()) => accepted += 1,
            Err(EngineError::MailboxFull { capacity, .. }) => {
                assert_eq!(capacity, 4);
                rejected += 1;
            }
            Err(other) => panic!("unexpected error {}", other),
        }
    }
    assert!(rejected > 0);
    handle.flush().await.unwrap();
    drop(handle);

    // Every accepted intent reached the book
    let book = task.await.unwrap();
    assert_eq!(book.asks().order_count(), accepted);
}

/// Settlement whose trade recording always fails hard
struct Exploding;

impl Settlement for Exploding {
    fn transact(&mut self, _taker: &Order, _maker: &Order, _amount: Quantity) -> TradeId {
        panic!("ledger unreachable");
    }

    fn cancel(&mut self, _order: &Order) {}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_market_isolated_after_panic() {
    let broken = MarketId::new("XIN/USDT");
    let healthy = MarketId::new("ETH/USDT");
    let (broken_handle, broken_task) = spawn_book(
        Book::new(broken, Precision::new(2, 2), Exploding),
        ActorOptions::default(),
    );
    let (settlement, _settled) = ChannelSettlement::new(healthy.clone());
    let (healthy_handle, _healthy_task) = spawn_book(
        Book::new(healthy, Precision::new(2, 2), settlement),
        ActorOptions::default(),
    );

    broken_handle.submit(ask(10, 1), OrderAction::Create).await.unwrap();
    broken_handle.submit(bid(10, 10), OrderAction::Create).await.unwrap();
    let err = broken_task.await.err().expect("broken market kept running");
    assert!(err.is_panic());
    assert!(matches!(
        broken_handle.flush().await,
        Err(EngineError::MailboxClosed { .. })
    ));

    healthy_handle.submit(ask(10, 1), OrderAction::Create).await.unwrap();
    healthy_handle.flush().await.unwrap();
    assert_eq!(healthy_handle.snapshot().asks.len(), 1);
}
