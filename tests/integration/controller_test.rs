//! Integration tests for the streaming price controller

use crate::support::{trade, wait_for, MockCatalog, MockFeed, OpenBehavior};
use price_ticker::catalog::Symbol;
use price_ticker::controller::{
    ControllerConfig, ControllerState, DirectionSignal, ErrorKind, PriceController,
};
use price_ticker::feed::FeedError;
use std::time::Duration;

fn config(symbol: Option<&str>) -> ControllerConfig {
    ControllerConfig {
        sample_interval: Duration::from_millis(500),
        initial_symbol: symbol.map(Symbol::new),
    }
}

fn streaming(symbol: &str) -> impl FnMut(&price_ticker::controller::PriceView) -> bool + '_ {
    move |v| v.state == ControllerState::Streaming && v.symbol.as_ref().map(Symbol::as_str) == Some(symbol)
}

#[tokio::test(start_paused = true)]
async fn test_two_prices_in_one_window() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&["BTCUSDT"]),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();
    wait_for(&mut views, streaming("BTCUSDT")).await;

    let tx = feed.sender();
    tx.send(trade("100.0")).unwrap();
    tx.send(trade("101.5")).unwrap();

    let view = wait_for(&mut views, |v| v.commits == 1).await;
    assert_eq!(view.current.map(|s| s.price), Some(101.5));
    assert!(view.previous.is_none());
    assert_eq!(view.direction(), DirectionSignal::Unknown);

    tx.send(trade("102.25")).unwrap();
    let view = wait_for(&mut views, |v| v.commits == 2).await;
    assert_eq!(view.current.map(|s| s.price), Some(102.25));
    assert_eq!(view.previous.map(|s| s.price), Some(101.5));
    assert_eq!(view.direction(), DirectionSignal::Up);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_burst_commits_once_with_latest_price() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();
    wait_for(&mut views, streaming("BTCUSDT")).await;

    let tx = feed.sender();
    for i in 0..200 {
        tx.send(trade(&format!("{}.5", 1000 + i))).unwrap();
    }

    let view = wait_for(&mut views, |v| v.commits >= 1).await;
    assert_eq!(view.commits, 1);
    assert_eq!(view.current.map(|s| s.price), Some(1199.5));

    // Quiet feed: further ticks commit nothing
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(controller.view().commits, 1);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_commit_rate_bounded_by_tick() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();
    wait_for(&mut views, streaming("BTCUSDT")).await;

    let tx = feed.sender();
    for i in 0..500 {
        tx.send(trade(&format!("{}.0", 100 + i))).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // 5 seconds of feed at 100 msg/s against a 500ms tick
    let commits = controller.view().commits;
    assert!((9..=11).contains(&commits), "commits = {}", commits);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_equal_prices_render_down() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();
    wait_for(&mut views, streaming("BTCUSDT")).await;

    let tx = feed.sender();
    tx.send(trade("100.0")).unwrap();
    wait_for(&mut views, |v| v.commits == 1).await;
    tx.send(trade("100.0")).unwrap();
    let view = wait_for(&mut views, |v| v.commits == 2).await;

    assert_eq!(view.direction(), DirectionSignal::Down);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_malformed_message_is_not_fatal() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();
    wait_for(&mut views, streaming("BTCUSDT")).await;

    let tx = feed.sender();
    tx.send(trade("100.0")).unwrap();
    wait_for(&mut views, |v| v.commits == 1).await;

    tx.send(Ok("{\"e\":\"trade\",\"p\":".to_string())).unwrap();
    let view = wait_for(&mut views, |v| v.error_count == 1).await;
    assert_eq!(view.state, ControllerState::Streaming);
    assert_eq!(
        view.last_error.as_ref().map(|e| e.kind()),
        Some(ErrorKind::MessageDecodeFailed)
    );
    assert_eq!(view.current.map(|s| s.price), Some(100.0));
    assert!(view.previous.is_none());

    tx.send(trade("99.5")).unwrap();
    let view = wait_for(&mut views, |v| v.commits == 2).await;
    assert_eq!(view.current.map(|s| s.price), Some(99.5));
    assert_eq!(view.previous.map(|s| s.price), Some(100.0));
    assert_eq!(view.error_count, 1);
    assert_eq!(feed.live(), 1);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_switching_symbol_closes_old_subscription_first() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&["BTCUSDT", "ETHUSDT"]),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();
    wait_for(&mut views, streaming("BTCUSDT")).await;

    let btc = feed.sender();
    btc.send(trade("42000.0")).unwrap();
    wait_for(&mut views, |v| v.commits == 1).await;

    controller.select_symbol("ETHUSDT").await.unwrap();
    let view = wait_for(&mut views, streaming("ETHUSDT")).await;

    assert!(btc.is_closed());
    assert_eq!(feed.live(), 1);
    assert_eq!(feed.max_live(), 1);
    assert!(view.current.is_none());
    assert_eq!(view.direction(), DirectionSignal::Unknown);

    // Late data on the old feed goes nowhere
    assert!(btc.send(trade("43000.0")).is_err());
    feed.sender().send(trade("2500.0")).unwrap();
    let view = wait_for(&mut views, |v| v.commits == 2).await;
    assert_eq!(view.current.map(|s| s.price), Some(2500.0));
    assert!(view.previous.is_none());

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rapid_switching_keeps_one_subscription() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();

    for symbol in ["ETHUSDT", "SOLUSDT", "BNBUSDT", "XRPUSDT"] {
        controller.select_symbol(symbol).await.unwrap();
    }

    wait_for(&mut views, streaming("XRPUSDT")).await;
    assert_eq!(feed.live(), 1);
    assert!(feed.max_live() <= 1);
    assert_eq!(
        feed.opened_symbols().last(),
        Some(&Symbol::new("XRPUSDT"))
    );

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_pending_open_is_abandoned_on_switch() {
    let feed = MockFeed::new();
    feed.set_behavior("SLOWUSDT", OpenBehavior::Hang);
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(Some("SLOWUSDT")),
    );
    let mut views = controller.subscribe();
    wait_for(&mut views, |v| v.state == ControllerState::Connecting).await;

    // Ticks while connecting commit nothing
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(controller.view().commits, 0);

    controller.select_symbol("ETHUSDT").await.unwrap();
    wait_for(&mut views, streaming("ETHUSDT")).await;
    assert_eq!(feed.live(), 1);
    assert_eq!(feed.open_count(), 1);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_requires_reselect() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();
    wait_for(&mut views, streaming("BTCUSDT")).await;

    let tx = feed.sender();
    tx.send(trade("100.0")).unwrap();
    wait_for(&mut views, |v| v.commits == 1).await;

    tx.send(Err(FeedError::Transport("connection reset".into())))
        .unwrap();
    let view = wait_for(&mut views, |v| v.state == ControllerState::Idle).await;
    assert_eq!(
        view.last_error.as_ref().map(|e| e.kind()),
        Some(ErrorKind::TransportError)
    );
    assert_eq!(view.current.map(|s| s.price), Some(100.0));
    assert!(tx.is_closed());
    assert_eq!(feed.live(), 0);

    // No automatic retry
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(feed.open_count(), 1);
    assert_eq!(controller.view().state, ControllerState::Idle);

    controller.select_symbol("BTCUSDT").await.unwrap();
    let view = wait_for(&mut views, streaming("BTCUSDT")).await;
    assert!(view.last_error.is_none());
    assert_eq!(feed.open_count(), 2);
    assert_eq!(feed.live(), 1);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_open_failure_surfaces_transport_error() {
    let feed = MockFeed::new();
    feed.set_behavior("BTCUSDT", OpenBehavior::Fail);
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();

    let view = wait_for(&mut views, |v| v.error_count == 1).await;
    assert_eq!(view.state, ControllerState::Idle);
    assert_eq!(
        view.last_error.as_ref().map(|e| e.kind()),
        Some(ErrorKind::TransportError)
    );
    assert_eq!(feed.live(), 0);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_catalog_is_published() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&["BTCUSDT", "ETHUSDT"]),
        config(None),
    );
    let mut views = controller.subscribe();

    let view = wait_for(&mut views, |v| !v.catalog.is_empty()).await;
    assert_eq!(
        view.catalog.as_slice(),
        &[Symbol::new("BTCUSDT"), Symbol::new("ETHUSDT")]
    );
    assert!(view.is_listed(&Symbol::new("ETHUSDT")));
    assert_eq!(view.state, ControllerState::Idle);
    assert_eq!(feed.open_count(), 0);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_catalog_failure_does_not_block_streaming() {
    let feed = MockFeed::new();
    let controller =
        PriceController::spawn(feed.clone(), MockCatalog::failing(), config(None));
    let mut views = controller.subscribe();

    let view = wait_for(&mut views, |v| v.error_count == 1).await;
    assert_eq!(
        view.last_error.as_ref().map(|e| e.kind()),
        Some(ErrorKind::CatalogUnavailable)
    );
    assert!(view.catalog.is_empty());

    controller.select_symbol("BTCUSDT").await.unwrap();
    wait_for(&mut views, streaming("BTCUSDT")).await;
    feed.sender().send(trade("100.0")).unwrap();
    let view = wait_for(&mut views, |v| v.commits == 1).await;
    assert!(view.last_error.is_none());

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_late_catalog_does_not_disturb_stream() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::delayed(&["BTCUSDT"], Duration::from_secs(3)),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();
    wait_for(&mut views, streaming("BTCUSDT")).await;

    feed.sender().send(trade("100.0")).unwrap();
    let view = wait_for(&mut views, |v| v.commits == 1).await;
    assert!(view.catalog.is_empty());

    let view = wait_for(&mut views, |v| !v.catalog.is_empty()).await;
    assert_eq!(view.state, ControllerState::Streaming);
    assert_eq!(view.current.map(|s| s.price), Some(100.0));
    assert_eq!(feed.live(), 1);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_everything() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();
    wait_for(&mut views, streaming("BTCUSDT")).await;

    let tx = feed.sender();
    tx.send(trade("100.0")).unwrap();
    controller.shutdown().await.unwrap();

    let view = views.borrow().clone();
    assert_eq!(view.state, ControllerState::Idle);
    assert_eq!(view.commits, 0);
    assert!(tx.is_closed());
    assert_eq!(feed.live(), 0);

    // Nothing commits afterwards
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(views.borrow().commits, 0);
    assert!(tx.send(trade("101.0")).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_releases_subscription() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();
    wait_for(&mut views, streaming("BTCUSDT")).await;

    drop(controller);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(feed.live(), 0);
    assert_eq!(views.borrow().state, ControllerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_while_idle() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(None),
    );
    let views = controller.subscribe();
    controller.shutdown().await.unwrap();

    assert_eq!(views.borrow().state, ControllerState::Idle);
    assert!(views.borrow().symbol.is_none());
    assert_eq!(feed.open_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_blank_symbol_ignored_while_idle() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(None),
    );
    let mut views = controller.subscribe();

    controller.select_symbol("   ").await.unwrap();
    controller.select_symbol("ETHUSDT").await.unwrap();
    wait_for(&mut views, streaming("ETHUSDT")).await;

    assert_eq!(feed.opened_symbols(), vec![Symbol::new("ETHUSDT")]);
    assert_eq!(controller.view().error_count, 0);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_blank_symbol_keeps_live_subscription() {
    let feed = MockFeed::new();
    let controller = PriceController::spawn(
        feed.clone(),
        MockCatalog::with_symbols(&[]),
        config(Some("BTCUSDT")),
    );
    let mut views = controller.subscribe();
    wait_for(&mut views, streaming("BTCUSDT")).await;

    let tx = feed.sender();
    tx.send(trade("64000.0")).unwrap();
    wait_for(&mut views, |v| v.commits == 1).await;

    controller.select_symbol("").await.unwrap();
    tx.send(trade("64010.0")).unwrap();

    // Still the same subscription, and the old price is compared, not reset
    let view = wait_for(&mut views, |v| v.commits == 2).await;
    assert_eq!(view.state, ControllerState::Streaming);
    assert_eq!(view.symbol, Some(Symbol::new("BTCUSDT")));
    assert_eq!(view.direction(), DirectionSignal::Up);
    assert_eq!(feed.open_count(), 1);
    assert_eq!(feed.live(), 1);

    controller.shutdown().await.unwrap();
}
