//! Mock feed and catalog for driving the controller without a network

use async_trait::async_trait;
use futures_util::StreamExt;
use price_ticker::catalog::{CatalogError, Symbol, SymbolSource};
use price_ticker::controller::PriceView;
use price_ticker::feed::{FeedError, FeedStream, PriceFeed};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

pub type FeedSender = mpsc::UnboundedSender<Result<String, FeedError>>;

/// Decrements the live-connection count when the stream is dropped
struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// How the mock answers an open request for a symbol
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OpenBehavior {
    Succeed,
    Fail,
    Hang,
}

#[derive(Default)]
pub struct MockFeed {
    live: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
    opened: Mutex<Vec<(Symbol, FeedSender)>>,
    behaviors: Mutex<Vec<(Symbol, OpenBehavior)>>,
}

impl MockFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_behavior(&self, symbol: &str, behavior: OpenBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .push((Symbol::new(symbol), behavior));
    }

    /// Streams currently held by the consumer
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously held streams
    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    /// Sender feeding the most recent successful subscription
    pub fn sender(&self) -> FeedSender {
        let opened = self.opened.lock().unwrap();
        opened.last().expect("no subscription opened").1.clone()
    }

    pub fn opened_symbols(&self) -> Vec<Symbol> {
        let opened = self.opened.lock().unwrap();
        opened.iter().map(|(s, _)| s.clone()).collect()
    }

    fn behavior(&self, symbol: &Symbol) -> OpenBehavior {
        self.behaviors
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(s, _)| s == symbol)
            .map(|(_, b)| *b)
            .unwrap_or(OpenBehavior::Succeed)
    }
}

#[async_trait]
impl PriceFeed for MockFeed {
    async fn open(&self, symbol: &Symbol) -> Result<FeedStream, FeedError> {
        match self.behavior(symbol) {
            OpenBehavior::Fail => return Err(FeedError::Transport("connection refused".into())),
            OpenBehavior::Hang => std::future::pending::<()>().await,
            OpenBehavior::Succeed => {}
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let now_live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(now_live, Ordering::SeqCst);
        self.opened.lock().unwrap().push((symbol.clone(), tx));

        let guard = LiveGuard(Arc::clone(&self.live));
        let stream = futures_util::stream::unfold((rx, guard), |(mut rx, guard)| async move {
            rx.recv().await.map(|item| (item, (rx, guard)))
        });
        Ok(stream.boxed())
    }
}

pub struct MockCatalog {
    result: Mutex<Option<Result<Vec<Symbol>, CatalogError>>>,
    delay: Duration,
}

impl MockCatalog {
    pub fn with_symbols(symbols: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(Ok(symbols.iter().map(|s| Symbol::new(*s)).collect()))),
            delay: Duration::ZERO,
        })
    }

    pub fn failing() -> Arc<Self> {
        let err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        Arc::new(Self {
            result: Mutex::new(Some(Err(CatalogError::Decode(err)))),
            delay: Duration::ZERO,
        })
    }

    pub fn delayed(symbols: &[&str], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(Ok(symbols.iter().map(|s| Symbol::new(*s)).collect()))),
            delay,
        })
    }
}

#[async_trait]
impl SymbolSource for MockCatalog {
    async fn load_symbols(&self) -> Result<Vec<Symbol>, CatalogError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result
            .lock()
            .unwrap()
            .take()
            .expect("catalog loaded more than once")
    }
}

pub fn trade(price: &str) -> Result<String, FeedError> {
    Ok(format!(
        r#"{{"e":"trade","E":1704067200000,"s":"BTCUSDT","t":1,"p":"{}","q":"0.001","T":1704067200123}}"#,
        price
    ))
}

/// Wait until the published view satisfies `f`
pub async fn wait_for(
    views: &mut watch::Receiver<PriceView>,
    f: impl FnMut(&PriceView) -> bool,
) -> PriceView {
    tokio::time::timeout(Duration::from_secs(30), views.wait_for(f))
        .await
        .expect("timed out waiting for controller")
        .expect("controller stopped")
        .clone()
}

/// Answer exactly one HTTP request with `status_line` and `body`
///
/// Yields the request line (e.g. `GET /path?x=1 HTTP/1.1`) once received.
pub async fn serve_http_once(
    status_line: &'static str,
    body: String,
) -> (std::net::SocketAddr, tokio::sync::oneshot::Receiver<String>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let request = String::from_utf8_lossy(&request).to_string();
        let _ = tx.send(request.lines().next().unwrap_or_default().to_string());

        let response = format!(
            "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });

    (addr, rx)
}
