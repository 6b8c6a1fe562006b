//! End-to-end tests of the dashboard facade over an in-memory transport

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use ticker_dash::aggregator::AggregatorSettings;
use ticker_dash::currency::ConversionTable;
use ticker_dash::dashboard::{Collaborators, DashboardFacade, DashboardSnapshot};
use ticker_dash::feed::FeedSettings;
use ticker_dash::preferences::{
    FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, DISPLAY_ORDER_KEY,
};
use ticker_dash::registry::SymbolRegistry;
use ticker_dash::ws::{FrameReceiver, Transport, WsError};
use tokio::sync::mpsc;

/// Hands out one in-memory session per open, refusing once exhausted
struct ChannelTransport {
    sessions: Mutex<Vec<FrameReceiver>>,
    opens: AtomicUsize,
}

impl ChannelTransport {
    fn with_sessions(count: usize) -> (Arc<Self>, Vec<mpsc::Sender<Result<String, WsError>>>) {
        let mut senders = Vec::new();
        let mut receivers = Vec::new();
        for _ in 0..count {
            let (tx, rx) = mpsc::channel(64);
            senders.push(tx);
            receivers.push(rx);
        }
        receivers.reverse();
        let transport = Arc::new(Self {
            sessions: Mutex::new(receivers),
            opens: AtomicUsize::new(0),
        });
        (transport, senders)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn open(&self, _url: &str) -> Result<FrameReceiver, WsError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .pop()
            .ok_or_else(|| WsError::ConnectionFailed("refused".into()))
    }
}

fn ticker(pair: &str, price: &str) -> Result<String, WsError> {
    Ok(format!(
        r#"{{"e":"24hrTicker","E":1704067200000,"s":"{pair}","c":"{price}","p":"10","P":"2.5","h":"51000","l":"49000","v":"1000"}}"#
    ))
}

fn start(transport: Arc<ChannelTransport>, preferences: Arc<dyn PreferenceStore>) -> DashboardFacade {
    DashboardFacade::start(
        FeedSettings {
            reconnect_delay: Duration::from_millis(200),
            ..Default::default()
        },
        AggregatorSettings::default(),
        Collaborators {
            transport,
            registry: SymbolRegistry::default(),
            rates: ConversionTable::default(),
            preferences,
        },
    )
}

async fn wait_for(
    facade: &DashboardFacade,
    predicate: impl FnMut(&Arc<DashboardSnapshot>) -> bool,
) -> Arc<DashboardSnapshot> {
    let mut rx = facade.subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .unwrap()
        .clone();
    snapshot
}

#[tokio::test]
async fn test_stream_survives_reconnect() {
    let (transport, mut sessions) = ChannelTransport::with_sessions(2);
    let facade = start(transport.clone(), Arc::new(MemoryPreferenceStore::default()));
    facade.connect();

    let first = sessions.remove(0);
    first.send(ticker("BTCUSDT", "50000.00")).await.unwrap();
    wait_for(&facade, |s| s.currencies.len() == 1).await;

    // Peer goes away; the feed reconnects onto the second session
    drop(first);
    wait_for(&facade, |s| !s.connected).await;
    wait_for(&facade, |s| s.connected).await;
    assert_eq!(transport.opens.load(Ordering::SeqCst), 2);

    sessions[0].send(ticker("BTCUSDT", "50100.00")).await.unwrap();
    let snapshot = wait_for(&facade, |s| {
        s.currencies
            .first()
            .map(|c| c.price_history.len() == 2)
            .unwrap_or(false)
    })
    .await;
    let btc = &snapshot.currencies[0];
    assert_eq!(btc.current_price, dec!(50100.00));
}

#[tokio::test]
async fn test_currency_change_without_network_round_trip() {
    let (transport, sessions) = ChannelTransport::with_sessions(1);
    let facade = start(transport, Arc::new(MemoryPreferenceStore::default()));
    facade.connect();

    sessions[0].send(ticker("ETHUSDT", "3000")).await.unwrap();
    wait_for(&facade, |s| s.currencies.len() == 1).await;

    facade.change_display_currency("BRL");
    let snapshot = wait_for(&facade, |s| s.currency == "BRL").await;
    assert_eq!(snapshot.currencies[0].current_price, dec!(15000));
    assert_eq!(snapshot.currencies[0].volume_24h, dec!(1000));
    assert_eq!(snapshot.currencies[0].price_history[0].price, dec!(3000));
}

#[tokio::test]
async fn test_display_order_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");

    {
        let (transport, _sessions) = ChannelTransport::with_sessions(0);
        let facade = start(transport, Arc::new(FilePreferenceStore::new(&path)));
        facade.set_display_order(&["ADA".to_string(), "SOL".to_string()]);
    }

    let store = FilePreferenceStore::new(&path);
    assert!(store.read(DISPLAY_ORDER_KEY).unwrap().is_some());

    let (transport, _sessions) = ChannelTransport::with_sessions(0);
    let facade = start(transport, Arc::new(store));
    assert_eq!(
        facade.snapshot().order,
        vec!["ADA", "SOL", "BTC", "ETH", "BNB", "XRP"]
    );
}
