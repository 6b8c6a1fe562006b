//! Dashboard facade
//!
//! Boundary between the streaming core and whatever renders it. The facade
//! owns the feed connection and the aggregator, and republishes a combined
//! immutable [`DashboardSnapshot`] whenever either changes. Presentation code
//! reads snapshots and sends back three commands: change display currency,
//! reconnect, and reorder.

use crate::aggregator::{AggregateState, Aggregator, AggregatorSettings, CurrencySnapshot};
use crate::currency::ConversionTable;
use crate::feed::{ConnectionStatus, FeedConnection, FeedEnvelope, FeedSettings};
use crate::preferences::{self, PreferenceStore};
use crate::registry::SymbolRegistry;
use crate::ws::Transport;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Capacity of the feed to aggregator channel
const ENVELOPE_BUFFER: usize = 1024;

/// What the presentation layer renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Active display currency code
    pub currency: String,
    pub connected: bool,
    pub connection: ConnectionStatus,
    /// Symbols with data, in display order
    pub currencies: Vec<CurrencySnapshot>,
    /// Full display order over the catalog
    pub order: Vec<String>,
}

impl DashboardSnapshot {
    fn compose(state: &AggregateState, connection: ConnectionStatus) -> Self {
        Self {
            currency: state.currency.clone(),
            connected: connection.is_connected(),
            connection,
            currencies: state.ordered().cloned().collect(),
            order: state.order.clone(),
        }
    }
}

/// Injected collaborators for [`DashboardFacade::start`]
pub struct Collaborators {
    pub transport: Arc<dyn Transport>,
    pub registry: SymbolRegistry,
    pub rates: ConversionTable,
    pub preferences: Arc<dyn PreferenceStore>,
}

/// Owned entry point for the presentation layer
pub struct DashboardFacade {
    aggregator: Arc<Mutex<Aggregator>>,
    connection: FeedConnection,
    preferences: Arc<dyn PreferenceStore>,
    snapshot_rx: watch::Receiver<Arc<DashboardSnapshot>>,
    tasks: Vec<JoinHandle<()>>,
}

impl DashboardFacade {
    /// Wire up the core and start its background tasks
    ///
    /// The feed is left disconnected; call [`connect`](Self::connect).
    /// Must be called from within a tokio runtime.
    pub fn start(
        feed: FeedSettings,
        aggregation: AggregatorSettings,
        collaborators: Collaborators,
    ) -> Self {
        let Collaborators {
            transport,
            registry,
            rates,
            preferences,
        } = collaborators;
        let registry = Arc::new(registry);

        let mut aggregator = Aggregator::new(registry.clone(), rates, aggregation);
        let saved_order = preferences::load_display_order(preferences.as_ref());
        if !saved_order.is_empty() {
            aggregator.set_display_order(&saved_order);
        }

        let (envelope_tx, envelope_rx) = mpsc::channel(ENVELOPE_BUFFER);
        let connection = FeedConnection::new(feed, &registry, transport, envelope_tx);

        let state_rx = aggregator.subscribe();
        let status_rx = connection.subscribe_status();
        let initial = DashboardSnapshot::compose(&aggregator.state(), connection.status());
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(initial));

        let aggregator = Arc::new(Mutex::new(aggregator));
        let tasks = vec![
            tokio::spawn(ingest(aggregator.clone(), envelope_rx)),
            tokio::spawn(relay(state_rx, status_rx, snapshot_tx)),
        ];

        tracing::info!(
            symbols = registry.len(),
            url = %connection.url(),
            "Dashboard core started"
        );

        Self {
            aggregator,
            connection,
            preferences,
            snapshot_rx,
            tasks,
        }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to snapshots; each change is a full replacement
    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        self.snapshot_rx.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.status().is_connected()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn display_currency(&self) -> String {
        self.aggregator.lock().display_currency().to_string()
    }

    /// Start streaming
    pub fn connect(&self) {
        self.connection.connect();
    }

    /// Stop streaming without automatic reconnection
    pub fn disconnect(&self) {
        self.connection.disconnect();
    }

    /// Switch the display currency; unknown codes convert at rate 1
    pub fn change_display_currency(&self, code: &str) {
        self.aggregator.lock().set_display_currency(code);
    }

    /// Reconnect after going offline; no-op while connecting or connected
    pub fn reconnect(&self) {
        self.connection.connect();
    }

    /// Reorder the cards and persist the resulting order
    ///
    /// Listed symbols come first in the given order, the rest follow in
    /// catalog order.
    pub fn set_display_order(&self, codes: &[String]) {
        let order = self.aggregator.lock().set_display_order(codes);
        tracing::debug!(?order, "Display order changed");
        preferences::save_display_order(self.preferences.as_ref(), &order);
    }
}

impl Drop for DashboardFacade {
    fn drop(&mut self) {
        self.connection.disconnect();
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Apply envelopes one at a time in arrival order
async fn ingest(aggregator: Arc<Mutex<Aggregator>>, mut envelope_rx: mpsc::Receiver<FeedEnvelope>) {
    while let Some(envelope) = envelope_rx.recv().await {
        aggregator.lock().handle_message(&envelope);
    }
    tracing::debug!("Feed channel closed, ingest stopped");
}

/// Combine aggregate and connection changes into dashboard snapshots
async fn relay(
    mut state_rx: watch::Receiver<Arc<AggregateState>>,
    mut status_rx: watch::Receiver<ConnectionStatus>,
    snapshot_tx: watch::Sender<Arc<DashboardSnapshot>>,
) {
    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let state = state_rx.borrow_and_update().clone();
        let status = *status_rx.borrow_and_update();
        let snapshot = DashboardSnapshot::compose(&state, status);
        if snapshot_tx.send(Arc::new(snapshot)).is_err() {
            tracing::debug!("No snapshot subscribers left, relay stopped");
            break;
        }
    }
}
