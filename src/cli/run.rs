//! Run command implementation

use crate::config::Config;
use crate::currency::{default_currencies, normalize_code};
use crate::dashboard::{Collaborators, DashboardFacade, DashboardSnapshot};
use crate::preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
use crate::ws::{TungsteniteTransport, WsConfig};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Display currency, overriding the configured one
    #[arg(long)]
    pub currency: Option<String>,

    /// Print each snapshot as a JSON line
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let transport = TungsteniteTransport::new(
            WsConfig::default().ping_interval(Duration::from_secs(config.feed.ping_interval_secs)),
        );
        let preferences: Arc<dyn PreferenceStore> = match &config.dashboard.preferences_path {
            Some(path) => {
                let store = FilePreferenceStore::new(path);
                tracing::info!(path = %store.path().display(), "Persisting display order");
                Arc::new(store)
            }
            None => Arc::new(MemoryPreferenceStore::default()),
        };

        let facade = DashboardFacade::start(
            config.feed_settings(),
            config.aggregator_settings(),
            Collaborators {
                transport: Arc::new(transport),
                registry: config.registry(),
                rates: config.conversion_table(),
                preferences,
            },
        );
        if let Some(code) = &self.currency {
            facade.change_display_currency(code);
        }

        let mut snapshots = facade.subscribe();
        facade.connect();

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        let mut was_connected = false;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let snapshot = snapshots.borrow_and_update().clone();
            if snapshot.connected != was_connected {
                was_connected = snapshot.connected;
                tracing::info!(
                    state = ?snapshot.connection.state,
                    attempts = snapshot.connection.attempts,
                    "Connection status changed"
                );
            }
            if self.json {
                println!("{}", serde_json::to_string(&*snapshot)?);
            } else {
                render(&snapshot);
            }
        }

        facade.disconnect();
        Ok(())
    }
}

fn render(snapshot: &DashboardSnapshot) {
    let code = normalize_code(&snapshot.currency);
    let sign = default_currencies()
        .into_iter()
        .find(|c| c.code == code)
        .map(|c| c.sign.to_string())
        .unwrap_or_else(|| format!("{code} "));
    let status = if snapshot.connected { "online" } else { "offline" };

    let line: Vec<String> = snapshot
        .currencies
        .iter()
        .map(|c| {
            format!(
                "{} {}{:.2} ({:+.2}%)",
                c.symbol.code, sign, c.current_price, c.change_percent_24h
            )
        })
        .collect();
    println!("[{status}] {}", line.join(" | "));
}
