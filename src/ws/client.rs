//! tokio-tungstenite transport with ping/pong keepalive

use super::types::{FrameReceiver, WsConfig, WsError};
use super::Transport;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production transport backed by `tokio-tungstenite`
#[derive(Debug, Clone, Default)]
pub struct TungsteniteTransport {
    config: WsConfig,
}

impl TungsteniteTransport {
    /// Create a new transport with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Stream frames from an open socket until it closes or the receiver is dropped
    async fn pump(
        ws_stream: WsStream,
        config: WsConfig,
        tx: mpsc::Sender<Result<String, WsError>>,
    ) -> Result<(), WsError> {
        let (mut write, mut read) = ws_stream.split();

        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick completes immediately
        ping_interval.tick().await;
        let mut waiting_for_pong = false;

        loop {
            tokio::select! {
                _ = tx.closed() => {
                    tracing::debug!("Frame receiver dropped, closing connection");
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if tx.send(Ok(text)).await.is_err() {
                                let _ = write.send(Message::Close(None)).await;
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            waiting_for_pong = false;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason): (u16, String) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            tracing::info!(code, %reason, "Received close frame");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            return Err(WsError::ConnectionFailed(e.to_string()));
                        }
                        None => {
                            return Err(WsError::ConnectionFailed("Stream ended unexpectedly".into()));
                        }
                        // Ticker streams are text only
                        _ => {}
                    }
                }

                _ = ping_interval.tick() => {
                    if waiting_for_pong {
                        return Err(WsError::PongTimeout);
                    }
                    write.send(Message::Ping(vec![])).await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    waiting_for_pong = true;
                }
            }
        }
    }
}

#[async_trait]
impl Transport for TungsteniteTransport {
    async fn open(&self, url: &str) -> Result<FrameReceiver, WsError> {
        tracing::info!(%url, "Connecting to WebSocket");

        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        tracing::info!("WebSocket connected");

        let (tx, rx) = mpsc::channel(self.config.frame_buffer);
        let config = self.config.clone();

        tokio::spawn(async move {
            let fault_tx = tx.clone();
            if let Err(e) = Self::pump(ws_stream, config, tx).await {
                tracing::warn!(error = %e, "WebSocket session failed");
                let _ = fault_tx.send(Err(e)).await;
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transport_with_config() {
        let transport = TungsteniteTransport::new(
            WsConfig::default().ping_interval(Duration::from_secs(15)),
        );
        assert_eq!(transport.config.ping_interval, Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_open_failure_is_reported() {
        let transport = TungsteniteTransport::default();
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            transport.open("ws://127.0.0.1:1/ws/btcusdt@ticker"),
        )
        .await
        .expect("Test timed out");

        assert!(matches!(result, Err(WsError::ConnectionFailed(_))));
    }
}
