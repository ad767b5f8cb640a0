//! WebSocket feed subscriber.
//!
//! Maintains one connection to the real-time document store's update feed,
//! tracks the subscribed entity set across reconnects, and fans decoded
//! [`EntityUpdate`] frames out over a broadcast channel for the
//! reconciliation listener.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use feed_common::FeedConfig;
use feed_core::{EntityFeed, EntityUpdate, FeedError, FeedResult, PostId};

/// Control frame sent to the feed collaborator
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ControlFrame {
    Subscribe { entity_id: PostId },
    Unsubscribe { entity_id: PostId },
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct FeedSubscriberConfig {
    /// WebSocket URL of the update feed
    pub ws_url: String,
    /// Channel buffer size for broadcast
    pub broadcast_buffer: usize,
    /// Base reconnection delay in milliseconds; a random jitter of up to
    /// half the base is added so reconnecting clients spread out
    pub reconnect_delay_ms: u64,
}

impl Default for FeedSubscriberConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:8080/feed".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

impl From<&FeedConfig> for FeedSubscriberConfig {
    fn from(config: &FeedConfig) -> Self {
        Self {
            ws_url: config.ws_url.clone(),
            broadcast_buffer: config.buffer,
            reconnect_delay_ms: config.reconnect_delay_ms,
        }
    }
}

/// Commands for subscription management
#[derive(Debug)]
enum SubscriberCommand {
    Subscribe(PostId),
    Unsubscribe(PostId),
    Shutdown,
}

/// WebSocket feed subscriber
pub struct FeedSubscriber {
    #[allow(dead_code)]
    config: FeedSubscriberConfig,
    /// Currently subscribed entities
    subscribed: Arc<RwLock<HashSet<PostId>>>,
    /// Broadcast sender for decoded updates
    broadcast_tx: broadcast::Sender<EntityUpdate>,
    /// Control channel for subscription management
    control_tx: mpsc::Sender<SubscriberCommand>,
}

impl FeedSubscriber {
    /// Create a new subscriber and start the background listener
    #[must_use]
    pub fn new(config: FeedSubscriberConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_buffer);
        let (control_tx, control_rx) = mpsc::channel(32);
        let subscribed = Arc::new(RwLock::new(HashSet::new()));

        let subscriber = Self {
            config: config.clone(),
            subscribed: subscribed.clone(),
            broadcast_tx: broadcast_tx.clone(),
            control_tx,
        };

        // Start background listener
        tokio::spawn(Self::listener_loop(
            config,
            subscribed,
            broadcast_tx,
            control_rx,
        ));

        subscriber
    }

    /// Background listener loop with reconnection
    async fn listener_loop(
        config: FeedSubscriberConfig,
        subscribed: Arc<RwLock<HashSet<PostId>>>,
        broadcast_tx: broadcast::Sender<EntityUpdate>,
        mut control_rx: mpsc::Receiver<SubscriberCommand>,
    ) {
        loop {
            match Self::run_listener(&config, &subscribed, &broadcast_tx, &mut control_rx).await {
                Ok(should_stop) => {
                    if should_stop {
                        tracing::info!("Feed subscriber shutting down");
                        break;
                    }
                }
                Err(e) => {
                    let jitter = rand::thread_rng().gen_range(0..=config.reconnect_delay_ms / 2);
                    tracing::error!(error = %e, "Feed subscriber error, reconnecting...");
                    tokio::time::sleep(tokio::time::Duration::from_millis(
                        config.reconnect_delay_ms + jitter,
                    ))
                    .await;
                }
            }
        }
    }

    /// Run one connection until error or shutdown
    async fn run_listener(
        config: &FeedSubscriberConfig,
        subscribed: &Arc<RwLock<HashSet<PostId>>>,
        broadcast_tx: &broadcast::Sender<EntityUpdate>,
        control_rx: &mut mpsc::Receiver<SubscriberCommand>,
    ) -> FeedResult<bool> {
        let (stream, _) = connect_async(config.ws_url.as_str())
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        let (mut sink, mut stream) = stream.split();

        // Re-establish existing subscriptions on (re)connect
        {
            let entities = subscribed.read().await;
            for entity_id in entities.iter() {
                Self::send_frame(&mut sink, &ControlFrame::Subscribe { entity_id: *entity_id })
                    .await?;
            }
        }

        tracing::info!("Feed subscriber connected");

        loop {
            tokio::select! {
                // Handle incoming frames
                msg = stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(payload))) => {
                            match serde_json::from_str::<EntityUpdate>(&payload) {
                                Ok(update) => {
                                    tracing::trace!(entity_id = %update.entity_id, "Received entity update");
                                    // Ignore send errors - no receivers
                                    let _ = broadcast_tx.send(update);
                                }
                                Err(e) => {
                                    tracing::warn!(error = %e, "Undecodable feed frame dropped");
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::warn!("Feed connection closed by server");
                            return Err(FeedError::Closed);
                        }
                        // Pings are answered by the protocol layer
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            return Err(FeedError::Transport(e.to_string()));
                        }
                        None => {
                            tracing::warn!("Feed stream ended");
                            return Err(FeedError::Closed);
                        }
                    }
                }

                // Handle control commands
                cmd = control_rx.recv() => {
                    match cmd {
                        Some(SubscriberCommand::Subscribe(entity_id)) => {
                            Self::send_frame(&mut sink, &ControlFrame::Subscribe { entity_id }).await?;
                            subscribed.write().await.insert(entity_id);
                            tracing::debug!(entity_id = %entity_id, "Subscribed to entity");
                        }
                        Some(SubscriberCommand::Unsubscribe(entity_id)) => {
                            Self::send_frame(&mut sink, &ControlFrame::Unsubscribe { entity_id }).await?;
                            subscribed.write().await.remove(&entity_id);
                            tracing::debug!(entity_id = %entity_id, "Unsubscribed from entity");
                        }
                        Some(SubscriberCommand::Shutdown) => {
                            return Ok(true);
                        }
                        None => {
                            tracing::warn!("Control channel closed");
                            return Ok(true);
                        }
                    }
                }
            }
        }
    }

    async fn send_frame<S>(sink: &mut S, frame: &ControlFrame) -> FeedResult<()>
    where
        S: SinkExt<Message> + Unpin,
        S::Error: std::fmt::Display,
    {
        let payload =
            serde_json::to_string(frame).map_err(|e| FeedError::Transport(e.to_string()))?;
        sink.send(Message::Text(payload))
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))
    }

    /// Get a receiver for decoded update frames
    #[must_use]
    pub fn updates(&self) -> broadcast::Receiver<EntityUpdate> {
        self.broadcast_tx.subscribe()
    }

    /// Get currently subscribed entities
    pub async fn subscribed_entities(&self) -> Vec<PostId> {
        self.subscribed.read().await.iter().copied().collect()
    }

    /// Shutdown the subscriber
    pub async fn shutdown(&self) -> FeedResult<()> {
        self.control_tx
            .send(SubscriberCommand::Shutdown)
            .await
            .map_err(|_| FeedError::Closed)
    }
}

#[async_trait]
impl EntityFeed for FeedSubscriber {
    async fn subscribe(&self, entity_id: PostId) -> FeedResult<()> {
        self.control_tx
            .send(SubscriberCommand::Subscribe(entity_id))
            .await
            .map_err(|_| FeedError::Closed)
    }

    async fn unsubscribe(&self, entity_id: PostId) -> FeedResult<()> {
        self.control_tx
            .send(SubscriberCommand::Unsubscribe(entity_id))
            .await
            .map_err(|_| FeedError::Closed)
    }
}

/// Builder for the feed subscriber
pub struct FeedSubscriberBuilder {
    config: FeedSubscriberConfig,
}

impl FeedSubscriberBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: FeedSubscriberConfig::default(),
        }
    }

    /// Set the WebSocket URL
    #[must_use]
    pub fn ws_url(mut self, url: impl Into<String>) -> Self {
        self.config.ws_url = url.into();
        self
    }

    /// Set broadcast buffer size
    #[must_use]
    pub fn broadcast_buffer(mut self, size: usize) -> Self {
        self.config.broadcast_buffer = size;
        self
    }

    /// Set reconnection delay
    #[must_use]
    pub fn reconnect_delay_ms(mut self, delay: u64) -> Self {
        self.config.reconnect_delay_ms = delay;
        self
    }

    /// Build and start the subscriber
    #[must_use]
    pub fn build(self) -> FeedSubscriber {
        FeedSubscriber::new(self.config)
    }
}

impl Default for FeedSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}
