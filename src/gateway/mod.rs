//! Gateway: the main event loop connecting channels to the link rules, the
//! sequencer and the broadcast relay.

pub mod broadcast;
mod pipeline;


use crate::sequencer::Sequencer;
use relink_core::{
    config::{AuthConfig, BroadcastConfig},
    message::{IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use relink_rules::RuleSet;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Channel the broadcast relay delivers through. Allow-listed chat ids are
/// Telegram chat ids.
const BROADCAST_CHANNEL: &str = "telegram";

/// The central gateway that routes messages from channels through the rules.
pub struct Gateway {
    pub(super) name: String,
    pub(super) channels: HashMap<String, Arc<dyn Channel>>,
    pub(super) rules: RuleSet,
    pub(super) auth: AuthConfig,
    pub(super) sequencer: Option<Sequencer>,
    pub(super) broadcast: BroadcastConfig,
}

impl Gateway {
    pub fn new(
        name: String,
        channels: HashMap<String, Arc<dyn Channel>>,
        rules: RuleSet,
        auth: AuthConfig,
        sequencer: Option<Sequencer>,
        broadcast: BroadcastConfig,
    ) -> Self {
        Self {
            name,
            channels,
            rules,
            auth,
            sequencer,
            broadcast,
        }
    }

    /// Run the main event loop until Ctrl-C.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "{} gateway running | channels: {} | allowed chats: {} | paywall domains: {} | mirrors: {}",
            self.name,
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
            self.auth.allowed_chats.len(),
            self.rules.paywall_count(),
            self.rules.mirror_count(),
        );

        match self.sequencer {
            Some(ref seq) => info!(
                "sequencer: {} sequence(s), {}s cooldown",
                seq.sequences().len(),
                seq.cooldown().as_secs()
            ),
            None => info!("sequencer: disabled"),
        }

        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(msg) = channel_rx.recv().await {
                    if tx.send(msg).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        // Spawn broadcast relay loop.
        let broadcast_handle = match self.channels.get(BROADCAST_CHANNEL) {
            Some(channel) if self.broadcast.enabled => {
                let channel = channel.clone();
                let config = self.broadcast.clone();
                let chats: Vec<String> = self
                    .auth
                    .allowed_chats
                    .iter()
                    .map(|id| id.to_string())
                    .collect();
                Some(tokio::spawn(async move {
                    broadcast::broadcast_loop(config, channel, chats).await;
                }))
            }
            _ => None,
        };

        // Main event loop with graceful shutdown.
        loop {
            tokio::select! {
                Some(incoming) = rx.recv() => {
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.handle_message(incoming).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown(&broadcast_handle).await;
        Ok(())
    }

    /// Graceful shutdown: stop background tasks, then channels.
    async fn shutdown(&self, broadcast_handle: &Option<tokio::task::JoinHandle<()>>) {
        info!("Shutting down...");

        if let Some(h) = broadcast_handle {
            h.abort();
        }

        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }

        info!("Shutdown complete.");
    }

    /// Send a message through the channel the incoming message arrived on.
    pub(super) async fn send(&self, incoming: &IncomingMessage, msg: OutgoingMessage) {
        match self.channels.get(&incoming.channel) {
            Some(channel) => {
                if let Err(e) = channel.send(msg).await {
                    error!("failed to send message: {e}");
                }
            }
            None => warn!("no channel named {} to reply on", incoming.channel),
        }
    }
}
