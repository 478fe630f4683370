//! Broadcast relay: deliver an externally deposited payload file to every
//! allow-listed chat, then remove it.
//!
//! The payload is written by a separate process (`relink broadcast`), so the
//! hand-off stays file based. Ticks run one after another inside a single
//! task; a payload is never picked up by two ticks.

use relink_core::{
    config::{shellexpand, BroadcastConfig},
    message::OutgoingMessage,
    traits::Channel,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// What one tick of the relay did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// No payload pending.
    Idle,
    /// A payload was present but blank.
    Empty,
    /// A payload was present but could not be read.
    Unreadable,
    Delivered { delivered: usize, failed: usize },
}

/// Background task: poll the payload file on a fixed period.
pub async fn broadcast_loop(config: BroadcastConfig, channel: Arc<dyn Channel>, chats: Vec<String>) {
    let path = PathBuf::from(shellexpand(&config.path));
    let send_delay = Duration::from_millis(config.send_delay_ms);
    info!(
        "broadcast: watching {} every {}s for {} chat(s)",
        path.display(),
        config.interval_secs,
        chats.len()
    );

    tokio::time::sleep(Duration::from_secs(config.initial_delay_secs)).await;

    let mut interval = tokio::time::interval(Duration::from_secs(config.interval_secs.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        relay_once(&path, channel.as_ref(), &chats, send_delay).await;
    }
}

/// Run one relay tick. Delivery failures are logged per chat and never stop
/// the fan-out. Whenever a payload was found, the file is removed exactly
/// once at the end of the tick.
pub async fn relay_once(
    path: &Path,
    channel: &dyn Channel,
    chats: &[String],
    send_delay: Duration,
) -> BroadcastOutcome {
    let outcome = match tokio::fs::read_to_string(path).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => return BroadcastOutcome::Idle,
        Err(e) => {
            error!("broadcast: failed to read {}: {e}", path.display());
            BroadcastOutcome::Unreadable
        }
        Ok(payload) if payload.trim().is_empty() => BroadcastOutcome::Empty,
        Ok(payload) => deliver(channel, chats, payload.trim_end(), send_delay).await,
    };

    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            error!("broadcast: failed to remove {}: {e}", path.display());
        }
    }
    outcome
}

async fn deliver(
    channel: &dyn Channel,
    chats: &[String],
    text: &str,
    send_delay: Duration,
) -> BroadcastOutcome {
    let mut delivered = 0;
    let mut failed = 0;
    for (i, chat) in chats.iter().enumerate() {
        if i > 0 && !send_delay.is_zero() {
            tokio::time::sleep(send_delay).await;
        }
        match channel.send(OutgoingMessage::plain(chat.as_str(), text)).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!("broadcast: delivery to {chat} failed: {e}");
                failed += 1;
            }
        }
    }
    info!("broadcast: delivered to {delivered} chat(s), {failed} failed");
    BroadcastOutcome::Delivered { delivered, failed }
}

/// Deposit a payload for the running relay. Written to a temporary sibling
/// and renamed so the relay never reads a half-written file.
pub async fn deposit(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    tokio::fs::write(&tmp, text).await?;
    tokio::fs::rename(&tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChannel;

    fn chats() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    #[tokio::test]
    async fn test_relay_delivers_to_every_chat_and_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broadcast.txt");
        std::fs::write(&path, "hello").unwrap();
        let channel = MockChannel::new();

        let outcome = relay_once(&path, &channel, &chats(), Duration::ZERO).await;
        assert_eq!(
            outcome,
            BroadcastOutcome::Delivered {
                delivered: 2,
                failed: 0
            }
        );
        assert!(!path.exists());

        let sent = channel.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.text == "hello"));
        assert_eq!(sent[0].reply_target.as_deref(), Some("A"));
        assert_eq!(sent[1].reply_target.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_relay_isolates_failed_recipient() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broadcast.txt");
        std::fs::write(&path, "hello").unwrap();
        let channel = MockChannel::failing(&["A"]);

        let outcome = relay_once(&path, &channel, &chats(), Duration::ZERO).await;
        assert_eq!(
            outcome,
            BroadcastOutcome::Delivered {
                delivered: 1,
                failed: 1
            }
        );
        assert_eq!(channel.attempts(), 2);
        let sent = channel.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reply_target.as_deref(), Some("B"));
        assert_eq!(sent[0].text, "hello");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_relay_idle_without_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broadcast.txt");
        let channel = MockChannel::new();
        let outcome = relay_once(&path, &channel, &chats(), Duration::ZERO).await;
        assert_eq!(outcome, BroadcastOutcome::Idle);
        assert_eq!(channel.attempts(), 0);
    }

    #[tokio::test]
    async fn test_relay_clears_blank_payload_without_sending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broadcast.txt");
        std::fs::write(&path, "  \n").unwrap();
        let channel = MockChannel::new();
        let outcome = relay_once(&path, &channel, &chats(), Duration::ZERO).await;
        assert_eq!(outcome, BroadcastOutcome::Empty);
        assert_eq!(channel.attempts(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_relay_clears_unreadable_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broadcast.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let channel = MockChannel::new();
        let outcome = relay_once(&path, &channel, &chats(), Duration::ZERO).await;
        assert_eq!(outcome, BroadcastOutcome::Unreadable);
        assert_eq!(channel.attempts(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_payload_delivered_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broadcast.txt");
        std::fs::write(&path, "once").unwrap();
        let channel = MockChannel::new();
        relay_once(&path, &channel, &chats(), Duration::ZERO).await;
        let second = relay_once(&path, &channel, &chats(), Duration::ZERO).await;
        assert_eq!(second, BroadcastOutcome::Idle);
        assert_eq!(channel.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relay_spaces_out_sends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broadcast.txt");
        std::fs::write(&path, "hi").unwrap();
        let channel = MockChannel::new();
        let chats = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        let started = tokio::time::Instant::now();
        relay_once(&path, &channel, &chats, Duration::from_millis(100)).await;
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(channel.sent().len(), 3);
    }

    /// Let the relay task run until `done` holds, moving paused time forward
    /// by at most `budget`.
    async fn settle(budget: Duration, done: impl Fn() -> bool) {
        let step = Duration::from_millis(10);
        let mut waited = Duration::ZERO;
        while !done() && waited < budget {
            tokio::time::sleep(step).await;
            waited += step;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_waits_initial_delay_then_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broadcast.txt");
        std::fs::write(&path, "first").unwrap();
        let config = BroadcastConfig {
            enabled: true,
            path: path.to_string_lossy().into_owned(),
            initial_delay_secs: 5,
            interval_secs: 5,
            send_delay_ms: 0,
        };
        let channel = Arc::new(MockChannel::new());
        let started = tokio::time::Instant::now();
        let handle = tokio::spawn(broadcast_loop(config, channel.clone(), chats()));

        // Nothing happens before the initial delay.
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(channel.attempts(), 0);
        assert!(path.exists());

        // First tick fires right after the delay.
        settle(Duration::from_secs(2), || channel.sent().len() == 2 && !path.exists()).await;
        assert_eq!(channel.sent().len(), 2);
        assert!(!path.exists());
        assert!(started.elapsed() < Duration::from_secs(10));

        // A payload deposited between ticks waits for the next one.
        std::fs::write(&path, "second").unwrap();
        settle(Duration::from_secs(8), || channel.sent().len() == 4 && !path.exists()).await;
        let sent = channel.sent();
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[2].text, "second");
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert!(!path.exists());

        handle.abort();
    }

    #[tokio::test]
    async fn test_deposit_then_relay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("broadcast.txt");
        deposit(&path, "from the cli\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "from the cli\n");
        assert!(!dir.path().join("nested").join("broadcast.txt.tmp").exists());

        let channel = MockChannel::new();
        relay_once(&path, &channel, &chats(), Duration::ZERO).await;
        assert_eq!(channel.sent()[0].text, "from the cli");
    }
}
