//! Cooldown-gated random sequencer behind `/roll`.
//!
//! Each invocation runs three checks in order: the weekday veto, the
//! cooldown, and finally a weighted draw of one configured sequence, which is
//! then sent step by step with its pauses.

use chrono::{Datelike, Weekday};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use relink_core::{
    config::{SequenceConfig, SequencerConfig},
    error::RelinkError,
    message::OutgoingMessage,
    traits::Channel,
};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of the gate checks for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Today is the veto weekday.
    Vetoed,
    /// The previous trigger was less than a cooldown ago.
    TooSoon,
    /// Triggered; emit the sequence at this index.
    Run(usize),
}

pub struct Sequencer {
    cooldown: Duration,
    veto_day: Option<Weekday>,
    veto_message: String,
    cooldown_message: String,
    sequences: Vec<SequenceConfig>,
    weights: WeightedIndex<u32>,
    /// When the sequencer last triggered. Check and update happen under one lock.
    last_triggered: Mutex<Option<Instant>>,
    /// Held for the whole emission so two sequences never interleave.
    emitting: tokio::sync::Mutex<()>,
}

impl Sequencer {
    pub fn from_config(config: &SequencerConfig) -> Result<Self, RelinkError> {
        let weights = WeightedIndex::new(config.sequences.iter().map(|s| s.weight))
            .map_err(|e| RelinkError::Config(format!("invalid sequence weights: {e}")))?;
        Ok(Self {
            cooldown: Duration::from_secs(config.cooldown_secs),
            veto_day: config.veto_day()?,
            veto_message: config.veto_message.clone(),
            cooldown_message: config.cooldown_message.clone(),
            sequences: config.sequences.clone(),
            weights,
            last_triggered: Mutex::new(None),
            emitting: tokio::sync::Mutex::new(()),
        })
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn sequences(&self) -> &[SequenceConfig] {
        &self.sequences
    }

    /// Weighted draw of a sequence index.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.weights.sample(rng)
    }

    /// Run the veto and cooldown checks. On success the trigger time is
    /// recorded and a sequence is drawn; rejections leave it untouched.
    pub fn check<R: Rng + ?Sized>(&self, now: Instant, today: Weekday, rng: &mut R) -> Gate {
        if self.veto_day == Some(today) {
            return Gate::Vetoed;
        }

        let mut last = self
            .last_triggered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(prev) = *last {
            if now.saturating_duration_since(prev) < self.cooldown {
                return Gate::TooSoon;
            }
        }
        *last = Some(now);
        drop(last);

        Gate::Run(self.pick(rng))
    }

    #[cfg(test)]
    pub fn last_triggered(&self) -> Option<Instant> {
        *self
            .last_triggered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handle one `/roll`: reply with the veto or cooldown notice, or emit a
    /// drawn sequence to `target`. Returns once the last step's pause is over.
    pub async fn invoke(
        &self,
        channel: &dyn Channel,
        target: &str,
        reply_to: Option<String>,
    ) -> Gate {
        let gate = {
            let mut rng = rand::thread_rng();
            self.check(Instant::now(), chrono::Local::now().weekday(), &mut rng)
        };

        match gate {
            Gate::Vetoed => {
                info!("sequencer: vetoed in {target}");
                send_step(channel, target, &self.veto_message, reply_to).await;
            }
            Gate::TooSoon => {
                info!("sequencer: cooldown active in {target}");
                send_step(channel, target, &self.cooldown_message, reply_to).await;
            }
            Gate::Run(index) => {
                info!("sequencer: running sequence {index} in {target}");
                self.emit(index, channel, target, reply_to).await;
            }
        }
        gate
    }

    /// Send every step of a sequence in order, pausing after each one.
    pub async fn emit(
        &self,
        index: usize,
        channel: &dyn Channel,
        target: &str,
        mut reply_to: Option<String>,
    ) {
        let Some(sequence) = self.sequences.get(index) else {
            warn!("sequencer: no sequence at index {index}");
            return;
        };

        let _emitting = self.emitting.lock().await;
        for step in &sequence.steps {
            send_step(channel, target, &step.text, reply_to.take()).await;
            if step.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;
            }
        }
    }
}

async fn send_step(channel: &dyn Channel, target: &str, text: &str, reply_to: Option<String>) {
    let msg = OutgoingMessage::plain(target, text).in_reply_to(reply_to);
    if let Err(e) = channel.send(msg).await {
        warn!("sequencer: failed to send to {target}: {e}");
    }
}
