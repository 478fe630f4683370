//! In-memory channel for gateway, sequencer and broadcast tests.

use async_trait::async_trait;
use relink_core::{
    error::RelinkError,
    message::{IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Records every successful send; sends to `failing` targets return an error.
pub struct MockChannel {
    sent: Mutex<Vec<OutgoingMessage>>,
    failing: HashSet<String>,
    attempts: Mutex<usize>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::failing(&[])
    }

    pub fn failing(targets: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: targets.iter().map(|t| t.to_string()).collect(),
            attempts: Mutex::new(0),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, RelinkError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), RelinkError> {
        *self.attempts.lock().unwrap() += 1;
        let target = message.reply_target.clone().unwrap_or_default();
        if self.failing.contains(&target) {
            return Err(RelinkError::Channel(format!("mock send to {target} failed")));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn stop(&self) -> Result<(), RelinkError> {
        Ok(())
    }
}
