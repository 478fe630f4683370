use crate::{
    error::RelinkError,
    message::{IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;

/// Messaging Channel trait.
///
/// Every messaging platform implements this trait to receive and send
/// messages. The gateway, the sequencer and the broadcast relay only ever
/// talk to a platform through it.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, RelinkError>;

    /// Send a message through this channel.
    async fn send(&self, message: OutgoingMessage) -> Result<(), RelinkError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), RelinkError>;
}
