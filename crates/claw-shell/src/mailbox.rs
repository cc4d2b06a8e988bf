//! The shell's own mailbox and message delivery.
//!
//! Messages land in the mailbox from a [`Courier`]. They can be taken out
//! with a blocking wait or with a poll that returns immediately.

use std::fmt;

use claw_probe::ActorRef;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::debug;

use crate::error::ShellError;

/// A message received by the shell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailMessage {
    /// Actor the message concerns.
    pub from: ActorRef,
    /// Message content.
    pub body: serde_json::Value,
}

impl fmt::Display for MailMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.from, self.body)
    }
}

/// Inbox of the shell.
#[derive(Debug)]
pub struct Mailbox {
    sender: mpsc::UnboundedSender<MailMessage>,
    receiver: mpsc::UnboundedReceiver<MailMessage>,
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailbox {
    /// Create an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    /// Sender that delivers into this mailbox.
    #[must_use]
    pub fn sender(&self) -> mpsc::UnboundedSender<MailMessage> {
        self.sender.clone()
    }

    /// Block until a message arrives and take it.
    ///
    /// Must not be called from within an async context.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox can no longer receive.
    pub fn wait_for_message(&mut self) -> Result<MailMessage, ShellError> {
        self.receiver
            .blocking_recv()
            .ok_or_else(|| ShellError::Transport("mailbox closed".to_string()))
    }

    /// Take the oldest message if one is already queued.
    #[must_use]
    pub fn try_pop_message(&mut self) -> Option<MailMessage> {
        match self.receiver.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Delivers messages to actors.
pub trait Courier {
    /// Send `body` to `to`, fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be handed off.
    fn deliver(&mut self, to: ActorRef, body: serde_json::Value) -> Result<(), ShellError>;
}

/// Courier that reflects every delivery back into a local mailbox.
#[derive(Debug, Clone)]
pub struct LoopbackCourier {
    outbox: mpsc::UnboundedSender<MailMessage>,
}

impl LoopbackCourier {
    /// Reflect deliveries into `mailbox`.
    #[must_use]
    pub fn new(mailbox: &Mailbox) -> Self {
        Self {
            outbox: mailbox.sender(),
        }
    }
}

impl Courier for LoopbackCourier {
    fn deliver(&mut self, to: ActorRef, body: serde_json::Value) -> Result<(), ShellError> {
        debug!(actor = %to, "delivering message");
        self.outbox
            .send(MailMessage { from: to, body })
            .map_err(|_| ShellError::Transport("mailbox closed".to_string()))
    }
}
