//! Email transports without a mail server
use formgate_core::{EmailMessage, EmailTransport, FormError};
use std::sync::{Mutex, MutexGuard};

/// Keeps every sent message in memory.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    messages: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that rejects every message.
    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EmailMessage>> {
        self.messages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn messages(&self) -> Vec<EmailMessage> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl EmailTransport for RecordingTransport {
    fn send(&self, message: &EmailMessage) -> Result<(), FormError> {
        if self.fail {
            return Err(FormError::Mail(format!("delivery to {} refused", message.to)));
        }
        self.lock().push(message.clone());
        Ok(())
    }
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTransport;

impl EmailTransport for TracingTransport {
    fn send(&self, message: &EmailMessage) -> Result<(), FormError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            reply_to = ?message.reply_to,
            lines = message.body_lines.len(),
            "email"
        );
        for line in &message.body_lines {
            tracing::debug!("  {}", line);
        }
        Ok(())
    }
}
