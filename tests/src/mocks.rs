//! Mock implementations for testing.

use async_trait::async_trait;
use gardens_core::{Error, Result};
use messaging::{BillingNotifier, MessageSender};
use parking_lot::Mutex;
use std::sync::Arc;

/// A message captured by [`MockMessenger`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub phone: String,
    pub message: String,
}

/// Messenger that captures sends in memory.
///
/// Implements the same `MessageSender` trait as the real WhatsApp client,
/// so the handlers run their production paths up to the network call.
#[derive(Clone, Default)]
pub struct MockMessenger {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all captured messages.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Set failure mode for testing retry handling.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }
}

#[async_trait]
impl MessageSender for MockMessenger {
    async fn send_text(&self, phone: &str, message: &str) -> Result<()> {
        if *self.should_fail.lock() {
            return Err(Error::upstream("mock messenger failure"));
        }
        self.sent.lock().push(SentMessage {
            phone: phone.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn test_connection(&self) -> Result<bool> {
        Ok(!*self.should_fail.lock())
    }

    fn is_healthy(&self) -> bool {
        !*self.should_fail.lock()
    }
}

/// Billing notifier that captures callback payloads.
#[derive(Clone, Default)]
pub struct MockBilling {
    callbacks: Arc<Mutex<Vec<serde_json::Value>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockBilling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callbacks(&self) -> Vec<serde_json::Value> {
        self.callbacks.lock().clone()
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }
}

#[async_trait]
impl BillingNotifier for MockBilling {
    async fn voucher_generated(&self, payload: &serde_json::Value) -> Result<()> {
        if *self.should_fail.lock() {
            return Err(Error::upstream("mock billing failure"));
        }
        self.callbacks.lock().push(payload.clone());
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        !*self.should_fail.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_messenger_captures_sends() {
        let mock = MockMessenger::new();
        mock.send_text("6281234567890", "hello").await.unwrap();
        assert_eq!(mock.sent_count(), 1);
        assert_eq!(mock.sent()[0].phone, "6281234567890");
    }

    #[tokio::test]
    async fn test_mock_messenger_failure_mode() {
        let mock = MockMessenger::new();
        mock.set_should_fail(true);
        assert!(mock.send_text("6281234567890", "hello").await.is_err());
        assert!(!mock.is_healthy());
        assert_eq!(mock.sent_count(), 0);
    }
}
