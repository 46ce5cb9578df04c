//! Outgoing account email.

use std::fmt::Debug;

use async_trait::async_trait;
use url::Url;

use crate::Result;

/// A single account email: verification or password reset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// The frontend link the email asks the user to open.
    pub link: Url,
}

/// Delivers account emails.
#[async_trait]
pub trait Mailer: Send + Sync + Debug {
    async fn send(&self, email: Email) -> Result<()>;
}

/// Writes emails to the log instead of delivering them.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            link = %email.link,
            "Account email"
        );
        Ok(())
    }
}

/// Keeps sent emails in memory for inspection.
#[cfg(any(test, feature = "testing"))]
#[derive(Clone, Debug, Default)]
pub struct MemoryMailer {
    outbox: std::sync::Arc<std::sync::Mutex<Vec<Email>>>,
}

#[cfg(any(test, feature = "testing"))]
impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every email sent so far, oldest first.
    pub fn sent(&self) -> Vec<Email> {
        self.outbox.lock().unwrap().clone()
    }

    /// The most recent email to `to`.
    pub fn last_to(&self, to: &str) -> Option<Email> {
        self.outbox
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|email| email.to == to)
            .cloned()
    }

    /// Last path segment of the link in the most recent email to `to`.
    pub fn last_token_to(&self, to: &str) -> Option<String> {
        let email = self.last_to(to)?;
        email
            .link
            .path_segments()?
            .filter(|s| !s.is_empty())
            .last()
            .map(str::to_string)
    }
}

#[cfg(any(test, feature = "testing"))]
#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: Email) -> Result<()> {
        self.outbox.lock().unwrap().push(email);
        Ok(())
    }
}
