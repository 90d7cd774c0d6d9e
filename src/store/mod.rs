//! Durable subscriber table.
//!
//! The whole table is one JSON document (`{"subscribers": [...]}`) that is
//! read and rewritten wholesale. [`SubscriberStore`] owns the business rules
//! (one record per email, monotonic verification, hard delete) and routes
//! every read-modify-write through a single writer lock, so two concurrent
//! requests can never overwrite each other's changes. Where the document
//! actually lives is a [`StoreBackend`] concern.

#[cfg(test)]
mod in_memory;
mod json_file;

#[cfg(test)]
pub use in_memory::InMemoryBackend;
pub use json_file::JsonFileBackend;

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_token::SubscriberToken;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SubscriberDocument {
    #[serde(default)]
    pub subscribers: Vec<Subscriber>,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Failed to access the subscriber document.")]
    Io(#[from] std::io::Error),
    #[error("The subscriber document could not be (de)serialized.")]
    Corrupt(#[from] serde_json::Error),
}

/// Where the subscriber document is kept.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// `Ok(None)` means the document does not exist yet, which is not an error.
    async fn read(&self) -> Result<Option<SubscriberDocument>, StoreError>;

    /// Must either fully replace the document or leave the previous one intact.
    async fn write(&self, document: &SubscriberDocument) -> Result<(), StoreError>;
}

#[derive(Debug)]
pub enum InsertOutcome {
    Created(Subscriber),
    AlreadySubscribed(Subscriber),
}

/// Identifies the record an unsubscribe request is about.
#[derive(Debug, Clone)]
pub enum SubscriberSelector {
    Token(SubscriberToken),
    Email(SubscriberEmail),
}

impl SubscriberSelector {
    /// Token wins when both identifiers are supplied.
    pub fn from_parts(
        token: Option<SubscriberToken>,
        email: Option<SubscriberEmail>,
    ) -> Option<SubscriberSelector> {
        token
            .map(SubscriberSelector::Token)
            .or_else(|| email.map(SubscriberSelector::Email))
    }

    fn matches(&self, subscriber: &Subscriber) -> bool {
        match self {
            SubscriberSelector::Token(token) => subscriber.token == *token,
            SubscriberSelector::Email(email) => subscriber.email == *email,
        }
    }
}

pub struct SubscriberStore {
    backend: Box<dyn StoreBackend>,
    write_lock: Mutex<()>,
}

impl SubscriberStore {
    pub fn new(backend: impl StoreBackend + 'static) -> SubscriberStore {
        SubscriberStore {
            backend: Box::new(backend),
            write_lock: Mutex::new(()),
        }
    }

    pub fn json_file(path: PathBuf) -> SubscriberStore {
        Self::new(JsonFileBackend::new(path))
    }

    #[cfg(test)]
    pub fn in_memory() -> SubscriberStore {
        Self::new(InMemoryBackend::default())
    }

    /// Every subscriber, creating an empty document on first access.
    ///
    /// A document that exists but cannot be read is an error, never an empty list.
    #[tracing::instrument(name = "Load subscribers", skip(self))]
    pub async fn load(&self) -> Result<Vec<Subscriber>, StoreError> {
        if let Some(document) = self.backend.read().await? {
            return Ok(document.subscribers);
        }

        let _guard = self.write_lock.lock().await;

        self.read_or_init().await
    }

    /// Replaces the whole table.
    #[tracing::instrument(name = "Save subscribers", skip(self, subscribers), fields(count = subscribers.len()))]
    pub async fn save(&self, subscribers: Vec<Subscriber>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        self.backend.write(&SubscriberDocument { subscribers }).await
    }

    pub async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, StoreError> {
        let subscribers = self.load().await?;

        Ok(subscribers.into_iter().find(|s| s.email == *email))
    }

    pub async fn find_by_token(
        &self,
        token: &SubscriberToken,
    ) -> Result<Option<Subscriber>, StoreError> {
        let subscribers = self.load().await?;

        Ok(subscribers.into_iter().find(|s| s.token == *token))
    }

    /// Appends `subscriber` unless its email is already present, in which case
    /// the stored record is returned untouched.
    #[tracing::instrument(
        name = "Insert subscriber if absent",
        skip(self, subscriber),
        fields(subscriber_email = %subscriber.email)
    )]
    pub async fn insert_if_absent(
        &self,
        subscriber: Subscriber,
    ) -> Result<InsertOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut subscribers = self.read_or_init().await?;

        if let Some(existing) = subscribers.iter().find(|s| s.email == subscriber.email) {
            return Ok(InsertOutcome::AlreadySubscribed(existing.clone()));
        }

        subscribers.push(subscriber.clone());
        self.backend.write(&SubscriberDocument { subscribers }).await?;

        Ok(InsertOutcome::Created(subscriber))
    }

    /// Marks the owner of `token` as verified. `Ok(None)` if nobody owns it.
    #[tracing::instrument(name = "Mark subscriber as verified", skip(self, token))]
    pub async fn mark_verified(
        &self,
        token: &SubscriberToken,
    ) -> Result<Option<Subscriber>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut subscribers = self.read_or_init().await?;

        let Some(subscriber) = subscribers.iter_mut().find(|s| s.token == *token) else {
            return Ok(None);
        };
        let changed = subscriber.verify();
        let verified = subscriber.clone();

        if changed {
            self.backend.write(&SubscriberDocument { subscribers }).await?;
        }

        Ok(Some(verified))
    }

    /// Deletes the matching record. `Ok(None)` if nothing matched.
    #[tracing::instrument(name = "Remove subscriber", skip(self, selector))]
    pub async fn remove(
        &self,
        selector: &SubscriberSelector,
    ) -> Result<Option<Subscriber>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut subscribers = self.read_or_init().await?;

        let Some(position) = subscribers.iter().position(|s| selector.matches(s)) else {
            return Ok(None);
        };
        let removed = subscribers.remove(position);

        self.backend.write(&SubscriberDocument { subscribers }).await?;

        Ok(Some(removed))
    }

    // Caller must hold the write lock
    async fn read_or_init(&self) -> Result<Vec<Subscriber>, StoreError> {
        match self.backend.read().await? {
            Some(document) => Ok(document.subscribers),
            None => {
                tracing::info!("Subscriber document not found, initializing an empty one");
                let document = SubscriberDocument::default();
                self.backend.write(&document).await?;

                Ok(document.subscribers)
            }
        }
    }
}
