use async_trait::async_trait;
use std::sync::Mutex;

use super::{StoreBackend, StoreError, SubscriberDocument};
use crate::domain::subscriber::Subscriber;

/// Test double. Loses everything when dropped.
#[derive(Default)]
pub struct InMemoryBackend {
    document: Mutex<Option<SubscriberDocument>>,
}

impl InMemoryBackend {
    pub fn with_subscribers(subscribers: Vec<Subscriber>) -> InMemoryBackend {
        InMemoryBackend {
            document: Mutex::new(Some(SubscriberDocument { subscribers })),
        }
    }
}

#[async_trait]
impl StoreBackend for InMemoryBackend {
    async fn read(&self) -> Result<Option<SubscriberDocument>, StoreError> {
        Ok(self.document.lock().unwrap().clone())
    }

    async fn write(&self, document: &SubscriberDocument) -> Result<(), StoreError> {
        *self.document.lock().unwrap() = Some(document.clone());
        Ok(())
    }
}
