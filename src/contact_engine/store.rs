//! In-memory contact store that supplies candidate pools

use crate::contact_engine::ContactRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredContact {
    #[serde(flatten)]
    pub contact: ContactRecord,
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct ContactStore {
    contacts: Arc<Mutex<HashMap<String, StoredContact>>>,
}

impl ContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a contact by id.
    pub async fn upsert(&self, contact: ContactRecord) -> StoredContact {
        let stored = StoredContact {
            contact,
            updated_at: Utc::now(),
        };
        let mut contacts = self.contacts.lock().await;
        contacts.insert(stored.contact.id.clone(), stored.clone());
        stored
    }

    pub async fn get(&self, id: &str) -> Option<StoredContact> {
        let contacts = self.contacts.lock().await;
        contacts.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> bool {
        let mut contacts = self.contacts.lock().await;
        contacts.remove(id).is_some()
    }

    /// All contacts ordered by id.
    pub async fn list(&self) -> Vec<StoredContact> {
        let contacts = self.contacts.lock().await;
        let mut all: Vec<StoredContact> = contacts.values().cloned().collect();
        all.sort_by(|a, b| a.contact.id.cmp(&b.contact.id));
        all
    }

    /// Candidate pool for `id`: every other contact, ordered by id.
    pub async fn all_except(&self, id: &str) -> Vec<ContactRecord> {
        let contacts = self.contacts.lock().await;
        let mut pool: Vec<ContactRecord> = contacts
            .values()
            .filter(|stored| stored.contact.id != id)
            .map(|stored| stored.contact.clone())
            .collect();
        pool.sort_by(|a, b| a.id.cmp(&b.id));
        pool
    }
}
