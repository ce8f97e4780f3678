use async_trait::async_trait;

use crate::error::VisitError;

/// One user's visit counter as persisted in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    pub user: String,
    pub count: u64,
}

impl VisitRecord {
    pub fn new(user: impl Into<String>, count: u64) -> Self {
        Self {
            user: user.into(),
            count,
        }
    }
}

/// Key-value store holding at most one `VisitRecord` per user.
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Point lookup by user.
    async fn get(&self, user: &str) -> Result<Option<VisitRecord>, VisitError>;

    /// Full upsert, replacing any record for the same user.
    async fn put(&self, record: &VisitRecord) -> Result<(), VisitError>;

    /// Adds exactly one to the user's count in a single atomic step,
    /// treating an absent record as zero. Returns the record after the update.
    async fn increment(&self, user: &str) -> Result<VisitRecord, VisitError>;
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct MemoryStore {
        records: Mutex<HashMap<String, u64>>,
        calls: AtomicUsize,
    }

    impl MemoryStore {
        pub(crate) fn with_records(records: &[(&str, u64)]) -> Self {
            let records = records
                .iter()
                .map(|(user, count)| (user.to_string(), *count))
                .collect();
            Self {
                records: Mutex::new(records),
                calls: AtomicUsize::new(0),
            }
        }

        /// Number of store operations performed so far.
        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VisitStore for MemoryStore {
        async fn get(&self, user: &str) -> Result<Option<VisitRecord>, VisitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let records = self.records.lock().await;
            Ok(records.get(user).map(|count| VisitRecord::new(user, *count)))
        }

        async fn put(&self, record: &VisitRecord) -> Result<(), VisitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut records = self.records.lock().await;
            records.insert(record.user.clone(), record.count);
            Ok(())
        }

        async fn increment(&self, user: &str) -> Result<VisitRecord, VisitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut records = self.records.lock().await;
            let count = records.entry(user.to_string()).or_insert(0);
            *count = count
                .checked_add(1)
                .ok_or_else(|| VisitError::CountOverflow(user.to_string()))?;
            Ok(VisitRecord::new(user, *count))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_increment_creates_missing_record() {
            let store = MemoryStore::default();
            assert_eq!(store.get("bob").await.unwrap(), None);

            let record = store.increment("bob").await.unwrap();
            assert_eq!(record, VisitRecord::new("bob", 1));
            assert_eq!(store.get("bob").await.unwrap(), Some(record));
        }

        #[tokio::test]
        async fn test_put_overwrites_existing_record() {
            let store = MemoryStore::with_records(&[("bob", 7)]);
            store.put(&VisitRecord::new("bob", 2)).await.unwrap();
            assert_eq!(store.get("bob").await.unwrap(), Some(VisitRecord::new("bob", 2)));
        }

        #[tokio::test]
        async fn test_increment_overflow_is_an_error() {
            let store = MemoryStore::with_records(&[("bob", u64::MAX)]);
            let err = store.increment("bob").await.unwrap_err();
            assert!(matches!(err, VisitError::CountOverflow(user) if user == "bob"));
            assert_eq!(
                store.get("bob").await.unwrap(),
                Some(VisitRecord::new("bob", u64::MAX))
            );
        }
    }
}
