use std::sync::Arc;

use tokio::sync::Mutex;

use crate::dashboard::Dashboard;
use crate::formats::BookRecord;
use crate::ingest::{self, NewBook};
use crate::lookup::MetadataLookup;
use crate::store::{RecordStore, StoreError};

/// Shared configuration for web requests.
///
/// Nothing read from the store is kept between requests. The gate lets one
/// load/mutate/persist pass finish before the next one starts; it does not
/// protect against other processes writing the same file.
#[derive(Clone)]
pub struct AppState {
    store: Arc<RecordStore>,
    lookup: Arc<dyn MetadataLookup>,
    since_year: i32,
    gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: RecordStore, lookup: Arc<dyn MetadataLookup>, since_year: i32) -> Self {
        Self {
            store: Arc::new(store),
            lookup,
            since_year,
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub async fn dashboard(&self) -> Result<Dashboard, StoreError> {
        let _turn = self.gate.lock().await;
        let records = self.with_store(|store| store.load()).await?;
        Ok(Dashboard::build(
            &records,
            ingest::current_year(),
            self.since_year,
        ))
    }

    pub async fn add_book(&self, input: NewBook) -> Result<BookRecord, StoreError> {
        let _turn = self.gate.lock().await;
        let collection = self.with_store(|store| store.load()).await?;
        let record =
            ingest::create_record(self.lookup.as_ref(), input, ingest::current_year()).await;
        let stored = record.clone();
        self.with_store(move |store| store.append_and_persist(collection, stored))
            .await?;
        tracing::info!(title = %record.title, author = %record.author, "book added");
        Ok(record)
    }

    /// Runs blocking file I/O on the blocking thread pool.
    async fn with_store<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&RecordStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || op(&store)).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(StoreError::Unavailable {
                path: self.store.path().to_path_buf(),
                reason: format!("store task cancelled: {err}"),
            }),
        }
    }
}
