use crate::domain::ports::SecretStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding device secrets.
pub const CF_SECRETS: &str = "secrets";

/// A persistent secret store implementation using RocksDB.
///
/// Values are stored as UTF-8 under their key in the "secrets" column
/// family. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBSecretStore {
    db: Arc<DB>,
}

impl RocksDBSecretStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_secrets = ColumnFamilyDescriptor::new(CF_SECRETS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_secrets])
            .map_err(|e| PaymentError::Storage(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl SecretStore for RocksDBSecretStore {
    async fn get_secret(&self, key: &str) -> Result<Option<String>> {
        let cf = self
            .db
            .cf_handle(CF_SECRETS)
            .ok_or_else(|| PaymentError::Storage("Secrets column family not found".to_string()))?;

        let value = self
            .db
            .get_cf(&cf, key.as_bytes())
            .map_err(|e| PaymentError::Storage(e.to_string()))?;

        value
            .map(|bytes| {
                String::from_utf8(bytes).map_err(|e| {
                    PaymentError::Storage(format!("Secret `{key}` is not valid UTF-8: {e}"))
                })
            })
            .transpose()
    }

    async fn set_secret(&self, key: &str, value: &str) -> Result<()> {
        let cf = self
            .db
            .cf_handle(CF_SECRETS)
            .ok_or_else(|| PaymentError::Storage("Secrets column family not found".to_string()))?;

        self.db
            .put_cf(&cf, key.as_bytes(), value.as_bytes())
            .map_err(|e| PaymentError::Storage(e.to_string()))
    }
}
