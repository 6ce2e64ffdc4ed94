//! Configuration handler logic shared by every HTTP front end.
//!
//! Framework-specific code (Axum on Linux, the microcontroller's HTTP server)
//! wraps these calls with its own request/response types.

use tracing::{error, info, warn};

use crate::config::{defaults, ConfigurationRecord};
use crate::form::{apply_form, FormReport};
use crate::persist::{LoadSource, PersistError, PersistenceStore};
use crate::store::NonVolatileStore;

/// The live configuration together with its durable copy.
pub struct ConfigService<S> {
    persistence: PersistenceStore<S>,
    record: ConfigurationRecord,
    boot_source: LoadSource,
}

impl<S: NonVolatileStore> ConfigService<S> {
    /// Load the configuration from `store`, restoring factory defaults if needed.
    pub fn boot(store: S) -> Self {
        let mut persistence = PersistenceStore::new(store);
        let loaded = persistence.load();
        match loaded.source {
            LoadSource::Stored { slot, sequence } => {
                info!(slot, sequence, host = %loaded.record.host_name, "configuration restored")
            }
            LoadSource::FactoryReset { reason, repaired } => {
                info!(?reason, repaired, "running with factory defaults")
            }
        }

        Self {
            persistence,
            record: loaded.record,
            boot_source: loaded.source,
        }
    }

    /// The current configuration.
    pub fn record(&self) -> &ConfigurationRecord {
        &self.record
    }

    /// How the configuration was obtained at boot.
    pub fn boot_source(&self) -> LoadSource {
        self.boot_source
    }

    /// Apply a form submission and persist the result.
    ///
    /// The in-memory record is updated even when the save fails; the error
    /// tells the operator that the change will not survive a reboot.
    pub fn submit<K, V>(&mut self, fields: &[(K, V)]) -> Result<FormReport, PersistError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let report = apply_form(&mut self.record, fields);
        for rejected in &report.rejected {
            warn!("form field rejected: {}", rejected);
        }
        for field in &report.truncated {
            warn!(field, "form value truncated to field bound");
        }

        self.persist()?;
        Ok(report)
    }

    /// Replace the configuration with factory defaults and persist them.
    pub fn factory_reset(&mut self) -> Result<(), PersistError> {
        self.record = defaults();
        self.persist()
    }

    pub fn persistence(&self) -> &PersistenceStore<S> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut PersistenceStore<S> {
        &mut self.persistence
    }

    fn persist(&mut self) -> Result<(), PersistError> {
        self.persistence.save(&self.record).map_err(|e| {
            error!("configuration not saved, it will be lost on reboot: {}", e);
            e
        })
    }
}
