/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Persistent configuration store.
//!
//! Four independent records live behind a [`StorageBackend`]: the current
//! per-category configuration, a legacy single-hostname record (migrated on
//! read, deleted on the next write), advisory software info, and a
//! session-scoped pending-redirect slot with read-once semantics.
//!
//! Every operation is total. Backend faults are absorbed with a `warn!` and
//! degrade to defaults. Persistence being unavailable must never surface as
//! an error to the redirect flow.

pub mod types;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use log::warn;
use redb::{ReadableDatabase, ReadableTable};

use crate::domain;
use types::{ContentCategory, HomeConfiguration, RedirectDelay, SoftwareInfo};

pub const CONFIG_RECORD: &str = "webap_config";
pub const LEGACY_HOME_RECORD: &str = "webap_home_instance";
pub const SOFTWARE_RECORD: &str = "webap_software";
pub const PENDING_REDIRECT_RECORD: &str = "webap_pending_redirect";

const RECORDS_TABLE: redb::TableDefinition<&str, &str> = redb::TableDefinition::new("records");
const SESSION_TABLE: redb::TableDefinition<&str, &str> = redb::TableDefinition::new("session");

#[derive(Debug)]
pub enum StoreError {
    Io(String),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "IO error: {e}"),
            StoreError::Backend(e) => write!(f, "Storage error: {e}"),
        }
    }
}

/// Whether a record outlives the current navigation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordScope {
    Durable,
    Session,
}

/// Raw record access. Implementations absorb their own faults: a failed read
/// is `None`, a failed write returns `false` and has no effect.
pub trait StorageBackend {
    fn get(&self, scope: RecordScope, key: &str) -> Option<String>;
    fn set(&mut self, scope: RecordScope, key: &str, value: &str) -> bool;
    fn remove(&mut self, scope: RecordScope, key: &str) -> bool;
}

/// Durable backend over a redb database: one table for durable records, one
/// for session records. The session table is wiped when the store opens, so
/// one process lifetime is one navigation session.
pub struct RedbBackend {
    db: redb::Database,
}

impl RedbBackend {
    pub fn open(base_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(base_dir)
            .map_err(|e| StoreError::Io(format!("Failed to create dir: {e}")))?;
        let db = redb::Database::create(base_dir.join("records.redb"))
            .map_err(|e| StoreError::Backend(format!("{e}")))?;

        // Fresh session: drop leftovers from a previous process and make
        // sure both tables exist.
        let write_txn = db
            .begin_write()
            .map_err(|e| StoreError::Backend(format!("{e}")))?;
        let _ = write_txn.delete_table(SESSION_TABLE);
        {
            write_txn
                .open_table(RECORDS_TABLE)
                .map_err(|e| StoreError::Backend(format!("{e}")))?;
            write_txn
                .open_table(SESSION_TABLE)
                .map_err(|e| StoreError::Backend(format!("{e}")))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::Backend(format!("{e}")))?;

        Ok(Self { db })
    }

    fn table_def(scope: RecordScope) -> redb::TableDefinition<'static, &'static str, &'static str> {
        match scope {
            RecordScope::Durable => RECORDS_TABLE,
            RecordScope::Session => SESSION_TABLE,
        }
    }
}

impl StorageBackend for RedbBackend {
    fn get(&self, scope: RecordScope, key: &str) -> Option<String> {
        let read_txn = match self.db.begin_read() {
            Ok(txn) => txn,
            Err(e) => {
                warn!("Failed to start read transaction: {e}");
                return None;
            },
        };
        let Ok(table) = read_txn.open_table(Self::table_def(scope)) else {
            return None;
        };
        match table.get(key) {
            Ok(value) => value.map(|guard| guard.value().to_string()),
            Err(e) => {
                warn!("Failed to read record {key}: {e}");
                None
            },
        }
    }

    fn set(&mut self, scope: RecordScope, key: &str, value: &str) -> bool {
        let outcome = (|| -> Result<(), String> {
            let write_txn = self.db.begin_write().map_err(|e| format!("{e}"))?;
            {
                let mut table = write_txn
                    .open_table(Self::table_def(scope))
                    .map_err(|e| format!("{e}"))?;
                table.insert(key, value).map_err(|e| format!("{e}"))?;
            }
            write_txn.commit().map_err(|e| format!("{e}"))
        })();

        if let Err(e) = outcome {
            warn!("Failed to write record {key}: {e}");
            return false;
        }
        true
    }

    fn remove(&mut self, scope: RecordScope, key: &str) -> bool {
        let outcome = (|| -> Result<(), String> {
            let write_txn = self.db.begin_write().map_err(|e| format!("{e}"))?;
            {
                let mut table = write_txn
                    .open_table(Self::table_def(scope))
                    .map_err(|e| format!("{e}"))?;
                table.remove(key).map_err(|e| format!("{e}"))?;
            }
            write_txn.commit().map_err(|e| format!("{e}"))
        })();

        if let Err(e) = outcome {
            warn!("Failed to remove record {key}: {e}");
            return false;
        }
        true
    }
}

/// In-memory backend: the storage-unavailable degradation path, and the
/// standard test double.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    durable: HashMap<String, String>,
    session: HashMap<String, String>,
}

impl MemoryBackend {
    fn records(&self, scope: RecordScope) -> &HashMap<String, String> {
        match scope {
            RecordScope::Durable => &self.durable,
            RecordScope::Session => &self.session,
        }
    }

    fn records_mut(&mut self, scope: RecordScope) -> &mut HashMap<String, String> {
        match scope {
            RecordScope::Durable => &mut self.durable,
            RecordScope::Session => &mut self.session,
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, scope: RecordScope, key: &str) -> Option<String> {
        self.records(scope).get(key).cloned()
    }

    fn set(&mut self, scope: RecordScope, key: &str, value: &str) -> bool {
        self.records_mut(scope)
            .insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&mut self, scope: RecordScope, key: &str) -> bool {
        self.records_mut(scope).remove(key);
        true
    }
}

/// The sole owner of persisted state. Every other component reads through
/// this store or requests mutation via its operations.
pub struct ConfigStore {
    backend: Box<dyn StorageBackend>,
}

impl ConfigStore {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::default()))
    }

    /// Open the durable store, degrading to a session-only in-memory store
    /// when the environment denies persistence.
    pub fn open_or_memory(base_dir: &Path) -> Self {
        match RedbBackend::open(base_dir) {
            Ok(backend) => Self::new(Box::new(backend)),
            Err(e) => {
                warn!("Persistent storage unavailable, continuing session-only: {e}");
                Self::in_memory()
            },
        }
    }

    /// Current configuration. Falls back through one-time legacy migration
    /// (all six categories populated from the old single-hostname record),
    /// then pristine defaults. A corrupted record reads as defaults.
    pub fn config(&self) -> HomeConfiguration {
        if let Some(raw) = self.backend.get(RecordScope::Durable, CONFIG_RECORD) {
            return match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Unreadable configuration record, using defaults: {e}");
                    HomeConfiguration::default()
                },
            };
        }
        if let Some(legacy) = self.backend.get(RecordScope::Durable, LEGACY_HOME_RECORD) {
            return HomeConfiguration::with_all_categories(&legacy, RedirectDelay::DEFAULT);
        }
        HomeConfiguration::default()
    }

    /// Persist a configuration verbatim. A successful write also retires the
    /// legacy record.
    pub fn set_config(&mut self, config: &HomeConfiguration) -> bool {
        let raw = match serde_json::to_string(config) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize configuration: {e}");
                return false;
            },
        };
        if !self.backend.set(RecordScope::Durable, CONFIG_RECORD, &raw) {
            return false;
        }
        self.backend.remove(RecordScope::Durable, LEGACY_HOME_RECORD);
        true
    }

    /// The general home instance: first configured category in priority
    /// order social, community, photo, video, music, blog.
    pub fn home_instance(&self) -> Option<String> {
        self.config().first_instance().map(str::to_string)
    }

    /// Category-specific instance, else the general home instance.
    pub fn instance_for(&self, category: ContentCategory) -> Option<String> {
        let config = self.config();
        config
            .instance(category)
            .map(str::to_string)
            .or_else(|| config.first_instance().map(str::to_string))
    }

    /// Bulk "set everything to this instance": normalizes the domain and, if
    /// non-empty, writes it into all six categories, preserving the existing
    /// delay. Returns the normalized domain, or `None` for empty input.
    pub fn set_home_instance(&mut self, domain: &str) -> Option<String> {
        let normalized = domain::normalize(domain);
        if normalized.is_empty() {
            return None;
        }
        let delay = self.config().delay;
        let config = HomeConfiguration::with_all_categories(&normalized, delay);
        if !self.set_config(&config) {
            return None;
        }
        Some(normalized)
    }

    /// Full reset: erases configuration, legacy, and software-info records.
    pub fn clear_home_instance(&mut self) -> bool {
        let legacy = self.backend.remove(RecordScope::Durable, LEGACY_HOME_RECORD);
        let config = self.backend.remove(RecordScope::Durable, CONFIG_RECORD);
        let software = self.backend.remove(RecordScope::Durable, SOFTWARE_RECORD);
        legacy && config && software
    }

    /// Advisory software info; corrupted or absent storage reads as empty.
    pub fn software_info(&self) -> SoftwareInfo {
        let Some(raw) = self.backend.get(RecordScope::Durable, SOFTWARE_RECORD) else {
            return SoftwareInfo::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Unreadable software record, treating as no info: {e}");
            SoftwareInfo::default()
        })
    }

    pub fn set_software_info(&mut self, info: &SoftwareInfo) -> bool {
        let raw = match serde_json::to_string(info) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize software info: {e}");
                return false;
            },
        };
        self.backend.set(RecordScope::Durable, SOFTWARE_RECORD, &raw)
    }

    pub fn set_home_software(&mut self, software: Option<&str>) -> bool {
        let mut info = self.software_info();
        info.home = software.map(str::to_string);
        self.set_software_info(&info)
    }

    pub fn set_category_software(
        &mut self,
        category: ContentCategory,
        software: Option<&str>,
    ) -> bool {
        let mut info = self.software_info();
        info.categories
            .insert(category, software.map(str::to_string));
        self.set_software_info(&info)
    }

    pub fn delay(&self) -> RedirectDelay {
        self.config().delay
    }

    /// Record the target awaiting redirection once a home instance exists.
    pub fn set_pending_redirect(&mut self, target: &str) {
        self.backend
            .set(RecordScope::Session, PENDING_REDIRECT_RECORD, target);
    }

    /// Read-once: destructively consumes the pending value so a later
    /// unrelated page load never replays a stale redirect.
    pub fn take_pending_redirect(&mut self) -> Option<String> {
        let target = self
            .backend
            .get(RecordScope::Session, PENDING_REDIRECT_RECORD)?;
        self.backend
            .remove(RecordScope::Session, PENDING_REDIRECT_RECORD);
        Some(target)
    }

    #[cfg(test)]
    pub(crate) fn remove_raw_record(&mut self, scope: RecordScope, key: &str) {
        self.backend.remove(scope, key);
    }
}
