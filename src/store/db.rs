//! JSON-file-backed document store.
//!
//! The whole data set is one JSON object of named collections, each an array
//! of records. Per-build mirror tables are held in an explicit map keyed by
//! build id rather than as string-interpolated collection names; on disk they
//! are still written as `dataTable<N>` keys so existing `db.json` files load
//! unchanged.
//!
//! All access goes through a single mutex, and every mutation persists the
//! full document before returning. A build-plus-mirror update inside one
//! `with_write` closure is therefore a single atomic step with respect to
//! other requests and to the file on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};

use super::error::StoreError;

/// In-memory form of the persisted JSON document.
#[derive(Debug, Default, Clone)]
pub struct Database {
    collections: BTreeMap<String, Vec<Value>>,
    data_tables: BTreeMap<i64, Vec<Value>>,
}

/// Parse a `dataTable<N>` collection name into its build id.
pub fn mirror_table_id(name: &str) -> Option<i64> {
    name.strip_prefix("dataTable")
        .filter(|suffix| !suffix.is_empty())
        .and_then(|suffix| suffix.parse::<i64>().ok())
}

/// Compare a record's `id` field against a raw path segment.
///
/// Numeric ids compare numerically, anything else (uuid strings from the
/// fixture generator) compares as a string.
pub fn record_id_matches(record: &Value, raw: &str) -> bool {
    match record.get("id") {
        Some(Value::Number(n)) => raw.parse::<i64>().ok() == n.as_i64(),
        Some(Value::String(s)) => s == raw,
        _ => false,
    }
}

impl Database {
    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        let root = match value {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::InvalidDocument(format!(
                    "expected top-level object, got {}",
                    type_name(&other)
                )))
            }
        };

        let mut db = Database::default();
        for (name, value) in root {
            let rows = match value {
                Value::Array(rows) => rows,
                other => {
                    return Err(StoreError::InvalidDocument(format!(
                        "collection '{}' must be an array, got {}",
                        name,
                        type_name(&other)
                    )))
                }
            };

            match mirror_table_id(&name) {
                Some(build_id) => {
                    db.data_tables.insert(build_id, rows);
                }
                None => {
                    db.collections.insert(name, rows);
                }
            }
        }

        Ok(db)
    }

    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        for (name, rows) in &self.collections {
            root.insert(name.clone(), Value::Array(rows.clone()));
        }
        for (build_id, rows) in &self.data_tables {
            root.insert(format!("dataTable{}", build_id), Value::Array(rows.clone()));
        }
        Value::Object(root)
    }

    /// Records of a named collection; `dataTable<N>` names resolve to the
    /// keyed mirror table.
    pub fn collection(&self, name: &str) -> Option<&Vec<Value>> {
        match mirror_table_id(name) {
            Some(build_id) => self.data_tables.get(&build_id),
            None => self.collections.get(name),
        }
    }

    pub fn collection_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        match mirror_table_id(name) {
            Some(build_id) => self.data_tables.get_mut(&build_id),
            None => self.collections.get_mut(name),
        }
    }

    /// Get or create a plain collection. Mirror tables are never created
    /// through this path; dataTable writes own them.
    pub fn collection_entry(&mut self, name: &str) -> &mut Vec<Value> {
        self.collections.entry(name.to_string()).or_default()
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.collection(name).is_some()
    }

    pub fn find_record(&self, name: &str, raw_id: &str) -> Option<&Value> {
        self.collection(name)?
            .iter()
            .find(|record| record_id_matches(record, raw_id))
    }

    pub fn find_position(&self, name: &str, raw_id: &str) -> Option<usize> {
        self.collection(name)?
            .iter()
            .position(|record| record_id_matches(record, raw_id))
    }

    pub fn data_table(&self, build_id: i64) -> Option<&Vec<Value>> {
        self.data_tables.get(&build_id)
    }

    pub fn data_table_mut(&mut self, build_id: i64) -> Option<&mut Vec<Value>> {
        self.data_tables.get_mut(&build_id)
    }

    pub fn has_data_table(&self, build_id: i64) -> bool {
        self.data_tables.contains_key(&build_id)
    }

    /// Create or fully replace the mirror table for a build.
    pub fn set_data_table(&mut self, build_id: i64, rows: Vec<Value>) {
        self.data_tables.insert(build_id, rows);
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Handle to the store, shared by every request through the router state.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    pretty: bool,
    inner: Mutex<Database>,
}

impl JsonStore {
    /// Open the store at `path`. A missing file starts an empty data set;
    /// the file is created on the first write.
    pub fn open(path: impl AsRef<Path>, pretty: bool) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let db = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let value: Value = serde_json::from_str(&raw)?;
            Database::from_value(value)?
        } else {
            tracing::warn!("store file {} does not exist, starting empty", path.display());
            Database::default()
        };

        Ok(Self {
            path,
            pretty,
            inner: Mutex::new(db),
        })
    }

    /// Read-only access under the store lock.
    pub fn read<R>(&self, f: impl FnOnce(&Database) -> R) -> R {
        let db = self.inner.lock().expect("store lock poisoned");
        f(&db)
    }

    /// Mutate the data set and persist it as one step. The closure's
    /// changes are only visible to other requests once the file write
    /// has succeeded.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut Database) -> R) -> Result<R, StoreError> {
        let mut db = self.inner.lock().expect("store lock poisoned");
        let snapshot = db.clone();
        let result = f(&mut db);

        if let Err(err) = self.persist(&db) {
            // Roll back the in-memory state so memory and disk stay in step.
            *db = snapshot;
            return Err(err);
        }

        Ok(result)
    }

    /// Fallible variant of [`with_write`]: the mutation commits and
    /// persists only when the closure returns `Ok`. An `Err` restores the
    /// pre-closure state, so a validation failure halfway through a
    /// multi-collection update leaves nothing behind.
    ///
    /// [`with_write`]: JsonStore::with_write
    pub fn try_write<T, E>(
        &self,
        f: impl FnOnce(&mut Database) -> Result<T, E>,
    ) -> Result<Result<T, E>, StoreError> {
        let mut db = self.inner.lock().expect("store lock poisoned");
        let snapshot = db.clone();

        match f(&mut db) {
            Ok(value) => {
                if let Err(err) = self.persist(&db) {
                    *db = snapshot;
                    return Err(err);
                }
                Ok(Ok(value))
            }
            Err(err) => {
                *db = snapshot;
                Ok(Err(err))
            }
        }
    }

    fn persist(&self, db: &Database) -> Result<(), StoreError> {
        let value = db.to_value();
        let raw = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };

        // Write-then-rename so a crash mid-write never truncates the store.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
