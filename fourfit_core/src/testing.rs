//! In-memory stand-ins for the REST backend and local storage, used by unit tests.

use crate::{Error, KeyValueStore, MemoryStore, Method, RemoteApi, Result};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Serves the collection and BMI endpoints from memory and records calls
#[derive(Default)]
pub struct FakeBackend {
    collections: RefCell<HashMap<String, Vec<Value>>>,
    bmi_history: RefCell<Vec<Value>>,
    calls: RefCell<Vec<(Method, String)>>,
    next_id: Cell<u32>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.calls.borrow().clone()
    }

    fn not_found(path: &str) -> Error {
        Error::Status {
            status: 404,
            path: path.to_string(),
        }
    }
}

impl RemoteApi for FakeBackend {
    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Option<Value>> {
        self.calls.borrow_mut().push((method, path.to_string()));

        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let mut collections = self.collections.borrow_mut();

        match (method, segments.as_slice()) {
            (Method::Post, ["bmi"]) => {
                let record = body.cloned().unwrap_or(Value::Null);
                self.bmi_history.borrow_mut().push(record.clone());
                Ok(Some(record))
            }
            (Method::Get, ["bmi", "history"]) => {
                Ok(Some(Value::Array(self.bmi_history.borrow().clone())))
            }
            (Method::Get, [name]) => {
                let items = collections.get(*name).cloned().unwrap_or_default();
                Ok(Some(Value::Array(items)))
            }
            (Method::Post, [name]) => {
                let mut record = body.cloned().ok_or_else(|| Self::not_found(path))?;
                self.next_id.set(self.next_id.get() + 1);
                record["id"] = json!(format!("srv-{}", self.next_id.get()));
                collections
                    .entry(name.to_string())
                    .or_default()
                    .push(record.clone());
                Ok(Some(record))
            }
            (Method::Get, [name, id]) => collections
                .get(*name)
                .and_then(|items| items.iter().find(|item| item["id"] == *id))
                .cloned()
                .map(Some)
                .ok_or_else(|| Self::not_found(path)),
            (Method::Put, [name, id]) => {
                let item = collections
                    .get_mut(*name)
                    .and_then(|items| items.iter_mut().find(|item| item["id"] == *id))
                    .ok_or_else(|| Self::not_found(path))?;
                if let (Value::Object(target), Some(Value::Object(patch))) = (&mut *item, body) {
                    for (key, value) in patch {
                        target.insert(key.clone(), value.clone());
                    }
                }
                Ok(Some(item.clone()))
            }
            (Method::Delete, [name, id]) => {
                let items = collections
                    .get_mut(*name)
                    .ok_or_else(|| Self::not_found(path))?;
                let before = items.len();
                items.retain(|item| item["id"] != *id);
                if items.len() == before {
                    return Err(Self::not_found(path));
                }
                Ok(None)
            }
            (Method::Patch, [name, id, "toggle"]) => {
                let item = collections
                    .get_mut(*name)
                    .and_then(|items| items.iter_mut().find(|item| item["id"] == *id))
                    .ok_or_else(|| Self::not_found(path))?;
                let done = item["concluido"].as_bool().unwrap_or(false);
                item["concluido"] = json!(!done);
                Ok(Some(item.clone()))
            }
            _ => Err(Self::not_found(path)),
        }
    }
}

/// Store whose reads succeed but every write fails, like a full or read-only disk
#[derive(Debug, Default)]
pub struct ReadOnlyStore {
    inner: MemoryStore,
}

impl ReadOnlyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, _value: &str) -> Result<()> {
        Err(Error::Store(format!("store is read-only, cannot write {}", key)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        Err(Error::Store(format!("store is read-only, cannot remove {}", key)))
    }
}
