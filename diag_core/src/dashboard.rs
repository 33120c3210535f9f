//! Dashboard key-value contract.
//!
//! The transport (network tables, a web UI, a file) lives outside this
//! crate; the engine only needs typed get/put on string keys. Reads take a
//! default that is returned when the key is missing or holds another type.

use diag_common::consts::{DEFAULT_KEY_ROOT, keys};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Typed key-value surface the engine reads controls from and publishes to.
pub trait Dashboard {
    fn get_bool(&self, key: &str, default: bool) -> bool;
    fn put_bool(&mut self, key: &str, value: bool);
    fn get_number(&self, key: &str, default: f64) -> f64;
    fn put_number(&mut self, key: &str, value: f64);
    fn get_string(&self, key: &str, default: &str) -> String;
    fn put_string(&mut self, key: &str, value: &str);
}

/// Value stored in a [`MemoryDashboard`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DashValue {
    Bool(bool),
    Number(f64),
    String(String),
}

/// In-process dashboard backed by an ordered map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryDashboard {
    entries: BTreeMap<String, DashValue>,
}

impl MemoryDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&DashValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All entries in key order.
    pub fn entries(&self) -> &BTreeMap<String, DashValue> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn put(&mut self, key: &str, value: DashValue) {
        match self.entries.get_mut(key) {
            Some(slot) => *slot = value,
            None => {
                self.entries.insert(key.to_string(), value);
            }
        }
    }
}

impl Dashboard for MemoryDashboard {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.entries.get(key) {
            Some(DashValue::Bool(v)) => *v,
            _ => default,
        }
    }

    fn put_bool(&mut self, key: &str, value: bool) {
        self.put(key, DashValue::Bool(value));
    }

    fn get_number(&self, key: &str, default: f64) -> f64 {
        match self.entries.get(key) {
            Some(DashValue::Number(v)) => *v,
            _ => default,
        }
    }

    fn put_number(&mut self, key: &str, value: f64) {
        self.put(key, DashValue::Number(value));
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.entries.get(key) {
            Some(DashValue::String(v)) => v.clone(),
            _ => default.to_string(),
        }
    }

    fn put_string(&mut self, key: &str, value: &str) {
        self.put(key, DashValue::String(value.to_string()));
    }
}

// ─── Key layout ─────────────────────────────────────────────────────

/// Builds `<root>/<field>` and `<root>/<device>/<field>` keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    root: String,
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_ROOT)
    }
}

impl KeySpace {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn global(&self, field: &str) -> String {
        format!("{}/{}", self.root, field)
    }

    pub fn device(&self, device: &str, field: &str) -> String {
        format!("{}/{}/{}", self.root, device, field)
    }

    /// `UseTerm_<terminator>` key of a binding.
    pub fn use_term(&self, device: &str, terminator: &str) -> String {
        format!("{}/{}/{}{}", self.root, device, keys::USE_TERM_PREFIX, terminator)
    }
}

/// Precomputed per-device keys.
#[derive(Debug, Clone)]
pub struct DeviceKeys {
    pub enable: String,
    pub retry: String,
    pub last_status_hex: String,
    pub health: String,
    pub summary: String,
    pub state: String,
    pub debug_state: String,
}

impl DeviceKeys {
    pub fn new(space: &KeySpace, device: &str) -> Self {
        Self {
            enable: space.device(device, keys::ENABLE),
            retry: space.device(device, keys::RETRY),
            last_status_hex: space.device(device, keys::LAST_STATUS_HEX),
            health: space.device(device, keys::HEALTH),
            summary: space.device(device, keys::STATUS_SUMMARY),
            state: space.device(device, keys::STATE),
            debug_state: space.device(device, keys::DEBUG_STATE),
        }
    }
}

/// Precomputed global run keys.
#[derive(Debug, Clone)]
pub struct RunKeys {
    pub start_test: String,
    pub stop_test: String,
    pub run_id: String,
    pub run_active: String,
    pub run_start_time_sec: String,
}

impl RunKeys {
    pub fn new(space: &KeySpace) -> Self {
        Self {
            start_test: space.global(keys::START_TEST),
            stop_test: space.global(keys::STOP_TEST),
            run_id: space.global(keys::RUN_ID),
            run_active: space.global(keys::RUN_ACTIVE),
            run_start_time_sec: space.global(keys::RUN_START_TIME_SEC),
        }
    }
}
