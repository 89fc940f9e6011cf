use soroban_sdk::{Env, Map, String, Vec};

use crud_lib::{LeaseSlot, Record, RECORD_TTL_EXTEND, RECORD_TTL_THRESHOLD};

use crate::storage::DataKey;

/// Primary record store, addressed by `(uuid, key)`.
pub trait RecordStore {
    fn get(&self, uuid: &String, key: &String) -> Option<Record>;
    fn set(&self, uuid: &String, key: &String, record: &Record);
    fn remove(&self, uuid: &String, key: &String);
    fn has(&self, uuid: &String, key: &String) -> bool;
    /// Every live record of the namespace, in key order.
    fn entries(&self, uuid: &String) -> Vec<(String, Record)>;
    fn count(&self, uuid: &String) -> u32;
    /// Moves the record at `key` to `new_key`. Returns `false` and leaves the
    /// store untouched if `key` is absent or `new_key` is taken.
    fn rename(&self, uuid: &String, key: &String, new_key: &String) -> bool;
}

/// Expiry-ordered index over the records of each namespace.
pub trait LeaseIndex {
    fn insert(&self, uuid: &String, expiry: i64, key: &String);
    fn remove(&self, uuid: &String, expiry: i64, key: &String);
    /// Up to `n` accepted slots, soonest expiry first. Ties break by key.
    fn soonest<F>(&self, uuid: &String, n: u32, accept: F) -> Vec<LeaseSlot>
    where
        F: FnMut(&LeaseSlot) -> bool;
    /// Every slot of the namespace, soonest expiry first.
    fn slots(&self, uuid: &String) -> Vec<LeaseSlot>;
}

/// `RecordStore` over contract persistent storage.
///
/// Each record is its own entry. A per-namespace directory of keys provides
/// enumeration, which persistent storage lacks.
pub struct PersistentRecordStore {
    env: Env,
}

impl PersistentRecordStore {
    pub fn new(env: Env) -> Self {
        Self { env }
    }

    fn directory(&self, uuid: &String) -> Map<String, bool> {
        self.env
            .storage()
            .persistent()
            .get(&DataKey::Directory(uuid.clone()))
            .unwrap_or_else(|| Map::new(&self.env))
    }

    fn save_directory(&self, uuid: &String, directory: &Map<String, bool>) {
        let key = DataKey::Directory(uuid.clone());
        if directory.is_empty() {
            self.env.storage().persistent().remove(&key);
        } else {
            self.env.storage().persistent().set(&key, directory);
            self.env
                .storage()
                .persistent()
                .extend_ttl(&key, RECORD_TTL_THRESHOLD, RECORD_TTL_EXTEND);
        }
    }
}

impl RecordStore for PersistentRecordStore {
    fn get(&self, uuid: &String, key: &String) -> Option<Record> {
        self.env
            .storage()
            .persistent()
            .get(&DataKey::Record(uuid.clone(), key.clone()))
    }

    fn set(&self, uuid: &String, key: &String, record: &Record) {
        let entry = DataKey::Record(uuid.clone(), key.clone());
        let fresh = !self.env.storage().persistent().has(&entry);

        self.env.storage().persistent().set(&entry, record);
        self.env
            .storage()
            .persistent()
            .extend_ttl(&entry, RECORD_TTL_THRESHOLD, RECORD_TTL_EXTEND);

        if fresh {
            let mut directory = self.directory(uuid);
            directory.set(key.clone(), true);
            self.save_directory(uuid, &directory);
        }
    }

    fn remove(&self, uuid: &String, key: &String) {
        let entry = DataKey::Record(uuid.clone(), key.clone());
        if !self.env.storage().persistent().has(&entry) {
            return;
        }
        self.env.storage().persistent().remove(&entry);

        let mut directory = self.directory(uuid);
        directory.remove(key.clone());
        self.save_directory(uuid, &directory);
    }

    fn has(&self, uuid: &String, key: &String) -> bool {
        self.env
            .storage()
            .persistent()
            .has(&DataKey::Record(uuid.clone(), key.clone()))
    }

    fn entries(&self, uuid: &String) -> Vec<(String, Record)> {
        let mut entries = Vec::new(&self.env);
        for key in self.directory(uuid).keys().iter() {
            if let Some(record) = self.get(uuid, &key) {
                entries.push_back((key, record));
            }
        }
        entries
    }

    fn count(&self, uuid: &String) -> u32 {
        self.directory(uuid).len()
    }

    fn rename(&self, uuid: &String, key: &String, new_key: &String) -> bool {
        if key == new_key || self.has(uuid, new_key) {
            return false;
        }
        let record = match self.get(uuid, key) {
            Some(record) => record,
            None => return false,
        };

        self.remove(uuid, key);
        self.set(uuid, new_key, &record);
        true
    }
}

/// `LeaseIndex` over contract persistent storage: one ordered map per
/// namespace keyed by `(expiry, key)`.
pub struct PersistentLeaseIndex {
    env: Env,
}

impl PersistentLeaseIndex {
    pub fn new(env: Env) -> Self {
        Self { env }
    }

    fn load(&self, uuid: &String) -> Map<(i64, String), bool> {
        self.env
            .storage()
            .persistent()
            .get(&DataKey::LeaseIndex(uuid.clone()))
            .unwrap_or_else(|| Map::new(&self.env))
    }

    fn save(&self, uuid: &String, index: &Map<(i64, String), bool>) {
        let key = DataKey::LeaseIndex(uuid.clone());
        if index.is_empty() {
            self.env.storage().persistent().remove(&key);
        } else {
            self.env.storage().persistent().set(&key, index);
            self.env
                .storage()
                .persistent()
                .extend_ttl(&key, RECORD_TTL_THRESHOLD, RECORD_TTL_EXTEND);
        }
    }
}

impl LeaseIndex for PersistentLeaseIndex {
    fn insert(&self, uuid: &String, expiry: i64, key: &String) {
        let mut index = self.load(uuid);
        index.set((expiry, key.clone()), true);
        self.save(uuid, &index);
    }

    fn remove(&self, uuid: &String, expiry: i64, key: &String) {
        let mut index = self.load(uuid);
        if index.remove((expiry, key.clone())).is_some() {
            self.save(uuid, &index);
        }
    }

    fn soonest<F>(&self, uuid: &String, n: u32, mut accept: F) -> Vec<LeaseSlot>
    where
        F: FnMut(&LeaseSlot) -> bool,
    {
        let mut slots = Vec::new(&self.env);
        for ((expiry, key), _) in self.load(uuid).iter() {
            if slots.len() >= n {
                break;
            }
            let slot = LeaseSlot { expiry, key };
            if accept(&slot) {
                slots.push_back(slot);
            }
        }
        slots
    }

    fn slots(&self, uuid: &String) -> Vec<LeaseSlot> {
        self.soonest(uuid, u32::MAX, |_| true)
    }
}
