use alloc::vec::Vec as StdVec;

use soroban_sdk::String;

use crud_lib::{CrudError, Record};

use crate::repository::{LeaseIndex, RecordStore};

/// One buffered write against the record store or the lease index.
#[derive(Clone)]
enum StagedOp {
    Put(String, Record),
    Remove(String),
    Move(String, String),
    Index(i64, String),
    Unindex(i64, String),
}

/// Writes of a single operation, held in memory until every check has
/// passed, then applied to both stores in staging order.
///
/// A record write and its paired index change always land in the same
/// commit; their relative order within it is not significant.
pub struct StagedBatch {
    uuid: String,
    ops: StdVec<StagedOp>,
}

impl StagedBatch {
    pub fn new(uuid: &String) -> Self {
        Self {
            uuid: uuid.clone(),
            ops: StdVec::new(),
        }
    }

    pub fn uuid(&self) -> &String {
        &self.uuid
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn put(&mut self, key: &String, record: Record) {
        self.ops.push(StagedOp::Put(key.clone(), record));
    }

    pub fn remove(&mut self, key: &String) {
        self.ops.push(StagedOp::Remove(key.clone()));
    }

    pub fn move_key(&mut self, key: &String, new_key: &String) {
        self.ops.push(StagedOp::Move(key.clone(), new_key.clone()));
    }

    pub fn index(&mut self, expiry: i64, key: &String) {
        self.ops.push(StagedOp::Index(expiry, key.clone()));
    }

    pub fn unindex(&mut self, expiry: i64, key: &String) {
        self.ops.push(StagedOp::Unindex(expiry, key.clone()));
    }

    /// Applies every staged write. A refused move stops the commit; the
    /// host discards whatever was applied before it.
    pub fn commit<S, L>(self, store: &S, index: &L) -> Result<(), CrudError>
    where
        S: RecordStore,
        L: LeaseIndex,
    {
        let uuid = self.uuid;
        for op in self.ops {
            match op {
                StagedOp::Put(key, record) => store.set(&uuid, &key, &record),
                StagedOp::Remove(key) => store.remove(&uuid, &key),
                StagedOp::Move(key, new_key) => {
                    if !store.rename(&uuid, &key, &new_key) {
                        return Err(CrudError::InvalidRequest);
                    }
                }
                StagedOp::Index(expiry, key) => index.insert(&uuid, expiry, &key),
                StagedOp::Unindex(expiry, key) => index.remove(&uuid, expiry, &key),
            }
        }
        Ok(())
    }
}
