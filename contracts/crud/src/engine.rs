use alloc::vec::Vec as StdVec;

use soroban_sdk::{Address, Bytes, Env, Map, String, Symbol, Vec};

use crud_lib::{
    validation::{
        validate_batch, validate_count, validate_identifier, validate_key_request, validate_value,
    },
    Config, CountResult, CrudError, HasResult, KeyLease, KeyLeasesResult, KeyValue,
    KeyValuesResult, KeysResult, LeaseResult, ReadResult, Record, MAX_NAMESPACE_KEYS,
};

use crate::{
    accountant::LeaseAccountant,
    meter::ResourceMeter,
    repository::{LeaseIndex, RecordStore},
    staging::StagedBatch,
};

/// Per-operation handlers.
///
/// Each handler validates, stages its writes through the `LeaseAccountant`,
/// commits the batch and finally asks the meter for the fee. Nothing is
/// written before every check of the operation has passed.
pub struct TransitionEngine<S, L, M> {
    env: Env,
    store: S,
    index: L,
    meter: M,
    config: Config,
    height: i64,
}

impl<S, L, M> TransitionEngine<S, L, M>
where
    S: RecordStore,
    L: LeaseIndex,
    M: ResourceMeter,
{
    pub fn new(env: Env, store: S, index: L, meter: M, config: Config, height: i64) -> Self {
        Self {
            env,
            store,
            index,
            meter,
            config,
            height,
        }
    }

    fn accountant(&self) -> LeaseAccountant<'_> {
        LeaseAccountant::new(&self.config.curve, self.config.default_lease, self.height)
    }

    /// Loads the record at `(uuid, key)` and checks it belongs to `owner`.
    fn require_owner(&self, uuid: &String, key: &String, owner: &Address) -> Result<Record, CrudError> {
        let record = self.store.get(uuid, key).ok_or(CrudError::NotFound)?;
        if &record.owner != owner {
            return Err(CrudError::Unauthorized);
        }
        Ok(record)
    }

    fn owned_entries(&self, uuid: &String, owner: &Address) -> Vec<(String, Record)> {
        let mut owned = Vec::new(&self.env);
        for (key, record) in self.store.entries(uuid).iter() {
            if &record.owner == owner {
                owned.push_back((key, record));
            }
        }
        owned
    }

    fn publish<D>(&self, name: &str, uuid: &String, data: D)
    where
        D: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
    {
        self.env
            .events()
            .publish((Symbol::new(&self.env, name), uuid.clone()), data);
    }

    /* ---------------- SINGLE KEY ---------------- */

    pub fn create(
        &self,
        uuid: String,
        key: String,
        value: Bytes,
        owner: Address,
        lease: i64,
    ) -> Result<(), CrudError> {
        validate_key_request(&uuid, &key)?;
        validate_value(&value)?;
        if self.store.has(&uuid, &key) {
            return Err(CrudError::AlreadyExists);
        }
        if self.store.count(&uuid) >= MAX_NAMESPACE_KEYS {
            return Err(CrudError::InvalidRequest);
        }

        let accountant = self.accountant();
        let lease = accountant.resolve_lease(lease)?;

        let mut batch = StagedBatch::new(&uuid);
        let fee = accountant.open(&mut batch, &key, value, owner.clone(), lease)?;
        batch.commit(&self.store, &self.index)?;

        self.meter.consume(&uuid, &owner, fee);
        self.publish("created", &uuid, (key, owner, self.height + lease));
        Ok(())
    }

    pub fn read(&self, uuid: String, key: String) -> Result<ReadResult, CrudError> {
        validate_key_request(&uuid, &key)?;
        let record = self.store.get(&uuid, &key).ok_or(CrudError::NotFound)?;

        Ok(ReadResult {
            uuid,
            key,
            value: record.value,
        })
    }

    /// Replaces value and owner. A non-zero `lease_delta` also moves the
    /// lease by that amount; only growth is charged.
    pub fn update(
        &self,
        uuid: String,
        key: String,
        value: Bytes,
        owner: Address,
        lease_delta: i64,
    ) -> Result<(), CrudError> {
        validate_key_request(&uuid, &key)?;
        validate_value(&value)?;
        let old = self.require_owner(&uuid, &key, &owner)?;

        let accountant = self.accountant();
        let mut batch = StagedBatch::new(&uuid);
        let fee = if lease_delta == 0 {
            accountant.rewrite(&mut batch, &key, &old, value, owner.clone());
            0
        } else {
            accountant.extend(&mut batch, &key, &old, value, owner.clone(), lease_delta)?
        };
        batch.commit(&self.store, &self.index)?;

        self.meter.consume(&uuid, &owner, fee);
        self.publish("updated", &uuid, (key, owner, lease_delta));
        Ok(())
    }

    pub fn delete(&self, uuid: String, key: String, owner: Address) -> Result<(), CrudError> {
        validate_key_request(&uuid, &key)?;
        let record = self.require_owner(&uuid, &key, &owner)?;

        let mut batch = StagedBatch::new(&uuid);
        self.accountant().close(&mut batch, &key, &record)?;
        batch.commit(&self.store, &self.index)?;

        self.publish("deleted", &uuid, (key, owner));
        Ok(())
    }

    pub fn rename(
        &self,
        uuid: String,
        key: String,
        new_key: String,
        owner: Address,
    ) -> Result<(), CrudError> {
        validate_key_request(&uuid, &key)?;
        validate_identifier(&new_key)?;
        let record = self.require_owner(&uuid, &key, &owner)?;
        if new_key == key || self.store.has(&uuid, &new_key) {
            return Err(CrudError::InvalidRequest);
        }

        let mut batch = StagedBatch::new(&uuid);
        self.accountant()
            .relocate(&mut batch, &key, &new_key, &record)?;
        batch.commit(&self.store, &self.index)?;

        self.publish("renamed", &uuid, (key, new_key, owner));
        Ok(())
    }

    pub fn has(&self, uuid: String, key: String) -> Result<HasResult, CrudError> {
        validate_key_request(&uuid, &key)?;
        let has = self.store.has(&uuid, &key);
        Ok(HasResult { uuid, key, has })
    }

    /* ---------------- NAMESPACE QUERIES ---------------- */

    pub fn keys(&self, uuid: String, owner: Address) -> Result<KeysResult, CrudError> {
        validate_identifier(&uuid)?;
        let mut keys = Vec::new(&self.env);
        for (key, _) in self.owned_entries(&uuid, &owner).iter() {
            keys.push_back(key);
        }
        Ok(KeysResult { uuid, keys })
    }

    pub fn key_values(&self, uuid: String, owner: Address) -> Result<KeyValuesResult, CrudError> {
        validate_identifier(&uuid)?;
        let mut key_values = Vec::new(&self.env);
        for (key, record) in self.owned_entries(&uuid, &owner).iter() {
            key_values.push_back(KeyValue {
                key,
                value: record.value,
            });
        }
        Ok(KeyValuesResult { uuid, key_values })
    }

    pub fn count(&self, uuid: String, owner: Address) -> Result<CountResult, CrudError> {
        validate_identifier(&uuid)?;
        let count = self.owned_entries(&uuid, &owner).len();
        Ok(CountResult { uuid, count })
    }

    /* ---------------- NAMESPACE MUTATIONS ---------------- */

    /// Removes every record `owner` holds in the namespace.
    pub fn delete_all(&self, uuid: String, owner: Address) -> Result<(), CrudError> {
        validate_identifier(&uuid)?;

        let accountant = self.accountant();
        let mut batch = StagedBatch::new(&uuid);
        let owned = self.owned_entries(&uuid, &owner);
        for (key, record) in owned.iter() {
            accountant.close(&mut batch, &key, &record)?;
        }
        if batch.is_empty() {
            return Ok(());
        }
        batch.commit(&self.store, &self.index)?;

        self.publish("deleted_all", &uuid, (owner, owned.len()));
        Ok(())
    }

    /// All-or-nothing value update of several keys.
    ///
    /// The first pass only reads, collecting every validated write. The
    /// second pass applies them and cannot fail on any precondition. Leases
    /// are left as they are. Every failure reports `InvalidRequest`.
    pub fn multi_update(
        &self,
        uuid: String,
        key_values: Vec<KeyValue>,
        owner: Address,
    ) -> Result<(), CrudError> {
        validate_batch(&uuid, &key_values)?;

        let mut seen: Map<String, bool> = Map::new(&self.env);
        let mut validated: StdVec<(String, Record, Bytes)> = StdVec::new();
        for kv in key_values.iter() {
            if seen.contains_key(kv.key.clone()) {
                return Err(CrudError::InvalidRequest);
            }
            seen.set(kv.key.clone(), true);

            let old = self
                .require_owner(&uuid, &kv.key, &owner)
                .map_err(|_| CrudError::InvalidRequest)?;
            validated.push((kv.key, old, kv.value));
        }

        let accountant = self.accountant();
        let mut batch = StagedBatch::new(&uuid);
        for (key, old, value) in validated {
            accountant.rewrite(&mut batch, &key, &old, value, owner.clone());
        }
        batch.commit(&self.store, &self.index)?;

        self.publish("multi_updated", &uuid, (owner, key_values.len()));
        Ok(())
    }

    /* ---------------- LEASES ---------------- */

    pub fn get_lease(&self, uuid: String, key: String) -> Result<LeaseResult, CrudError> {
        validate_key_request(&uuid, &key)?;
        let record = self.store.get(&uuid, &key).ok_or(CrudError::NotFound)?;

        Ok(LeaseResult {
            uuid,
            key,
            lease: record.remaining_at(self.height),
        })
    }

    /// Up to `n` of `owner`'s keys, soonest expiry first, with the lease
    /// each has left.
    pub fn get_n_shortest_lease(
        &self,
        uuid: String,
        owner: Address,
        n: u32,
    ) -> Result<KeyLeasesResult, CrudError> {
        validate_identifier(&uuid)?;
        validate_count(n)?;

        let slots = self.index.soonest(&uuid, n, |slot| {
            self.store
                .get(&uuid, &slot.key)
                .map(|record| record.owner == owner)
                .unwrap_or(false)
        });

        let mut key_leases = Vec::new(&self.env);
        for slot in slots.iter() {
            key_leases.push_back(KeyLease {
                key: slot.key,
                lease: slot.expiry.saturating_sub(self.height),
            });
        }
        Ok(KeyLeasesResult { uuid, key_leases })
    }

    pub fn renew_lease(
        &self,
        uuid: String,
        key: String,
        owner: Address,
        lease: i64,
    ) -> Result<(), CrudError> {
        validate_key_request(&uuid, &key)?;
        let old = self.require_owner(&uuid, &key, &owner)?;

        let accountant = self.accountant();
        let lease = accountant.resolve_lease(lease)?;

        let mut batch = StagedBatch::new(&uuid);
        let fee = accountant.renew(&mut batch, &key, old, lease)?;
        batch.commit(&self.store, &self.index)?;

        self.meter.consume(&uuid, &owner, fee);
        self.publish("renewed", &uuid, (key, owner, self.height + lease));
        Ok(())
    }

    /// Renews every key `owner` holds in the namespace, in key order. Each
    /// key is charged on its own; the total is consumed once.
    pub fn renew_lease_all(&self, uuid: String, owner: Address, lease: i64) -> Result<(), CrudError> {
        validate_identifier(&uuid)?;
        let owned = self.owned_entries(&uuid, &owner);
        if owned.is_empty() {
            return Err(CrudError::InvalidRequest);
        }

        let accountant = self.accountant();
        let lease = accountant.resolve_lease(lease)?;

        let mut batch = StagedBatch::new(&uuid);
        let mut fee: u64 = 0;
        for (key, record) in owned.iter() {
            let charge = accountant.renew(&mut batch, &key, record, lease)?;
            fee = fee.saturating_add(charge);
        }
        batch.commit(&self.store, &self.index)?;

        self.meter.consume(&uuid, &owner, fee);
        self.publish("renewed", &uuid, (owner, owned.len(), self.height + lease));
        Ok(())
    }

    /* ---------------- QUOTES ---------------- */

    /// Fee a fresh term of `lease` (zero means the default) would cost.
    pub fn quote_fee(&self, lease: i64, byte_size: u32) -> Result<u64, CrudError> {
        let accountant = self.accountant();
        let lease = accountant.resolve_lease(lease)?;
        Ok(accountant.quote(lease, byte_size))
    }
}
