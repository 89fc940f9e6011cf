use soroban_sdk::{Address, Bytes, String};

use crud_lib::{fee::byte_size, CrudError, FeeCurve, Record};

use crate::staging::StagedBatch;

/// Lease arithmetic and fee computation.
///
/// Every method stages its record write together with the matching lease
/// index change, so the two stores cannot drift apart. Methods return the
/// fee the caller owes; they never charge it themselves.
pub struct LeaseAccountant<'a> {
    curve: &'a FeeCurve,
    default_lease: i64,
    height: i64,
}

impl<'a> LeaseAccountant<'a> {
    pub fn new(curve: &'a FeeCurve, default_lease: i64, height: i64) -> Self {
        Self {
            curve,
            default_lease,
            height,
        }
    }

    /// Requested lease for a fresh term; zero selects the default.
    pub fn resolve_lease(&self, requested: i64) -> Result<i64, CrudError> {
        match requested {
            0 => Ok(self.default_lease),
            lease if lease < 0 => Err(CrudError::InvalidLease),
            lease => Ok(lease),
        }
    }

    /// Fee for a fresh term of `lease` over `byte_size` bytes.
    pub fn quote(&self, lease: i64, byte_size: u32) -> u64 {
        self.curve.lease_fee(lease, byte_size)
    }

    /// Stages a brand new record starting at the current height.
    pub fn open(
        &self,
        batch: &mut StagedBatch,
        key: &String,
        value: Bytes,
        owner: Address,
        lease: i64,
    ) -> Result<u64, CrudError> {
        let record = Record {
            value,
            owner,
            height: self.height,
            lease,
        };
        let expiry = record.expiry().ok_or(CrudError::InvalidLease)?;
        let fee = self.quote(lease, byte_size(batch.uuid(), key, &record.value));

        batch.index(expiry, key);
        batch.put(key, record);
        Ok(fee)
    }

    /// Replaces value and owner, keeping the lease term as it is.
    pub fn rewrite(&self, batch: &mut StagedBatch, key: &String, old: &Record, value: Bytes, owner: Address) {
        batch.put(
            key,
            Record {
                value,
                owner,
                height: old.height,
                lease: old.lease,
            },
        );
    }

    /// Replaces value and owner and adjusts the lease by `delta`, keeping
    /// the term's start height.
    pub fn extend(
        &self,
        batch: &mut StagedBatch,
        key: &String,
        old: &Record,
        value: Bytes,
        owner: Address,
        delta: i64,
    ) -> Result<u64, CrudError> {
        let new_lease = old.lease.checked_add(delta).ok_or(CrudError::InvalidLease)?;
        if new_lease <= 0 {
            return Err(CrudError::InvalidLease);
        }
        let new_expiry = old
            .height
            .checked_add(new_lease)
            .ok_or(CrudError::InvalidLease)?;
        if new_expiry <= self.height {
            return Err(CrudError::InvalidLease);
        }
        let old_expiry = old.expiry().ok_or(CrudError::InvalidLease)?;

        let fee = self.curve.extension_fee(
            old.lease,
            new_lease,
            byte_size(batch.uuid(), key, &value),
        );

        batch.unindex(old_expiry, key);
        batch.index(new_expiry, key);
        batch.put(
            key,
            Record {
                value,
                owner,
                height: old.height,
                lease: new_lease,
            },
        );
        Ok(fee)
    }

    /// Restarts the term at the current height with `lease`, whatever was
    /// left of the previous one. Only growth of the lease is charged.
    pub fn renew(
        &self,
        batch: &mut StagedBatch,
        key: &String,
        old: Record,
        lease: i64,
    ) -> Result<u64, CrudError> {
        let old_expiry = old.expiry().ok_or(CrudError::InvalidLease)?;
        let fee = self.curve.extension_fee(
            old.lease,
            lease,
            byte_size(batch.uuid(), key, &old.value),
        );

        let renewed = Record {
            height: self.height,
            lease,
            ..old
        };
        let new_expiry = renewed.expiry().ok_or(CrudError::InvalidLease)?;

        batch.unindex(old_expiry, key);
        batch.index(new_expiry, key);
        batch.put(key, renewed);
        Ok(fee)
    }

    /// Moves a record to `new_key`, carrying its lease index entry along.
    pub fn relocate(
        &self,
        batch: &mut StagedBatch,
        key: &String,
        new_key: &String,
        record: &Record,
    ) -> Result<(), CrudError> {
        let expiry = record.expiry().ok_or(CrudError::InvalidLease)?;

        batch.move_key(key, new_key);
        batch.unindex(expiry, key);
        batch.index(expiry, new_key);
        Ok(())
    }

    /// Removes a record and the index entry derived from its own term.
    pub fn close(&self, batch: &mut StagedBatch, key: &String, record: &Record) -> Result<(), CrudError> {
        let expiry = record.expiry().ok_or(CrudError::InvalidLease)?;

        batch.unindex(expiry, key);
        batch.remove(key);
        Ok(())
    }
}
