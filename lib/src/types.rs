use soroban_sdk::{contracttype, Address, Bytes, String, Vec};

use crate::fee::FeeCurve;

/// A stored record. Lives under `(uuid, key)` for as long as it has an owner.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Record {
    pub value: Bytes,
    pub owner: Address,
    /// Ledger height at which the current lease term started.
    pub height: i64,
    /// Number of ledgers the record stays valid from `height`.
    pub lease: i64,
}

impl Record {
    /// Height at which the record becomes eligible for reaping.
    pub fn expiry(&self) -> Option<i64> {
        self.height.checked_add(self.lease)
    }

    /// Lease left at `current`; negative once the record is past expiry.
    pub fn remaining_at(&self, current: i64) -> i64 {
        self.lease
            .saturating_add(self.height)
            .saturating_sub(current)
    }
}

/// A lease index entry as seen from outside the contract.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct LeaseSlot {
    pub expiry: i64,
    pub key: String,
}

/// One element of a `multi_update` batch.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct KeyValue {
    pub key: String,
    pub value: Bytes,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct KeyLease {
    pub key: String,
    pub lease: i64,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct ReadResult {
    pub uuid: String,
    pub key: String,
    pub value: Bytes,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct HasResult {
    pub uuid: String,
    pub key: String,
    pub has: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct KeysResult {
    pub uuid: String,
    pub keys: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct KeyValuesResult {
    pub uuid: String,
    pub key_values: Vec<KeyValue>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct CountResult {
    pub uuid: String,
    pub count: u32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct LeaseResult {
    pub uuid: String,
    pub key: String,
    pub lease: i64,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct KeyLeasesResult {
    pub uuid: String,
    pub key_leases: Vec<KeyLease>,
}

/// Host configuration kept in instance storage.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Config {
    /// Substituted whenever a caller passes a zero lease.
    pub default_lease: i64,
    /// Stellar asset the lease fees are paid in. `None` disables charging;
    /// fees are still computed and published.
    pub fee_token: Option<Address>,
    pub curve: FeeCurve,
}
