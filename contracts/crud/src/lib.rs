#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod accountant;
mod engine;
mod meter;
mod repository;
mod staging;
mod storage;

#[cfg(test)]
mod test_lease;

use soroban_sdk::{contract, contractimpl, Address, Bytes, Env, String, Symbol, Vec};
use crud_lib::{
    admin, Config, CountResult, CrudError, FeeCurve, HasResult, KeyLeasesResult, KeyValue,
    KeyValuesResult, KeysResult, LeaseResult, ReadResult, DEFAULT_LEASE_LEDGERS,
};

use engine::TransitionEngine;
use meter::TokenMeter;
use repository::{PersistentLeaseIndex, PersistentRecordStore};
use storage::*;

type Engine = TransitionEngine<PersistentRecordStore, PersistentLeaseIndex, TokenMeter>;

/// Builds the engine over contract storage for the current invocation.
fn build_engine(env: &Env) -> Result<Engine, CrudError> {
    let config = get_config(env)?;

    let meter = TokenMeter::new(env.clone(), config.fee_token.clone());
    Ok(TransitionEngine::new(
        env.clone(),
        PersistentRecordStore::new(env.clone()),
        PersistentLeaseIndex::new(env.clone()),
        meter,
        config,
        current_height(env),
    ))
}

/// Engine for an invocation that writes; also keeps the instance live.
fn build_writer(env: &Env) -> Result<Engine, CrudError> {
    let engine = build_engine(env)?;
    bump_instance(env);
    Ok(engine)
}

/// Admin-gated read-modify-write of the stored config.
fn update_config<F>(env: &Env, admin: &Address, change: F) -> Result<(), CrudError>
where
    F: FnOnce(&mut Config) -> Result<(), CrudError>,
{
    admin.require_auth();
    admin::verify_admin(env, admin)?;

    let mut config = get_config(env)?;
    change(&mut config)?;
    set_config(env, &config);
    bump_instance(env);

    env.events()
        .publish((Symbol::new(env, "config"),), config);
    Ok(())
}

#[contract]
pub struct Crud;

#[contractimpl]
impl Crud {
    /// Initialize contract with admin, default lease and optional fee token
    pub fn initialize(
        env: Env,
        admin: Address,
        default_lease: Option<i64>,
        fee_token: Option<Address>,
    ) -> Result<(), CrudError> {
        if admin::has_admin(&env) {
            return Err(CrudError::AlreadyInitialized);
        }
        admin.require_auth();

        let default_lease = default_lease.unwrap_or(DEFAULT_LEASE_LEDGERS);
        if default_lease <= 0 {
            return Err(CrudError::InvalidLease);
        }

        let config = Config {
            default_lease,
            fee_token,
            curve: FeeCurve::default_curve(),
        };
        admin::set_admin(&env, &admin);
        set_config(&env, &config);
        bump_instance(&env);

        env.events()
            .publish((Symbol::new(&env, "config"),), config);
        Ok(())
    }

    pub fn set_default_lease(env: Env, admin: Address, lease: i64) -> Result<(), CrudError> {
        if lease <= 0 {
            return Err(CrudError::InvalidLease);
        }
        update_config(&env, &admin, |config| {
            config.default_lease = lease;
            Ok(())
        })
    }

    pub fn set_fee_token(env: Env, admin: Address, token: Option<Address>) -> Result<(), CrudError> {
        update_config(&env, &admin, |config| {
            config.fee_token = token;
            Ok(())
        })
    }

    pub fn set_fee_curve(env: Env, admin: Address, curve: FeeCurve) -> Result<(), CrudError> {
        update_config(&env, &admin, |config| {
            curve.validate()?;
            config.curve = curve;
            Ok(())
        })
    }

    pub fn transfer_admin(env: Env, admin: Address, new_admin: Address) -> Result<(), CrudError> {
        admin::transfer_admin(&env, &admin, &new_admin)?;
        bump_instance(&env);
        Ok(())
    }

    pub fn get_config(env: Env) -> Result<Config, CrudError> {
        storage::get_config(&env)
    }

    /// Fee a fresh lease of `lease` ledgers (zero for the default) costs
    /// for `byte_size` bytes
    pub fn quote_fee(env: Env, lease: i64, byte_size: u32) -> Result<u64, CrudError> {
        build_engine(&env)?.quote_fee(lease, byte_size)
    }

    /* ---------------- RECORDS ---------------- */

    pub fn create(
        env: Env,
        uuid: String,
        key: String,
        value: Bytes,
        owner: Address,
        lease: i64,
    ) -> Result<(), CrudError> {
        owner.require_auth();
        build_writer(&env)?.create(uuid, key, value, owner, lease)
    }

    pub fn read(env: Env, uuid: String, key: String) -> Result<ReadResult, CrudError> {
        build_engine(&env)?.read(uuid, key)
    }

    /// Replace value (and owner); a non-zero `lease` is a delta on the
    /// current lease
    pub fn update(
        env: Env,
        uuid: String,
        key: String,
        value: Bytes,
        owner: Address,
        lease: i64,
    ) -> Result<(), CrudError> {
        owner.require_auth();
        build_writer(&env)?.update(uuid, key, value, owner, lease)
    }

    pub fn delete(env: Env, uuid: String, key: String, owner: Address) -> Result<(), CrudError> {
        owner.require_auth();
        build_writer(&env)?.delete(uuid, key, owner)
    }

    pub fn rename(
        env: Env,
        uuid: String,
        key: String,
        new_key: String,
        owner: Address,
    ) -> Result<(), CrudError> {
        owner.require_auth();
        build_writer(&env)?.rename(uuid, key, new_key, owner)
    }

    pub fn has(env: Env, uuid: String, key: String) -> Result<HasResult, CrudError> {
        build_engine(&env)?.has(uuid, key)
    }

    pub fn keys(env: Env, uuid: String, owner: Address) -> Result<KeysResult, CrudError> {
        build_engine(&env)?.keys(uuid, owner)
    }

    pub fn key_values(env: Env, uuid: String, owner: Address) -> Result<KeyValuesResult, CrudError> {
        build_engine(&env)?.key_values(uuid, owner)
    }

    pub fn count(env: Env, uuid: String, owner: Address) -> Result<CountResult, CrudError> {
        build_engine(&env)?.count(uuid, owner)
    }

    pub fn delete_all(env: Env, uuid: String, owner: Address) -> Result<(), CrudError> {
        owner.require_auth();
        build_writer(&env)?.delete_all(uuid, owner)
    }

    /// Update several values at once; either every key is written or none
    pub fn multi_update(
        env: Env,
        uuid: String,
        key_values: Vec<KeyValue>,
        owner: Address,
    ) -> Result<(), CrudError> {
        owner.require_auth();
        build_writer(&env)?.multi_update(uuid, key_values, owner)
    }

    /* ---------------- LEASES ---------------- */

    pub fn get_lease(env: Env, uuid: String, key: String) -> Result<LeaseResult, CrudError> {
        build_engine(&env)?.get_lease(uuid, key)
    }

    pub fn get_n_shortest_lease(
        env: Env,
        uuid: String,
        owner: Address,
        n: u32,
    ) -> Result<KeyLeasesResult, CrudError> {
        build_engine(&env)?.get_n_shortest_lease(uuid, owner, n)
    }

    pub fn renew_lease(
        env: Env,
        uuid: String,
        key: String,
        owner: Address,
        lease: i64,
    ) -> Result<(), CrudError> {
        owner.require_auth();
        build_writer(&env)?.renew_lease(uuid, key, owner, lease)
    }

    pub fn renew_lease_all(env: Env, uuid: String, owner: Address, lease: i64) -> Result<(), CrudError> {
        owner.require_auth();
        build_writer(&env)?.renew_lease_all(uuid, owner, lease)
    }
}
