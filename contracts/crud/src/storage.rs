use soroban_sdk::{contracttype, Env, String, Symbol};

use crud_lib::{Config, CrudError, CONFIG_KEY, INSTANCE_TTL_EXTEND, INSTANCE_TTL_THRESHOLD};

#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    /// Record under `(uuid, key)`.
    Record(String, String),
    /// Sorted set of live keys in a namespace.
    Directory(String),
    /// Lease index of a namespace, ordered by `(expiry, key)`.
    LeaseIndex(String),
}

/* ---------------- CONFIG ---------------- */

pub fn set_config(env: &Env, config: &Config) {
    env.storage()
        .instance()
        .set(&Symbol::new(env, CONFIG_KEY), config);
}

pub fn get_config(env: &Env) -> Result<Config, CrudError> {
    env.storage()
        .instance()
        .get(&Symbol::new(env, CONFIG_KEY))
        .ok_or(CrudError::NotInitialized)
}

/* ---------------- HELPERS ---------------- */

/// Keeps the contract instance (config, admin, code) from being archived.
pub fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

/// Current ledger height.
pub fn current_height(env: &Env) -> i64 {
    i64::from(env.ledger().sequence())
}
