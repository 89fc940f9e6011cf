use soroban_sdk::{Address, Env, Symbol};

use crate::{errors::CrudError, ADMIN_KEY};

pub fn has_admin(env: &Env) -> bool {
    env.storage().instance().has(&Symbol::new(env, ADMIN_KEY))
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage()
        .instance()
        .set(&Symbol::new(env, ADMIN_KEY), admin);
}

pub fn get_admin(env: &Env) -> Result<Address, CrudError> {
    env.storage()
        .instance()
        .get(&Symbol::new(env, ADMIN_KEY))
        .ok_or(CrudError::NotInitialized)
}

pub fn verify_admin(env: &Env, caller: &Address) -> Result<(), CrudError> {
    let admin = get_admin(env)?;
    if &admin != caller {
        return Err(CrudError::Unauthorized);
    }
    Ok(())
}

pub fn transfer_admin(
    env: &Env,
    current_admin: &Address,
    new_admin: &Address,
) -> Result<(), CrudError> {
    current_admin.require_auth();
    verify_admin(env, current_admin)?;
    set_admin(env, new_admin);
    Ok(())
}
