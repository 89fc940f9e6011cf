use soroban_sdk::{Bytes, String, Vec};

use crate::{
    errors::CrudError, types::KeyValue, MAX_BATCH_SIZE, MAX_IDENTIFIER_LENGTH, MAX_VALUE_SIZE,
};

/// Namespaces and keys must be non-empty and bounded.
pub fn validate_identifier(id: &String) -> Result<(), CrudError> {
    if id.len() == 0 || id.len() > MAX_IDENTIFIER_LENGTH {
        return Err(CrudError::InvalidRequest);
    }
    Ok(())
}

pub fn validate_value(value: &Bytes) -> Result<(), CrudError> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(CrudError::InvalidRequest);
    }
    Ok(())
}

/// Checks an operation addressing a single key.
pub fn validate_key_request(uuid: &String, key: &String) -> Result<(), CrudError> {
    validate_identifier(uuid)?;
    validate_identifier(key)
}

/// Structural checks for a `multi_update` batch. Ownership is checked later,
/// against the store.
pub fn validate_batch(uuid: &String, key_values: &Vec<KeyValue>) -> Result<(), CrudError> {
    validate_identifier(uuid)?;
    if key_values.len() == 0 || key_values.len() > MAX_BATCH_SIZE {
        return Err(CrudError::InvalidRequest);
    }

    for kv in key_values.iter() {
        validate_identifier(&kv.key)?;
        validate_value(&kv.value)?;
    }

    Ok(())
}

pub fn validate_count(n: u32) -> Result<(), CrudError> {
    if n == 0 {
        return Err(CrudError::InvalidRequest);
    }
    Ok(())
}
