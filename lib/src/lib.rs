#![no_std]
#[cfg(test)]
extern crate std;

pub mod admin;
pub mod errors;
pub mod fee;
pub mod types;
pub mod validation;

pub use errors::CrudError;
pub use fee::FeeCurve;
pub use types::*;

/// Constants for request validation
// Config
pub const ADMIN_KEY: &str = "admin";
pub const CONFIG_KEY: &str = "config";
pub const MAX_IDENTIFIER_LENGTH: u32 = 256;
pub const MAX_VALUE_SIZE: u32 = 65536;
pub const MAX_BATCH_SIZE: u32 = 100;
// Directory and lease index are one entry each per namespace; this keeps
// both under the per-transaction write limit at maximum key length.
pub const MAX_NAMESPACE_KEYS: u32 = 64;

// Lease defaults, in ledgers (~5 s each).
pub const DEFAULT_LEASE_LEDGERS: i64 = 172_800; // ~10 days

// Storage TTL, in ledgers. Independent of record leases; keeps entries live
// until the external sweeper reaps them.
pub const INSTANCE_TTL_THRESHOLD: u32 = 17_280; // ~1 day
pub const INSTANCE_TTL_EXTEND: u32 = 518_400; // ~30 days
pub const RECORD_TTL_THRESHOLD: u32 = 518_400; // ~30 days
pub const RECORD_TTL_EXTEND: u32 = 1_036_800; // ~60 days

// Fee curve, fixed point. 1.0 == RATE_SCALE.
pub const RATE_SCALE: i128 = 1_000_000_000;
pub const DEFAULT_FEE_BASE_RATE: i128 = 10 * RATE_SCALE;
pub const DEFAULT_FEE_MAX_EXTRA: i128 = 20 * RATE_SCALE;
pub const DEFAULT_FEE_INFLECTION_SPAN: i64 = 8640;
pub const DEFAULT_FEE_SHIFT: i64 = 86400;
pub const MAX_FEE_EXTRA: i128 = 1_000_000 * RATE_SCALE;
