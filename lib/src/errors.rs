use soroban_sdk::contracterror;

/// Typed failures returned by every CRUD operation.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum CrudError {
    /// Malformed input: empty or oversized identifiers, zero `n`, bad batch,
    /// or a rename the store refused.
    InvalidRequest = 1,
    /// No live record at `(uuid, key)`.
    NotFound = 2,
    /// Caller is not the recorded owner (or not the admin).
    Unauthorized = 3,
    /// `create` on an occupied key.
    AlreadyExists = 4,
    /// Resulting lease is non-positive, already expired, or overflows.
    InvalidLease = 5,
    NotInitialized = 6,
    AlreadyInitialized = 7,
}
