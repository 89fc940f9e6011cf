//! Lease lifecycle: remaining lease, extension through update, renewal,
//! shortest-lease queries and fee charging.

#![cfg(test)]

use soroban_sdk::testutils::Address as _;
use soroban_sdk::{vec, Address};

use crud_lib::{CrudError, KeyLease};

use crate::testutils::{Harness, DEFAULT_LEASE, STARTING_BALANCE, START_HEIGHT};

fn key_lease(h: &Harness, key: &str, lease: i64) -> KeyLease {
    KeyLease {
        key: h.s(key),
        lease,
    }
}

/* ---------------- REMAINING LEASE ---------------- */

#[test]
fn test_get_lease_counts_down_with_height() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    h.create("db1", "a", "hello", &alice, 0);

    h.set_height(150);
    let result = h.client().get_lease(&h.s("db1"), &h.s("a"));
    assert_eq!(result.uuid, h.s("db1"));
    assert_eq!(result.key, h.s("a"));
    assert_eq!(result.lease, 950);
}

#[test]
fn test_get_lease_past_expiry_is_negative() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    h.create("db1", "a", "hello", &alice, 0);

    // expired records stay readable until swept
    h.set_height(1200);
    let client = h.client();
    assert_eq!(client.get_lease(&h.s("db1"), &h.s("a")).lease, -100);
    assert_eq!(client.read(&h.s("db1"), &h.s("a")).value, h.bytes("hello"));
}

#[test]
fn test_get_lease_missing_key_fails() {
    let h = Harness::new();
    let result = h.client().try_get_lease(&h.s("db1"), &h.s("a"));
    assert_eq!(result, Err(Ok(CrudError::NotFound)));
}

/* ---------------- UPDATE WITH LEASE DELTA ---------------- */

#[test]
fn test_update_delta_extends_lease() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    h.create("db1", "a", "hello", &alice, 0);
    h.set_height(200);

    h.client()
        .update(&h.s("db1"), &h.s("a"), &h.bytes("hello"), &alice, &500);

    let record = h.stored("db1", "a").unwrap();
    assert_eq!(record.height, START_HEIGHT as i64);
    assert_eq!(record.lease, 1500);
    assert_eq!(h.slots("db1"), vec![&h.env, h.slot(1600, "a")]);
}

#[test]
fn test_update_delta_shortens_lease() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    h.create("db1", "a", "hello", &alice, 0);

    h.client()
        .update(&h.s("db1"), &h.s("a"), &h.bytes("hello"), &alice, &-500);

    assert_eq!(h.stored("db1", "a").unwrap().lease, 500);
    assert_eq!(h.slots("db1"), vec![&h.env, h.slot(600, "a")]);
}

#[test]
fn test_update_delta_rejects_invalid_lease() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    h.create("db1", "a", "hello", &alice, 0);
    let client = h.client();

    // drops the lease to zero
    assert_eq!(
        client.try_update(&h.s("db1"), &h.s("a"), &h.bytes("new"), &alice, &-1000),
        Err(Ok(CrudError::InvalidLease))
    );

    // positive, but the term would already be over
    h.set_height(900);
    assert_eq!(
        client.try_update(&h.s("db1"), &h.s("a"), &h.bytes("new"), &alice, &-850),
        Err(Ok(CrudError::InvalidLease))
    );

    assert_eq!(
        client.try_update(&h.s("db1"), &h.s("a"), &h.bytes("new"), &alice, &i64::MAX),
        Err(Ok(CrudError::InvalidLease))
    );

    let record = h.stored("db1", "a").unwrap();
    assert_eq!(record.value, h.bytes("hello"));
    assert_eq!(record.lease, DEFAULT_LEASE);
    assert_eq!(h.slots("db1"), vec![&h.env, h.slot(1100, "a")]);
}

/* ---------------- RENEW ---------------- */

#[test]
fn test_renew_lease_restarts_term() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    h.create("db1", "a", "hello", &alice, 0);
    assert_eq!(h.slots("db1"), vec![&h.env, h.slot(1100, "a")]);

    h.set_height(300);
    h.client().renew_lease(&h.s("db1"), &h.s("a"), &alice, &2000);

    let record = h.stored("db1", "a").unwrap();
    assert_eq!(record.height, 300);
    assert_eq!(record.lease, 2000);
    assert_eq!(record.value, h.bytes("hello"));
    assert_eq!(h.slots("db1"), vec![&h.env, h.slot(2300, "a")]);
}

#[test]
fn test_renew_lease_zero_uses_default() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    h.create("db1", "a", "hello", &alice, 50);

    h.set_height(120);
    h.client().renew_lease(&h.s("db1"), &h.s("a"), &alice, &0);

    assert_eq!(h.stored("db1", "a").unwrap().lease, DEFAULT_LEASE);
    assert_eq!(h.slots("db1"), vec![&h.env, h.slot(1120, "a")]);
}

#[test]
fn test_renew_lease_failures() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    let mallory = Address::generate(&h.env);
    h.create("db1", "a", "hello", &alice, 0);
    let client = h.client();

    assert_eq!(
        client.try_renew_lease(&h.s("db1"), &h.s("a"), &alice, &-1),
        Err(Ok(CrudError::InvalidLease))
    );
    assert_eq!(
        client.try_renew_lease(&h.s("db1"), &h.s("a"), &mallory, &2000),
        Err(Ok(CrudError::Unauthorized))
    );
    assert_eq!(
        client.try_renew_lease(&h.s("db1"), &h.s("b"), &alice, &2000),
        Err(Ok(CrudError::NotFound))
    );
    assert_eq!(h.stored("db1", "a").unwrap().lease, DEFAULT_LEASE);
    h.assert_index_consistent("db1");
}

#[test]
fn test_renew_lease_all_renews_only_own_keys() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    let bob = Address::generate(&h.env);
    h.create("db1", "a", "1", &alice, 0);
    h.create("db1", "b", "2", &alice, 300);
    h.create("db1", "c", "3", &bob, 0);

    h.set_height(300);
    h.client().renew_lease_all(&h.s("db1"), &alice, &2000);

    for key in ["a", "b"] {
        let record = h.stored("db1", key).unwrap();
        assert_eq!(record.height, 300);
        assert_eq!(record.lease, 2000);
    }
    let untouched = h.stored("db1", "c").unwrap();
    assert_eq!(untouched.height, START_HEIGHT as i64);
    assert_eq!(untouched.lease, DEFAULT_LEASE);

    assert_eq!(
        h.slots("db1"),
        vec![&h.env, h.slot(1100, "c"), h.slot(2300, "a"), h.slot(2300, "b")]
    );
}

#[test]
fn test_renew_lease_all_with_nothing_owned_fails() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    let bob = Address::generate(&h.env);
    h.create("db1", "a", "1", &bob, 0);

    let result = h.client().try_renew_lease_all(&h.s("db1"), &alice, &2000);
    assert_eq!(result, Err(Ok(CrudError::InvalidRequest)));
}

/* ---------------- SHORTEST LEASES ---------------- */

#[test]
fn test_get_n_shortest_lease_orders_by_expiry() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    let bob = Address::generate(&h.env);
    h.create("db1", "a", "1", &alice, 500);
    h.create("db1", "b", "2", &alice, 0);
    h.create("db1", "c", "3", &alice, 200);
    h.create("db1", "d", "4", &bob, 50);

    h.set_height(200);
    let client = h.client();

    let result = client.get_n_shortest_lease(&h.s("db1"), &alice, &2);
    assert_eq!(result.uuid, h.s("db1"));
    assert_eq!(
        result.key_leases,
        vec![&h.env, key_lease(&h, "c", 100), key_lease(&h, "a", 400)]
    );

    let all = client.get_n_shortest_lease(&h.s("db1"), &alice, &10);
    assert_eq!(
        all.key_leases,
        vec![
            &h.env,
            key_lease(&h, "c", 100),
            key_lease(&h, "a", 400),
            key_lease(&h, "b", 900),
        ]
    );

    let bobs = client.get_n_shortest_lease(&h.s("db1"), &bob, &10);
    assert_eq!(bobs.key_leases, vec![&h.env, key_lease(&h, "d", -50)]);
}

#[test]
fn test_get_n_shortest_lease_breaks_ties_by_key() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    h.create("db1", "zeta", "1", &alice, 0);
    h.create("db1", "alpha", "2", &alice, 0);

    let result = h.client().get_n_shortest_lease(&h.s("db1"), &alice, &1);
    assert_eq!(result.key_leases, vec![&h.env, key_lease(&h, "alpha", 1000)]);
}

#[test]
fn test_get_n_shortest_lease_rejects_zero() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);
    h.create("db1", "a", "1", &alice, 0);

    let result = h.client().try_get_n_shortest_lease(&h.s("db1"), &alice, &0);
    assert_eq!(result, Err(Ok(CrudError::InvalidRequest)));
}

/* ---------------- FEES ---------------- */

#[test]
fn test_create_charges_lease_fee() {
    let h = Harness::with_fee_token();
    let alice = h.funded_account();

    // "db1" + "a" + "hello" is 9 bytes held for 1000 ledgers
    h.create("db1", "a", "hello", &alice, 0);

    assert_eq!(h.balance(&alice), STARTING_BALANCE - 90);
    assert_eq!(h.balance(&h.contract_id), 90);
}

#[test]
fn test_renewal_charges_only_the_increase() {
    let h = Harness::with_fee_token();
    let alice = h.funded_account();
    h.create("db1", "a", "hello", &alice, 0);

    // 1000 -> 2000 ledgers stays on the flat part of the curve
    h.set_height(300);
    h.client().renew_lease(&h.s("db1"), &h.s("a"), &alice, &2000);
    assert_eq!(h.balance(&alice), STARTING_BALANCE - 90);

    h.client().renew_lease(&h.s("db1"), &h.s("a"), &alice, &172_800);
    assert_eq!(h.balance(&alice), STARTING_BALANCE - 90 - 179);
    assert_eq!(h.balance(&h.contract_id), 269);
}

#[test]
fn test_update_extension_charges_fee() {
    let h = Harness::with_fee_token();
    let alice = h.funded_account();
    h.create("db1", "a", "hello", &alice, 0);

    h.client()
        .update(&h.s("db1"), &h.s("a"), &h.bytes("hello"), &alice, &99_000);

    assert_eq!(h.stored("db1", "a").unwrap().lease, 100_000);
    assert_eq!(h.balance(&alice), STARTING_BALANCE - 90 - 131);
}

#[test]
fn test_shortening_is_free() {
    let h = Harness::with_fee_token();
    let alice = h.funded_account();
    h.create("db1", "a", "hello", &alice, 172_800);
    let after_create = h.balance(&alice);

    let client = h.client();
    client.update(&h.s("db1"), &h.s("a"), &h.bytes("hello"), &alice, &-100_000);
    client.renew_lease(&h.s("db1"), &h.s("a"), &alice, &1000);
    client.update(&h.s("db1"), &h.s("a"), &h.bytes("hello"), &alice, &0);

    assert_eq!(h.balance(&alice), after_create);
}

#[test]
fn test_renew_lease_all_charges_sum() {
    let h = Harness::with_fee_token();
    let alice = h.funded_account();
    h.create("db1", "a", "hello", &alice, 0);
    h.create("db1", "b", "hello", &alice, 0);

    h.client().renew_lease_all(&h.s("db1"), &alice, &172_800);
    assert_eq!(h.balance(&alice), STARTING_BALANCE - 2 * 90 - 2 * 179);
}

#[test]
fn test_unpaid_create_leaves_nothing_behind() {
    let h = Harness::with_fee_token();
    let broke = Address::generate(&h.env);

    let result = h
        .client()
        .try_create(&h.s("db1"), &h.s("a"), &h.bytes("hello"), &broke, &0);
    assert!(result.is_err());

    assert!(!h.client().has(&h.s("db1"), &h.s("a")).has);
    assert_eq!(h.slots("db1").len(), 0);
}

#[test]
fn test_unpaid_renewal_keeps_old_term() {
    let h = Harness::with_fee_token();
    let alice = h.funded_account();
    h.create("db1", "a", "hello", &alice, 0);

    // hand the token balance away so the renewal cannot be paid
    let sink = Address::generate(&h.env);
    soroban_sdk::token::Client::new(&h.env, h.fee_token.as_ref().unwrap()).transfer(
        &alice,
        &sink,
        &h.balance(&alice),
    );

    h.set_height(300);
    let result = h
        .client()
        .try_renew_lease(&h.s("db1"), &h.s("a"), &alice, &172_800);
    assert!(result.is_err());

    let record = h.stored("db1", "a").unwrap();
    assert_eq!(record.height, START_HEIGHT as i64);
    assert_eq!(record.lease, DEFAULT_LEASE);
    assert_eq!(h.slots("db1"), vec![&h.env, h.slot(1100, "a")]);
}

#[test]
fn test_fee_without_token_is_not_charged() {
    let h = Harness::new();
    let alice = Address::generate(&h.env);

    // no token configured, so an unfunded account can still write
    h.create("db1", "a", "hello", &alice, 172_800);
    assert!(h.client().has(&h.s("db1"), &h.s("a")).has);
}
