//! Shared harness for the `tests/test_dice_*` files: a single-shot roll
//! that panics on error and hands back just the numeric total, for tests
//! that only care about range/parity and would otherwise drown in
//! `roll(...).unwrap().total` boilerplate.

#![allow(dead_code)]

use rollwright::Roller;

pub fn r(expr: &str) -> f64 {
    let mut roller = Roller::default();
    roller.roll(expr).unwrap_or_else(|e| panic!("roll({expr:?}) failed: {e}")).total as f64
}
