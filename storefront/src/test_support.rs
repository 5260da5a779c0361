//! Test utilities for the storefront crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests or
//! with the `test-support` feature.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use camino::Utf8PathBuf;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use credential_data::{GenerationRequest, generate_credentials};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{delivered_from_seed, payload_kind};
use crate::domain::{Buyer, Country, CountryDraft, DataType, Delivery, Money};

/// Clock whose time only moves when told to.
///
/// # Examples
/// ```
/// use mockable::Clock;
/// use storefront::test_support::{MutableClock, fixed_now};
///
/// let clock = MutableClock::new(fixed_now());
/// clock.advance_seconds(90);
/// assert_eq!((clock.utc() - fixed_now()).num_seconds(), 90);
/// ```
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Starts the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Moves the clock forward by `delta`.
    ///
    /// # Panics
    ///
    /// Panics when `delta` does not fit a [`TimeDelta`].
    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *self.lock_clock() += delta;
    }

    /// Moves the clock forward by whole seconds.
    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Fixed instant used by clock-driven tests: 2026-01-01T00:00:00Z.
///
/// # Panics
///
/// Never in practice; the timestamp is a valid constant.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single() {
        Some(now) => now,
        None => panic!("fixed timestamp is valid"),
    }
}

/// Saudi Arabia listing priced at 2.50 with 500 accounts in stock.
///
/// # Panics
///
/// Panics if the fixture draft stops validating.
pub fn sample_country() -> Country {
    let draft = CountryDraft {
        code: "sa".to_owned(),
        name: "Saudi Arabia".to_owned(),
        flag: "🇸🇦".to_owned(),
        phone_prefix: "+966".to_owned(),
        price: Money::from_cents(250),
        available: 500,
        active: true,
    };
    match Country::try_from(draft) {
        Ok(country) => country,
        Err(err) => panic!("sample country must validate: {err}"),
    }
}

/// Buyer holding 1000.00.
///
/// # Panics
///
/// Panics if the fixture buyer stops validating.
pub fn sample_buyer() -> Buyer {
    match Buyer::new(Uuid::new_v4(), "Test Buyer", Money::from_units(1_000)) {
        Ok(buyer) => buyer,
        Err(err) => panic!("sample buyer must validate: {err}"),
    }
}

/// Delivery of `count` generated accounts under the sample country prefix.
///
/// # Panics
///
/// Panics when `count` is zero or generation fails.
pub fn sample_delivery(count: usize, data_type: DataType) -> Delivery {
    let request = GenerationRequest::new("+966", count, payload_kind(data_type)).with_seed(11);
    let seeds = match generate_credentials(&request) {
        Ok(seeds) => seeds,
        Err(err) => panic!("sample credentials must generate: {err}"),
    };
    let accounts = seeds
        .into_iter()
        .map(|seed| match delivered_from_seed(seed) {
            Ok(account) => account,
            Err(err) => panic!("generated credential must convert: {err}"),
        })
        .collect();
    Delivery::new(accounts)
}

/// Creates a temporary directory and returns it with its UTF-8 path.
///
/// Keep the guard alive for as long as the directory is needed.
///
/// # Panics
///
/// Panics when the directory cannot be created or its path is not UTF-8.
pub fn temp_utf8_dir() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    };
    let path = match Utf8PathBuf::from_path_buf(dir.path().to_path_buf()) {
        Ok(path) => path,
        Err(path) => panic!("temp dir is not UTF-8: {}", path.display()),
    };
    (dir, path)
}
