//! Time-ordered child keys minted without a server round trip.
//!
//! A key is 20 characters: 8 encode the wall-clock millisecond, 12 are
//! random. The alphabet is in ASCII order, so comparing keys as strings
//! compares their timestamps first.
//!
//! Keys minted in the same millisecond reuse the previous random suffix
//! incremented by one in the last position (with carry), so a burst of
//! writes still sorts in the order it was issued.
//!
//! ```
//! use firetree::KeyGenerator;
//!
//! let keys = KeyGenerator::new();
//! let a = keys.next();
//! let b = keys.next();
//! assert_eq!(a.len(), 20);
//! assert!(a < b);
//! ```

use crate::core::traits::{Clock, SystemClock};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::Arc;

/// 64 characters in ascending ASCII order.
pub const KEY_ALPHABET: &[u8; 64] =
    b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

pub const TIMESTAMP_LEN: usize = 8;
pub const RANDOM_LEN: usize = 12;
pub const KEY_LEN: usize = TIMESTAMP_LEN + RANDOM_LEN;

struct KeyState {
    last_ms: Option<u64>,
    last_random: [u8; RANDOM_LEN],
    rng: Box<dyn RngCore + Send>,
}

/// Generator of sortable, collision-resistant keys.
///
/// One instance is meant to be shared by every writer in the process; the
/// last timestamp and suffix live behind a mutex.
pub struct KeyGenerator {
    clock: Arc<dyn Clock>,
    state: Mutex<KeyState>,
}

impl KeyGenerator {
    /// System clock and an entropy-seeded RNG.
    pub fn new() -> Self {
        Self::with_parts(Arc::new(SystemClock), StdRng::from_entropy())
    }

    /// Build a generator from an explicit clock and random source.
    pub fn with_parts(clock: Arc<dyn Clock>, rng: impl RngCore + Send + 'static) -> Self {
        KeyGenerator {
            clock,
            state: Mutex::new(KeyState {
                last_ms: None,
                last_random: [0; RANDOM_LEN],
                rng: Box::new(rng),
            }),
        }
    }

    /// Mint the next key.
    pub fn next(&self) -> String {
        let mut state = self.state.lock();

        // A clock stepping backwards stays in the last bucket.
        let now = match state.last_ms {
            Some(last) => self.clock.now_ms().max(last),
            None => self.clock.now_ms(),
        };

        let same_bucket = state.last_ms == Some(now);
        if !same_bucket || !increment(&mut state.last_random) {
            if same_bucket {
                tracing::warn!(timestamp = now, "key suffix overflowed, drawing fresh randomness");
            }
            let KeyState {
                last_random, rng, ..
            } = &mut *state;
            for digit in last_random.iter_mut() {
                *digit = rng.gen_range(0..64);
            }
        }
        state.last_ms = Some(now);

        let mut key = String::with_capacity(KEY_LEN);
        key.push_str(&encode_timestamp(now));
        key.extend(
            state
                .last_random
                .iter()
                .map(|&d| KEY_ALPHABET[d as usize] as char),
        );
        key
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGenerator")
            .field("last_ms", &self.state.lock().last_ms)
            .finish()
    }
}

fn encode_timestamp(mut ms: u64) -> String {
    let mut chars = [0u8; TIMESTAMP_LEN];
    for slot in chars.iter_mut().rev() {
        *slot = KEY_ALPHABET[(ms % 64) as usize];
        ms /= 64;
    }
    chars.iter().map(|&c| c as char).collect()
}

/// Add one to the base-64 digits, carrying leftward. Returns `false` when
/// every digit wrapped around.
fn increment(digits: &mut [u8; RANDOM_LEN]) -> bool {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return true;
        }
    }
    false
}
