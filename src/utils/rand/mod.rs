// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use rand::SeedableRng as _;
use rand_chacha::ChaChaRng;

const FIXED_SEED_ENV_KEY: &str = "FOREST_TEST_RNG_FIXED_SEED";

/// Cryptographic RNG seeded from OS entropy, unless `FOREST_TEST_RNG_FIXED_SEED`
/// holds a `u64` seed. The fixed seed makes otherwise random challenges
/// reproducible in tests.
pub fn forest_rng() -> ChaChaRng {
    rng_with_seed_override(std::env::var(FIXED_SEED_ENV_KEY).ok().as_deref())
}

fn rng_with_seed_override(seed: Option<&str>) -> ChaChaRng {
    if let Some(v) = seed {
        match v.parse() {
            Ok(seed) => {
                tracing::warn!(
                    "[security] using test RNG with fixed seed {seed} set by {FIXED_SEED_ENV_KEY}"
                );
                return ChaChaRng::seed_from_u64(seed);
            }
            Err(_) => tracing::warn!(
                "invalid u64 seed set by {FIXED_SEED_ENV_KEY}: {v}. Falling back to the default RNG."
            ),
        }
    }
    ChaChaRng::from_entropy()
}
