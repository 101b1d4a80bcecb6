use std::sync::Mutex;

use rand::{rngs::StdRng, RngCore, SeedableRng};
use uuid::Uuid;

/// Source of every random value the simulator hands out: order references, start tokens,
/// nonces and the placeholder digests and signature values.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]);

    /// A version 4 UUID built from this source.
    fn uuid(&self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.fill(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }

    fn bytes(&self, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf);
        buf
    }
}

/// Randomness from the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) {
        rand::thread_rng().fill_bytes(buf)
    }

    fn uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Reproducible randomness, for tests.
#[derive(Debug)]
pub struct SeededRandom(Mutex<StdRng>);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }
}

impl RandomSource for SeededRandom {
    fn fill(&self, buf: &mut [u8]) {
        // A poisoned lock still holds a usable generator.
        let mut rng = match self.0.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.fill_bytes(buf)
    }
}
