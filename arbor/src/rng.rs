//! Random source adapter and RNG provider system.

use rand::Rng as _;
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Object-safe extension of [`RngCore`] that supports cloning the stream.
///
/// Cloning must yield a bit-identical independent stream: the whole engine's
/// reproducibility rests on a clone replaying exactly the draws the original
/// would have produced.
pub trait CloneableRng: RngCore {
    /// Clone this RNG into a boxed copy at the same stream position
    fn clone_rng(&self) -> Box<dyn CloneableRng>;
}

impl<R: RngCore + Clone + 'static> CloneableRng for R {
    fn clone_rng(&self) -> Box<dyn CloneableRng> {
        Box::new(self.clone())
    }
}

/// The random source every arbitrary draws from.
///
/// Wraps an arbitrary clonable PRNG behind a uniform-draw interface. All
/// randomness in the engine flows through a `Rand` passed explicitly into
/// `generate`; arbitraries themselves hold no random state.
pub struct Rand {
    inner: Box<dyn CloneableRng>,
}

impl Rand {
    /// Create a random source from any clonable PRNG
    pub fn new<R: RngCore + Clone + 'static>(rng: R) -> Self {
        Self {
            inner: Box::new(rng),
        }
    }

    /// Draw a uniform integer in the inclusive range `[min, max]`
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        assert!(
            min <= max,
            "invalid draw range: min {} exceeds max {}",
            min,
            max
        );
        self.inner.gen_range(min..=max)
    }

    /// Draw a uniform wide integer in the inclusive range `[min, max]`
    pub fn next_big_int(&mut self, min: i128, max: i128) -> i128 {
        assert!(
            min <= max,
            "invalid draw range: min {} exceeds max {}",
            min,
            max
        );
        self.inner.gen_range(min..=max)
    }

    /// Draw a uniform double in `[0, 1)`
    pub fn next_double(&mut self) -> f64 {
        self.inner.gen_range(0.0..1.0)
    }
}

impl Clone for Rand {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_rng(),
        }
    }
}

impl std::fmt::Debug for Rand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rand").finish_non_exhaustive()
    }
}

/// Trait for providing random number generators
pub trait RngProvider: Send + Sync {
    /// The type of RNG this provider creates
    type Rng: RngCore + Clone + Send + 'static;

    /// Create a new RNG instance with an optional seed
    fn create_rng(&self, seed: Option<u64>) -> Self::Rng;
}

/// Default RNG provider using the `rand` crate's `StdRng`
#[derive(Debug, Clone)]
pub struct DefaultRngProvider;

impl RngProvider for DefaultRngProvider {
    type Rng = StdRng;

    fn create_rng(&self, seed: Option<u64>) -> Self::Rng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Create a random source seeded from system entropy
pub fn create_rng() -> Rand {
    Rand::new(DefaultRngProvider.create_rng(None))
}

/// Create a random source with a specific seed, for reproducible runs
pub fn create_seeded_rng(seed: u64) -> Rand {
    Rand::new(DefaultRngProvider.create_rng(Some(seed)))
}
