//! Configuration types for controlling test runs and bias scheduling.

use std::fmt;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid number of iterations (must be > 0)
    InvalidIterations(usize),
    /// Invalid number of shrink iterations (must be > 0)
    InvalidShrinkIterations(usize),
    /// Invalid bias schedule (base must be >= 1 and cap >= base)
    InvalidBiasSchedule { base: u64, cap: u64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidIterations(n) => {
                write!(f, "Invalid iterations count: {} (must be > 0)", n)
            }
            ConfigError::InvalidShrinkIterations(n) => {
                write!(f, "Invalid shrink iterations count: {} (must be > 0)", n)
            }
            ConfigError::InvalidBiasSchedule { base, cap } => {
                write!(
                    f,
                    "Invalid bias schedule: base {} / cap {} (base must be >= 1 and cap >= base)",
                    base, cap
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Maps a run index to the bias factor handed to `generate`.
///
/// A factor of `f` means edge-case steering fires with probability `1/f`,
/// so smaller factors bias harder. The schedule is a probability knob only:
/// disabling it never changes the supported value domain.
#[derive(Debug, Clone, PartialEq)]
pub enum BiasSchedule {
    /// Never bias generation
    Unbiased,
    /// Bias strongly on early runs, fading as the run index grows
    Fading { base: u64, cap: u64 },
}

impl BiasSchedule {
    /// The bias factor to use for the given run index, `None` for unbiased
    pub fn factor_for(&self, run_id: usize) -> Option<u64> {
        match self {
            BiasSchedule::Unbiased => None,
            BiasSchedule::Fading { base, cap } => {
                Some((*cap).min(base.saturating_add(run_id as u64 / 10)))
            }
        }
    }
}

impl Default for BiasSchedule {
    fn default() -> Self {
        BiasSchedule::Fading { base: 2, cap: 100 }
    }
}

/// Configuration for individual property tests
#[derive(Debug, Clone, PartialEq)]
pub struct TestConfig {
    /// Number of test iterations to run
    pub iterations: usize,
    /// Maximum number of shrink candidates to evaluate after a failure
    pub max_shrink_iterations: usize,
    /// Optional seed for reproducible tests
    pub seed: Option<u64>,
    /// Bias schedule applied across the run
    pub bias: BiasSchedule,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            max_shrink_iterations: 1000,
            seed: None,
            bias: BiasSchedule::default(),
        }
    }
}

impl TestConfig {
    /// Create a new test configuration with validation
    pub fn new(
        iterations: usize,
        max_shrink_iterations: usize,
        seed: Option<u64>,
        bias: BiasSchedule,
    ) -> Result<Self, ConfigError> {
        if iterations == 0 {
            return Err(ConfigError::InvalidIterations(iterations));
        }
        if max_shrink_iterations == 0 {
            return Err(ConfigError::InvalidShrinkIterations(max_shrink_iterations));
        }
        if let BiasSchedule::Fading { base, cap } = bias {
            if base == 0 || cap < base {
                return Err(ConfigError::InvalidBiasSchedule { base, cap });
            }
        }

        Ok(Self {
            iterations,
            max_shrink_iterations,
            seed,
            bias,
        })
    }

    /// Derive a configuration with a fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Derive a configuration with a different iteration count
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
}
