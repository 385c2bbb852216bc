//! Error types and result carriers for property-based testing.

use std::fmt;

use crate::config::TestConfig;

/// Comprehensive error type for property testing failures
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// Property test failed with a specific message and optional context
    PropertyFailed {
        message: String,
        context: Option<String>,
        iteration: Option<usize>,
    },

    /// A precondition of the test case did not hold: the case is discarded,
    /// not counted as a failure and never shrunk
    PreconditionFailed { label: Option<String> },

    /// Generation of test data failed
    GenerationFailed {
        message: String,
        context: Option<String>,
    },

    /// The shrink search stopped because its iteration budget ran out
    ShrinkBudgetExhausted { iterations: usize },
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyError::PropertyFailed {
                message,
                context,
                iteration,
            } => {
                write!(f, "Property failed: {}", message)?;
                if let Some(ctx) = context {
                    write!(f, " (context: {})", ctx)?;
                }
                if let Some(iter) = iteration {
                    write!(f, " (iteration: {})", iter)?;
                }
                Ok(())
            }
            PropertyError::PreconditionFailed { label } => {
                write!(f, "Precondition failed")?;
                if let Some(label) = label {
                    write!(f, ": {}", label)?;
                }
                Ok(())
            }
            PropertyError::GenerationFailed { message, context } => {
                write!(f, "Generation failed: {}", message)?;
                if let Some(ctx) = context {
                    write!(f, " (context: {})", ctx)?;
                }
                Ok(())
            }
            PropertyError::ShrinkBudgetExhausted { iterations } => {
                write!(f, "Shrink budget exhausted after {} iterations", iterations)
            }
        }
    }
}

impl std::error::Error for PropertyError {}

/// Helper functions for creating `PropertyError` instances with context
impl PropertyError {
    /// Create a simple property failed error
    pub fn property_failed(message: impl Into<String>) -> Self {
        Self::PropertyFailed {
            message: message.into(),
            context: None,
            iteration: None,
        }
    }

    /// Create a property failed error with context
    pub fn property_failed_with_context(
        message: impl Into<String>,
        context: Option<impl Into<String>>,
        iteration: Option<usize>,
    ) -> Self {
        Self::PropertyFailed {
            message: message.into(),
            context: context.map(|c| c.into()),
            iteration,
        }
    }

    /// Create the precondition-discard signal
    pub fn precondition_failed() -> Self {
        Self::PreconditionFailed { label: None }
    }

    /// Create a labelled precondition-discard signal
    pub fn precondition_failed_with_label(label: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            label: Some(label.into()),
        }
    }

    /// Create a generation failed error with context
    pub fn generation_failed_with_context(
        message: impl Into<String>,
        context: Option<impl Into<String>>,
    ) -> Self {
        Self::GenerationFailed {
            message: message.into(),
            context: context.map(|c| c.into()),
        }
    }

    /// Whether this error is the precondition-discard signal rather than a
    /// genuine failure
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }
}

/// Signal that a value could not have been produced by an arbitrary.
///
/// Returned by unmappers when asked to invert a value outside their image.
/// Callers on the shrink-without-context path treat it as "not applicable
/// here", never as a defect.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmapError {
    message: String,
}

impl UnmapError {
    /// Create an unmap error describing the unsupported value
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for UnmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported value: {}", self.message)
    }
}

impl std::error::Error for UnmapError {}

/// Result of a property test execution
pub type PropertyResult<T> = Result<TestSuccess, TestFailure<T>>;

/// Information about a successful test run
#[derive(Debug, Clone)]
pub struct TestSuccess {
    /// Number of iterations completed
    pub iterations: usize,
    /// Number of cases discarded through precondition failures
    pub discarded: usize,
    /// Test configuration used
    pub config: TestConfig,
}

/// Information about a failed test run.
///
/// A failure is fully reproducible from `seed` and `path`: the first path
/// entry is the failing case index, each later entry is the index of the
/// shrink candidate that was accepted in that round.
#[derive(Debug, Clone)]
pub struct TestFailure<T> {
    /// The error that caused the failure
    pub error: PropertyError,
    /// Original input that caused the failure
    pub original_input: T,
    /// Shrunk input (if shrinking made progress)
    pub shrunk_input: Option<T>,
    /// Number of accepted shrink steps
    pub shrink_steps: usize,
    /// Seed the run was started from
    pub seed: u64,
    /// Replay path: failing case index followed by accepted candidate indices
    pub path: Vec<usize>,
    /// Iteration number where the failure occurred
    pub failed_iteration: usize,
    /// Test configuration used
    pub config: TestConfig,
}

impl<T> TestFailure<T> {
    /// The minimal known failing input
    pub fn minimal_input(&self) -> &T {
        self.shrunk_input.as_ref().unwrap_or(&self.original_input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_error_display() {
        let error = PropertyError::property_failed("test failed");
        assert_eq!(format!("{}", error), "Property failed: test failed");

        let error = PropertyError::property_failed_with_context(
            "out of range",
            Some("array item"),
            Some(7),
        );
        assert_eq!(
            format!("{}", error),
            "Property failed: out of range (context: array item) (iteration: 7)"
        );

        let error = PropertyError::precondition_failed_with_label("non-empty input");
        assert_eq!(format!("{}", error), "Precondition failed: non-empty input");
    }

    #[test]
    fn test_precondition_detection() {
        assert!(PropertyError::precondition_failed().is_precondition());
        assert!(!PropertyError::property_failed("boom").is_precondition());
    }

    #[test]
    fn test_unmap_error_display() {
        let error = UnmapError::new("length 5 is not a multiple of 4");
        assert_eq!(
            format!("{}", error),
            "Unsupported value: length 5 is not a multiple of 4"
        );
    }

    #[test]
    fn test_minimal_input_prefers_shrunk() {
        let failure = TestFailure {
            error: PropertyError::property_failed("boom"),
            original_input: 100,
            shrunk_input: Some(3),
            shrink_steps: 4,
            seed: 99,
            path: vec![0, 1, 1, 0, 2],
            failed_iteration: 0,
            config: TestConfig::default(),
        };
        assert_eq!(*failure.minimal_input(), 3);

        let failure = TestFailure {
            shrunk_input: None,
            ..failure
        };
        assert_eq!(*failure.minimal_input(), 100);
    }
}
