//! Property definitions and the steppable harness the runner drives.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use crate::arbitrary::{Arbitrary, GenContext, ValueStream};
use crate::config::BiasSchedule;
use crate::error::PropertyError;
use crate::rng::Rand;
use crate::value::Value;

/// Property definition trait for synchronous testing
pub trait Property<T> {
    /// Test the property with the given input
    fn test(&self, input: T) -> Result<(), PropertyError>;
}

impl<T, F> Property<T> for F
where
    F: Fn(T) -> Result<(), PropertyError>,
{
    fn test(&self, input: T) -> Result<(), PropertyError> {
        self(input)
    }
}

/// Async property trait for asynchronous testing
pub trait AsyncProperty<T> {
    /// Test the property asynchronously with the given input
    fn test(
        &self,
        input: T,
    ) -> impl std::future::Future<Output = Result<(), PropertyError>> + Send;
}

impl<T, F, Fut> AsyncProperty<T> for F
where
    F: Fn(T) -> Fut,
    Fut: std::future::Future<Output = Result<(), PropertyError>> + Send,
{
    fn test(
        &self,
        input: T,
    ) -> impl std::future::Future<Output = Result<(), PropertyError>> + Send {
        self(input)
    }
}

/// Signal a test-case precondition.
///
/// Returns the discard signal when the condition does not hold; the runner
/// drops the case without counting it as a failure and without shrinking.
pub fn pre(condition: bool) -> Result<(), PropertyError> {
    if condition {
        Ok(())
    } else {
        Err(PropertyError::precondition_failed())
    }
}

/// Outcome of running a predicate against one generated value
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The predicate held
    Success,
    /// The predicate failed or panicked, with the captured message
    Failure(String),
    /// A precondition rejected the case; discard it
    PreconditionSkip,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "predicate panicked".to_string()
    }
}

/// Adapts an arbitrary plus a predicate into the steppable unit the runner
/// drives: `generate`, `run`, `shrink`.
///
/// `before_each`/`after_each` hooks bracket every predicate invocation,
/// including precondition-skip and panic paths.
pub struct PropertyHarness<A, P> {
    arbitrary: A,
    property: P,
    bias: BiasSchedule,
    before_each: Option<Rc<dyn Fn()>>,
    after_each: Option<Rc<dyn Fn()>>,
}

impl<A, P> PropertyHarness<A, P>
where
    A: Arbitrary,
{
    /// Wrap an arbitrary and a predicate
    pub fn new(arbitrary: A, property: P) -> Self {
        Self {
            arbitrary,
            property,
            bias: BiasSchedule::default(),
            before_each: None,
            after_each: None,
        }
    }

    /// Override the bias schedule
    pub fn with_bias(mut self, bias: BiasSchedule) -> Self {
        self.bias = bias;
        self
    }

    /// Install a hook running before every predicate invocation
    pub fn before_each(mut self, hook: impl Fn() + 'static) -> Self {
        self.before_each = Some(Rc::new(hook));
        self
    }

    /// Install a hook running after every predicate invocation
    pub fn after_each(mut self, hook: impl Fn() + 'static) -> Self {
        self.after_each = Some(Rc::new(hook));
        self
    }

    /// Generate the input for the given run; the run index selects the bias
    /// factor from the schedule, `None` disables bias
    pub fn generate(&self, rng: &mut Rand, run_id: Option<usize>) -> Value<A::Item> {
        let bias = run_id.and_then(|id| self.bias.factor_for(id));
        let mut ctx = GenContext::new(bias);
        self.arbitrary.generate(rng, &mut ctx)
    }

    /// Enumerate shrink candidates for a failing value using its carried
    /// context
    pub fn shrink(&self, value: &Value<A::Item>) -> ValueStream<A::Item> {
        self.arbitrary.shrink(value.as_inner(), value.context())
    }

    /// The wrapped arbitrary
    pub fn arbitrary(&self) -> &A {
        &self.arbitrary
    }
}

impl<A, P> PropertyHarness<A, P>
where
    A: Arbitrary,
    P: Property<A::Item>,
{
    /// Run the predicate against one value.
    ///
    /// The value is read as an independent copy, so a mutating predicate
    /// cannot corrupt the shrink history. Panics are captured and reported
    /// as failures; the `after_each` hook runs on every path.
    pub fn run(&self, value: &Value<A::Item>) -> RunOutcome {
        if let Some(hook) = &self.before_each {
            hook();
        }

        let input = value.value();
        let outcome = match catch_unwind(AssertUnwindSafe(|| self.property.test(input))) {
            Ok(Ok(())) => RunOutcome::Success,
            Ok(Err(error)) if error.is_precondition() => RunOutcome::PreconditionSkip,
            Ok(Err(error)) => RunOutcome::Failure(error.to_string()),
            Err(payload) => RunOutcome::Failure(panic_message(payload)),
        };

        if let Some(hook) = &self.after_each {
            hook();
        }
        outcome
    }
}

impl<A, P> PropertyHarness<A, P>
where
    A: Arbitrary,
    P: AsyncProperty<A::Item>,
{
    /// Run the async predicate against one value.
    ///
    /// Generation and shrinking stay fully synchronous; this is the only
    /// suspension point, and the runner awaits each case before the next.
    pub async fn run_async(&self, value: &Value<A::Item>) -> RunOutcome {
        if let Some(hook) = &self.before_each {
            hook();
        }

        let input = value.value();
        let outcome = match self.property.test(input).await {
            Ok(()) => RunOutcome::Success,
            Err(error) if error.is_precondition() => RunOutcome::PreconditionSkip,
            Err(error) => RunOutcome::Failure(error.to_string()),
        };

        if let Some(hook) = &self.after_each {
            hook();
        }
        outcome
    }
}
