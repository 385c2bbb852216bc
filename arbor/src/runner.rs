//! Test execution: the generate/run/shrink loop and seed/path replay.

use crate::arbitrary::Arbitrary;
use crate::config::TestConfig;
use crate::error::{PropertyError, PropertyResult, TestFailure, TestSuccess};
use crate::property::{AsyncProperty, Property, PropertyHarness, RunOutcome};
use crate::rng::create_seeded_rng;
use crate::value::Value;

/// Execute a property test with the default configuration
pub fn check<A, P>(arbitrary: A, property: P) -> PropertyResult<A::Item>
where
    A: Arbitrary,
    P: Property<A::Item>,
{
    check_with_config(arbitrary, property, TestConfig::default())
}

/// Execute a property test.
///
/// Generates `config.iterations` cases, discarding precondition skips. On
/// the first failure a greedy shrink search runs: candidates are taken in
/// stream order and the first still-failing one is accepted, round after
/// round, within the `max_shrink_iterations` budget. The reported failure
/// carries the seed and the path needed for exact replay.
pub fn check_with_config<A, P>(
    arbitrary: A,
    property: P,
    config: TestConfig,
) -> PropertyResult<A::Item>
where
    A: Arbitrary,
    P: Property<A::Item>,
{
    let seed = config.seed.unwrap_or_else(rand::random);
    let harness = PropertyHarness::new(arbitrary, property).with_bias(config.bias.clone());
    let mut rng = create_seeded_rng(seed);
    let mut discarded = 0;

    for iteration in 0..config.iterations {
        let value = harness.generate(&mut rng, Some(iteration));
        match harness.run(&value) {
            RunOutcome::Success => continue,
            RunOutcome::PreconditionSkip => {
                discarded += 1;
                continue;
            }
            RunOutcome::Failure(message) => {
                let search = shrink_search(&harness, &value, &config);
                return Err(assemble_failure(
                    message, value, search, seed, iteration, config,
                ));
            }
        }
    }

    Ok(TestSuccess {
        iterations: config.iterations,
        discarded,
        config,
    })
}

/// Execute an async property test with the default configuration
pub async fn check_async<A, P>(arbitrary: A, property: P) -> PropertyResult<A::Item>
where
    A: Arbitrary,
    P: AsyncProperty<A::Item>,
{
    check_async_with_config(arbitrary, property, TestConfig::default()).await
}

/// Execute an async property test.
///
/// Identical to [`check_with_config`] except that each predicate invocation
/// is awaited; cases and shrink candidates still run strictly sequentially.
pub async fn check_async_with_config<A, P>(
    arbitrary: A,
    property: P,
    config: TestConfig,
) -> PropertyResult<A::Item>
where
    A: Arbitrary,
    P: AsyncProperty<A::Item>,
{
    let seed = config.seed.unwrap_or_else(rand::random);
    let harness = PropertyHarness::new(arbitrary, property).with_bias(config.bias.clone());
    let mut rng = create_seeded_rng(seed);
    let mut discarded = 0;

    for iteration in 0..config.iterations {
        let value = harness.generate(&mut rng, Some(iteration));
        match harness.run_async(&value).await {
            RunOutcome::Success => continue,
            RunOutcome::PreconditionSkip => {
                discarded += 1;
                continue;
            }
            RunOutcome::Failure(message) => {
                let search = shrink_search_async(&harness, &value, &config).await;
                return Err(assemble_failure(
                    message, value, search, seed, iteration, config,
                ));
            }
        }
    }

    Ok(TestSuccess {
        iterations: config.iterations,
        discarded,
        config,
    })
}

struct ShrinkSearch<T> {
    minimal: Option<Value<T>>,
    accepted: usize,
    path: Vec<usize>,
    budget_exhausted: bool,
}

fn assemble_failure<T: Clone + 'static>(
    message: String,
    original: Value<T>,
    search: ShrinkSearch<T>,
    seed: u64,
    iteration: usize,
    config: TestConfig,
) -> TestFailure<T> {
    let mut path = vec![iteration];
    path.extend(search.path);
    let error = if search.budget_exhausted {
        PropertyError::ShrinkBudgetExhausted {
            iterations: config.max_shrink_iterations,
        }
    } else {
        PropertyError::property_failed_with_context(message, None::<String>, Some(iteration))
    };
    TestFailure {
        error,
        original_input: original.value(),
        shrunk_input: search.minimal.map(|v| v.into_inner()),
        shrink_steps: search.accepted,
        seed,
        path,
        failed_iteration: iteration,
        config,
    }
}

/// Greedy descent: per round, accept the first still-failing candidate and
/// record its index, until a round yields no progress or the evaluation
/// budget runs out. Precondition skips never count as reproductions.
fn shrink_search<A, P>(
    harness: &PropertyHarness<A, P>,
    failing: &Value<A::Item>,
    config: &TestConfig,
) -> ShrinkSearch<A::Item>
where
    A: Arbitrary,
    P: Property<A::Item>,
{
    let mut current = failing.clone();
    let mut accepted = 0;
    let mut evaluated = 0;
    let mut path = Vec::new();
    let mut budget_exhausted = false;

    'rounds: loop {
        let mut advanced = false;
        for (index, candidate) in harness.shrink(&current).enumerate() {
            if evaluated >= config.max_shrink_iterations {
                budget_exhausted = true;
                break 'rounds;
            }
            evaluated += 1;
            if let RunOutcome::Failure(_) = harness.run(&candidate) {
                current = candidate;
                path.push(index);
                accepted += 1;
                advanced = true;
                break;
            }
        }
        if !advanced {
            break;
        }
    }

    ShrinkSearch {
        minimal: (accepted > 0).then_some(current),
        accepted,
        path,
        budget_exhausted,
    }
}

async fn shrink_search_async<A, P>(
    harness: &PropertyHarness<A, P>,
    failing: &Value<A::Item>,
    config: &TestConfig,
) -> ShrinkSearch<A::Item>
where
    A: Arbitrary,
    P: AsyncProperty<A::Item>,
{
    let mut current = failing.clone();
    let mut accepted = 0;
    let mut evaluated = 0;
    let mut path = Vec::new();
    let mut budget_exhausted = false;

    'rounds: loop {
        let mut advanced = false;
        let candidates: Vec<Value<A::Item>> = harness.shrink(&current).collect();
        for (index, candidate) in candidates.into_iter().enumerate() {
            if evaluated >= config.max_shrink_iterations {
                budget_exhausted = true;
                break 'rounds;
            }
            evaluated += 1;
            if let RunOutcome::Failure(_) = harness.run_async(&candidate).await {
                current = candidate;
                path.push(index);
                accepted += 1;
                advanced = true;
                break;
            }
        }
        if !advanced {
            break;
        }
    }

    ShrinkSearch {
        minimal: (accepted > 0).then_some(current),
        accepted,
        path,
        budget_exhausted,
    }
}

/// Re-derive the exact value a failure reported, from its seed and path.
///
/// The first path entry is the failing case index; every later entry is the
/// index of the shrink candidate accepted in that round. Returns `None` when
/// the path does not resolve, which means it was not produced by this
/// arbitrary and configuration.
pub fn replay<A>(arbitrary: &A, seed: u64, path: &[usize], config: &TestConfig) -> Option<Value<A::Item>>
where
    A: Arbitrary,
{
    let (&case_index, shrink_path) = path.split_first()?;
    let mut rng = create_seeded_rng(seed);

    let mut value = None;
    for run_id in 0..=case_index {
        let bias = config.bias.factor_for(run_id);
        let mut ctx = crate::arbitrary::GenContext::new(bias);
        value = Some(arbitrary.generate(&mut rng, &mut ctx));
    }
    let mut value = value?;

    for &choice in shrink_path {
        value = arbitrary
            .shrink(value.as_inner(), value.context())
            .nth(choice)?;
    }
    Some(value)
}
