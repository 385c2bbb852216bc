//! Engine-level invariants: determinism, shrink validity, termination,
//! length bounds, uniqueness, round trips.

use arbor::{
    ArrayConstraints, Arbitrary, GenContext, ShrinkContext, Uniqueness, alphanumeric_string,
    array, base64_string, boolean, create_seeded_rng, double, integer, option, unique_array,
    unique_array_by,
};

/// Generating twice from clones of the same seed yields identical values.
#[test]
fn generation_is_deterministic_across_rng_clones() {
    let arb = array(integer(-1000i64, 1000), ArrayConstraints::length(0, 12));
    for seed in [0u64, 1, 42, 987_654_321] {
        for bias in [None, Some(2), Some(10)] {
            let mut first_rng = create_seeded_rng(seed);
            let mut second_rng = first_rng.clone();
            let mut first_ctx = GenContext::new(bias);
            let mut second_ctx = GenContext::new(bias);

            for _ in 0..30 {
                let a = arb.generate(&mut first_rng, &mut first_ctx);
                let b = arb.generate(&mut second_rng, &mut second_ctx);
                assert_eq!(a.as_inner(), b.as_inner());
            }
        }
    }
}

/// Every shrink candidate is itself accepted by the producing arbitrary.
#[test]
fn shrink_candidates_are_always_valid() {
    let arb = array(integer(0i64, 50), ArrayConstraints::length(1, 8));
    let mut rng = create_seeded_rng(7);
    let mut ctx = GenContext::new(Some(2));

    for _ in 0..100 {
        let value = arb.generate(&mut rng, &mut ctx);
        assert!(arb.can_generate_without_context(value.as_inner()));
        for candidate in arb.shrink(value.as_inner(), value.context()).take(300) {
            assert!(
                arb.can_generate_without_context(candidate.as_inner()),
                "invalid candidate {:?}",
                candidate.as_inner()
            );
        }
    }
}

/// Greedily accepting the first candidate always reaches a fixed point.
#[test]
fn shrinking_terminates_at_a_fixed_point() {
    let arb = array(integer(0i64, 1_000_000), ArrayConstraints::length(2, 10));
    let mut rng = create_seeded_rng(99);
    let mut ctx = GenContext::unbiased();

    for _ in 0..25 {
        let mut current = arb.generate(&mut rng, &mut ctx);
        let mut steps = 0;
        while let Some(next) = arb.shrink(current.as_inner(), current.context()).next() {
            current = next;
            steps += 1;
            assert!(steps < 10_000, "no fixed point reached");
        }
        // Fully shrunk: minimal length, all items at their target
        assert_eq!(current.as_inner().len(), 2);
        assert!(current.as_inner().iter().all(|n| *n == 0));
    }
}

/// Generated and shrunk lengths stay inside the configured bounds.
#[test]
fn length_bounds_hold_through_generation_and_shrinking() {
    let arb = array(integer(0i64, 10), ArrayConstraints::length(2, 2));
    let mut rng = create_seeded_rng(5);
    let mut ctx = GenContext::new(Some(2));

    for _ in 0..200 {
        let value = arb.generate(&mut rng, &mut ctx);
        assert_eq!(value.as_inner().len(), 2);
        assert!(value.as_inner().iter().all(|n| (0..=10).contains(n)));
        for candidate in arb.shrink(value.as_inner(), value.context()) {
            assert_eq!(candidate.as_inner().len(), 2);
            assert!(candidate.as_inner().iter().all(|n| (0..=10).contains(n)));
        }
    }
}

/// Shrinking a unique array never proposes a duplicate and lands on a
/// minimal array still satisfying the length bound.
#[test]
fn unique_array_shrink_preserves_uniqueness_to_the_end() {
    let arb = unique_array(integer(0i64, 20), ArrayConstraints::length(2, 10));
    let external = vec![2i64, 4, 8];
    assert!(arb.can_generate_without_context(&external));

    // Greedy search against a predicate failing for every length >= 2
    let mut current = external;
    let mut context = ShrinkContext::None;
    let mut steps = 0;
    loop {
        let accepted = arb.shrink(&current, &context).find(|candidate| {
            let items = candidate.as_inner();
            assert!(
                items.len() >= 2,
                "proposed a too-short candidate {:?}",
                items
            );
            for i in 0..items.len() {
                for j in (i + 1)..items.len() {
                    assert_ne!(items[i], items[j], "proposed duplicate in {:?}", items);
                }
            }
            items.len() >= 2
        });
        match accepted {
            Some(candidate) => {
                context = candidate.context().clone();
                current = candidate.into_inner();
            }
            None => break,
        }
        steps += 1;
        assert!(steps < 1000, "shrink search did not converge");
    }
    assert_eq!(current.len(), 2);
}

/// Uniqueness holds under generation for every built-in equivalence.
#[test]
fn generated_unique_arrays_respect_the_comparator() {
    let mut rng = create_seeded_rng(31);
    let mut ctx = GenContext::new(Some(3));

    let strict = unique_array(integer(-5i64, 5), ArrayConstraints::length(0, 9));
    for _ in 0..100 {
        let value = strict.generate(&mut rng, &mut ctx);
        assert!(strict.can_generate_without_context(value.as_inner()));
    }

    let by_magnitude = unique_array_by(
        integer(-50i64, 50),
        ArrayConstraints::length(0, 9),
        |n: &i64| n.abs(),
        Uniqueness::StrictEqual,
    );
    for _ in 0..100 {
        let value = by_magnitude.generate(&mut rng, &mut ctx);
        let magnitudes: Vec<i64> = value.as_inner().iter().map(|n| n.abs()).collect();
        for i in 0..magnitudes.len() {
            for j in (i + 1)..magnitudes.len() {
                assert_ne!(magnitudes[i], magnitudes[j]);
            }
        }
    }

    let same_value_zero = unique_array_by(
        double(-1.0, 1.0),
        ArrayConstraints::length(0, 6),
        |v: &f64| *v,
        Uniqueness::SameValueZero,
    );
    for _ in 0..100 {
        let value = same_value_zero.generate(&mut rng, &mut ctx);
        assert!(same_value_zero.can_generate_without_context(value.as_inner()));
    }
}

/// Booleans come from the `[0, 1]` integer domain and both are reachable.
#[test]
fn boolean_values_are_exactly_the_two_mapped_integers() {
    let arb = boolean();
    let mut rng = create_seeded_rng(3);
    let mut ctx = GenContext::new(Some(2));

    let mut seen = [false, false];
    for _ in 0..200 {
        let value = arb.generate(&mut rng, &mut ctx);
        seen[usize::from(*value.as_inner())] = true;
        assert!(arb.can_generate_without_context(value.as_inner()));
    }
    assert!(seen[0] && seen[1]);
}

/// Mapped string arbitraries accept exactly their own image.
#[test]
fn mapped_round_trips_accept_the_image_and_nothing_else() {
    let alpha = alphanumeric_string(ArrayConstraints::length(0, 16));
    let mut rng = create_seeded_rng(8);
    let mut ctx = GenContext::unbiased();
    for _ in 0..100 {
        let value = alpha.generate(&mut rng, &mut ctx);
        assert!(alpha.can_generate_without_context(value.as_inner()));
    }
    assert!(!alpha.can_generate_without_context(&"white space".to_string()));

    let b64 = base64_string(ArrayConstraints::length(4, 16));
    let mut rng = create_seeded_rng(9);
    for _ in 0..100 {
        let value = b64.generate(&mut rng, &mut ctx);
        assert_eq!(value.as_inner().len() % 4, 0);
        assert!(b64.can_generate_without_context(value.as_inner()));
    }
}

/// Optional slots shrink toward absence before anything else.
#[test]
fn option_prefers_absence_when_shrinking() {
    let arb = option(integer(1i64, 100));
    let mut rng = create_seeded_rng(4);
    let mut ctx = GenContext::unbiased();

    for _ in 0..100 {
        let value = arb.generate(&mut rng, &mut ctx);
        if value.as_inner().is_some() {
            let first = arb
                .shrink(value.as_inner(), value.context())
                .next()
                .expect("a present value must shrink");
            assert_eq!(*first.as_inner(), None);
        }
    }
}
