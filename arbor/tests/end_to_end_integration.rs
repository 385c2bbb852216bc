//! Driving the whole engine through the runner: failure, shrinking, replay.

use arbor::{
    Arbitrary, ArrayConstraints, PropertyError, RecordConstraints, TestConfig, array, check,
    check_with_config, integer, pre, record, replay, unique_array,
};

#[test]
fn passing_property_reports_all_iterations() {
    let success = check(integer(0i64, 10), |n: i64| {
        if (0..=10).contains(&n) {
            Ok(())
        } else {
            Err(PropertyError::property_failed("outside the domain"))
        }
    })
    .unwrap();
    assert_eq!(success.iterations, 100);
}

#[test]
fn failing_property_is_shrunk_to_the_minimal_counterexample() {
    let config = TestConfig::default().with_seed(31_337);
    let failure = check_with_config(
        array(integer(0i64, 1000), ArrayConstraints::length(0, 20)),
        |items: Vec<i64>| {
            // Fails as soon as anything reaches 10
            if items.iter().all(|n| *n < 10) {
                Ok(())
            } else {
                Err(PropertyError::property_failed("found a big item"))
            }
        },
        config,
    )
    .unwrap_err();

    let minimal = failure.minimal_input();
    // The canonical counterexample leads with the boundary item; anything
    // after it has been narrowed to zero (front-dropping never removes the
    // suffix behind the failing item)
    assert_eq!(minimal.first(), Some(&10));
    assert!(minimal[1..].iter().all(|n| *n == 0));
}

#[test]
fn tuple_failures_shrink_each_field_independently() {
    let config = TestConfig::default().with_seed(555);
    let arbitrary = (integer(0i64, 1000).shared(), integer(0i64, 1000).shared());
    let failure = check_with_config(
        arbitrary,
        |(a, b): (i64, i64)| {
            if a < 7 || b < 3 {
                Ok(())
            } else {
                Err(PropertyError::property_failed("both crossed"))
            }
        },
        config,
    )
    .unwrap_err();

    // Each coordinate is minimized while the failure persists
    assert_eq!(*failure.minimal_input(), (7, 3));
}

#[test]
fn unique_array_failures_keep_the_invariant_while_shrinking() {
    let config = TestConfig::default().with_seed(808);
    let failure = check_with_config(
        unique_array(integer(0i64, 100), ArrayConstraints::length(0, 12)),
        |items: Vec<i64>| {
            if items.len() < 3 {
                Ok(())
            } else {
                Err(PropertyError::property_failed("three distinct items"))
            }
        },
        config,
    )
    .unwrap_err();

    let minimal = failure.minimal_input();
    assert_eq!(minimal.len(), 3);
    for i in 0..minimal.len() {
        for j in (i + 1)..minimal.len() {
            assert_ne!(minimal[i], minimal[j]);
        }
    }
}

#[test]
fn record_failures_shed_optional_keys() {
    let config = TestConfig::default().with_seed(2718);
    let build = || {
        record(
            vec![
                ("count", integer(0i64, 100).shared()),
                ("extra", integer(0i64, 100).shared()),
            ],
            RecordConstraints {
                required_keys: Some(vec!["count".to_string()]),
                ..RecordConstraints::default()
            },
        )
    };
    let failure = check_with_config(
        build(),
        |map: std::collections::BTreeMap<String, i64>| {
            if map.get("count").is_some_and(|c| *c < 5) {
                Ok(())
            } else {
                Err(PropertyError::property_failed("count reached 5"))
            }
        },
        config,
    )
    .unwrap_err();

    let minimal = failure.minimal_input();
    // The optional key is gone, the required one sits at its boundary
    assert_eq!(minimal.get("count"), Some(&5));
    assert!(!minimal.contains_key("extra"));
}

#[test]
fn reported_failures_replay_exactly() {
    let config = TestConfig::default().with_seed(123_456);
    let failure = check_with_config(
        array(integer(0i64, 50), ArrayConstraints::length(0, 10)),
        |items: Vec<i64>| {
            if items.iter().sum::<i64>() <= 60 {
                Ok(())
            } else {
                Err(PropertyError::property_failed("sum overflow"))
            }
        },
        config.clone(),
    )
    .unwrap_err();

    let arbitrary = array(integer(0i64, 50), ArrayConstraints::length(0, 10));
    let replayed =
        replay(&arbitrary, failure.seed, &failure.path, &config).expect("path must resolve");
    assert_eq!(replayed.as_inner(), failure.minimal_input());

    // Replaying only the case index reproduces the original failing input
    let original = replay(&arbitrary, failure.seed, &failure.path[..1], &config)
        .expect("case index must resolve");
    assert_eq!(*original.as_inner(), failure.original_input);
}

#[test]
fn preconditions_discard_without_failing_or_shrinking() {
    let success = check(integer(0i64, 100), |n: i64| {
        pre(n % 10 == 0)?;
        if n <= 100 {
            Ok(())
        } else {
            Err(PropertyError::property_failed("impossible"))
        }
    })
    .unwrap();
    assert!(success.discarded > 0);
    assert_eq!(success.iterations, 100);
}

#[test]
fn filtered_domains_flow_through_the_runner() {
    let config = TestConfig::default().with_seed(404);
    let failure = check_with_config(
        integer(0i64, 10_000).filter(|n| n % 2 == 0),
        |n: i64| {
            if n < 100 {
                Ok(())
            } else {
                Err(PropertyError::property_failed("even and large"))
            }
        },
        config,
    )
    .unwrap_err();

    // The minimal even counterexample
    assert_eq!(*failure.minimal_input(), 100);
}
