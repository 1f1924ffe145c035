//! End-to-end behaviour of the execution engine

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use suite_runner::models::{flatten, AssertionError, AssertionReport};
use suite_runner::{
    assert, group, run_tests, GroupOutcome, ShardingError, Strategy, SuiteError, SuiteSummary,
    TestError, TestOutcome, TestUnit, UnitOutcome,
};

type Calls = Arc<Mutex<HashMap<String, usize>>>;

fn recorded(name: &str, calls: &Calls, pass: bool) -> TestUnit {
    let calls = calls.clone();
    let key = name.to_string();
    suite_runner::test(name, move || {
        *calls.lock().unwrap().entry(key.clone()).or_default() += 1;
        async move {
            if pass {
                assert::equal("foo", "foo")
            } else {
                assert::option(None::<&str>, |v| assert::equal("foo", v))
            }
        }
    })
}

fn nested_suite(calls: &Calls) -> Vec<TestUnit> {
    vec![
        recorded("one", calls, true),
        group(
            "outer",
            vec![
                recorded("two", calls, true),
                group("inner", vec![recorded("three", calls, true), recorded("four", calls, true)]),
                group("empty", vec![]),
            ],
        ),
        recorded("five", calls, true),
        recorded("six", calls, true),
    ]
}

fn shape(outcomes: &[UnitOutcome]) -> Vec<String> {
    let mut names = Vec::new();
    for outcome in outcomes {
        match outcome {
            UnitOutcome::Test(t) => names.push(t.name().to_string()),
            UnitOutcome::Group(g) => {
                names.push(format!("{}[", g.name));
                names.extend(shape(&g.results));
                names.push("]".to_string());
            }
        }
    }
    names
}

fn total_calls(calls: &Calls) -> usize {
    calls.lock().unwrap().values().sum()
}

#[tokio::test]
async fn result_tree_mirrors_input_for_every_strategy() {
    let calls = Calls::default();
    let suite = nested_suite(&calls);
    let expected = vec![
        "one", "outer[", "two", "inner[", "three", "four", "]", "empty[", "]", "]", "five", "six",
    ];

    for strategy in [
        Strategy::sequential(true),
        Strategy::sequential(false),
        Strategy::parallel(),
        Strategy::parallel_bounded(2),
    ] {
        let outcomes = run_tests(&suite, strategy).await.unwrap();
        assert_eq!(shape(&outcomes), expected, "{strategy}");
    }
    assert_eq!(total_calls(&calls), 4 * 6);
}

#[tokio::test]
async fn fail_fast_example() {
    let calls = Calls::default();
    let suite = vec![
        recorded("A", &calls, true),
        recorded("B", &calls, false),
        recorded("C", &calls, true),
    ];

    let result = run_tests(&suite, Strategy::default()).await;
    assert_eq!(
        result,
        Err(SuiteError::TestError {
            results: vec![
                TestOutcome::pass("A", Default::default()).into(),
                TestOutcome::fail(
                    "B",
                    TestError::AssertionFailed(AssertionError::UnexpectedNone)
                )
                .into(),
                TestOutcome::skipped("C").into(),
            ]
        })
    );
    assert_eq!(calls.lock().unwrap().get("C"), None);

    let result = run_tests(&suite, Strategy::sequential(false)).await;
    let results = result.unwrap_err().results().unwrap().to_vec();
    assert!(results[2].is_pass());
    assert_eq!(calls.lock().unwrap().get("C"), Some(&1));
}

#[tokio::test]
async fn sharding_partitions_the_leaf_set() {
    let leaves = 6;
    for count in 1..=leaves {
        let calls = Calls::default();
        let suite = nested_suite(&calls);
        let mut reported = Vec::new();

        for index in 0..count {
            let outcomes = run_tests(&suite, Strategy::sharded(index, count))
                .await
                .unwrap();
            reported.extend(flatten(&outcomes).iter().map(|e| e.outcome.name().to_string()));
        }

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), leaves, "count = {count}");
        assert!(calls.values().all(|&n| n == 1), "count = {count}");
        reported.sort();
        let mut all: Vec<String> = calls.keys().cloned().collect();
        all.sort();
        assert_eq!(reported, all);
    }
}

#[tokio::test]
async fn sharding_omits_unselected_units() {
    let calls = Calls::default();
    let suite = nested_suite(&calls);

    // leaves: one, two, three, four, five, six -> shard 1 of 3 gets two, five
    let outcomes = run_tests(&suite, Strategy::sharded(1, 3)).await.unwrap();
    assert_eq!(shape(&outcomes), vec!["outer[", "two", "]", "five"]);
}

#[tokio::test]
async fn sharding_does_not_fail_fast() {
    let calls = Calls::default();
    let suite = vec![
        recorded("a", &calls, false),
        recorded("b", &calls, true),
        recorded("c", &calls, true),
    ];

    let result = run_tests(&suite, Strategy::sharded(0, 1)).await;
    let summary = SuiteSummary::from_result(&result);
    assert_eq!((summary.passed, summary.failed, summary.skipped), (2, 1, 0));
}

#[tokio::test]
async fn invalid_sharding_runs_nothing() {
    let calls = Calls::default();
    let suite = nested_suite(&calls);

    let cases = [
        (0, 0, ShardingError::ZeroCount),
        (3, 3, ShardingError::IndexOutOfRange { index: 3, count: 3 }),
        (0, 7, ShardingError::CountExceedsTests { count: 7, tests: 6 }),
    ];
    for (index, count, expected) in cases {
        let result = run_tests(&suite, Strategy::sharded(index, count)).await;
        assert_eq!(result, Err(SuiteError::ShardingError { value: expected }));
    }
    assert_eq!(total_calls(&calls), 0);
}

#[tokio::test]
async fn multi_assertion_order_is_preserved() {
    let suite = vec![suite_runner::test("triple", || async {
        vec![
            assert::equal(1, 1),
            assert::numbers_sorted_asc(&[3, 2, 1]),
            assert::equal("x", "x"),
        ]
    })];

    let result = run_tests(&suite, Strategy::parallel()).await;
    let expected = vec![
        AssertionReport::new("assertion 1", Ok(())),
        AssertionReport::new(
            "assertion 2",
            Err(AssertionError::NotSortedAsc {
                actual: vec![3.0, 2.0, 1.0],
            }),
        ),
        AssertionReport::new("assertion 3", Ok(())),
    ];
    assert_eq!(
        result,
        Err(SuiteError::TestError {
            results: vec![TestOutcome::fail(
                "triple",
                TestError::MultipleAssertionFailed { results: expected }
            )
            .into()]
        })
    );
}

#[tokio::test]
async fn failures_at_every_depth_are_kept_once() {
    let calls = Calls::default();
    let suite = vec![
        recorded("top", &calls, false),
        group(
            "g",
            vec![
                recorded("ok", &calls, true),
                group("h", vec![recorded("deep", &calls, false)]),
            ],
        ),
    ];

    let result = run_tests(&suite, Strategy::sequential(false)).await;
    let Err(SuiteError::TestError { results }) = result else {
        panic!("expected a test error");
    };
    let failed: Vec<String> = flatten(&results)
        .iter()
        .filter(|e| !e.outcome.is_pass())
        .map(|e| e.full_name())
        .collect();
    assert_eq!(failed, vec!["top", "g::h::deep"]);
    assert_eq!(
        results[1],
        UnitOutcome::Group(GroupOutcome::new(
            "g",
            vec![
                TestOutcome::pass("ok", Default::default()).into(),
                GroupOutcome::new(
                    "h",
                    vec![TestOutcome::fail(
                        "deep",
                        TestError::AssertionFailed(AssertionError::UnexpectedNone)
                    )
                    .into()]
                )
                .into(),
            ]
        ))
    );
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let calls = Calls::default();
    let suite = vec![
        recorded("a", &calls, true),
        group("g", vec![recorded("b", &calls, false), recorded("c", &calls, true)]),
    ];

    for strategy in [Strategy::default(), Strategy::parallel(), Strategy::sharded(1, 2)] {
        let first = run_tests(&suite, strategy).await;
        let second = run_tests(&suite, strategy).await;
        assert_eq!(first, second, "{strategy}");
    }
}

#[tokio::test]
async fn empty_suite_passes() {
    assert_eq!(run_tests(&[], Strategy::default()).await, Ok(vec![]));
    assert_eq!(run_tests(&[], Strategy::sharded(0, 1)).await, Ok(vec![]));
}

#[derive(Default)]
struct Gauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

fn gauged(name: &str, gauge: &Arc<Gauge>) -> TestUnit {
    let gauge = gauge.clone();
    suite_runner::test(name, move || {
        let gauge = gauge.clone();
        async move {
            let now = gauge.active.fetch_add(1, Ordering::SeqCst) + 1;
            gauge.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            gauge.active.fetch_sub(1, Ordering::SeqCst);
            assert::equal(1, 1)
        }
    })
}

#[tokio::test]
async fn sequential_never_overlaps_actions() {
    let gauge = Arc::new(Gauge::default());
    let suite = vec![
        gauged("a", &gauge),
        group("g", vec![gauged("b", &gauge), gauged("c", &gauge)]),
        gauged("d", &gauge),
    ];

    for strategy in [
        Strategy::sequential(true),
        Strategy::sequential(false),
        Strategy::sharded(0, 1),
    ] {
        gauge.peak.store(0, Ordering::SeqCst);
        assert!(run_tests(&suite, strategy).await.is_ok());
        assert_eq!(gauge.peak.load(Ordering::SeqCst), 1, "{strategy}");
    }

    gauge.peak.store(0, Ordering::SeqCst);
    assert!(run_tests(&suite, Strategy::parallel()).await.is_ok());
    assert_eq!(gauge.peak.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn panic_under_parallel_is_a_failure() {
    let calls = Calls::default();
    let suite = vec![
        recorded("before", &calls, true),
        suite_runner::test("boom", || async {
            if true {
                panic!("worker exploded");
            }
            assert::equal(1, 1)
        }),
        recorded("after", &calls, true),
    ];

    let result = run_tests(&suite, Strategy::parallel()).await;
    let Err(SuiteError::TestError { results }) = result else {
        panic!("expected a test error");
    };
    assert!(results[0].is_pass());
    assert_eq!(
        results[1],
        TestOutcome::fail(
            "boom",
            TestError::AssertionFailed(AssertionError::UnexpectedErr {
                value: json!("worker exploded")
            })
        )
        .into()
    );
    assert!(results[2].is_pass());
    assert_eq!(total_calls(&calls), 2);
}
