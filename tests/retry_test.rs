//! Tests for RetryExecutor and try_until_success

use std::cell::RefCell;

use rstest::rstest;
use thiserror::Error;

use collection_helpers::domain::{try_until_success, BoxError, RetryError, RetryExecutor};
use collection_helpers::util::testing::init_test_setup;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
enum AttemptError {
    #[error("item {0} out of range")]
    OutOfRange(u32),
    #[error("item {0} malformed")]
    Malformed(u32),
}

#[derive(Error, Debug)]
#[error("index {0} out of range")]
struct IndexOutOfRange(u32);

#[derive(Error, Debug)]
#[error("bad format at {0}")]
struct FormatFailure(u32);

// ============================================================
// Success
// ============================================================

#[test]
fn given_items_failing_below_three_when_retrying_then_stops_after_first_success() {
    init_test_setup();
    // Arrange
    let attempted = RefCell::new(Vec::new());

    // Act
    let result = try_until_success([1, 2, 3, 4], |item, _last| {
        attempted.borrow_mut().push(item);
        if item < 3 {
            Err(AttemptError::OutOfRange(item))
        } else {
            Ok(())
        }
    });

    // Assert
    assert!(result.is_ok());
    assert_eq!(*attempted.borrow(), vec![1, 2, 3], "item 4 must never be attempted");
}

#[test]
fn given_first_item_succeeds_when_retrying_then_no_previous_error_passed() {
    init_test_setup();
    let mut seen_last = Vec::new();

    let result = try_until_success(["a", "b"], |_, last: Option<&AttemptError>| {
        seen_last.push(last.cloned());
        Ok(())
    });

    assert!(result.is_ok());
    assert_eq!(seen_last, vec![None]);
}

// ============================================================
// Exhaustion
// ============================================================

#[test]
fn given_always_failing_attempt_when_retrying_then_aggregates_every_failure_in_order() {
    init_test_setup();
    // Act
    let result = try_until_success([1, 2, 3, 4], |item, _| Err(AttemptError::OutOfRange(item)));

    // Assert
    match result {
        Err(RetryError::Exhausted(aggregate)) => {
            assert_eq!(aggregate.len(), 4);
            assert_eq!(
                aggregate.failures(),
                &[
                    AttemptError::OutOfRange(1),
                    AttemptError::OutOfRange(2),
                    AttemptError::OutOfRange(3),
                    AttemptError::OutOfRange(4),
                ]
            );
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[test]
fn given_failures_when_retrying_then_each_attempt_sees_previous_failure() {
    init_test_setup();
    // Arrange
    let mut seen_last = Vec::new();

    // Act
    let _ = try_until_success([1, 2, 3], |item, last| {
        seen_last.push(last.cloned());
        Err(AttemptError::Malformed(item))
    });

    // Assert
    assert_eq!(
        seen_last,
        vec![
            None,
            Some(AttemptError::Malformed(1)),
            Some(AttemptError::Malformed(2)),
        ]
    );
}

#[test]
fn given_exhausted_run_when_displaying_then_lists_failures() {
    init_test_setup();
    let err = try_until_success([7, 8], |item, _| Err(AttemptError::OutOfRange(item))).unwrap_err();

    assert_eq!(
        err.to_string(),
        "all 2 attempts failed: item 7 out of range; item 8 out of range"
    );
}

// ============================================================
// Stop kind
// ============================================================

#[test]
fn given_stop_kind_when_second_item_raises_it_then_propagates_and_discards_earlier_failure() {
    init_test_setup();
    // Arrange
    let executor =
        RetryExecutor::new().stop_when(|e: &AttemptError| matches!(e, AttemptError::Malformed(_)));

    // Act
    let result = executor.run([1, 2, 3, 4], |item, _| {
        if item < 2 {
            Err(AttemptError::OutOfRange(item))
        } else {
            Err(AttemptError::Malformed(item))
        }
    });

    // Assert
    let err = result.unwrap_err();
    assert!(err.is_stopped());
    assert_eq!(err.into_failures(), vec![AttemptError::Malformed(2)]);
}

#[test]
fn given_boxed_errors_when_stop_on_type_then_downcasts_to_stop_kind() {
    init_test_setup();
    // Arrange
    let attempts = RefCell::new(0);
    let executor = RetryExecutor::<BoxError>::new().stop_on::<FormatFailure>();

    // Act
    let result = executor.run(1..=4u32, |item, _| -> Result<(), BoxError> {
        *attempts.borrow_mut() += 1;
        if item < 2 {
            Err(Box::new(IndexOutOfRange(item)))
        } else {
            Err(Box::new(FormatFailure(item)))
        }
    });

    // Assert
    match result {
        Err(RetryError::Stopped(error)) => {
            let failure = error.downcast_ref::<FormatFailure>().expect("stop-kind error");
            assert_eq!(failure.0, 2);
        }
        other => panic!("expected stop, got {:?}", other),
    }
    assert_eq!(*attempts.borrow(), 2);
}

#[test]
fn given_boxed_errors_without_stop_kind_match_when_retrying_then_aggregates() {
    init_test_setup();
    let executor = RetryExecutor::<BoxError>::new().stop_on::<FormatFailure>();

    let result = executor.run([1u32, 2], |item, _| Err(Box::new(IndexOutOfRange(item)) as BoxError));

    let err = result.unwrap_err();
    assert!(!err.is_stopped());
    assert_eq!(err.into_failures().len(), 2);
}

#[rstest]
#[case(&[], false)]
#[case(&[1], false)]
#[case(&[1, 2, 3], true)]
fn given_stop_predicate_when_no_stop_kind_raised_then_never_stops(
    #[case] items: &[u32],
    #[case] has_success: bool,
) {
    init_test_setup();
    let executor = RetryExecutor::new().stop_when(|_: &AttemptError| false);

    let result = executor.run(items.iter().copied(), |item, _| {
        if item == 3 {
            Ok(())
        } else {
            Err(AttemptError::OutOfRange(item))
        }
    });

    assert_eq!(result.is_ok(), has_success);
    if let Err(err) = result {
        assert!(!err.is_stopped());
        assert_eq!(err.into_failures().len(), items.len());
    }
}
