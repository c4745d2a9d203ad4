//! Property-based tests for LifecycleEngine.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::service::LifecycleEngine;
use crate::lifecycle::types::{AuditState, AuditStatus};

fn arb_status() -> impl Strategy<Value = AuditStatus> {
    prop_oneof![
        Just(AuditStatus::Pending),
        Just(AuditStatus::InProgress),
        Just(AuditStatus::Suspended),
        Just(AuditStatus::Completed),
    ]
}

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

/// A consistent state and an instant not earlier than its interval start.
fn arb_state() -> impl Strategy<Value = AuditState> {
    (arb_status(), 0i64..100_000, 0i64..(5 * 365 * 24)).prop_map(|(status, cents, hours)| {
        AuditState {
            status,
            accumulated_duration: Decimal::new(cents, 2),
            active_interval_start: (status == AuditStatus::InProgress)
                .then(|| base() + Duration::hours(hours)),
            last_pause_time: None,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Valid transitions keep the interval invariant and never lose time.
    #[test]
    fn prop_transitions_preserve_invariants(
        state in arb_state(),
        to in arb_status(),
        later_hours in 0i64..(60 * 24),
    ) {
        let engine = LifecycleEngine::default();
        let now = state.active_interval_start.unwrap_or_else(base) + Duration::hours(later_hours);

        match engine.apply(&state, to, now) {
            Ok(next) => {
                prop_assert!(LifecycleEngine::is_valid_transition(state.status, to));
                prop_assert!(next.is_consistent());
                prop_assert_eq!(next.status, to);
                prop_assert!(next.accumulated_duration >= state.accumulated_duration);
            }
            Err(LifecycleError::InvalidTransition { from, to: target }) => {
                prop_assert!(!LifecycleEngine::is_valid_transition(state.status, to));
                prop_assert_eq!(from, state.status);
                prop_assert_eq!(target, to);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    /// Completed is terminal.
    #[test]
    fn prop_completed_is_terminal(to in arb_status()) {
        prop_assert!(!LifecycleEngine::is_valid_transition(AuditStatus::Completed, to));
    }

    /// The live projection equals what a flush would persist.
    #[test]
    fn prop_current_duration_matches_flush(
        state in arb_state(),
        later_hours in 0i64..(60 * 24),
    ) {
        prop_assume!(state.status == AuditStatus::InProgress);
        let engine = LifecycleEngine::default();
        let now = state.active_interval_start.unwrap_or_else(base) + Duration::hours(later_hours);

        let projected = engine.current_duration(&state, now);
        let flushed = engine.apply(&state, AuditStatus::InProgress, now).unwrap();
        prop_assert_eq!(projected, flushed.accumulated_duration.round_dp(2));
    }

    /// Splitting a running period with checkpoints does not change the total.
    #[test]
    fn prop_checkpoints_do_not_change_total(
        start_hours in 0i64..(5 * 365 * 24),
        steps in proptest::collection::vec(0i64..(10 * 24), 1..6),
    ) {
        let engine = LifecycleEngine::default();
        let start = base() + Duration::hours(start_hours);
        let mut state = engine.apply(&AuditState::pending(), AuditStatus::InProgress, start).unwrap();
        let mut now = start;
        for step in &steps {
            now += Duration::hours(*step);
            state = engine.apply(&state, AuditStatus::InProgress, now).unwrap();
        }
        let end = engine.apply(&state, AuditStatus::Completed, now).unwrap();
        prop_assert_eq!(
            end.accumulated_duration,
            engine.durations().working_days_between(start, now)
        );
    }
}
