//! Audit lifecycle engine.
//!
//! Validates status transitions and performs the time accounting that goes
//! with them. The engine works on an [`AuditState`] snapshot and never
//! touches storage; persisting the result atomically is the caller's job.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::duration::DurationAccumulator;
use crate::ledger::{BudgetLedger, ProviderBudget};
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::types::{AuditState, AuditStatus, TransitionOutcome};

/// Applies lifecycle transitions to audit state.
#[derive(Clone, Default)]
pub struct LifecycleEngine {
    durations: DurationAccumulator,
}

impl LifecycleEngine {
    /// Creates an engine over the given duration accumulator.
    #[must_use]
    pub const fn new(durations: DurationAccumulator) -> Self {
        Self { durations }
    }

    /// The accumulator used to measure elapsed working days.
    #[must_use]
    pub const fn durations(&self) -> &DurationAccumulator {
        &self.durations
    }

    /// Parses a requested status token.
    ///
    /// # Returns
    /// * `Err(LifecycleError::InvalidState)` for anything but the four tokens
    pub fn parse_status(raw: &str) -> Result<AuditStatus, LifecycleError> {
        AuditStatus::parse(raw).ok_or_else(|| LifecycleError::InvalidState(raw.to_string()))
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → InProgress
    /// - InProgress → Suspended, Completed, or InProgress (checkpoint)
    /// - Suspended → InProgress, Completed, or Suspended (checkpoint)
    ///
    /// Completed is terminal.
    #[must_use]
    pub fn is_valid_transition(from: AuditStatus, to: AuditStatus) -> bool {
        matches!(
            (from, to),
            (AuditStatus::Pending, AuditStatus::InProgress)
                | (
                    AuditStatus::InProgress | AuditStatus::Suspended,
                    AuditStatus::InProgress | AuditStatus::Suspended | AuditStatus::Completed
                )
        )
    }

    /// Moves `state` to `to` at instant `now`.
    ///
    /// 1. A running interval is flushed into `accumulated_duration`. If the
    ///    audit stays InProgress the interval is rolled forward to `now`;
    ///    otherwise it is closed and `last_pause_time` is set.
    /// 2. Entering InProgress without a running interval opens one at `now`.
    /// 3. The status is set.
    ///
    /// # Returns
    /// * `Err(LifecycleError::InvalidTransition)` if the graph forbids the move
    pub fn apply(
        &self,
        state: &AuditState,
        to: AuditStatus,
        now: DateTime<Utc>,
    ) -> Result<AuditState, LifecycleError> {
        let from = state.status;
        if !Self::is_valid_transition(from, to) {
            return Err(LifecycleError::InvalidTransition { from, to });
        }

        let mut next = state.clone();

        if let Some(start) = state.active_interval_start {
            next.accumulated_duration += self.durations.working_days_between(start, now);
            if from == AuditStatus::InProgress && to == AuditStatus::InProgress {
                next.active_interval_start = Some(now);
            } else {
                if from != AuditStatus::InProgress {
                    tracing::warn!(status = %from, "Closing stray interval on a non-running audit");
                }
                next.active_interval_start = None;
                next.last_pause_time = Some(now);
            }
        }

        if to == AuditStatus::InProgress && next.active_interval_start.is_none() {
            next.active_interval_start = Some(now);
        }

        next.status = to;
        Ok(next)
    }

    /// Applies a transition and, on completion, settles the audit's cost
    /// against its provider.
    ///
    /// Settlement happens only when the target is Completed, a provider is
    /// given, the accumulated duration is positive, and the provider has both
    /// a daily rate and a total budget.
    pub fn transition(
        &self,
        state: &AuditState,
        to: AuditStatus,
        provider: Option<&ProviderBudget>,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome<AuditState>, LifecycleError> {
        let audit = self.apply(state, to, now)?;

        let settlement = if to == AuditStatus::Completed {
            provider.and_then(|p| {
                BudgetLedger::settlement_cost(p, audit.accumulated_duration)
                    .map(|cost| BudgetLedger::settle(p, cost))
            })
        } else {
            None
        };

        tracing::debug!(
            from = %state.status,
            to = %to,
            accumulated = %audit.accumulated_duration,
            settled = settlement.is_some(),
            "Applied audit transition"
        );

        Ok(TransitionOutcome { audit, settlement })
    }

    /// Live duration: accumulated days plus the running interval, 2 dp.
    ///
    /// Pure; the state is not modified.
    #[must_use]
    pub fn current_duration(&self, state: &AuditState, now: DateTime<Utc>) -> Decimal {
        let running = match (state.status, state.active_interval_start) {
            (AuditStatus::InProgress, Some(start)) => {
                self.durations.working_days_between(start, now)
            }
            _ => Decimal::ZERO,
        };
        (state.accumulated_duration + running)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn engine() -> LifecycleEngine {
        LifecycleEngine::default()
    }

    fn billable() -> ProviderBudget {
        ProviderBudget {
            budget_total: Some(dec!(1000)),
            realisation: dec!(0),
            solde: Some(dec!(1000)),
            budget_jour_homme: Some(dec!(100)),
        }
    }

    #[test]
    fn test_start_opens_interval() {
        let now = at(2024, 3, 4, 9);
        let state = engine()
            .apply(&AuditState::pending(), AuditStatus::InProgress, now)
            .unwrap();
        assert_eq!(state.status, AuditStatus::InProgress);
        assert_eq!(state.active_interval_start, Some(now));
        assert_eq!(state.accumulated_duration, dec!(0));
        assert!(state.is_consistent());
    }

    #[test]
    fn test_suspend_flushes_and_closes() {
        let e = engine();
        let started = e
            .apply(&AuditState::pending(), AuditStatus::InProgress, at(2024, 3, 4, 9))
            .unwrap();
        let paused_at = at(2024, 3, 7, 15);
        let paused = e.apply(&started, AuditStatus::Suspended, paused_at).unwrap();
        assert_eq!(paused.accumulated_duration, dec!(3));
        assert_eq!(paused.active_interval_start, None);
        assert_eq!(paused.last_pause_time, Some(paused_at));
        assert!(paused.is_consistent());
    }

    #[test]
    fn test_pause_resume_complete_loses_nothing() {
        let e = engine();
        let s = AuditState::pending();
        // Mon 4 .. Thu 7 Mar: 3 days
        let s = e.apply(&s, AuditStatus::InProgress, at(2024, 3, 4, 9)).unwrap();
        let s = e.apply(&s, AuditStatus::Suspended, at(2024, 3, 7, 9)).unwrap();
        // Suspended over the weekend, resumed Mon 11 .. Wed 13: 2 days
        let s = e.apply(&s, AuditStatus::InProgress, at(2024, 3, 11, 9)).unwrap();
        let s = e.apply(&s, AuditStatus::Completed, at(2024, 3, 13, 9)).unwrap();
        assert_eq!(s.accumulated_duration, dec!(5));
        assert_eq!(s.status, AuditStatus::Completed);
        assert!(s.is_consistent());
    }

    #[test]
    fn test_checkpoint_rolls_interval_forward() {
        let e = engine();
        let s = e
            .apply(&AuditState::pending(), AuditStatus::InProgress, at(2024, 3, 4, 9))
            .unwrap();
        let checkpoint = at(2024, 3, 6, 12);
        let s = e.apply(&s, AuditStatus::InProgress, checkpoint).unwrap();
        assert_eq!(s.accumulated_duration, dec!(2));
        assert_eq!(s.active_interval_start, Some(checkpoint));

        let s = e.apply(&s, AuditStatus::Completed, at(2024, 3, 8, 9)).unwrap();
        assert_eq!(s.accumulated_duration, dec!(4));
    }

    #[test]
    fn test_suspended_checkpoint_is_noop_for_duration() {
        let e = engine();
        let s = e
            .apply(&AuditState::pending(), AuditStatus::InProgress, at(2024, 3, 4, 9))
            .unwrap();
        let s = e.apply(&s, AuditStatus::Suspended, at(2024, 3, 5, 9)).unwrap();
        let again = e.apply(&s, AuditStatus::Suspended, at(2024, 3, 8, 9)).unwrap();
        assert_eq!(again, s);
    }

    #[test]
    fn test_invalid_transitions() {
        let e = engine();
        let now = at(2024, 3, 4, 9);
        for (from, to) in [
            (AuditStatus::Pending, AuditStatus::Suspended),
            (AuditStatus::Pending, AuditStatus::Completed),
            (AuditStatus::Pending, AuditStatus::Pending),
            (AuditStatus::Completed, AuditStatus::InProgress),
            (AuditStatus::Completed, AuditStatus::Completed),
            (AuditStatus::InProgress, AuditStatus::Pending),
        ] {
            let state = AuditState {
                status: from,
                active_interval_start: (from == AuditStatus::InProgress).then_some(now),
                ..AuditState::pending()
            };
            assert_eq!(
                e.apply(&state, to, now),
                Err(LifecycleError::InvalidTransition { from, to })
            );
        }
    }

    #[test]
    fn test_parse_status_rejects_unknown() {
        assert_eq!(
            LifecycleEngine::parse_status("Archived"),
            Err(LifecycleError::InvalidState("Archived".to_string()))
        );
        assert_eq!(
            LifecycleEngine::parse_status("completed"),
            Ok(AuditStatus::Completed)
        );
    }

    #[test]
    fn test_completion_settles_provider() {
        let e = engine();
        let s = e
            .apply(&AuditState::pending(), AuditStatus::InProgress, at(2024, 3, 4, 9))
            .unwrap();
        let provider = billable();
        let outcome = e
            .transition(&s, AuditStatus::Completed, Some(&provider), at(2024, 3, 7, 9))
            .unwrap();
        assert_eq!(outcome.audit.accumulated_duration, dec!(3));
        let settlement = outcome.settlement.unwrap();
        assert_eq!(settlement.cost, dec!(300));
        assert_eq!(settlement.realisation, dec!(300));
        assert_eq!(settlement.solde, Some(dec!(700)));
    }

    #[test]
    fn test_no_settlement_without_provider_or_rate() {
        let e = engine();
        let s = e
            .apply(&AuditState::pending(), AuditStatus::InProgress, at(2024, 3, 4, 9))
            .unwrap();
        let end = at(2024, 3, 7, 9);

        let none = e.transition(&s, AuditStatus::Completed, None, end).unwrap();
        assert!(none.settlement.is_none());

        let no_rate = ProviderBudget {
            budget_jour_homme: None,
            ..billable()
        };
        let outcome = e
            .transition(&s, AuditStatus::Completed, Some(&no_rate), end)
            .unwrap();
        assert!(outcome.settlement.is_none());
        assert_eq!(outcome.audit.status, AuditStatus::Completed);
    }

    #[test]
    fn test_no_settlement_for_zero_duration() {
        let e = engine();
        // Started and completed on the same day
        let s = e
            .apply(&AuditState::pending(), AuditStatus::InProgress, at(2024, 3, 4, 9))
            .unwrap();
        let outcome = e
            .transition(&s, AuditStatus::Completed, Some(&billable()), at(2024, 3, 4, 17))
            .unwrap();
        assert!(outcome.settlement.is_none());
    }

    #[test]
    fn test_no_settlement_on_suspend() {
        let e = engine();
        let s = e
            .apply(&AuditState::pending(), AuditStatus::InProgress, at(2024, 3, 4, 9))
            .unwrap();
        let outcome = e
            .transition(&s, AuditStatus::Suspended, Some(&billable()), at(2024, 3, 7, 9))
            .unwrap();
        assert!(outcome.settlement.is_none());
    }

    #[test]
    fn test_current_duration_is_pure_projection() {
        let e = engine();
        let s = e
            .apply(&AuditState::pending(), AuditStatus::InProgress, at(2024, 3, 4, 9))
            .unwrap();
        let s = AuditState {
            accumulated_duration: dec!(1.5),
            ..s
        };
        let now = at(2024, 3, 6, 9);
        let first = e.current_duration(&s, now);
        let second = e.current_duration(&s, now);
        assert_eq!(first, dec!(3.50));
        assert_eq!(first, second);
        assert_eq!(s.accumulated_duration, dec!(1.5));
    }

    #[test]
    fn test_current_duration_when_suspended_ignores_clock() {
        let s = AuditState {
            status: AuditStatus::Suspended,
            accumulated_duration: dec!(4.125),
            ..AuditState::pending()
        };
        assert_eq!(engine().current_duration(&s, at(2030, 1, 1, 0)), dec!(4.12));
    }

    #[test]
    fn test_stray_interval_on_suspended_is_flushed() {
        let e = engine();
        let stray = AuditState {
            status: AuditStatus::Suspended,
            accumulated_duration: dec!(1),
            active_interval_start: Some(at(2024, 3, 4, 9)),
            last_pause_time: None,
        };
        let now = at(2024, 3, 6, 9);
        let s = e.apply(&stray, AuditStatus::Completed, now).unwrap();
        assert_eq!(s.accumulated_duration, dec!(3));
        assert_eq!(s.active_interval_start, None);
        assert_eq!(s.last_pause_time, Some(now));
    }
}
