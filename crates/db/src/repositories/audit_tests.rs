//! Unit tests for the audit repository's row mapping.

use chrono::TimeZone;
use rust_decimal_macros::dec;
use sea_orm::ActiveValue;

use super::*;

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn audit_row(status: sea_orm_active_enums::AuditStatus, start: Option<DateTime<Utc>>) -> audits::Model {
    let created = at(2024, 3, 1, 8).into();
    audits::Model {
        id: Uuid::new_v4(),
        audit_request_id: Uuid::new_v4(),
        assignment_id: Uuid::new_v4(),
        provider_id: Some(Uuid::new_v4()),
        status,
        accumulated_duration: dec!(2),
        active_interval_start: start.map(Into::into),
        last_pause_time: None,
        created_at: created,
        updated_at: created,
    }
}

fn provider_row() -> providers::Model {
    let created = at(2024, 1, 2, 8).into();
    providers::Model {
        id: Uuid::new_v4(),
        name: "Acme Security".to_string(),
        market_number: Some("AO-12/2024".to_string()),
        market_subject: None,
        budget_total: Some(dec!(1000)),
        contract_start: None,
        contract_end: None,
        realisation: dec!(0),
        solde: Some(dec!(1000)),
        annual_amount: None,
        contract_years: None,
        classes: None,
        budget_jour_homme: Some(dec!(100)),
        created_at: created,
        updated_at: created,
    }
}

#[test]
fn test_row_state_round_trips_through_update() {
    let start = at(2024, 3, 4, 9);
    let row = audit_row(sea_orm_active_enums::AuditStatus::InProgress, Some(start));
    let state = row.state();
    assert_eq!(state.status, AuditStatus::InProgress);
    assert_eq!(state.active_interval_start, Some(start));
    assert!(state.is_consistent());

    let now = at(2024, 3, 6, 9);
    let paused = AuditState {
        status: AuditStatus::Suspended,
        accumulated_duration: dec!(4),
        active_interval_start: None,
        last_pause_time: Some(now),
    };
    let active = audit_update(row, &paused, now);

    assert_eq!(active.status, ActiveValue::Set(sea_orm_active_enums::AuditStatus::Suspended));
    assert_eq!(active.accumulated_duration, ActiveValue::Set(dec!(4)));
    assert_eq!(active.active_interval_start, ActiveValue::Set(None));
    assert_eq!(active.last_pause_time, ActiveValue::Set(Some(now.into())));
    assert_eq!(active.updated_at, ActiveValue::Set(now.into()));
}

#[test]
fn test_update_leaves_identity_columns_untouched() {
    let row = audit_row(sea_orm_active_enums::AuditStatus::Pending, None);
    let id = row.id;
    let active = audit_update(row, &AuditState::pending(), at(2024, 3, 4, 9));
    assert_eq!(active.id, ActiveValue::Unchanged(id));
    assert!(!active.provider_id.is_set());
}

#[test]
fn test_settled_provider_writes_figures() {
    let now = at(2024, 3, 8, 17);
    let settlement = Settlement {
        cost: dec!(300),
        previous_realisation: dec!(0),
        realisation: dec!(300),
        solde: Some(dec!(700)),
        clamped: false,
    };
    let active = settled_provider(provider_row(), &settlement, now);
    assert_eq!(active.realisation, ActiveValue::Set(dec!(300)));
    assert_eq!(active.solde, ActiveValue::Set(Some(dec!(700))));
    assert!(!active.budget_total.is_set());
}

#[test]
fn test_validate_comment() {
    assert_eq!(validate_comment("  scope confirmed  ").unwrap(), "scope confirmed");
    assert!(matches!(validate_comment("   "), Err(AuditError::Validation(_))));
    assert!(validate_comment(&"x".repeat(MAX_COMMENT_LEN)).is_ok());
    assert!(matches!(
        validate_comment(&"x".repeat(MAX_COMMENT_LEN + 1)),
        Err(AuditError::Validation(_))
    ));
}

#[test]
fn test_persistence_error_maps_to_lifecycle() {
    let err = persistence(DbErr::Custom("connection reset".to_string()));
    assert_eq!(err.status_code(), 500);
    assert!(err.to_string().contains("connection reset"));
}
