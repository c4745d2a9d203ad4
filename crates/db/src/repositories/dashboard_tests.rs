//! Tests for dashboard KPI computation.

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use super::*;

fn provider(name: &str, total: Option<Decimal>, realisation: Decimal) -> providers::Model {
    let now = Utc::now().into();
    providers::Model {
        id: Uuid::new_v4(),
        name: name.to_string(),
        market_number: None,
        market_subject: None,
        budget_total: total,
        contract_start: None,
        contract_end: None,
        realisation,
        solde: total.map(|t| t - realisation),
        annual_amount: None,
        contract_years: None,
        classes: None,
        budget_jour_homme: Some(dec!(100)),
        created_at: now,
        updated_at: now,
    }
}

fn assignment(provider_id: Option<Uuid>, audit_type: &str) -> AssignmentFacts {
    AssignmentFacts {
        id: Uuid::new_v4(),
        provider_id,
        audit_type: audit_type.to_string(),
    }
}

#[test]
fn test_empty_dashboard_has_zero_rates() {
    let kpis = compute_kpis(&DashboardFacts::default());
    assert_eq!(kpis.auditor_occupancy_rate, Decimal::ZERO);
    assert_eq!(kpis.budget_consumption_rate, Decimal::ZERO);
    assert_eq!(kpis.audits, AuditCounts::default());
    assert!(kpis.top_providers.is_empty());
}

#[test]
fn test_kpis_aggregate_budgets_and_audits() {
    let acme = provider("Acme", Some(dec!(1000)), dec!(300));
    let globex = provider("Globex", Some(dec!(2000)), dec!(0));
    let unfunded = provider("Initech", None, dec!(0));

    let pentest = assignment(Some(acme.id), "pentest");
    let review = assignment(Some(acme.id), "code review");
    let other = assignment(Some(globex.id), "pentest");

    let facts = DashboardFacts {
        auditors_total: 8,
        busy_auditors: 3,
        providers: vec![acme.clone(), globex.clone(), unfunded],
        assignments: vec![pentest.clone(), review.clone(), other.clone()],
        audits: vec![
            (pentest.id, AuditStatus::Completed),
            (review.id, AuditStatus::InProgress),
            (other.id, AuditStatus::Suspended),
        ],
        completions: vec![],
    };
    let kpis = compute_kpis(&facts);

    assert_eq!(kpis.providers_total, 3);
    assert_eq!(kpis.assignments_total, 3);
    assert_eq!(kpis.auditor_occupancy_rate, dec!(37.50));
    assert_eq!(kpis.budget_total_allocated, dec!(3000));
    assert_eq!(kpis.realisation_total, dec!(300));
    assert_eq!(kpis.solde_total, dec!(2700));
    assert_eq!(kpis.budget_consumption_rate, dec!(10.00));
    assert_eq!(kpis.inactive_providers, 2);

    assert_eq!(kpis.audits.total, 3);
    assert_eq!(kpis.audits.completed, 1);
    assert_eq!(kpis.audits.in_progress, 1);
    assert_eq!(kpis.audits.suspended, 1);
    assert_eq!(kpis.audits.pending, 0);

    assert_eq!(
        kpis.top_providers,
        vec![
            NamedCount { name: "Acme".to_string(), count: 2 },
            NamedCount { name: "Globex".to_string(), count: 1 },
        ]
    );
    assert_eq!(
        kpis.audit_types,
        vec![
            NamedCount { name: "pentest".to_string(), count: 2 },
            NamedCount { name: "code review".to_string(), count: 1 },
        ]
    );
}

#[test]
fn test_top_providers_capped_at_five() {
    let providers: Vec<_> = (0..7)
        .map(|i| provider(&format!("P{i}"), Some(dec!(10)), dec!(0)))
        .collect();
    let assignments = providers
        .iter()
        .map(|p| assignment(Some(p.id), "pentest"))
        .collect();
    let kpis = compute_kpis(&DashboardFacts {
        providers,
        assignments,
        ..DashboardFacts::default()
    });
    assert_eq!(kpis.top_providers.len(), 5);
    assert_eq!(kpis.top_providers[0].name, "P0");
}

#[test]
fn test_audit_without_known_assignment_counts_only_in_status() {
    let kpis = compute_kpis(&DashboardFacts {
        audits: vec![(Uuid::new_v4(), AuditStatus::Pending)],
        ..DashboardFacts::default()
    });
    assert_eq!(kpis.audits.pending, 1);
    assert!(kpis.audit_types.is_empty());
    assert!(kpis.audits_per_provider.is_empty());
}

#[test]
fn test_provider_budgets_sorted_by_name_with_rates() {
    let globex = provider("Globex", Some(dec!(2000)), dec!(500));
    let acme = provider("Acme", Some(dec!(1000)), dec!(333));
    let unfunded = provider("Initech", None, dec!(0));

    let kpis = compute_kpis(&DashboardFacts {
        providers: vec![globex, acme, unfunded],
        ..DashboardFacts::default()
    });

    assert_eq!(
        kpis.provider_budgets,
        vec![
            ProviderBudgetKpi {
                name: "Acme".to_string(),
                budget_total: dec!(1000),
                realisation: dec!(333),
                solde: dec!(667),
                consumption_rate: dec!(33.30),
            },
            ProviderBudgetKpi {
                name: "Globex".to_string(),
                budget_total: dec!(2000),
                realisation: dec!(500),
                solde: dec!(1500),
                consumption_rate: dec!(25.00),
            },
            ProviderBudgetKpi {
                name: "Initech".to_string(),
                budget_total: dec!(0),
                realisation: dec!(0),
                solde: dec!(0),
                consumption_rate: dec!(0),
            },
        ]
    );
}

#[test]
fn test_completed_audits_grouped_by_month() {
    let at = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap();
    let kpis = compute_kpis(&DashboardFacts {
        completions: vec![at(2025, 3, 4), at(2024, 12, 30), at(2025, 3, 28), at(2025, 1, 2)],
        ..DashboardFacts::default()
    });

    assert_eq!(
        kpis.completed_per_month,
        vec![
            MonthCount { year: 2024, month: 12, count: 1 },
            MonthCount { year: 2025, month: 1, count: 1 },
            MonthCount { year: 2025, month: 3, count: 2 },
        ]
    );
}

mod props {
    use super::*;
    use proptest::prelude::*;

    fn status() -> impl Strategy<Value = AuditStatus> {
        prop_oneof![
            Just(AuditStatus::Pending),
            Just(AuditStatus::InProgress),
            Just(AuditStatus::Suspended),
            Just(AuditStatus::Completed),
        ]
    }

    proptest! {
        #[test]
        fn prop_status_counts_sum_to_total(statuses in prop::collection::vec(status(), 0..40)) {
            let kpis = compute_kpis(&DashboardFacts {
                audits: statuses.into_iter().map(|s| (Uuid::new_v4(), s)).collect(),
                ..DashboardFacts::default()
            });
            let a = &kpis.audits;
            prop_assert_eq!(a.pending + a.in_progress + a.suspended + a.completed, a.total);
        }

        #[test]
        fn prop_occupancy_is_a_percentage(total in 0u64..500, busy_share in 0u64..=100) {
            let busy = total * busy_share / 100;
            let kpis = compute_kpis(&DashboardFacts {
                auditors_total: total,
                busy_auditors: busy,
                ..DashboardFacts::default()
            });
            prop_assert!(kpis.auditor_occupancy_rate >= Decimal::ZERO);
            prop_assert!(kpis.auditor_occupancy_rate <= Decimal::ONE_HUNDRED);
        }
    }
}
