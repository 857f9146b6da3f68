//! Cohort metric aggregation and the finished report.

use crate::cohort::CohortKey;
use ltv_core::config::ReportConfig;
use ltv_core::types::{BookerId, BookerTotals};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Running totals for one cohort. Accumulated monotonically while the
/// booker aggregates are folded in; derived metrics are computed afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CohortAccumulator {
    pub bookers: u64,
    pub booking_count: u64,
    pub turnover: f64,
}

/// One rendered row of the report, metrics already derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortReportRow {
    pub cohort: CohortKey,
    pub bookers: u64,
    pub booking_count: u64,
    pub avg_booking_count: f64,
    pub turnover: f64,
    pub avg_turnover: f64,
    pub ltv: f64,
}

/// The finished report: rows in chronological cohort order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtvReport {
    pub period_months: u32,
    pub commission: f64,
    pub rows: Vec<CohortReportRow>,
    pub total_rows: usize,
}

/// Fold per-booker aggregates into per-cohort accumulators.
///
/// Every assigned booker is seeded into its cohort up front, so a booker
/// whose aggregate row is missing (data changed between the two queries)
/// still appears with zero turnover and zero items. An aggregate row for a
/// booker without an assignment is skipped with a warning.
pub fn accumulate(
    assignments: &HashMap<BookerId, CohortKey>,
    totals: &[BookerTotals],
) -> BTreeMap<CohortKey, CohortAccumulator> {
    let mut cohorts: BTreeMap<CohortKey, CohortAccumulator> = BTreeMap::new();

    for key in assignments.values() {
        cohorts.entry(*key).or_default().bookers += 1;
    }

    for row in totals {
        match assignments.get(&row.booker_id) {
            Some(key) => {
                let acc = cohorts.entry(*key).or_default();
                acc.turnover += row.turnover;
                acc.booking_count += row.booking_count.max(0) as u64;
            }
            None => {
                warn!(
                    booker_id = row.booker_id,
                    "Aggregate row for booker without a cohort, skipping"
                );
            }
        }
    }

    cohorts
}

/// Derive the report rows from the accumulators. Averages over an empty
/// denominator render as 0.0 instead of propagating a division error.
pub fn build_report(
    assignments: &HashMap<BookerId, CohortKey>,
    totals: &[BookerTotals],
    config: &ReportConfig,
) -> LtvReport {
    let cohorts = accumulate(assignments, totals);

    let rows: Vec<CohortReportRow> = cohorts
        .into_iter()
        .map(|(cohort, acc)| {
            let avg_booking_count = if acc.bookers > 0 {
                acc.booking_count as f64 / acc.bookers as f64
            } else {
                0.0
            };
            let avg_turnover = if acc.booking_count > 0 {
                acc.turnover / acc.booking_count as f64
            } else {
                0.0
            };
            CohortReportRow {
                cohort,
                bookers: acc.bookers,
                booking_count: acc.booking_count,
                avg_booking_count,
                turnover: acc.turnover,
                avg_turnover,
                ltv: acc.turnover * config.commission,
            }
        })
        .collect();

    LtvReport {
        period_months: config.period_months,
        commission: config.commission,
        total_rows: rows.len(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> CohortKey {
        s.parse().unwrap()
    }

    fn config() -> ReportConfig {
        ReportConfig::default()
    }

    #[test]
    fn test_single_booker_two_items_scenario() {
        let assignments = HashMap::from([(1, key("06-2023"))]);
        let totals = vec![BookerTotals {
            booker_id: 1,
            turnover: 150.0,
            booking_count: 2,
        }];

        let report = build_report(&assignments, &totals, &config());
        assert_eq!(report.total_rows, 1);

        let row = &report.rows[0];
        assert_eq!(row.cohort.to_string(), "06-2023");
        assert_eq!(row.bookers, 1);
        assert_eq!(row.booking_count, 2);
        assert_eq!(row.avg_booking_count, 2.0);
        assert_eq!(row.turnover, 150.0);
        assert_eq!(row.avg_turnover, 75.0);
        assert_eq!(row.ltv, 15.0);
    }

    #[test]
    fn test_cohort_totals_are_sums_over_bookers() {
        let assignments = HashMap::from([
            (1, key("06-2023")),
            (2, key("06-2023")),
            (3, key("12-2023")),
        ]);
        let totals = vec![
            BookerTotals { booker_id: 1, turnover: 100.0, booking_count: 2 },
            BookerTotals { booker_id: 2, turnover: 40.0, booking_count: 1 },
            BookerTotals { booker_id: 3, turnover: 10.0, booking_count: 1 },
        ];

        let cohorts = accumulate(&assignments, &totals);
        let june = cohorts[&key("06-2023")];
        assert_eq!(june.bookers, 2);
        assert_eq!(june.booking_count, 3);
        assert_eq!(june.turnover, 140.0);
        let december = cohorts[&key("12-2023")];
        assert_eq!(december.bookers, 1);
        assert_eq!(december.turnover, 10.0);
    }

    #[test]
    fn test_rows_in_chronological_order() {
        let assignments = HashMap::from([
            (1, key("12-2023")),
            (2, key("01-2024")),
            (3, key("06-2023")),
        ]);
        let totals: Vec<BookerTotals> = assignments
            .keys()
            .map(|&booker_id| BookerTotals { booker_id, turnover: 1.0, booking_count: 1 })
            .collect();

        let report = build_report(&assignments, &totals, &config());
        let order: Vec<String> = report.rows.iter().map(|r| r.cohort.to_string()).collect();
        assert_eq!(order, vec!["06-2023", "12-2023", "01-2024"]);
    }

    #[test]
    fn test_empty_inputs_produce_empty_report() {
        let report = build_report(&HashMap::new(), &[], &config());
        assert!(report.rows.is_empty());
        assert_eq!(report.total_rows, 0);
    }

    #[test]
    fn test_assigned_booker_without_totals_keeps_zero_metrics() {
        let assignments = HashMap::from([(1, key("06-2023"))]);

        let report = build_report(&assignments, &[], &config());
        assert_eq!(report.total_rows, 1);
        let row = &report.rows[0];
        assert_eq!(row.bookers, 1);
        assert_eq!(row.booking_count, 0);
        assert_eq!(row.turnover, 0.0);
        assert_eq!(row.avg_booking_count, 0.0);
        assert_eq!(row.avg_turnover, 0.0);
        assert_eq!(row.ltv, 0.0);
    }

    #[test]
    fn test_totals_for_unassigned_booker_are_skipped() {
        let assignments = HashMap::from([(1, key("06-2023"))]);
        let totals = vec![
            BookerTotals { booker_id: 1, turnover: 100.0, booking_count: 1 },
            BookerTotals { booker_id: 99, turnover: 500.0, booking_count: 5 },
        ];

        let report = build_report(&assignments, &totals, &config());
        assert_eq!(report.total_rows, 1);
        assert_eq!(report.rows[0].turnover, 100.0);
    }

    #[test]
    fn test_report_is_idempotent() {
        let assignments = HashMap::from([(1, key("06-2023")), (2, key("07-2023"))]);
        let totals = vec![
            BookerTotals { booker_id: 1, turnover: 150.0, booking_count: 2 },
            BookerTotals { booker_id: 2, turnover: 80.0, booking_count: 1 },
        ];

        let first = build_report(&assignments, &totals, &config());
        let second = build_report(&assignments, &totals, &config());
        assert_eq!(first, second);
    }
}
