//! Filter evaluation over in-memory record sets
//!
//! Stable filtering: survivors keep their original relative order, no
//! resorting. All predicates of a [`RecordFilter`] must hold (logical AND).

use chrono::NaiveDate;
use tramita_core::{DateRange, Proceeding, RecordFilter, TextMatch};

/// Apply `filter` to `records`, preserving order.
pub fn filter_records<'a>(
    records: &'a [Proceeding],
    filter: &RecordFilter,
) -> Vec<&'a Proceeding> {
    records
        .iter()
        .filter(|record| matches(record, filter))
        .collect()
}

fn matches(record: &Proceeding, filter: &RecordFilter) -> bool {
    if let Some(status) = filter.status {
        if record.status != status {
            return false;
        }
    }
    if let Some(text) = &filter.text {
        if !matches_text(record, text) {
            return false;
        }
    }
    if let Some(range) = &filter.date_range {
        if !matches_date(record, range) {
            return false;
        }
    }
    true
}

/// Case-insensitive substring over the configured fields plus case_number.
fn matches_text(record: &Proceeding, text: &TextMatch) -> bool {
    let needle = text.needle.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    if record.case_number.to_lowercase().contains(&needle) {
        return true;
    }
    text.fields
        .iter()
        .any(|field| record.get_field(field, "").to_lowercase().contains(&needle))
}

/// Inclusive bounds on the designated ISO date field. Records whose field
/// is absent or unparseable never match a date-bounded filter.
fn matches_date(record: &Proceeding, range: &DateRange) -> bool {
    let raw = record.get_field(&range.field, "");
    let Ok(date) = raw.parse::<NaiveDate>() else {
        return false;
    };
    if let Some(from) = range.bounds.from {
        if date < from {
            return false;
        }
    }
    if let Some(to) = range.bounds.to {
        if date > to {
            return false;
        }
    }
    true
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tramita_core::{ProceedingKind, Status};

    fn record(case_number: &str, status: Status, claimant: &str, due: &str) -> Proceeding {
        Proceeding::new(ProceedingKind::SmallClaim, status, case_number, "maria")
            .with_field("claimant_name", claimant)
            .with_field("due_date", due)
    }

    fn sample_set() -> Vec<Proceeding> {
        vec![
            record("rpv-001", Status::Cadastro, "João da Silva", "2024-07-01"),
            record("rpv-002", Status::Triagem, "Ana Souza", "2024-07-15"),
            record("rpv-003", Status::Triagem, "Carlos SILVA", "2024-08-01"),
            record("rpv-004", Status::Finalizado, "Beatriz Lima", ""),
        ]
    }

    #[test]
    fn test_empty_filter_matches_everything_in_order() {
        let records = sample_set();
        let out = filter_records(&records, &RecordFilter::default());
        let cases: Vec<_> = out.iter().map(|r| r.case_number.as_str()).collect();
        assert_eq!(cases, ["rpv-001", "rpv-002", "rpv-003", "rpv-004"]);
    }

    #[test]
    fn test_status_filter() {
        let records = sample_set();
        let out = filter_records(&records, &RecordFilter::by_status(Status::Triagem));
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.status == Status::Triagem));
    }

    #[test]
    fn test_text_filter_is_case_insensitive_across_fields() {
        let records = sample_set();
        let filter =
            RecordFilter::default().with_text(TextMatch::new("silva", &["claimant_name"]));
        let out = filter_records(&records, &filter);
        let cases: Vec<_> = out.iter().map(|r| r.case_number.as_str()).collect();
        assert_eq!(cases, ["rpv-001", "rpv-003"]);
    }

    #[test]
    fn test_text_filter_always_searches_case_number() {
        let records = sample_set();
        let filter = RecordFilter::default().with_text(TextMatch::new("RPV-004", &[]));
        let out = filter_records(&records, &filter);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].case_number, "rpv-004");
    }

    #[test]
    fn test_date_range_bounds_are_inclusive() {
        let records = sample_set();
        let filter = RecordFilter::default().with_date_range(DateRange::new(
            "due_date",
            NaiveDate::from_ymd_opt(2024, 7, 15),
            NaiveDate::from_ymd_opt(2024, 8, 1),
        ));
        let out = filter_records(&records, &filter);
        let cases: Vec<_> = out.iter().map(|r| r.case_number.as_str()).collect();
        assert_eq!(cases, ["rpv-002", "rpv-003"]);
    }

    #[test]
    fn test_missing_date_never_matches_a_bounded_filter() {
        let records = sample_set();
        let filter = RecordFilter::default().with_date_range(DateRange::new(
            "due_date",
            None,
            NaiveDate::from_ymd_opt(2030, 1, 1),
        ));
        let out = filter_records(&records, &filter);
        // rpv-004 has a blank due_date and drops out.
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let records = sample_set();
        let filter = RecordFilter::by_status(Status::Triagem)
            .with_text(TextMatch::new("silva", &["claimant_name"]))
            .with_date_range(DateRange::new(
                "due_date",
                NaiveDate::from_ymd_opt(2024, 7, 1),
                NaiveDate::from_ymd_opt(2024, 12, 31),
            ));
        let out = filter_records(&records, &filter);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].case_number, "rpv-003");
    }

    #[test]
    fn test_filter_is_stable_not_resorted() {
        // Reverse insertion order must survive filtering untouched.
        let mut records = sample_set();
        records.reverse();
        let out = filter_records(&records, &RecordFilter::by_status(Status::Triagem));
        let cases: Vec<_> = out.iter().map(|r| r.case_number.as_str()).collect();
        assert_eq!(cases, ["rpv-003", "rpv-002"]);
    }
}
