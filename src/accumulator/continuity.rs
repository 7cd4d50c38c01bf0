use crate::common::InvariantViolation;

use super::structs::HistoricalRecord;

/// Zero-lag anchoring must tile the bar axis: each record starts right after the previous
/// one ends.
pub fn verify_boundary_continuity(records: &[HistoricalRecord]) -> Result<(), InvariantViolation> {
    for (index, pair) in records.windows(2).enumerate() {
        let (current, next) = (pair[0].boundary(), pair[1].boundary());
        if current.end_bar + 1 != next.start_bar {
            return Err(InvariantViolation::BoundaryDiscontinuity {
                index,
                end: current.end_bar,
                next_start: next.start_bar,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume_profile::ProfileSummary;

    fn record(start_bar: u64, end_bar: u64) -> HistoricalRecord {
        HistoricalRecord {
            start_bar,
            end_bar,
            peaks: Vec::new(),
            summary: ProfileSummary::default(),
        }
    }

    #[test]
    fn test_contiguous_records_pass() {
        let records = vec![record(0, 99), record(100, 249), record(250, 349)];
        assert!(verify_boundary_continuity(&records).is_ok());
        assert!(verify_boundary_continuity(&[]).is_ok());
    }

    #[test]
    fn test_gap_is_reported() {
        let records = vec![record(0, 99), record(101, 200)];
        assert_eq!(
            verify_boundary_continuity(&records),
            Err(InvariantViolation::BoundaryDiscontinuity {
                index: 0,
                end: 99,
                next_start: 101
            })
        );
    }

    #[test]
    fn test_overlap_is_reported() {
        let records = vec![record(0, 49), record(45, 99)];
        assert!(verify_boundary_continuity(&records).is_err());
    }
}
