use crate::common::errors::InvariantViolation;
use crate::common::float_utils::approx_eq;
use super::calculator::BucketedProfile;

/// Bucket volumes must sum to the volume merged into the profile
pub fn verify_volume_conservation(profile: &BucketedProfile, expected: f64) -> Result<(), InvariantViolation> {
    let actual = profile.total_volume();
    if approx_eq(actual, expected) {
        Ok(())
    } else {
        Err(InvariantViolation::VolumeConservation { expected, actual })
    }
}

/// Buckets must tile `[range_low, range_high]` contiguously without overlap
pub fn verify_partition(profile: &BucketedProfile) -> Result<(), InvariantViolation> {
    let Some(grid) = profile.grid() else {
        return Ok(());
    };

    let mut expected_low = grid.low;
    for index in 0..grid.count {
        let (low, high) = grid.bounds(index).ok_or_else(|| InvariantViolation::BucketPartition {
            index,
            detail: "missing bounds".to_string(),
        })?;
        if !approx_eq(low, expected_low) {
            return Err(InvariantViolation::BucketPartition {
                index,
                detail: format!("starts at {} but previous bucket ended at {}", low, expected_low),
            });
        }
        if high < low {
            return Err(InvariantViolation::BucketPartition {
                index,
                detail: format!("inverted bounds [{}, {})", low, high),
            });
        }
        expected_low = high;
    }

    if !approx_eq(expected_low, grid.high) {
        return Err(InvariantViolation::BucketPartition {
            index: grid.count - 1,
            detail: format!("last bucket ends at {} instead of {}", expected_low, grid.high),
        });
    }
    Ok(())
}
