//! Assorted helpers.

use crate::error::{Result, ScheduleError};

/// Default memory quantum: budgets are counted in MiB.
pub const DEFAULT_MEMORY_UNIT: u64 = 1 << 20;

/// Convert a byte count into whole memory units, rounding down.
///
/// The DP treats budgets as integers, so activations and limits must be
/// expressed in the same unit. Rounding the limit down keeps every schedule
/// within the real byte budget.
pub fn budget_from_bytes(bytes: u64, unit: u64) -> Result<u64> {
    if unit == 0 {
        return Err(ScheduleError::InvalidConfig("memory unit must be positive"));
    }
    Ok(bytes / unit)
}

/// Convert a per-activation size into units, rounding up so that the model
/// never under-counts a tensor.
pub fn weight_from_bytes(bytes: u64, unit: u64) -> Result<u64> {
    if unit == 0 {
        return Err(ScheduleError::InvalidConfig("memory unit must be positive"));
    }
    Ok(bytes.div_ceil(unit))
}
