//! Send-allocation policy for the variants of an email step.
//!
//! Even distribution gives every variant `100 / n` points and hands the
//! remainder out one point at a time starting from the first variant, so
//! three variants always split as 34/33/33.

use serde::{Deserialize, Serialize};

use crate::error::{SequenceError, SequenceResult};
use crate::types::{Step, StepBody, Variant};

pub const FULL_ALLOCATION: u32 = 100;

/// How the caller wants allocation assigned across a step's variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "percentages")]
pub enum AllocationMode {
    Even,
    Manual(Vec<u32>),
}

/// Returns `variant_count` integers summing to exactly 100.
pub fn distribute_evenly(variant_count: usize) -> Vec<u32> {
    if variant_count == 0 {
        return Vec::new();
    }
    let n = variant_count as u32;
    let base = FULL_ALLOCATION / n;
    let remainder = (FULL_ALLOCATION % n) as usize;
    (0..variant_count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Overwrites every variant's allocation with the even distribution.
pub(crate) fn rebalance(variants: &mut [Variant]) {
    let shares = distribute_evenly(variants.len());
    for (variant, share) in variants.iter_mut().zip(shares) {
        variant.allocation_percent = share;
    }
}

/// Replaces the step's allocations with caller-supplied percentages, in
/// variant order. The step is left untouched on failure.
pub fn apply_manual(step: &mut Step, percentages: &[u32]) -> SequenceResult<()> {
    let kind = step.kind();
    let StepBody::Email { variants } = &mut step.body else {
        return Err(SequenceError::invalid_operation(
            kind,
            "only email steps carry an allocation",
        ));
    };

    if percentages.len() != variants.len() {
        return Err(SequenceError::allocation_mismatch(format!(
            "expected {} percentages, got {}",
            variants.len(),
            percentages.len()
        )));
    }
    if let Some(bad) = percentages.iter().find(|p| **p > FULL_ALLOCATION) {
        return Err(SequenceError::allocation_mismatch(format!(
            "{} is outside 0..=100",
            bad
        )));
    }
    let sum: u64 = percentages.iter().map(|p| u64::from(*p)).sum();
    if sum != u64::from(FULL_ALLOCATION) {
        return Err(SequenceError::allocation_mismatch(format!(
            "percentages sum to {}, expected 100",
            sum
        )));
    }

    for (variant, percent) in variants.iter_mut().zip(percentages) {
        variant.allocation_percent = *percent;
    }
    Ok(())
}

/// Applies either allocation mode to the step.
pub fn apply_mode(step: &mut Step, mode: &AllocationMode) -> SequenceResult<()> {
    match mode {
        AllocationMode::Manual(percentages) => apply_manual(step, percentages),
        AllocationMode::Even => match &mut step.body {
            StepBody::Email { variants } => {
                rebalance(variants);
                Ok(())
            }
            other => Err(SequenceError::invalid_operation(
                other.kind(),
                "only email steps carry an allocation",
            )),
        },
    }
}

/// True when the step's allocations sum to exactly 100. Single-variant and
/// non-email steps always pass.
pub fn validate_sum(step: &Step) -> bool {
    let variants = step.variants();
    if variants.len() <= 1 {
        return true;
    }
    let sum: u64 = variants
        .iter()
        .map(|v| u64::from(v.allocation_percent))
        .sum();
    sum == u64::from(FULL_ALLOCATION)
}
