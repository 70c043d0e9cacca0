//! Step and variant construction plus per-step structural validation,
//! independent of where the step sits in a sequence.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::allocator::{self, FULL_ALLOCATION};
use crate::error::{SequenceError, SequenceResult};
use crate::types::{Step, StepBody, StepKind, Variant, VariantId};

/// Machine-readable code attached to every validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCode {
    // Field level
    WaitDaysTooSmall,
    MissingTitle,
    NoVariants,
    AllocationOutOfRange,
    // Sequence level
    AllocationSumMismatch,
    EmptySequence,
    LeadingWait,
    AdjacentWait,
    OrderMismatch,
    DuplicateStepId,
    DuplicateVariantId,
    TooManySteps,
    TooManyVariants,
    WaitTooLong,
    // Warnings
    EmptySubject,
    EmptyBody,
    EmptyTitle,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::WaitDaysTooSmall => "WaitDaysTooSmall",
            IssueCode::MissingTitle => "MissingTitle",
            IssueCode::NoVariants => "NoVariants",
            IssueCode::AllocationOutOfRange => "AllocationOutOfRange",
            IssueCode::AllocationSumMismatch => "AllocationSumMismatch",
            IssueCode::EmptySequence => "EmptySequence",
            IssueCode::LeadingWait => "LeadingWait",
            IssueCode::AdjacentWait => "AdjacentWait",
            IssueCode::OrderMismatch => "OrderMismatch",
            IssueCode::DuplicateStepId => "DuplicateStepId",
            IssueCode::DuplicateVariantId => "DuplicateVariantId",
            IssueCode::TooManySteps => "TooManySteps",
            IssueCode::TooManyVariants => "TooManyVariants",
            IssueCode::WaitTooLong => "WaitTooLong",
            IssueCode::EmptySubject => "EmptySubject",
            IssueCode::EmptyBody => "EmptyBody",
            IssueCode::EmptyTitle => "EmptyTitle",
        }
    }
}

impl std::fmt::Display for IssueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single malformed or missing field on a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub code: IssueCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub message: String,
}

/// Outcome of validating one step. Empty = valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn codes(&self) -> Vec<IssueCode> {
        self.errors.iter().map(|e| e.code).collect()
    }

    fn push(&mut self, field: &str, code: IssueCode, variant_id: Option<VariantId>, message: String) {
        self.errors.push(FieldError {
            field: field.to_string(),
            code,
            variant_id,
            message,
        });
    }
}

/// Checks the kind-specific required fields of a step.
pub fn validate(step: &Step) -> ValidationResult {
    let mut result = ValidationResult::default();
    match &step.body {
        StepBody::Wait { wait_days } => {
            if *wait_days < 1 {
                result.push(
                    "wait_days",
                    IssueCode::WaitDaysTooSmall,
                    None,
                    format!("wait must be at least 1 day, got {}", wait_days),
                );
            }
        }
        StepBody::Manual { title } => {
            if title.is_none() {
                result.push(
                    "title",
                    IssueCode::MissingTitle,
                    None,
                    "manual task has no title field".to_string(),
                );
            }
        }
        StepBody::Email { variants } => {
            if variants.is_empty() {
                result.push(
                    "variants",
                    IssueCode::NoVariants,
                    None,
                    "email step needs at least one variant".to_string(),
                );
            }
            for variant in variants {
                if variant.allocation_percent > FULL_ALLOCATION {
                    result.push(
                        "allocation_percent",
                        IssueCode::AllocationOutOfRange,
                        Some(variant.id),
                        format!(
                            "allocation {} is outside 0..=100",
                            variant.allocation_percent
                        ),
                    );
                }
            }
        }
    }
    result
}

/// Builds a new step of the given kind with default fields at order 0.
pub fn create_default(kind: StepKind) -> Step {
    Step {
        id: Uuid::new_v4(),
        order: 0,
        body: default_body(kind),
    }
}

pub(crate) fn default_body(kind: StepKind) -> StepBody {
    match kind {
        StepKind::Email => StepBody::Email {
            variants: vec![Variant::new(FULL_ALLOCATION)],
        },
        StepKind::Wait => StepBody::Wait { wait_days: 1 },
        StepKind::Manual => StepBody::Manual {
            title: Some(String::new()),
        },
    }
}

fn email_variants_mut<'a>(step: &'a mut Step, action: &str) -> SequenceResult<&'a mut Vec<Variant>> {
    let kind = step.kind();
    match &mut step.body {
        StepBody::Email { variants } => Ok(variants),
        _ => Err(SequenceError::invalid_operation(
            kind,
            format!("cannot {} on a non-email step", action),
        )),
    }
}

/// Appends a blank variant and redistributes allocation evenly.
pub fn add_variant(step: &Step) -> SequenceResult<Step> {
    let mut next = step.clone();
    let variants = email_variants_mut(&mut next, "add a variant")?;
    variants.push(Variant::new(0));
    allocator::rebalance(variants);
    debug!(step_id = %step.id, variants = variants.len(), "Added variant");
    Ok(next)
}

/// Removes a variant and redistributes the rest evenly. The last variant of
/// a step can never be removed.
pub fn remove_variant(step: &Step, variant_id: &VariantId) -> SequenceResult<Step> {
    let mut next = step.clone();
    let kind = next.kind();
    let variants = email_variants_mut(&mut next, "remove a variant")?;
    let index = variants
        .iter()
        .position(|v| v.id == *variant_id)
        .ok_or_else(|| SequenceError::variant_not_found(*variant_id))?;
    if variants.len() <= 1 {
        return Err(SequenceError::invalid_operation(
            kind,
            "an email step must keep at least one variant",
        ));
    }
    variants.remove(index);
    allocator::rebalance(variants);
    debug!(step_id = %step.id, %variant_id, "Removed variant");
    Ok(next)
}

/// Sets the delay of a wait step. Range checks happen in `validate`.
pub fn set_wait_days(step: &Step, days: u32) -> SequenceResult<Step> {
    let mut next = step.clone();
    match &mut next.body {
        StepBody::Wait { wait_days } => {
            *wait_days = days;
            Ok(next)
        }
        other => Err(SequenceError::invalid_operation(
            other.kind(),
            "only wait steps have a delay",
        )),
    }
}

/// Sets the title of a manual task.
pub fn set_title(step: &Step, new_title: impl Into<String>) -> SequenceResult<Step> {
    let mut next = step.clone();
    match &mut next.body {
        StepBody::Manual { title } => {
            *title = Some(new_title.into());
            Ok(next)
        }
        other => Err(SequenceError::invalid_operation(
            other.kind(),
            "only manual steps have a title",
        )),
    }
}

/// Replaces the subject and body of one variant of an email step.
pub fn set_variant_content(
    step: &Step,
    variant_id: &VariantId,
    subject: impl Into<String>,
    body: impl Into<String>,
) -> SequenceResult<Step> {
    let mut next = step.clone();
    let variants = email_variants_mut(&mut next, "edit variant content")?;
    let variant = variants
        .iter_mut()
        .find(|v| v.id == *variant_id)
        .ok_or_else(|| SequenceError::variant_not_found(*variant_id))?;
    variant.subject = subject.into();
    variant.body = body.into();
    Ok(next)
}
