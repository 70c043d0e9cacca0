//! Readiness report for a whole sequence, produced before a campaign may be
//! activated. Validation never fails; every problem becomes report data so
//! the UI can render it inline next to the step it belongs to.

use std::collections::HashSet;

use campaign_core::config::SequenceConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::allocator;
use crate::step::{self, IssueCode};
use crate::types::{variant_label, Sequence, StepBody, StepId, VariantId};

/// One problem found in a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportIssue {
    pub step_id: Option<StepId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub code: IssueCode,
    pub message: String,
}

/// Aggregate validation result for a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceReport {
    pub is_ready: bool,
    pub errors: Vec<ReportIssue>,
    /// Non-blocking hints; never affect `is_ready`.
    #[serde(default)]
    pub warnings: Vec<ReportIssue>,
}

impl SequenceReport {
    pub fn error_codes(&self) -> Vec<IssueCode> {
        self.errors.iter().map(|e| e.code).collect()
    }

    /// Errors attached to one step.
    pub fn errors_for(&self, step_id: &StepId) -> Vec<&ReportIssue> {
        self.errors
            .iter()
            .filter(|e| e.step_id.as_ref() == Some(step_id))
            .collect()
    }
}

#[derive(Default)]
struct IssueList(Vec<ReportIssue>);

impl IssueList {
    fn push(
        &mut self,
        step_id: Option<StepId>,
        variant_id: Option<VariantId>,
        code: IssueCode,
        message: impl Into<String>,
    ) {
        self.0.push(ReportIssue {
            step_id,
            variant_id,
            code,
            message: message.into(),
        });
    }
}

/// Runs per-step, allocation and structural checks over a sequence.
#[derive(Debug, Clone, Default)]
pub struct SequenceValidator {
    limits: SequenceConfig,
}

impl SequenceValidator {
    /// Creates a validator with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(limits: SequenceConfig) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SequenceConfig {
        &self.limits
    }

    pub fn validate(&self, sequence: &Sequence) -> SequenceReport {
        let mut errors = IssueList::default();
        let mut warnings = IssueList::default();

        if sequence.is_empty() {
            errors.push(
                None,
                None,
                IssueCode::EmptySequence,
                "sequence has no steps",
            );
            return SequenceReport {
                is_ready: false,
                errors: errors.0,
                warnings: warnings.0,
            };
        }

        if sequence.len() > self.limits.max_steps {
            errors.push(
                None,
                None,
                IssueCode::TooManySteps,
                format!(
                    "sequence has {} steps, limit is {}",
                    sequence.len(),
                    self.limits.max_steps
                ),
            );
        }

        let mut step_ids = HashSet::new();
        let mut variant_ids = HashSet::new();

        for (index, s) in sequence.steps.iter().enumerate() {
            let id = Some(s.id);

            if s.order as usize != index {
                errors.push(
                    id,
                    None,
                    IssueCode::OrderMismatch,
                    format!("step at position {} has order {}", index, s.order),
                );
            }
            if !step_ids.insert(s.id) {
                errors.push(id, None, IssueCode::DuplicateStepId, "step id appears more than once");
            }

            for field in step::validate(s).errors {
                errors.push(id, field.variant_id, field.code, field.message);
            }

            match &s.body {
                StepBody::Email { variants } => {
                    if !allocator::validate_sum(s) {
                        let sum: u64 = variants
                            .iter()
                            .map(|v| u64::from(v.allocation_percent))
                            .sum();
                        errors.push(
                            id,
                            None,
                            IssueCode::AllocationSumMismatch,
                            format!("variant allocations sum to {}, expected 100", sum),
                        );
                    }
                    if variants.len() > self.limits.max_variants_per_step {
                        errors.push(
                            id,
                            None,
                            IssueCode::TooManyVariants,
                            format!(
                                "step has {} variants, limit is {}",
                                variants.len(),
                                self.limits.max_variants_per_step
                            ),
                        );
                    }
                    for (index, v) in variants.iter().enumerate() {
                        if !variant_ids.insert(v.id) {
                            errors.push(
                                id,
                                Some(v.id),
                                IssueCode::DuplicateVariantId,
                                "variant id appears more than once",
                            );
                        }
                        if v.subject.trim().is_empty() {
                            warnings.push(
                                id,
                                Some(v.id),
                                IssueCode::EmptySubject,
                                format!("variant {} subject is empty", variant_label(index)),
                            );
                        }
                        if v.body.trim().is_empty() {
                            warnings.push(
                                id,
                                Some(v.id),
                                IssueCode::EmptyBody,
                                format!("variant {} body is empty", variant_label(index)),
                            );
                        }
                    }
                }
                StepBody::Wait { wait_days } => {
                    if *wait_days > self.limits.max_wait_days {
                        errors.push(
                            id,
                            None,
                            IssueCode::WaitTooLong,
                            format!(
                                "wait of {} days exceeds the {} day limit",
                                wait_days, self.limits.max_wait_days
                            ),
                        );
                    }
                }
                StepBody::Manual { title } => {
                    if title.as_deref().is_some_and(|t| t.trim().is_empty()) {
                        warnings.push(id, None, IssueCode::EmptyTitle, "manual task title is empty");
                    }
                }
            }
        }

        if sequence.steps[0].is_wait() {
            errors.push(
                Some(sequence.steps[0].id),
                None,
                IssueCode::LeadingWait,
                "a sequence cannot start with a wait step",
            );
        }
        for pair in sequence.steps.windows(2) {
            if pair[0].is_wait() && pair[1].is_wait() {
                errors.push(
                    Some(pair[1].id),
                    None,
                    IssueCode::AdjacentWait,
                    "two wait steps cannot be adjacent",
                );
            }
        }

        let is_ready = errors.0.is_empty();
        debug!(
            steps = sequence.len(),
            errors = errors.0.len(),
            warnings = warnings.0.len(),
            is_ready,
            "Validated sequence"
        );
        SequenceReport {
            is_ready,
            errors: errors.0,
            warnings: warnings.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor;
    use crate::types::{Step, StepKind, Variant};
    use uuid::Uuid;

    fn build(kinds: &[StepKind]) -> Sequence {
        let mut seq = Sequence::new();
        for kind in kinds {
            seq = editor::append_step(&seq, *kind).unwrap();
        }
        seq
    }

    #[test]
    fn test_empty_sequence_report() {
        let report = SequenceValidator::new().validate(&Sequence::new());
        assert!(!report.is_ready);
        assert_eq!(report.error_codes(), vec![IssueCode::EmptySequence]);
        assert!(report.errors[0].step_id.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["errors"][0]["code"], "EmptySequence");
    }

    #[test]
    fn test_valid_sequence_is_ready() {
        let seq = build(&[StepKind::Email, StepKind::Wait, StepKind::Manual]);
        let report = SequenceValidator::new().validate(&seq);
        assert!(report.is_ready, "{:?}", report.errors);
        // Drafted content is still blank.
        assert!(report.warnings.iter().any(|w| w.code == IssueCode::EmptySubject));
        assert!(report.warnings.iter().any(|w| w.code == IssueCode::EmptyTitle));
    }

    #[test]
    fn test_content_warnings_name_the_variant() {
        let seq = Sequence {
            steps: vec![Step {
                id: Uuid::new_v4(),
                order: 0,
                body: StepBody::Email {
                    variants: vec![
                        Variant::new(50).with_subject("Hello").with_body("Hi there"),
                        Variant::new(50).with_subject("Following up"),
                    ],
                },
            }],
        };
        let report = SequenceValidator::new().validate(&seq);
        assert!(report.is_ready);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].code, IssueCode::EmptyBody);
        assert_eq!(report.warnings[0].message, "variant B body is empty");
        assert_eq!(
            report.warnings[0].variant_id,
            Some(seq.steps[0].variants()[1].id)
        );
    }

    #[test]
    fn test_structural_violations_reported() {
        let mut seq = build(&[StepKind::Email, StepKind::Wait]);
        // Removing the email leaves a leading wait.
        let email = seq.steps[0].id;
        seq = editor::remove_step(&seq, &email).unwrap();
        let report = SequenceValidator::new().validate(&seq);
        assert_eq!(report.error_codes(), vec![IssueCode::LeadingWait]);

        let mut seq = build(&[StepKind::Email, StepKind::Wait, StepKind::Manual, StepKind::Wait]);
        let manual = seq.steps[2].id;
        seq = editor::remove_step(&seq, &manual).unwrap();
        let report = SequenceValidator::new().validate(&seq);
        assert_eq!(report.error_codes(), vec![IssueCode::AdjacentWait]);
        assert_eq!(report.errors[0].step_id, Some(seq.steps[2].id));
    }

    #[test]
    fn test_field_and_allocation_errors() {
        let mut seq = build(&[StepKind::Email, StepKind::Wait]);
        seq.steps[0].body = StepBody::Email {
            variants: vec![Variant::new(60), Variant::new(60)],
        };
        seq.steps[1].body = StepBody::Wait { wait_days: 0 };

        let report = SequenceValidator::new().validate(&seq);
        assert!(!report.is_ready);
        assert_eq!(
            report.error_codes(),
            vec![IssueCode::AllocationSumMismatch, IssueCode::WaitDaysTooSmall]
        );
        assert_eq!(report.errors_for(&seq.steps[1].id).len(), 1);
    }

    #[test]
    fn test_integrity_checks() {
        let mut seq = build(&[StepKind::Email, StepKind::Manual]);
        seq.steps[1].order = 5;
        let dup = Step {
            id: seq.steps[0].id,
            order: 2,
            body: StepBody::Manual {
                title: Some("x".into()),
            },
        };
        seq.steps.push(dup);

        let codes = SequenceValidator::new().validate(&seq).error_codes();
        assert!(codes.contains(&IssueCode::OrderMismatch));
        assert!(codes.contains(&IssueCode::DuplicateStepId));
    }

    #[test]
    fn test_configured_limits() {
        let validator = SequenceValidator::with_config(SequenceConfig {
            max_steps: 2,
            max_variants_per_step: 1,
            max_wait_days: 7,
        });
        let mut seq = build(&[StepKind::Email, StepKind::Wait, StepKind::Manual]);
        let email = seq.steps[0].id;
        seq = editor::add_variant(&seq, &email).unwrap();
        seq.steps[1].body = StepBody::Wait { wait_days: 30 };

        let codes = validator.validate(&seq).error_codes();
        assert!(codes.contains(&IssueCode::TooManySteps));
        assert!(codes.contains(&IssueCode::TooManyVariants));
        assert!(codes.contains(&IssueCode::WaitTooLong));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let mut seq = build(&[StepKind::Email, StepKind::Wait]);
        seq.steps.push(Step {
            id: Uuid::new_v4(),
            order: 2,
            body: StepBody::Wait { wait_days: 0 },
        });
        let validator = SequenceValidator::new();
        assert_eq!(validator.validate(&seq), validator.validate(&seq));
    }
}
