use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type StepId = Uuid;
pub type VariantId = Uuid;

/// The full ordered list of steps belonging to one campaign draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub steps: Vec<Step>,
}

impl Sequence {
    /// Creates an empty sequence, the state of a freshly opened draft.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the step with the given id, if present.
    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == *id)
    }

    /// Returns the current index of the step with the given id.
    pub fn position(&self, id: &StepId) -> Option<usize> {
        self.steps.iter().position(|s| s.id == *id)
    }

    /// Kinds of all steps, in order.
    pub fn kinds(&self) -> Vec<StepKind> {
        self.steps.iter().map(Step::kind).collect()
    }

    /// Rewrites every `order` field to match the step's index.
    pub(crate) fn renumber(&mut self) {
        for (index, step) in self.steps.iter_mut().enumerate() {
            step.order = index as u32;
        }
    }
}

/// One node in a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub order: u32,
    #[serde(flatten)]
    pub body: StepBody,
}

impl Step {
    pub fn kind(&self) -> StepKind {
        self.body.kind()
    }

    pub fn is_wait(&self) -> bool {
        self.kind() == StepKind::Wait
    }

    /// Variants of an email step; empty for every other kind.
    pub fn variants(&self) -> &[Variant] {
        match &self.body {
            StepBody::Email { variants } => variants,
            _ => &[],
        }
    }

    /// Display labels of the step's variants in order (`A`, `B`, …).
    pub fn variant_labels(&self) -> Vec<String> {
        (0..self.variants().len()).map(variant_label).collect()
    }
}

/// Discriminant of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Email,
    Wait,
    Manual,
}

/// Kind-specific step fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StepBody {
    Email {
        variants: Vec<Variant>,
    },
    Wait {
        wait_days: u32,
    },
    Manual {
        /// `None` only for malformed persisted drafts; new steps start at `""`.
        #[serde(default)]
        title: Option<String>,
    },
}

impl StepBody {
    pub fn kind(&self) -> StepKind {
        match self {
            StepBody::Email { .. } => StepKind::Email,
            StepBody::Wait { .. } => StepKind::Wait,
            StepBody::Manual { .. } => StepKind::Manual,
        }
    }
}

/// One A/B branch of an email step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    pub allocation_percent: u32,
}

impl Variant {
    pub fn new(allocation_percent: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: String::new(),
            body: String::new(),
            allocation_percent,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// Display label for the variant at `index`: A..Z, then AA, AB, …
pub fn variant_label(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_labels() {
        assert_eq!(variant_label(0), "A");
        assert_eq!(variant_label(2), "C");
        assert_eq!(variant_label(25), "Z");
        assert_eq!(variant_label(26), "AA");
        assert_eq!(variant_label(27), "AB");
    }

    #[test]
    fn test_step_serializes_with_kind_tag() {
        let step = Step {
            id: Uuid::new_v4(),
            order: 3,
            body: StepBody::Wait { wait_days: 2 },
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["kind"], "wait");
        assert_eq!(json["wait_days"], 2);
        assert_eq!(json["order"], 3);

        let back: Step = serde_json::from_value(json).unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn test_manual_step_without_title_deserializes_as_none() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "order": 0,
            "kind": "manual",
        });
        let step: Step = serde_json::from_value(json).unwrap();
        assert_eq!(step.body, StepBody::Manual { title: None });
    }

    #[test]
    fn test_non_email_steps_have_no_variants() {
        let step = Step {
            id: Uuid::new_v4(),
            order: 0,
            body: StepBody::Manual {
                title: Some(String::new()),
            },
        };
        assert!(step.variants().is_empty());
        assert!(step.variant_labels().is_empty());
        assert!(!step.is_wait());
    }

    #[test]
    fn test_email_step_variant_labels_follow_order() {
        let step = Step {
            id: Uuid::new_v4(),
            order: 0,
            body: StepBody::Email {
                variants: vec![Variant::new(34), Variant::new(33), Variant::new(33)],
            },
        };
        assert_eq!(step.variant_labels(), vec!["A", "B", "C"]);
    }
}
