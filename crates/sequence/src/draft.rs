//! Draft lifecycle: `Empty → Draft → Ready → Activated`.
//!
//! A draft owns its sequence and swaps it wholesale on every edit. Once
//! activated the sequence is frozen inside an [`ActivatedSequence`]; further
//! editing starts from a fresh draft copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{SequenceError, SequenceResult};
use crate::types::Sequence;
use crate::validator::{SequenceReport, SequenceValidator};

/// Lifecycle state of a campaign's sequence as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceState {
    Empty,
    Draft,
    Ready,
    Activated,
}

impl SequenceState {
    /// Returns `true` if the lifecycle allows moving from `self` to `to`.
    /// Edits move freely among the three editable states; only `Ready` may
    /// activate and nothing leaves `Activated`.
    pub fn can_transition_to(&self, to: SequenceState) -> bool {
        use SequenceState::*;
        matches!(
            (self, to),
            (Empty, Draft)
                | (Draft, Empty)
                | (Draft, Ready)
                | (Ready, Draft)
                | (Ready, Empty)
                | (Empty, Ready)
                | (Ready, Activated)
        )
    }
}

/// An editable sequence belonging to one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignDraft {
    pub campaign_id: Uuid,
    pub sequence: Sequence,
    /// Bumped on every successful edit.
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

impl CampaignDraft {
    /// Opens a new, empty draft for a campaign.
    pub fn new(campaign_id: Uuid) -> Self {
        Self {
            campaign_id,
            sequence: Sequence::new(),
            revision: 0,
            updated_at: Utc::now(),
        }
    }

    /// Derives the editable state from the sequence contents.
    pub fn state(&self, validator: &SequenceValidator) -> SequenceState {
        Self::state_from(&self.sequence, &validator.validate(&self.sequence))
    }

    fn state_from(sequence: &Sequence, report: &SequenceReport) -> SequenceState {
        if sequence.is_empty() {
            SequenceState::Empty
        } else if report.is_ready {
            SequenceState::Ready
        } else {
            SequenceState::Draft
        }
    }

    pub fn report(&self, validator: &SequenceValidator) -> SequenceReport {
        validator.validate(&self.sequence)
    }

    /// Runs an editor operation against the current sequence and, on
    /// success, replaces it. On failure the draft is left as it was.
    pub fn apply<F>(&mut self, edit: F) -> SequenceResult<()>
    where
        F: FnOnce(&Sequence) -> SequenceResult<Sequence>,
    {
        let next = edit(&self.sequence)?;
        self.sequence = next;
        self.revision += 1;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Freezes a ready sequence into an activated snapshot.
    pub fn activate(&self, validator: &SequenceValidator) -> SequenceResult<ActivatedSequence> {
        let report = validator.validate(&self.sequence);
        let state = Self::state_from(&self.sequence, &report);
        if !state.can_transition_to(SequenceState::Activated) {
            warn!(
                campaign_id = %self.campaign_id,
                errors = report.errors.len(),
                "Refusing to activate sequence"
            );
            return Err(SequenceError::NotReady {
                errors: report.errors.len(),
            });
        }

        info!(
            campaign_id = %self.campaign_id,
            revision = self.revision,
            steps = self.sequence.len(),
            "Activated sequence"
        );
        Ok(ActivatedSequence {
            campaign_id: self.campaign_id,
            sequence: self.sequence.clone(),
            revision: self.revision,
            activated_at: Utc::now(),
        })
    }
}

/// Read-only snapshot of a sequence attached to an active campaign.
///
/// Loading a snapshot re-runs readiness validation with the default limits,
/// so a stored document can never smuggle in a sequence that was not ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawActivatedSequence")]
pub struct ActivatedSequence {
    campaign_id: Uuid,
    sequence: Sequence,
    revision: u64,
    activated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawActivatedSequence {
    campaign_id: Uuid,
    sequence: Sequence,
    revision: u64,
    activated_at: DateTime<Utc>,
}

impl TryFrom<RawActivatedSequence> for ActivatedSequence {
    type Error = SequenceError;

    fn try_from(raw: RawActivatedSequence) -> Result<Self, Self::Error> {
        let report = SequenceValidator::new().validate(&raw.sequence);
        if !report.is_ready {
            warn!(
                campaign_id = %raw.campaign_id,
                errors = report.errors.len(),
                "Rejected stored snapshot of a sequence that is not ready"
            );
            return Err(SequenceError::NotReady {
                errors: report.errors.len(),
            });
        }
        Ok(Self {
            campaign_id: raw.campaign_id,
            sequence: raw.sequence,
            revision: raw.revision,
            activated_at: raw.activated_at,
        })
    }
}

impl ActivatedSequence {
    pub fn campaign_id(&self) -> Uuid {
        self.campaign_id
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn activated_at(&self) -> DateTime<Utc> {
        self.activated_at
    }

    pub fn state(&self) -> SequenceState {
        SequenceState::Activated
    }

    /// Starts a new editable draft from this snapshot.
    pub fn to_draft(&self) -> CampaignDraft {
        CampaignDraft {
            campaign_id: self.campaign_id,
            sequence: self.sequence.clone(),
            revision: self.revision + 1,
            updated_at: Utc::now(),
        }
    }
}
