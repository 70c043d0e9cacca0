//! Campaign sequence builder: ordered outreach sequences of email, wait and
//! manual-task steps, with A/B variant allocation for email steps.

pub mod allocator;
pub mod draft;
pub mod editor;
pub mod error;
pub mod step;
pub mod store;
pub mod types;
pub mod validator;

pub use allocator::AllocationMode;
pub use draft::{ActivatedSequence, CampaignDraft, SequenceState};
pub use error::{SequenceError, SequenceResult};
pub use store::{DraftStore, JsonDraftStore};
pub use types::{Sequence, Step, StepBody, StepId, StepKind, Variant, VariantId};
pub use validator::{SequenceReport, SequenceValidator};
