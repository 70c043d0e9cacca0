//! Draft persistence seam.
//!
//! The console keeps the authoritative draft somewhere outside this crate;
//! [`DraftStore`] is the interface it implements. [`JsonDraftStore`] keeps
//! each draft as a JSON document in memory.

use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::draft::CampaignDraft;
use crate::error::SequenceResult;

/// Load/save a sequence draft by campaign id.
pub trait DraftStore: Send + Sync {
    fn load(&self, campaign_id: &Uuid) -> SequenceResult<Option<CampaignDraft>>;
    fn save(&self, draft: &CampaignDraft) -> SequenceResult<()>;
    /// Returns `true` if a draft was removed.
    fn delete(&self, campaign_id: &Uuid) -> bool;
}

/// In-memory store holding each draft as serialized JSON. Integer fields
/// (`order`, `allocation_percent`) are written as stored and never
/// recomputed on load.
#[derive(Debug, Default)]
pub struct JsonDraftStore {
    drafts: DashMap<Uuid, String>,
}

impl JsonDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Raw JSON document for a campaign, as persisted.
    pub fn raw(&self, campaign_id: &Uuid) -> Option<String> {
        self.drafts.get(campaign_id).map(|r| r.value().clone())
    }

    /// Stores a raw JSON document, e.g. one imported from another system.
    pub fn put_raw(&self, campaign_id: Uuid, json: impl Into<String>) {
        self.drafts.insert(campaign_id, json.into());
    }
}

impl DraftStore for JsonDraftStore {
    fn load(&self, campaign_id: &Uuid) -> SequenceResult<Option<CampaignDraft>> {
        match self.drafts.get(campaign_id) {
            Some(entry) => Ok(Some(serde_json::from_str(entry.value())?)),
            None => Ok(None),
        }
    }

    fn save(&self, draft: &CampaignDraft) -> SequenceResult<()> {
        let json = serde_json::to_string(draft)?;
        info!(
            campaign_id = %draft.campaign_id,
            revision = draft.revision,
            bytes = json.len(),
            "Saved sequence draft"
        );
        self.drafts.insert(draft.campaign_id, json);
        Ok(())
    }

    fn delete(&self, campaign_id: &Uuid) -> bool {
        self.drafts.remove(campaign_id).is_some()
    }
}
