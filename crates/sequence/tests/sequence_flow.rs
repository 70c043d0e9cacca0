//! End-to-end editing flows through the public API.

use campaign_sequence::allocator::distribute_evenly;
use campaign_sequence::step::IssueCode;
use campaign_sequence::{
    editor, step, AllocationMode, CampaignDraft, DraftStore, JsonDraftStore, Sequence,
    SequenceError, SequenceState, SequenceValidator, StepKind,
};
use uuid::Uuid;

fn allocations(seq: &Sequence, index: usize) -> Vec<u32> {
    seq.steps[index]
        .variants()
        .iter()
        .map(|v| v.allocation_percent)
        .collect()
}

fn assert_contiguous(seq: &Sequence) {
    for (index, s) in seq.steps.iter().enumerate() {
        assert_eq!(s.order as usize, index);
    }
}

#[test]
fn wait_after_single_email_is_accepted() {
    let seq = editor::append_step(&Sequence::new(), StepKind::Email).unwrap();
    assert_eq!(allocations(&seq, 0), vec![100]);

    let seq = editor::insert_step(&seq, StepKind::Wait, 1).unwrap();
    assert_eq!(seq.kinds(), vec![StepKind::Email, StepKind::Wait]);
    assert_contiguous(&seq);
}

#[test]
fn wait_next_to_existing_wait_is_rejected() {
    let seq = editor::append_step(&Sequence::new(), StepKind::Email).unwrap();
    let seq = editor::append_step(&seq, StepKind::Wait).unwrap();

    let err = editor::insert_step(&seq, StepKind::Wait, 1).unwrap_err();
    assert!(matches!(err, SequenceError::InvalidPosition { .. }));
}

#[test]
fn adding_a_variant_resets_manual_split() {
    let seq = editor::append_step(&Sequence::new(), StepKind::Email).unwrap();
    let email = seq.steps[0].id;
    let seq = editor::add_variant(&seq, &email).unwrap();
    let seq = editor::add_variant(&seq, &email).unwrap();
    let seq = editor::set_allocation(&seq, &email, &AllocationMode::Manual(vec![40, 40, 20])).unwrap();

    let seq = editor::add_variant(&seq, &email).unwrap();
    assert_eq!(allocations(&seq, 0), distribute_evenly(4));
    assert_eq!(allocations(&seq, 0), vec![25, 25, 25, 25]);
}

#[test]
fn empty_sequence_is_not_ready() {
    let report = SequenceValidator::new().validate(&Sequence::new());
    assert!(!report.is_ready);
    assert_eq!(report.error_codes(), vec![IssueCode::EmptySequence]);
}

#[test]
fn orders_stay_contiguous_through_a_long_edit_session() {
    let mut seq = Sequence::new();
    seq = editor::append_step(&seq, StepKind::Email).unwrap();
    seq = editor::append_step(&seq, StepKind::Wait).unwrap();
    seq = editor::append_step(&seq, StepKind::Manual).unwrap();
    seq = editor::append_step(&seq, StepKind::Wait).unwrap();
    seq = editor::append_step(&seq, StepKind::Email).unwrap();
    assert_contiguous(&seq);

    // Moving the manual task to the front would leave two waits touching.
    let manual = seq.steps[2].id;
    assert!(editor::move_step(&seq, &manual, 0).is_err());

    let last = seq.steps[4].id;
    seq = editor::move_step(&seq, &last, 0).unwrap();
    assert_contiguous(&seq);
    assert_eq!(seq.steps[0].id, last);

    seq = editor::convert_step_kind(&seq, &manual, StepKind::Email).unwrap();
    assert_contiguous(&seq);

    seq = editor::remove_step(&seq, &manual).unwrap();
    assert_contiguous(&seq);
    assert_eq!(
        seq.kinds(),
        vec![StepKind::Email, StepKind::Email, StepKind::Wait, StepKind::Wait]
    );

    // The remaining adjacent waits came from removal and block readiness.
    let report = SequenceValidator::new().validate(&seq);
    assert_eq!(report.error_codes(), vec![IssueCode::AdjacentWait]);
}

#[test]
fn draft_round_trips_through_the_store_and_activates() {
    let store = JsonDraftStore::new();
    let validator = SequenceValidator::new();
    let campaign_id = Uuid::new_v4();

    let mut draft = CampaignDraft::new(campaign_id);
    draft.apply(|s| editor::append_step(s, StepKind::Email)).unwrap();
    draft.apply(|s| editor::append_step(s, StepKind::Wait)).unwrap();
    draft.apply(|s| editor::append_step(s, StepKind::Manual)).unwrap();

    let email = draft.sequence.steps[0].id;
    let variant = draft.sequence.steps[0].variants()[0].id;
    draft
        .apply(|s| {
            editor::edit_step(s, &email, |st| {
                step::set_variant_content(st, &variant, "Quick question", "Hi {{first_name}}")
            })
        })
        .unwrap();
    store.save(&draft).unwrap();

    let loaded = store.load(&campaign_id).unwrap().unwrap();
    assert_eq!(loaded, draft);
    assert_eq!(loaded.state(&validator), SequenceState::Ready);

    let snapshot = loaded.activate(&validator).unwrap();
    assert_eq!(snapshot.sequence().len(), 3);
    assert_eq!(snapshot.campaign_id(), campaign_id);
}
