//! Mutation surface for a sequence draft.
//!
//! Every operation takes the current sequence by reference and returns a new
//! one; the caller swaps its held value on success. After any successful
//! call the `order` fields are exactly `0..len`.

use tracing::{debug, warn};

use crate::allocator::{self, AllocationMode};
use crate::error::{SequenceError, SequenceResult};
use crate::step;
use crate::types::{Sequence, Step, StepId, StepKind, VariantId};

/// First structural violation in `steps`: a leading wait or two adjacent
/// waits. Returns the offending index and a reason.
pub(crate) fn structural_violation(steps: &[Step]) -> Option<(usize, &'static str)> {
    if steps.first().is_some_and(Step::is_wait) {
        return Some((0, "a sequence cannot start with a wait step"));
    }
    steps
        .windows(2)
        .position(|pair| pair[0].is_wait() && pair[1].is_wait())
        .map(|i| (i + 1, "two wait steps cannot be adjacent"))
}

/// Checks that a wait step sitting at `index` is neither first nor next to
/// another wait.
fn check_wait_slot(steps: &[Step], index: usize) -> SequenceResult<()> {
    if index == 0 {
        return Err(SequenceError::invalid_position(
            index,
            "a sequence cannot start with a wait step",
        ));
    }
    let before = steps.get(index - 1).is_some_and(Step::is_wait);
    let after = steps.get(index + 1).is_some_and(Step::is_wait);
    if before || after {
        return Err(SequenceError::invalid_position(
            index,
            "two wait steps cannot be adjacent",
        ));
    }
    Ok(())
}

fn find_index(sequence: &Sequence, step_id: &StepId) -> SequenceResult<usize> {
    sequence
        .position(step_id)
        .ok_or_else(|| SequenceError::step_not_found(*step_id))
}

/// Inserts a default step of `kind` at `at_index`, shifting later steps.
pub fn insert_step(sequence: &Sequence, kind: StepKind, at_index: usize) -> SequenceResult<Sequence> {
    if at_index > sequence.len() {
        return Err(SequenceError::invalid_position(
            at_index,
            format!("sequence has only {} steps", sequence.len()),
        ));
    }

    let mut next = sequence.clone();
    let new_step = step::create_default(kind);
    let step_id = new_step.id;
    next.steps.insert(at_index, new_step);

    if kind == StepKind::Wait {
        if let Err(e) = check_wait_slot(&next.steps, at_index) {
            warn!(%step_id, at_index, "Rejected wait step insertion");
            return Err(e);
        }
    }

    next.renumber();
    debug!(%step_id, ?kind, at_index, "Inserted step");
    Ok(next)
}

/// Appends a default step of `kind` to the end of the sequence.
pub fn append_step(sequence: &Sequence, kind: StepKind) -> SequenceResult<Sequence> {
    insert_step(sequence, kind, sequence.len())
}

/// Removes a step and compacts the order. Removing the last step leaves an
/// empty (editable but not activatable) sequence.
pub fn remove_step(sequence: &Sequence, step_id: &StepId) -> SequenceResult<Sequence> {
    let index = find_index(sequence, step_id)?;
    let mut next = sequence.clone();
    next.steps.remove(index);
    next.renumber();

    if let Some((at, reason)) = structural_violation(&next.steps) {
        warn!(%step_id, at, reason, "Removal left a structural violation");
    }
    debug!(%step_id, remaining = next.len(), "Removed step");
    Ok(next)
}

/// Moves a step so that it ends up at `to_index` in the result.
pub fn move_step(sequence: &Sequence, step_id: &StepId, to_index: usize) -> SequenceResult<Sequence> {
    let from = find_index(sequence, step_id)?;
    if to_index >= sequence.len() {
        return Err(SequenceError::invalid_position(
            to_index,
            format!("sequence has only {} steps", sequence.len()),
        ));
    }

    let mut next = sequence.clone();
    let moved = next.steps.remove(from);
    next.steps.insert(to_index, moved);

    if let Some((at, reason)) = structural_violation(&next.steps) {
        warn!(%step_id, from, to_index, "Rejected step move");
        return Err(SequenceError::invalid_position(at, reason));
    }

    next.renumber();
    debug!(%step_id, from, to_index, "Moved step");
    Ok(next)
}

/// Reinitializes a step as `new_kind`, keeping only its id and position.
/// Converting to the step's current kind leaves its fields untouched.
pub fn convert_step_kind(
    sequence: &Sequence,
    step_id: &StepId,
    new_kind: StepKind,
) -> SequenceResult<Sequence> {
    let index = find_index(sequence, step_id)?;
    let old_kind = sequence.steps[index].kind();
    let mut next = sequence.clone();
    if old_kind != new_kind {
        next.steps[index].body = step::default_body(new_kind);
        if new_kind == StepKind::Wait {
            check_wait_slot(&next.steps, index)?;
        }
    }

    next.renumber();
    debug!(%step_id, from = ?old_kind, to = ?new_kind, "Converted step");
    Ok(next)
}

/// Applies a step-level edit. The edit may not change the step's id or kind;
/// the step keeps its position.
pub fn edit_step<F>(sequence: &Sequence, step_id: &StepId, f: F) -> SequenceResult<Sequence>
where
    F: FnOnce(&Step) -> SequenceResult<Step>,
{
    let index = find_index(sequence, step_id)?;
    let current = &sequence.steps[index];
    let edited = f(current)?;

    if edited.id != current.id {
        return Err(SequenceError::invalid_operation(
            current.kind(),
            "an edit cannot change a step's id",
        ));
    }
    if edited.kind() != current.kind() {
        return Err(SequenceError::invalid_operation(
            current.kind(),
            "use convert_step_kind to change a step's kind",
        ));
    }

    let mut next = sequence.clone();
    next.steps[index] = edited;
    next.renumber();
    Ok(next)
}

/// Adds an A/B variant to an email step.
pub fn add_variant(sequence: &Sequence, step_id: &StepId) -> SequenceResult<Sequence> {
    edit_step(sequence, step_id, step::add_variant)
}

/// Removes a variant from an email step.
pub fn remove_variant(
    sequence: &Sequence,
    step_id: &StepId,
    variant_id: &VariantId,
) -> SequenceResult<Sequence> {
    edit_step(sequence, step_id, |s| step::remove_variant(s, variant_id))
}

/// Reassigns an email step's allocation, evenly or from explicit values.
pub fn set_allocation(
    sequence: &Sequence,
    step_id: &StepId,
    mode: &AllocationMode,
) -> SequenceResult<Sequence> {
    edit_step(sequence, step_id, |s| {
        let mut next = s.clone();
        allocator::apply_mode(&mut next, mode)?;
        Ok(next)
    })
}
