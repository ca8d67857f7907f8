//! Slot resolution of an edit script.
//!
//! Turns the absolute coordinates of a script into one slot per target
//! position, checking that the script fits a source of its declared length.

use crate::diff::model::{EditOp, EditScript};
use crate::errors::{DiffError, ExError, ExErrorKind, Result};
use crate::model::DisplayItem;

/// Origin of the item at one target position
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Slot<'a, R> {
    /// Retained old item, untouched by the script
    Kept(usize),
    /// Old item placed here by a `Move`
    Moved(usize),
    /// Item carried by an `Insert`
    Inserted(&'a DisplayItem<R>),
}

impl<R> Slot<'_, R> {
    /// Old position of a surviving item
    pub fn source(&self) -> Option<usize> {
        match self {
            Slot::Kept(from) | Slot::Moved(from) => Some(*from),
            Slot::Inserted(_) => None,
        }
    }
}

/// Resolved script: one slot per target position plus the changes
#[derive(Debug)]
pub(crate) struct Layout<'a, R> {
    pub slots: Vec<Slot<'a, R>>,
    /// `(position, item)` for every `Change`, in script order
    pub changes: Vec<(usize, &'a DisplayItem<R>)>,
    /// Old positions named by a `Remove`, ascending
    pub removed: Vec<usize>,
}

pub(crate) fn resolve<R>(script: &EditScript<R>, source_len: usize) -> Result<Layout<'_, R>> {
    if script.source_len() != source_len {
        return Err(DiffError::SourceLengthMismatch {
            expected: script.source_len(),
            actual: source_len,
        }
        .into());
    }

    let target_len = script.target_len();
    let mut vacated = vec![false; source_len];
    let mut claimed: Vec<Option<Slot<'_, R>>> = (0..target_len).map(|_| None).collect();
    let mut changed = vec![false; target_len];
    let mut changes = Vec::new();
    let mut removed = Vec::new();

    for op in script.ops() {
        match op {
            EditOp::Remove { position } => {
                vacate(&mut vacated, *position)?;
                removed.push(*position);
            }
            EditOp::Move { from, to } => {
                vacate(&mut vacated, *from)?;
                claim(&mut claimed, *to, Slot::Moved(*from))?;
            }
            EditOp::Insert { position, item } => {
                claim(&mut claimed, *position, Slot::Inserted(item))?;
            }
            EditOp::Change { position, item } => {
                let flag = changed.get_mut(*position).ok_or(DiffError::PositionOutOfRange {
                    position: *position,
                    len: target_len,
                })?;
                if *flag {
                    return Err(DiffError::SlotConflict {
                        position: *position,
                    }
                    .into());
                }
                *flag = true;
                changes.push((*position, item));
            }
        }
    }
    removed.sort_unstable();

    let mut retained = (0..source_len).filter(|&from| !vacated[from]);
    let mut slots = Vec::with_capacity(target_len);
    for slot in claimed {
        match slot {
            Some(slot) => slots.push(slot),
            None => {
                let from = retained.next().ok_or_else(|| unbalanced(target_len))?;
                slots.push(Slot::Kept(from));
            }
        }
    }
    if retained.next().is_some() {
        return Err(unbalanced(target_len));
    }

    Ok(Layout {
        slots,
        changes,
        removed,
    })
}

fn vacate(vacated: &mut [bool], position: usize) -> Result<()> {
    let len = vacated.len();
    let flag = vacated
        .get_mut(position)
        .ok_or(DiffError::PositionOutOfRange { position, len })?;
    if *flag {
        return Err(DiffError::SlotConflict { position }.into());
    }
    *flag = true;
    Ok(())
}

fn claim<'a, R>(
    claimed: &mut [Option<Slot<'a, R>>],
    position: usize,
    slot: Slot<'a, R>,
) -> Result<()> {
    let len = claimed.len();
    let entry = claimed
        .get_mut(position)
        .ok_or(DiffError::PositionOutOfRange { position, len })?;
    if entry.is_some() {
        return Err(DiffError::SlotConflict { position }.into());
    }
    *entry = Some(slot);
    Ok(())
}

fn unbalanced(target_len: usize) -> ExError {
    ExError::new(ExErrorKind::Internal).with_message(format!(
        "retained items do not fill a target of length {}",
        target_len
    ))
}
