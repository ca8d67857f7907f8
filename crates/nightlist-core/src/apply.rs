//! Edit script application
//!
//! This module holds the reference interpretation of edit scripts and of the
//! sequential list updates derived from them.
//!
//! ## Atomicity Contract
//!
//! - **All-or-nothing**: [`apply_edit_script`] either returns the complete new
//!   sequence or fails, leaving the old sequence untouched
//! - **No panics**: malformed scripts return typed errors
//!
//! ## Example
//!
//! ```
//! use nightlist_core::apply::apply_edit_script;
//! use nightlist_core::diff::compute_diff;
//! use nightlist_core::model::{HeaderPolicy, Sequence, SleepNight};
//!
//! let old = Sequence::from_snapshot(Some(vec![SleepNight::started(1, 0)]), HeaderPolicy::Always)?;
//! let new = Sequence::from_snapshot(None, HeaderPolicy::Always)?;
//! let script = compute_diff(&old, &new);
//! assert_eq!(apply_edit_script(&old, &script)?, new);
//! # Ok::<(), nightlist_core::ExError>(())
//! ```

use crate::diff::{resolve, EditScript, ListUpdate, Slot};
use crate::errors::{DiffError, ExError, ExErrorKind, Result};
use crate::model::{DisplayItem, Record, Sequence};

const OP_APPLY_EDIT_SCRIPT: &str = "apply_edit_script";
const OP_APPLY_LIST_UPDATE: &str = "apply_list_update";

/// Apply an edit script to the sequence it was computed from
///
/// # Errors
///
/// - `InvalidEditScript`: the script was computed for another length, names a
///   position outside the sequence, claims a slot twice, or changes an item
///   into a different identity
/// - `DuplicateIdentity`: the resulting items repeat an identity
pub fn apply_edit_script<R: Record>(
    old: &Sequence<R>,
    script: &EditScript<R>,
) -> Result<Sequence<R>> {
    apply_with_layout(old, script).map_err(|err| err.with_op(OP_APPLY_EDIT_SCRIPT))
}

fn apply_with_layout<R: Record>(old: &Sequence<R>, script: &EditScript<R>) -> Result<Sequence<R>> {
    let layout = resolve(script, old.len())?;

    let mut items = Vec::with_capacity(layout.slots.len());
    for slot in &layout.slots {
        let item = match slot {
            Slot::Kept(from) | Slot::Moved(from) => old_item(old, *from)?.clone(),
            Slot::Inserted(item) => (*item).clone(),
        };
        items.push(item);
    }

    for (position, item) in &layout.changes {
        let current = items.get_mut(*position).ok_or(DiffError::PositionOutOfRange {
            position: *position,
            len: script.target_len(),
        })?;
        if !current.same_item(item) {
            return Err(identity_mismatch(*position, current, item));
        }
        *current = (*item).clone();
    }

    Sequence::new(items)
}

/// Apply one sequential update to `items`
///
/// `Inserted` and `Changed` take their item from `target` at the update's
/// position.
///
/// # Errors
///
/// `InvalidEditScript` if the update names a position outside `items` or
/// `target`.
pub fn apply_list_update<R: Record>(
    items: &mut Vec<DisplayItem<R>>,
    update: ListUpdate,
    target: &Sequence<R>,
) -> Result<()> {
    let len = items.len();
    let out_of_range = |position: usize, len: usize| -> ExError {
        ExError::from(DiffError::PositionOutOfRange { position, len }).with_op(OP_APPLY_LIST_UPDATE)
    };

    match update {
        ListUpdate::Removed { position } => {
            if position >= len {
                return Err(out_of_range(position, len));
            }
            items.remove(position);
        }
        ListUpdate::Moved { from, to } => {
            if from >= len {
                return Err(out_of_range(from, len));
            }
            if to >= len {
                return Err(out_of_range(to, len));
            }
            let item = items.remove(from);
            items.insert(to, item);
        }
        ListUpdate::Inserted { position } => {
            if position > len {
                return Err(out_of_range(position, len));
            }
            let item = target
                .get(position)
                .ok_or_else(|| out_of_range(position, target.len()))?;
            items.insert(position, item.clone());
        }
        ListUpdate::Changed { position } => {
            let item = target
                .get(position)
                .ok_or_else(|| out_of_range(position, target.len()))?;
            let current = items
                .get_mut(position)
                .ok_or_else(|| out_of_range(position, len))?;
            *current = item.clone();
        }
    }
    Ok(())
}

/// Replay sequential updates on `old`, then validate the result
///
/// # Errors
///
/// Any error of [`apply_list_update`], or the validation errors of
/// [`Sequence::new`].
pub fn replay_list_updates<R: Record>(
    old: &Sequence<R>,
    updates: &[ListUpdate],
    target: &Sequence<R>,
) -> Result<Sequence<R>> {
    let mut items = old.items().to_vec();
    for update in updates {
        apply_list_update(&mut items, *update, target)?;
    }
    Sequence::new(items)
}

fn old_item<R: Record>(old: &Sequence<R>, position: usize) -> Result<&DisplayItem<R>> {
    old.get(position).ok_or_else(|| {
        DiffError::PositionOutOfRange {
            position,
            len: old.len(),
        }
        .into()
    })
}

fn identity_mismatch<R: Record>(
    position: usize,
    current: &DisplayItem<R>,
    replacement: &DisplayItem<R>,
) -> ExError {
    ExError::new(ExErrorKind::InvalidEditScript)
        .with_position(position)
        .with_item_id(replacement.id())
        .with_message(format!(
            "Change at position {} replaces identity {} with {}",
            position,
            current.id(),
            replacement.id()
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::EditOp;
    use crate::model::{HeaderPolicy, SleepNight};

    fn seq(ids: &[i64]) -> Sequence<SleepNight> {
        let nights = ids.iter().map(|&id| SleepNight::started(id, 0)).collect();
        Sequence::from_snapshot(Some(nights), HeaderPolicy::Never).unwrap()
    }

    #[test]
    fn test_change_must_keep_identity() {
        let old = seq(&[1, 2]);
        let script = EditScript::from_ops(
            2,
            vec![EditOp::Change {
                position: 0,
                item: DisplayItem::entry(SleepNight::started(7, 0)),
            }],
        );
        let err = apply_edit_script(&old, &script).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidEditScript);
        assert_eq!(err.op(), Some("apply_edit_script"));
        assert_eq!(err.position(), Some(0));
    }

    #[test]
    fn test_list_update_out_of_range() {
        let target = seq(&[1]);
        let mut items = seq(&[1]).items().to_vec();
        let err = apply_list_update(&mut items, ListUpdate::Removed { position: 3 }, &target)
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidEditScript);
        assert_eq!(items.len(), 1);
    }
}
