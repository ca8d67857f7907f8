//! Sequence diff computation engine.
//!
//! The core entry point is [`compute_diff`], which accepts two validated
//! sequences and produces the [`EditScript`] turning the first into the second.

use std::time::Instant;

use crate::diff::alignment::align;
use crate::diff::model::{DiffConfig, EditOp, EditScript, MoveDetection};
use crate::errors::Result;
use crate::model::{DisplayItem, Record, Sequence};
use crate::{log_op_end, log_op_error, log_op_start};

const OP_COMPUTE_DIFF: &str = "compute_diff";
const OP_DIFF_ITEMS: &str = "diff_items";

/// Compute the edit script from `old` to `new` with the default configuration
/// (explicit moves).
pub fn compute_diff<R: Record>(old: &Sequence<R>, new: &Sequence<R>) -> EditScript<R> {
    compute_diff_with(old, new, &DiffConfig::default())
}

/// Compute the edit script from `old` to `new`.
///
/// Deterministic: equal inputs always yield equal scripts. The script is
/// minimal with respect to the identity alignment:
///
/// - identical sequences yield an empty script;
/// - no `Change` is emitted for content-equal items;
/// - items on the common subsequence are never moved;
/// - a matched item is never removed and re-inserted unless
///   [`MoveDetection::RemoveInsert`] asks for moves in that form.
///
/// Among alignments of maximum length, the one anchoring the earliest old items
/// is chosen.
pub fn compute_diff_with<R: Record>(
    old: &Sequence<R>,
    new: &Sequence<R>,
    config: &DiffConfig,
) -> EditScript<R> {
    let started = Instant::now();
    log_op_start!(OP_COMPUTE_DIFF, old_len = old.len(), new_len = new.len());

    let script = build_script(old, new, config);

    let stats = script.stats();
    log_op_end!(
        OP_COMPUTE_DIFF,
        duration_ms = started.elapsed().as_millis() as u64,
        op_count = script.len(),
        inserts = stats.inserts,
        removes = stats.removes,
        moves = stats.moves,
        changes = stats.changes
    );
    script
}

/// Validate raw item lists and diff them.
///
/// # Errors
///
/// - `DuplicateIdentity`: either list repeats an identity
/// - `ReservedIdentity`: an entry uses the header identity
pub fn diff_items<R: Record>(
    old: Vec<DisplayItem<R>>,
    new: Vec<DisplayItem<R>>,
    config: &DiffConfig,
) -> Result<EditScript<R>> {
    let started = Instant::now();
    let sequences = Sequence::new(old).and_then(|old| Ok((old, Sequence::new(new)?)));
    match sequences {
        Ok((old, new)) => Ok(compute_diff_with(&old, &new, config)),
        Err(err) => {
            log_op_error!(
                OP_DIFF_ITEMS,
                err.clone(),
                duration_ms = started.elapsed().as_millis() as u64
            );
            Err(err)
        }
    }
}

fn build_script<R: Record>(
    old: &Sequence<R>,
    new: &Sequence<R>,
    config: &DiffConfig,
) -> EditScript<R> {
    let alignment = align(old, new);
    let explicit_moves = config.moves == MoveDetection::Explicit;

    let mut ops = Vec::new();

    // Removes: unmatched old items, plus moved ones when moves are split
    for position in 0..old.len() {
        let unmatched = alignment.old_to_new[position].is_none();
        if unmatched || (!explicit_moves && alignment.is_moved(position)) {
            ops.push(EditOp::Remove { position });
        }
    }

    // Moves, ascending by target
    if explicit_moves {
        for (to, from) in alignment.new_to_old.iter().enumerate() {
            if let Some(from) = *from {
                if alignment.is_moved(from) {
                    ops.push(EditOp::Move { from, to });
                }
            }
        }
    }

    // Inserts: unmatched new items, plus moved ones when moves are split
    for (position, item) in new.iter().enumerate() {
        let reinserted = match alignment.new_to_old[position] {
            None => true,
            Some(from) => !explicit_moves && alignment.is_moved(from),
        };
        if reinserted {
            ops.push(EditOp::Insert {
                position,
                item: item.clone(),
            });
        }
    }

    // Changes: matched items that kept their place in the script but not their content
    for (position, item) in new.iter().enumerate() {
        let Some(from) = alignment.new_to_old[position] else {
            continue;
        };
        if !explicit_moves && alignment.is_moved(from) {
            continue;
        }
        if let Some(previous) = old.get(from) {
            if !previous.same_content(item) {
                ops.push(EditOp::Change {
                    position,
                    item: item.clone(),
                });
            }
        }
    }

    EditScript::from_ops(old.len(), ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use crate::model::{HeaderPolicy, SleepNight};

    fn seq(ids: &[i64]) -> Sequence<SleepNight> {
        let nights = ids.iter().map(|&id| SleepNight::started(id, 0)).collect();
        Sequence::from_snapshot(Some(nights), HeaderPolicy::Never).unwrap()
    }

    #[test]
    fn test_swap_moves_later_old_item() {
        let script = compute_diff(&seq(&[1, 2, 3]), &seq(&[2, 1, 3]));
        assert_eq!(script.ops(), &[EditOp::Move { from: 1, to: 0 }]);
    }

    #[test]
    fn test_remove_insert_mode_splits_moves() {
        let config = DiffConfig {
            moves: MoveDetection::RemoveInsert,
        };
        let script = compute_diff_with(&seq(&[1, 2, 3]), &seq(&[2, 1, 3]), &config);
        let stats = script.stats();
        assert_eq!(stats.moves, 0);
        assert_eq!(stats.removes, 1);
        assert_eq!(stats.inserts, 1);
        assert_eq!(script.ops()[0], EditOp::Remove { position: 1 });
    }

    #[test]
    fn test_diff_items_rejects_duplicates() {
        let old = vec![
            DisplayItem::entry(SleepNight::started(1, 0)),
            DisplayItem::entry(SleepNight::started(1, 5)),
        ];
        let err = diff_items(old, Vec::new(), &DiffConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::DuplicateIdentity);
    }
}
