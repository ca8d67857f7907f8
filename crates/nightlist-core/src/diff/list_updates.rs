//! Sequential list notifications derived from an edit script.

use crate::diff::layout::{resolve, Slot};
use crate::diff::model::{EditScript, ListUpdate};
use crate::errors::{ExError, ExErrorKind, Result};

impl<R> EditScript<R> {
    /// Translate this script into updates that can be applied one at a time
    ///
    /// Updates come in four phases:
    ///
    /// 1. `Removed` for every removed item, descending, so earlier positions
    ///    stay valid;
    /// 2. `Moved` for every moved item, in target order, each placed right
    ///    after its target predecessor;
    /// 3. `Inserted`, ascending by target position;
    /// 4. `Changed`, ascending by target position.
    ///
    /// A move whose item already sits in place after the earlier moves is
    /// dropped, so the number of `Moved` updates never exceeds the number of
    /// `Move` operations.
    ///
    /// # Errors
    ///
    /// `InvalidEditScript` if the script does not fit a source of
    /// [`EditScript::source_len`] items.
    pub fn list_updates(&self) -> Result<Vec<ListUpdate>> {
        let layout =
            resolve(self, self.source_len()).map_err(|err| err.with_op("list_updates"))?;
        let mut updates = Vec::with_capacity(self.len());

        for &position in layout.removed.iter().rev() {
            updates.push(ListUpdate::Removed { position });
        }

        // Survivors by old position, in current order
        let mut removed = vec![false; self.source_len()];
        for &position in &layout.removed {
            removed[position] = true;
        }
        let mut working: Vec<usize> = (0..self.source_len())
            .filter(|&position| !removed[position])
            .collect();

        let mut predecessor: Option<usize> = None;
        for slot in &layout.slots {
            let Some(source) = slot.source() else {
                continue;
            };
            if matches!(slot, Slot::Moved(_)) {
                let from = index_of(&working, source)?;
                let mut to = match predecessor {
                    None => 0,
                    Some(previous) => index_of(&working, previous)? + 1,
                };
                if from < to {
                    to -= 1;
                }
                if from != to {
                    let token = working.remove(from);
                    working.insert(to, token);
                    updates.push(ListUpdate::Moved { from, to });
                }
            }
            predecessor = Some(source);
        }

        for (position, slot) in layout.slots.iter().enumerate() {
            if matches!(slot, Slot::Inserted(_)) {
                updates.push(ListUpdate::Inserted { position });
            }
        }

        let mut changed: Vec<usize> = layout
            .changes
            .iter()
            .map(|(position, _)| *position)
            .collect();
        changed.sort_unstable();
        updates.extend(
            changed
                .into_iter()
                .map(|position| ListUpdate::Changed { position }),
        );

        Ok(updates)
    }
}

fn index_of(working: &[usize], source: usize) -> Result<usize> {
    working.iter().position(|&s| s == source).ok_or_else(|| {
        ExError::new(ExErrorKind::Internal)
            .with_op("list_updates")
            .with_message(format!("old position {} left the working list", source))
    })
}

#[cfg(test)]
mod tests {
    use crate::diff::model::{EditOp, EditScript, ListUpdate};
    use crate::model::{DisplayItem, SleepNight};

    fn entry(id: i64) -> DisplayItem<SleepNight> {
        DisplayItem::entry(SleepNight::started(id, 0))
    }

    #[test]
    fn test_removes_come_last_to_first() {
        let script: EditScript<SleepNight> = EditScript::from_ops(
            4,
            vec![EditOp::Remove { position: 1 }, EditOp::Remove { position: 3 }],
        );
        assert_eq!(
            script.list_updates().unwrap(),
            vec![
                ListUpdate::Removed { position: 3 },
                ListUpdate::Removed { position: 1 },
            ]
        );
    }

    #[test]
    fn test_move_to_front() {
        let script: EditScript<SleepNight> =
            EditScript::from_ops(3, vec![EditOp::Move { from: 2, to: 0 }]);
        assert_eq!(
            script.list_updates().unwrap(),
            vec![ListUpdate::Moved { from: 2, to: 0 }]
        );
    }

    #[test]
    fn test_move_to_back_accounts_for_the_vacated_slot() {
        let script: EditScript<SleepNight> =
            EditScript::from_ops(3, vec![EditOp::Move { from: 0, to: 2 }]);
        assert_eq!(
            script.list_updates().unwrap(),
            vec![ListUpdate::Moved { from: 0, to: 2 }]
        );
    }

    #[test]
    fn test_inserts_and_changes_use_target_positions() {
        let script = EditScript::from_ops(
            2,
            vec![
                EditOp::Remove { position: 0 },
                EditOp::Insert {
                    position: 0,
                    item: entry(5),
                },
                EditOp::Change {
                    position: 1,
                    item: entry(2),
                },
            ],
        );
        assert_eq!(
            script.list_updates().unwrap(),
            vec![
                ListUpdate::Removed { position: 0 },
                ListUpdate::Inserted { position: 0 },
                ListUpdate::Changed { position: 1 },
            ]
        );
    }
}
