//! Human-readable summary renderer for edit scripts.

use crate::diff::model::{EditOp, EditScript};
use crate::model::{DisplayItem, Record};

/// Render a short text summary of an [`EditScript`].
///
/// One line per operation in script order, then a totals line. The summary is
/// for debug logging and review only.
pub fn render_human_summary<R: Record>(script: &EditScript<R>) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Edit script: {} -> {} items\n",
        script.source_len(),
        script.target_len()
    ));

    if script.is_empty() {
        out.push_str("_No changes._\n");
        return out;
    }

    for op in script.ops() {
        let line = match op {
            EditOp::Remove { position } => format!("- remove  @{}", position),
            EditOp::Move { from, to } => format!("- move    @{} -> @{}", from, to),
            EditOp::Insert { position, item } => {
                format!("- insert  @{} {}", position, label(item))
            }
            EditOp::Change { position, item } => {
                format!("- change  @{} {}", position, label(item))
            }
        };
        out.push_str(&line);
        out.push('\n');
    }

    let stats = script.stats();
    out.push_str(&format!(
        "Totals: {} removed, {} moved, {} inserted, {} changed\n",
        stats.removes, stats.moves, stats.inserts, stats.changes
    ));
    out
}

fn label<R: Record>(item: &DisplayItem<R>) -> String {
    match item {
        DisplayItem::Header => "header".to_string(),
        DisplayItem::Entry(record) => format!("entry #{}", record.record_id()),
    }
}
