use serde::{Deserialize, Serialize};

use super::record::Record;

/// Identity of the header row
///
/// `i64::MIN` lies outside the domain of record ids: sequences reject any entry
/// that carries it, so the header never collides with a record.
pub const HEADER_ID: i64 = i64::MIN;

/// The kind of row an item is displayed as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Header,
    Entry,
}

/// DisplayItem - one row of the list
///
/// Either the singleton header or a wrapped record. Two items are the same
/// item when their identities are equal; they are unchanged when they are the
/// same item and structurally equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum DisplayItem<R> {
    Header,
    Entry(R),
}

impl<R: Record> DisplayItem<R> {
    /// Wrap a record
    pub fn entry(record: R) -> Self {
        DisplayItem::Entry(record)
    }

    /// Stable identity of this item
    pub fn id(&self) -> i64 {
        match self {
            DisplayItem::Header => HEADER_ID,
            DisplayItem::Entry(record) => record.record_id(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            DisplayItem::Header => ItemKind::Header,
            DisplayItem::Entry(_) => ItemKind::Entry,
        }
    }

    /// Check if both items have the same identity, regardless of content
    pub fn same_item(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Check if both items are the same item with equal content
    pub fn same_content(&self, other: &Self) -> bool {
        self.same_item(other) && self == other
    }

    pub fn as_entry(&self) -> Option<&R> {
        match self {
            DisplayItem::Header => None,
            DisplayItem::Entry(record) => Some(record),
        }
    }

    /// Record id a click on this row resolves to
    ///
    /// The header row is not clickable.
    pub fn click_target(&self) -> Option<i64> {
        self.as_entry().map(Record::record_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SleepNight;

    #[test]
    fn test_header_identity_is_reserved_sentinel() {
        let header: DisplayItem<SleepNight> = DisplayItem::Header;
        assert_eq!(header.id(), i64::MIN);
        assert_eq!(header.kind(), ItemKind::Header);
        assert_eq!(header.click_target(), None);
    }

    #[test]
    fn test_entry_identity_ignores_content() {
        let before = DisplayItem::entry(SleepNight::started(7, 100));
        let after = DisplayItem::entry(SleepNight::started(7, 100).rated(3));

        assert!(before.same_item(&after));
        assert!(!before.same_content(&after));
        assert!(before.same_content(&before.clone()));
        assert_eq!(after.click_target(), Some(7));
    }

    #[test]
    fn test_header_is_never_the_same_item_as_an_entry() {
        let header: DisplayItem<SleepNight> = DisplayItem::Header;
        for id in [0, 1, -1, i64::MAX, i64::MIN + 1] {
            let entry = DisplayItem::entry(SleepNight::started(id, 0));
            assert!(!header.same_item(&entry), "collision with id {}", id);
        }
    }

    #[test]
    fn test_serialized_shape_is_tagged() {
        let entry = DisplayItem::entry(SleepNight::started(2, 5));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "entry");
        assert_eq!(json["record"]["night_id"], 2);

        let header: DisplayItem<SleepNight> = DisplayItem::Header;
        assert_eq!(serde_json::to_value(&header).unwrap()["kind"], "header");
    }
}
