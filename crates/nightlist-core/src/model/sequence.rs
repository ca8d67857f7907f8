use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::item::{DisplayItem, HEADER_ID};
use super::record::Record;
use crate::errors::{DiffError, Result};

/// One notification from the storage layer
///
/// `None` is a null notification; it is wrapped the same way as an empty list.
pub type Snapshot<R> = Option<Vec<R>>;

/// Whether a wrapped snapshot starts with the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPolicy {
    /// Header on every notification, even a null or empty one
    #[default]
    Always,
    /// Header only when at least one record exists
    WhenNonEmpty,
    /// Entries only
    Never,
}

/// Sequence - an immutable, validated list of display items
///
/// Identities are unique within a sequence and no entry carries the header
/// identity. Cloning is cheap: the items are shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence<R> {
    items: Arc<[DisplayItem<R>]>,
}

impl<R: Record> Sequence<R> {
    pub fn empty() -> Self {
        Self {
            items: Arc::from(Vec::new()),
        }
    }

    /// Build a sequence from display items
    ///
    /// # Errors
    ///
    /// - `ReservedIdentity`: an entry uses [`HEADER_ID`]
    /// - `DuplicateIdentity`: two items share an identity (two headers included)
    pub fn new(items: Vec<DisplayItem<R>>) -> Result<Self> {
        let mut seen: HashMap<i64, usize> = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if matches!(item, DisplayItem::Entry(_)) && item.id() == HEADER_ID {
                return Err(DiffError::ReservedIdentity { position }.into());
            }
            if let Some(first) = seen.insert(item.id(), position) {
                return Err(DiffError::DuplicateIdentity {
                    item_id: item.id(),
                    first,
                    second: position,
                }
                .into());
            }
        }
        Ok(Self {
            items: Arc::from(items),
        })
    }

    /// Wrap a storage snapshot, prefixing the header per `policy`
    ///
    /// # Errors
    ///
    /// Same as [`Sequence::new`].
    pub fn from_snapshot(snapshot: Snapshot<R>, policy: HeaderPolicy) -> Result<Self> {
        let records = snapshot.unwrap_or_default();
        let with_header = match policy {
            HeaderPolicy::Always => true,
            HeaderPolicy::WhenNonEmpty => !records.is_empty(),
            HeaderPolicy::Never => false,
        };

        let mut items = Vec::with_capacity(records.len() + usize::from(with_header));
        if with_header {
            items.push(DisplayItem::Header);
        }
        items.extend(records.into_iter().map(DisplayItem::Entry));
        Self::new(items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&DisplayItem<R>> {
        self.items.get(position)
    }

    pub fn items(&self) -> &[DisplayItem<R>] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DisplayItem<R>> {
        self.items.iter()
    }

    /// Position of the item with the given identity
    pub fn position_of(&self, id: i64) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn has_header(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, DisplayItem::Header))
    }

    pub fn entry_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, DisplayItem::Entry(_)))
            .count()
    }

    /// Identities in order
    pub fn ids(&self) -> Vec<i64> {
        self.items.iter().map(DisplayItem::id).collect()
    }
}

impl<R: Record> Default for Sequence<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, R> IntoIterator for &'a Sequence<R> {
    type Item = &'a DisplayItem<R>;
    type IntoIter = std::slice::Iter<'a, DisplayItem<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
