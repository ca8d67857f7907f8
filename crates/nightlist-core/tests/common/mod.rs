use nightlist_core::{DisplayItem, HeaderPolicy, Sequence, SleepNight};

/// In-progress nights with the given ids, started at `id * 1000`
#[allow(dead_code)]
pub fn nights(ids: &[i64]) -> Vec<SleepNight> {
    ids.iter()
        .map(|&id| SleepNight::started(id, id * 1000))
        .collect()
}

/// Sequence with a header followed by one entry per id
#[allow(dead_code)]
pub fn seq(ids: &[i64]) -> Sequence<SleepNight> {
    Sequence::from_snapshot(Some(nights(ids)), HeaderPolicy::Always).unwrap()
}

/// Sequence of entries only
#[allow(dead_code)]
pub fn entries(ids: &[i64]) -> Sequence<SleepNight> {
    Sequence::from_snapshot(Some(nights(ids)), HeaderPolicy::Never).unwrap()
}

/// Sequence built from the given nights, header first
#[allow(dead_code)]
pub fn seq_of(nights: Vec<SleepNight>) -> Sequence<SleepNight> {
    Sequence::from_snapshot(Some(nights), HeaderPolicy::Always).unwrap()
}

/// Identity of the entry at `position`, or `None` for the header
#[allow(dead_code)]
pub fn entry_id(seq: &Sequence<SleepNight>, position: usize) -> Option<i64> {
    seq.get(position).and_then(DisplayItem::click_target)
}
