//! Identity alignment of two sequences.
//!
//! Identities are unique within a sequence, so every identity present in both
//! sequences is matched exactly once. The longest common subsequence over
//! identity is then the longest increasing run of old positions visited in new
//! order. Matched items on that run are anchored; the other matched items moved.

use std::collections::HashMap;

use crate::model::{Record, Sequence};

/// Match of old and new positions by identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Alignment {
    /// For each new position, the old position holding the same identity
    pub new_to_old: Vec<Option<usize>>,
    /// For each old position, the new position holding the same identity
    pub old_to_new: Vec<Option<usize>>,
    /// For each old position, whether it lies on the chosen common subsequence
    pub anchored: Vec<bool>,
}

impl Alignment {
    /// Check if the old item at `old_position` is matched but not anchored
    pub fn is_moved(&self, old_position: usize) -> bool {
        self.old_to_new[old_position].is_some() && !self.anchored[old_position]
    }
}

pub(crate) fn align<R: Record>(old: &Sequence<R>, new: &Sequence<R>) -> Alignment {
    let old_index: HashMap<i64, usize> = old
        .iter()
        .enumerate()
        .map(|(position, item)| (item.id(), position))
        .collect();

    let mut new_to_old = vec![None; new.len()];
    let mut old_to_new = vec![None; old.len()];
    let mut matched_old = Vec::new();

    for (new_position, item) in new.iter().enumerate() {
        if let Some(&old_position) = old_index.get(&item.id()) {
            new_to_old[new_position] = Some(old_position);
            old_to_new[old_position] = Some(new_position);
            matched_old.push(old_position);
        }
    }

    let mut anchored = vec![false; old.len()];
    for (k, on_run) in longest_increasing(&matched_old).into_iter().enumerate() {
        if on_run {
            anchored[matched_old[k]] = true;
        }
    }

    Alignment {
        new_to_old,
        old_to_new,
        anchored,
    }
}

/// Flag the elements of the lexicographically smallest longest strictly
/// increasing subsequence of `values` (which must be distinct).
///
/// O(n log n): patience sorting from the right gives, for every element, the
/// length of the longest increasing run starting there. The greedy pass then
/// takes, for each remaining length, the smallest admissible value.
pub(crate) fn longest_increasing(values: &[usize]) -> Vec<bool> {
    let n = values.len();
    let mut chosen = vec![false; n];
    if n == 0 {
        return chosen;
    }

    // run_len[k]: longest increasing run starting at k.
    // best[l]: largest first value of a run of length l + 1 seen so far; strictly decreasing.
    let mut run_len = vec![0usize; n];
    let mut best: Vec<usize> = Vec::new();
    for k in (0..n).rev() {
        let v = values[k];
        let level = best.partition_point(|&b| b > v);
        if level == best.len() {
            best.push(v);
        } else {
            best[level] = v;
        }
        run_len[k] = level + 1;
    }

    let longest = best.len();
    let mut by_len: Vec<Vec<usize>> = vec![Vec::new(); longest + 1];
    for (k, &len) in run_len.iter().enumerate() {
        by_len[len].push(k);
    }

    let mut after: Option<usize> = None;
    let mut floor: Option<usize> = None;
    for len in (1..=longest).rev() {
        let pick = by_len[len]
            .iter()
            .copied()
            .filter(|&k| after.map_or(true, |a| k > a))
            .filter(|&k| floor.map_or(true, |f| values[k] > f))
            .min_by_key(|&k| values[k]);
        let Some(k) = pick else {
            break;
        };
        chosen[k] = true;
        after = Some(k);
        floor = Some(values[k]);
    }

    chosen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picked(values: &[usize]) -> Vec<usize> {
        longest_increasing(values)
            .into_iter()
            .zip(values)
            .filter_map(|(on, &v)| on.then_some(v))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(longest_increasing(&[]).is_empty());
    }

    #[test]
    fn test_sorted_input_is_fully_anchored() {
        assert_eq!(picked(&[0, 1, 2, 3]), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_reversed_input_keeps_smallest() {
        assert_eq!(picked(&[3, 2, 1, 0]), vec![0]);
    }

    #[test]
    fn test_swap_anchors_earliest_old_item() {
        // new order B, A, C over old A=0, B=1, C=2
        assert_eq!(picked(&[1, 0, 2]), vec![0, 2]);
    }

    #[test]
    fn test_item_moved_to_front() {
        assert_eq!(picked(&[3, 0, 1, 2]), vec![0, 1, 2]);
    }

    #[test]
    fn test_item_moved_to_back() {
        assert_eq!(picked(&[1, 2, 3, 0]), vec![1, 2, 3]);
    }

    #[test]
    fn test_interleaved_runs() {
        // Runs of length 3: [2,3,4], [0,3,4], [0,1,4]
        assert_eq!(picked(&[2, 0, 3, 1, 4]).len(), 3);
        assert_eq!(picked(&[2, 0, 3, 1, 4]), vec![0, 1, 4]);
    }
}
