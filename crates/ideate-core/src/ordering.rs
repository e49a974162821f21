//! Board ordering engine.
//!
//! Ideas display top-to-bottom sorted descending by `sort_key`, so the top
//! item carries the highest key. Two strategies coexist:
//!
//! - [`compute_reorder`] / [`renumber`]: the classic whole-list renumbering
//!   the board client performs after a drag. Every visible item gets
//!   `len - index`, giving a total, strict, gap-free descending numbering.
//! - [`plan_move`]: a server-side single-move planner. It places the moved
//!   idea between its new neighbors' keys when a gap exists (one row
//!   written), and falls back to renumbering the full set with [`KEY_STEP`]
//!   spacing only when the gap is exhausted. Plans are always computed
//!   against the full board, never a filtered view, so keys stay unique
//!   across platform filters.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Key spacing used when renumbering via [`plan_move`]. Wider gaps mean more
/// midpoint insertions before the next renumber.
pub const KEY_STEP: i32 = 64;

/// A single persisted ordering change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortUpdate {
    pub id: i32,
    /// New sort key; serialized as `order` on the wire.
    #[serde(rename = "order")]
    pub sort_key: i32,
}

/// Result of planning a single move against the full keyed board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePlan {
    /// The idea is already at the requested position.
    Noop,
    /// One row changes key; everything else keeps its key.
    Shift(SortUpdate),
    /// Neighbor keys left no usable gap; the whole board is renumbered with
    /// `KEY_STEP` spacing.
    Renumber(Vec<SortUpdate>),
}

/// Assign `sort_key = len - index` down a top-to-bottom id sequence.
pub fn renumber(ids: &[i32]) -> Vec<SortUpdate> {
    let len = ids.len() as i32;
    ids.iter()
        .enumerate()
        .map(|(idx, &id)| SortUpdate {
            id,
            sort_key: len - idx as i32,
        })
        .collect()
}

/// Compute the whole-list renumbering for moving `moved_id` to
/// `target_index` within `current` (top-to-bottom id sequence).
///
/// `target_index` refers to the sequence after the moved item is removed,
/// matching splice semantics; indices past the end append.
pub fn compute_reorder(
    current: &[i32],
    moved_id: i32,
    target_index: usize,
) -> Result<Vec<SortUpdate>> {
    let old_index = current
        .iter()
        .position(|&id| id == moved_id)
        .ok_or_else(|| Error::InvalidInput(format!("idea {} is not in the sequence", moved_id)))?;

    let mut sequence: Vec<i32> = current.to_vec();
    sequence.remove(old_index);
    let insert_at = target_index.min(sequence.len());
    sequence.insert(insert_at, moved_id);

    Ok(renumber(&sequence))
}

/// Plan a single move of `moved_id` to `target_index` against the FULL
/// board.
///
/// `keyed` is the complete `(id, sort_key)` sequence in display order, i.e.
/// strictly descending by key. `target_index` follows the same splice
/// semantics as [`compute_reorder`].
pub fn plan_move(keyed: &[(i32, i32)], moved_id: i32, target_index: usize) -> Result<MovePlan> {
    let old_index = keyed
        .iter()
        .position(|&(id, _)| id == moved_id)
        .ok_or_else(|| Error::IdeaNotFound(moved_id))?;

    let mut rest: Vec<(i32, i32)> = keyed.to_vec();
    rest.remove(old_index);
    let insert_at = target_index.min(rest.len());

    if insert_at == old_index {
        return Ok(MovePlan::Noop);
    }

    let above = insert_at.checked_sub(1).map(|i| rest[i].1);
    let below = rest.get(insert_at).map(|&(_, key)| key);

    let shifted = match (above, below) {
        // Only item on the board; its key is already fine.
        (None, None) => return Ok(MovePlan::Noop),
        (None, Some(top)) => top.checked_add(KEY_STEP),
        (Some(bottom), None) => bottom.checked_sub(KEY_STEP),
        // Midpoint in i64 so extreme keys cannot overflow the subtraction.
        (Some(a), Some(b)) if (a as i64) - (b as i64) >= 2 => {
            Some((((a as i64) + (b as i64)) / 2) as i32)
        }
        (Some(_), Some(_)) => None,
    };

    if let Some(sort_key) = shifted {
        return Ok(MovePlan::Shift(SortUpdate {
            id: moved_id,
            sort_key,
        }));
    }

    // Gap exhausted (or key range saturated): renumber everything, spaced.
    rest.insert(insert_at, (moved_id, 0));
    let len = rest.len() as i32;
    let updates = rest
        .iter()
        .enumerate()
        .map(|(idx, &(id, _))| SortUpdate {
            id,
            sort_key: (len - idx as i32) * KEY_STEP,
        })
        .collect();
    Ok(MovePlan::Renumber(updates))
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: i32 = 1;
    const B: i32 = 2;
    const C: i32 = 3;

    #[test]
    fn test_renumber_descends_without_gaps() {
        let updates = renumber(&[A, B, C]);
        assert_eq!(
            updates,
            vec![
                SortUpdate { id: A, sort_key: 3 },
                SortUpdate { id: B, sort_key: 2 },
                SortUpdate { id: C, sort_key: 1 },
            ]
        );
    }

    #[test]
    fn test_renumber_empty() {
        assert!(renumber(&[]).is_empty());
    }

    // List [A=2, B=1, C=0] displayed A,B,C; move C to the top.
    #[test]
    fn test_compute_reorder_move_bottom_to_top() {
        let updates = compute_reorder(&[A, B, C], C, 0).unwrap();
        assert_eq!(
            updates,
            vec![
                SortUpdate { id: C, sort_key: 3 },
                SortUpdate { id: A, sort_key: 2 },
                SortUpdate { id: B, sort_key: 1 },
            ]
        );
    }

    #[test]
    fn test_compute_reorder_clamps_past_end() {
        let updates = compute_reorder(&[A, B, C], A, 99).unwrap();
        let ids: Vec<i32> = updates.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![B, C, A]);
    }

    #[test]
    fn test_compute_reorder_unknown_id() {
        let err = compute_reorder(&[A, B], 99, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_compute_reorder_same_position_is_identity_numbering() {
        let updates = compute_reorder(&[A, B, C], B, 1).unwrap();
        let ids: Vec<i32> = updates.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![A, B, C]);
    }

    #[test]
    fn test_plan_move_noop_when_position_unchanged() {
        let keyed = [(A, 30), (B, 20), (C, 10)];
        assert_eq!(plan_move(&keyed, B, 1).unwrap(), MovePlan::Noop);
    }

    #[test]
    fn test_plan_move_midpoint_between_neighbors() {
        let keyed = [(A, 30), (B, 20), (C, 10)];
        // Move C between A and B: midpoint of 30 and 20.
        match plan_move(&keyed, C, 1).unwrap() {
            MovePlan::Shift(update) => {
                assert_eq!(update.id, C);
                assert_eq!(update.sort_key, 25);
            }
            other => panic!("expected Shift, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_move_to_top_steps_above_current_top() {
        let keyed = [(A, 30), (B, 20), (C, 10)];
        match plan_move(&keyed, C, 0).unwrap() {
            MovePlan::Shift(update) => {
                assert_eq!(update.id, C);
                assert_eq!(update.sort_key, 30 + KEY_STEP);
            }
            other => panic!("expected Shift, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_move_to_bottom_steps_below_current_bottom() {
        let keyed = [(A, 30), (B, 20), (C, 10)];
        match plan_move(&keyed, A, 2).unwrap() {
            MovePlan::Shift(update) => {
                assert_eq!(update.id, A);
                assert_eq!(update.sort_key, 10 - KEY_STEP);
            }
            other => panic!("expected Shift, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_move_renumbers_when_gap_exhausted() {
        // Adjacent keys leave no midpoint.
        let keyed = [(A, 3), (B, 2), (C, 1)];
        match plan_move(&keyed, C, 1).unwrap() {
            MovePlan::Renumber(updates) => {
                let ids: Vec<i32> = updates.iter().map(|u| u.id).collect();
                assert_eq!(ids, vec![A, C, B]);
                // Strictly descending, spaced KEY_STEP apart.
                assert_eq!(
                    updates.iter().map(|u| u.sort_key).collect::<Vec<_>>(),
                    vec![3 * KEY_STEP, 2 * KEY_STEP, KEY_STEP]
                );
            }
            other => panic!("expected Renumber, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_move_renumbers_on_key_overflow() {
        let keyed = [(A, i32::MAX - 1), (B, 20)];
        match plan_move(&keyed, B, 0).unwrap() {
            MovePlan::Renumber(updates) => {
                let ids: Vec<i32> = updates.iter().map(|u| u.id).collect();
                assert_eq!(ids, vec![B, A]);
            }
            other => panic!("expected Renumber, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_move_single_item_board() {
        assert_eq!(plan_move(&[(A, 5)], A, 0).unwrap(), MovePlan::Noop);
    }

    #[test]
    fn test_plan_move_unknown_id() {
        let err = plan_move(&[(A, 5)], 99, 0).unwrap_err();
        assert!(matches!(err, Error::IdeaNotFound(99)));
    }

    #[test]
    fn test_sort_update_serializes_order_field() {
        let update = SortUpdate {
            id: 4,
            sort_key: 9,
        };
        let value = serde_json::to_value(update).unwrap();
        assert_eq!(value["order"], 9);
        let back: SortUpdate = serde_json::from_str(r#"{"id":4,"order":9}"#).unwrap();
        assert_eq!(back, update);
    }
}
