//! Drag resolution: relocate one card and compute the minimal set of rank
//! changes that realise the new layout.
//!
//! Only cards whose stored `order` or `status` no longer matches their
//! position are reported, so the write set grows with the disturbance, not
//! with column size.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{BoardState, CardId, Stage};

const COLUMN_PREFIX: &str = "column:";

/// Where a dragged card was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropTarget {
    /// Dropped onto another card; takes that card's position.
    Card(CardId),
    /// Dropped onto the empty area of a column; appended at the end.
    Column(Stage),
}

impl FromStr for DropTarget {
    type Err = String;

    /// Accepts a card UUID or `column:<STAGE>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix(COLUMN_PREFIX) {
            Some(stage) => stage.parse().map(Self::Column),
            None => s
                .parse()
                .map(Self::Card)
                .map_err(|_| format!("Invalid drop target: {}", s)),
        }
    }
}

impl fmt::Display for DropTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card(id) => write!(f, "{}", id),
            Self::Column(stage) => write!(f, "{}{}", COLUMN_PREFIX, stage),
        }
    }
}

/// One persisted change. `status` is present only when the card changed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderUpdate {
    pub id: CardId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Stage>,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragOutcome {
    pub next: BoardState,
    pub updates: Vec<ReorderUpdate>,
    pub source: Stage,
    pub destination: Stage,
}

impl DragOutcome {
    pub fn is_noop(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Move `active_id` to `target` and report the resulting board and updates.
///
/// Returns `None` when the active card is not on the board or the target
/// card cannot be found. `state` is never modified.
pub fn apply_drag(state: &BoardState, active_id: CardId, target: DropTarget) -> Option<DragOutcome> {
    let (source, active_index) = state.locate(active_id)?;
    let (destination, insert_at) = match target {
        DropTarget::Column(stage) => (stage, state.column(stage).len()),
        DropTarget::Card(over_id) => state.locate(over_id)?,
    };

    if target == DropTarget::Card(active_id) {
        return Some(DragOutcome {
            next: state.clone(),
            updates: Vec::new(),
            source,
            destination,
        });
    }

    let mut next = state.clone();
    let moved = next.column_mut(source).remove(active_index);
    let column = next.column_mut(destination);
    // Same-column moves shrink the list first; an index past the end appends.
    let insert_at = insert_at.min(column.len());
    column.insert(insert_at, moved);

    let touched: &[Stage] = if source == destination {
        &[source]
    } else {
        &[source, destination]
    };

    let mut updates = Vec::new();
    for &stage in touched {
        for (rank, card) in next.column_mut(stage).iter_mut().enumerate() {
            let rank = rank as u32;
            let status_changed = card.status != stage;
            if card.order != rank || status_changed {
                updates.push(ReorderUpdate {
                    id: card.id,
                    status: status_changed.then_some(stage),
                    order: rank,
                });
                card.place(stage, rank);
            }
        }
    }

    tracing::trace!(
        card = %active_id,
        %source,
        %destination,
        updates = updates.len(),
        "Resolved drag"
    );

    Some(DragOutcome {
        next,
        updates,
        source,
        destination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Card;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn card(title: &str, status: Stage, order: u32) -> Card {
        Card::new(Uuid::nil(), title.to_string(), status, order)
    }

    /// Backlog [a0 b1 c2], Todo [d0 e1], InProgress [], Done [f0].
    fn sample_board() -> BoardState {
        BoardState::from_cards(vec![
            card("a", Stage::Backlog, 0),
            card("b", Stage::Backlog, 1),
            card("c", Stage::Backlog, 2),
            card("d", Stage::Todo, 0),
            card("e", Stage::Todo, 1),
            card("f", Stage::Done, 0),
        ])
    }

    fn all_ids(state: &BoardState) -> HashSet<CardId> {
        Stage::ALL.into_iter().flat_map(|s| state.ids(s)).collect()
    }

    fn targets(state: &BoardState) -> Vec<DropTarget> {
        let mut targets: Vec<DropTarget> = Stage::ALL.into_iter().map(DropTarget::Column).collect();
        targets.extend(all_ids(state).into_iter().map(DropTarget::Card));
        targets
    }

    #[test]
    fn test_same_column_swap() {
        let a = card("a", Stage::Backlog, 0);
        let b = card("b", Stage::Backlog, 1);
        let state = BoardState::from_cards(vec![a.clone(), b.clone()]);

        let outcome = apply_drag(&state, b.id, DropTarget::Card(a.id)).unwrap();

        assert_eq!(outcome.next.ids(Stage::Backlog), vec![b.id, a.id]);
        assert_eq!(
            outcome.updates,
            vec![
                ReorderUpdate { id: b.id, status: None, order: 0 },
                ReorderUpdate { id: a.id, status: None, order: 1 },
            ]
        );
        assert_eq!(outcome.next.card(b.id).unwrap().order, 0);
        assert_eq!(outcome.next.card(a.id).unwrap().order, 1);
    }

    #[test]
    fn test_drop_on_empty_column() {
        let a = card("a", Stage::Backlog, 0);
        let state = BoardState::from_cards(vec![a.clone()]);

        let outcome = apply_drag(&state, a.id, DropTarget::Column(Stage::Done)).unwrap();

        assert!(outcome.next.column(Stage::Backlog).is_empty());
        assert_eq!(outcome.next.ids(Stage::Done), vec![a.id]);
        assert_eq!(
            outcome.updates,
            vec![ReorderUpdate { id: a.id, status: Some(Stage::Done), order: 0 }]
        );
        assert_eq!(outcome.next.card(a.id).unwrap().status, Stage::Done);
    }

    #[test]
    fn test_move_down_lands_after_target() {
        let state = sample_board();
        let [a, b, c] = [0, 1, 2].map(|i| state.column(Stage::Backlog)[i].id);

        let outcome = apply_drag(&state, a, DropTarget::Card(c)).unwrap();

        assert_eq!(outcome.next.ids(Stage::Backlog), vec![b, c, a]);
        assert_eq!(outcome.updates.len(), 3);
    }

    #[test]
    fn test_cross_column_onto_card_inserts_before_it() {
        let state = sample_board();
        let b = state.column(Stage::Backlog)[1].id;
        let e = state.column(Stage::Todo)[1].id;
        let d = state.column(Stage::Todo)[0].id;

        let outcome = apply_drag(&state, b, DropTarget::Card(e)).unwrap();

        assert_eq!(outcome.next.ids(Stage::Todo), vec![d, b, e]);
        assert_eq!(outcome.source, Stage::Backlog);
        assert_eq!(outcome.destination, Stage::Todo);

        let moved = outcome.updates.iter().find(|u| u.id == b).unwrap();
        assert_eq!(moved.status, Some(Stage::Todo));
        assert_eq!(moved.order, 1);

        // c closes the gap in Backlog, e shifts down in Todo; a and d are untouched.
        let changed: HashSet<CardId> = outcome.updates.iter().map(|u| u.id).collect();
        let c = state.column(Stage::Backlog)[2].id;
        assert_eq!(changed, HashSet::from([b, c, e]));
        assert!(outcome
            .updates
            .iter()
            .filter(|u| u.id != b)
            .all(|u| u.status.is_none()));
    }

    #[test]
    fn test_drop_on_self_is_noop_even_with_gapped_orders() {
        let state = BoardState::from_cards(vec![
            card("a", Stage::Todo, 5),
            card("b", Stage::Todo, 40),
        ]);
        let b = state.column(Stage::Todo)[1].id;

        let outcome = apply_drag(&state, b, DropTarget::Card(b)).unwrap();

        assert!(outcome.is_noop());
        assert_eq!(outcome.next, state);
    }

    #[test]
    fn test_drop_on_own_column_when_already_last() {
        let state = sample_board();
        let e = state.column(Stage::Todo)[1].id;

        let outcome = apply_drag(&state, e, DropTarget::Column(Stage::Todo)).unwrap();

        assert!(outcome.is_noop());
        assert_eq!(outcome.next.ids(Stage::Todo), state.ids(Stage::Todo));
    }

    #[test]
    fn test_drop_on_own_column_moves_to_end() {
        let state = sample_board();
        let [a, b, c] = [0, 1, 2].map(|i| state.column(Stage::Backlog)[i].id);

        let outcome = apply_drag(&state, a, DropTarget::Column(Stage::Backlog)).unwrap();

        assert_eq!(outcome.next.ids(Stage::Backlog), vec![b, c, a]);
    }

    #[test]
    fn test_missing_active_card() {
        let state = sample_board();
        assert!(apply_drag(&state, Uuid::new_v4(), DropTarget::Column(Stage::Done)).is_none());
    }

    #[test]
    fn test_stale_target_card() {
        let state = sample_board();
        let a = state.column(Stage::Backlog)[0].id;
        assert!(apply_drag(&state, a, DropTarget::Card(Uuid::new_v4())).is_none());
    }

    #[test]
    fn test_input_state_is_untouched() {
        let state = sample_board();
        let before = state.clone();
        let a = state.column(Stage::Backlog)[0].id;

        let _ = apply_drag(&state, a, DropTarget::Column(Stage::Done)).unwrap();

        assert_eq!(state, before);
    }

    #[test]
    fn test_every_drag_preserves_card_set_and_contiguous_ranks() {
        let state = sample_board();
        let ids = all_ids(&state);

        for active in ids.iter().copied() {
            for target in targets(&state) {
                let outcome = apply_drag(&state, active, target).unwrap();
                let (source, _) = state.locate(active).unwrap();
                let (destination, _) = outcome.next.locate(active).unwrap();

                assert_eq!(all_ids(&outcome.next), ids, "card set changed");
                assert_eq!(outcome.next.len(), state.len());

                if source == destination {
                    let mut before = state.ids(source);
                    let mut after = outcome.next.ids(source);
                    before.sort();
                    after.sort();
                    assert_eq!(before, after);
                } else {
                    assert_eq!(
                        outcome.next.column(source).len() + 1,
                        state.column(source).len()
                    );
                    assert_eq!(
                        outcome.next.column(destination).len(),
                        state.column(destination).len() + 1
                    );
                }

                for stage in [source, destination] {
                    for (rank, card) in outcome.next.column(stage).iter().enumerate() {
                        assert_eq!(card.order, rank as u32);
                        assert_eq!(card.status, stage);
                    }
                }

                if target == DropTarget::Card(active) {
                    assert!(outcome.is_noop());
                    assert_eq!(outcome.next, state);
                }
            }
        }
    }

    #[test]
    fn test_moved_card_occupies_target_index_within_column() {
        let state = sample_board();
        let column = state.ids(Stage::Backlog);

        for (from, active) in column.iter().enumerate() {
            for (to, over) in column.iter().enumerate() {
                let outcome = apply_drag(&state, *active, DropTarget::Card(*over)).unwrap();
                let (_, index) = outcome.next.locate(*active).unwrap();
                assert_eq!(index, to, "moving {} onto {}", from, to);
            }
        }
    }

    #[test]
    fn test_updates_only_report_changed_cards() {
        let state = sample_board();
        let a = state.column(Stage::Backlog)[0].id;

        let outcome = apply_drag(&state, a, DropTarget::Column(Stage::InProgress)).unwrap();

        for update in &outcome.updates {
            let before = state.card(update.id).unwrap();
            assert!(before.order != update.order || update.status.is_some());
        }
        let f = state.column(Stage::Done)[0].id;
        assert!(outcome.updates.iter().all(|u| u.id != f));
    }

    #[test]
    fn test_successive_drags_compose() {
        let state = sample_board();
        let a = state.column(Stage::Backlog)[0].id;
        let f = state.column(Stage::Done)[0].id;

        let first = apply_drag(&state, a, DropTarget::Column(Stage::Done)).unwrap();
        let second = apply_drag(&first.next, f, DropTarget::Card(a)).unwrap();

        // f started above a, so dropping it onto a lands below it.
        assert_eq!(second.next.ids(Stage::Done), vec![a, f]);
        assert_eq!(
            second.updates,
            vec![
                ReorderUpdate { id: a, status: None, order: 0 },
                ReorderUpdate { id: f, status: None, order: 1 },
            ]
        );
    }

    #[test]
    fn test_drop_target_parse() {
        let id = Uuid::new_v4();
        assert_eq!(
            "column:DONE".parse::<DropTarget>().unwrap(),
            DropTarget::Column(Stage::Done)
        );
        assert_eq!(id.to_string().parse::<DropTarget>().unwrap(), DropTarget::Card(id));
        assert!("column:ARCHIVED".parse::<DropTarget>().is_err());
        assert!("not-a-card".parse::<DropTarget>().is_err());
        assert_eq!(DropTarget::Column(Stage::Todo).to_string(), "column:TODO");
    }

    #[test]
    fn test_update_wire_shape_omits_unchanged_status() {
        let id = Uuid::nil();
        let same_column = serde_json::to_value(ReorderUpdate { id, status: None, order: 2 }).unwrap();
        assert!(same_column.get("status").is_none());

        let moved = serde_json::to_value(ReorderUpdate {
            id,
            status: Some(Stage::Done),
            order: 0,
        })
        .unwrap();
        assert_eq!(moved["status"], "DONE");
    }
}
