//! Card sorting functionality.
//!
//! Provides the sort keys used by the board snapshot and the paginated list,
//! so the server and the client bucket cards the same way.

use crate::{Card, Priority};
use std::borrow::Borrow;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Enum dispatch for sorting cards by a specific field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Status,
    Order,
    Priority,
    CreatedAt,
    UpdatedAt,
}

impl SortBy {
    pub fn compare(&self, a: &Card, b: &Card) -> Ordering {
        match self {
            Self::Status => a.status.cmp(&b.status),
            Self::Order => a.order.cmp(&b.order),
            Self::Priority => priority_value(&a.priority).cmp(&priority_value(&b.priority)),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

/// Lexicographic sort over several keys, each with its own direction.
#[derive(Debug, Clone)]
pub struct SortChain {
    keys: Vec<(SortBy, SortOrder)>,
}

impl SortChain {
    pub fn new(keys: Vec<(SortBy, SortOrder)>) -> Self {
        Self { keys }
    }

    /// `(status asc, order asc, updatedAt desc)`, or without `order` when the
    /// store cannot persist ranks.
    pub fn board(ordering_available: bool) -> Self {
        let mut keys = vec![(SortBy::Status, SortOrder::Ascending)];
        if ordering_available {
            keys.push((SortBy::Order, SortOrder::Ascending));
        }
        keys.push((SortBy::UpdatedAt, SortOrder::Descending));
        Self::new(keys)
    }

    /// Rank within a single column: `(order asc, updatedAt desc)`.
    pub fn column() -> Self {
        Self::new(vec![
            (SortBy::Order, SortOrder::Ascending),
            (SortBy::UpdatedAt, SortOrder::Descending),
        ])
    }

    /// `(priority desc, createdAt desc)` for the paginated list view.
    pub fn list() -> Self {
        Self::new(vec![
            (SortBy::Priority, SortOrder::Descending),
            (SortBy::CreatedAt, SortOrder::Descending),
        ])
    }

    pub fn compare(&self, a: &Card, b: &Card) -> Ordering {
        self.keys
            .iter()
            .map(|(key, order)| {
                let cmp = key.compare(a, b);
                match order {
                    SortOrder::Ascending => cmp,
                    SortOrder::Descending => cmp.reverse(),
                }
            })
            .find(|cmp| cmp.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Stable sort in place. Works with both `&Card` and `Card` elements.
    pub fn sort<T: Borrow<Card>>(&self, cards: &mut [T]) {
        cards.sort_by(|a, b| self.compare(a.borrow(), b.borrow()));
    }
}

/// Convert priority to numeric value for sorting.
fn priority_value(priority: &Priority) -> u8 {
    match priority {
        Priority::Urgent => 3,
        Priority::High => 2,
        Priority::Medium => 1,
        Priority::Low => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stage;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn card(title: &str, status: Stage, order: u32, age_minutes: i64) -> Card {
        let mut card = Card::new(Uuid::nil(), title.to_string(), status, order);
        card.updated_at = Utc::now() - Duration::minutes(age_minutes);
        card.created_at = card.updated_at;
        card
    }

    fn titles(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn test_board_sort_groups_by_stage_then_order() {
        let mut cards = vec![
            card("done-0", Stage::Done, 0, 1),
            card("backlog-1", Stage::Backlog, 1, 1),
            card("todo-0", Stage::Todo, 0, 1),
            card("backlog-0", Stage::Backlog, 0, 1),
        ];
        SortChain::board(true).sort(&mut cards);

        assert_eq!(
            titles(&cards),
            vec!["backlog-0", "backlog-1", "todo-0", "done-0"]
        );
    }

    #[test]
    fn test_status_key_follows_board_not_name() {
        let done = card("done", Stage::Done, 0, 1);
        let in_progress = card("in-progress", Stage::InProgress, 0, 1);

        assert_eq!(SortBy::Status.compare(&in_progress, &done), Ordering::Less);
        assert_eq!(SortBy::Status.compare(&done, &done), Ordering::Equal);
    }

    #[test]
    fn test_board_sort_breaks_ties_by_recency() {
        let mut cards = vec![
            card("older", Stage::Todo, 0, 30),
            card("newer", Stage::Todo, 0, 5),
        ];
        SortChain::board(true).sort(&mut cards);

        assert_eq!(titles(&cards), vec!["newer", "older"]);
    }

    #[test]
    fn test_board_sort_without_ordering_ignores_order() {
        let mut cards = vec![
            card("ranked-first-but-old", Stage::Todo, 0, 60),
            card("ranked-last-but-new", Stage::Todo, 9, 1),
        ];
        SortChain::board(false).sort(&mut cards);

        assert_eq!(
            titles(&cards),
            vec!["ranked-last-but-new", "ranked-first-but-old"]
        );
    }

    #[test]
    fn test_list_sort_priority_desc() {
        let mut low = card("low", Stage::Todo, 0, 1);
        low.priority = Priority::Low;
        let mut urgent = card("urgent", Stage::Todo, 0, 10);
        urgent.priority = Priority::Urgent;

        let mut cards = vec![low, urgent];
        SortChain::list().sort(&mut cards);

        assert_eq!(titles(&cards), vec!["urgent", "low"]);
    }
}
