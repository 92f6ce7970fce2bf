//! In-memory board: every stage mapped to its ordered list of cards.
//!
//! Every card sits in exactly one column. Within a column, cards are laid out
//! in rank order, so after a successful reorder a card's `order` equals its
//! index.

use std::collections::BTreeMap;

use crate::sort::SortChain;
use crate::{Card, CardId, Stage};

#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    columns: BTreeMap<Stage, Vec<Card>>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoardState {
    /// A board with every stage present and empty.
    pub fn empty() -> Self {
        Self {
            columns: Stage::ALL.into_iter().map(|s| (s, Vec::new())).collect(),
        }
    }

    /// Bucket cards by status, then order each column by `(order asc, updatedAt desc)`.
    ///
    /// The sort is stable, so input already in board order is preserved.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut state = Self::empty();
        for card in cards {
            state.column_mut(card.status).push(card);
        }
        let sorter = SortChain::column();
        for column in state.columns.values_mut() {
            sorter.sort(column);
        }
        state
    }

    /// Build from explicit columns, taking each list as already ordered.
    pub fn from_columns(columns: impl IntoIterator<Item = (Stage, Vec<Card>)>) -> Self {
        let mut state = Self::empty();
        for (stage, cards) in columns {
            *state.column_mut(stage) = cards;
        }
        state
    }

    pub fn column(&self, stage: Stage) -> &[Card] {
        self.columns.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn column_mut(&mut self, stage: Stage) -> &mut Vec<Card> {
        self.columns.entry(stage).or_default()
    }

    pub fn columns(&self) -> impl Iterator<Item = (Stage, &[Card])> {
        self.columns.iter().map(|(stage, cards)| (*stage, cards.as_slice()))
    }

    /// Column and index of the card with `id`.
    pub fn locate(&self, id: CardId) -> Option<(Stage, usize)> {
        self.columns.iter().find_map(|(stage, cards)| {
            cards
                .iter()
                .position(|card| card.id == id)
                .map(|index| (*stage, index))
        })
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.locate(id)
            .map(|(stage, index)| &self.column(stage)[index])
    }

    pub fn ids(&self, stage: Stage) -> Vec<CardId> {
        self.column(stage).iter().map(|card| card.id).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace a card by id inside whichever column holds it.
    ///
    /// If the replacement carries a different status, it is moved to the
    /// front of its new column without waiting for a confirmed rank. Returns
    /// false when no column holds the card.
    pub fn replace_card(&mut self, updated: Card) -> bool {
        let Some((current, index)) = self.locate(updated.id) else {
            return false;
        };

        if updated.status == current {
            self.column_mut(current)[index] = updated;
        } else {
            self.column_mut(current).remove(index);
            self.column_mut(updated.status).insert(0, updated);
        }
        true
    }
}
