//! Per-column sort and position-change derivation.
//!
//! Cards partition into the four fixed columns and sort descending by
//! votes; ties keep their existing list order, which is creation order
//! since the server lists cards oldest-first. Rank changes within a column
//! emit a transient movement marker that expires 400ms after it was set,
//! whatever happens in between.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

use retro_types::{Card, ColumnType};

pub const MOVE_MARKER_TTL: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct PlacedCard {
    pub card: Card,
    pub rank: usize,
    pub movement: Option<Movement>,
}

pub struct BoardLayout {
    previous: HashMap<Uuid, (ColumnType, usize)>,
    markers: HashMap<Uuid, (Movement, Instant)>,
}

impl BoardLayout {
    pub fn new() -> Self {
        Self {
            previous: HashMap::new(),
            markers: HashMap::new(),
        }
    }

    /// Derive the rendered board from the full card list. `now` drives
    /// marker expiry; pass `Instant::now()` outside tests.
    pub fn place(&mut self, cards: &[Card], now: Instant) -> HashMap<ColumnType, Vec<PlacedCard>> {
        // Markers clear unconditionally after their TTL so no card keeps a
        // stuck animation class.
        self.markers
            .retain(|_, (_, set_at)| now.duration_since(*set_at) < MOVE_MARKER_TTL);

        let mut by_column: HashMap<ColumnType, Vec<Card>> = HashMap::new();
        for card in cards {
            by_column
                .entry(card.column_type)
                .or_default()
                .push(card.clone());
        }

        let mut next_previous = HashMap::new();
        let mut placed: HashMap<ColumnType, Vec<PlacedCard>> = HashMap::new();

        for column in ColumnType::ALL {
            let mut column_cards = by_column.remove(&column).unwrap_or_default();
            // Stable sort: equal vote counts keep their incoming order.
            column_cards.sort_by_key(|c| Reverse(c.votes));

            let cards = column_cards
                .into_iter()
                .enumerate()
                .map(|(rank, card)| {
                    match self.previous.get(&card.id) {
                        // A rank change within the same column animates;
                        // column changes and new cards do not.
                        Some((prev_column, prev_rank)) if *prev_column == column => {
                            if rank < *prev_rank {
                                self.markers.insert(card.id, (Movement::Up, now));
                            } else if rank > *prev_rank {
                                self.markers.insert(card.id, (Movement::Down, now));
                            }
                        }
                        _ => {}
                    }
                    next_previous.insert(card.id, (column, rank));
                    let movement = self.markers.get(&card.id).map(|(m, _)| *m);
                    PlacedCard {
                        card,
                        rank,
                        movement,
                    }
                })
                .collect();

            placed.insert(column, cards);
        }

        self.previous = next_previous;
        placed
    }
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn card(content: &str, column: ColumnType, votes: i64) -> Card {
        Card {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            column_type: column,
            content: content.into(),
            votes,
            created_at: Utc::now(),
        }
    }

    fn contents(placed: &[PlacedCard]) -> Vec<&str> {
        placed.iter().map(|p| p.card.content.as_str()).collect()
    }

    #[test]
    fn sorts_by_votes_with_stable_tie_break() {
        let mut layout = BoardLayout::new();
        let mut cards = vec![
            card("A", ColumnType::Glad, 0),
            card("B", ColumnType::Glad, 0),
            card("C", ColumnType::Glad, 0),
        ];
        // One vote on C: it jumps ahead, A keeps its place before B.
        cards[2].votes = 1;

        let placed = layout.place(&cards, Instant::now());
        assert_eq!(contents(&placed[&ColumnType::Glad]), vec!["C", "A", "B"]);
    }

    #[test]
    fn order_is_non_increasing_in_votes() {
        let mut layout = BoardLayout::new();
        let cards = vec![
            card("low", ColumnType::Sad, 1),
            card("high", ColumnType::Sad, 7),
            card("mid", ColumnType::Sad, 3),
        ];
        let placed = layout.place(&cards, Instant::now());
        let votes: Vec<i64> = placed[&ColumnType::Sad]
            .iter()
            .map(|p| p.card.votes)
            .collect();
        assert!(votes.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn partition_covers_all_four_columns() {
        let mut layout = BoardLayout::new();
        let placed = layout.place(&[], Instant::now());
        for column in ColumnType::ALL {
            assert!(placed[&column].is_empty());
        }
    }

    #[test]
    fn rank_changes_emit_movement_markers() {
        let mut layout = BoardLayout::new();
        let now = Instant::now();
        let mut cards = vec![
            card("A", ColumnType::Glad, 0),
            card("B", ColumnType::Glad, 0),
        ];

        layout.place(&cards, now);

        cards[1].votes = 2;
        let placed = layout.place(&cards, now);
        let glad = &placed[&ColumnType::Glad];
        assert_eq!(glad[0].card.content, "B");
        assert_eq!(glad[0].movement, Some(Movement::Up));
        assert_eq!(glad[1].movement, Some(Movement::Down));
    }

    #[test]
    fn new_cards_and_column_moves_do_not_animate() {
        let mut layout = BoardLayout::new();
        let now = Instant::now();
        let mut cards = vec![
            card("A", ColumnType::Glad, 1),
            card("B", ColumnType::Glad, 0),
        ];

        let first = layout.place(&cards, now);
        assert!(first[&ColumnType::Glad].iter().all(|p| p.movement.is_none()));

        // B switches columns and becomes rank 0 there: no marker.
        cards[1].column_type = ColumnType::Action;
        let placed = layout.place(&cards, now);
        assert_eq!(placed[&ColumnType::Action][0].movement, None);
    }

    #[test]
    fn markers_expire_after_the_ttl() {
        let mut layout = BoardLayout::new();
        let now = Instant::now();
        let mut cards = vec![
            card("A", ColumnType::Glad, 0),
            card("B", ColumnType::Glad, 0),
        ];

        layout.place(&cards, now);
        cards[1].votes = 5;
        let placed = layout.place(&cards, now);
        assert_eq!(placed[&ColumnType::Glad][0].movement, Some(Movement::Up));

        // Re-derive within the TTL: the marker is still visible.
        let placed = layout.place(&cards, now + Duration::from_millis(200));
        assert_eq!(placed[&ColumnType::Glad][0].movement, Some(Movement::Up));

        // Past the TTL it clears even though nothing else changed.
        let placed = layout.place(&cards, now + MOVE_MARKER_TTL + Duration::from_millis(1));
        assert_eq!(placed[&ColumnType::Glad][0].movement, None);
    }
}
