//! crates/dream_path_core/src/game.rs
//!
//! The matching game played over generated `GamePair`s: every pair deals a term card and a
//! match card, the deck is shuffled, and the player turns over two cards per move.

use crate::domain::GamePair;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSide {
    Term,
    Match,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCard {
    pub id: usize,
    pub content: String,
    pub side: CardSide,
    pub pair_id: usize,
    /// Only term cards carry the pair's picture.
    pub image_url: Option<String>,
}

/// What happened when a card was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Unknown card, an already matched card, or the card that is already face up.
    Ignored,
    /// First card of a move is face up.
    FirstCard,
    Matched { pair_id: usize },
    Mismatched,
}

#[derive(Debug, Clone)]
pub struct MatchingGame {
    cards: Vec<GameCard>,
    pair_count: usize,
    selected: Option<usize>,
    matched: HashSet<usize>,
    moves: usize,
}

impl MatchingGame {
    /// Deals the cards for `pairs` in a random order.
    pub fn new(pairs: &[GamePair]) -> Self {
        let mut game = Self::unshuffled(pairs);
        // Fisher-Yates driven by v4 uuids, which are random.
        for i in (1..game.cards.len()).rev() {
            let j = (Uuid::new_v4().as_u128() % (i as u128 + 1)) as usize;
            game.cards.swap(i, j);
        }
        game
    }

    /// Deals term, match, term, match... in pair order. Card `2n` is the term of pair `n`
    /// and card `2n + 1` its match.
    pub fn unshuffled(pairs: &[GamePair]) -> Self {
        let cards = pairs
            .iter()
            .enumerate()
            .flat_map(|(index, pair)| {
                [
                    GameCard {
                        id: index * 2,
                        content: pair.term.clone(),
                        side: CardSide::Term,
                        pair_id: index,
                        image_url: pair.image_url.clone(),
                    },
                    GameCard {
                        id: index * 2 + 1,
                        content: pair.matched.clone(),
                        side: CardSide::Match,
                        pair_id: index,
                        image_url: None,
                    },
                ]
            })
            .collect();
        Self {
            cards,
            pair_count: pairs.len(),
            selected: None,
            matched: HashSet::new(),
            moves: 0,
        }
    }

    /// Cards in deal order.
    pub fn cards(&self) -> &[GameCard] {
        &self.cards
    }

    pub fn card(&self, id: usize) -> Option<&GameCard> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn is_matched(&self, card_id: usize) -> bool {
        self.card(card_id)
            .is_some_and(|card| self.matched.contains(&card.pair_id))
    }

    /// An empty deck is never complete.
    pub fn is_complete(&self) -> bool {
        self.pair_count > 0 && self.matched.len() == self.pair_count
    }

    /// Turns over `card_id`. The second card of a move counts the move and clears the
    /// selection whether or not the two cards match.
    pub fn select(&mut self, card_id: usize) -> Selection {
        let Some(card) = self.card(card_id) else {
            return Selection::Ignored;
        };
        if self.matched.contains(&card.pair_id) || self.selected == Some(card_id) {
            return Selection::Ignored;
        }
        let (pair_id, side) = (card.pair_id, card.side);

        let Some(first_id) = self.selected.take() else {
            self.selected = Some(card_id);
            return Selection::FirstCard;
        };
        self.moves += 1;

        match self.card(first_id) {
            Some(first) if first.pair_id == pair_id && first.side != side => {
                self.matched.insert(pair_id);
                Selection::Matched { pair_id }
            }
            _ => Selection::Mismatched,
        }
    }
}
