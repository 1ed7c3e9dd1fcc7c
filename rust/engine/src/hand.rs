use serde::{Deserialize, Serialize};

use crate::cards::{Card, Rank};

/// The cards held by one party, plus the per-hand flags the round keeps for
/// the player's side. The dealer's hand uses the same type with the flags
/// left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
    surrendered: bool,
    doubled: bool,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_cards(cards: Vec<Card>) -> Self {
        Self {
            cards,
            ..Self::default()
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub(crate) fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Hand total under the standard soft/hard Ace rule: every Ace counts
    /// 11 until the total would bust, then Aces downgrade to 1 one at a
    /// time. The result can still exceed 21 once no Ace is left to soften.
    pub fn total(&self) -> u32 {
        let mut total = 0;
        let mut aces = 0;
        for card in &self.cards {
            if card.rank == Rank::Ace {
                aces += 1;
            }
            total += card.rank.value();
        }
        while total > 21 && aces > 0 {
            total -= 10;
            aces -= 1;
        }
        total
    }

    pub fn is_bust(&self) -> bool {
        self.total() > 21
    }

    /// A natural: exactly two cards totalling 21.
    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.total() == 21
    }

    /// Two cards of matching rank, the split precondition.
    pub fn is_pair(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].rank == self.cards[1].rank
    }

    pub fn surrendered(&self) -> bool {
        self.surrendered
    }

    pub(crate) fn mark_surrendered(&mut self) {
        self.surrendered = true;
    }

    pub fn doubled(&self) -> bool {
        self.doubled
    }

    pub(crate) fn mark_doubled(&mut self) {
        self.doubled = true;
    }
}
