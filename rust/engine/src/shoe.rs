use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};

/// The ordered supply of undealt cards for one round.
///
/// Cards are shuffled once at construction and handed out through a cursor.
/// The shoe is never reshuffled or refilled while a round is in play, so a
/// card that has been dealt can never reappear.
#[derive(Debug)]
pub struct Shoe {
    cards: Vec<Card>,
    position: usize,
}

impl Shoe {
    /// Builds a shuffled shoe of `decks` 52-card sets (at least one).
    ///
    /// A `None` seed draws one from the OS so every ordering is reachable;
    /// a fixed seed reproduces the same shuffle for tests.
    pub fn new(seed: Option<u64>, decks: u32) -> Self {
        let mut rng = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_os_rng(),
        };

        let mut cards = Vec::with_capacity(52 * decks.max(1) as usize);
        for _ in 0..decks.max(1) {
            cards.extend(full_deck());
        }
        cards.shuffle(&mut rng);

        Self { cards, position: 0 }
    }

    /// Deals the next card, or `None` once the shoe is exhausted.
    pub fn deal(&mut self) -> Option<Card> {
        if self.position >= self.cards.len() {
            None
        } else {
            let c = self.cards[self.position];
            self.position += 1;
            Some(c)
        }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }
}

#[cfg(test)]
impl Shoe {
    /// Test shoe with a fixed, pre-arranged deal order.
    pub(crate) fn stacked(cards: Vec<Card>) -> Self {
        Self { cards, position: 0 }
    }
}
