use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::errors::RoundError;
use crate::hand::Hand;
use crate::shoe::Shoe;

/// Nominal stake placed on the opening hand.
pub const INITIAL_BET: u32 = 100;
/// A hand whose bet exceeds this cannot be doubled.
pub const DOUBLE_CEILING: u32 = 500;
/// Dealer draws while strictly below this total, soft or hard.
pub const DEALER_STAND: u32 = 17;

/// State-machine state of a round.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// A player hand is awaiting a decision.
    PlayerTurn,
    /// The opening two cards totalled 21. Terminal, with no dealer
    /// play-out and no per-hand results.
    PlayerBlackjack,
    /// The dealer has played out and every hand has an outcome.
    Finished,
}

impl RoundStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RoundStatus::PlayerTurn)
    }
}

/// Resolution of a single player hand against the dealer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    PlayerWin,
    DealerWin,
    Push,
    PlayerBust,
    Surrender,
}

/// Parameters for dealing a fresh round.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// RNG seed for the shuffle; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Number of 52-card sets in the shoe.
    pub decks: u32,
    /// Stake on the opening hand.
    pub bet: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            seed: None,
            decks: 1,
            bet: INITIAL_BET,
        }
    }
}

/// One player hand as a client may see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandView {
    pub cards: Vec<Card>,
    pub total: u32,
    pub bet: u32,
    pub surrendered: bool,
}

/// The dealer's hand as a client may see it. A `None` card is the
/// face-down hole card while the round is still the player's to act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealerView {
    pub cards: Vec<Option<Card>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
}

/// Read-only projection of a round's externally visible state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub round_id: String,
    pub status: RoundStatus,
    pub hands: Vec<HandView>,
    pub active_hand: usize,
    pub dealer: DealerView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Outcome>>,
}

/// One blackjack round: the shoe, the player's hands and stakes, the
/// dealer's hand, and the turn cursor.
///
/// `hands` and `bets` stay index-aligned at all times; splitting inserts
/// into both in the same operation. While the status is
/// [`RoundStatus::PlayerTurn`], `active_hand` indexes the hand currently
/// receiving decisions.
#[derive(Debug)]
pub struct Round {
    id: String,
    shoe: Shoe,
    hands: Vec<Hand>,
    bets: Vec<u32>,
    dealer: Hand,
    active_hand: usize,
    status: RoundStatus,
    results: Vec<Outcome>,
}

fn draw(shoe: &mut Shoe) -> Result<Card, RoundError> {
    shoe.deal().ok_or(RoundError::ShoeExhausted)
}

impl Round {
    /// Deals a fresh round: two cards to the player, then two to the
    /// dealer. An opening 21 goes straight to
    /// [`RoundStatus::PlayerBlackjack`] without any dealer play-out.
    pub fn new(id: impl Into<String>, config: RoundConfig) -> Result<Self, RoundError> {
        let shoe = Shoe::new(config.seed, config.decks);
        Self::deal(id.into(), shoe, config.bet)
    }

    fn deal(id: String, mut shoe: Shoe, bet: u32) -> Result<Self, RoundError> {
        let mut player = Hand::new();
        player.push(draw(&mut shoe)?);
        player.push(draw(&mut shoe)?);

        let mut dealer = Hand::new();
        dealer.push(draw(&mut shoe)?);
        dealer.push(draw(&mut shoe)?);

        let status = if player.is_blackjack() {
            RoundStatus::PlayerBlackjack
        } else {
            RoundStatus::PlayerTurn
        };

        Ok(Self {
            id,
            shoe,
            hands: vec![player],
            bets: vec![bet],
            dealer,
            active_hand: 0,
            status,
            results: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    /// Deals one card to the active hand. A bust moves play to the next
    /// split hand, or resolves the round when this was the last one; a
    /// hand below 22 keeps the turn.
    pub fn hit(&mut self) -> Result<(), RoundError> {
        self.ensure_player_turn()?;
        let card = draw(&mut self.shoe)?;
        self.hands[self.active_hand].push(card);
        if self.hands[self.active_hand].is_bust() {
            self.advance_or_resolve()?;
        }
        Ok(())
    }

    /// Ends the turn on the active hand.
    pub fn stand(&mut self) -> Result<(), RoundError> {
        self.ensure_player_turn()?;
        self.advance_or_resolve()
    }

    /// Doubles the active hand's bet, deals exactly one card, and ends the
    /// turn on that hand. Only legal at the first decision point (two
    /// cards) and while the bet is within [`DOUBLE_CEILING`].
    pub fn double(&mut self) -> Result<(), RoundError> {
        self.ensure_player_turn()?;
        let idx = self.active_hand;
        if self.hands[idx].cards().len() != 2 {
            return Err(RoundError::DoubleNotAllowed);
        }
        let bet = self.bets[idx];
        if bet > DOUBLE_CEILING {
            return Err(RoundError::BetCeilingExceeded {
                bet,
                ceiling: DOUBLE_CEILING,
            });
        }
        let card = draw(&mut self.shoe)?;
        self.bets[idx] = bet * 2;
        self.hands[idx].push(card);
        self.hands[idx].mark_doubled();
        self.advance_or_resolve()
    }

    /// Forfeits the active hand. Its outcome is fixed to
    /// [`Outcome::Surrender`] regardless of totals; play then moves on as
    /// for a stand.
    pub fn surrender(&mut self) -> Result<(), RoundError> {
        self.ensure_player_turn()?;
        self.hands[self.active_hand].mark_surrendered();
        self.advance_or_resolve()
    }

    /// Splits a two-card pair into two hands, dealing one card to each.
    /// The new hand and a duplicate bet are inserted right after the
    /// active index; the turn stays on the first of the two.
    pub fn split(&mut self) -> Result<(), RoundError> {
        self.ensure_player_turn()?;
        let idx = self.active_hand;
        if !self.hands[idx].is_pair() {
            return Err(RoundError::SplitNotAllowed);
        }
        let first = self.hands[idx].cards()[0];
        let second = self.hands[idx].cards()[1];
        let left = Hand::with_cards(vec![first, draw(&mut self.shoe)?]);
        let right = Hand::with_cards(vec![second, draw(&mut self.shoe)?]);
        self.hands[idx] = left;
        self.hands.insert(idx + 1, right);
        let bet = self.bets[idx];
        self.bets.insert(idx + 1, bet);
        Ok(())
    }

    fn ensure_player_turn(&self) -> Result<(), RoundError> {
        if self.status != RoundStatus::PlayerTurn {
            return Err(RoundError::NotPlayerTurn);
        }
        Ok(())
    }

    fn has_next_hand(&self) -> bool {
        self.active_hand + 1 < self.hands.len()
    }

    fn advance_or_resolve(&mut self) -> Result<(), RoundError> {
        if self.has_next_hand() {
            self.active_hand += 1;
            Ok(())
        } else {
            self.resolve()
        }
    }

    /// Dealer draws to [`DEALER_STAND`], then every hand is scored in
    /// order.
    fn resolve(&mut self) -> Result<(), RoundError> {
        while self.dealer.total() < DEALER_STAND {
            let card = draw(&mut self.shoe)?;
            self.dealer.push(card);
        }

        let dealer_total = self.dealer.total();
        self.results = self
            .hands
            .iter()
            .map(|hand| {
                let player_total = hand.total();
                if hand.surrendered() {
                    Outcome::Surrender
                } else if player_total > 21 {
                    Outcome::PlayerBust
                } else if dealer_total > 21 || player_total > dealer_total {
                    Outcome::PlayerWin
                } else if dealer_total > player_total {
                    Outcome::DealerWin
                } else {
                    Outcome::Push
                }
            })
            .collect();
        self.status = RoundStatus::Finished;
        Ok(())
    }

    /// Externally visible projection of the round.
    ///
    /// While the status is [`RoundStatus::PlayerTurn`] the dealer's hole
    /// card and total are withheld; any terminal status reveals both.
    pub fn snapshot(&self) -> RoundSnapshot {
        let masked = self.status == RoundStatus::PlayerTurn;
        RoundSnapshot {
            round_id: self.id.clone(),
            status: self.status,
            hands: self
                .hands
                .iter()
                .zip(&self.bets)
                .map(|(hand, &bet)| HandView {
                    cards: hand.cards().to_vec(),
                    total: hand.total(),
                    bet,
                    surrendered: hand.surrendered(),
                })
                .collect(),
            active_hand: self.active_hand,
            dealer: DealerView {
                cards: self
                    .dealer
                    .cards()
                    .iter()
                    .enumerate()
                    .map(|(i, &card)| {
                        if masked && i > 0 {
                            None
                        } else {
                            Some(card)
                        }
                    })
                    .collect(),
                total: if masked { None } else { Some(self.dealer.total()) },
            },
            results: if self.results.is_empty() {
                None
            } else {
                Some(self.results.clone())
            },
        }
    }
}

#[cfg(test)]
impl Round {
    /// Round dealt from a pre-arranged shoe: player takes cards 0 and 1,
    /// the dealer takes 2 and 3, later draws follow in order.
    pub(crate) fn with_shoe(id: &str, shoe: Shoe, bet: u32) -> Result<Self, RoundError> {
        Self::deal(id.to_string(), shoe, bet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    fn card(rank: Rank) -> Card {
        Card {
            suit: Suit::Spades,
            rank,
        }
    }

    fn stacked_round(ranks: &[Rank], bet: u32) -> Round {
        let shoe = Shoe::stacked(ranks.iter().map(|&r| card(r)).collect());
        Round::with_shoe("test-round", shoe, bet).expect("deal round")
    }

    use Rank::*;

    #[test]
    fn fresh_round_deals_two_cards_each() {
        let round = Round::new(
            "r1",
            RoundConfig {
                seed: Some(11),
                ..RoundConfig::default()
            },
        )
        .expect("deal round");

        assert_eq!(round.shoe.remaining(), 48);
        let snapshot = round.snapshot();
        assert_eq!(snapshot.hands.len(), 1);
        assert_eq!(snapshot.hands[0].cards.len(), 2);
        assert_eq!(snapshot.hands[0].bet, INITIAL_BET);
        assert_eq!(snapshot.dealer.cards.len(), 2);
        assert_eq!(snapshot.active_hand, 0);
    }

    #[test]
    fn opening_twenty_one_is_blackjack_with_no_further_dealing() {
        let round = stacked_round(&[Ace, King, Nine, Five], INITIAL_BET);
        assert_eq!(round.status(), RoundStatus::PlayerBlackjack);
        assert_eq!(round.shoe.remaining(), 0);

        let snapshot = round.snapshot();
        assert!(snapshot.results.is_none());
        // terminal status reveals the dealer
        assert_eq!(snapshot.dealer.total, Some(14));
        assert!(snapshot.dealer.cards.iter().all(Option::is_some));
    }

    #[test]
    fn actions_on_a_terminal_round_are_rejected() {
        let mut round = stacked_round(&[Ace, King, Nine, Five], INITIAL_BET);
        assert_eq!(round.hit(), Err(RoundError::NotPlayerTurn));
        assert_eq!(round.stand(), Err(RoundError::NotPlayerTurn));
        assert_eq!(round.double(), Err(RoundError::NotPlayerTurn));
        assert_eq!(round.surrender(), Err(RoundError::NotPlayerTurn));
        assert_eq!(round.split(), Err(RoundError::NotPlayerTurn));
    }

    #[test]
    fn hit_below_twenty_two_keeps_the_turn() {
        let mut round = stacked_round(&[Two, Three, Ten, Seven, Five], INITIAL_BET);
        round.hit().expect("hit");
        assert_eq!(round.status(), RoundStatus::PlayerTurn);
        let snapshot = round.snapshot();
        assert_eq!(snapshot.active_hand, 0);
        assert_eq!(snapshot.hands[0].total, 10);
        assert_eq!(snapshot.hands[0].cards.len(), 3);
    }

    #[test]
    fn hit_bust_on_the_last_hand_resolves_the_round() {
        let mut round = stacked_round(&[King, Queen, Ten, Seven, King], INITIAL_BET);
        round.hit().expect("hit");
        assert_eq!(round.status(), RoundStatus::Finished);
        let snapshot = round.snapshot();
        // busting loses even though the dealer only has 17
        assert_eq!(snapshot.results, Some(vec![Outcome::PlayerBust]));
        assert_eq!(snapshot.dealer.total, Some(17));
    }

    #[test]
    fn stand_plays_out_the_dealer_to_seventeen() {
        let mut round = stacked_round(&[King, Queen, Two, Two, Five, Five, Five], INITIAL_BET);
        round.stand().expect("stand");
        assert_eq!(round.status(), RoundStatus::Finished);

        let snapshot = round.snapshot();
        // 2 + 2 + 5 + 5 + 5 = 19, first total at or above 17
        assert_eq!(snapshot.dealer.total, Some(19));
        assert_eq!(snapshot.dealer.cards.len(), 5);
        assert_eq!(snapshot.results, Some(vec![Outcome::PlayerWin]));
    }

    #[test]
    fn dealer_stands_on_soft_seventeen() {
        let mut round = stacked_round(&[King, Queen, Ace, Six, Nine], INITIAL_BET);
        round.stand().expect("stand");

        let snapshot = round.snapshot();
        assert_eq!(snapshot.dealer.total, Some(17));
        assert_eq!(snapshot.dealer.cards.len(), 2);
        assert_eq!(snapshot.results, Some(vec![Outcome::PlayerWin]));
    }

    #[test]
    fn dealer_bust_pays_every_live_hand() {
        // dealer: 10 + 6, forced draw of a King busts at 26
        let mut round = stacked_round(&[Two, Three, Ten, Six, King], INITIAL_BET);
        round.stand().expect("stand");

        let snapshot = round.snapshot();
        assert_eq!(snapshot.dealer.total, Some(26));
        assert_eq!(snapshot.results, Some(vec![Outcome::PlayerWin]));
    }

    #[test]
    fn equal_totals_push() {
        let mut round = stacked_round(&[King, Seven, Ten, Seven], INITIAL_BET);
        round.stand().expect("stand");
        assert_eq!(round.snapshot().results, Some(vec![Outcome::Push]));
    }

    #[test]
    fn double_doubles_the_bet_and_deals_exactly_one_card() {
        let mut round = stacked_round(&[Five, Six, Ten, Seven, King], INITIAL_BET);
        round.double().expect("double");
        assert_eq!(round.status(), RoundStatus::Finished);

        let snapshot = round.snapshot();
        assert_eq!(snapshot.hands[0].bet, 200);
        assert_eq!(snapshot.hands[0].cards.len(), 3);
        assert_eq!(snapshot.hands[0].total, 21);
        assert_eq!(snapshot.results, Some(vec![Outcome::PlayerWin]));
    }

    #[test]
    fn double_after_a_hit_is_rejected_without_side_effects() {
        let mut round = stacked_round(&[Two, Three, Ten, Seven, Two, Nine], INITIAL_BET);
        round.hit().expect("hit");
        assert_eq!(round.double(), Err(RoundError::DoubleNotAllowed));

        let snapshot = round.snapshot();
        assert_eq!(snapshot.status, RoundStatus::PlayerTurn);
        assert_eq!(snapshot.hands[0].bet, INITIAL_BET);
        assert_eq!(snapshot.hands[0].cards.len(), 3);
    }

    #[test]
    fn double_above_the_ceiling_is_rejected() {
        let mut round = stacked_round(&[Five, Six, Ten, Seven, King], 600);
        assert_eq!(
            round.double(),
            Err(RoundError::BetCeilingExceeded {
                bet: 600,
                ceiling: DOUBLE_CEILING
            })
        );

        let snapshot = round.snapshot();
        assert_eq!(snapshot.status, RoundStatus::PlayerTurn);
        assert_eq!(snapshot.hands[0].bet, 600);
        assert_eq!(snapshot.hands[0].cards.len(), 2);
    }

    #[test]
    fn split_makes_two_hands_with_duplicate_bets() {
        let mut round = stacked_round(&[Eight, Eight, Ten, Seven, Two, Three], INITIAL_BET);
        round.split().expect("split");

        let snapshot = round.snapshot();
        assert_eq!(snapshot.status, RoundStatus::PlayerTurn);
        assert_eq!(snapshot.active_hand, 0);
        assert_eq!(snapshot.hands.len(), 2);
        assert_eq!(snapshot.hands[0].cards.len(), 2);
        assert_eq!(snapshot.hands[1].cards.len(), 2);
        assert_eq!(snapshot.hands[0].total, 10);
        assert_eq!(snapshot.hands[1].total, 11);
        assert_eq!(snapshot.hands[0].bet, INITIAL_BET);
        assert_eq!(snapshot.hands[1].bet, INITIAL_BET);
    }

    #[test]
    fn split_without_a_pair_is_rejected_without_side_effects() {
        let mut round = stacked_round(&[Eight, Nine, Ten, Seven], INITIAL_BET);
        assert_eq!(round.split(), Err(RoundError::SplitNotAllowed));

        let snapshot = round.snapshot();
        assert_eq!(snapshot.hands.len(), 1);
        assert_eq!(snapshot.hands[0].cards.len(), 2);
        assert_eq!(snapshot.status, RoundStatus::PlayerTurn);
    }

    #[test]
    fn split_hands_are_played_left_to_right() {
        let mut round = stacked_round(
            &[Eight, Eight, Ten, Seven, Two, Three, King, King],
            INITIAL_BET,
        );
        round.split().expect("split");

        round.hit().expect("hit first hand"); // 8 + 2 + K = 20
        assert_eq!(round.snapshot().active_hand, 0);
        round.stand().expect("stand first hand");
        assert_eq!(round.status(), RoundStatus::PlayerTurn);
        assert_eq!(round.snapshot().active_hand, 1);

        round.hit().expect("hit second hand"); // 8 + 3 + K = 21
        round.stand().expect("stand second hand");
        assert_eq!(round.status(), RoundStatus::Finished);

        let snapshot = round.snapshot();
        assert_eq!(snapshot.hands.len(), 2);
        assert!(snapshot.hands.iter().all(|h| h.bet == INITIAL_BET));
        assert_eq!(
            snapshot.results,
            Some(vec![Outcome::PlayerWin, Outcome::PlayerWin])
        );
    }

    #[test]
    fn busting_a_split_hand_moves_to_the_next_one() {
        let mut round = stacked_round(
            &[Eight, Eight, Ten, Seven, King, Two, Queen],
            INITIAL_BET,
        );
        round.split().expect("split"); // hands: 8+K = 18, 8+2 = 10
        round.hit().expect("hit first hand"); // 18 + Q busts

        assert_eq!(round.status(), RoundStatus::PlayerTurn);
        assert_eq!(round.snapshot().active_hand, 1);

        round.stand().expect("stand second hand");
        let snapshot = round.snapshot();
        assert_eq!(
            snapshot.results,
            Some(vec![Outcome::PlayerBust, Outcome::DealerWin])
        );
    }

    #[test]
    fn surrender_overrides_a_winning_total() {
        let mut round = stacked_round(&[King, Queen, Two, Five, King], INITIAL_BET);
        round.surrender().expect("surrender");
        assert_eq!(round.status(), RoundStatus::Finished);

        let snapshot = round.snapshot();
        // 20 against a dealer 17 would have won
        assert_eq!(snapshot.hands[0].total, 20);
        assert_eq!(snapshot.dealer.total, Some(17));
        assert_eq!(snapshot.results, Some(vec![Outcome::Surrender]));
        assert!(snapshot.hands[0].surrendered);
    }

    #[test]
    fn dealer_is_masked_until_the_round_leaves_player_turn() {
        let mut round = stacked_round(&[Two, Three, Ten, Seven], INITIAL_BET);

        let masked = round.snapshot();
        assert_eq!(masked.dealer.cards.len(), 2);
        assert_eq!(masked.dealer.cards[0], Some(card(Ten)));
        assert_eq!(masked.dealer.cards[1], None);
        assert_eq!(masked.dealer.total, None);

        round.stand().expect("stand");
        let revealed = round.snapshot();
        assert!(revealed.dealer.cards.iter().all(Option::is_some));
        assert_eq!(revealed.dealer.total, Some(17));
    }

    #[test]
    fn masked_snapshot_serializes_hidden_dealer_fields_as_absent() {
        let round = stacked_round(&[Two, Three, Ten, Seven], INITIAL_BET);
        let json = serde_json::to_value(round.snapshot()).expect("serialize snapshot");

        assert_eq!(json["status"], "player_turn");
        assert!(json["dealer"]["cards"][0].is_object());
        assert!(json["dealer"]["cards"][1].is_null());
        assert!(json["dealer"].get("total").is_none());
        assert!(json.get("results").is_none());
    }

    #[test]
    fn finished_snapshot_serializes_outcomes_in_snake_case() {
        let mut round = stacked_round(&[King, Queen, Ten, Seven, King], INITIAL_BET);
        round.hit().expect("hit");
        let json = serde_json::to_value(round.snapshot()).expect("serialize snapshot");

        assert_eq!(json["status"], "finished");
        assert_eq!(json["results"][0], "player_bust");
        assert!(json["dealer"]["total"].is_number());
    }
}
