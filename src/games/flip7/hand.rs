//! Single-hand simulation.
//!
//! A hand is one player's turn: draw cards until the threshold strategy says
//! stand, the hand busts on a duplicate number, or seven cards are held.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::card::{Card, Deck};

/// Maximum cards in a hand.
pub const MAX_HAND_SIZE: usize = 7;

/// Bonus for completing a seven-card hand without busting.
pub const FLIP_SEVEN_BONUS: u32 = 15;

/// Hands per seeded stream in [`simulate_batch`].
const HANDS_PER_STREAM: usize = 1024;

/// Where a hand is in its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    /// Still drawing.
    Drawing,
    /// Stood voluntarily (or ran out of deck).
    Standing,
    /// Drew a duplicate number without protection.
    Busted,
    /// Stood with exactly seven cards and no bust.
    FlipSeven,
}

impl TurnState {
    /// Whether the turn is over.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnState::Drawing)
    }
}

/// Cards accumulated during one turn.
///
/// The held Second Chance card is kept in the card log, so it counts toward
/// the seven-card cap like any other non-number card.
#[derive(Clone, Debug)]
pub struct Hand {
    cards: Vec<Card>,
    holds_second_chance: bool,
    state: TurnState,
}

impl Default for Hand {
    fn default() -> Self {
        Self::new()
    }
}

impl Hand {
    /// Create an empty hand.
    pub fn new() -> Self {
        Self {
            cards: Vec::with_capacity(MAX_HAND_SIZE),
            holds_second_chance: false,
            state: TurnState::Drawing,
        }
    }

    /// Cards in draw order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards held.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether no cards are held.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Whether a Second Chance token is currently held.
    pub fn holds_second_chance(&self) -> bool {
        self.holds_second_chance
    }

    /// Whether the hand has busted.
    pub fn is_bust(&self) -> bool {
        self.state == TurnState::Busted
    }

    /// Current turn state.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Whether a number card of this denomination is already held.
    fn holds_number(&self, n: u8) -> bool {
        self.cards.contains(&Card::Number(n))
    }

    /// Apply one drawn card.
    pub fn receive(&mut self, card: Card) {
        debug_assert_eq!(self.state, TurnState::Drawing, "hand already finished");

        match card {
            Card::SecondChance => {
                // At most one token is ever held; extras are discarded.
                if !self.holds_second_chance {
                    self.holds_second_chance = true;
                    self.cards.push(card);
                }
            }
            Card::Number(n) if self.holds_number(n) => {
                if self.holds_second_chance {
                    // Spend the token; the duplicate is discarded with it.
                    self.holds_second_chance = false;
                    if let Some(pos) = self.cards.iter().position(|&c| c == Card::SecondChance) {
                        self.cards.remove(pos);
                    }
                } else {
                    self.cards.push(card);
                    self.state = TurnState::Busted;
                }
            }
            _ => self.cards.push(card),
        }
    }

    /// Whether the threshold strategy keeps drawing.
    ///
    /// Holding a Second Chance always means drawing again.
    pub fn wants_card(&self, threshold: u32) -> bool {
        self.state == TurnState::Drawing
            && self.cards.len() < MAX_HAND_SIZE
            && (self.holds_second_chance || self.score() < threshold)
    }

    /// End the turn voluntarily.
    pub fn stand(&mut self) {
        if self.state == TurnState::Drawing {
            self.state = if self.cards.len() == MAX_HAND_SIZE {
                TurnState::FlipSeven
            } else {
                TurnState::Standing
            };
        }
    }

    /// Score the hand.
    pub fn score(&self) -> u32 {
        score_cards(&self.cards, self.is_bust())
    }

    /// Convert a finished hand into its record.
    pub fn into_record(self) -> SimulationRecord {
        let total_value = self.score();
        SimulationRecord {
            is_bust: self.is_bust(),
            is_flip_seven_bonus: self.state == TurnState::FlipSeven,
            total_value,
            cards: self.cards,
        }
    }
}

/// Score a card list.
///
/// Number cards are summed and doubled by a Doubler, modifiers are added
/// after doubling, and a full seven-card hand earns the Flip 7 bonus.
/// A bust scores zero.
pub fn score_cards(cards: &[Card], is_bust: bool) -> u32 {
    if is_bust {
        return 0;
    }

    let mut base = 0u32;
    let mut modifiers = 0u32;
    let mut doubled = false;

    for card in cards {
        match *card {
            Card::Number(n) => base += n as u32,
            Card::Modifier(v) => modifiers += v as u32,
            Card::Doubler => doubled = true,
            Card::SecondChance => {}
        }
    }

    let mut score = if doubled { base * 2 } else { base };
    score += modifiers;
    if cards.len() == MAX_HAND_SIZE {
        score += FLIP_SEVEN_BONUS;
    }
    score
}

/// Outcome of one simulated hand.
///
/// Field names match the JSON lines written by the sample store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRecord {
    /// Cards held at the end of the turn (including a bust duplicate).
    pub cards: Vec<Card>,
    /// Whether the hand busted.
    pub is_bust: bool,
    /// Final score for the turn.
    pub total_value: u32,
    /// Whether seven cards were completed without busting.
    pub is_flip_seven_bonus: bool,
}

/// Play one hand from `deck` with the "hit until score >= threshold" strategy.
pub fn play_hand(deck: &mut Deck, threshold: u32) -> SimulationRecord {
    let mut hand = Hand::new();

    while hand.wants_card(threshold) {
        match deck.draw() {
            Some(card) => hand.receive(card),
            None => {
                log::debug!("deck exhausted after {} cards, standing", hand.len());
                break;
            }
        }
    }

    hand.stand();
    hand.into_record()
}

/// Play one hand from a freshly shuffled deck.
pub fn simulate_hand<R: Rng + ?Sized>(threshold: u32, rng: &mut R) -> SimulationRecord {
    let mut deck = Deck::new(rng);
    play_hand(&mut deck, threshold)
}

/// Simulate `n` independent hands at `threshold` in parallel.
///
/// Hands are split into fixed-size streams seeded from `seed` and the stream
/// index, so the output is identical for a given seed on any thread count.
pub fn simulate_batch(threshold: u32, n: usize, seed: u64) -> Vec<SimulationRecord> {
    let streams = n.div_ceil(HANDS_PER_STREAM);

    (0..streams)
        .into_par_iter()
        .flat_map_iter(|stream| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(stream as u64));
            let start = stream * HANDS_PER_STREAM;
            let count = HANDS_PER_STREAM.min(n - start);
            (0..count)
                .map(|_| simulate_hand(threshold, &mut rng))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: u8) -> Card {
        Card::Number(v)
    }

    #[test]
    fn test_scoring_examples() {
        assert_eq!(score_cards(&[n(3), n(5), Card::Modifier(4)], false), 12);
        assert_eq!(score_cards(&[n(3), n(5), Card::Doubler], false), 16);
        assert_eq!(score_cards(&[n(3), n(5), Card::Doubler, Card::Modifier(4)], false), 20);
        assert_eq!(score_cards(&[n(3), Card::SecondChance], false), 3);
    }

    #[test]
    fn test_seven_card_bonus() {
        let cards = [n(1), n(2), n(3), n(4), n(5), n(6), n(7)];
        assert_eq!(score_cards(&cards, false), 28 + 15);

        let cards = [n(1), n(2), n(3), n(4), n(5), Card::Doubler, Card::Modifier(2)];
        assert_eq!(score_cards(&cards, false), 15 * 2 + 2 + 15);
    }

    #[test]
    fn test_bust_scores_zero() {
        assert_eq!(score_cards(&[n(12), n(11), Card::Doubler, n(12)], true), 0);
        assert_eq!(score_cards(&[], true), 0);
    }

    #[test]
    fn test_stand_at_threshold() {
        let mut deck = Deck::stacked(&[n(8), n(9), n(10), n(11)]);
        let record = play_hand(&mut deck, 15);

        assert_eq!(record.cards, vec![n(8), n(9)]);
        assert_eq!(record.total_value, 17);
        assert!(!record.is_bust);
        assert!(!record.is_flip_seven_bonus);
        assert_eq!(deck.len(), 2);
    }

    #[test]
    fn test_threshold_zero_never_draws() {
        let mut deck = Deck::stacked(&[n(8)]);
        let record = play_hand(&mut deck, 0);

        assert!(record.cards.is_empty());
        assert_eq!(record.total_value, 0);
        assert_eq!(deck.len(), 1);
    }

    #[test]
    fn test_duplicate_busts() {
        let mut deck = Deck::stacked(&[n(7), Card::Doubler, n(7), n(2)]);
        let record = play_hand(&mut deck, 100);

        assert!(record.is_bust);
        assert_eq!(record.total_value, 0);
        assert_eq!(record.cards, vec![n(7), Card::Doubler, n(7)]);
    }

    #[test]
    fn test_second_chance_save() {
        let mut deck = Deck::stacked(&[n(5), Card::SecondChance, n(5), n(9)]);
        let record = play_hand(&mut deck, 14);

        assert!(!record.is_bust);
        assert_eq!(record.cards, vec![n(5), n(9)]);
        assert_eq!(record.total_value, 14);
    }

    #[test]
    fn test_second_chance_forces_draw() {
        // Score 12 already meets the threshold, but the held token keeps drawing.
        let mut deck = Deck::stacked(&[Card::SecondChance, n(12), n(1), n(12), n(3)]);
        let record = play_hand(&mut deck, 10);

        assert_eq!(record.cards, vec![n(12), n(1)]);
        assert_eq!(record.total_value, 13);
        assert_eq!(deck.len(), 1);
    }

    #[test]
    fn test_extra_second_chance_discarded() {
        let mut hand = Hand::new();
        hand.receive(Card::SecondChance);
        hand.receive(Card::SecondChance);

        assert_eq!(hand.cards(), &[Card::SecondChance]);
        assert!(hand.holds_second_chance());
    }

    #[test]
    fn test_flip_seven() {
        let cards = [n(1), n(2), n(3), n(4), n(5), n(6), n(7), n(8)];
        let mut deck = Deck::stacked(&cards);
        let record = play_hand(&mut deck, 100);

        assert_eq!(record.cards.len(), 7);
        assert!(record.is_flip_seven_bonus);
        assert!(!record.is_bust);
        assert_eq!(record.total_value, 28 + 15);
    }

    #[test]
    fn test_held_second_chance_counts_toward_seven() {
        let cards = [Card::SecondChance, n(1), n(2), n(3), n(4), n(5), n(6), n(7)];
        let mut deck = Deck::stacked(&cards);
        let record = play_hand(&mut deck, 100);

        assert_eq!(record.cards.len(), 7);
        assert!(record.is_flip_seven_bonus);
        assert_eq!(record.total_value, 21 + 15);
    }

    #[test]
    fn test_exhausted_deck_stands() {
        let mut deck = Deck::stacked(&[n(2), n(3)]);
        let record = play_hand(&mut deck, 100);

        assert_eq!(record.cards, vec![n(2), n(3)]);
        assert_eq!(record.total_value, 5);
        assert!(!record.is_bust);
    }

    #[test]
    fn test_random_hand_invariants() {
        let mut rng = StdRng::seed_from_u64(42);

        for threshold in (0..=100).step_by(5) {
            for _ in 0..500 {
                let record = simulate_hand(threshold, &mut rng);
                assert!(record.cards.len() <= MAX_HAND_SIZE);
                assert!(!(record.is_bust && record.is_flip_seven_bonus));
                if record.is_bust {
                    assert_eq!(record.total_value, 0);
                } else {
                    assert_eq!(record.total_value, score_cards(&record.cards, false));
                    assert!(record.total_value >= threshold || record.cards.len() == MAX_HAND_SIZE);
                }
            }
        }
    }

    #[test]
    fn test_batch_is_deterministic() {
        let a = simulate_batch(25, 3000, 11);
        let b = simulate_batch(25, 3000, 11);

        assert_eq!(a.len(), 3000);
        assert_eq!(a, b);
        assert!(simulate_batch(25, 0, 11).is_empty());
    }

    #[test]
    fn test_record_json_fields() {
        let record = SimulationRecord {
            cards: vec![n(4), Card::Modifier(6)],
            is_bust: false,
            total_value: 10,
            is_flip_seven_bonus: false,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"cards":[4,"+6"],"is_bust":false,"total_value":10,"is_flip_seven_bonus":false}"#
        );
    }
}
