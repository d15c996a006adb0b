//! Card representation for Flip 7.
//!
//! This module provides the two leaf types of the simulator:
//! - `Card`: a single drawable token (number, modifier, doubler, second chance)
//! - `Deck`: the fixed 88-card shoe with shuffling and drawing

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest number card denomination.
pub const MAX_NUMBER: u8 = 12;

/// Point modifier denominations (one card each).
pub const MODIFIER_VALUES: [u8; 5] = [2, 4, 6, 8, 10];

/// Number of Second Chance cards in the deck.
pub const SECOND_CHANCE_COUNT: usize = 3;

/// Number of Doubler cards in the deck.
pub const DOUBLER_COUNT: usize = 1;

/// Number cards: one zero plus `i` copies of each `i` in 1..=12.
pub const NUMBER_CARD_COUNT: usize = 1 + (MAX_NUMBER as usize * (MAX_NUMBER as usize + 1)) / 2;

/// Total cards in a fresh deck.
pub const DECK_SIZE: usize =
    NUMBER_CARD_COUNT + MODIFIER_VALUES.len() + DOUBLER_COUNT + SECOND_CHANCE_COUNT;

const _: () = assert!(DECK_SIZE == 88, "a Flip 7 deck has 88 cards");

/// A single Flip 7 card.
///
/// Persisted the same way the sample files have always stored cards:
/// numbers as plain integers, `"+4"` for modifiers, `"x2"` for the doubler
/// and `"SC"` for Second Chance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawCard", into = "RawCard")]
pub enum Card {
    /// Number card worth its face value (0-12).
    Number(u8),
    /// Flat point bonus added after doubling.
    Modifier(u8),
    /// Doubles the sum of number cards.
    Doubler,
    /// Protects against one duplicate number.
    SecondChance,
}

impl Card {
    /// Whether this is a number card.
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Card::Number(_))
    }

    /// Parse a card from its token form ("7", "+4", "x2", "SC").
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "x2" => Some(Card::Doubler),
            "SC" => Some(Card::SecondChance),
            _ => {
                if let Some(value) = token.strip_prefix('+') {
                    let v: u8 = value.parse().ok()?;
                    MODIFIER_VALUES.contains(&v).then_some(Card::Modifier(v))
                } else {
                    let n: u8 = token.parse().ok()?;
                    (n <= MAX_NUMBER).then_some(Card::Number(n))
                }
            }
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Card::Number(n) => write!(f, "{}", n),
            Card::Modifier(v) => write!(f, "+{}", v),
            Card::Doubler => write!(f, "x2"),
            Card::SecondChance => write!(f, "SC"),
        }
    }
}

/// On-disk card form: either a bare integer or a token string.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCard {
    Number(u8),
    Token(String),
}

impl TryFrom<RawCard> for Card {
    type Error = String;

    fn try_from(raw: RawCard) -> Result<Self, Self::Error> {
        match raw {
            RawCard::Number(n) if n <= MAX_NUMBER => Ok(Card::Number(n)),
            RawCard::Number(n) => Err(format!("number card {} is out of range 0-{}", n, MAX_NUMBER)),
            RawCard::Token(token) => {
                Card::from_token(&token).ok_or_else(|| format!("unknown card token {:?}", token))
            }
        }
    }
}

impl From<Card> for RawCard {
    fn from(card: Card) -> Self {
        match card {
            Card::Number(n) => RawCard::Number(n),
            other => RawCard::Token(other.to_string()),
        }
    }
}

/// The full, unshuffled card list.
pub fn full_deck_cards() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);

    cards.push(Card::Number(0));
    for n in 1..=MAX_NUMBER {
        cards.extend(std::iter::repeat(Card::Number(n)).take(n as usize));
    }
    cards.extend(MODIFIER_VALUES.iter().map(|&v| Card::Modifier(v)));
    cards.extend(std::iter::repeat(Card::Doubler).take(DOUBLER_COUNT));
    cards.extend(std::iter::repeat(Card::SecondChance).take(SECOND_CHANCE_COUNT));

    cards
}

/// A single-use deck. Cards are drawn from the top until the hand ends.
#[derive(Clone, Debug)]
pub struct Deck {
    /// Remaining cards; the top of the deck is the end of the vector.
    cards: Vec<Card>,
}

impl Deck {
    /// Create a full 88-card deck in uniformly random order.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = full_deck_cards();
        cards.shuffle(rng);
        Self { cards }
    }

    /// Create a deck that deals `cards` in the given order (first element first).
    ///
    /// Used to replay or script hands; no composition check is applied.
    pub fn stacked(cards: &[Card]) -> Self {
        Self {
            cards: cards.iter().rev().copied().collect(),
        }
    }

    /// Remove and return the top card, or `None` when the deck is exhausted.
    #[inline]
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Number of cards left.
    #[inline]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether all cards have been drawn.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Count remaining cards matching `card`.
    pub fn count(&self, card: Card) -> usize {
        self.cards.iter().filter(|&&c| c == card).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_deck_composition() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let deck = Deck::new(&mut rng);
            assert_eq!(deck.len(), 88);
            assert_eq!(deck.count(Card::Number(0)), 1);
            for n in 1..=12u8 {
                assert_eq!(deck.count(Card::Number(n)), n as usize);
            }
            for v in MODIFIER_VALUES {
                assert_eq!(deck.count(Card::Modifier(v)), 1);
            }
            assert_eq!(deck.count(Card::Doubler), 1);
            assert_eq!(deck.count(Card::SecondChance), 3);
        }
    }

    #[test]
    fn test_deck_constants() {
        assert_eq!(NUMBER_CARD_COUNT, 79);
        assert_eq!(DECK_SIZE, 88);
        assert_eq!(full_deck_cards().len(), DECK_SIZE);
    }

    #[test]
    fn test_shuffle_depends_on_seed() {
        let a: Vec<Card> = {
            let mut deck = Deck::new(&mut StdRng::seed_from_u64(1));
            std::iter::from_fn(|| deck.draw()).collect()
        };
        let b: Vec<Card> = {
            let mut deck = Deck::new(&mut StdRng::seed_from_u64(1));
            std::iter::from_fn(|| deck.draw()).collect()
        };
        let c: Vec<Card> = {
            let mut deck = Deck::new(&mut StdRng::seed_from_u64(2));
            std::iter::from_fn(|| deck.draw()).collect()
        };

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_shuffle_is_roughly_uniform() {
        // Position of the single Doubler should be spread over the whole deck.
        let mut rng = StdRng::seed_from_u64(99);
        let mut top_half = 0;
        let trials = 4000;

        for _ in 0..trials {
            let mut deck = Deck::new(&mut rng);
            let position = std::iter::from_fn(|| deck.draw())
                .position(|c| c == Card::Doubler)
                .unwrap();
            if position < DECK_SIZE / 2 {
                top_half += 1;
            }
        }

        let ratio = top_half as f64 / trials as f64;
        assert!((ratio - 0.5).abs() < 0.05, "doubler in top half {:.3}", ratio);
    }

    #[test]
    fn test_draw_until_exhausted() {
        let mut deck = Deck::stacked(&[Card::Number(3), Card::Doubler]);
        assert_eq!(deck.draw(), Some(Card::Number(3)));
        assert_eq!(deck.draw(), Some(Card::Doubler));
        assert!(deck.is_empty());
        assert_eq!(deck.draw(), None);
    }

    #[test]
    fn test_card_tokens() {
        assert_eq!(Card::from_token("7"), Some(Card::Number(7)));
        assert_eq!(Card::from_token("+10"), Some(Card::Modifier(10)));
        assert_eq!(Card::from_token("x2"), Some(Card::Doubler));
        assert_eq!(Card::from_token("SC"), Some(Card::SecondChance));
        assert_eq!(Card::from_token("+3"), None);
        assert_eq!(Card::from_token("13"), None);
        assert_eq!(Card::from_token("joker"), None);

        assert_eq!(Card::Modifier(4).to_string(), "+4");
    }

    #[test]
    fn test_card_json_format() {
        let cards = vec![Card::Number(5), Card::Modifier(2), Card::Doubler, Card::SecondChance];
        let json = serde_json::to_string(&cards).unwrap();
        assert_eq!(json, r#"[5,"+2","x2","SC"]"#);

        let parsed: Vec<Card> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cards);

        assert!(serde_json::from_str::<Card>("14").is_err());
        assert!(serde_json::from_str::<Card>(r#""+5""#).is_err());
    }
}
