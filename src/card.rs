use crate::error::{Result, SolverError};

/// A card is an integer in `[0, 52)`: `2c2d2h2s` => `0-3`, `3c3d3h3s` =>
/// `4-7`, ..., `AcAdAhAs` => `48-51`. Suit is `card & 3`, rank is
/// `card >> 2`.
pub type Card = u8;

/// A set of cards as a 52-bit mask.
pub type CardMask = u64;

pub(crate) const SUIT_CHARS: [char; 4] = ['c', 'd', 'h', 's'];
pub(crate) const RANK_CHARS: [char; 13] = [
    '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A',
];

/// Attempts to convert a rank character to a rank index.
/// `'A'` => `12`, `'K'` => `11`, ..., `'2'` => `0`.
pub fn char_to_rank(c: char) -> Result<u8> {
    match c {
        'A' | 'a' => Ok(12),
        'K' | 'k' => Ok(11),
        'Q' | 'q' => Ok(10),
        'J' | 'j' => Ok(9),
        'T' | 't' => Ok(8),
        '2'..='9' => Ok(c as u8 - b'2'),
        _ => Err(SolverError::InvalidCard(c.to_string())),
    }
}

/// Attempts to convert a suit character to a suit index.
/// `'c'` => `0`, `'d'` => `1`, `'h'` => `2`, `'s'` => `3`.
pub fn char_to_suit(c: char) -> Result<u8> {
    match c {
        'c' | 'C' => Ok(0),
        'd' | 'D' => Ok(1),
        'h' | 'H' => Ok(2),
        's' | 'S' => Ok(3),
        _ => Err(SolverError::InvalidCard(c.to_string())),
    }
}

/// Attempts to convert a card string (e.g. `"Ah"`) to a card index.
pub fn card_from_str(s: &str) -> Result<Card> {
    let mut chars = s.chars();
    let rank_char = chars
        .next()
        .ok_or_else(|| SolverError::InvalidCard(s.to_string()))?;
    let suit_char = chars
        .next()
        .ok_or_else(|| SolverError::InvalidCard(s.to_string()))?;
    if chars.next().is_some() {
        return Err(SolverError::InvalidCard(s.to_string()));
    }
    Ok((char_to_rank(rank_char)? << 2) | char_to_suit(suit_char)?)
}

/// Converts a card index to its string form (e.g. `"Ah"`).
pub fn card_to_string(card: Card) -> String {
    let rank = (card >> 2) as usize;
    let suit = (card & 3) as usize;
    format!("{}{}", RANK_CHARS[rank], SUIT_CHARS[suit])
}

/// Parses a comma-separated board string (e.g. `"Kd,Jd,Td"`) into a card
/// list. Duplicated cards are rejected.
pub fn board_from_str(s: &str) -> Result<Vec<Card>> {
    let mut board = Vec::new();
    for part in s.split(',') {
        let card = card_from_str(part.trim())?;
        if board.contains(&card) {
            return Err(SolverError::InvalidBoard(s.to_string()));
        }
        board.push(card);
    }
    Ok(board)
}

/// Returns the 52-bit mask of a single card.
#[inline]
pub fn card_mask(card: Card) -> CardMask {
    1 << card
}

/// Returns the combined mask of a card list.
#[inline]
pub fn board_mask(board: &[Card]) -> CardMask {
    board.iter().fold(0, |mask, &card| mask | card_mask(card))
}

/// Returns whether the hand overlaps the given mask.
#[inline]
pub fn hand_overlaps(hand: (Card, Card), mask: CardMask) -> bool {
    (card_mask(hand.0) | card_mask(hand.1)) & mask != 0
}

/// Returns an index of the given card pair.
///
/// `"2d2c"` => `0`, `"2h2c"` => `1`, ..., `"AsAh"` => `1325`.
#[inline]
pub(crate) fn card_pair_index(mut card1: Card, mut card2: Card) -> usize {
    if card1 > card2 {
        std::mem::swap(&mut card1, &mut card2);
    }
    card1 as usize * (101 - card1 as usize) / 2 + card2 as usize - 1
}

/// The ordered list of cards a sub-game is played with.
///
/// Cards are grouped rank-major with all four suits adjacent, which the
/// chance-node traversal and the suit-isomorphism table both rely on. The
/// position of a card in this list (its deck index) keys the per-chance
/// result slots and the abstract-deal encoding.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Builds a deck from rank and suit label lists (e.g. the rank list
    /// `"2,3,4,5,6,7,8,9,T,J,Q,K,A"` with the suit list `"c,d,h,s"`).
    /// Exactly four suits are required.
    pub fn from_labels(ranks: &str, suits: &str) -> Result<Self> {
        let rank_ids = ranks
            .split(',')
            .map(|r| char_to_rank(r.trim().chars().next().unwrap_or(' ')))
            .collect::<Result<Vec<_>>>()?;
        let mut suit_ids = suits
            .split(',')
            .map(|s| char_to_suit(s.trim().chars().next().unwrap_or(' ')))
            .collect::<Result<Vec<_>>>()?;

        if suit_ids.len() != 4 {
            return Err(SolverError::InvalidDeck(suit_ids.len()));
        }

        // keep suits adjacent in index order within each rank group; the
        // isomorphism borrow addresses sibling slots by suit offset
        suit_ids.sort_unstable();

        let mut cards = Vec::with_capacity(rank_ids.len() * 4);
        for &rank in &rank_ids {
            for &suit in &suit_ids {
                cards.push((rank << 2) | suit);
            }
        }
        Ok(Self { cards })
    }

    /// The standard 52-card deck.
    pub fn standard() -> Self {
        Self {
            cards: (0..52).collect(),
        }
    }

    /// Returns the ordered card list.
    #[inline]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Returns the number of cards in the deck.
    #[inline]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns whether the deck is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_string_round_trip() {
        for card in 0..52 {
            assert_eq!(card_from_str(&card_to_string(card)).unwrap(), card);
        }
        assert_eq!(card_from_str("Ah").unwrap(), (12 << 2) | 2);
        assert_eq!(card_from_str("2c").unwrap(), 0);
        assert!(card_from_str("Ax").is_err());
        assert!(card_from_str("A").is_err());
        assert!(card_from_str("Ahh").is_err());
    }

    #[test]
    fn board_parsing() {
        let board = board_from_str("Kd,Jd,Td").unwrap();
        assert_eq!(board.len(), 3);
        assert_eq!(board_mask(&board).count_ones(), 3);
        assert!(board_from_str("Kd,Kd").is_err());
    }

    #[test]
    fn pair_index_is_dense() {
        let mut k = 0;
        for i in 0..52 {
            for j in (i + 1)..52 {
                assert_eq!(card_pair_index(i, j), k);
                assert_eq!(card_pair_index(j, i), k);
                k += 1;
            }
        }
    }

    #[test]
    fn standard_deck_order() {
        let deck = Deck::from_labels("2,3,4,5,6,7,8,9,T,J,Q,K,A", "c,d,h,s").unwrap();
        assert_eq!(deck.cards(), Deck::standard().cards());
        assert_eq!(deck.len(), 52);
    }

    #[test]
    fn deck_requires_four_suits() {
        assert!(Deck::from_labels("2,3,4", "c,d,h").is_err());
    }
}
