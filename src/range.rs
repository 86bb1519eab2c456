use crate::card::*;
use crate::error::{Result, SolverError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

/// A player's starting range as a 13x13 weight grid.
///
/// Pairs sit on the diagonal, suited combos above it and offsuit combos
/// below it. Parsed from the conventional range syntax:
///
/// ```
/// use subgame_solver::Range;
///
/// let range = "88+,AJs-A9s,KQo:0.5".parse::<Range>().unwrap();
/// assert_eq!(range.prob_pair(10), 1.0); // QQ
/// assert_eq!(range.prob_offsuit(11, 10), 0.5); // KQo
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Range {
    grid: [[f32; 13]; 13],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suitedness {
    Suited,
    Offsuit,
    Any,
}

/// One cell of the grid: `hi >= lo`, pairs carry no suitedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ComboShape {
    hi: u8,
    lo: u8,
    suitedness: Suitedness,
}

static COMBO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<high>[AKQJT2-9])(?P<low>[AKQJT2-9])(?P<suit>[so])?$").unwrap()
});

impl ComboShape {
    fn parse(text: &str) -> Result<Self> {
        let caps = COMBO_REGEX
            .captures(text)
            .ok_or_else(|| SolverError::InvalidRange(text.to_string()))?;
        let hi = char_to_rank(caps.name("high").unwrap().as_str().chars().next().unwrap())?;
        let lo = char_to_rank(caps.name("low").unwrap().as_str().chars().next().unwrap())?;
        let suitedness = match caps.name("suit").map(|m| m.as_str()) {
            Some("s") => Suitedness::Suited,
            Some("o") => Suitedness::Offsuit,
            _ => Suitedness::Any,
        };
        if hi < lo {
            return Err(SolverError::InvalidRange(format!(
                "ranks must run high to low: {text}"
            )));
        }
        if hi == lo && suitedness != Suitedness::Any {
            return Err(SolverError::InvalidRange(format!(
                "pairs take no suitedness: {text}"
            )));
        }
        Ok(Self { hi, lo, suitedness })
    }

    #[inline]
    fn gap(&self) -> u8 {
        self.hi - self.lo
    }
}

/// Resolves a token body into the top and bottom shapes of its span.
fn combo_span(text: &str) -> Result<(ComboShape, ComboShape)> {
    if let Some((top_text, bottom_text)) = text.split_once('-') {
        let top = ComboShape::parse(top_text)?;
        let bottom = ComboShape::parse(bottom_text)?;
        if top.suitedness != bottom.suitedness {
            return Err(SolverError::InvalidRange(format!(
                "suitedness differs across the span: {text}"
            )));
        }
        if top == bottom {
            return Err(SolverError::InvalidRange(format!(
                "span endpoints are identical: {text}"
            )));
        }
        Ok((top, bottom))
    } else if let Some(bottom_text) = text.strip_suffix('+') {
        let bottom = ComboShape::parse(bottom_text)?;
        let top = match bottom.gap() {
            0 => ComboShape {
                hi: 12,
                lo: 12,
                ..bottom
            },
            1 => ComboShape {
                hi: 12,
                lo: 11,
                ..bottom
            },
            _ => ComboShape {
                lo: bottom.hi - 1,
                ..bottom
            },
        };
        Ok((top, bottom))
    } else {
        let shape = ComboShape::parse(text)?;
        Ok((shape, shape))
    }
}

impl Range {
    /// Creates an empty range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtains the weight of a specific card pair.
    pub fn prob_by_cards(&self, card1: Card, card2: Card) -> f32 {
        let (rank1, suit1) = (card1 >> 2, card1 & 3);
        let (rank2, suit2) = (card2 >> 2, card2 & 3);
        if rank1 == rank2 {
            self.prob_pair(rank1)
        } else if suit1 == suit2 {
            self.prob_suited(rank1, rank2)
        } else {
            self.prob_offsuit(rank1, rank2)
        }
    }

    /// Obtains the weight of a pair.
    pub fn prob_pair(&self, rank: u8) -> f32 {
        self.grid[rank as usize][rank as usize]
    }

    /// Obtains the weight of a suited combo.
    pub fn prob_suited(&self, rank1: u8, rank2: u8) -> f32 {
        let (hi, lo) = if rank1 > rank2 {
            (rank1, rank2)
        } else {
            (rank2, rank1)
        };
        self.grid[hi as usize][lo as usize]
    }

    /// Obtains the weight of an offsuit combo.
    pub fn prob_offsuit(&self, rank1: u8, rank2: u8) -> f32 {
        let (hi, lo) = if rank1 > rank2 {
            (rank1, rank2)
        } else {
            (rank2, rank1)
        };
        self.grid[lo as usize][hi as usize]
    }

    /// Returns whether the range has no combo with a positive weight.
    pub fn is_empty(&self) -> bool {
        self.grid.iter().all(|row| row.iter().all(|&w| w == 0.0))
    }

    /// Extracts the weighted hand list, excluding hands that overlap
    /// `dead_mask`. Hands are ordered by `(low_card, high_card)` ascending;
    /// this order defines the hand index used throughout the solver.
    pub fn hands_weights(&self, dead_mask: CardMask) -> Vec<((Card, Card), f32)> {
        let mut result = Vec::new();
        for card1 in 0..52 {
            for card2 in card1 + 1..52 {
                let weight = self.prob_by_cards(card1, card2);
                if weight > 0.0 && !hand_overlaps((card1, card2), dead_mask) {
                    result.push(((card1, card2), weight));
                }
            }
        }
        result
    }

    /// Writes one grid cell. A cell named by an earlier token is never
    /// overridden by a later one.
    fn assign(&mut self, shape: ComboShape, weight: f32, written: &mut [[bool; 13]; 13]) {
        let (hi, lo) = (shape.hi as usize, shape.lo as usize);
        if shape.suitedness != Suitedness::Offsuit && !written[hi][lo] {
            self.grid[hi][lo] = weight;
            written[hi][lo] = true;
        }
        if hi != lo && shape.suitedness != Suitedness::Suited && !written[lo][hi] {
            self.grid[lo][hi] = weight;
            written[lo][hi] = true;
        }
    }

    fn apply_token(&mut self, token: &str, written: &mut [[bool; 13]; 13]) -> Result<()> {
        let (combos, weight) = match token.split_once(':') {
            Some((combos, value)) => {
                let weight: f32 = value
                    .parse()
                    .map_err(|_| SolverError::InvalidRange(token.to_string()))?;
                (combos, weight)
            }
            None => (token, 1.0),
        };
        if !(0.0..=1.0).contains(&weight) {
            return Err(SolverError::InvalidRange(format!(
                "weight out of [0, 1]: {token}"
            )));
        }

        let (top, bottom) = combo_span(combos)?;

        // a shared high rank walks the kicker down; an equal gap slides
        // both ranks down together
        let (step_hi, step_lo) = if top == bottom {
            (0, 0)
        } else if top.hi == bottom.hi && top.lo > bottom.lo {
            (0, 1)
        } else if top.gap() == bottom.gap() && top.hi > bottom.hi {
            (1, 1)
        } else {
            return Err(SolverError::InvalidRange(combos.to_string()));
        };

        let mut cursor = top;
        loop {
            self.assign(cursor, weight, written);
            if cursor.hi == bottom.hi && cursor.lo == bottom.lo {
                break;
            }
            cursor.hi -= step_hi;
            cursor.lo -= step_lo;
        }
        Ok(())
    }
}

impl FromStr for Range {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();

        let mut range = Self::new();
        if compact.is_empty() {
            return Ok(range);
        }

        let mut tokens: Vec<&str> = compact.split(',').collect();
        // allow a single trailing comma
        if tokens.len() > 1 && tokens.last() == Some(&"") {
            tokens.pop();
        }

        let mut written = [[false; 13]; 13];
        for token in tokens {
            range.apply_token(token, &mut written)?;
        }
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_and_dash_equivalences() {
        let tests = [
            ("88+", "AA,KK,QQ,JJ,TT,99,88"),
            ("98s+", "AKs,KQs,QJs,JTs,T9s,98s"),
            ("A8o+", "AKo,AQo,AJo,ATo,A9o,A8o"),
            ("88-55", "88,77,66,55"),
            ("98s-65s", "98s,87s,76s,65s"),
            ("AQo-86o", "AQo,KJo,QTo,J9o,T8o,97o,86o"),
            ("K5-K2", "K5,K4,K3,K2"),
        ];
        for (compact, expanded) in tests {
            assert_eq!(
                compact.parse::<Range>().unwrap(),
                expanded.parse::<Range>().unwrap(),
                "{compact}"
            );
        }
    }

    #[test]
    fn rejects_malformed_tokens() {
        let tests = [
            "ak", "AKQ", "89", "AAo", "AK+-AJ", "K9s.67", "88+:2.0", "AQo:1.1", "98s-21s",
            "AQo-AQo", "AQo-86s", "K2-K5", "AK,,",
        ];
        for s in tests {
            assert!(s.parse::<Range>().is_err(), "{s}");
        }
    }

    #[test]
    fn earlier_tokens_take_precedence() {
        let range = "AA:0.5,AA".parse::<Range>().unwrap();
        assert_eq!(range.prob_pair(12), 0.5);

        let range = "AKs:0.3,AK:0.9".parse::<Range>().unwrap();
        assert_eq!(range.prob_suited(12, 11), 0.3);
        assert_eq!(range.prob_offsuit(12, 11), 0.9);
    }

    #[test]
    fn weighted_combos() {
        let range = "85s:0.5".parse::<Range>().unwrap();
        assert_eq!(range.prob_suited(6, 3), 0.5);
        assert_eq!(range.prob_suited(3, 6), 0.5);
        assert_eq!(range.prob_offsuit(6, 3), 0.0);
    }

    #[test]
    fn hands_respect_dead_cards() {
        let range = "AA".parse::<Range>().unwrap();
        let all = range.hands_weights(0);
        assert_eq!(all.len(), 6);

        let ah = card_from_str("Ah").unwrap();
        let filtered = range.hands_weights(card_mask(ah));
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|&((c1, c2), _)| c1 != ah && c2 != ah));
    }

    #[test]
    fn hand_order_is_deterministic() {
        let range = "22+".parse::<Range>().unwrap();
        let hands = range.hands_weights(0);
        for pair in hands.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }
}
