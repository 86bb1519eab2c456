use crate::card::*;
use crate::error::{Result, SolverError};

const ABSENT: u32 = u32::MAX;

/// Ordered per-player hand lists with cross-player index translation.
///
/// Hands overlapping the initial board are removed at construction;
/// insertion order of the surviving hands defines the per-player hand
/// index every reach/strategy/regret vector is keyed by.
pub struct RangeIndex {
    hands: [Vec<(Card, Card)>; 2],
    weights: [Vec<f32>; 2],
    same_hand_index: [Vec<u32>; 2],
    pair_lookup: [Vec<u32>; 2],
    num_combinations: f64,
}

impl RangeIndex {
    /// Builds the index from raw weighted hand lists and the initial board
    /// mask. A duplicated hand in either input list is a setup error.
    pub fn new(raw: [Vec<((Card, Card), f32)>; 2], board: CardMask) -> Result<Self> {
        let mut hands: [Vec<(Card, Card)>; 2] = Default::default();
        let mut weights: [Vec<f32>; 2] = Default::default();
        let mut pair_lookup = [vec![ABSENT; 52 * 51 / 2], vec![ABSENT; 52 * 51 / 2]];

        for player in 0..2 {
            let mut seen = vec![false; 52 * 51 / 2];
            for &((c1, c2), weight) in &raw[player] {
                let (c1, c2) = if c1 < c2 { (c1, c2) } else { (c2, c1) };
                let key = card_pair_index(c1, c2);
                if seen[key] {
                    return Err(SolverError::DuplicateHand(format!(
                        "{}{}",
                        card_to_string(c2),
                        card_to_string(c1)
                    )));
                }
                seen[key] = true;
                if !hand_overlaps((c1, c2), board) {
                    pair_lookup[player][key] = hands[player].len() as u32;
                    hands[player].push((c1, c2));
                    weights[player].push(weight);
                }
            }
        }

        let mut same_hand_index: [Vec<u32>; 2] = Default::default();
        for player in 0..2 {
            same_hand_index[player] = hands[player]
                .iter()
                .map(|&(c1, c2)| pair_lookup[player ^ 1][card_pair_index(c1, c2)])
                .collect();
        }

        let mut num_combinations = 0.0;
        for (&(c1, c2), &w1) in hands[0].iter().zip(weights[0].iter()) {
            let mask = card_mask(c1) | card_mask(c2);
            for (&hand, &w2) in hands[1].iter().zip(weights[1].iter()) {
                if !hand_overlaps(hand, mask) {
                    num_combinations += w1 as f64 * w2 as f64;
                }
            }
        }

        Ok(Self {
            hands,
            weights,
            same_hand_index,
            pair_lookup,
            num_combinations,
        })
    }

    /// Returns the ordered hand list of the given player.
    #[inline]
    pub fn hands(&self, player: usize) -> &[(Card, Card)] {
        &self.hands[player]
    }

    /// Returns the prior weight of each hand of the given player.
    #[inline]
    pub fn weights(&self, player: usize) -> &[f32] {
        &self.weights[player]
    }

    /// Returns the number of hands in the given player's range.
    #[inline]
    pub fn len(&self, player: usize) -> usize {
        self.hands[player].len()
    }

    /// Translates a hand index of `player` into the opponent's range.
    /// Returns `None` if the opponent does not hold the identical hand.
    #[inline]
    pub fn same_hand_index(&self, player: usize, hand_index: usize) -> Option<usize> {
        match self.same_hand_index[player][hand_index] {
            ABSENT => None,
            index => Some(index as usize),
        }
    }

    /// Looks up the index of a specific hand in the given player's range.
    #[inline]
    pub fn hand_index(&self, player: usize, c1: Card, c2: Card) -> Option<usize> {
        match self.pair_lookup[player][card_pair_index(c1, c2)] {
            ABSENT => None,
            index => Some(index as usize),
        }
    }

    /// Total weight over non-conflicting hand assignments; used to
    /// normalize exploitability to a per-game value.
    #[inline]
    pub fn num_combinations(&self) -> f64 {
        self.num_combinations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(s1: &str, s2: &str) -> (Card, Card) {
        let c1 = card_from_str(s1).unwrap();
        let c2 = card_from_str(s2).unwrap();
        if c1 < c2 {
            (c1, c2)
        } else {
            (c2, c1)
        }
    }

    #[test]
    fn board_overlaps_are_filtered() {
        let raw = vec![
            (hand("Ah", "Ad"), 1.0),
            (hand("Kh", "Kd"), 1.0),
            (hand("Qh", "Qd"), 1.0),
        ];
        let board = card_mask(card_from_str("Kh").unwrap());
        let index = RangeIndex::new([raw.clone(), raw], board).unwrap();
        assert_eq!(index.len(0), 2);
        assert_eq!(index.hands(0)[0], hand("Ah", "Ad"));
        assert_eq!(index.hands(0)[1], hand("Qh", "Qd"));
    }

    #[test]
    fn duplicates_are_rejected() {
        let raw = vec![(hand("Ah", "Ad"), 1.0), (hand("Ad", "Ah"), 0.5)];
        assert!(RangeIndex::new([raw, Vec::new()], 0).is_err());
    }

    #[test]
    fn cross_player_translation() {
        let p0 = vec![(hand("Ah", "Ad"), 1.0), (hand("Kh", "Kd"), 1.0)];
        let p1 = vec![(hand("Kh", "Kd"), 1.0), (hand("Qh", "Qd"), 1.0)];
        let index = RangeIndex::new([p0, p1], 0).unwrap();

        assert_eq!(index.same_hand_index(0, 0), None);
        assert_eq!(index.same_hand_index(0, 1), Some(0));
        assert_eq!(index.same_hand_index(1, 0), Some(1));
        assert_eq!(index.same_hand_index(1, 1), None);
    }

    #[test]
    fn combination_count_excludes_blockers() {
        let p0 = vec![(hand("Ah", "Ad"), 1.0), (hand("Ah", "As"), 1.0)];
        let p1 = vec![(hand("Ah", "Ac"), 1.0), (hand("Kh", "Kd"), 1.0)];
        let index = RangeIndex::new([p0, p1], 0).unwrap();
        // both p0 hands block AhAc, neither blocks KhKd
        assert_eq!(index.num_combinations(), 2.0);
    }
}
