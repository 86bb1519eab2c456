use crate::card::*;
use crate::evaluator::RankEvaluator;
use crate::range_index::RangeIndex;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A hand of a player's range ranked on a specific river.
#[derive(Debug, Clone, Copy)]
pub struct RiverComb {
    /// Evaluator rank of the hand on this river (lower = stronger).
    pub rank: u32,
    /// Index of the hand in the owning player's range.
    pub reach_index: usize,
}

/// Per-(player, river board) cache of rank-sorted range combos.
///
/// Lists run from the weakest to the strongest hand so the showdown
/// two-pointer passes can sweep them monotonically; hands overlapping the
/// board are excluded. Entries are computed once and shared across the
/// parallel traversal.
#[derive(Default)]
pub struct RiverRankCache {
    caches: [RwLock<HashMap<CardMask, Arc<Vec<RiverComb>>>>; 2],
}

impl RiverRankCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sorted combo list of `player` on the given river board,
    /// computing and caching it on first use.
    pub fn combos(
        &self,
        player: usize,
        board: CardMask,
        range_index: &RangeIndex,
        evaluator: &dyn RankEvaluator,
    ) -> Arc<Vec<RiverComb>> {
        if let Some(combos) = self.caches[player].read().unwrap().get(&board) {
            return Arc::clone(combos);
        }

        let mut combos = range_index
            .hands(player)
            .iter()
            .enumerate()
            .filter(|&(_, &hand)| !hand_overlaps(hand, board))
            .map(|(reach_index, &(c1, c2))| RiverComb {
                rank: evaluator.rank(c1, c2, board),
                reach_index,
            })
            .collect::<Vec<_>>();
        combos.sort_by(|a, b| b.rank.cmp(&a.rank));

        let combos = Arc::new(combos);
        self.caches[player]
            .write()
            .unwrap()
            .entry(board)
            .or_insert_with(|| Arc::clone(&combos));
        combos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::SevenCardEvaluator;

    fn hand(s: &str) -> (Card, Card) {
        let c1 = card_from_str(&s[..2]).unwrap();
        let c2 = card_from_str(&s[2..]).unwrap();
        if c1 < c2 {
            (c1, c2)
        } else {
            (c2, c1)
        }
    }

    #[test]
    fn combos_run_weakest_to_strongest() {
        let raw = vec![
            (hand("AhAd"), 1.0),
            (hand("2c3d"), 1.0),
            (hand("9h9c"), 1.0),
        ];
        let index = RangeIndex::new([raw, Vec::new()], 0).unwrap();
        let board = board_mask(&board_from_str("Ks,7s,4s,9d,2h").unwrap());

        let cache = RiverRankCache::new();
        let combos = cache.combos(0, board, &index, &SevenCardEvaluator);

        assert_eq!(combos.len(), 3);
        for pair in combos.windows(2) {
            assert!(pair[0].rank >= pair[1].rank);
        }
        // trips of nines are the strongest, the paired deuce the weakest
        assert_eq!(combos.last().unwrap().reach_index, 2);
        assert_eq!(combos[0].reach_index, 1);
    }

    #[test]
    fn board_blockers_are_excluded() {
        let raw = vec![(hand("AhAd"), 1.0), (hand("KsKd"), 1.0)];
        let index = RangeIndex::new([raw, Vec::new()], 0).unwrap();
        let board = board_mask(&board_from_str("Ks,7s,4s,9d,2h").unwrap());

        let cache = RiverRankCache::new();
        let combos = cache.combos(0, board, &index, &SevenCardEvaluator);
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].reach_index, 0);
    }

    #[test]
    fn cached_entry_is_shared() {
        let raw = vec![(hand("AhAd"), 1.0)];
        let index = RangeIndex::new([raw, Vec::new()], 0).unwrap();
        let board = board_mask(&board_from_str("Ks,7s,4s,9d,2h").unwrap());

        let cache = RiverRankCache::new();
        let first = cache.combos(0, board, &index, &SevenCardEvaluator);
        let second = cache.combos(0, board, &index, &SevenCardEvaluator);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
