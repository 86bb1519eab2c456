use crate::card::*;
use crate::error::{Result, SolverError};
use crate::range_index::RangeIndex;

/// Suit-symmetry table over the current board.
///
/// Two suits are equivalent at a deal when the rank multisets of the board
/// cards carrying them are equal. `offset(deal, suit)` is `0` when the suit
/// is canonical and `-k` when the suit mirrors suit `suit - k`; a chance
/// branch dealing a non-canonical suit is skipped and its result borrowed
/// from the canonical sibling after permuting hand indices.
///
/// Deal `0` is the root; deal `i + 1` is the board extended by deck card
/// `i`. Two-card deals never reach a chance node, so they need no entry.
pub struct IsomorphismTable {
    offsets: Vec<[i8; 4]>,
    swaps: Vec<[Vec<(u16, u16)>; 2]>,
}

fn suit_hashes(board: CardMask) -> [u16; 4] {
    let mut hashes = [0u16; 4];
    for card in 0..52u8 {
        if board & card_mask(card) != 0 {
            hashes[(card & 3) as usize] |= 1 << (card >> 2);
        }
    }
    hashes
}

fn offsets_of(hashes: &[u16; 4]) -> [i8; 4] {
    let mut offsets = [0i8; 4];
    for suit in 1..4usize {
        // the canonical sibling is the first equivalent suit by ascending index
        for other in 0..suit {
            if hashes[suit] == hashes[other] {
                offsets[suit] = other as i8 - suit as i8;
                break;
            }
        }
    }
    offsets
}

#[inline]
fn swap_suit(card: Card, suit1: u8, suit2: u8) -> Card {
    let suit = card & 3;
    if suit == suit1 {
        card - suit1 + suit2
    } else if suit == suit2 {
        card + suit1 - suit2
    } else {
        card
    }
}

impl IsomorphismTable {
    /// Precomputes the offset table for the root and every one-card
    /// extension, together with the hand-swap lists of every suit pair the
    /// offsets can request. Fails if a required swap target is missing
    /// from a range.
    pub fn build(deck: &Deck, initial_board: CardMask, range_index: &RangeIndex) -> Result<Self> {
        let root_hashes = suit_hashes(initial_board);
        let mut offsets = Vec::with_capacity(deck.len() + 1);
        offsets.push(offsets_of(&root_hashes));

        for &card in deck.cards() {
            let mut hashes = root_hashes;
            hashes[(card & 3) as usize] |= 1 << (card >> 2);
            offsets.push(offsets_of(&hashes));
        }

        let mut needed = [false; 16];
        for row in &offsets {
            for suit in 1..4usize {
                if row[suit] < 0 {
                    let other = (suit as i8 + row[suit]) as usize;
                    needed[suit * 4 + other] = true;
                }
            }
        }

        let mut swaps: Vec<[Vec<(u16, u16)>; 2]> = (0..16).map(|_| Default::default()).collect();
        for suit1 in 1..4u8 {
            for suit2 in 0..suit1 {
                let key = suit1 as usize * 4 + suit2 as usize;
                if !needed[key] {
                    continue;
                }
                for player in 0..2 {
                    swaps[key][player] =
                        Self::swap_list_internal(range_index, player, suit1, suit2)?;
                }
            }
        }

        Ok(Self { offsets, swaps })
    }

    /// An all-canonical table: every branch is traversed, nothing is
    /// borrowed.
    pub fn disabled(deck_len: usize) -> Self {
        Self {
            offsets: vec![[0; 4]; deck_len + 1],
            swaps: (0..16).map(|_| Default::default()).collect(),
        }
    }

    fn swap_list_internal(
        range_index: &RangeIndex,
        player: usize,
        suit1: u8,
        suit2: u8,
    ) -> Result<Vec<(u16, u16)>> {
        let mut list = Vec::new();
        for (i, &(c1, c2)) in range_index.hands(player).iter().enumerate() {
            let m1 = swap_suit(c1, suit1, suit2);
            let m2 = swap_suit(c2, suit1, suit2);
            let j = range_index.hand_index(player, m1, m2).ok_or_else(|| {
                SolverError::MissingSwapTarget(format!(
                    "{}{}",
                    card_to_string(m1.max(m2)),
                    card_to_string(m1.min(m2))
                ))
            })?;
            if i < j {
                list.push((i as u16, j as u16));
            }
        }
        Ok(list)
    }

    /// Returns the offset of `suit` at the given deal.
    #[inline]
    pub fn offset(&self, deal: usize, suit: u8) -> i8 {
        self.offsets[deal][suit as usize]
    }

    /// Returns the hand-index swap list of an unordered suit pair.
    #[inline]
    pub fn swap_list(&self, player: usize, suit1: u8, suit2: u8) -> &[(u16, u16)] {
        let (hi, lo) = if suit1 > suit2 {
            (suit1, suit2)
        } else {
            (suit2, suit1)
        };
        &self.swaps[hi as usize * 4 + lo as usize][player]
    }
}

/// Applies a suit-swap permutation to a per-hand vector in place.
/// Applying the same swap twice restores the input bit-exactly.
#[inline]
pub fn exchange_color(values: &mut [f32], swap_list: &[(u16, u16)]) {
    for &(i, j) in swap_list {
        values.swap(i as usize, j as usize);
    }
}
