use crate::card::*;
use crate::error::Result;
use crate::isomorphism::exchange_color;
use crate::sliceop::*;
use crate::solver::{next_deal, CfrSolver};
use crate::sync_cell::SyncCell;
use crate::tree::*;
use rayon::prelude::*;

impl CfrSolver {
    /// Best-response exploitability of the current average strategy, in
    /// percent of the root pot. At an exact equilibrium the two
    /// best-response values cancel and the result is zero.
    pub fn exploitability(&self) -> Result<f32> {
        let mut total = 0.0f64;
        for player in 0..2 {
            let cfv = self.best_response_cfv(
                player,
                self.tree.root(),
                self.ranges.weights(player ^ 1),
                self.initial_board,
                0,
            )?;
            total += dot_f64(&cfv, self.ranges.weights(player));
        }

        let per_game = total / 2.0 / self.ranges.num_combinations();
        Ok((per_game / self.tree.root_pot() * 100.0) as f32)
    }

    /// Counterfactual values of a best responder holding the tree's other
    /// player to their average strategy.
    fn best_response_cfv(
        &self,
        player: usize,
        node: &GameTreeNode,
        reach: &[f32],
        board: CardMask,
        deal: usize,
    ) -> Result<Vec<f32>> {
        match node {
            GameTreeNode::Terminal(terminal) => {
                Ok(self.terminal_utility(player, terminal, reach, board, false).payoffs)
            }
            GameTreeNode::Showdown(showdown) => {
                Ok(self.showdown_utility(player, showdown, reach, board, false).payoffs)
            }
            GameTreeNode::Chance(chance) => {
                self.best_response_chance(player, chance, reach, board, deal)
            }
            GameTreeNode::Action(action) => {
                self.best_response_action(player, action, reach, board, deal)
            }
        }
    }

    fn best_response_action(
        &self,
        player: usize,
        node: &ActionNode,
        reach: &[f32],
        board: CardMask,
        deal: usize,
    ) -> Result<Vec<f32>> {
        let node_hands = self.ranges.len(node.player);
        let num_actions = node.actions.len();
        let player_hands = self.ranges.len(player);

        if node.player == player {
            // the responder takes the best action per hand
            let mut best = vec![f32::NEG_INFINITY; player_hands];
            for child in &node.children {
                let cfv = self.best_response_cfv(player, child, reach, board, deal)?;
                max_slice(&mut best, &cfv);
            }
            Ok(best)
        } else {
            // the fixed player mixes by the trained average strategy
            let average = match self.trainable_if_present(node, deal) {
                Some(guard) => guard.as_ref().unwrap().average_strategy(),
                None => vec![1.0 / num_actions as f32; num_actions * node_hands],
            };

            let mut result = vec![0.0f32; player_hands];
            for (action_id, child) in node.children.iter().enumerate() {
                let mut new_reach = reach.to_vec();
                mul_slice(&mut new_reach, chunk(&average, action_id, node_hands));
                let cfv = self.best_response_cfv(player, child, &new_reach, board, deal)?;
                add_slice(&mut result, &cfv);
            }
            Ok(result)
        }
    }

    fn best_response_chance(
        &self,
        player: usize,
        node: &ChanceNode,
        reach: &[f32],
        board: CardMask,
        deal: usize,
    ) -> Result<Vec<f32>> {
        let opponent = player ^ 1;
        let deck_len = node.cards.len();
        let possible_deals = (deck_len - board.count_ones() as usize - 2) as f32;

        let valid_cards: Vec<usize> = (0..deck_len)
            .filter(|&index| {
                let card = node.cards[index];
                board & card_mask(card) == 0 && self.iso.offset(deal, card & 3) >= 0
            })
            .collect();

        let slots: Vec<SyncCell<Vec<f32>>> = (0..deck_len).map(|_| SyncCell::default()).collect();

        valid_cards.par_iter().try_for_each(|&index| -> Result<()> {
            let card = node.cards[index];
            let dealt = card_mask(card);

            let mut new_reach = vec![0.0f32; self.ranges.len(opponent)];
            for (hand, value) in new_reach.iter_mut().enumerate() {
                let cards = self.ranges.hands(opponent)[hand];
                if !hand_overlaps(cards, dealt) {
                    *value = reach[hand] / possible_deals;
                }
            }

            let new_deal = next_deal(deal, index, deck_len)?;
            let cfv =
                self.best_response_cfv(player, &node.child, &new_reach, board | dealt, new_deal)?;
            *slots[index].open() = cfv;
            Ok(())
        })?;

        let mut result = vec![0.0f32; self.ranges.len(player)];
        for index in 0..deck_len {
            let card = node.cards[index];
            if board & card_mask(card) != 0 {
                continue;
            }

            let suit = card & 3;
            let offset = self.iso.offset(deal, suit);
            if offset < 0 {
                let canonical = (index as isize + offset as isize) as usize;
                let source = slots[canonical].open();
                if source.is_empty() {
                    continue;
                }
                let swap = self.iso.swap_list(player, suit, (suit as i8 + offset) as u8);
                let mut borrowed = source.clone();
                exchange_color(&mut borrowed, swap);
                add_slice(&mut result, &borrowed);
            } else {
                let source = slots[index].open();
                if source.is_empty() {
                    continue;
                }
                add_slice(&mut result, &source);
            }
        }

        Ok(result)
    }
}
