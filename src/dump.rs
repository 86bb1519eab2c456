use crate::card::*;
use crate::error::Result;
use crate::solver::{next_deal, CfrSolver};
use crate::tree::*;
use serde_json::{Map, Value};

/// Rounds to `decimals` places, rendering whole numbers as integers.
fn rounded(value: f32, decimals: i32) -> Value {
    let factor = 10f64.powi(decimals);
    let v = (value as f64 * factor).round() / factor;
    if v == v.trunc() {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}

#[inline]
fn swap_card(card: Card, suit1: u8, suit2: u8) -> Card {
    let suit = card & 3;
    if suit == suit1 {
        card - suit1 + suit2
    } else if suit == suit2 {
        card + suit1 - suit2
    } else {
        card
    }
}

impl CfrSolver {
    fn hand_string(&self, player: usize, hand: usize) -> String {
        let (c1, c2) = self.ranges.hands(player)[hand];
        format!("{}{}", card_to_string(c2), card_to_string(c1))
    }

    /// Permutes per-hand rows by the accumulated suit exchanges.
    fn apply_exchanges<T>(&self, player: usize, rows: &mut [T], exchanges: &[(u8, u8)]) {
        for &(suit1, suit2) in exchanges {
            for &(i, j) in self.iso.swap_list(player, suit1, suit2) {
                rows.swap(i as usize, j as usize);
            }
        }
    }

    /// Emits the trained strategy tree as recursive JSON, keyed by action
    /// and chance-card labels. Only canonical chance branches are walked;
    /// isomorphic siblings are synthesized by permuting hand rows and
    /// card labels. `dump_rounds` bounds how many chance levels deep the
    /// emission goes.
    pub fn dump_strategy(&self, dump_rounds: usize) -> Result<Value> {
        let reach = [
            self.ranges.weights(0).to_vec(),
            self.ranges.weights(1).to_vec(),
        ];
        let value = self.dump_node(
            self.tree.root(),
            0,
            dump_rounds,
            self.initial_board,
            0,
            &[],
            &reach,
        )?;
        Ok(value.unwrap_or(Value::Null))
    }

    fn dump_node(
        &self,
        node: &GameTreeNode,
        depth: usize,
        max_depth: usize,
        board: CardMask,
        deal: usize,
        exchanges: &[(u8, u8)],
        reach: &[Vec<f32>; 2],
    ) -> Result<Option<Value>> {
        if depth >= max_depth {
            return Ok(None);
        }
        match node {
            GameTreeNode::Action(action) => {
                self.dump_action(action, depth, max_depth, board, deal, exchanges, reach)
            }
            GameTreeNode::Chance(chance) => {
                self.dump_chance(chance, depth, max_depth, board, deal, exchanges, reach)
            }
            _ => Ok(None),
        }
    }

    fn dump_action(
        &self,
        node: &ActionNode,
        depth: usize,
        max_depth: usize,
        board: CardMask,
        deal: usize,
        exchanges: &[(u8, u8)],
        reach: &[Vec<f32>; 2],
    ) -> Result<Option<Value>> {
        let player = node.player;
        let node_hands = self.ranges.len(player);
        let num_actions = node.actions.len();
        let actions_str: Vec<String> = node.actions.iter().map(|a| a.to_string()).collect();

        let average = self
            .trainable_if_present(node, deal)
            .map(|guard| guard.as_ref().unwrap().average_strategy());

        let mut retval = Map::new();
        retval.insert("actions".to_string(), actions_str.clone().into());
        retval.insert("player".to_string(), player.into());

        let mut childrens = Map::new();
        for (action_id, child) in node.children.iter().enumerate() {
            let mut new_reach = reach.clone();
            if let Some(average) = &average {
                for (hand, value) in new_reach[player].iter_mut().enumerate() {
                    *value *= average[action_id * node_hands + hand];
                }
            }
            if let Some(value) = self.dump_node(
                child,
                depth,
                max_depth,
                board,
                deal,
                exchanges,
                &new_reach,
            )? {
                childrens.insert(node.actions[action_id].to_string(), value);
            }
        }
        if !childrens.is_empty() {
            retval.insert("childrens".to_string(), childrens.into());
        }

        if let Some(guard) = self.trainable_if_present(node, deal) {
            let trainable = guard.as_ref().unwrap();

            let average = trainable.average_strategy();
            let mut strategy_rows: Vec<Vec<f32>> = (0..node_hands)
                .map(|hand| {
                    (0..num_actions)
                        .map(|action_id| average[action_id * node_hands + hand])
                        .collect()
                })
                .collect();
            let mut ev_rows: Vec<Vec<f32>> = (0..node_hands)
                .map(|hand| {
                    (0..num_actions)
                        .map(|action_id| trainable.evs()[action_id * node_hands + hand])
                        .collect()
                })
                .collect();
            self.apply_exchanges(player, &mut strategy_rows, exchanges);
            self.apply_exchanges(player, &mut ev_rows, exchanges);

            let mut strategy_map = Map::new();
            let mut ev_map = Map::new();
            for hand in 0..node_hands {
                let key = self.hand_string(player, hand);
                strategy_map.insert(
                    key.clone(),
                    strategy_rows[hand].iter().map(|&p| rounded(p, 3)).collect(),
                );
                ev_map.insert(
                    key,
                    ev_rows[hand].iter().map(|&v| rounded(v, 2)).collect(),
                );
            }

            let mut strategy_json = Map::new();
            strategy_json.insert("actions".to_string(), actions_str.clone().into());
            strategy_json.insert("strategy".to_string(), strategy_map.into());
            retval.insert("strategy".to_string(), strategy_json.into());

            let mut evs_json = Map::new();
            evs_json.insert("actions".to_string(), actions_str.clone().into());
            evs_json.insert("evs".to_string(), ev_map.into());
            retval.insert("evs".to_string(), evs_json.into());

            if self.options.enable_equity {
                let mut equity_rows: Vec<Vec<f32>> = (0..node_hands)
                    .map(|hand| {
                        (0..num_actions)
                            .map(|action_id| trainable.equities()[action_id * node_hands + hand])
                            .collect()
                    })
                    .collect();
                self.apply_exchanges(player, &mut equity_rows, exchanges);

                let mut equity_map = Map::new();
                for hand in 0..node_hands {
                    equity_map.insert(
                        self.hand_string(player, hand),
                        equity_rows[hand].iter().map(|&e| rounded(e, 3)).collect(),
                    );
                }
                let mut equities_json = Map::new();
                equities_json.insert("actions".to_string(), actions_str.into());
                equities_json.insert("equities".to_string(), equity_map.into());
                retval.insert("equities".to_string(), equities_json.into());
            }

            if self.options.enable_range {
                let mut ranges_json = Map::new();
                ranges_json.insert("player".to_string(), player.into());
                for (range_player, key) in [(PLAYER_IP, "ip_range"), (PLAYER_OOP, "oop_range")] {
                    let mut probs = reach[range_player].clone();
                    self.apply_exchanges(range_player, &mut probs, exchanges);
                    let mut range_map = Map::new();
                    for (hand, &prob) in probs.iter().enumerate() {
                        // entries rounding to zero are elided
                        if (prob as f64 * 1000.0).round() > 0.0 {
                            range_map
                                .insert(self.hand_string(range_player, hand), rounded(prob, 3));
                        }
                    }
                    ranges_json.insert(key.to_string(), range_map.into());
                }
                retval.insert("ranges".to_string(), ranges_json.into());
            }
        }

        retval.insert("node_type".to_string(), "action_node".into());
        Ok(Some(retval.into()))
    }

    fn dump_chance(
        &self,
        node: &ChanceNode,
        depth: usize,
        max_depth: usize,
        board: CardMask,
        deal: usize,
        exchanges: &[(u8, u8)],
        reach: &[Vec<f32>; 2],
    ) -> Result<Option<Value>> {
        let deck_len = node.cards.len();
        let mut dealcards = Map::new();

        for index in 0..deck_len {
            let card = node.cards[index];
            if board & card_mask(card) != 0 {
                continue;
            }

            let suit = card & 3;
            let offset = self.iso.offset(deal, suit);

            let (canonical_index, child_exchanges) = if offset < 0 {
                let mut extended = exchanges.to_vec();
                extended.push((suit, (suit as i8 + offset) as u8));
                ((index as isize + offset as isize) as usize, extended)
            } else {
                (index, exchanges.to_vec())
            };

            let new_deal = next_deal(deal, canonical_index, deck_len)?;

            // the label wears the parent's exchanges; the child applies
            // its own on top
            let mut label_card = card;
            for &(suit1, suit2) in exchanges {
                label_card = swap_card(label_card, suit1, suit2);
            }

            let dealt = card_mask(node.cards[canonical_index]);
            let mut new_reach = reach.clone();
            for (range_player, probs) in new_reach.iter_mut().enumerate() {
                for (hand, value) in probs.iter_mut().enumerate() {
                    if hand_overlaps(self.ranges.hands(range_player)[hand], dealt) {
                        *value = 0.0;
                    }
                }
            }

            if let Some(value) = self.dump_node(
                &node.child,
                depth + 1,
                max_depth,
                board | dealt,
                new_deal,
                &child_exchanges,
                &new_reach,
            )? {
                dealcards.insert(card_to_string(label_card), value);
            }
        }

        let mut retval = Map::new();
        retval.insert("deal_number".to_string(), dealcards.len().into());
        if !dealcards.is_empty() {
            retval.insert("dealcards".to_string(), dealcards.into());
        }
        retval.insert("node_type".to_string(), "chance_node".into());
        Ok(Some(retval.into()))
    }
}
