use crate::card::*;
use crate::error::{Result, SolverError};
use crate::evaluator::RankEvaluator;
use crate::isomorphism::{exchange_color, IsomorphismTable};
use crate::range_index::RangeIndex;
use crate::river_ranks::RiverRankCache;
use crate::sliceop::*;
use crate::sync_cell::{SyncCell, SyncCellGuard};
use crate::trainable::{DcfrParams, DcfrTrainable};
use crate::tree::*;
use rand::Rng;
use rayon::prelude::*;
use serde_json::json;
use std::io::{BufWriter, Write};
use std::str::FromStr;
use std::time::Instant;

/// Trainer selection. Only Discounted CFR is implemented; `cfr_plus` is a
/// recognized name that fails at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    DiscountedCfr,
    CfrPlus,
}

impl FromStr for Algorithm {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "discounted_cfr" => Ok(Self::DiscountedCfr),
            "cfr_plus" => Ok(Self::CfrPlus),
            other => Err(SolverError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Knobs of the training driver.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    pub iteration_number: usize,
    /// Exploitability probe and EV-recording cadence, in iterations.
    pub print_interval: usize,
    /// Iterations of sampled warmup before full traversal.
    pub warmup: usize,
    /// Stop once exploitability (percent of pot) falls below this.
    pub accuracy: f32,
    pub algorithm: Algorithm,
    pub use_isomorphism: bool,
    /// `-1` uses hardware concurrency; a positive value builds a dedicated
    /// pool of that size.
    pub threads: i32,
    pub enable_equity: bool,
    pub enable_range: bool,
    pub log_file: Option<String>,
    pub dcfr: DcfrParams,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            iteration_number: 100,
            print_interval: 10,
            warmup: 0,
            accuracy: 0.0,
            algorithm: Algorithm::DiscountedCfr,
            use_isomorphism: false,
            threads: -1,
            enable_equity: false,
            enable_range: false,
            log_file: None,
            dcfr: DcfrParams::default(),
        }
    }
}

/// Result of one recursive CFR evaluation: counterfactual values per hand
/// of the traversing player, plus counterfactual equity when enabled.
#[derive(Default, Clone)]
pub(crate) struct CfrOutcome {
    pub(crate) payoffs: Vec<f32>,
    pub(crate) equity: Vec<f32>,
}

/// Parallel Discounted-CFR solver over a fixed public game tree.
pub struct CfrSolver {
    pub(crate) tree: GameTree,
    pub(crate) deck: Deck,
    pub(crate) ranges: RangeIndex,
    pub(crate) evaluator: Box<dyn RankEvaluator>,
    pub(crate) river_ranks: RiverRankCache,
    pub(crate) iso: IsomorphismTable,
    pub(crate) initial_board: CardMask,
    pub(crate) options: SolverOptions,
}

impl CfrSolver {
    /// Sets up a solver: deduplicates and board-filters the ranges, builds
    /// the isomorphism table, and validates the configuration.
    pub fn new(
        tree: GameTree,
        deck: Deck,
        raw_ranges: [Vec<((Card, Card), f32)>; 2],
        initial_board: &[Card],
        evaluator: Box<dyn RankEvaluator>,
        options: SolverOptions,
    ) -> Result<Self> {
        if options.algorithm == Algorithm::CfrPlus {
            return Err(SolverError::Unsupported(
                "cfr_plus trainable is declared but its update rule is not implemented",
            ));
        }
        if options.print_interval == 0 {
            return Err(SolverError::Unsupported("print_interval must be positive"));
        }

        let board = board_mask(initial_board);
        let ranges = RangeIndex::new(raw_ranges, board)?;
        if ranges.num_combinations() == 0.0 {
            return Err(SolverError::InvalidRange(
                "no non-conflicting hand assignment exists".to_string(),
            ));
        }
        let iso = if options.use_isomorphism {
            IsomorphismTable::build(&deck, board, &ranges)?
        } else {
            IsomorphismTable::disabled(deck.len())
        };

        Ok(Self {
            tree,
            deck,
            ranges,
            evaluator,
            river_ranks: RiverRankCache::new(),
            iso,
            initial_board: board,
            options,
        })
    }

    #[inline]
    pub fn tree(&self) -> &GameTree {
        &self.tree
    }

    #[inline]
    pub fn ranges(&self) -> &RangeIndex {
        &self.ranges
    }

    /// Runs the training loop and returns the last measured
    /// exploitability in percent of the pot.
    pub fn train(&self) -> Result<f32> {
        match self.options.threads {
            n if n > 0 => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n as usize)
                    .build()?;
                pool.install(|| self.train_inner())
            }
            _ => self.train_inner(),
        }
    }

    fn train_inner(&self) -> Result<f32> {
        let reach = [self.ranges.weights(0), self.ranges.weights(1)];

        let mut log_writer = match &self.options.log_file {
            Some(path) => Some(BufWriter::new(std::fs::File::create(path)?)),
            None => None,
        };

        let initial = self.exploitability()?;
        println!("initial exploitability: {initial:.4}% of the pot");

        let begin = Instant::now();
        let mut exploitability = f32::INFINITY;

        for iter in 0..self.options.iteration_number {
            for player in 0..2 {
                self.cfr(
                    player,
                    self.tree.root(),
                    reach[player ^ 1],
                    iter,
                    self.initial_board,
                    0,
                )?;
            }

            if iter % self.options.print_interval == 0 && iter != 0 && iter >= self.options.warmup {
                exploitability = self.exploitability()?;
                let time_ms = begin.elapsed().as_millis() as u64;
                println!(
                    "iteration {iter}: exploitability {exploitability:.4}% ({time_ms} ms)"
                );
                if let Some(writer) = log_writer.as_mut() {
                    let line = json!({
                        "iteration": iter,
                        "exploitibility": exploitability,
                        "time_ms": time_ms,
                    });
                    writeln!(writer, "{line}")?;
                }
                if exploitability <= self.options.accuracy {
                    break;
                }
            }
        }

        if let Some(writer) = log_writer.as_mut() {
            writer.flush()?;
        }

        Ok(exploitability)
    }

    /// One recursive evaluation. `reach` is the opponent's reach vector;
    /// the return holds counterfactual values for every hand of `player`.
    pub(crate) fn cfr(
        &self,
        player: usize,
        node: &GameTreeNode,
        reach: &[f32],
        iter: usize,
        board: CardMask,
        deal: usize,
    ) -> Result<CfrOutcome> {
        match node {
            GameTreeNode::Action(action) => {
                self.action_utility(player, action, reach, iter, board, deal)
            }
            GameTreeNode::Chance(chance) => {
                self.chance_utility(player, chance, reach, iter, board, deal)
            }
            GameTreeNode::Terminal(terminal) => Ok(self.terminal_utility(
                player,
                terminal,
                reach,
                board,
                self.options.enable_equity,
            )),
            GameTreeNode::Showdown(showdown) => Ok(self.showdown_utility(
                player,
                showdown,
                reach,
                board,
                self.options.enable_equity,
            )),
        }
    }

    /// Opens the trainable slot of `(node, deal)`, creating the trainable
    /// on first touch.
    pub(crate) fn trainable<'a>(
        &self,
        node: &'a ActionNode,
        deal: usize,
    ) -> Result<SyncCellGuard<'a, Option<Box<DcfrTrainable>>>> {
        let slot = node
            .trainables
            .get(deal)
            .ok_or(SolverError::DealOutOfRange {
                deal,
                limit: node.num_deals(),
            })?;
        let mut guard = slot.open();
        if guard.is_none() {
            *guard = Some(Box::new(DcfrTrainable::new(
                node.actions.len(),
                self.ranges.len(node.player),
            )));
        }
        Ok(guard)
    }

    /// Opens the trainable slot without creating it.
    pub(crate) fn trainable_if_present<'a>(
        &self,
        node: &'a ActionNode,
        deal: usize,
    ) -> Option<SyncCellGuard<'a, Option<Box<DcfrTrainable>>>> {
        let guard = node.trainables.get(deal)?.open();
        if guard.is_none() {
            return None;
        }
        Some(guard)
    }

    fn action_utility(
        &self,
        player: usize,
        node: &ActionNode,
        reach: &[f32],
        iter: usize,
        board: CardMask,
        deal: usize,
    ) -> Result<CfrOutcome> {
        let node_player = node.player;
        let num_actions = node.actions.len();
        let node_hands = self.ranges.len(node_player);
        let player_hands = self.ranges.len(player);
        let enable_equity = self.options.enable_equity;

        let strategy = {
            let guard = self.trainable(node, deal)?;
            guard.as_ref().unwrap().current_strategy()
        };
        debug_assert_eq!(strategy.len(), num_actions * node_hands);

        let mut results = Vec::with_capacity(num_actions);
        for (action_id, child) in node.children.iter().enumerate() {
            let outcome = if node_player != player {
                let mut new_reach = reach.to_vec();
                mul_slice(&mut new_reach, chunk(&strategy, action_id, node_hands));
                self.cfr(player, child, &new_reach, iter, board, deal)?
            } else {
                self.cfr(player, child, reach, iter, board, deal)?
            };
            results.push(outcome);
        }

        let mut payoffs = vec![0.0f32; player_hands];
        let mut total_equity = if enable_equity {
            vec![0.0f32; player_hands]
        } else {
            Vec::new()
        };

        for (action_id, result) in results.iter().enumerate() {
            if result.payoffs.is_empty() {
                continue;
            }
            if node_player == player {
                let sigma = chunk(&strategy, action_id, node_hands);
                add_weighted(&mut payoffs, sigma, &result.payoffs);
                if enable_equity && !result.equity.is_empty() {
                    add_weighted(&mut total_equity, sigma, &result.equity);
                }
            } else {
                add_slice(&mut payoffs, &result.payoffs);
                if enable_equity && !result.equity.is_empty() {
                    add_slice(&mut total_equity, &result.equity);
                }
            }
        }

        if node_player == player {
            let mut regrets = vec![0.0f32; num_actions * player_hands];
            for (action_id, result) in results.iter().enumerate() {
                let row = chunk_mut(&mut regrets, action_id, player_hands);
                row.copy_from_slice(&result.payoffs);
                sub_slice(row, &payoffs);
            }

            let warmup = self.options.warmup;
            if iter > warmup {
                let mut guard = self.trainable(node, deal)?;
                guard
                    .as_mut()
                    .unwrap()
                    .update_regrets(&regrets, iter + 1, &self.options.dcfr)?;
            } else if iter == warmup {
                // warmup boundary: update the first deal of the suit class
                // and synchronize the rest from it
                let class = self.suit_class_deals(deal);
                let mut standard: Option<usize> = None;
                for one_deal in class {
                    match standard {
                        None => {
                            let mut guard = self.trainable(node, one_deal)?;
                            guard.as_mut().unwrap().update_regrets(
                                &regrets,
                                iter + 1,
                                &self.options.dcfr,
                            )?;
                            standard = Some(one_deal);
                        }
                        Some(standard_deal) => {
                            let source = self.trainable(node, standard_deal)?;
                            let mut guard = self.trainable(node, one_deal)?;
                            guard
                                .as_mut()
                                .unwrap()
                                .copy_strategy_from(source.as_ref().unwrap());
                        }
                    }
                }
            }

            if iter % self.options.print_interval == 0 {
                self.record_node_values(node, deal, reach, player, &results)?;
            }
        }

        Ok(CfrOutcome {
            payoffs,
            equity: total_equity,
        })
    }

    /// Stores per-action EVs (and equities) normalized by the
    /// blocker-aware sum of valid opponent reach.
    fn record_node_values(
        &self,
        node: &ActionNode,
        deal: usize,
        reach: &[f32],
        player: usize,
        results: &[CfrOutcome],
    ) -> Result<()> {
        let opponent = player ^ 1;
        let num_actions = node.actions.len();
        let player_hands = self.ranges.len(player);
        let (oppo_sum, oppo_card_sum) = self.opponent_reach_sums(opponent, reach);

        let mut rp_sums = vec![0.0f32; player_hands];
        for (hand, rp) in rp_sums.iter_mut().enumerate() {
            let (c1, c2) = self.ranges.hands(player)[hand];
            let plus = self
                .ranges
                .same_hand_index(player, hand)
                .map_or(0.0, |index| reach[index]);
            *rp = oppo_sum - oppo_card_sum[c1 as usize] - oppo_card_sum[c2 as usize] + plus;
        }

        let mut evs = vec![0.0f32; num_actions * player_hands];
        for (action_id, result) in results.iter().enumerate() {
            if result.payoffs.is_empty() {
                continue;
            }
            for hand in 0..player_hands {
                let rp = rp_sums[hand];
                evs[action_id * player_hands + hand] = if rp > 0.0 {
                    result.payoffs[hand] / rp
                } else {
                    0.0
                };
            }
        }

        let mut guard = self.trainable(node, deal)?;
        let trainable = guard.as_mut().unwrap();
        trainable.set_evs(&evs)?;

        if self.options.enable_equity {
            let mut equities = vec![0.0f32; num_actions * player_hands];
            for (action_id, result) in results.iter().enumerate() {
                if result.equity.is_empty() {
                    continue;
                }
                for hand in 0..player_hands {
                    let rp = rp_sums[hand];
                    equities[action_id * player_hands + hand] = if rp > 0.0 {
                        result.equity[hand] / rp
                    } else {
                        0.0
                    };
                }
            }
            trainable.set_equities(&equities)?;
        }

        Ok(())
    }

    fn chance_utility(
        &self,
        player: usize,
        node: &ChanceNode,
        reach: &[f32],
        iter: usize,
        board: CardMask,
        deal: usize,
    ) -> Result<CfrOutcome> {
        let opponent = player ^ 1;
        let deck_len = node.cards.len();
        let possible_deals = (deck_len - board.count_ones() as usize - 2) as f32;
        let enable_equity = self.options.enable_equity;
        let in_warmup = iter <= self.options.warmup;

        // sampled warmup: one representative suit per rank group carries
        // the weight of its surviving siblings
        let multiplier = if in_warmup {
            let mut rng = rand::thread_rng();
            let mut multiplier = vec![0.0f32; deck_len];
            for group in 0..deck_len / 4 {
                let chosen = group * 4 + rng.gen_range(0..4);
                let survivors = (0..4)
                    .filter(|&i| {
                        let card = node.cards[group * 4 + i];
                        board & card_mask(card) == 0
                    })
                    .count();
                multiplier[chosen] = survivors as f32;
            }
            Some(multiplier)
        } else {
            None
        };

        let valid_cards: Vec<usize> = (0..deck_len)
            .filter(|&index| {
                let card = node.cards[index];
                if board & card_mask(card) != 0 {
                    return false;
                }
                if let Some(multiplier) = &multiplier {
                    if multiplier[index] == 0.0 {
                        return false;
                    }
                }
                self.iso.offset(deal, card & 3) >= 0
            })
            .collect();

        let slots: Vec<SyncCell<CfrOutcome>> =
            (0..deck_len).map(|_| SyncCell::default()).collect();

        let visit = |&index: &usize| -> Result<()> {
            let card = node.cards[index];
            let dealt = card_mask(card);
            let new_board = board | dealt;

            let mut new_reach = vec![0.0f32; self.ranges.len(opponent)];
            for (hand, value) in new_reach.iter_mut().enumerate() {
                let cards = self.ranges.hands(opponent)[hand];
                if !hand_overlaps(cards, dealt) {
                    *value = reach[hand] / possible_deals;
                }
            }

            let new_deal = next_deal(deal, index, deck_len)?;
            let outcome = self.cfr(player, &node.child, &new_reach, iter, new_board, new_deal)?;
            *slots[index].open() = outcome;
            Ok(())
        };

        // the warmup-boundary iteration copies strategies across sibling
        // deals, so its fan-out must not run concurrently
        if iter == self.options.warmup {
            valid_cards.iter().try_for_each(visit)?;
        } else {
            valid_cards.par_iter().try_for_each(visit)?;
        }

        let player_hands = self.ranges.len(player);
        let mut payoffs = vec![0.0f32; player_hands];
        let mut equity = if enable_equity {
            vec![0.0f32; player_hands]
        } else {
            Vec::new()
        };

        // deterministic reduction in canonical card order
        for index in 0..deck_len {
            let card = node.cards[index];
            if board & card_mask(card) != 0 {
                continue;
            }

            let weight = multiplier.as_ref().map_or(1.0, |m| m[index]);
            if weight == 0.0 {
                continue;
            }

            let suit = card & 3;
            let offset = self.iso.offset(deal, suit);
            if offset < 0 {
                // borrow the canonical sibling's result and permute it
                let canonical = (index as isize + offset as isize) as usize;
                let source = slots[canonical].open();
                if source.payoffs.is_empty() {
                    continue;
                }
                let swap = self.iso.swap_list(player, suit, (suit as i8 + offset) as u8);
                let mut borrowed = source.payoffs.clone();
                exchange_color(&mut borrowed, swap);
                add_scaled(&mut payoffs, &borrowed, weight);
                if enable_equity && !source.equity.is_empty() {
                    let mut borrowed_equity = source.equity.clone();
                    exchange_color(&mut borrowed_equity, swap);
                    add_scaled(&mut equity, &borrowed_equity, weight);
                }
            } else {
                let source = slots[index].open();
                if source.payoffs.is_empty() {
                    continue;
                }
                add_scaled(&mut payoffs, &source.payoffs, weight);
                if enable_equity && !source.equity.is_empty() {
                    add_scaled(&mut equity, &source.equity, weight);
                }
            }
        }

        Ok(CfrOutcome { payoffs, equity })
    }

    /// Fold payoff times aggregated opponent reach with blocker
    /// correction.
    pub(crate) fn terminal_utility(
        &self,
        player: usize,
        node: &TerminalNode,
        reach: &[f32],
        board: CardMask,
        want_equity: bool,
    ) -> CfrOutcome {
        let payoff = node.payoffs[player];
        let opponent = player ^ 1;
        let (oppo_sum, oppo_card_sum) = self.opponent_reach_sums(opponent, reach);

        let player_hands = self.ranges.len(player);
        let mut payoffs = vec![0.0f32; player_hands];
        let mut equity = if want_equity {
            vec![0.0f32; player_hands]
        } else {
            Vec::new()
        };

        for (hand, &cards) in self.ranges.hands(player).iter().enumerate() {
            if hand_overlaps(cards, board) {
                continue;
            }
            let plus = self
                .ranges
                .same_hand_index(player, hand)
                .map_or(0.0, |index| reach[index]);
            let effective = oppo_sum
                - oppo_card_sum[cards.0 as usize]
                - oppo_card_sum[cards.1 as usize]
                + plus;
            payoffs[hand] = payoff * effective;
            if want_equity {
                equity[hand] = if payoff > 0.0 { effective } else { 0.0 };
            }
        }

        CfrOutcome { payoffs, equity }
    }

    /// Showdown utilities via two monotone passes over the rank-sorted
    /// combo lists, with per-card blocker totals. Hands of identical rank
    /// are skipped by both passes, so ties contribute to neither sum.
    pub(crate) fn showdown_utility(
        &self,
        player: usize,
        node: &ShowdownNode,
        reach: &[f32],
        board: CardMask,
        want_equity: bool,
    ) -> CfrOutcome {
        let opponent = player ^ 1;
        let win_payoff = node.payoff(player, player);
        let lose_payoff = node.payoff(opponent, player);

        let player_combs =
            self.river_ranks
                .combos(player, board, &self.ranges, self.evaluator.as_ref());
        let oppo_combs =
            self.river_ranks
                .combos(opponent, board, &self.ranges, self.evaluator.as_ref());

        let player_hands_list = self.ranges.hands(player);
        let oppo_hands_list = self.ranges.hands(opponent);

        let player_hands = player_hands_list.len();
        let mut payoffs = vec![0.0f32; player_hands];
        let mut equity = Vec::new();
        let mut effective_win = Vec::new();
        let mut effective_total = Vec::new();

        if want_equity {
            equity = vec![0.0f32; player_hands];
            effective_win = vec![0.0f32; player_hands];
            effective_total = vec![0.0f32; player_hands];

            let mut oppo_total = 0.0f32;
            let mut oppo_card_total = [0.0f32; 52];
            for comb in oppo_combs.iter() {
                let value = reach[comb.reach_index];
                let (c1, c2) = oppo_hands_list[comb.reach_index];
                oppo_total += value;
                oppo_card_total[c1 as usize] += value;
                oppo_card_total[c2 as usize] += value;
            }

            for comb in player_combs.iter() {
                let (c1, c2) = player_hands_list[comb.reach_index];
                let plus = self
                    .ranges
                    .same_hand_index(player, comb.reach_index)
                    .map_or(0.0, |index| reach[index]);
                effective_total[comb.reach_index] = oppo_total
                    - oppo_card_total[c1 as usize]
                    - oppo_card_total[c2 as usize]
                    + plus;
            }
        }

        // ascending strength: accumulate the opponent hands we beat
        let mut winsum = 0.0f32;
        let mut card_winsum = [0.0f32; 52];
        let mut j = 0usize;
        for comb in player_combs.iter() {
            while j < oppo_combs.len() && comb.rank < oppo_combs[j].rank {
                let value = reach[oppo_combs[j].reach_index];
                let (c1, c2) = oppo_hands_list[oppo_combs[j].reach_index];
                winsum += value;
                card_winsum[c1 as usize] += value;
                card_winsum[c2 as usize] += value;
                j += 1;
            }
            let (c1, c2) = player_hands_list[comb.reach_index];
            let eff_win = winsum - card_winsum[c1 as usize] - card_winsum[c2 as usize];
            payoffs[comb.reach_index] = eff_win * win_payoff;
            if want_equity {
                effective_win[comb.reach_index] = eff_win;
            }
        }

        // descending strength: accumulate the opponent hands that beat us
        let mut losssum = 0.0f32;
        let card_losssum = &mut card_winsum;
        card_losssum.fill(0.0);
        let mut j = oppo_combs.len() as isize - 1;
        for comb in player_combs.iter().rev() {
            while j >= 0 && comb.rank > oppo_combs[j as usize].rank {
                let value = reach[oppo_combs[j as usize].reach_index];
                let (c1, c2) = oppo_hands_list[oppo_combs[j as usize].reach_index];
                losssum += value;
                card_losssum[c1 as usize] += value;
                card_losssum[c2 as usize] += value;
                j -= 1;
            }
            let (c1, c2) = player_hands_list[comb.reach_index];
            let eff_loss = losssum - card_losssum[c1 as usize] - card_losssum[c2 as usize];
            payoffs[comb.reach_index] += eff_loss * lose_payoff;

            if want_equity {
                let index = comb.reach_index;
                let eff_tie =
                    (effective_total[index] - effective_win[index] - eff_loss).max(0.0);
                equity[index] = effective_win[index] + 0.5 * eff_tie;
            }
        }

        CfrOutcome { payoffs, equity }
    }

    /// Aggregated opponent reach and per-card partial sums.
    pub(crate) fn opponent_reach_sums(&self, opponent: usize, reach: &[f32]) -> (f32, [f32; 52]) {
        let mut sum = 0.0f32;
        let mut card_sum = [0.0f32; 52];
        for (hand, &(c1, c2)) in self.ranges.hands(opponent).iter().enumerate() {
            let value = reach[hand];
            sum += value;
            card_sum[c1 as usize] += value;
            card_sum[c2 as usize] += value;
        }
        (sum, card_sum)
    }

    /// All abstract deals whose extra cards differ from `deal`'s only by
    /// suit, with initial-board blockers removed. The first entry is the
    /// class representative updated at the warmup boundary.
    pub(crate) fn suit_class_deals(&self, deal: usize) -> Vec<usize> {
        let deck_len = self.deck.len();
        let cards = self.deck.cards();
        let mut class = Vec::new();

        if deal == 0 {
            class.push(0);
        } else if deal <= deck_len {
            let origin = (deal - 1) / 4 * 4;
            for i in 0..4 {
                let card = cards[origin + i];
                if self.initial_board & card_mask(card) != 0 {
                    continue;
                }
                class.push(origin + i + 1);
            }
        } else {
            let encoded = deal - 1 - deck_len;
            let first = encoded / deck_len / 4 * 4;
            let second = encoded % deck_len / 4 * 4;
            for i in 0..4 {
                for j in 0..4 {
                    if first == second && i == j {
                        continue;
                    }
                    let first_card = cards[first + i];
                    if self.initial_board & card_mask(first_card) != 0 {
                        continue;
                    }
                    let second_card = cards[second + j];
                    if self.initial_board & card_mask(second_card) != 0 {
                        continue;
                    }
                    class.push(deck_len * (first + i) + (second + j) + 1 + deck_len);
                }
            }
        }

        class
    }
}

/// Advances the abstract deal id after dealing the deck card at `index`.
pub(crate) fn next_deal(deal: usize, index: usize, deck_len: usize) -> Result<usize> {
    if deal == 0 {
        Ok(index + 1)
    } else if deal <= deck_len {
        Ok(deck_len * (deal - 1) + index + 1 + deck_len)
    } else {
        Err(SolverError::DealOutOfRange {
            deal,
            limit: deck_len * deck_len + deck_len + 1,
        })
    }
}
