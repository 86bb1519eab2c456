use crate::card::*;
use crate::error::{Result, SolverError};
use crate::sync_cell::SyncCell;
use crate::trainable::DcfrTrainable;
use std::fmt;

/// Index of the in-position player.
pub const PLAYER_IP: usize = 0;
/// Index of the out-of-position player.
pub const PLAYER_OOP: usize = 1;

/// Betting street.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Round {
    Preflop,
    Flop,
    Turn,
    River,
}

impl Round {
    pub fn from_index(index: u8) -> Result<Self> {
        match index {
            0 => Ok(Self::Preflop),
            1 => Ok(Self::Flop),
            2 => Ok(Self::Turn),
            3 => Ok(Self::River),
            _ => Err(SolverError::InvalidTreeConfig(format!(
                "round index {index} out of range"
            ))),
        }
    }

    #[inline]
    pub fn index(self) -> u8 {
        match self {
            Self::Preflop => 0,
            Self::Flop => 1,
            Self::Turn => 2,
            Self::River => 3,
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::Preflop => Some(Self::Flop),
            Self::Flop => Some(Self::Turn),
            Self::Turn => Some(Self::River),
            Self::River => None,
        }
    }
}

/// A legal move at an action node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameAction {
    Fold,
    Check,
    Call,
    Bet(f64),
    Raise(f64),
    AllIn(f64),
}

fn format_amount(amount: f64) -> String {
    if (amount - amount.round()).abs() < 1e-9 {
        format!("{}", amount.round() as i64)
    } else {
        format!("{amount:.2}")
    }
}

impl fmt::Display for GameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "FOLD"),
            Self::Check => write!(f, "CHECK"),
            Self::Call => write!(f, "CALL"),
            Self::Bet(amount) => write!(f, "BET {}", format_amount(*amount)),
            Self::Raise(amount) => write!(f, "RAISE {}", format_amount(*amount)),
            Self::AllIn(amount) => write!(f, "ALLIN {}", format_amount(*amount)),
        }
    }
}

/// A decision point owned by one player, with a trainable slot per
/// abstract deal.
pub struct ActionNode {
    pub player: usize,
    pub round: Round,
    pub actions: Vec<GameAction>,
    pub children: Vec<GameTreeNode>,
    pub(crate) trainables: Vec<SyncCell<Option<Box<DcfrTrainable>>>>,
}

impl ActionNode {
    /// Number of abstract-deal slots of this node.
    #[inline]
    pub fn num_deals(&self) -> usize {
        self.trainables.len()
    }
}

/// A card deal. The single `child` subtree shape is reused under every
/// dealt card, with the board augmented and the abstract deal advanced.
pub struct ChanceNode {
    pub round: Round,
    pub cards: Vec<Card>,
    pub child: Box<GameTreeNode>,
}

/// A fold endpoint: signed net chips per player.
pub struct TerminalNode {
    pub payoffs: [f32; 2],
}

/// A showdown endpoint. Commitments are equal, so the tie payoff is zero
/// net; the win/lose payoffs are the opponent's (resp. the player's own)
/// committed chips.
pub struct ShowdownNode {
    commits: [f64; 2],
}

impl ShowdownNode {
    /// Signed payoff of `player` when `winner` takes the pot.
    #[inline]
    pub fn payoff(&self, winner: usize, player: usize) -> f32 {
        if winner == player {
            self.commits[player ^ 1] as f32
        } else {
            -self.commits[player] as f32
        }
    }
}

/// The tagged game-tree node. The CFR engine is a single function
/// switching on this tag; no virtual dispatch is involved.
pub enum GameTreeNode {
    Action(ActionNode),
    Chance(ChanceNode),
    Terminal(TerminalNode),
    Showdown(ShowdownNode),
}

/// Per-street betting abstraction of one player.
#[derive(Debug, Clone)]
pub struct StreetSetting {
    /// Bet sizes as percentages of the pot.
    pub bet_sizes: Vec<f64>,
    /// Raise sizes as percentages of the pot after calling.
    pub raise_sizes: Vec<f64>,
    /// Whether an explicit all-in action is offered.
    pub allin: bool,
}

impl Default for StreetSetting {
    fn default() -> Self {
        Self {
            bet_sizes: vec![50.0, 100.0],
            raise_sizes: vec![100.0],
            allin: true,
        }
    }
}

/// Inputs of the tree builder.
#[derive(Debug, Clone)]
pub struct TreeConfig {
    pub current_round: Round,
    pub oop_commit: f64,
    pub ip_commit: f64,
    /// Maximum number of bets and raises per street.
    pub raise_limit: u32,
    pub small_blind: f64,
    pub big_blind: f64,
    /// Effective stack measured from zero commitment.
    pub stack: f64,
    /// A bet or raise increment at least this fraction of the remaining
    /// stack is replaced by all-in (`0.0` disables the substitution).
    pub allin_threshold: f64,
    /// Per-player settings indexed `[player][street]` with streets
    /// flop/turn/river; a preflop root reuses the flop entry.
    pub settings: [[StreetSetting; 3]; 2],
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            current_round: Round::Flop,
            oop_commit: 5.0,
            ip_commit: 5.0,
            raise_limit: 4,
            small_blind: 0.5,
            big_blind: 1.0,
            stack: 100.0,
            allin_threshold: 0.67,
            settings: Default::default(),
        }
    }
}

impl TreeConfig {
    fn setting(&self, round: Round, player: usize) -> &StreetSetting {
        let street = match round {
            Round::Preflop | Round::Flop => 0,
            Round::Turn => 1,
            Round::River => 2,
        };
        &self.settings[player][street]
    }
}

#[derive(Clone, Copy)]
struct BuildState {
    round: Round,
    player: usize,
    commits: [f64; 2],
    /// Bets and raises made this street.
    raises: u32,
    /// Minimum increment of the next raise (the size of the last bet or
    /// raise on this street).
    last_increment: f64,
}

impl BuildState {
    #[inline]
    fn to_call(&self) -> f64 {
        self.commits[self.player ^ 1] - self.commits[self.player]
    }
}

/// The public game tree: built once, shared read-only by the solver.
pub struct GameTree {
    root: GameTreeNode,
    root_round: Round,
    root_pot: f64,
}

impl GameTree {
    /// Builds the betting abstraction over the given deck.
    pub fn build(deck: &Deck, config: &TreeConfig) -> Result<Self> {
        if config.oop_commit <= 0.0 || config.ip_commit <= 0.0 {
            return Err(SolverError::InvalidTreeConfig(
                "commitments must be positive".to_string(),
            ));
        }
        if config.stack <= config.oop_commit.max(config.ip_commit) {
            return Err(SolverError::InvalidTreeConfig(
                "stack must exceed both commitments".to_string(),
            ));
        }
        if config.big_blind <= 0.0 {
            return Err(SolverError::InvalidTreeConfig(
                "big blind must be positive".to_string(),
            ));
        }

        let builder = TreeBuilder {
            config,
            deck_cards: deck.cards().to_vec(),
            root_round: config.current_round,
            deck_len: deck.len(),
        };

        let state = BuildState {
            round: config.current_round,
            player: builder.street_opener(config.current_round),
            commits: [config.ip_commit, config.oop_commit],
            raises: 0,
            last_increment: config.big_blind,
        };

        Ok(Self {
            root: builder.action_node(state)?,
            root_round: config.current_round,
            root_pot: config.oop_commit + config.ip_commit,
        })
    }

    #[inline]
    pub fn root(&self) -> &GameTreeNode {
        &self.root
    }

    #[inline]
    pub fn root_round(&self) -> Round {
        self.root_round
    }

    /// Chips in the pot at the root.
    #[inline]
    pub fn root_pot(&self) -> f64 {
        self.root_pot
    }

    /// Estimated bytes of trainable storage for the given range sizes,
    /// assuming every slot materializes.
    pub fn estimate_tree_memory(&self, range_len: [usize; 2]) -> u64 {
        fn walk(node: &GameTreeNode, range_len: [usize; 2]) -> u64 {
            match node {
                GameTreeNode::Action(action) => {
                    let hands = range_len[action.player] as u64;
                    let actions = action.actions.len() as u64;
                    // five f32 tables of A*H entries plus one of H entries
                    let per_deal = 4 * (5 * actions * hands + hands);
                    let own = action.num_deals() as u64 * per_deal;
                    own + action
                        .children
                        .iter()
                        .map(|child| walk(child, range_len))
                        .sum::<u64>()
                }
                GameTreeNode::Chance(chance) => walk(&chance.child, range_len),
                _ => 0,
            }
        }
        walk(&self.root, range_len)
    }
}

struct TreeBuilder<'a> {
    config: &'a TreeConfig,
    deck_cards: Vec<Card>,
    root_round: Round,
    deck_len: usize,
}

impl TreeBuilder<'_> {
    fn street_opener(&self, round: Round) -> usize {
        // heads-up: IP opens preflop, OOP opens every postflop street
        if round == Round::Preflop {
            PLAYER_IP
        } else {
            PLAYER_OOP
        }
    }

    fn trainable_slots(&self, round: Round) -> Result<Vec<SyncCell<Option<Box<DcfrTrainable>>>>> {
        let gap = round
            .index()
            .checked_sub(self.root_round.index())
            .map(usize::from)
            .unwrap_or(usize::MAX);
        let count = match gap {
            0 => 1,
            1 => self.deck_len + 1,
            2 => self.deck_len * self.deck_len + self.deck_len + 1,
            _ => {
                return Err(SolverError::InvalidTreeConfig(format!(
                    "street gap {gap} between root and an action node exceeds two"
                )))
            }
        };
        Ok((0..count).map(|_| SyncCell::new(None)).collect())
    }

    fn action_node(&self, state: BuildState) -> Result<GameTreeNode> {
        let player = state.player;
        let opponent = player ^ 1;
        let setting = self.config.setting(state.round, player);
        let to_call = state.to_call();

        let mut actions = Vec::new();
        let mut children = Vec::new();

        if to_call > 1e-9 {
            // facing a bet
            actions.push(GameAction::Fold);
            children.push(self.fold_node(state.commits, player));

            let mut called = state.commits;
            called[player] = called[opponent];
            actions.push(GameAction::Call);
            children.push(self.street_closed(state.round, called)?);

            let opponent_allin = state.commits[opponent] >= self.config.stack - 1e-9;
            if state.raises < self.config.raise_limit && !opponent_allin {
                let pot_after_call = 2.0 * state.commits[opponent];
                for (action, target) in self.raise_targets(
                    &setting.raise_sizes,
                    state.commits[opponent],
                    pot_after_call,
                    state.last_increment,
                    true,
                    setting.allin,
                ) {
                    actions.push(action);
                    children.push(self.bet_made(state, target)?);
                }
            }
        } else {
            // street is open or was checked to us
            actions.push(GameAction::Check);
            if player == self.street_opener(state.round) {
                let next = BuildState {
                    player: opponent,
                    ..state
                };
                children.push(self.action_node(next)?);
            } else {
                children.push(self.street_closed(state.round, state.commits)?);
            }

            if state.raises < self.config.raise_limit {
                let pot = state.commits[0] + state.commits[1];
                for (action, target) in self.raise_targets(
                    &setting.bet_sizes,
                    state.commits[player],
                    pot,
                    self.config.big_blind,
                    false,
                    setting.allin,
                ) {
                    actions.push(action);
                    children.push(self.bet_made(state, target)?);
                }
            }
        }

        Ok(GameTreeNode::Action(ActionNode {
            player,
            round: state.round,
            actions,
            children,
            trainables: self.trainable_slots(state.round)?,
        }))
    }

    /// Maps percent-of-pot sizes to target commitments, deduplicated,
    /// floored at the minimum legal increment and capped by the stack.
    /// Increments reaching `allin_threshold` of the remaining stack are
    /// promoted to an explicit all-in.
    fn raise_targets(
        &self,
        sizes: &[f64],
        base_commit: f64,
        pot: f64,
        min_increment: f64,
        facing_bet: bool,
        offer_allin: bool,
    ) -> Vec<(GameAction, f64)> {
        let stack = self.config.stack;
        let remaining = stack - base_commit;
        let min_increment = min_increment.max(self.config.big_blind);

        let mut targets: Vec<f64> = Vec::new();
        let mut allin = offer_allin;

        for &size in sizes {
            let increment = (pot * size / 100.0).max(min_increment);
            let promoted = self.config.allin_threshold > 0.0
                && increment >= self.config.allin_threshold * remaining;
            if base_commit + increment >= stack - 1e-9 || promoted {
                allin = true;
            } else {
                let target = base_commit + increment;
                if !targets.iter().any(|&t| (t - target).abs() < 1e-9) {
                    targets.push(target);
                }
            }
        }

        targets.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mut result: Vec<(GameAction, f64)> = targets
            .into_iter()
            .map(|target| {
                let action = if facing_bet {
                    GameAction::Raise(target)
                } else {
                    GameAction::Bet(target)
                };
                (action, target)
            })
            .collect();

        if allin {
            result.push((GameAction::AllIn(stack), stack));
        }

        result
    }

    fn bet_made(&self, state: BuildState, target: f64) -> Result<GameTreeNode> {
        let player = state.player;
        let mut commits = state.commits;
        let increment = target - commits[player ^ 1].max(commits[player]);
        commits[player] = target;
        self.action_node(BuildState {
            round: state.round,
            player: player ^ 1,
            commits,
            raises: state.raises + 1,
            last_increment: increment.max(self.config.big_blind),
        })
    }

    fn fold_node(&self, commits: [f64; 2], folder: usize) -> GameTreeNode {
        let lost = commits[folder];
        let mut payoffs = [0.0f32; 2];
        payoffs[folder] = -lost as f32;
        payoffs[folder ^ 1] = lost as f32;
        GameTreeNode::Terminal(TerminalNode { payoffs })
    }

    /// Both players are done with the street: deal the next card, or show
    /// down on the river. After an all-in call the remaining chance nodes
    /// chain straight into the showdown.
    fn street_closed(&self, round: Round, commits: [f64; 2]) -> Result<GameTreeNode> {
        let allin = commits[0] >= self.config.stack - 1e-9;
        match round.next() {
            None => Ok(GameTreeNode::Showdown(ShowdownNode { commits })),
            Some(next) if allin => Ok(GameTreeNode::Chance(ChanceNode {
                round: next,
                cards: self.deck_cards.clone(),
                child: Box::new(self.street_closed(next, commits)?),
            })),
            Some(next) => {
                let state = BuildState {
                    round: next,
                    player: self.street_opener(next),
                    commits,
                    raises: 0,
                    last_increment: self.config.big_blind,
                };
                Ok(GameTreeNode::Chance(ChanceNode {
                    round: next,
                    cards: self.deck_cards.clone(),
                    child: Box::new(self.action_node(state)?),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn river_config() -> TreeConfig {
        TreeConfig {
            current_round: Round::River,
            oop_commit: 10.0,
            ip_commit: 10.0,
            stack: 100.0,
            ..Default::default()
        }
    }

    fn as_action(node: &GameTreeNode) -> &ActionNode {
        match node {
            GameTreeNode::Action(action) => action,
            _ => panic!("expected action node"),
        }
    }

    #[test]
    fn river_root_shape() {
        let tree = GameTree::build(&Deck::standard(), &river_config()).unwrap();
        let root = as_action(tree.root());

        assert_eq!(root.player, PLAYER_OOP);
        assert_eq!(root.actions[0], GameAction::Check);
        assert_eq!(root.actions.len(), root.children.len());
        assert_eq!(root.num_deals(), 1);
        assert_eq!(tree.root_pot(), 20.0);
    }

    #[test]
    fn check_check_reaches_showdown() {
        let tree = GameTree::build(&Deck::standard(), &river_config()).unwrap();
        let root = as_action(tree.root());
        let after_check = as_action(&root.children[0]);
        assert_eq!(after_check.player, PLAYER_IP);

        match &after_check.children[0] {
            GameTreeNode::Showdown(showdown) => {
                assert_eq!(showdown.payoff(PLAYER_OOP, PLAYER_OOP), 10.0);
                assert_eq!(showdown.payoff(PLAYER_OOP, PLAYER_IP), -10.0);
            }
            _ => panic!("check-check must reach showdown"),
        }
    }

    #[test]
    fn fold_pays_the_remaining_player() {
        let tree = GameTree::build(&Deck::standard(), &river_config()).unwrap();
        let root = as_action(tree.root());

        // OOP bets, IP folds
        let bet_index = root
            .actions
            .iter()
            .position(|a| matches!(a, GameAction::Bet(_)))
            .unwrap();
        let facing = as_action(&root.children[bet_index]);
        assert_eq!(facing.actions[0], GameAction::Fold);
        match &facing.children[0] {
            GameTreeNode::Terminal(terminal) => {
                assert_eq!(terminal.payoffs[PLAYER_IP], -10.0);
                assert_eq!(terminal.payoffs[PLAYER_OOP], 10.0);
                assert_eq!(terminal.payoffs[0] + terminal.payoffs[1], 0.0);
            }
            _ => panic!("fold must reach a terminal node"),
        }
    }

    #[test]
    fn bets_and_raises_are_labeled_by_target() {
        let tree = GameTree::build(&Deck::standard(), &river_config()).unwrap();
        let root = as_action(tree.root());

        // pot 20, 50% bet commits 10 more on top of 10
        assert!(root.actions.contains(&GameAction::Bet(20.0)));

        let bet_index = root
            .actions
            .iter()
            .position(|a| *a == GameAction::Bet(20.0))
            .unwrap();
        let facing = as_action(&root.children[bet_index]);
        assert!(facing
            .actions
            .iter()
            .any(|a| matches!(a, GameAction::Raise(_))));
    }

    #[test]
    fn flop_tree_has_two_chance_levels() {
        let config = TreeConfig {
            current_round: Round::Flop,
            ..river_config()
        };
        let tree = GameTree::build(&Deck::standard(), &config).unwrap();

        let root = as_action(tree.root());
        assert_eq!(root.num_deals(), 1);

        let after_check = as_action(&root.children[0]);
        let turn_chance = match &after_check.children[0] {
            GameTreeNode::Chance(chance) => chance,
            _ => panic!("expected turn chance node"),
        };
        assert_eq!(turn_chance.round, Round::Turn);
        assert_eq!(turn_chance.cards.len(), 52);

        let turn_action = as_action(&turn_chance.child);
        assert_eq!(turn_action.num_deals(), 53);

        let after_turn_checks = as_action(&turn_action.children[0]);
        let river_chance = match &after_turn_checks.children[0] {
            GameTreeNode::Chance(chance) => chance,
            _ => panic!("expected river chance node"),
        };
        let river_action = as_action(&river_chance.child);
        assert_eq!(river_action.num_deals(), 52 * 52 + 53);
    }

    #[test]
    fn raise_limit_is_honored() {
        let mut config = river_config();
        config.raise_limit = 2;
        let tree = GameTree::build(&Deck::standard(), &config).unwrap();
        let root = as_action(tree.root());

        let bet_index = root
            .actions
            .iter()
            .position(|a| matches!(a, GameAction::Bet(_)))
            .unwrap();
        let facing_bet = as_action(&root.children[bet_index]);
        let raise_index = facing_bet
            .actions
            .iter()
            .position(|a| matches!(a, GameAction::Raise(_)))
            .unwrap();
        let facing_raise = as_action(&facing_bet.children[raise_index]);

        // the bet and the raise exhaust the limit of two
        assert!(facing_raise
            .actions
            .iter()
            .all(|a| matches!(a, GameAction::Fold | GameAction::Call)));
    }

    #[test]
    fn all_in_call_deals_out_the_board() {
        let mut config = river_config();
        config.current_round = Round::Turn;
        config.settings = Default::default();
        let tree = GameTree::build(&Deck::standard(), &config).unwrap();
        let root = as_action(tree.root());

        let allin_index = root
            .actions
            .iter()
            .position(|a| matches!(a, GameAction::AllIn(_)))
            .unwrap();
        let facing_allin = as_action(&root.children[allin_index]);
        let call_index = facing_allin
            .actions
            .iter()
            .position(|a| *a == GameAction::Call)
            .unwrap();

        match &facing_allin.children[call_index] {
            GameTreeNode::Chance(chance) => match chance.child.as_ref() {
                GameTreeNode::Showdown(showdown) => {
                    assert_eq!(showdown.payoff(PLAYER_IP, PLAYER_IP), 100.0);
                }
                _ => panic!("all-in river chance must lead to showdown"),
            },
            _ => panic!("all-in call on the turn must deal the river"),
        }
    }

    #[test]
    fn memory_estimate_grows_with_ranges() {
        let tree = GameTree::build(&Deck::standard(), &river_config()).unwrap();
        let small = tree.estimate_tree_memory([10, 10]);
        let large = tree.estimate_tree_memory([100, 100]);
        assert!(small > 0);
        assert!(large > small);
    }
}
