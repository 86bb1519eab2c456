use crate::card::*;
use crate::error::Result;
use crate::evaluator::SevenCardEvaluator;
use crate::range::Range;
use crate::solver::{CfrSolver, SolverOptions};
use crate::trainable::DcfrParams;
use crate::tree::*;
use serde::Deserialize;
use std::path::Path;

/// Driver configuration, deserialized from a JSON object.
///
/// Missing keys take the defaults below. The `compairer_file*` keys are
/// accepted for compatibility with file-backed hand comparers; the
/// shipped evaluator does not consult them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub ranks: String,
    pub suits: String,
    pub compairer_file: Option<String>,
    pub compairer_file_lines: Option<u64>,
    pub compairer_file_bin: Option<String>,
    pub oop_commit: f64,
    pub ip_commit: f64,
    /// 0 = preflop, 1 = flop, 2 = turn, 3 = river.
    pub current_round: u8,
    pub raise_limit: u32,
    pub small_blind: f64,
    pub big_blind: f64,
    pub stack: f64,
    pub allin_threshold: f64,
    pub p1_range: String,
    pub p2_range: String,
    pub boards: String,
    pub log_file: Option<String>,
    pub iteration_number: usize,
    pub print_interval: usize,
    pub algorithm: String,
    pub warmup: usize,
    pub accuracy: f32,
    pub use_isomorphism: bool,
    pub threads: i32,
    pub enable_equity: bool,
    pub enable_range: bool,
    pub dump_file: Option<String>,
    pub dump_rounds: usize,
    pub flop_bet_sizes: Vec<f64>,
    pub turn_bet_sizes: Vec<f64>,
    pub river_bet_sizes: Vec<f64>,
    pub raise_sizes: Vec<f64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            ranks: "2,3,4,5,6,7,8,9,T,J,Q,K,A".to_string(),
            suits: "c,d,h,s".to_string(),
            compairer_file: None,
            compairer_file_lines: None,
            compairer_file_bin: None,
            oop_commit: 5.0,
            ip_commit: 5.0,
            current_round: 1,
            raise_limit: 4,
            small_blind: 0.5,
            big_blind: 1.0,
            stack: 100.0,
            allin_threshold: 0.67,
            p1_range: String::new(),
            p2_range: String::new(),
            boards: String::new(),
            log_file: None,
            iteration_number: 100,
            print_interval: 10,
            algorithm: "discounted_cfr".to_string(),
            warmup: 0,
            accuracy: 0.5,
            use_isomorphism: false,
            threads: -1,
            enable_equity: false,
            enable_range: false,
            dump_file: None,
            dump_rounds: 4,
            flop_bet_sizes: vec![50.0, 100.0],
            turn_bet_sizes: vec![50.0, 100.0],
            river_bet_sizes: vec![50.0, 100.0],
            raise_sizes: vec![100.0],
        }
    }
}

impl SolverConfig {
    /// Reads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn street_settings(&self) -> [StreetSetting; 3] {
        let setting = |bet_sizes: &[f64]| StreetSetting {
            bet_sizes: bet_sizes.to_vec(),
            raise_sizes: self.raise_sizes.clone(),
            allin: true,
        };
        [
            setting(&self.flop_bet_sizes),
            setting(&self.turn_bet_sizes),
            setting(&self.river_bet_sizes),
        ]
    }

    /// Builds the solver described by this configuration.
    pub fn build_solver(&self) -> Result<CfrSolver> {
        let deck = Deck::from_labels(&self.ranks, &self.suits)?;
        let board = board_from_str(&self.boards)?;

        let tree_config = TreeConfig {
            current_round: Round::from_index(self.current_round)?,
            oop_commit: self.oop_commit,
            ip_commit: self.ip_commit,
            raise_limit: self.raise_limit,
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            stack: self.stack,
            allin_threshold: self.allin_threshold,
            settings: [self.street_settings(), self.street_settings()],
        };
        let tree = GameTree::build(&deck, &tree_config)?;

        let p1 = self.p1_range.parse::<Range>()?.hands_weights(0);
        let p2 = self.p2_range.parse::<Range>()?.hands_weights(0);

        let estimate = tree.estimate_tree_memory([p1.len(), p2.len()]);
        println!(
            "estimated trainable memory: {:.2} MB",
            estimate as f64 / (1024.0 * 1024.0)
        );

        let options = SolverOptions {
            iteration_number: self.iteration_number,
            print_interval: self.print_interval,
            warmup: self.warmup,
            accuracy: self.accuracy,
            algorithm: self.algorithm.parse()?,
            use_isomorphism: self.use_isomorphism,
            threads: self.threads,
            enable_equity: self.enable_equity,
            enable_range: self.enable_range,
            log_file: self.log_file.clone(),
            dcfr: DcfrParams::default(),
        };

        CfrSolver::new(
            tree,
            deck,
            [p1, p2],
            &board,
            Box::new(SevenCardEvaluator),
            options,
        )
    }

    /// End-to-end run: build, train, and write the strategy dump when
    /// requested.
    pub fn run(&self) -> Result<()> {
        let solver = self.build_solver()?;
        let exploitability = solver.train()?;
        println!("final exploitability: {exploitability:.4}% of the pot");

        if let Some(dump_file) = &self.dump_file {
            let dump = solver.dump_strategy(self.dump_rounds)?;
            let file = std::fs::File::create(dump_file)?;
            serde_json::to_writer(std::io::BufWriter::new(file), &dump)?;
            println!("strategy written to {dump_file}");
        }

        Ok(())
    }
}
