//! A Discounted-CFR solver for heads-up no-limit hold'em sub-games.
//!
//! Given a betting abstraction, two weighted ranges, and a public board,
//! the solver iterates vector-form Discounted CFR over the public tree
//! until exploitability drops below a target, then emits the average
//! strategy (with per-action EVs, optional equities, and optional
//! reach-probability ranges) as recursive JSON.
//!
//! # Example
//! ```no_run
//! use subgame_solver::*;
//!
//! let deck = Deck::standard();
//! let tree_config = TreeConfig {
//!     current_round: Round::River,
//!     oop_commit: 10.0,
//!     ip_commit: 10.0,
//!     stack: 100.0,
//!     ..Default::default()
//! };
//! let tree = GameTree::build(&deck, &tree_config).unwrap();
//!
//! let board = board_from_str("Ks,7s,4s,9d,2h").unwrap();
//! let p1 = "JJ+,AQs+".parse::<Range>().unwrap().hands_weights(0);
//! let p2 = "22+,A2s+,KTo+".parse::<Range>().unwrap().hands_weights(0);
//!
//! let options = SolverOptions {
//!     iteration_number: 200,
//!     accuracy: 0.25,
//!     ..Default::default()
//! };
//! let solver = CfrSolver::new(
//!     tree,
//!     deck,
//!     [p1, p2],
//!     &board,
//!     Box::new(SevenCardEvaluator),
//!     options,
//! )
//! .unwrap();
//!
//! let exploitability = solver.train().unwrap();
//! println!("exploitability: {exploitability:.3}% of the pot");
//!
//! let strategy = solver.dump_strategy(2).unwrap();
//! println!("{strategy}");
//! ```
//!
//! # Implementation notes
//! - **Algorithm**: Discounted CFR with alternating updates; the classic
//!   (α, β, γ) = (1.5, 0, 2) tuning is the default.
//! - **Precision**: 32-bit floats throughout the traversal; 64-bit
//!   accumulators where sums are formed.
//! - **Isomorphism**: suit symmetry of the current board combines
//!   equivalent turn and river deals into one; the skipped branches
//!   reuse the canonical sibling's result under a hand permutation.
//! - **Parallelism**: chance-node children fan out over a [rayon] pool;
//!   results land in per-card slots and are reduced serially in card
//!   order, so a run is reproducible for a fixed thread count.
//!
//! [rayon]: https://github.com/rayon-rs/rayon

mod best_response;
mod card;
mod config;
mod dump;
mod error;
mod evaluator;
mod isomorphism;
mod range;
mod range_index;
mod river_ranks;
mod sliceop;
mod solver;
mod sync_cell;
mod trainable;
mod tree;

pub use card::*;
pub use config::*;
pub use error::*;
pub use evaluator::*;
pub use isomorphism::*;
pub use range::*;
pub use range_index::*;
pub use river_ranks::*;
pub use solver::*;
pub use sync_cell::*;
pub use trainable::*;
pub use tree::*;
