//! # Separating Module
//!
//! Finds input sequences that make two deterministic [transducers](Transducer) produce different
//! outputs. The search walks the synchronized product of both transducers breadth first, so the
//! first divergence found is a shortest one.
//!
//! ```
//! use rust_ffsm::mealy::MealyBuilder;
//! use rust_ffsm::separating::find_separating_sequence;
//!
//! let x = MealyBuilder::new()
//!     .with_transition("1", "a", "0", "2")
//!     .with_transition("2", "a", "0", "2")
//!     .with_initial("1")
//!     .build()
//!     .unwrap();
//! let y = MealyBuilder::new()
//!     .with_transition("1", "a", "0", "2")
//!     .with_transition("2", "a", "1", "2")
//!     .with_initial("1")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(find_separating_sequence(&x, &y).unwrap(), vec!["a", "a"]);
//! ```

use crate::error::SeparationError;
use crate::mealy::{MealyMachine, Transducer};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};

/// Limits for the product exploration.
#[derive(Clone, Debug, Default)]
pub struct SearchConfig {
    /// Give up after visiting this many product states. `None` explores everything.
    pub max_explored: Option<usize>,
}

impl SearchConfig {
    pub fn bounded(max_explored: usize) -> Self {
        SearchConfig {
            max_explored: Some(max_explored),
        }
    }
}

/// Shortest input sequence on which `a` and `b` disagree, starting from their initial states.
pub fn find_separating_sequence<A, B>(a: &A, b: &B) -> Result<Vec<String>, SeparationError>
where
    A: Transducer,
    B: Transducer,
{
    find_separating_sequence_with(a, b, &SearchConfig::default())
}

/// Like [find_separating_sequence], but honoring the limits in `config`.
pub fn find_separating_sequence_with<A, B>(
    a: &A,
    b: &B,
    config: &SearchConfig,
) -> Result<Vec<String>, SeparationError>
where
    A: Transducer,
    B: Transducer,
{
    let sequence =
        separating_sequence_from(a, a.initial_state(), b, b.initial_state(), config)?;
    info!("found separating sequence {:?}", sequence);
    Ok(sequence)
}

/// Breadth first search over pairs of states, beginning at (`start_a`, `start_b`).
///
/// Symbols are tried in the alphabet order of `a`, followed by symbols only `b` knows. A
/// transition present on one side but missing on the other counts as a divergence.
pub fn separating_sequence_from<A, B>(
    a: &A,
    start_a: A::State,
    b: &B,
    start_b: B::State,
    config: &SearchConfig,
) -> Result<Vec<String>, SeparationError>
where
    A: Transducer,
    B: Transducer,
{
    let mut alphabet = a.input_alphabet();
    for symbol in b.input_alphabet() {
        if !alphabet.contains(&symbol) {
            alphabet.push(symbol);
        }
    }

    let mut visited: HashSet<(A::State, B::State)> = HashSet::new();
    visited.insert((start_a.clone(), start_b.clone()));

    let mut frontier: VecDeque<(A::State, B::State, Vec<String>)> = VecDeque::new();
    frontier.push_back((start_a, start_b, Vec::new()));

    let mut explored = 0;
    while let Some((state_a, state_b, prefix)) = frontier.pop_front() {
        if config.max_explored.is_some_and(|max| explored >= max) {
            return Err(SeparationError::ExplorationLimit { explored });
        }
        explored += 1;

        debug!("visit ({:?}, {:?}) after {:?}", state_a, state_b, prefix);

        for symbol in &alphabet {
            let extended = || {
                let mut sequence = prefix.clone();
                sequence.push(symbol.clone());
                sequence
            };

            match (a.step(&state_a, symbol), b.step(&state_b, symbol)) {
                (Some((next_a, out_a)), Some((next_b, out_b))) => {
                    if out_a != out_b {
                        return Ok(extended());
                    }
                    if visited.insert((next_a.clone(), next_b.clone())) {
                        frontier.push_back((next_a, next_b, extended()));
                    }
                }
                (Some(_), None) | (None, Some(_)) => return Ok(extended()),
                (None, None) => {}
            }
        }
    }

    Err(SeparationError::Indistinguishable)
}

/// The characterization set `t` computes for its own states.
pub fn characterization_set<T: Transducer>(t: &T) -> Vec<Vec<String>> {
    t.characterization_set()
}

/// Sequences telling apart the states of `a` and `b` once both machines are embedded into one.
///
/// This avoids a product search when the machines are small, at the price of returning a whole
/// characterization set instead of a single sequence.
pub fn split_without_reset(a: &MealyMachine, b: &MealyMachine) -> Vec<Vec<String>> {
    characterization_set(&a.disjoint_union(b))
}
