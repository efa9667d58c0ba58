//! # Featured Finite State Machines (FFSM)
//!
//! `rust-ffsm` fingerprints the variants of a software family by feeding them input sequences and
//! watching their outputs. It provides two engines:
//!
//! - A [conditional automaton](ConditionalAutomaton), a transducer whose transitions are gated
//!   by feature configurations, together with a [simulator](ConditionalSimulator) that tracks
//!   every (state, features) branch consistent with what has been observed so far.
//! - A [fingerprinting](fingerprint) algorithm that, given a family of deterministic
//!   [transducers](Transducer), refines the family with [separating
//!   sequences](separating::find_separating_sequence) until every member has its own output
//!   signature.
//!
//! Conditional automata should be specified using the [builder](ConditionalAutomatonBuilder).

pub mod automaton;
pub mod error;
pub mod features;
pub mod fingerprint;
pub mod gviz;
pub mod mealy;
pub mod separating;
pub mod simulator;

pub use automaton::{ConditionalAutomaton, ConditionalAutomatonBuilder};
pub use features::{unify, Features};
pub use fingerprint::{compute_fingerprint_sequences, Fingerprint};
pub use mealy::{MealyBuilder, MealyMachine, Transducer};
pub use simulator::ConditionalSimulator;
