//! Errors reported by the conditional automaton, its simulator and the fingerprinting search.

use crate::features::Features;
use thiserror::Error;

/// The supplied model is malformed and no core operation can run on it.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("no initial state given, call .with_initial(state) before .build()")]
    MissingInitialState,

    #[error("state {0} is referenced but was never declared")]
    UnknownState(String),

    #[error("feature {0} is not part of the declared universe")]
    UnknownFeature(String),

    #[error("label {0:?} is not of the form input/output")]
    MalformedLabel(String),

    #[error("the feature universe is empty")]
    EmptyUniverse,

    #[error("state {state} has more than one transition on input {input}")]
    Nondeterministic { state: String, input: String },
}

/// Simulating a [conditional automaton](crate::automaton::ConditionalAutomaton) failed.
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    /// No live branch can take `input` under `features`. The simulator is left unchanged.
    #[error("invalid input {input} given the features {features}")]
    InfeasibleStep { input: String, features: Features },
}

/// Searching the product of two transducers did not produce a separating sequence.
#[derive(Debug, Error, PartialEq)]
pub enum SeparationError {
    /// Every reachable pair of states agrees on all inputs.
    #[error("no separating sequence exists, the transducers are observably identical")]
    Indistinguishable,

    /// The caller-supplied exploration cap was hit before a verdict.
    #[error("exploration stopped after {explored} product states")]
    ExplorationLimit { explored: usize },
}

/// The family could not be fingerprinted.
#[derive(Debug, Error, PartialEq)]
pub enum FingerprintError {
    #[error("family members {first} and {second} cannot be told apart")]
    Indistinguishable { first: usize, second: usize },

    #[error(transparent)]
    Search(#[from] SeparationError),
}
