//! # Simulator Module
//!
//! Runs a [ConditionalAutomaton] without knowing which product variant is being observed. The
//! simulator keeps every (state, features) branch that is consistent with the inputs and feature
//! assertions seen so far, and prunes branches as soon as their features become infeasible.
//!
//! ```
//! use rust_ffsm::automaton::ConditionalAutomatonBuilder;
//! use rust_ffsm::features::Features;
//! use rust_ffsm::simulator::ConditionalSimulator;
//!
//! let ffsm = ConditionalAutomatonBuilder::new("tea|coffee")
//!     .with_state("idle", "True")
//!     .with_transition("idle", "idle", "coin/tea", "tea")
//!     .with_transition("idle", "idle", "coin/coffee", "coffee")
//!     .with_initial("idle")
//!     .build()
//!     .unwrap();
//!
//! let mut sim = ConditionalSimulator::new(&ffsm);
//! assert_eq!(sim.step("coin", &Features::Unconstrained).unwrap().len(), 2);
//!
//! let outputs = sim.step("coin", &Features::only(["tea"])).unwrap();
//! assert_eq!(outputs, vec![("tea".to_string(), Features::only(["tea"]))]);
//! ```

use crate::automaton::{ConditionalAutomaton, StateId};
use crate::error::SimulationError;
use crate::features::{unify, FeatureSet, Features};
use tracing::{debug, info, warn};

/// A (state, features) branch of the live configuration.
pub type Branch = (StateId, Features);

/// Tracks every (state, features) branch of a [ConditionalAutomaton] consistent with the inputs
/// seen so far.
#[derive(Clone, Debug)]
pub struct ConditionalSimulator<'a> {
    automaton: &'a ConditionalAutomaton,

    // Duplicate free, kept in the order branches were discovered.
    live: Vec<Branch>,
}

impl<'a> ConditionalSimulator<'a> {
    pub fn new(automaton: &'a ConditionalAutomaton) -> Self {
        let mut sim = ConditionalSimulator {
            automaton,
            live: Vec::new(),
        };
        sim.reset();
        sim
    }

    /// Return to the initial state under the full feature universe.
    pub fn reset(&mut self) {
        self.live = vec![(
            self.automaton.initial(),
            Features::Only(self.automaton.universe().clone()),
        )];
    }

    pub fn live_configuration(&self) -> &[Branch] {
        &self.live
    }

    /// Features that at least one live branch still admits.
    pub fn possible_features(&self) -> Features {
        let mut union = FeatureSet::new();
        for (_, features) in &self.live {
            match features {
                Features::Unconstrained => return Features::Unconstrained,
                Features::Only(set) => union.extend(set.iter().cloned()),
            }
        }
        Features::Only(union)
    }

    /// Advance every live branch on `input` under the asserted `features_in`.
    ///
    /// Returns one `(output, features)` entry per transition taken. When no branch survives, an
    /// [InfeasibleStep](SimulationError::InfeasibleStep) is returned and the live configuration is
    /// left untouched.
    pub fn step(
        &mut self,
        input: &str,
        features_in: &Features,
    ) -> Result<Vec<(String, Features)>, SimulationError> {
        let mut next: Vec<Branch> = Vec::new();
        let mut outputs = Vec::new();

        for (state, config) in &self.live {
            let features = unify(config, features_in);
            if features.is_infeasible() {
                debug!(
                    "drop branch {} under {}",
                    self.automaton.state(*state).name,
                    config
                );
                continue;
            }

            for transition in self
                .automaton
                .outgoing_transitions_of(*state)
                .filter(|t| t.input == input)
            {
                let taken = unify(&features, &Features::Only(transition.features.clone()));
                if taken.is_infeasible() {
                    continue;
                }

                debug!(
                    "{} -{}/{}-> {} under {}",
                    self.automaton.state(*state).name,
                    input,
                    transition.output,
                    self.automaton.state(transition.to).name,
                    taken
                );

                outputs.push((transition.output.clone(), taken.clone()));
                let branch = (transition.to, taken);
                if !next.contains(&branch) {
                    next.push(branch);
                }
            }
        }

        if next.is_empty() {
            warn!("invalid input {} given the features {}", input, features_in);
            return Err(SimulationError::InfeasibleStep {
                input: input.into(),
                features: features_in.clone(),
            });
        }

        info!("input {} leaves {} live branches", input, next.len());
        self.live = next;
        Ok(outputs)
    }

    /// Feed a whole input sequence without asserting features.
    ///
    /// Stops at the first infeasible step; the steps before it stay applied.
    pub fn run<I, S>(&mut self, inputs: I) -> Result<Vec<Vec<(String, Features)>>, SimulationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        inputs
            .into_iter()
            .map(|input| self.step(input.as_ref(), &Features::Unconstrained))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{ConditionalAutomatonBuilder, RESET_INPUT};

    // A vending machine family: every variant takes coins, only `tea` and `coffee` brew drinks,
    // `broken` swallows the coin and stays stuck in `paid`.
    fn vending() -> ConditionalAutomaton {
        ConditionalAutomatonBuilder::new("tea|coffee|broken")
            .with_state("idle", "True")
            .with_state("paid", "True")
            .with_transition("idle", "paid", "coin/ok", "True")
            .with_transition("paid", "idle", "push/tea", "tea")
            .with_transition("paid", "idle", "push/coffee", "coffee")
            .with_transition("paid", "paid", "push/none", "broken")
            .with_initial("idle")
            .build()
            .unwrap()
    }

    fn outputs_of(outputs: &[(String, Features)]) -> Vec<&str> {
        outputs.iter().map(|(o, _)| o.as_str()).collect()
    }

    #[test]
    fn starts_in_initial_state_with_all_features() {
        let ffsm = vending();
        let sim = ConditionalSimulator::new(&ffsm);
        assert_eq!(
            sim.live_configuration(),
            &[(ffsm.initial(), Features::only(["tea", "coffee", "broken"]))]
        );
    }

    #[test]
    fn branches_split_and_follow_insertion_order() {
        let ffsm = vending();
        let mut sim = ConditionalSimulator::new(&ffsm);

        let outputs = sim.step("coin", &Features::Unconstrained).unwrap();
        assert_eq!(outputs_of(&outputs), vec!["ok"]);

        let outputs = sim.step("push", &Features::Unconstrained).unwrap();
        assert_eq!(outputs_of(&outputs), vec!["tea", "coffee", "none"]);
        assert_eq!(sim.live_configuration().len(), 3);
        assert_eq!(
            sim.possible_features(),
            Features::only(["tea", "coffee", "broken"])
        );
    }

    #[test]
    fn asserted_features_prune_branches() {
        let ffsm = vending();
        let mut sim = ConditionalSimulator::new(&ffsm);

        sim.step("coin", &Features::only(["coffee", "broken"]))
            .unwrap();
        let outputs = sim.step("push", &Features::Unconstrained).unwrap();
        assert_eq!(outputs_of(&outputs), vec!["coffee", "none"]);

        let outputs = sim.step("push", &Features::only(["broken"])).unwrap();
        assert_eq!(outputs, vec![("none".into(), Features::only(["broken"]))]);
        assert_eq!(sim.possible_features(), Features::only(["broken"]));
    }

    #[test]
    fn infeasible_step_leaves_configuration_untouched() {
        let ffsm = vending();
        let mut sim = ConditionalSimulator::new(&ffsm);
        sim.step("coin", &Features::only(["tea"])).unwrap();
        let before = sim.live_configuration().to_vec();

        let err = sim.step("push", &Features::only(["coffee"])).unwrap_err();
        assert_eq!(
            err,
            SimulationError::InfeasibleStep {
                input: "push".into(),
                features: Features::only(["coffee"]),
            }
        );
        assert_eq!(sim.live_configuration(), before.as_slice());

        // An unknown input fails the same way.
        assert!(sim.step("kick", &Features::Unconstrained).is_err());
        assert_eq!(sim.live_configuration(), before.as_slice());
    }

    #[test]
    fn empty_assertion_is_not_unconstrained() {
        let ffsm = vending();
        let mut sim = ConditionalSimulator::new(&ffsm);

        assert!(sim
            .step("coin", &Features::Only(FeatureSet::new()))
            .is_err());
        assert!(sim.step("coin", &Features::Unconstrained).is_ok());
    }

    #[test]
    fn duplicate_branches_collapse() {
        let ffsm = ConditionalAutomatonBuilder::new("f1")
            .with_state("s", "True")
            .with_state("t", "True")
            .with_transition("s", "t", "a/x", "f1")
            .with_transition("s", "t", "a/y", "f1")
            .with_initial("s")
            .build()
            .unwrap();
        let mut sim = ConditionalSimulator::new(&ffsm);

        let outputs = sim.step("a", &Features::Unconstrained).unwrap();
        assert_eq!(outputs_of(&outputs), vec!["x", "y"]);
        assert_eq!(sim.live_configuration().len(), 1);
    }

    #[test]
    fn reset_transition_escapes_sink() {
        let mut ffsm = vending();
        ffsm.reset_when_sink();
        ffsm.make_input_complete();

        let mut sim = ConditionalSimulator::new(&ffsm);
        sim.run(["coin", "push", "push"]).unwrap();

        let outputs = sim.step(RESET_INPUT, &Features::only(["broken"])).unwrap();
        assert_eq!(outputs, vec![("epsilon".into(), Features::only(["broken"]))]);
        assert_eq!(sim.live_configuration()[0].0, ffsm.initial());

        sim.reset();
        assert_eq!(sim.live_configuration().len(), 1);
    }

    #[test]
    fn debug_shows_live_branches() {
        let ffsm = vending();
        let sim = ConditionalSimulator::new(&ffsm);
        let debug = format!("{:?}", sim);
        assert!(debug.starts_with("ConditionalSimulator"));
        assert!(debug.contains("live"));
        assert!(debug.contains("\"idle\""));
    }
}
