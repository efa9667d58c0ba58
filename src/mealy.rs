use crate::automaton::{ConditionalAutomaton, EPSILON, RESET_INPUT};
use crate::error::BuildError;
use crate::separating::{separating_sequence_from, SearchConfig};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, info};

/// Outputs observed while replaying an input sequence. `None` marks inputs the transducer had
/// no transition for, and everything after the first one.
pub type Trace = Vec<Option<String>>;

/// A deterministic Mealy-style transducer with at most one transition per (state, input).
///
/// This is the contract the separating sequence search and the fingerprinting work against.
/// [MealyMachine] is the implementation shipped with this crate.
pub trait Transducer {
    type State: Clone + Debug + Eq + Hash;

    fn initial_state(&self) -> Self::State;

    /// Input symbols in a fixed order. The order decides which of several equally short
    /// separating sequences is reported.
    fn input_alphabet(&self) -> Vec<String>;

    /// Take the transition on `input`, returning the next state and its output.
    fn step(&self, state: &Self::State, input: &str) -> Option<(Self::State, String)>;

    /// Input sequences that together tell every pair of inequivalent states apart.
    fn characterization_set(&self) -> Vec<Vec<String>>;

    fn output_trace_from(&self, state: &Self::State, inputs: &[String]) -> Trace {
        let mut current = Some(state.clone());
        inputs
            .iter()
            .map(|input| {
                let (next, output) = current.as_ref().and_then(|s| self.step(s, input)).unzip();
                current = next;
                output
            })
            .collect()
    }

    fn output_trace(&self, inputs: &[String]) -> Trace {
        self.output_trace_from(&self.initial_state(), inputs)
    }
}

/// Index of a state of a [MealyMachine].
pub type MealyState = usize;

/// A deterministic Mealy machine over string symbols.
///
/// Use the [builder](MealyBuilder) to create one.
#[derive(Clone, Debug)]
pub struct MealyMachine {
    names: Vec<String>,

    // Per state, the (target, output) pair for each input.
    transitions: Vec<BTreeMap<String, (MealyState, String)>>,

    alphabet: BTreeSet<String>,
    initial: MealyState,
}

impl MealyMachine {
    pub fn state_name(&self, state: MealyState) -> &str {
        &self.names[state]
    }

    pub fn size(&self) -> usize {
        self.names.len()
    }

    /// Build the variant of `ffsm` that only has feature `feature`.
    ///
    /// States and transitions not admitting `feature` are dropped. Fails when the remaining
    /// transitions are not deterministic.
    pub fn project(ffsm: &ConditionalAutomaton, feature: &str) -> Result<Self, BuildError> {
        if !ffsm.universe().contains(feature) {
            return Err(BuildError::UnknownFeature(feature.into()));
        }

        let mut builder = MealyBuilder::new();
        for t in ffsm.transitions() {
            if t.features.contains(feature) && ffsm.state(t.from).features.contains(feature) {
                builder = builder.with_transition(
                    &ffsm.state(t.from).name,
                    &t.input,
                    &t.output,
                    &ffsm.state(t.to).name,
                );
            }
        }

        builder
            .with_initial(&ffsm.state(ffsm.initial()).name)
            .build()
    }

    /// Give every state whose transitions all loop back to itself an `epsilon` transition to
    /// the initial state on [RESET_INPUT].
    pub fn reset_when_sink(&mut self) {
        let mut added = 0;
        for (state, edges) in self.transitions.iter_mut().enumerate() {
            if edges.values().all(|(to, _)| *to == state) {
                edges.insert(RESET_INPUT.into(), (self.initial, EPSILON.into()));
                added += 1;
            }
        }

        if added > 0 {
            self.alphabet.insert(RESET_INPUT.into());
        }
        info!("sink reset added {} transitions", added);
    }

    /// Add `epsilon` self-loops on the initial state for each of `inputs` it has no transition
    /// for. Together with [make_input_complete](Self::make_input_complete) this aligns the
    /// alphabet with a reference model.
    pub fn add_self_loops<I, S>(&mut self, inputs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let initial = self.initial;
        for input in inputs {
            let input = input.into();
            self.alphabet.insert(input.clone());
            self.transitions[initial]
                .entry(input)
                .or_insert((initial, EPSILON.into()));
        }
    }

    /// Add an `epsilon` self-loop for every undefined (state, input) pair.
    pub fn make_input_complete(&mut self) {
        for (state, edges) in self.transitions.iter_mut().enumerate() {
            for input in &self.alphabet {
                edges
                    .entry(input.clone())
                    .or_insert((state, EPSILON.into()));
            }
        }
    }

    /// Both machines side by side. The result starts in the initial state of `self`; states of
    /// `other` are only reachable through their own indices.
    pub fn disjoint_union(&self, other: &MealyMachine) -> MealyMachine {
        let offset = self.size();
        let names = self
            .names
            .iter()
            .map(|n| format!("0.{}", n))
            .chain(other.names.iter().map(|n| format!("1.{}", n)))
            .collect();

        let transitions = self
            .transitions
            .iter()
            .cloned()
            .chain(other.transitions.iter().map(|edges| {
                edges
                    .iter()
                    .map(|(input, (to, output))| (input.clone(), (to + offset, output.clone())))
                    .collect()
            }))
            .collect();

        MealyMachine {
            names,
            transitions,
            alphabet: self.alphabet.union(&other.alphabet).cloned().collect(),
            initial: self.initial,
        }
    }

    fn distinguished_by(&self, w: &[Vec<String>], p: MealyState, q: MealyState) -> bool {
        w.iter()
            .any(|seq| self.output_trace_from(&p, seq) != self.output_trace_from(&q, seq))
    }
}

impl Transducer for MealyMachine {
    type State = MealyState;

    fn initial_state(&self) -> MealyState {
        self.initial
    }

    fn input_alphabet(&self) -> Vec<String> {
        self.alphabet.iter().cloned().collect()
    }

    fn step(&self, state: &MealyState, input: &str) -> Option<(MealyState, String)> {
        self.transitions.get(*state)?.get(input).cloned()
    }

    /// For each pair of states in index order that the set does not yet tell apart, add their
    /// shortest separating sequence.
    fn characterization_set(&self) -> Vec<Vec<String>> {
        let mut w: Vec<Vec<String>> = Vec::new();
        let unbounded = SearchConfig::default();

        for p in 0..self.size() {
            for q in (p + 1)..self.size() {
                if self.distinguished_by(&w, p, q) {
                    continue;
                }

                // Unbounded, so the only possible failure is equivalence.
                if let Ok(seq) = separating_sequence_from(self, p, self, q, &unbounded) {
                    debug!(
                        "{} and {} separated by {:?}",
                        self.names[p], self.names[q], seq
                    );
                    w.push(seq);
                } else {
                    debug!("{} and {} are equivalent", self.names[p], self.names[q]);
                }
            }
        }

        w
    }
}

/// Helps with specifying [MealyMachines](MealyMachine).
///
/// ```
/// use rust_ffsm::mealy::{MealyBuilder, Transducer};
///
/// let machine = MealyBuilder::new()
///     .with_transition("s0", "a", "0", "s1")
///     .with_transition("s1", "a", "1", "s0")
///     .with_initial("s0")
///     .build()
///     .unwrap();
///
/// let trace = machine.output_trace(&["a".into(), "a".into(), "b".into()]);
/// assert_eq!(trace, vec![Some("0".into()), Some("1".into()), None]);
/// ```
#[derive(Default)]
pub struct MealyBuilder {
    transitions: Vec<(String, String, String, String)>,
    initial: Option<String>,
}

impl MealyBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a transition from `from` to `to` reading `input` and emitting `output`.
    pub fn with_transition(mut self, from: &str, input: &str, output: &str, to: &str) -> Self {
        self.transitions
            .push((from.into(), input.into(), output.into(), to.into()));
        self
    }

    pub fn with_initial(mut self, state: &str) -> Self {
        self.initial = Some(state.into());
        self
    }

    pub fn build(self) -> Result<MealyMachine, BuildError> {
        let mut names: Vec<String> = Vec::new();
        let mut intern = |name: &str| match names.iter().position(|n| n == name) {
            Some(idx) => idx,
            None => {
                names.push(name.into());
                names.len() - 1
            }
        };

        let mut edges = Vec::with_capacity(self.transitions.len());
        for (from, input, output, to) in &self.transitions {
            edges.push((intern(from), input, output, intern(to)));
        }
        let initial = intern(&self.initial.ok_or(BuildError::MissingInitialState)?);

        let mut transitions = vec![BTreeMap::new(); names.len()];
        let mut alphabet = BTreeSet::new();
        for (from, input, output, to) in edges {
            alphabet.insert(input.clone());
            if transitions[from]
                .insert(input.clone(), (to, output.clone()))
                .is_some()
            {
                return Err(BuildError::Nondeterministic {
                    state: names[from].clone(),
                    input: input.clone(),
                });
            }
        }

        info!("build mealy machine with {} states", names.len());
        Ok(MealyMachine {
            names,
            transitions,
            alphabet,
            initial,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::ConditionalAutomatonBuilder;

    fn seq(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    // Counts `a` modulo three and reports on `b` whether the count is zero.
    fn mod_three() -> MealyMachine {
        MealyBuilder::new()
            .with_transition("c0", "a", "-", "c1")
            .with_transition("c1", "a", "-", "c2")
            .with_transition("c2", "a", "-", "c0")
            .with_transition("c0", "b", "yes", "c0")
            .with_transition("c1", "b", "no", "c1")
            .with_transition("c2", "b", "no", "c2")
            .with_initial("c0")
            .build()
            .unwrap()
    }

    #[test]
    fn build_rejects_nondeterminism() {
        let err = MealyBuilder::new()
            .with_transition("s", "a", "0", "s")
            .with_transition("s", "a", "1", "t")
            .with_initial("s")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::Nondeterministic {
                state: "s".into(),
                input: "a".into()
            }
        );
        assert_eq!(
            MealyBuilder::new().build().unwrap_err(),
            BuildError::MissingInitialState
        );
    }

    #[test]
    fn characterization_set_separates_all_states() {
        let machine = mod_three();
        let w = machine.characterization_set();
        assert_eq!(w, vec![seq(&["b"]), seq(&["a", "b"])]);

        for p in 0..machine.size() {
            for q in (p + 1)..machine.size() {
                assert!(machine.distinguished_by(&w, p, q));
            }
        }
    }

    #[test]
    fn characterization_set_skips_equivalent_states() {
        let machine = MealyBuilder::new()
            .with_transition("p", "a", "0", "q")
            .with_transition("q", "a", "0", "p")
            .with_initial("p")
            .build()
            .unwrap();
        assert!(machine.characterization_set().is_empty());
    }

    #[test]
    fn equivalent_pair_does_not_stop_later_pairs() {
        // p and q are equivalent, r answers differently on `a`.
        let machine = MealyBuilder::new()
            .with_transition("p", "a", "0", "q")
            .with_transition("q", "a", "0", "p")
            .with_transition("r", "a", "1", "p")
            .with_initial("p")
            .build()
            .unwrap();
        let w = machine.characterization_set();
        assert_eq!(w, vec![seq(&["a"])]);
        assert!(!machine.distinguished_by(&w, 0, 1));
        assert!(machine.distinguished_by(&w, 0, 2));
        assert!(machine.distinguished_by(&w, 1, 2));
    }

    #[test]
    fn sink_reset_and_completion() {
        let mut machine = MealyBuilder::new()
            .with_transition("s0", "go", "1", "s1")
            .with_transition("s1", "go", "0", "s1")
            .with_initial("s0")
            .build()
            .unwrap();

        machine.reset_when_sink();
        assert_eq!(
            machine.step(&1, RESET_INPUT),
            Some((0, EPSILON.to_string()))
        );
        assert_eq!(machine.step(&0, RESET_INPUT), None);

        machine.make_input_complete();
        assert_eq!(
            machine.step(&0, RESET_INPUT),
            Some((0, EPSILON.to_string()))
        );
    }

    #[test]
    fn self_loops_for_missing_inputs() {
        let mut machine = mod_three();
        machine.add_self_loops(["c"]);
        machine.make_input_complete();

        assert_eq!(machine.input_alphabet(), seq(&["a", "b", "c"]));
        assert_eq!(machine.step(&0, "c"), Some((0, EPSILON.to_string())));
        assert_eq!(machine.step(&2, "c"), Some((2, EPSILON.to_string())));
    }

    #[test]
    fn projection_of_conditional_automaton() {
        let ffsm = ConditionalAutomatonBuilder::new("tea|coffee")
            .with_state("idle", "True")
            .with_state("paid", "True")
            .with_transition("idle", "paid", "coin/ok", "True")
            .with_transition("paid", "idle", "push/tea", "tea")
            .with_transition("paid", "idle", "push/coffee", "coffee")
            .with_initial("idle")
            .build()
            .unwrap();

        let tea = MealyMachine::project(&ffsm, "tea").unwrap();
        assert_eq!(
            tea.output_trace(&seq(&["coin", "push"])),
            vec![Some("ok".into()), Some("tea".into())]
        );
        assert!(MealyMachine::project(&ffsm, "cocoa").is_err());
    }

    #[test]
    fn disjoint_union_keeps_both_sides() {
        let left = mod_three();
        let union = left.disjoint_union(&left);
        assert_eq!(union.size(), 6);
        assert_eq!(union.state_name(3), "1.c0");
        assert_eq!(union.step(&3, "a"), Some((4, "-".to_string())));
        // Both halves are the same machine, so nothing new needs separating.
        assert_eq!(union.characterization_set(), left.characterization_set());
    }
}
