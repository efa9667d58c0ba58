use crate::error::BuildError;
use crate::features::{parse_delimited, parse_label, FeatureSet};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, info};

/// Input symbol offered by [ConditionalAutomaton::reset_when_sink].
pub const RESET_INPUT: &str = "RESET-SYS";

/// Output symbol of transitions added by the structural transforms.
pub const EPSILON: &str = "epsilon";

/// Index of a state inside the state arena of a [ConditionalAutomaton].
///
/// Ids are only handed out by the automaton they index into.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StateId(usize);

impl StateId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A state together with the features under which it is meaningful.
///
/// Equality only looks at the name.
#[derive(Clone, Debug)]
pub struct ConditionalState {
    pub name: String,
    pub features: FeatureSet,
}

impl PartialEq for ConditionalState {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ConditionalState {}

impl fmt::Display for ConditionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?})", self.name, self.features)
    }
}

/// Describes a single feature-gated transition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConditionalTransition {
    pub from: StateId,
    pub to: StateId,
    pub input: String,
    pub output: String,
    pub features: FeatureSet,
}

/// A finite-state transducer whose transitions are gated by feature configurations.
///
/// Several transitions may share a source state and input with overlapping features, which makes
/// the automaton nondeterministic. Use the [builder](ConditionalAutomatonBuilder) to create one
/// and a [simulator](crate::simulator::ConditionalSimulator) to run it.
#[derive(Clone, Debug)]
pub struct ConditionalAutomaton {
    // First-seen order over the transition list.
    states: Vec<ConditionalState>,

    // Insertion order is the order outputs are collected in.
    transitions: Vec<ConditionalTransition>,

    alphabet: BTreeSet<String>,
    initial: StateId,
    universe: FeatureSet,
}

impl ConditionalAutomaton {
    fn new(
        states: Vec<ConditionalState>,
        transitions: Vec<ConditionalTransition>,
        initial: StateId,
        universe: FeatureSet,
    ) -> Self {
        let alphabet = transitions.iter().map(|t| t.input.clone()).collect();
        ConditionalAutomaton {
            states,
            transitions,
            alphabet,
            initial,
            universe,
        }
    }

    pub fn initial(&self) -> StateId {
        self.initial
    }

    pub fn universe(&self) -> &FeatureSet {
        &self.universe
    }

    pub fn alphabet(&self) -> &BTreeSet<String> {
        &self.alphabet
    }

    pub fn transitions(&self) -> &[ConditionalTransition] {
        &self.transitions
    }

    /// # Panics
    ///
    /// Panics if `id` was handed out by a different automaton with more states. Use
    /// [ConditionalAutomaton::get_state] when the origin of `id` is unknown.
    pub fn state(&self, id: StateId) -> &ConditionalState {
        &self.states[id.0]
    }

    pub fn get_state(&self, id: StateId) -> Option<&ConditionalState> {
        self.states.get(id.0)
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &ConditionalState)> {
        self.states
            .iter()
            .enumerate()
            .map(|(idx, state)| (StateId(idx), state))
    }

    /// Look up a state by name.
    pub fn find_state(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|state| state.name == name)
            .map(StateId)
    }

    pub fn outgoing_transitions_of(
        &self,
        state: StateId,
    ) -> impl Iterator<Item = &ConditionalTransition> {
        self.transitions.iter().filter(move |t| t.from == state)
    }

    pub fn incoming_transitions_of(
        &self,
        state: StateId,
    ) -> impl Iterator<Item = &ConditionalTransition> {
        self.transitions.iter().filter(move |t| t.to == state)
    }

    /// Input symbols of this automaton that `alphabet` does not contain.
    ///
    /// Useful to align a plain transducer with this automaton before comparing them.
    pub fn missing_inputs<'a, I>(&self, alphabet: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: BTreeSet<&str> = alphabet.into_iter().collect();
        self.alphabet
            .iter()
            .filter(|symbol| !known.contains(symbol.as_str()))
            .cloned()
            .collect()
    }

    /// Close every gap in the transition relation with an `epsilon` self-loop.
    ///
    /// Afterwards, for every state `s`, every feature of `s` and every input symbol, some
    /// transition out of `s` on that symbol is valid under that feature. Calling this again adds
    /// nothing because the self-loops count toward the coverage.
    ///
    /// ```
    /// use rust_ffsm::automaton::ConditionalAutomatonBuilder;
    ///
    /// let mut ffsm = ConditionalAutomatonBuilder::new("f1|f2")
    ///     .with_state("s", "True")
    ///     .with_transition("s", "s", "x/o", "f1")
    ///     .with_initial("s")
    ///     .build()
    ///     .unwrap();
    ///
    /// ffsm.make_input_complete();
    /// assert_eq!(ffsm.transitions().len(), 2);
    /// assert_eq!(ffsm.transitions()[1].output, "epsilon");
    /// ```
    pub fn make_input_complete(&mut self) {
        let mut added = Vec::new();

        for (id, state) in self.states() {
            let mut covered: HashMap<&str, FeatureSet> = self
                .alphabet
                .iter()
                .map(|input| (input.as_str(), FeatureSet::new()))
                .collect();

            for transition in self.outgoing_transitions_of(id) {
                covered
                    .entry(transition.input.as_str())
                    .or_default()
                    .extend(transition.features.iter().cloned());
            }

            for input in &self.alphabet {
                let features: FeatureSet = match covered.get(input.as_str()) {
                    Some(union) => state.features.difference(union).cloned().collect(),
                    None => state.features.clone(),
                };

                if !features.is_empty() {
                    debug!(
                        "complete {} on {} for features {:?}",
                        state.name, input, features
                    );
                    added.push(ConditionalTransition {
                        from: id,
                        to: id,
                        input: input.clone(),
                        output: EPSILON.into(),
                        features,
                    });
                }
            }
        }

        info!("input completion added {} transitions", added.len());
        self.transitions.extend(added);
    }

    /// Offer a way back to the initial state wherever a feature would otherwise be stuck.
    ///
    /// A state `s` is a sink for feature `f` when `f` is a feature of `s` and no transition out
    /// of `s` that admits `f` reaches a different state. For each such pair a
    /// [RESET_INPUT] transition to the initial state, valid only under `{f}`, is added. Resets
    /// for different features of the same state are kept as separate transitions.
    pub fn reset_when_sink(&mut self) {
        let mut added = Vec::new();

        for feature in &self.universe {
            for (id, state) in self.states() {
                if !state.features.contains(feature) {
                    continue;
                }

                let is_sink = !self
                    .outgoing_transitions_of(id)
                    .any(|t| t.features.contains(feature) && t.to != id);

                if is_sink {
                    debug!("{} is a sink for feature {}", state.name, feature);
                    added.push(ConditionalTransition {
                        from: id,
                        to: self.initial,
                        input: RESET_INPUT.into(),
                        output: EPSILON.into(),
                        features: FeatureSet::from([feature.clone()]),
                    });
                }
            }
        }

        if !added.is_empty() {
            self.alphabet.insert(RESET_INPUT.into());
        }

        info!("sink reset added {} transitions", added.len());
        self.transitions.extend(added);
    }
}

impl fmt::Display for ConditionalAutomaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in &self.transitions {
            writeln!(
                f,
                "({}, {}, {}/{}, {:?})",
                self.state(t.from),
                self.state(t.to),
                t.input,
                t.output,
                t.features
            )?;
        }
        Ok(())
    }
}

/// Split an `input/output` label into its symbols, dropping embedded spaces.
///
/// ```
/// use rust_ffsm::automaton::parse_io_label;
///
/// assert_eq!(
///     parse_io_label("coin 1 / tea").unwrap(),
///     ("coin1".to_string(), "tea".to_string())
/// );
/// assert!(parse_io_label("no output").is_err());
/// ```
pub fn parse_io_label(label: &str) -> Result<(String, String), BuildError> {
    let parts: Vec<String> = label.split('/').map(|p| p.replace(' ', "")).collect();
    match parts.as_slice() {
        [input, output] if !input.is_empty() => Ok((input.clone(), output.clone())),
        _ => Err(BuildError::MalformedLabel(label.into())),
    }
}

struct RawTransition {
    from: String,
    to: String,
    label: String,
    features: String,
}

/// Helps with specifying [ConditionalAutomata](ConditionalAutomaton).
///
/// This mirrors what a model loader hands over: a `|`-delimited feature universe, states tagged
/// with feature labels (`True` meaning every feature), transitions labelled `input/output` and
/// a start state. All parsing and validation happens in [build](Self::build).
pub struct ConditionalAutomatonBuilder {
    universe: String,
    states: Vec<(String, String)>,
    transitions: Vec<RawTransition>,
    initial: Option<String>,
}

impl ConditionalAutomatonBuilder {
    /// Create a new builder over the `|`-delimited feature universe.
    pub fn new(universe: &str) -> Self {
        ConditionalAutomatonBuilder {
            universe: universe.into(),
            states: Vec::new(),
            transitions: Vec::new(),
            initial: None,
        }
    }

    /// Declare state `name`, valid under the features in `features`.
    pub fn with_state(mut self, name: &str, features: &str) -> Self {
        self.states.push((name.into(), features.into()));
        self
    }

    /// Add a transition from `from` to `to` labelled `input/output`.
    pub fn with_transition(mut self, from: &str, to: &str, label: &str, features: &str) -> Self {
        info!("add transition {} to {} on {}", from, to, label);
        self.transitions.push(RawTransition {
            from: from.into(),
            to: to.into(),
            label: label.into(),
            features: features.into(),
        });
        self
    }

    /// Mark state `name` as the initial state.
    pub fn with_initial(mut self, name: &str) -> Self {
        self.initial = Some(name.into());
        self
    }

    /// Validate the declarations and create the automaton.
    pub fn build(self) -> Result<ConditionalAutomaton, BuildError> {
        let universe = parse_delimited(&self.universe);
        if universe.is_empty() {
            return Err(BuildError::EmptyUniverse);
        }

        let mut declared = HashMap::new();
        for (name, label) in &self.states {
            let features = parse_label(label, &universe)?;
            declared.insert(name.as_str(), features);
        }

        let mut states: Vec<ConditionalState> = Vec::new();
        let mut intern = |name: &str| -> Result<StateId, BuildError> {
            if let Some(idx) = states.iter().position(|s| s.name == name) {
                return Ok(StateId(idx));
            }
            let features = declared
                .get(name)
                .ok_or_else(|| BuildError::UnknownState(name.into()))?;
            states.push(ConditionalState {
                name: name.into(),
                features: features.clone(),
            });
            Ok(StateId(states.len() - 1))
        };

        let mut transitions = Vec::with_capacity(self.transitions.len());
        for raw in &self.transitions {
            let from = intern(&raw.from)?;
            let to = intern(&raw.to)?;
            let (input, output) = parse_io_label(&raw.label)?;
            let features = parse_label(&raw.features, &universe)?;
            transitions.push(ConditionalTransition {
                from,
                to,
                input,
                output,
                features,
            });
        }

        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        let initial = intern(&initial)?;

        info!(
            "build conditional automaton with {} states and {} transitions",
            states.len(),
            transitions.len()
        );
        Ok(ConditionalAutomaton::new(
            states,
            transitions,
            initial,
            universe,
        ))
    }
}
