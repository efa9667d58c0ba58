use crate::automaton::ConditionalAutomaton;
use crate::features::{FeatureSet, ALL_FEATURES, FEATURE_DELIMITER};

/// Graphviz rendering of a [ConditionalAutomaton] in the format model loaders read: the feature
/// universe as the `configurations` graph attribute, a `feature` attribute on every node and
/// edge, `input/output` edge labels and an edge from `__start0` to the initial state.
pub struct GvGraph {
    configurations: String,
    initial: String,
    nodes: Vec<GvNode>,
    edges: Vec<GvEdge>,
}

struct GvNode {
    label: String,
    feature: String,
}

struct GvEdge {
    label: String,
    feature: String,
    head: String,
    tail: String,
}

fn feature_label(features: &FeatureSet, universe: &FeatureSet) -> String {
    if features == universe {
        return ALL_FEATURES.into();
    }
    let names: Vec<&str> = features.iter().map(String::as_str).collect();
    names.join(FEATURE_DELIMITER.to_string().as_str())
}

impl From<GvGraph> for String {
    fn from(graph: GvGraph) -> Self {
        let mut dot = String::new();

        dot.push_str("digraph ffsm {\n");
        dot.push_str(&format!(
            "configurations=\"{}\";\n",
            graph.configurations
        ));
        dot.push_str("rankdir=LR;\n");
        dot.push_str("__start0 [label=\"\" shape=none];\n");

        for node in graph.nodes {
            dot.push_str(&format!(
                "\"{}\" [shape=circle feature=\"{}\"];\n",
                node.label, node.feature
            ));
        }

        dot.push_str(&format!("__start0 -> \"{}\";\n", graph.initial));
        for edge in graph.edges {
            dot.push_str(&format!(
                "\"{}\" -> \"{}\" [label=\"{}\" feature=\"{}\"];\n",
                edge.head, edge.tail, edge.label, edge.feature
            ));
        }

        dot.push_str("}\n");

        dot
    }
}

impl From<&ConditionalAutomaton> for GvGraph {
    fn from(ffsm: &ConditionalAutomaton) -> Self {
        let universe = ffsm.universe();

        let nodes = ffsm
            .states()
            .map(|(_, state)| GvNode {
                label: state.name.clone(),
                feature: feature_label(&state.features, universe),
            })
            .collect();

        let edges = ffsm
            .transitions()
            .iter()
            .map(|t| GvEdge {
                label: format!("{}/{}", t.input, t.output),
                feature: feature_label(&t.features, universe),
                head: ffsm.state(t.from).name.clone(),
                tail: ffsm.state(t.to).name.clone(),
            })
            .collect();

        GvGraph {
            configurations: feature_label(universe, &FeatureSet::new()),
            initial: ffsm.state(ffsm.initial()).name.clone(),
            nodes,
            edges,
        }
    }
}

/// Render `ffsm` as a DOT document.
pub fn render(ffsm: &ConditionalAutomaton) -> String {
    GvGraph::from(ffsm).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::ConditionalAutomatonBuilder;

    #[test]
    fn renders_features_and_start_marker() {
        let mut ffsm = ConditionalAutomatonBuilder::new("f1|f2")
            .with_state("S", "True")
            .with_transition("S", "S", "x/o", "f1")
            .with_initial("S")
            .build()
            .unwrap();
        ffsm.make_input_complete();

        let dot = render(&ffsm);
        assert!(dot.starts_with("digraph ffsm {\n"));
        assert!(dot.contains("configurations=\"f1|f2\";"));
        assert!(dot.contains("\"S\" [shape=circle feature=\"True\"];"));
        assert!(dot.contains("__start0 -> \"S\";"));
        assert!(dot.contains("\"S\" -> \"S\" [label=\"x/o\" feature=\"f1\"];"));
        assert!(dot.contains("\"S\" -> \"S\" [label=\"x/epsilon\" feature=\"f2\"];"));
        assert!(dot.ends_with("}\n"));
    }
}
