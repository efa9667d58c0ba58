use rust_ffsm::features::{unify, FeatureSet, Features};
use rust_ffsm::{ConditionalAutomatonBuilder, ConditionalSimulator};
use tracing::info;

fn main() {
    // Prints INFO events to STDOUT.
    tracing_subscriber::fmt::init();

    // Three variants of a vending machine share one model. Transitions are tagged with the
    // variants they exist in.
    let mut ffsm = ConditionalAutomatonBuilder::new("tea|coffee|broken")
        .with_state("idle", "True")
        .with_state("paid", "True")
        .with_transition("idle", "paid", "coin/ok", "True")
        .with_transition("paid", "idle", "push/tea", "tea")
        .with_transition("paid", "idle", "push/coffee", "coffee")
        .with_transition("paid", "paid", "push/none", "broken")
        .with_initial("idle")
        .build()
        .expect("well formed model");

    ffsm.reset_when_sink();
    ffsm.make_input_complete();

    let mut sim = ConditionalSimulator::new(&ffsm);
    let mut known = Features::Unconstrained;

    // Outputs observed on the system under test.
    let observed = [("coin", "ok"), ("push", "coffee"), ("coin", "ok")];

    for (input, output) in observed {
        // Step a copy to learn which branches agree with the observation.
        let outputs = match sim.clone().step(input, &known) {
            Ok(outputs) => outputs,
            Err(e) => {
                info!("{}", e);
                return;
            }
        };

        let mut consistent = FeatureSet::new();
        for (candidate, features) in outputs {
            if candidate == output {
                if let Features::Only(set) = features {
                    consistent.extend(set);
                }
            }
        }

        known = unify(&known, &Features::Only(consistent));
        if let Err(e) = sim.step(input, &known) {
            info!("{}", e);
            return;
        }
        info!("after {}/{} the variant is one of {}", input, output, known);
    }

    info!("possible variants: {}", sim.possible_features());
}
