use rust_ffsm::{ConditionalAutomatonBuilder, Fingerprint, MealyBuilder, MealyMachine};
use tracing::info;

fn main() {
    // Prints INFO events to STDOUT.
    tracing_subscriber::fmt::init();

    // A desk fan sold in three variants. They only differ in what the speed button does.
    let mut ffsm = ConditionalAutomatonBuilder::new("eco|boost|silent")
        .with_state("off", "True")
        .with_state("on", "True")
        .with_transition("off", "on", "power/start", "True")
        .with_transition("on", "off", "power/stop", "True")
        .with_transition("on", "on", "speed/low", "eco")
        .with_transition("on", "on", "speed/high", "boost")
        .with_transition("on", "off", "speed/stop", "silent")
        .with_initial("off")
        .build()
        .expect("well formed model");

    ffsm.make_input_complete();

    let names: Vec<&String> = ffsm.universe().iter().collect();
    let family: Vec<MealyMachine> = names
        .iter()
        .map(|feature| MealyMachine::project(&ffsm, feature).expect("deterministic variant"))
        .collect();

    let fingerprint = match Fingerprint::compute(&family) {
        Ok(fingerprint) => fingerprint,
        Err(e) => {
            info!("{}", e);
            return;
        }
    };

    info!("fingerprint sequences: {:?}", fingerprint.sequences());
    for (name, signature) in names.iter().zip(fingerprint.signatures()) {
        info!("{} answers {:?}", name, signature);
    }

    // A fan off the shelf, modelled from its observed behaviour.
    let device = MealyBuilder::new()
        .with_transition("off", "power", "start", "on")
        .with_transition("off", "speed", "epsilon", "off")
        .with_transition("on", "power", "stop", "off")
        .with_transition("on", "speed", "high", "on")
        .with_initial("off")
        .build()
        .expect("deterministic device");

    match fingerprint.identify_transducer(&device) {
        Some(idx) => info!("the device is the {} variant", names[idx]),
        None => info!("the device matches no known variant"),
    }
}
