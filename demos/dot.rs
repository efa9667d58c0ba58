use rust_ffsm::gviz::GvGraph;
use rust_ffsm::ConditionalAutomatonBuilder;
use std::fs::write;

fn main() {
    tracing_subscriber::fmt::init();

    // A coffee machine family where only the `milk` variant accepts a second button.
    let mut ffsm = ConditionalAutomatonBuilder::new("basic|milk")
        .with_state("idle", "True")
        .with_state("paid", "True")
        .with_state("mixing", "milk")
        .with_transition("idle", "paid", "coin / ok", "True")
        .with_transition("paid", "idle", "coffee / black", "True")
        .with_transition("paid", "mixing", "milk / ok", "milk")
        .with_initial("idle")
        .build()
        .expect("well formed model");

    // `mixing` has no way out, so it gets a reset before completion fills the gaps.
    ffsm.reset_when_sink();
    ffsm.make_input_complete();

    let gv = GvGraph::from(&ffsm);
    write::<_, String>("ffsm.gv", gv.into()).unwrap();
}
