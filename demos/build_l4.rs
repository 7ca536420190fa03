//! Build the layer 4 network: three tuned excitatory populations, one untuned
//! inhibitory population, and four rule-driven edge groups, then save it to a
//! JSON file.
//!
//! Usage: cargo run --example build_l4 [seed] [output path]

use std::env;

use rand::rngs::StdRng;
use rand::SeedableRng;

use cortical_netgen::builder::{NetworkBuilder, NodeSelector};
use cortical_netgen::error::NetgenError;
use cortical_netgen::layout::AnnulusLayout;
use cortical_netgen::network::EdgeTemplate;
use cortical_netgen::node::{evenly_spaced_tuning, EiType};
use cortical_netgen::rule::{PlanarDistanceRule, TuningRule};

fn main() -> Result<(), NetgenError> {
    let mut args = env::args().skip(1);
    let seed: u64 = args
        .next()
        .map(|s| s.parse().expect("The seed must be an integer"))
        .unwrap_or(42);
    let path = args.next().unwrap_or_else(|| "l4_network.json".to_string());

    let mut rng = StdRng::seed_from_u64(seed);
    let layout = AnnulusLayout::new(0.0, 400.0, (400.0, 500.0))?;

    let mut builder = NetworkBuilder::new("l4");
    for (population, model_name) in [("scnn1a", "Scnn1a"), ("rorb", "Rorb"), ("nr5a1", "Nr5a1")] {
        builder.add_nodes(
            population,
            model_name,
            EiType::Excitatory,
            layout.sample(80, &mut rng),
            Some(evenly_spaced_tuning(80)),
        )?;
    }
    builder.add_nodes(
        "pvalb",
        "PValb",
        EiType::Inhibitory,
        layout.sample(60, &mut rng),
        None,
    )?;

    let exc = NodeSelector::ei_type(EiType::Excitatory);
    let inh = NodeSelector::ei_type(EiType::Inhibitory);

    builder.add_edges(
        exc.clone(),
        exc.clone(),
        Box::new(TuningRule::new(5)),
        EdgeTemplate::build(3.0e-5, 2.0, "AMPA_ExcToExc.json", "Exp2Syn")?,
    );
    builder.add_edges(
        exc.clone(),
        inh.clone(),
        Box::new(PlanarDistanceRule::new(8)),
        EdgeTemplate::build(0.0006, 2.0, "AMPA_ExcToInh.json", "Exp2Syn")?,
    );
    builder.add_edges(
        inh.clone(),
        exc,
        Box::new(PlanarDistanceRule::new(4)),
        EdgeTemplate::build(0.0002, 2.0, "GABA_InhToExc.json", "Exp2Syn")?,
    );
    builder.add_edges(
        inh.clone(),
        inh,
        Box::new(PlanarDistanceRule::new(4)),
        EdgeTemplate::build(0.00015, 2.0, "GABA_InhToInh.json", "Exp2Syn")?,
    );

    let network = builder.build(&mut rng)?;
    network.save_to(&path)?;

    println!(
        "Built network '{}' with {} nodes and {} edges (seed {}), saved to {}",
        network.name(),
        network.num_nodes(),
        network.num_edges(),
        seed,
        path
    );

    Ok(())
}
