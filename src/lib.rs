//! This crate provides tools for generating spatially-embedded neural network
//! topologies with stochastic connectivity rules.
//!
//! Node populations are placed in space by annulus-uniform sampling, and edges
//! are instantiated by evaluating a connection rule on every ordered
//! (source, target) pair of an edge group: a tuning-angle rule biases
//! connections toward similarly tuned pairs, a planar-distance rule decays the
//! connection probability with distance under a hard cutoff. Synapse counts
//! are binomial draws, so every pair receives between zero and the configured
//! maximum number of parallel edges.
//!
//! # Building Networks
//!
//! ## From Scratch
//!
//! ```rust
//! use cortical_netgen::builder::{NetworkBuilder, NodeSelector};
//! use cortical_netgen::layout::AnnulusLayout;
//! use cortical_netgen::network::EdgeTemplate;
//! use cortical_netgen::node::{evenly_spaced_tuning, EiType};
//! use cortical_netgen::rule::{PlanarDistanceRule, TuningRule};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let layout = AnnulusLayout::new(0.0, 400.0, (400.0, 500.0)).unwrap();
//!
//! let mut builder = NetworkBuilder::new("l4");
//! builder
//!     .add_nodes(
//!         "scnn1a",
//!         "Scnn1a",
//!         EiType::Excitatory,
//!         layout.sample(40, &mut rng),
//!         Some(evenly_spaced_tuning(40)),
//!     )
//!     .unwrap();
//! builder
//!     .add_nodes("pvalb", "PValb", EiType::Inhibitory, layout.sample(15, &mut rng), None)
//!     .unwrap();
//!
//! builder.add_edges(
//!     NodeSelector::ei_type(EiType::Excitatory),
//!     NodeSelector::ei_type(EiType::Excitatory),
//!     Box::new(TuningRule::new(5)),
//!     EdgeTemplate::build(3.0e-5, 2.0, "AMPA_ExcToExc.json", "Exp2Syn").unwrap(),
//! );
//! builder.add_edges(
//!     NodeSelector::ei_type(EiType::Inhibitory),
//!     NodeSelector::ei_type(EiType::Excitatory),
//!     Box::new(PlanarDistanceRule::new(4)),
//!     EdgeTemplate::build(0.0002, 2.0, "GABA_InhToExc.json", "Exp2Syn").unwrap(),
//! );
//!
//! let network = builder.build(&mut rng).unwrap();
//! assert_eq!(network.num_nodes(), 55);
//! assert!(network.edges().iter().all(|e| e.source_id() != e.target_id()));
//! ```
//!
//! ## From a Configuration
//!
//! See [`config::NetworkConfig`] for the JSON document driving a whole build.
//!
//! ## Reproducibility
//!
//! Every sampling function takes an explicit random source. Seed it to make
//! builds reproducible, e.g., with `StdRng::seed_from_u64`, or use
//! [`builder::NetworkBuilder::build_seeded`] for a deterministic parallel
//! build.

pub mod builder;
pub mod config;
pub mod error;
pub mod layout;
pub mod network;
pub mod node;
pub mod rule;

/// The default floor on the tuning-angle distance, in degrees, keeping the
/// connection probability of near-identically tuned pairs away from 1.
pub const DEFAULT_TUNING_FLOOR: f64 = 10.0;
/// The default hard cutoff on the planar distance between connected nodes.
pub const DEFAULT_MAX_DISTANCE: f64 = 300.0;
/// The default decay constant of the planar-distance connection probability.
pub const DEFAULT_SIGMA: f64 = 60.0;
