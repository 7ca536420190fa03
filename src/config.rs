//! JSON build configuration.
//!
//! A configuration document names the node populations (size, layout bounds,
//! tuning) and the edge groups (selectors, rule parameters, shared edge
//! metadata) of a network, so that the whole build is driven by one file.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::builder::{NetworkBuilder, NodeSelector};
use super::error::NetgenError;
use super::layout::AnnulusLayout;
use super::network::{EdgeTemplate, Network};
use super::node::{evenly_spaced_tuning, EiType};
use super::rule::{ConnectionRule, PlanarDistanceRule, TuningRule};
use super::{DEFAULT_MAX_DISTANCE, DEFAULT_SIGMA, DEFAULT_TUNING_FLOOR};

/// Configuration of one node population.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// The name of the population.
    pub name: String,
    /// The name of the cell model shared by the population.
    pub model_name: String,
    /// The excitatory/inhibitory class of the population ("e" or "i").
    pub ei_type: EiType,
    /// The number of nodes in the population.
    pub num_cells: usize,
    /// The inner radius of the layout annulus.
    pub radius_min: f64,
    /// The outer radius of the layout annulus.
    pub radius_max: f64,
    /// The depth band of the layout.
    pub depth_range: (f64, f64),
    /// Whether to assign evenly spaced tuning angles over [0, 360).
    #[serde(default)]
    pub tuned: bool,
}

/// Configuration of a node selector.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Restrict to one population.
    #[serde(default)]
    pub population: Option<String>,
    /// Restrict to one excitatory/inhibitory class.
    #[serde(default)]
    pub ei_type: Option<EiType>,
}

impl SelectorConfig {
    fn selector(&self) -> NodeSelector {
        NodeSelector::new(self.population.clone(), self.ei_type)
    }
}

/// Configuration of a connection rule. Omitted constants take the documented
/// defaults.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Tuning-angle rule (see [`TuningRule`]).
    Tuning {
        max_syns: u32,
        #[serde(default = "default_tuning_floor")]
        floor: f64,
    },
    /// Planar-distance rule (see [`PlanarDistanceRule`]).
    PlanarDistance {
        max_syns: u32,
        #[serde(default = "default_max_distance")]
        max_distance: f64,
        #[serde(default = "default_sigma")]
        sigma: f64,
    },
}

fn default_tuning_floor() -> f64 {
    DEFAULT_TUNING_FLOOR
}

fn default_max_distance() -> f64 {
    DEFAULT_MAX_DISTANCE
}

fn default_sigma() -> f64 {
    DEFAULT_SIGMA
}

impl RuleConfig {
    fn rule(&self) -> Result<Box<dyn ConnectionRule + Sync>, NetgenError> {
        match *self {
            RuleConfig::Tuning { max_syns, floor } => {
                Ok(Box::new(TuningRule::with_floor(max_syns, floor)?))
            }
            RuleConfig::PlanarDistance {
                max_syns,
                max_distance,
                sigma,
            } => Ok(Box::new(PlanarDistanceRule::build(
                max_syns,
                max_distance,
                sigma,
            )?)),
        }
    }
}

/// Configuration of one edge group.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// The selector of the source nodes.
    pub source: SelectorConfig,
    /// The selector of the target nodes.
    pub target: SelectorConfig,
    /// The connection rule evaluated on each candidate pair.
    pub rule: RuleConfig,
    /// The synaptic weight shared by the instantiated edges.
    pub syn_weight: f64,
    /// The transmission delay shared by the instantiated edges.
    pub delay: f64,
    /// The name of the synaptic dynamics parameter set.
    pub dynamics_params: String,
    /// The name of the synapse model template.
    pub model_template: String,
}

/// Configuration of a whole network build.
///
/// # Examples
///
/// ```
/// use cortical_netgen::config::{build_network, NetworkConfig};
///
/// let config: NetworkConfig = serde_json::from_str(
///     r#"{
///         "name": "l4",
///         "seed": 42,
///         "populations": [
///             {
///                 "name": "scnn1a", "model_name": "Scnn1a", "ei_type": "e",
///                 "num_cells": 20, "radius_min": 0.0, "radius_max": 400.0,
///                 "depth_range": [400.0, 500.0], "tuned": true
///             }
///         ],
///         "edges": [
///             {
///                 "source": {"ei_type": "e"},
///                 "target": {"ei_type": "e"},
///                 "rule": {"kind": "tuning", "max_syns": 5},
///                 "syn_weight": 3.0e-5,
///                 "delay": 2.0,
///                 "dynamics_params": "AMPA_ExcToExc.json",
///                 "model_template": "Exp2Syn"
///             }
///         ]
///     }"#,
/// )
/// .unwrap();
///
/// let network = build_network(&config).unwrap();
/// assert_eq!(network.num_nodes(), 20);
/// ```
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// The name of the network.
    pub name: String,
    /// The seed of the random source. Without a seed, the build is not
    /// reproducible across runs.
    #[serde(default)]
    pub seed: Option<u64>,
    /// The node populations of the network.
    pub populations: Vec<PopulationConfig>,
    /// The edge groups of the network.
    pub edges: Vec<EdgeConfig>,
}

impl NetworkConfig {
    /// Load a configuration from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, NetgenError> {
        let file = File::open(path).map_err(|e| NetgenError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| NetgenError::IOError(e.to_string()))
    }

    /// Construct a builder from the configuration: sample each population's
    /// layout and register each edge group.
    pub fn to_builder<R: Rng>(&self, rng: &mut R) -> Result<NetworkBuilder, NetgenError> {
        let mut builder = NetworkBuilder::new(&self.name);

        for population in &self.populations {
            let layout = AnnulusLayout::new(
                population.radius_min,
                population.radius_max,
                population.depth_range,
            )?;
            let positions = layout.sample(population.num_cells, rng);
            let tuning_angles = population
                .tuned
                .then(|| evenly_spaced_tuning(population.num_cells));
            builder.add_nodes(
                &population.name,
                &population.model_name,
                population.ei_type,
                positions,
                tuning_angles,
            )?;
        }

        for edge in &self.edges {
            let template = EdgeTemplate::build(
                edge.syn_weight,
                edge.delay,
                &edge.dynamics_params,
                &edge.model_template,
            )?;
            builder.add_edges(
                edge.source.selector(),
                edge.target.selector(),
                edge.rule.rule()?,
                template,
            );
        }

        Ok(builder)
    }
}

/// Build a network from a configuration.
///
/// The random source is seeded from the configuration when a seed is present,
/// and from entropy otherwise.
pub fn build_network(config: &NetworkConfig) -> Result<Network, NetgenError> {
    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let builder = config.to_builder(&mut rng)?;
    builder.build(&mut rng)
}
