//! Builder populating a network from node populations and stochastic edge rules.

use itertools::iproduct;
use log::{debug, warn};
use nalgebra::Point3;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::ops::Range;

use super::error::NetgenError;
use super::network::{Edge, EdgeTemplate, Network};
use super::node::{EiType, Node};
use super::rule::ConnectionRule;

/// Minimum number of target nodes to parallelize the seeded build.
pub const MIN_TARGETS_PAR: usize = 10;

/// A filter selecting a subset of the builder's nodes, by population name
/// and/or excitatory/inhibitory class.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct NodeSelector {
    population: Option<String>,
    ei_type: Option<EiType>,
}

impl NodeSelector {
    /// Create a new selector from optional population and class filters.
    pub fn new(population: Option<String>, ei_type: Option<EiType>) -> Self {
        NodeSelector {
            population,
            ei_type,
        }
    }

    /// Selects every node.
    pub fn all() -> Self {
        NodeSelector::default()
    }

    /// Selects the nodes of one population.
    pub fn population(name: &str) -> Self {
        NodeSelector::new(Some(name.to_string()), None)
    }

    /// Selects the nodes of one excitatory/inhibitory class.
    pub fn ei_type(ei_type: EiType) -> Self {
        NodeSelector::new(None, Some(ei_type))
    }

    /// Returns true if the node passes every filter of the selector.
    pub fn matches(&self, node: &Node) -> bool {
        if let Some(ref population) = self.population {
            if node.population() != population {
                return false;
            }
        }

        if let Some(ei_type) = self.ei_type {
            if node.ei_type() != ei_type {
                return false;
            }
        }

        true
    }
}

/// An edge group: a pair of selectors, a connection rule, and the edge type
/// holding the metadata shared by the instantiated edges.
struct EdgeGroup {
    source: NodeSelector,
    target: NodeSelector,
    rule: Box<dyn ConnectionRule + Sync>,
    edge_type_id: usize,
}

/// Builder accumulating node populations and edge groups, from which networks
/// are built by evaluating each group's rule on all candidate pairs.
pub struct NetworkBuilder {
    name: String,
    nodes: Vec<Node>,
    edge_types: Vec<EdgeTemplate>,
    groups: Vec<EdgeGroup>,
}

impl NetworkBuilder {
    /// Create a new empty builder.
    pub fn new(name: &str) -> Self {
        NetworkBuilder {
            name: name.to_string(),
            nodes: vec![],
            edge_types: vec![],
            groups: vec![],
        }
    }

    /// Returns the number of nodes added so far.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns a slice of nodes added so far.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Add a population of nodes sharing a model, assigning contiguous IDs.
    /// Returns the range of IDs of the new nodes.
    ///
    /// The function returns an error if the number of tuning angles does not
    /// match the number of positions.
    pub fn add_nodes(
        &mut self,
        population: &str,
        model_name: &str,
        ei_type: EiType,
        positions: Vec<Point3<f64>>,
        tuning_angles: Option<Vec<f64>>,
    ) -> Result<Range<usize>, NetgenError> {
        if let Some(ref angles) = tuning_angles {
            if angles.len() != positions.len() {
                return Err(NetgenError::InvalidParameters(format!(
                    "Population '{}' has {} positions but {} tuning angles.",
                    population,
                    positions.len(),
                    angles.len()
                )));
            }
        }

        let first_id = self.nodes.len();
        for (k, position) in positions.into_iter().enumerate() {
            let tuning_angle = tuning_angles.as_ref().map(|angles| angles[k]);
            self.nodes.push(Node::new(
                first_id + k,
                population,
                model_name,
                ei_type,
                position,
                tuning_angle,
            ));
        }

        Ok(first_id..self.nodes.len())
    }

    /// Add an edge group connecting the selected source nodes to the selected
    /// target nodes. Returns the ID of the edge type carrying the shared
    /// metadata.
    pub fn add_edges(
        &mut self,
        source: NodeSelector,
        target: NodeSelector,
        rule: Box<dyn ConnectionRule + Sync>,
        template: EdgeTemplate,
    ) -> usize {
        let edge_type_id = self.edge_types.len();
        self.edge_types.push(template);
        self.groups.push(EdgeGroup {
            source,
            target,
            rule,
            edge_type_id,
        });
        edge_type_id
    }

    fn select(&self, selector: &NodeSelector) -> Vec<&Node> {
        self.nodes.iter().filter(|n| selector.matches(n)).collect()
    }

    /// Build a network by evaluating each edge group's rule on all ordered
    /// (source, target) pairs of its selected nodes, in source-major ID order.
    ///
    /// The build is sequential and deterministic given the random source. A
    /// rule error aborts the whole build. An edge group whose selectors match
    /// no nodes produces no edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use cortical_netgen::builder::{NetworkBuilder, NodeSelector};
    /// use cortical_netgen::layout::AnnulusLayout;
    /// use cortical_netgen::network::EdgeTemplate;
    /// use cortical_netgen::node::{evenly_spaced_tuning, EiType};
    /// use cortical_netgen::rule::TuningRule;
    /// use rand::rngs::StdRng;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let layout = AnnulusLayout::new(0.0, 400.0, (400.0, 500.0)).unwrap();
    ///
    /// let mut builder = NetworkBuilder::new("l4");
    /// builder
    ///     .add_nodes(
    ///         "scnn1a",
    ///         "Scnn1a",
    ///         EiType::Excitatory,
    ///         layout.sample(20, &mut rng),
    ///         Some(evenly_spaced_tuning(20)),
    ///     )
    ///     .unwrap();
    /// builder.add_edges(
    ///     NodeSelector::ei_type(EiType::Excitatory),
    ///     NodeSelector::ei_type(EiType::Excitatory),
    ///     Box::new(TuningRule::new(5)),
    ///     EdgeTemplate::build(3.0e-5, 2.0, "AMPA_ExcToExc.json", "Exp2Syn").unwrap(),
    /// );
    ///
    /// let network = builder.build(&mut rng).unwrap();
    /// assert_eq!(network.num_nodes(), 20);
    /// ```
    pub fn build<R: RngCore>(&self, rng: &mut R) -> Result<Network, NetgenError> {
        let rng: &mut dyn RngCore = rng;
        let mut edges = vec![];

        for group in &self.groups {
            let sources = self.select(&group.source);
            let targets = self.select(&group.target);

            if sources.is_empty() || targets.is_empty() {
                warn!(
                    "edge group {} selects no node pair, no edges instantiated",
                    group.edge_type_id
                );
                continue;
            }
            debug!(
                "edge group {}: evaluating {} x {} candidate pairs",
                group.edge_type_id,
                sources.len(),
                targets.len()
            );

            let template = &self.edge_types[group.edge_type_id];
            for (source, target) in iproduct!(&sources, &targets) {
                let num_syns = group.rule.num_synapses(source, target, rng)?;
                push_parallel_edges(&mut edges, source, target, group.edge_type_id, template, num_syns);
            }
        }

        Ok(Network::new(
            &self.name,
            self.nodes.clone(),
            self.edge_types.clone(),
            edges,
        ))
    }

    /// Build a network from a seed, evaluating the target nodes of each edge
    /// group in parallel.
    ///
    /// Every (edge group, target node) pair draws from its own stream of a
    /// ChaCha generator seeded by `seed`, so the result is reproducible and
    /// independent of thread scheduling. Groups with fewer than
    /// [`MIN_TARGETS_PAR`] targets are evaluated sequentially.
    pub fn build_seeded(&self, seed: u64) -> Result<Network, NetgenError> {
        let mut edges = vec![];

        for (group_id, group) in self.groups.iter().enumerate() {
            let sources = self.select(&group.source);
            let targets = self.select(&group.target);

            if sources.is_empty() || targets.is_empty() {
                warn!(
                    "edge group {} selects no node pair, no edges instantiated",
                    group.edge_type_id
                );
                continue;
            }

            let template = &self.edge_types[group.edge_type_id];
            let connect_target = |target: &&Node| -> Result<Vec<Edge>, NetgenError> {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(((group_id as u64) << 32) | target.id() as u64);

                let mut batch = vec![];
                for source in &sources {
                    let num_syns = group.rule.num_synapses(source, target, &mut rng)?;
                    push_parallel_edges(
                        &mut batch,
                        source,
                        target,
                        group.edge_type_id,
                        template,
                        num_syns,
                    );
                }
                Ok(batch)
            };

            let batches: Result<Vec<Vec<Edge>>, NetgenError> =
                if targets.len() >= MIN_TARGETS_PAR {
                    targets.par_iter().map(connect_target).collect()
                } else {
                    targets.iter().map(connect_target).collect()
                };

            for batch in batches? {
                edges.extend(batch);
            }
        }

        Ok(Network::new(
            &self.name,
            self.nodes.clone(),
            self.edge_types.clone(),
            edges,
        ))
    }
}

/// Instantiate `num_syns` parallel edges between a node pair.
fn push_parallel_edges(
    edges: &mut Vec<Edge>,
    source: &Node,
    target: &Node,
    edge_type_id: usize,
    template: &EdgeTemplate,
    num_syns: u32,
) {
    for _ in 0..num_syns {
        edges.push(Edge::new(
            source.id(),
            target.id(),
            edge_type_id,
            template.syn_weight(),
            template.delay(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::AnnulusLayout;
    use crate::rule::{PlanarDistanceRule, TuningRule};
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashMap;

    const SEED: u64 = 42;

    fn toy_builder(rng: &mut StdRng) -> NetworkBuilder {
        let layout = AnnulusLayout::new(0.0, 400.0, (400.0, 500.0)).unwrap();
        let mut builder = NetworkBuilder::new("l4");
        builder
            .add_nodes(
                "scnn1a",
                "Scnn1a",
                EiType::Excitatory,
                layout.sample(30, rng),
                Some(crate::node::evenly_spaced_tuning(30)),
            )
            .unwrap();
        builder
            .add_nodes(
                "pvalb",
                "PValb",
                EiType::Inhibitory,
                layout.sample(20, rng),
                None,
            )
            .unwrap();
        builder.add_edges(
            NodeSelector::ei_type(EiType::Excitatory),
            NodeSelector::ei_type(EiType::Excitatory),
            Box::new(TuningRule::new(5)),
            EdgeTemplate::build(3.0e-5, 2.0, "AMPA_ExcToExc.json", "Exp2Syn").unwrap(),
        );
        builder.add_edges(
            NodeSelector::ei_type(EiType::Excitatory),
            NodeSelector::ei_type(EiType::Inhibitory),
            Box::new(PlanarDistanceRule::new(8)),
            EdgeTemplate::build(0.0006, 2.0, "AMPA_ExcToInh.json", "Exp2Syn").unwrap(),
        );
        builder
    }

    #[test]
    fn test_add_nodes_ids() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let builder = toy_builder(&mut rng);

        assert_eq!(builder.num_nodes(), 50);
        assert!(builder.nodes().iter().enumerate().all(|(k, n)| n.id() == k));
    }

    #[test]
    fn test_add_nodes_length_mismatch() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let layout = AnnulusLayout::new(0.0, 400.0, (400.0, 500.0)).unwrap();
        let mut builder = NetworkBuilder::new("l4");
        assert_eq!(
            builder.add_nodes(
                "scnn1a",
                "Scnn1a",
                EiType::Excitatory,
                layout.sample(10, &mut rng),
                Some(crate::node::evenly_spaced_tuning(8)),
            ),
            Err(NetgenError::InvalidParameters(
                "Population 'scnn1a' has 10 positions but 8 tuning angles.".into()
            ))
        );
    }

    #[test]
    fn test_selector_matches() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let builder = toy_builder(&mut rng);

        assert_eq!(builder.select(&NodeSelector::all()).len(), 50);
        assert_eq!(
            builder
                .select(&NodeSelector::ei_type(EiType::Excitatory))
                .len(),
            30
        );
        assert_eq!(builder.select(&NodeSelector::population("pvalb")).len(), 20);
        assert_eq!(
            builder
                .select(&NodeSelector::new(
                    Some("pvalb".into()),
                    Some(EiType::Excitatory)
                ))
                .len(),
            0
        );
    }

    #[test]
    fn test_build_no_self_edges() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let builder = toy_builder(&mut rng);
        let network = builder.build(&mut rng).unwrap();

        assert!(network
            .edges()
            .iter()
            .all(|e| e.source_id() != e.target_id()));
    }

    #[test]
    fn test_build_pair_counts_bounded() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let builder = toy_builder(&mut rng);
        let network = builder.build(&mut rng).unwrap();

        let max_syns = [5u32, 8u32];
        let mut counts: HashMap<(usize, usize, usize), u32> = HashMap::new();
        for edge in network.edges() {
            *counts
                .entry((edge.source_id(), edge.target_id(), edge.edge_type_id()))
                .or_default() += 1;
        }
        assert!(counts
            .iter()
            .all(|(&(_, _, edge_type_id), &count)| count <= max_syns[edge_type_id]));
    }

    #[test]
    fn test_build_deterministic() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let builder = toy_builder(&mut rng);

        let mut rng_1 = StdRng::seed_from_u64(987);
        let mut rng_2 = StdRng::seed_from_u64(987);
        assert_eq!(
            builder.build(&mut rng_1).unwrap(),
            builder.build(&mut rng_2).unwrap()
        );
    }

    #[test]
    fn test_build_seeded_deterministic() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let builder = toy_builder(&mut rng);

        let network_1 = builder.build_seeded(987).unwrap();
        let network_2 = builder.build_seeded(987).unwrap();
        assert_eq!(network_1, network_2);

        assert!(network_1
            .edges()
            .iter()
            .all(|e| e.source_id() != e.target_id()));
    }

    #[test]
    fn test_build_empty_selection() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let mut builder = toy_builder(&mut rng);
        builder.add_edges(
            NodeSelector::population("rorb"),
            NodeSelector::all(),
            Box::new(TuningRule::new(5)),
            EdgeTemplate::build(1.0e-4, 2.0, "AMPA_ExcToExc.json", "Exp2Syn").unwrap(),
        );

        // the empty group contributes nothing, the others still build
        let network = builder.build(&mut rng).unwrap();
        assert!(network
            .edges()
            .iter()
            .all(|e| e.edge_type_id() < 2));
    }

    #[test]
    fn test_build_missing_attribute_aborts() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let mut builder = toy_builder(&mut rng);

        // tuning rule over untuned inhibitory nodes must abort the build
        builder.add_edges(
            NodeSelector::ei_type(EiType::Inhibitory),
            NodeSelector::ei_type(EiType::Inhibitory),
            Box::new(TuningRule::new(5)),
            EdgeTemplate::build(1.0e-4, 2.0, "GABA_InhToInh.json", "Exp2Syn").unwrap(),
        );

        assert!(matches!(
            builder.build(&mut rng),
            Err(NetgenError::MissingAttribute { .. })
        ));
    }
}
