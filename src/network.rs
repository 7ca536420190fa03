//! Built network structure and persistence.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::error::NetgenError;
use super::node::Node;

/// Shared metadata for the parallel edges instantiated by one edge group.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct EdgeTemplate {
    /// The synaptic weight of each edge.
    syn_weight: f64,
    /// The transmission delay of each edge (must be non-negative).
    delay: f64,
    /// The name of the synaptic dynamics parameter set.
    dynamics_params: String,
    /// The name of the synapse model template.
    model_template: String,
}

impl EdgeTemplate {
    /// Create a new edge template with the specified parameters.
    /// The function returns an error if the delay is negative.
    pub fn build(
        syn_weight: f64,
        delay: f64,
        dynamics_params: &str,
        model_template: &str,
    ) -> Result<Self, NetgenError> {
        if delay < 0.0 {
            return Err(NetgenError::InvalidParameters(
                "The edge delay must be non-negative.".into(),
            ));
        }

        Ok(EdgeTemplate {
            syn_weight,
            delay,
            dynamics_params: dynamics_params.to_string(),
            model_template: model_template.to_string(),
        })
    }

    /// Returns the synaptic weight of the template.
    pub fn syn_weight(&self) -> f64 {
        self.syn_weight
    }

    /// Returns the transmission delay of the template.
    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Returns the name of the synaptic dynamics parameter set.
    pub fn dynamics_params(&self) -> &str {
        &self.dynamics_params
    }

    /// Returns the name of the synapse model template.
    pub fn model_template(&self) -> &str {
        &self.model_template
    }
}

/// Represents one synapse between two nodes in a built network.
///
/// A node pair assigned a synapse count of k by a connection rule is
/// represented by k parallel edges sharing the same edge type.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// The ID of the source node.
    source_id: usize,
    /// The ID of the target node.
    target_id: usize,
    /// The ID of the edge type carrying the shared metadata.
    edge_type_id: usize,
    /// The synaptic weight of the edge.
    syn_weight: f64,
    /// The transmission delay of the edge.
    delay: f64,
}

impl Edge {
    /// Create a new edge with the specified parameters.
    pub fn new(
        source_id: usize,
        target_id: usize,
        edge_type_id: usize,
        syn_weight: f64,
        delay: f64,
    ) -> Self {
        Edge {
            source_id,
            target_id,
            edge_type_id,
            syn_weight,
            delay,
        }
    }

    /// Returns the ID of the source node.
    pub fn source_id(&self) -> usize {
        self.source_id
    }

    /// Returns the ID of the target node.
    pub fn target_id(&self) -> usize {
        self.target_id
    }

    /// Returns the ID of the edge type of the edge.
    pub fn edge_type_id(&self) -> usize {
        self.edge_type_id
    }

    /// Returns the synaptic weight of the edge.
    pub fn syn_weight(&self) -> f64 {
        self.syn_weight
    }

    /// Returns the transmission delay of the edge.
    pub fn delay(&self) -> f64 {
        self.delay
    }
}

/// A built network: nodes, edge types, and the edges instantiated between
/// node pairs by the connection rules.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Network {
    name: String,
    nodes: Vec<Node>,
    edge_types: Vec<EdgeTemplate>,
    edges: Vec<Edge>,
}

impl Network {
    pub(crate) fn new(
        name: &str,
        nodes: Vec<Node>,
        edge_types: Vec<EdgeTemplate>,
        edges: Vec<Edge>,
    ) -> Self {
        Network {
            name: name.to_string(),
            nodes,
            edge_types,
            edges,
        }
    }

    /// Returns the name of the network.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of nodes in the network.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges in the network.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Returns a slice of nodes of the network.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns a slice of edges of the network.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns a slice of edge types of the network.
    pub fn edge_types(&self) -> &[EdgeTemplate] {
        &self.edge_types
    }

    /// Returns the node with the specified ID.
    /// The function returns an error if there is no such node.
    pub fn node(&self, id: usize) -> Result<&Node, NetgenError> {
        self.nodes
            .get(id)
            .ok_or_else(|| NetgenError::OutOfBounds(format!("No node with ID {}", id)))
    }

    /// Returns the edge type of the specified edge.
    pub fn edge_type(&self, edge: &Edge) -> &EdgeTemplate {
        &self.edge_types[edge.edge_type_id]
    }

    /// Returns the number of edges targeting the specified node.
    pub fn in_degree(&self, id: usize) -> usize {
        self.edges.iter().filter(|e| e.target_id == id).count()
    }

    /// Returns the number of edges leaving the specified node.
    pub fn out_degree(&self, id: usize) -> usize {
        self.edges.iter().filter(|e| e.source_id == id).count()
    }

    /// Save the network to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), NetgenError> {
        let file = File::create(path).map_err(|e| NetgenError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| NetgenError::IOError(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| NetgenError::IOError(e.to_string()))?;
        Ok(())
    }

    /// Load a network from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Network, NetgenError> {
        let file = File::open(path).map_err(|e| NetgenError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| NetgenError::IOError(e.to_string()))
    }
}
