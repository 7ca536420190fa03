//! Module implementing the nodes of a spatially-embedded network.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::error::NetgenError;

/// The excitatory/inhibitory class of a node.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum EiType {
    /// Excitatory node.
    #[serde(rename = "e")]
    Excitatory,
    /// Inhibitory node.
    #[serde(rename = "i")]
    Inhibitory,
}

/// Represents a node in a spatially-embedded network.
///
/// A node belongs to a population, carries a 3D position and, for tuned
/// populations, a preferred stimulus orientation in degrees.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Node {
    /// The node ID, unique within a network.
    id: usize,
    /// The name of the population the node belongs to.
    population: String,
    /// The name of the cell model shared by the population.
    model_name: String,
    /// The excitatory/inhibitory class of the node.
    ei_type: EiType,
    /// The position of the node.
    position: Point3<f64>,
    /// The tuning angle of the node, in degrees in [0, 360).
    tuning_angle: Option<f64>,
}

impl Node {
    /// Create a new node with the specified attributes.
    pub fn new(
        id: usize,
        population: &str,
        model_name: &str,
        ei_type: EiType,
        position: Point3<f64>,
        tuning_angle: Option<f64>,
    ) -> Self {
        Node {
            id,
            population: population.to_string(),
            model_name: model_name.to_string(),
            ei_type,
            position,
            tuning_angle,
        }
    }

    /// Returns the node ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the name of the population the node belongs to.
    pub fn population(&self) -> &str {
        &self.population
    }

    /// Returns the name of the cell model of the node.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the excitatory/inhibitory class of the node.
    pub fn ei_type(&self) -> EiType {
        self.ei_type
    }

    /// Returns the position of the node.
    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    /// Returns the x coordinate of the node.
    pub fn x(&self) -> f64 {
        self.position.x
    }

    /// Returns the y (depth) coordinate of the node.
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Returns the z coordinate of the node.
    pub fn z(&self) -> f64 {
        self.position.z
    }

    /// Returns the tuning angle of the node, in degrees.
    /// The function returns an error if the node has no tuning angle.
    pub fn tuning_angle(&self) -> Result<f64, NetgenError> {
        self.tuning_angle.ok_or(NetgenError::MissingAttribute {
            node_id: self.id,
            attribute: "tuning_angle",
        })
    }

    /// Returns true if the node has a tuning angle.
    pub fn is_tuned(&self) -> bool {
        self.tuning_angle.is_some()
    }
}

/// Returns `num` tuning angles evenly spaced over [0, 360), endpoint excluded.
pub fn evenly_spaced_tuning(num: usize) -> Vec<f64> {
    (0..num).map(|k| 360.0 * k as f64 / num as f64).collect()
}
