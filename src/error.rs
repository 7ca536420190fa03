//! Error module for the cortical_netgen library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum NetgenError {
    /// Error for invalid parameters, e.g., inverted radius bounds or a negative delay.
    InvalidParameters(String),
    /// Error for a node attribute required by a connection rule but absent from the record.
    MissingAttribute {
        node_id: usize,
        attribute: &'static str,
    },
    /// Error for out of bounds access, e.g., node not found.
    OutOfBounds(String),
    /// Error for I/O operations.
    IOError(String),
}

impl fmt::Display for NetgenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NetgenError::InvalidParameters(e) => write!(f, "Invalid parameters: {}", e),
            NetgenError::MissingAttribute { node_id, attribute } => {
                write!(f, "Node {} has no attribute '{}'", node_id, attribute)
            }
            NetgenError::OutOfBounds(e) => write!(f, "Index out of bounds: {}", e),
            NetgenError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for NetgenError {}
