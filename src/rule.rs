//! Stochastic connectivity rules, evaluated on ordered (source, target) node pairs.
//!
//! A rule returns the number of synapses connecting the source node to the
//! target node. Counts are drawn from a binomial distribution whose success
//! probability depends on the pair, so they never exceed the configured
//! maximum. Self-pairs always yield zero synapses.

use nalgebra::Vector2;
use rand::RngCore;
use rand_distr::{Binomial, Distribution};

use super::error::NetgenError;
use super::node::Node;
use super::{DEFAULT_MAX_DISTANCE, DEFAULT_SIGMA, DEFAULT_TUNING_FLOOR};

/// Returns the circular distance between two angles in degrees, in [0, 180].
///
/// The distance wraps at 360, e.g., the distance between 0 and 350 is 10.
pub fn circular_distance(a: f64, b: f64) -> f64 {
    ((a - b + 180.0).rem_euclid(360.0) - 180.0).abs()
}

/// A stochastic rule assigning a synapse count to an ordered (source, target)
/// node pair.
///
/// The random source is passed explicitly so that builds are reproducible
/// when the caller seeds it.
pub trait ConnectionRule {
    /// Returns the number of synapses connecting the source node to the
    /// target node, in [0, `max_synapses`].
    fn num_synapses(
        &self,
        source: &Node,
        target: &Node,
        rng: &mut dyn RngCore,
    ) -> Result<u32, NetgenError>;

    /// Returns the upper bound on the counts returned by `num_synapses`.
    fn max_synapses(&self) -> u32;
}

/// Draw a synapse count from a binomial distribution with `max_syns` trials.
fn binomial_draw(
    max_syns: u32,
    prob: f64,
    rng: &mut dyn RngCore,
) -> Result<u32, NetgenError> {
    let dist = Binomial::new(max_syns as u64, prob).map_err(|e| {
        NetgenError::InvalidParameters(format!("Invalid synapse count distribution: {}", e))
    })?;
    Ok(dist.sample(rng) as u32)
}

/// Connection rule biased toward similarly tuned node pairs.
///
/// The connection probability decreases linearly with the circular distance
/// between the tuning angles of the two nodes, 1 - max(d, floor) / 180, so
/// that orthogonally tuned pairs (d = 180) never connect. The floor keeps the
/// probability away from 1 for near-identically tuned pairs.
///
/// # Examples
///
/// ```
/// use cortical_netgen::node::{EiType, Node};
/// use cortical_netgen::rule::{ConnectionRule, TuningRule};
/// use nalgebra::Point3;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let rule = TuningRule::new(5);
///
/// let origin = Point3::new(0.0, 450.0, 0.0);
/// let source = Node::new(0, "l4", "Scnn1a", EiType::Excitatory, origin, Some(30.0));
/// let target = Node::new(1, "l4", "Scnn1a", EiType::Excitatory, origin, Some(40.0));
///
/// let num_syns = rule.num_synapses(&source, &target, &mut rng).unwrap();
/// assert!(num_syns <= 5);
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TuningRule {
    /// The maximum number of synapses per node pair.
    max_syns: u32,
    /// The floor on the tuning-angle distance, in degrees.
    floor: f64,
}

impl TuningRule {
    /// Create a new rule with the default tuning-distance floor
    /// (see [`DEFAULT_TUNING_FLOOR`]).
    pub fn new(max_syns: u32) -> Self {
        TuningRule {
            max_syns,
            floor: DEFAULT_TUNING_FLOOR,
        }
    }

    /// Create a new rule with a custom tuning-distance floor.
    /// The function returns an error if the floor is outside [0, 180].
    pub fn with_floor(max_syns: u32, floor: f64) -> Result<Self, NetgenError> {
        if !(0.0..=180.0).contains(&floor) {
            return Err(NetgenError::InvalidParameters(
                "The tuning-distance floor must be in [0, 180] degrees.".into(),
            ));
        }

        Ok(TuningRule { max_syns, floor })
    }
}

impl ConnectionRule for TuningRule {
    fn num_synapses(
        &self,
        source: &Node,
        target: &Node,
        rng: &mut dyn RngCore,
    ) -> Result<u32, NetgenError> {
        if source.id() == target.id() {
            // prevent a cell from synapsing with itself
            return Ok(0);
        }

        let tuning_dist = circular_distance(source.tuning_angle()?, target.tuning_angle()?);
        let prob = 1.0 - tuning_dist.max(self.floor) / 180.0;
        binomial_draw(self.max_syns, prob, rng)
    }

    fn max_synapses(&self) -> u32 {
        self.max_syns
    }
}

/// Connection rule with a Gaussian decay of the connection probability in the
/// planar distance between the two nodes.
///
/// Pairs farther apart than the hard cutoff never connect and consume no
/// randomness. The distance is measured in the (x, z) plane; depth is ignored.
#[derive(Debug, PartialEq, Clone)]
pub struct PlanarDistanceRule {
    /// The maximum number of synapses per node pair.
    max_syns: u32,
    /// The hard cutoff on the planar distance.
    max_distance: f64,
    /// The decay constant of the connection probability.
    sigma: f64,
}

impl PlanarDistanceRule {
    /// Create a new rule with the default cutoff and decay constant
    /// (see [`DEFAULT_MAX_DISTANCE`] and [`DEFAULT_SIGMA`]).
    pub fn new(max_syns: u32) -> Self {
        PlanarDistanceRule {
            max_syns,
            max_distance: DEFAULT_MAX_DISTANCE,
            sigma: DEFAULT_SIGMA,
        }
    }

    /// Create a new rule with a custom cutoff and decay constant.
    /// The function returns an error if the cutoff is negative or the decay
    /// constant is not positive.
    pub fn build(max_syns: u32, max_distance: f64, sigma: f64) -> Result<Self, NetgenError> {
        if max_distance < 0.0 {
            return Err(NetgenError::InvalidParameters(
                "The distance cutoff must be non-negative.".into(),
            ));
        }

        if sigma <= 0.0 {
            return Err(NetgenError::InvalidParameters(
                "The decay constant must be positive.".into(),
            ));
        }

        Ok(PlanarDistanceRule {
            max_syns,
            max_distance,
            sigma,
        })
    }
}

impl ConnectionRule for PlanarDistanceRule {
    fn num_synapses(
        &self,
        source: &Node,
        target: &Node,
        rng: &mut dyn RngCore,
    ) -> Result<u32, NetgenError> {
        if source.id() == target.id() {
            return Ok(0);
        }

        let dist = Vector2::new(source.x() - target.x(), source.z() - target.z()).norm();
        if dist > self.max_distance {
            return Ok(0);
        }

        let prob = (-(dist / self.sigma).powi(2)).exp();
        binomial_draw(self.max_syns, prob, rng)
    }

    fn max_synapses(&self) -> u32 {
        self.max_syns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::EiType;
    use nalgebra::Point3;
    use rand::{rngs::StdRng, Error, SeedableRng};

    const SEED: u64 = 42;

    fn exc_node(id: usize, tuning_angle: f64) -> Node {
        Node::new(
            id,
            "l4",
            "Scnn1a",
            EiType::Excitatory,
            Point3::new(0.0, 450.0, 0.0),
            Some(tuning_angle),
        )
    }

    fn inh_node(id: usize, x: f64, z: f64) -> Node {
        Node::new(
            id,
            "l4",
            "PValb",
            EiType::Inhibitory,
            Point3::new(x, 450.0, z),
            None,
        )
    }

    /// A random source that panics on use, to assert that no randomness is
    /// consumed along deterministic paths.
    struct PanicRng;

    impl RngCore for PanicRng {
        fn next_u32(&mut self) -> u32 {
            panic!("randomness must not be consulted");
        }

        fn next_u64(&mut self) -> u64 {
            panic!("randomness must not be consulted");
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            panic!("randomness must not be consulted");
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), Error> {
            panic!("randomness must not be consulted");
        }
    }

    #[test]
    fn test_circular_distance() {
        assert_eq!(circular_distance(0.0, 350.0), 10.0);
        assert_eq!(circular_distance(350.0, 0.0), 10.0);
        assert_eq!(circular_distance(90.0, 90.0), 0.0);
        assert_eq!(circular_distance(0.0, 180.0), 180.0);
        assert_eq!(circular_distance(45.0, 315.0), 90.0);

        for (a, b) in [(12.5, 273.0), (0.0, 359.0), (180.0, 181.0)] {
            assert_eq!(circular_distance(a, b), circular_distance(b, a));
            assert!((0.0..=180.0).contains(&circular_distance(a, b)));
        }
    }

    #[test]
    fn test_tuning_rule_self_pair() {
        let node = exc_node(0, 90.0);
        let rule = TuningRule::new(5);
        assert_eq!(rule.num_synapses(&node, &node, &mut PanicRng).unwrap(), 0);
    }

    #[test]
    fn test_tuning_rule_bounds() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let rule = TuningRule::new(5);
        let source = exc_node(0, 30.0);
        let target = exc_node(1, 35.0);

        for _ in 0..100 {
            let num_syns = rule.num_synapses(&source, &target, &mut rng).unwrap();
            assert!(num_syns <= rule.max_synapses());
        }
    }

    #[test]
    fn test_tuning_rule_orthogonal_pair() {
        // tuning distance 180 gives probability 0
        let mut rng = StdRng::seed_from_u64(SEED);
        let rule = TuningRule::new(5);
        let source = exc_node(0, 0.0);
        let target = exc_node(1, 180.0);

        for _ in 0..100 {
            assert_eq!(rule.num_synapses(&source, &target, &mut rng).unwrap(), 0);
        }
    }

    #[test]
    fn test_tuning_rule_missing_attribute() {
        let rule = TuningRule::new(5);
        let source = exc_node(0, 0.0);
        let target = inh_node(1, 0.0, 0.0);

        assert_eq!(
            rule.num_synapses(&source, &target, &mut PanicRng),
            Err(NetgenError::MissingAttribute {
                node_id: 1,
                attribute: "tuning_angle"
            })
        );
    }

    #[test]
    fn test_tuning_rule_floor() {
        assert!(TuningRule::with_floor(5, 0.0).is_ok());
        assert!(TuningRule::with_floor(5, 180.0).is_ok());
        assert_eq!(
            TuningRule::with_floor(5, -1.0),
            Err(NetgenError::InvalidParameters(
                "The tuning-distance floor must be in [0, 180] degrees.".into()
            ))
        );
        assert_eq!(
            TuningRule::with_floor(5, 200.0),
            Err(NetgenError::InvalidParameters(
                "The tuning-distance floor must be in [0, 180] degrees.".into()
            ))
        );
    }

    #[test]
    fn test_planar_rule_self_pair() {
        let node = inh_node(0, 10.0, 20.0);
        let rule = PlanarDistanceRule::new(8);
        assert_eq!(rule.num_synapses(&node, &node, &mut PanicRng).unwrap(), 0);
    }

    #[test]
    fn test_planar_rule_beyond_cutoff() {
        // beyond the cutoff, the rule is deterministic and draws nothing
        let rule = PlanarDistanceRule::new(8);
        let source = inh_node(0, 0.0, 0.0);
        let target = inh_node(1, 301.0, 0.0);

        assert_eq!(rule.num_synapses(&source, &target, &mut PanicRng).unwrap(), 0);
    }

    #[test]
    fn test_planar_rule_coincident_pair() {
        // distance 0 gives probability 1, so the draw is always the maximum
        let mut rng = StdRng::seed_from_u64(SEED);
        let rule = PlanarDistanceRule::new(8);
        let source = inh_node(0, 50.0, -20.0);
        let target = inh_node(1, 50.0, -20.0);

        for _ in 0..100 {
            assert_eq!(rule.num_synapses(&source, &target, &mut rng).unwrap(), 8);
        }
    }

    #[test]
    fn test_planar_rule_bounds() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let rule = PlanarDistanceRule::new(4);
        let source = inh_node(0, 0.0, 0.0);
        let target = inh_node(1, 30.0, 40.0);

        for _ in 0..100 {
            let num_syns = rule.num_synapses(&source, &target, &mut rng).unwrap();
            assert!(num_syns <= rule.max_synapses());
        }
    }

    #[test]
    fn test_planar_rule_build() {
        assert!(PlanarDistanceRule::build(8, 300.0, 60.0).is_ok());
        assert_eq!(
            PlanarDistanceRule::build(8, -1.0, 60.0),
            Err(NetgenError::InvalidParameters(
                "The distance cutoff must be non-negative.".into()
            ))
        );
        assert_eq!(
            PlanarDistanceRule::build(8, 300.0, 0.0),
            Err(NetgenError::InvalidParameters(
                "The decay constant must be positive.".into()
            ))
        );
    }

    #[test]
    fn test_planar_rule_ignores_depth() {
        // nodes on top of each other in the plane but far apart in depth
        let mut rng = StdRng::seed_from_u64(SEED);
        let rule = PlanarDistanceRule::new(4);
        let source = Node::new(
            0,
            "l4",
            "PValb",
            EiType::Inhibitory,
            Point3::new(0.0, 400.0, 0.0),
            None,
        );
        let target = Node::new(
            1,
            "l4",
            "PValb",
            EiType::Inhibitory,
            Point3::new(0.0, 500.0, 0.0),
            None,
        );

        assert_eq!(rule.num_synapses(&source, &target, &mut rng).unwrap(), 4);
    }
}
