//! Spatial layout generation for node populations.

use nalgebra::Point3;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use super::error::NetgenError;

/// An annulus-shaped planar layout with a uniform depth band.
///
/// Positions are drawn uniformly by area within the ring between the two
/// radii (not uniformly by radius) in the (x, z) plane, while the y (depth)
/// coordinate is drawn uniformly from a fixed band.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AnnulusLayout {
    /// The inner radius of the annulus.
    radius_min: f64,
    /// The outer radius of the annulus.
    radius_max: f64,
    /// The minimum and maximum depth of the band.
    depth_range: (f64, f64),
}

impl AnnulusLayout {
    /// Create a new layout with the specified bounds.
    /// The function returns an error if the radii are negative or inverted,
    /// or if the depth band is inverted.
    ///
    /// # Examples
    ///
    /// ```
    /// use cortical_netgen::layout::AnnulusLayout;
    /// let layout = AnnulusLayout::new(0.0, 400.0, (400.0, 500.0)).unwrap();
    /// ```
    pub fn new(
        radius_min: f64,
        radius_max: f64,
        depth_range: (f64, f64),
    ) -> Result<Self, NetgenError> {
        if radius_min < 0.0 {
            return Err(NetgenError::InvalidParameters(
                "The minimum radius must be non-negative.".into(),
            ));
        }

        if radius_min > radius_max {
            return Err(NetgenError::InvalidParameters(
                "The minimum radius must be less than the maximum radius.".into(),
            ));
        }

        if depth_range.0 > depth_range.1 {
            return Err(NetgenError::InvalidParameters(
                "The minimum depth must be less than the maximum depth.".into(),
            ));
        }

        Ok(AnnulusLayout {
            radius_min,
            radius_max,
            depth_range,
        })
    }

    /// Returns the inner radius of the annulus.
    pub fn radius_min(&self) -> f64 {
        self.radius_min
    }

    /// Returns the outer radius of the annulus.
    pub fn radius_max(&self) -> f64 {
        self.radius_max
    }

    /// Returns the depth band of the layout.
    pub fn depth_range(&self) -> (f64, f64) {
        self.depth_range
    }

    /// Sample `num` positions from the layout.
    ///
    /// The radius is obtained by the inverse-CDF transform
    /// r = sqrt((rmin^2 - rmax^2) u + rmax^2), u uniform in [0, 1),
    /// which is uniform by area over the annulus.
    pub fn sample<R: Rng>(&self, num: usize, rng: &mut R) -> Vec<Point3<f64>> {
        let phi_dist = Uniform::new(0.0, TAU);
        let unit_dist = Uniform::new(0.0, 1.0);
        let depth_dist = Uniform::new_inclusive(self.depth_range.0, self.depth_range.1);

        let sq_min = self.radius_min.powi(2);
        let sq_max = self.radius_max.powi(2);

        (0..num)
            .map(|_| {
                let phi = phi_dist.sample(rng);
                let r = ((sq_min - sq_max) * unit_dist.sample(rng) + sq_max).sqrt();
                Point3::new(r * phi.cos(), depth_dist.sample(rng), r * phi.sin())
            })
            .collect()
    }
}
