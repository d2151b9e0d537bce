//! Run configuration.
//!
//! A [`Config`] carries everything one conversion needs. Stage options are
//! derived from it with [`Config::shrink_options`] and
//! [`Config::periodic_options`].
//!
//! ```
//! use grainlayer::config::Config;
//!
//! let config = Config::new("tess.inp", "tess.cent")
//!     .with_periodic(true)
//!     .with_shrink_factor(0.05);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.output_path().to_str(), Some("tess.modified.inp"));
//! ```

use std::path::{Path, PathBuf};

use crate::algo::periodic::{PeriodicOptions, DEFAULT_TIE_EPSILON, DEFAULT_TOLERANCE};
use crate::algo::shrink::ShrinkOptions;
use crate::error::{Error, Result};
use crate::io::default_output_path;
use crate::mesh::DEFAULT_GRAIN_PREFIX;

/// Default shrink factor.
pub const DEFAULT_SHRINK_FACTOR: f64 = 0.1;

/// Parameters of one conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Input deck.
    pub input: PathBuf,

    /// Grain centroid file.
    pub centroids: PathBuf,

    /// Output deck. Defaults to [`default_output_path`] of the input.
    pub output: Option<PathBuf>,

    /// Treat the domain as periodic in x and y.
    pub periodic: bool,

    /// Fraction of the centroid distance each node moves, in `(0, 1)`.
    pub shrink_factor: f64,

    /// Distance within which nodes count as coincident.
    pub tolerance: f64,

    /// Margin a periodic match must hold over the runner-up.
    pub tie_epsilon: f64,

    /// Keep nodes on domain faces on their face.
    pub constrain_domain_faces: bool,

    /// Repair periodic pairs broken by shrinkage instead of failing.
    pub reconcile_periodic: bool,

    /// Fill the holes opened at grain junctions.
    pub fill_junctions: bool,

    /// First label for generated elements.
    pub first_element_id: Option<u64>,

    /// Element set prefix marking grains.
    pub grain_prefix: String,
}

impl Config {
    /// Default configuration for the given input and centroid files.
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(input: P, centroids: Q) -> Self {
        Self {
            input: input.into(),
            centroids: centroids.into(),
            output: None,
            periodic: false,
            shrink_factor: DEFAULT_SHRINK_FACTOR,
            tolerance: DEFAULT_TOLERANCE,
            tie_epsilon: DEFAULT_TIE_EPSILON,
            constrain_domain_faces: true,
            reconcile_periodic: false,
            fill_junctions: true,
            first_element_id: None,
            grain_prefix: DEFAULT_GRAIN_PREFIX.to_string(),
        }
    }

    /// Set the output path.
    pub fn with_output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Enable or disable periodic mode.
    pub fn with_periodic(mut self, periodic: bool) -> Self {
        self.periodic = periodic;
        self
    }

    /// Set the shrink factor.
    pub fn with_shrink_factor(mut self, factor: f64) -> Self {
        self.shrink_factor = factor;
        self
    }

    /// Set the coincidence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the periodic tie-break margin.
    pub fn with_tie_epsilon(mut self, tie_epsilon: f64) -> Self {
        self.tie_epsilon = tie_epsilon;
        self
    }

    /// Keep or release nodes on domain faces.
    pub fn with_constrain_domain_faces(mut self, constrain: bool) -> Self {
        self.constrain_domain_faces = constrain;
        self
    }

    /// Enable or disable periodic reconciliation.
    pub fn with_reconcile_periodic(mut self, reconcile: bool) -> Self {
        self.reconcile_periodic = reconcile;
        self
    }

    /// Enable or disable junction filling.
    pub fn with_fill_junctions(mut self, fill: bool) -> Self {
        self.fill_junctions = fill;
        self
    }

    /// Set the first label for generated elements.
    pub fn with_first_element_id(mut self, id: u64) -> Self {
        self.first_element_id = Some(id);
        self
    }

    /// Set the grain element set prefix.
    pub fn with_grain_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.grain_prefix = prefix.into();
        self
    }

    /// Where the converted deck is written.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => default_output_path(&self.input),
        }
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        let s = self.shrink_factor;
        if !(s > 0.0 && s < 1.0) {
            return Err(Error::invalid_param("shrink factor", s, "must be in (0, 1)"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::invalid_param(
                "tolerance",
                self.tolerance,
                "must be positive",
            ));
        }
        if !(self.tie_epsilon.is_finite() && self.tie_epsilon >= 0.0) {
            return Err(Error::invalid_param(
                "tie epsilon",
                self.tie_epsilon,
                "must not be negative",
            ));
        }
        if self.first_element_id == Some(0) {
            return Err(Error::invalid_param("first element id", 0, "must be positive"));
        }
        if self.grain_prefix.is_empty() {
            return Err(Error::invalid_param("grain prefix", "''", "must not be empty"));
        }
        if same_file(&self.output_path(), &self.input) {
            return Err(Error::invalid_param(
                "output",
                self.output_path().display(),
                "must differ from the input",
            ));
        }
        Ok(())
    }

    /// Options for the shrink stage.
    pub fn shrink_options(&self) -> ShrinkOptions {
        let options = ShrinkOptions::default()
            .with_factor(self.shrink_factor)
            .with_tolerance(self.tolerance)
            .with_reconcile_periodic(self.reconcile_periodic);
        if self.constrain_domain_faces {
            options
        } else {
            options.free_domain_faces()
        }
    }

    /// Options for periodic matching.
    pub fn periodic_options(&self) -> PeriodicOptions {
        PeriodicOptions::default()
            .with_tolerance(self.tolerance)
            .with_tie_epsilon(self.tie_epsilon)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("mesh/tess.inp", "mesh/tess.cent");
        assert!(!config.periodic);
        assert_eq!(config.shrink_factor, 0.1);
        assert_eq!(config.tolerance, 1e-6);
        assert!(config.constrain_domain_faces);
        assert!(!config.reconcile_periodic);
        assert!(config.fill_junctions);
        assert_eq!(config.grain_prefix, "face");
        assert_eq!(config.output_path(), PathBuf::from("mesh/tess.modified.inp"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_output() {
        let config = Config::new("a.inp", "a.cent").with_output("b.inp");
        assert_eq!(config.output_path(), PathBuf::from("b.inp"));
    }

    #[test]
    fn test_shrink_factor_range() {
        for s in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            let config = Config::new("a.inp", "a.cent").with_shrink_factor(s);
            assert!(
                matches!(config.validate(), Err(Error::InvalidParameter { name: "shrink factor", .. })),
                "factor {s} accepted"
            );
        }
        assert!(Config::new("a.inp", "a.cent")
            .with_shrink_factor(0.99)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        let base = Config::new("a.inp", "a.cent");
        assert!(base.clone().with_tolerance(0.0).validate().is_err());
        assert!(base.clone().with_tie_epsilon(-1.0).validate().is_err());
        assert!(base.clone().with_first_element_id(0).validate().is_err());
        assert!(base.clone().with_grain_prefix("").validate().is_err());
        assert!(base.clone().with_output("a.inp").validate().is_err());
    }

    #[test]
    fn test_stage_options() {
        let config = Config::new("a.inp", "a.cent")
            .with_shrink_factor(0.25)
            .with_tolerance(1e-4)
            .with_tie_epsilon(1e-7)
            .with_constrain_domain_faces(false)
            .with_reconcile_periodic(true);

        let shrink = config.shrink_options();
        assert_eq!(shrink.factor, 0.25);
        assert_eq!(shrink.tolerance, 1e-4);
        assert!(!shrink.constrain_domain_faces);
        assert!(shrink.reconcile_periodic);

        let periodic = config.periodic_options();
        assert_eq!(periodic.tolerance, 1e-4);
        assert_eq!(periodic.tie_epsilon, 1e-7);
    }
}
