//! Check configuration.
//!
//! [`LatticeCheckConfig`] describes one conservation-lattice run: grid shape
//! (its length selects 2D or 3D), spacing, weight mode and tolerances.
//! [`VerifyConfig`] bundles the 2D and 3D runs used by the `verify` binary.
//! Both are serializable so a run can be pinned in a JSON file.
//!
//! # Example
//!
//! ```rust
//! use ilg_verification::config::{LatticeCheckConfig, WeightMode};
//!
//! let cfg = LatticeCheckConfig::default_2d();
//! cfg.validate().expect("default config is valid");
//! assert_eq!(cfg.grid, vec![33, 33]);
//! assert_eq!(cfg.weight, WeightMode::Varying { curvature: 1e-4 });
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::lattice;

/// Tolerance for exact polynomial Laplacian identities.
pub const LAPLACIAN_TOLERANCE: f64 = 1e-12;

/// Tolerance for divergence-theorem balance (round-off over O(n^d) terms).
pub const DIVERGENCE_TOLERANCE: f64 = 1e-8;

/// Default curvature `a` in w = 1/(1 + a·r²).
pub const DEFAULT_CURVATURE: f64 = 1e-4;

// ── WeightMode ────────────────────────────────────────────────────────────────

/// Coefficient field used by the flux-divergence check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WeightMode {
    /// w ≡ 1.
    Constant,
    /// w = 1/(1 + a·r²) with a > 0.
    Varying {
        /// The coefficient `a`.
        curvature: f64,
    },
}

// ── LatticeCheckConfig ────────────────────────────────────────────────────────

/// One conservation-lattice run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeCheckConfig {
    /// Nodes per axis; 2 or 3 entries, at least 3 each, at most
    /// [`lattice::MAX_LATTICE_NODES`] in total.
    pub grid: Vec<usize>,
    /// Lattice spacing h. Default: **1.0**.
    pub spacing: f64,
    /// Coefficient field. Default: **varying, a = 1e-4**.
    pub weight: WeightMode,
    /// Default: **1e-12**. This absolute bound assumes h is exactly
    /// representable (a power of two); other spacings leave O(1e-12)
    /// rounding in the /h² stencil and need a looser tolerance.
    pub laplacian_tolerance: f64,
    /// Default: **1e-8**.
    pub divergence_tolerance: f64,
}

impl LatticeCheckConfig {
    /// 33×33, unit spacing.
    pub fn default_2d() -> Self {
        Self::with_grid(vec![33, 33])
    }

    /// 17×17×17, unit spacing. Smaller than 2D to bound the O(n³) cost.
    pub fn default_3d() -> Self {
        Self::with_grid(vec![17, 17, 17])
    }

    /// Defaults for everything but the grid.
    pub fn with_grid(grid: Vec<usize>) -> Self {
        Self {
            grid,
            spacing: 1.0,
            weight: WeightMode::Varying { curvature: DEFAULT_CURVATURE },
            laplacian_tolerance: LAPLACIAN_TOLERANCE,
            divergence_tolerance: DIVERGENCE_TOLERANCE,
        }
    }

    pub fn spacing(mut self, h: f64) -> Self {
        self.spacing = h;
        self
    }

    pub fn weight(mut self, weight: WeightMode) -> Self {
        self.weight = weight;
        self
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        self.grid.len()
    }

    /// Reject configurations that cannot produce a meaningful verdict.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.grid.len(), 2 | 3) {
            return Err(ConfigError::UnsupportedDimension { dims: self.grid.len() });
        }
        if let Some((axis, &size)) = self.grid.iter().enumerate().find(|(_, &n)| n < 3) {
            return Err(ConfigError::NoInteriorNodes { axis, size });
        }
        lattice::check_node_budget(&self.grid)?;
        positive_finite("spacing", self.spacing)?;
        positive_finite("laplacian_tolerance", self.laplacian_tolerance)?;
        positive_finite("divergence_tolerance", self.divergence_tolerance)?;
        if let WeightMode::Varying { curvature } = self.weight {
            positive_finite("weight.curvature", curvature)?;
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn positive_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(field, format!("must be finite and > 0, got {value}")))
    }
}

// ── VerifyConfig ──────────────────────────────────────────────────────────────

/// Full run: the gate schedule is fixed, the lattices are configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyConfig {
    pub lattice_2d: LatticeCheckConfig,
    /// `None` skips the 3D run.
    pub lattice_3d: Option<LatticeCheckConfig>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            lattice_2d: LatticeCheckConfig::default_2d(),
            lattice_3d: Some(LatticeCheckConfig::default_3d()),
        }
    }
}

impl VerifyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lattice_2d.validate()?;
        if let Some(cfg) = &self.lattice_3d {
            cfg.validate()?;
        }
        Ok(())
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::FileRead { path: path.to_path_buf(), source })?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|source| ConfigError::ParseError { path: path.to_path_buf(), source })?;
        cfg.validate()?;
        Ok(cfg)
    }
}
