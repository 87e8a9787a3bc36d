//! Discrete conservation checks for div(w ∇Φ) on regular 2D/3D lattices.
//!
//! ## Operators
//!
//! ```text
//! Laplacian (w ≡ 1):   ΔΦ(p) = Σ_axis (Φ(p+e) − 2Φ(p) + Φ(p−e)) / h²
//!
//! face weight:         w_f(p, axis) = ½ (w(p) + w(p+e))
//! face flux:           F(p, axis)   = w_f · (Φ(p+e) − Φ(p)) / h
//! divergence:          div(p)       = Σ_axis (F(p, axis) − F(p−e, axis)) / h
//! ```
//!
//! ## What this module verifies
//!
//! 1. **Exact Laplacian**: for Φ = Σ (cᵢ h)² the stencil returns 2·D at every
//!    interior node (4 in 2D, 6 in 3D) to within 1e-12. That bound holds for
//!    power-of-two h; a spacing like 0.1 rounds to about 1.4e-12 and needs a
//!    looser `laplacian_tolerance`.
//!
//! 2. **Discrete divergence theorem**: with w = 1/(1 + a r²),
//!
//!    ```text
//!    sum_div  = Σ_interior div(p) · h^D
//!    flux_out = Σ_boundary ±F · h^(D−1)
//!    ```
//!
//!    agree to 1e-8. The boundary sum covers only the strict interior of each
//!    face: edge and corner nodes carry more than one outward normal and are
//!    skipped. The sum over interior nodes telescopes onto exactly those faces,
//!    which is why the balance closes. A corner-corrected boundary stencil has
//!    not been validated against this scheme.
//!
//! 3. **Flux form reduces to the Laplacian** when w ≡ 1.
//!
//! Both sides of the balance are accumulated with Neumaier compensation in
//! fixed row-major order, so residuals are reproducible bit for bit and stay
//! well under tolerance on 33³ grids.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{LatticeCheckConfig, WeightMode};
use crate::error::ConfigError;
use crate::lattice::{quadratic_potential, radial_weight, unit_weight, Grid};

// ── Result records ────────────────────────────────────────────────────────────

/// One sub-check of a lattice run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubCheck {
    pub name: &'static str,
    /// Closed-form value, when the check compares against one.
    pub expected: Option<f64>,
    pub residual: f64,
    pub tolerance: f64,
    pub interior_count: usize,
    pub passed: bool,
}

impl SubCheck {
    fn new(name: &'static str, expected: Option<f64>, residual: f64, tolerance: f64, interior_count: usize) -> Self {
        // NaN residuals fail.
        let passed = residual <= tolerance;
        if !passed {
            warn!(check = name, residual, tolerance, "lattice sub-check failed");
        }
        Self { name, expected, residual, tolerance, interior_count, passed }
    }
}

/// Divergence-theorem balance with both sides of the identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivergenceCheck {
    #[serde(flatten)]
    pub check: SubCheck,
    pub sum_div: f64,
    pub flux_out: f64,
}

/// Every sub-check of one lattice configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatticeReport {
    pub dimension: usize,
    pub grid: Vec<usize>,
    pub spacing: f64,
    pub weight: WeightMode,
    pub laplacian: SubCheck,
    pub divergence: DivergenceCheck,
    /// Present only for [`WeightMode::Constant`].
    pub flux_matches_laplacian: Option<SubCheck>,
    pub passed: bool,
}

// ── Compensated accumulation ─────────────────────────────────────────────────

/// Neumaier running sum.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    #[inline]
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

// ── Stencils ──────────────────────────────────────────────────────────────────

#[inline]
fn laplacian_at<const D: usize>(grid: &Grid<D>, phi: &[f64], o: usize) -> f64 {
    let inv_h2 = 1.0 / (grid.spacing() * grid.spacing());
    (0..D)
        .map(|axis| {
            let s = grid.stride(axis);
            (phi[o + s] - 2.0 * phi[o] + phi[o - s]) * inv_h2
        })
        .sum()
}

/// Flux through the face between node `o` and its `+axis` neighbor.
#[inline]
fn face_flux<const D: usize>(grid: &Grid<D>, phi: &[f64], w: &[f64], o: usize, axis: usize) -> f64 {
    let n = o + grid.stride(axis);
    let w_face = 0.5 * (w[o] + w[n]);
    let grad = (phi[n] - phi[o]) / grid.spacing();
    w_face * grad
}

#[inline]
fn divergence_at<const D: usize>(grid: &Grid<D>, phi: &[f64], w: &[f64], o: usize) -> f64 {
    let mut acc = 0.0;
    for axis in 0..D {
        let right = face_flux(grid, phi, w, o, axis);
        let left = face_flux(grid, phi, w, o - grid.stride(axis), axis);
        acc += right - left;
    }
    acc / grid.spacing()
}

// ── Checks on explicit fields ─────────────────────────────────────────────────

/// Max |ΔΦ − expected| over interior nodes.
pub fn laplacian_check<const D: usize>(grid: &Grid<D>, phi: &[f64], expected: f64, tolerance: f64) -> SubCheck {
    let mut max_abs_err = 0.0f64;
    let mut count = 0usize;
    for c in grid.interior() {
        let err = (laplacian_at(grid, phi, grid.offset(c)) - expected).abs();
        max_abs_err = max_abs_err.max(err);
        count += 1;
    }
    debug!(dims = D, nodes = count, max_abs_err, expected, "laplacian evaluated");
    SubCheck::new("constant_w_laplacian", Some(expected), max_abs_err, tolerance, count)
}

/// Max |div(w∇Φ) − expected| over interior nodes.
pub fn flux_divergence_pointwise<const D: usize>(
    grid: &Grid<D>,
    phi: &[f64],
    w: &[f64],
    expected: f64,
    tolerance: f64,
) -> SubCheck {
    let mut max_abs_err = 0.0f64;
    let mut count = 0usize;
    for c in grid.interior() {
        let err = (divergence_at(grid, phi, w, grid.offset(c)) - expected).abs();
        max_abs_err = max_abs_err.max(err);
        count += 1;
    }
    SubCheck::new("flux_matches_laplacian", Some(expected), max_abs_err, tolerance, count)
}

/// Net outward flux through the strict interior of every boundary face.
pub fn boundary_flux<const D: usize>(grid: &Grid<D>, phi: &[f64], w: &[f64]) -> f64 {
    let area = grid.spacing().powi(D as i32 - 1);
    let shape = grid.shape();
    let mut flux_out = CompensatedSum::default();
    for axis in 0..D {
        // min face: outward normal is −e, flux taken on the face between 0 and 1
        for c in grid.face_interior(axis, 0) {
            flux_out.add(-face_flux(grid, phi, w, grid.offset(c), axis) * area);
        }
        // max face: flux on the face between n−2 and n−1
        for c in grid.face_interior(axis, shape[axis] - 2) {
            flux_out.add(face_flux(grid, phi, w, grid.offset(c), axis) * area);
        }
    }
    flux_out.value()
}

/// Σ_interior div(w∇Φ)·h^D against the boundary flux.
pub fn divergence_balance<const D: usize>(grid: &Grid<D>, phi: &[f64], w: &[f64], tolerance: f64) -> DivergenceCheck {
    let volume = grid.spacing().powi(D as i32);
    let mut acc = CompensatedSum::default();
    let mut count = 0usize;
    for c in grid.interior() {
        acc.add(divergence_at(grid, phi, w, grid.offset(c)) * volume);
        count += 1;
    }
    let sum_div = acc.value();
    let flux_out = boundary_flux(grid, phi, w);
    let residual = (sum_div - flux_out).abs();
    debug!(dims = D, nodes = count, sum_div, flux_out, residual, "divergence balance evaluated");
    DivergenceCheck {
        check: SubCheck::new("varying_w_divergence", None, residual, tolerance, count),
        sum_div,
        flux_out,
    }
}

// ── ConservationLatticeChecker ────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Lattice {
    Two(Grid<2>),
    Three(Grid<3>),
}

/// Runs the lattice checks for one validated configuration.
#[derive(Debug, Clone)]
pub struct ConservationLatticeChecker {
    config: LatticeCheckConfig,
    lattice: Lattice,
}

impl ConservationLatticeChecker {
    /// Validate `config` and build its grid.
    pub fn new(config: LatticeCheckConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let h = config.spacing;
        let lattice = match *config.grid.as_slice() {
            [nx, ny] => Lattice::Two(Grid::new([nx, ny], h)?),
            [nx, ny, nz] => Lattice::Three(Grid::new([nx, ny, nz], h)?),
            _ => return Err(ConfigError::UnsupportedDimension { dims: config.grid.len() }),
        };
        Ok(Self { config, lattice })
    }

    pub fn config(&self) -> &LatticeCheckConfig {
        &self.config
    }

    pub fn check_laplacian(&self) -> SubCheck {
        match &self.lattice {
            Lattice::Two(g) => self.laplacian_on(g),
            Lattice::Three(g) => self.laplacian_on(g),
        }
    }

    pub fn check_flux_divergence(&self) -> DivergenceCheck {
        match &self.lattice {
            Lattice::Two(g) => self.divergence_on(g),
            Lattice::Three(g) => self.divergence_on(g),
        }
    }

    /// Pointwise flux-form check; only meaningful for constant weight.
    pub fn check_flux_matches_laplacian(&self) -> Option<SubCheck> {
        if self.config.weight != WeightMode::Constant {
            return None;
        }
        Some(match &self.lattice {
            Lattice::Two(g) => self.flux_consistency_on(g),
            Lattice::Three(g) => self.flux_consistency_on(g),
        })
    }

    pub fn run(&self) -> LatticeReport {
        let laplacian = self.check_laplacian();
        let divergence = self.check_flux_divergence();
        let flux_matches_laplacian = self.check_flux_matches_laplacian();
        let passed = laplacian.passed
            && divergence.check.passed
            && flux_matches_laplacian.as_ref().map_or(true, |c| c.passed);
        LatticeReport {
            dimension: self.config.dimension(),
            grid: self.config.grid.clone(),
            spacing: self.config.spacing,
            weight: self.config.weight,
            laplacian,
            divergence,
            flux_matches_laplacian,
            passed,
        }
    }

    fn weight_field<const D: usize>(&self, grid: &Grid<D>) -> Vec<f64> {
        match self.config.weight {
            WeightMode::Constant => unit_weight(grid),
            WeightMode::Varying { curvature } => radial_weight(grid, curvature),
        }
    }

    fn laplacian_on<const D: usize>(&self, grid: &Grid<D>) -> SubCheck {
        let phi = quadratic_potential(grid);
        laplacian_check(grid, &phi, 2.0 * D as f64, self.config.laplacian_tolerance)
    }

    fn divergence_on<const D: usize>(&self, grid: &Grid<D>) -> DivergenceCheck {
        let phi = quadratic_potential(grid);
        let w = self.weight_field(grid);
        divergence_balance(grid, &phi, &w, self.config.divergence_tolerance)
    }

    fn flux_consistency_on<const D: usize>(&self, grid: &Grid<D>) -> SubCheck {
        let phi = quadratic_potential(grid);
        let w = unit_weight(grid);
        flux_divergence_pointwise(grid, &phi, &w, 2.0 * D as f64, self.config.laplacian_tolerance)
    }
}

// ─── verification tests ──────────────────────────────────────────────────────
