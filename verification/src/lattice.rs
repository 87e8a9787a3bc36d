//! Regular D-dimensional lattice with flat, row-major field storage.
//!
//! Node coordinates `[c₀, …, c_{D−1}]` map to the linear offset
//! `Σ cᵢ · strideᵢ` with the last axis fastest. Physical position along an
//! axis is `cᵢ · h`.

use crate::error::ConfigError;

/// Largest lattice, in nodes, a check will allocate fields for.
pub const MAX_LATTICE_NODES: usize = 1 << 22;

/// Product of `shape`, or `None` on overflow.
pub fn checked_node_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))
}

/// Reject shapes whose node count overflows or exceeds [`MAX_LATTICE_NODES`].
pub(crate) fn check_node_budget(shape: &[usize]) -> Result<usize, ConfigError> {
    match checked_node_count(shape) {
        Some(n) if n <= MAX_LATTICE_NODES => Ok(n),
        count => Err(ConfigError::invalid_value(
            "grid",
            match count {
                Some(n) => format!("{n} nodes exceeds the limit of {MAX_LATTICE_NODES}"),
                None => format!("node count of {shape:?} overflows usize"),
            },
        )),
    }
}

/// Shape, stride and spacing of a regular lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<const D: usize> {
    shape: [usize; D],
    strides: [usize; D],
    spacing: f64,
    nodes: usize,
}

impl<const D: usize> Grid<D> {
    /// Build a grid; every axis must hold at least one interior node and the
    /// total must fit in [`MAX_LATTICE_NODES`].
    pub fn new(shape: [usize; D], spacing: f64) -> Result<Self, ConfigError> {
        if let Some((axis, &size)) = shape.iter().enumerate().find(|(_, &n)| n < 3) {
            return Err(ConfigError::NoInteriorNodes { axis, size });
        }
        let nodes = check_node_budget(&shape)?;
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(ConfigError::invalid_value(
                "spacing",
                format!("{spacing} is not a positive finite number"),
            ));
        }
        let mut strides = [1usize; D];
        for axis in (0..D.saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }
        Ok(Self { shape, strides, spacing, nodes })
    }

    pub fn shape(&self) -> [usize; D] {
        self.shape
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn stride(&self, axis: usize) -> usize {
        self.strides[axis]
    }

    /// Total node count.
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    #[inline]
    pub fn offset(&self, coords: [usize; D]) -> usize {
        coords.iter().zip(&self.strides).map(|(c, s)| c * s).sum()
    }

    #[inline]
    pub fn coords(&self, mut offset: usize) -> [usize; D] {
        let mut c = [0usize; D];
        for axis in 0..D {
            c[axis] = offset / self.strides[axis];
            offset %= self.strides[axis];
        }
        c
    }

    /// Every neighbor along every axis exists.
    #[inline]
    pub fn is_interior(&self, coords: [usize; D]) -> bool {
        coords.iter().zip(&self.shape).all(|(&c, &n)| c >= 1 && c + 1 < n)
    }

    pub fn interior_count(&self) -> usize {
        self.shape.iter().map(|n| n - 2).product()
    }

    /// Interior nodes in row-major order.
    pub fn interior(&self) -> impl Iterator<Item = [usize; D]> + '_ {
        (0..self.node_count()).map(move |o| self.coords(o)).filter(move |c| self.is_interior(*c))
    }

    /// Nodes on the `axis` face at layer `layer_index` whose other coordinates
    /// are strictly inside (edges and corners excluded).
    pub fn face_interior(&self, axis: usize, layer_index: usize) -> impl Iterator<Item = [usize; D]> + '_ {
        (0..self.node_count()).map(move |o| self.coords(o)).filter(move |c| {
            c[axis] == layer_index
                && c.iter()
                    .zip(&self.shape)
                    .enumerate()
                    .all(|(a, (&ci, &n))| a == axis || (ci >= 1 && ci + 1 < n))
        })
    }

    /// Physical r² = Σ (cᵢ·h)².
    #[inline]
    pub fn radius_sq(&self, coords: [usize; D]) -> f64 {
        coords
            .iter()
            .map(|&c| {
                let x = c as f64 * self.spacing;
                x * x
            })
            .sum()
    }

    /// Evaluate `f` at every node.
    pub fn field(&self, f: impl Fn([usize; D]) -> f64) -> Vec<f64> {
        (0..self.node_count()).map(|o| f(self.coords(o))).collect()
    }
}

// ── Field builders ────────────────────────────────────────────────────────────

/// Φ = Σ (cᵢ·h)², whose continuum Laplacian is 2·D everywhere.
pub fn quadratic_potential<const D: usize>(grid: &Grid<D>) -> Vec<f64> {
    grid.field(|c| grid.radius_sq(c))
}

/// w = 1 / (1 + a·r²).
pub fn radial_weight<const D: usize>(grid: &Grid<D>, curvature: f64) -> Vec<f64> {
    grid.field(|c| 1.0 / (1.0 + curvature * grid.radius_sq(c)))
}

/// w ≡ 1.
pub fn unit_weight<const D: usize>(grid: &Grid<D>) -> Vec<f64> {
    vec![1.0; grid.node_count()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_round_trip_row_major() {
        let g = Grid::new([4, 5, 6], 1.0).unwrap();
        assert_eq!(g.stride(0), 30);
        assert_eq!(g.stride(1), 6);
        assert_eq!(g.stride(2), 1);
        assert_eq!(g.offset([1, 2, 3]), 30 + 12 + 3);
        for o in 0..g.node_count() {
            assert_eq!(g.offset(g.coords(o)), o);
        }
    }

    #[test]
    fn interior_counts() {
        let g2 = Grid::new([33, 33], 1.0).unwrap();
        assert_eq!(g2.interior_count(), 31 * 31);
        assert_eq!(g2.interior().count(), 31 * 31);
        let g3 = Grid::new([3, 4, 5], 1.0).unwrap();
        assert_eq!(g3.interior_count(), 6);
        assert_eq!(g3.interior().count(), 6);
    }

    #[test]
    fn face_interior_skips_edges_and_corners() {
        let g = Grid::new([5, 7], 1.0).unwrap();
        // axis 0 faces: rows 0 and 4, columns 1..=5
        assert_eq!(g.face_interior(0, 0).count(), 5);
        assert!(g.face_interior(0, 0).all(|c| c[1] != 0 && c[1] != 6));
        // axis 1 faces: columns 0 and 6, rows 1..=3
        assert_eq!(g.face_interior(1, 6).count(), 3);
    }

    #[test]
    fn short_axis_is_rejected() {
        let err = Grid::new([2, 2], 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::NoInteriorNodes { axis: 0, size: 2 }));
        let err = Grid::new([5, 5, 1], 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::NoInteriorNodes { axis: 2, size: 1 }));
    }

    #[test]
    fn oversized_grid_is_rejected_before_allocation() {
        let err = Grid::new([usize::MAX / 2, 3, 3], 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "grid", .. }), "{err}");
        let err = Grid::new([2049, 2049], 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "grid", .. }), "{err}");
        assert_eq!(checked_node_count(&[usize::MAX, 2]), None);
        assert_eq!(Grid::new([2048, 2048], 1.0).unwrap().node_count(), MAX_LATTICE_NODES);
    }

    #[test]
    fn non_positive_spacing_is_rejected() {
        for h in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = Grid::new([5, 5], h).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { field: "spacing", .. }), "h = {h}");
        }
    }

    #[test]
    fn fields_use_physical_coordinates() {
        let g = Grid::new([3, 3], 0.5).unwrap();
        let phi = quadratic_potential(&g);
        assert_eq!(phi[g.offset([2, 1])], 1.0 + 0.25);
        let w = radial_weight(&g, 0.1);
        assert_eq!(w[g.offset([0, 0])], 1.0);
        assert!(w.iter().all(|&x| x > 0.0 && x <= 1.0));
        assert_eq!(unit_weight(&g).len(), 9);
    }
}
