//! Canonical nine-gate schedule over the 1024-tick cycle.
//!
//! ## Tick layout
//!
//! ```text
//!  bit:  9 8 7 6 5 4 3 | 2 1 0
//!        └─ high bits ─┘ └ φ ┘      φ = tick mod 8
//! ```
//!
//! A gate constrains some of the seven high bits through `(mask, pattern)` and
//! admits a subset of the eight phases. A tick is blocked by the gate iff
//! `(tick & mask) == pattern` and `φ ∈ phases`.
//!
//! The canonical schedule blocks 46 ticks, so the suppression fraction is
//! S = 1 − 46/1024 = 489/512 exactly. These constants are a published contract:
//! changing them is a deliberate edit here, never something a verifier does.

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Cycle length T (ticks per breath).
pub const CYCLE_LEN: u32 = 1024;

/// Number of gates N in the canonical schedule.
pub const GATE_COUNT: usize = 9;

/// Bits that carry the phase φ.
pub const PHASE_MASK: u16 = 0b000_0000_111;

/// The seven high bits a gate mask may constrain.
pub const HIGH_BITS_MASK: u16 = 0b111_1111_000;

/// The 10-bit tick space.
pub const TICK_MASK: u16 = 0b11_1111_1111;

/// Number of distinct phases.
pub const PHASE_COUNT: u32 = 8;

/// Canonical suppression fraction S = 489/512.
pub const CANONICAL_SUPPRESSION: Fraction = Fraction { numerator: 489, denominator: 512 };

/// The canonical nine gates, in evaluation order.
pub const CANONICAL_GATES: [Gate; GATE_COUNT] = [
    Gate::new(0b1111111000, 0b0000011000, PhaseSet::from_phases(&[0, 1, 2, 3, 4])),
    Gate::new(0b1111111000, 0b0010001000, PhaseSet::from_phases(&[1, 2, 3, 4, 5])),
    Gate::new(0b1111111000, 0b0011101000, PhaseSet::from_phases(&[2, 3, 4, 5, 6])),
    Gate::new(0b1111111000, 0b0101010000, PhaseSet::from_phases(&[3, 4, 5, 6, 7])),
    Gate::new(0b1111111000, 0b0110111000, PhaseSet::from_phases(&[0, 2, 3, 5, 7])),
    Gate::new(0b1111111000, 0b1000100000, PhaseSet::from_phases(&[0, 1, 3, 5, 6])),
    Gate::new(0b1111111000, 0b1010011000, PhaseSet::from_phases(&[1, 3, 4, 6, 7])),
    Gate::new(0b1111111000, 0b1100000000, PhaseSet::from_phases(&[0, 2, 4, 6, 7])),
    Gate::new(0b1111111000, 0b1101111000, PhaseSet::from_phases(&[0, 1, 2, 4, 5, 7])),
];

/// Gating factor β = T·N / S for the canonical schedule.
///
/// Used by downstream kernels to scale the characteristic acceleration.
pub fn gating_beta() -> f64 {
    (CYCLE_LEN as f64 * GATE_COUNT as f64) / CANONICAL_SUPPRESSION.to_f64()
}

/// Capacity factor S / (T·N), the reciprocal of [`gating_beta`].
pub fn capacity_factor() -> f64 {
    CANONICAL_SUPPRESSION.to_f64() / (CYCLE_LEN as f64 * GATE_COUNT as f64)
}

// ── PhaseSet ──────────────────────────────────────────────────────────────────

/// Subset of the eight phases {0..7}, one bit per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseSet(u8);

impl PhaseSet {
    /// Empty set.
    pub const EMPTY: PhaseSet = PhaseSet(0);

    /// Build from raw bits; bit k set means phase k is admitted.
    pub const fn from_bits(bits: u8) -> Self {
        PhaseSet(bits)
    }

    /// Build from a list of phases. Values ≥ 8 are ignored.
    pub const fn from_phases(phases: &[u8]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < phases.len() {
            if phases[i] < 8 {
                bits |= 1 << phases[i];
            }
            i += 1;
        }
        PhaseSet(bits)
    }

    /// All eight phases.
    pub const fn full() -> Self {
        PhaseSet(0xFF)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, phase: u16) -> bool {
        phase < 8 && (self.0 >> phase) & 1 == 1
    }

    pub const fn intersect(self, other: PhaseSet) -> PhaseSet {
        PhaseSet(self.0 & other.0)
    }

    pub const fn union(self, other: PhaseSet) -> PhaseSet {
        PhaseSet(self.0 | other.0)
    }

    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` iff every phase in `self` is also in `other`.
    pub const fn is_subset_of(self, other: PhaseSet) -> bool {
        self.0 & !other.0 == 0
    }
}

// ── Gate ──────────────────────────────────────────────────────────────────────

/// One masked-pattern-plus-phase predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gate {
    pub mask: u16,
    pub pattern: u16,
    pub phases: PhaseSet,
}

impl Gate {
    pub const fn new(mask: u16, pattern: u16, phases: PhaseSet) -> Self {
        Self { mask, pattern, phases }
    }

    /// `true` iff `tick` satisfies this gate.
    #[inline]
    pub const fn blocks(&self, tick: u16) -> bool {
        (tick & self.mask) == self.pattern && self.phases.contains(tick & PHASE_MASK)
    }

    /// Bits forced to 1 under the mask.
    #[inline]
    pub const fn forced_ones(&self) -> u16 {
        self.pattern & self.mask
    }

    /// Bits forced to 0 under the mask.
    #[inline]
    pub const fn forced_zeros(&self) -> u16 {
        !self.pattern & self.mask
    }

    /// Structural sanity of the definition.
    ///
    /// Not enforced anywhere at runtime: the brute-force/analytic cross-check
    /// is what catches a malformed gate. This is for tests and tooling.
    pub const fn is_well_formed(&self) -> bool {
        self.pattern & !self.mask == 0
            && self.mask & !HIGH_BITS_MASK == 0
            && !self.phases.is_empty()
    }
}

// ── Fraction ──────────────────────────────────────────────────────────────────

/// Exact non-negative rational, always stored in lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    numerator: u32,
    denominator: u32,
}

impl Fraction {
    /// Build and reduce `numerator / denominator`.
    ///
    /// Panics if `denominator == 0`; every caller passes [`CYCLE_LEN`].
    pub(crate) fn new(numerator: u32, denominator: u32) -> Self {
        assert!(denominator != 0, "fraction denominator must be non-zero");
        let g = gcd(numerator, denominator);
        Self { numerator: numerator / g, denominator: denominator / g }
    }

    /// Suppression fraction 1 − blocked/cycle_len.
    pub(crate) fn suppression(blocked: u32, cycle_len: u32) -> Self {
        Self::new(cycle_len.saturating_sub(blocked), cycle_len)
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_gates_are_well_formed() {
        for (j, g) in CANONICAL_GATES.iter().enumerate() {
            assert!(g.is_well_formed(), "gate {j} is malformed: {g:?}");
            assert_eq!(g.pattern & PHASE_MASK, 0, "gate {j} pattern touches phase bits");
        }
    }

    #[test]
    fn canonical_suppression_is_reduced() {
        assert_eq!(Fraction::new(978, 1024), CANONICAL_SUPPRESSION);
        assert_eq!(Fraction::suppression(46, CYCLE_LEN), CANONICAL_SUPPRESSION);
        assert_eq!(CANONICAL_SUPPRESSION.to_string(), "489/512");
        assert_eq!(CANONICAL_SUPPRESSION.to_f64(), 0.955078125);
    }

    #[test]
    fn phase_set_membership() {
        let p = PhaseSet::from_phases(&[0, 2, 7, 9]);
        assert!(p.contains(0) && p.contains(2) && p.contains(7));
        assert!(!p.contains(1) && !p.contains(8));
        assert_eq!(p.len(), 3);
        assert!(p.is_subset_of(PhaseSet::full()));
        assert!(PhaseSet::EMPTY.is_empty());
        assert_eq!(p.intersect(PhaseSet::from_phases(&[2, 3])).bits(), 0b100);
        assert_eq!(p.union(PhaseSet::from_phases(&[1])).len(), 4);
    }

    #[test]
    fn gate_blocks_only_matching_pattern_and_phase() {
        let g = CANONICAL_GATES[0];
        // pattern 0b0000011000 with phase 4
        assert!(g.blocks(0b0000011_100));
        // same high bits, phase 5 not admitted
        assert!(!g.blocks(0b0000011_101));
        // different high bits
        assert!(!g.blocks(0b0000111_000));
    }

    #[test]
    fn malformed_gates_are_detected() {
        let outside_mask = Gate::new(0b1111000000, 0b0000011000, PhaseSet::full());
        let phase_bits = Gate::new(0b1111111001, 0b0000000001, PhaseSet::full());
        let no_phase = Gate::new(0b1111111000, 0, PhaseSet::EMPTY);
        assert!(!outside_mask.is_well_formed());
        assert!(!phase_bits.is_well_formed());
        assert!(!no_phase.is_well_formed());
    }

    #[test]
    fn gating_beta_and_capacity_are_reciprocal() {
        let beta = gating_beta();
        assert!((beta - 1024.0 * 9.0 * 512.0 / 489.0).abs() < 1e-9);
        assert!((beta * capacity_factor() - 1.0).abs() < 1e-15);
    }
}
