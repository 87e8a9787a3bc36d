//! Blocked-tick counting for a gate schedule, by two independent derivations.
//!
//! ## Brute force
//!
//! Walk all 1024 ticks; a tick is blocked if any gate matches (first match
//! short-circuits).
//!
//! ## Inclusion–exclusion
//!
//! For a subset J of gates the intersection ∩_{j∈J} B_j is empty unless the
//! patterns agree wherever the masks overlap. When they do:
//!
//! ```text
//! |∩ B_j| = 2^(10 − rank(M_J)) · |∩ Φ_j| / 8
//! rank(M_J) = popcount(OR of masks in J)
//! ```
//!
//! The unconstrained bits are free; the three phase bits are always free
//! (masks live in the high bits), so the phase fraction applies to them.
//! Then |∪ B_j| = Σ_J (−1)^(|J|+1) |∩ B_j|.
//!
//! ## What this module verifies
//!
//! 1. Canonical schedule: both methods give 46, so S = 489/512.
//! 2. Agreement for every 3-gate sub-schedule and for random well-formed
//!    schedules with overlapping masks.
//! 3. Union monotonicity under phase widening.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::schedule::{
    Fraction, Gate, PhaseSet, CANONICAL_GATES, CANONICAL_SUPPRESSION, CYCLE_LEN, PHASE_COUNT,
    TICK_MASK,
};

/// Largest schedule the subset enumeration accepts (2^24 subsets).
pub const MAX_ANALYTIC_GATES: usize = 24;

// ── GateSchedule ──────────────────────────────────────────────────────────────

/// An ordered list of gates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSchedule {
    gates: Vec<Gate>,
    canonical: bool,
}

impl GateSchedule {
    /// The published nine-gate schedule.
    pub fn canonical() -> Self {
        Self { gates: CANONICAL_GATES.to_vec(), canonical: true }
    }

    /// An arbitrary schedule. One equal to [`CANONICAL_GATES`], gate for
    /// gate and in order, is treated as canonical.
    pub fn new(gates: impl Into<Vec<Gate>>) -> Result<Self, ConfigError> {
        let gates = gates.into();
        if gates.len() > MAX_ANALYTIC_GATES {
            return Err(ConfigError::TooManyGates { count: gates.len(), max: MAX_ANALYTIC_GATES });
        }
        let canonical = gates[..] == CANONICAL_GATES[..];
        Ok(Self { gates, canonical })
    }

    /// The gates at `indices`, in the order given.
    pub fn subset(&self, indices: &[usize]) -> Result<Self, ConfigError> {
        let gates = indices
            .iter()
            .map(|&index| {
                self.gates
                    .get(index)
                    .copied()
                    .ok_or(ConfigError::GateIndexOutOfRange { index, len: self.gates.len() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(gates)
    }

    /// Copy with gate `index` admitting every phase.
    pub fn with_widened_phases(&self, index: usize) -> Result<Self, ConfigError> {
        self.with_extra_phases(index, PhaseSet::full())
    }

    /// Copy with `extra` added to the phase set of gate `index`.
    pub fn with_extra_phases(&self, index: usize, extra: PhaseSet) -> Result<Self, ConfigError> {
        let mut gates = self.gates.clone();
        let len = gates.len();
        let gate = gates.get_mut(index).ok_or(ConfigError::GateIndexOutOfRange { index, len })?;
        if extra.is_subset_of(gate.phases) {
            debug!(index, "phase widening leaves gate unchanged");
        }
        gate.phases = gate.phases.union(extra);
        Self::new(gates)
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// `true` iff the gates equal the published schedule.
    pub fn is_canonical(&self) -> bool {
        self.canonical
    }
}

impl Default for GateSchedule {
    fn default() -> Self {
        Self::canonical()
    }
}

// ── Subset primitives ─────────────────────────────────────────────────────────
//
// A subset is a bitmask over gate indices: bit j set ⇔ gate j ∈ subset.

fn members(gates: &[Gate], subset: u32) -> impl Iterator<Item = &Gate> {
    gates.iter().enumerate().filter(move |(j, _)| subset >> j & 1 == 1).map(|(_, g)| g)
}

/// No bit is forced to 1 by one member and to 0 by another.
pub fn patterns_compatible(gates: &[Gate], subset: u32) -> bool {
    let mut forced1 = 0u16;
    let mut forced0 = 0u16;
    for g in members(gates, subset) {
        let ones = g.forced_ones();
        let zeros = g.forced_zeros();
        if forced1 & zeros != 0 || forced0 & ones != 0 {
            return false;
        }
        forced1 |= ones;
        forced0 |= zeros;
    }
    true
}

/// Number of bits constrained by the union of masks.
pub fn rank(gates: &[Gate], subset: u32) -> u32 {
    members(gates, subset).fold(0u16, |m, g| m | g.mask).count_ones()
}

/// Size of the intersection of the members' phase sets.
pub fn phase_intersection(gates: &[Gate], subset: u32) -> u32 {
    members(gates, subset).fold(PhaseSet::full(), |p, g| p.intersect(g.phases)).len()
}

/// |∩ B_j| over the subset; zero when the patterns conflict.
pub fn intersection_count(gates: &[Gate], subset: u32) -> u32 {
    if !patterns_compatible(gates, subset) {
        return 0;
    }
    let free = TICK_MASK.count_ones().saturating_sub(rank(gates, subset));
    (1u32 << free) * phase_intersection(gates, subset) / PHASE_COUNT
}

// ── GateScheduleVerifier ──────────────────────────────────────────────────────

/// Counts blocked ticks and derives the suppression fraction.
#[derive(Debug, Clone, Default)]
pub struct GateScheduleVerifier {
    schedule: GateSchedule,
}

/// Outcome of [`GateScheduleVerifier::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateReport {
    pub gate_count: usize,
    pub cycle_len: u32,
    pub blocked_bruteforce: u32,
    pub blocked_analytic: u32,
    pub suppression: Fraction,
    pub suppression_analytic: Fraction,
    pub methods_agree: bool,
    /// `Some` only for the canonical schedule.
    pub matches_canonical: Option<bool>,
    pub passed: bool,
}

impl GateScheduleVerifier {
    pub fn new(schedule: GateSchedule) -> Self {
        Self { schedule }
    }

    pub fn canonical() -> Self {
        Self::new(GateSchedule::canonical())
    }

    pub fn schedule(&self) -> &GateSchedule {
        &self.schedule
    }

    /// Every blocked tick, ascending.
    pub fn blocked_ticks(&self) -> Vec<u16> {
        let gates = self.schedule.gates();
        (0..CYCLE_LEN as u16).filter(|&t| gates.iter().any(|g| g.blocks(t))).collect()
    }

    /// |B| by exhaustive enumeration.
    pub fn compute_blocked_bruteforce(&self) -> u32 {
        let gates = self.schedule.gates();
        let mut blocked = 0u32;
        for t in 0..CYCLE_LEN as u16 {
            for g in gates {
                if g.blocks(t) {
                    blocked += 1;
                    break;
                }
            }
        }
        blocked
    }

    /// |B| by inclusion–exclusion over all non-empty subsets.
    pub fn compute_blocked_analytic(&self) -> u32 {
        let gates = self.schedule.gates();
        let n = gates.len();
        let mut total: i64 = 0;
        for subset in 1u32..(1u32 << n) {
            let count = intersection_count(gates, subset) as i64;
            if subset.count_ones() % 2 == 1 {
                total += count;
            } else {
                total -= count;
            }
        }
        // A union size is never negative; a negative total means the gate
        // definitions broke the counting precondition.
        total.max(0) as u32
    }

    /// S = 1 − |B|/T from the brute-force count.
    pub fn suppression_fraction(&self) -> Fraction {
        Fraction::suppression(self.compute_blocked_bruteforce(), CYCLE_LEN)
    }

    pub fn verify(&self) -> GateReport {
        let blocked_bruteforce = self.compute_blocked_bruteforce();
        let blocked_analytic = self.compute_blocked_analytic();
        let suppression = Fraction::suppression(blocked_bruteforce, CYCLE_LEN);
        let suppression_analytic = Fraction::suppression(blocked_analytic, CYCLE_LEN);
        let methods_agree = blocked_bruteforce == blocked_analytic;
        let matches_canonical =
            self.schedule.is_canonical().then(|| suppression == CANONICAL_SUPPRESSION);
        let passed = methods_agree && matches_canonical.unwrap_or(true);

        debug!(
            gates = self.schedule.len(),
            blocked_bruteforce,
            blocked_analytic,
            suppression = %suppression,
            "gate schedule counted"
        );
        if !passed {
            warn!(blocked_bruteforce, blocked_analytic, ?matches_canonical, "gate schedule check failed");
        }

        GateReport {
            gate_count: self.schedule.len(),
            cycle_len: CYCLE_LEN,
            blocked_bruteforce,
            blocked_analytic,
            suppression,
            suppression_analytic,
            methods_agree,
            matches_canonical,
            passed,
        }
    }
}

// ─── verification tests ──────────────────────────────────────────────────────
