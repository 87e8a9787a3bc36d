//! Composite verdict over the gate schedule and the conservation lattices.
//!
//! The report is the only thing the outer world sees: it serializes to JSON
//! and its `passed` flag is the AND of every sub-check.

use serde::Serialize;
use tracing::info;

use crate::config::VerifyConfig;
use crate::conservation::{ConservationLatticeChecker, LatticeReport};
use crate::error::VerifyResult;
use crate::gates::{GateReport, GateScheduleVerifier};
use crate::schedule;

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    /// UTC, `%Y-%m-%d %H:%M:%S UTC`.
    pub generated_at: String,
    pub gates: GateReport,
    pub gating_beta: f64,
    pub capacity_factor: f64,
    pub lattice_2d: LatticeReport,
    pub lattice_3d: Option<LatticeReport>,
    pub passed: bool,
}

impl VerificationReport {
    /// Run every configured check.
    pub fn collect(config: &VerifyConfig) -> VerifyResult<Self> {
        config.validate()?;
        let lattice_2d = ConservationLatticeChecker::new(config.lattice_2d.clone())?;
        let lattice_3d = config
            .lattice_3d
            .clone()
            .map(ConservationLatticeChecker::new)
            .transpose()?;

        let gates = GateScheduleVerifier::canonical().verify();
        let lattice_2d = lattice_2d.run();
        let lattice_3d = lattice_3d.map(|c| c.run());
        Ok(Self::assemble(gates, lattice_2d, lattice_3d))
    }

    fn assemble(gates: GateReport, lattice_2d: LatticeReport, lattice_3d: Option<LatticeReport>) -> Self {
        let passed =
            gates.passed && lattice_2d.passed && lattice_3d.as_ref().map_or(true, |r| r.passed);
        info!(
            gates = gates.passed,
            lattice_2d = lattice_2d.passed,
            lattice_3d = ?lattice_3d.as_ref().map(|r| r.passed),
            passed,
            "verification complete"
        );
        Self {
            generated_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            gates,
            gating_beta: schedule::gating_beta(),
            capacity_factor: schedule::capacity_factor(),
            lattice_2d,
            lattice_3d,
            passed,
        }
    }

    pub fn to_json(&self) -> VerifyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable summary, one line per check.
    pub fn summary(&self) -> Vec<String> {
        let g = &self.gates;
        let mut lines = vec![format!(
            "[{}] gates: |B| brute = {}, analytic = {}, S = {} ({:.9})",
            verdict(g.passed),
            g.blocked_bruteforce,
            g.blocked_analytic,
            g.suppression,
            g.suppression.to_f64()
        )];
        for r in std::iter::once(&self.lattice_2d).chain(self.lattice_3d.as_ref()) {
            let grid = r.grid.iter().map(|n| n.to_string()).collect::<Vec<_>>().join("x");
            lines.push(format!(
                "[{}] {}D {grid} laplacian: max |err| = {:.3e} over {} nodes",
                verdict(r.laplacian.passed),
                r.dimension,
                r.laplacian.residual,
                r.laplacian.interior_count
            ));
            lines.push(format!(
                "[{}] {}D {grid} divergence: |sum_div - flux_out| = {:.3e} ({:.9} vs {:.9})",
                verdict(r.divergence.check.passed),
                r.dimension,
                r.divergence.check.residual,
                r.divergence.sum_div,
                r.divergence.flux_out
            ));
            if let Some(f) = &r.flux_matches_laplacian {
                lines.push(format!(
                    "[{}] {}D {grid} flux form vs laplacian: max |err| = {:.3e}",
                    verdict(f.passed),
                    r.dimension,
                    f.residual
                ));
            }
        }
        lines
    }
}

fn verdict(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LatticeCheckConfig;
    use crate::gates::GateSchedule;
    use crate::schedule::{Gate, PhaseSet};

    fn small_config() -> VerifyConfig {
        VerifyConfig {
            lattice_2d: LatticeCheckConfig::with_grid(vec![9, 9]),
            lattice_3d: Some(LatticeCheckConfig::with_grid(vec![5, 5, 5])),
        }
    }

    #[test]
    fn default_run_passes() {
        let r = VerificationReport::collect(&small_config()).unwrap();
        assert!(r.passed, "{:#?}", r.summary());
        assert_eq!(r.gates.blocked_bruteforce, 46);
        assert_eq!(r.summary().len(), 5);
        assert!((r.gating_beta * r.capacity_factor - 1.0).abs() < 1e-15);
        let json: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        assert!(json["capacity_factor"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn one_failing_part_fails_the_whole() {
        let ok = VerificationReport::collect(&small_config()).unwrap();
        let malformed = Gate::new(0b1111111000, 0b0000000100, PhaseSet::full());
        let bad_gates = GateScheduleVerifier::new(GateSchedule::new(vec![malformed]).unwrap()).verify();
        let r = VerificationReport::assemble(bad_gates, ok.lattice_2d.clone(), ok.lattice_3d.clone());
        assert!(!r.passed);
        assert!(r.summary()[0].starts_with("[FAIL]"));
    }

    #[test]
    fn invalid_lattice_aborts_collection() {
        let cfg = VerifyConfig { lattice_3d: Some(LatticeCheckConfig::with_grid(vec![4, 2, 4])), ..small_config() };
        assert!(VerificationReport::collect(&cfg).is_err());
    }
}
