//! End-to-end scenarios through the public API.
//!
//! The gate tests are exact integer checks. The lattice tests use the
//! published tolerances.

use approx::assert_abs_diff_eq;
use std::io::Write;
use tempfile::NamedTempFile;

use ilg_verification::config::{LatticeCheckConfig, VerifyConfig, WeightMode};
use ilg_verification::conservation::ConservationLatticeChecker;
use ilg_verification::error::ConfigError;
use ilg_verification::gates::{GateSchedule, GateScheduleVerifier};
use ilg_verification::report::VerificationReport;
use ilg_verification::schedule::{CANONICAL_SUPPRESSION, CYCLE_LEN, GATE_COUNT};

// ---------------------------------------------------------------------------
// Gate schedule
// ---------------------------------------------------------------------------

#[test]
fn canonical_schedule_blocks_46_ticks() {
    let report = GateScheduleVerifier::canonical().verify();
    assert_eq!(report.gate_count, GATE_COUNT);
    assert_eq!(report.cycle_len, CYCLE_LEN);
    assert_eq!(report.blocked_bruteforce, 46);
    assert_eq!(report.blocked_analytic, 46);
    assert_eq!(report.suppression, CANONICAL_SUPPRESSION);
    assert_eq!(report.suppression.to_string(), "489/512");
    assert!(report.passed);
}

#[test]
fn widening_one_gate_increases_blocked_count() {
    let canonical = GateScheduleVerifier::canonical();
    let widened = GateScheduleVerifier::new(
        GateSchedule::canonical()
            .with_widened_phases(4)
            .expect("gate 4 exists"),
    );
    let before = canonical.compute_blocked_bruteforce();
    let after = widened.compute_blocked_bruteforce();
    assert!(after > before, "{after} must exceed {before}");
    assert_eq!(after, widened.compute_blocked_analytic());
}

// ---------------------------------------------------------------------------
// Conservation lattice
// ---------------------------------------------------------------------------

#[test]
fn default_lattices_pass() {
    for cfg in [LatticeCheckConfig::default_2d(), LatticeCheckConfig::default_3d()] {
        let dims = cfg.dimension();
        let report = ConservationLatticeChecker::new(cfg).unwrap().run();
        assert!(report.passed, "{dims}D report failed: {report:?}");
        assert_abs_diff_eq!(report.laplacian.expected.unwrap(), 2.0 * dims as f64);
        assert_abs_diff_eq!(report.divergence.sum_div, report.divergence.flux_out, epsilon = 1e-8);
    }
}

#[test]
fn degenerate_grid_is_rejected_not_vacuously_passed() {
    let cfg = LatticeCheckConfig::with_grid(vec![2, 2]).weight(WeightMode::Constant);
    match ConservationLatticeChecker::new(cfg) {
        Err(ConfigError::NoInteriorNodes { size: 2, .. }) => {}
        other => panic!("expected NoInteriorNodes, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Config files and the composite report
// ---------------------------------------------------------------------------

#[test]
fn config_file_drives_the_report() {
    let cfg = VerifyConfig {
        lattice_2d: LatticeCheckConfig::with_grid(vec![17, 17]).weight(WeightMode::Varying { curvature: 1e-2 }),
        lattice_3d: None,
    };
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", serde_json::to_string(&cfg).unwrap()).unwrap();

    let loaded = VerifyConfig::from_json_file(file.path()).unwrap();
    assert_eq!(loaded, cfg);

    let report = VerificationReport::collect(&loaded).unwrap();
    assert!(report.passed);
    assert!(report.lattice_3d.is_none());

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["gates"]["blocked_bruteforce"], 46);
    assert_eq!(json["lattice_2d"]["divergence"]["name"], "varying_w_divergence");
    assert_eq!(json["passed"], true);
}

#[test]
fn invalid_config_file_is_reported() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"lattice_2d": {{"grid": [33]}}}}"#).unwrap();
    let err = VerifyConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }), "{err}");

    let missing = file.path().with_extension("missing");
    let err = VerifyConfig::from_json_file(&missing).unwrap_err();
    assert!(matches!(err, ConfigError::FileRead { .. }), "{err}");
}

#[test]
fn config_file_with_short_axis_is_rejected() {
    let mut cfg = VerifyConfig::default();
    cfg.lattice_3d = Some(LatticeCheckConfig::with_grid(vec![17, 17, 2]));
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", serde_json::to_string(&cfg).unwrap()).unwrap();
    let err = VerifyConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::NoInteriorNodes { axis: 2, size: 2 }));
}

#[test]
fn config_file_with_huge_grid_fails_fast() {
    let mut cfg = VerifyConfig::default();
    cfg.lattice_3d = Some(LatticeCheckConfig::with_grid(vec![usize::MAX / 2, 3, 3]));
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", serde_json::to_string(&cfg).unwrap()).unwrap();
    let err = VerifyConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { field: "grid", .. }), "{err}");

    let direct = ConservationLatticeChecker::new(LatticeCheckConfig::with_grid(vec![usize::MAX / 2, 3, 3]));
    assert!(matches!(direct, Err(ConfigError::InvalidValue { field: "grid", .. })));
}
