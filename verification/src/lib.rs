//! Verification suite for the nine-gate tick schedule and the discrete
//! conservation law of div(w ∇Φ).
//!
//! These modules check exact combinatorial and numerical identities that
//! downstream model code relies on. Each check is a pure function of its
//! inputs. A value that misses its reference comes back as `passed = false`
//! in the result record. Invalid inputs come back as [`error::ConfigError`].
//!
//! # Modules
//!
//! - [`schedule`]      : canonical gates, T = 1024, N = 9, S = 489/512
//! - [`gates`]         : blocked-tick count by brute force and by inclusion–exclusion
//! - [`lattice`]       : regular 2D/3D grids with flat field storage
//! - [`conservation`]  : Laplacian and flux-divergence balance checks
//! - [`config`]        : serializable check configuration
//! - [`report`]        : composite verdict for the `verify` binary
//! - [`error`]         : configuration error taxonomy
//!
//! # Running tests
//!
//! ```bash
//! cd verification && cargo test -- --nocapture
//! ```

pub mod config;
pub mod conservation;
pub mod error;
pub mod gates;
pub mod lattice;
pub mod report;
pub mod schedule;

pub use config::{LatticeCheckConfig, VerifyConfig, WeightMode};
pub use conservation::{ConservationLatticeChecker, DivergenceCheck, LatticeReport, SubCheck};
pub use error::{ConfigError, VerifyError, VerifyResult};
pub use gates::{GateReport, GateSchedule, GateScheduleVerifier};
pub use schedule::{Fraction, Gate, PhaseSet};
