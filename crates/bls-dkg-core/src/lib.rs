//! # BLS DKG Core
//!
//! Distributed key generation and threshold BLS signing over a pairing curve.
//!
//! This crate provides the building blocks for:
//! - Distributed Key Generation (Feldman VSS with G1/G2 commitments)
//! - Threshold signing with Lagrange reconstruction at zero
//! - Text and JSON encoding of scalars, points and protocol records
//!
//! ## Protocol Overview
//!
//! Every participant deals a random degree-t polynomial, broadcasts
//! commitments to its coefficients in both source groups and sends each other
//! participant a private evaluation. Shares are checked against the
//! commitments and summed into a secret-key share. Any `t + 1` signature
//! shares reconstruct a signature valid under the group public key, which no
//! single participant can produce alone.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bls_dkg_core::{curve::Bls12381, keygen, sign, KeyShare};
//!
//! // Run distributed key generation
//! let key_share: KeyShare<Bls12381> = keygen::run_dkg(&config, &relay).await?;
//!
//! // Sign together with two other participants
//! let signature = sign::run_threshold_sign(&key_share, b"Hello Orbs", &[1, 3, 5], &session_id, &relay).await?;
//! ```

pub mod curve;
pub mod encoding;
pub mod error;
pub mod keygen;
pub mod mpc;
pub mod sign;
pub mod types;

pub use curve::{Bls12381, PairingCurve};
pub use error::{Error, ReconstructionError, Result};
pub use types::{validate_threshold, KeyShare, ParticipantIndex, SessionConfig, SessionId};

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default polynomial degree; `DEFAULT_THRESHOLD + 1` signers are required
pub const DEFAULT_THRESHOLD: usize = 2;

/// Default number of parties
pub const DEFAULT_PARTIES: usize = 5;

/// Default message for signing demonstrations
pub const DEFAULT_MESSAGE: &str = "Hello Orbs";
