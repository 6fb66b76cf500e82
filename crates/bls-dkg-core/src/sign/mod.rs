//! Threshold BLS signing
//!
//! Each signer produces `H(m) * secret_share`; any `t + 1` such shares are
//! combined by Lagrange interpolation at zero into a signature that verifies
//! under the group public key.

mod dsg;
mod lagrange;
mod messages;
mod session;

pub use dsg::run_threshold_sign;
pub use lagrange::{
    interpolate_at_zero, lagrange_coefficients, reconstruct_public_key, reconstruct_secret,
    reconstruct_signature,
};
pub use messages::*;
pub use session::{SigningSession, SigningState};
