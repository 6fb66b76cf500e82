//! Commitment and share consistency checks
//!
//! Both checks return `bool`: a `false` is evidence against the dealer and the
//! caller decides how to accuse it.

use super::evaluate::evaluate_public_at;
use crate::curve::PairingCurve;
use crate::ParticipantIndex;

/// Check that a G1/G2 commitment pair hides the same scalar.
///
/// e(-G1, commit_g2) * e(commit_g1, G2) == 1 holds exactly when
/// `commit_g1 = G1 * s` and `commit_g2 = G2 * s` for the same `s`.
pub fn verify_public_commitment<C: PairingCurve>(commit_g1: &C::G1, commit_g2: &C::G2) -> bool {
    let product = C::pairing_product(&[
        (-C::generator_g1(), *commit_g2),
        (*commit_g1, C::generator_g2()),
    ]);
    product == C::identity_gt()
}

/// Check a received private share against the dealer's G1 commitments.
///
/// `my_index` is the recipient's own index, not the dealer's.
pub fn verify_private_share<C: PairingCurve>(
    my_index: ParticipantIndex,
    share: &C::Scalar,
    dealer_commitments_g1: &[C::G1],
) -> bool {
    if my_index == 0 || dealer_commitments_g1.is_empty() {
        return false;
    }

    let expected = evaluate_public_at(my_index, dealer_commitments_g1);
    C::generator_g1() * share == expected
}
