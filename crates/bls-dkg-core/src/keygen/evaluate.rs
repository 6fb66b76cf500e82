//! Polynomial evaluation at participant indices, secret and public side

use ff::{Field, PrimeField};
use group::Group;

use crate::curve::PairingCurve;
use crate::{Error, ParticipantIndex, Result};

/// Evaluate a dealer's polynomial at a recipient's 1-based index.
///
/// f(x) = a_0 + a_1*x + ... + a_t*x^t, computed with Horner's method.
/// Index 0 would reveal the dealer's secret and is rejected.
pub fn evaluate_share<C: PairingCurve>(
    coefficients: &[C::Scalar],
    recipient: ParticipantIndex,
) -> Result<C::Scalar> {
    if recipient == 0 {
        return Err(Error::InvalidParticipant(recipient));
    }

    let x = C::Scalar::from(recipient);
    Ok(coefficients
        .iter()
        .rev()
        .fold(C::Scalar::ZERO, |acc, coefficient| acc * x + coefficient))
}

/// Evaluate committed coefficients "in the exponent": Σ C_i * index^i.
///
/// For G1 commitments this is the point a share at `index` must match; for
/// G2 commitments it is that participant's contribution to its public-key share.
pub fn evaluate_public_at<G: Group>(index: ParticipantIndex, commitments: &[G]) -> G
where
    G::Scalar: PrimeField,
{
    let x = G::Scalar::from(index);
    let mut x_power = G::Scalar::ONE;
    let mut result = G::identity();

    for commitment in commitments {
        result += *commitment * x_power;
        x_power *= x;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Bls12381;
    use bls12_381::{G1Projective, G2Projective, Scalar};

    #[test]
    fn test_polynomial_evaluation() {
        // f(x) = 5 + 3x + 2x^2
        let coeffs = vec![Scalar::from(5u64), Scalar::from(3u64), Scalar::from(2u64)];

        // f(1) = 5 + 3 + 2 = 10
        assert_eq!(evaluate_share::<Bls12381>(&coeffs, 1).unwrap(), Scalar::from(10u64));

        // f(2) = 5 + 6 + 8 = 19
        assert_eq!(evaluate_share::<Bls12381>(&coeffs, 2).unwrap(), Scalar::from(19u64));
    }

    #[test]
    fn test_index_zero_rejected() {
        let coeffs = vec![Scalar::from(5u64), Scalar::from(3u64)];
        assert!(matches!(
            evaluate_share::<Bls12381>(&coeffs, 0),
            Err(Error::InvalidParticipant(0))
        ));
    }

    #[test]
    fn test_public_evaluation_matches_secret() {
        let coeffs = vec![Scalar::from(11u64), Scalar::from(13u64), Scalar::from(17u64)];
        let g1: Vec<G1Projective> = coeffs.iter().map(|c| G1Projective::generator() * c).collect();
        let g2: Vec<G2Projective> = coeffs.iter().map(|c| G2Projective::generator() * c).collect();

        for index in 1..=5 {
            let share = evaluate_share::<Bls12381>(&coeffs, index).unwrap();
            assert_eq!(evaluate_public_at(index, &g1), G1Projective::generator() * share);
            assert_eq!(evaluate_public_at(index, &g2), G2Projective::generator() * share);
        }
    }

    #[test]
    fn test_public_evaluation_at_zero_is_secret_commitment() {
        let g = G2Projective::generator();
        let commitments = vec![g * Scalar::from(3u64), g * Scalar::from(4u64)];
        assert_eq!(evaluate_public_at(0, &commitments), commitments[0]);
        assert_eq!(evaluate_public_at::<G2Projective>(3, &[]), G2Projective::identity());
    }
}
