//! Dealer polynomial generation with G1/G2 coefficient commitments

use std::fmt;

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use super::evaluate::evaluate_share;
use super::verify::verify_public_commitment;
use crate::curve::PairingCurve;
use crate::{Error, ParticipantIndex, Result};

/// Draw one uniformly random coefficient and commit to it in both groups.
///
/// Returns `(secret, G1 * secret, G2 * secret)`. Fails with
/// [`Error::Randomness`] if the random source cannot produce bytes.
pub fn coefficient_gen<C, R>(rng: &mut R) -> Result<(C::Scalar, C::G1, C::G2)>
where
    C: PairingCurve,
    R: RngCore + CryptoRng,
{
    let mut wide = [0u8; 64];
    rng.try_fill_bytes(&mut wide)
        .map_err(|e| Error::Randomness(e.to_string()))?;
    let secret = C::scalar_from_wide(&wide);
    wide.zeroize();

    Ok((secret, C::generator_g1() * secret, C::generator_g2() * secret))
}

/// A dealer's degree-t polynomial and its public commitments.
///
/// Local to the dealer for the duration of one DKG epoch; only the
/// commitments and the per-recipient evaluations ever leave it.
#[derive(Clone)]
pub struct DealerPolynomial<C: PairingCurve> {
    coefficients: Vec<C::Scalar>,
    commitments_g1: Vec<C::G1>,
    commitments_g2: Vec<C::G2>,
}

impl<C: PairingCurve> DealerPolynomial<C> {
    /// Generate `threshold + 1` coefficients, self-checking every commitment pair.
    pub fn generate<R: RngCore + CryptoRng>(threshold: usize, rng: &mut R) -> Result<Self> {
        let count = threshold + 1;
        let mut coefficients = Vec::with_capacity(count);
        let mut commitments_g1 = Vec::with_capacity(count);
        let mut commitments_g2 = Vec::with_capacity(count);

        for i in 0..count {
            let (coefficient, commit_g1, commit_g2) = coefficient_gen::<C, R>(rng)?;
            if !verify_public_commitment::<C>(&commit_g1, &commit_g2) {
                return Err(Error::VerificationFailed(format!(
                    "public commitment {} failed its self-check",
                    i
                )));
            }
            coefficients.push(coefficient);
            commitments_g1.push(commit_g1);
            commitments_g2.push(commit_g2);
        }

        Ok(Self {
            coefficients,
            commitments_g1,
            commitments_g2,
        })
    }

    /// Polynomial degree t
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// The dealer's secret contribution, f(0)
    pub fn secret(&self) -> &C::Scalar {
        &self.coefficients[0]
    }

    pub fn coefficients(&self) -> &[C::Scalar] {
        &self.coefficients
    }

    pub fn commitments_g1(&self) -> &[C::G1] {
        &self.commitments_g1
    }

    pub fn commitments_g2(&self) -> &[C::G2] {
        &self.commitments_g2
    }

    /// Private share for `recipient`, f(recipient).
    pub fn share_for(&self, recipient: ParticipantIndex) -> Result<C::Scalar> {
        evaluate_share::<C>(&self.coefficients, recipient)
    }
}

impl<C: PairingCurve> fmt::Debug for DealerPolynomial<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DealerPolynomial")
            .field("degree", &self.degree())
            .field("commitments_g1", &self.commitments_g1)
            .field("commitments_g2", &self.commitments_g2)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Bls12381;
    use rand::rngs::OsRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::num::NonZeroU32;

    struct ExhaustedRng;

    impl RngCore for ExhaustedRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
            let code = NonZeroU32::new(rand_core::Error::CUSTOM_START).unwrap();
            Err(rand_core::Error::from(code))
        }
    }

    impl CryptoRng for ExhaustedRng {}

    #[test]
    fn test_coefficient_gen_commitments() {
        let (secret, g1, g2) = coefficient_gen::<Bls12381, _>(&mut OsRng).unwrap();
        assert_eq!(g1, Bls12381::generator_g1() * secret);
        assert_eq!(g2, Bls12381::generator_g2() * secret);
    }

    #[test]
    fn test_randomness_failure() {
        let result = coefficient_gen::<Bls12381, _>(&mut ExhaustedRng);
        assert!(matches!(result, Err(Error::Randomness(_))));

        let result = DealerPolynomial::<Bls12381>::generate(2, &mut ExhaustedRng);
        assert!(matches!(result, Err(Error::Randomness(_))));
    }

    #[test]
    fn test_generate_polynomial() {
        let poly = DealerPolynomial::<Bls12381>::generate(2, &mut OsRng).unwrap();
        assert_eq!(poly.degree(), 2);
        assert_eq!(poly.coefficients().len(), 3);
        assert_eq!(poly.commitments_g1().len(), 3);
        assert_eq!(poly.commitments_g2().len(), 3);
        assert_eq!(poly.share_for(1).unwrap(), poly.coefficients().iter().sum::<bls12_381::Scalar>());
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = DealerPolynomial::<Bls12381>::generate(1, &mut ChaCha20Rng::seed_from_u64(7)).unwrap();
        let b = DealerPolynomial::<Bls12381>::generate(1, &mut ChaCha20Rng::seed_from_u64(7)).unwrap();
        assert_eq!(a.coefficients(), b.coefficients());
        assert_eq!(a.commitments_g2(), b.commitments_g2());
    }

    #[test]
    fn test_debug_hides_coefficients() {
        let poly = DealerPolynomial::<Bls12381>::generate(1, &mut OsRng).unwrap();
        let text = format!("{:?}", poly);
        assert!(text.contains("degree: 1"));
        assert!(!text.contains("coefficients"));
    }
}
