//! Aggregation of every dealer's contribution into long-lived key material

#[cfg(feature = "multi-thread")]
use rayon::prelude::*;

use super::evaluate::evaluate_public_at;
use crate::curve::PairingCurve;
use crate::ParticipantIndex;

/// Secret-key share: the sum of the shares received from every dealer,
/// the participant's own self-share included.
pub fn secret_share<C: PairingCurve>(received_shares: &[C::Scalar]) -> C::Scalar {
    received_shares.iter().copied().sum()
}

/// Public-key share of `index`: every dealer's G2 commitments evaluated at
/// `index`, summed across dealers. Equals `G2 * secret_share` of that
/// participant without anyone learning the secret.
pub fn public_key_share_for<C: PairingCurve>(
    index: ParticipantIndex,
    all_dealers_commitments_g2: &[Vec<C::G2>],
) -> C::G2 {
    all_dealers_commitments_g2
        .iter()
        .map(|commitments| evaluate_public_at(index, commitments))
        .sum()
}

/// Public-key shares of participants `1..=n_parties`, in index order.
pub fn all_public_key_shares<C: PairingCurve>(
    n_parties: usize,
    all_dealers_commitments_g2: &[Vec<C::G2>],
) -> Vec<C::G2> {
    let positions = 0..n_parties;
    #[cfg(feature = "multi-thread")]
    let positions = positions.into_par_iter();

    positions
        .map(|i| public_key_share_for::<C>(i as ParticipantIndex + 1, all_dealers_commitments_g2))
        .collect()
}

/// Group public key: the sum of every dealer's zero'th G2 commitment.
pub fn group_public_key<C: PairingCurve>(zeroth_commitments_g2: &[C::G2]) -> C::G2 {
    zeroth_commitments_g2.iter().copied().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Bls12381;
    use crate::keygen::DealerPolynomial;
    use bls12_381::{G2Projective, Scalar};
    use rand::rngs::OsRng;

    fn dealers(n: usize, t: usize) -> Vec<DealerPolynomial<Bls12381>> {
        (0..n)
            .map(|_| DealerPolynomial::generate(t, &mut OsRng).unwrap())
            .collect()
    }

    #[test]
    fn test_public_key_share_matches_secret_share() {
        let (n, t) = (4, 2);
        let dealers = dealers(n, t);
        let commitments: Vec<Vec<G2Projective>> =
            dealers.iter().map(|d| d.commitments_g2().to_vec()).collect();

        let pk_shares = all_public_key_shares::<Bls12381>(n, &commitments);
        assert_eq!(pk_shares.len(), n);

        for index in 1..=n as ParticipantIndex {
            let received: Vec<Scalar> = dealers.iter().map(|d| d.share_for(index).unwrap()).collect();
            let sk = secret_share::<Bls12381>(&received);

            let expected = Bls12381::generator_g2() * sk;
            assert_eq!(public_key_share_for::<Bls12381>(index, &commitments), expected);
            assert_eq!(pk_shares[index as usize - 1], expected);
        }
    }

    #[test]
    fn test_group_public_key_matches_group_secret() {
        let dealers = dealers(3, 1);
        let zeroth: Vec<G2Projective> = dealers.iter().map(|d| d.commitments_g2()[0]).collect();
        let group_secret: Scalar = dealers.iter().map(|d| *d.secret()).sum();

        assert_eq!(
            group_public_key::<Bls12381>(&zeroth),
            Bls12381::generator_g2() * group_secret
        );
    }

    #[test]
    fn test_empty_inputs() {
        use ff::Field;
        use group::Group;

        assert_eq!(secret_share::<Bls12381>(&[]), Scalar::ZERO);
        assert_eq!(group_public_key::<Bls12381>(&[]), G2Projective::identity());
    }
}
