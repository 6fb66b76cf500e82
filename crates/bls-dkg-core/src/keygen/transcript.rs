//! Locally simulated DKG transcript covering every dealer
//!
//! A transcript records, per dealer, the coefficient list, both commitment
//! lists and the share issued to every participant. The dealer's own entry is
//! absent and is recomputed from its coefficients whenever key material is
//! derived.

#[cfg(feature = "multi-thread")]
use rayon::prelude::*;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{
    all_public_key_shares, evaluate_share, group_public_key, public_key_share_for, secret_share,
    verify_private_share, verify_public_commitment, DealerPolynomial,
};
use crate::curve::PairingCurve;
use crate::encoding::{EncodedG1, EncodedG2, EncodedScalar};
use crate::types::{position, validate_threshold};
use crate::{Error, KeyShare, ParticipantIndex, Result};

/// Everything one dealer produced during a DKG epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct DealerRecord<C: PairingCurve> {
    /// Dealer index
    pub index: ParticipantIndex,
    /// Polynomial coefficients, secret first
    pub coefficients: Vec<EncodedScalar<C>>,
    pub commitments_g1: Vec<EncodedG1<C>>,
    pub commitments_g2: Vec<EncodedG2<C>>,
    /// Share issued to participant `i` at position `i - 1`; `None` for the dealer itself
    pub shares: Vec<Option<EncodedScalar<C>>>,
}

impl<C: PairingCurve> DealerRecord<C> {
    /// Generate a dealer's polynomial and every outbound share.
    pub fn deal<R: RngCore + CryptoRng>(
        index: ParticipantIndex,
        threshold: usize,
        n_parties: usize,
        rng: &mut R,
    ) -> Result<Self> {
        validate_threshold(n_parties, threshold)?;
        if position(index, n_parties).is_none() {
            return Err(Error::InvalidParticipant(index));
        }

        let polynomial = DealerPolynomial::<C>::generate(threshold, rng)?;
        let shares = (1..=n_parties as ParticipantIndex)
            .map(|recipient| {
                if recipient == index {
                    Ok(None)
                } else {
                    polynomial.share_for(recipient).map(|s| Some(EncodedScalar(s)))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            index,
            coefficients: polynomial.coefficients().iter().copied().map(EncodedScalar).collect(),
            commitments_g1: polynomial.commitments_g1().iter().copied().map(EncodedG1).collect(),
            commitments_g2: polynomial.commitments_g2().iter().copied().map(EncodedG2).collect(),
            shares,
        })
    }

    /// Share for `recipient`; the self entry is evaluated from the coefficients.
    pub fn share_for(&self, recipient: ParticipantIndex) -> Result<C::Scalar> {
        if recipient == self.index {
            let coefficients: Vec<C::Scalar> = self.coefficients.iter().map(|c| c.0).collect();
            return evaluate_share::<C>(&coefficients, recipient);
        }
        position(recipient, self.shares.len())
            .and_then(|i| self.shares[i].as_ref())
            .map(|s| s.0)
            .ok_or(Error::InvalidParticipant(recipient))
    }

    pub fn g1(&self) -> Vec<C::G1> {
        self.commitments_g1.iter().map(|p| p.0).collect()
    }

    pub fn g2(&self) -> Vec<C::G2> {
        self.commitments_g2.iter().map(|p| p.0).collect()
    }

    /// Check the commitment pairs and every issued share.
    pub fn verify(&self) -> Result<()> {
        let g1 = self.g1();
        let g2 = self.g2();

        if let Some(i) = g1
            .iter()
            .zip(&g2)
            .position(|(p, q)| !verify_public_commitment::<C>(p, q))
        {
            warn!(dealer = self.index, coefficient = i, "Public commitment failed pairing check");
            return Err(Error::VerificationFailed(format!(
                "dealer {} published inconsistent commitment {}",
                self.index, i
            )));
        }

        for recipient in 1..=self.shares.len() as ParticipantIndex {
            let share = self.share_for(recipient)?;
            if !verify_private_share::<C>(recipient, &share, &g1) {
                warn!(dealer = self.index, recipient, "Private share does not match public commitment");
                return Err(Error::VerificationFailed(format!(
                    "share from dealer {} to {} does not match its public commitment",
                    self.index, recipient
                )));
            }
        }
        Ok(())
    }
}

/// Full record of a DKG epoch, one entry per dealer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct DkgTranscript<C: PairingCurve> {
    pub threshold: usize,
    pub n_parties: usize,
    /// Dealer `i` at position `i - 1`
    pub dealers: Vec<DealerRecord<C>>,
}

impl<C: PairingCurve> DkgTranscript<C> {
    /// Run every dealer locally.
    #[instrument(skip(rng))]
    pub fn simulate<R: RngCore + CryptoRng>(
        n_parties: usize,
        threshold: usize,
        rng: &mut R,
    ) -> Result<Self> {
        validate_threshold(n_parties, threshold)?;
        let dealers = (1..=n_parties as ParticipantIndex)
            .map(|index| DealerRecord::deal(index, threshold, n_parties, rng))
            .collect::<Result<Vec<_>>>()?;

        debug!(dealers = dealers.len(), "Simulated all dealers");
        Ok(Self {
            threshold,
            n_parties,
            dealers,
        })
    }

    /// Structural checks: dealer order, list lengths and self entries.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.n_parties, self.threshold)?;
        if self.dealers.len() != self.n_parties {
            return Err(Error::VerificationFailed(format!(
                "transcript carries {} dealers for {} participants",
                self.dealers.len(),
                self.n_parties
            )));
        }

        let count = self.threshold + 1;
        for (i, dealer) in self.dealers.iter().enumerate() {
            let expected = i as ParticipantIndex + 1;
            if dealer.index != expected {
                return Err(Error::InvalidParticipant(dealer.index));
            }
            if dealer.coefficients.len() != count
                || dealer.commitments_g1.len() != count
                || dealer.commitments_g2.len() != count
            {
                return Err(Error::VerificationFailed(format!(
                    "dealer {} does not carry {} coefficients and commitments",
                    dealer.index, count
                )));
            }
            if dealer.shares.len() != self.n_parties {
                return Err(Error::VerificationFailed(format!(
                    "dealer {} issued {} shares for {} participants",
                    dealer.index,
                    dealer.shares.len(),
                    self.n_parties
                )));
            }
            let missing: Vec<ParticipantIndex> = dealer
                .shares
                .iter()
                .zip(1..)
                .filter(|(s, recipient)| s.is_none() && *recipient != dealer.index)
                .map(|(_, recipient)| recipient)
                .collect();
            if !missing.is_empty() {
                return Err(Error::MissingContributions(missing));
            }
        }
        Ok(())
    }

    /// Validate, then check every dealer's commitments and shares.
    #[instrument(skip(self), fields(n_parties = self.n_parties))]
    pub fn verify(&self) -> Result<()> {
        self.validate()?;

        #[cfg(feature = "multi-thread")]
        let result = self.dealers.par_iter().try_for_each(|d| d.verify());
        #[cfg(not(feature = "multi-thread"))]
        let result = self.dealers.iter().try_for_each(|d| d.verify());

        result
    }

    /// Derive every participant's key share after verifying the transcript.
    ///
    /// Each public-key share is computed from the commitments and checked
    /// against `G2 * secret_share` before it is handed out.
    #[instrument(skip(self), fields(n_parties = self.n_parties))]
    pub fn key_shares(&self) -> Result<Vec<KeyShare<C>>> {
        self.verify()?;

        let commitments_g2: Vec<Vec<C::G2>> = self.dealers.iter().map(|d| d.g2()).collect();
        let zeroth: Vec<C::G2> = commitments_g2.iter().map(|c| c[0]).collect();
        let public_key_shares: Vec<EncodedG2<C>> =
            all_public_key_shares::<C>(self.n_parties, &commitments_g2)
                .into_iter()
                .map(EncodedG2)
                .collect();
        let group_key = EncodedG2(group_public_key::<C>(&zeroth));

        let key_shares = (1..=self.n_parties as ParticipantIndex)
            .map(|index| {
                let received = self
                    .dealers
                    .iter()
                    .map(|d| d.share_for(index))
                    .collect::<Result<Vec<_>>>()?;
                let secret = secret_share::<C>(&received);

                if public_key_share_for::<C>(index, &commitments_g2) != C::generator_g2() * secret {
                    return Err(Error::VerificationFailed(format!(
                        "public-key share of participant {} disagrees with its secret share",
                        index
                    )));
                }

                Ok(KeyShare {
                    index,
                    n_parties: self.n_parties,
                    threshold: self.threshold,
                    secret_share: EncodedScalar(secret),
                    public_key_shares: public_key_shares.clone(),
                    group_public_key: group_key,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(participants = key_shares.len(), "Derived key shares from transcript");
        Ok(key_shares)
    }

    /// Sum of every dealer's secret coefficient. Only meaningful in a
    /// simulation where one process has seen every dealer.
    pub fn group_secret(&self) -> C::Scalar {
        self.dealers
            .iter()
            .filter_map(|d| d.coefficients.first())
            .map(|c| c.0)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Bls12381;
    use ff::Field;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    type Transcript = DkgTranscript<Bls12381>;

    fn transcript(seed: u64) -> Transcript {
        Transcript::simulate(5, 2, &mut ChaCha20Rng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn test_self_entry_absent() {
        let t = transcript(1);
        for dealer in &t.dealers {
            let pos = (dealer.index - 1) as usize;
            assert!(dealer.shares[pos].is_none());
            assert_eq!(
                dealer.shares.iter().filter(|s| s.is_some()).count(),
                t.n_parties - 1
            );
        }
    }

    #[test]
    fn test_key_shares_match_group_secret() {
        let t = transcript(2);
        let shares = t.key_shares().unwrap();
        assert_eq!(shares.len(), 5);

        let group_key = Bls12381::generator_g2() * t.group_secret();
        for ks in &shares {
            assert_eq!(ks.group_public_key(), group_key);
            assert_eq!(ks.public_key_share().unwrap(), Bls12381::generator_g2() * ks.secret());
        }
    }

    #[test]
    fn test_tampered_share_detected() {
        let mut t = transcript(3);
        let share = t.dealers[1].shares[3].as_mut().unwrap();
        share.0 += bls12_381::Scalar::ONE;

        let err = t.verify().unwrap_err();
        assert!(matches!(err, Error::VerificationFailed(ref m) if m.contains("dealer 2 to 4")));
    }

    #[test]
    fn test_missing_share_detected() {
        let mut t = transcript(4);
        t.dealers[0].shares[2] = None;
        assert!(matches!(
            t.validate(),
            Err(Error::MissingContributions(ref m)) if m == &vec![3]
        ));
    }

    #[test]
    fn test_missing_dealer_detected() {
        let mut t = transcript(5);
        t.dealers.remove(3);
        assert!(matches!(
            t.validate(),
            Err(Error::VerificationFailed(ref m)) if m.contains("4 dealers for 5")
        ));
    }

    #[test]
    fn test_oversized_party_count_rejected() {
        let t: Transcript =
            serde_json::from_str(r#"{"threshold":1,"n_parties":30000000,"dealers":[]}"#).unwrap();
        assert!(matches!(
            t.validate(),
            Err(Error::VerificationFailed(ref m)) if m == "transcript carries 0 dealers for 30000000 participants"
        ));
        assert!(t.key_shares().is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_shares() {
        let t = transcript(6);
        let json = serde_json::to_string(&t).unwrap();
        let back: Transcript = serde_json::from_str(&json).unwrap();

        let a = t.key_shares().unwrap();
        let b = back.key_shares().unwrap();
        assert_eq!(a[0].secret(), b[0].secret());
        assert_eq!(a[0].group_public_key(), b[0].group_public_key());
    }

    #[test]
    fn test_deal_rejects_bad_index() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        assert!(matches!(
            DealerRecord::<Bls12381>::deal(0, 2, 5, &mut rng),
            Err(Error::InvalidParticipant(0))
        ));
        assert!(matches!(
            DealerRecord::<Bls12381>::deal(6, 2, 5, &mut rng),
            Err(Error::InvalidParticipant(6))
        ));
    }
}
