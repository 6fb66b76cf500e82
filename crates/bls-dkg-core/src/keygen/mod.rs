//! Distributed Key Generation (DKG) module
//!
//! Feldman VSS over a pairing curve: every participant deals a random
//! degree-t polynomial, broadcasts G1/G2 commitments to its coefficients and
//! sends each other participant one private evaluation. Recipients check the
//! shares against the commitments and sum them into a secret-key share; the
//! public-key shares and the group key follow from the commitments alone.

mod aggregate;
mod coefficient;
mod dkg;
mod evaluate;
mod messages;
mod transcript;
mod verify;

pub use aggregate::{all_public_key_shares, group_public_key, public_key_share_for, secret_share};
pub use coefficient::{coefficient_gen, DealerPolynomial};
pub use dkg::run_dkg;
pub use evaluate::{evaluate_public_at, evaluate_share};
pub use messages::*;
pub use transcript::{DealerRecord, DkgTranscript};
pub use verify::{verify_private_share, verify_public_commitment};

use std::collections::BTreeMap;

use rand_core::{CryptoRng, RngCore};
use tracing::{debug, instrument, warn};

use crate::curve::PairingCurve;
use crate::encoding::{EncodedG1, EncodedG2, EncodedScalar};
use crate::types::position;
use crate::{Error, KeyShare, ParticipantIndex, Result, SessionConfig};

/// Lifecycle of one participant within a DKG epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DkgPhase {
    /// Polynomial not generated yet
    Dealing,
    /// Own contribution dealt, collecting commitments
    AwaitingCommitments,
    /// All commitments in, collecting shares
    AwaitingShares,
    /// Key share derived
    Complete,
}

impl DkgPhase {
    fn name(self) -> &'static str {
        match self {
            DkgPhase::Dealing => "Dealing",
            DkgPhase::AwaitingCommitments => "AwaitingCommitments",
            DkgPhase::AwaitingShares => "AwaitingShares",
            DkgPhase::Complete => "Complete",
        }
    }
}

/// DKG state machine for a single participant
pub struct DkgSession<C: PairingCurve> {
    config: SessionConfig,
    phase: DkgPhase,
    polynomial: Option<DealerPolynomial<C>>,
    commitments_g1: BTreeMap<ParticipantIndex, Vec<C::G1>>,
    commitments_g2: BTreeMap<ParticipantIndex, Vec<C::G2>>,
    shares: BTreeMap<ParticipantIndex, C::Scalar>,
}

impl<C: PairingCurve> DkgSession<C> {
    /// Create a new DKG session
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: DkgPhase::Dealing,
            polynomial: None,
            commitments_g1: BTreeMap::new(),
            commitments_g2: BTreeMap::new(),
            shares: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get current phase
    pub fn phase(&self) -> DkgPhase {
        self.phase
    }

    /// Check if DKG is complete
    pub fn is_complete(&self) -> bool {
        self.phase == DkgPhase::Complete
    }

    /// Generate this participant's polynomial.
    ///
    /// Returns the commitment broadcast and one share message per other
    /// participant. The self-share is kept locally and never sent.
    #[instrument(skip(self, rng), fields(index = self.config.index))]
    pub fn deal<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> Result<(DkgCommitmentMessage<C>, Vec<DkgShareMessage<C>>)> {
        self.expect_phase(DkgPhase::Dealing)?;

        let me = self.config.index;
        let polynomial = DealerPolynomial::<C>::generate(self.config.threshold, rng)?;

        let mut share_msgs = Vec::with_capacity(self.config.n_parties - 1);
        for recipient in self.config.participants() {
            let share = polynomial.share_for(recipient)?;
            if recipient == me {
                self.shares.insert(me, share);
            } else {
                share_msgs.push(DkgShareMessage {
                    dealer: me,
                    recipient,
                    share: EncodedScalar(share),
                });
            }
        }

        let commitment_msg = DkgCommitmentMessage {
            dealer: me,
            commitments_g1: polynomial.commitments_g1().iter().copied().map(EncodedG1).collect(),
            commitments_g2: polynomial.commitments_g2().iter().copied().map(EncodedG2).collect(),
        };

        self.commitments_g1.insert(me, polynomial.commitments_g1().to_vec());
        self.commitments_g2.insert(me, polynomial.commitments_g2().to_vec());
        self.polynomial = Some(polynomial);
        self.phase = DkgPhase::AwaitingCommitments;

        debug!(shares = share_msgs.len(), "Dealt polynomial");
        Ok((commitment_msg, share_msgs))
    }

    /// Accept another dealer's broadcast commitments after checking every
    /// G1/G2 pair encodes the same coefficient.
    #[instrument(skip(self, msg), fields(index = self.config.index, dealer = msg.dealer))]
    pub fn receive_commitment(&mut self, msg: &DkgCommitmentMessage<C>) -> Result<()> {
        self.expect_phase(DkgPhase::AwaitingCommitments)?;
        self.expect_dealer(msg.dealer)?;

        if self.commitments_g1.contains_key(&msg.dealer) {
            return Err(Error::VerificationFailed(format!(
                "duplicate commitments from dealer {}",
                msg.dealer
            )));
        }

        let expected = self.config.coefficient_count();
        if msg.commitments_g1.len() != expected || msg.commitments_g2.len() != expected {
            return Err(Error::VerificationFailed(format!(
                "dealer {} committed to {}/{} coefficients, expected {}",
                msg.dealer,
                msg.commitments_g1.len(),
                msg.commitments_g2.len(),
                expected
            )));
        }

        let g1 = msg.g1();
        let g2 = msg.g2();
        if let Some(i) = g1
            .iter()
            .zip(&g2)
            .position(|(p, q)| !verify_public_commitment::<C>(p, q))
        {
            warn!(coefficient = i, "Public commitment failed pairing check");
            return Err(Error::VerificationFailed(format!(
                "dealer {} published inconsistent commitment {}",
                msg.dealer, i
            )));
        }

        self.commitments_g1.insert(msg.dealer, g1);
        self.commitments_g2.insert(msg.dealer, g2);

        if self.commitments_g1.len() == self.config.n_parties {
            self.phase = DkgPhase::AwaitingShares;
            debug!("All commitments received");
        }
        Ok(())
    }

    /// Accept a private share after checking it against the sender's commitments.
    ///
    /// The sender's commitments must already be known. A share that fails the
    /// check is reported as an error naming the dealer.
    #[instrument(skip(self, msg), fields(index = self.config.index, dealer = msg.dealer))]
    pub fn receive_share(&mut self, msg: &DkgShareMessage<C>) -> Result<()> {
        if !matches!(
            self.phase,
            DkgPhase::AwaitingCommitments | DkgPhase::AwaitingShares
        ) {
            return Err(Error::UnexpectedPhase {
                expected: DkgPhase::AwaitingShares.name(),
                found: self.phase.name(),
            });
        }
        self.expect_dealer(msg.dealer)?;

        if msg.recipient != self.config.index {
            return Err(Error::InvalidParticipant(msg.recipient));
        }
        if self.shares.contains_key(&msg.dealer) {
            return Err(Error::VerificationFailed(format!(
                "duplicate share from dealer {}",
                msg.dealer
            )));
        }

        let commitments = self
            .commitments_g1
            .get(&msg.dealer)
            .ok_or_else(|| Error::MissingContributions(vec![msg.dealer]))?;

        if !verify_private_share::<C>(self.config.index, &msg.share.0, commitments) {
            warn!("Private share does not match public commitment");
            return Err(Error::VerificationFailed(format!(
                "share from dealer {} does not match its public commitment",
                msg.dealer
            )));
        }

        self.shares.insert(msg.dealer, msg.share.0);
        Ok(())
    }

    /// Derive the key share once every commitment and share is in.
    #[instrument(skip(self), fields(index = self.config.index))]
    pub fn finalize(&mut self) -> Result<KeyShare<C>> {
        self.expect_phase(DkgPhase::AwaitingShares)?;

        let missing: Vec<ParticipantIndex> = self
            .config
            .participants()
            .filter(|i| !self.shares.contains_key(i))
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingContributions(missing));
        }

        let received: Vec<C::Scalar> = self.shares.values().copied().collect();
        let commitments_g2: Vec<Vec<C::G2>> = self.commitments_g2.values().cloned().collect();
        let zeroth: Vec<C::G2> = commitments_g2.iter().map(|c| c[0]).collect();

        let secret = secret_share::<C>(&received);
        let public_key_shares = all_public_key_shares::<C>(self.config.n_parties, &commitments_g2);
        let group_key = group_public_key::<C>(&zeroth);

        self.polynomial = None;
        self.shares.clear();
        self.phase = DkgPhase::Complete;

        Ok(KeyShare {
            index: self.config.index,
            n_parties: self.config.n_parties,
            threshold: self.config.threshold,
            secret_share: EncodedScalar(secret),
            public_key_shares: public_key_shares.into_iter().map(EncodedG2).collect(),
            group_public_key: EncodedG2(group_key),
        })
    }

    fn expect_phase(&self, expected: DkgPhase) -> Result<()> {
        if self.phase != expected {
            return Err(Error::UnexpectedPhase {
                expected: expected.name(),
                found: self.phase.name(),
            });
        }
        Ok(())
    }

    fn expect_dealer(&self, dealer: ParticipantIndex) -> Result<()> {
        if dealer == self.config.index || position(dealer, self.config.n_parties).is_none() {
            return Err(Error::InvalidParticipant(dealer));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Bls12381;
    use ff::Field;
    use rand::rngs::OsRng;

    type Session = DkgSession<Bls12381>;

    fn sessions(n: usize, t: usize) -> Vec<Session> {
        let session_id = rand::random();
        (1..=n as ParticipantIndex)
            .map(|i| Session::new(SessionConfig::with_session_id(session_id, n, t, i).unwrap()))
            .collect()
    }

    /// Run every phase locally and return the key shares.
    fn run_all(sessions: &mut [Session]) -> Vec<KeyShare<Bls12381>> {
        let mut broadcasts = Vec::new();
        let mut directs = Vec::new();
        for s in sessions.iter_mut() {
            let (c, shares) = s.deal(&mut OsRng).unwrap();
            broadcasts.push(c);
            directs.extend(shares);
        }
        for s in sessions.iter_mut() {
            let me = s.config().index;
            for c in broadcasts.iter().filter(|c| c.dealer != me) {
                s.receive_commitment(c).unwrap();
            }
            for d in directs.iter().filter(|d| d.recipient == me) {
                s.receive_share(d).unwrap();
            }
        }
        sessions.iter_mut().map(|s| s.finalize().unwrap()).collect()
    }

    #[test]
    fn test_dkg_happy_flow() {
        let mut sessions = sessions(5, 2);
        let key_shares = run_all(&mut sessions);

        assert!(sessions.iter().all(|s| s.is_complete()));
        for ks in &key_shares {
            assert_eq!(ks.group_public_key(), key_shares[0].group_public_key());
            assert_eq!(
                ks.public_key_share().unwrap(),
                Bls12381::generator_g2() * ks.secret()
            );
            for other in &key_shares {
                assert_eq!(
                    ks.public_key_share_of(other.index).unwrap(),
                    other.public_key_share().unwrap()
                );
            }
        }
    }

    #[test]
    fn test_phase_ordering() {
        let mut sessions = sessions(3, 1);
        let (c1, _) = sessions[0].deal(&mut OsRng).unwrap();

        // Cannot deal twice
        assert!(matches!(
            sessions[0].deal(&mut OsRng),
            Err(Error::UnexpectedPhase { .. })
        ));
        // Cannot receive before dealing
        assert!(matches!(
            sessions[1].receive_commitment(&c1),
            Err(Error::UnexpectedPhase { .. })
        ));
        // Cannot finalize before all commitments
        assert!(matches!(
            sessions[0].finalize(),
            Err(Error::UnexpectedPhase { .. })
        ));
    }

    #[test]
    fn test_share_before_commitment_rejected() {
        let mut sessions = sessions(3, 1);
        sessions[0].deal(&mut OsRng).unwrap();
        let (_, shares) = sessions[1].deal(&mut OsRng).unwrap();
        let to_first = shares.iter().find(|s| s.recipient == 1).unwrap();

        assert!(matches!(
            sessions[0].receive_share(to_first),
            Err(Error::MissingContributions(ref m)) if m == &vec![2]
        ));
    }

    #[test]
    fn test_tampered_share_accuses_dealer() {
        let mut sessions = sessions(3, 1);
        let (_, _) = sessions[0].deal(&mut OsRng).unwrap();
        let (c2, shares) = sessions[1].deal(&mut OsRng).unwrap();
        sessions[0].receive_commitment(&c2).unwrap();

        let mut bad = shares.into_iter().find(|s| s.recipient == 1).unwrap();
        bad.share = EncodedScalar(bad.share.0 + bls12_381::Scalar::ONE);

        let err = sessions[0].receive_share(&bad).unwrap_err();
        assert!(matches!(err, Error::VerificationFailed(ref m) if m.contains("dealer 2")));
    }

    #[test]
    fn test_inconsistent_commitment_rejected() {
        let mut sessions = sessions(3, 1);
        sessions[0].deal(&mut OsRng).unwrap();
        let (mut c2, _) = sessions[1].deal(&mut OsRng).unwrap();
        c2.commitments_g2[1] = EncodedG2(c2.commitments_g2[1].0 + Bls12381::generator_g2());

        assert!(matches!(
            sessions[0].receive_commitment(&c2),
            Err(Error::VerificationFailed(_))
        ));
    }

    #[test]
    fn test_wrong_commitment_length_rejected() {
        let mut sessions = sessions(3, 1);
        sessions[0].deal(&mut OsRng).unwrap();
        let (mut c2, _) = sessions[1].deal(&mut OsRng).unwrap();
        c2.commitments_g1.pop();
        c2.commitments_g2.pop();

        assert!(sessions[0].receive_commitment(&c2).is_err());
    }

    #[test]
    fn test_missing_share_blocks_finalize() {
        let mut sessions = sessions(3, 1);
        let mut broadcasts = Vec::new();
        let mut directs = Vec::new();
        for s in sessions.iter_mut() {
            let (c, shares) = s.deal(&mut OsRng).unwrap();
            broadcasts.push(c);
            directs.extend(shares);
        }

        let first = &mut sessions[0];
        for c in broadcasts.iter().skip(1) {
            first.receive_commitment(c).unwrap();
        }
        let from_two = directs
            .iter()
            .find(|d| d.dealer == 2 && d.recipient == 1)
            .unwrap();
        first.receive_share(from_two).unwrap();

        assert!(matches!(
            first.finalize(),
            Err(Error::MissingContributions(ref m)) if m == &vec![3]
        ));
    }

    #[test]
    fn test_foreign_dealer_rejected() {
        let mut sessions = sessions(3, 1);
        let (mut c1, _) = sessions[0].deal(&mut OsRng).unwrap();
        sessions[1].deal(&mut OsRng).unwrap();

        // Own index echoed back
        c1.dealer = 2;
        assert!(matches!(
            sessions[1].receive_commitment(&c1),
            Err(Error::InvalidParticipant(2))
        ));
        c1.dealer = 9;
        assert!(matches!(
            sessions[1].receive_commitment(&c1),
            Err(Error::InvalidParticipant(9))
        ));
    }
}
