//! End-to-end DKG and threshold signing with five participants, degree two.

use bls_dkg_core::keygen::{
    evaluate_share, run_dkg, verify_private_share, verify_public_commitment, DkgTranscript,
};
use bls_dkg_core::mpc::MemoryRelay;
use bls_dkg_core::sign::{reconstruct_secret, reconstruct_signature, run_threshold_sign};
use bls_dkg_core::{
    Bls12381, Error, KeyShare, PairingCurve, ParticipantIndex, ReconstructionError,
    SessionConfig, DEFAULT_MESSAGE, DEFAULT_PARTIES, DEFAULT_THRESHOLD,
};
use futures_util::future::try_join_all;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

type C = Bls12381;

const SUBSETS: [[ParticipantIndex; 3]; 3] = [[3, 4, 5], [2, 4, 5], [1, 3, 5]];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn transcript() -> DkgTranscript<C> {
    DkgTranscript::simulate(
        DEFAULT_PARTIES,
        DEFAULT_THRESHOLD,
        &mut ChaCha20Rng::seed_from_u64(2024),
    )
    .unwrap()
}

fn signature_shares(key_shares: &[KeyShare<C>], message: &[u8]) -> Vec<<C as PairingCurve>::G1> {
    key_shares.iter().map(|k| k.sign(message)).collect()
}

fn pick<T: Copy>(all: &[T], subset: &[ParticipantIndex]) -> Vec<T> {
    subset.iter().map(|i| all[(*i - 1) as usize]).collect()
}

#[test]
fn every_commitment_and_share_verifies() {
    let transcript = transcript();
    for dealer in &transcript.dealers {
        assert_eq!(dealer.coefficients.len(), DEFAULT_THRESHOLD + 1);
        for (g1, g2) in dealer.g1().iter().zip(dealer.g2()) {
            assert!(verify_public_commitment::<C>(g1, &g2));
        }

        let coefficients: Vec<_> = dealer.coefficients.iter().map(|c| c.0).collect();
        for recipient in 1..=DEFAULT_PARTIES as ParticipantIndex {
            let share = evaluate_share::<C>(&coefficients, recipient).unwrap();
            assert!(verify_private_share::<C>(recipient, &share, &dealer.g1()));
        }
    }
}

#[test]
fn subsets_reconstruct_the_same_signature() {
    init_tracing();
    let key_shares = transcript().key_shares().unwrap();
    let group_key = key_shares[0].group_public_key();
    let message = DEFAULT_MESSAGE.as_bytes();
    let shares = signature_shares(&key_shares, message);

    for (share, key_share) in shares.iter().zip(&key_shares) {
        assert!(C::verify_single_signature(
            share,
            &key_share.public_key_share().unwrap(),
            message
        ));
    }

    let signatures: Vec<_> = SUBSETS
        .iter()
        .map(|subset| reconstruct_signature::<C>(&pick(&shares, subset), subset).unwrap())
        .collect();

    assert!(signatures.iter().all(|s| *s == signatures[0]));
    for signature in &signatures {
        assert!(C::verify_single_signature(signature, &group_key, message));
    }
}

#[test]
fn group_key_matches_reconstructed_secret() {
    let transcript = transcript();
    let key_shares = transcript.key_shares().unwrap();

    let secrets: Vec<_> = key_shares.iter().map(|k| *k.secret()).collect();
    let indices: Vec<_> = key_shares.iter().map(|k| k.index).collect();
    let secret = reconstruct_secret::<C>(&secrets, &indices).unwrap();

    assert_eq!(secret, transcript.group_secret());
    assert_eq!(C::generator_g2() * secret, key_shares[0].group_public_key());
}

#[test]
fn malformed_reconstruction_inputs_fail() {
    let key_shares = transcript().key_shares().unwrap();
    let shares = signature_shares(&key_shares, DEFAULT_MESSAGE.as_bytes());

    assert!(matches!(
        reconstruct_signature::<C>(&shares[..1], &[1]),
        Err(ReconstructionError::InsufficientShares(1))
    ));
    assert!(matches!(
        reconstruct_signature::<C>(&shares[..3], &[1, 2, 2]),
        Err(ReconstructionError::DuplicateIndex(2))
    ));
}

#[test]
fn flipped_message_bit_fails_everywhere() {
    let key_shares = transcript().key_shares().unwrap();
    let group_key = key_shares[0].group_public_key();
    let message = DEFAULT_MESSAGE.as_bytes();
    let shares = signature_shares(&key_shares, message);
    let signature = reconstruct_signature::<C>(&pick(&shares, &SUBSETS[0]), &SUBSETS[0]).unwrap();

    for bit in [0usize, 13, 8 * message.len() - 1] {
        let mut flipped = message.to_vec();
        flipped[bit / 8] ^= 1 << (bit % 8);

        for (share, key_share) in shares.iter().zip(&key_shares) {
            assert!(!C::verify_single_signature(
                share,
                &key_share.public_key_share().unwrap(),
                &flipped
            ));
        }
        assert!(!C::verify_single_signature(&signature, &group_key, &flipped));
    }
}

#[tokio::test]
async fn networked_dkg_then_signing() {
    init_tracing();
    let relay = MemoryRelay::new();
    let session_id = [9u8; 32];

    let configs: Vec<SessionConfig> = (1..=DEFAULT_PARTIES as ParticipantIndex)
        .map(|i| SessionConfig::with_session_id(session_id, DEFAULT_PARTIES, DEFAULT_THRESHOLD, i))
        .collect::<Result<_, Error>>()
        .unwrap();
    let key_shares: Vec<KeyShare<C>> =
        try_join_all(configs.iter().map(|config| run_dkg::<C, _>(config, &relay)))
            .await
            .unwrap();

    let message = DEFAULT_MESSAGE.as_bytes();
    let mut signatures = Vec::new();
    for (round, subset) in SUBSETS.iter().enumerate() {
        let signing_id = [round as u8 + 100; 32];
        let produced = try_join_all(subset.iter().map(|i| {
            run_threshold_sign(
                &key_shares[(*i - 1) as usize],
                message,
                subset,
                &signing_id,
                &relay,
            )
        }))
        .await
        .unwrap();
        assert!(produced.iter().all(|s| *s == produced[0]));
        signatures.push(produced[0]);
    }

    assert!(signatures.iter().all(|s| *s == signatures[0]));
    assert!(C::verify_single_signature(
        &signatures[0],
        &key_shares[0].group_public_key(),
        message
    ));
}
