//! BLS DKG Party CLI
//!
//! Command-line interface for running DKG participant operations:
//! - Dealing and verifying Feldman VSS contributions
//! - Deriving key shares from a DKG transcript
//! - Threshold BLS signing and verification
//! - A full local simulation over an in-memory relay

use anyhow::{bail, Context, Result};
use bls_dkg_core::encoding::{
    g1_list_from_flat_text, g1_to_text, g2_to_text, scalar_from_text, scalar_to_text,
};
use bls_dkg_core::keygen::{self, coefficient_gen, verify_private_share, DealerRecord, DkgTranscript};
use bls_dkg_core::mpc::MemoryRelay;
use bls_dkg_core::sign::{self, reconstruct_signature};
use bls_dkg_core::{
    Bls12381, KeyShare, PairingCurve, ParticipantIndex, SessionConfig, SessionId,
    DEFAULT_MESSAGE, DEFAULT_PARTIES, DEFAULT_THRESHOLD,
};
use clap::{Parser, Subcommand};
use futures_util::future::try_join_all;
use rand::rngs::OsRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

type C = Bls12381;

/// BLS DKG Party - threshold BLS participant node
#[derive(Parser)]
#[command(name = "bls-dkg-party")]
#[command(about = "Distributed key generation and threshold BLS signing")]
#[command(version)]
struct Cli {
    /// Data directory for key shares
    #[arg(short, long, env = "DKG_DEST", default_value = "./data", global = true)]
    dest: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random key pair
    Keypair,

    /// Deal one participant's contribution and print it as JSON
    Deal {
        /// Dealer index (1-based)
        #[arg(short, long, env = "DKG_INDEX")]
        index: ParticipantIndex,

        /// Polynomial degree t (t + 1 signers required)
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: usize,

        /// Number of parties
        #[arg(short, long, default_value_t = DEFAULT_PARTIES)]
        n: usize,
    },

    /// Deal for every participant and write the transcript to a file
    Transcript {
        /// Polynomial degree t
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: usize,

        /// Number of parties
        #[arg(short, long, default_value_t = DEFAULT_PARTIES)]
        n: usize,

        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Check a received share against a dealer's G1 commitments
    VerifyShare {
        /// Recipient index (1-based)
        #[arg(short, long, env = "DKG_INDEX")]
        index: ParticipantIndex,

        /// Share as hex or decimal
        #[arg(short, long)]
        share: String,

        /// G1 commitments as a flat list x0,y0,x1,y1,...
        #[arg(short, long)]
        commitments: String,
    },

    /// Sign with every share of a transcript and reconstruct per subset
    SignAndVerify {
        /// Transcript file written by `transcript`
        #[arg(long)]
        transcript: PathBuf,

        /// Message to sign
        #[arg(short, long, default_value = DEFAULT_MESSAGE)]
        message: String,

        /// Signer subsets, e.g. "3,4,5;2,4,5;1,3,5"
        #[arg(short, long, default_value = "3,4,5;2,4,5;1,3,5")]
        subsets: String,
    },

    /// Run DKG and signing for all parties over an in-memory relay
    Simulate {
        /// Number of parties
        #[arg(short, long, default_value_t = DEFAULT_PARTIES)]
        n: usize,

        /// Polynomial degree t
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: usize,

        /// Message to sign
        #[arg(short, long, default_value = DEFAULT_MESSAGE)]
        message: String,

        /// Signer indices (comma-separated); defaults to the first t + 1
        #[arg(short, long)]
        signers: Option<String>,
    },

    /// Show key share info
    Info {
        /// Participant index (1-based)
        #[arg(short, long, env = "DKG_INDEX")]
        index: ParticipantIndex,
    },
}

#[derive(Serialize)]
struct KeypairOutput {
    sk: String,
    pk: Vec<String>,
}

#[derive(Serialize)]
struct SubsetOutput {
    signers: Vec<ParticipantIndex>,
    signature: Vec<String>,
    verified: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keypair => run_keypair()?,
        Commands::Deal { index, threshold, n } => run_deal(index, threshold, n)?,
        Commands::Transcript { threshold, n, ref out } => run_transcript(threshold, n, out)?,
        Commands::VerifyShare {
            index,
            ref share,
            ref commitments,
        } => run_verify_share(index, share, commitments)?,
        Commands::SignAndVerify {
            ref transcript,
            ref message,
            ref subsets,
        } => run_sign_and_verify(transcript, message, subsets)?,
        Commands::Simulate {
            n,
            threshold,
            ref message,
            ref signers,
        } => run_simulate(&cli.dest, n, threshold, message, signers.as_deref()).await?,
        Commands::Info { index } => show_info(&cli.dest, index)?,
    }

    Ok(())
}

fn run_keypair() -> Result<()> {
    let (sk, pk, _) = coefficient_gen::<C, _>(&mut OsRng)?;
    let output = KeypairOutput {
        sk: scalar_to_text::<C>(&sk),
        pk: g1_to_text::<C>(&pk),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_deal(index: ParticipantIndex, threshold: usize, n: usize) -> Result<()> {
    let record = DealerRecord::<C>::deal(index, threshold, n, &mut OsRng)?;
    info!(index, threshold, n_parties = n, "Dealt contribution");
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn run_transcript(threshold: usize, n: usize, out: &Path) -> Result<()> {
    let transcript = DkgTranscript::<C>::simulate(n, threshold, &mut OsRng)?;
    transcript.verify()?;

    let json = serde_json::to_string_pretty(&transcript)?;
    std::fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;

    info!(path = ?out, n_parties = n, threshold, "Transcript written");
    Ok(())
}

fn run_verify_share(index: ParticipantIndex, share: &str, commitments: &str) -> Result<()> {
    let share = scalar_from_text::<C>(share)?;
    let commitments = g1_list_from_flat_text::<C>(commitments)?;
    println!("{}", verify_private_share::<C>(index, &share, &commitments));
    Ok(())
}

fn run_sign_and_verify(transcript: &Path, message: &str, subsets: &str) -> Result<()> {
    let json = std::fs::read_to_string(transcript)
        .with_context(|| format!("reading {}", transcript.display()))?;
    let transcript: DkgTranscript<C> = serde_json::from_str(&json)?;
    let key_shares = transcript.key_shares()?;
    let group_key = key_shares
        .first()
        .map(|k| k.group_public_key())
        .context("transcript has no participants")?;
    let message = message.as_bytes();

    let mut signatures = Vec::with_capacity(key_shares.len());
    for key_share in &key_shares {
        let signature = key_share.sign(message);
        if !C::verify_single_signature(&signature, &key_share.public_key_share()?, message) {
            bail!("signature share of participant {} does not verify", key_share.index);
        }
        signatures.push(signature);
    }

    let mut outputs = Vec::new();
    for subset in subsets.split(';').filter(|s| !s.trim().is_empty()) {
        let signers = parse_indices(subset)?;
        let shares = signers
            .iter()
            .map(|i| {
                usize::try_from(*i)
                    .ok()
                    .and_then(|i| i.checked_sub(1))
                    .and_then(|i| signatures.get(i).copied())
                    .with_context(|| format!("no participant {}", i))
            })
            .collect::<Result<Vec<_>>>()?;

        let signature = reconstruct_signature::<C>(&shares, &signers)?;
        let verified = C::verify_single_signature(&signature, &group_key, message);
        let output = SubsetOutput {
            signers,
            signature: g1_to_text::<C>(&signature),
            verified,
        };
        outputs.push((signature, output));
    }

    let agree = outputs.windows(2).all(|w| w[0].0 == w[1].0);
    let all_verified = outputs.iter().all(|(_, o)| o.verified);
    let report: Vec<_> = outputs.into_iter().map(|(_, o)| o).collect();
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !all_verified {
        bail!("reconstructed signature failed verification against the group key");
    }
    if !agree {
        bail!("signer subsets reconstructed different signatures");
    }
    info!(subsets = report.len(), "All subsets agree and verify");
    Ok(())
}

async fn run_simulate(
    dest: &Path,
    n: usize,
    threshold: usize,
    message: &str,
    signers: Option<&str>,
) -> Result<()> {
    std::fs::create_dir_all(dest)?;

    let relay = MemoryRelay::new();
    let session_id: SessionId = rand::random();
    let configs = (1..=n as ParticipantIndex)
        .map(|i| SessionConfig::with_session_id(session_id, n, threshold, i))
        .collect::<bls_dkg_core::Result<Vec<_>>>()?;

    info!(
        n_parties = n,
        threshold,
        session = %hex::encode(session_id),
        "Starting simulated DKG"
    );
    let handles = configs.into_iter().map(|config| {
        let relay = relay.clone();
        tokio::spawn(async move { keygen::run_dkg::<C, _>(&config, &relay).await })
    });
    let key_shares = try_join_all(handles)
        .await?
        .into_iter()
        .collect::<bls_dkg_core::Result<Vec<_>>>()?;

    for key_share in &key_shares {
        save_key_share(dest, key_share)?;
    }

    let signers = match signers {
        Some(list) => parse_indices(list)?,
        None => (1..=threshold as ParticipantIndex + 1).collect(),
    };
    let signing_id: SessionId = rand::random();
    info!(signers = ?signers, session = %hex::encode(signing_id), "Starting simulated signing");

    let handles = signers
        .iter()
        .map(|index| {
            let key_share = key_shares
                .iter()
                .find(|k| k.index == *index)
                .cloned()
                .with_context(|| format!("no participant {}", index))?;
            let relay = relay.clone();
            let signers = signers.clone();
            let message = message.as_bytes().to_vec();
            Ok(tokio::spawn(async move {
                sign::run_threshold_sign(&key_share, &message, &signers, &signing_id, &relay).await
            }))
        })
        .collect::<Result<Vec<_>>>()?;
    let signatures = try_join_all(handles)
        .await?
        .into_iter()
        .collect::<bls_dkg_core::Result<Vec<_>>>()?;

    let signature = signatures.first().context("no signers")?;
    if signatures.iter().any(|s| s != signature) {
        bail!("signers produced different signatures");
    }

    println!("Group Public Key: {}", g2_to_text::<C>(&key_shares[0].group_public_key()).join(","));
    println!("Signers: {:?}", signers);
    println!("Signature: {}", g1_to_text::<C>(signature).join(","));
    Ok(())
}

fn show_info(dest: &Path, index: ParticipantIndex) -> Result<()> {
    let key_share = load_key_share(dest, index)?;

    println!("Key Share Info:");
    println!("  Index: {}", key_share.index);
    println!("  N Parties: {}", key_share.n_parties);
    println!("  Threshold: {}", key_share.threshold);
    println!("  Required Signers: {}", key_share.required_signers());
    println!(
        "  Public Key Share: {}",
        g2_to_text::<C>(&key_share.public_key_share()?).join(",")
    );
    println!(
        "  Group Public Key: {}",
        g2_to_text::<C>(&key_share.group_public_key()).join(",")
    );

    Ok(())
}

fn parse_indices(list: &str) -> Result<Vec<ParticipantIndex>> {
    list.split(',')
        .map(|s| {
            s.trim()
                .parse()
                .with_context(|| format!("invalid participant index {:?}", s))
        })
        .collect()
}

fn key_share_path(dest: &Path, index: ParticipantIndex) -> PathBuf {
    dest.join(format!("keyshare.{}.json", index))
}

fn save_key_share(dest: &Path, key_share: &KeyShare<C>) -> Result<()> {
    let path = key_share_path(dest, key_share.index);
    std::fs::write(&path, serde_json::to_string_pretty(key_share)?)?;
    info!(index = key_share.index, path = ?path, "Key share saved");
    Ok(())
}

fn load_key_share(dest: &Path, index: ParticipantIndex) -> Result<KeyShare<C>> {
    let path = key_share_path(dest, index);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}
