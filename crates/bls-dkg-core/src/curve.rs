//! Pairing-curve capability set
//!
//! Everything the DKG and reconstruction logic needs from a pairing-friendly
//! curve: the scalar field, the two source groups with their generators, a
//! pairing-product evaluation, hashing to G1 for BLS signatures, and point
//! construction from raw affine coordinates with on-curve/subgroup validation.
//!
//! Group arithmetic (addition, scalar multiplication, identity, equality)
//! comes from the [`group::Group`] bound on `G1` and `G2`.

use std::fmt::Debug;

use bls12_381::{
    hash_to_curve::{ExpandMsgXmd, HashToCurve},
    multi_miller_loop, G1Affine, G1Projective, G2Affine, G2Prepared, G2Projective, Gt, Scalar,
};
use ff::PrimeField;
use group::{Curve, Group};

use crate::{Error, Result};

/// Capability set of a pairing-friendly curve.
///
/// Implemented once per concrete curve on a zero-sized marker type; all DKG
/// and reconstruction code is generic over it.
pub trait PairingCurve:
    Copy + Clone + Debug + Default + PartialEq + Eq + Send + Sync + 'static
{
    /// Scalar field element
    type Scalar: PrimeField;
    /// Signature group
    type G1: Group<Scalar = Self::Scalar>;
    /// Public key group
    type G2: Group<Scalar = Self::Scalar>;
    /// Pairing target group
    type Gt: Copy + Debug + PartialEq + Send + Sync;

    /// Human readable curve name
    const NAME: &'static str;

    /// Prime order of the scalar field as `0x`-prefixed hex.
    fn scalar_order() -> &'static str {
        <Self::Scalar as PrimeField>::MODULUS
    }

    fn generator_g1() -> Self::G1 {
        Self::G1::generator()
    }

    fn generator_g2() -> Self::G2 {
        Self::G2::generator()
    }

    /// Product of pairings `Π e(g1_i, g2_i)`.
    fn pairing_product(terms: &[(Self::G1, Self::G2)]) -> Self::Gt;

    /// Identity of the target group.
    fn identity_gt() -> Self::Gt;

    /// Hash an arbitrary message onto G1.
    fn hash_to_g1(message: &[u8]) -> Self::G1;

    /// Reduce 64 uniformly random bytes into a scalar.
    fn scalar_from_wide(bytes: &[u8; 64]) -> Self::Scalar;

    /// Canonical big-endian bytes of a scalar.
    fn scalar_to_be_bytes(scalar: &Self::Scalar) -> Vec<u8>;

    /// Big-endian affine coordinates `[x, y]` of a G1 point.
    ///
    /// Coordinates carry the curve library's encoding flags in the top bits
    /// of `x`. For BLS12-381 the identity is `x = 0x40 << 376`, `y = 0`, and
    /// [`Self::g1_from_coordinates`] accepts exactly that form back.
    fn g1_to_coordinates(point: &Self::G1) -> Vec<Vec<u8>>;

    /// Build a G1 point from `[x, y]`, rejecting anything off-curve or outside the subgroup.
    fn g1_from_coordinates(coordinates: &[Vec<u8>]) -> Result<Self::G1>;

    /// Big-endian affine coordinates `[x.c1, x.c0, y.c1, y.c0]` of a G2 point.
    ///
    /// Flags sit in the top bits of `x.c1`, as for G1.
    fn g2_to_coordinates(point: &Self::G2) -> Vec<Vec<u8>>;

    /// Build a G2 point from four coordinates, rejecting invalid points.
    fn g2_from_coordinates(coordinates: &[Vec<u8>]) -> Result<Self::G2>;

    /// BLS signature `H(m) * sk` in G1.
    fn sign(secret: &Self::Scalar, message: &[u8]) -> Self::G1 {
        Self::hash_to_g1(message) * secret
    }

    /// Checks `e(sig, G2) == e(H(m), pk)`.
    fn verify_single_signature(signature: &Self::G1, public_key: &Self::G2, message: &[u8]) -> bool {
        let product = Self::pairing_product(&[
            (*signature, Self::generator_g2()),
            (-Self::hash_to_g1(message), *public_key),
        ]);
        product == Self::identity_gt()
    }
}

/// BLS12-381, signatures in G1 and public keys in G2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bls12381;

/// Domain separation tag for BLS signatures in G1 (IETF minimal-signature-size suite)
pub const BLS12381_SIGNATURE_DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

/// Size of one base field element
const FP_BYTES: usize = 48;

impl PairingCurve for Bls12381 {
    type Scalar = Scalar;
    type G1 = G1Projective;
    type G2 = G2Projective;
    type Gt = Gt;

    const NAME: &'static str = "bls12-381";

    fn pairing_product(terms: &[(G1Projective, G2Projective)]) -> Gt {
        let prepared: Vec<(G1Affine, G2Prepared)> = terms
            .iter()
            .map(|(p, q)| (p.to_affine(), G2Prepared::from(q.to_affine())))
            .collect();
        let refs: Vec<(&G1Affine, &G2Prepared)> = prepared.iter().map(|(p, q)| (p, q)).collect();

        multi_miller_loop(&refs).final_exponentiation()
    }

    fn identity_gt() -> Gt {
        Gt::identity()
    }

    fn hash_to_g1(message: &[u8]) -> G1Projective {
        <G1Projective as HashToCurve<ExpandMsgXmd<sha2::Sha256>>>::hash_to_curve(
            message,
            BLS12381_SIGNATURE_DST,
        )
    }

    fn scalar_from_wide(bytes: &[u8; 64]) -> Scalar {
        Scalar::from_bytes_wide(bytes)
    }

    fn scalar_to_be_bytes(scalar: &Scalar) -> Vec<u8> {
        let mut bytes = scalar.to_bytes();
        bytes.reverse();
        bytes.to_vec()
    }

    fn g1_to_coordinates(point: &G1Projective) -> Vec<Vec<u8>> {
        point
            .to_affine()
            .to_uncompressed()
            .chunks(FP_BYTES)
            .map(<[u8]>::to_vec)
            .collect()
    }

    fn g1_from_coordinates(coordinates: &[Vec<u8>]) -> Result<G1Projective> {
        let bytes: [u8; 2 * FP_BYTES] = pack_coordinates(coordinates)?;
        Option::<G1Affine>::from(G1Affine::from_uncompressed(&bytes))
            .map(G1Projective::from)
            .ok_or_else(|| {
                Error::PointDecoding("G1 coordinates are not a point of the prime-order subgroup".into())
            })
    }

    fn g2_to_coordinates(point: &G2Projective) -> Vec<Vec<u8>> {
        point
            .to_affine()
            .to_uncompressed()
            .chunks(FP_BYTES)
            .map(<[u8]>::to_vec)
            .collect()
    }

    fn g2_from_coordinates(coordinates: &[Vec<u8>]) -> Result<G2Projective> {
        let bytes: [u8; 4 * FP_BYTES] = pack_coordinates(coordinates)?;
        Option::<G2Affine>::from(G2Affine::from_uncompressed(&bytes))
            .map(G2Projective::from)
            .ok_or_else(|| {
                Error::PointDecoding("G2 coordinates are not a point of the prime-order subgroup".into())
            })
    }
}

/// Left-pad each big-endian coordinate to a full field element and concatenate.
fn pack_coordinates<const N: usize>(coordinates: &[Vec<u8>]) -> Result<[u8; N]> {
    let expected = N / FP_BYTES;
    if coordinates.len() != expected {
        return Err(Error::PointDecoding(format!(
            "expected {} coordinates, got {}",
            expected,
            coordinates.len()
        )));
    }

    let mut out = [0u8; N];
    for (chunk, coordinate) in out.chunks_mut(FP_BYTES).zip(coordinates) {
        if coordinate.len() > FP_BYTES {
            return Err(Error::PointDecoding(format!(
                "coordinate of {} bytes exceeds the field size",
                coordinate.len()
            )));
        }
        chunk[FP_BYTES - coordinate.len()..].copy_from_slice(coordinate);
    }

    Ok(out)
}
