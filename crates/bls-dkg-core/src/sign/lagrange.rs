//! Lagrange interpolation at zero over the scalar field

use std::collections::HashSet;
use std::iter::Sum;
use std::ops::Mul;

use ff::PrimeField;

use crate::curve::PairingCurve;
use crate::error::ReconstructionError;
use crate::ParticipantIndex;

/// Basis coefficients `λ_i = Π_{j≠i} x_j / (x_j - x_i)` for the given indices.
///
/// Indices must be non-zero and pairwise distinct (checked by value), and at
/// least two must be supplied.
pub fn lagrange_coefficients<F: PrimeField>(
    indices: &[ParticipantIndex],
) -> Result<Vec<F>, ReconstructionError> {
    if indices.len() < 2 {
        return Err(ReconstructionError::InsufficientShares(indices.len()));
    }
    if indices.contains(&0) {
        return Err(ReconstructionError::ZeroIndex);
    }
    let mut seen = HashSet::with_capacity(indices.len());
    if let Some(dup) = indices.iter().find(|i| !seen.insert(**i)) {
        return Err(ReconstructionError::DuplicateIndex(*dup));
    }

    let xs: Vec<F> = indices.iter().map(|i| F::from(*i)).collect();
    xs.iter()
        .enumerate()
        .map(|(i, x_i)| {
            let (numerator, denominator) = xs
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .fold((F::ONE, F::ONE), |(num, den), (_, x_j)| {
                    (num * x_j, den * (*x_j - x_i))
                });
            Option::<F>::from(denominator.invert())
                .map(|inv| numerator * inv)
                .ok_or(ReconstructionError::NonInvertible)
        })
        .collect()
}

/// Interpolate the value at zero from `(index, value)` pairs.
///
/// Works for scalars and group elements alike.
pub fn interpolate_at_zero<F, T>(
    values: &[T],
    indices: &[ParticipantIndex],
) -> Result<T, ReconstructionError>
where
    F: PrimeField,
    T: Copy + Sum + Mul<F, Output = T>,
{
    if values.len() != indices.len() {
        return Err(ReconstructionError::LengthMismatch {
            shares: values.len(),
            indices: indices.len(),
        });
    }
    let lambdas = lagrange_coefficients::<F>(indices)?;
    Ok(values
        .iter()
        .zip(lambdas)
        .map(|(value, lambda)| *value * lambda)
        .sum())
}

/// Recover the group secret from secret-key shares.
pub fn reconstruct_secret<C: PairingCurve>(
    shares: &[C::Scalar],
    indices: &[ParticipantIndex],
) -> Result<C::Scalar, ReconstructionError> {
    interpolate_at_zero::<C::Scalar, C::Scalar>(shares, indices)
}

/// Recover the group signature from signature shares.
pub fn reconstruct_signature<C: PairingCurve>(
    shares: &[C::G1],
    indices: &[ParticipantIndex],
) -> Result<C::G1, ReconstructionError> {
    interpolate_at_zero::<C::Scalar, C::G1>(shares, indices)
}

/// Recover the group public key from public-key shares.
pub fn reconstruct_public_key<C: PairingCurve>(
    shares: &[C::G2],
    indices: &[ParticipantIndex],
) -> Result<C::G2, ReconstructionError> {
    interpolate_at_zero::<C::Scalar, C::G2>(shares, indices)
}
