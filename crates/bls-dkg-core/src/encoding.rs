//! Text encoding of scalars and points
//!
//! Scalars and point coordinates cross process boundaries as text-encoded
//! unsigned integers: emitted as `0x`-prefixed lowercase hex, accepted as hex
//! or decimal. A point is a list of coordinate strings (2 for G1, 4 for G2).

use ff::Field;
use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::curve::PairingCurve;
use crate::{Error, Result};

/// Parse `0x`-prefixed hex or plain decimal into minimal big-endian bytes.
pub fn parse_integer(text: &str) -> std::result::Result<Vec<u8>, String> {
    let text = text.trim();
    let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(digits) => (digits, 16),
        None => (text, 10),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(format!("invalid integer {:?}", text));
    }

    let value = BigUint::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| format!("invalid base-{} integer {:?}", radix, text))?;
    if value.bits() == 0 {
        return Ok(Vec::new());
    }
    Ok(value.to_bytes_be())
}

/// Format big-endian bytes as `0x`-prefixed hex without leading zeros.
pub fn format_integer(bytes: &[u8]) -> String {
    format!("0x{}", BigUint::from_bytes_be(bytes).to_str_radix(16))
}

pub fn scalar_to_text<C: PairingCurve>(scalar: &C::Scalar) -> String {
    format_integer(&C::scalar_to_be_bytes(scalar))
}

/// Parse a scalar, reducing it modulo the scalar order.
pub fn scalar_from_text<C: PairingCurve>(text: &str) -> Result<C::Scalar> {
    let bytes = parse_integer(text).map_err(Error::ScalarDecoding)?;
    let radix = C::Scalar::from(256u64);
    Ok(bytes.iter().fold(C::Scalar::ZERO, |acc, byte| {
        acc * radix + C::Scalar::from(u64::from(*byte))
    }))
}

pub fn g1_to_text<C: PairingCurve>(point: &C::G1) -> Vec<String> {
    C::g1_to_coordinates(point)
        .iter()
        .map(|c| format_integer(c))
        .collect()
}

pub fn g1_from_text<C: PairingCurve, S: AsRef<str>>(coordinates: &[S]) -> Result<C::G1> {
    C::g1_from_coordinates(&parse_coordinates(coordinates)?)
}

pub fn g2_to_text<C: PairingCurve>(point: &C::G2) -> Vec<String> {
    C::g2_to_coordinates(point)
        .iter()
        .map(|c| format_integer(c))
        .collect()
}

pub fn g2_from_text<C: PairingCurve, S: AsRef<str>>(coordinates: &[S]) -> Result<C::G2> {
    C::g2_from_coordinates(&parse_coordinates(coordinates)?)
}

/// Parse a flat comma-separated list `x0,y0,x1,y1,...` into G1 points.
pub fn g1_list_from_flat_text<C: PairingCurve>(text: &str) -> Result<Vec<C::G1>> {
    let coordinates: Vec<&str> = text.split(',').map(str::trim).collect();
    if coordinates.len() % 2 != 0 {
        return Err(Error::PointDecoding(format!(
            "odd number of G1 coordinates: {}",
            coordinates.len()
        )));
    }
    coordinates.chunks(2).map(g1_from_text::<C, _>).collect()
}

fn parse_coordinates<S: AsRef<str>>(coordinates: &[S]) -> Result<Vec<Vec<u8>>> {
    coordinates
        .iter()
        .map(|c| parse_integer(c.as_ref()).map_err(Error::PointDecoding))
        .collect()
}

/// Scalar serialized as a text integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedScalar<C: PairingCurve>(pub C::Scalar);

/// G1 point serialized as its coordinate strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedG1<C: PairingCurve>(pub C::G1);

/// G2 point serialized as its coordinate strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedG2<C: PairingCurve>(pub C::G2);

impl<C: PairingCurve> Serialize for EncodedScalar<C> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&scalar_to_text::<C>(&self.0))
    }
}

impl<'de, C: PairingCurve> Deserialize<'de> for EncodedScalar<C> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        scalar_from_text::<C>(&text)
            .map(EncodedScalar)
            .map_err(de::Error::custom)
    }
}

impl<C: PairingCurve> Serialize for EncodedG1<C> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        g1_to_text::<C>(&self.0).serialize(serializer)
    }
}

impl<'de, C: PairingCurve> Deserialize<'de> for EncodedG1<C> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let coordinates = Vec::<String>::deserialize(deserializer)?;
        g1_from_text::<C, _>(&coordinates)
            .map(EncodedG1)
            .map_err(de::Error::custom)
    }
}

impl<C: PairingCurve> Serialize for EncodedG2<C> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        g2_to_text::<C>(&self.0).serialize(serializer)
    }
}

impl<'de, C: PairingCurve> Deserialize<'de> for EncodedG2<C> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let coordinates = Vec::<String>::deserialize(deserializer)?;
        g2_from_text::<C, _>(&coordinates)
            .map(EncodedG2)
            .map_err(de::Error::custom)
    }
}
