use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand_core::CryptoRngCore;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Error;

/// Length of a canonically encoded group element, and therefore of a
/// Diffie-Hellman output.
pub const POINT_LEN: usize = 32;

/// A shared secret resulting from a Diffie-Hellman operation.
///
/// Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; POINT_LEN]);

impl core::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

impl SharedSecret {
    /// Access the raw 32-byte shared secret.
    pub fn as_bytes(&self) -> &[u8; POINT_LEN] {
        &self.0
    }
}

/// Draw a uniformly random scalar.
pub(crate) fn random_scalar(rng: &mut impl CryptoRngCore) -> Scalar {
    Scalar::random(rng)
}

/// Map 64 uniform bytes onto the scalar field.
pub(crate) fn scalar_from_uniform(bytes: &[u8; 64]) -> Scalar {
    Scalar::from_bytes_mod_order_wide(bytes)
}

/// Multiply the group generator by `scalar`.
pub(crate) fn mul_base(scalar: &Scalar) -> RistrettoPoint {
    RistrettoPoint::mul_base(scalar)
}

/// Decode a canonical 32-byte element encoding.
pub(crate) fn decode_point(bytes: &[u8; POINT_LEN]) -> Result<RistrettoPoint, Error> {
    CompressedRistretto(*bytes).decompress().ok_or(Error::BadKey)
}

/// Diffie-Hellman between a local secret scalar and a peer element.
///
/// The result is the canonical encoding of `scalar * element`, so it
/// commutes: both parties derive the same 32 bytes from their own secret
/// and the other's public element. Returns [`Error::BadKey`] if the
/// product is the identity, which only happens when the peer supplied a
/// degenerate element.
pub(crate) fn dh(scalar: &Scalar, element: &RistrettoPoint) -> Result<SharedSecret, Error> {
    let shared = (scalar * element).compress().to_bytes();
    if bool::from(shared.ct_eq(&[0u8; POINT_LEN])) {
        return Err(Error::BadKey);
    }
    Ok(SharedSecret(shared))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn dh_commutes() {
        let a = random_scalar(&mut OsRng);
        let b = random_scalar(&mut OsRng);
        let a_pub = mul_base(&a);
        let b_pub = mul_base(&b);

        let shared_ab = dh(&a, &b_pub).unwrap();
        let shared_ba = dh(&b, &a_pub).unwrap();
        assert_eq!(shared_ab.as_bytes(), shared_ba.as_bytes());
    }

    #[test]
    fn identity_element_is_rejected() {
        // All zeros is the canonical encoding of the identity; it decodes
        // fine but any DH against it degenerates.
        let identity = decode_point(&[0u8; POINT_LEN]).unwrap();
        let secret = random_scalar(&mut OsRng);
        assert_eq!(dh(&secret, &identity).unwrap_err(), Error::BadKey);
    }

    #[test]
    fn non_canonical_encoding_is_rejected() {
        // Curve25519's field prime leaves high encodings unused; all-ones
        // is not a valid ristretto255 encoding.
        assert_eq!(
            decode_point(&[0xffu8; POINT_LEN]).unwrap_err(),
            Error::BadKey
        );
    }

    #[test]
    fn uniform_reduction_differs_from_truncation() {
        let mut wide = [0u8; 64];
        wide[..32].copy_from_slice(&[0x42u8; 32]);
        wide[32..].copy_from_slice(&[0x24u8; 32]);
        let a = scalar_from_uniform(&wide);

        wide[32..].copy_from_slice(&[0x25u8; 32]);
        let b = scalar_from_uniform(&wide);
        // The upper half must influence the reduced scalar.
        assert_ne!(a, b);
    }
}
