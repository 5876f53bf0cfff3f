//! Asymmetric key material: key pairs, Diffie-Hellman, and Schnorr-style
//! signatures over ristretto255.
//!
//! The signature scheme commits to an ephemeral element `K`, derives the
//! challenge by hashing the signer's public key, `K`, and the message
//! through a [`SymmetricState`], and responds with `t = k + c·x`. Wire
//! form is `encode(K) || encode(t)`, 64 bytes.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRngCore, OsRng};
use zeroize::Zeroize;

use crate::crypto::ristretto::{self, SharedSecret, POINT_LEN};
use crate::error::Error;
use crate::symmetric_state::SymmetricState;

/// Length of a serialized signature: an encoded element plus an encoded
/// scalar.
pub const SIGNATURE_LEN: usize = 64;

/// A ristretto255 public key: a group element with its canonical 32-byte
/// encoding.
#[derive(Clone, Copy)]
pub struct PublicKey {
    element: RistrettoPoint,
    raw: [u8; POINT_LEN],
}

impl PublicKey {
    /// The length of an encoded public key in bytes.
    pub const LEN: usize = POINT_LEN;

    /// Decode a public key from its canonical encoding.
    ///
    /// Only the first 32 bytes are examined. Returns [`Error::BadKey`] if
    /// they are not a valid element encoding.
    ///
    /// # Panics
    ///
    /// If fewer than 32 bytes are supplied.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        assert!(
            bytes.len() >= Self::LEN,
            "a public key encoding requires at least {} bytes",
            Self::LEN
        );
        let mut raw = [0u8; POINT_LEN];
        raw.copy_from_slice(&bytes[..Self::LEN]);
        let element = ristretto::decode_point(&raw)?;
        Ok(Self { element, raw })
    }

    /// The canonical encoding of this public key.
    pub fn as_bytes(&self) -> &[u8; POINT_LEN] {
        &self.raw
    }

    /// Verify a Schnorr-style signature over `message`.
    ///
    /// Accepts iff `generator·t == c·X + K`. Undecodable signature
    /// components verify as `false`, not as errors: a signature is either
    /// valid or it is not.
    ///
    /// # Panics
    ///
    /// If `signature` is shorter than [`SIGNATURE_LEN`] bytes.
    pub fn verify<S: SymmetricState>(&self, signature: &[u8], message: &[u8]) -> bool {
        assert!(
            signature.len() >= SIGNATURE_LEN,
            "a signature requires at least {SIGNATURE_LEN} bytes"
        );

        let ephemeral = match PublicKey::from_bytes(&signature[..POINT_LEN]) {
            Ok(ephemeral) => ephemeral,
            Err(_) => return false,
        };
        let mut t_bytes = [0u8; 32];
        t_bytes.copy_from_slice(&signature[POINT_LEN..SIGNATURE_LEN]);
        let t = match Option::<Scalar>::from(Scalar::from_canonical_bytes(t_bytes)) {
            Some(t) => t,
            None => return false,
        };

        let c = challenge::<S>(self, &ephemeral, message);
        ristretto::mul_base(&t) == c * self.element + ephemeral.element
    }

    pub(crate) fn element(&self) -> &RistrettoPoint {
        &self.element
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for PublicKey {}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.raw
    }
}

impl core::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PublicKey({:02x?})", &self.raw[..4])
    }
}

/// A secret scalar together with its derived public key.
///
/// Generated fresh and uniformly at random; the scalar is never
/// serialized and is zeroized on drop.
#[derive(Clone)]
pub struct SecretKey {
    scalar: Scalar,
    public: PublicKey,
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.scalar.zeroize();
    }
}

impl core::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SecretKey({:?})", self.public)
    }
}

impl SecretKey {
    /// Generate a new key pair using the provided RNG.
    pub fn generate(rng: &mut impl CryptoRngCore) -> Self {
        let scalar = ristretto::random_scalar(rng);
        let element = ristretto::mul_base(&scalar);
        Self {
            scalar,
            public: PublicKey {
                element,
                raw: element.compress().to_bytes(),
            },
        }
    }

    /// Generate a new key pair from the operating system RNG.
    pub fn random() -> Self {
        Self::generate(&mut OsRng)
    }

    /// The public half of this key pair.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Diffie-Hellman between this secret key and a peer public key.
    pub fn diffie_hellman(&self, peer: &PublicKey) -> Result<SharedSecret, Error> {
        ristretto::dh(&self.scalar, peer.element())
    }

    /// Produce a 64-byte signature over `message`.
    pub fn sign<S: SymmetricState>(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.sign_with_rng::<S>(message, &mut OsRng)
    }

    /// Produce a signature with a specific RNG (useful for testing).
    pub fn sign_with_rng<S: SymmetricState>(
        &self,
        message: &[u8],
        rng: &mut impl CryptoRngCore,
    ) -> [u8; SIGNATURE_LEN] {
        let ephemeral = SecretKey::generate(rng);
        let c = challenge::<S>(&self.public, &ephemeral.public, message);
        let t = ephemeral.scalar + c * self.scalar;

        let mut signature = [0u8; SIGNATURE_LEN];
        signature[..POINT_LEN].copy_from_slice(ephemeral.public.as_bytes());
        signature[POINT_LEN..].copy_from_slice(&t.to_bytes());
        signature
    }
}

/// The signature challenge scalar.
///
/// Absorbs the signer's public key, the ephemeral public key, and the
/// message, in that order, then squeezes 64 uniform bytes and reduces
/// them onto the scalar field.
fn challenge<S: SymmetricState>(
    signer: &PublicKey,
    ephemeral: &PublicKey,
    message: &[u8],
) -> Scalar {
    let mut hasher = S::initialize(b"");
    hasher.absorb(signer.as_bytes());
    hasher.absorb(ephemeral.as_bytes());
    hasher.absorb(message);

    let squeezed = hasher.squeeze(64);
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&squeezed);
    ristretto::scalar_from_uniform(&wide)
}
