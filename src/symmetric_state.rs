//! The transcript contract the handshake engine drives.

use crate::error::Error;

/// Length in bytes of the authentication tag appended by [`SymmetricState::encrypt`].
pub const TAG_LEN: usize = 16;

/// An evolving transcript with duplex semantics.
///
/// The same object hashes the transcript and performs authenticated
/// encryption bound to everything absorbed so far. The engine owns one
/// per handshake; the two sides of a handshake each hold an independent
/// copy that stays synchronized only because both absorb the same bytes in
/// the same order.
///
/// Sequencing rules:
///
/// - [`absorb_key`](Self::absorb_key) flips the keyed flag; once set it
///   never clears for the lifetime of the instance.
/// - [`encrypt`](Self::encrypt) and [`decrypt`](Self::decrypt) require the
///   keyed flag. Calling them on an unkeyed transcript is a caller bug and
///   panics.
/// - [`squeeze`](Self::squeeze) leaves the keyed flag untouched.
/// - [`ratchet`](Self::ratchet) irreversibly advances the state: output
///   squeezed before the ratchet cannot be recomputed afterwards.
pub trait SymmetricState {
    /// Name of the construction, used as the final component of protocol
    /// identifiers such as `Noise_XX_ristretto255_<NAME>`.
    const NAME: &'static str;

    /// Derive the initial transcript state, bound to `customization`.
    fn initialize(customization: &[u8]) -> Self;

    /// Whether key material has been absorbed yet.
    fn is_keyed(&self) -> bool;

    /// Mix public data into the transcript.
    fn absorb(&mut self, input: &[u8]);

    /// Mix secret key material into the transcript and set the keyed flag.
    fn absorb_key(&mut self, input: &[u8]);

    /// Produce `count` bytes of transcript-derived output.
    fn squeeze(&mut self, count: usize) -> Vec<u8>;

    /// Encrypt `plaintext` bound to the current transcript, appending the
    /// ciphertext followed by a [`TAG_LEN`]-byte tag to `output`.
    ///
    /// # Panics
    ///
    /// If no key has been absorbed.
    fn encrypt(&mut self, plaintext: &[u8], output: &mut Vec<u8>);

    /// Decrypt `ciphertext` (body plus trailing [`TAG_LEN`]-byte tag),
    /// appending the plaintext to `output`.
    ///
    /// On a tag mismatch nothing is appended, any intermediate plaintext
    /// is zeroed, and [`Error::CryptoFailed`] is returned; the transcript
    /// is no longer usable. Input shorter than a tag is
    /// [`Error::BadMessage`].
    ///
    /// # Panics
    ///
    /// If no key has been absorbed.
    fn decrypt(&mut self, ciphertext: &[u8], output: &mut Vec<u8>) -> Result<(), Error>;

    /// Irreversibly advance the state so prior transcript material cannot
    /// be recomputed from it.
    fn ratchet(&mut self);
}
