use strobe_rs::{SecParam, Strobe};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::Error;
use crate::symmetric_state::{SymmetricState, TAG_LEN};

/// [`SymmetricState`] backed by the STROBE-128/1600 duplex.
///
/// The duplex absorbs everything it emits: ciphertext produced by
/// `encrypt` (and consumed by the peer's `decrypt`) feeds back into the
/// transcript, so there is no separate mix-hash step. Encrypt/decrypt are
/// directional duals — one side's `encrypt` keeps the other side's
/// `decrypt` synchronized, which is exactly how a handshake uses them.
pub struct StrobeState {
    strobe: Strobe,
    keyed: bool,
}

impl SymmetricState for StrobeState {
    const NAME: &'static str = "STROBEv1.0.2";

    fn initialize(customization: &[u8]) -> Self {
        Self {
            strobe: Strobe::new(customization, SecParam::B128),
            keyed: false,
        }
    }

    fn is_keyed(&self) -> bool {
        self.keyed
    }

    fn absorb(&mut self, input: &[u8]) {
        self.strobe.ad(input, false);
    }

    fn absorb_key(&mut self, input: &[u8]) {
        self.strobe.key(input, false);
        self.keyed = true;
    }

    fn squeeze(&mut self, count: usize) -> Vec<u8> {
        let mut output = vec![0u8; count];
        self.strobe.prf(&mut output, false);
        output
    }

    fn encrypt(&mut self, plaintext: &[u8], output: &mut Vec<u8>) {
        assert!(self.keyed, "encrypt on an unkeyed transcript");

        let start = output.len();
        output.extend_from_slice(plaintext);
        self.strobe.send_enc(&mut output[start..], false);

        let mut tag = [0u8; TAG_LEN];
        self.strobe.prf(&mut tag, false);
        output.extend_from_slice(&tag);
    }

    fn decrypt(&mut self, ciphertext: &[u8], output: &mut Vec<u8>) -> Result<(), Error> {
        assert!(self.keyed, "decrypt on an unkeyed transcript");

        if ciphertext.len() < TAG_LEN {
            return Err(Error::BadMessage);
        }
        let (body, tag) = ciphertext.split_at(ciphertext.len() - TAG_LEN);

        // Decrypt into a scratch buffer so a tag mismatch never leaks
        // plaintext to the caller.
        let mut plaintext = Zeroizing::new(body.to_vec());
        self.strobe.recv_enc(plaintext.as_mut_slice(), false);

        let mut expected = [0u8; TAG_LEN];
        self.strobe.prf(&mut expected, false);
        if !bool::from(expected[..].ct_eq(tag)) {
            return Err(Error::CryptoFailed);
        }

        output.extend_from_slice(&plaintext);
        Ok(())
    }

    fn ratchet(&mut self) {
        self.strobe.ratchet(32, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed_pair() -> (StrobeState, StrobeState) {
        let mut sender = StrobeState::initialize(b"test-protocol");
        let mut receiver = StrobeState::initialize(b"test-protocol");
        sender.absorb(b"associated data");
        receiver.absorb(b"associated data");
        sender.absorb_key(b"shared key material");
        receiver.absorb_key(b"shared key material");
        (sender, receiver)
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let (mut sender, mut receiver) = keyed_pair();

        let mut ciphertext = Vec::new();
        sender.encrypt(b"duplex transcript", &mut ciphertext);
        assert_eq!(ciphertext.len(), b"duplex transcript".len() + TAG_LEN);

        let mut plaintext = Vec::new();
        receiver.decrypt(&ciphertext, &mut plaintext).unwrap();
        assert_eq!(plaintext, b"duplex transcript");

        // Both transcripts advanced identically.
        assert_eq!(sender.squeeze(32), receiver.squeeze(32));
    }

    #[test]
    fn empty_plaintext_round_trip() {
        let (mut sender, mut receiver) = keyed_pair();

        let mut ciphertext = Vec::new();
        sender.encrypt(b"", &mut ciphertext);
        assert_eq!(ciphertext.len(), TAG_LEN);

        let mut plaintext = Vec::new();
        receiver.decrypt(&ciphertext, &mut plaintext).unwrap();
        assert!(plaintext.is_empty());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        for bit in 0..8 {
            let (mut sender, mut receiver) = keyed_pair();
            let mut ciphertext = Vec::new();
            sender.encrypt(b"payload", &mut ciphertext);

            ciphertext[2] ^= 1 << bit;
            let mut plaintext = Vec::new();
            let result = receiver.decrypt(&ciphertext, &mut plaintext);
            assert_eq!(result, Err(Error::CryptoFailed));
            assert!(plaintext.is_empty());
        }
    }

    #[test]
    fn tampered_tag_fails() {
        for bit in 0..8 {
            let (mut sender, mut receiver) = keyed_pair();
            let mut ciphertext = Vec::new();
            sender.encrypt(b"payload", &mut ciphertext);

            let last = ciphertext.len() - 1;
            ciphertext[last] ^= 1 << bit;
            let mut plaintext = Vec::new();
            let result = receiver.decrypt(&ciphertext, &mut plaintext);
            assert_eq!(result, Err(Error::CryptoFailed));
            assert!(plaintext.is_empty());
        }
    }

    #[test]
    fn truncated_ciphertext_is_rejected() {
        let (_, mut receiver) = keyed_pair();
        let mut plaintext = Vec::new();
        let result = receiver.decrypt(&[0u8; TAG_LEN - 1], &mut plaintext);
        assert_eq!(result, Err(Error::BadMessage));
    }

    #[test]
    fn divergent_transcripts_fail_decryption() {
        let mut sender = StrobeState::initialize(b"test-protocol");
        let mut receiver = StrobeState::initialize(b"test-protocol");
        sender.absorb(b"context A");
        receiver.absorb(b"context B");
        sender.absorb_key(b"shared key material");
        receiver.absorb_key(b"shared key material");

        let mut ciphertext = Vec::new();
        sender.encrypt(b"payload", &mut ciphertext);
        let mut plaintext = Vec::new();
        assert_eq!(
            receiver.decrypt(&ciphertext, &mut plaintext),
            Err(Error::CryptoFailed)
        );
    }

    #[test]
    fn keyed_flag_is_sticky_and_squeeze_preserves_it() {
        let mut state = StrobeState::initialize(b"test-protocol");
        assert!(!state.is_keyed());

        state.absorb(b"public data");
        assert!(!state.is_keyed());
        state.squeeze(16);
        assert!(!state.is_keyed());

        state.absorb_key(b"key");
        assert!(state.is_keyed());
        state.absorb(b"more public data");
        state.squeeze(16);
        assert!(state.is_keyed());
    }

    #[test]
    fn customization_separates_domains() {
        let mut a = StrobeState::initialize(b"protocol A");
        let mut b = StrobeState::initialize(b"protocol B");
        assert_ne!(a.squeeze(32), b.squeeze(32));
    }

    #[test]
    fn ratchet_changes_future_output() {
        let mut ratcheted = StrobeState::initialize(b"test-protocol");
        let mut control = StrobeState::initialize(b"test-protocol");
        ratcheted.absorb_key(b"key");
        control.absorb_key(b"key");

        ratcheted.ratchet();
        assert_ne!(ratcheted.squeeze(32), control.squeeze(32));
    }

    #[test]
    #[should_panic(expected = "unkeyed transcript")]
    fn encrypt_unkeyed_panics() {
        let mut state = StrobeState::initialize(b"test-protocol");
        state.encrypt(b"plaintext", &mut Vec::new());
    }

    #[test]
    #[should_panic(expected = "unkeyed transcript")]
    fn decrypt_unkeyed_panics() {
        let mut state = StrobeState::initialize(b"test-protocol");
        let _ = state.decrypt(&[0u8; 32], &mut Vec::new());
    }
}
