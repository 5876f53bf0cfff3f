//! The token-driven handshake engine.

use std::collections::VecDeque;

use rand_core::{CryptoRngCore, OsRng};

use crate::crypto::ristretto::SharedSecret;
use crate::error::Error;
use crate::keys::{PublicKey, SecretKey};
use crate::patterns::{self, Pattern, PatternDefinition, PreMessageToken, Token};
use crate::strobe_state::StrobeState;
use crate::symmetric_state::{SymmetricState, TAG_LEN};

/// Largest handshake message in bytes, per the Noise framework.
pub const MAX_MESSAGE_LEN: usize = 65535;

/// Length of the session key derived by [`Handshake::finalize`].
pub const SESSION_KEY_LEN: usize = 32;

/// A static public key is transmitted encrypted, with a trailing tag.
const SEALED_KEY_LEN: usize = PublicKey::LEN + TAG_LEN;

/// Which side of the handshake an engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// The operation the caller must perform next to advance the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Call [`Handshake::write_message`] and send the result to the peer.
    WriteMessage,
    /// Call [`Handshake::read_message`] with the peer's next message.
    ReadMessage,
    /// All messages are exchanged. Call [`Handshake::finalize`].
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Write,
    Read,
}

/// One side of a Noise handshake.
///
/// Construct one instance per party per handshake attempt, then alternate
/// `write_message` on one side with `read_message` on the other until the
/// pattern's messages are exhausted, and `finalize` both. The protocol
/// identifier (`Noise_<pattern>_ristretto255_<state>`) is derived
/// internally and bound to the transcript, so two engines only agree if
/// they agree on the pattern, the symmetric state, and the prologue.
///
/// Misuse — writing when a read is due, omitting a key the pattern
/// requires, finalizing with messages still pending — panics: the engine
/// would otherwise continue in an undefined protocol state. Adversarial
/// input surfaces as [`Error`] and leaves the handshake unusable.
pub struct Handshake<S: SymmetricState = StrobeState> {
    role: Role,
    e: Option<SecretKey>,
    s: Option<SecretKey>,
    re: Option<PublicKey>,
    rs: Option<PublicKey>,
    symmetric: S,
    pending: VecDeque<&'static [Token]>,
    next_operation: Operation,
}

impl<S: SymmetricState> Handshake<S> {
    /// Construct one side of a handshake.
    ///
    /// `prologue` binds arbitrary caller context into the transcript:
    /// parties that disagree on it fail authentication later rather than
    /// erroring here. `local_static` and `remote_static` supply the keys
    /// the pattern's pre-messages (and `s`/`ss`-style tokens) need;
    /// patterns that transmit keys in-line learn them during the
    /// handshake instead.
    ///
    /// # Panics
    ///
    /// If a pre-message of the pattern names a key that was not supplied.
    pub fn new(
        pattern: Pattern,
        role: Role,
        prologue: &[u8],
        local_static: Option<SecretKey>,
        remote_static: Option<PublicKey>,
    ) -> Self {
        let definition = patterns::lookup(pattern);
        let protocol_name = format!("Noise_{}_ristretto255_{}", definition.name, S::NAME);

        let mut symmetric = S::initialize(protocol_name.as_bytes());
        symmetric.absorb(prologue);

        let mut handshake = Self {
            role,
            e: None,
            s: local_static,
            re: None,
            rs: remote_static,
            symmetric,
            pending: definition.messages.iter().copied().collect(),
            next_operation: match role {
                Role::Initiator => Operation::Write,
                Role::Responder => Operation::Read,
            },
        };
        handshake.absorb_pre_messages(definition);
        handshake
    }

    /// Absorb the pre-message public keys, initiator's first, then the
    /// responder's — the same order on both sides, each side reading the
    /// key from its own perspective.
    fn absorb_pre_messages(&mut self, definition: &PatternDefinition) {
        let (initiator_pre, responder_pre) = definition.pre_messages;
        match self.role {
            Role::Initiator => {
                self.absorb_local_pre_message(initiator_pre);
                self.absorb_remote_pre_message(responder_pre);
            }
            Role::Responder => {
                self.absorb_remote_pre_message(initiator_pre);
                self.absorb_local_pre_message(responder_pre);
            }
        }
    }

    fn absorb_local_pre_message(&mut self, token: PreMessageToken) {
        let key = match token {
            PreMessageToken::E => &self.e,
            PreMessageToken::S => &self.s,
            PreMessageToken::None => return,
        };
        let raw = *key
            .as_ref()
            .expect("pattern pre-message names a local key that was not supplied")
            .public_key()
            .as_bytes();
        self.symmetric.absorb(&raw);
    }

    fn absorb_remote_pre_message(&mut self, token: PreMessageToken) {
        let key = match token {
            PreMessageToken::E => &self.re,
            PreMessageToken::S => &self.rs,
            PreMessageToken::None => return,
        };
        let raw = *key
            .as_ref()
            .expect("pattern pre-message names a peer key that was not supplied")
            .as_bytes();
        self.symmetric.absorb(&raw);
    }

    /// Produce the next handshake message, consuming the next token list.
    ///
    /// `payload` is optional application data appended to the message; it
    /// is encrypted under the current transcript and may only be non-empty
    /// once a DH token has keyed the transcript.
    ///
    /// # Panics
    ///
    /// If the next operation is a read, the message queue is exhausted, a
    /// token names a key that is missing or already set, or a payload is
    /// supplied before the transcript is keyed.
    pub fn write_message(&mut self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        self.write_message_with_rng(payload, &mut OsRng)
    }

    /// Write the next handshake message with a specific RNG (useful for
    /// testing).
    pub fn write_message_with_rng(
        &mut self,
        payload: &[u8],
        rng: &mut impl CryptoRngCore,
    ) -> Result<Vec<u8>, Error> {
        assert_eq!(
            self.next_operation,
            Operation::Write,
            "next handshake operation is a read"
        );
        let tokens = self
            .pending
            .pop_front()
            .expect("all handshake messages already exchanged");

        let mut message = Vec::with_capacity(self.message_overhead(tokens) + payload.len());
        for &token in tokens {
            match token {
                Token::E => {
                    assert!(self.e.is_none(), "local ephemeral key already generated");
                    let e = SecretKey::generate(rng);
                    let raw = *e.public_key().as_bytes();
                    message.extend_from_slice(&raw);
                    self.symmetric.absorb(&raw);
                    self.e = Some(e);
                }
                Token::S => {
                    let raw = *self
                        .s
                        .as_ref()
                        .expect("pattern transmits a local static key that was not supplied")
                        .public_key()
                        .as_bytes();
                    self.symmetric.encrypt(&raw, &mut message);
                }
                _ => {
                    let shared = self.token_dh(token)?;
                    self.symmetric.absorb_key(shared.as_bytes());
                }
            }
        }

        if !payload.is_empty() {
            self.symmetric.encrypt(payload, &mut message);
        }

        self.next_operation = Operation::Read;
        Ok(message)
    }

    /// Consume the peer's next handshake message, returning its decrypted
    /// payload (empty if the peer sent none).
    ///
    /// Any error is fatal to the handshake: a failed read leaves the
    /// engine unusable.
    ///
    /// # Panics
    ///
    /// If the next operation is a write, the message queue is exhausted,
    /// or a token would re-set an already-known remote key.
    pub fn read_message(&mut self, message: &[u8]) -> Result<Vec<u8>, Error> {
        assert_eq!(
            self.next_operation,
            Operation::Read,
            "next handshake operation is a write"
        );
        let tokens = self
            .pending
            .pop_front()
            .expect("all handshake messages already exchanged");

        let mut input = message;
        for &token in tokens {
            match token {
                Token::E => {
                    assert!(self.re.is_none(), "remote ephemeral key already set");
                    if input.len() < PublicKey::LEN {
                        return Err(Error::BadMessage);
                    }
                    let re = PublicKey::from_bytes(&input[..PublicKey::LEN])?;
                    input = &input[PublicKey::LEN..];
                    self.symmetric.absorb(re.as_bytes());
                    self.re = Some(re);
                }
                Token::S => {
                    assert!(self.rs.is_none(), "remote static key already set");
                    if input.len() < SEALED_KEY_LEN {
                        return Err(Error::BadMessage);
                    }
                    let mut raw = Vec::with_capacity(PublicKey::LEN);
                    self.symmetric.decrypt(&input[..SEALED_KEY_LEN], &mut raw)?;
                    input = &input[SEALED_KEY_LEN..];
                    self.rs = Some(PublicKey::from_bytes(&raw)?);
                }
                _ => {
                    let shared = self.token_dh(token)?;
                    self.symmetric.absorb_key(shared.as_bytes());
                }
            }
        }

        let mut payload = Vec::new();
        if !input.is_empty() {
            // An unkeyed message cannot carry a payload, so trailing bytes
            // here are not decryptable input.
            if !self.symmetric.is_keyed() {
                return Err(Error::BadMessage);
            }
            self.symmetric.decrypt(input, &mut payload)?;
        }

        self.next_operation = Operation::Write;
        Ok(payload)
    }

    /// Derive the 32-byte session key, consuming the handshake.
    ///
    /// Both sides derive the same key after processing the same messages.
    /// The transcript is ratcheted after the key is squeezed, so the key
    /// cannot be recomputed from any state that outlives this call.
    ///
    /// # Panics
    ///
    /// If handshake messages remain unprocessed.
    pub fn finalize(mut self) -> [u8; SESSION_KEY_LEN] {
        assert!(
            self.pending.is_empty(),
            "handshake messages remain unprocessed"
        );

        let squeezed = self.symmetric.squeeze(SESSION_KEY_LEN);
        self.symmetric.ratchet();

        let mut key = [0u8; SESSION_KEY_LEN];
        key.copy_from_slice(&squeezed);
        key
    }

    /// The action the caller must take to advance the handshake.
    pub fn next_action(&self) -> HandshakeAction {
        if self.pending.is_empty() {
            HandshakeAction::Complete
        } else {
            match self.next_operation {
                Operation::Write => HandshakeAction::WriteMessage,
                Operation::Read => HandshakeAction::ReadMessage,
            }
        }
    }

    /// Bytes the next handshake message occupies beyond its payload: the
    /// fixed size of each remaining token in that message, plus the
    /// payload tag once the transcript is (or becomes) keyed within it.
    /// Zero when the message exchange is complete.
    pub fn next_message_overhead(&self) -> usize {
        match self.pending.front() {
            Some(tokens) => self.message_overhead(tokens),
            None => 0,
        }
    }

    /// Largest payload the next message can carry within the
    /// [`MAX_MESSAGE_LEN`] ceiling.
    pub fn next_maximum_payload_length(&self) -> usize {
        MAX_MESSAGE_LEN - self.next_message_overhead()
    }

    fn message_overhead(&self, tokens: &[Token]) -> usize {
        let mut keyed = self.symmetric.is_keyed();
        let mut overhead = 0;
        for &token in tokens {
            overhead += match token {
                Token::E => PublicKey::LEN,
                Token::S => SEALED_KEY_LEN,
                _ => {
                    keyed = true;
                    0
                }
            };
        }
        if keyed {
            overhead + TAG_LEN
        } else {
            overhead
        }
    }

    /// Which side this engine drives.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether this side initiated the handshake.
    pub fn is_initiator(&self) -> bool {
        self.role == Role::Initiator
    }

    /// Public half of the local static key, if one was supplied.
    pub fn local_static_key(&self) -> Option<&PublicKey> {
        self.s.as_ref().map(SecretKey::public_key)
    }

    /// The peer's static public key: supplied at construction for `K`-
    /// and pre-shared patterns, learned in-line for `X`-style patterns,
    /// absent otherwise.
    pub fn remote_static_key(&self) -> Option<&PublicKey> {
        self.rs.as_ref()
    }

    /// Resolve a DH token to key material. `es` and `se` name the
    /// initiator's key first, so which one maps onto the local ephemeral
    /// depends on the role; write and read consult the same rule.
    fn token_dh(&self, token: Token) -> Result<SharedSecret, Error> {
        let (local, remote) = match (token, self.role) {
            (Token::Ee, _) => (&self.e, &self.re),
            (Token::Ss, _) => (&self.s, &self.rs),
            (Token::Es, Role::Initiator) | (Token::Se, Role::Responder) => (&self.e, &self.rs),
            (Token::Es, Role::Responder) | (Token::Se, Role::Initiator) => (&self.s, &self.re),
            (Token::E | Token::S, _) => unreachable!("not a DH token"),
        };
        let local = local
            .as_ref()
            .expect("pattern performs a DH with a local key that was not supplied");
        let remote = remote
            .as_ref()
            .expect("pattern performs a DH with a peer key that is not yet known");
        local.diffie_hellman(remote)
    }
}
