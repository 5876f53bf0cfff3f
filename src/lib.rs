#![deny(unsafe_code)]

//! # enoki-handshake
//!
//! A pure, sans-IO implementation of the Noise handshake patterns over
//! ristretto255, with a STROBE duplex as the transcript:
//! `Noise_<pattern>_ristretto255_STROBEv1.0.2`.
//!
//! ## Design
//!
//! - A token-driven engine covers the one-way (`N`, `K`, `X`) and
//!   interactive (`NN` through `XX`, plus `IK`) patterns from a static
//!   catalogue; the engine itself is pattern-agnostic
//! - A single duplex object carries the transcript: ciphertext feeds
//!   back into it as it is produced, and the session key is squeezed
//!   out of it at the end
//! - Schnorr-style signatures built from the same group and duplex
//! - Secret scalars and DH outputs are zeroized on drop
//! - API misuse (wrong call order, missing keys) panics; adversarial
//!   input (forged tags, truncated or undecodable messages) returns
//!   [`Error`]
//!
//! ## Example
//!
//! ```
//! use enoki_handshake::{Handshake, Pattern, Role, SecretKey, StrobeState};
//!
//! // Pattern N: the initiator knows the responder's static key.
//! let responder_static = SecretKey::random();
//!
//! let mut initiator = Handshake::<StrobeState>::new(
//!     Pattern::N,
//!     Role::Initiator,
//!     b"example",
//!     None,
//!     Some(*responder_static.public_key()),
//! );
//! let mut responder = Handshake::<StrobeState>::new(
//!     Pattern::N,
//!     Role::Responder,
//!     b"example",
//!     Some(responder_static),
//!     None,
//! );
//!
//! let message = initiator.write_message(b"hello").unwrap();
//! let payload = responder.read_message(&message).unwrap();
//! assert_eq!(payload, b"hello");
//! assert_eq!(initiator.finalize(), responder.finalize());
//! ```

pub mod crypto;
pub mod error;
pub mod keys;

mod handshake;
mod patterns;
mod strobe_state;
mod symmetric_state;

// Re-export the primary public API
pub use error::Error;
pub use handshake::{Handshake, HandshakeAction, Role, MAX_MESSAGE_LEN, SESSION_KEY_LEN};
pub use keys::{PublicKey, SecretKey, SIGNATURE_LEN};
pub use patterns::Pattern;
pub use strobe_state::StrobeState;
pub use symmetric_state::{SymmetricState, TAG_LEN};
