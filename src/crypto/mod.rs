//! Cryptographic primitives for the handshake.
//!
//! - [`ristretto`]: Diffie-Hellman and scalar helpers over the
//!   ristretto255 prime-order group

pub mod ristretto;
