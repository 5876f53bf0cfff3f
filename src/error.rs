/// Errors produced while running a handshake.
///
/// These all describe adversarial or corrupted input from the peer. Misuse
/// of the API itself (calling operations out of order, omitting a key the
/// chosen pattern requires) is a programming error and panics instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Authenticated decryption failed (tag mismatch). The handshake is
    /// dead; the message was forged or corrupted in transit.
    CryptoFailed,
    /// A group element received from the peer does not decode to a valid
    /// point, or a Diffie-Hellman operation produced the identity.
    BadKey,
    /// The handshake message is malformed or truncated.
    BadMessage,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::CryptoFailed => write!(f, "authenticated decryption failed"),
            Self::BadKey => write!(f, "invalid public key"),
            Self::BadMessage => write!(f, "malformed handshake message"),
        }
    }
}

impl core::error::Error for Error {}
