//! The handshake pattern catalogue.
//!
//! A pattern is fixed data: a pair of pre-message tokens naming keys both
//! parties already know before the first message, and one token list per
//! handshake message. Both parties walk the same lists in the same order;
//! the role only decides which side writes a given message and which reads
//! it. Adding a pattern means adding a catalogue entry — the engine itself
//! is pattern-agnostic.

/// A step within a handshake message.
///
/// `E` and `S` transmit the ephemeral/static public key. The two-letter
/// tokens perform a Diffie-Hellman between the named keys, initiator's
/// key first: `Es` is always DH(initiator ephemeral, responder static),
/// no matter which side evaluates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    E,
    S,
    Ee,
    Es,
    Se,
    Ss,
}

/// A key distributed out of band before the handshake starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PreMessageToken {
    /// Defined by the framework, but no catalogued pattern distributes
    /// an ephemeral key out of band.
    #[allow(dead_code)]
    E,
    S,
    None,
}

pub(crate) struct PatternDefinition {
    pub name: &'static str,
    /// Initiator's pre-message token first, then the responder's.
    pub pre_messages: (PreMessageToken, PreMessageToken),
    pub messages: &'static [&'static [Token]],
}

/// The supported handshake patterns.
///
/// Naming follows the Noise convention: one letter per party (initiator
/// first), `N` for no static key, `K` for a static key known to the peer
/// beforehand, `X` for a static key transmitted during the handshake, `I`
/// for a static key transmitted immediately in the first message. The
/// single-letter patterns are one-way: only the initiator sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    N,
    K,
    X,
    NN,
    NK,
    NX,
    KN,
    KK,
    KX,
    XN,
    XK,
    XX,
    IK,
}

pub(crate) fn lookup(pattern: Pattern) -> &'static PatternDefinition {
    match pattern {
        Pattern::N => &NOISE_N,
        Pattern::K => &NOISE_K,
        Pattern::X => &NOISE_X,
        Pattern::NN => &NOISE_NN,
        Pattern::NK => &NOISE_NK,
        Pattern::NX => &NOISE_NX,
        Pattern::KN => &NOISE_KN,
        Pattern::KK => &NOISE_KK,
        Pattern::KX => &NOISE_KX,
        Pattern::XN => &NOISE_XN,
        Pattern::XK => &NOISE_XK,
        Pattern::XX => &NOISE_XX,
        Pattern::IK => &NOISE_IK,
    }
}

use PreMessageToken::{None as NoPre, S as PreS};
use Token::{E, Ee, Es, S, Se, Ss};

//
// One-way patterns
//

const NOISE_N: PatternDefinition = PatternDefinition {
    name: "N",
    pre_messages: (NoPre, PreS),
    messages: &[
        &[E, Es], // ->
    ],
};

const NOISE_K: PatternDefinition = PatternDefinition {
    name: "K",
    pre_messages: (PreS, PreS),
    messages: &[
        &[E, Es, Ss], // ->
    ],
};

const NOISE_X: PatternDefinition = PatternDefinition {
    name: "X",
    pre_messages: (NoPre, PreS),
    messages: &[
        &[E, Es, S, Ss], // ->
    ],
};

//
// Interactive patterns
//

const NOISE_NN: PatternDefinition = PatternDefinition {
    name: "NN",
    pre_messages: (NoPre, NoPre),
    messages: &[
        &[E],     // ->
        &[E, Ee], // <-
    ],
};

const NOISE_NK: PatternDefinition = PatternDefinition {
    name: "NK",
    pre_messages: (NoPre, PreS),
    messages: &[
        &[E, Es], // ->
        &[E, Ee], // <-
    ],
};

const NOISE_NX: PatternDefinition = PatternDefinition {
    name: "NX",
    pre_messages: (NoPre, NoPre),
    messages: &[
        &[E],            // ->
        &[E, Ee, S, Es], // <-
    ],
};

const NOISE_KN: PatternDefinition = PatternDefinition {
    name: "KN",
    pre_messages: (PreS, NoPre),
    messages: &[
        &[E],         // ->
        &[E, Ee, Se], // <-
    ],
};

const NOISE_KK: PatternDefinition = PatternDefinition {
    name: "KK",
    pre_messages: (PreS, PreS),
    messages: &[
        &[E, Es, Ss], // ->
        &[E, Ee, Se], // <-
    ],
};

const NOISE_KX: PatternDefinition = PatternDefinition {
    name: "KX",
    pre_messages: (PreS, NoPre),
    messages: &[
        &[E],                // ->
        &[E, Ee, Se, S, Es], // <-
    ],
};

const NOISE_XN: PatternDefinition = PatternDefinition {
    name: "XN",
    pre_messages: (NoPre, NoPre),
    messages: &[
        &[E],     // ->
        &[E, Ee], // <-
        &[S, Se], // ->
    ],
};

const NOISE_XK: PatternDefinition = PatternDefinition {
    name: "XK",
    pre_messages: (NoPre, PreS),
    messages: &[
        &[E, Es], // ->
        &[E, Ee], // <-
        &[S, Se], // ->
    ],
};

const NOISE_XX: PatternDefinition = PatternDefinition {
    name: "XX",
    pre_messages: (NoPre, NoPre),
    messages: &[
        &[E],            // ->
        &[E, Ee, S, Es], // <-
        &[S, Se],        // ->
    ],
};

const NOISE_IK: PatternDefinition = PatternDefinition {
    name: "IK",
    pre_messages: (NoPre, PreS),
    messages: &[
        &[E, Es, S, Ss], // ->
        &[E, Ee, Se],    // <-
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Pattern; 13] = [
        Pattern::N,
        Pattern::K,
        Pattern::X,
        Pattern::NN,
        Pattern::NK,
        Pattern::NX,
        Pattern::KN,
        Pattern::KK,
        Pattern::KX,
        Pattern::XN,
        Pattern::XK,
        Pattern::XX,
        Pattern::IK,
    ];

    #[test]
    fn names_match_variants() {
        for pattern in ALL {
            assert_eq!(lookup(pattern).name, format!("{:?}", pattern));
        }
    }

    #[test]
    fn one_way_patterns_have_a_single_message() {
        for pattern in [Pattern::N, Pattern::K, Pattern::X] {
            assert_eq!(lookup(pattern).messages.len(), 1);
        }
    }

    #[test]
    fn first_message_always_leads_with_an_ephemeral() {
        for pattern in ALL {
            let definition = lookup(pattern);
            assert!(!definition.messages.is_empty());
            assert_eq!(definition.messages[0][0], Token::E);
        }
    }

    #[test]
    fn each_side_sends_its_keys_at_most_once() {
        for pattern in ALL {
            let definition = lookup(pattern);
            // Even-indexed messages flow from the initiator, odd from the
            // responder.
            for parity in [0, 1] {
                for key_token in [Token::E, Token::S] {
                    let count: usize = definition
                        .messages
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| i % 2 == parity)
                        .flat_map(|(_, tokens)| tokens.iter())
                        .filter(|&&token| token == key_token)
                        .count();
                    assert!(count <= 1, "{}: duplicate key transmission", definition.name);
                }
            }
        }
    }

    #[test]
    fn dh_tokens_only_follow_the_keys_they_name() {
        for pattern in ALL {
            let definition = lookup(pattern);
            let (pre_i, pre_r) = definition.pre_messages;
            // Track which keys are available as the messages are processed.
            let mut initiator_e = false;
            let mut responder_e = false;
            let mut initiator_s = pre_i == PreMessageToken::S;
            let mut responder_s = pre_r == PreMessageToken::S;
            for (i, tokens) in definition.messages.iter().enumerate() {
                let from_initiator = i % 2 == 0;
                for token in *tokens {
                    match token {
                        Token::E if from_initiator => initiator_e = true,
                        Token::E => responder_e = true,
                        Token::S if from_initiator => initiator_s = true,
                        Token::S => responder_s = true,
                        Token::Ee => assert!(initiator_e && responder_e),
                        Token::Es => assert!(initiator_e && responder_s),
                        Token::Se => assert!(initiator_s && responder_e),
                        Token::Ss => assert!(initiator_s && responder_s),
                    }
                }
            }
        }
    }
}
