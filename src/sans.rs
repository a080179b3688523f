//! Internal finite-state machines for implementing readers.
//!
//! This module is intended for applications that need fine control over
//! reader internals, or that run without the standard library. See
//! [`crate::avec`] for implementations covering common reading patterns.
//!
//! # Architecture
//!
//! Reading happens in two stages, neither of which performs IO:
//!
//! - Once, at the start of a stream, up to four bytes are peeked and handed to
//! [`bom::resolve`], which confirms or overrides the declared [`Encoding`] and
//! reports how many of those bytes form a byte-order mark to be skipped.
//!
//! - Afterwards, each decoded character is handed to a [`Tokenizer`]. Calling
//! its `advance` method consumes the tokenizer and returns an optional
//! [`Token`](token::Token) along with a successor: either the next tokenizer,
//! or the terminal [`End`](token::End) token once end of input (`None`) has
//! been fed.
//!
//! Some areas of the reading process are not represented here and must be
//! carefully written by implementers:
//!
//! - Decoding bytes into characters in the resolved encoding.
//!
//! - Accumulating [`Char`](token::Token::Char) tokens into fields, and fields
//! into records, on [`Field`](token::Token::Field) and
//! [`Record`](token::Token::Record) tokens.
//!
//! Implementers are recommended to begin by studying the reader in the
//! [`crate::avec`] module.

pub mod bom;
pub mod encoding;
pub mod token;

pub use encoding::Encoding;

/// Entrypoint to the tokenizing finite-state machine.
pub type Tokenizer = token::Tokenizer;
