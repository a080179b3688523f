//! States splitting characters into fields and records.

use either::Either::{self, Left, Right};
use thiserror::Error;

/// Characters with special meaning to the tokenizer, and its handling of
/// malformed quoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Separator between fields (default `,`).
    pub delimiter: char,
    /// Character enclosing a quoted field (default `"`).
    pub quote: char,
    /// Fail on malformed quoting, rather than recovering (default `false`).
    pub strict: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            strict: false,
        }
    }
}

/// An error configuring a dialect.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DialectError {
    /// The delimiter and quote are the same character.
    #[error("Delimiter and quote are both {0:?}.")]
    Ambiguous(char),
    /// The delimiter or quote is a line terminator.
    #[error("{0:?} is a line terminator.")]
    LineTerminator(char),
}

impl Dialect {
    /// Check that no two roles share a character.
    pub fn validate(self) -> Result<Self, DialectError> {
        if self.delimiter == self.quote {
            Err(DialectError::Ambiguous(self.delimiter))?;
        }

        for c in [self.delimiter, self.quote] {
            if c == '\r' || c == '\n' {
                Err(DialectError::LineTerminator(c))?;
            }
        }

        Ok(self)
    }
}

/// An error advancing over malformed quoting, raised in strict mode only.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenizeError {
    /// A closing quote was followed by something other than a delimiter, a
    /// line terminator, or the end of input.
    #[error("unexpected {0:?} after closing quote")]
    StrayCharacter(char),
    /// Input ended inside a quoted field.
    #[error("unterminated quoted field")]
    UnterminatedQuote,
}

/// Output of a single transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Append a character to the current field.
    Char(char),
    /// End the current field; another follows in the same record.
    Field,
    /// End the current field, and with it the record.
    Record,
}

/// Position of the tokenizer within a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// At the start of input, or just past a line terminator. If that
    /// terminator was `\r`, a `\n` immediately following belongs to it.
    AfterRecord { carriage_return: bool },
    /// Just past a delimiter.
    StartOfField,
    InUnquotedField,
    InQuotedField,
    /// Just past a quote inside a quoted field: either an escaped quote or the
    /// end of quoting.
    QuoteInQuotedField,
}

/// State token to split characters into fields and records.
#[derive(Debug)]
pub struct Tokenizer {
    dialect: Dialect,
    state: State,
}

/// Terminal state token, reached once the end of input has been fed.
#[derive(Debug)]
pub struct End(pub(super) ());

impl Tokenizer {
    /// Construct a tokenizer at the start of input.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            state: State::AfterRecord {
                carriage_return: false,
            },
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Transition to another state by consuming a character, or the end of
    /// input (`None`).
    ///
    /// Returns a token, if the character completed one, and a successor state
    /// token. The successor is [`End`] exactly when the end of input was fed.
    pub fn advance(
        self,
        c: Option<char>,
    ) -> Result<(Option<Token>, Either<Tokenizer, End>), TokenizeError> {
        let Some(c) = c else {
            return Ok((self.finish()?, Right(End(()))));
        };

        let (token, state) = self.step(c)?;

        Ok((token, Left(Self { state, ..self })))
    }

    fn step(&self, c: char) -> Result<(Option<Token>, State), TokenizeError> {
        use State::*;

        let Dialect { quote, strict, .. } = self.dialect;

        Ok(match self.state {
            AfterRecord {
                carriage_return: true,
            } if c == '\n' => (
                None,
                AfterRecord {
                    carriage_return: false,
                },
            ),
            AfterRecord { .. } | StartOfField if c == quote => (None, InQuotedField),
            AfterRecord { .. } | StartOfField | InUnquotedField => self.unquoted(c),

            InQuotedField if c == quote => (None, QuoteInQuotedField),
            InQuotedField => (Some(Token::Char(c)), InQuotedField),

            QuoteInQuotedField if c == quote => (Some(Token::Char(quote)), InQuotedField),
            QuoteInQuotedField if self.is_boundary(c) => self.unquoted(c),
            QuoteInQuotedField if strict => Err(TokenizeError::StrayCharacter(c))?,
            // Leniently close quoting and carry on unquoted: `"ab"cd` is `abcd`.
            QuoteInQuotedField => (Some(Token::Char(c)), InUnquotedField),
        })
    }

    /// Transition over a character outside quotes.
    fn unquoted(&self, c: char) -> (Option<Token>, State) {
        match c {
            '\r' => (
                Some(Token::Record),
                State::AfterRecord {
                    carriage_return: true,
                },
            ),
            '\n' => (
                Some(Token::Record),
                State::AfterRecord {
                    carriage_return: false,
                },
            ),
            c if c == self.dialect.delimiter => (Some(Token::Field), State::StartOfField),
            c => (Some(Token::Char(c)), State::InUnquotedField),
        }
    }

    fn is_boundary(&self, c: char) -> bool {
        c == self.dialect.delimiter || c == '\r' || c == '\n'
    }

    fn finish(self) -> Result<Option<Token>, TokenizeError> {
        match self.state {
            // Nothing since the last terminator, so no trailing record.
            State::AfterRecord { .. } => Ok(None),
            State::InQuotedField if self.dialect.strict => Err(TokenizeError::UnterminatedQuote),
            _ => Ok(Some(Token::Record)),
        }
    }
}
