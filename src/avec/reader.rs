//! Reader-based record cursor.

use std::io::Read;

use either::Either::{Left, Right};
use thiserror::Error;

use crate::sans::{
    Encoding, Tokenizer,
    bom::{Bom, BomError, BomPolicy},
    encoding::EncodingDeclarationError,
    token::{Dialect, DialectError, Token, TokenizeError},
};

use super::{
    decode::{CharSource, Chars, DEFAULT_CAPACITY},
    record::Record,
};

extern crate std;

/// Errors occurring while reading records.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The declared encoding cannot be decoded.
    #[error("Malformed encoding declaration: {0}")]
    MalformedEncodingDeclaration(#[from] EncodingDeclarationError),
    /// A byte sequence is invalid in the resolved encoding.
    #[error("Invalid {encoding} sequence at byte offset {offset}.")]
    Encoding { encoding: Encoding, offset: u64 },
    /// A record could not be tokenized (strict mode only).
    #[error("Malformed record {record} on line {line}: {reason}.")]
    MalformedRecord {
        record: u64,
        line: u64,
        reason: TokenizeError,
    },
    /// A byte-order mark was required, but none was found.
    #[error("Missing byte-order mark.")]
    MissingByteOrderMark,
    /// A byte-order mark was forbidden, but one was found.
    #[error("Found unexpected byte-order mark ({0:?}).")]
    UnexpectedByteOrderMark(Bom),
    /// The delimiter and quote characters conflict.
    #[error("Invalid dialect: {0}")]
    InvalidDialect(#[from] DialectError),
    /// The reader already failed, and cannot continue.
    #[error("Reader halted by an earlier error.")]
    Halted,
}

impl From<BomError> for Error {
    fn from(err: BomError) -> Self {
        match err {
            BomError::Missing => Self::MissingByteOrderMark,
            BomError::Unexpected(bom) => Self::UnexpectedByteOrderMark(bom),
        }
    }
}

/// Configuration for a [`Reader`].
///
/// ```
/// let reader = ReaderBuilder::new()
///     .delimiter(';')
///     .encoding(Encoding::Utf16)
///     .from_reader(file)?;
/// ```
#[derive(Debug, Clone)]
pub struct ReaderBuilder {
    dialect: Dialect,
    encoding: Encoding,
    bom: BomPolicy,
    capacity: usize,
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            encoding: Encoding::default(),
            bom: BomPolicy::default(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter (default `,`).
    pub fn delimiter(&mut self, delimiter: char) -> &mut Self {
        self.dialect.delimiter = delimiter;
        self
    }

    /// Set the quote character (default `"`).
    pub fn quote(&mut self, quote: char) -> &mut Self {
        self.dialect.quote = quote;
        self
    }

    /// Fail on malformed quoting rather than recovering (default `false`).
    ///
    /// When lenient, characters following a closing quote are appended to the
    /// field, and a quoted field left open at the end of input is closed.
    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.dialect.strict = strict;
        self
    }

    /// Declare the encoding of the stream (default UTF-8).
    ///
    /// A byte-order mark at the start of the stream takes precedence.
    pub fn encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    /// Set whether a byte-order mark may begin the stream (default
    /// [`BomPolicy::Optional`]).
    pub fn bom(&mut self, policy: BomPolicy) -> &mut Self {
        self.bom = policy;
        self
    }

    /// Set the capacity of the byte buffer (default 8 KiB).
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut Self {
        self.capacity = capacity;
        self
    }

    /// Build a reader decoding bytes from a reader.
    ///
    /// The encoding is resolved immediately, peeking up to four bytes.
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<Reader<Chars<R>>, Error> {
        let dialect = self.dialect.validate()?;
        let chars = Chars::open(reader, self.encoding, self.bom, self.capacity)?;

        Ok(Reader::new(chars, dialect))
    }

    /// Build a reader over already-decoded characters.
    ///
    /// The encoding and byte-order mark settings are ignored.
    pub fn from_source<S: CharSource>(&self, source: S) -> Result<Reader<S>, Error> {
        let dialect = self.dialect.validate()?;

        Ok(Reader::new(source, dialect))
    }
}

/// Position of a [`Reader`] in its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// No record has been requested yet.
    NotStarted,
    /// A record is available from [`Reader::current`].
    Positioned,
    /// The stream held no further records.
    Exhausted,
    /// An error ended reading.
    Failed,
}

/// A cursor over the records of a stream.
///
/// Records are produced one at a time by [`advance`](Self::advance), and
/// borrowed through [`current`](Self::current) until the next call.
pub struct Reader<S> {
    source: S,
    tokenizer: Option<Tokenizer>,
    cursor: Cursor,

    current: Record,
    pending: Record,

    records: u64,
    line: u64,
    carriage_return: bool,
}

impl<S: CharSource> Reader<S> {
    fn new(source: S, dialect: Dialect) -> Self {
        Self {
            source,
            tokenizer: Some(Tokenizer::new(dialect)),
            cursor: Cursor::NotStarted,
            current: Record::new(),
            pending: Record::new(),
            records: 0,
            line: 1,
            carriage_return: false,
        }
    }

    /// Move to the next record.
    ///
    /// Returns `true` if a record is available, or `false` once the stream is
    /// exhausted (and on every call thereafter). After an error, every call
    /// fails with [`Error::Halted`].
    pub fn advance(&mut self) -> Result<bool, Error> {
        match self.cursor {
            Cursor::Exhausted => return Ok(false),
            Cursor::Failed => Err(Error::Halted)?,
            Cursor::NotStarted | Cursor::Positioned => {}
        }

        match self.assemble() {
            Ok(true) => {
                core::mem::swap(&mut self.current, &mut self.pending);
                self.pending.clear();
                self.cursor = Cursor::Positioned;
                self.records += 1;

                log::trace!("record {}: {} fields", self.records, self.current.len());
                Ok(true)
            }
            Ok(false) => {
                self.current.clear();
                self.cursor = Cursor::Exhausted;
                Ok(false)
            }
            Err(err) => {
                self.current.clear();
                self.cursor = Cursor::Failed;

                log::debug!("reader failed after {} records: {err}", self.records);
                Err(err)
            }
        }
    }

    /// The record most recently moved to.
    ///
    /// Returns `None` unless the last call to [`advance`](Self::advance)
    /// returned `true`.
    pub fn current(&self) -> Option<&Record> {
        match self.cursor {
            Cursor::Positioned => Some(&self.current),
            _ => None,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Number of records produced so far, and the physical line the reader
    /// has reached (1-based).
    pub fn position(&self) -> (u64, u64) {
        (self.records, self.line)
    }

    /// Borrow the character source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Iterate over owned copies of the remaining records.
    ///
    /// The iterator ends after yielding the first error.
    pub fn records(&mut self) -> Records<'_, S> {
        Records {
            reader: self,
            fused: false,
        }
    }

    /// Feed characters to the tokenizer until it completes a record into the
    /// pending buffer, or reaches the end of input.
    fn assemble(&mut self) -> Result<bool, Error> {
        let Some(mut tokenizer) = self.tokenizer.take() else {
            return Ok(false);
        };

        loop {
            let c = self.source.next_char()?;
            self.count_line(c);

            let (token, successor) =
                tokenizer
                    .advance(c)
                    .map_err(|reason| Error::MalformedRecord {
                        record: self.records + 1,
                        line: self.line,
                        reason,
                    })?;

            let complete = match token {
                Some(Token::Char(c)) => {
                    self.pending.push_char(c);
                    false
                }
                Some(Token::Field) => {
                    self.pending.end_field();
                    false
                }
                Some(Token::Record) => {
                    self.pending.end_field();
                    true
                }
                None => false,
            };

            match successor {
                Left(successor) if complete => {
                    self.tokenizer = Some(successor);
                    return Ok(true);
                }
                Left(successor) => tokenizer = successor,
                Right(_) => return Ok(complete),
            }
        }
    }

    /// Track physical lines, counting `\r\n` once.
    fn count_line(&mut self, c: Option<char>) {
        match c {
            Some('\n') if self.carriage_return => {}
            Some('\n' | '\r') => self.line += 1,
            _ => {}
        }

        self.carriage_return = c == Some('\r');
    }
}

impl<R: Read> Reader<Chars<R>> {
    /// The encoding the stream is decoded with.
    pub fn encoding(&self) -> Encoding {
        self.source.encoding()
    }
}

/// Iterator over owned records, from [`Reader::records`].
pub struct Records<'r, S> {
    reader: &'r mut Reader<S>,
    fused: bool,
}

impl<S: CharSource> Iterator for Records<'_, S> {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }

        match self.reader.advance() {
            Ok(true) => self.reader.current().cloned().map(Ok),
            Ok(false) => None,
            Err(err) => {
                self.fused = true;
                Some(Err(err))
            }
        }
    }
}
