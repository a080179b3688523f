//! Streaming byte-to-character decoding.

use std::{
    boxed::Box,
    io::{self, Read},
    string::String,
    vec,
};

use either::Either::{Left, Right};
use encoding_rs::DecoderResult;
use zerocopy::byteorder::{BigEndian, LittleEndian, U32};

use crate::sans::{
    Encoding,
    bom::{self, Bom, BomPolicy, Resolution},
    encoding::Endian,
};

use super::reader::Error;

extern crate std;

/// Default capacity of the byte buffer behind [`Chars`].
pub const DEFAULT_CAPACITY: usize = 8 * 1024;

/// A source of characters, produced one at a time until exhausted.
pub trait CharSource {
    /// Produce the next character, or `None` once the source is exhausted.
    fn next_char(&mut self) -> Result<Option<char>, Error>;
}

impl CharSource for core::str::Chars<'_> {
    fn next_char(&mut self) -> Result<Option<char>, Error> {
        Ok(self.next())
    }
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn next_char(&mut self) -> Result<Option<char>, Error> {
        (**self).next_char()
    }
}

/// Characters decoded lazily from a reader.
///
/// Bytes are read into a bounded buffer only once the characters decoded from
/// earlier bytes have been taken.
pub struct Chars<R> {
    reader: R,
    encoding: Encoding,
    bom: Option<Bom>,
    transcoder: Transcoder,

    bytes: Box<[u8]>,
    start: usize,
    end: usize,
    /// Offset in the stream of `bytes[start]`.
    offset: u64,
    eof: bool,
    /// The last decode produced nothing, and more bytes are needed.
    starved: bool,

    text: String,
    cursor: usize,
    malformed: Option<u64>,
    done: bool,
}

impl<R: Read> Chars<R> {
    /// Resolve the encoding of a reader, and begin decoding it.
    ///
    /// Up to four bytes are peeked to find a byte-order mark. Those belonging
    /// to a mark are skipped; the rest are decoded as usual.
    pub fn open(
        mut reader: R,
        declared: Encoding,
        policy: BomPolicy,
        capacity: usize,
    ) -> Result<Self, Error> {
        let declared = declared.validate()?;

        let mut bytes = vec![0; capacity.max(16)].into_boxed_slice();
        let mut end = 0;
        let mut eof = false;

        while end < bom::MAX_LEN && !eof {
            match read(&mut reader, &mut bytes[end..])? {
                0 => eof = true,
                n => end += n,
            }
        }

        let resolution = bom::resolve(declared, &bytes[..end.min(bom::MAX_LEN)], policy)?;
        let Resolution { encoding, bom } = resolution;

        match bom {
            Some(bom) => log::debug!("resolved {encoding} from byte-order mark {bom:?}"),
            None => log::debug!("no byte-order mark, decoding as {encoding}"),
        }

        let skip = resolution.skip();

        Ok(Self {
            reader,
            encoding,
            bom,
            transcoder: Transcoder::new(encoding),
            bytes,
            start: skip,
            end,
            offset: skip as u64,
            eof,
            starved: false,
            text: String::new(),
            cursor: 0,
            malformed: None,
            done: false,
        })
    }

    /// The resolved encoding.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The byte-order mark skipped at the start of the stream, if any.
    pub fn bom(&self) -> Option<Bom> {
        self.bom
    }

    /// Decode the next run of characters into the text buffer.
    fn decode(&mut self) -> Result<(), Error> {
        if !self.eof && (self.start == self.end || self.starved) {
            self.refill()?;
        }

        self.text.clear();
        self.cursor = 0;

        let last = self.eof;
        let src = &self.bytes[self.start..self.end];
        let (read, outcome) = self.transcoder.decode(src, &mut self.text, last);

        self.start += read;
        self.offset += read as u64;
        self.starved = false;

        match outcome {
            Outcome::InputEmpty if last => self.done = true,
            Outcome::InputEmpty => self.starved = self.text.is_empty(),
            Outcome::OutputFull => {}
            Outcome::Malformed { back } => {
                self.malformed = Some(self.offset.saturating_sub(back as u64))
            }
        }

        Ok(())
    }

    /// Move unread bytes to the front of the buffer, and read more after them.
    fn refill(&mut self) -> Result<(), Error> {
        self.bytes.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;

        match read(&mut self.reader, &mut self.bytes[self.end..])? {
            0 => self.eof = true,
            n => self.end += n,
        }

        Ok(())
    }
}

impl<R: Read> CharSource for Chars<R> {
    fn next_char(&mut self) -> Result<Option<char>, Error> {
        loop {
            if let Some(c) = self.text[self.cursor..].chars().next() {
                self.cursor += c.len_utf8();
                return Ok(Some(c));
            }

            // Characters before a malformed sequence are taken first.
            if let Some(offset) = self.malformed.take() {
                self.done = true;
                let encoding = self.encoding;
                Err(Error::Encoding { encoding, offset })?;
            }

            if self.done {
                return Ok(None);
            }

            self.decode()?;
        }
    }
}

/// Read into a buffer, retrying interrupted reads.
fn read(r: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match r.read(buf) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

enum Transcoder {
    Whatwg(encoding_rs::Decoder),
    Utf32(Endian),
}

enum Outcome {
    InputEmpty,
    OutputFull,
    /// A malformed sequence began `back` bytes before the end of those read.
    Malformed { back: usize },
}

impl Transcoder {
    fn new(encoding: Encoding) -> Self {
        match encoding.decoder() {
            Left(encoding) => Self::Whatwg(encoding.new_decoder_without_bom_handling()),
            Right(order) => Self::Utf32(order),
        }
    }

    /// Decode bytes, appending to a string.
    ///
    /// Returns the number of bytes read, and why decoding stopped.
    fn decode(&mut self, src: &[u8], dst: &mut String, last: bool) -> (usize, Outcome) {
        match self {
            Self::Whatwg(decoder) => {
                if let Some(n) = decoder.max_utf8_buffer_length_without_replacement(src.len()) {
                    dst.reserve(n);
                }

                let (result, read) = decoder.decode_to_string_without_replacement(src, dst, last);

                let outcome = match result {
                    DecoderResult::InputEmpty => Outcome::InputEmpty,
                    DecoderResult::OutputFull => Outcome::OutputFull,
                    DecoderResult::Malformed(bad, extra) => Outcome::Malformed {
                        back: bad as usize + extra as usize,
                    },
                };

                (read, outcome)
            }
            Self::Utf32(order) => {
                let mut read = 0;

                while let [b0, b1, b2, b3, ..] = src[read..] {
                    let unit = [b0, b1, b2, b3];
                    let unit = match order {
                        Endian::Big => U32::<BigEndian>::from_bytes(unit).get(),
                        Endian::Little => U32::<LittleEndian>::from_bytes(unit).get(),
                    };

                    let Some(c) = char::from_u32(unit) else {
                        return (read, Outcome::Malformed { back: 0 });
                    };

                    dst.push(c);
                    read += 4;
                }

                // A partial code unit at the end of input.
                if last && read < src.len() {
                    return (read, Outcome::Malformed { back: 0 });
                }

                (read, Outcome::InputEmpty)
            }
        }
    }
}
