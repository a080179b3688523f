//! Byte-order mark detection and encoding resolution.

use thiserror::Error;

use super::encoding::Encoding;

/// The most bytes a byte-order mark may span, and so the number of bytes to
/// peek before resolving.
pub const MAX_LEN: usize = 4;

/// A byte-order mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bom {
    Utf8,
    Utf16Be,
    Utf16Le,
    Utf32Be,
    Utf32Le,
}

impl Bom {
    /// Marks in the order they must be tested: the UTF-32LE mark begins with
    /// the UTF-16LE mark.
    const PRECEDENCE: [Bom; 5] = [
        Bom::Utf32Be,
        Bom::Utf32Le,
        Bom::Utf8,
        Bom::Utf16Be,
        Bom::Utf16Le,
    ];

    /// The bytes forming this mark.
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Bom::Utf8 => &[0xEF, 0xBB, 0xBF],
            Bom::Utf16Be => &[0xFE, 0xFF],
            Bom::Utf16Le => &[0xFF, 0xFE],
            Bom::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
            Bom::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
        }
    }

    #[allow(clippy::len_without_is_empty)]
    pub const fn len(self) -> usize {
        self.as_bytes().len()
    }

    /// The encoding this mark identifies.
    pub const fn encoding(self) -> Encoding {
        match self {
            Bom::Utf8 => Encoding::Utf8,
            Bom::Utf16Be => Encoding::Utf16Be,
            Bom::Utf16Le => Encoding::Utf16Le,
            Bom::Utf32Be => Encoding::Utf32Be,
            Bom::Utf32Le => Encoding::Utf32Le,
        }
    }

    /// Find the mark beginning a prefix of a stream, if any.
    ///
    /// The prefix should hold [`MAX_LEN`] bytes, unless the stream is shorter.
    pub fn detect(prefix: &[u8]) -> Option<Bom> {
        Self::PRECEDENCE
            .into_iter()
            .find(|bom| prefix.starts_with(bom.as_bytes()))
    }
}

/// Whether a stream must, may, or must not begin with a byte-order mark.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BomPolicy {
    /// Honor a mark if present (default).
    #[default]
    Optional,
    /// Fail unless a mark is present.
    Required,
    /// Fail if a mark is present.
    Forbidden,
}

/// An error resolving the encoding of a stream.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BomError {
    /// A mark was required, but none was found.
    #[error("Missing byte-order mark.")]
    Missing,
    /// A mark was forbidden, but one was found.
    #[error("Found unexpected byte-order mark ({0:?}).")]
    Unexpected(Bom),
}

/// The outcome of resolving the encoding of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// The encoding to decode the remainder of the stream with.
    pub encoding: Encoding,
    /// The mark found, whose bytes must be skipped.
    pub bom: Option<Bom>,
}

impl Resolution {
    /// Number of peeked bytes belonging to the mark.
    pub fn skip(&self) -> usize {
        self.bom.map_or(0, Bom::len)
    }
}

/// Resolve the encoding of a stream from its declared encoding and a peeked
/// prefix.
///
/// A mark is authoritative, overriding the declared encoding even where their
/// families differ. Without one, the declared encoding stands (with byte order
/// fixed to big-endian if left open).
pub fn resolve(
    declared: Encoding,
    prefix: &[u8],
    policy: BomPolicy,
) -> Result<Resolution, BomError> {
    let bom = Bom::detect(prefix);

    match (bom, policy) {
        (None, BomPolicy::Required) => Err(BomError::Missing)?,
        (Some(bom), BomPolicy::Forbidden) => Err(BomError::Unexpected(bom))?,
        _ => {}
    }

    let encoding = match bom {
        Some(bom) => bom.encoding(),
        None => declared.unmarked(),
    };

    Ok(Resolution { encoding, bom })
}
