//! Character encodings a stream may be declared in.

use core::fmt;

use either::Either::{self, Left, Right};
use thiserror::Error;

/// An error declaring the encoding of a stream.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EncodingDeclarationError {
    /// The label names no known encoding.
    #[error("Unknown encoding label.")]
    UnknownLabel,
    /// The encoding is known, but text in it cannot be decoded.
    #[error("Encoding {0} cannot be decoded.")]
    Undecodable(&'static str),
}

/// Byte order of a multi-byte code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// A character encoding, with its byte order where applicable.
///
/// The unsuffixed [`Utf16`](Self::Utf16) and [`Utf32`](Self::Utf32) variants
/// leave byte order to a byte-order mark, falling back to big-endian when
/// none is present.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16,
    Utf16Be,
    Utf16Le,
    Utf32,
    Utf32Be,
    Utf32Le,
    /// Any other encoding known to `encoding_rs`, such as Shift_JIS, EUC-JP or
    /// windows-1252.
    Legacy(&'static encoding_rs::Encoding),
}

impl Encoding {
    /// Look up an encoding by label, such as `"utf-8"`, `"utf-32le"` or
    /// `"shift_jis"`.
    ///
    /// Labels are matched as the WHATWG Encoding Standard describes, except
    /// that `"utf-16"` leaves byte order to a byte-order mark. The UTF-32
    /// labels `"utf-32"`, `"utf-32be"` and `"utf-32le"` are also recognized.
    pub fn for_label(label: &str) -> Result<Self, EncodingDeclarationError> {
        let label = label.trim();

        let own = [
            ("utf-16", Self::Utf16),
            ("utf-32", Self::Utf32),
            ("utf-32be", Self::Utf32Be),
            ("utf-32le", Self::Utf32Le),
        ];

        if let Some((_, encoding)) = own.iter().find(|(l, _)| l.eq_ignore_ascii_case(label)) {
            return Ok(*encoding);
        }

        let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
            .ok_or(EncodingDeclarationError::UnknownLabel)?;

        Self::Legacy(encoding).validate()
    }

    /// Check that text in this encoding can be decoded.
    ///
    /// Returns the encoding, normalized so that `encoding_rs` handles for
    /// UTF-8 and the ordered UTF-16 variants become their dedicated variants.
    pub fn validate(self) -> Result<Self, EncodingDeclarationError> {
        let Self::Legacy(encoding) = self else {
            return Ok(self);
        };

        if encoding == encoding_rs::UTF_8 {
            Ok(Self::Utf8)
        } else if encoding == encoding_rs::UTF_16BE {
            Ok(Self::Utf16Be)
        } else if encoding == encoding_rs::UTF_16LE {
            Ok(Self::Utf16Le)
        } else if encoding == encoding_rs::REPLACEMENT {
            Err(EncodingDeclarationError::Undecodable(encoding.name()))
        } else {
            Ok(self)
        }
    }

    /// Fix the byte order of an unordered variant to big-endian.
    ///
    /// Used when a stream carries no byte-order mark.
    pub fn unmarked(self) -> Self {
        match self {
            Self::Utf16 => Self::Utf16Be,
            Self::Utf32 => Self::Utf32Be,
            _ => self,
        }
    }

    /// The means of decoding this encoding: either an `encoding_rs` encoding,
    /// or for UTF-32 (which `encoding_rs` does not support), the byte order of
    /// its code units.
    pub fn decoder(self) -> Either<&'static encoding_rs::Encoding, Endian> {
        match self {
            Self::Utf8 => Left(encoding_rs::UTF_8),
            Self::Utf16 | Self::Utf16Be => Left(encoding_rs::UTF_16BE),
            Self::Utf16Le => Left(encoding_rs::UTF_16LE),
            Self::Utf32 | Self::Utf32Be => Right(Endian::Big),
            Self::Utf32Le => Right(Endian::Little),
            Self::Legacy(encoding) => Left(encoding),
        }
    }

    /// A human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16 => "UTF-16",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf32 => "UTF-32",
            Self::Utf32Be => "UTF-32BE",
            Self::Utf32Le => "UTF-32LE",
            Self::Legacy(encoding) => encoding.name(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
