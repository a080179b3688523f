//! Convenience interfaces for reading records from streams.
//!
//! _Requires Cargo feature `std`._
//!
//! A [`Reader`] is built by a [`ReaderBuilder`], either from an
//! [`std::io::Read`] of encoded bytes, or from any [`CharSource`] of
//! already-decoded characters. Records are then pulled one at a time:
//!
//! ```
//! let mut reader = ReaderBuilder::new()
//!     .encoding(Encoding::Legacy(encoding_rs::SHIFT_JIS))
//!     .from_reader(std::fs::File::open("prices.csv")?)?;
//!
//! while reader.advance()? {
//!     let record = reader.current().unwrap();
//!     if let Some(name) = record.get(0) {
//!         println!("{name}");
//!     }
//! }
//! ```
//!
//! A record is only borrowed until the next call to
//! [`advance`](Reader::advance), which refills the same buffers. Clone it, or
//! copy its fields with [`Record::to_vec`], to keep it longer.

pub mod decode;
pub mod reader;
pub mod record;

pub use decode::{CharSource, Chars};
pub use reader::{Cursor, Error, Reader, ReaderBuilder, Records};
pub use record::{Fields, Record};
