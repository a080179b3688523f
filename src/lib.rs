#![no_std]

//! A streaming, encoding-aware CSV reader.
//!
//! Furrow reads records from a byte stream of declared (or byte-order-mark
//! confirmed) encoding, one record at a time, without holding the whole
//! document in memory. Quoted fields may contain delimiters, line terminators
//! and doubled quotes; `\n`, `\r` and `\r\n` all end a record.
//!
//! Most users should begin with the [`ReaderBuilder`](avec::ReaderBuilder) in
//! the [`avec`] module. The finite-state machines underneath (encoding
//! resolution and tokenization) are exposed in the [`sans`] module for
//! applications that supply their own IO, such as those running without the
//! standard library.
//!
//! ```
//! let data = b"name,notes\r\nada,\"likes \"\"engines\"\"\"\r\n";
//! let mut reader = furrow::avec::ReaderBuilder::new().from_reader(&data[..])?;
//!
//! while reader.advance()? {
//!     let record = reader.current().unwrap();
//!     println!("{:?}", record.to_vec());
//! }
//! ```
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable the reader-based decoder and record cursor (default).

#[cfg(feature = "std")]
pub mod avec;
pub mod sans;
