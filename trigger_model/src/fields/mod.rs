//! # Field codecs
//!
//! Fixed-width header integers and NUL-terminated strings, the two building blocks of
//! every object on the wire. Integers use the host's native byte order.

pub(crate) mod cstr;
mod from_bytes;
mod integers;
mod to_bytes;

pub use from_bytes::{FromBuffer, FromBytes, FromBytesError, FromBytesResult};
pub use to_bytes::{NoDefault, ToBytes};
pub(crate) use to_bytes::{append_to, required, wire_len};
