use std::ffi::{CStr, CString};
use std::io::Write;

/// Convert a field or object to binary representation
pub trait ToBytes {
    /// Return the number of bytes needed to store the field
    fn binary_size(&self) -> usize;

    /// Write the binary representation to `writer`
    fn write<W: Write>(&self, writer: W) -> std::io::Result<()>;

    /// Return the default representation for the field type
    ///
    /// This is what gets written for an absent optional field. For strings it is an empty
    /// byte slice: absence is encoded as a zero length in the object header. Objects
    /// return [`NoDefault`].
    fn default_repr() -> impl ToBytes;
}

impl<T: ToBytes> ToBytes for Option<T> {
    fn binary_size(&self) -> usize {
        if let Some(inner) = &self {
            inner.binary_size()
        } else {
            Self::default_repr().binary_size()
        }
    }

    fn write<W: Write>(&self, writer: W) -> std::io::Result<()> {
        match self {
            Some(ref val) => val.write(writer),
            None => T::default_repr().write(writer),
        }
    }

    fn default_repr() -> impl ToBytes {
        T::default_repr()
    }
}

/// The default representation of an object that cannot be absent
///
/// Only string fields have an encoding for "not present". Writing a `None` object
/// (e.g. an `Option<Trigger>`) would otherwise produce zero bytes, so it fails instead.
pub struct NoDefault;

impl ToBytes for NoDefault {
    fn binary_size(&self) -> usize {
        0
    }

    fn write<W: Write>(&self, _writer: W) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "object cannot be absent when writing",
        ))
    }

    fn default_repr() -> impl ToBytes {
        Self
    }
}

/// The error returned when writing an object that lacks a required field
///
/// Objects are built incrementally through setters, so a required string may still be unset
/// when somebody tries to serialize it. There is no way to encode that, so writing fails.
pub fn missing_field(name: &'static str) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("required field {name} is not set"),
    )
}

/// Borrow a required string field for writing, failing if it was never set
pub fn required<'a>(field: &'a Option<CString>, name: &'static str) -> std::io::Result<&'a CStr> {
    field.as_deref().ok_or_else(|| missing_field(name))
}

/// The on-wire length of an optional string field (including the NUL, 0 when absent)
pub fn wire_len(field: Option<&CStr>) -> std::io::Result<u32> {
    let len = field.map(|s| s.to_bytes_with_nul().len()).unwrap_or(0);
    u32::try_from(len).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("string of {len} bytes does not fit a 32-bit length field"),
        )
    })
}

/// Serialize an object into a growable buffer
///
/// The buffer is grown once, by the exact size of the object, before anything is written.
/// An allocation failure is reported instead of aborting the process.
pub fn append_to<T: ToBytes + ?Sized>(obj: &T, buf: &mut Vec<u8>) -> Result<(), crate::Error> {
    buf.try_reserve(obj.binary_size())?;
    let start = buf.len();
    if let Err(e) = obj.write(&mut *buf) {
        buf.truncate(start);
        return Err(e.into());
    }
    Ok(())
}
