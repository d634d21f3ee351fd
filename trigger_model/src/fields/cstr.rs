use crate::fields::ToBytes;
use std::ffi::{CStr, CString};
use std::io::Write;

impl ToBytes for &CStr {
    fn binary_size(&self) -> usize {
        self.to_bytes().len() + 1
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writer.write_all(self.to_bytes_with_nul())
    }

    fn default_repr() -> impl ToBytes {
        &[] as &[u8]
    }
}

impl ToBytes for CString {
    fn binary_size(&self) -> usize {
        self.as_c_str().binary_size()
    }

    fn write<W: Write>(&self, writer: W) -> std::io::Result<()> {
        self.as_c_str().write(writer)
    }

    fn default_repr() -> impl ToBytes {
        &[] as &[u8]
    }
}

impl ToBytes for &[u8] {
    fn binary_size(&self) -> usize {
        self.len()
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writer.write_all(self)
    }

    fn default_repr() -> impl ToBytes {
        &[] as &[u8]
    }
}

/// Copy a caller-supplied string for storage in an object, rejecting empty strings
pub(crate) fn non_empty(s: &CStr, what: &'static str) -> Result<CString, crate::Error> {
    if s.is_empty() {
        return Err(crate::Error::Invalid(what));
    }
    Ok(s.to_owned())
}

#[cfg(feature = "serde")]
pub mod serde {
    use serde::{Serialize, Serializer};
    use std::ffi::CString;

    /// Lossy UTF-8 in human readable formats, raw bytes (without the NUL) otherwise
    struct CStrRepr<'a>(&'a CString);

    impl Serialize for CStrRepr<'_> {
        fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
            if ser.is_human_readable() {
                ser.serialize_str(&self.0.to_string_lossy())
            } else {
                ser.serialize_bytes(self.0.to_bytes())
            }
        }
    }

    pub mod cstr_option {
        use super::CStrRepr;
        use serde::{Serialize, Serializer};
        use std::ffi::CString;

        pub fn serialize<S: Serializer>(buf: &Option<CString>, ser: S) -> Result<S::Ok, S::Error> {
            buf.as_ref().map(CStrRepr).serialize(ser)
        }
    }

    pub mod cstr_vec {
        use super::CStrRepr;
        use serde::Serializer;
        use std::ffi::CString;

        pub fn serialize<S: Serializer>(bufs: &[CString], ser: S) -> Result<S::Ok, S::Error> {
            ser.collect_seq(bufs.iter().map(CStrRepr))
        }
    }
}
