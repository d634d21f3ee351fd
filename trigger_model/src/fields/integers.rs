use crate::fields::{FromBytes, FromBytesError, ToBytes};
use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use std::io::Write;

// object tags
impl FromBytes<'_> for i8 {
    fn from_bytes(buf: &mut &[u8]) -> Result<Self, FromBytesError> {
        Ok(buf.read_i8()?)
    }
}

impl ToBytes for i8 {
    fn binary_size(&self) -> usize {
        1
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writer.write_i8(*self)
    }

    fn default_repr() -> impl ToBytes {
        0i8
    }
}

// lengths, counts and header values
macro_rules! impl_header_int {
    ($ty:ty, $read:ident, $write:ident) => {
        impl FromBytes<'_> for $ty {
            fn from_bytes(buf: &mut &[u8]) -> Result<Self, FromBytesError> {
                Ok(buf.$read::<NativeEndian>()?)
            }
        }

        impl ToBytes for $ty {
            fn binary_size(&self) -> usize {
                std::mem::size_of::<$ty>()
            }

            fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
                writer.$write::<NativeEndian>(*self)
            }

            fn default_repr() -> impl ToBytes {
                0 as $ty
            }
        }
    };
}

impl_header_int!(u32, read_u32, write_u32);
impl_header_int!(i32, read_i32, write_i32);
