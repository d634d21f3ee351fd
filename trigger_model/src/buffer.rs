//! # Bounds-checked views over untrusted bytes
//!
//! Every decoder in this crate reads its input through a [`BufferView`]. A view never owns or
//! copies memory; the borrow checker ties it to the buffer it was made from.

use crate::fields::{FromBytesError, FromBytesResult};
use std::ffi::{CStr, CString};

/// An immutable window over a byte region
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferView<'a> {
    data: &'a [u8],
}

impl<'a> BufferView<'a> {
    /// Create a view covering the whole of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Create a view of `length` bytes of `source`, starting at `offset`
    ///
    /// The caller owns `source` and is trusted to pass a valid range. Use
    /// [`BufferView::from_view`] for ranges derived from untrusted input.
    ///
    /// # Panics
    ///
    /// Panics if `offset + length` exceeds `source.len()`, like a slice index would.
    pub fn init(source: &'a [u8], offset: usize, length: usize) -> Self {
        Self {
            data: &source[offset..offset + length],
        }
    }

    /// Create a sub-view of this view
    ///
    /// `length` of `None` means "everything from `offset` to the end". Fails if the requested
    /// range does not fit entirely inside this view.
    pub fn from_view(&self, offset: usize, length: Option<usize>) -> FromBytesResult<Self> {
        let size = self.data.len();
        let out_of_bounds = || {
            log::warn!(
                "Attempt to create buffer view with invalid range (offset {offset}, length {length:?}, size {size})"
            );
            FromBytesError::OutOfBounds {
                offset,
                length,
                size,
            }
        };

        let rest = self.data.get(offset..).ok_or_else(out_of_bounds)?;
        let data = match length {
            None => rest,
            Some(len) => rest.get(..len).ok_or_else(out_of_bounds)?,
        };

        Ok(Self { data })
    }

    /// The number of bytes in the view
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Is the view empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The viewed bytes
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Check that a NUL-terminated string of a declared length lies inside the view
    ///
    /// `start` is the offset of the first byte of the string within the view and
    /// `len_with_nul` its declared length including the terminator. The check fails when:
    /// - `start` is not inside the view,
    /// - the view does not have `len_with_nul` bytes left from `start`,
    /// - the first NUL byte from `start` is not exactly at `start + len_with_nul - 1`.
    ///
    /// The search for the terminator never reads past the end of the view.
    pub fn validate_string(&self, start: usize, len_with_nul: usize) -> bool {
        self.string_at(start, len_with_nul).is_some()
    }

    fn string_at(&self, start: usize, len_with_nul: usize) -> Option<&'a CStr> {
        if len_with_nul == 0 {
            return None;
        }

        let candidate = self.data.get(start..)?.get(..len_with_nul)?;
        if memchr::memchr(0, candidate)? != len_with_nul - 1 {
            return None;
        }

        CStr::from_bytes_with_nul(candidate).ok()
    }

    /// Return the first `size` bytes of the view, for decoding a fixed-size header
    ///
    /// Decoders call this before touching any variable-length field, so a buffer shorter than
    /// the header is rejected up front.
    pub fn header(&self, size: usize) -> FromBytesResult<&'a [u8]> {
        self.data
            .get(..size)
            .ok_or(FromBytesError::TruncatedField {
                wanted: size,
                got: self.data.len(),
            })
    }

    /// Validate and copy out a NUL-terminated string
    ///
    /// The returned string is owned; nothing borrows from the view afterwards.
    pub fn cstr_at(&self, offset: usize, len_with_nul: usize) -> FromBytesResult<CString> {
        match self.string_at(offset, len_with_nul) {
            Some(s) => Ok(s.to_owned()),
            None => {
                log::debug!(
                    "Rejecting string at offset {offset} with declared length {len_with_nul}"
                );
                Err(FromBytesError::InvalidString {
                    offset,
                    length: len_with_nul,
                })
            }
        }
    }

    /// Decode an optional, non-empty string field: a length of zero means the field is absent
    pub fn optional_cstr_at(
        &self,
        offset: usize,
        len_with_nul: usize,
    ) -> FromBytesResult<Option<CString>> {
        match len_with_nul {
            0 => Ok(None),
            1 => Err(FromBytesError::InvalidString {
                offset,
                length: len_with_nul,
            }),
            len => self.cstr_at(offset, len).map(Some),
        }
    }

    /// Decode a required, non-empty string field
    pub fn required_cstr_at(
        &self,
        offset: usize,
        len_with_nul: usize,
        name: &'static str,
    ) -> FromBytesResult<CString> {
        match len_with_nul {
            0 => Err(FromBytesError::RequiredFieldNotFound(name)),
            1 => Err(FromBytesError::InvalidString {
                offset,
                length: len_with_nul,
            }),
            len => self.cstr_at(offset, len),
        }
    }
}

impl<'a> From<&'a [u8]> for BufferView<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}
