use crate::buffer::BufferView;
use crate::fields::cstr::non_empty;
use crate::fields::{required, wire_len, NoDefault};
use crate::fields::{FromBuffer, FromBytes, FromBytesResult, ToBytes};
use crate::{Error, Validate};
use std::ffi::{CStr, CString};
use std::io::Write;

// pattern_len:u32, filter_len:u32
const HEADER_SIZE: usize = 4 + 4;

/// # A rule matching kernel system calls by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SyscallRule {
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    pattern: Option<CString>,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    filter_expression: Option<CString>,
}

impl SyscallRule {
    /// Create an empty rule; a pattern must be set before it validates
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the system call name pattern
    pub fn set_pattern(&mut self, pattern: &CStr) -> Result<(), Error> {
        self.pattern = Some(non_empty(pattern, "empty syscall pattern")?);
        Ok(())
    }

    /// Get the system call name pattern
    pub fn pattern(&self) -> Result<&CStr, Error> {
        self.pattern.as_deref().ok_or(Error::Unset)
    }

    /// Set the filter expression
    pub fn set_filter(&mut self, expression: &CStr) -> Result<(), Error> {
        self.filter_expression = Some(non_empty(expression, "empty filter expression")?);
        Ok(())
    }

    /// Get the filter expression
    pub fn filter(&self) -> Result<&CStr, Error> {
        self.filter_expression.as_deref().ok_or(Error::Unset)
    }
}

impl Validate for SyscallRule {
    fn validate(&self) -> bool {
        self.pattern.is_some()
    }
}

impl ToBytes for SyscallRule {
    fn binary_size(&self) -> usize {
        HEADER_SIZE + self.pattern.binary_size() + self.filter_expression.binary_size()
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let pattern = required(&self.pattern, "pattern")?;

        wire_len(Some(pattern))?.write(&mut writer)?;
        wire_len(self.filter_expression.as_deref())?.write(&mut writer)?;
        pattern.write(&mut writer)?;
        self.filter_expression.write(&mut writer)
    }

    fn default_repr() -> impl ToBytes {
        NoDefault
    }
}

impl FromBuffer for SyscallRule {
    fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
        let mut header = view.header(HEADER_SIZE)?;
        let pattern_len = u32::from_bytes(&mut header)? as usize;
        let filter_len = u32::from_bytes(&mut header)? as usize;

        let mut offset = HEADER_SIZE;
        let pattern = view.required_cstr_at(offset, pattern_len, "pattern")?;
        offset += pattern_len;
        let filter_expression = view.optional_cstr_at(offset, filter_len)?;
        offset += filter_len;

        Ok((
            offset,
            Self {
                pattern: Some(pattern),
                filter_expression,
            },
        ))
    }
}
