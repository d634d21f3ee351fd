use crate::buffer::BufferView;
use crate::fields::cstr::non_empty;
use crate::fields::{required, wire_len, NoDefault};
use crate::fields::{FromBuffer, FromBytes, FromBytesResult, ToBytes};
use crate::{Error, Validate};
use std::ffi::{CStr, CString};
use std::io::Write;

// name_len:u32, source_len:u32, filter_len:u32
const HEADER_SIZE: usize = 4 * 3;

/// # A rule attaching a kernel probe
///
/// Used for both function entry probes (kprobes) and function return probes (kretprobes).
/// The `source` is the probe location: either `symbol[+offset]` or a raw `0x` address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KernelProbeRule {
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    name: Option<CString>,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    source: Option<CString>,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    filter_expression: Option<CString>,
}

impl KernelProbeRule {
    /// Create an empty rule; name and source must be set before it validates
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name of the event the probe emits
    pub fn set_name(&mut self, name: &CStr) -> Result<(), Error> {
        self.name = Some(non_empty(name, "empty probe name")?);
        Ok(())
    }

    /// Get the name of the event the probe emits
    pub fn name(&self) -> Result<&CStr, Error> {
        self.name.as_deref().ok_or(Error::Unset)
    }

    /// Set the probe location
    pub fn set_source(&mut self, source: &CStr) -> Result<(), Error> {
        self.source = Some(non_empty(source, "empty probe source")?);
        Ok(())
    }

    /// Get the probe location
    pub fn source(&self) -> Result<&CStr, Error> {
        self.source.as_deref().ok_or(Error::Unset)
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

impl Validate for KernelProbeRule {
    fn validate(&self) -> bool {
        self.name.is_some() && self.source.is_some()
    }
}

impl ToBytes for KernelProbeRule {
    fn binary_size(&self) -> usize {
        HEADER_SIZE
            + self.name.binary_size()
            + self.source.binary_size()
            + self.filter_expression.binary_size()
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let name = required(&self.name, "name")?;
        let source = required(&self.source, "source")?;

        wire_len(Some(name))?.write(&mut writer)?;
        wire_len(Some(source))?.write(&mut writer)?;
        wire_len(self.filter_expression.as_deref())?.write(&mut writer)?;
        name.write(&mut writer)?;
        source.write(&mut writer)?;
        self.filter_expression.write(&mut writer)
    }

    fn default_repr() -> impl ToBytes {
        NoDefault
    }
}

impl FromBuffer for KernelProbeRule {
    fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
        let mut header = view.header(HEADER_SIZE)?;
        let name_len = u32::from_bytes(&mut header)? as usize;
        let source_len = u32::from_bytes(&mut header)? as usize;
        let filter_len = u32::from_bytes(&mut header)? as usize;

        let mut offset = HEADER_SIZE;
        let name = view.required_cstr_at(offset, name_len, "name")?;
        offset += name_len;
        let source = view.required_cstr_at(offset, source_len, "source")?;
        offset += source_len;
        let filter_expression = view.optional_cstr_at(offset, filter_len)?;
        offset += filter_len;

        Ok((
            offset,
            Self {
                name: Some(name),
                source: Some(source),
                filter_expression,
            },
        ))
    }
}
