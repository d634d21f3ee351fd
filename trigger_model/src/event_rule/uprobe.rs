use crate::buffer::BufferView;
use crate::fields::cstr::non_empty;
use crate::fields::{required, wire_len, NoDefault};
use crate::fields::{FromBuffer, FromBytes, FromBytesResult, ToBytes};
use crate::{Error, Validate};
use std::ffi::{CStr, CString};
use std::io::Write;

// name_len, binary_path_len, function_name_len, filter_len (u32 each)
const HEADER_SIZE: usize = 4 * 4;

/// # A rule attaching a user-space probe to a function of an executable or library
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UprobeRule {
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    name: Option<CString>,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    binary_path: Option<CString>,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    function_name: Option<CString>,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    filter_expression: Option<CString>,
}

impl UprobeRule {
    /// Create an empty rule; name and location must be set before it validates
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

    /// Set the probe location: a function in an ELF binary
    pub fn set_location(&mut self, binary_path: &CStr, function_name: &CStr) -> Result<(), Error> {
        let binary_path = non_empty(binary_path, "empty binary path")?;
        let function_name = non_empty(function_name, "empty function name")?;

        self.binary_path = Some(binary_path);
        self.function_name = Some(function_name);
        Ok(())
    }

    /// Get the path of the probed binary
    pub fn binary_path(&self) -> Result<&CStr, Error> {
        self.binary_path.as_deref().ok_or(Error::Unset)
    }

    /// Get the name of the probed function
    pub fn function_name(&self) -> Result<&CStr, Error> {
        self.function_name.as_deref().ok_or(Error::Unset)
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

impl Validate for UprobeRule {
    fn validate(&self) -> bool {
        self.name.is_some() && self.binary_path.is_some() && self.function_name.is_some()
    }
}

impl ToBytes for UprobeRule {
    fn binary_size(&self) -> usize {
        HEADER_SIZE
            + self.name.binary_size()
            + self.binary_path.binary_size()
            + self.function_name.binary_size()
            + self.filter_expression.binary_size()
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let name = required(&self.name, "name")?;
        let binary_path = required(&self.binary_path, "binary_path")?;
        let function_name = required(&self.function_name, "function_name")?;

        wire_len(Some(name))?.write(&mut writer)?;
        wire_len(Some(binary_path))?.write(&mut writer)?;
        wire_len(Some(function_name))?.write(&mut writer)?;
        wire_len(self.filter_expression.as_deref())?.write(&mut writer)?;
        name.write(&mut writer)?;
        binary_path.write(&mut writer)?;
        function_name.write(&mut writer)?;
        self.filter_expression.write(&mut writer)
    }

    fn default_repr() -> impl ToBytes {
        NoDefault
    }
}

impl FromBuffer for UprobeRule {
    fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
        let mut header = view.header(HEADER_SIZE)?;
        let name_len = u32::from_bytes(&mut header)? as usize;
        let binary_path_len = u32::from_bytes(&mut header)? as usize;
        let function_name_len = u32::from_bytes(&mut header)? as usize;
        let filter_len = u32::from_bytes(&mut header)? as usize;

        let mut offset = HEADER_SIZE;
        let name = view.required_cstr_at(offset, name_len, "name")?;
        offset += name_len;
        let binary_path = view.required_cstr_at(offset, binary_path_len, "binary_path")?;
        offset += binary_path_len;
        let function_name = view.required_cstr_at(offset, function_name_len, "function_name")?;
        offset += function_name_len;
        let filter_expression = view.optional_cstr_at(offset, filter_len)?;
        offset += filter_len;

        Ok((
            offset,
            Self {
                name: Some(name),
                binary_path: Some(binary_path),
                function_name: Some(function_name),
                filter_expression,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::UprobeRule;
    use crate::buffer::BufferView;
    use crate::fields::{FromBuffer, ToBytes};
    use crate::{Error, Validate};

    #[test]
    fn test_uprobe_rule() {
        let mut rule = UprobeRule::new();
        rule.set_name(c"malloc_entry").unwrap();
        assert!(!rule.validate());
        assert!(matches!(rule.binary_path(), Err(Error::Unset)));

        assert!(rule.set_location(c"/usr/lib/libc.so.6", c"").is_err());
        assert!(matches!(rule.binary_path(), Err(Error::Unset)));

        rule.set_location(c"/usr/lib/libc.so.6", c"malloc").unwrap();
        rule.set_filter(c"size > 4096").unwrap();
        assert!(rule.validate());

        let mut binary = Vec::new();
        rule.write(&mut binary).unwrap();
        hexdump::hexdump(binary.as_slice());

        let (consumed, loaded) = UprobeRule::from_buffer(&BufferView::new(&binary)).unwrap();
        assert_eq!(consumed, binary.len());
        assert_eq!(loaded, rule);
        assert_eq!(loaded.function_name().unwrap(), c"malloc");
    }
}
