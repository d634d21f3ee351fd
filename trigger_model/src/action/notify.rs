use crate::buffer::BufferView;
use crate::fields::{FromBuffer, FromBytesResult, NoDefault, ToBytes};
use crate::Validate;
use std::io::Write;

/// # Notify subscribed clients that the condition was met
///
/// Carries no payload beyond the action envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NotifyAction;

impl NotifyAction {
    /// Create a notify action
    pub fn new() -> Self {
        Self
    }
}

impl Validate for NotifyAction {}

impl ToBytes for NotifyAction {
    fn binary_size(&self) -> usize {
        0
    }

    fn write<W: Write>(&self, _writer: W) -> std::io::Result<()> {
        Ok(())
    }

    fn default_repr() -> impl ToBytes {
        NoDefault
    }
}

impl FromBuffer for NotifyAction {
    fn from_buffer(_view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
        Ok((0, Self))
    }
}
