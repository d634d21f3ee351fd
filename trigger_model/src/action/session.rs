use crate::buffer::BufferView;
use crate::fields::cstr::non_empty;
use crate::fields::{required, wire_len, NoDefault};
use crate::fields::{FromBuffer, FromBytes, FromBytesResult, ToBytes};
use crate::{Error, Validate};
use std::ffi::{CStr, CString};
use std::io::Write;

macro_rules! session_action {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub struct $name {
            #[cfg_attr(
                feature = "serde",
                serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
            )]
            session_name: Option<CString>,
        }

        impl $name {
            /// Create an action with no target session; one must be set before it validates
            pub fn new() -> Self {
                Self::default()
            }

            /// Set the name of the target session
            pub fn set_session_name(&mut self, session_name: &CStr) -> Result<(), Error> {
                self.session_name = Some(non_empty(session_name, "empty session name")?);
                Ok(())
            }

            /// Get the name of the target session
            pub fn session_name(&self) -> Result<&CStr, Error> {
                self.session_name.as_deref().ok_or(Error::Unset)
            }
        }

        impl Validate for $name {
            fn validate(&self) -> bool {
                self.session_name.is_some()
            }
        }

        impl ToBytes for $name {
            fn binary_size(&self) -> usize {
                4 + self.session_name.binary_size()
            }

            fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
                let session_name = required(&self.session_name, "session_name")?;

                wire_len(Some(session_name))?.write(&mut writer)?;
                session_name.write(writer)
            }

            fn default_repr() -> impl ToBytes {
                NoDefault
            }
        }

        impl FromBuffer for $name {
            fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
                let mut header = view.header(4)?;
                let session_name_len = u32::from_bytes(&mut header)? as usize;
                let session_name = view.required_cstr_at(4, session_name_len, "session_name")?;

                Ok((
                    4 + session_name_len,
                    Self {
                        session_name: Some(session_name),
                    },
                ))
            }
        }
    };
}

session_action!(
    /// # Start a tracing session
    StartSessionAction
);

session_action!(
    /// # Stop a tracing session
    StopSessionAction
);

session_action!(
    /// # Rotate the trace chunk of a tracing session
    RotateSessionAction
);

// session_name_len:u32, snapshot_name_len:u32
const SNAPSHOT_HEADER_SIZE: usize = 4 + 4;

/// # Record a snapshot of a tracing session
///
/// The snapshot name is optional. When unset, the session daemon picks one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SnapshotSessionAction {
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    session_name: Option<CString>,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    snapshot_name: Option<CString>,
}

impl SnapshotSessionAction {
    /// Create an action with no target session; one must be set before it validates
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name of the target session
    pub fn set_session_name(&mut self, session_name: &CStr) -> Result<(), Error> {
        self.session_name = Some(non_empty(session_name, "empty session name")?);
        Ok(())
    }

    /// Get the name of the target session
    pub fn session_name(&self) -> Result<&CStr, Error> {
        self.session_name.as_deref().ok_or(Error::Unset)
    }

    /// Set or clear the snapshot name
    pub fn set_snapshot_name(&mut self, snapshot_name: Option<&CStr>) -> Result<(), Error> {
        self.snapshot_name = snapshot_name
            .map(|name| non_empty(name, "empty snapshot name"))
            .transpose()?;
        Ok(())
    }

    /// Get the snapshot name
    pub fn snapshot_name(&self) -> Result<&CStr, Error> {
        self.snapshot_name.as_deref().ok_or(Error::Unset)
    }
}

impl Validate for SnapshotSessionAction {
    fn validate(&self) -> bool {
        self.session_name.is_some()
    }
}

impl ToBytes for SnapshotSessionAction {
    fn binary_size(&self) -> usize {
        SNAPSHOT_HEADER_SIZE + self.session_name.binary_size() + self.snapshot_name.binary_size()
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let session_name = required(&self.session_name, "session_name")?;

        wire_len(Some(session_name))?.write(&mut writer)?;
        wire_len(self.snapshot_name.as_deref())?.write(&mut writer)?;
        session_name.write(&mut writer)?;
        self.snapshot_name.write(writer)
    }

    fn default_repr() -> impl ToBytes {
        NoDefault
    }
}

impl FromBuffer for SnapshotSessionAction {
    fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
        let mut header = view.header(SNAPSHOT_HEADER_SIZE)?;
        let session_name_len = u32::from_bytes(&mut header)? as usize;
        let snapshot_name_len = u32::from_bytes(&mut header)? as usize;

        let mut offset = SNAPSHOT_HEADER_SIZE;
        let session_name = view.required_cstr_at(offset, session_name_len, "session_name")?;
        offset += session_name_len;
        let snapshot_name = view.optional_cstr_at(offset, snapshot_name_len)?;
        offset += snapshot_name_len;

        Ok((
            offset,
            Self {
                session_name: Some(session_name),
                snapshot_name,
            },
        ))
    }
}
