use crate::fields::{FromBytesError, FromBytesResult};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// The instrumentation source a tracepoint rule applies to
#[non_exhaustive]
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DomainType {
    /// No domain; never valid for a constructed rule
    None = 0,
    /// Linux kernel
    Kernel = 1,
    /// User-space tracer
    Ust = 2,
    /// java.util.logging
    Jul = 3,
    /// Apache log4j
    Log4j = 4,
    /// Python logging
    Python = 5,
}

impl DomainType {
    /// Decode a wire domain tag, accepting only real domains
    pub(crate) fn from_wire(tag: i8) -> FromBytesResult<Self> {
        match Self::from_i8(tag) {
            Some(Self::None) | None => Err(FromBytesError::InvalidDomain(tag)),
            Some(domain) => Ok(domain),
        }
    }
}

/// How a rule's loglevel value is interpreted
#[non_exhaustive]
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LoglevelType {
    /// Match events of every severity
    All = 0,
    /// Match events at least as severe as the value
    Range = 1,
    /// Match events of exactly the value's severity
    Single = 2,
}

/// A loglevel criterion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Loglevel {
    /// Every severity
    #[default]
    All,
    /// Exactly this severity
    Single(i32),
    /// This severity or a more severe one
    Range(i32),
}

impl Loglevel {
    /// The type tag of this criterion
    pub fn loglevel_type(&self) -> LoglevelType {
        match self {
            Loglevel::All => LoglevelType::All,
            Loglevel::Single(_) => LoglevelType::Single,
            Loglevel::Range(_) => LoglevelType::Range,
        }
    }

    /// The severity value, if the criterion has one
    pub fn value(&self) -> Option<i32> {
        match self {
            Loglevel::All => None,
            Loglevel::Single(value) | Loglevel::Range(value) => Some(*value),
        }
    }

    pub(crate) fn from_wire(tag: i8, value: i32) -> FromBytesResult<Self> {
        match LoglevelType::from_i8(tag) {
            Some(LoglevelType::All) => Ok(Loglevel::All),
            Some(LoglevelType::Single) => Ok(Loglevel::Single(value)),
            Some(LoglevelType::Range) => Ok(Loglevel::Range(value)),
            None => Err(FromBytesError::InvalidLoglevelType(tag)),
        }
    }
}

// syslog-style severities, most severe first
#[allow(missing_docs)]
pub mod loglevels {
    pub const LOGLEVEL_EMERG: i32 = 0;
    pub const LOGLEVEL_ALERT: i32 = 1;
    pub const LOGLEVEL_CRIT: i32 = 2;
    pub const LOGLEVEL_ERR: i32 = 3;
    pub const LOGLEVEL_WARNING: i32 = 4;
    pub const LOGLEVEL_NOTICE: i32 = 5;
    pub const LOGLEVEL_INFO: i32 = 6;
    pub const LOGLEVEL_DEBUG_SYSTEM: i32 = 7;
    pub const LOGLEVEL_DEBUG_PROGRAM: i32 = 8;
    pub const LOGLEVEL_DEBUG_PROCESS: i32 = 9;
    pub const LOGLEVEL_DEBUG_MODULE: i32 = 10;
    pub const LOGLEVEL_DEBUG_UNIT: i32 = 11;
    pub const LOGLEVEL_DEBUG_FUNCTION: i32 = 12;
    pub const LOGLEVEL_DEBUG_LINE: i32 = 13;
    pub const LOGLEVEL_DEBUG: i32 = 14;
}
