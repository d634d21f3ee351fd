//! # Event rules
//!
//! An event rule selects a class of instrumentation points: tracepoints matching a name
//! pattern, system calls, kernel or user-space probes. On the wire each rule is a one-byte
//! [`EventRuleType`] tag followed by the variant's own header and payload.

use crate::buffer::BufferView;
use crate::fields::{
    append_to, FromBuffer, FromBytes, FromBytesError, FromBytesResult, NoDefault, ToBytes,
};
use crate::{Error, Validate};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::io::Write;

mod domain;
mod kprobe;
mod syscall;
mod tracepoint;
mod uprobe;

pub use domain::loglevels;
pub use domain::{DomainType, Loglevel, LoglevelType};
pub use kprobe::KernelProbeRule;
pub use syscall::SyscallRule;
pub use tracepoint::TracepointRule;
pub use uprobe::UprobeRule;

const HEADER_SIZE: usize = 1;

/// The wire tag of an event rule variant
#[non_exhaustive]
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EventRuleType {
    /// Not a rule (never appears on the wire)
    Unknown = -1,
    /// [`TracepointRule`]
    Tracepoint = 100,
    /// [`SyscallRule`]
    Syscall = 101,
    /// [`KernelProbeRule`] on function entry
    Kprobe = 102,
    /// [`KernelProbeRule`] on function return
    Kretprobe = 103,
    /// [`UprobeRule`]
    Uprobe = 104,
}

impl EventRuleType {
    /// The type of a rule that may be absent
    pub fn of(rule: Option<&EventRule>) -> Self {
        rule.map_or(Self::Unknown, EventRule::event_rule_type)
    }
}

/// # An event rule
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[non_exhaustive]
pub enum EventRule {
    #[allow(missing_docs)]
    Tracepoint(TracepointRule),
    #[allow(missing_docs)]
    Syscall(SyscallRule),
    #[allow(missing_docs)]
    Kprobe(KernelProbeRule),
    #[allow(missing_docs)]
    Kretprobe(KernelProbeRule),
    #[allow(missing_docs)]
    Uprobe(UprobeRule),
}

impl EventRule {
    /// The variant tag of this rule
    pub fn event_rule_type(&self) -> EventRuleType {
        match self {
            EventRule::Tracepoint(_) => EventRuleType::Tracepoint,
            EventRule::Syscall(_) => EventRuleType::Syscall,
            EventRule::Kprobe(_) => EventRuleType::Kprobe,
            EventRule::Kretprobe(_) => EventRuleType::Kretprobe,
            EventRule::Uprobe(_) => EventRuleType::Uprobe,
        }
    }

    /// Append the serialized rule to `buf`
    pub fn serialize(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        append_to(self, buf)
    }

    /// Reconstruct a rule from the start of `view`
    ///
    /// Returns the number of bytes consumed along with the rule.
    pub fn create_from_buffer(view: &BufferView<'_>) -> Result<(usize, Self), Error> {
        Ok(Self::from_buffer(view)?)
    }
}

impl Validate for EventRule {
    fn validate(&self) -> bool {
        match self {
            EventRule::Tracepoint(rule) => rule.validate(),
            EventRule::Syscall(rule) => rule.validate(),
            EventRule::Kprobe(rule) | EventRule::Kretprobe(rule) => rule.validate(),
            EventRule::Uprobe(rule) => rule.validate(),
        }
    }
}

impl PartialEq for EventRule {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }

        match (self, other) {
            (EventRule::Tracepoint(a), EventRule::Tracepoint(b)) => a == b,
            (EventRule::Syscall(a), EventRule::Syscall(b)) => a == b,
            (EventRule::Kprobe(a), EventRule::Kprobe(b)) => a == b,
            (EventRule::Kretprobe(a), EventRule::Kretprobe(b)) => a == b,
            (EventRule::Uprobe(a), EventRule::Uprobe(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for EventRule {}

impl ToBytes for EventRule {
    fn binary_size(&self) -> usize {
        HEADER_SIZE
            + match self {
                EventRule::Tracepoint(rule) => rule.binary_size(),
                EventRule::Syscall(rule) => rule.binary_size(),
                EventRule::Kprobe(rule) | EventRule::Kretprobe(rule) => rule.binary_size(),
                EventRule::Uprobe(rule) => rule.binary_size(),
            }
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        (self.event_rule_type() as i8).write(&mut writer)?;
        match self {
            EventRule::Tracepoint(rule) => rule.write(writer),
            EventRule::Syscall(rule) => rule.write(writer),
            EventRule::Kprobe(rule) | EventRule::Kretprobe(rule) => rule.write(writer),
            EventRule::Uprobe(rule) => rule.write(writer),
        }
    }

    fn default_repr() -> impl ToBytes {
        NoDefault
    }
}

impl FromBuffer for EventRule {
    fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
        let mut header = view.header(HEADER_SIZE)?;
        let tag = i8::from_bytes(&mut header)?;
        let payload = view.from_view(HEADER_SIZE, None)?;

        let (size, rule) = match EventRuleType::from_i8(tag) {
            Some(EventRuleType::Tracepoint) => {
                let (size, rule) = TracepointRule::from_buffer(&payload)?;
                (size, EventRule::Tracepoint(rule))
            }
            Some(EventRuleType::Syscall) => {
                let (size, rule) = SyscallRule::from_buffer(&payload)?;
                (size, EventRule::Syscall(rule))
            }
            Some(EventRuleType::Kprobe) => {
                let (size, rule) = KernelProbeRule::from_buffer(&payload)?;
                (size, EventRule::Kprobe(rule))
            }
            Some(EventRuleType::Kretprobe) => {
                let (size, rule) = KernelProbeRule::from_buffer(&payload)?;
                (size, EventRule::Kretprobe(rule))
            }
            Some(EventRuleType::Uprobe) => {
                let (size, rule) = UprobeRule::from_buffer(&payload)?;
                (size, EventRule::Uprobe(rule))
            }
            Some(EventRuleType::Unknown) | None => {
                log::warn!("Attempted to create event rule of unknown type ({tag})");
                return Err(FromBytesError::UnknownEventRuleType(tag));
            }
        };

        Ok((HEADER_SIZE + size, rule))
    }
}

impl From<TracepointRule> for EventRule {
    fn from(rule: TracepointRule) -> Self {
        EventRule::Tracepoint(rule)
    }
}

impl From<SyscallRule> for EventRule {
    fn from(rule: SyscallRule) -> Self {
        EventRule::Syscall(rule)
    }
}

impl From<UprobeRule> for EventRule {
    fn from(rule: UprobeRule) -> Self {
        EventRule::Uprobe(rule)
    }
}
