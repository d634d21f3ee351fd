//! # Conditions
//!
//! A condition is the predicate half of a trigger. The only condition with a wire
//! representation is [`EventRuleHitCondition`], which fires whenever its event rule matches.
//! The remaining [`ConditionType`] tags are recognized on the wire but rejected as unsupported.

use crate::buffer::BufferView;
use crate::event_rule::EventRule;
use crate::fields::{
    append_to, FromBuffer, FromBytes, FromBytesError, FromBytesResult, NoDefault, ToBytes,
};
use crate::{Error, Validate};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::io::Write;

mod event_rule_hit;

pub use event_rule_hit::EventRuleHitCondition;

const HEADER_SIZE: usize = 1;

/// The wire tag of a condition variant
#[non_exhaustive]
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ConditionType {
    /// Not a condition (never appears on the wire)
    Unknown = -1,
    /// Session consumed more than a given amount of buffer space
    SessionConsumedSize = 100,
    /// Buffer usage rose above a threshold
    BufferUsageHigh = 101,
    /// Buffer usage fell below a threshold
    BufferUsageLow = 102,
    /// A session rotation started
    SessionRotationOngoing = 103,
    /// A session rotation finished
    SessionRotationCompleted = 104,
    /// [`EventRuleHitCondition`]
    EventRuleHit = 105,
}

impl ConditionType {
    /// The type of a condition that may be absent
    pub fn of(condition: Option<&Condition>) -> Self {
        condition.map_or(Self::Unknown, Condition::condition_type)
    }
}

/// # A trigger condition
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[non_exhaustive]
pub enum Condition {
    #[allow(missing_docs)]
    EventRuleHit(EventRuleHitCondition),
}

impl Condition {
    /// Create an event rule hit condition
    ///
    /// Fails with [`Error::Invalid`] when no rule is given.
    pub fn event_rule_hit(rule: Option<EventRule>) -> Result<Self, Error> {
        let rule = rule.ok_or(Error::Invalid("event rule hit condition needs a rule"))?;
        Ok(Condition::EventRuleHit(EventRuleHitCondition::new(rule)))
    }

    /// The variant tag of this condition
    pub fn condition_type(&self) -> ConditionType {
        match self {
            Condition::EventRuleHit(_) => ConditionType::EventRuleHit,
        }
    }

    /// Borrow the event rule of an event rule hit condition
    pub fn rule(&self) -> Result<&EventRule, Error> {
        match self {
            Condition::EventRuleHit(condition) => Ok(condition.rule()),
        }
    }

    /// Append the serialized condition to `buf`
    pub fn serialize(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        append_to(self, buf)
    }

    /// Reconstruct a condition from the start of `view`
    ///
    /// Returns the number of bytes consumed along with the condition.
    pub fn create_from_buffer(view: &BufferView<'_>) -> Result<(usize, Self), Error> {
        Ok(Self::from_buffer(view)?)
    }
}

impl Validate for Condition {
    fn validate(&self) -> bool {
        match self {
            Condition::EventRuleHit(condition) => condition.validate(),
        }
    }
}

impl From<EventRuleHitCondition> for Condition {
    fn from(condition: EventRuleHitCondition) -> Self {
        Condition::EventRuleHit(condition)
    }
}

impl ToBytes for Condition {
    fn binary_size(&self) -> usize {
        HEADER_SIZE
            + match self {
                Condition::EventRuleHit(condition) => condition.binary_size(),
            }
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        (self.condition_type() as i8).write(&mut writer)?;
        match self {
            Condition::EventRuleHit(condition) => condition.write(writer),
        }
    }

    fn default_repr() -> impl ToBytes {
        NoDefault
    }
}

impl FromBuffer for Condition {
    fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
        let mut header = view.header(HEADER_SIZE)?;
        let tag = i8::from_bytes(&mut header)?;
        let payload = view.from_view(HEADER_SIZE, None)?;

        match ConditionType::from_i8(tag) {
            Some(ConditionType::EventRuleHit) => {
                let (size, condition) = EventRuleHitCondition::from_buffer(&payload)?;
                Ok((HEADER_SIZE + size, Condition::EventRuleHit(condition)))
            }
            Some(ConditionType::Unknown) | None => {
                log::warn!("Attempted to create condition of unknown type ({tag})");
                Err(FromBytesError::UnknownConditionType(tag))
            }
            Some(other) => {
                log::debug!("Condition type {other:?} has no wire representation");
                Err(FromBytesError::UnsupportedConditionType(other))
            }
        }
    }
}
