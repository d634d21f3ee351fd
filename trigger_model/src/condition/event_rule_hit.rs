use crate::buffer::BufferView;
use crate::event_rule::EventRule;
use crate::fields::{FromBuffer, FromBytes, FromBytesError, FromBytesResult, NoDefault, ToBytes};
use crate::Validate;
use std::io::Write;

// length:u32
const HEADER_SIZE: usize = 4;

/// # A condition that becomes true whenever an event rule matches
///
/// The condition owns its rule; dropping the condition drops the rule.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EventRuleHitCondition {
    rule: EventRule,
}

impl EventRuleHitCondition {
    /// Create a condition taking ownership of `rule`
    pub fn new(rule: EventRule) -> Self {
        Self { rule }
    }

    /// Borrow the rule
    pub fn rule(&self) -> &EventRule {
        &self.rule
    }

    /// Take the rule back, consuming the condition
    pub fn into_rule(self) -> EventRule {
        self.rule
    }
}

impl Validate for EventRuleHitCondition {
    fn validate(&self) -> bool {
        self.rule.validate()
    }
}

impl ToBytes for EventRuleHitCondition {
    fn binary_size(&self) -> usize {
        HEADER_SIZE + self.rule.binary_size()
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let length = u32::try_from(self.rule.binary_size()).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "event rule does not fit a 32-bit length field",
            )
        })?;

        length.write(&mut writer)?;
        self.rule.write(writer)
    }

    fn default_repr() -> impl ToBytes {
        NoDefault
    }
}

impl FromBuffer for EventRuleHitCondition {
    fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
        let mut header = view.header(HEADER_SIZE)?;
        let declared = u32::from_bytes(&mut header)? as usize;

        let payload = view.from_view(HEADER_SIZE, None)?;
        let (consumed, rule) = EventRule::from_buffer(&payload)?;
        if consumed != declared {
            log::debug!("event rule hit condition declares {declared} bytes, rule took {consumed}");
            return Err(FromBytesError::LengthMismatch {
                declared,
                actual: consumed,
            });
        }

        Ok((HEADER_SIZE + consumed, Self { rule }))
    }
}
