//! # Triggers
//!
//! A trigger pairs a [`Condition`] with the [`Action`] to run when the condition is met.
//! Several serialized triggers can be stored back to back in one buffer; [`Trigger::scan`]
//! walks such a buffer.

use crate::action::Action;
use crate::buffer::BufferView;
use crate::condition::Condition;
use crate::fields::{
    append_to, FromBuffer, FromBytes, FromBytesError, FromBytesResult, NoDefault, ToBytes,
};
use crate::{Error, Validate};
use std::io::Write;
use std::iter::FusedIterator;

// length:u32
const HEADER_SIZE: usize = 4;

/// # A condition and the action it triggers
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Trigger {
    condition: Condition,
    action: Action,
}

impl Trigger {
    /// Create a trigger, taking ownership of both halves
    pub fn new(condition: Condition, action: Action) -> Self {
        Self { condition, action }
    }

    /// Borrow the condition
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Borrow the action
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Split the trigger into its condition and action
    pub fn into_parts(self) -> (Condition, Action) {
        (self.condition, self.action)
    }

    /// Append the serialized trigger to `buf`
    pub fn serialize(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        append_to(self, buf)
    }

    /// Reconstruct a trigger from the start of `view`
    ///
    /// Returns the number of bytes consumed along with the trigger.
    pub fn create_from_buffer(view: &BufferView<'_>) -> Result<(usize, Self), Error> {
        Ok(Self::from_buffer(view)?)
    }

    /// Iterate over the triggers stored back to back in `buf`
    ///
    /// Each item carries the raw bytes of one trigger along with the decoded value. The
    /// iterator ends at the end of the buffer or right after yielding the first error.
    pub fn scan(buf: &[u8]) -> TriggerScanner<'_> {
        TriggerScanner {
            view: BufferView::new(buf),
            offset: 0,
            failed: false,
        }
    }
}

impl Validate for Trigger {
    fn validate(&self) -> bool {
        if let Action::Group(group) = &self.action {
            if group.is_empty() {
                return false;
            }
        }

        self.condition.validate() && self.action.validate()
    }
}

impl ToBytes for Trigger {
    fn binary_size(&self) -> usize {
        HEADER_SIZE + self.condition.binary_size() + self.action.binary_size()
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let length = self.condition.binary_size() + self.action.binary_size();
        let length = u32::try_from(length).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("trigger of {length} bytes does not fit a 32-bit length field"),
            )
        })?;

        length.write(&mut writer)?;
        self.condition.write(&mut writer)?;
        self.action.write(writer)
    }

    fn default_repr() -> impl ToBytes {
        NoDefault
    }
}

impl FromBuffer for Trigger {
    fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
        let mut header = view.header(HEADER_SIZE)?;
        let declared = u32::from_bytes(&mut header)? as usize;

        let payload = view.from_view(HEADER_SIZE, None)?;
        let (condition_size, condition) = Condition::from_buffer(&payload)?;
        let (action_size, action) = Action::from_buffer(&payload.from_view(condition_size, None)?)?;

        let consumed = condition_size + action_size;
        if consumed != declared {
            log::debug!("trigger declares {declared} bytes, condition and action took {consumed}");
            return Err(FromBytesError::LengthMismatch {
                declared,
                actual: consumed,
            });
        }

        Ok((HEADER_SIZE + consumed, Self { condition, action }))
    }
}

/// An iterator over consecutive serialized triggers, see [`Trigger::scan`]
#[derive(Debug, Clone)]
pub struct TriggerScanner<'a> {
    view: BufferView<'a>,
    offset: usize,
    failed: bool,
}

impl TriggerScanner<'_> {
    /// The offset of the next trigger in the scanned buffer
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for TriggerScanner<'a> {
    type Item = Result<(&'a [u8], Trigger), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.view.size() {
            return None;
        }

        let decoded = self
            .view
            .from_view(self.offset, None)
            .and_then(|rest| Trigger::from_buffer(&rest));

        match decoded {
            Ok((size, trigger)) => {
                let raw = &self.view.as_bytes()[self.offset..self.offset + size];
                self.offset += size;
                Some(Ok((raw, trigger)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e.into()))
            }
        }
    }
}

impl FusedIterator for TriggerScanner<'_> {}

#[cfg(test)]
mod tests {
    use super::Trigger;
    use crate::action::{Action, ActionGroup, NotifyAction, RotateSessionAction};
    use crate::buffer::BufferView;
    use crate::condition::Condition;
    use crate::event_rule::{EventRule, KernelProbeRule, SyscallRule};
    use crate::fields::{FromBuffer, FromBytesError, ToBytes};
    use crate::{Error, Validate};

    fn syscall_trigger(pattern: &std::ffi::CStr) -> Trigger {
        let mut rule = SyscallRule::new();
        rule.set_pattern(pattern).unwrap();
        let condition = Condition::event_rule_hit(Some(rule.into())).unwrap();
        Trigger::new(condition, NotifyAction::new().into())
    }

    #[test]
    fn test_trigger() {
        let trigger = syscall_trigger(c"openat");
        assert!(trigger.validate());

        let mut binary = Vec::new();
        trigger.serialize(&mut binary).unwrap();
        hexdump::hexdump(binary.as_slice());
        assert_eq!(binary.len(), trigger.binary_size());
        assert_eq!(&binary[0..4], &((binary.len() - 4) as u32).to_ne_bytes());

        let (consumed, loaded) = Trigger::create_from_buffer(&BufferView::new(&binary)).unwrap();
        assert_eq!(consumed, binary.len());
        assert_eq!(loaded, trigger);
    }

    #[test]
    fn test_absent_trigger_is_not_written() {
        let absent: Option<Trigger> = None;
        let mut binary = Vec::new();
        let err = absent.write(&mut binary).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert!(binary.is_empty());

        let absent: Option<Action> = None;
        assert!(matches!(
            crate::fields::append_to(&absent, &mut binary),
            Err(Error::Io(_))
        ));
        assert!(binary.is_empty());

        let present = Some(syscall_trigger(c"openat"));
        present.write(&mut binary).unwrap();
        assert_eq!(binary.len(), present.binary_size());
    }

    #[test]
    fn test_empty_group_is_rejected() {
        let group = ActionGroup::new();
        assert!(group.validate());

        let trigger = Trigger::new(
            syscall_trigger(c"openat").condition().clone(),
            group.into(),
        );
        assert!(!trigger.validate());

        let (condition, mut action) = trigger.into_parts();
        action.add_action(NotifyAction::new().into()).unwrap();
        assert!(Trigger::new(condition, action).validate());
    }

    #[test]
    fn test_invalid_condition() {
        let mut rule = KernelProbeRule::new();
        rule.set_name(c"probe").unwrap();
        let condition = Condition::event_rule_hit(Some(EventRule::Kprobe(rule))).unwrap();

        let mut rotate = RotateSessionAction::new();
        rotate.set_session_name(c"my_session").unwrap();

        assert!(!Trigger::new(condition, rotate.into()).validate());
    }

    #[test]
    fn test_length_mismatch() {
        let trigger = syscall_trigger(c"openat");
        let mut binary = Vec::new();
        trigger.serialize(&mut binary).unwrap();
        binary[0..4].copy_from_slice(&3u32.to_ne_bytes());

        assert!(matches!(
            Trigger::from_buffer(&BufferView::new(&binary)),
            Err(FromBytesError::LengthMismatch {
                declared: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_scan() {
        let triggers = [
            syscall_trigger(c"openat"),
            syscall_trigger(c"read"),
            syscall_trigger(c"write"),
        ];

        let mut binary = Vec::new();
        for trigger in &triggers {
            trigger.serialize(&mut binary).unwrap();
        }

        let mut total = 0;
        let mut scanner = Trigger::scan(&binary);
        for expected in &triggers {
            let (raw, trigger) = scanner.next().unwrap().unwrap();
            assert_eq!(&trigger, expected);
            assert_eq!(raw.len(), expected.binary_size());
            total += raw.len();
        }
        assert!(scanner.next().is_none());
        assert_eq!(scanner.offset(), binary.len());
        assert_eq!(total, binary.len());
    }

    #[test]
    fn test_scan_stops_after_error() {
        let mut binary = Vec::new();
        syscall_trigger(c"openat").serialize(&mut binary).unwrap();
        binary.extend_from_slice(&[1, 2]);
        syscall_trigger(c"read").serialize(&mut binary).unwrap();

        let mut scanner = Trigger::scan(&binary);
        assert!(scanner.next().unwrap().is_ok());
        assert!(matches!(scanner.next(), Some(Err(Error::Malformed(_)))));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_scan_empty() {
        assert!(Trigger::scan(&[]).next().is_none());
    }

    #[test]
    fn test_group_action() {
        let mut group = Action::from(ActionGroup::new());
        group.add_action(NotifyAction::new().into()).unwrap();
        let mut rotate = RotateSessionAction::new();
        rotate.set_session_name(c"my_session").unwrap();
        group.add_action(rotate.into()).unwrap();

        let (condition, _) = syscall_trigger(c"openat").into_parts();
        let trigger = Trigger::new(condition, group);
        assert!(trigger.validate());

        let mut binary = Vec::new();
        trigger.serialize(&mut binary).unwrap();
        let (consumed, loaded) = Trigger::from_buffer(&BufferView::new(&binary)).unwrap();
        assert_eq!(consumed, binary.len());
        assert_eq!(loaded, trigger);
    }
}
