//! # Actions
//!
//! An action is the work done when a trigger's condition is met: notifying clients,
//! controlling a tracing session, or a [group](`ActionGroup`) of such actions run in order.

use crate::buffer::BufferView;
use crate::fields::{
    append_to, FromBuffer, FromBytes, FromBytesError, FromBytesResult, NoDefault, ToBytes,
};
use crate::{Error, Validate};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::io::Write;

mod group;
mod notify;
mod session;

pub use group::ActionGroup;
pub use notify::NotifyAction;
pub use session::{RotateSessionAction, SnapshotSessionAction, StartSessionAction, StopSessionAction};

const HEADER_SIZE: usize = 1;

/// The wire tag of an action variant
#[non_exhaustive]
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ActionType {
    /// Not an action (never appears on the wire)
    Unknown = -1,
    /// [`NotifyAction`]
    Notify = 0,
    /// [`StartSessionAction`]
    StartSession = 1,
    /// [`StopSessionAction`]
    StopSession = 2,
    /// [`RotateSessionAction`]
    RotateSession = 3,
    /// [`SnapshotSessionAction`]
    SnapshotSession = 4,
    /// [`ActionGroup`]
    Group = 5,
}

impl ActionType {
    /// The type of an action that may be absent
    pub fn of(action: Option<&Action>) -> Self {
        action.map_or(Self::Unknown, Action::action_type)
    }
}

/// # A trigger action
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[non_exhaustive]
pub enum Action {
    #[allow(missing_docs)]
    Notify(NotifyAction),
    #[allow(missing_docs)]
    StartSession(StartSessionAction),
    #[allow(missing_docs)]
    StopSession(StopSessionAction),
    #[allow(missing_docs)]
    RotateSession(RotateSessionAction),
    #[allow(missing_docs)]
    SnapshotSession(SnapshotSessionAction),
    #[allow(missing_docs)]
    Group(ActionGroup),
}

impl Action {
    /// The variant tag of this action
    pub fn action_type(&self) -> ActionType {
        match self {
            Action::Notify(_) => ActionType::Notify,
            Action::StartSession(_) => ActionType::StartSession,
            Action::StopSession(_) => ActionType::StopSession,
            Action::RotateSession(_) => ActionType::RotateSession,
            Action::SnapshotSession(_) => ActionType::SnapshotSession,
            Action::Group(_) => ActionType::Group,
        }
    }

    /// Append `action` to this action group
    ///
    /// Fails with [`Error::Invalid`] when `self` is not a group or `action` is one. On failure
    /// `action` is dropped.
    pub fn add_action(&mut self, action: Action) -> Result<(), Error> {
        match self {
            Action::Group(group) => group.add_action(action),
            _ => Err(Error::Invalid("actions can only be added to a group")),
        }
    }

    /// Append the serialized action to `buf`
    pub fn serialize(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        append_to(self, buf)
    }

    /// Reconstruct an action from the start of `view`
    ///
    /// Returns the number of bytes consumed along with the action.
    pub fn create_from_buffer(view: &BufferView<'_>) -> Result<(usize, Self), Error> {
        Ok(Self::from_buffer(view)?)
    }
}

impl Validate for Action {
    fn validate(&self) -> bool {
        match self {
            Action::Notify(action) => action.validate(),
            Action::StartSession(action) => action.validate(),
            Action::StopSession(action) => action.validate(),
            Action::RotateSession(action) => action.validate(),
            Action::SnapshotSession(action) => action.validate(),
            Action::Group(group) => group.validate(),
        }
    }
}

impl ToBytes for Action {
    fn binary_size(&self) -> usize {
        HEADER_SIZE
            + match self {
                Action::Notify(action) => action.binary_size(),
                Action::StartSession(action) => action.binary_size(),
                Action::StopSession(action) => action.binary_size(),
                Action::RotateSession(action) => action.binary_size(),
                Action::SnapshotSession(action) => action.binary_size(),
                Action::Group(group) => group.binary_size(),
            }
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        (self.action_type() as i8).write(&mut writer)?;
        match self {
            Action::Notify(action) => action.write(writer),
            Action::StartSession(action) => action.write(writer),
            Action::StopSession(action) => action.write(writer),
            Action::RotateSession(action) => action.write(writer),
            Action::SnapshotSession(action) => action.write(writer),
            Action::Group(group) => group.write(writer),
        }
    }

    fn default_repr() -> impl ToBytes {
        NoDefault
    }
}

fn decode<T: FromBuffer>(
    view: &BufferView<'_>,
    wrap: impl FnOnce(T) -> Action,
) -> FromBytesResult<(usize, Action)> {
    let (size, action) = T::from_buffer(view)?;
    Ok((size, wrap(action)))
}

impl FromBuffer for Action {
    fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
        let mut header = view.header(HEADER_SIZE)?;
        let tag = i8::from_bytes(&mut header)?;
        let payload = view.from_view(HEADER_SIZE, None)?;

        let (size, action) = match ActionType::from_i8(tag) {
            Some(ActionType::Notify) => decode(&payload, Action::Notify)?,
            Some(ActionType::StartSession) => decode(&payload, Action::StartSession)?,
            Some(ActionType::StopSession) => decode(&payload, Action::StopSession)?,
            Some(ActionType::RotateSession) => decode(&payload, Action::RotateSession)?,
            Some(ActionType::SnapshotSession) => decode(&payload, Action::SnapshotSession)?,
            Some(ActionType::Group) => decode(&payload, Action::Group)?,
            Some(ActionType::Unknown) | None => {
                log::warn!("Attempted to create action of unknown type ({tag})");
                return Err(FromBytesError::UnknownActionType(tag));
            }
        };

        Ok((HEADER_SIZE + size, action))
    }
}

macro_rules! impl_from_action {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Action {
                fn from(action: $ty) -> Self {
                    Action::$variant(action)
                }
            }
        )*
    };
}

impl_from_action!(
    Notify(NotifyAction),
    StartSession(StartSessionAction),
    StopSession(StopSessionAction),
    RotateSession(RotateSessionAction),
    SnapshotSession(SnapshotSessionAction),
    Group(ActionGroup),
);

#[cfg(test)]
mod tests {
    use super::{
        Action, ActionGroup, ActionType, NotifyAction, RotateSessionAction, SnapshotSessionAction,
        StartSessionAction, StopSessionAction,
    };
    use crate::buffer::BufferView;
    use crate::fields::{FromBuffer, FromBytesError, ToBytes};
    use crate::{Error, Validate};

    fn rotate(name: &std::ffi::CStr) -> Action {
        let mut action = RotateSessionAction::new();
        action.set_session_name(name).unwrap();
        action.into()
    }

    fn snapshot() -> Action {
        let mut action = SnapshotSessionAction::new();
        action.set_session_name(c"my_session").unwrap();
        action.set_snapshot_name(Some(c"snap")).unwrap();
        action.into()
    }

    #[test]
    fn test_types() {
        assert_eq!(ActionType::of(None), ActionType::Unknown);
        assert_eq!(
            ActionType::of(Some(&NotifyAction::new().into())),
            ActionType::Notify
        );
        assert_eq!(rotate(c"s").action_type(), ActionType::RotateSession);
        assert_eq!(snapshot().action_type(), ActionType::SnapshotSession);
        assert_eq!(
            Action::from(ActionGroup::new()).action_type(),
            ActionType::Group
        );
    }

    #[test]
    fn test_notify() {
        let action = Action::from(NotifyAction::new());
        assert!(action.validate());

        let mut binary = Vec::new();
        action.serialize(&mut binary).unwrap();
        assert_eq!(binary, [ActionType::Notify as u8]);

        let (consumed, loaded) = Action::create_from_buffer(&BufferView::new(&binary)).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(loaded, action);
    }

    #[test]
    fn test_group() {
        let mut group = Action::from(ActionGroup::new());
        assert!(group.validate());

        group.add_action(NotifyAction::new().into()).unwrap();
        group.add_action(rotate(c"my_session")).unwrap();
        group.add_action(snapshot()).unwrap();

        let mut stop = StopSessionAction::new();
        stop.set_session_name(c"my_session").unwrap();
        group.add_action(stop.into()).unwrap();
        assert!(group.validate());

        let Action::Group(inner) = &group else {
            panic!("not a group: {group:?}");
        };
        assert_eq!(inner.len(), 4);
        assert_eq!(
            inner.get(1).map(Action::action_type),
            Some(ActionType::RotateSession)
        );
        assert!(inner.get(4).is_none());

        let mut binary = Vec::new();
        group.serialize(&mut binary).unwrap();
        hexdump::hexdump(binary.as_slice());
        assert_eq!(binary.len(), group.binary_size());
        assert_eq!(&binary[1..5], &4u32.to_ne_bytes());

        let (consumed, loaded) = Action::create_from_buffer(&BufferView::new(&binary)).unwrap();
        assert_eq!(consumed, binary.len());
        assert_eq!(loaded, group);

        let Action::Group(loaded) = loaded else {
            panic!("not a group");
        };
        let types: Vec<_> = loaded.iter().map(Action::action_type).collect();
        assert_eq!(
            types,
            [
                ActionType::Notify,
                ActionType::RotateSession,
                ActionType::SnapshotSession,
                ActionType::StopSession
            ]
        );
    }

    #[test]
    fn test_group_order_matters() {
        let mut a = ActionGroup::new();
        a.add_action(rotate(c"one")).unwrap();
        a.add_action(rotate(c"two")).unwrap();

        let mut b = ActionGroup::new();
        b.add_action(rotate(c"two")).unwrap();
        b.add_action(rotate(c"one")).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_no_nested_groups() {
        let mut group = ActionGroup::new();
        assert!(matches!(
            group.add_action(ActionGroup::new().into()),
            Err(Error::Invalid(_))
        ));
        assert!(group.is_empty());

        let mut notify = Action::from(NotifyAction::new());
        assert!(matches!(
            notify.add_action(rotate(c"my_session")),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn test_invalid_child() {
        let mut group = ActionGroup::new();
        group.add_action(StartSessionAction::new().into()).unwrap();
        assert!(!group.validate());
    }

    #[test]
    fn test_nested_group_on_wire() {
        let mut binary = vec![ActionType::Group as u8];
        2u32.write(&mut binary).unwrap();
        binary.push(ActionType::Notify as u8);
        binary.push(ActionType::Group as u8);
        0u32.write(&mut binary).unwrap();

        assert!(matches!(
            Action::from_buffer(&BufferView::new(&binary)),
            Err(FromBytesError::NestedGroup(ActionType::Group))
        ));
    }

    #[test]
    fn test_group_with_missing_children() {
        let mut binary = vec![ActionType::Group as u8];
        3u32.write(&mut binary).unwrap();
        binary.push(ActionType::Notify as u8);

        assert!(matches!(
            Action::from_buffer(&BufferView::new(&binary)),
            Err(FromBytesError::TruncatedField { wanted: 1, got: 0 })
        ));
    }

    #[test]
    fn test_huge_element_count() {
        let mut binary = vec![ActionType::Group as u8];
        u32::MAX.write(&mut binary).unwrap();

        assert!(Action::from_buffer(&BufferView::new(&binary)).is_err());
    }

    #[test]
    fn test_group_through_any_writer() {
        let mut group = ActionGroup::new();
        group.add_action(NotifyAction::new().into()).unwrap();
        group.add_action(rotate(c"my_session")).unwrap();
        let action = Action::from(group);

        let mut into_vec = Vec::new();
        action.write(&mut into_vec).unwrap();

        let mut cursor = std::io::Cursor::new(Vec::new());
        action.write(&mut cursor).unwrap();
        assert_eq!(cursor.into_inner(), into_vec);

        let mut by_value = Vec::new();
        action.write(std::io::BufWriter::new(&mut by_value)).unwrap();
        assert_eq!(by_value, into_vec);
        assert_eq!(into_vec.len(), action.binary_size());
    }

    #[test]
    fn test_unknown_action() {
        let binary = [0x7fu8];
        assert!(matches!(
            Action::from_buffer(&BufferView::new(&binary)),
            Err(FromBytesError::UnknownActionType(0x7f))
        ));
    }
}
