use crate::action::{Action, ActionType};
use crate::buffer::BufferView;
use crate::fields::{FromBuffer, FromBytes, FromBytesError, FromBytesResult, NoDefault, ToBytes};
use crate::{Error, Validate};
use std::io::Write;

// n_elements:u32
const HEADER_SIZE: usize = 4;

/// # An ordered list of actions run together
///
/// Groups hold leaf actions only: a group can never contain another group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ActionGroup {
    actions: Vec<Action>,
}

impl ActionGroup {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action to the group, taking ownership of it
    ///
    /// Fails with [`Error::Invalid`] if `action` is itself a group.
    pub fn add_action(&mut self, action: Action) -> Result<(), Error> {
        if let Action::Group(_) = action {
            return Err(Error::Invalid("action groups cannot be nested"));
        }

        self.actions.try_reserve(1)?;
        self.actions.push(action);
        Ok(())
    }

    /// The number of actions in the group
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check whether the group holds no actions
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Get the action at `index`
    pub fn get(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    /// Iterate over the actions in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }
}

impl<'a> IntoIterator for &'a ActionGroup {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

impl Validate for ActionGroup {
    fn validate(&self) -> bool {
        self.actions.iter().all(Validate::validate)
    }
}

impl ToBytes for ActionGroup {
    fn binary_size(&self) -> usize {
        HEADER_SIZE + self.actions.iter().map(ToBytes::binary_size).sum::<usize>()
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let n_elements = u32::try_from(self.actions.len()).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "too many actions in group",
            )
        })?;

        // Action::write and this fn are mutually recursive: use a single writer type for both
        let writer: &mut dyn Write = &mut writer;
        n_elements.write(&mut *writer)?;
        for action in &self.actions {
            action.write(&mut *writer)?;
        }
        Ok(())
    }

    fn default_repr() -> impl ToBytes {
        NoDefault
    }
}

impl FromBuffer for ActionGroup {
    fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
        let mut header = view.header(HEADER_SIZE)?;
        let n_elements = u32::from_bytes(&mut header)?;

        // n_elements comes from the buffer, so grow as children are decoded
        let mut group = Self::new();
        let mut offset = HEADER_SIZE;
        for _ in 0..n_elements {
            let child = view.from_view(offset, None)?;

            // reject a nested group by its tag, before decoding anything below it
            let mut tag = child.header(1)?;
            if i8::from_bytes(&mut tag)? == ActionType::Group as i8 {
                log::debug!("Rejecting action group nested at offset {offset}");
                return Err(FromBytesError::NestedGroup(ActionType::Group));
            }

            let (size, action) = Action::from_buffer(&child)?;
            group.actions.push(action);
            offset += size;
        }

        Ok((offset, group))
    }
}
