#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod action;
pub mod buffer;
pub mod condition;
pub mod event_rule;

/// Wire codecs for header integers and strings
pub mod fields;
pub mod trigger;

mod error;

pub use error::Error;

pub use action::{Action, ActionType};
pub use buffer::BufferView;
pub use condition::{Condition, ConditionType};
pub use event_rule::{EventRule, EventRuleType};
pub use trigger::Trigger;

/// Check an object for well-formedness
///
/// An object is well formed when every required field is set. Objects with no required
/// fields keep the default implementation and are always valid.
pub trait Validate {
    /// Return true if the object is well formed
    fn validate(&self) -> bool {
        true
    }
}
