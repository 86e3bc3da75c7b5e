//! # arbor-core
//!
//! Shared vocabulary for the Arbor configuration model: the untyped raw tree,
//! path utilities, localized strings, and the error type used by every other
//! crate in the workspace.

pub mod error;
pub mod i18n;
pub mod path;
pub mod raw;

pub use error::{ArborError, Result};
pub use i18n::I18nString;
pub use raw::{NodeId, NodeMut, NodeRef, RawConfig};
