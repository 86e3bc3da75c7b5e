//! # arbor-config
//!
//! Typed configuration on top of the raw tree. Options carry a value, a
//! default and a constraint; configurations group options, load and save them
//! through a [`RawConfig`], and dump a description of their schema.
//!
//! [`ConfigFile`] ties a configuration to an INI file on disk, with
//! environment overrides and hot-reload.

pub mod configuration;
pub mod constrain;
pub mod loader;
pub mod option;
pub mod types;

pub use arbor_core::{I18nString, NodeId, RawConfig};
pub use configuration::Configuration;
pub use constrain::{Constrain, IntConstrain, ListConstrain, NoConstrain, StringConstrain};
pub use loader::{apply_env_overrides, apply_overrides, ConfigFile};
pub use option::{AnyOption, ConfigOption, ConfigWarning, MutableValue, WarningKind};
pub use types::{OptionKind, OptionType};
