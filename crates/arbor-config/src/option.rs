use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use tracing::debug;

use arbor_core::{NodeId, RawConfig};

use crate::constrain::{Constrain, NoConstrain};
use crate::types::{describe_key, OptionKind, OptionType};

/// One named, typed, constrained value with a default.
///
/// The current value always satisfies the constraint: assignments that would
/// break it are dropped and the previous value stays.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigOption<T, C = NoConstrain> {
    path: String,
    description: String,
    value: T,
    default: T,
    constrain: C,
}

impl<T: OptionType> ConfigOption<T, NoConstrain> {
    pub fn new(path: impl Into<String>, description: impl Into<String>, default: T) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
            value: default.clone(),
            default,
            constrain: NoConstrain,
        }
    }
}

impl<T: OptionType, C: Constrain<T>> ConfigOption<T, C> {
    /// Replace the constraint. The default value must satisfy it.
    pub fn with_constrain<D: Constrain<T>>(self, constrain: D) -> ConfigOption<T, D> {
        assert!(
            constrain.check(&self.default),
            "default value of option `{}` violates its constraint",
            self.path
        );
        let value = if constrain.check(&self.value) {
            self.value
        } else {
            self.default.clone()
        };
        ConfigOption {
            path: self.path,
            description: self.description,
            value,
            default: self.default,
            constrain,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn constrain(&self) -> &C {
        &self.constrain
    }

    /// Store `value` if it satisfies the constraint. Returns whether it did.
    pub fn set_value(&mut self, value: T) -> bool {
        if self.constrain.check(&value) {
            self.value = value;
            true
        } else {
            debug!(option = %self.path, ?value, "rejected value violating constraint");
            false
        }
    }

    /// Edit the value in place. The edit is committed through [`set_value`]
    /// when the guard drops, so a constraint-violating edit is discarded.
    ///
    /// [`set_value`]: ConfigOption::set_value
    pub fn mutable_value(&mut self) -> MutableValue<'_, T, C> {
        let value = self.value.clone();
        MutableValue {
            option: self,
            value,
        }
    }

    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }

    pub fn is_default(&self) -> bool {
        self.value == self.default
    }

    /// Make the current value the new default, nested defaults included.
    pub fn sync_default_value_to_current(&mut self) {
        self.value.sync_defaults();
        self.default = self.value.clone();
    }
}

/// Guard returned by [`ConfigOption::mutable_value`].
pub struct MutableValue<'a, T: OptionType, C: Constrain<T>> {
    option: &'a mut ConfigOption<T, C>,
    value: T,
}

impl<T: OptionType, C: Constrain<T>> Deref for MutableValue<'_, T, C> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: OptionType, C: Constrain<T>> DerefMut for MutableValue<'_, T, C> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: OptionType, C: Constrain<T>> Drop for MutableValue<'_, T, C> {
    fn drop(&mut self) {
        let value = std::mem::take(&mut self.value);
        self.option.set_value(value);
    }
}

// ── Load warnings ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// The raw node does not hold a value of the option's type.
    Malformed,
    /// The value parsed but the option's constraint rejected it.
    ConstraintViolation,
}

/// An option `load` left unchanged because its raw value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub field: String,
    pub kind: WarningKind,
    /// The raw scalar that was rejected, if the node had one.
    pub value: Option<String>,
}

impl ConfigWarning {
    /// Re-root the field path under `parent`, e.g. `Width` under `Behavior`
    /// becomes `Behavior/Width`.
    pub fn nested_under(mut self, parent: &str) -> Self {
        self.field = format!("{}/{}", parent, self.field);
        self
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.kind {
            WarningKind::Malformed => "malformed value",
            WarningKind::ConstraintViolation => "value violates constraint",
        };
        write!(f, "{}: {}", self.field, message)?;
        if let Some(ref value) = self.value {
            write!(f, " ({:?})", value)?;
        }
        write!(f, ", keeping current value")
    }
}

// ── Type-erased options ────────────────────────────────────────

/// Object-safe face of a [`ConfigOption`], used to walk a configuration's
/// options in declaration order.
pub trait AnyOption: fmt::Debug {
    fn path(&self) -> &str;

    fn description(&self) -> &str;

    fn kind(&self) -> OptionKind;

    fn is_default(&self) -> bool;

    fn reset(&mut self);

    fn marshal(&self, raw: &mut RawConfig, node: NodeId);

    /// Load the value at `node`. On rejection the current value is untouched.
    ///
    /// A loaded value may still report options rejected inside it, such as a
    /// sub-configuration's fields. Their paths are relative to `node`.
    fn unmarshal(&mut self, raw: &RawConfig, node: NodeId) -> Result<Vec<ConfigWarning>, WarningKind>;

    /// Write `Type`, `Description`, `DefaultValue` and constraint metadata
    /// into `group`.
    fn dump_description(&self, raw: &mut RawConfig, group: NodeId);

    fn sync_default_value_to_current(&mut self);
}

impl<T: OptionType, C: Constrain<T>> AnyOption for ConfigOption<T, C> {
    fn path(&self) -> &str {
        &self.path
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn kind(&self) -> OptionKind {
        T::kind()
    }

    fn is_default(&self) -> bool {
        self.value == self.default
    }

    fn reset(&mut self) {
        self.value = self.default.clone();
    }

    fn marshal(&self, raw: &mut RawConfig, node: NodeId) {
        self.value.marshal(raw, node);
        if !self.description.is_empty() {
            raw.set_comment(node, self.description.as_str());
        }
    }

    fn unmarshal(&mut self, raw: &RawConfig, node: NodeId) -> Result<Vec<ConfigWarning>, WarningKind> {
        let mut parsed = self.value.clone();
        let mut nested = Vec::new();
        if !parsed.unmarshal_with_warnings(raw, node, &mut nested) {
            return Err(WarningKind::Malformed);
        }
        if !self.constrain.check(&parsed) {
            return Err(WarningKind::ConstraintViolation);
        }
        self.value = parsed;
        Ok(nested)
    }

    fn dump_description(&self, raw: &mut RawConfig, group: NodeId) {
        describe_key(raw, group, "Type", T::kind().to_string());
        if !self.description.is_empty() {
            describe_key(raw, group, "Description", self.description.as_str());
        }
        T::describe_type(&self.path, raw, group);
        self.default.describe_default(&self.path, raw, group);
        self.constrain.describe(raw, group);
    }

    fn sync_default_value_to_current(&mut self) {
        self.value.sync_defaults();
        self.default = self.value.clone();
    }
}
