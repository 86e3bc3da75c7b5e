use std::fmt;

use arbor_core::{NodeId, RawConfig};

use crate::types::describe_key;

/// A predicate every value of an option must satisfy.
///
/// `describe` writes the constraint's metadata into the option's group of a
/// description dump.
pub trait Constrain<T>: Clone + PartialEq + fmt::Debug {
    fn check(&self, value: &T) -> bool;

    fn describe(&self, _raw: &mut RawConfig, _group: NodeId) {}
}

// ── NoConstrain ────────────────────────────────────────────────

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoConstrain;

impl<T> Constrain<T> for NoConstrain {
    fn check(&self, _value: &T) -> bool {
        true
    }
}

// ── IntConstrain ───────────────────────────────────────────────

/// Inclusive integer range. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntConstrain {
    min: Option<i64>,
    max: Option<i64>,
}

impl IntConstrain {
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self {
        if let (Some(min), Some(max)) = (min, max) {
            assert!(min <= max, "empty integer range [{}, {}]", min, max);
        }
        Self { min, max }
    }

    pub fn range(min: i64, max: i64) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub fn at_least(min: i64) -> Self {
        Self::new(Some(min), None)
    }

    pub fn at_most(max: i64) -> Self {
        Self::new(None, Some(max))
    }

    pub fn min(&self) -> Option<i64> {
        self.min
    }

    pub fn max(&self) -> Option<i64> {
        self.max
    }

    fn contains(&self, value: i64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    fn describe_range(&self, raw: &mut RawConfig, group: NodeId) {
        if let Some(min) = self.min {
            describe_key(raw, group, "IntMin", min.to_string());
        }
        if let Some(max) = self.max {
            describe_key(raw, group, "IntMax", max.to_string());
        }
    }
}

macro_rules! int_constrain {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Constrain<$ty> for IntConstrain {
                fn check(&self, value: &$ty) -> bool {
                    self.contains(i64::from(*value))
                }

                fn describe(&self, raw: &mut RawConfig, group: NodeId) {
                    self.describe_range(raw, group);
                }
            }
        )*
    };
}

int_constrain!(i32, i64, u32);

// ── StringConstrain ────────────────────────────────────────────

/// Length limits on a string option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringConstrain {
    max_length: Option<usize>,
    allow_empty: bool,
}

impl Default for StringConstrain {
    fn default() -> Self {
        Self {
            max_length: None,
            allow_empty: true,
        }
    }
}

impl StringConstrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the length in characters.
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn non_empty(mut self) -> Self {
        self.allow_empty = false;
        self
    }
}

impl Constrain<String> for StringConstrain {
    fn check(&self, value: &String) -> bool {
        if !self.allow_empty && value.is_empty() {
            return false;
        }
        self.max_length
            .is_none_or(|max| value.chars().count() <= max)
    }

    fn describe(&self, raw: &mut RawConfig, group: NodeId) {
        if let Some(max) = self.max_length {
            describe_key(raw, group, "MaxLength", max.to_string());
        }
        if !self.allow_empty {
            describe_key(raw, group, "AllowEmpty", "False");
        }
    }
}

// ── ListConstrain ──────────────────────────────────────────────

/// Applies an element constraint to every item of a list option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListConstrain<C>(pub C);

impl<T, C: Constrain<T>> Constrain<Vec<T>> for ListConstrain<C> {
    fn check(&self, value: &Vec<T>) -> bool {
        value.iter().all(|item| self.0.check(item))
    }

    fn describe(&self, raw: &mut RawConfig, group: NodeId) {
        self.0.describe(raw, group);
    }
}
