use std::fmt;
use tracing::warn;

use arbor_core::path;
use arbor_core::{NodeId, RawConfig};

use crate::option::{AnyOption, ConfigWarning};

/// An ordered set of named options, usually declared with [`configuration!`].
///
/// Options are visited in declaration order by every operation.
///
/// [`configuration!`]: crate::configuration
pub trait Configuration: fmt::Debug {
    /// Name of the declared type. Used as the description namespace and as
    /// the `$TypeName` tag of sub-configuration nodes.
    fn type_name(&self) -> &'static str;

    fn options(&self) -> Vec<&dyn AnyOption>;

    fn options_mut(&mut self) -> Vec<&mut dyn AnyOption>;

    /// Load every option from the top level of `raw`.
    fn load(&mut self, raw: &RawConfig) -> Vec<ConfigWarning> {
        self.load_from(raw, raw.root())
    }

    /// Load every option from the children of `node`.
    ///
    /// Missing keys leave the option alone. A rejected value is reported and
    /// the option keeps its current value; the remaining options still load.
    /// Rejections inside sub-configurations are reported with their full
    /// path, e.g. `Behavior/Width`.
    fn load_from(&mut self, raw: &RawConfig, node: NodeId) -> Vec<ConfigWarning> {
        let warnings = load_options(self, raw, node);
        for warning in &warnings {
            warn!("{}", warning);
        }
        warnings
    }

    fn save(&self, raw: &mut RawConfig) {
        let root = raw.root();
        self.save_to(raw, root);
    }

    /// Marshal every option into `node/<option path>`.
    fn save_to(&self, raw: &mut RawConfig, node: NodeId) {
        for option in self.options() {
            let child = raw.entry(node, option.path());
            option.marshal(raw, child);
        }
    }

    /// Write this type's description under `<TypeName>/` in `raw`.
    fn dump_description(&self, raw: &mut RawConfig) {
        let root = raw.root();
        let namespace = raw.entry(root, self.type_name());
        self.describe_into(raw, namespace);
    }

    /// Write one description group per option under `namespace`.
    fn describe_into(&self, raw: &mut RawConfig, namespace: NodeId) {
        for option in self.options() {
            let group = raw.entry(namespace, option.path());
            option.dump_description(raw, group);
        }
    }

    fn sync_default_value_to_current(&mut self) {
        for option in self.options_mut() {
            option.sync_default_value_to_current();
        }
    }

    fn reset_to_defaults(&mut self) {
        for option in self.options_mut() {
            option.reset();
        }
    }

    fn is_default(&self) -> bool {
        self.options().iter().all(|option| option.is_default())
    }
}

fn load_options<C: Configuration + ?Sized>(
    config: &mut C,
    raw: &RawConfig,
    node: NodeId,
) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    for option in config.options_mut() {
        let Some(child) = raw.get(node, option.path()) else {
            continue;
        };
        match option.unmarshal(raw, child) {
            Ok(nested) => {
                warnings.extend(nested.into_iter().map(|w| w.nested_under(option.path())));
            }
            Err(kind) => warnings.push(ConfigWarning {
                field: option.path().to_string(),
                kind,
                value: raw.value(child).map(str::to_string),
            }),
        }
    }
    warnings
}

// Sub-configuration plumbing used by `configuration!`.

#[doc(hidden)]
pub fn marshal_sub_config<C: Configuration>(config: &C, raw: &mut RawConfig, node: NodeId) {
    raw.set_type_tag(node, config.type_name());
    config.save_to(raw, node);
}

#[doc(hidden)]
pub fn unmarshal_sub_config<C: Configuration>(
    config: &mut C,
    raw: &RawConfig,
    node: NodeId,
    nested: &mut Vec<ConfigWarning>,
) -> bool {
    nested.extend(load_options(config, raw, node));
    true
}

/// The nested type is described at the top level of `raw` in a group whose
/// name is literally `<option path>$<TypeName>`, so two types mounted at the
/// same option path never share a group. The option's own group points at
/// it with `SubConfig=`.
#[doc(hidden)]
pub fn describe_sub_config<C: Configuration>(
    default: &C,
    option_path: &str,
    raw: &mut RawConfig,
    group: NodeId,
) {
    let nested = path::tagged(option_path, default.type_name());
    let pointer = raw.entry(group, "SubConfig");
    raw.set_value(pointer, nested.as_str());

    let root = raw.root();
    let namespace = raw.entry(root, &nested);
    default.describe_into(raw, namespace);
}

/// Declare a configuration struct.
///
/// Every field is an option (or nested configuration option) with its
/// initializer. The macro derives `Debug`, `Clone`, `PartialEq` and
/// `Default`, implements [`Configuration`] with the struct name as the type
/// name, and makes the struct usable as a sub-configuration option value.
///
/// ```
/// use arbor_config::{configuration, ConfigOption, Configuration, IntConstrain, RawConfig};
///
/// configuration! {
///     pub struct Window {
///         pub width: ConfigOption<i32, IntConstrain> =
///             ConfigOption::new("Width", "Window width", 640)
///                 .with_constrain(IntConstrain::range(1, 4096)),
///     }
/// }
///
/// let mut window = Window::default();
/// assert!(!window.width.set_value(0));
/// let mut raw = RawConfig::new();
/// window.save(&mut raw);
/// assert_eq!(raw.value_by_path("Width"), Some("640"));
/// ```
#[macro_export]
macro_rules! configuration {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty = $init:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                Self {
                    $($field: $init,)*
                }
            }
        }

        impl $crate::Configuration for $name {
            fn type_name(&self) -> &'static str {
                stringify!($name)
            }

            fn options(&self) -> ::std::vec::Vec<&dyn $crate::AnyOption> {
                vec![$(&self.$field as &dyn $crate::AnyOption),*]
            }

            fn options_mut(&mut self) -> ::std::vec::Vec<&mut dyn $crate::AnyOption> {
                vec![$(&mut self.$field as &mut dyn $crate::AnyOption),*]
            }
        }

        impl $crate::OptionType for $name {
            fn kind() -> $crate::OptionKind {
                $crate::OptionKind::Configuration
            }

            fn marshal(&self, raw: &mut $crate::RawConfig, node: $crate::NodeId) {
                $crate::configuration::marshal_sub_config(self, raw, node);
            }

            fn unmarshal(&mut self, raw: &$crate::RawConfig, node: $crate::NodeId) -> bool {
                $crate::configuration::unmarshal_sub_config(self, raw, node, &mut ::std::vec::Vec::new())
            }

            fn unmarshal_with_warnings(
                &mut self,
                raw: &$crate::RawConfig,
                node: $crate::NodeId,
                nested: &mut ::std::vec::Vec<$crate::ConfigWarning>,
            ) -> bool {
                $crate::configuration::unmarshal_sub_config(self, raw, node, nested)
            }

            fn describe_default(
                &self,
                option_path: &str,
                raw: &mut $crate::RawConfig,
                group: $crate::NodeId,
            ) {
                $crate::configuration::describe_sub_config(self, option_path, raw, group);
            }

            fn describe_element(
                option_path: &str,
                raw: &mut $crate::RawConfig,
                group: $crate::NodeId,
            ) {
                $crate::configuration::describe_sub_config(
                    &<Self as ::std::default::Default>::default(),
                    option_path,
                    raw,
                    group,
                );
            }

            fn sync_defaults(&mut self) {
                $crate::Configuration::sync_default_value_to_current(self);
            }
        }
    };
}
