//! Step identifiers.
//!
//! A script names its steps with a small `Copy` enum. The name of a step is
//! what ends up in rewind tokens and snapshots, so it must be stable across
//! releases. `step_ids!` generates the enum and its `StepId` impl.

use std::fmt::Debug;
use std::hash::Hash;

/// A step of a script.
pub trait StepId: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// The step run by `on_start`.
    const START: Self;

    /// Stable name used in rewind tokens and snapshots.
    fn name(self) -> &'static str;

    /// Inverse of `name`.
    fn from_name(name: &str) -> Option<Self>;
}

/// Declares a step enum and implements `StepId` for it. The first variant is
/// the start step.
///
/// ```ignore
/// step_ids! {
///     pub enum PickStep {
///         Start => "start",
///         Handle => "handle",
///     }
/// }
/// ```
#[macro_export]
macro_rules! step_ids {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $first:ident => $first_name:literal
            $(, $variant:ident => $variant_name:literal)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $first,
            $($variant,)*
        }

        impl $crate::StepId for $name {
            const START: Self = $name::$first;

            fn name(self) -> &'static str {
                match self {
                    $name::$first => $first_name,
                    $($name::$variant => $variant_name,)*
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $first_name => Some($name::$first),
                    $($variant_name => Some($name::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::StepId;

    crate::step_ids! {
        enum Sample {
            Begin => "begin",
            Middle => "middle",
            End => "end",
        }
    }

    #[test]
    fn first_variant_is_start() {
        assert_eq!(Sample::START, Sample::Begin);
    }

    #[test]
    fn names_map_both_ways() {
        for step in [Sample::Begin, Sample::Middle, Sample::End] {
            assert_eq!(Sample::from_name(step.name()), Some(step));
        }
        assert_eq!(Sample::from_name("missing"), None);
    }
}
