//! Declarative macros for preference declarations

/// Declare an enum usable as a preference type
///
/// The first variant becomes the type default. `Debug`, `Clone`, `Copy`,
/// `PartialEq`, `Eq`, `Hash` and `Default` are derived; do not derive them again.
///
/// # Examples
/// ```
/// preference_system::preference_enum! {
///     pub enum Difficulty { Easy, Normal, Hard }
/// }
/// ```
#[macro_export]
macro_rules! preference_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $first:ident $(, $rest:ident)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis enum $name {
            #[default]
            $first,
            $($rest,)*
        }

        impl $crate::preferences::PreferenceEnum for $name {
            fn variants() -> &'static [Self] {
                &[$name::$first $(, $name::$rest)*]
            }

            fn name(&self) -> &'static str {
                match self {
                    $name::$first => stringify!($first),
                    $($name::$rest => stringify!($rest),)*
                }
            }
        }

        impl $crate::preferences::PreferenceKind for $name {
            const TYPE: $crate::preferences::PreferenceType =
                $crate::preferences::PreferenceType::Enum;

            fn into_value(self) -> $crate::preferences::PreferenceValue {
                $crate::preferences::PreferenceValue::Enum(
                    $crate::preferences::PreferenceEnum::name(&self).to_string(),
                )
            }

            fn from_value(value: &$crate::preferences::PreferenceValue) -> Option<Self> {
                match value {
                    $crate::preferences::PreferenceValue::Enum(name) => {
                        <Self as $crate::preferences::PreferenceEnum>::from_name(name)
                    }
                    _ => None,
                }
            }
        }
    };
}
