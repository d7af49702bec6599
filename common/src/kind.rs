//! Macros for defining kind enums backed by small integer codes.

use derive_more::{Display, Error};

/// Macro for defining a kind enum, whose every variant has a fixed `u8` code.
///
/// Besides the enum itself, it generates:
/// - `ALL` constant listing the variants in their code order;
/// - [`TryFrom<u8>`] failing with [`InvalidCode`] for unknown codes.
///
/// # Example
///
/// ```rust
/// common::define_kind! {
///     #[doc = "Shape kind."]
///     enum Kind {
///         #[doc = "A cube"]
///         Cube = 1,
///
///         #[doc = "A sphere"]
///         Sphere = 2,
///     }
/// }
///
/// assert_eq!(Kind::try_from(2), Ok(Kind::Sphere));
/// assert!(Kind::try_from(3).is_err());
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
        )]
        #[doc = $doc]
        #[repr(u8)]
        #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $(
                 #[doc = $variant_doc]
                 $variant = $value,
            )*
        }

        impl $name {
            #[doc = ::core::concat!(
                "All the [`", ::core::stringify!($name), "`] variants, ",
                "ordered by their codes.",
            )]
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Converts this into its [`u8`] representation.
            #[must_use]
            pub const fn u8(self) -> u8 {
                self as u8
            }
        }

        impl ::core::convert::TryFrom<u8> for $name {
            type Error = $crate::kind::InvalidCode;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                match code {
                    $(
                        v if Self::$variant.u8() == v => Ok(Self::$variant),
                    )*
                    v => Err($crate::kind::InvalidCode {
                        kind: ::core::stringify!($name),
                        code: v,
                    }),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(kind: $name) -> Self {
                kind.u8()
            }
        }
    };
}

/// Error of converting an unknown code into a kind enum.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
#[display("invalid `{kind}` code: {code}")]
pub struct InvalidCode {
    /// Name of the kind enum.
    pub kind: &'static str,

    /// Rejected code.
    pub code: u8,
}
