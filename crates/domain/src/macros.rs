//! Macro for implementing Display and FromStr for fixed-name enums
//!
//! Credential names and report columns are closed sets addressed by a stable
//! string. The macro keeps the mapping in one place and makes parsing
//! case-insensitive.
//!
//! # Example
//!
//! ```rust
//! use patcher_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Column {
//!     Title,
//!     Released,
//! }
//!
//! impl_domain_enum_conversions!(Column {
//!     Title => "title",
//!     Released => "released",
//! });
//! ```

/// Implements Display and FromStr traits for fixed-name enums
///
/// This macro generates:
/// - `as_str`: the variant's stable name
/// - Display trait: converts enum variants to their lowercase names
/// - FromStr trait: parses case-insensitive strings to enum variants
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Stable name of this variant
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
