#[macro_export]
#[doc(hidden)]
/// Macro to reduce boilerplate for the closed enums that are spelled as string literals in
/// rule documents (`"whitelist"`, `"AND"`, `"starts_with"`, ...).
///
/// Generates `as_str`, `Display`, `FromStr` (unknown literals map through `$err`), and serde
/// impls that round-trip through the literal.
macro_rules! impl_literal_enum {
    ($ty:ident, $err:expr, { $($variant:ident => $lit:literal),* $(,)? }) => {
        impl $ty {
            /// The literal this variant is spelled as.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( $ty::$variant => $lit, )*
                }
            }
        }

        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $ty {
            type Err = $crate::RuleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $lit => Ok($ty::$variant), )*
                    other => Err(($err)(other)),
                }
            }
        }

        impl ::serde::Serialize for $ty {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let literal = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                literal.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}
