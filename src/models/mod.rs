/// Declares a closed string vocabulary: the enum, its wire strings, and
/// `FromStr`/serde conversions that reject anything outside the set.
#[macro_export]
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Comma-separated list of accepted values, for error messages
            pub fn allowed() -> String {
                Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "'{}' is not a valid {} (expected one of: {})",
                        other,
                        stringify!($name),
                        Self::allowed()
                    )),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod admin;
pub mod product;

pub use admin::{
    Admin, AdminChanges, AdminInput, AdminRole, AdminRow, AdminStatus, AdminView, NewAdmin, Permission,
    PermissionSet,
};
pub use product::{
    Category, Product, ProductInput, ProductKind, ProductResponse, ProductRow, ProductStatus, Ram, Storage,
    LOW_STOCK_THRESHOLD,
};

/// Trims a supplied string; whitespace-only input counts as absent.
pub(crate) fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Rejected input: a summary message plus one entry per offending field.
#[derive(Debug, Clone, PartialEq)]
pub struct Invalid {
    pub message: String,
    pub errors: Vec<String>,
}

impl Invalid {
    pub fn new(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self { message: message.into(), errors }
    }

    pub fn fields(errors: Vec<String>) -> Self {
        Self::new("Validation error", errors)
    }
}
