//! Newtype IDs for type-safe entity references.
//!
//! Record-store identifiers are opaque strings. Use the `define_id!` macro to
//! create wrappers that prevent accidentally mixing IDs from different
//! entity types.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>`, `Display`, and `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use arrowhead_core::define_id;
/// define_id!(PickerId);
/// define_id!(PackerId);
///
/// let picker = PickerId::new("u-17");
/// let packer = PackerId::new("u-17");
///
/// // These are different types, so this won't compile:
/// // let _: PickerId = packer;
/// assert_eq!(picker.as_str(), packer.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(ProductId);
define_id!(SiteId);
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_as_str() {
        let id = OrderId::new("ORD-1001");
        assert_eq!(id.to_string(), "ORD-1001");
        assert_eq!(id.as_str(), "ORD-1001");
    }

    #[test]
    fn test_serde_transparent() {
        let id = OrderItemId::from("item-7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"item-7\"");

        let parsed: OrderItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
