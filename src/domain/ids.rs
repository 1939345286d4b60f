use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Declares a string-backed identifier newtype.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Type-safe identifier for users.
    UserId
);
string_id!(
    /// Type-safe identifier for products.
    ProductId
);
string_id!(
    /// Type-safe identifier for warehouses (stores).
    WarehouseId
);
string_id!(
    /// Type-safe identifier for orders.
    OrderId
);
string_id!(
    /// Type-safe identifier for carriers. Carriers live outside this crate.
    CarrierId
);
