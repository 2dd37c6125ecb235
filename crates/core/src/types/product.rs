//! Product catalog rows.
//!
//! Products are owned by the hosted data store; the storefront only reads them.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::Price;

/// Primary key of a product row.
///
/// The products table may use either a serial integer or a UUID key, so both
/// JSON numbers and strings are accepted and kept in text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product ID from its text form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as it appears in URLs.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

/// A product row from the `products` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Primary key.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Marketing copy, may be null.
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price.
    pub price: Price,
    /// Category slug, e.g. `footwear`.
    #[serde(default)]
    pub category: Option<String>,
    /// Whether the product is promoted on the home page.
    #[serde(default)]
    pub featured: bool,
}

impl Product {
    /// Glyph shown in place of a product image: the first character of the name.
    ///
    /// Returns `None` for an empty name.
    #[must_use]
    pub fn placeholder_glyph(&self) -> Option<char> {
        self.name.chars().next()
    }
}
