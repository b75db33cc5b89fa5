//! Catalog product types.
//!
//! [`Product`] is the stored entity. [`ProductDraft`] is the shape of every
//! inbound payload: a full create body and a partial update body are both
//! drafts, differing only in which fields are present. Updates are modelled
//! as "existing entity as a draft, overlaid with the patch, validated, turned
//! back into a product":
//!
//! ```rust
//! use tronics_core::{DocumentId, Product, ProductDraft};
//! use tronics_core::validation::Validate;
//!
//! let existing = Product {
//!     id: DocumentId::generate(),
//!     name: "googletalk".into(),
//!     price: 250,
//!     currency: "INR".into(),
//!     discount: None,
//!     vendor: "google".into(),
//!     accessories: vec![],
//!     is_essential: false,
//! };
//!
//! let patch = ProductDraft { currency: Some("USD".into()), ..ProductDraft::default() };
//! let merged = ProductDraft::from(&existing).overlay(patch);
//! merged.validate().unwrap();
//!
//! let updated = merged.into_product(existing.id).unwrap();
//! assert_eq!(updated.currency, "USD");
//! assert_eq!(updated.name, existing.name);
//! ```

use serde::{Deserialize, Serialize};

use super::id::DocumentId;
use crate::validation::{Validate, ValidationErrors, Validator};

/// Maximum length of a product name, in characters.
pub const MAX_NAME_CHARS: usize = 10;
/// Lowest accepted price.
pub const MIN_PRICE: i64 = 0;
/// Highest accepted price.
pub const MAX_PRICE: i64 = 2000;
/// Exact length of a currency code, in characters.
pub const CURRENCY_CODE_CHARS: usize = 3;

/// A product stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// System-assigned identifier.
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// Display name (at most 10 characters).
    #[serde(rename = "product_name")]
    pub name: String,
    /// Price in whole currency units, 0 to 2000.
    pub price: i64,
    /// Three-character currency code, e.g. `INR`.
    pub currency: String,
    /// Optional discount, unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<i64>,
    /// Vendor name.
    pub vendor: String,
    /// Bundled accessories, in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessories: Vec<String>,
    /// Whether the product is flagged as essential.
    #[serde(default)]
    pub is_essential: bool,
}

/// A product payload with every field optional.
///
/// Used both for creation (all required fields must end up present) and for
/// partial updates (only present fields replace stored ones). An `_id` in the
/// payload is not part of this type and is therefore ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    #[serde(rename = "product_name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_essential: Option<bool>,
}

impl ProductDraft {
    /// Overlay `patch` onto `self`.
    ///
    /// Every field present in `patch` replaces the corresponding field of
    /// `self`; fields absent from `patch` keep their current value.
    #[must_use]
    pub fn overlay(self, patch: Self) -> Self {
        Self {
            name: patch.name.or(self.name),
            price: patch.price.or(self.price),
            currency: patch.currency.or(self.currency),
            discount: patch.discount.or(self.discount),
            vendor: patch.vendor.or(self.vendor),
            accessories: patch.accessories.or(self.accessories),
            is_essential: patch.is_essential.or(self.is_essential),
        }
    }

    /// Returns `true` if the draft carries no fields at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.currency.is_none()
            && self.discount.is_none()
            && self.vendor.is_none()
            && self.accessories.is_none()
            && self.is_essential.is_none()
    }

    /// Validate and convert into a stored product with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns the validation errors if any product rule fails.
    pub fn into_product(self, id: DocumentId) -> Result<Product, ValidationErrors> {
        self.validate()?;

        let Self {
            name: Some(name),
            price: Some(price),
            currency: Some(currency),
            vendor: Some(vendor),
            discount,
            accessories,
            is_essential,
        } = self
        else {
            return Err(ValidationErrors::single("product", "is incomplete"));
        };

        Ok(Product {
            id,
            name,
            price,
            currency,
            discount,
            vendor,
            accessories: accessories.unwrap_or_default(),
            is_essential: is_essential.unwrap_or(false),
        })
    }
}

impl Validate for ProductDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();

        if let Some(name) = v.required_text("product_name", self.name.as_deref()) {
            v.max_chars("product_name", name, MAX_NAME_CHARS);
        }
        if let Some(&price) = v.required("price", self.price.as_ref()) {
            v.range("price", price, MIN_PRICE, MAX_PRICE);
        }
        if let Some(currency) = v.required_text("currency", self.currency.as_deref()) {
            v.exact_chars("currency", currency, CURRENCY_CODE_CHARS);
        }
        v.required_text("vendor", self.vendor.as_deref());

        v.finish()
    }
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            name: Some(product.name.clone()),
            price: Some(product.price),
            currency: Some(product.currency.clone()),
            discount: product.discount,
            vendor: Some(product.vendor.clone()),
            accessories: Some(product.accessories.clone()),
            is_essential: Some(product.is_essential),
        }
    }
}

impl From<Product> for ProductDraft {
    fn from(product: Product) -> Self {
        Self {
            name: Some(product.name),
            price: Some(product.price),
            currency: Some(product.currency),
            discount: product.discount,
            vendor: Some(product.vendor),
            accessories: Some(product.accessories),
            is_essential: Some(product.is_essential),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn googletalk() -> ProductDraft {
        serde_json::from_value(json!({
            "product_name": "googletalk",
            "price": 250,
            "currency": "INR",
            "vendor": "google",
            "accessories": ["charger", "subscription"]
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_draft_becomes_product() {
        let id = DocumentId::generate();
        let product = googletalk().into_product(id).unwrap();
        assert_eq!(product.id, id);
        assert_eq!(product.name, "googletalk");
        assert_eq!(product.accessories, vec!["charger", "subscription"]);
        assert_eq!(product.discount, None);
        assert!(!product.is_essential);
    }

    #[test]
    fn test_missing_required_fields_are_all_reported() {
        let err = ProductDraft::default().validate().unwrap_err();
        for field in ["product_name", "price", "currency", "vendor"] {
            assert!(err.has_field(field), "missing violation for {field}");
        }
    }

    #[test]
    fn test_bounds() {
        let draft = ProductDraft {
            name: Some("elevenchars".into()),
            price: Some(2001),
            currency: Some("RUPEE".into()),
            ..googletalk()
        };
        let err = draft.validate().unwrap_err();
        assert!(err.has_field("product_name"));
        assert!(err.has_field("price"));
        assert!(err.has_field("currency"));
        assert!(!err.has_field("vendor"));
    }

    #[test]
    fn test_zero_price_is_valid() {
        let draft = ProductDraft {
            price: Some(0),
            ..googletalk()
        };
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_overlay_replaces_only_present_fields() {
        let existing = googletalk().into_product(DocumentId::generate()).unwrap();
        let patch = ProductDraft {
            currency: Some("USD".into()),
            ..ProductDraft::default()
        };

        let merged = ProductDraft::from(&existing)
            .overlay(patch)
            .into_product(existing.id)
            .unwrap();

        assert_eq!(merged.currency, "USD");
        assert_eq!(
            Product {
                currency: existing.currency.clone(),
                ..merged
            },
            existing
        );
    }

    #[test]
    fn test_overlay_can_invalidate() {
        let existing = googletalk().into_product(DocumentId::generate()).unwrap();
        let patch = ProductDraft {
            price: Some(5000),
            ..ProductDraft::default()
        };
        let merged = ProductDraft::from(existing).overlay(patch);
        assert!(merged.validate().unwrap_err().has_field("price"));
    }

    #[test]
    fn test_draft_ignores_id_in_payload() {
        let draft: ProductDraft = serde_json::from_value(json!({
            "_id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "vendor": "acme"
        }))
        .unwrap();
        assert_eq!(draft.vendor.as_deref(), Some("acme"));
        assert!(draft.name.is_none());
    }

    #[test]
    fn test_is_empty() {
        assert!(ProductDraft::default().is_empty());
        assert!(!googletalk().is_empty());
    }

    #[test]
    fn test_product_wire_format() {
        let product = googletalk().into_product(DocumentId::generate()).unwrap();
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["_id"], json!(product.id.to_string()));
        assert_eq!(value["product_name"], json!("googletalk"));
        assert_eq!(value["is_essential"], json!(false));
        assert!(value.get("discount").is_none());
    }
}
