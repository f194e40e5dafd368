//! Catalog records returned by the products endpoint and the low-stock scan over them.
//!
//! Products and variants are decoded one at a time so a single malformed entry is
//! reported and skipped instead of failing the whole pass. Only `products`,
//! `variants`, the SKU and `inventory_quantity` are checked; ids are carried as-is.

use serde::Deserialize;
use serde_json::{Number, Value};
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    pub products: Vec<Value>,
}

impl Catalog {
    /// Appends the products of a following page.
    pub fn merge(&mut self, other: Catalog) {
        self.products.extend(other.products);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: Option<Value>,
    pub variants: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    pub id: Option<Value>,
    sku: Option<String>,
    #[serde(rename = "SKU")]
    legacy_sku: Option<String>,
    pub inventory_quantity: Number,
}

impl Variant {
    /// `sku` wins over the legacy `SKU` key when both are present.
    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref().or(self.legacy_sku.as_deref())
    }

    pub fn is_at_or_below(&self, threshold: i64) -> bool {
        match self.inventory_quantity.as_i64() {
            Some(quantity) => quantity <= threshold,
            None => self
                .inventory_quantity
                .as_f64()
                .is_some_and(|quantity| quantity <= threshold as f64),
        }
    }
}

/// A catalog entry left out of the scan and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedVariant {
    pub product_index: usize,
    /// `None` when the whole product entry could not be decoded.
    pub variant_index: Option<usize>,
    pub product_id: Option<Value>,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LowStockScan {
    /// SKUs at or below the threshold, in document order.
    pub low_stock: Vec<String>,
    pub skipped: Vec<SkippedVariant>,
    pub variants_seen: usize,
}

pub fn extract_low_stock(catalog: &Catalog, threshold: i64) -> LowStockScan {
    let mut scan = LowStockScan::default();

    for (product_index, raw_product) in catalog.products.iter().enumerate() {
        let product = match Product::deserialize(raw_product) {
            Ok(product) => product,
            Err(err) => {
                warn!(product_index, error = %err, "Skipping undecodable product entry");
                scan.skipped.push(SkippedVariant {
                    product_index,
                    variant_index: None,
                    product_id: None,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        for (variant_index, raw_variant) in product.variants.iter().flatten().enumerate() {
            scan.variants_seen += 1;
            let skip = |reason: String| SkippedVariant {
                product_index,
                variant_index: Some(variant_index),
                product_id: product.id.clone(),
                reason,
            };
            let variant = match Variant::deserialize(raw_variant) {
                Ok(variant) => variant,
                Err(err) => {
                    warn!(
                        product_index,
                        variant_index,
                        product_id = ?product.id,
                        error = %err,
                        "Skipping undecodable variant"
                    );
                    scan.skipped.push(skip(err.to_string()));
                    continue;
                }
            };
            let sku = match variant.sku() {
                Some(sku) if !sku.trim().is_empty() => sku,
                _ => {
                    warn!(product_index, variant_index, variant_id = ?variant.id, "Skipping variant without SKU");
                    scan.skipped.push(skip("missing or blank sku".to_string()));
                    continue;
                }
            };
            if variant.is_at_or_below(threshold) {
                scan.low_stock.push(sku.to_string());
            }
        }
    }

    scan
}

/// Comma-joined summary, or `None` when nothing qualified.
pub fn format_message(skus: &[String]) -> Option<String> {
    if skus.is_empty() {
        return None;
    }
    Some(skus.join(","))
}
