use serde::{Deserialize, Serialize};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// A product the caller wants, before catalog resolution.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProductRequest {
    pub product_id: String,
    pub quantity: u32,
}

impl ProductRequest {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlaceOrder {
    pub account_id: String,
    pub products: Vec<ProductRequest>,
}

impl PlaceOrder {
    /// Requested quantities per product id, first-seen order kept.
    ///
    /// Repeated ids are merged by adding their quantities; zero quantities
    /// are dropped.
    pub fn merged_quantities(&self) -> Vec<(String, u32)> {
        let mut merged: Vec<(String, u32)> = Vec::with_capacity(self.products.len());
        for request in self.products.iter().filter(|r| r.quantity > 0) {
            match merged.iter_mut().find(|(id, _)| *id == request.product_id) {
                Some((_, quantity)) => *quantity = quantity.saturating_add(request.quantity),
                None => merged.push((request.product_id.clone(), request.quantity)),
            }
        }
        merged
    }
}
