use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Collaborator Ports
// ============================================================================
//
// Account and catalog live in their own services with their own stores.
// Order placement consults them synchronously through these traits; the
// transport behind them is the caller's business.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Account {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
}

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn get_account(&self, account_id: &str) -> anyhow::Result<Account>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Current catalog entries for `ids`. Ids the catalog does not know are
    /// simply absent from the result.
    async fn get_products(&self, ids: &[String]) -> anyhow::Result<Vec<CatalogProduct>>;
}
