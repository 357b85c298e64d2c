//! Menu Catalog Model
//!
//! Read-only for this core: clients browse the catalog to build carts,
//! but catalog maintenance lives outside the coordination layer.

use serde::{Deserialize, Serialize};

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Category id this item belongs to
    pub category: String,
    /// Unit price in currency unit
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
    /// Unavailable items are hidden from clients
    pub available: bool,
}

/// Menu category entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuCategory {
    pub id: String,
    pub name: String,
}
