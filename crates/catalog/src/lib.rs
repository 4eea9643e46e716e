//! Product catalog for the storefront: read-only product entries, prices in
//! minor currency units and the fixture catalog the demo store is built on.

pub mod catalog;
pub mod product;

pub use catalog::{Catalog, demo_product_id};
pub use product::{Money, PriceSource, Product, ProductId};
