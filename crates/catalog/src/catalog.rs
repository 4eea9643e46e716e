use uuid::Uuid;

use storefront_core::{AggregateId, DomainError, DomainResult};

use crate::product::{Money, PriceSource, Product, ProductId};

/// Ordered, in-memory product catalog for one store.
///
/// Listing order is insertion order, which is what storefront grids display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a product list, rejecting duplicate ids.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> DomainResult<Self> {
        let mut catalog = Self::new();
        for product in products {
            catalog.insert(product)?;
        }
        Ok(catalog)
    }

    /// Add a product. Ids are unique within a catalog.
    pub fn insert(&mut self, product: Product) -> DomainResult<()> {
        if self.get(product.id_typed()).is_some() {
            return Err(DomainError::conflict(format!(
                "product {} already listed",
                product.id_typed()
            )));
        }
        self.products.push(product);
        Ok(())
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id_typed() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products currently in stock.
    pub fn available(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_available())
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.products
            .iter()
            .filter(move |p| p.category().eq_ignore_ascii_case(category))
    }

    /// Change a listed product's price and return the updated entry.
    pub fn set_price(&mut self, id: ProductId, unit_price: Money) -> DomainResult<Product> {
        let slot = self
            .products
            .iter_mut()
            .find(|p| p.id_typed() == id)
            .ok_or_else(DomainError::not_found)?;
        *slot = slot.with_price(unit_price);
        Ok(slot.clone())
    }

    /// Change a listed product's stock level and return the updated entry.
    pub fn set_stock(&mut self, id: ProductId, stock: u32) -> DomainResult<Product> {
        let slot = self
            .products
            .iter_mut()
            .find(|p| p.id_typed() == id)
            .ok_or_else(DomainError::not_found)?;
        *slot = slot.with_stock(stock);
        Ok(slot.clone())
    }

    /// Fixture catalog backing the demo storefront.
    pub fn demo() -> Self {
        let rows: [(u128, &str, &str, u64, u32); 8] = [
            (1, "Wireless Headphones", "electronics", 12_999, 15),
            (2, "Smart Watch", "electronics", 24_999, 8),
            (3, "Leather Backpack", "accessories", 8_950, 20),
            (4, "Running Shoes", "footwear", 11_000, 0),
            (5, "Cotton T-Shirt", "apparel", 2_499, 120),
            (6, "Ceramic Coffee Mug", "home", 1_500, 64),
            (7, "Desk Lamp", "home", 4_599, 11),
            (8, "Sunglasses", "accessories", 6_900, 3),
        ];

        let products = rows
            .into_iter()
            .filter_map(|(n, name, category, price, stock)| {
                Product::new(
                    demo_product_id(n),
                    name,
                    category,
                    Money::from_minor(price),
                    stock,
                )
                .ok()
            })
            .collect();

        Self { products }
    }
}

/// Stable id of the `n`-th demo fixture product.
pub fn demo_product_id(n: u128) -> ProductId {
    ProductId::new(AggregateId::from_uuid(Uuid::from_u128(n)))
}

impl PriceSource for Catalog {
    fn current_price(&self, product_id: ProductId) -> Option<Money> {
        self.get(product_id).map(Product::unit_price)
    }
}
