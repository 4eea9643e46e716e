use serde::{Deserialize, Serialize};

use storefront_core::{AggregateId, DomainError, DomainResult, Entity, ValueObject};

/// Product identifier (unique within a catalog).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    /// Fresh random identifier.
    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<AggregateId>().map(Self)
    }
}

/// Amount in the smallest currency unit (e.g. cents).
///
/// Arithmetic saturates at `u64::MAX` instead of wrapping.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor_units: u64) -> Self {
        Self(minor_units)
    }

    pub const fn minor_units(self) -> u64 {
        self.0
    }

    /// Price of `quantity` units.
    pub fn times(self, quantity: u64) -> Self {
        Self(self.0.saturating_mul(quantity))
    }

    pub fn saturating_add(self, other: Money) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl ValueObject for Money {}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Money::saturating_add)
    }
}

/// Catalog entry, read-only from the cart's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    category: String,
    unit_price: Money,
    stock: u32,
}

impl Product {
    /// Build a product, rejecting a blank name.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        category: impl Into<String>,
        unit_price: Money,
        stock: u32,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Self {
            id,
            name,
            category: category.into(),
            unit_price,
            stock,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// Availability is derived from stock; the cart never checks it.
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }

    /// Same product at a different price.
    pub fn with_price(&self, unit_price: Money) -> Self {
        Self {
            unit_price,
            ..self.clone()
        }
    }

    /// Same product with a different stock level.
    pub fn with_stock(&self, stock: u32) -> Self {
        Self {
            stock,
            ..self.clone()
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Looks up the price a product sells for right now.
pub trait PriceSource {
    /// `None` when the product is not listed.
    fn current_price(&self, product_id: ProductId) -> Option<Money>;
}
