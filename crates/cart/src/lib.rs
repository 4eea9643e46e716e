//! Shopping cart domain module.
//!
//! One `Cart` per shopping session: line items merged by product id, derived
//! item count and subtotal, and the cart panel's open/closed flag. Pure
//! deterministic domain logic (no IO, no storage).

pub mod cart;
pub mod summary;

pub use cart::{
    AddItem, Cart, CartCleared, CartCommand, CartEvent, ClearCart, LineAdded, LineItem,
    LineProductRefreshed, LineQuantityChanged, LineRemoved, RefreshProduct, RemoveItem,
    SetVisibility, ToggleVisibility, UpdateQuantity, VisibilityChanged,
};
pub use summary::{CartSummary, SummaryLine};

/// Aggregate type tag used on event envelopes.
pub const AGGREGATE_TYPE: &str = "cart";
