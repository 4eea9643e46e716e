use core::convert::Infallible;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalog::{Money, PriceSource, Product, ProductId};
use storefront_core::{Aggregate, AggregateRoot, SessionId};
use storefront_events::{Event, execute};

use crate::summary::{CartSummary, SummaryLine};

/// One product held by the cart, with a strictly positive quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    product: Product,
    quantity: u64,
}

impl LineItem {
    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn product_id(&self) -> ProductId {
        self.product.id_typed()
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Unit price of the embedded product times quantity.
    pub fn line_total(&self) -> Money {
        self.product.unit_price().times(self.quantity)
    }
}

/// Aggregate root: the shopping cart of one session.
///
/// Invariants held after every `apply`:
/// - at most one line per product id (adds merge into the existing line)
/// - every quantity is > 0 (a change to zero removes the line)
///
/// `item_count` and `subtotal` are computed on read and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    id: SessionId,
    lines: Vec<LineItem>,
    open: bool,
    version: u64,
}

impl Cart {
    /// Empty, closed cart for a new session.
    pub fn empty(id: SessionId) -> Self {
        Self {
            id,
            lines: Vec::new(),
            open: false,
            version: 0,
        }
    }

    /// Rebuild a cart by applying `events` in order.
    pub fn replay<'a>(id: SessionId, events: impl IntoIterator<Item = &'a CartEvent>) -> Self {
        let mut cart = Self::empty(id);
        for event in events {
            cart.apply(event);
        }
        cart
    }

    pub fn id_typed(&self) -> SessionId {
        self.id
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, product_id: ProductId) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.product_id() == product_id)
    }

    /// Quantity held for `product_id`, zero when absent.
    pub fn quantity_of(&self, product_id: ProductId) -> u64 {
        self.line(product_id).map_or(0, LineItem::quantity)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the cart panel is shown.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Sum of all quantities, saturating at `u64::MAX`.
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .fold(0u64, |acc, l| acc.saturating_add(l.quantity))
    }

    /// Sum of unit price x quantity, read from each line's product.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(LineItem::line_total).sum()
    }

    /// Subtotal at the prices `prices` quotes now.
    ///
    /// Lines whose product is no longer listed keep their embedded price.
    pub fn subtotal_with<P>(&self, prices: &P) -> Money
    where
        P: PriceSource + ?Sized,
    {
        self.lines
            .iter()
            .map(|l| {
                prices
                    .current_price(l.product_id())
                    .unwrap_or_else(|| l.product.unit_price())
                    .times(l.quantity)
            })
            .sum()
    }

    /// Presentation snapshot of the current state.
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            lines: self
                .lines
                .iter()
                .map(|l| SummaryLine {
                    product_id: l.product_id(),
                    name: l.product.name().to_string(),
                    unit_price: l.product.unit_price(),
                    quantity: l.quantity,
                    line_total: l.line_total(),
                })
                .collect(),
            item_count: self.item_count(),
            subtotal: self.subtotal(),
            open: self.open,
        }
    }

    /// Add `quantity` units of `product`, merging into an existing line.
    pub fn add_item(&mut self, product: Product, quantity: u64) -> Vec<CartEvent> {
        self.run(CartCommand::AddItem(
            AddItem::new(product, Utc::now()).with_quantity(quantity),
        ))
    }

    /// Add a single unit of `product`.
    pub fn add_one(&mut self, product: Product) -> Vec<CartEvent> {
        self.run(CartCommand::AddItem(AddItem::new(product, Utc::now())))
    }

    pub fn remove_item(&mut self, product_id: ProductId) -> Vec<CartEvent> {
        self.run(CartCommand::RemoveItem(RemoveItem {
            product_id,
            occurred_at: Utc::now(),
        }))
    }

    /// Set an absolute quantity; `quantity <= 0` removes the line.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) -> Vec<CartEvent> {
        self.run(CartCommand::UpdateQuantity(UpdateQuantity {
            product_id,
            quantity,
            occurred_at: Utc::now(),
        }))
    }

    pub fn clear(&mut self) -> Vec<CartEvent> {
        self.run(CartCommand::ClearCart(ClearCart {
            occurred_at: Utc::now(),
        }))
    }

    pub fn toggle_visibility(&mut self) -> Vec<CartEvent> {
        self.run(CartCommand::ToggleVisibility(ToggleVisibility {
            occurred_at: Utc::now(),
        }))
    }

    pub fn set_visibility(&mut self, open: bool) -> Vec<CartEvent> {
        self.run(CartCommand::SetVisibility(SetVisibility {
            open,
            occurred_at: Utc::now(),
        }))
    }

    /// Swap in a newer copy of a product already in the cart.
    pub fn refresh_product(&mut self, product: Product) -> Vec<CartEvent> {
        self.run(CartCommand::RefreshProduct(RefreshProduct {
            product,
            occurred_at: Utc::now(),
        }))
    }

    fn run(&mut self, command: CartCommand) -> Vec<CartEvent> {
        let Ok(events) = execute(self, &command);
        events
    }
}

impl AggregateRoot for Cart {
    type Id = SessionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddItem. `quantity` defaults to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItem {
    pub product: Product,
    pub quantity: u64,
    pub occurred_at: DateTime<Utc>,
}

impl AddItem {
    pub fn new(product: Product, occurred_at: DateTime<Utc>) -> Self {
        Self {
            product,
            quantity: 1,
            occurred_at,
        }
    }

    pub fn with_quantity(mut self, quantity: u64) -> Self {
        self.quantity = quantity;
        self
    }
}

/// Command: RemoveItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveItem {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateQuantity (absolute, not a delta).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateQuantity {
    pub product_id: ProductId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ClearCart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearCart {
    pub occurred_at: DateTime<Utc>,
}

/// Command: ToggleVisibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleVisibility {
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetVisibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetVisibility {
    pub open: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RefreshProduct (catalog entry changed, e.g. repriced).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshProduct {
    pub product: Product,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartCommand {
    AddItem(AddItem),
    RemoveItem(RemoveItem),
    UpdateQuantity(UpdateQuantity),
    ClearCart(ClearCart),
    ToggleVisibility(ToggleVisibility),
    SetVisibility(SetVisibility),
    RefreshProduct(RefreshProduct),
}

/// Event: LineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAdded {
    pub product: Product,
    pub quantity: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineQuantityChanged. Carries the new absolute quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineQuantityChanged {
    pub product_id: ProductId,
    pub quantity: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRemoved {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CartCleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCleared {
    pub occurred_at: DateTime<Utc>,
}

/// Event: VisibilityChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityChanged {
    pub open: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineProductRefreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineProductRefreshed {
    pub product: Product,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartEvent {
    LineAdded(LineAdded),
    LineQuantityChanged(LineQuantityChanged),
    LineRemoved(LineRemoved),
    CartCleared(CartCleared),
    VisibilityChanged(VisibilityChanged),
    LineProductRefreshed(LineProductRefreshed),
}

impl Event for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::LineAdded(_) => "cart.line.added",
            CartEvent::LineQuantityChanged(_) => "cart.line.quantity_changed",
            CartEvent::LineRemoved(_) => "cart.line.removed",
            CartEvent::CartCleared(_) => "cart.cleared",
            CartEvent::VisibilityChanged(_) => "cart.visibility_changed",
            CartEvent::LineProductRefreshed(_) => "cart.line.product_refreshed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CartEvent::LineAdded(e) => e.occurred_at,
            CartEvent::LineQuantityChanged(e) => e.occurred_at,
            CartEvent::LineRemoved(e) => e.occurred_at,
            CartEvent::CartCleared(e) => e.occurred_at,
            CartEvent::VisibilityChanged(e) => e.occurred_at,
            CartEvent::LineProductRefreshed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Cart {
    type Command = CartCommand;
    type Event = CartEvent;
    type Error = Infallible;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CartEvent::LineAdded(e) => {
                let id = e.product.id_typed();
                match self.lines.iter_mut().find(|l| l.product_id() == id) {
                    Some(line) => line.quantity = line.quantity.saturating_add(e.quantity),
                    None => self.lines.push(LineItem {
                        product: e.product.clone(),
                        quantity: e.quantity,
                    }),
                }
                self.lines.retain(|l| l.quantity > 0);
            }
            CartEvent::LineQuantityChanged(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.product_id() == e.product_id) {
                    line.quantity = e.quantity;
                }
                self.lines.retain(|l| l.quantity > 0);
            }
            CartEvent::LineRemoved(e) => {
                self.lines.retain(|l| l.product_id() != e.product_id);
            }
            CartEvent::CartCleared(_) => {
                self.lines.clear();
            }
            CartEvent::VisibilityChanged(e) => {
                self.open = e.open;
            }
            CartEvent::LineProductRefreshed(e) => {
                let id = e.product.id_typed();
                if let Some(line) = self.lines.iter_mut().find(|l| l.product_id() == id) {
                    line.product = e.product.clone();
                }
            }
        }

        // +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = match command {
            CartCommand::AddItem(cmd) => self.handle_add(cmd),
            CartCommand::RemoveItem(cmd) => self.handle_remove(cmd),
            CartCommand::UpdateQuantity(cmd) => self.handle_update_quantity(cmd),
            CartCommand::ClearCart(cmd) => self.handle_clear(cmd),
            CartCommand::ToggleVisibility(cmd) => vec![CartEvent::VisibilityChanged(
                VisibilityChanged {
                    open: !self.open,
                    occurred_at: cmd.occurred_at,
                },
            )],
            CartCommand::SetVisibility(cmd) => self.handle_set_visibility(cmd),
            CartCommand::RefreshProduct(cmd) => self.handle_refresh(cmd),
        };
        Ok(events)
    }
}

impl Cart {
    fn handle_add(&self, cmd: &AddItem) -> Vec<CartEvent> {
        // A zero-unit add would create a line that breaks the quantity invariant.
        if cmd.quantity == 0 {
            return vec![];
        }

        let Some(line) = self.line(cmd.product.id_typed()) else {
            return vec![CartEvent::LineAdded(LineAdded {
                product: cmd.product.clone(),
                quantity: cmd.quantity,
                occurred_at: cmd.occurred_at,
            })];
        };

        // A line already at u64::MAX cannot grow; nothing changes.
        let quantity = line.quantity.saturating_add(cmd.quantity);
        if quantity == line.quantity {
            return vec![];
        }

        vec![CartEvent::LineQuantityChanged(LineQuantityChanged {
            product_id: line.product_id(),
            quantity,
            occurred_at: cmd.occurred_at,
        })]
    }

    fn handle_remove(&self, cmd: &RemoveItem) -> Vec<CartEvent> {
        if self.line(cmd.product_id).is_none() {
            return vec![];
        }

        vec![CartEvent::LineRemoved(LineRemoved {
            product_id: cmd.product_id,
            occurred_at: cmd.occurred_at,
        })]
    }

    fn handle_update_quantity(&self, cmd: &UpdateQuantity) -> Vec<CartEvent> {
        let Some(line) = self.line(cmd.product_id) else {
            return vec![];
        };

        if cmd.quantity <= 0 {
            return vec![CartEvent::LineRemoved(LineRemoved {
                product_id: cmd.product_id,
                occurred_at: cmd.occurred_at,
            })];
        }

        let quantity = cmd.quantity.unsigned_abs();
        if quantity == line.quantity {
            return vec![];
        }

        vec![CartEvent::LineQuantityChanged(LineQuantityChanged {
            product_id: cmd.product_id,
            quantity,
            occurred_at: cmd.occurred_at,
        })]
    }

    fn handle_clear(&self, cmd: &ClearCart) -> Vec<CartEvent> {
        if self.lines.is_empty() {
            return vec![];
        }

        vec![CartEvent::CartCleared(CartCleared {
            occurred_at: cmd.occurred_at,
        })]
    }

    fn handle_set_visibility(&self, cmd: &SetVisibility) -> Vec<CartEvent> {
        if cmd.open == self.open {
            return vec![];
        }

        vec![CartEvent::VisibilityChanged(VisibilityChanged {
            open: cmd.open,
            occurred_at: cmd.occurred_at,
        })]
    }

    fn handle_refresh(&self, cmd: &RefreshProduct) -> Vec<CartEvent> {
        match self.line(cmd.product.id_typed()) {
            Some(line) if line.product != cmd.product => {
                vec![CartEvent::LineProductRefreshed(LineProductRefreshed {
                    product: cmd.product.clone(),
                    occurred_at: cmd.occurred_at,
                })]
            }
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_catalog::Catalog;

    fn test_session_id() -> SessionId {
        SessionId::new()
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_product(price: u64) -> Product {
        Product::new(
            ProductId::generate(),
            "Test Product",
            "misc",
            Money::from_minor(price),
            10,
        )
        .unwrap()
    }

    #[test]
    fn new_cart_is_empty_and_closed() {
        let cart = Cart::empty(test_session_id());
        assert!(cart.is_empty());
        assert!(!cart.is_open());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.subtotal(), Money::ZERO);
        assert_eq!(cart.version(), 0);
    }

    #[test]
    fn add_item_defaults_to_one_unit() {
        let mut cart = Cart::empty(test_session_id());
        let product = test_product(100);

        let events = cart.add_one(product.clone());

        assert_eq!(events.len(), 1);
        match &events[0] {
            CartEvent::LineAdded(e) => {
                assert_eq!(e.product, product);
                assert_eq!(e.quantity, 1);
            }
            _ => panic!("Expected LineAdded event"),
        }
        assert_eq!(cart.quantity_of(product.id_typed()), 1);
    }

    #[test]
    fn adding_same_product_merges_quantities() {
        let mut cart = Cart::empty(test_session_id());
        let p1 = test_product(100);

        cart.add_item(p1.clone(), 1);
        let events = cart.add_item(p1.clone(), 2);

        match &events[0] {
            CartEvent::LineQuantityChanged(e) => assert_eq!(e.quantity, 3),
            _ => panic!("Expected LineQuantityChanged event"),
        }
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(p1.id_typed()), 3);
    }

    #[test]
    fn merge_keeps_first_embedded_product() {
        let mut cart = Cart::empty(test_session_id());
        let p1 = test_product(100);

        cart.add_item(p1.clone(), 1);
        cart.add_item(p1.with_price(Money::from_minor(500)), 1);

        assert_eq!(cart.line(p1.id_typed()).unwrap().product(), &p1);
        assert_eq!(cart.subtotal(), Money::from_minor(200));
    }

    #[test]
    fn distinct_products_get_their_own_lines_in_insertion_order() {
        let mut cart = Cart::empty(test_session_id());
        let a = test_product(100);
        let b = test_product(200);

        cart.add_item(a.clone(), 2);
        cart.add_item(b.clone(), 3);

        let ids: Vec<_> = cart.lines().iter().map(LineItem::product_id).collect();
        assert_eq!(ids, vec![a.id_typed(), b.id_typed()]);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn zero_quantity_add_is_a_noop() {
        let mut cart = Cart::empty(test_session_id());
        let events = cart.add_item(test_product(100), 0);
        assert!(events.is_empty());
        assert!(cart.is_empty());
        assert_eq!(cart.version(), 0);
    }

    #[test]
    fn remove_item_drops_the_line() {
        let mut cart = Cart::empty(test_session_id());
        let p = test_product(100);
        cart.add_item(p.clone(), 4);

        let events = cart.remove_item(p.id_typed());

        assert_eq!(events.len(), 1);
        assert!(cart.is_empty());
    }

    #[test]
    fn removing_absent_product_leaves_state_unchanged() {
        let mut cart = Cart::empty(test_session_id());
        cart.add_item(test_product(100), 2);
        let before = cart.clone();

        let events = cart.remove_item(ProductId::generate());

        assert!(events.is_empty());
        assert_eq!(cart, before);
    }

    #[test]
    fn update_quantity_sets_absolute_value() {
        let mut cart = Cart::empty(test_session_id());
        let p = test_product(100);
        cart.add_item(p.clone(), 3);

        cart.update_quantity(p.id_typed(), 7);

        assert_eq!(cart.quantity_of(p.id_typed()), 7);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn update_quantity_to_zero_removes_the_line() {
        let mut cart = Cart::empty(test_session_id());
        let p1 = test_product(100);
        cart.add_item(p1.clone(), 3);

        let events = cart.update_quantity(p1.id_typed(), 0);

        match &events[0] {
            CartEvent::LineRemoved(e) => assert_eq!(e.product_id, p1.id_typed()),
            _ => panic!("Expected LineRemoved event"),
        }
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn update_quantity_to_negative_removes_the_line() {
        let mut cart = Cart::empty(test_session_id());
        let p = test_product(100);
        cart.add_item(p.clone(), 3);

        cart.update_quantity(p.id_typed(), -4);

        assert!(cart.line(p.id_typed()).is_none());
    }

    #[test]
    fn update_quantity_of_absent_product_is_a_noop() {
        let mut cart = Cart::empty(test_session_id());
        cart.add_item(test_product(100), 1);
        let before = cart.clone();

        assert!(cart.update_quantity(ProductId::generate(), 5).is_empty());
        assert!(cart.update_quantity(ProductId::generate(), 0).is_empty());
        assert_eq!(cart, before);
    }

    #[test]
    fn update_quantity_accepts_any_positive_i64() {
        let mut cart = Cart::empty(test_session_id());
        let p = test_product(1);
        cart.add_item(p.clone(), 1);

        cart.update_quantity(p.id_typed(), i64::MAX);

        assert_eq!(cart.quantity_of(p.id_typed()), i64::MAX as u64);
    }

    #[test]
    fn merge_beyond_u32_keeps_every_unit() {
        let mut cart = Cart::empty(test_session_id());
        let p = test_product(1);

        cart.add_item(p.clone(), u64::from(u32::MAX));
        let events = cart.add_item(p.clone(), 5);

        assert_eq!(events.len(), 1);
        assert_eq!(cart.quantity_of(p.id_typed()), u64::from(u32::MAX) + 5);
        assert_eq!(cart.item_count(), u64::from(u32::MAX) + 5);
    }

    #[test]
    fn merge_into_full_line_is_a_noop() {
        let mut cart = Cart::empty(test_session_id());
        let p = test_product(1);
        cart.add_item(p.clone(), u64::MAX);
        let version = cart.version();

        let events = cart.add_item(p.clone(), 5);

        assert!(events.is_empty());
        assert_eq!(cart.version(), version);
        assert_eq!(cart.quantity_of(p.id_typed()), u64::MAX);
    }

    #[test]
    fn item_count_saturates_across_lines() {
        let mut cart = Cart::empty(test_session_id());
        cart.add_item(test_product(1), u64::MAX);
        cart.add_item(test_product(1), 3);

        assert_eq!(cart.item_count(), u64::MAX);
    }

    #[test]
    fn subtotal_sums_price_times_quantity() {
        let mut cart = Cart::empty(test_session_id());
        cart.add_item(test_product(10), 2);
        cart.add_item(test_product(5), 3);

        assert_eq!(cart.subtotal(), Money::from_minor(35));
    }

    #[test]
    fn clear_empties_lines_but_keeps_visibility() {
        let mut cart = Cart::empty(test_session_id());
        cart.set_visibility(true);
        cart.add_item(test_product(10), 2);
        cart.add_item(test_product(20), 1);

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert!(cart.is_open());
    }

    #[test]
    fn clearing_an_empty_cart_emits_nothing() {
        let mut cart = Cart::empty(test_session_id());
        assert!(cart.clear().is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn remove_then_add_starts_from_scratch() {
        let mut cart = Cart::empty(test_session_id());
        let p = test_product(10);

        cart.add_item(p.clone(), 2);
        cart.remove_item(p.id_typed());
        cart.add_item(p.clone(), 5);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(p.id_typed()), 5);
    }

    #[test]
    fn toggle_visibility_flips_the_flag() {
        let mut cart = Cart::empty(test_session_id());
        cart.toggle_visibility();
        assert!(cart.is_open());
        cart.toggle_visibility();
        assert!(!cart.is_open());
        assert_eq!(cart.version(), 2);
    }

    #[test]
    fn set_visibility_to_current_value_is_a_noop() {
        let mut cart = Cart::empty(test_session_id());
        assert!(cart.set_visibility(false).is_empty());
        assert_eq!(cart.set_visibility(true).len(), 1);
        assert!(cart.is_open());
    }

    #[test]
    fn visibility_does_not_touch_lines() {
        let mut cart = Cart::empty(test_session_id());
        cart.add_item(test_product(10), 2);
        let lines_before = cart.lines().to_vec();

        cart.toggle_visibility();

        assert_eq!(cart.lines(), lines_before.as_slice());
    }

    #[test]
    fn refreshed_product_price_shows_in_next_subtotal() {
        let mut cart = Cart::empty(test_session_id());
        let p = test_product(100);
        cart.add_item(p.clone(), 3);

        let events = cart.refresh_product(p.with_price(Money::from_minor(80)));

        assert_eq!(events.len(), 1);
        assert_eq!(cart.quantity_of(p.id_typed()), 3);
        assert_eq!(cart.subtotal(), Money::from_minor(240));
    }

    #[test]
    fn refreshing_product_not_in_cart_is_a_noop() {
        let mut cart = Cart::empty(test_session_id());
        assert!(cart.refresh_product(test_product(5)).is_empty());
        assert!(cart.is_empty());
    }

    #[test]
    fn refreshing_with_identical_product_is_a_noop() {
        let mut cart = Cart::empty(test_session_id());
        let p = test_product(5);
        cart.add_one(p.clone());
        assert!(cart.refresh_product(p).is_empty());
    }

    #[test]
    fn subtotal_with_uses_current_catalog_prices() {
        let mut catalog = Catalog::demo();
        let headphones = catalog.get(storefront_catalog::demo_product_id(1)).unwrap().clone();
        let mut cart = Cart::empty(test_session_id());
        cart.add_item(headphones.clone(), 2);

        catalog
            .set_price(headphones.id_typed(), Money::from_minor(10_000))
            .unwrap();

        assert_eq!(cart.subtotal(), Money::from_minor(25_998));
        assert_eq!(cart.subtotal_with(&catalog), Money::from_minor(20_000));
    }

    #[test]
    fn subtotal_with_falls_back_to_embedded_price_for_unlisted_products() {
        let mut cart = Cart::empty(test_session_id());
        cart.add_item(test_product(40), 2);

        assert_eq!(cart.subtotal_with(&Catalog::new()), Money::from_minor(80));
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let mut cart = Cart::empty(test_session_id());
        let p = test_product(10);
        cart.add_item(p.clone(), 1);
        let before = cart.clone();

        let cmd = CartCommand::AddItem(AddItem::new(p, test_time()).with_quantity(4));
        let events1 = cart.handle(&cmd).unwrap();
        let events2 = cart.handle(&cmd).unwrap();

        assert_eq!(cart, before);
        assert_eq!(events1, events2);
    }

    #[test]
    fn replay_rebuilds_the_same_state() {
        let mut cart = Cart::empty(test_session_id());
        let a = test_product(10);
        let b = test_product(20);

        let mut history = Vec::new();
        history.extend(cart.add_item(a.clone(), 2));
        history.extend(cart.add_item(b.clone(), 1));
        history.extend(cart.add_item(a.clone(), 1));
        history.extend(cart.update_quantity(b.id_typed(), 0));
        history.extend(cart.toggle_visibility());

        let rebuilt = Cart::replay(cart.id_typed(), &history);

        assert_eq!(rebuilt, cart);
        assert_eq!(rebuilt.version(), history.len() as u64);
    }

    #[test]
    fn event_types_are_namespaced() {
        let event = CartEvent::CartCleared(CartCleared {
            occurred_at: test_time(),
        });
        assert_eq!(event.event_type(), "cart.cleared");
        assert_eq!(event.version(), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(usize, u64),
            Remove(usize),
            Update(usize, i64),
            Clear,
            Toggle,
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0usize..4, 0u64..20).prop_map(|(p, q)| Op::Add(p, q)),
                (0usize..4).prop_map(Op::Remove),
                (0usize..4, -5i64..20).prop_map(|(p, q)| Op::Update(p, q)),
                Just(Op::Clear),
                Just(Op::Toggle),
            ]
        }

        fn fixture_products() -> Vec<Product> {
            (1..=4u64)
                .map(|n| test_product(n * 10))
                .collect()
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: ids stay unique and quantities positive after any operation sequence.
            #[test]
            fn invariants_hold_after_any_sequence(ops in proptest::collection::vec(op_strategy(), 0..60)) {
                let products = fixture_products();
                let mut cart = Cart::empty(test_session_id());

                for op in ops {
                    match op {
                        Op::Add(p, q) => { cart.add_item(products[p].clone(), q); }
                        Op::Remove(p) => { cart.remove_item(products[p].id_typed()); }
                        Op::Update(p, q) => { cart.update_quantity(products[p].id_typed(), q); }
                        Op::Clear => { cart.clear(); }
                        Op::Toggle => { cart.toggle_visibility(); }
                    }

                    let mut ids: Vec<_> = cart.lines().iter().map(LineItem::product_id).collect();
                    let len = ids.len();
                    ids.sort_by_key(|id| *id.0.as_uuid());
                    ids.dedup();
                    prop_assert_eq!(ids.len(), len);
                    prop_assert!(cart.lines().iter().all(|l| l.quantity() > 0));

                    let expected_count: u64 = cart.lines().iter().map(LineItem::quantity).sum();
                    prop_assert_eq!(cart.item_count(), expected_count);
                }
            }

            /// Property: adding distinct products sums quantities and keeps one line each.
            #[test]
            fn distinct_adds_sum_quantities(quantities in proptest::collection::vec(1u64..50, 0..20)) {
                let mut cart = Cart::empty(test_session_id());
                for q in &quantities {
                    cart.add_item(test_product(3), *q);
                }

                let expected: u64 = quantities.iter().sum();
                prop_assert_eq!(cart.item_count(), expected);
                prop_assert_eq!(cart.lines().len(), quantities.len());
                prop_assert_eq!(cart.subtotal(), Money::from_minor(expected * 3));
            }

            /// Property: repeated adds of one product merge into a single line.
            #[test]
            fn repeated_adds_merge(n in 1u64..1_000, m in 1u64..1_000) {
                let p = test_product(1);
                let mut cart = Cart::empty(test_session_id());
                cart.add_item(p.clone(), n);
                cart.add_item(p.clone(), m);

                prop_assert_eq!(cart.lines().len(), 1);
                prop_assert_eq!(cart.quantity_of(p.id_typed()), n + m);
            }

            /// Property: any non-positive update removes the line.
            #[test]
            fn non_positive_update_removes(start in 1u64..100, q in i64::MIN..=0) {
                let p = test_product(1);
                let mut cart = Cart::empty(test_session_id());
                cart.add_item(p.clone(), start);
                cart.update_quantity(p.id_typed(), q);
                prop_assert!(cart.is_empty());
            }
        }
    }
}
