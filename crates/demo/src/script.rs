//! Scripted shopping session against the fixture catalog.

use anyhow::Context;
use chrono::Utc;

use storefront_cart::{AddItem, CartCommand, CartSummary, SetVisibility, UpdateQuantity};
use storefront_catalog::{Catalog, Money, demo_product_id};
use storefront_core::SessionId;
use storefront_events::{EventBus, InMemoryEventBus};
use storefront_session::{CartEnvelope, SessionCarts};

use crate::config::DemoConfig;

/// Run one session: browse, fill the cart, adjust, survive a price change.
///
/// Returns the final cart summary. Every published event is logged.
pub fn run(config: &DemoConfig) -> anyhow::Result<CartSummary> {
    let mut catalog = Catalog::demo();
    let mut carts: SessionCarts<InMemoryEventBus<CartEnvelope>> =
        SessionCarts::new(InMemoryEventBus::new());
    let feed = carts.bus().subscribe();

    let tenant_id = config.tenant_id;
    let session_id = SessionId::new();
    carts.open(tenant_id, session_id);

    let headphones = demo_product_id(1);
    let mug = demo_product_id(6);
    let tee = demo_product_id(5);

    for (id, quantity) in [(headphones, 1), (mug, 2), (headphones, 1), (tee, 3)] {
        let product = catalog
            .get(id)
            .cloned()
            .with_context(|| format!("product {id} missing from demo catalog"))?;
        carts.dispatch(
            tenant_id,
            session_id,
            CartCommand::AddItem(AddItem::new(product, Utc::now()).with_quantity(quantity)),
        )?;
    }

    carts.dispatch(
        tenant_id,
        session_id,
        CartCommand::UpdateQuantity(UpdateQuantity {
            product_id: tee,
            quantity: 1,
            occurred_at: Utc::now(),
        }),
    )?;

    let discounted = catalog.set_price(mug, Money::from_minor(1_200))?;
    carts.reprice(tenant_id, &discounted)?;

    carts.dispatch(
        tenant_id,
        session_id,
        CartCommand::SetVisibility(SetVisibility {
            open: config.open_cart,
            occurred_at: Utc::now(),
        }),
    )?;

    for envelope in feed.drain() {
        let payload = serde_json::to_string(envelope.payload())
            .context("failed to encode cart event")?;
        tracing::info!(
            event_type = envelope.event_type(),
            sequence = envelope.sequence_number(),
            occurred_at = %envelope.occurred_at(),
            %payload,
            "cart event"
        );
    }

    let summary = carts
        .end_session(tenant_id, session_id)
        .map(|cart| cart.summary())
        .context("demo session cart vanished")?;

    Ok(summary)
}
