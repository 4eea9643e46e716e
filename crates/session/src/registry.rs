//! Per-session cart registry.
//!
//! Carts are keyed by `(tenant, session)` and owned by an explicitly
//! constructed `SessionCarts` value; there is no process-wide cart. Commands
//! go through the same pipeline for every cart:
//!
//! ```text
//! CartCommand
//!   ↓
//! 1. Open the session's cart (created empty on first use)
//!   ↓
//! 2. Decide + apply (storefront_events::execute)
//!   ↓
//! 3. Wrap events in tenant-scoped envelopes
//!   ↓
//! 4. Publish on the injected bus (badge counters, toasts, ...)
//! ```
//!
//! The registry takes `&mut self` throughout: one owner, one thread.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use storefront_cart::{AGGREGATE_TYPE, Cart, CartCommand, CartEvent, RefreshProduct};
use storefront_catalog::Product;
use storefront_core::{AggregateRoot, SessionId, TenantId};
use storefront_events::{EventBus, EventEnvelope, execute};

/// Envelope type published for every applied cart event.
pub type CartEnvelope = EventEnvelope<CartEvent>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The bus rejected an event. The cart change itself has already been applied.
    #[error("failed to publish cart event: {0}")]
    Publish(String),

    /// Every cart was repriced, but some of the resulting events were not published.
    #[error(
        "repriced {changed} cart(s); publishing failed for {} session(s)",
        .failures.len()
    )]
    Reprice {
        changed: usize,
        failures: Vec<RepriceFailure>,
    },
}

/// A session whose reprice event could not be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepriceFailure {
    pub session_id: SessionId,
    pub reason: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CartKey {
    tenant_id: TenantId,
    session_id: SessionId,
}

/// Carts of every open session, plus the bus their events go out on.
#[derive(Debug)]
pub struct SessionCarts<B> {
    carts: HashMap<CartKey, Cart>,
    bus: B,
}

/// Single entry point for cart creation, so every new cart is logged.
fn cart_entry(carts: &mut HashMap<CartKey, Cart>, key: CartKey) -> &mut Cart {
    carts.entry(key).or_insert_with(|| {
        info!(
            tenant_id = %key.tenant_id,
            session_id = %key.session_id,
            "cart opened"
        );
        Cart::empty(key.session_id)
    })
}

impl<B> SessionCarts<B> {
    pub fn new(bus: B) -> Self {
        Self {
            carts: HashMap::new(),
            bus,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// The session's cart, created empty if this is the first access.
    pub fn open(&mut self, tenant_id: TenantId, session_id: SessionId) -> &Cart {
        cart_entry(
            &mut self.carts,
            CartKey {
                tenant_id,
                session_id,
            },
        )
    }

    pub fn cart(&self, tenant_id: TenantId, session_id: SessionId) -> Option<&Cart> {
        self.carts.get(&CartKey {
            tenant_id,
            session_id,
        })
    }

    /// Discard the session's cart. Returns its final state, if it existed.
    pub fn end_session(&mut self, tenant_id: TenantId, session_id: SessionId) -> Option<Cart> {
        let removed = self.carts.remove(&CartKey {
            tenant_id,
            session_id,
        });
        if let Some(cart) = &removed {
            info!(
                %tenant_id,
                %session_id,
                item_count = cart.item_count(),
                "cart discarded"
            );
        }
        removed
    }

    /// Session ids with an open cart for `tenant_id`.
    pub fn sessions(&self, tenant_id: TenantId) -> Vec<SessionId> {
        self.carts
            .keys()
            .filter(|k| k.tenant_id == tenant_id)
            .map(|k| k.session_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.carts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carts.is_empty()
    }
}

impl<B> SessionCarts<B>
where
    B: EventBus<CartEnvelope>,
{
    /// Run `command` against the session's cart and publish what it emitted.
    ///
    /// Returns the published envelopes; empty when the command was a no-op.
    /// Sequence numbers equal the cart version right after each event.
    pub fn dispatch(
        &mut self,
        tenant_id: TenantId,
        session_id: SessionId,
        command: CartCommand,
    ) -> Result<Vec<CartEnvelope>, DispatchError> {
        let cart = cart_entry(
            &mut self.carts,
            CartKey {
                tenant_id,
                session_id,
            },
        );

        let base_version = cart.version();
        let Ok(events) = execute(&mut *cart, &command);

        debug!(
            %tenant_id,
            %session_id,
            emitted = events.len(),
            version = cart.version(),
            item_count = cart.item_count(),
            "cart command dispatched"
        );

        let envelopes: Vec<CartEnvelope> = events
            .into_iter()
            .zip(base_version + 1..)
            .map(|(event, sequence_number)| {
                EventEnvelope::new(
                    tenant_id,
                    session_id.into(),
                    AGGREGATE_TYPE,
                    sequence_number,
                    event,
                )
            })
            .collect();

        for envelope in &envelopes {
            self.bus
                .publish(envelope.clone())
                .map_err(|e| DispatchError::Publish(e.to_string()))?;
        }

        Ok(envelopes)
    }

    /// Push a changed catalog entry into every cart of `tenant_id` holding it.
    ///
    /// Every cart is visited even when publishing fails for some of them, so
    /// a tenant never ends up with two prices for one product. Returns the
    /// number of carts whose line changed; `DispatchError::Reprice` carries
    /// that count plus the sessions whose events were not published.
    pub fn reprice(
        &mut self,
        tenant_id: TenantId,
        product: &Product,
    ) -> Result<usize, DispatchError> {
        let mut changed = 0;
        let mut failures = Vec::new();

        for session_id in self.sessions(tenant_id) {
            let before = self.cart(tenant_id, session_id).map(|c| c.version());
            let result = self.dispatch(
                tenant_id,
                session_id,
                CartCommand::RefreshProduct(RefreshProduct {
                    product: product.clone(),
                    occurred_at: Utc::now(),
                }),
            );
            let after = self.cart(tenant_id, session_id).map(|c| c.version());

            if before != after {
                changed += 1;
            }
            if let Err(err) = result {
                warn!(%tenant_id, %session_id, error = %err, "reprice event not published");
                failures.push(RepriceFailure {
                    session_id,
                    reason: err.to_string(),
                });
            }
        }

        if changed > 0 {
            info!(%tenant_id, product_id = %product.id_typed(), carts = changed, "carts repriced");
        }

        if failures.is_empty() {
            Ok(changed)
        } else {
            Err(DispatchError::Reprice { changed, failures })
        }
    }
}
