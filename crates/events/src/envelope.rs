use chrono::{DateTime, Utc};
use serde::Serialize;

use storefront_core::{AggregateId, TenantId};

use crate::Event;

/// A published aggregate event, stamped with the tenant and stream position
/// it belongs to.
///
/// `sequence_number` equals the aggregate version right after the event was
/// applied, so a view that sees a gap knows it missed an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventEnvelope<E> {
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    aggregate_type: &'static str,
    sequence_number: u64,
    event_type: &'static str,
    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap `payload`; type name and timestamp are read from the event itself.
    pub fn new(
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: &'static str,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            tenant_id,
            aggregate_id,
            aggregate_type,
            sequence_number,
            event_type: payload.event_type(),
            occurred_at: payload.occurred_at(),
            payload,
        }
    }
}

impl<E> EventEnvelope<E> {
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &'static str {
        self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn event_type(&self) -> &'static str {
        self.event_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }
}
