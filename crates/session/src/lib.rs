//! Session-scoped cart registry: one cart per `(tenant, session)`, commands
//! dispatched through the decide/apply pipeline and published as envelopes.

pub mod registry;

pub use registry::{CartEnvelope, DispatchError, RepriceFailure, SessionCarts};
