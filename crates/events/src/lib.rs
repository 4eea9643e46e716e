//! Event plumbing shared by the storefront aggregates: the `Event` trait,
//! tenant-scoped envelopes, an in-memory bus and the decide/apply executor.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
