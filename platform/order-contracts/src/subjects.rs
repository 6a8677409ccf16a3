//! Fanout subjects shared by all services.
//!
//! One subject per event category; each consuming service opens its own
//! subscription, so every service sees every event independently.

/// A new order was accepted by the storefront.
pub const ORDER_CREATED: &str = "orders.events.created";

/// Quantity or shipping details of an existing order changed.
pub const ORDER_UPDATED: &str = "orders.events.updated";

/// An order moved to a new lifecycle status.
pub const ORDER_STATUS_CHANGED: &str = "orders.events.status.changed";

/// Wildcard covering every order lifecycle event.
pub const ORDER_EVENTS_ALL: &str = "orders.events.>";

/// Side-channel carrying interaction log entries to the collector.
pub const INTERACTION_LOGS: &str = "platform.logs.interaction";
