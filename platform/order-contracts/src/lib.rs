//! # Order Event Contracts
//!
//! The shared wire vocabulary for order lifecycle propagation: one strongly
//! typed payload shape per event type, the order status code table, and the
//! fanout subjects every service binds to.
//!
//! Payloads are tagged variants — an envelope whose `payload` does not match
//! the shape declared by its `event_type` fails at decode time, before any
//! business logic runs. Unknown extra fields inside a payload are tolerated;
//! missing required fields are not.

mod events;
mod status;
pub mod subjects;

pub use events::{
    decode_event, encode_event, DecodeError, OrderCreatedV1, OrderEnvelope, OrderEventBody,
    OrderUpdatedV1, StatusChangedV1,
};
pub use status::{OrderStatus, UnknownStatus};
