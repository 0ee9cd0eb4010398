//! Departure feed wire protocol
//!
//! JSON messages exchanged with the schedule feed over a streaming text
//! connection. The feed pushes two kinds of events: `heartbeat` (liveness
//! only) and `schedule` (a complete snapshot of upcoming trips). The client
//! sends exactly one `schedule:subscribe` request after each successful
//! connect.
//!
//! # Components
//!
//! - [`FeedMessage`]: Inbound events, decoded with a payload size bound
//! - [`TripRecord`]: One trip entry as the feed sends it (before styling)
//! - [`SubscribeRequest`]: Outbound subscription built from configuration
//! - [`ProtocolError`]: Decode/encode failures

#![forbid(unsafe_code)]

pub mod errors;
pub mod feed;
pub mod subscribe;

pub use errors::{ProtocolError, Result};
pub use feed::{DEFAULT_MAX_PAYLOAD_BYTES, FeedMessage, ScheduleData, TripRecord};
pub use subscribe::{SUBSCRIBE_EVENT, SubscribeRequest};
