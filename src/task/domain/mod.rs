//! Domain model for task status tracking.
//!
//! The domain covers task records, their lifecycle status, the queue message
//! stored with each record, and the field sets merged on upsert. It holds no
//! infrastructure concerns.

mod error;
mod fields;
mod ids;
mod message;
mod query;
mod record;
mod status;

pub use error::{MessageDecodeError, MessageEncodeError, ParseTaskStatusError};
pub use fields::{TaskFields, TaskUpsert};
pub use ids::TaskId;
pub use message::Message;
pub use query::{TaskQuery, listing_order};
pub use record::{PersistedTaskRecord, TaskRecord};
pub use status::TaskStatus;
