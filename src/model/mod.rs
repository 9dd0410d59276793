//! Data model for archived Slack conversations.
//!
//! These types double as the wire format of the Slack Web API (they
//! deserialize straight from `conversations.*` responses) and as the on-disk
//! artifact format. Fields the model does not name are kept in `extra` maps
//! so a round trip through an artifact never loses data.

pub mod archive;
pub mod channel;
pub mod message;

pub use archive::*;
pub use channel::*;
pub use message::*;

use indexmap::IndexMap;
use serde_json::Value;

/// Raw JSON fields preserved for forward compatibility.
pub type UnknownFields = IndexMap<String, Value>;
