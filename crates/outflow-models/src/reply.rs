use serde::{Deserialize, Serialize};

/// One conversation-list item whose text contained a reply marker.
/// `message` is the literal extracted text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyRecord {
    pub message: String,
}
