//! Conversation control packets.
//!
//! Both travel as fresh packets (new random id) and are routed by type tag on
//! the receiving side; field names match the established wire format.

use serde::{Deserialize, Serialize};

use crate::packet::Packet;

/// Sent by the initiator to open a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStart {
    /// Type tag of the packets this conversation carries.
    pub clazz: String,
    #[serde(rename = "conversationID")]
    pub conversation_id: String,
}

impl Packet for ConversationStart {
    const TAG: &'static str = "ConversationStartPacket";
}

/// Sent by either side to close a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEnd {
    #[serde(rename = "conversationID")]
    pub conversation_id: String,
}

impl Packet for ConversationEnd {
    const TAG: &'static str = "ConversationEndPacket";
}
