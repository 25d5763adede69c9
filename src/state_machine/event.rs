//! Events that can occur in a session

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage {
        text: String,
        /// Assigned by the runtime, unique within the session
        request_id: u64,
    },
    Reset,

    // Gateway events
    GatewayReply {
        request_id: u64,
        text: String,
    },
    GatewayFailed {
        request_id: u64,
        message: String,
    },
}
