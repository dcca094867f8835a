//! Simulated assistant replies.

use rand::seq::SliceRandom;

/// Canned replies picked by [`CannedResponder`].
pub const CANNED_RESPONSES: [&str; 7] = [
    "That's interesting! Tell me more.",
    "I see what you're saying. What do you think about...?",
    "Could you clarify that a bit?",
    "That's a great point! Let's dive deeper.",
    "I'm not sure I understand. Can you elaborate?",
    "Interesting perspective! What about...?",
    "Could you provide an example?",
];

/// Produces the assistant's reply to a message.
pub trait Responder: Send + Sync {
    fn generate_response(&self) -> String;
}

/// Picks one of [`CANNED_RESPONSES`] uniformly at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedResponder;

impl Responder for CannedResponder {
    fn generate_response(&self) -> String {
        CANNED_RESPONSES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(CANNED_RESPONSES[0])
            .to_string()
    }
}
