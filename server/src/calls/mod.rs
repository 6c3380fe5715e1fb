//! Audio/video call signaling.
//!
//! The relay only ferries WebRTC signaling payloads between two peers. Call
//! sessions, their lifecycle and durations are tracked elsewhere.

pub mod signaling;
