//! Facewatch: webcam capture client and face-analysis relay.
//!
//! The root package only ties the workspace crates together for the
//! cross-crate integration tests under `tests/`.

pub use capture_client;
pub use common;
pub use face_relay;
