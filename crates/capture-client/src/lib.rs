pub mod api;
pub mod camera;
pub mod capture;
pub mod config;
pub mod encode;
pub mod error;
pub mod render;

pub use api::{HttpRelayClient, RelayApi};
pub use camera::{Camera, DirectoryCamera, FrameStream};
pub use capture::{CaptureExit, CaptureLoop, CaptureState};
pub use config::ClientArgs;
pub use encode::FrameEncoder;
pub use error::ClientError;
pub use render::{Renderer, TerminalRenderer};
