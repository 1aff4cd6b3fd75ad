pub mod analysis;
pub mod api;
pub mod image_payload;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
