use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use telemetry::LogFormat;

use crate::encode::{FrameEncoder, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH};

#[derive(Debug, Parser)]
#[command(name = "face-capture")]
#[command(about = "Stream camera frames to a face-relay and show the analysis", long_about = None)]
pub struct ClientArgs {
    /// Base URL of the relay
    #[arg(long, env = "FACE_RELAY_URL", default_value = "http://127.0.0.1:3000")]
    pub server: Url,

    /// Shared access password
    #[arg(long, env = "FACE_RELAY_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Directory of still images replayed as the camera feed
    #[arg(long, env = "CAPTURE_FRAMES_DIR")]
    pub frames_dir: PathBuf,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: u8,

    #[arg(long, default_value_t = DEFAULT_MAX_WIDTH)]
    pub max_width: u32,

    #[arg(long, default_value_t = DEFAULT_MAX_HEIGHT)]
    pub max_height: u32,

    /// Log output: pretty, compact or json
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

impl ClientArgs {
    pub fn encoder(&self) -> FrameEncoder {
        FrameEncoder::new(self.max_width, self.max_height, self.jpeg_quality)
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse(&self.log_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_browser_client() {
        let args = ClientArgs::try_parse_from([
            "face-capture",
            "--server",
            "http://relay.local:3000",
            "--password",
            "hunter2",
            "--frames-dir",
            "/tmp/frames",
        ])
        .unwrap();

        assert_eq!(args.server.as_str(), "http://relay.local:3000/");
        assert_eq!(args.jpeg_quality, 80);
        assert_eq!((args.max_width, args.max_height), (640, 480));
    }

    #[test]
    fn test_out_of_range_quality_is_rejected() {
        let parsed = ClientArgs::try_parse_from([
            "face-capture",
            "--password",
            "x",
            "--frames-dir",
            "/tmp/frames",
            "--jpeg-quality",
            "0",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_malformed_server_url_is_rejected() {
        let parsed = ClientArgs::try_parse_from([
            "face-capture",
            "--server",
            "not a url",
            "--password",
            "x",
            "--frames-dir",
            "/tmp/frames",
        ]);
        assert!(parsed.is_err());
    }
}
