//! Frame sources.
//!
//! A [`Camera`] hands out a [`FrameStream`] while capture is running; the
//! stream owns the device and gives it back on [`FrameStream::stop`] or drop.

use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ClientError;

pub trait Camera: Send + Sync {
    /// Acquire the device. Fails if it is missing or busy.
    fn open(&self) -> Result<Box<dyn FrameStream>, ClientError>;
}

pub trait FrameStream: Send {
    /// Grab the current frame.
    fn grab(&mut self) -> Result<DynamicImage, ClientError>;

    /// Release the device. Idempotent.
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}

const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Replays the still images in a directory, in name order, as a looping feed.
#[derive(Debug, Clone)]
pub struct DirectoryCamera {
    dir: PathBuf,
}

impl DirectoryCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn list_frames(&self) -> Result<Vec<PathBuf>, ClientError> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| ClientError::Camera(format!("{}: {}", self.dir.display(), e)))?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        frames.sort();
        Ok(frames)
    }
}

impl Camera for DirectoryCamera {
    fn open(&self) -> Result<Box<dyn FrameStream>, ClientError> {
        let frames = self.list_frames()?;
        if frames.is_empty() {
            return Err(ClientError::Camera(format!(
                "no frames found in {}",
                self.dir.display()
            )));
        }
        info!(dir = %self.dir.display(), frames = frames.len(), "camera stream acquired");
        Ok(Box::new(DirectoryStream {
            frames,
            next: 0,
            live: true,
        }))
    }
}

struct DirectoryStream {
    frames: Vec<PathBuf>,
    next: usize,
    live: bool,
}

impl FrameStream for DirectoryStream {
    fn grab(&mut self) -> Result<DynamicImage, ClientError> {
        if !self.live {
            return Err(ClientError::Camera("stream has been stopped".to_string()));
        }
        let path = &self.frames[self.next];
        self.next = (self.next + 1) % self.frames.len();
        debug!(frame = %path.display(), "frame grabbed");
        image::open(path).map_err(|e| ClientError::Camera(format!("{}: {}", path.display(), e)))
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            info!("camera stream released");
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for DirectoryStream {
    fn drop(&mut self) {
        self.stop();
    }
}
