//! Camera devices and the folder-replay backend.

use crate::config::{CameraConfig, CameraSource};
use crate::error::CameraError;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// One frame as delivered by a camera device.
pub type Frame = RgbaImage;

/// A streaming frame source.
pub trait CameraDevice: Send {
    fn name(&self) -> &str;

    /// Block until the next frame is available.
    fn next_frame(&mut self) -> Result<Frame, CameraError>;
}

/// Acquires the default camera for a new session.
pub trait CameraProvider {
    fn open_default(&self) -> Result<Box<dyn CameraDevice>, CameraError>;
}

impl<P: CameraProvider + ?Sized> CameraProvider for Box<P> {
    fn open_default(&self) -> Result<Box<dyn CameraDevice>, CameraError> {
        (**self).open_default()
    }
}

/// Pick the camera backend named by `cfg.source`.
pub fn provider_from_config(cfg: &CameraConfig) -> Result<Box<dyn CameraProvider>, CameraError> {
    match cfg.source {
        CameraSource::Folder => Ok(Box::new(FolderCameraProvider::from_config(cfg))),
        CameraSource::Webcam => webcam_provider(cfg),
    }
}

#[cfg(all(feature = "webcam", target_os = "linux"))]
fn webcam_provider(cfg: &CameraConfig) -> Result<Box<dyn CameraProvider>, CameraError> {
    Ok(Box::new(crate::webcam::WebcamProvider::from_config(cfg)))
}

#[cfg(not(all(feature = "webcam", target_os = "linux")))]
fn webcam_provider(_cfg: &CameraConfig) -> Result<Box<dyn CameraProvider>, CameraError> {
    Err(CameraError::NoDevice {
        reason: "webcam support requires Linux and the `webcam` feature".to_string(),
    })
}

/// Replays the images in a directory as a looping camera feed.
pub struct FolderCamera {
    name: String,
    frames: Vec<PathBuf>,
    cursor: usize,
    interval: Duration,
    last_frame_at: Option<Instant>,
}

impl FolderCamera {
    pub fn open(
        dir: impl AsRef<Path>,
        recursive: bool,
        interval: Duration,
    ) -> Result<Self, CameraError> {
        let dir = dir.as_ref();
        let frames = list_frames(dir, recursive)?;
        if frames.is_empty() {
            return Err(CameraError::NoDevice {
                reason: format!("no images in {}", dir.display()),
            });
        }
        tracing::info!(
            "Opened folder camera {} ({} frames)",
            dir.display(),
            frames.len()
        );
        Ok(Self {
            name: dir.display().to_string(),
            frames,
            cursor: 0,
            interval,
            last_frame_at: None,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn pace(&mut self) {
        if let Some(last) = self.last_frame_at {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last_frame_at = Some(Instant::now());
    }
}

impl CameraDevice for FolderCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        self.pace();
        for _ in 0..self.frames.len() {
            let path = &self.frames[self.cursor];
            self.cursor = (self.cursor + 1) % self.frames.len();
            match image::open(path) {
                Ok(img) => return Ok(img.to_rgba8()),
                Err(e) => tracing::warn!("Skipping unreadable frame {}: {}", path.display(), e),
            }
        }
        Err(CameraError::Exhausted {
            name: self.name.clone(),
        })
    }
}

/// Opens a [`FolderCamera`] per session from fixed settings.
#[derive(Debug, Clone)]
pub struct FolderCameraProvider {
    pub dir: PathBuf,
    pub recursive: bool,
    pub interval: Duration,
}

impl FolderCameraProvider {
    pub fn from_config(cfg: &CameraConfig) -> Self {
        Self {
            dir: cfg.frames_dir.clone(),
            recursive: cfg.recursive,
            interval: cfg.frame_interval(),
        }
    }
}

impl CameraProvider for FolderCameraProvider {
    fn open_default(&self) -> Result<Box<dyn CameraDevice>, CameraError> {
        let camera = FolderCamera::open(&self.dir, self.recursive, self.interval)?;
        Ok(Box::new(camera))
    }
}

/// List supported images under `dir`, sorted by path.
pub fn list_frames(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, CameraError> {
    if !dir.is_dir() {
        return Err(CameraError::NoDevice {
            reason: format!("{} is not a directory", dir.display()),
        });
    }

    let walker = if recursive {
        WalkDir::new(dir).into_iter()
    } else {
        WalkDir::new(dir).max_depth(1).into_iter()
    };

    let mut frames = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("walkdir error: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && is_supported_image(path) {
            frames.push(path.to_path_buf());
        }
    }
    frames.sort();
    Ok(frames)
}

fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            matches!(ext.as_str(), "jpg" | "jpeg" | "png")
        }
        None => false,
    }
}
