//! V4L2 webcam backend.

use crate::camera::{CameraDevice, CameraProvider, Frame};
use crate::config::CameraConfig;
use crate::error::CameraError;
use image::{ImageFormat, Rgba, RgbaImage};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

const BUFFER_COUNT: u32 = 4;
const MAX_CORRUPT_FRAMES: usize = 10;

/// A V4L2 capture device streaming MJPEG or YUYV frames.
pub struct WebcamCamera {
    name: String,
    stream: Stream<'static>,
    _device: Device,
    fourcc: FourCC,
    width: u32,
    height: u32,
}

impl WebcamCamera {
    pub fn open(index: usize, width: u32, height: u32) -> Result<Self, CameraError> {
        let path = format!("/dev/video{index}");
        let no_device = |e: std::io::Error| CameraError::NoDevice {
            reason: format!("{path}: {e}"),
        };
        let device = Device::new(index).map_err(no_device)?;
        let name = device
            .query_caps()
            .map(|caps| caps.card)
            .unwrap_or_else(|_| path.clone());

        let mut format = device.format().map_err(no_device)?;
        format.width = width;
        format.height = height;
        format.fourcc = FourCC::new(b"MJPG");
        let format = device.set_format(&format).map_err(no_device)?;
        if format.fourcc != FourCC::new(b"MJPG") && format.fourcc != FourCC::new(b"YUYV") {
            return Err(CameraError::NoDevice {
                reason: format!("{name}: unsupported pixel format {}", format.fourcc),
            });
        }

        let stream = Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(no_device)?;
        tracing::info!(
            "Opened webcam {} at {}x{} ({})",
            name,
            format.width,
            format.height,
            format.fourcc
        );
        Ok(Self {
            name,
            stream,
            _device: device,
            fourcc: format.fourcc,
            width: format.width,
            height: format.height,
        })
    }

    fn decode(&self, data: &[u8]) -> Result<Frame, String> {
        if self.fourcc == FourCC::new(b"MJPG") {
            image::load_from_memory_with_format(data, ImageFormat::Jpeg)
                .map(|img| img.to_rgba8())
                .map_err(|e| e.to_string())
        } else {
            yuyv_to_rgba(data, self.width, self.height)
                .ok_or_else(|| format!("short YUYV buffer ({} bytes)", data.len()))
        }
    }
}

impl CameraDevice for WebcamCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        for _ in 0..MAX_CORRUPT_FRAMES {
            let (buf, meta) =
                CaptureStream::next(&mut self.stream).map_err(|source| CameraError::Stream {
                    name: self.name.clone(),
                    source,
                })?;
            let used = (meta.bytesused as usize).min(buf.len());
            let data = buf[..used].to_vec();
            match self.decode(&data) {
                Ok(frame) => return Ok(frame),
                Err(e) => tracing::warn!("Dropping corrupt frame from {}: {}", self.name, e),
            }
        }
        Err(CameraError::Exhausted {
            name: self.name.clone(),
        })
    }
}

/// Opens `/dev/video{index}` per session.
#[derive(Debug, Clone)]
pub struct WebcamProvider {
    pub index: usize,
    pub width: u32,
    pub height: u32,
}

impl WebcamProvider {
    pub fn from_config(cfg: &CameraConfig) -> Self {
        Self {
            index: cfg.device_index,
            width: cfg.width,
            height: cfg.height,
        }
    }
}

impl CameraProvider for WebcamProvider {
    fn open_default(&self) -> Result<Box<dyn CameraDevice>, CameraError> {
        let camera = WebcamCamera::open(self.index, self.width, self.height)?;
        Ok(Box::new(camera))
    }
}

/// Convert packed YUYV 4:2:2 (BT.601, studio range) to RGBA.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Option<RgbaImage> {
    let needed = width as usize * height as usize * 2;
    if width % 2 != 0 || data.len() < needed {
        return None;
    }
    let mut out = RgbaImage::new(width, height);
    for (i, chunk) in data[..needed].chunks_exact(4).enumerate() {
        let [y0, u, y1, v] = [chunk[0], chunk[1], chunk[2], chunk[3]];
        let px = (i * 2) as u32;
        let (x, y) = (px % width, px / width);
        out.put_pixel(x, y, ycbcr_to_rgba(y0, u, v));
        out.put_pixel(x + 1, y, ycbcr_to_rgba(y1, u, v));
    }
    Some(out)
}

fn ycbcr_to_rgba(y: u8, u: u8, v: u8) -> Rgba<u8> {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let clamp = |x: i32| ((x + 128) >> 8).clamp(0, 255) as u8;
    Rgba([
        clamp(298 * c + 409 * e),
        clamp(298 * c - 100 * d - 208 * e),
        clamp(298 * c + 516 * d),
        255,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuyv_black_and_white() {
        let data = [16, 128, 235, 128];
        let img = yuyv_to_rgba(&data, 2, 1).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn yuyv_pixels_wrap_rows() {
        let data = [16, 128, 16, 128, 235, 128, 235, 128];
        let img = yuyv_to_rgba(&data, 2, 2).unwrap();
        assert_eq!(img.get_pixel(1, 0).0[0], 0);
        assert_eq!(img.get_pixel(0, 1).0[0], 255);
    }

    #[test]
    fn yuyv_rejects_short_or_odd_buffers() {
        assert!(yuyv_to_rgba(&[16, 128, 16], 2, 1).is_none());
        assert!(yuyv_to_rgba(&[16, 128, 16, 128, 16, 128], 3, 1).is_none());
    }
}
