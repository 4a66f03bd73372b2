//! `RasterFrame`, the common raster buffer type threaded through decode,
//! filter evaluation, and muxing. A source frame is decoded once and
//! normalized to `Bgr24` here (the format every `cv2.*` filter operates in);
//! `Scale` is the only filter allowed to change pixel format or
//! dimensions thereafter, per the distilled spec's "pixel-format coercion
//! is performed by Scale at explicit positions" rule.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixFmt {
    Bgr24,
    Rgb24,
    Yuv420p,
    Gray8,
}

impl PixFmt {
    /// Bytes per pixel for packed formats; for planar `Yuv420p` this is the
    /// average bytes-per-pixel across all three planes, used only for
    /// buffer-size sanity checks, not plane addressing.
    pub fn bytes_per_pixel(self) -> f32 {
        match self {
            PixFmt::Bgr24 | PixFmt::Rgb24 => 3.0,
            PixFmt::Gray8 => 1.0,
            PixFmt::Yuv420p => 1.5,
        }
    }

    pub fn to_ffmpeg(self) -> ffmpeg::format::Pixel {
        match self {
            PixFmt::Bgr24 => ffmpeg::format::Pixel::BGR24,
            PixFmt::Rgb24 => ffmpeg::format::Pixel::RGB24,
            PixFmt::Yuv420p => ffmpeg::format::Pixel::YUV420P,
            PixFmt::Gray8 => ffmpeg::format::Pixel::GRAY8,
        }
    }

    pub fn from_str_lossy(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bgr24" => Some(PixFmt::Bgr24),
            "rgb24" => Some(PixFmt::Rgb24),
            "yuv420p" => Some(PixFmt::Yuv420p),
            "gray8" | "gray" => Some(PixFmt::Gray8),
            _ => None,
        }
    }

    /// The name ffmpeg's CLI expects for this format as a `rawvideo`
    /// `-pix_fmt` argument.
    pub fn rawvideo_name(self) -> &'static str {
        match self {
            PixFmt::Bgr24 => "bgr24",
            PixFmt::Rgb24 => "rgb24",
            PixFmt::Yuv420p => "yuv420p",
            PixFmt::Gray8 => "gray",
        }
    }
}

/// A single decoded or filter-produced frame, in an explicit pixel format.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub pix_fmt: PixFmt,
    pub data: Vec<u8>,
}

impl RasterFrame {
    pub fn black(width: u32, height: u32, pix_fmt: PixFmt) -> Self {
        let len = (width as f32 * height as f32 * pix_fmt.bytes_per_pixel()) as usize;
        RasterFrame {
            width,
            height,
            pix_fmt,
            data: vec![0u8; len],
        }
    }

    pub fn filled(width: u32, height: u32, pix_fmt: PixFmt, color: [u8; 4]) -> Self {
        let mut frame = RasterFrame::black(width, height, pix_fmt);
        match pix_fmt {
            PixFmt::Bgr24 => {
                for px in frame.data.chunks_exact_mut(3) {
                    px.copy_from_slice(&color[..3]);
                }
            }
            PixFmt::Rgb24 => {
                for px in frame.data.chunks_exact_mut(3) {
                    px[0] = color[2];
                    px[1] = color[1];
                    px[2] = color[0];
                }
            }
            PixFmt::Gray8 => {
                for px in frame.data.iter_mut() {
                    *px = color[0];
                }
            }
            PixFmt::Yuv420p => {
                // No general BGR->YUV conversion here: `_black` with a
                // Yuv420p target is only ever used for the default (black)
                // color in practice, which is all-zero luma/chroma.
                frame.data.fill(0);
            }
        }
        frame
    }

    /// Packed-format stride in bytes (`0` for planar formats, where no
    /// single stride addresses the whole frame).
    pub fn stride(&self) -> usize {
        match self.pix_fmt {
            PixFmt::Bgr24 | PixFmt::Rgb24 => self.width as usize * 3,
            PixFmt::Gray8 => self.width as usize,
            PixFmt::Yuv420p => 0,
        }
    }

    pub fn pixel_offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = match self.pix_fmt {
            PixFmt::Bgr24 | PixFmt::Rgb24 => 3,
            PixFmt::Gray8 => 1,
            PixFmt::Yuv420p => return None,
        };
        Some(y as usize * self.stride() + x as usize * bpp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_frame_is_zeroed() {
        let frame = RasterFrame::black(4, 4, PixFmt::Bgr24);
        assert_eq!(frame.data.len(), 4 * 4 * 3);
        assert!(frame.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn filled_bgr24_writes_every_pixel() {
        let frame = RasterFrame::filled(2, 2, PixFmt::Bgr24, [10, 20, 30, 255]);
        assert_eq!(&frame.data[0..3], &[10, 20, 30]);
        assert_eq!(&frame.data[9..12], &[10, 20, 30]);
    }
}
