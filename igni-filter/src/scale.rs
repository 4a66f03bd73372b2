//! The `Scale` filter: resample to a target width/height/pix_fmt, or pass
//! the frame through untouched when all three already match. Uses
//! `ffmpeg-next`'s `software::scaling::Context` (libswscale), the same
//! crate the decode pool already links — no second image crate for this.
//!
//! `RasterFrame::data` for `Yuv420p` is the Y plane followed by the U and V
//! planes, each tightly packed (no row padding) with chroma planes at half
//! resolution in both dimensions — the layout libswscale itself uses for
//! `AV_PIX_FMT_YUV420P` once padding is stripped.

use igni_decode::{PixFmt, RasterFrame};

use crate::error::RenderError;

pub fn scale(frame: &RasterFrame, width: u32, height: u32, pix_fmt: PixFmt) -> Result<RasterFrame, RenderError> {
    if frame.width == width && frame.height == height && frame.pix_fmt == pix_fmt {
        return Ok(frame.clone());
    }

    let mut src = ffmpeg::util::frame::Video::new(frame.pix_fmt.to_ffmpeg(), frame.width, frame.height);
    copy_into_ffmpeg_frame(frame, &mut src);

    let mut ctx = ffmpeg::software::scaling::Context::get(
        frame.pix_fmt.to_ffmpeg(),
        frame.width,
        frame.height,
        pix_fmt.to_ffmpeg(),
        width,
        height,
        ffmpeg::software::scaling::Flags::BILINEAR,
    )
    .map_err(|e| RenderError::new("Scale", None, e.to_string()))?;

    let mut dst = ffmpeg::util::frame::Video::new(pix_fmt.to_ffmpeg(), width, height);
    ctx.run(&src, &mut dst).map_err(|e| RenderError::new("Scale", None, e.to_string()))?;

    Ok(raster_from_ffmpeg_frame(&dst, width, height, pix_fmt))
}

fn packed_bytes_per_row(pix_fmt: PixFmt, width: u32) -> usize {
    match pix_fmt {
        PixFmt::Bgr24 | PixFmt::Rgb24 => width as usize * 3,
        PixFmt::Gray8 | PixFmt::Yuv420p => width as usize,
    }
}

fn copy_plane(src: &[u8], src_row_bytes: usize, dst: &mut [u8], dst_stride: usize, rows: usize) {
    for row in 0..rows {
        let s = row * src_row_bytes;
        let d = row * dst_stride;
        dst[d..d + src_row_bytes].copy_from_slice(&src[s..s + src_row_bytes]);
    }
}

fn copy_into_ffmpeg_frame(raster: &RasterFrame, frame: &mut ffmpeg::util::frame::Video) {
    if raster.pix_fmt == PixFmt::Yuv420p {
        let (w, h) = (raster.width as usize, raster.height as usize);
        let (cw, ch) = ((w + 1) / 2, (h + 1) / 2);
        let y_len = w * h;
        let c_len = cw * ch;

        let y_stride = frame.stride(0);
        copy_plane(&raster.data[0..y_len], w, frame.data_mut(0), y_stride, h);
        let u_stride = frame.stride(1);
        copy_plane(&raster.data[y_len..y_len + c_len], cw, frame.data_mut(1), u_stride, ch);
        let v_stride = frame.stride(2);
        copy_plane(&raster.data[y_len + c_len..y_len + 2 * c_len], cw, frame.data_mut(2), v_stride, ch);
        return;
    }

    let row_bytes = packed_bytes_per_row(raster.pix_fmt, raster.width);
    let stride = frame.stride(0);
    copy_plane(&raster.data, row_bytes, frame.data_mut(0), stride, raster.height as usize);
}

fn raster_from_ffmpeg_frame(frame: &ffmpeg::util::frame::Video, width: u32, height: u32, pix_fmt: PixFmt) -> RasterFrame {
    if pix_fmt == PixFmt::Yuv420p {
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = ((w + 1) / 2, (h + 1) / 2);
        let mut data = Vec::with_capacity(w * h + 2 * cw * ch);

        for (plane_idx, (rows, row_bytes)) in [(h, w), (ch, cw), (ch, cw)].into_iter().enumerate() {
            let stride = frame.stride(plane_idx);
            let plane = frame.data(plane_idx);
            for row in 0..rows {
                let start = row * stride;
                data.extend_from_slice(&plane[start..start + row_bytes]);
            }
        }

        return RasterFrame {
            width,
            height,
            pix_fmt,
            data,
        };
    }

    let stride = frame.stride(0);
    let plane = frame.data(0);
    let row_bytes = packed_bytes_per_row(pix_fmt, width);

    let mut data = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        data.extend_from_slice(&plane[start..start + row_bytes]);
    }

    RasterFrame {
        width,
        height,
        pix_fmt,
        data,
    }
}
