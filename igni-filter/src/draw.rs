//! Filter bodies for every registered `cv2.*` / `_*` filter, evaluated
//! against already-decoded/already-evaluated `RasterFrame` arguments and a
//! resolved kwarg map. Each function is a pure `(frames, kwargs) -> frame`
//! mapping, per the distilled spec's filter-executor contract.

use std::collections::HashMap;

use igni_decode::{PixFmt, RasterFrame};
use igni_expr::Data;

use crate::error::RenderError;
use crate::geometry::{self, Color};
use crate::text;

fn fail(name: &str, cause: impl Into<String>) -> RenderError {
    RenderError::new(name, None, cause.into())
}

fn kwarg<'a>(name: &str, kwargs: &'a HashMap<String, Data>, filter: &str) -> Result<&'a Data, RenderError> {
    kwargs
        .get(name)
        .ok_or_else(|| fail(filter, format!("missing required kwarg {name:?}")))
}

fn kwarg_int(name: &str, kwargs: &HashMap<String, Data>, filter: &str) -> Result<i64, RenderError> {
    kwarg(name, kwargs, filter)?
        .as_int()
        .ok_or_else(|| fail(filter, format!("kwarg {name:?} is not numeric")))
}

fn kwarg_int_opt(name: &str, kwargs: &HashMap<String, Data>, default: i64) -> i64 {
    kwargs.get(name).and_then(Data::as_int).unwrap_or(default)
}

fn kwarg_f64(name: &str, kwargs: &HashMap<String, Data>, filter: &str) -> Result<f64, RenderError> {
    kwarg(name, kwargs, filter)?
        .as_f64()
        .ok_or_else(|| fail(filter, format!("kwarg {name:?} is not numeric")))
}

fn kwarg_str<'a>(name: &'a str, kwargs: &'a HashMap<String, Data>, filter: &str) -> Result<&'a str, RenderError> {
    kwarg(name, kwargs, filter)?
        .as_str()
        .ok_or_else(|| fail(filter, format!("kwarg {name:?} is not a string")))
}

fn kwarg_point(name: &str, kwargs: &HashMap<String, Data>, filter: &str) -> Result<(i64, i64), RenderError> {
    kwarg(name, kwargs, filter)?
        .as_point()
        .ok_or_else(|| fail(filter, format!("kwarg {name:?} is not a 2-element point")))
}

fn kwarg_color(name: &str, kwargs: &HashMap<String, Data>, filter: &str) -> Result<Color, RenderError> {
    let c = kwarg(name, kwargs, filter)?
        .as_color()
        .ok_or_else(|| fail(filter, format!("kwarg {name:?} is not a BGR(A) color")))?;
    Ok([c[0] as u8, c[1] as u8, c[2] as u8, c[3] as u8])
}

fn pix_fmt_kwarg(kwargs: &HashMap<String, Data>, filter: &str) -> Result<PixFmt, RenderError> {
    let name = kwarg_str("pix_fmt", kwargs, filter)?;
    PixFmt::from_str_lossy(name).ok_or_else(|| fail(filter, format!("unknown pix_fmt {name:?}")))
}

pub fn black(kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let width = kwarg_int("width", kwargs, "_black")? as u32;
    let height = kwarg_int("height", kwargs, "_black")? as u32;
    let pix_fmt = pix_fmt_kwarg(kwargs, "_black")?;
    let color = kwargs
        .get("color")
        .and_then(Data::as_color)
        .map(|c| [c[0] as u8, c[1] as u8, c[2] as u8, c[3] as u8])
        .unwrap_or([0, 0, 0, 255]);
    Ok(RasterFrame::filled(width, height, pix_fmt, color))
}

pub fn inline_mat(kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let width = kwarg_int("width", kwargs, "_inline_mat")? as u32;
    let height = kwarg_int("height", kwargs, "_inline_mat")? as u32;
    let pix_fmt = pix_fmt_kwarg(kwargs, "_inline_mat")?;
    let raw = kwarg("data", kwargs, "_inline_mat")?
        .as_bytes()
        .ok_or_else(|| fail("_inline_mat", "kwarg \"data\" is not bytes"))?;

    let data = if kwargs.get("compression").and_then(Data::as_str) == Some("gzip") {
        use std::io::Read;
        let mut out = Vec::new();
        flate2::read::GzDecoder::new(raw)
            .read_to_end(&mut out)
            .map_err(|e| fail("_inline_mat", e.to_string()))?;
        out
    } else {
        raw.to_vec()
    };

    let expected = (width as f32 * height as f32 * pix_fmt.bytes_per_pixel()) as usize;
    if data.len() != expected {
        return Err(fail(
            "_inline_mat",
            format!("expected {expected} bytes for {width}x{height} {pix_fmt:?}, got {}", data.len()),
        ));
    }

    Ok(RasterFrame {
        width,
        height,
        pix_fmt,
        data,
    })
}

pub fn slice_mat(frame: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let y0 = kwarg_int("y0", kwargs, "_slice_mat")?;
    let y1 = kwarg_int("y1", kwargs, "_slice_mat")?;
    let x0 = kwarg_int("x0", kwargs, "_slice_mat")?;
    let x1 = kwarg_int("x1", kwargs, "_slice_mat")?;
    check_bounds("_slice_mat", frame, y0, y1, x0, x1)?;

    let width = (x1 - x0) as u32;
    let height = (y1 - y0) as u32;
    let mut out = RasterFrame::black(width, height, frame.pix_fmt);
    for row in 0..height as i64 {
        let src_off = frame.pixel_offset(x0 as u32, (y0 + row) as u32).expect("bounds checked");
        let dst_off = out.pixel_offset(0, row as u32).expect("bounds checked");
        let row_bytes = out.stride();
        out.data[dst_off..dst_off + row_bytes].copy_from_slice(&frame.data[src_off..src_off + row_bytes]);
    }
    Ok(out)
}

pub fn slice_write_mat(dst: &RasterFrame, src: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let y0 = kwarg_int("y0", kwargs, "_slice_write_mat")?;
    let y1 = kwarg_int("y1", kwargs, "_slice_write_mat")?;
    let x0 = kwarg_int("x0", kwargs, "_slice_write_mat")?;
    let x1 = kwarg_int("x1", kwargs, "_slice_write_mat")?;
    check_bounds("_slice_write_mat", dst, y0, y1, x0, x1)?;

    if (x1 - x0) as u32 != src.width || (y1 - y0) as u32 != src.height {
        return Err(fail(
            "_slice_write_mat",
            "source frame dimensions do not match the destination region",
        ));
    }
    if src.pix_fmt != dst.pix_fmt {
        return Err(fail("_slice_write_mat", "source and destination pixel formats differ"));
    }

    let mut out = dst.clone();
    let row_bytes = src.stride();
    for row in 0..src.height as i64 {
        let dst_off = out.pixel_offset(x0 as u32, (y0 + row) as u32).expect("bounds checked");
        let src_off = src.pixel_offset(0, row as u32).expect("bounds checked");
        out.data[dst_off..dst_off + row_bytes].copy_from_slice(&src.data[src_off..src_off + row_bytes]);
    }
    Ok(out)
}

fn check_bounds(filter: &str, frame: &RasterFrame, y0: i64, y1: i64, x0: i64, x1: i64) -> Result<(), RenderError> {
    if y0 < 0 || x0 < 0 || y1 <= y0 || x1 <= x0 || y1 as u32 > frame.height || x1 as u32 > frame.width {
        return Err(fail(
            filter,
            format!("region [{y0}:{y1}, {x0}:{x1}] out of bounds for {}x{} frame", frame.width, frame.height),
        ));
    }
    Ok(())
}

pub fn rectangle(frame: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let pt1 = kwarg_point("pt1", kwargs, "cv2.rectangle")?;
    let pt2 = kwarg_point("pt2", kwargs, "cv2.rectangle")?;
    let color = kwarg_color("color", kwargs, "cv2.rectangle")?;
    let thickness = kwarg_int_opt("thickness", kwargs, 1);

    let mut out = frame.clone();
    if thickness < 0 {
        geometry::rectangle_filled(&mut out, pt1, pt2, color);
    } else {
        geometry::rectangle_outline(&mut out, pt1, pt2, color, thickness);
    }
    Ok(out)
}

pub fn circle(frame: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let center = kwarg_point("center", kwargs, "cv2.circle")?;
    let radius = kwarg_int("radius", kwargs, "cv2.circle")?;
    let color = kwarg_color("color", kwargs, "cv2.circle")?;
    let thickness = kwarg_int_opt("thickness", kwargs, 1);

    let mut out = frame.clone();
    geometry::circle(&mut out, center, radius, color, thickness);
    Ok(out)
}

pub fn line(frame: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let pt1 = kwarg_point("pt1", kwargs, "cv2.line")?;
    let pt2 = kwarg_point("pt2", kwargs, "cv2.line")?;
    let color = kwarg_color("color", kwargs, "cv2.line")?;
    let thickness = kwarg_int_opt("thickness", kwargs, 1);

    let mut out = frame.clone();
    geometry::line(&mut out, pt1, pt2, color, thickness);
    Ok(out)
}

pub fn arrowed_line(frame: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let pt1 = kwarg_point("pt1", kwargs, "cv2.arrowedLine")?;
    let pt2 = kwarg_point("pt2", kwargs, "cv2.arrowedLine")?;
    let color = kwarg_color("color", kwargs, "cv2.arrowedLine")?;
    let thickness = kwarg_int_opt("thickness", kwargs, 1);
    let tip_length = kwargs.get("tipLength").and_then(Data::as_f64).unwrap_or(0.1);

    let mut out = frame.clone();
    geometry::line(&mut out, pt1, pt2, color, thickness);

    let (dx, dy) = ((pt1.0 - pt2.0) as f64, (pt1.1 - pt2.1) as f64);
    let len = (dx * dx + dy * dy).sqrt().max(1.0);
    let (ux, uy) = (dx / len, dy / len);
    let head_len = len * tip_length;
    let angle = std::f64::consts::FRAC_PI_6;
    for sign in [-1.0, 1.0] {
        let rx = ux * angle.cos() - uy * angle.sin() * sign;
        let ry = ux * angle.sin() * sign + uy * angle.cos();
        let tip = (
            pt2.0 + (rx * head_len).round() as i64,
            pt2.1 + (ry * head_len).round() as i64,
        );
        geometry::line(&mut out, pt2, tip, color, thickness);
    }
    Ok(out)
}

pub fn ellipse(frame: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let center = kwarg_point("center", kwargs, "cv2.ellipse")?;
    let axes = kwarg_point("axes", kwargs, "cv2.ellipse")?;
    let angle = kwarg_f64("angle", kwargs, "cv2.ellipse")?;
    let start = kwarg_f64("startAngle", kwargs, "cv2.ellipse")?;
    let end = kwarg_f64("endAngle", kwargs, "cv2.ellipse")?;
    let color = kwarg_color("color", kwargs, "cv2.ellipse")?;
    let thickness = kwarg_int_opt("thickness", kwargs, 1);

    let mut out = frame.clone();
    geometry::ellipse(&mut out, center, axes, angle, start, end, color, thickness);
    Ok(out)
}

fn point_list(value: &Data, filter: &str) -> Result<Vec<(i64, i64)>, RenderError> {
    value
        .as_list()
        .ok_or_else(|| fail(filter, "expected a list of points"))?
        .iter()
        .map(|p| p.as_point().ok_or_else(|| fail(filter, "expected a 2-element point")))
        .collect()
}

pub fn polylines(frame: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let pts_value = kwarg("pts", kwargs, "cv2.polylines")?;
    let is_closed = kwarg("isClosed", kwargs, "cv2.polylines")?
        .as_bool()
        .ok_or_else(|| fail("cv2.polylines", "isClosed is not a bool"))?;
    let color = kwarg_color("color", kwargs, "cv2.polylines")?;
    let thickness = kwarg_int_opt("thickness", kwargs, 1);

    let mut out = frame.clone();
    for polygon in pts_value.as_list().ok_or_else(|| fail("cv2.polylines", "pts is not a list"))? {
        let pts = point_list(polygon, "cv2.polylines")?;
        geometry::polylines(&mut out, &pts, is_closed, color, thickness);
    }
    Ok(out)
}

pub fn fill_poly(frame: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let pts_value = kwarg("pts", kwargs, "cv2.fillPoly")?;
    let color = kwarg_color("color", kwargs, "cv2.fillPoly")?;

    let mut out = frame.clone();
    for polygon in pts_value.as_list().ok_or_else(|| fail("cv2.fillPoly", "pts is not a list"))? {
        let pts = point_list(polygon, "cv2.fillPoly")?;
        geometry::fill_polygon(&mut out, &pts, color);
    }
    Ok(out)
}

pub fn draw_marker(frame: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let position = kwarg_point("position", kwargs, "cv2.drawMarker")?;
    let color = kwarg_color("color", kwargs, "cv2.drawMarker")?;
    let marker_type = kwarg_int_opt("markerType", kwargs, 0);
    let size = kwarg_int_opt("markerSize", kwargs, 20);
    let thickness = kwarg_int_opt("thickness", kwargs, 1);
    let half = size / 2;

    let mut out = frame.clone();
    let (cx, cy) = position;
    match marker_type {
        // MARKER_TILTED_CROSS
        1 => {
            geometry::line(&mut out, (cx - half, cy - half), (cx + half, cy + half), color, thickness);
            geometry::line(&mut out, (cx - half, cy + half), (cx + half, cy - half), color, thickness);
        }
        // MARKER_DIAMOND
        3 => {
            geometry::polylines(
                &mut out,
                &[(cx, cy - half), (cx + half, cy), (cx, cy + half), (cx - half, cy)],
                true,
                color,
                thickness,
            );
        }
        // MARKER_SQUARE
        4 => {
            geometry::rectangle_outline(&mut out, (cx - half, cy - half), (cx + half, cy + half), color, thickness);
        }
        // MARKER_CROSS (0) and anything unrecognized fall back to the default.
        _ => {
            geometry::line(&mut out, (cx - half, cy), (cx + half, cy), color, thickness);
            geometry::line(&mut out, (cx, cy - half), (cx, cy + half), color, thickness);
        }
    }
    Ok(out)
}

pub fn draw_contours(frame: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let contours_value = kwarg("contours", kwargs, "cv2.drawContours")?;
    let contour_idx = kwarg_int("contourIdx", kwargs, "cv2.drawContours")?;
    let color = kwarg_color("color", kwargs, "cv2.drawContours")?;
    let thickness = kwarg_int_opt("thickness", kwargs, 1);

    let contours = contours_value
        .as_list()
        .ok_or_else(|| fail("cv2.drawContours", "contours is not a list"))?;

    let mut out = frame.clone();
    let targets: Vec<usize> = if contour_idx < 0 {
        (0..contours.len()).collect()
    } else {
        vec![contour_idx as usize]
    };
    for idx in targets {
        let polygon = contours
            .get(idx)
            .ok_or_else(|| fail("cv2.drawContours", format!("contourIdx {idx} out of range")))?;
        let pts = point_list(polygon, "cv2.drawContours")?;
        if thickness < 0 {
            geometry::fill_polygon(&mut out, &pts, color);
        } else {
            geometry::polylines(&mut out, &pts, true, color, thickness);
        }
    }
    Ok(out)
}

pub fn put_text(frame: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let content = kwarg_str("text", kwargs, "cv2.putText")?;
    let org = kwarg_point("org", kwargs, "cv2.putText")?;
    let font_scale = kwarg_f64("fontScale", kwargs, "cv2.putText")?;
    let color = kwarg_color("color", kwargs, "cv2.putText")?;
    let thickness = kwarg_int_opt("thickness", kwargs, 1);
    let bottom_left_origin = kwargs.get("bottomLeftOrigin").and_then(Data::as_bool).unwrap_or(false);

    let mut out = frame.clone();
    text::put_text(&mut out, content, org, font_scale, color, thickness, bottom_left_origin);
    Ok(out)
}

pub fn add_weighted(src1: &RasterFrame, src2: &RasterFrame, kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    let alpha = kwarg_f64("alpha", kwargs, "cv2.addWeighted")?;
    let beta = kwarg_f64("beta", kwargs, "cv2.addWeighted")?;
    let gamma = kwarg_f64("gamma", kwargs, "cv2.addWeighted")?;

    if src1.width != src2.width || src1.height != src2.height || src1.pix_fmt != src2.pix_fmt {
        return Err(fail("cv2.addWeighted", "src1 and src2 must match in dimensions and pixel format"));
    }

    let data = src1
        .data
        .iter()
        .zip(src2.data.iter())
        .map(|(&a, &b)| {
            let v = f64::from(a) * alpha + f64::from(b) * beta + gamma;
            v.round().clamp(0.0, 255.0) as u8
        })
        .collect();

    Ok(RasterFrame {
        width: src1.width,
        height: src1.height,
        pix_fmt: src1.pix_fmt,
        data,
    })
}
