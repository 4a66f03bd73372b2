//! Low-level raster primitives shared by every `cv2.*` drawing filter:
//! pixel set, Bresenham lines, midpoint circles, and a generic polygon
//! scanline fill. Kept independent of any single filter so `rectangle`,
//! `polylines`, and `fillPoly` all route through the same fill/stroke code.

use igni_decode::RasterFrame;

pub type Color = [u8; 4];

pub fn set_pixel(frame: &mut RasterFrame, x: i64, y: i64, color: Color) {
    if x < 0 || y < 0 {
        return;
    }
    let Some(offset) = frame.pixel_offset(x as u32, y as u32) else {
        return;
    };
    match frame.pix_fmt {
        igni_decode::PixFmt::Bgr24 => {
            frame.data[offset] = color[0];
            frame.data[offset + 1] = color[1];
            frame.data[offset + 2] = color[2];
        }
        igni_decode::PixFmt::Rgb24 => {
            frame.data[offset] = color[2];
            frame.data[offset + 1] = color[1];
            frame.data[offset + 2] = color[0];
        }
        igni_decode::PixFmt::Gray8 => {
            frame.data[offset] = color[0];
        }
        igni_decode::PixFmt::Yuv420p => {}
    }
}

/// Sets a pixel, thickened into a square of side `thickness` centered on
/// `(x, y)`. `thickness <= 1` draws a single pixel.
pub fn set_pixel_thick(frame: &mut RasterFrame, x: i64, y: i64, color: Color, thickness: i64) {
    if thickness <= 1 {
        set_pixel(frame, x, y, color);
        return;
    }
    let half = thickness / 2;
    for dy in -half..=half {
        for dx in -half..=half {
            set_pixel(frame, x + dx, y + dy, color);
        }
    }
}

/// Bresenham's line algorithm between two integer points.
pub fn line(frame: &mut RasterFrame, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Color, thickness: i64) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        set_pixel_thick(frame, x0, y0, color, thickness);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

pub fn rectangle_outline(frame: &mut RasterFrame, pt1: (i64, i64), pt2: (i64, i64), color: Color, thickness: i64) {
    let (x0, y0) = pt1;
    let (x1, y1) = pt2;
    line(frame, (x0, y0), (x1, y0), color, thickness);
    line(frame, (x1, y0), (x1, y1), color, thickness);
    line(frame, (x1, y1), (x0, y1), color, thickness);
    line(frame, (x0, y1), (x0, y0), color, thickness);
}

pub fn rectangle_filled(frame: &mut RasterFrame, pt1: (i64, i64), pt2: (i64, i64), color: Color) {
    let (x0, x1) = (pt1.0.min(pt2.0), pt1.0.max(pt2.0));
    let (y0, y1) = (pt1.1.min(pt2.1), pt1.1.max(pt2.1));
    for y in y0..=y1 {
        for x in x0..=x1 {
            set_pixel(frame, x, y, color);
        }
    }
}

/// Midpoint circle algorithm, stroked or filled.
pub fn circle(frame: &mut RasterFrame, center: (i64, i64), radius: i64, color: Color, thickness: i64) {
    let (cx, cy) = center;
    if thickness < 0 {
        for y in -radius..=radius {
            let span = ((radius * radius - y * y) as f64).sqrt() as i64;
            for x in -span..=span {
                set_pixel(frame, cx + x, cy + y, color);
            }
        }
        return;
    }

    let mut x = radius;
    let mut y = 0i64;
    let mut err = 1 - radius;
    while x >= y {
        for (dx, dy) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            set_pixel_thick(frame, cx + dx, cy + dy, color, thickness);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Parametric ellipse sampled at 1-degree steps between `start_angle` and
/// `end_angle` (degrees, cv2 convention), stroked or filled.
#[allow(clippy::too_many_arguments)]
pub fn ellipse(
    frame: &mut RasterFrame,
    center: (i64, i64),
    axes: (i64, i64),
    angle_deg: f64,
    start_angle_deg: f64,
    end_angle_deg: f64,
    color: Color,
    thickness: i64,
) {
    let (cx, cy) = center;
    let (a, b) = (axes.0 as f64, axes.1 as f64);
    let rot = angle_deg.to_radians();
    let mut points = Vec::new();
    let mut t = start_angle_deg;
    while t <= end_angle_deg {
        let rad = t.to_radians();
        let ex = a * rad.cos();
        let ey = b * rad.sin();
        let x = cx as f64 + ex * rot.cos() - ey * rot.sin();
        let y = cy as f64 + ex * rot.sin() + ey * rot.cos();
        points.push((x.round() as i64, y.round() as i64));
        t += 1.0;
    }

    if thickness < 0 {
        fill_polygon(frame, &points, color);
    } else {
        for pair in points.windows(2) {
            line(frame, pair[0], pair[1], color, thickness);
        }
    }
}

pub fn polylines(frame: &mut RasterFrame, pts: &[(i64, i64)], is_closed: bool, color: Color, thickness: i64) {
    for pair in pts.windows(2) {
        line(frame, pair[0], pair[1], color, thickness);
    }
    if is_closed {
        if let (Some(&first), Some(&last)) = (pts.first(), pts.last()) {
            line(frame, last, first, color, thickness);
        }
    }
}

/// Even-odd scanline polygon fill, the same rule cv2's `fillPoly` uses.
pub fn fill_polygon(frame: &mut RasterFrame, pts: &[(i64, i64)], color: Color) {
    if pts.len() < 3 {
        return;
    }
    let min_y = pts.iter().map(|p| p.1).min().unwrap_or(0);
    let max_y = pts.iter().map(|p| p.1).max().unwrap_or(0);

    for y in min_y..=max_y {
        let mut xs = Vec::new();
        for i in 0..pts.len() {
            let (x0, y0) = pts[i];
            let (x1, y1) = pts[(i + 1) % pts.len()];
            if (y0 <= y && y1 > y) || (y1 <= y && y0 > y) {
                let t = (y - y0) as f64 / (y1 - y0) as f64;
                let x = x0 as f64 + t * (x1 - x0) as f64;
                xs.push(x.round() as i64);
            }
        }
        xs.sort_unstable();
        for pair in xs.chunks_exact(2) {
            for x in pair[0]..=pair[1] {
                set_pixel(frame, x, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use igni_decode::PixFmt;

    #[test]
    fn line_hits_both_endpoints() {
        let mut frame = RasterFrame::black(10, 10, PixFmt::Bgr24);
        line(&mut frame, (0, 0), (9, 9), [255, 255, 255, 255], 1);
        assert_eq!(&frame.data[0..3], &[255, 255, 255]);
        let last_offset = frame.pixel_offset(9, 9).unwrap();
        assert_eq!(&frame.data[last_offset..last_offset + 3], &[255, 255, 255]);
    }

    #[test]
    fn filled_rectangle_covers_interior() {
        let mut frame = RasterFrame::black(10, 10, PixFmt::Bgr24);
        rectangle_filled(&mut frame, (2, 2), (5, 5), [1, 2, 3, 255]);
        let offset = frame.pixel_offset(3, 3).unwrap();
        assert_eq!(&frame.data[offset..offset + 3], &[1, 2, 3]);
        let outside = frame.pixel_offset(7, 7).unwrap();
        assert_eq!(&frame.data[outside..outside + 3], &[0, 0, 0]);
    }

    #[test]
    fn filled_circle_area_matches_closed_form_within_tolerance() {
        let mut frame = RasterFrame::black(41, 41, PixFmt::Bgr24);
        let radius = 10;
        circle(&mut frame, (20, 20), radius, [255, 0, 0, 255], -1);
        let painted = frame.data.chunks_exact(3).filter(|px| px[2] == 255).count();
        let expected = std::f64::consts::PI * (radius as f64).powi(2);
        let tolerance = expected * 0.1;
        assert!(
            (painted as f64 - expected).abs() < tolerance,
            "painted={painted} expected={expected}"
        );
    }

    #[test]
    fn fill_polygon_matches_rectangle_area() {
        let mut frame = RasterFrame::black(20, 20, PixFmt::Bgr24);
        fill_polygon(&mut frame, &[(2, 2), (10, 2), (10, 8), (2, 8)], [9, 9, 9, 255]);
        let painted = frame.data.chunks_exact(3).filter(|px| px[0] == 9).count();
        assert_eq!(painted, 8 * 6);
    }
}
