use std::path::Path;

use rusttype::{point, Font, PositionedGlyph, Scale};
use tracing::{debug, warn};

use crate::color::Color;
use crate::config::FONT_CANDIDATES;
use crate::scene::{LineCap, Painter, Point, Rect, Transform};

/// Load the configured font, or the first system font that parses.
pub fn load_font(path: Option<&Path>) -> Option<Font<'static>> {
    let candidates: Vec<&Path> = match path {
        Some(p) => vec![p],
        None => FONT_CANDIDATES.iter().map(Path::new).collect(),
    };
    for candidate in candidates {
        match std::fs::read(candidate) {
            Ok(data) => match Font::try_from_vec(data) {
                Some(font) => {
                    debug!(path = %candidate.display(), "font loaded");
                    return Some(font);
                }
                None => warn!(path = %candidate.display(), "not a usable font file"),
            },
            Err(e) if path.is_some() => warn!(path = %candidate.display(), error = %e, "cannot read font"),
            Err(_) => {}
        }
    }
    warn!("no font available, text will not be drawn");
    None
}

// ============================================================================
// CORE DATA TYPES
// ============================================================================

/// Software painter over an RGBA8 framebuffer.
pub struct PixelCanvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
    transform: Transform,
    font: Option<&'a Font<'static>>,
}

impl<'a> PixelCanvas<'a> {
    pub fn new(
        frame: &'a mut [u8],
        width: usize,
        height: usize,
        transform: Transform,
        font: Option<&'a Font<'static>>,
    ) -> Self {
        Self {
            frame,
            width,
            height,
            transform,
            font,
        }
    }

    /// Fully transparent background.
    pub fn clear(&mut self) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[0, 0, 0, 0]);
        }
    }

    /// Source-over blend of `color` at `coverage` into pixel (x, y).
    fn set_pixel(&mut self, x: i64, y: i64, color: Color, coverage: f64) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let sa = (coverage.clamp(0.0, 1.0) as f32) * color.alpha_f32();
        if sa <= 0.001 {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let Some(dst) = self.frame.get_mut(idx..idx + 4) else {
            return;
        };
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let mix = |s: u8, d: u8| {
            let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        let out = [
            mix(color.r, dst[0]),
            mix(color.g, dst[1]),
            mix(color.b, dst[2]),
            (out_a * 255.0).round() as u8,
        ];
        dst.copy_from_slice(&out);
    }

    /// Device-space pixel box around `points`, padded by `pad`, clipped to the frame.
    fn bounds(&self, points: &[Point], pad: f64) -> Option<(i64, i64, i64, i64)> {
        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min) - pad;
        let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max) + pad;
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min) - pad;
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max) + pad;
        let x0 = (min_x.floor() as i64).max(0);
        let y0 = (min_y.floor() as i64).max(0);
        let x1 = (max_x.ceil() as i64).min(self.width as i64 - 1);
        let y1 = (max_y.ceil() as i64).min(self.height as i64 - 1);
        if x0 > x1 || y0 > y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }
}

/// Coverage of a pixel center at signed distance `d` (negative inside) from an edge.
fn edge_coverage(d: f64) -> f64 {
    (0.5 - d).clamp(0.0, 1.0)
}

/// Distance from `p` to segment `a`-`b`, and the unclamped projection parameter.
fn segment_distance(p: Point, a: Point, b: Point) -> (f64, f64) {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        ((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq
    } else {
        0.0
    };
    let tc = t.clamp(0.0, 1.0);
    let (lx, ly) = (a.x + tc * dx, a.y + tc * dy);
    (((lx - p.x).powi(2) + (ly - p.y).powi(2)).sqrt(), t)
}

/// Clock angle (0 at twelve, clockwise) of a device-space offset.
fn clock_angle(dx: f64, dy: f64) -> f64 {
    (dy.atan2(dx).to_degrees() + 90.0).rem_euclid(360.0)
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

impl Painter for PixelCanvas<'_> {
    fn line(&mut self, from: Point, to: Point, width: f64, cap: LineCap, color: Color) {
        let a = self.transform.apply(from);
        let b = self.transform.apply(to);
        let half = self.transform.length(width) / 2.0;
        let len = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
        let Some((x0, y0, x1, y1)) = self.bounds(&[a, b], half + 1.0) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let (dist, t) = segment_distance(p, a, b);
                let coverage = match cap {
                    LineCap::Round => edge_coverage(dist - half),
                    LineCap::Flat => {
                        // Perpendicular distance to the infinite line, cut at both ends.
                        let along = if t < 0.0 {
                            -t * len
                        } else if t > 1.0 {
                            (t - 1.0) * len
                        } else {
                            0.0
                        };
                        let perp = (dist.powi(2) - along.powi(2)).max(0.0).sqrt();
                        edge_coverage(perp - half) * edge_coverage(along)
                    }
                };
                if coverage > 0.01 {
                    self.set_pixel(x, y, color, coverage);
                }
            }
        }
    }

    fn arc(
        &mut self,
        center: Point,
        radius: f64,
        start: f64,
        sweep: f64,
        width: f64,
        cap: LineCap,
        color: Color,
    ) {
        if sweep <= 0.0 && cap == LineCap::Flat {
            return;
        }
        let c = self.transform.apply(center);
        let r = self.transform.length(radius);
        let half = self.transform.length(width) / 2.0;
        let full_turn = sweep >= 360.0;
        let ends = [
            self.transform.apply(offset_polar(center, radius, start)),
            self.transform.apply(offset_polar(center, radius, start + sweep)),
        ];
        let reach = r + half + 1.0;
        let Some((x0, y0, x1, y1)) = self.bounds(&[c.offset(-reach, -reach), c.offset(reach, reach)], 0.0) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (dx, dy) = (x as f64 + 0.5 - c.x, y as f64 + 0.5 - c.y);
                let dist = (dx * dx + dy * dy).sqrt();
                let in_sweep = full_turn || (clock_angle(dx, dy) - start).rem_euclid(360.0) <= sweep;
                let mut coverage = if in_sweep {
                    edge_coverage((dist - r).abs() - half)
                } else {
                    0.0
                };
                if cap == LineCap::Round && !full_turn {
                    for end in &ends {
                        let d = ((x as f64 + 0.5 - end.x).powi(2) + (y as f64 + 0.5 - end.y).powi(2)).sqrt();
                        coverage = coverage.max(edge_coverage(d - half));
                    }
                }
                if coverage > 0.01 {
                    self.set_pixel(x, y, color, coverage);
                }
            }
        }
    }

    fn rounded_rect(&mut self, rect: Rect, corner_radius: f64, rotation: f64, color: Color) {
        let (sin, cos) = rotation.to_radians().sin_cos();
        let rotate = |p: Point| Point::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos);
        let corners = [
            Point::new(rect.x, rect.y),
            Point::new(rect.x + rect.width, rect.y),
            Point::new(rect.x, rect.y + rect.height),
            Point::new(rect.x + rect.width, rect.y + rect.height),
        ]
        .map(|p| self.transform.apply(rotate(p)));
        let Some((x0, y0, x1, y1)) = self.bounds(&corners, 1.0) else {
            return;
        };

        let radius = corner_radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
        let (hw, hh) = (rect.width / 2.0, rect.height / 2.0);
        let (cx, cy) = (rect.x + hw, rect.y + hh);
        let scale = self.transform.scale;
        let origin = self.transform.origin;

        for y in y0..=y1 {
            for x in x0..=x1 {
                // Back into the rectangle's own unrotated logical frame.
                let lx = (x as f64 + 0.5 - origin.x) / scale;
                let ly = (y as f64 + 0.5 - origin.y) / scale;
                let ux = lx * cos + ly * sin - cx;
                let uy = -lx * sin + ly * cos - cy;
                let qx = ux.abs() - (hw - radius);
                let qy = uy.abs() - (hh - radius);
                let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
                let sdf = outside + qx.max(qy).min(0.0) - radius;
                let coverage = edge_coverage(sdf * scale);
                if coverage > 0.01 {
                    self.set_pixel(x, y, color, coverage);
                }
            }
        }
    }

    fn fill_ellipse(&mut self, center: Point, rx: f64, ry: f64, color: Color) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let c = self.transform.apply(center);
        let (rx, ry) = (self.transform.length(rx), self.transform.length(ry));
        let Some((x0, y0, x1, y1)) = self.bounds(&[c.offset(-rx, -ry), c.offset(rx, ry)], 1.0) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let nx = (x as f64 + 0.5 - c.x) / rx;
                let ny = (y as f64 + 0.5 - c.y) / ry;
                let coverage = edge_coverage(((nx * nx + ny * ny).sqrt() - 1.0) * rx.min(ry));
                if coverage > 0.01 {
                    self.set_pixel(x, y, color, coverage);
                }
            }
        }
    }

    fn text(&mut self, center: Point, text: &str, size: f64, color: Color) {
        let Some(font) = self.font else {
            return;
        };
        let px = self.transform.length(size) as f32;
        if px < 1.0 {
            return;
        }
        let scale = Scale::uniform(px);
        let v_metrics = font.v_metrics(scale);
        let advance = font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map_or(0.0, |g| g.position().x + g.unpositioned().h_metrics().advance_width);
        let (x0, baseline) = text_origin(
            self.transform.apply(center),
            advance as f64,
            v_metrics.ascent as f64,
            v_metrics.descent as f64,
        );
        let glyphs: Vec<PositionedGlyph> = font.layout(text, scale, point(x0 as f32, baseline as f32)).collect();
        for glyph in &glyphs {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, v| {
                    let x = (bb.min.x + gx as i32) as i64;
                    let y = (bb.min.y + gy as i32) as i64;
                    self.set_pixel(x, y, color, v as f64);
                });
            }
        }
    }
}

/// Pen origin that centers a run on its advance width and line height.
/// `descent` is negative, as rusttype reports it.
fn text_origin(center: Point, advance: f64, ascent: f64, descent: f64) -> (f64, f64) {
    let line_height = ascent - descent;
    (center.x - advance / 2.0, center.y - line_height / 2.0 + ascent)
}

fn offset_polar(center: Point, r: f64, clock_degrees: f64) -> Point {
    let p = crate::scene::polar(r, clock_degrees);
    center.offset(p.x, p.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::new(255, 0, 0);

    fn canvas_size() -> (usize, usize) {
        (40, 40)
    }

    fn pixel(frame: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let idx = (y * width + x) * 4;
        [frame[idx], frame[idx + 1], frame[idx + 2], frame[idx + 3]]
    }

    fn with_canvas(f: impl FnOnce(&mut PixelCanvas)) -> Vec<u8> {
        let (w, h) = canvas_size();
        let mut frame = vec![0u8; w * h * 4];
        let transform = Transform::fit(w as u32, h as u32).unwrap();
        let mut canvas = PixelCanvas::new(&mut frame, w, h, transform, None);
        canvas.clear();
        f(&mut canvas);
        frame
    }

    #[test]
    fn ellipse_fills_center_only() {
        // Scale is 0.1, so a 50 unit radius covers 5 pixels.
        let frame = with_canvas(|c| c.fill_ellipse(Point::ORIGIN, 50.0, 50.0, RED));
        assert_eq!(pixel(&frame, 40, 20, 20), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 40, 0, 0)[3], 0);
    }

    #[test]
    fn flat_line_stops_at_its_ends() {
        let frame = with_canvas(|c| {
            c.line(Point::new(-100.0, 0.0), Point::new(100.0, 0.0), 20.0, LineCap::Flat, RED)
        });
        assert_eq!(pixel(&frame, 40, 20, 20)[3], 255);
        assert_eq!(pixel(&frame, 40, 5, 20)[3], 0);
        assert_eq!(pixel(&frame, 40, 20, 25)[3], 0);
    }

    #[test]
    fn translucent_color_blends() {
        let frame = with_canvas(|c| c.fill_ellipse(Point::ORIGIN, 50.0, 50.0, RED.with_alpha(128)));
        let [r, _, _, a] = pixel(&frame, 40, 20, 20);
        assert_eq!(r, 255);
        assert_eq!(a, 128);
    }

    #[test]
    fn empty_arc_draws_nothing() {
        let frame = with_canvas(|c| c.arc(Point::ORIGIN, 100.0, 240.0, 0.0, 20.0, LineCap::Flat, RED));
        assert!(frame.iter().all(|b| *b == 0));
    }

    #[test]
    fn arc_covers_only_its_sweep() {
        // Upper half: from nine o'clock through twelve to three.
        let frame = with_canvas(|c| c.arc(Point::ORIGIN, 150.0, 270.0, 180.0, 20.0, LineCap::Flat, RED));
        assert_eq!(pixel(&frame, 40, 20, 5)[3], 255);
        assert_eq!(pixel(&frame, 40, 20, 34)[3], 0);
    }

    #[test]
    fn hand_rotated_to_three_points_right() {
        let frame = with_canvas(|c| c.rounded_rect(Rect::new(0.0, -20.0, 150.0, 40.0), 10.0, 0.0, RED));
        assert_eq!(pixel(&frame, 40, 30, 20)[3], 255);
        assert_eq!(pixel(&frame, 40, 10, 20)[3], 0);

        let frame = with_canvas(|c| c.rounded_rect(Rect::new(0.0, -20.0, 150.0, 40.0), 10.0, -90.0, RED));
        assert_eq!(pixel(&frame, 40, 20, 10)[3], 255);
        assert_eq!(pixel(&frame, 40, 30, 20)[3], 0);
    }

    #[test]
    fn text_without_font_is_skipped() {
        let frame = with_canvas(|c| c.text(Point::ORIGIN, "12", 100.0, RED));
        assert!(frame.iter().all(|b| *b == 0));
    }

    #[test]
    fn text_centers_on_advance_and_line_height() {
        let (x, baseline) = text_origin(Point { x: 100.0, y: 50.0 }, 40.0, 30.0, -10.0);
        assert_eq!(x, 80.0);
        // Line box spans 30..70, baseline sits one ascent below its top.
        assert_eq!(baseline, 60.0);
    }

    #[test]
    fn missing_font_path_yields_none() {
        assert!(load_font(Some(Path::new("/nonexistent/font.ttf"))).is_none());
    }
}
