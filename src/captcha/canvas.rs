//! RGB raster used to synthesize captcha images.

use crate::captcha::font;

/// 8-bit RGB color.
pub type Rgb = [u8; 3];

/// Row-major RGB pixel buffer. Writes outside the bounds are clipped.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Canvas {
    /// A canvas filled with `background`.
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![background; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        (x < self.width && y < self.height)
            .then(|| self.pixels[(y * self.width + x) as usize])
    }

    /// Set one pixel; negative or out-of-range coordinates are ignored.
    pub fn put(&mut self, x: i32, y: i32, color: Rgb) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }

    /// Straight line between two points, integer arithmetic only (Bresenham).
    pub fn line(&mut self, from: (i32, i32), to: (i32, i32), color: Rgb) {
        let (mut x, mut y) = from;
        let (x1, y1) = to;
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.put(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Render one glyph with its top-left corner at (`x`, `y`).
    /// Returns false if the font has no glyph for `c`.
    pub fn glyph(&mut self, c: char, x: i32, y: i32, color: Rgb) -> bool {
        let Some(rows) = font::glyph(c) else {
            return false;
        };
        let scale = font::SCALE as i32;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..font::GLYPH_WIDTH {
                if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let px = x + col as i32 * scale;
                let py = y + row as i32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        self.put(px + dx, py + dy, color);
                    }
                }
            }
        }
        true
    }

    /// Origin that centers a glyph row of `chars` characters.
    pub fn centered_text_origin(&self, chars: usize) -> (i32, i32) {
        let x = (self.width as i32 - font::text_width(chars) as i32) / 2;
        let y = (self.height as i32 - font::text_height() as i32) / 2;
        (x, y)
    }

    /// Raw rows for encoding.
    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.pixels.chunks(self.width.max(1) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgb = [255, 255, 255];
    const INK: Rgb = [0, 0, 0];

    fn inked(canvas: &Canvas) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if canvas.get(x, y) == Some(INK) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = Canvas::new(10, 3, BG);
        canvas.line((1, 1), (8, 1), INK);
        assert_eq!(inked(&canvas), (1..=8).map(|x| (x, 1)).collect::<Vec<_>>());
    }

    #[test]
    fn test_diagonal_line_is_continuous() {
        let mut canvas = Canvas::new(8, 8, BG);
        canvas.line((0, 0), (7, 7), INK);
        assert_eq!(inked(&canvas), (0..8).map(|i| (i, i)).collect::<Vec<_>>());
    }

    #[test]
    fn test_steep_line_hits_every_row() {
        let mut canvas = Canvas::new(5, 20, BG);
        canvas.line((4, 19), (0, 0), INK);
        let points = inked(&canvas);
        for y in 0..20 {
            assert!(points.iter().any(|p| p.1 == y), "row {y} skipped");
        }
        assert!(points.contains(&(0, 0)) && points.contains(&(4, 19)));
    }

    #[test]
    fn test_clips_out_of_bounds() {
        let mut canvas = Canvas::new(4, 4, BG);
        canvas.line((-10, 2), (10, 2), INK);
        canvas.put(100, 100, INK);
        assert_eq!(inked(&canvas).len(), 4);
    }

    #[test]
    fn test_glyph_rendering_is_scaled() {
        let mut canvas = Canvas::new(20, 20, BG);
        assert!(canvas.glyph('L', 0, 0, INK));
        // 'L' is 7 units of left column plus 4 more units of bottom row.
        let expected = (7 + 4) * (font::SCALE * font::SCALE) as usize;
        assert_eq!(inked(&canvas).len(), expected);
        assert!(!canvas.glyph('#', 0, 0, INK));
    }

    #[test]
    fn test_centered_origin() {
        let canvas = Canvas::new(120, 40, BG);
        let (x, y) = canvas.centered_text_origin(4);
        assert_eq!(x, (120 - font::text_width(4) as i32) / 2);
        assert_eq!(y, (40 - 14) / 2);
    }
}
