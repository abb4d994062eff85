//! RGB framebuffer used to render mock page screenshots.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{ImageBuffer, RgbImage};
use std::io::Cursor;

use super::{InstanceError, InstanceResult};

/// Width of one glyph in pixels
pub const GLYPH_SIZE: u32 = 8;

/// A virtual framebuffer with a small drawing API
///
/// - `fill()` - Fill entire buffer with a color
/// - `draw_rect()` - Draw a filled rectangle
/// - `draw_text()` - Draw text using font8x8 glyphs
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    /// RGB pixel buffer (row-major, 3 bytes per pixel)
    buffer: Vec<u8>,
}

impl Framebuffer {
    /// Create a framebuffer initialized to a specific color
    pub fn with_color(width: u32, height: u32, color: [u8; 3]) -> Self {
        let mut fb = Self {
            width,
            height,
            buffer: vec![0u8; (width * height * 3) as usize],
        };
        fb.fill(color);
        fb
    }

    /// Load a framebuffer from PNG image bytes
    pub fn from_png_bytes(data: &[u8]) -> InstanceResult<Self> {
        let img = image::load_from_memory(data)
            .map_err(|e| InstanceError::Screenshot(format!("Failed to load PNG: {}", e)))?;
        let rgb = img.to_rgb8();
        Ok(Self {
            width: rgb.width(),
            height: rgb.height(),
            buffer: rgb.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fill(&mut self, color: [u8; 3]) {
        for chunk in self.buffer.chunks_exact_mut(3) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        for py in y..(y + h).min(self.height) {
            for px in x..(x + w).min(self.width) {
                self.set_pixel(px, py, color);
            }
        }
    }

    /// Draw text using font8x8 glyphs, wrapping at the right edge.
    ///
    /// Returns the y coordinate below the last drawn line.
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, fg: [u8; 3], bg: [u8; 3]) -> u32 {
        let mut cursor_x = x;
        let mut cursor_y = y;
        for ch in text.chars() {
            if ch == '\n' || cursor_x + GLYPH_SIZE > self.width {
                cursor_x = x;
                cursor_y += GLYPH_SIZE + 2;
                if ch == '\n' {
                    continue;
                }
            }
            if cursor_y >= self.height {
                break;
            }
            self.draw_char(cursor_x, cursor_y, ch, fg, bg);
            cursor_x += GLYPH_SIZE;
        }
        cursor_y + GLYPH_SIZE + 2
    }

    fn draw_char(&mut self, x: u32, y: u32, ch: char, fg: [u8; 3], bg: [u8; 3]) {
        let glyph = BASIC_FONTS.get(ch).unwrap_or([0u8; 8]);
        for (row_idx, row) in glyph.iter().enumerate() {
            let py = y + row_idx as u32;
            if py >= self.height {
                break;
            }
            for bit in 0..GLYPH_SIZE {
                let px = x + bit;
                if px >= self.width {
                    break;
                }
                // font8x8 stores LSB as leftmost pixel
                let is_fg = (row >> bit) & 1 == 1;
                self.set_pixel(px, py, if is_fg { fg } else { bg });
            }
        }
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0];
        }
        let idx = ((y * self.width + x) * 3) as usize;
        [self.buffer[idx], self.buffer[idx + 1], self.buffer[idx + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.buffer[idx..idx + 3].copy_from_slice(&color);
    }

    /// Encode the framebuffer as PNG bytes
    pub fn to_png(&self) -> InstanceResult<Vec<u8>> {
        let img: RgbImage = ImageBuffer::from_raw(self.width, self.height, self.buffer.clone())
            .ok_or_else(|| InstanceError::Screenshot("Buffer size does not match dimensions".to_string()))?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| InstanceError::Screenshot(format!("Failed to encode PNG: {}", e)))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_rect_bounds() {
        let mut fb = Framebuffer::with_color(20, 20, [0, 0, 0]);
        fb.draw_rect(5, 5, 10, 10, [255, 0, 0]);

        assert_eq!(fb.get_pixel(4, 4), [0, 0, 0]);
        assert_eq!(fb.get_pixel(5, 5), [255, 0, 0]);
        assert_eq!(fb.get_pixel(14, 14), [255, 0, 0]);
        assert_eq!(fb.get_pixel(15, 15), [0, 0, 0]);
    }

    #[test]
    fn test_draw_text_wraps() {
        let mut fb = Framebuffer::with_color(16, 40, [0, 0, 0]);
        let next_y = fb.draw_text(0, 0, "Hi!", [255, 255, 255], [0, 0, 0]);
        // Two glyphs per line, so the third wraps onto a second line
        assert_eq!(next_y, 20);

        let has_white = |y0: u32| {
            (y0..y0 + 8).any(|y| (0..8).any(|x| fb.get_pixel(x, y) == [255, 255, 255]))
        };
        assert!(has_white(0), "'H' should have foreground pixels");
        assert!(has_white(10), "'!' should wrap to the second line");
    }

    #[test]
    fn test_png_encoding() {
        let mut fb = Framebuffer::with_color(32, 32, [100, 150, 200]);
        fb.draw_rect(8, 8, 16, 16, [255, 0, 0]);

        let png = fb.to_png().unwrap();
        assert_eq!(&png[0..4], &[0x89, 0x50, 0x4E, 0x47]);

        let decoded = Framebuffer::from_png_bytes(&png).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.get_pixel(0, 0), [100, 150, 200]);
        assert_eq!(decoded.get_pixel(10, 10), [255, 0, 0]);
    }
}
