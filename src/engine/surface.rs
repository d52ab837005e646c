//! The pixel buffer an engine paints a page into.

use image::{ImageBuffer, RgbImage};
use std::io::Cursor;

use super::Viewport;

/// An RGB render surface owned by the coordinator during a capture session
/// and handed to the Output Dispatcher for the single encode call.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// RGB pixel buffer (row-major, 3 bytes per pixel)
    buffer: Vec<u8>,
}

impl RenderSurface {
    /// Create a surface of the given size, initialized to white
    pub fn new(viewport: Viewport) -> Self {
        Self::with_color(viewport, [255, 255, 255])
    }

    /// Create a surface initialized to a specific color
    pub fn with_color(viewport: Viewport, color: [u8; 3]) -> Self {
        let mut buffer = vec![0u8; byte_len(viewport.width, viewport.height)];
        for chunk in buffer.chunks_exact_mut(3) {
            chunk.copy_from_slice(&color);
        }
        Self {
            width: viewport.width,
            height: viewport.height,
            buffer,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// Fill the entire surface with a color
    pub fn fill(&mut self, color: [u8; 3]) {
        for chunk in self.buffer.chunks_exact_mut(3) {
            chunk.copy_from_slice(&color);
        }
    }

    /// Paint a filled rectangle, clipped to the surface
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        for py in y..(y + h).min(self.height) {
            for px in x..(x + w).min(self.width) {
                self.set_pixel(px, py, color);
            }
        }
    }

    /// Get the color of a pixel; out-of-bounds reads return black
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0];
        }
        let idx = self.pixel_index(x, y);
        [self.buffer[idx], self.buffer[idx + 1], self.buffer[idx + 2]]
    }

    /// Set the color of a pixel; out-of-bounds writes are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.pixel_index(x, y);
        self.buffer[idx..idx + 3].copy_from_slice(&color);
    }

    /// Byte offset of a pixel. Widened to usize before multiplying; pixel
    /// counts near u32::MAX are representable surface sizes.
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    /// The raw RGB buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// View the surface as an `image` crate buffer
    pub fn to_image(&self) -> RgbImage {
        // Buffer length is fixed at width*height*3 by construction
        ImageBuffer::from_raw(self.width, self.height, self.buffer.clone())
            .unwrap_or_else(|| ImageBuffer::new(self.width, self.height))
    }

    /// Encode the surface as PNG bytes
    pub fn to_png(&self) -> image::ImageResult<Vec<u8>> {
        let img = self.to_image();
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Buffer length for a surface, computed in usize so large viewports from
/// CLI input do not overflow u32 arithmetic
fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_len_handles_huge_viewports() {
        // 80000x80000 overflows a u32 byte count; the length must not wrap
        assert_eq!(byte_len(80_000, 80_000) as u64, 19_200_000_000);
        assert_eq!(byte_len(2, 2), 12);
    }

    #[test]
    fn test_pixel_index_widens_before_multiplying() {
        let surface = RenderSurface::new(Viewport::new(8, 8));
        assert_eq!(surface.pixel_index(7, 7), (7 * 8 + 7) * 3);
    }

    #[test]
    fn test_surface_new_is_white() {
        let surface = RenderSurface::new(Viewport::new(100, 50));
        assert_eq!(surface.width(), 100);
        assert_eq!(surface.height(), 50);
        assert_eq!(surface.get_pixel(0, 0), [255, 255, 255]);
        assert_eq!(surface.get_pixel(99, 49), [255, 255, 255]);
    }

    #[test]
    fn test_surface_fill_rect_clips() {
        let mut surface = RenderSurface::with_color(Viewport::new(20, 20), [0, 0, 0]);
        surface.fill_rect(15, 15, 10, 10, [255, 0, 0]);
        assert_eq!(surface.get_pixel(19, 19), [255, 0, 0]);
        assert_eq!(surface.get_pixel(14, 14), [0, 0, 0]);
        // Out-of-bounds reads are black
        assert_eq!(surface.get_pixel(25, 25), [0, 0, 0]);
    }

    #[test]
    fn test_surface_to_png() {
        let surface = RenderSurface::with_color(Viewport::new(32, 16), [10, 20, 30]);
        let png = surface.to_png().unwrap();
        assert_eq!(&png[0..4], &[0x89, 0x50, 0x4E, 0x47]);

        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 16);
        assert_eq!(decoded.get_pixel(5, 5).0, [10, 20, 30]);
    }
}
