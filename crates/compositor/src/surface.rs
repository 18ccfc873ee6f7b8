//! The fixed-resolution RGBA output surface and its drawing primitives.

use std::sync::Arc;

use layercast_scene::Rect;

use crate::source::SourceFrame;

/// An immutable snapshot of the surface, cheap to clone and hand to
/// the capture pipeline or a display consumer.
#[derive(Debug, Clone)]
pub struct SurfaceFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub data: Arc<Vec<u8>>,
    /// Monotonic frame counter, starts at 0 for the initial blank frame.
    pub seq: u64,
}

impl SurfaceFrame {
    /// An all-black frame, used to seed frame channels before the first
    /// render tick.
    pub fn black(width: u32, height: u32) -> Self {
        let mut data = vec![0u8; width as usize * height as usize * 4];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            width,
            height,
            data: Arc::new(data),
            seq: 0,
        }
    }
}

/// The compositor's owned pixel buffer. Written only by the compositor;
/// everyone else sees immutable `SurfaceFrame` snapshots.
#[derive(Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    seq: u64,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        let mut surface = Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
            seq: 0,
        };
        surface.clear();
        surface
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Read one pixel as RGBA. Out-of-bounds reads return opaque black.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 255];
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Clear to opaque black.
    pub fn clear(&mut self) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            px[3] = 255;
        }
    }

    /// Snapshot the current pixels and bump the frame counter.
    pub fn publish(&mut self) -> SurfaceFrame {
        self.seq += 1;
        SurfaceFrame {
            width: self.width,
            height: self.height,
            data: Arc::new(self.pixels.clone()),
            seq: self.seq,
        }
    }

    /// Fill a rectangle with a solid color, clipped to the surface.
    pub fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) {
        let x0 = rect.x.max(0.0) as u32;
        let y0 = rect.y.max(0.0) as u32;
        let x1 = (rect.right().min(self.width as f64)).max(0.0) as u32;
        let y1 = (rect.bottom().min(self.height as f64)).max(0.0) as u32;
        for y in y0..y1 {
            let row = y as usize * self.width as usize;
            for x in x0..x1 {
                let i = (row + x as usize) * 4;
                self.pixels[i..i + 4].copy_from_slice(&color);
            }
        }
    }

    /// Stroke a rectangle outline of the given thickness, clipped.
    pub fn stroke_rect(&mut self, rect: Rect, thickness: f64, color: [u8; 4]) {
        let t = thickness.max(1.0);
        // Top, bottom, left, right bands.
        self.fill_rect(Rect::new(rect.x, rect.y, rect.w, t), color);
        self.fill_rect(Rect::new(rect.x, rect.bottom() - t, rect.w, t), color);
        self.fill_rect(Rect::new(rect.x, rect.y, t, rect.h), color);
        self.fill_rect(Rect::new(rect.right() - t, rect.y, t, rect.h), color);
    }

    /// Draw `src` (a sub-rectangle of `frame` in source pixels) into
    /// `dst` (canvas pixels) with nearest-neighbour sampling, clipping
    /// the destination against the surface. Alpha is ignored; layers
    /// composite fully opaque.
    pub fn blit(&mut self, frame: &SourceFrame, src: Rect, dst: Rect) {
        if src.w <= 0.0 || src.h <= 0.0 || dst.w <= 0.0 || dst.h <= 0.0 {
            return;
        }

        let x0 = dst.x.max(0.0).floor() as i64;
        let y0 = dst.y.max(0.0).floor() as i64;
        let x1 = dst.right().min(self.width as f64).ceil() as i64;
        let y1 = dst.bottom().min(self.height as f64).ceil() as i64;
        if x1 <= x0 || y1 <= y0 {
            return;
        }

        let sx_step = src.w / dst.w;
        let sy_step = src.h / dst.h;
        let fw = frame.width as i64;
        let fh = frame.height as i64;

        for y in y0..y1 {
            let sy = src.y + (y as f64 + 0.5 - dst.y) * sy_step;
            let sy = (sy as i64).clamp(0, fh - 1);
            let src_row = sy as usize * frame.width as usize;
            let dst_row = y as usize * self.width as usize;
            for x in x0..x1 {
                let sx = src.x + (x as f64 + 0.5 - dst.x) * sx_step;
                let sx = (sx as i64).clamp(0, fw - 1);
                let si = (src_row + sx as usize) * 4;
                let di = (dst_row + x as usize) * 4;
                self.pixels[di] = frame.data[si];
                self.pixels[di + 1] = frame.data[si + 1];
                self.pixels[di + 2] = frame.data[si + 2];
                self.pixels[di + 3] = 255;
            }
        }
    }
}
