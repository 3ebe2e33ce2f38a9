//! Getting the low-resolution frame onto the window: nearest-neighbour
//! upscale, overlay dimming and a crosshair.

use rayon::{
    iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Rows of the internal framebuffer; controls the pixel size look.
pub const INTERNAL_HEIGHT: usize = 480;

/// Internal framebuffer size for a window of `dst_w` x `dst_h`: fixed height,
/// width from the aspect ratio, rounded up to even.
pub fn internal_size(dst_w: usize, dst_h: usize) -> (usize, usize) {
    let aspect = if dst_h > 0 {
        dst_w as f32 / dst_h as f32
    } else {
        1.0
    };
    let mut w = ((INTERNAL_HEIGHT as f32 * aspect).round() as usize).max(160);
    if w % 2 != 0 {
        w += 1;
    }
    (w, INTERNAL_HEIGHT)
}

/// Precomputed source column/row for every destination column/row.
#[derive(Debug, Default)]
pub struct Upscaler {
    src_w: usize,
    cols: Vec<usize>,
    rows: Vec<usize>,
}

impl Upscaler {
    pub fn new(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> Self {
        let map = |dst: usize, src: usize| -> Vec<usize> {
            if src == 0 {
                return vec![0; dst];
            }
            (0..dst).map(|i| (i * src / dst).min(src - 1)).collect()
        };
        Self {
            src_w,
            cols: map(dst_w, src_w),
            rows: map(dst_h, src_h),
        }
    }

    pub fn dst_size(&self) -> (usize, usize) {
        (self.cols.len(), self.rows.len())
    }

    /// Stretch `src` over `dst`, rows in parallel. `dim` darkens the frame
    /// while an overlay is up.
    pub fn blit(&self, dst: &mut [u32], src: &[u32], dim: bool) {
        let dw = self.cols.len();
        if dw == 0 {
            return;
        }
        dst.par_chunks_mut(dw)
            .zip(self.rows.par_iter())
            .for_each(|(dst_row, &sy)| {
                let src_row = &src[sy * self.src_w..(sy + 1) * self.src_w];
                for (out, &sx) in dst_row.iter_mut().zip(&self.cols) {
                    let c = src_row[sx];
                    *out = if dim { dim_color(c) } else { c };
                }
            });
    }
}

/// Quarter brightness, per channel.
#[inline]
pub fn dim_color(c: u32) -> u32 {
    (c >> 2) & 0x003F_3F3F
}

/// Small plus sign in the middle of the frame, inverted against the scene.
pub fn draw_crosshair(fb: &mut [u32], w: usize, h: usize) {
    const ARM: usize = 4;
    if w <= 2 * ARM || h <= 2 * ARM {
        return;
    }
    let (cx, cy) = (w / 2, h / 2);
    for d in 1..=ARM {
        for idx in [
            cy * w + cx - d,
            cy * w + cx + d,
            (cy - d) * w + cx,
            (cy + d) * w + cx,
        ] {
            fb[idx] = !fb[idx] & 0x00FF_FFFF;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_size_keeps_aspect_and_even_width() {
        assert_eq!(internal_size(800, 600), (640, 480));
        assert_eq!(internal_size(1920, 1080), (854, 480));
        assert_eq!(internal_size(100, 1000), (160, 480));
        assert_eq!(internal_size(0, 0), (480, 480));
    }

    #[test]
    fn upscale_repeats_source_pixels() {
        let src = vec![1, 2, 3, 4]; // 2x2
        let up = Upscaler::new(4, 4, 2, 2);
        let mut dst = vec![0u32; 16];
        up.blit(&mut dst, &src, false);
        assert_eq!(
            dst,
            vec![1, 1, 2, 2, 1, 1, 2, 2, 3, 3, 4, 4, 3, 3, 4, 4]
        );
        assert_eq!(up.dst_size(), (4, 4));
    }

    #[test]
    fn dimming_quarters_each_channel() {
        assert_eq!(dim_color(0x00FF_8040), 0x003F_2010);
        let up = Upscaler::new(1, 1, 1, 1);
        let mut dst = vec![0u32];
        up.blit(&mut dst, &[0x0080_8080], true);
        assert_eq!(dst[0], 0x0020_2020);
    }

    #[test]
    fn crosshair_leaves_center_pixel() {
        let (w, h) = (32, 24);
        let mut fb = vec![0u32; w * h];
        draw_crosshair(&mut fb, w, h);
        assert_eq!(fb[12 * w + 16], 0);
        assert_eq!(fb[12 * w + 17], 0x00FF_FFFF);
        assert_eq!(fb[8 * w + 16], 0x00FF_FFFF);
        assert_eq!(fb.iter().filter(|&&c| c != 0).count(), 16);
    }
}
