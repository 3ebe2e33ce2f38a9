use crate::{camera::Camera, geometry::WallPanel, world::WallSide};

const NEAR: f32 = 0.1;

#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    // BGRA8 in little-endian memory
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16)
    // Alpha at 0
}

pub const BACKDROP_UPPER: u32 = 0x0014_1418;
pub const BACKDROP_LOWER: u32 = 0x0020_1c1a;
pub const CEILING: u32 = 0x00e8_e6e0;
pub const FLOOR: u32 = 0x005a_4a3c;

fn side_color(side: WallSide) -> u32 {
    match side {
        WallSide::North => pack_rgb(236, 234, 228),
        WallSide::South => pack_rgb(214, 212, 206),
        WallSide::West => pack_rgb(196, 194, 190),
        WallSide::East => pack_rgb(182, 180, 176),
    }
}

fn panel_depth_cam_space(cam: &Camera, panel: &WallPanel) -> f32 {
    // Use midpoint depth in camera space for sorting
    let m = cam.world_to_camera((panel.start + panel.end) * 0.5);
    m[1] // cy (forward depth)
}

pub fn render_frame(
    buf: &mut [u32],
    width: usize,
    height: usize,
    panels: &[WallPanel],
    camera: &Camera,
) {
    // Backdrop split at the (pitched) horizon
    let horizon = camera.screen_center_y(height as f32).floor().clamp(0.0, height as f32) as usize;
    for (y, row) in buf.chunks_mut(width).take(height).enumerate() {
        row.fill(if y < horizon {
            BACKDROP_UPPER
        } else {
            BACKDROP_LOWER
        });
    }

    if panels.is_empty() {
        return;
    }

    // sentinels
    let mut ceil_clip: Vec<i32> = vec![height as i32; width]; // “no top yet”
    let mut floor_clip: Vec<i32> = vec![-1; width];

    let mut order: Vec<(f32, usize)> = panels
        .iter()
        .enumerate()
        .map(|(i, p)| (panel_depth_cam_space(camera, p), i))
        .collect();
    order.sort_by(|a, b| b.0.total_cmp(&a.0)); // farthest first

    for (_, i) in order {
        let panel = &panels[i];
        draw_panel(
            buf,
            width,
            height,
            camera,
            panel,
            side_color(panel.side),
            &mut ceil_clip,
            &mut floor_clip,
        );
    }

    // post fill
    for x in 0..width {
        let cc = ceil_clip[x];
        let fc = floor_clip[x];
        if cc < height as i32 {
            for y in 0..cc.clamp(0, height as i32) {
                buf[y as usize * width + x] = CEILING;
            }
        }
        // only below panels that stand on the floor
        if fc >= 0 {
            for y in (fc.clamp(-1, height as i32 - 1) + 1)..(height as i32) {
                buf[y as usize * width + x] = FLOOR;
            }
        }
    }
}

fn draw_panel(
    buf: &mut [u32],
    width: usize,
    height: usize,
    camera: &Camera,
    panel: &WallPanel,
    color: u32,
    ceil_clip: &mut [i32],
    floor_clip: &mut [i32],
) {
    let screen_width = width as f32;
    let screen_height = height as f32;
    let cy0 = camera.screen_center_y(screen_height);
    let stands_on_floor = panel.bottom <= crate::EPSILON;

    // Transform panel endpoints to camera space
    let mut p0 = camera.world_to_camera(panel.start);
    let mut p1 = camera.world_to_camera(panel.end);

    // Trivial reject: both behind near plane
    if p0[1] <= NEAR && p1[1] <= NEAR {
        return;
    }

    // Horizontal frustum reject (fully outside left/right)
    let tan_half_fovx = 0.5 * screen_width / camera.fx;
    let left_plane = |cx: f32, cy: f32| cx < -cy * tan_half_fovx;
    let right_plane = |cx: f32, cy: f32| cx > cy * tan_half_fovx;
    if (left_plane(p0[0], p0[1]) && left_plane(p1[0], p1[1]))
        || (right_plane(p0[0], p0[1]) && right_plane(p1[0], p1[1]))
    {
        return;
    }

    if !clip_line_near(&mut p0, &mut p1) {
        return;
    }

    let sx0 = camera.project_x(p0[0], p0[1], screen_width);
    let sx1 = camera.project_x(p1[0], p1[1], screen_width);
    if (sx0 - sx1).abs() < 0.5 {
        return;
    }

    let mut x0 = sx0.floor() as i32;
    let mut x1 = sx1.floor() as i32;
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut p0, &mut p1); // keep p0/p1 in sync with x0/x1
    }
    let (x0, x1) = (x0.max(0), x1.min((width as i32) - 1));
    if x0 >= x1 {
        return;
    }

    let inv_cy0 = 1.0 / p0[1];
    let inv_cy1 = 1.0 / p1[1];

    let sx_left = camera.project_x(p0[0], p0[1], screen_width);
    let sx_right = camera.project_x(p1[0], p1[1], screen_width);
    let sx_span = sx_right - sx_left;
    if sx_span.abs() < f32::EPSILON {
        return;
    }

    for xi in x0..=x1 {
        let x = xi as usize;
        let alpha = ((xi as f32) - sx_left) / sx_span;
        // 1/depth is linear in screen space
        let inv_cy = lerp(inv_cy0, inv_cy1, alpha);

        let y_to_screen = camera.fy * inv_cy;
        let top = cy0 - y_to_screen * (panel.top - camera.eye_y);
        let bottom = cy0 - y_to_screen * (panel.bottom - camera.eye_y);

        let mut y0 = top.floor() as i32;
        let mut y1 = bottom.floor() as i32;
        if y0 > y1 {
            std::mem::swap(&mut y0, &mut y1);
        }
        y0 = y0.max(0);
        y1 = y1.min((height as i32) - 1);
        if y0 > y1 {
            continue;
        }

        let mut idx = (y0 as usize) * width + x;
        for _y in y0..=y1 {
            buf[idx] = color;
            idx += width;
        }

        if y0 < ceil_clip[x] {
            ceil_clip[x] = y0;
        }
        if stands_on_floor && y1 > floor_clip[x] {
            floor_clip[x] = y1;
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

// Clip line segment in camera space so both endpoints have cy > NEAR
fn clip_line_near(p0: &mut [f32; 2], p1: &mut [f32; 2]) -> bool {
    let in0 = p0[1] > NEAR;
    let in1 = p1[1] > NEAR;
    if !in0 && !in1 {
        return false;
    }

    // Slide `a` along a->b onto the near plane
    let clip_endpoint = |a: &mut [f32; 2], b: &[f32; 2]| {
        let t = (NEAR - a[1]) / (b[1] - a[1]);
        a[0] += t * (b[0] - a[0]);
        a[1] = NEAR;
    };

    if !in0 {
        clip_endpoint(p0, p1);
    } else if !in1 {
        clip_endpoint(p1, p0);
    }
    true
}
