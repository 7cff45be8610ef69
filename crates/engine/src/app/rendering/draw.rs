use image::RgbaImage;

pub(crate) fn write_pixel_rgba_clipped(
    frame: &mut [u8],
    width: usize,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    let Some(byte_offset) = pixel_byte_offset(frame.len(), width, x, y) else {
        return;
    };
    frame[byte_offset..byte_offset + 4].copy_from_slice(&color);
}

/// Source-over blend of `color` at `alpha` (0..=1) onto an opaque frame.
pub(crate) fn blend_pixel_clipped(
    frame: &mut [u8],
    width: usize,
    x: i32,
    y: i32,
    color: [u8; 3],
    alpha: f32,
) {
    if alpha <= 0.0 {
        return;
    }
    let Some(byte_offset) = pixel_byte_offset(frame.len(), width, x, y) else {
        return;
    };
    let pixel = &mut frame[byte_offset..byte_offset + 4];
    if alpha >= 1.0 {
        pixel[..3].copy_from_slice(&color);
    } else {
        for (dst, src) in pixel[..3].iter_mut().zip(color) {
            *dst = blend_channel(*dst, src, alpha);
        }
    }
    pixel[3] = 255;
}

fn blend_channel(dst: u8, src: u8, alpha: f32) -> u8 {
    let dst = dst as f32;
    (dst + (src as f32 - dst) * alpha).round().clamp(0.0, 255.0) as u8
}

fn pixel_byte_offset(frame_len: usize, width: usize, x: i32, y: i32) -> Option<usize> {
    if x < 0 || y < 0 || x as usize >= width {
        return None;
    }
    let pixel_offset = (y as usize)
        .checked_mul(width)?
        .checked_add(x as usize)?;
    let byte_offset = pixel_offset.checked_mul(4)?;
    let end = byte_offset.checked_add(4)?;
    (end <= frame_len).then_some(byte_offset)
}

pub(crate) fn fill_frame(frame: &mut [u8], color: [u8; 4]) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&color);
    }
}

/// Fills a rectangle; the colour's alpha channel blends it over the frame.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_filled_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    left: i32,
    top: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let alpha = color[3] as f32 / 255.0;
    let rgb = [color[0], color[1], color[2]];
    let x_range = left.max(0)..(left + rect_width).min(width as i32);
    for y in top.max(0)..(top + rect_height).min(height as i32) {
        for x in x_range.clone() {
            blend_pixel_clipped(frame, width as usize, x, y, rgb, alpha);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_rect_outline(
    frame: &mut [u8],
    width: u32,
    height: u32,
    left: i32,
    top: i32,
    rect_width: i32,
    rect_height: i32,
    thickness: i32,
    color: [u8; 4],
) {
    let t = thickness.max(1);
    draw_filled_rect(frame, width, height, left, top, rect_width, t, color);
    draw_filled_rect(
        frame,
        width,
        height,
        left,
        top + rect_height - t,
        rect_width,
        t,
        color,
    );
    draw_filled_rect(frame, width, height, left, top, t, rect_height, color);
    draw_filled_rect(
        frame,
        width,
        height,
        left + rect_width - t,
        top,
        t,
        rect_height,
        color,
    );
}

/// Nearest-neighbour blit of `image` into the screen rectangle starting at
/// (`left`, `top`) with the given size. Source alpha is multiplied by
/// `opacity`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_image_scaled(
    frame: &mut [u8],
    width: u32,
    height: u32,
    image: &RgbaImage,
    left: f32,
    top: f32,
    dest_width: f32,
    dest_height: f32,
    opacity: f32,
) {
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 || dest_width <= 0.0 || dest_height <= 0.0 || opacity <= 0.0 {
        return;
    }

    let draw_left = left.floor().max(0.0) as i32;
    let draw_top = top.floor().max(0.0) as i32;
    let draw_right = ((left + dest_width).ceil() as i32).min(width as i32);
    let draw_bottom = ((top + dest_height).ceil() as i32).min(height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let x_ratio = src_w as f32 / dest_width;
    let y_ratio = src_h as f32 / dest_height;
    for out_y in draw_top..draw_bottom {
        let src_y = ((out_y as f32 + 0.5 - top) * y_ratio).floor();
        if src_y < 0.0 || src_y >= src_h as f32 {
            continue;
        }
        for out_x in draw_left..draw_right {
            let src_x = ((out_x as f32 + 0.5 - left) * x_ratio).floor();
            if src_x < 0.0 || src_x >= src_w as f32 {
                continue;
            }
            let texel = image.get_pixel(src_x as u32, src_y as u32).0;
            let alpha = texel[3] as f32 / 255.0 * opacity;
            blend_pixel_clipped(
                frame,
                width as usize,
                out_x,
                out_y,
                [texel[0], texel[1], texel[2]],
                alpha,
            );
        }
    }
}

/// Draws `image` stretched to a `size`-pixel square centred on
/// (`center_x`, `center_y`) and rotated clockwise by `angle` radians.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_image_rotated(
    frame: &mut [u8],
    width: u32,
    height: u32,
    image: &RgbaImage,
    center_x: f32,
    center_y: f32,
    size: f32,
    angle: f32,
    opacity: f32,
) {
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 || size <= 0.0 || opacity <= 0.0 {
        return;
    }

    // The rotated square fits inside a circle of this radius.
    let reach = size * std::f32::consts::FRAC_1_SQRT_2;
    let draw_left = ((center_x - reach).floor() as i32).max(0);
    let draw_top = ((center_y - reach).floor() as i32).max(0);
    let draw_right = ((center_x + reach).ceil() as i32).min(width as i32);
    let draw_bottom = ((center_y + reach).ceil() as i32).min(height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let (sin, cos) = angle.sin_cos();
    let half = size / 2.0;
    let x_ratio = src_w as f32 / size;
    let y_ratio = src_h as f32 / size;
    for out_y in draw_top..draw_bottom {
        let dy = out_y as f32 + 0.5 - center_y;
        for out_x in draw_left..draw_right {
            let dx = out_x as f32 + 0.5 - center_x;
            // Inverse rotation back into the unrotated square.
            let local_x = dx * cos + dy * sin + half;
            let local_y = -dx * sin + dy * cos + half;
            if local_x < 0.0 || local_y < 0.0 || local_x >= size || local_y >= size {
                continue;
            }
            let src_x = ((local_x * x_ratio) as u32).min(src_w - 1);
            let src_y = ((local_y * y_ratio) as u32).min(src_h - 1);
            let texel = image.get_pixel(src_x, src_y).0;
            let alpha = texel[3] as f32 / 255.0 * opacity;
            blend_pixel_clipped(
                frame,
                width as usize,
                out_x,
                out_y,
                [texel[0], texel[1], texel[2]],
                alpha,
            );
        }
    }
}
