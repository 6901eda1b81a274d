//! Pixel-level painting on an [`RgbImage`]: density shades, node disks and the category palette.

use image::{Rgb, RgbImage};

use crate::io::{Category, NUMBER_OF_CATEGORIES};

/// Colour of nodes if no categories are available
pub const DEFAULT_NODE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Colours of categories `0..=6`
pub const PALETTE: [Rgb<u8>; NUMBER_OF_CATEGORIES] = [
    Rgb([123, 123, 123]),
    Rgb([255, 0, 0]),
    Rgb([0, 255, 0]),
    Rgb([0, 0, 255]),
    Rgb([255, 255, 0]),
    Rgb([0, 255, 255]),
    Rgb([255, 0, 255]),
];

/// Background of the canvas
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Largest shade of a density, reached as the density approaches `1`
pub const MAX_SHADE: u8 = 123;

/// Colour of a category, unknown categories fall back to unclassified
pub fn category_color(category: Category) -> Rgb<u8> {
    PALETTE
        .get(category as usize)
        .copied()
        .unwrap_or(PALETTE[0])
}

/// Maps a density to a shade in `0..=123`: `⌊v · 123 + 1⌋` for `v > 0`, else `0`
///
/// # Examples
/// ```
/// use citemap::render::shade;
///
/// assert_eq!(shade(0.0), 0);
/// assert_eq!(shade(0.001), 1);
/// assert_eq!(shade(0.5), 62);
/// assert_eq!(shade(0.9999), 123);
/// ```
#[inline(always)]
pub fn shade(density: f32) -> u8 {
    if density > 0.0 {
        ((density as f64 * MAX_SHADE as f64 + 1.0) as u32).min(MAX_SHADE as u32) as u8
    } else {
        0
    }
}

/// Grey level of a density, denser is darker
#[inline(always)]
pub fn grey(density: f32) -> Rgb<u8> {
    let level = 255 - shade(density);
    Rgb([level, level, level])
}

/// Darkens `pixel` multiplicatively by the shade of `density`
#[inline(always)]
pub fn darken(pixel: &mut Rgb<u8>, density: f32) {
    let factor = (255 - shade(density)) as u32;
    for c in pixel.0.iter_mut() {
        *c = (*c as u32 * factor / 255) as u8;
    }
}

/// Blends `color` with opacity `alpha` over `pixel`
#[inline(always)]
pub fn blend(pixel: &mut Rgb<u8>, color: Rgb<u8>, alpha: f32) {
    for (c, &target) in pixel.0.iter_mut().zip(color.0.iter()) {
        let mixed = *c as f32 * (1.0 - alpha) + target as f32 * alpha;
        *c = mixed.round().clamp(0.0, 255.0) as u8;
    }
}

/// Paints a filled disk of `diameter` pixels centred on pixel `(cx, cy)`.
///
/// A pixel is covered if its centre lies within `diameter / 2` of the centre of `(cx, cy)`.
/// Pixels outside the image are skipped. Returns the number of painted pixels.
pub fn paint_disk(
    image: &mut RgbImage,
    (cx, cy): (i64, i64),
    diameter: f32,
    color: Rgb<u8>,
    alpha: f32,
) -> u32 {
    let radius = diameter as f64 / 2.0;
    let reach = radius.ceil() as i64;
    let (width, height) = (image.width() as i64, image.height() as i64);

    let mut painted = 0;
    for y in (cy - reach).max(0)..=(cy + reach).min(height - 1) {
        for x in (cx - reach).max(0)..=(cx + reach).min(width - 1) {
            let (dx, dy) = ((x - cx) as f64, (y - cy) as f64);
            if dx * dx + dy * dy <= radius * radius {
                blend(image.get_pixel_mut(x as u32, y as u32), color, alpha);
                painted += 1;
            }
        }
    }
    painted
}
