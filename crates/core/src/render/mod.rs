use image::{Rgba, RgbaImage};

use crate::{config::RenderConfig, Sprite};

/// Software compositor that flattens the attached sprites onto a frame.
/// Sprites are drawn in attach order, so newer elements sit on top.
#[derive(Debug, Clone)]
pub struct Compositor {
    width: u32,
    height: u32,
    background: Rgba<u8>,
}

impl Compositor {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self {
            width,
            height,
            background,
        }
    }

    pub fn draw(&self, sprites: &[Sprite]) -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(self.width, self.height, self.background);
        for sprite in sprites {
            self.blit(&mut frame, sprite);
        }
        frame
    }

    fn blit(&self, frame: &mut RgbaImage, sprite: &Sprite) {
        let opacity = sprite.opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }

        let origin_x = sprite.position.x.round() as i64;
        let origin_y = sprite.position.y.round() as i64;
        let (frame_w, frame_h) = (i64::from(self.width), i64::from(self.height));

        for (sx, sy, src) in sprite.texture.enumerate_pixels() {
            let x = origin_x + i64::from(sx);
            let y = origin_y + i64::from(sy);
            if x < 0 || y < 0 || x >= frame_w || y >= frame_h {
                continue;
            }
            let dst = frame.get_pixel_mut(x as u32, y as u32);
            *dst = blend(*dst, *src, opacity);
        }
    }
}

impl From<&RenderConfig> for Compositor {
    fn from(config: &RenderConfig) -> Self {
        Self::new(config.width, config.height, Rgba(config.background))
    }
}

/// Source-over blend of `src` scaled by `opacity` onto `dst`.
fn blend(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let alpha = f32::from(src[3]) / 255.0 * opacity;
    let mix = |d: u8, s: u8| (f32::from(s) * alpha + f32::from(d) * (1.0 - alpha)).round() as u8;
    let out_alpha = alpha + f32::from(dst[3]) / 255.0 * (1.0 - alpha);
    Rgba([
        mix(dst[0], src[0]),
        mix(dst[1], src[1]),
        mix(dst[2], src[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
