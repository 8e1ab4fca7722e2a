//! 标签字体
//!
//! 依次尝试候选路径中的系统字体，全部失败时退回内置的8x8点阵字体。
//! 点阵字体不支持调整字号，这是可接受的。

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use font8x8::UnicodeFonts;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{debug, warn};

const BUILTIN_GLYPH_SIZE: u32 = 8;

pub enum LabelFont {
    /// 从字体文件加载的矢量字体
    Scalable(FontVec),
    /// 内置点阵字体，固定8像素
    Builtin,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelFont::Scalable(_) => f.write_str("LabelFont::Scalable"),
            LabelFont::Builtin => f.write_str("LabelFont::Builtin"),
        }
    }
}

/// 按顺序尝试加载字体文件，返回第一个成功加载的字体
pub fn resolve_font<P: AsRef<Path>>(paths: &[P]) -> LabelFont {
    for path in paths {
        let path = path.as_ref();
        let Ok(data) = std::fs::read(path) else {
            continue;
        };
        match FontVec::try_from_vec(data) {
            Ok(font) => {
                debug!(path = %path.display(), "label font loaded");
                return LabelFont::Scalable(font);
            }
            Err(e) => debug!(path = %path.display(), error = %e, "font file rejected"),
        }
    }
    warn!("no system font found, falling back to builtin bitmap font");
    LabelFont::Builtin
}

impl LabelFont {
    pub fn is_builtin(&self) -> bool {
        matches!(self, LabelFont::Builtin)
    }

    /// 文本渲染后的宽高（像素）
    pub fn text_size(&self, size: u32, text: &str) -> (u32, u32) {
        match self {
            LabelFont::Scalable(font) => text_size(PxScale::from(size as f32), font, text),
            LabelFont::Builtin => (
                text.chars().count() as u32 * BUILTIN_GLYPH_SIZE,
                BUILTIN_GLYPH_SIZE,
            ),
        }
    }

    /// 以 `(x, y)` 为左上角绘制文本，超出图像的部分被裁剪
    pub fn draw(
        &self,
        image: &mut RgbImage,
        color: Rgb<u8>,
        x: i32,
        y: i32,
        size: u32,
        text: &str,
    ) {
        match self {
            LabelFont::Scalable(font) => {
                draw_text_mut(image, color, x, y, PxScale::from(size as f32), font, text);
            }
            LabelFont::Builtin => draw_bitmap_text(image, color, x, y, text),
        }
    }
}

fn draw_bitmap_text(image: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, text: &str) {
    let (width, height) = (image.width() as i32, image.height() as i32);
    for (index, ch) in text.chars().enumerate() {
        let glyph = font8x8::BASIC_FONTS.get(ch).or_else(|| font8x8::LATIN_FONTS.get(ch));
        let Some(glyph) = glyph else {
            continue;
        };
        let origin_x = x + index as i32 * BUILTIN_GLYPH_SIZE as i32;
        for (row, bits) in glyph.iter().enumerate() {
            let py = y + row as i32;
            if py < 0 || py >= height {
                continue;
            }
            for col in 0..8 {
                // 最低位是最左侧像素
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = origin_x + col;
                if px >= 0 && px < width {
                    image.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}
