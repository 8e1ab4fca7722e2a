//! 类别调色板
//!
//! 在色相环上均匀取 `n` 个点（饱和度、明度固定为0.9）并转换为RGB，
//! 类别ID按 `class_id mod n` 映射到颜色，因此 `class_id >= n` 时颜色会重复。

use image::{Rgb, Rgba};

use crate::config::DEFAULT_PALETTE_SIZE;
use crate::error::{Error, Result};

const SATURATION: f64 = 0.9;
const VALUE: f64 = 0.9;

/// 生成 `n` 个RGB颜色
///
/// 色相按 `i / n` 均匀分布，每个分量截断到 `[0, 255]`。`n == 0` 时返回空序列。
pub fn generate(n: usize) -> Vec<Rgb<u8>> {
    (0..n)
        .map(|i| {
            let (r, g, b) = hsv_to_rgb(i as f64 / n as f64, SATURATION, VALUE);
            Rgb([to_channel(r), to_channel(g), to_channel(b)])
        })
        .collect()
}

fn to_channel(c: f64) -> u8 {
    (c * 255.0).clamp(0.0, 255.0) as u8
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (v, v, v);
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// 不可变的类别调色板
///
/// 构造后只读，可以通过 `Arc` 在流水线和渲染器之间共享。
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb<u8>>,
}

impl Palette {
    /// 生成包含 `n` 个颜色的调色板
    ///
    /// # 错误处理
    /// `n == 0` 时返回 [`Error::EmptyPalette`]
    pub fn new(n: usize) -> Result<Self> {
        Self::from_colors(generate(n))
    }

    /// 使用给定颜色构造调色板
    pub fn from_colors(colors: Vec<Rgb<u8>>) -> Result<Self> {
        if colors.is_empty() {
            return Err(Error::EmptyPalette);
        }
        Ok(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// 类别ID对应的颜色，负数ID同样按欧几里得取模
    pub fn color_for(&self, class_id: i64) -> Rgb<u8> {
        let index = class_id.rem_euclid(self.colors.len() as i64) as usize;
        self.colors[index]
    }

    /// `#rrggbb` 格式的颜色
    pub fn hex_for(&self, class_id: i64) -> String {
        let Rgb([r, g, b]) = self.color_for(class_id);
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    /// 附加透明度的颜色
    pub fn rgba_for(&self, class_id: i64, alpha: u8) -> Rgba<u8> {
        let Rgb([r, g, b]) = self.color_for(class_id);
        Rgba([r, g, b, alpha])
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: generate(DEFAULT_PALETTE_SIZE),
        }
    }
}
