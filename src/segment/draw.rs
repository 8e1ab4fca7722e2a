//! 检测结果可视化
//!
//! 绘制顺序固定为：掩码 -> 边界框 -> 标签，保证标签始终在最上层。
//!
//! 掩码有两种合成方式：
//! - [`Renderer::render`] 与 [`Renderer::render_masks_only`]：所有掩码先画到透明图层上
//!   （后画的覆盖先画的），再用 over 运算整体叠加到原图
//! - [`Renderer::render_overlay_for_classes`]：逐个检测直接替换原图像素，不做混合

use std::collections::BTreeSet;
use std::sync::Arc;

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use ndarray::Array2;
use raqote::{DrawOptions, DrawTarget, LineJoin, PathBuilder, SolidSource, Source, StrokeStyle};

use crate::config::{
    FONT_SEARCH_PATHS, LABEL_DROP, LABEL_PADDING, LABEL_RISE, MASK_BINARY_THRESHOLD,
    MASKS_ONLY_ALPHA, OVERLAY_ALPHA, SessionConfig,
};
use crate::segment::bounds::{Detection, PixelBox};
use crate::segment::font::{resolve_font, LabelFont};
use crate::segment::palette::Palette;

const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// 渲染器
///
/// 持有共享的只读调色板和构造时解析好的标签字体。
#[derive(Debug)]
pub struct Renderer {
    palette: Arc<Palette>,
    font: LabelFont,
}

impl Renderer {
    /// 使用系统字体搜索路径创建渲染器
    pub fn new(palette: Arc<Palette>) -> Self {
        Self::with_font(palette, resolve_font(FONT_SEARCH_PATHS))
    }

    pub fn with_font(palette: Arc<Palette>, font: LabelFont) -> Self {
        Self { palette, font }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn font(&self) -> &LabelFont {
        &self.font
    }

    /// 在原图副本上绘制检测结果
    ///
    /// # 参数
    /// * `image` - 原图，任何颜色模式都会先转换为RGBA
    /// * `detections` - 检测结果，按顺序绘制
    /// * `config` - 使用其中的 `show_*`、`mask_alpha`、`box_thickness`、`font_size`
    ///
    /// # 返回值
    /// 返回RGB图像；三个开关都关闭时与原图逐像素相同
    pub fn render(
        &self,
        image: &DynamicImage,
        detections: &[Detection],
        config: &SessionConfig,
    ) -> RgbImage {
        let mut canvas = image.to_rgba8();
        if config.show_masks {
            let (width, height) = canvas.dimensions();
            let layer = self.mask_layer(width, height, detections, config.mask_alpha);
            alpha_composite(&mut canvas, &layer);
        }
        let mut result = DynamicImage::ImageRgba8(canvas).to_rgb8();

        if config.show_boxes && !detections.is_empty() {
            result = self.draw_boxes(&result, detections, config.box_thickness);
        }
        if config.show_labels {
            for detection in detections {
                self.draw_label(&mut result, detection, config.font_size);
            }
        }
        result
    }

    /// 只绘制掩码
    pub fn render_masks_only(
        &self,
        image: &DynamicImage,
        detections: &[Detection],
        alpha: u8,
    ) -> RgbImage {
        let mut canvas = image.to_rgba8();
        let layer = self.mask_layer(canvas.width(), canvas.height(), detections, alpha);
        alpha_composite(&mut canvas, &layer);
        DynamicImage::ImageRgba8(canvas).to_rgb8()
    }

    /// 只绘制掩码，使用默认的较高不透明度
    pub fn render_masks_only_default(
        &self,
        image: &DynamicImage,
        detections: &[Detection],
    ) -> RgbImage {
        self.render_masks_only(image, detections, MASKS_ONLY_ALPHA)
    }

    /// 只为选中的类别绘制掩码
    ///
    /// `selected` 为 `None` 时绘制全部类别。每个检测的掩码区域直接被类别颜色替换，
    /// 重叠处显示后一个检测的颜色，不与原图混合。
    pub fn render_overlay_for_classes(
        &self,
        image: &DynamicImage,
        detections: &[Detection],
        selected: Option<&BTreeSet<i64>>,
    ) -> RgbImage {
        let mut canvas = image.to_rgba8();
        for detection in detections {
            if selected.is_some_and(|ids| !ids.contains(&detection.class_id)) {
                continue;
            }
            let Some(grid) = detection.mask.grid() else {
                continue;
            };
            let color = self.palette.rgba_for(detection.class_id, OVERLAY_ALPHA);
            paint_stencil(&mut canvas, grid, color);
        }
        DynamicImage::ImageRgba8(canvas).to_rgb8()
    }

    fn mask_layer(
        &self,
        width: u32,
        height: u32,
        detections: &[Detection],
        alpha: u8,
    ) -> RgbaImage {
        let mut layer = RgbaImage::new(width, height);
        for detection in detections {
            if let Some(grid) = detection.mask.grid() {
                let color = self.palette.rgba_for(detection.class_id, alpha);
                paint_stencil(&mut layer, grid, color);
            }
        }
        layer
    }

    fn draw_boxes(&self, image: &RgbImage, detections: &[Detection], thickness: u32) -> RgbImage {
        let (img_width, img_height) = image.dimensions();
        let mut dt = DrawTarget::new(img_width as i32, img_height as i32);

        // RGB -> 预乘ARGB（不透明，预乘与否结果相同）
        for (dst, pixel) in dt.get_data_mut().iter_mut().zip(image.pixels()) {
            let [r, g, b] = pixel.0;
            *dst = u32::from_le_bytes([b, g, r, 0xFF]);
        }

        for detection in detections {
            let Rgb([r, g, b]) = self.palette.color_for(detection.class_id);
            let source = Source::Solid(SolidSource::from_unpremultiplied_argb(0xFF, r, g, b));
            stroke_box(&mut dt, &detection.bbox, thickness, &source);
        }

        let pixels: Vec<u8> = dt
            .get_data()
            .iter()
            .flat_map(|&pixel| {
                let [b, g, r, _] = pixel.to_le_bytes();
                [r, g, b]
            })
            .collect();
        RgbImage::from_raw(img_width, img_height, pixels).unwrap_or_else(|| image.clone())
    }

    fn draw_label(&self, image: &mut RgbImage, detection: &Detection, font_size: u32) {
        let text = detection.label_text();
        let (text_w, text_h) = self.font.text_size(font_size, &text);
        let x = detection.bbox.left as i32;
        let y = label_origin_y(&detection.bbox);

        let color = self.palette.color_for(detection.class_id);
        let background = Rect::at(x - LABEL_PADDING, y - LABEL_PADDING)
            .of_size(text_w + 2 * LABEL_PADDING as u32 + 1, text_h + 2 * LABEL_PADDING as u32 + 1);
        draw_filled_rect_mut(image, background, color);
        self.font.draw(image, LABEL_TEXT_COLOR, x, y, font_size, &text);
    }
}

/// 标签左上角的纵坐标
///
/// 默认放在框上方 `LABEL_RISE` 像素处；若会越过图像顶部，则改放到框底边下方 `LABEL_DROP` 像素处。
pub fn label_origin_y(bbox: &PixelBox) -> i32 {
    let above = bbox.top as i32 - LABEL_RISE;
    if above < 0 {
        bbox.bottom as i32 + LABEL_DROP
    } else {
        above
    }
}

/// 描边矩形，线宽向框内延伸，外沿与框的像素边界对齐
fn stroke_box(dt: &mut DrawTarget, bbox: &PixelBox, thickness: u32, source: &Source) {
    let outer_w = (bbox.width() + 1) as f32;
    let outer_h = (bbox.height() + 1) as f32;
    let line = thickness as f32;
    let (left, top) = (bbox.left as f32, bbox.top as f32);

    if outer_w <= 2.0 * line || outer_h <= 2.0 * line {
        dt.fill_rect(left, top, outer_w, outer_h, source, &DrawOptions::new());
        return;
    }

    let mut pb = PathBuilder::new();
    pb.rect(left + line / 2.0, top + line / 2.0, outer_w - line, outer_h - line);
    let path = pb.finish();
    dt.stroke(
        &path,
        source,
        &StrokeStyle {
            join: LineJoin::Miter,
            width: line,
            ..StrokeStyle::default()
        },
        &DrawOptions::new(),
    );
}

/// 把掩码中大于0.5的像素替换为给定颜色
fn paint_stencil(target: &mut RgbaImage, grid: &Array2<f32>, color: Rgba<u8>) {
    let (width, height) = target.dimensions();
    for ((y, x), &value) in grid.indexed_iter() {
        if value > MASK_BINARY_THRESHOLD && (x as u32) < width && (y as u32) < height {
            target.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// over 运算：把 `layer` 叠加到 `base` 上
///
/// 两者尺寸必须相同，多出的部分被忽略。
pub fn alpha_composite(base: &mut RgbaImage, layer: &RgbaImage) {
    for (dst, src) in base.pixels_mut().zip(layer.pixels()) {
        *dst = over(*src, *dst);
    }
}

/// 单个像素的 over 运算
pub fn over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let src_a = src.0[3] as f32 / 255.0;
    if src_a == 0.0 {
        return dst;
    }
    let dst_a = dst.0[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (src.0[c] as f32 * src_a + dst.0[c] as f32 * dst_a * (1.0 - src_a)) / out_a;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// 使用默认调色板和系统字体绘制检测结果
pub fn draw_detections(
    image: &DynamicImage,
    detections: &[Detection],
    config: &SessionConfig,
) -> RgbImage {
    Renderer::new(Arc::new(Palette::default())).render(image, detections, config)
}
