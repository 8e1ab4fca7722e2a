//! 掩码生成
//!
//! - [`paste_native_mask`]：把模型输出的低分辨率掩码双线性缩放到框的大小，再贴到全图画布上
//! - [`ellipse_mask`]：没有原生掩码时，在框内接一个实心椭圆作为近似掩码
//!
//! 两者都返回与原图同尺寸的 `Array2<f32>`（行=高，列=宽）。

use ndarray::{s, Array2, ArrayView2};

use crate::config::ELLIPSE_PADDING_RATIO;
use crate::segment::bounds::PixelBox;

/// 双线性插值缩放（半像素中心对齐）
///
/// 输入为空时返回全零网格。
pub fn resize_bilinear(src: &ArrayView2<f32>, out_h: usize, out_w: usize) -> Array2<f32> {
    let (in_h, in_w) = src.dim();
    let mut out = Array2::<f32>::zeros((out_h, out_w));
    if in_h == 0 || in_w == 0 || out_h == 0 || out_w == 0 {
        return out;
    }

    let scale_y = in_h as f32 / out_h as f32;
    let scale_x = in_w as f32 / out_w as f32;
    let xs: Vec<(usize, usize, f32)> = (0..out_w).map(|x| sample_axis(x, scale_x, in_w)).collect();

    for y in 0..out_h {
        let (y0, y1, fy) = sample_axis(y, scale_y, in_h);
        for (x, &(x0, x1, fx)) in xs.iter().enumerate() {
            let top = src[[y0, x0]] + (src[[y0, x1]] - src[[y0, x0]]) * fx;
            let bottom = src[[y1, x0]] + (src[[y1, x1]] - src[[y1, x0]]) * fx;
            out[[y, x]] = top + (bottom - top) * fy;
        }
    }
    out
}

fn sample_axis(out: usize, scale: f32, len: usize) -> (usize, usize, f32) {
    let pos = (out as f32 + 0.5) * scale - 0.5;
    let floor = pos.floor();
    let lower = floor.max(0.0) as usize;
    let upper = (pos.ceil().max(0.0) as usize).min(len - 1);
    (lower.min(len - 1), upper, pos - floor)
}

/// 把原生掩码缩放并贴到全图画布
///
/// # 参数
/// * `mask` - 模型输出的单实例掩码，形状 `(h, w)`
/// * `norm_box` - 该实例的归一化框 `(ymin, xmin, ymax, xmax)`
/// * `height` / `width` - 原图尺寸
///
/// 框坐标按截断取整；缩放目标尺寸的宽高至少为1。粘贴前把框钳制到图像范围，
/// 粘贴区域取钳制后尺寸与缩放后尺寸的较小值，从缩放结果的左上角开始截取。
pub fn paste_native_mask(
    mask: &ArrayView2<f32>,
    norm_box: [f32; 4],
    height: u32,
    width: u32,
) -> Array2<f32> {
    let [ymin, xmin, ymax, xmax] = norm_box;
    let (h, w) = (height as i64, width as i64);

    let y1 = (ymin * height as f32) as i64;
    let x1 = (xmin * width as f32) as i64;
    let y2 = (ymax * height as f32) as i64;
    let x2 = (xmax * width as f32) as i64;

    let box_h = (y2 - y1).max(1) as usize;
    let box_w = (x2 - x1).max(1) as usize;
    let resized = resize_bilinear(mask, box_h, box_w);

    let mut canvas = Array2::<f32>::zeros((height as usize, width as usize));

    let y1 = y1.clamp(0, h);
    let x1 = x1.clamp(0, w);
    let y2 = y2.clamp(0, h);
    let x2 = x2.clamp(0, w);

    let paste_h = ((y2 - y1).max(0) as usize).min(box_h);
    let paste_w = ((x2 - x1).max(0) as usize).min(box_w);
    if paste_h > 0 && paste_w > 0 {
        let (y1, x1) = (y1 as usize, x1 as usize);
        canvas
            .slice_mut(s![y1..y1 + paste_h, x1..x1 + paste_w])
            .assign(&resized.slice(s![..paste_h, ..paste_w]));
    }
    canvas
}

/// 在框内生成实心椭圆掩码
///
/// 椭圆的外接矩形是把框四边各向内缩进边长的5%（截断取整）后的像素范围，
/// 因此不会触到框的边界。椭圆内为1.0，其余为0.0。
pub fn ellipse_mask(bbox: &PixelBox, height: u32, width: u32) -> Array2<f32> {
    let mut canvas = Array2::<f32>::zeros((height as usize, width as usize));

    let pad_x = (bbox.width() as f32 * ELLIPSE_PADDING_RATIO) as i64;
    let pad_y = (bbox.height() as f32 * ELLIPSE_PADDING_RATIO) as i64;
    let x0 = bbox.left as i64 + pad_x;
    let y0 = bbox.top as i64 + pad_y;
    let x1 = bbox.right as i64 - pad_x;
    let y1 = bbox.bottom as i64 - pad_y;
    if x1 < x0 || y1 < y0 {
        return canvas;
    }

    // 像素中心坐标下的圆心和半轴，半轴至少为半个像素
    let cx = (x0 + x1 + 1) as f32 / 2.0;
    let cy = (y0 + y1 + 1) as f32 / 2.0;
    let rx = (x1 - x0 + 1) as f32 / 2.0;
    let ry = (y1 - y0 + 1) as f32 / 2.0;

    let row_end = y1.min(height as i64 - 1);
    let col_end = x1.min(width as i64 - 1);
    for y in y0.max(0)..=row_end {
        let dy = (y as f32 + 0.5 - cy) / ry;
        for x in x0.max(0)..=col_end {
            let dx = (x as f32 + 0.5 - cx) / rx;
            if dx * dx + dy * dy <= 1.0 {
                canvas[[y as usize, x as usize]] = 1.0;
            }
        }
    }
    canvas
}
