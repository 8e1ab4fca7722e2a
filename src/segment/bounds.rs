use ndarray::Array2;
use serde::Serialize;

/// 像素坐标系下的边界框
///
/// 满足 `0 <= left <= right <= width` 且 `0 <= top <= bottom <= height`。
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PixelBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelBox {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self { left, top, right, bottom }
    }

    /// 由归一化坐标 `(ymin, xmin, ymax, xmax)` 换算像素坐标
    ///
    /// 乘积按截断取整（不是四舍五入），结果钳制到图像范围内。
    pub fn from_normalized(norm: [f32; 4], width: u32, height: u32) -> Self {
        let [ymin, xmin, ymax, xmax] = norm;
        let left = truncate_scaled(xmin, width);
        let top = truncate_scaled(ymin, height);
        let right = truncate_scaled(xmax, width).max(left);
        let bottom = truncate_scaled(ymax, height).max(top);
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// 宽和高都大于0
    pub fn is_valid(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    pub fn as_array(&self) -> [u32; 4] {
        [self.left, self.top, self.right, self.bottom]
    }
}

fn truncate_scaled(value: f32, extent: u32) -> u32 {
    let scaled = (value * extent as f32) as i64;
    scaled.clamp(0, extent as i64) as u32
}

/// 检测实例的掩码
///
/// 网格与原图同尺寸（行=高，列=宽），值在 `[0, 1]`。每个检测独占自己的掩码。
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InstanceMask {
    #[default]
    None,
    /// 模型直接输出的掩码
    Native(Array2<f32>),
    /// 由边界框内接椭圆合成的近似掩码
    Synthesized(Array2<f32>),
}

impl InstanceMask {
    /// 掩码网格，不区分来源
    pub fn grid(&self) -> Option<&Array2<f32>> {
        match self {
            InstanceMask::None => None,
            InstanceMask::Native(grid) | InstanceMask::Synthesized(grid) => Some(grid),
        }
    }

    pub fn is_some(&self) -> bool {
        !matches!(self, InstanceMask::None)
    }

    pub fn is_native(&self) -> bool {
        matches!(self, InstanceMask::Native(_))
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self, InstanceMask::Synthesized(_))
    }
}

/// 检测结果
///
/// 由后处理流水线构造，之后只读。
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: i64,
    /// 类别名称，标签表中没有时为 `"unknown"`
    pub class_name: String,
    /// 置信度，范围 `[0, 1]`
    pub confidence: f32,
    pub bbox: PixelBox,
    pub mask: InstanceMask,
}

impl Detection {
    pub fn new(
        class_id: i64,
        class_name: impl Into<String>,
        confidence: f32,
        bbox: PixelBox,
    ) -> Self {
        Self {
            class_id,
            class_name: class_name.into(),
            confidence,
            bbox,
            mask: InstanceMask::None,
        }
    }

    pub fn with_mask(mut self, mask: InstanceMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    /// 标签文本，例如 `person: 95%`
    pub fn label_text(&self) -> String {
        format!("{}: {:.0}%", self.class_name, self.confidence * 100.0)
    }

    pub fn summary(&self) -> DetectionSummary {
        DetectionSummary {
            class_id: self.class_id,
            class: self.class_name.clone(),
            confidence: self.confidence,
            bbox: self.bbox.as_array(),
            has_mask: self.has_mask(),
        }
    }
}

/// 可序列化的检测摘要（不含掩码数据）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionSummary {
    pub class_id: i64,
    pub class: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: [u32; 4],
    pub has_mask: bool,
}
