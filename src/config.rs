use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PALETTE_SIZE: usize = 100;
pub const UNKNOWN_LABEL: &str = "unknown";

// 检测超参数配置
pub const DEFAULT_THRESHOLD: f32 = 0.5;
pub const DEFAULT_MAX_DETECTIONS: usize = 100;

// 绘制参数配置
pub const DEFAULT_MASK_ALPHA: u8 = 100;
pub const MASKS_ONLY_ALPHA: u8 = 150;
pub const OVERLAY_ALPHA: u8 = 128;
pub const DEFAULT_BOX_THICKNESS: u32 = 3;
pub const DEFAULT_FONT_SIZE: u32 = 16;
pub const MIN_FONT_SIZE: u32 = 12;
pub const MAX_FONT_SIZE: u32 = 24;
pub const MASK_BINARY_THRESHOLD: f32 = 0.5;

// 标签位置：默认在框上方，越过图像顶部时翻转到框下方
pub const LABEL_RISE: i32 = 25;
pub const LABEL_DROP: i32 = 5;
pub const LABEL_PADDING: i32 = 2;

// 椭圆掩码相对框边长的内缩比例
pub const ELLIPSE_PADDING_RATIO: f32 = 0.05;

pub const SUPPORTED_IMAGE_FORMATS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// 标签字体的候选路径，按顺序尝试
pub const FONT_SEARCH_PATHS: &[&str] = &[
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/SFNSText.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

/// 一次交互的全部运行参数
///
/// 由前端收集，原样传给后处理流水线和渲染器，构造后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 置信度阈值，`score >= threshold` 的行才会保留
    pub threshold: f32,
    /// 扫描的最大行数（包括未通过阈值的行）
    pub max_detections: usize,
    /// 模型没有原生掩码时是否生成椭圆近似掩码
    pub generate_approx_masks: bool,
    pub show_boxes: bool,
    pub show_labels: bool,
    pub show_masks: bool,
    pub mask_alpha: u8,
    pub box_thickness: u32,
    pub font_size: u32,
    /// 只显示这些类别，`None` 表示全部
    pub selected_class_ids: Option<BTreeSet<i64>>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
            generate_approx_masks: true,
            show_boxes: true,
            show_labels: true,
            show_masks: true,
            mask_alpha: DEFAULT_MASK_ALPHA,
            box_thickness: DEFAULT_BOX_THICKNESS,
            font_size: DEFAULT_FONT_SIZE,
            selected_class_ids: None,
        }
    }
}

impl SessionConfig {
    /// 从TOML文本解析配置，缺省字段取默认值
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SessionConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// 检查参数范围
    ///
    /// # 错误处理
    /// 任一参数越界时返回 [`Error::InvalidConfig`]
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::InvalidConfig(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.max_detections == 0 {
            return Err(Error::InvalidConfig("max_detections must be positive".into()));
        }
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(Error::InvalidConfig(format!(
                "font_size must be within [{}, {}], got {}",
                MIN_FONT_SIZE, MAX_FONT_SIZE, self.font_size
            )));
        }
        if self.show_boxes && self.box_thickness == 0 {
            return Err(Error::InvalidConfig("box_thickness must be at least 1".into()));
        }
        Ok(())
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_detections(mut self, max_detections: usize) -> Self {
        self.max_detections = max_detections;
        self
    }

    pub fn with_selected_classes<I: IntoIterator<Item = i64>>(mut self, ids: I) -> Self {
        self.selected_class_ids = Some(ids.into_iter().collect());
        self
    }
}

/// 从文件加载配置
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SessionConfig> {
    let text = std::fs::read_to_string(path)?;
    SessionConfig::from_toml_str(&text)
}
