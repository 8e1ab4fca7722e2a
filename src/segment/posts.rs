//! 检测结果后处理模块
//!
//! 负责把模型输出的原始张量转换为 [`Detection`] 列表：阈值过滤、坐标换算、
//! 原生掩码缩放或椭圆掩码合成、类别名称解析。
//!
//! 模型输出约定（带长度为1的批次维度）：
//! - `detection_boxes`：`[1, N, 4]`，归一化 `(ymin, xmin, ymax, xmax)`
//! - `detection_classes`：`[1, N]`，类别ID（浮点存储）
//! - `detection_scores`：`[1, N]`，按置信度降序排列
//! - `detection_masks`（可选）：`[1, N, h, w]`，每个实例的低分辨率掩码

use std::collections::HashMap;
use std::sync::Arc;

use ndarray::{ArrayD, ArrayView1, ArrayView2, ArrayView3, ArrayViewD, Axis, Dimension};
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::segment::bounds::{Detection, InstanceMask, PixelBox};
use crate::segment::labels::LabelTable;
use crate::segment::masks::{ellipse_mask, paste_native_mask};

pub const BOXES_KEY: &str = "detection_boxes";
pub const CLASSES_KEY: &str = "detection_classes";
pub const SCORES_KEY: &str = "detection_scores";
pub const MASKS_KEY: &str = "detection_masks";

/// 模型一次推理的全部命名输出
pub type RawOutputs = HashMap<String, ArrayD<f32>>;

/// 去掉批次维度后的推理结果视图
#[derive(Debug, Clone)]
pub struct RawDetections<'a> {
    /// `[N, 4]`
    pub boxes: ArrayView2<'a, f32>,
    /// `[N]`
    pub classes: ArrayView1<'a, f32>,
    /// `[N]`
    pub scores: ArrayView1<'a, f32>,
    /// `[N, h, w]`
    pub masks: Option<ArrayView3<'a, f32>>,
}

impl<'a> RawDetections<'a> {
    /// 从命名输出中取出检测张量
    ///
    /// # 错误处理
    /// 缺少 `detection_boxes` / `detection_classes` / `detection_scores`，
    /// 或任一张量维度不符时返回 [`Error::Format`]。张量为空（N=0）是合法的。
    pub fn from_outputs(outputs: &'a RawOutputs) -> Result<Self> {
        let boxes = first_batch(outputs, BOXES_KEY)?;
        let classes = first_batch(outputs, CLASSES_KEY)?;
        let scores = first_batch(outputs, SCORES_KEY)?;

        let boxes = into_dim::<ndarray::Ix2>(boxes, BOXES_KEY)?;
        if boxes.ncols() != 4 {
            return Err(Error::Format(format!(
                "{} must have 4 coordinates per row, got {}",
                BOXES_KEY,
                boxes.ncols()
            )));
        }
        let classes = into_dim::<ndarray::Ix1>(classes, CLASSES_KEY)?;
        let scores = into_dim::<ndarray::Ix1>(scores, SCORES_KEY)?;

        let masks = if outputs.contains_key(MASKS_KEY) {
            Some(into_dim::<ndarray::Ix3>(first_batch(outputs, MASKS_KEY)?, MASKS_KEY)?)
        } else {
            None
        };

        Ok(Self { boxes, classes, scores, masks })
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn norm_box(&self, row: usize) -> [f32; 4] {
        let b = self.boxes.row(row);
        [b[0], b[1], b[2], b[3]]
    }
}

fn first_batch<'a>(outputs: &'a RawOutputs, key: &str) -> Result<ArrayViewD<'a, f32>> {
    let tensor = outputs
        .get(key)
        .ok_or_else(|| Error::Format(format!("missing output `{}`", key)))?;
    if tensor.ndim() == 0 || tensor.shape()[0] == 0 {
        return Err(Error::Format(format!(
            "output `{}` has no batch dimension (shape {:?})",
            key,
            tensor.shape()
        )));
    }
    Ok(tensor.index_axis(Axis(0), 0))
}

fn into_dim<'a, D: Dimension>(
    view: ArrayViewD<'a, f32>,
    key: &str,
) -> Result<ndarray::ArrayView<'a, f32, D>> {
    let shape = view.shape().to_vec();
    view.into_dimensionality::<D>()
        .map_err(|_| Error::Format(format!("output `{}` has unexpected shape {:?}", key, shape)))
}

/// 后处理流水线
///
/// 标签表通过构造注入，可在多次调用之间共享。
///
/// # 示例
///
/// ```
/// use std::sync::Arc;
/// use ndarray::{arr2, arr3, ArrayD};
/// use segview::{LabelTable, PostProcessor, RawOutputs, SessionConfig};
///
/// let mut outputs = RawOutputs::new();
/// outputs.insert("detection_boxes".into(), arr3(&[[[0.1f32, 0.1, 0.5, 0.5]]]).into_dyn());
/// outputs.insert("detection_classes".into(), arr2(&[[1.0f32]]).into_dyn());
/// outputs.insert("detection_scores".into(), arr2(&[[0.9f32]]).into_dyn());
///
/// let post = PostProcessor::new(Arc::new(LabelTable::coco()));
/// let detections = post.process(&outputs, 100, 100, &SessionConfig::default()).unwrap();
/// assert_eq!(detections.len(), 1);
/// assert_eq!(detections[0].class_name, "person");
/// ```
#[derive(Debug, Clone)]
pub struct PostProcessor {
    labels: Arc<LabelTable>,
}

impl PostProcessor {
    pub fn new(labels: Arc<LabelTable>) -> Self {
        Self { labels }
    }

    /// 处理一次推理的命名输出
    ///
    /// # 参数
    /// * `outputs` - 模型输出
    /// * `width` / `height` - 原图尺寸
    /// * `config` - 使用其中的 `threshold`、`max_detections`、`generate_approx_masks`
    ///
    /// # 返回值
    /// 按输入顺序排列的检测结果
    pub fn process(
        &self,
        outputs: &RawOutputs,
        width: u32,
        height: u32,
        config: &SessionConfig,
    ) -> Result<Vec<Detection>> {
        let raw = RawDetections::from_outputs(outputs)?;
        self.process_raw(&raw, width, height, config)
    }

    /// 处理已经去掉批次维度的推理结果
    ///
    /// 只扫描前 `min(N, max_detections)` 行，未通过阈值的行也占用名额。
    /// 上游已按置信度降序排列，这里不重新排序。
    pub fn process_raw(
        &self,
        raw: &RawDetections<'_>,
        width: u32,
        height: u32,
        config: &SessionConfig,
    ) -> Result<Vec<Detection>> {
        let scan = raw.len().min(config.max_detections);
        check_rows(BOXES_KEY, raw.boxes.nrows(), scan)?;
        check_rows(CLASSES_KEY, raw.classes.len(), scan)?;
        if let Some(masks) = &raw.masks {
            check_rows(MASKS_KEY, masks.len_of(Axis(0)), scan)?;
        }

        let mut detections = Vec::new();
        for i in 0..scan {
            let score = raw.scores[i];
            if !(score >= config.threshold) {
                continue;
            }

            let norm_box = raw.norm_box(i);
            let bbox = PixelBox::from_normalized(norm_box, width, height);

            let mask = match &raw.masks {
                Some(masks) => InstanceMask::Native(paste_native_mask(
                    &masks.index_axis(Axis(0), i),
                    norm_box,
                    height,
                    width,
                )),
                None if config.generate_approx_masks => {
                    InstanceMask::Synthesized(ellipse_mask(&bbox, height, width))
                }
                None => InstanceMask::None,
            };

            let class_id = raw.classes[i] as i64;
            let class_name = self.labels.label_for(class_id);
            debug!(row = i, class_id, class_name, score, ?bbox, "detection kept");

            detections.push(Detection {
                class_id,
                class_name: class_name.to_string(),
                confidence: score.clamp(0.0, 1.0),
                bbox,
                mask,
            });
        }

        debug!(scanned = scan, kept = detections.len(), "post-processing done");
        Ok(detections)
    }
}

fn check_rows(key: &str, rows: usize, needed: usize) -> Result<()> {
    if rows < needed {
        return Err(Error::Format(format!(
            "output `{}` has {} rows, expected at least {}",
            key, rows, needed
        )));
    }
    Ok(())
}
