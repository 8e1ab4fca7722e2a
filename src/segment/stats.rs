//! 检测统计与类别过滤

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::segment::bounds::Detection;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionStats {
    pub total: usize,
    pub unique_classes: usize,
    /// 没有检测时为0
    pub mean_confidence: f32,
    pub masks: usize,
    /// 类别名称 -> 数量
    pub per_class: BTreeMap<String, usize>,
}

impl DetectionStats {
    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut per_class = BTreeMap::new();
        for det in detections {
            *per_class.entry(det.class_name.clone()).or_insert(0) += 1;
        }
        let mean_confidence = if detections.is_empty() {
            0.0
        } else {
            detections.iter().map(|d| d.confidence).sum::<f32>() / detections.len() as f32
        };
        Self {
            total: detections.len(),
            unique_classes: per_class.len(),
            mean_confidence,
            masks: detections.iter().filter(|d| d.has_mask()).count(),
            per_class,
        }
    }
}

/// 只保留选中类别的检测，`selected` 为 `None` 时原样返回
pub fn filter_by_classes(
    detections: Vec<Detection>,
    selected: Option<&BTreeSet<i64>>,
) -> Vec<Detection> {
    match selected {
        Some(ids) => detections.into_iter().filter(|d| ids.contains(&d.class_id)).collect(),
        None => detections,
    }
}
