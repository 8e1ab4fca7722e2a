//! 类别标签表
//!
//! 整数类别ID到显示名称的只读映射。查询是全函数：任何ID（包括0和负数）
//! 都有结果，找不到时返回 [`UNKNOWN_LABEL`]。

use std::collections::HashMap;

use crate::config::UNKNOWN_LABEL;

/// COCO 数据集的80个类别（ID范围1-90，有空缺）
pub const COCO_LABELS: &[(i64, &str)] = &[
    (1, "person"), (2, "bicycle"), (3, "car"), (4, "motorcycle"), (5, "airplane"),
    (6, "bus"), (7, "train"), (8, "truck"), (9, "boat"), (10, "traffic light"),
    (11, "fire hydrant"), (13, "stop sign"), (14, "parking meter"), (15, "bench"),
    (16, "bird"), (17, "cat"), (18, "dog"), (19, "horse"), (20, "sheep"),
    (21, "cow"), (22, "elephant"), (23, "bear"), (24, "zebra"), (25, "giraffe"),
    (27, "backpack"), (28, "umbrella"), (31, "handbag"), (32, "tie"), (33, "suitcase"),
    (34, "frisbee"), (35, "skis"), (36, "snowboard"), (37, "sports ball"), (38, "kite"),
    (39, "baseball bat"), (40, "baseball glove"), (41, "skateboard"), (42, "surfboard"),
    (43, "tennis racket"), (44, "bottle"), (46, "wine glass"), (47, "cup"),
    (48, "fork"), (49, "knife"), (50, "spoon"), (51, "bowl"), (52, "banana"),
    (53, "apple"), (54, "sandwich"), (55, "orange"), (56, "broccoli"), (57, "carrot"),
    (58, "hot dog"), (59, "pizza"), (60, "donut"), (61, "cake"), (62, "chair"),
    (63, "couch"), (64, "potted plant"), (65, "bed"), (67, "dining table"),
    (70, "toilet"), (72, "tv"), (73, "laptop"), (74, "mouse"), (75, "remote"),
    (76, "keyboard"), (77, "cell phone"), (78, "microwave"), (79, "oven"),
    (80, "toaster"), (81, "sink"), (82, "refrigerator"), (84, "book"), (85, "clock"),
    (86, "vase"), (87, "scissors"), (88, "teddy bear"), (89, "hair drier"), (90, "toothbrush"),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    names: HashMap<i64, String>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// COCO 标签表
    pub fn coco() -> Self {
        COCO_LABELS.iter().map(|&(id, name)| (id, name)).collect()
    }

    /// 查询类别名称，未知ID返回 `"unknown"`
    pub fn label_for(&self, class_id: i64) -> &str {
        self.names
            .get(&class_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn contains(&self, class_id: i64) -> bool {
        self.names.contains_key(&class_id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 按ID升序遍历
    pub fn entries(&self) -> Vec<(i64, &str)> {
        let mut entries: Vec<_> =
            self.names.iter().map(|(&id, name)| (id, name.as_str())).collect();
        entries.sort_unstable_by_key(|&(id, _)| id);
        entries
    }
}

impl<S: Into<String>> FromIterator<(i64, S)> for LabelTable {
    fn from_iter<I: IntoIterator<Item = (i64, S)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(|(id, name)| (id, name.into())).collect(),
        }
    }
}

/// 在给定标签表中查询类别名称
pub fn label_for(class_id: i64, table: &LabelTable) -> &str {
    table.label_for(class_id)
}
