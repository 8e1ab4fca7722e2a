use std::sync::Arc;

use image::{DynamicImage, RgbImage};
use ndarray::{Array2, Array3, Array4};
use segview::{Error, LabelTable, ObjectDetector, PixelBox, RawOutputs, SessionConfig};

#[cfg(test)]
mod tests {
    use super::*;

    /// 构造带批次维度的模型输出
    fn outputs(boxes: &[[f32; 4]], classes: &[f32], scores: &[f32]) -> RawOutputs {
        let flat: Vec<f32> = boxes.iter().flatten().copied().collect();
        let mut map = RawOutputs::new();
        map.insert(
            "detection_boxes".into(),
            Array3::from_shape_vec((1, boxes.len(), 4), flat).unwrap().into_dyn(),
        );
        map.insert(
            "detection_classes".into(),
            Array2::from_shape_vec((1, classes.len()), classes.to_vec()).unwrap().into_dyn(),
        );
        map.insert(
            "detection_scores".into(),
            Array2::from_shape_vec((1, scores.len()), scores.to_vec()).unwrap().into_dyn(),
        );
        map
    }

    /// 每次推理都返回同一份输出的检测器
    fn detector(model: &str, canned: RawOutputs) -> ObjectDetector {
        let mut detector = ObjectDetector::new(model, Arc::new(LabelTable::coco())).unwrap();
        detector.load_with(move |_: &RgbImage| -> segview::Result<RawOutputs> {
            Ok(canned.clone())
        });
        detector
    }

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
    }

    #[test]
    fn test_threshold_filters_low_scores() -> Result<(), Box<dyn std::error::Error>> {
        let canned = outputs(
            &[[0.1, 0.1, 0.5, 0.5], [0.2, 0.2, 0.6, 0.6]],
            &[1.0, 3.0],
            &[0.9, 0.4],
        );
        let mut detector = detector("SSD MobileNet V2", canned);

        let config = SessionConfig::default().with_threshold(0.5);
        let detections = detector.detect(&blank(100, 100), &config)?;
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_name, "person");
        assert!((detections[0].confidence - 0.9).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_box_is_denormalized_to_pixels() -> Result<(), Box<dyn std::error::Error>> {
        let canned = outputs(&[[0.1, 0.1, 0.5, 0.5]], &[1.0], &[0.9]);
        let mut detector = detector("SSD MobileNet V2", canned);

        let detections = detector.detect(&blank(100, 100), &SessionConfig::default())?;
        assert_eq!(detections[0].bbox, PixelBox::new(10, 10, 50, 50));
        Ok(())
    }

    #[test]
    fn test_max_detections_keeps_first_rows() -> Result<(), Box<dyn std::error::Error>> {
        let canned = outputs(
            &[[0.0, 0.0, 0.5, 0.5], [0.5, 0.5, 1.0, 1.0]],
            &[1.0, 18.0],
            &[0.9, 0.8],
        );
        let mut detector = detector("SSD MobileNet V2", canned);

        let config = SessionConfig::default().with_max_detections(1);
        let detections = detector.detect(&blank(40, 40), &config)?;
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_name, "person");
        Ok(())
    }

    #[test]
    fn test_rejected_rows_count_toward_max_detections() -> Result<(), Box<dyn std::error::Error>> {
        // 第一行低于阈值，但仍占用唯一的名额
        let canned = outputs(
            &[[0.0, 0.0, 0.5, 0.5], [0.5, 0.5, 1.0, 1.0]],
            &[1.0, 18.0],
            &[0.3, 0.9],
        );
        let mut detector = detector("SSD MobileNet V2", canned);

        let config = SessionConfig::default().with_max_detections(1);
        assert!(detector.detect(&blank(40, 40), &config)?.is_empty());

        let config = SessionConfig::default().with_max_detections(2);
        assert_eq!(detector.detect(&blank(40, 40), &config)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_empty_outputs_yield_no_detections() -> Result<(), Box<dyn std::error::Error>> {
        let mut detector = detector("SSD MobileNet V2", outputs(&[], &[], &[]));
        assert!(detector.detect(&blank(16, 16), &SessionConfig::default())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_boxes_is_format_error() {
        let mut canned = outputs(&[[0.1, 0.1, 0.5, 0.5]], &[1.0], &[0.9]);
        canned.remove("detection_boxes");
        let mut detector = detector("SSD MobileNet V2", canned);

        let err = detector.detect(&blank(16, 16), &SessionConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Format(_)), "unexpected error: {err}");
    }

    #[test]
    fn test_predict_before_load_is_not_ready() {
        let mut detector =
            ObjectDetector::new("EfficientDet D0", Arc::new(LabelTable::coco())).unwrap();
        assert!(!detector.is_loaded());
        let err = detector.detect(&blank(8, 8), &SessionConfig::default()).unwrap_err();
        assert!(matches!(err, Error::NotReady));
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let err = ObjectDetector::new("YOLO v99", Arc::new(LabelTable::coco())).unwrap_err();
        assert!(matches!(err, Error::UnknownModel(name) if name == "YOLO v99"));
    }

    #[test]
    fn test_native_masks_from_segmentation_model() -> Result<(), Box<dyn std::error::Error>> {
        let mut canned = outputs(&[[0.25, 0.25, 0.75, 0.75]], &[18.0], &[0.95]);
        canned.insert("detection_masks".into(), Array4::<f32>::ones((1, 1, 4, 4)).into_dyn());
        let mut detector = detector("Mask R-CNN Inception ResNet V2", canned);
        assert_eq!(detector.model_name(), "Mask R-CNN Inception ResNet V2");
        assert!(detector.info().supports_masks);

        let detections = detector.detect(&blank(20, 20), &SessionConfig::default())?;
        assert_eq!(detections.len(), 1);
        assert!(detections[0].mask.is_native());

        let grid = detections[0].mask.grid().unwrap();
        assert_eq!(grid.dim(), (20, 20));
        assert_eq!(grid[[10, 10]], 1.0);
        assert_eq!(grid[[0, 0]], 0.0);
        assert_eq!(grid[[19, 19]], 0.0);
        Ok(())
    }

    #[test]
    fn test_approximate_masks_follow_the_box() -> Result<(), Box<dyn std::error::Error>> {
        let canned = outputs(&[[0.2, 0.3, 0.8, 0.7]], &[1.0], &[0.9]);
        let mut detector = detector("SSD MobileNet V2", canned);

        let detections = detector.detect(&blank(100, 100), &SessionConfig::default())?;
        let grid = detections[0].mask.grid().unwrap();
        assert!(detections[0].mask.is_synthesized());
        assert_eq!(grid[[50, 50]], 1.0);
        assert_eq!(grid[[20, 30]], 0.0);
        assert_eq!(grid[[80, 70]], 0.0);
        Ok(())
    }

    #[test]
    fn test_summary_serializes_to_json() -> Result<(), Box<dyn std::error::Error>> {
        let canned = outputs(&[[0.1, 0.1, 0.5, 0.5]], &[1.0], &[0.9]);
        let mut detector = detector("SSD MobileNet V2", canned);

        let config = SessionConfig { generate_approx_masks: false, ..SessionConfig::default() };
        let detections = detector.detect(&blank(100, 100), &config)?;
        let json = serde_json::to_value(detections[0].summary())?;
        assert_eq!(json["class"], "person");
        assert_eq!(json["class_id"], 1);
        assert_eq!(json["box"], serde_json::json!([10, 10, 50, 50]));
        assert_eq!(json["has_mask"], false);
        Ok(())
    }
}
