//! Basic evaluation example demonstrating core functionality.

use detbox::{
    evaluate_map, evaluate_map_parallel, iou, load_from_string, ApMethod, EvaluationConfig,
    PointBox, RecordedDetector,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Detection Evaluation Example ===\n");

    // Example 1: IoU Calculation
    println!("1. IoU Calculation");
    let box_a = PointBox::new(10.0, 10.0, 60.0, 60.0);
    let box_b = PointBox::new(30.0, 30.0, 80.0, 80.0);
    println!("   IoU between overlapping boxes: {:.4}", iou(&box_a, &box_b));
    println!();

    // Example 2: Load a recorded evaluation set
    println!("2. Loading Recorded Detections");
    let recorded_json = r#"{
        "classes": ["person", "car"],
        "samples": [
            {
                "image_id": 1,
                "boxes": [
                    [100.0, 100.0, 300.0, 250.0, 1],
                    [350.0, 200.0, 450.0, 320.0, 2]
                ],
                "detections": [
                    {"coordinates": [105.0, 98.0, 300.0, 253.0], "class_name": "person", "score": 0.95},
                    {"coordinates": [348.0, 198.0, 453.0, 323.0], "class_name": "car", "score": 0.87},
                    {"coordinates": [500.0, 50.0, 560.0, 120.0], "class_name": "person", "score": 0.40}
                ]
            },
            {
                "image_id": 2,
                "boxes": [
                    [20.0, 40.0, 80.0, 200.0, 1],
                    [120.0, 40.0, 180.0, 200.0, 1]
                ],
                "difficulties": [false, true],
                "detections": [
                    {"coordinates": [22.0, 38.0, 82.0, 205.0], "class_name": "person", "score": 0.91},
                    {"coordinates": [118.0, 42.0, 178.0, 198.0], "class_name": "person", "score": 0.60}
                ]
            }
        ]
    }"#;

    let recorded = load_from_string(recorded_json)?;
    println!("   Loaded {} samples", recorded.samples.len());
    println!("   Classes: {:?}", recorded.classes);
    let (class_map, dataset) = recorded.into_dataset()?;
    println!();

    // Example 3: Evaluate with both AP methods
    println!("3. Evaluating");
    for method in [ApMethod::ElevenPoint, ApMethod::EveryPoint] {
        let config = EvaluationConfig {
            iou_threshold: 0.5,
            method,
        };
        let result = evaluate_map(&dataset, &RecordedDetector, &class_map, &config)?;
        println!("   {:?}: mAP = {:.4}", method, result.mean_average_precision);
        for (class_id, ap) in result.ap_per_class() {
            let name = class_map.class_name(class_id).unwrap_or("?");
            println!("     {name:>8}: AP = {ap:.4}");
        }
    }
    println!();

    // Example 4: Parallel evaluation and statistics
    println!("4. Parallel Evaluation");
    let result = evaluate_map_parallel(&dataset, &RecordedDetector, &class_map, &EvaluationConfig::default())?;
    println!("   {}", result.stats.summary_string());
    println!("   Missed ground truth: {}", result.stats.missed());

    println!("\n=== Example Complete ===");
    Ok(())
}
