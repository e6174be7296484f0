//! Building training targets from ground truth and decoding predictions.

use detbox::{
    codec::to_one_hot, geometry::make_box_square, LabeledBox, PointBox, PriorConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Anchor Target Example ===\n");

    // A 3x3 grid of priors over the unit square
    let priors: Vec<[f64; 4]> = (0..9)
        .map(|i| {
            let (row, col) = (i / 3, i % 3);
            let center = |index: usize| (index as f64 + 0.5) / 3.0;
            [center(col), center(row), 0.4, 0.4]
        })
        .collect();
    let config = PriorConfig {
        priors,
        variances: Default::default(),
        iou_threshold: 0.5,
    };
    println!("Prior configuration:\n{}\n", serde_json::to_string(&config)?);
    let encoder = config.build_encoder()?;

    let ground_truth = [
        LabeledBox::new(PointBox::new(0.05, 0.05, 0.30, 0.35), 1),
        LabeledBox::new(PointBox::new(0.40, 0.35, 0.95, 0.95), 2),
    ];

    println!("1. Encoding targets");
    let targets = encoder.encode_targets(&ground_truth);
    for (index, target) in targets.iter().enumerate() {
        println!(
            "   prior {index}: class {} offsets [{:+.3}, {:+.3}, {:+.3}, {:+.3}]",
            target.class_id, target.offsets[0], target.offsets[1], target.offsets[2], target.offsets[3]
        );
    }
    println!();

    println!("2. One-hot classification targets");
    let class_ids: Vec<usize> = targets.iter().map(|target| target.class_id).collect();
    let one_hot = to_one_hot(&class_ids, 3)?;
    println!("{one_hot}");
    println!();

    println!("3. Decoding the targets back");
    let decoded = encoder.decode_predictions(&targets)?;
    for (index, labeled) in decoded.iter().enumerate().filter(|(_, labeled)| !labeled.is_background()) {
        println!("   prior {index}: {:?} class {}", labeled.coordinates.to_array(), labeled.class_id);
    }
    println!();

    println!("4. Squaring a crop around a detection");
    let crop = make_box_square(&PointBox::new(120.0, 80.0, 200.0, 240.0), 0.05);
    println!("   {:?}", crop.to_array());

    println!("\n=== Example Complete ===");
    Ok(())
}
