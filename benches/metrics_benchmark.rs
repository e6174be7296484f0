use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use detbox::codec::{decode, encode, TargetEncoder, Variances};
use detbox::config::{ApMethod, EvaluationConfig};
use detbox::evaluator::{evaluate_map, evaluate_map_parallel, ClassMap};
use detbox::geometry::{compute_ious, iou};
use detbox::loader::RecordedDetector;
use detbox::matcher::match_priors;
use detbox::metrics::{calculate_relevance_metrics, every_point_average_precision, eleven_point_average_precision};
use detbox::priors::PriorBoxes;
use detbox::types::{CenterBox, Detection, LabeledBox, PointBox, Sample};

/// Square priors tiled over the unit square, `grid * grid` of them.
fn grid_priors(grid: usize) -> PriorBoxes {
    let step = 1.0 / grid as f64;
    let priors = (0..grid * grid)
        .map(|i| {
            let (row, col) = (i / grid, i % grid);
            CenterBox::new((col as f64 + 0.5) * step, (row as f64 + 0.5) * step, step * 1.5, step * 1.5)
        })
        .collect();
    PriorBoxes::new(priors).unwrap()
}

fn ground_truth(count: usize) -> Vec<LabeledBox> {
    (0..count)
        .map(|i| {
            let offset = (i as f64 * 0.13) % 0.7;
            LabeledBox::new(PointBox::new(offset, offset * 0.5, offset + 0.2, offset * 0.5 + 0.3), i % 20 + 1)
        })
        .collect()
}

fn bench_iou_calculation(c: &mut Criterion) {
    let box_a = PointBox::new(10.0, 10.0, 60.0, 60.0);
    let box_b = PointBox::new(30.0, 30.0, 80.0, 80.0);

    c.bench_function("iou_single", |b| {
        b.iter(|| iou(black_box(&box_a), black_box(&box_b)));
    });
}

fn bench_iou_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("iou_matrix");

    for size in [10, 50, 100, 500].iter() {
        let boxes: Vec<PointBox> = (0..*size)
            .map(|i| {
                let offset = (i as f64) * 2.0;
                PointBox::new(offset, offset, offset + 50.0, offset + 50.0)
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| compute_ious(black_box(&boxes[..]), black_box(&boxes[..])));
        });
    }
    group.finish();
}

fn bench_match_priors(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_priors");
    let boxes = ground_truth(10);

    for grid in [10, 19, 38].iter() {
        let priors = grid_priors(*grid);
        group.bench_with_input(BenchmarkId::from_parameter(grid * grid), grid, |b, _| {
            b.iter(|| match_priors(black_box(&boxes[..]), black_box(&priors), 0.5));
        });
    }
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let priors = grid_priors(38);
    let variances = Variances::default();
    let matched = match_priors(&ground_truth(10), &priors, 0.5);
    let encoded = encode(&matched, &priors, &variances).unwrap();

    c.bench_function("encode_1444", |b| {
        b.iter(|| encode(black_box(&matched[..]), black_box(&priors), &variances));
    });
    c.bench_function("decode_1444", |b| {
        b.iter(|| decode(black_box(&encoded[..]), black_box(&priors), &variances));
    });

    let encoder = TargetEncoder::new(priors, variances, 0.5).unwrap();
    let boxes = ground_truth(10);
    c.bench_function("encode_targets_1444", |b| {
        b.iter(|| encoder.encode_targets(black_box(&boxes[..])));
    });
}

fn bench_ap_calculation(c: &mut Criterion) {
    let mut group = c.benchmark_group("average_precision");

    for num_points in [10, 100, 1000].iter() {
        let precision: Vec<f64> = (0..*num_points)
            .map(|i| 1.0 - (i as f64) / (*num_points as f64) * 0.5)
            .collect();
        let recall: Vec<f64> = (0..*num_points)
            .map(|i| (i + 1) as f64 / *num_points as f64)
            .collect();

        group.bench_with_input(BenchmarkId::new("eleven_point", num_points), num_points, |b, _| {
            b.iter(|| eleven_point_average_precision(black_box(&precision[..]), black_box(&recall[..])));
        });
        group.bench_with_input(BenchmarkId::new("every_point", num_points), num_points, |b, _| {
            b.iter(|| every_point_average_precision(black_box(&precision[..]), black_box(&recall[..])));
        });
    }
    group.finish();
}

fn bench_relevance_metrics(c: &mut Criterion) {
    use detbox::accumulator::MatchOutcome;

    let scores: Vec<f64> = (0..5000).map(|i| ((i * 7919) % 5000) as f64 / 5000.0).collect();
    let matches: Vec<MatchOutcome> = (0..5000)
        .map(|i| if i % 3 == 0 { MatchOutcome::FalsePositive } else { MatchOutcome::TruePositive })
        .collect();
    let positives: [usize; 2] = [0, 4000];
    let scores = [vec![], scores];
    let matches = [vec![], matches];

    c.bench_function("relevance_metrics_5000", |b| {
        b.iter(|| calculate_relevance_metrics(black_box(&positives[..]), black_box(&scores[..]), black_box(&matches[..])));
    });
}

fn bench_evaluate_map(c: &mut Criterion) {
    let names: Vec<String> = (1..=20).map(|i| format!("class_{i}")).collect();
    let class_map = ClassMap::new(names.clone()).unwrap();
    let dataset: Vec<Sample<Vec<Detection>>> = (0..500)
        .map(|i| {
            let boxes: Vec<LabeledBox> = (0..5)
                .map(|j| {
                    let offset = (j * 60) as f64;
                    LabeledBox::new(PointBox::new(offset, offset, offset + 50.0, offset + 50.0), (i + j) % 20 + 1)
                })
                .collect();
            let detections: Vec<Detection> = boxes
                .iter()
                .enumerate()
                .map(|(j, labeled)| {
                    let shift = (j as f64) * 3.0;
                    let PointBox { x_min, y_min, x_max, y_max } = labeled.coordinates;
                    Detection::new(
                        PointBox::new(x_min + shift, y_min, x_max + shift, y_max),
                        names[labeled.class_id - 1].as_str(),
                        ((i * 31 + j * 17) % 100) as f64 / 100.0,
                    )
                })
                .collect();
            Sample::new(detections, boxes)
        })
        .collect();

    let config = EvaluationConfig {
        iou_threshold: 0.5,
        method: ApMethod::EveryPoint,
    };

    let mut group = c.benchmark_group("evaluate_map_500_images");
    group.bench_function("sequential", |b| {
        b.iter(|| evaluate_map(black_box(&dataset[..]), &RecordedDetector, &class_map, &config));
    });
    group.bench_function("parallel", |b| {
        b.iter(|| evaluate_map_parallel(black_box(&dataset[..]), &RecordedDetector, &class_map, &config));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_iou_calculation,
    bench_iou_matrix,
    bench_match_priors,
    bench_codec,
    bench_ap_calculation,
    bench_relevance_metrics,
    bench_evaluate_map,
);
criterion_main!(benches);
