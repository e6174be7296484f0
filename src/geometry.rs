//! Box coordinate conversions and Intersection over Union (IoU).

use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::types::{CenterBox, PointBox};

/// Transform center-form boxes into point-form boxes.
///
/// # Example
///
/// ```
/// use detbox::geometry::to_point_form;
/// use detbox::types::{CenterBox, PointBox};
///
/// let boxes = to_point_form(&[CenterBox::new(5.0, 5.0, 10.0, 4.0)]);
/// assert_eq!(boxes[0], PointBox::new(0.0, 3.0, 10.0, 7.0));
/// ```
pub fn to_point_form(boxes: &[CenterBox]) -> Vec<PointBox> {
    boxes.iter().map(CenterBox::to_point_form).collect()
}

/// Transform point-form boxes into center-form boxes.
pub fn to_center_form(boxes: &[PointBox]) -> Vec<CenterBox> {
    boxes.iter().map(PointBox::to_center_form).collect()
}

/// Calculate the IoU between two point-form boxes.
///
/// Overlap extents are clipped at zero on both axes. When the union area is
/// not positive (for example two coincident zero-area boxes) the IoU is 0.
///
/// # Example
///
/// ```
/// use detbox::geometry::iou;
/// use detbox::types::PointBox;
///
/// let a = PointBox::new(0.0, 0.0, 10.0, 10.0);
/// let b = PointBox::new(5.0, 5.0, 15.0, 15.0);
/// assert!((iou(&a, &b) - 25.0 / 175.0).abs() < 1e-12);
/// ```
pub fn iou(box_a: &PointBox, box_b: &PointBox) -> f64 {
    let inner_x_min = box_a.x_min.max(box_b.x_min);
    let inner_y_min = box_a.y_min.max(box_b.y_min);
    let inner_x_max = box_a.x_max.min(box_b.x_max);
    let inner_y_max = box_a.y_max.min(box_b.y_max);

    let inner_width = (inner_x_max - inner_x_min).max(0.0);
    let inner_height = (inner_y_max - inner_y_min).max(0.0);
    let intersection_area = inner_width * inner_height;

    let union_area = box_a.area() + box_b.area() - intersection_area;
    if union_area <= 0.0 {
        return 0.0;
    }

    intersection_area / union_area
}

/// Calculate the IoU between `reference` and every box in `boxes`.
pub fn compute_iou(reference: &PointBox, boxes: &[PointBox]) -> Vec<f64> {
    boxes.iter().map(|other| iou(reference, other)).collect()
}

/// Dense IoU matrix where `result[[i, j]]` is the IoU of `boxes_a[i]` and `boxes_b[j]`.
///
/// # Example
///
/// ```
/// use detbox::geometry::compute_ious;
/// use detbox::types::PointBox;
///
/// let a = vec![PointBox::new(0.0, 0.0, 10.0, 10.0)];
/// let b = vec![PointBox::new(0.0, 0.0, 10.0, 10.0), PointBox::new(20.0, 20.0, 30.0, 30.0)];
/// let ious = compute_ious(&a, &b);
/// assert_eq!(ious.dim(), (1, 2));
/// assert_eq!(ious[[0, 1]], 0.0);
/// ```
pub fn compute_ious(boxes_a: &[PointBox], boxes_b: &[PointBox]) -> Array2<f64> {
    Array2::from_shape_fn((boxes_a.len(), boxes_b.len()), |(i, j)| {
        iou(&boxes_a[i], &boxes_b[j])
    })
}

/// Argmax along `axis` that resolves ties towards the highest index.
///
/// For a 2D array reduced along `Axis(0)` the result has one entry per column,
/// along `Axis(1)` one entry per row. When several positions hold the maximum,
/// the last one wins; a lane of all-equal values therefore yields its last index.
/// NaN entries never win. An empty lane yields 0.
///
/// # Example
///
/// ```
/// use detbox::geometry::reversed_argmax;
/// use ndarray::{array, Axis};
///
/// let values = array![[0.2, 0.7, 0.7], [0.5, 0.1, 0.7]];
/// assert_eq!(reversed_argmax(values.view(), Axis(1)).to_vec(), vec![2, 2]);
/// assert_eq!(reversed_argmax(values.view(), Axis(0)).to_vec(), vec![1, 0, 1]);
/// ```
pub fn reversed_argmax(array: ArrayView2<'_, f64>, axis: Axis) -> Array1<usize> {
    array
        .lanes(axis)
        .into_iter()
        .map(|lane| last_max_index(lane.iter().copied()))
        .collect()
}

/// Index of the last maximum in `values`.
fn last_max_index(values: impl Iterator<Item = f64>) -> usize {
    let mut best_index = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (index, value) in values.enumerate() {
        if value >= best_value {
            best_value = value;
            best_index = index;
        }
    }
    best_index
}

/// Make a point-form box square around its center, then pad it.
///
/// The shorter side is grown to match the longer one. Every side is then
/// moved outwards by `offset_scale * (x_max + x_min) / 2` and the
/// coordinates are truncated towards zero.
pub fn make_box_square(point_box: &PointBox, offset_scale: f64) -> PointBox {
    let PointBox { mut x_min, mut y_min, mut x_max, mut y_max } = *point_box;
    let center = point_box.to_center_form();

    if center.height >= center.width {
        let half_side = center.height / 2.0;
        x_min = center.center_x - half_side;
        x_max = center.center_x + half_side;
    } else {
        let half_side = center.width / 2.0;
        y_min = center.center_y - half_side;
        y_max = center.center_y + half_side;
    }

    let offset = offset_scale * (x_max + x_min) / 2.0;
    PointBox::new(
        (x_min - offset).trunc(),
        (y_min - offset).trunc(),
        (x_max + offset).trunc(),
        (y_max + offset).trunc(),
    )
}

/// Grow a point-form box by a fraction of its own size.
///
/// `offset_scales` holds the `[x, y]` fractions: the x corners move outwards
/// by `x * width` and the y corners by `y * height`. Coordinates are
/// truncated towards zero. Negative scales shrink the box.
///
/// # Example
///
/// ```
/// use detbox::geometry::apply_offsets;
/// use detbox::types::PointBox;
///
/// let grown = apply_offsets(&PointBox::new(10.0, 20.0, 50.0, 40.0), [0.1, 0.5]);
/// assert_eq!(grown, PointBox::new(6.0, 10.0, 54.0, 50.0));
/// ```
pub fn apply_offsets(point_box: &PointBox, offset_scales: [f64; 2]) -> PointBox {
    let [x_scale, y_scale] = offset_scales;
    let x_offset = point_box.width() * x_scale;
    let y_offset = point_box.height() * y_scale;
    PointBox::new(
        (point_box.x_min - x_offset).trunc(),
        (point_box.y_min - y_offset).trunc(),
        (point_box.x_max + x_offset).trunc(),
        (point_box.y_max + y_offset).trunc(),
    )
}
