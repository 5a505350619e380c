//! Per-field statistics over buffered feature vectors

use handkey_core::features::{FIELD_COUNT, FeatureVector, ROTATION_FIELD, angle_diff_deg};

/// Mean and population standard deviation of each feature field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub mean: FeatureVector,
    pub std_dev: FeatureVector,
    pub count: usize,
}

/// Summarize samples field by field. The rotation field is averaged on the
/// circle so that 359 and 1 degrees average to 0, not 180.
pub fn summarize(samples: &[FeatureVector]) -> Option<FieldStats> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let arrays: Vec<[f64; FIELD_COUNT]> = samples.iter().map(|s| s.to_array()).collect();

    let mut mean = [0.0; FIELD_COUNT];
    let mut std_dev = [0.0; FIELD_COUNT];

    for field in 0..FIELD_COUNT {
        // identical inputs come back unchanged, not via summation round-off
        let first = arrays[0][field];
        if arrays.iter().all(|a| a[field] == first) {
            mean[field] = first;
            continue;
        }

        if field == ROTATION_FIELD {
            let (m, sd) = circular_mean_std(arrays.iter().map(|a| a[field]));
            mean[field] = m;
            std_dev[field] = sd;
            continue;
        }

        let m = arrays.iter().map(|a| a[field]).sum::<f64>() / n;
        let var = arrays.iter().map(|a| (a[field] - m).powi(2)).sum::<f64>() / n;
        mean[field] = m;
        std_dev[field] = var.sqrt();
    }

    Some(FieldStats {
        mean: FeatureVector::from_array(mean),
        std_dev: FeatureVector::from_array(std_dev),
        count: samples.len(),
    })
}

/// Circular mean in [0, 360) and RMS angular deviation from it, in degrees.
fn circular_mean_std(angles: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = angles.clone().count() as f64;
    let (sin_sum, cos_sum) = angles
        .clone()
        .fold((0.0, 0.0), |(s, c), a| (s + a.to_radians().sin(), c + a.to_radians().cos()));

    let mut mean = sin_sum.atan2(cos_sum).to_degrees().rem_euclid(360.0);
    if mean >= 360.0 {
        mean = 0.0;
    }

    let var = angles.map(|a| angle_diff_deg(a, mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
