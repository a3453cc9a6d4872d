// src/utils/fixed_point.rs
use crate::{NODATA_VALUE_FLOAT, NODATA_VALUE_INT};

/// Encode a [-1, 1] index into int16 with the given scale factor.
///
/// Nodata pixels keep the int16 nodata sentinel. Values are clamped just
/// inside the unit interval so the scaled result never overflows.
pub fn to_fixed_point(data: &[f32], scale_factor: i32) -> Vec<i16> {
    data.iter()
        .map(|&value| {
            if value == NODATA_VALUE_FLOAT {
                NODATA_VALUE_INT
            } else {
                let clamped = value.max(-0.9999).min(0.9999);
                (clamped * scale_factor as f32).round() as i16
            }
        })
        .collect()
}
