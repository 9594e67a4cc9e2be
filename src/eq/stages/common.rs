/// Convert decibels to linear amplitude.
#[inline]
pub fn db_to_lin(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels, floored at `floor_db` for silence.
#[inline]
pub fn lin_to_db(gain: f32, floor_db: f32) -> f32 {
    if gain > 0.0 {
        (20.0 * gain.log10()).max(floor_db)
    } else {
        floor_db
    }
}

/// Flush values too small to matter to zero so recursive state never goes subnormal.
#[inline]
pub fn zap_denormal(x: f32) -> f32 {
    if x.abs() < 1.0e-30 { 0.0 } else { x }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_conversions_agree() {
        assert!((db_to_lin(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_lin(20.0) - 10.0).abs() < 1e-4);
        assert!((db_to_lin(-6.0) - 0.501_187).abs() < 1e-4);
        assert!((lin_to_db(db_to_lin(12.0), -100.0) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn silence_is_floored() {
        assert_eq!(lin_to_db(0.0, -100.0), -100.0);
        assert_eq!(lin_to_db(1e-12, -100.0), -100.0);
    }

    #[test]
    fn tiny_values_are_flushed() {
        assert_eq!(zap_denormal(1e-35), 0.0);
        assert_eq!(zap_denormal(-1e-35), 0.0);
        assert_eq!(zap_denormal(0.25), 0.25);
    }
}
