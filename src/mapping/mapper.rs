//! Mapper trait and interpolation helpers

/// Trait for scalar mapping functions
pub trait Mapper: Send + Sync {
    /// Get the name of this mapper
    fn name(&self) -> &str;

    /// Map an input value to an output value
    fn map(&self, input: f64) -> f64;
}

/// Linear interpolation between `a` and `b`, `t` clamped to 0..1
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Position of `value` between `a` and `b` as 0..1 (0 when the range is empty)
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    let range = b - a;
    if range.abs() < f64::EPSILON {
        0.0
    } else {
        ((value - a) / range).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(1.0, 0.7, 0.0), 1.0);
        assert_eq!(lerp(0.0, 10.0, 2.0), 10.0);
    }

    #[test]
    fn test_inverse_lerp() {
        assert_eq!(inverse_lerp(-10.0, 10.0, 0.0), 0.5);
        assert_eq!(inverse_lerp(-10.0, 10.0, 20.0), 1.0);
        assert_eq!(inverse_lerp(3.0, 3.0, 3.0), 0.0);
    }
}
