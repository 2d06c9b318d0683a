//! Linear mapper, used for velocity curves

use super::Mapper;

/// Linear interpolation mapper
#[derive(Debug, Clone)]
pub struct LinearMapper {
    name: String,
    in_min: f64,
    in_max: f64,
    out_min: f64,
    out_max: f64,
}

impl LinearMapper {
    /// Create a new linear mapper
    pub fn new(
        name: impl Into<String>,
        in_min: f64,
        in_max: f64,
        out_min: f64,
        out_max: f64,
    ) -> Self {
        Self {
            name: name.into(),
            in_min,
            in_max,
            out_min,
            out_max,
        }
    }

    /// Velocity 0..1 to a gain between a sample's declared min and max velocity
    pub fn velocity_curve(min_velocity: f64, max_velocity: f64) -> Self {
        Self::new("velocity", 0.0, 1.0, min_velocity, max_velocity)
    }
}

impl Mapper for LinearMapper {
    fn name(&self) -> &str {
        &self.name
    }

    fn map(&self, input: f64) -> f64 {
        let in_range = self.in_max - self.in_min;
        let normalized = if in_range.abs() < f64::EPSILON {
            0.5
        } else {
            (input - self.in_min) / in_range
        };

        let output = self.out_min + normalized * (self.out_max - self.out_min);
        output.clamp(self.out_min.min(self.out_max), self.out_min.max(self.out_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_curve() {
        let curve = LinearMapper::velocity_curve(0.2, 1.0);
        assert_eq!(curve.name(), "velocity");
        assert!((curve.map(0.0) - 0.2).abs() < 1e-9);
        assert!((curve.map(0.5) - 0.6).abs() < 1e-9);
        assert!((curve.map(1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_curve_clamps_out_of_range_velocity() {
        let curve = LinearMapper::velocity_curve(0.0, 0.8);
        assert_eq!(curve.map(-1.0), 0.0);
        assert_eq!(curve.map(3.0), 0.8);
    }

    #[test]
    fn test_inverted_range() {
        let mapper = LinearMapper::new("test", 0.0, 100.0, 1.0, 0.0);
        assert_eq!(mapper.map(0.0), 1.0);
        assert_eq!(mapper.map(50.0), 0.5);
        assert_eq!(mapper.map(100.0), 0.0);
    }

    #[test]
    fn test_degenerate_input_range() {
        let mapper = LinearMapper::new("flat", 5.0, 5.0, 0.0, 2.0);
        assert_eq!(mapper.map(123.0), 1.0);
    }
}
