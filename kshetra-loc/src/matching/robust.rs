//! Robust kernels (M-estimators) for iteratively reweighted least squares.

use serde::{Deserialize, Serialize};

/// Down-weights large residuals on top of the hard outlier threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "scale", rename_all = "snake_case")]
pub enum RobustKernel {
    /// Plain least squares.
    #[default]
    None,
    /// Quadratic below the scale, linear above. Weight: `min(1, δ/|r|)`.
    Huber(f32),
    /// Heavy-tailed. Weight: `1 / (1 + (r/c)²)`.
    Cauchy(f32),
}

impl RobustKernel {
    /// IRLS weight for `residual`.
    #[inline]
    pub fn weight(self, residual: f32) -> f32 {
        let r = residual.abs();
        match self {
            RobustKernel::None => 1.0,
            RobustKernel::Huber(delta) => {
                if r <= delta {
                    1.0
                } else {
                    delta / r
                }
            }
            RobustKernel::Cauchy(c) => {
                let x = r / c;
                1.0 / (1.0 + x * x)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_huber() {
        let k = RobustKernel::Huber(0.1);
        assert_eq!(k.weight(0.05), 1.0);
        assert_relative_eq!(k.weight(-0.2), 0.5);
    }

    #[test]
    fn test_cauchy() {
        let k = RobustKernel::Cauchy(0.1);
        assert_relative_eq!(k.weight(0.1), 0.5);
        assert!(k.weight(1.0) < 0.01);
    }

    #[test]
    fn test_yaml_form() {
        let k: RobustKernel = serde_yaml::from_str("{ type: huber, scale: 0.05 }").unwrap();
        assert_eq!(k, RobustKernel::Huber(0.05));
        let k: RobustKernel = serde_yaml::from_str("{ type: none }").unwrap();
        assert_eq!(k, RobustKernel::None);
    }
}
