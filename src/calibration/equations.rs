use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};

use super::solver::NonlinearSystem;
use crate::config::ConfigError;
use crate::types::Measurement;

/// 校准模型的未知量组合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationVariant {
    /// 偏置 + 每轴比例因子，6 个未知量
    Full,
    /// 仅偏置，比例因子固定为 1
    BiasOnly,
}

static FULL_UNKNOWNS: [&str; 6] = ["b_x", "b_y", "b_z", "s_x", "s_y", "s_z"];

impl CalibrationVariant {
    /// 未知量名称，顺序与解向量一致
    pub fn unknown_names(&self) -> &'static [&'static str] {
        match self {
            CalibrationVariant::Full => &FULL_UNKNOWNS,
            CalibrationVariant::BiasOnly => &FULL_UNKNOWNS[..3],
        }
    }

    pub fn unknown_count(&self) -> usize {
        self.unknown_names().len()
    }

    /// 参考初值：偏置为 0，比例因子为 1
    pub fn default_guess(&self) -> Vec<f64> {
        match self {
            CalibrationVariant::Full => vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            CalibrationVariant::BiasOnly => vec![0.0, 0.0, 0.0],
        }
    }
}

impl fmt::Display for CalibrationVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationVariant::Full => write!(f, "full"),
            CalibrationVariant::BiasOnly => write!(f, "bias-only"),
        }
    }
}

impl FromStr for CalibrationVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(CalibrationVariant::Full),
            "bias-only" => Ok(CalibrationVariant::BiasOnly),
            other => Err(ConfigError::unsupported("variant", other)),
        }
    }
}

/// 每个测量值对应一个方程:
/// (s_x·m_x + b_x)² + (s_y·m_y + b_y)² + (s_z·m_z + b_z)² − g² = 0
#[derive(Debug, Clone)]
pub struct CalibrationSystem {
    variant: CalibrationVariant,
    measurements: Vec<Measurement>,
    gravity: f64,
}

impl CalibrationSystem {
    pub fn new(variant: CalibrationVariant, measurements: Vec<Measurement>, gravity: f64) -> Self {
        Self {
            variant,
            measurements,
            gravity,
        }
    }

    pub fn variant(&self) -> CalibrationVariant {
        self.variant
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    fn bias_and_scale(&self, p: &DVector<f64>) -> ([f64; 3], [f64; 3]) {
        let bias = [p[0], p[1], p[2]];
        let scale = match self.variant {
            CalibrationVariant::Full => [p[3], p[4], p[5]],
            CalibrationVariant::BiasOnly => [1.0; 3],
        };
        (bias, scale)
    }

    /// 校正后的分量 s·m + b
    fn corrected(&self, m: &Measurement, bias: &[f64; 3], scale: &[f64; 3]) -> [f64; 3] {
        let c = m.components();
        [
            scale[0] * c[0] + bias[0],
            scale[1] * c[1] + bias[1],
            scale[2] * c[2] + bias[2],
        ]
    }
}

impl NonlinearSystem for CalibrationSystem {
    fn dimension(&self) -> usize {
        self.variant.unknown_count()
    }

    fn equation_count(&self) -> usize {
        self.measurements.len()
    }

    fn residual_scale(&self) -> f64 {
        self.gravity * self.gravity
    }

    fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
        let (bias, scale) = self.bias_and_scale(p);
        let g2 = self.gravity * self.gravity;
        DVector::from_iterator(
            self.measurements.len(),
            self.measurements.iter().map(|m| {
                let e = self.corrected(m, &bias, &scale);
                e[0] * e[0] + e[1] * e[1] + e[2] * e[2] - g2
            }),
        )
    }

    fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
        let (bias, scale) = self.bias_and_scale(p);
        let mut j = DMatrix::zeros(self.measurements.len(), self.dimension());
        for (row, m) in self.measurements.iter().enumerate() {
            let e = self.corrected(m, &bias, &scale);
            let c = m.components();
            for axis in 0..3 {
                // ∂r/∂b = 2e, ∂r/∂s = 2e·m
                j[(row, axis)] = 2.0 * e[axis];
                if self.variant == CalibrationVariant::Full {
                    j[(row, axis + 3)] = 2.0 * e[axis] * c[axis];
                }
            }
        }
        j
    }
}
