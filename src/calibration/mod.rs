pub mod equations;
pub mod solver;

pub use equations::{CalibrationSystem, CalibrationVariant};
pub use solver::{NewtonSolver, NonlinearSystem, Solution};

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use crate::config::CalibrationConfig;
use crate::error::{AnalysisError, Result};
use crate::types::Measurement;

/// 加速度计校准结果
#[derive(Debug, Clone)]
pub struct CalibrationResult {
    pub variant: CalibrationVariant,
    /// 与 `variant.unknown_names()` 顺序一致
    pub solution: Vec<f64>,
    pub iterations: usize,
    pub max_residual: f64,
}

impl CalibrationResult {
    /// 未知量名称到数值的映射
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        self.variant
            .unknown_names()
            .iter()
            .copied()
            .zip(self.solution.iter().copied())
            .collect()
    }

    pub fn bias(&self) -> [f64; 3] {
        [self.solution[0], self.solution[1], self.solution[2]]
    }

    pub fn scale(&self) -> [f64; 3] {
        match self.variant {
            CalibrationVariant::Full => [self.solution[3], self.solution[4], self.solution[5]],
            CalibrationVariant::BiasOnly => [1.0; 3],
        }
    }

    /// 对原始读数应用校准 s·m + b
    pub fn apply(&self, m: &Measurement) -> Measurement {
        let (b, s) = (self.bias(), self.scale());
        Measurement::new(s[0] * m.x + b[0], s[1] * m.y + b[1], s[2] * m.z + b[2])
    }

    /// 以 4 空格缩进的 JSON 写入文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
        self.to_map().serialize(&mut ser)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// 求解校准方程组
///
/// 测量值个数必须等于未知量个数 (6 或 3)。
pub fn calibrate(
    variant: CalibrationVariant,
    measurements: &[Measurement],
    gravity: f64,
    initial_guess: &[f64],
    solver: &NewtonSolver,
) -> Result<CalibrationResult> {
    if measurements.len() != variant.unknown_count() {
        return Err(AnalysisError::InvalidInput(format!(
            "{} calibration needs exactly {} measurements, got {}",
            variant,
            variant.unknown_count(),
            measurements.len()
        )));
    }

    let system = CalibrationSystem::new(variant, measurements.to_vec(), gravity);
    let solution = solver.solve(&system, initial_guess)?;

    Ok(CalibrationResult {
        variant,
        solution: solution.values.iter().copied().collect(),
        iterations: solution.iterations,
        max_residual: solution.max_residual,
    })
}

/// 按配置求解
///
/// 配置中的测量值多于未知量时只使用前 N 个。
pub fn calibrate_from_config(config: &CalibrationConfig) -> Result<CalibrationResult> {
    let variant = config.variant()?;
    let needed = variant.unknown_count();

    if config.measurements.len() < needed {
        return Err(AnalysisError::InvalidInput(format!(
            "{} calibration needs {} measurements, only {} configured",
            variant,
            needed,
            config.measurements.len()
        )));
    }
    if config.measurements.len() > needed {
        warn!(
            "Using the first {} of {} configured measurements for {} calibration",
            needed,
            config.measurements.len(),
            variant
        );
    }

    let guess = config
        .initial_guess
        .clone()
        .unwrap_or_else(|| variant.default_guess());
    let solver = NewtonSolver::new(config.max_iterations, config.tolerance);

    info!(
        "Solving {} calibration: g = {}, seed = {:?}",
        variant, config.gravity, guess
    );

    let result = calibrate(
        variant,
        &config.measurements[..needed],
        config.gravity,
        &guess,
        &solver,
    )?;

    info!(
        "Calibration converged in {} iterations, max residual {:e}",
        result.iterations, result.max_residual
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const G: f64 = 9.79281;

    /// 由已知偏置与比例因子按模型生成读数: m = (g·u − b) / s
    fn synthesize(directions: &[[f64; 3]], bias: [f64; 3], scale: [f64; 3]) -> Vec<Measurement> {
        directions
            .iter()
            .map(|d| {
                let n = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
                let mut m = [0.0; 3];
                for axis in 0..3 {
                    m[axis] = (G * d[axis] / n - bias[axis]) / scale[axis];
                }
                Measurement::from(m)
            })
            .collect()
    }

    const AXES: [[f64; 3]; 6] = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < tol, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn recovers_known_bias_from_reference_seed() {
        let measurements = synthesize(&AXES, [1.0, 2.0, 3.0], [1.0, 1.0, 1.0]);
        let result = calibrate(
            CalibrationVariant::Full,
            &measurements,
            G,
            &CalibrationVariant::Full.default_guess(),
            &NewtonSolver::default(),
        )
        .unwrap();

        assert_close(&result.bias(), &[1.0, 2.0, 3.0], 1e-4);
        assert_close(&result.scale(), &[1.0, 1.0, 1.0], 1e-4);
    }

    #[test]
    fn recovers_known_bias_near_truth() {
        let measurements = synthesize(&AXES, [1.0, 2.0, 3.0], [1.0, 1.0, 1.0]);
        let result = calibrate(
            CalibrationVariant::Full,
            &measurements,
            G,
            &[0.8, 2.2, 2.7, 1.1, 0.9, 1.05],
            &NewtonSolver::default(),
        )
        .unwrap();

        assert_close(&result.solution, &[1.0, 2.0, 3.0, 1.0, 1.0, 1.0], 1e-4);
        for m in &measurements {
            assert!((result.apply(m).magnitude() - G).abs() < 1e-6);
        }
    }

    #[test]
    fn recovers_random_truths_seeded_nearby() {
        let mut rng = StdRng::seed_from_u64(7);
        let directions = [
            [1.0, 1.0, 1.0],
            [-1.0, 2.0, 0.5],
            [0.3, -1.0, 2.0],
            [-2.0, -0.5, 1.0],
            [1.0, -1.0, -1.0],
            [0.2, 0.4, -1.0],
        ];

        for _ in 0..20 {
            let bias = [
                rng.random_range(-0.5..0.5),
                rng.random_range(-0.5..0.5),
                rng.random_range(-0.5..0.5),
            ];
            let scale = [
                rng.random_range(0.95..1.05),
                rng.random_range(0.95..1.05),
                rng.random_range(0.95..1.05),
            ];
            let measurements = synthesize(&directions, bias, scale);
            let seed: Vec<f64> = bias
                .iter()
                .chain(scale.iter())
                .map(|v| v + rng.random_range(-0.01..0.01))
                .collect();

            let result = calibrate(
                CalibrationVariant::Full,
                &measurements,
                G,
                &seed,
                &NewtonSolver::default(),
            )
            .unwrap();

            assert_close(&result.bias(), &bias, 1e-6);
            assert_close(&result.scale(), &scale, 1e-6);
        }
    }

    #[test]
    fn solving_is_deterministic() {
        let config = CalibrationConfig::default();
        let first = calibrate_from_config(&config).unwrap();
        let second = calibrate_from_config(&config).unwrap();
        assert_eq!(first.solution, second.solution);
        assert_eq!(first.iterations, second.iterations);
    }

    #[test]
    fn solves_recorded_measurements() {
        let result = calibrate_from_config(&CalibrationConfig::default()).unwrap();
        assert_close(
            &result.solution,
            &[-0.0265612, 0.1397603, -0.0078489, 0.9982865, 0.9987406, 0.9809321],
            1e-5,
        );
        assert!(result.max_residual <= 1e-9 * G * G);
    }

    #[test]
    fn bias_only_variant_uses_three_measurements() {
        let mut config = CalibrationConfig::default();
        config.variant = "bias-only".to_string();
        let result = calibrate_from_config(&config).unwrap();

        assert_eq!(result.solution.len(), 3);
        assert_eq!(result.scale(), [1.0; 3]);
        assert_close(&result.bias(), &[0.0474367, -0.1648995, -0.1957989], 1e-5);
        assert_eq!(result.to_map().keys().copied().collect::<Vec<_>>(), vec!["b_x", "b_y", "b_z"]);
    }

    #[test]
    fn bias_only_recovers_synthetic_bias() {
        let directions = [AXES[2], AXES[4], AXES[0]];
        let measurements = synthesize(&directions, [0.1, -0.2, 0.3], [1.0; 3]);
        let result = calibrate(
            CalibrationVariant::BiasOnly,
            &measurements,
            G,
            &[0.0; 3],
            &NewtonSolver::default(),
        )
        .unwrap();
        assert_close(&result.bias(), &[0.1, -0.2, 0.3], 1e-6);
    }

    #[test]
    fn bias_only_without_y_excitation_fails() {
        // 三个读数在 y 轴上都没有分量, b_y 只能线性逼近
        let measurements = synthesize(&AXES[..3], [0.1, -0.2, 0.3], [1.0; 3]);
        let err = calibrate(
            CalibrationVariant::BiasOnly,
            &measurements,
            G,
            &[0.0; 3],
            &NewtonSolver::default(),
        )
        .unwrap_err();
        match err {
            AnalysisError::SolverDidNotConverge { reason, .. } => assert!(reason.contains("singular")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn solution_does_not_depend_on_units() {
        let reference = calibrate_from_config(&CalibrationConfig::default()).unwrap();

        for factor in [100.0, 1000.0 / 9.80665, 1000.0, 10000.0] {
            let mut config = CalibrationConfig::default();
            config.gravity *= factor;
            for m in config.measurements.iter_mut() {
                *m = Measurement::new(m.x * factor, m.y * factor, m.z * factor);
            }

            let result = calibrate_from_config(&config).unwrap();
            let bias: Vec<f64> = result.bias().iter().map(|b| b / factor).collect();
            assert_close(&bias, &reference.bias(), 1e-7);
            assert_close(&result.scale(), &reference.scale(), 1e-7);
        }
    }

    #[test]
    fn collinear_measurements_fail_to_converge() {
        let measurements: Vec<Measurement> = [9.7, 9.8, 9.9, -9.7, -9.8, -9.75]
            .iter()
            .map(|&z| Measurement::new(0.0, 0.0, z))
            .collect();
        let err = calibrate(
            CalibrationVariant::Full,
            &measurements,
            G,
            &CalibrationVariant::Full.default_guess(),
            &NewtonSolver::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::SolverDidNotConverge { .. }), "{:?}", err);
    }

    #[test]
    fn measurement_count_must_match_unknowns() {
        let measurements = synthesize(&AXES[..4], [0.0; 3], [1.0; 3]);
        let err = calibrate(
            CalibrationVariant::Full,
            &measurements,
            G,
            &CalibrationVariant::Full.default_guess(),
            &NewtonSolver::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));

        let mut config = CalibrationConfig::default();
        config.measurements.truncate(5);
        assert!(matches!(
            calibrate_from_config(&config),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn saved_json_uses_four_space_indent() {
        let result = CalibrationResult {
            variant: CalibrationVariant::Full,
            solution: vec![1.0, 2.0, 3.0, 1.0, 1.0, 1.0],
            iterations: 4,
            max_residual: 0.0,
        };
        let file = tempfile::NamedTempFile::new().unwrap();
        result.save_to_file(file.path()).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.starts_with("{\n    \"b_x\": 1.0,"));

        let parsed: BTreeMap<String, f64> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 6);
        assert_eq!(parsed["s_z"], 1.0);
    }
}
