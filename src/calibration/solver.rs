use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::error::{AnalysisError, Result};

/// 方程组 F(p) = 0，由牛顿法求解
pub trait NonlinearSystem {
    /// 未知量个数
    fn dimension(&self) -> usize;
    fn equation_count(&self) -> usize;
    fn residuals(&self, p: &DVector<f64>) -> DVector<f64>;
    fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64>;

    /// 残差的量级，收敛阈值按它缩放
    fn residual_scale(&self) -> f64 {
        1.0
    }
}

/// 雅可比矩阵最小/最大奇异值之比低于该值视为奇异
const MIN_RECIPROCAL_CONDITION: f64 = 1e-8;

/// 牛顿步长相对 (1 + |p|∞) 的收敛阈值
const STEP_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy)]
pub struct NewtonSolver {
    pub max_iterations: usize,
    /// 残差最大绝对值阈值，相对 `residual_scale()`
    pub tolerance: f64,
}

/// 收敛后的解，附带诊断信息
#[derive(Debug, Clone)]
pub struct Solution {
    pub values: DVector<f64>,
    pub iterations: usize,
    pub max_residual: f64,
}

impl Default for NewtonSolver {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-9,
        }
    }
}

impl NewtonSolver {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }

    /// 多元牛顿迭代
    ///
    /// 残差不超过 `tolerance * residual_scale()` 且牛顿步长足够小时才返回解。
    /// 每一步 (包括最终接受的点) 都检查雅可比矩阵的条件数，近奇异时返回
    /// `SolverDidNotConverge`，迭代次数耗尽或出现非有限值同样如此。
    /// 平方项方程组存在多个根，收敛到哪一个取决于初值。
    pub fn solve<S: NonlinearSystem>(&self, system: &S, initial: &[f64]) -> Result<Solution> {
        let n = system.dimension();
        if system.equation_count() != n {
            return Err(AnalysisError::InvalidInput(format!(
                "System must be exactly determined: {} equations for {} unknowns",
                system.equation_count(),
                n
            )));
        }
        if initial.len() != n {
            return Err(AnalysisError::InvalidInput(format!(
                "Initial guess has {} values, expected {}",
                initial.len(),
                n
            )));
        }

        let residual_limit = self.tolerance * system.residual_scale();
        let mut p = DVector::from_column_slice(initial);
        let mut iterations = 0;

        loop {
            let residuals = system.residuals(&p);
            let max_residual = residuals.amax();

            if !max_residual.is_finite() {
                return Err(did_not_converge(iterations, max_residual, "residual is not finite"));
            }

            let jacobian = system.jacobian(&p);
            let singular_values = jacobian.singular_values();
            let largest = singular_values.max();
            let reciprocal_condition = if largest > 0.0 {
                singular_values.min() / largest
            } else {
                0.0
            };

            debug!(
                "Newton iteration {}: max |residual| = {:e}, rcond = {:e}",
                iterations, max_residual, reciprocal_condition
            );

            if reciprocal_condition < MIN_RECIPROCAL_CONDITION {
                return Err(did_not_converge(iterations, max_residual, "Jacobian is singular"));
            }

            let step = jacobian
                .lu()
                .solve(&(-residuals))
                .ok_or_else(|| did_not_converge(iterations, max_residual, "Jacobian is singular"))?;

            if step.iter().any(|v| !v.is_finite()) {
                return Err(did_not_converge(iterations, max_residual, "Newton step is not finite"));
            }

            let step_limit = STEP_TOLERANCE * (1.0 + p.amax());
            if max_residual <= residual_limit && step.amax() <= step_limit {
                return Ok(Solution {
                    values: p,
                    iterations,
                    max_residual,
                });
            }

            if iterations >= self.max_iterations {
                return Err(did_not_converge(
                    iterations,
                    max_residual,
                    "iteration limit reached",
                ));
            }

            p += step;
            iterations += 1;
        }
    }
}

fn did_not_converge(iterations: usize, residual: f64, reason: &str) -> AnalysisError {
    AnalysisError::SolverDidNotConverge {
        iterations,
        residual,
        reason: reason.to_string(),
    }
}
