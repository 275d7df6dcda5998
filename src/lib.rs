//! 加速度计校准与目标面积频谱分析
//!
//! - [`calibration`]: 由静止读数求解偏置与比例因子
//! - [`playback`]: 读取录制文件并提取面积 / 屏幕编号序列
//! - [`spectrum`]: 128 点分窗、幅度谱与主峰检测
//! - [`plotter`]: 热力图与 GIF 动画输出

pub mod calibration;
pub mod config;
pub mod error;
pub mod logger;
pub mod playback;
pub mod plotter;
pub mod spectrum;
pub mod types;
pub mod utils;

pub use error::{AnalysisError, Result};
