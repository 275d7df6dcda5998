use super::fft::{SpectrumAnalyzer, WINDOW_SIZE};

/// 低于该幅度视为没有交流能量
const ZERO_ENERGY: f64 = 1e-9;

/// 在去掉直流的幅度谱上估计主峰频率 (Hz)
///
/// `magnitudes[k]` 对应频率 `(k + 1) * bin_width`。取最大值所在频点，
/// 再用相邻两点做抛物线插值；频带两端不插值。没有能量时返回 0.0。
pub fn dominant_frequency(magnitudes: &[f64], bin_width: f64) -> f64 {
    let Some((k, &peak)) = magnitudes
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
    else {
        return 0.0;
    };

    if peak <= ZERO_ENERGY {
        return 0.0;
    }

    let mut offset = 0.0;
    if k > 0 && k + 1 < magnitudes.len() {
        let (alpha, gamma) = (magnitudes[k - 1], magnitudes[k + 1]);
        let denom = alpha - 2.0 * peak + gamma;
        if denom.abs() > f64::EPSILON {
            offset = (0.5 * (alpha - gamma) / denom).clamp(-0.5, 0.5);
        }
    }

    let nyquist = magnitudes.len() as f64 * bin_width;
    ((k as f64 + 1.0 + offset) * bin_width).clamp(bin_width, nyquist)
}

/// 128 点窗口的主峰频率，采样率 200 Hz
///
/// 单次调用的入口，每次都会新建 FFT 计划。逐窗口处理时复用同一个
/// `SpectrumAnalyzer` 并调用 `dominant_frequency`，见 `analyze_series`。
pub fn peak_detect_128(window: &[f64; WINDOW_SIZE]) -> f64 {
    let analyzer = SpectrumAnalyzer::default();
    dominant_frequency(&analyzer.magnitudes(window), analyzer.bin_width())
}
