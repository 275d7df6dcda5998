use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// 每个分析窗口的样本数
pub const WINDOW_SIZE: usize = 128;
/// 报告的采样率
pub const SAMPLE_RATE_HZ: f64 = 200.0;

/// 实数输入 DFT 的频率轴，共 n/2 + 1 个点 (含直流)
pub fn rfft_frequencies(n: usize, sample_rate: f64) -> Vec<f64> {
    let bin = sample_rate / n as f64;
    (0..=n / 2).map(|k| k as f64 * bin).collect()
}

/// 固定长度的幅度谱计算器，复用同一个 FFT 计划
pub struct SpectrumAnalyzer {
    size: usize,
    sample_rate: f64,
    fft: Arc<dyn Fft<f64>>,
}

impl SpectrumAnalyzer {
    pub fn new(size: usize, sample_rate: f64) -> Self {
        let fft = FftPlanner::<f64>::new().plan_fft_forward(size);
        Self {
            size,
            sample_rate,
            fft,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// 频率分辨率 (Hz)
    pub fn bin_width(&self) -> f64 {
        self.sample_rate / self.size as f64
    }

    /// 去掉直流后的频率轴: bin_width ..= Nyquist
    pub fn frequencies(&self) -> Vec<f64> {
        rfft_frequencies(self.size, self.sample_rate).split_off(1)
    }

    /// 实数 DFT 幅度谱 |X[k]|, k = 1 ..= n/2
    ///
    /// `window` 长度必须等于 `size()`。
    pub fn magnitudes(&self, window: &[f64]) -> Vec<f64> {
        debug_assert_eq!(window.len(), self.size());
        let mut buffer: Vec<Complex<f64>> = window.iter().map(|&v| Complex::new(v, 0.0)).collect();
        self.fft.process(&mut buffer);
        buffer[1..=self.size / 2].iter().map(|c| c.norm()).collect()
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new(WINDOW_SIZE, SAMPLE_RATE_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    #[test]
    fn spectrum_has_64_non_negative_bins() {
        let analyzer = SpectrumAnalyzer::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            let window: Vec<f64> = (0..WINDOW_SIZE).map(|_| rng.random_range(-500.0..500.0)).collect();
            let spectrum = analyzer.magnitudes(&window);
            assert_eq!(spectrum.len(), 64);
            assert!(spectrum.iter().all(|&m| m >= 0.0));
        }
    }

    #[test]
    fn frequency_axis_drops_dc() {
        let analyzer = SpectrumAnalyzer::default();
        assert_eq!(analyzer.size(), WINDOW_SIZE);
        let freqs = analyzer.frequencies();
        assert_eq!(freqs.len(), analyzer.size() / 2);
        assert!((freqs[0] - 200.0 / 128.0).abs() < 1e-12);
        assert!((freqs[63] - 100.0).abs() < 1e-12);
        for pair in freqs.windows(2) {
            assert!((pair[1] - pair[0] - 1.5625).abs() < 1e-12);
        }
    }

    #[test]
    fn rfft_frequencies_include_dc_and_nyquist() {
        assert_eq!(rfft_frequencies(8, 8.0), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn constant_signal_has_no_ac_energy() {
        let spectrum = SpectrumAnalyzer::default().magnitudes(&[50.0; WINDOW_SIZE]);
        assert!(spectrum.iter().all(|&m| m < 1e-9));
    }

    #[test]
    fn cosine_lands_in_its_bin() {
        // 第 10 个频点, 幅度 3 → |X| = 3 * 128 / 2
        let window: Vec<f64> = (0..WINDOW_SIZE)
            .map(|i| 3.0 * (2.0 * PI * 10.0 * i as f64 / WINDOW_SIZE as f64).cos())
            .collect();
        let spectrum = SpectrumAnalyzer::default().magnitudes(&window);
        assert!((spectrum[9] - 192.0).abs() < 1e-9);
        for (k, m) in spectrum.iter().enumerate() {
            if k != 9 {
                assert!(*m < 1e-9, "bin {} has {}", k + 1, m);
            }
        }
    }
}
