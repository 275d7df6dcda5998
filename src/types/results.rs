/// 单个窗口的频谱分析结果
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    /// 窗口序号 (从 0 开始)
    pub index: usize,
    /// 幅度谱，已去掉直流分量
    pub magnitudes: Vec<f64>,
    /// 主峰频率 (Hz)
    pub peak_hz: f64,
    /// 窗口内 tag 的最小值
    pub compressed_tag: u8,
}

/// 所有窗口共享同一条频率轴
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub frequencies: Vec<f64>,
    pub frames: Vec<SpectrumFrame>,
}

impl Spectrogram {
    pub fn peaks(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.peak_hz).collect()
    }

    pub fn compressed_tags(&self) -> Vec<u8> {
        self.frames.iter().map(|f| f.compressed_tag).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
