use std::fmt;
use std::str::FromStr;

use log::info;

use super::fft::{SpectrumAnalyzer, WINDOW_SIZE};
use super::peak::dominant_frequency;
use crate::config::ConfigError;
use crate::error::{AnalysisError, Result};
use crate::playback::Extraction;
use crate::types::{Sample, Spectrogram, SpectrumFrame};

/// tag 序列与数值序列的对应方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagAlignment {
    /// 按序列位置切片，与录制脚本一致
    #[default]
    Position,
    /// 每个数值样本取时间戳不晚于它的最近一个 tag
    Timestamp,
}

impl fmt::Display for TagAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagAlignment::Position => write!(f, "position"),
            TagAlignment::Timestamp => write!(f, "timestamp"),
        }
    }
}

impl FromStr for TagAlignment {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "position" => Ok(TagAlignment::Position),
            "timestamp" => Ok(TagAlignment::Timestamp),
            other => Err(ConfigError::unsupported("tag_alignment", other)),
        }
    }
}

/// 对提取结果做分窗频谱分析
pub fn analyze(extraction: &Extraction, alignment: TagAlignment) -> Result<Spectrogram> {
    let values = extraction.value_series();
    let tags = match alignment {
        TagAlignment::Position => extraction.tag_series(),
        TagAlignment::Timestamp => align_by_timestamp(&extraction.values, &extraction.tags)?,
    };

    let spectrogram = analyze_series(&values, &tags)?;

    info!("peaks = {:?}", spectrogram.peaks());
    info!("compressed_tags = {:?}", spectrogram.compressed_tags());

    Ok(spectrogram)
}

/// 按位置切成不重叠的 128 点窗口，末尾不足一个窗口的样本丢弃
///
/// 第 i 个窗口的 tag 取 `tags[i*128 .. (i+1)*128]` 的最小值；
/// `tags` 不够长时返回 `InsufficientTagData`，不做截断或填充。
pub fn analyze_series(values: &[f64], tags: &[u8]) -> Result<Spectrogram> {
    let analyzer = SpectrumAnalyzer::default();
    let bin_width = analyzer.bin_width();

    let frames = values
        .chunks_exact(WINDOW_SIZE)
        .enumerate()
        .map(|(index, window)| -> Result<SpectrumFrame> {
            let start = index * WINDOW_SIZE;
            let end = start + WINDOW_SIZE;
            let window_tags = tags
                .get(start..end)
                .ok_or(AnalysisError::InsufficientTagData {
                    window: index,
                    required: end,
                    available: tags.len(),
                })?;

            let magnitudes = analyzer.magnitudes(window);
            let peak_hz = dominant_frequency(&magnitudes, bin_width);
            let compressed_tag = window_tags.iter().copied().min().unwrap_or_default();

            Ok(SpectrumFrame {
                index,
                magnitudes,
                peak_hz,
                compressed_tag,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Spectrogram {
        frequencies: analyzer.frequencies(),
        frames,
    })
}

/// 为每个数值样本找到对应的 tag
fn align_by_timestamp(values: &[Sample<f64>], tags: &[Sample<u8>]) -> Result<Vec<u8>> {
    if tags.is_empty() {
        if values.len() >= WINDOW_SIZE {
            return Err(AnalysisError::InsufficientTagData {
                window: 0,
                required: 1,
                available: 0,
            });
        }
        return Ok(Vec::new());
    }

    let mut sorted = tags.to_vec();
    sorted.sort_by_key(|t| t.timestamp);

    Ok(values
        .iter()
        .map(|v| {
            let idx = sorted.partition_point(|t| t.timestamp <= v.timestamp);
            // 最早的 tag 之前的样本使用第一个 tag
            sorted[idx.saturating_sub(1)].value
        })
        .collect())
}
