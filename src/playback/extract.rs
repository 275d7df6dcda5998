use std::fmt;
use std::str::FromStr;

use log::info;

use crate::config::ConfigError;
use crate::error::{AnalysisError, Result};
use crate::types::{PacketRecord, Report, Sample, MAX_OBJECTS};

/// 传感器通道
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    WideField,
    NearField,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sensor::WideField => write!(f, "wf"),
            Sensor::NearField => write!(f, "nf"),
        }
    }
}

impl FromStr for Sensor {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "wf" => Ok(Sensor::WideField),
            "nf" => Ok(Sensor::NearField),
            other => Err(ConfigError::unsupported("sensor", other)),
        }
    }
}

/// 两条独立累积的序列
///
/// `values` 来自 ObjectReport，`tags` 来自 CombinedMarkersReport。
/// 两者长度不要求相同，也不按时间戳对齐。
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub values: Vec<Sample<f64>>,
    pub tags: Vec<Sample<u8>>,
}

impl Extraction {
    pub fn value_series(&self) -> Vec<f64> {
        self.values.iter().map(|s| s.value).collect()
    }

    pub fn tag_series(&self) -> Vec<u8> {
        self.tags.iter().map(|s| s.value).collect()
    }
}

/// 按传感器和目标编号提取面积与屏幕编号
pub fn extract(packets: &[PacketRecord], sensor: Sensor, object_id: usize) -> Result<Extraction> {
    if object_id >= MAX_OBJECTS {
        return Err(AnalysisError::InvalidInput(format!(
            "Object id must be below {}, got {}",
            MAX_OBJECTS, object_id
        )));
    }

    let mut extraction = Extraction::default();

    for packet in packets {
        match &packet.report {
            Report::ObjectReport(report) => {
                let mot = match sensor {
                    Sensor::WideField => &report.mot_data_wf[object_id],
                    Sensor::NearField => &report.mot_data_nf[object_id],
                };
                extraction
                    .values
                    .push(Sample::new(packet.timestamp, f64::from(mot.area)));
            }
            Report::CombinedMarkersReport(report) => {
                let screen_id = match sensor {
                    Sensor::WideField => report.wf_screen_ids[object_id],
                    Sensor::NearField => report.nf_screen_ids[object_id],
                };
                extraction.tags.push(Sample::new(packet.timestamp, screen_id));
            }
            Report::Other => {}
        }
    }

    info!("len(values) = {}", extraction.values.len());
    info!("len(tags) = {}", extraction.tags.len());

    Ok(extraction)
}
