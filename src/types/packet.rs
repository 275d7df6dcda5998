use serde::{Deserialize, Serialize};

/// 每个传感器一次报告的目标数量
pub const MAX_OBJECTS: usize = 16;

/// 录制文件第一行的头部信息，全部字段可选
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct RecordingHeader {
    pub device: Option<String>,
    pub sample_rate_hz: Option<f64>,
    pub impact_threshold: Option<u8>,
}

/// 单个目标的运动检测数据
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MotData {
    pub area: u16,
    pub cx: u16,
    pub cy: u16,
    pub avg_brightness: u8,
    pub max_brightness: u8,
    pub range: u8,
    pub radius: u8,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjectReport {
    #[serde(default)]
    pub timestamp: u32,
    pub mot_data_nf: [MotData; MAX_OBJECTS],
    pub mot_data_wf: [MotData; MAX_OBJECTS],
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CombinedMarkersReport {
    pub nf_screen_ids: [u8; MAX_OBJECTS],
    pub wf_screen_ids: [u8; MAX_OBJECTS],
}

/// 已解码的报告，按 `kind` 字段区分
///
/// 分析只关心 `ObjectReport` 与 `CombinedMarkersReport`，其余种类统一解码为 `Other`。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind")]
pub enum Report {
    ObjectReport(ObjectReport),
    CombinedMarkersReport(CombinedMarkersReport),
    #[serde(other)]
    Other,
}

/// 录制文件中的一条记录
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PacketRecord {
    pub timestamp: i128,
    pub report: Report,
}

impl PacketRecord {
    pub fn new(timestamp: i128, report: Report) -> Self {
        Self { timestamp, report }
    }
}
