use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{AnalysisError, Result};
use crate::types::{PacketRecord, RecordingHeader};
use crate::utils::format_timestamp;

/// 一次完整读入内存的录制数据
#[derive(Debug, Clone, Default)]
pub struct Recording {
    pub header: RecordingHeader,
    pub packets: Vec<PacketRecord>,
}

/// 数据包来源
pub trait PacketSource {
    fn read(&self) -> Result<Recording>;
}

/// JSON Lines 格式的录制文件
///
/// 第一行为头部，此后每个非空行是一条 `PacketRecord`。
pub struct JsonLinesSource {
    path: PathBuf,
}

impl JsonLinesSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn error(&self, line: usize, reason: impl ToString) -> AnalysisError {
        AnalysisError::SourceReadError {
            path: self.path.clone(),
            line,
            reason: reason.to_string(),
        }
    }
}

impl PacketSource for JsonLinesSource {
    fn read(&self) -> Result<Recording> {
        let file = File::open(&self.path).map_err(|e| self.error(0, e))?;
        let mut lines = BufReader::new(file).lines();

        let header_line = match lines.next() {
            Some(line) => line.map_err(|e| self.error(1, e))?,
            None => return Err(self.error(1, "missing recording header")),
        };
        let header: RecordingHeader =
            serde_json::from_str(&header_line).map_err(|e| self.error(1, e))?;

        let mut packets = Vec::new();
        for (i, line) in lines.enumerate() {
            let line_no = i + 2;
            let line = line.map_err(|e| self.error(line_no, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: PacketRecord =
                serde_json::from_str(&line).map_err(|e| self.error(line_no, e))?;
            packets.push(record);
        }

        info!("Loaded {} packets from {:?}", packets.len(), self.path);
        if let (Some(first), Some(last)) = (packets.first(), packets.last()) {
            debug!(
                "Recording spans {} .. {}",
                format_timestamp(first.timestamp),
                format_timestamp(last.timestamp)
            );
        }

        Ok(Recording { header, packets })
    }
}

/// 读取整个录制文件
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Recording> {
    JsonLinesSource::new(path).read()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CombinedMarkersReport, ObjectReport, Report};
    use std::io::Write;

    fn write_recording(lines: &[String]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn reads_header_and_reports() {
        let mut object = ObjectReport::default();
        object.mot_data_wf[1].area = 42;
        let mut markers = CombinedMarkersReport::default();
        markers.wf_screen_ids[1] = 3;

        let lines = vec![
            r#"{"device": "vm-1", "sample_rate_hz": 200.0}"#.to_string(),
            serde_json::to_string(&PacketRecord::new(10, Report::ObjectReport(object))).unwrap(),
            String::new(),
            serde_json::to_string(&PacketRecord::new(11, Report::CombinedMarkersReport(markers))).unwrap(),
            r#"{"timestamp": 12, "report": {"kind": "AccelReport", "accel": [0.0, 0.0, 9.8]}}"#.to_string(),
        ];
        let file = write_recording(&lines);

        let recording = read_file(file.path()).unwrap();
        assert_eq!(recording.header.device.as_deref(), Some("vm-1"));
        assert_eq!(recording.header.sample_rate_hz, Some(200.0));
        assert_eq!(recording.packets.len(), 3);
        assert_eq!(recording.packets[0].report, Report::ObjectReport(object));
        assert_eq!(recording.packets[1].timestamp, 11);
        assert_eq!(recording.packets[2].report, Report::Other);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let lines = vec![
            "{}".to_string(),
            r#"{"timestamp": 1, "report": {"kind": "Other"}}"#.to_string(),
            r#"{"timestamp": 2, "report": "#.to_string(),
        ];
        let file = write_recording(&lines);

        match read_file(file.path()) {
            Err(AnalysisError::SourceReadError { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected SourceReadError, got {:?}", other),
        }
    }

    #[test]
    fn short_screen_id_array_is_rejected() {
        let lines = vec![
            "{}".to_string(),
            r#"{"timestamp": 1, "report": {"kind": "CombinedMarkersReport", "nf_screen_ids": [1, 2], "wf_screen_ids": [1, 2]}}"#.to_string(),
        ];
        let file = write_recording(&lines);
        assert!(matches!(
            read_file(file.path()),
            Err(AnalysisError::SourceReadError { line: 2, .. })
        ));
    }

    #[test]
    fn empty_or_missing_file_is_source_error() {
        let file = write_recording(&[]);
        assert!(matches!(
            read_file(file.path()),
            Err(AnalysisError::SourceReadError { line: 1, .. })
        ));

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            read_file(&missing),
            Err(AnalysisError::SourceReadError { line: 0, .. })
        ));
    }
}
