pub mod measurement;
pub mod packet;
pub mod results;
pub mod sample;

pub use measurement::Measurement;
pub use packet::{CombinedMarkersReport, MotData, ObjectReport, PacketRecord, RecordingHeader, Report, MAX_OBJECTS};
pub use results::{Spectrogram, SpectrumFrame};
pub use sample::Sample;
