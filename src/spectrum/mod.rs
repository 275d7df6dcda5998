pub mod fft;
pub mod peak;
pub mod windowing;

pub use fft::{rfft_frequencies, SpectrumAnalyzer, SAMPLE_RATE_HZ, WINDOW_SIZE};
pub use peak::peak_detect_128;
pub use windowing::{analyze, analyze_series, TagAlignment};
