pub mod extract;
pub mod reader;

pub use extract::{extract, Extraction, Sensor};
pub use reader::{read_file, JsonLinesSource, PacketSource, Recording};
