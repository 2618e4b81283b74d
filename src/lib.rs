pub mod entities;
pub mod stats;

use const_format::formatcp;

// Directory where exported files land by default
pub const OUTPUT_DIR: &str = "./output";

// Default file for the serialized market graph
pub const MARKET_OUTPUT: &str = formatcp!("{}/market.json", OUTPUT_DIR);

/// Destination for the serialized entity graph
#[derive(Clone)]
pub struct OutputFile {
    pub market_output: String,
}

impl OutputFile {
    pub fn new() -> Self {
        OutputFile {
            market_output: String::from(MARKET_OUTPUT),
        }
    }
}

impl Default for OutputFile {
    fn default() -> Self {
        Self::new()
    }
}
