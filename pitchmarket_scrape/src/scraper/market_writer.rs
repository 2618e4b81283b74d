use pitchmarket::entities::Market;
use pitchmarket::OutputFile;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use super::ScrapeError;

// Message to print before all writer logs
const WRITER_HEADING: &str = "[WRITER] ";

/// Serialize the whole market graph to pretty-printed JSON, creating the
/// output directory when it does not exist yet
pub fn record_market(market: &Market, outputs: &OutputFile) -> Result<(), ScrapeError> {
    log::info!("{}Starting writing", WRITER_HEADING);

    let path = Path::new(&outputs.market_output);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), market)?;

    log::info!("{}Writing completed successfully", WRITER_HEADING);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchmarket::entities::Region;
    use std::env;

    fn test_market() -> Market {
        let mut market = Market::new();
        market.add_region(Region::new("EUR1", "Europe", "https://example.com"));
        market
    }

    #[test]
    fn write_market() {
        // Temp file security is not really important here
        let temp_dir = env::temp_dir();
        let out_dir = temp_dir.to_str().expect("Temp dir should be valid UTF-8");
        let outputs = OutputFile {
            market_output: format!("{}/pitchmarket_writer_test/market.json", out_dir),
        };

        record_market(&test_market(), &outputs).expect("Test failed");

        let written =
            fs::read_to_string(&outputs.market_output).expect("output file should exist");
        let parsed: serde_json::Value =
            serde_json::from_str(&written).expect("output should be valid JSON");
        assert_eq!(parsed["regions"]["EUR1"]["name"], "Europe");
    }

    #[test]
    #[should_panic]
    fn fail_write_market() {
        // A file standing where the directory should go makes creation fail
        let temp_dir = env::temp_dir();
        let out_dir = temp_dir.to_str().expect("Temp dir should be valid UTF-8");
        let blocker = format!("{}/pitchmarket_writer_blocker", out_dir);
        fs::write(&blocker, b"not a directory").expect("Test setup failed");

        let outputs = OutputFile {
            market_output: format!("{}/market.json", blocker),
        };

        record_market(&test_market(), &outputs).expect("Test failed");
    }
}
