mod platform;

use log::LevelFilter;
use reader_logging::LogDestination;

fn main() -> anyhow::Result<()> {
    // The terminal belongs to the UI; log to the file only.
    reader_logging::initialize(LogDestination::default(), LevelFilter::Info);
    platform::run_app()
}
