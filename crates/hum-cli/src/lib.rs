//! Shared helpers for the HumSearch command-line tools

pub mod output;

/// Configure logging; stdout stays clean JSON unless `verbose` is set
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}
