pub mod error;
pub mod replay;

pub use error::CliError;
pub use replay::{parse_script, Replay, ReplayOutcome};

use keyfall_engine::EngineConfig;
use std::fs;
use std::path::Path;

/// Read a file, naming it in the error.
pub fn read_file(path: &str) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })
}

/// Resolve a chart argument to `(name, source)`: an existing file path first,
/// then a bundled chart name.
pub fn resolve_chart(arg: &str) -> Result<(String, String), CliError> {
    let path = Path::new(arg);
    if path.is_file() {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| arg.to_string());
        return Ok((name, read_file(arg)?));
    }

    keyfall_charts::get_chart(arg)
        .map(|chart| (chart.name, chart.content))
        .ok_or_else(|| CliError::UnknownChart(arg.to_string()))
}

/// Load an engine configuration file, or the defaults when none is given.
pub fn load_config(path: Option<&str>) -> Result<EngineConfig, CliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_yaml(&read_file(path)?)?),
        None => Ok(EngineConfig::default()),
    }
}
