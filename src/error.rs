use keyfall_engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Error reading '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Input script error at line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("No chart file or bundled chart named '{0}'")]
    UnknownChart(String),

    #[error("Invalid argument: {0}")]
    Usage(String),

    #[error("Error encoding output: {0}")]
    Json(#[from] serde_json::Error),
}
