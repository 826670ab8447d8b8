use thiserror::Error;

/// Failures surfaced by the Docker client.
#[derive(Debug, Error)]
pub enum DockerError {
    #[error("failed to invoke `{program}`: is it installed and on PATH?")]
    NotInstalled {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("docker daemon is not reachable: {0}")]
    DaemonUnavailable(String),

    #[error("`docker {command}` failed (exit {}): {stderr}", fmt_code(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("could not parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid docker command line `{0}`")]
    InvalidCommand(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation timed out after {0}s")]
    TimedOut(u64),
}

pub type Result<T, E = DockerError> = std::result::Result<T, E>;

fn fmt_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "signal".to_string(),
    }
}

impl DockerError {
    /// Short, single-line message suitable for a notification toast.
    pub fn summary(&self) -> String {
        match self {
            DockerError::CommandFailed { stderr, .. } => {
                let line = stderr
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .unwrap_or("unknown error");
                line.strip_prefix("Error response from daemon: ")
                    .unwrap_or(line)
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}
