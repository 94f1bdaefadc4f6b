use super::DefinitionService;
use crate::ast::{Position, SourceLocation};
use crate::error::{AnalysisError, Result};
use log::{debug, warn};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default timeout for one `get-def` call (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Definition lookup backed by the Flow CLI.
///
/// Runs `<binary> get-def <file> <line> <column>` for every query and parses the
/// `path:line:col,line:col` answer. The Flow server must already cover the analyzed files.
#[derive(Debug, Clone)]
pub struct FlowDefinitionService {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for FlowDefinitionService {
    fn default() -> Self {
        Self::new(PathBuf::from("flow"), Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl FlowDefinitionService {
    pub fn new(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    fn command_line(&self, query: &SourceLocation) -> String {
        format!(
            "{} get-def {} {} {}",
            self.binary.display(),
            query.file.display(),
            query.start.line,
            query.start.column
        )
    }

    /// Runs the lookup command and returns its stdout.
    fn run(&self, query: &SourceLocation) -> Result<String> {
        let command = self.command_line(query);
        debug!("Running {}", command);

        let failure = |message: String| AnalysisError::ExternalProcess {
            command: command.clone(),
            message,
        };

        let mut child = Command::new(&self.binary)
            .arg("get-def")
            .arg(&query.file)
            .arg(query.start.line.to_string())
            .arg(query.start.column.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failure(format!("failed to start: {}", e)))?;

        // Drain both pipes while waiting.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if started.elapsed() >= self.timeout {
                        if let Err(e) = child.kill() {
                            warn!("Failed to kill timed out lookup: {}", e);
                        }
                        // reap
                        let _ = child.wait();
                        return Err(failure(format!(
                            "timed out after {}s",
                            self.timeout.as_secs_f64()
                        )));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(failure(format!("failed to wait: {}", e))),
            }
        };

        let stdout =
            collect(stdout).map_err(|e| failure(format!("failed to read stdout: {}", e)))?;
        let stderr =
            collect(stderr).map_err(|e| failure(format!("failed to read stderr: {}", e)))?;

        let stderr = String::from_utf8_lossy(&stderr);
        if !stderr.trim().is_empty() {
            return Err(failure(stderr.trim().to_string()));
        }
        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            return Err(failure(format!("exited with status {}", exit_code)));
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

type Reader = Option<JoinHandle<io::Result<Vec<u8>>>>;

/// Reads a child pipe to the end on its own thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Reader {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            pipe.read_to_end(&mut buffer)?;
            Ok(buffer)
        })
    })
}

fn collect(reader: Reader) -> io::Result<Vec<u8>> {
    match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| io::Error::other("pipe reader panicked"))?,
        None => Ok(Vec::new()),
    }
}

impl DefinitionService for FlowDefinitionService {
    fn lookup_definition(&self, query: &SourceLocation) -> Result<Option<SourceLocation>> {
        let stdout = self.run(query)?;
        let answer = parse_get_def(&stdout, query);
        if answer.is_none() {
            warn!(
                "Unrecognized get-def output for {}: {}",
                query,
                stdout.trim()
            );
        }
        Ok(answer)
    }
}

/// Parses `path:l1:c1,l2:c2` lookup output.
///
/// The first line in that shape is the answer; other lines are ignored. A start line of 0
/// means the queried location already is the definition, which is reported as `query`
/// itself. The path may contain `:`.
pub fn parse_get_def(stdout: &str, query: &SourceLocation) -> Option<SourceLocation> {
    stdout
        .lines()
        .find_map(|line| parse_get_def_line(line.trim(), query))
}

fn parse_get_def_line(line: &str, query: &SourceLocation) -> Option<SourceLocation> {
    let (head, end) = line.rsplit_once(',')?;

    let mut parts = head.rsplitn(3, ':');
    let start_column: u32 = parts.next()?.trim().parse().ok()?;
    let start_line: u32 = parts.next()?.trim().parse().ok()?;
    let path = parts.next()?;

    let (end_line, end_column) = end.split_once(':')?;
    let end_line: u32 = end_line.trim().parse().ok()?;
    let end_column: u32 = end_column.trim().parse().ok()?;

    if start_line == 0 {
        return Some(query.clone());
    }
    if path.is_empty() {
        return None;
    }

    let start = Position::new(start_line, start_column);
    let end = Position::new(end_line, end_column).max(start);
    Some(SourceLocation::new(resolve_path(path, &query.file), start, end))
}

/// Relative answers are taken relative to the queried file's folder.
fn resolve_path(path: &str, query_file: &Path) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match query_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !path.starts_with(parent) => {
            parent.join(path)
        }
        _ => path.to_path_buf(),
    }
}
