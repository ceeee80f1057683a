//! Collaborator process execution.
//!
//! Every phase blocks on one external command at a time. Output is captured
//! for parsing and, when requested, echoed line by line to the console while
//! the command runs.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// One collaborator invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub envs: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Build from a configured argv. Returns `None` for an empty argv.
    pub fn from_argv(argv: &[String], cwd: &Path) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
            envs: BTreeMap::new(),
        })
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.insert(key.into(), value.into());
        self
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What came back from a collaborator.
#[derive(Debug, Clone, Default)]
pub struct CommandOutcome {
    /// `None` when the process was killed by a signal or never started.
    pub exit_code: Option<i32>,
    /// Raw stdout followed by raw stderr; escape sequences intact.
    pub output: String,
    pub duration: Duration,
    pub spawn_error: Option<String>,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// How a command's output is surfaced while it runs.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    /// Echo each line to the console as it arrives.
    pub echo: bool,
    /// Transient raw-output file, removed by [`discard_transient`].
    pub transient: Option<PathBuf>,
}

/// Run a command to completion. Spawn failures are reported in the outcome
/// rather than as an error so callers can apply their own failure policy.
pub fn run_command(spec: &CommandSpec, capture: &Capture) -> CommandOutcome {
    tracing::debug!(command = %spec.display(), cwd = %spec.cwd.display(), "spawning");
    let start = Instant::now();

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(&spec.cwd)
        .envs(&spec.envs)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(command = %spec.display(), error = %e, "failed to spawn");
            return CommandOutcome {
                exit_code: None,
                output: String::new(),
                duration: start.elapsed(),
                spawn_error: Some(format!("{}: {}", spec.program, e)),
            };
        }
    };

    let echo = capture.echo;
    let stderr_reader = child.stderr.take().map(|stderr| {
        thread::spawn(move || {
            drain_lines(BufReader::new(stderr), |line| {
                if echo {
                    eprintln!("{}", line);
                }
            })
        })
    });

    let mut stdout_buf = String::new();
    if let Some(stdout) = child.stdout.take() {
        let mut reader = BufReader::new(stdout);
        if echo {
            let out = std::io::stdout();
            stdout_buf = drain_lines(reader, |line| {
                let mut handle = out.lock();
                let _ = writeln!(handle, "{}", line);
            });
        } else {
            let mut bytes = Vec::new();
            let _ = reader.read_to_end(&mut bytes);
            stdout_buf = String::from_utf8_lossy(&bytes).into_owned();
        }
    }

    let stderr_buf = stderr_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();

    let exit_code = match child.wait() {
        Ok(status) => status.code(),
        Err(e) => {
            tracing::warn!(command = %spec.display(), error = %e, "wait failed");
            None
        }
    };

    let mut output = stdout_buf;
    if !stderr_buf.is_empty() {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&stderr_buf);
    }

    if let Some(path) = &capture.transient {
        if let Err(e) = fs::write(path, &output) {
            tracing::warn!(path = %path.display(), error = %e, "could not write transient output");
        }
    }

    CommandOutcome {
        exit_code,
        output,
        duration: start.elapsed(),
        spawn_error: None,
    }
}

/// Read a stream to EOF line by line, decoding each line lossily so invalid
/// UTF-8 never stops the read and leaves the child writing to a closed pipe.
fn drain_lines<R: BufRead>(mut reader: R, mut on_line: impl FnMut(&str)) -> String {
    let mut captured = String::new();
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {
                let decoded = String::from_utf8_lossy(&raw);
                let line = decoded.strip_suffix('\n').unwrap_or(&decoded);
                let line = line.strip_suffix('\r').unwrap_or(line);
                on_line(line);
                captured.push_str(line);
                captured.push('\n');
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(error = %e, "output stream read failed");
                break;
            }
        }
    }
    captured
}

/// Delete a transient capture file once its content has been persisted.
pub fn discard_transient(capture: &Capture) {
    if let Some(path) = &capture.transient {
        let _ = fs::remove_file(path);
    }
}
