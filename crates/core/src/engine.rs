//! Engine child process
//!
//! The engine speaks one JSON frame per line on stdin/stdout. A reader thread
//! turns its output into [`ShellEvent`]s; the relay writes to its stdin through
//! [`EngineWriter`].

use crate::ipc::{encode_engine_line, parse_engine_line, EngineOutput, ProcessRole, RelayMessage};
use crate::relay::{Endpoint, RelayError};
use crate::supervisor::{LaunchedProcess, ProcessHandle, ShellEvent};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine {0} pipe was not captured")]
    MissingPipe(&'static str),

    #[error("failed to start engine reader: {0}")]
    Reader(#[source] std::io::Error),
}

/// How to start the engine
#[derive(Debug, Clone)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl EngineCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Writes relay messages to the engine's stdin
pub struct EngineWriter<W: Write + Send> {
    writer: BufWriter<W>,
}

impl<W: Write + Send> EngineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }
}

impl<W: Write + Send> Endpoint for EngineWriter<W> {
    fn deliver(&mut self, message: RelayMessage) -> Result<(), RelayError> {
        let line = encode_engine_line(&message).map_err(|source| RelayError::Encode {
            message_type: message.message_type(),
            source,
        })?;
        let io_error = |source: std::io::Error| RelayError::Io {
            role: ProcessRole::Engine,
            source,
        };
        writeln!(self.writer, "{line}").map_err(io_error)?;
        self.writer.flush().map_err(io_error)
    }
}

/// Handle the supervisor uses to stop the engine
pub struct EngineProcess {
    child: Arc<Mutex<Child>>,
}

impl ProcessHandle for EngineProcess {
    fn terminate(&mut self) {
        let mut child = self.child.lock();
        match child.try_wait() {
            Ok(Some(status)) => debug!("Engine already exited with {}", status),
            Ok(None) => {
                info!("Killing engine process {}", child.id());
                if let Err(e) = child.kill() {
                    warn!("Failed to kill engine: {}", e);
                }
                let _ = child.wait();
            }
            Err(e) => warn!("Failed to query engine status: {}", e),
        }
    }
}

/// Spawn the engine and start reading its output
pub fn spawn_engine(
    command: &EngineCommand,
    events: Sender<ShellEvent>,
) -> Result<LaunchedProcess, EngineError> {
    info!("Starting engine: {}", command.program.display());

    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| EngineError::Spawn {
            program: command.program.clone(),
            source,
        })?;

    let stdin: ChildStdin = child.stdin.take().ok_or(EngineError::MissingPipe("stdin"))?;
    let stdout = child.stdout.take().ok_or(EngineError::MissingPipe("stdout"))?;
    let child = Arc::new(Mutex::new(child));

    let reader_child = Arc::clone(&child);
    thread::Builder::new()
        .name("engine-reader".into())
        .spawn(move || {
            read_engine_output(stdout, &events);
            let status = reader_child.lock().try_wait();
            match status {
                Ok(Some(status)) => info!("Engine exited with {}", status),
                Ok(None) => info!("Engine closed its output"),
                Err(e) => warn!("Failed to query engine status: {}", e),
            }
            let _ = events.send(ShellEvent::ProcessExited(ProcessRole::Engine));
        })
        .map_err(EngineError::Reader)?;

    Ok(LaunchedProcess {
        endpoint: Box::new(EngineWriter::new(stdin)),
        handle: Box::new(EngineProcess { child }),
    })
}

/// Forward every frame on `output` until it closes
pub fn read_engine_output<R: Read>(output: R, events: &Sender<ShellEvent>) {
    for line in BufReader::new(output).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read engine output: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match parse_engine_line(&line) {
            Ok(EngineOutput::Loaded) => ShellEvent::ContentLoaded(ProcessRole::Engine),
            Ok(EngineOutput::Message(message)) => ShellEvent::FromEngine(message),
            Ok(EngineOutput::Ignored) => {
                debug!("Ignoring engine message with unknown type");
                continue;
            }
            Err(e) => {
                warn!("Skipping unreadable engine line: {}", e);
                continue;
            }
        };
        if events.send(event).is_err() {
            break;
        }
    }
}
