//! Command line flags

use anyhow::{bail, Result};
use proton_wallet_core::engine::EngineCommand;
use std::path::PathBuf;

pub const ENGINE_BIN_ENV: &str = "PROTON_ENGINE_BIN";

/// Startup flags parsed from the command line
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ShellFlags {
    /// Engine executable
    pub engine: Option<PathBuf>,
    /// Extra arguments passed to the engine
    pub engine_args: Vec<String>,
    /// Profile directory override
    pub data_dir: Option<PathBuf>,
    /// No console input, log-only surface
    pub headless: bool,
}

impl ShellFlags {
    /// Engine to start, falling back to `PROTON_ENGINE_BIN`
    pub fn engine_command(&self) -> Result<EngineCommand> {
        let program = match &self.engine {
            Some(program) => program.clone(),
            None => match std::env::var_os(ENGINE_BIN_ENV) {
                Some(program) => PathBuf::from(program),
                None => bail!("No engine given, pass --engine <path> or set {ENGINE_BIN_ENV}"),
            },
        };
        let mut command = EngineCommand::new(program);
        command.args = self.engine_args.clone();
        Ok(command)
    }
}

/// Parse command line arguments (without the program name)
pub fn parse_args<I>(args: I) -> Result<ShellFlags>
where
    I: IntoIterator<Item = String>,
{
    let mut flags = ShellFlags::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--engine" => flags.engine = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "--engine-arg" => flags.engine_args.push(value_for(&arg, args.next())?),
            "--data-dir" => flags.data_dir = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "--headless" => flags.headless = true,
            other => tracing::warn!("Ignoring unknown argument {}", other),
        }
    }

    Ok(flags)
}

fn value_for(flag: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => bail!("{flag} needs a value"),
    }
}
