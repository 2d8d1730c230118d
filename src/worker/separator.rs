use std::{
    env,
    ffi::OsString,
    path::Path,
    process::{Command, Stdio},
};

use tracing::{debug, info};

use crate::error::{Result, StemError};

pub const DEMUCS_BIN_ENV: &str = "DEMUCS_BIN";
pub const AUDIO_BACKEND_ENV: &str = "TORCHAUDIO_USE_SOUND_FILE";

const STDERR_TAIL_LINES: usize = 20;

/// One invocation of the separation tool.
#[derive(Debug, Clone, Copy)]
pub struct SeparationJob<'a> {
    pub input: &'a Path,
    pub out_root: &'a Path,
    pub work_dir: &'a Path,
    pub model_name: &'a str,
    pub shifts: u32,
    pub overlap: f64,
}

/// Writes `<out_root>/<model_name>/<run>/*.wav` for the job's input.
pub trait Separator {
    fn separate(&self, job: &SeparationJob<'_>) -> Result<()>;
}

impl<S: Separator + ?Sized> Separator for &S {
    fn separate(&self, job: &SeparationJob<'_>) -> Result<()> {
        (**self).separate(job)
    }
}

/// Runs the `demucs` command line tool.
#[derive(Debug, Clone)]
pub struct DemucsCli {
    program: OsString,
    prefix_args: Vec<OsString>,
}

impl Default for DemucsCli {
    fn default() -> Self {
        Self::new("demucs")
    }
}

impl DemucsCli {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    /// Arguments placed before the tool's own flags, e.g. `-m demucs`
    /// when the program is a Python interpreter.
    pub fn with_prefix_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.prefix_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `$DEMUCS_BIN` split on whitespace (so `python3 -m demucs` works),
    /// or `demucs` from `PATH`.
    pub fn from_env() -> Self {
        env::var(DEMUCS_BIN_ENV)
            .ok()
            .and_then(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program).with_prefix_args(parts))
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn command(&self, job: &SeparationJob<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args)
            .arg("--name")
            .arg(job.model_name)
            .arg("--shifts")
            .arg(job.shifts.to_string())
            .arg("--overlap")
            .arg(job.overlap.to_string())
            .arg("--out")
            .arg(job.out_root)
            .arg(job.input)
            .current_dir(job.work_dir);

        if env::var_os(AUDIO_BACKEND_ENV).is_none() {
            cmd.env(AUDIO_BACKEND_ENV, "1");
        }
        cmd
    }
}

impl Separator for DemucsCli {
    fn separate(&self, job: &SeparationJob<'_>) -> Result<()> {
        let program = self.program.to_string_lossy().into_owned();
        info!(program = %program, model = job.model_name, shifts = job.shifts, overlap = job.overlap, "running separation");

        let output = self
            .command(job)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| StemError::ToolFailed(format!("Failed to run {program}: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(target: "demucs", "{}", stdout.trim_end());
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = tail_lines(&stderr, STDERR_TAIL_LINES);
            let mut msg = format!("{program} failed ({})", output.status);
            if !tail.is_empty() {
                msg.push_str(": ");
                msg.push_str(&tail);
            }
            return Err(StemError::ToolFailed(msg));
        }

        Ok(())
    }
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
