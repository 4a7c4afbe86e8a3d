use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::path::Path;

use crate::capture::CaptureLayout;

pub const DEFAULT_DOWNLOADER: &str = "aria2c";
pub const DEFAULT_MUXER: &str = "ffmpeg";
pub const DEFAULT_JOBS: u32 = 10;

#[derive(Debug, Clone)]
pub struct ComposeOptions {
    /// Bulk downloader program, invoked with aria2c's arguments.
    pub downloader: String,
    /// Muxer program, invoked with ffmpeg's arguments.
    pub muxer: String,
    /// Number of concurrent downloads requested from the downloader.
    pub jobs: u32,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            downloader: DEFAULT_DOWNLOADER.to_string(),
            muxer: DEFAULT_MUXER.to_string(),
            jobs: DEFAULT_JOBS,
        }
    }
}

/// An external program invocation. Displayed as a single shell-quoted command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: impl AsRef<Path>) -> Self {
        self.arg(path.as_ref().as_os_str())
    }

    pub fn program(&self) -> &Path {
        Path::new(&self.program)
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl Display for ToolCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", shell_escape::escape(self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", shell_escape::escape(arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// Bulk download every extracted link into the downloads directory.
pub fn download_command(layout: &CaptureLayout, options: &ComposeOptions) -> ToolCommand {
    ToolCommand::new(&options.downloader)
        .arg("-i")
        .path_arg(layout.links_file())
        .arg("-j")
        .arg(options.jobs.to_string())
        .arg("-d")
        .path_arg(layout.downloads_dir())
}

/// Copy the streams referenced by the simplified manifest into a single transport stream.
pub fn remux_command(layout: &CaptureLayout, options: &ComposeOptions) -> ToolCommand {
    ToolCommand::new(&options.muxer)
        .arg("-allowed_extensions")
        .arg("ALL")
        .arg("-i")
        .path_arg(layout.simple_manifest())
        .arg("-c")
        .arg("copy")
        .path_arg(layout.output_file())
}

/// The commands left for the user to run, in order.
#[derive(Debug, Clone)]
pub struct Instructions {
    pub download: ToolCommand,
    pub remux: ToolCommand,
}

impl Instructions {
    pub fn new(layout: &CaptureLayout, options: &ComposeOptions) -> Self {
        Self {
            download: download_command(layout, options),
            remux: remux_command(layout, options),
        }
    }
}

impl Display for Instructions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "run the following commands in order")?;
        writeln!(f, "command 1: {}", self.download)?;
        writeln!(f, "command 2: {}", self.remux)?;
        write!(
            f,
            "NOTE: command 1 may take more time depending on the network speed, \
             it is recommended to use a VPN"
        )
    }
}
