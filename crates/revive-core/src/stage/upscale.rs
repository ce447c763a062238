use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::consts::{DIAGNOSTIC_TAIL_LINES, PROGRESS_DONE};
use crate::error::StageError;
use crate::progress::{parse_progress_line, ProgressParser};

use super::request::UpscaleRequest;

/// How long the supervisor waits for a line before re-checking cancellation.
const LINE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Windows `CREATE_NO_WINDOW` process creation flag.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Default location of the upscale executable, relative to the working directory.
pub fn default_tool_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("./realesrgan-ncnn-vulkan.exe")
    } else {
        PathBuf::from("./realesrgan-ncnn-vulkan")
    }
}

/// Launches and supervises the external super-resolution tool.
#[derive(Clone, Debug)]
pub struct UpscaleRunner {
    tool: PathBuf,
}

impl UpscaleRunner {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }

    pub fn tool(&self) -> &Path {
        &self.tool
    }

    /// Tool arguments: `-i <input> -o <output> -s <scale> -n <model> -f <format>`.
    pub fn args(request: &UpscaleRequest) -> Vec<OsString> {
        vec![
            "-i".into(),
            request.input.clone().into_os_string(),
            "-o".into(),
            request.output.clone().into_os_string(),
            "-s".into(),
            request.scale.to_string().into(),
            "-n".into(),
            request.model.id().into(),
            "-f".into(),
            request.format.extension().into(),
        ]
    }

    fn command(&self, request: &UpscaleRequest) -> Command {
        let mut cmd = Command::new(&self.tool);
        cmd.args(Self::args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }
        cmd
    }

    /// Run the tool to completion.
    ///
    /// Progress is forwarded as it is parsed from the tool's merged
    /// stdout/stderr, never decreasing, and ends with 100 on success. The exit
    /// status and the presence of the output file are both checked.
    pub fn run(
        &self,
        request: &UpscaleRequest,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<PathBuf, StageError> {
        debug!(tool = %self.tool.display(), args = ?Self::args(request), "Launching upscale tool");

        let mut child = self.command(request).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StageError::ToolNotFound(self.tool.clone())
            } else {
                StageError::ToolLaunch {
                    tool: self.tool.clone(),
                    source: e,
                }
            }
        })?;

        let (line_tx, line_rx) = mpsc::channel::<String>();
        let readers = match spawn_readers(&mut child, &line_tx) {
            Ok(readers) => readers,
            Err(e) => {
                kill(&mut child);
                return Err(StageError::ToolLaunch {
                    tool: self.tool.clone(),
                    source: e,
                });
            }
        };
        drop(line_tx);

        let mut parser = ProgressParser::new();
        let mut tail: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);

        loop {
            if cancel.is_cancelled() {
                info!(tool = %self.tool.display(), "Cancelling upscale tool");
                kill(&mut child);
                // Readers exit on their own once the pipes close or the receiver is gone.
                drop(readers);
                return Err(StageError::Cancelled);
            }
            match line_rx.recv_timeout(LINE_POLL_INTERVAL) {
                Ok(line) => match parse_progress_line(&line) {
                    Some(value) => {
                        if let Some(value) = parser.accept(value) {
                            debug!(progress = value, "Upscale progress");
                            on_progress(value);
                        }
                    }
                    None => {
                        if tail.len() == DIAGNOSTIC_TAIL_LINES {
                            tail.pop_front();
                        }
                        tail.push_back(line);
                    }
                },
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = child.wait().map_err(|e| StageError::ToolLaunch {
            tool: self.tool.clone(),
            source: e,
        })?;
        join_readers(readers);

        if !status.success() {
            let output = Vec::from(tail).join("\n");
            warn!(%status, "Upscale tool exited abnormally");
            return Err(StageError::ToolAbnormalExit {
                status: status.to_string(),
                output,
            });
        }

        if !request.output.exists() {
            return Err(StageError::OutputMissing(request.output.clone()));
        }

        on_progress(PROGRESS_DONE);
        Ok(request.output.clone())
    }
}

fn spawn_readers(
    child: &mut Child,
    tx: &mpsc::Sender<String>,
) -> std::io::Result<Vec<JoinHandle<()>>> {
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_line_reader("revive-tool-stdout", stdout, tx.clone())?);
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_line_reader("revive-tool-stderr", stderr, tx.clone())?);
    }
    Ok(readers)
}

/// Forward every line of `stream` to `tx`. Carriage returns also end a line,
/// since console tools often redraw progress in place.
fn spawn_line_reader<R: Read + Send + 'static>(
    name: &str,
    stream: R,
    tx: mpsc::Sender<String>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new().name(name.into()).spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    for part in text.split(['\r', '\n']) {
                        let line = part.trim();
                        if !line.is_empty() && tx.send(line.to_string()).is_err() {
                            return;
                        }
                    }
                }
            }
        }
    })
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "Upscale tool already exited");
    }
    let _ = child.wait();
}

fn join_readers(readers: Vec<JoinHandle<()>>) {
    for handle in readers {
        let _ = handle.join();
    }
}
