use serde_json::Value;

use super::error::MediaError;
use super::media::{MediaElement, MediaEvent};

const TIME_POS_OBSERVER: u64 = 1;
const PAUSE_OBSERVER: u64 = 2;

/// Maps one line of mpv JSON IPC output to the event it represents, if any.
pub(crate) fn translate_ipc_line(line: &str) -> Option<MediaEvent> {
    let value: Value = serde_json::from_str(line.trim()).ok()?;
    match value.get("event")?.as_str()? {
        "file-loaded" => Some(MediaEvent::LoadedMetadata),
        "end-file" => {
            (value.get("reason").and_then(Value::as_str) == Some("eof")).then_some(MediaEvent::Ended)
        }
        "property-change" => match value.get("name")?.as_str()? {
            "time-pos" => value.get("data")?.as_f64().map(MediaEvent::TimeUpdate),
            "pause" => value.get("data")?.as_bool().map(|paused| {
                if paused {
                    MediaEvent::Pause
                } else {
                    MediaEvent::Play
                }
            }),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(unix)]
pub(crate) use self::unix::MpvElement;

#[cfg(unix)]
mod unix {
    use std::fs;
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixStream;
    use std::path::{Path, PathBuf};
    use std::process::{Child, Command as ProcessCommand, Stdio};
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use anyhow::{Context, Result};
    use serde_json::{Value, json};
    use tracing::{debug, warn};

    use super::{
        MediaElement, MediaError, MediaEvent, PAUSE_OBSERVER, TIME_POS_OBSERVER,
        translate_ipc_line,
    };

    const CONNECT_ATTEMPTS: usize = 50;
    const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);

    /// An idle, windowless mpv process controlled over its IPC socket.
    pub(crate) struct MpvElement {
        child: Child,
        writer: UnixStream,
        events: mpsc::Receiver<MediaEvent>,
        socket_path: PathBuf,
    }

    impl MpvElement {
        pub(crate) fn spawn(bin: &Path) -> Result<Self, MediaError> {
            let socket_path = unique_socket_path();
            let mut child = ProcessCommand::new(bin)
                .arg("--idle=yes")
                .arg("--no-video")
                .arg("--no-terminal")
                .arg(format!("--input-ipc-server={}", socket_path.display()))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|source| MediaError::Spawn {
                    bin: bin.display().to_string(),
                    source,
                })?;
            debug!(pid = child.id(), socket = %socket_path.display(), "spawned mpv");

            let writer = match connect(&mut child, &socket_path) {
                Ok(stream) => stream,
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(err);
                }
            };
            let reader = writer.try_clone()?;
            let (tx, events) = mpsc::channel();
            thread::spawn(move || {
                for line in BufReader::new(reader).lines() {
                    let Ok(line) = line else {
                        break;
                    };
                    if let Some(event) = translate_ipc_line(&line)
                        && tx.send(event).is_err()
                    {
                        break;
                    }
                }
                debug!("mpv event reader finished");
            });

            let mut element = Self {
                child,
                writer,
                events,
                socket_path,
            };
            element.send(json!({"command": ["observe_property", TIME_POS_OBSERVER, "time-pos"]}))?;
            element.send(json!({"command": ["observe_property", PAUSE_OBSERVER, "pause"]}))?;
            Ok(element)
        }

        fn send(&mut self, command: Value) -> Result<(), MediaError> {
            let mut line = command.to_string();
            line.push('\n');
            self.writer.write_all(line.as_bytes())?;
            self.writer.flush()?;
            Ok(())
        }

        fn command(&mut self, command: Value) -> Result<()> {
            let text = command.to_string();
            self.send(command)
                .with_context(|| format!("failed to send mpv command {text}"))
        }
    }

    impl MediaElement for MpvElement {
        fn load(&mut self, url: &str) -> Result<()> {
            self.command(json!({"command": ["loadfile", url, "replace"]}))?;
            self.command(json!({"command": ["set_property", "pause", false]}))
        }

        fn stop(&mut self) -> Result<()> {
            self.command(json!({"command": ["stop"]}))
        }

        fn play(&mut self) -> Result<()> {
            self.command(json!({"command": ["set_property", "pause", false]}))
        }

        fn pause(&mut self) -> Result<()> {
            self.command(json!({"command": ["set_property", "pause", true]}))
        }

        fn set_position(&mut self, seconds: f64) -> Result<()> {
            self.command(json!({"command": ["set_property", "time-pos", seconds]}))
        }

        fn set_looping(&mut self, looping: bool) -> Result<()> {
            let mode = if looping { "inf" } else { "no" };
            self.command(json!({"command": ["set_property", "loop-file", mode]}))
        }

        fn poll_events(&mut self) -> Vec<MediaEvent> {
            self.events.try_iter().collect()
        }
    }

    impl Drop for MpvElement {
        fn drop(&mut self) {
            if let Err(err) = self.send(json!({"command": ["quit"]})) {
                warn!("failed to ask mpv to quit: {err}");
            }
            let _ = self.child.kill();
            let _ = self.child.wait();
            let _ = fs::remove_file(&self.socket_path);
        }
    }

    fn unique_socket_path() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("podcastr-mpv-{}-{nanos}.sock", std::process::id()))
    }

    fn connect(child: &mut Child, socket_path: &Path) -> Result<UnixStream, MediaError> {
        for _ in 0..CONNECT_ATTEMPTS {
            if let Ok(stream) = UnixStream::connect(socket_path) {
                return Ok(stream);
            }
            if child.try_wait()?.is_some() {
                return Err(MediaError::ExitedEarly);
            }
            thread::sleep(CONNECT_RETRY_DELAY);
        }
        Err(MediaError::ConnectTimeout(socket_path.display().to_string()))
    }
}

#[cfg(not(unix))]
use std::path::Path;

#[cfg(not(unix))]
use anyhow::Result;

#[cfg(not(unix))]
pub(crate) struct MpvElement;

#[cfg(not(unix))]
impl MpvElement {
    pub(crate) fn spawn(_bin: &Path) -> Result<Self, MediaError> {
        Err(MediaError::Unsupported)
    }
}

#[cfg(not(unix))]
impl MediaElement for MpvElement {
    fn load(&mut self, _url: &str) -> Result<()> {
        Err(MediaError::Unsupported.into())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        Err(MediaError::Unsupported.into())
    }

    fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_position(&mut self, _seconds: f64) -> Result<()> {
        Ok(())
    }

    fn set_looping(&mut self, _looping: bool) -> Result<()> {
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        Vec::new()
    }
}
