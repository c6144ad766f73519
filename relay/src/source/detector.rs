//! Live landmark source: an external capture + detector process.
//!
//! The helper owns the camera and the hand landmark model.  It is started
//! with the configured thresholds, prints `READY` once the camera is open,
//! then writes one frame line per captured image on stdout.

use std::fs::File;
use std::io::BufReader;
use std::process::{Child, ChildStdout, Command, Stdio};

use tracing::{debug, info, warn};

use super::wire::FrameReader;
use super::{Frame, LandmarkSource};
use crate::config::DetectorConfig;
use crate::error::SourceError;

/// A running detector process.
pub struct DetectorProcess {
    command: String,
    child: Child,
    reader: FrameReader<BufReader<ChildStdout>>,
    released: bool,
}

impl DetectorProcess {
    /// Start the detector and wait for its ready signal.
    ///
    /// The helper's stderr goes to `log` when given, otherwise it is
    /// inherited.
    pub fn spawn(config: &DetectorConfig, log: Option<&File>) -> Result<Self, SourceError> {
        let command = config.command.join(" ");
        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| SourceError::NotReady("empty detector command".to_string()))?;

        let stderr = match log {
            Some(file) => Stdio::from(file.try_clone().map_err(|source| SourceError::Spawn {
                command: command.clone(),
                source,
            })?),
            None => Stdio::inherit(),
        };

        info!("Starting landmark detector: {}", command);
        let mut child = Command::new(program)
            .args(args)
            .arg("--detection-confidence")
            .arg(config.detection_confidence.to_string())
            .arg("--tracking-confidence")
            .arg(config.tracking_confidence.to_string())
            .arg("--max-hands")
            .arg(config.max_hands.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(stderr)
            .spawn()
            .map_err(|source| SourceError::Spawn {
                command: command.clone(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SourceError::NotReady("detector stdout unavailable".to_string()));
        };
        let mut reader = FrameReader::new(BufReader::new(stdout), config.mirror);

        let ready = match reader.read_line() {
            Ok(Some(line)) if line == "READY" => Ok(()),
            Ok(Some(line)) => Err(SourceError::NotReady(line.to_string())),
            Ok(None) => Err(SourceError::NotReady(String::new())),
            Err(e) => Err(e),
        };
        if let Err(e) = ready {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }

        info!("Landmark detector ready (pid {})", child.id());
        Ok(Self {
            command,
            child,
            reader,
            released: false,
        })
    }

    /// Stop the detector process.  Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match self.child.try_wait() {
            Ok(Some(status)) => debug!("detector already exited: {}", status),
            _ => {
                if let Err(e) = self.child.kill() {
                    warn!("failed to stop detector: {}", e);
                }
                let _ = self.child.wait();
            }
        }
        info!(
            "Landmark detector stopped after {} frame(s)",
            self.reader.frames_read()
        );
    }
}

impl LandmarkSource for DetectorProcess {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        // A live camera never ends cleanly: EOF means the helper died.
        match self.reader.next_frame()? {
            Some(frame) => Ok(Some(frame)),
            None => Err(SourceError::Closed),
        }
    }

    fn describe(&self) -> String {
        format!("detector `{}`", self.command)
    }
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> DetectorConfig {
        DetectorConfig {
            command: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            ..DetectorConfig::default()
        }
    }

    #[test]
    fn test_spawn_missing_program() {
        let config = DetectorConfig {
            command: vec!["/nonexistent/hand-detector".to_string()],
            ..DetectorConfig::default()
        };
        assert!(matches!(
            DetectorProcess::spawn(&config, None),
            Err(SourceError::Spawn { .. })
        ));
    }

    #[test]
    fn test_requires_ready_line() {
        let err = DetectorProcess::spawn(&sh("echo 'camera busy'"), None).err().unwrap();
        assert!(matches!(err, SourceError::NotReady(ref l) if l == "camera busy"));
    }

    #[test]
    fn test_frames_then_closed() {
        let config = sh(r#"echo READY; echo '{"width":640,"height":480,"hands":[]}'"#);
        let mut det = DetectorProcess::spawn(&config, None).unwrap();
        let frame = det.next_frame().unwrap().unwrap();
        assert_eq!(frame.width, 640);
        assert!(matches!(det.next_frame(), Err(SourceError::Closed)));
        det.shutdown();
        det.shutdown();
    }

    #[test]
    fn test_thresholds_are_forwarded() {
        // sh -c puts the trailing arguments in $0..$5.
        let mut config = sh(r#"echo READY; echo "{\"width\": $5, \"height\": 1, \"error\": \"$0 $1 $3\"}""#);
        config.max_hands = 3;
        config.detection_confidence = 0.6;
        config.tracking_confidence = 0.8;
        let mut det = DetectorProcess::spawn(&config, None).unwrap();
        let err = det.next_frame().unwrap_err();
        assert!(
            matches!(err, SourceError::Detector(ref m) if m == "--detection-confidence 0.6 0.8"),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_stderr_goes_to_log_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let log_path = dir.path().join("relay.log");
        let log = File::create(&log_path).unwrap();

        let mut det = DetectorProcess::spawn(
            &sh("echo 'loading model' >&2; echo READY"),
            Some(&log),
        )
        .unwrap();
        assert!(matches!(det.next_frame(), Err(SourceError::Closed)));
        det.shutdown();

        let logged = std::fs::read_to_string(&log_path).unwrap();
        assert!(logged.contains("loading model"), "{:?}", logged);
    }
}
