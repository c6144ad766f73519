//! Serial link: raw 8N1 tty, no flow control, one byte per command.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::CommandSink;
use crate::config::SerialConfig;
use crate::error::{Error, Result};
use crate::hand::Command;

/// An open serial connection to the remote device.
pub struct SerialLink {
    port: PathBuf,
    file: File,
    bytes_written: u64,
}

impl SerialLink {
    /// Open and configure the port, then wait for the link to settle.
    ///
    /// A path that is not a terminal (a plain file or FIFO) is accepted and
    /// written to as-is.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let file = open_port(&config.port).map_err(|e| {
            Error::Transport(format!("cannot open {}: {}", config.port.display(), e))
        })?;

        match configure_raw(&file, config.baud_rate) {
            Ok(()) => debug!(
                port = %config.port.display(),
                baud = config.baud_rate,
                "serial port configured 8N1 raw"
            ),
            Err(e) if is_not_a_tty(&e) => {
                warn!(
                    "{} is not a terminal; writing command bytes without line setup",
                    config.port.display()
                );
            }
            Err(e) => {
                return Err(Error::Transport(format!(
                    "cannot configure {}: {}",
                    config.port.display(),
                    e
                )));
            }
        }

        set_blocking(&file).map_err(|e| {
            Error::Transport(format!("cannot configure {}: {}", config.port.display(), e))
        })?;

        if config.settle_ms > 0 {
            debug!("waiting {}ms for serial link to settle", config.settle_ms);
            std::thread::sleep(Duration::from_millis(config.settle_ms));
        }

        info!(
            "Serial connection established on {} at {} baud",
            config.port.display(),
            config.baud_rate
        );
        Ok(Self {
            port: config.port.clone(),
            file,
            bytes_written: 0,
        })
    }

    #[cfg(test)]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        info!(
            "Closing serial link {} ({} byte(s) written)",
            self.port.display(),
            self.bytes_written
        );
    }
}

impl CommandSink for SerialLink {
    fn send(&mut self, command: Command) -> io::Result<()> {
        self.file.write_all(&[command.wire_byte()])?;
        self.file.flush()?;
        self.bytes_written += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        self.port.display().to_string()
    }
}

fn open_port(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        // Never let the device become our controlling terminal, and do not
        // wait for carrier detect before CLOCAL is set.
        options.custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK);
    }
    options.open(path)
}

fn is_not_a_tty(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::ENOTTY)
    }
    #[cfg(not(unix))]
    {
        let _ = err;
        false
    }
}

/// Clear the O_NONBLOCK used for open so writes block normally.
#[cfg(unix)]
fn set_blocking(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_blocking(_file: &File) -> io::Result<()> {
    Ok(())
}

/// Map a numeric baud rate to its termios speed constant.
#[cfg(unix)]
fn baud_constant(baud: u32) -> Option<libc::speed_t> {
    Some(match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        230400 => libc::B230400,
        _ => return None,
    })
}

/// Put the tty into raw 8N1 mode at `baud` with flow control disabled.
#[cfg(unix)]
fn configure_raw(file: &File, baud: u32) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let speed = baud_constant(baud).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported baud rate {}", baud),
        )
    })?;
    let fd = file.as_raw_fd();

    let mut tio: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(io::Error::last_os_error());
    }

    unsafe { libc::cfmakeraw(&mut tio) };
    tio.c_cflag |= libc::CLOCAL | libc::CREAD;
    tio.c_cflag &= !(libc::CSTOPB | libc::PARENB);
    #[cfg(target_os = "linux")]
    {
        tio.c_cflag &= !libc::CRTSCTS;
    }
    tio.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);

    let rc = unsafe {
        libc::cfsetispeed(&mut tio, speed);
        libc::cfsetospeed(&mut tio, speed);
        libc::tcsetattr(fd, libc::TCSANOW, &tio)
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn configure_raw(_file: &File, _baud: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_config(dir: &TempDir) -> SerialConfig {
        let port = dir.path().join("link.bin");
        std::fs::write(&port, b"").unwrap();
        SerialConfig {
            enabled: true,
            port,
            baud_rate: 9600,
            settle_ms: 0,
        }
    }

    #[test]
    fn test_open_missing_device_fails() {
        let dir = TempDir::new().unwrap();
        let config = SerialConfig {
            port: dir.path().join("no-such-tty"),
            settle_ms: 0,
            ..SerialConfig::default()
        };
        assert!(matches!(SerialLink::open(&config), Err(Error::Transport(_))));
    }

    #[test]
    fn test_plain_file_receives_command_bytes() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir);

        let mut link = SerialLink::open(&config).expect("open plain file");
        link.send(Command::Forward).unwrap();
        link.send(Command::Stop).unwrap();
        link.send(Command::Left).unwrap();
        assert_eq!(link.bytes_written(), 3);
        assert_eq!(link.describe(), config.port.display().to_string());
        drop(link);

        assert_eq!(std::fs::read(&config.port).unwrap(), b"FSL");
    }

    #[cfg(unix)]
    #[test]
    fn test_port_is_blocking_after_open() {
        use std::os::unix::io::AsRawFd;

        let dir = TempDir::new().unwrap();
        let link = SerialLink::open(&file_config(&dir)).unwrap();
        let flags = unsafe { libc::fcntl(link.file.as_raw_fd(), libc::F_GETFL) };
        assert!(flags >= 0);
        assert_eq!(flags & libc::O_NONBLOCK, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_baud_constants() {
        assert_eq!(baud_constant(9600), Some(libc::B9600));
        assert_eq!(baud_constant(115200), Some(libc::B115200));
        assert_eq!(baud_constant(12345), None);
    }
}
