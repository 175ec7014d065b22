//! Launching the platform's default application for a file.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Open `path` with the default application. Does not wait for it to exit.
pub fn open_with_default_app(path: &Path) -> io::Result<()> {
    let mut command = default_app_command(path)?;
    command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    let child = command.spawn()?;
    log::debug!("Launched viewer (pid {}) for {}", child.id(), path.display());
    Ok(())
}

#[cfg(target_os = "macos")]
fn default_app_command(path: &Path) -> io::Result<Command> {
    let mut command = Command::new("open");
    command.arg(path);
    Ok(command)
}

#[cfg(windows)]
fn default_app_command(path: &Path) -> io::Result<Command> {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(path);
    Ok(command)
}

#[cfg(all(unix, not(target_os = "macos")))]
fn default_app_command(path: &Path) -> io::Result<Command> {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    Ok(command)
}

#[cfg(not(any(unix, windows)))]
fn default_app_command(_path: &Path) -> io::Result<Command> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "no default viewer on this platform"))
}
