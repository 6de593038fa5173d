//! Raw-mode access to the controlling terminal.
//!
//! Standard input carries the candidate list, so keyboard input and all
//! terminal output go through `/dev/tty` instead.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::time::Duration;

use libc::c_int;

/// Terminal size in cells and, when the terminal reports it, pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowSize {
    pub columns: u16,
    pub rows: u16,
    pub pixel_width: u16,
    pub pixel_height: u16,
}

impl WindowSize {
    /// Pixel size of one cell, if the terminal reported its pixel size.
    pub fn cell_pixels(&self) -> Option<(u32, u32)> {
        if self.pixel_width == 0 || self.pixel_height == 0 || self.columns == 0 || self.rows == 0 {
            return None;
        }
        Some((
            u32::from(self.pixel_width) / u32::from(self.columns),
            u32::from(self.pixel_height) / u32::from(self.rows),
        ))
    }
}

pub struct Tty {
    file: File,
    original_termios: Option<libc::termios>,
}

impl Tty {
    pub fn open() -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open("/dev/tty")?;
        Ok(Self {
            file,
            original_termios: None,
        })
    }

    fn fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    pub fn enable_raw_mode(&mut self) -> io::Result<()> {
        let original = match self.original_termios {
            Some(original) => original,
            None => {
                let original = get_termios(self.fd())?;
                self.original_termios = Some(original);
                original
            }
        };
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.fd(), &raw)
    }

    pub fn restore_mode(&mut self) -> io::Result<()> {
        if let Some(original) = self.original_termios.take() {
            set_termios(self.fd(), &original)?;
        }
        Ok(())
    }

    pub fn size(&self) -> Option<WindowSize> {
        read_winsize(self.fd())
    }

    /// Waits up to `timeout` for input, then returns whatever is available.
    /// An empty result means the wait timed out or was interrupted.
    pub fn read_available(&mut self, timeout: Duration) -> io::Result<Vec<u8>> {
        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
        if !poll_readable(self.fd(), timeout_ms)? {
            return Ok(Vec::new());
        }
        let mut buf = [0u8; 1024];
        let result = unsafe { libc::read(self.fd(), buf.as_mut_ptr().cast::<libc::c_void>(), buf.len()) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Vec::new());
            }
            return Err(err);
        }
        if result == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "terminal closed"));
        }
        Ok(buf[..result as usize].to_vec())
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        write_all_fd_with(self.fd(), bytes, write_once, wait_writable)
    }
}

impl Drop for Tty {
    fn drop(&mut self) {
        let _ = self.restore_mode();
    }
}

fn write_once(fd: c_int, buf: &[u8]) -> io::Result<usize> {
    let result = unsafe { libc::write(fd, buf.as_ptr().cast::<libc::c_void>(), buf.len()) };
    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(result as usize)
    }
}

fn wait_writable(fd: c_int) -> io::Result<()> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, -1) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if (fds.revents & libc::POLLOUT) != 0 {
            return Ok(());
        }
        if result > 0 {
            return Err(io::Error::other(format!(
                "poll(POLLOUT) returned revents=0x{:x}",
                fds.revents
            )));
        }
    }
}

fn write_all_fd_with<FWrite, FWait>(
    fd: c_int,
    bytes: &[u8],
    mut write_once: FWrite,
    mut wait_writable: FWait,
) -> io::Result<()>
where
    FWrite: FnMut(c_int, &[u8]) -> io::Result<usize>,
    FWait: FnMut(c_int) -> io::Result<()>,
{
    let mut written = 0;
    while written < bytes.len() {
        match write_once(fd, &bytes[written..]) {
            Ok(0) => return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0")),
            Ok(count) => {
                if count > bytes.len() - written {
                    return Err(io::Error::other("write returned more bytes than requested"));
                }
                written += count;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => wait_writable(fd)?,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

fn read_winsize(fd: c_int) -> Option<WindowSize> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some(WindowSize {
            columns: size.ws_col,
            rows: size.ws_row,
            pixel_width: size.ws_xpixel,
            pixel_height: size.ws_ypixel,
        })
    } else {
        None
    }
}

fn poll_readable(fd: c_int, timeout_ms: i32) -> io::Result<bool> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    if result < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    if result > 0 && (fds.revents & (libc::POLLHUP | libc::POLLERR)) != 0 && (fds.revents & libc::POLLIN) == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "terminal hung up"));
    }
    Ok(result > 0 && (fds.revents & libc::POLLIN) != 0)
}

fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
