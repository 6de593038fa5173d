//! Shared-memory pixel storage handed to the presentation adapter.

use std::io;

#[cfg(target_os = "linux")]
use std::os::fd::{AsFd, BorrowedFd, FromRawFd, OwnedFd};

enum Backing {
    #[cfg(target_os = "linux")]
    Mapped {
        ptr: *mut u32,
        words: usize,
        fd: OwnedFd,
    },
    Heap(Vec<u32>),
}

/// A zero-initialised region of ARGB32 pixels.
pub struct ShmRegion {
    backing: Backing,
}

impl std::fmt::Debug for ShmRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShmRegion")
            .field("words", &self.as_slice().len())
            .field("shared", &self.is_shared())
            .finish()
    }
}

impl ShmRegion {
    /// Allocates `words` pixels. On Linux this is a sealed-off memfd mapping
    /// that a display server can import; elsewhere it is plain heap memory.
    pub fn allocate(words: usize) -> io::Result<Self> {
        if words == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty shared-memory region"));
        }
        #[cfg(target_os = "linux")]
        {
            map_memfd(words)
        }
        #[cfg(not(target_os = "linux"))]
        {
            Ok(Self::heap(words))
        }
    }

    /// Private memory with the same interface, for tests and headless use.
    pub fn heap(words: usize) -> Self {
        Self {
            backing: Backing::Heap(vec![0; words]),
        }
    }

    pub fn is_shared(&self) -> bool {
        !matches!(self.backing, Backing::Heap(_))
    }

    #[cfg(target_os = "linux")]
    pub fn fd(&self) -> Option<BorrowedFd<'_>> {
        match &self.backing {
            Backing::Mapped { fd, .. } => Some(fd.as_fd()),
            Backing::Heap(_) => None,
        }
    }

    pub fn as_slice(&self) -> &[u32] {
        match &self.backing {
            #[cfg(target_os = "linux")]
            // SAFETY: `ptr` maps `words` u32s for as long as `self` lives.
            Backing::Mapped { ptr, words, .. } => unsafe { std::slice::from_raw_parts(*ptr, *words) },
            Backing::Heap(pixels) => pixels,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        match &mut self.backing {
            #[cfg(target_os = "linux")]
            // SAFETY: as above, and `&mut self` guarantees exclusive access.
            Backing::Mapped { ptr, words, .. } => unsafe { std::slice::from_raw_parts_mut(*ptr, *words) },
            Backing::Heap(pixels) => pixels,
        }
    }
}

#[cfg(target_os = "linux")]
fn map_memfd(words: usize) -> io::Result<ShmRegion> {
    let bytes = words
        .checked_mul(4)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "region too large"))?;
    let raw = unsafe { libc::memfd_create(c"tofi-buffer".as_ptr(), libc::MFD_CLOEXEC) };
    if raw < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `raw` is a freshly created descriptor we own.
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };
    if unsafe { libc::ftruncate(raw, bytes as libc::off_t) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            bytes,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            raw,
            0,
        )
    };
    if ptr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }
    Ok(ShmRegion {
        backing: Backing::Mapped {
            ptr: ptr.cast::<u32>(),
            words,
            fd,
        },
    })
}

impl Drop for ShmRegion {
    fn drop(&mut self) {
        #[cfg(target_os = "linux")]
        if let Backing::Mapped { ptr, words, .. } = &self.backing {
            unsafe {
                libc::munmap(ptr.cast::<libc::c_void>(), words * 4);
            }
        }
    }
}
