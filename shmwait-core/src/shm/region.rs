// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! SharedMemoryRegion - POSIX shared memory wrapper.
//!
//! Provides safe abstraction over mmap and shm_open for cross-process state.
//! All unsafe operations are encapsulated with bounds checking.

use std::ffi::CString;
use std::ptr::NonNull;

use crate::error::SharedMemoryError;

/// Where the mapping came from, and what to release on drop.
#[derive(Debug)]
enum Backing {
    /// Named POSIX shm object.
    Named { fd: i32, is_owner: bool },
    /// `MAP_SHARED | MAP_ANONYMOUS`, shared with forked children only.
    Anonymous,
}

/// Represents a mapped shared memory region.
///
/// This struct owns the mapped memory and will unmap it on drop.
/// Named regions can be shared between processes using the same name.
#[derive(Debug)]
pub struct SharedMemoryRegion {
    /// Name of the shared memory object.
    name: String,
    /// Pointer to the mapped memory.
    ptr: NonNull<u8>,
    /// Size of the mapped region in bytes.
    size: usize,
    backing: Backing,
}

// SAFETY: SharedMemoryRegion can be sent between threads as it owns its memory.
unsafe impl Send for SharedMemoryRegion {}

// SAFETY: the region only hands out raw pointers; every structure placed in it
// is accessed through atomics.
unsafe impl Sync for SharedMemoryRegion {}

impl SharedMemoryRegion {
    /// Minimum size for a shared memory region.
    pub const MIN_SIZE: usize = 4096;

    /// Maximum size for a shared memory region (1 GB).
    pub const MAX_SIZE: usize = 1024 * 1024 * 1024;

    /// Create a new named shared memory region.
    ///
    /// # Arguments
    /// * `name` - Name of the shared memory object (will be prefixed with /)
    /// * `size` - Size in bytes (must be between MIN_SIZE and MAX_SIZE)
    ///
    /// # Errors
    /// Returns SharedMemoryError if creation or mapping fails.
    pub fn create(name: &str, size: usize) -> Result<Self, SharedMemoryError> {
        Self::check_size(name, size)?;

        if name.is_empty() {
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                reason: "Name cannot be empty".to_string(),
            });
        }

        let c_name = Self::c_name(name)?;

        // SAFETY: c_name is a valid CString, flags are valid POSIX flags
        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_RDWR | libc::O_EXCL,
                0o600,
            )
        };

        if fd < 0 {
            let errno = std::io::Error::last_os_error();
            if errno.raw_os_error() == Some(libc::EEXIST) {
                return Err(SharedMemoryError::CreateFailed {
                    name: name.to_string(),
                    reason: "Shared memory already exists".to_string(),
                });
            }
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                reason: format!("shm_open failed: {}", errno),
            });
        }

        // SAFETY: fd is a valid file descriptor
        let result = unsafe { libc::ftruncate(fd, size as libc::off_t) };
        if result < 0 {
            let errno = std::io::Error::last_os_error();
            // SAFETY: fd and c_name are the object we just created
            unsafe {
                libc::close(fd);
                libc::shm_unlink(c_name.as_ptr());
            }
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                reason: format!("ftruncate failed: {}", errno),
            });
        }

        let ptr = match Self::map(fd, size) {
            Ok(ptr) => ptr,
            Err(e) => {
                // SAFETY: fd and c_name are the object we just created
                unsafe {
                    libc::close(fd);
                    libc::shm_unlink(c_name.as_ptr());
                }
                return Err(e);
            }
        };

        // A fresh shm object is zero-filled by ftruncate; write anyway so the
        // pages are faulted in before the first notification.
        // SAFETY: ptr is valid for size bytes
        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0, size);
        }

        tracing::debug!(name = %name, size = size, "Created shared memory region");

        Ok(Self {
            name: name.to_string(),
            ptr,
            size,
            backing: Backing::Named { fd, is_owner: true },
        })
    }

    /// Open an existing named shared memory region.
    ///
    /// The mapping size is taken from the shm object itself.
    pub fn open(name: &str) -> Result<Self, SharedMemoryError> {
        let c_name = Self::c_name(name)?;

        // SAFETY: c_name is a valid CString
        let fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, 0) };

        if fd < 0 {
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                reason: format!("shm_open failed: {}", std::io::Error::last_os_error()),
            });
        }

        // SAFETY: an all-zero stat is a valid value to be overwritten by fstat
        let mut stat: libc::stat = unsafe { std::mem::zeroed() };
        // SAFETY: fd is valid and stat is a properly sized out-parameter
        if unsafe { libc::fstat(fd, &mut stat) } < 0 {
            let errno = std::io::Error::last_os_error();
            // SAFETY: fd was opened above
            unsafe { libc::close(fd) };
            return Err(SharedMemoryError::MapFailed {
                reason: format!("fstat failed: {}", errno),
            });
        }

        let size = stat.st_size as usize;
        if let Err(e) = Self::check_size(name, size) {
            // SAFETY: fd was opened above
            unsafe { libc::close(fd) };
            return Err(e);
        }

        let ptr = match Self::map(fd, size) {
            Ok(ptr) => ptr,
            Err(e) => {
                // SAFETY: fd was opened above
                unsafe { libc::close(fd) };
                return Err(e);
            }
        };

        tracing::debug!(name = %name, size = size, "Opened shared memory region");

        Ok(Self {
            name: name.to_string(),
            ptr,
            size,
            backing: Backing::Named {
                fd,
                is_owner: false,
            },
        })
    }

    /// Create an unnamed shared mapping.
    ///
    /// The memory is shared with threads of this process and with children
    /// forked after the call, but cannot be opened by name.
    pub fn anonymous(size: usize) -> Result<Self, SharedMemoryError> {
        Self::check_size("<anonymous>", size)?;

        // SAFETY: anonymous mapping with valid size, no fd involved
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(SharedMemoryError::MapFailed {
                reason: format!("mmap failed: {}", std::io::Error::last_os_error()),
            });
        }

        let ptr = NonNull::new(ptr as *mut u8).ok_or_else(|| SharedMemoryError::MapFailed {
            reason: "mmap returned null".to_string(),
        })?;

        tracing::trace!(size = size, "Mapped anonymous shared region");

        Ok(Self {
            name: String::from("<anonymous>"),
            ptr,
            size,
            backing: Backing::Anonymous,
        })
    }

    /// Remove a named shm object left behind by a crashed owner.
    ///
    /// Returns `true` if an object was removed.
    pub fn unlink(name: &str) -> Result<bool, SharedMemoryError> {
        let c_name = Self::c_name(name)?;
        // SAFETY: c_name is a valid CString
        let result = unsafe { libc::shm_unlink(c_name.as_ptr()) };
        Ok(result == 0)
    }

    fn check_size(name: &str, size: usize) -> Result<(), SharedMemoryError> {
        if size < Self::MIN_SIZE {
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                reason: format!("Size {} is below minimum {}", size, Self::MIN_SIZE),
            });
        }
        if size > Self::MAX_SIZE {
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                reason: format!("Size {} exceeds maximum {}", size, Self::MAX_SIZE),
            });
        }
        Ok(())
    }

    fn c_name(name: &str) -> Result<CString, SharedMemoryError> {
        CString::new(format!("/{}", name)).map_err(|e| SharedMemoryError::CreateFailed {
            name: name.to_string(),
            reason: format!("Invalid name: {}", e),
        })
    }

    fn map(fd: i32, size: usize) -> Result<NonNull<u8>, SharedMemoryError> {
        // SAFETY: fd is valid, size is validated, offset 0 is valid
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(SharedMemoryError::MapFailed {
                reason: format!("mmap failed: {}", std::io::Error::last_os_error()),
            });
        }

        NonNull::new(ptr as *mut u8).ok_or_else(|| SharedMemoryError::MapFailed {
            reason: "mmap returned null".to_string(),
        })
    }

    /// Get the name of this shared memory region.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the size of this shared memory region.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether this region can be opened by name from another process.
    pub fn is_named(&self) -> bool {
        matches!(self.backing, Backing::Named { .. })
    }

    /// Get a raw pointer to the shared memory.
    ///
    /// The mapping is page aligned. Callers must ensure proper
    /// synchronization when accessing the memory.
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for SharedMemoryRegion {
    fn drop(&mut self) {
        // SAFETY: ptr and size were set during creation
        let result = unsafe { libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.size) };
        if result < 0 {
            tracing::error!(
                name = %self.name,
                error = %std::io::Error::last_os_error(),
                "Failed to unmap shared memory"
            );
        }

        if let Backing::Named { fd, is_owner } = self.backing {
            // SAFETY: fd was opened during creation
            unsafe { libc::close(fd) };

            if is_owner {
                if let Ok(c_name) = Self::c_name(&self.name) {
                    // SAFETY: c_name is a valid CString
                    unsafe { libc::shm_unlink(c_name.as_ptr()) };
                    tracing::debug!(name = %self.name, "Unlinked shared memory region");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique(prefix: &str) -> String {
        format!("{}-{}", prefix, std::process::id())
    }

    #[test]
    fn test_shm_size_validation() {
        assert!(SharedMemoryRegion::create("test-small", 100).is_err());
        assert!(
            SharedMemoryRegion::create("test-large", SharedMemoryRegion::MAX_SIZE + 1).is_err()
        );
        assert!(SharedMemoryRegion::anonymous(100).is_err());
    }

    #[test]
    fn test_shm_empty_name() {
        assert!(SharedMemoryRegion::create("", 4096).is_err());
    }

    #[test]
    fn test_anonymous_region_is_zeroed() {
        let region = SharedMemoryRegion::anonymous(4096).unwrap();
        assert!(!region.is_named());
        // SAFETY: region is 4096 bytes and exclusively ours
        let bytes = unsafe { std::slice::from_raw_parts(region.as_ptr(), region.size()) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_open_sees_creator_writes() {
        let name = unique("region-open");
        let owner = SharedMemoryRegion::create(&name, 8192).unwrap();
        // SAFETY: first byte is inside the mapping
        unsafe { *owner.as_ptr() = 0x5a };

        let peer = SharedMemoryRegion::open(&name).unwrap();
        assert_eq!(peer.size(), 8192);
        // SAFETY: first byte is inside the mapping
        assert_eq!(unsafe { *peer.as_ptr() }, 0x5a);
    }

    #[test]
    fn test_create_twice_fails() {
        let name = unique("region-twice");
        let _owner = SharedMemoryRegion::create(&name, 4096).unwrap();
        assert!(SharedMemoryRegion::create(&name, 4096).is_err());
    }

    #[test]
    fn test_owner_drop_unlinks() {
        let name = unique("region-unlink");
        drop(SharedMemoryRegion::create(&name, 4096).unwrap());
        assert!(SharedMemoryRegion::open(&name).is_err());
    }
}
