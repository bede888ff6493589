// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Process-shared futex wait/wake on a 32-bit word.
//!
//! The word lives in a `MAP_SHARED` mapping, so the non-private futex
//! operations are used: the kernel keys the wait queue on the backing page,
//! which makes wakes visible across every process mapping the segment.

use std::sync::atomic::AtomicU32;
use std::time::Duration;

/// Block while `*word == expected`, for at most `timeout`.
///
/// Returns on wake, timeout, signal interruption or when the word already
/// differs. Callers must re-check their condition in every case.
#[cfg(target_os = "linux")]
pub(crate) fn wait(word: &AtomicU32, expected: u32, timeout: Option<Duration>) {
    let ts = timeout.map(|t| libc::timespec {
        tv_sec: t.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
        tv_nsec: t.subsec_nanos() as libc::c_long,
    });
    let ts_ptr = ts
        .as_ref()
        .map_or(std::ptr::null(), |ts| ts as *const libc::timespec);

    // SAFETY: word points to a live, 4-byte aligned u32; ts_ptr is null or
    // points to a timespec that outlives the call.
    let rc = unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAIT,
            expected,
            ts_ptr,
            std::ptr::null::<u32>(),
            0u32,
        )
    };

    if rc < 0 {
        let errno = std::io::Error::last_os_error();
        match errno.raw_os_error() {
            Some(libc::ETIMEDOUT) | Some(libc::EAGAIN) | Some(libc::EINTR) => {}
            _ => tracing::warn!(error = %errno, "futex wait failed"),
        }
    }
}

/// Wake every thread blocked on `word`.
#[cfg(target_os = "linux")]
pub(crate) fn wake_all(word: &AtomicU32) {
    // SAFETY: word points to a live, 4-byte aligned u32
    let rc = unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAKE,
            i32::MAX,
            std::ptr::null::<libc::timespec>(),
            std::ptr::null::<u32>(),
            0u32,
        )
    };

    if rc < 0 {
        tracing::warn!(error = %std::io::Error::last_os_error(), "futex wake failed");
    }
}

// Without futexes there is no kernel wait queue keyed on shared memory, so
// waiters park in short sleeps and re-read the word.
#[cfg(not(target_os = "linux"))]
const FALLBACK_TICK: Duration = Duration::from_micros(200);

#[cfg(not(target_os = "linux"))]
pub(crate) fn wait(word: &AtomicU32, expected: u32, timeout: Option<Duration>) {
    use std::sync::atomic::Ordering;

    if word.load(Ordering::SeqCst) != expected {
        return;
    }
    let tick = timeout.map_or(FALLBACK_TICK, |t| t.min(FALLBACK_TICK));
    std::thread::sleep(tick);
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn wake_all(_word: &AtomicU32) {}
