//! Per-process counters sysinfo does not expose: thread count, handle count
//! and private (non-shared) bytes.

use crate::core::process_monitor::{FieldError, FieldResult};

pub struct ProcessExtras {
    pub thread_count: FieldResult<u32>,
    pub handle_count: FieldResult<u32>,
    pub private_bytes: FieldResult<u64>,
}

impl ProcessExtras {
    fn unavailable(error: FieldError) -> Self {
        Self {
            thread_count: Err(error.clone()),
            handle_count: Err(error.clone()),
            private_bytes: Err(error),
        }
    }
}

/// Thread counts for every process, captured in one pass per enumeration.
///
/// Only Windows needs this: elsewhere the count is read per process.
#[derive(Debug, Default)]
pub struct ThreadCounts {
    #[cfg(windows)]
    counts: Option<std::collections::HashMap<u32, u32>>,
}

impl ThreadCounts {
    #[cfg(windows)]
    pub fn capture() -> Self {
        use std::collections::HashMap;
        use std::mem;
        use windows_sys::Win32::Foundation::{CloseHandle, INVALID_HANDLE_VALUE};
        use windows_sys::Win32::System::Diagnostics::ToolHelp::{
            CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
            TH32CS_SNAPPROCESS,
        };

        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
            if snapshot == INVALID_HANDLE_VALUE {
                log::debug!("Toolhelp32 process snapshot failed");
                return Self { counts: None };
            }

            let mut counts = HashMap::new();
            let mut entry: PROCESSENTRY32W = mem::zeroed();
            entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

            if Process32FirstW(snapshot, &mut entry) != 0 {
                loop {
                    counts.insert(entry.th32ProcessID, entry.cntThreads);
                    if Process32NextW(snapshot, &mut entry) == 0 {
                        break;
                    }
                }
            }

            CloseHandle(snapshot);
            Self {
                counts: Some(counts),
            }
        }
    }

    #[cfg(not(windows))]
    pub fn capture() -> Self {
        Self::default()
    }

    #[cfg(windows)]
    fn get(&self, pid: u32) -> FieldResult<u32> {
        match &self.counts {
            Some(counts) => counts.get(&pid).copied().ok_or(FieldError::Exited),
            None => Err(FieldError::Os("process snapshot unavailable".to_string())),
        }
    }
}

#[cfg(target_os = "linux")]
fn field_error(err: std::io::Error) -> FieldError {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => FieldError::AccessDenied,
        std::io::ErrorKind::NotFound => FieldError::Exited,
        _ => FieldError::Os(err.to_string()),
    }
}

/// Value of a `/proc/<pid>/status` line such as `Threads:\t4`.
#[cfg(target_os = "linux")]
fn status_value(status: &str, key: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}

#[cfg(target_os = "linux")]
pub fn read_extras(pid: u32, _threads: &ThreadCounts) -> ProcessExtras {
    use std::fs;

    let status = match fs::read_to_string(format!("/proc/{}/status", pid)) {
        Ok(status) => status,
        Err(e) => return ProcessExtras::unavailable(field_error(e)),
    };

    let thread_count = status_value(&status, "Threads:")
        .map(|n| n as u32)
        .ok_or(FieldError::Unsupported);

    // Kernel threads have no RssAnon line
    let private_bytes = status_value(&status, "RssAnon:")
        .map(|kb| kb * 1024)
        .ok_or(FieldError::Unsupported);

    let handle_count = fs::read_dir(format!("/proc/{}/fd", pid))
        .map(|entries| entries.count() as u32)
        .map_err(field_error);

    ProcessExtras {
        thread_count,
        handle_count,
        private_bytes,
    }
}

#[cfg(windows)]
pub fn read_extras(pid: u32, threads: &ThreadCounts) -> ProcessExtras {
    use std::mem;
    use windows_sys::Win32::Foundation::CloseHandle;
    use windows_sys::Win32::System::ProcessStatus::{
        K32GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS, PROCESS_MEMORY_COUNTERS_EX,
    };
    use windows_sys::Win32::System::Threading::{
        GetProcessHandleCount, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    };

    let thread_count = threads.get(pid);

    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
        if handle.is_null() {
            // The snapshot needs no process handle, so threads survive a denied open
            return ProcessExtras {
                thread_count,
                ..ProcessExtras::unavailable(FieldError::AccessDenied)
            };
        }

        let mut count: u32 = 0;
        let handle_count = if GetProcessHandleCount(handle, &mut count) != 0 {
            Ok(count)
        } else {
            Err(FieldError::AccessDenied)
        };

        let mut counters: PROCESS_MEMORY_COUNTERS_EX = mem::zeroed();
        counters.cb = mem::size_of::<PROCESS_MEMORY_COUNTERS_EX>() as u32;
        let private_bytes = if K32GetProcessMemoryInfo(
            handle,
            &mut counters as *mut PROCESS_MEMORY_COUNTERS_EX as *mut PROCESS_MEMORY_COUNTERS,
            counters.cb,
        ) != 0
        {
            Ok(counters.PrivateUsage as u64)
        } else {
            Err(FieldError::AccessDenied)
        };

        CloseHandle(handle);

        ProcessExtras {
            thread_count,
            handle_count,
            private_bytes,
        }
    }
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn read_extras(_pid: u32, _threads: &ThreadCounts) -> ProcessExtras {
    ProcessExtras::unavailable(FieldError::Unsupported)
}
