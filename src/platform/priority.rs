use crate::core::process_monitor::PriorityLevel;
use crate::error::{MonitorError, Result};

#[cfg(unix)]
pub fn set_priority(pid: u32, level: PriorityLevel) -> Result<()> {
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, pid as libc::id_t, level.nice_value()) };
    if rc == 0 {
        return Ok(());
    }

    let err = std::io::Error::last_os_error();
    Err(match err.raw_os_error() {
        Some(libc::ESRCH) => MonitorError::ProcessNotFound(pid),
        // Raising priority needs CAP_SYS_NICE
        Some(libc::EPERM) | Some(libc::EACCES) => MonitorError::access_denied(format!(
            "cannot set priority of process {} to {}: {}",
            pid, level, err
        )),
        _ => MonitorError::Io(err),
    })
}

#[cfg(windows)]
pub fn set_priority(pid: u32, level: PriorityLevel) -> Result<()> {
    use windows_sys::Win32::Foundation::CloseHandle;
    use windows_sys::Win32::System::Threading::{
        OpenProcess, SetPriorityClass, ABOVE_NORMAL_PRIORITY_CLASS, BELOW_NORMAL_PRIORITY_CLASS,
        HIGH_PRIORITY_CLASS, IDLE_PRIORITY_CLASS, NORMAL_PRIORITY_CLASS, PROCESS_SET_INFORMATION,
        REALTIME_PRIORITY_CLASS,
    };

    let class = match level {
        PriorityLevel::Idle => IDLE_PRIORITY_CLASS,
        PriorityLevel::BelowNormal => BELOW_NORMAL_PRIORITY_CLASS,
        PriorityLevel::Normal => NORMAL_PRIORITY_CLASS,
        PriorityLevel::AboveNormal => ABOVE_NORMAL_PRIORITY_CLASS,
        PriorityLevel::High => HIGH_PRIORITY_CLASS,
        PriorityLevel::Realtime => REALTIME_PRIORITY_CLASS,
    };

    unsafe {
        let handle = OpenProcess(PROCESS_SET_INFORMATION, 0, pid);
        if handle.is_null() {
            return Err(MonitorError::from_os(pid, std::io::Error::last_os_error()));
        }

        let ok = SetPriorityClass(handle, class) != 0;
        let err = std::io::Error::last_os_error();
        CloseHandle(handle);

        if ok {
            Ok(())
        } else {
            Err(MonitorError::from_os(pid, err))
        }
    }
}

#[cfg(not(any(unix, windows)))]
pub fn set_priority(_pid: u32, _level: PriorityLevel) -> Result<()> {
    Err(MonitorError::unsupported("process priorities"))
}
