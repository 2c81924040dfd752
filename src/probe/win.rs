use anyhow::Result;
use windows::Win32::{
    Foundation::POINT,
    System::SystemInformation::GetTickCount,
    UI::{
        Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO},
        WindowsAndMessaging::GetCursorPos,
    },
};

use super::ActivityProbe;

/// The lock screen hosts this process while the workstation is locked.
const LOGON_PROCESS: &str = "LogonUI.exe";

pub struct WindowsProbe;

impl WindowsProbe {
    pub fn new() -> Self {
        Self
    }
}

impl ActivityProbe for WindowsProbe {
    fn idle_time(&mut self) -> Result<u32> {
        let mut info = LASTINPUTINFO {
            cbSize: std::mem::size_of::<LASTINPUTINFO>() as u32,
            dwTime: 0,
        };
        unsafe { GetLastInputInfo(&mut info) }.ok()?;
        Ok(unsafe { GetTickCount() }.wrapping_sub(info.dwTime))
    }

    fn is_locked(&mut self) -> Result<bool> {
        let system = sysinfo::System::new_all();
        Ok(system
            .processes()
            .values()
            .any(|process| process.name().to_string_lossy().eq_ignore_ascii_case(LOGON_PROCESS)))
    }

    fn pointer_position(&mut self) -> Result<(i32, i32)> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }?;
        Ok((point.x, point.y))
    }
}
