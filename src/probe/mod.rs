//! Contains logic for reading user-presence signals from different
//! environments. [GenericActivityProbe] is the main artifact of this module
//! that abstracts the operations.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

use anyhow::Result;

/// Intended to serve as a contract windows and linux systems must implement.
/// Every query is synchronous and bounded; callers downgrade failures to
/// "no signal" instead of propagating them.
#[cfg_attr(test, mockall::automock)]
pub trait ActivityProbe {
    /// Retrieve amount of time user has been inactive in milliseconds.
    fn idle_time(&mut self) -> Result<u32>;

    /// Whether the workstation is currently locked or the screensaver is on.
    fn is_locked(&mut self) -> Result<bool>;

    /// Current pointer position, used to detect movement between polls.
    fn pointer_position(&mut self) -> Result<(i32, i32)>;
}

/// Serves as a cross-compatible ActivityProbe implementation.
pub struct GenericActivityProbe {
    inner: Box<dyn ActivityProbe>,
}

impl GenericActivityProbe {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsProbe;
                Ok(Self {
                    inner: Box::new(WindowsProbe::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::X11Probe;
                Ok(Self {
                    inner: Box::new(X11Probe::new()?),
                })
            }
            else {
                // This runtime error is needed to allow the project to be compiled for during testing.
                unimplemented!("No activity probe was specified")
            }
        }
    }
}

impl ActivityProbe for GenericActivityProbe {
    fn idle_time(&mut self) -> Result<u32> {
        self.inner.idle_time()
    }

    fn is_locked(&mut self) -> Result<bool> {
        self.inner.is_locked()
    }

    fn pointer_position(&mut self) -> Result<(i32, i32)> {
        self.inner.pointer_position()
    }
}
