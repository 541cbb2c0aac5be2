//! `/dev/hidgN` - the HID function's character device.
//!
//! The f_hid gadget driver turns each `write` into one interrupt-IN
//! report, so every keyboard report is exactly one 8-byte write.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use super::sink::ReportChannel;
use crate::error::{ChannelError, Error, Result};
use crate::hid::keyboard::KEYBOARD_REPORT_SIZE;

/// Write-only handle on the gadget's HID device node.
pub struct HidgDevice {
    path: PathBuf,
    file: File,
}

impl HidgDevice {
    /// Open `path` for writing. Failure is startup-fatal.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|source| Error::ChannelUnavailable {
                path: path.clone(),
                source,
            })?;
        info!("HID device {} opened", path.display());
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportChannel for HidgDevice {
    fn write_report(&mut self, report: &[u8; KEYBOARD_REPORT_SIZE]) -> Result<(), ChannelError> {
        let written = self.file.write(report)?;
        if written != KEYBOARD_REPORT_SIZE {
            return Err(ChannelError::ShortWrite {
                written,
                expected: KEYBOARD_REPORT_SIZE,
            });
        }
        Ok(())
    }
}
