//! Application-wide defaults and runtime settings.
//!
//! All device paths, pin assignments, timing parameters and gadget
//! identity values have a compile-time default here; a TOML file can
//! override any of them (see [`Settings`]).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::hid::encoder::MAX_SEQUENCE_LEN;
use crate::hid::keycodes;
use crate::input::debounce::DebouncePolicy;

// Report channel

/// HID gadget device node written by the report sink.
pub const HID_DEVICE_PATH: &str = "/dev/hidg0";

/// Time a key is held down before its release report (ms).
pub const PRESS_HOLD_MS: u64 = 50;

/// Pause after a release before the next press (ms).
pub const KEY_GAP_MS: u64 = 0;

// Input lines
//
//   Line 0 → /dev/gpiochip0, offset 16 (BCM GPIO16 on a Raspberry Pi),
//            falling edge, internal pull-up.

pub const GPIO_CHIP_PATH: &str = "/dev/gpiochip0";
pub const GPIO_LINE_OFFSET: u32 = 16;

/// Debounce window (ms).
pub const DEBOUNCE_WINDOW_MS: u64 = 2000;

/// Text typed when the default line triggers.
pub const DEFAULT_TEXT: &str = "abc";

/// Maximum number of input lines one pipeline serves.
pub const MAX_LINES: usize = 8;

/// Consumer label attached to requested GPIO lines.
pub const GPIO_CONSUMER: &str = "gpio2hid";

// USB gadget

pub const CONFIGFS_GADGET_ROOT: &str = "/sys/kernel/config/usb_gadget";
pub const UDC_CLASS_DIR: &str = "/sys/class/udc";
pub const GADGET_NAME: &str = "kb";

/// Linux Foundation / Multifunction Composite Gadget.
pub const USB_VID: u16 = 0x1d6b;
pub const USB_PID: u16 = 0x0104;
pub const USB_BCD_DEVICE: u16 = 0x0100;
pub const USB_BCD_USB: u16 = 0x0200;

pub const USB_MANUFACTURER: &str = "me";
pub const USB_PRODUCT: &str = "kb";
pub const USB_SERIAL_NUMBER: &str = "90898c2300000100";
pub const USB_CONFIGURATION: &str = "Config 1: HID keyboard";

/// Bus power requested from the host (mA).
pub const USB_MAX_POWER_MA: u16 = 250;

/// Which transitions of a line produce edge events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    Rising,
    #[default]
    Falling,
    Both,
}

/// Line bias resistor state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BiasSetting {
    /// Leave whatever the kernel/device tree configured.
    AsIs,
    #[default]
    PullUp,
    PullDown,
    Disabled,
}

/// Complete daemon configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub device: DeviceSettings,
    pub gadget: GadgetSettings,
    #[serde(rename = "line")]
    pub lines: Vec<LineSettings>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceSettings {
    pub path: PathBuf,
    pub press_hold_ms: u64,
    pub key_gap_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GadgetSettings {
    /// Provision the gadget through configfs before opening the device.
    pub enabled: bool,
    pub configfs_root: PathBuf,
    pub udc_class_dir: PathBuf,
    /// Controller to bind to; the first one found when unset.
    pub udc: Option<String>,
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub bcd_device: u16,
    pub bcd_usb: u16,
    pub manufacturer: String,
    pub product: String,
    pub serial_number: String,
    pub configuration: String,
    pub max_power_ma: u16,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineSettings {
    /// Label used in logs.
    pub name: String,
    pub chip: PathBuf,
    pub offset: u32,
    pub edge: EdgeKind,
    pub bias: BiasSetting,
    pub policy: DebouncePolicy,
    pub window_ms: u64,
    pub text: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device: DeviceSettings::default(),
            gadget: GadgetSettings::default(),
            lines: vec![LineSettings::default()],
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(HID_DEVICE_PATH),
            press_hold_ms: PRESS_HOLD_MS,
            key_gap_ms: KEY_GAP_MS,
        }
    }
}

impl Default for GadgetSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            configfs_root: PathBuf::from(CONFIGFS_GADGET_ROOT),
            udc_class_dir: PathBuf::from(UDC_CLASS_DIR),
            udc: None,
            name: GADGET_NAME.into(),
            vendor_id: USB_VID,
            product_id: USB_PID,
            bcd_device: USB_BCD_DEVICE,
            bcd_usb: USB_BCD_USB,
            manufacturer: USB_MANUFACTURER.into(),
            product: USB_PRODUCT.into(),
            serial_number: USB_SERIAL_NUMBER.into(),
            configuration: USB_CONFIGURATION.into(),
            max_power_ma: USB_MAX_POWER_MA,
        }
    }
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            name: "line0".into(),
            chip: PathBuf::from(GPIO_CHIP_PATH),
            offset: GPIO_LINE_OFFSET,
            edge: EdgeKind::default(),
            bias: BiasSetting::default(),
            policy: DebouncePolicy::default(),
            window_ms: DEBOUNCE_WINDOW_MS,
            text: DEFAULT_TEXT.into(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or the built-in defaults when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from TOML text without validating them.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject configurations that could only fail later, at trigger time.
    pub fn validate(&self) -> Result<()> {
        if self.lines.is_empty() {
            return Err(Error::Config("at least one [[line]] is required".into()));
        }
        if self.lines.len() > MAX_LINES {
            return Err(Error::TooManyLines {
                count: self.lines.len(),
                max: MAX_LINES,
            });
        }
        for line in &self.lines {
            if line.window_ms == 0 {
                return Err(Error::InvalidDebounceConfig { window_ms: 0 });
            }
            if line.text.is_empty() {
                return Err(Error::Config(format!("line {:?} has no text", line.name)));
            }
            let len = line.text.chars().count();
            if len > MAX_SEQUENCE_LEN {
                return Err(Error::SequenceTooLong {
                    len,
                    max: MAX_SEQUENCE_LEN,
                });
            }
            for (index, symbol) in line.text.chars().enumerate() {
                keycodes::lookup(index, symbol)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_board() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.device.path, PathBuf::from("/dev/hidg0"));
        assert_eq!(settings.device.press_hold_ms, 50);
        assert_eq!(settings.lines.len(), 1);

        let line = &settings.lines[0];
        assert_eq!(line.offset, 16);
        assert_eq!(line.edge, EdgeKind::Falling);
        assert_eq!(line.policy, DebouncePolicy::Leading);
        assert_eq!(line.window_ms, 2000);
        assert_eq!(line.text, "abc");
    }

    #[test]
    fn parses_multi_line_file() {
        let raw = r#"
            [device]
            path = "/dev/hidg1"
            press_hold_ms = 30

            [gadget]
            enabled = false
            udc = "fe980000.usb"

            [[line]]
            name = "door"
            offset = 17
            edge = "both"
            bias = "pull-down"
            policy = "trailing"
            window_ms = 150
            text = "Door!\n"

            [[line]]
            name = "bell"
            text = "ring"
        "#;
        let settings = Settings::from_toml(raw).unwrap();
        settings.validate().unwrap();

        assert_eq!(settings.device.path, PathBuf::from("/dev/hidg1"));
        assert_eq!(settings.device.press_hold_ms, 30);
        assert_eq!(settings.device.key_gap_ms, KEY_GAP_MS);
        assert!(!settings.gadget.enabled);
        assert_eq!(settings.gadget.udc.as_deref(), Some("fe980000.usb"));
        assert_eq!(settings.gadget.vendor_id, USB_VID);

        assert_eq!(settings.lines.len(), 2);
        let door = &settings.lines[0];
        assert_eq!(door.edge, EdgeKind::Both);
        assert_eq!(door.bias, BiasSetting::PullDown);
        assert_eq!(door.policy, DebouncePolicy::Trailing);
        assert_eq!(door.text, "Door!\n");

        let bell = &settings.lines[1];
        assert_eq!(bell.offset, GPIO_LINE_OFFSET);
        assert_eq!(bell.window_ms, DEBOUNCE_WINDOW_MS);
    }

    #[test]
    fn rejects_unknown_keys() {
        let raw = "[device]\npth = \"/dev/hidg0\"\n";
        assert!(matches!(Settings::from_toml(raw), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_zero_window() {
        let mut settings = Settings::default();
        settings.lines[0].window_ms = 0;
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidDebounceConfig { window_ms: 0 })
        ));
    }

    #[test]
    fn rejects_untypeable_text() {
        let mut settings = Settings::default();
        settings.lines[0].text = "caf\u{e9}".into();
        assert!(matches!(
            settings.validate(),
            Err(Error::UnsupportedSymbol { symbol: '\u{e9}', index: 3 })
        ));

        settings.lines[0].text = "x".repeat(MAX_SEQUENCE_LEN + 1);
        assert!(matches!(settings.validate(), Err(Error::SequenceTooLong { .. })));
    }

    #[test]
    fn rejects_line_count_out_of_range() {
        let mut settings = Settings::default();
        settings.lines.clear();
        assert!(matches!(settings.validate(), Err(Error::Config(_))));

        settings.lines = vec![LineSettings::default(); MAX_LINES + 1];
        assert!(matches!(settings.validate(), Err(Error::TooManyLines { .. })));
    }
}
