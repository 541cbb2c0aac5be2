//! USB HID gadget provisioning through configfs.
//!
//! Builds a composite gadget with one boot-protocol keyboard function:
//!
//! ```text
//! <configfs>/<name>/
//!   idVendor idProduct bcdDevice bcdUSB UDC
//!   strings/0x409/{serialnumber,manufacturer,product}
//!   configs/c.1/{MaxPower,strings/0x409/configuration,hid.usb0 -> functions/hid.usb0}
//!   functions/hid.usb0/{protocol,subclass,report_length,report_desc}
//! ```
//!
//! and binds it to a USB device controller. Once bound, the kernel
//! exposes the function as `/dev/hidgN`.

use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::GadgetSettings;
use crate::error::{Error, Result};
use crate::hid::keyboard::{KEYBOARD_REPORT_DESCRIPTOR, KEYBOARD_REPORT_SIZE};

/// US English string table.
const LANG_EN_US: &str = "0x409";
const CONFIG_DIR: &str = "configs/c.1";
const FUNCTION_NAME: &str = "hid.usb0";

/// HID interface protocol: keyboard.
const HID_PROTOCOL_KEYBOARD: u8 = 1;
/// HID interface subclass: boot interface.
const HID_SUBCLASS_BOOT: u8 = 1;

/// What [`provision`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provisioned {
    /// The gadget was created and bound to the named controller.
    Bound { udc: String },
    /// The gadget was already bound; nothing was touched.
    AlreadyBound { udc: String },
}

fn write_attr(path: &Path, value: impl AsRef<[u8]>) -> Result<()> {
    debug!("Gadget: {} <- {} bytes", path.display(), value.as_ref().len());
    fs::write(path, value).map_err(|source| Error::Gadget {
        path: path.to_path_buf(),
        source,
    })
}

fn make_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| Error::Gadget {
        path: path.to_path_buf(),
        source,
    })
}

fn hex16(value: u16) -> String {
    format!("0x{value:04x}")
}

/// Name of the controller the gadget is bound to, if any.
pub fn bound_udc(gadget: &Path) -> Option<String> {
    let udc = fs::read_to_string(gadget.join("UDC")).ok()?;
    let udc = udc.trim();
    (!udc.is_empty()).then(|| udc.to_string())
}

/// First controller listed in `class_dir` (`/sys/class/udc`).
pub fn find_udc(class_dir: &Path) -> Result<String> {
    let entries = fs::read_dir(class_dir).map_err(|_| Error::NoUdc(class_dir.to_path_buf()))?;
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoUdc(class_dir.to_path_buf()))
}

/// Directory of the gadget described by `settings`.
pub fn gadget_dir(settings: &GadgetSettings) -> PathBuf {
    settings.configfs_root.join(&settings.name)
}

/// Create (or reuse) the gadget tree and bind it to a controller.
pub fn provision(settings: &GadgetSettings) -> Result<Provisioned> {
    let gadget = gadget_dir(settings);

    if let Some(udc) = bound_udc(&gadget) {
        info!("Gadget {} already bound to {}", gadget.display(), udc);
        return Ok(Provisioned::AlreadyBound { udc });
    }

    // Device descriptor
    make_dir(&gadget)?;
    write_attr(&gadget.join("idVendor"), hex16(settings.vendor_id))?;
    write_attr(&gadget.join("idProduct"), hex16(settings.product_id))?;
    write_attr(&gadget.join("bcdDevice"), hex16(settings.bcd_device))?;
    write_attr(&gadget.join("bcdUSB"), hex16(settings.bcd_usb))?;

    let strings = gadget.join("strings").join(LANG_EN_US);
    make_dir(&strings)?;
    write_attr(&strings.join("serialnumber"), &settings.serial_number)?;
    write_attr(&strings.join("manufacturer"), &settings.manufacturer)?;
    write_attr(&strings.join("product"), &settings.product)?;

    // Configuration
    let config = gadget.join(CONFIG_DIR);
    let config_strings = config.join("strings").join(LANG_EN_US);
    make_dir(&config_strings)?;
    write_attr(&config_strings.join("configuration"), &settings.configuration)?;
    write_attr(&config.join("MaxPower"), settings.max_power_ma.to_string())?;

    // HID function
    let function = gadget.join("functions").join(FUNCTION_NAME);
    make_dir(&function)?;
    write_attr(&function.join("protocol"), HID_PROTOCOL_KEYBOARD.to_string())?;
    write_attr(&function.join("subclass"), HID_SUBCLASS_BOOT.to_string())?;
    write_attr(&function.join("report_length"), KEYBOARD_REPORT_SIZE.to_string())?;
    write_attr(&function.join("report_desc"), KEYBOARD_REPORT_DESCRIPTOR)?;

    let link = config.join(FUNCTION_NAME);
    match symlink(&function, &link) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            debug!("Gadget: {} already linked", link.display());
        }
        Err(source) => return Err(Error::Gadget { path: link, source }),
    }

    // Bind
    let udc = match &settings.udc {
        Some(udc) => udc.clone(),
        None => find_udc(&settings.udc_class_dir)?,
    };
    write_attr(&gadget.join("UDC"), &udc)?;

    info!("USB gadget {} bound to {}", gadget.display(), udc);
    Ok(Provisioned::Bound { udc })
}
