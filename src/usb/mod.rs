//! USB side - the gadget that presents a keyboard to the host, and the
//! sink that writes keyboard reports to it.
//!
//! - [`gadget`]: one-time configfs provisioning (device identity, HID
//!   function with the keyboard report descriptor, UDC binding)
//! - [`hidg`]: the `/dev/hidgN` node the bound function exposes
//! - [`sink`]: ordered, timed, lock-protected burst writes

pub mod gadget;
pub mod hidg;
pub mod sink;
