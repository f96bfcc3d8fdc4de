//! Facts about the hardware token (e.g. a YubiKey) that generated the request key.

use serde::{Deserialize, Serialize};

use crate::models::request::NameValue;

/// Attested hardware-token facts, exposed to templates as the `yk` namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HardwareTokenObject {
    pub serial_number: String,
    pub firmware_version: String,
    pub form_factor: String,
    pub slot: String,
    pub pin_policy: String,
    pub touch_policy: String,
}

impl HardwareTokenObject {
    /// Token values keyed by the names templates refer to, e.g. `{yk:SerialNumber}`.
    pub fn attributes(&self) -> Vec<NameValue> {
        vec![
            ("SerialNumber".into(), self.serial_number.clone()),
            ("FirmwareVersion".into(), self.firmware_version.clone()),
            ("FormFactor".into(), self.form_factor.clone()),
            ("Slot".into(), self.slot.clone()),
            ("PinPolicy".into(), self.pin_policy.clone()),
            ("TouchPolicy".into(), self.touch_policy.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_expose_every_field() {
        let token = HardwareTokenObject {
            serial_number: "12345678".into(),
            firmware_version: "5.4.3".into(),
            form_factor: "UsbAKeychain".into(),
            slot: "9a".into(),
            pin_policy: "Once".into(),
            touch_policy: "Never".into(),
        };
        let attrs = token.attributes();
        assert_eq!(attrs.len(), 6);
        assert!(attrs.contains(&("SerialNumber".into(), "12345678".into())));
        assert!(attrs.contains(&("Slot".into(), "9a".into())));
    }
}
