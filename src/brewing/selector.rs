use crate::rapt::{
    models::{Device, DeviceType},
    RaptError,
};

/// Device categories tried, in order, when no device matches the target
/// hardware address.
pub const PRIORITY: [DeviceType; 5] = [
    DeviceType::BleTemperature,
    DeviceType::TemperatureController,
    DeviceType::FermentationChamber,
    DeviceType::Hydrometer,
    DeviceType::BrewZilla,
];

/// Pick the device to read from.
///
/// 1. A device whose hardware address equals `target_mac` exactly.
/// 2. Otherwise the first listed device of the earliest category in
///    [`PRIORITY`] that has any device at all.
pub fn select_device<'a>(
    devices: &'a [Device],
    target_mac: Option<&str>,
) -> Result<&'a Device, RaptError> {
    if devices.is_empty() {
        return Err(RaptError::NoDevices);
    }
    candidates(devices, target_mac)
        .into_iter()
        .next()
        .ok_or(RaptError::NoMatchingDevice)
}

/// Every device worth trying, best first: the selected device, then the
/// remaining priority-category devices in priority order. Each device appears
/// at most once, so walking this list is the single fallback pass.
pub fn candidates<'a>(devices: &'a [Device], target_mac: Option<&str>) -> Vec<&'a Device> {
    let mut out: Vec<&Device> = Vec::new();

    if let Some(mac) = target_mac {
        if let Some(device) = devices
            .iter()
            .find(|d| d.mac_address.as_deref() == Some(mac))
        {
            out.push(device);
        }
    }

    for category in &PRIORITY {
        for device in devices.iter().filter(|d| &d.device_type == category) {
            if !out.iter().any(|seen| std::ptr::eq(*seen, device)) {
                out.push(device);
            }
        }
    }

    out
}
