use serde::{Deserialize, Serialize};

/// Tag under which device-list requests are issued.
pub const TAG_LIST_DEVICES: u32 = 0xbeef;
/// Tag under which through-connections are requested.
pub const TAG_CONNECT: u32 = 0xcafe;
/// Tag under which notification subscriptions are requested.
pub const TAG_LISTEN: u32 = 0xfeed;
/// Tag carried by lockdown replies and unsolicited daemon messages.
pub const TAG_SIDE_CHANNEL: u32 = 0;

/// TCP port of the lockdown configuration service on every device.
pub const LOCKDOWN_PORT: u16 = 62078;

/// Message kinds the daemon sends.
pub const MSG_ATTACHED: &str = "Attached";
pub const MSG_DETACHED: &str = "Detached";
pub const MSG_RESULT: &str = "Result";

/// A bare daemon request distinguished only by its message type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MuxRequest {
    pub message_type: String,
}

impl MuxRequest {
    /// Request the daemon's current device list.
    pub fn list_devices() -> Self {
        Self {
            message_type: "ListDevices".to_string(),
        }
    }

    /// Subscribe this connection to attach/detach notifications.
    pub fn listen() -> Self {
        Self {
            message_type: "Listen".to_string(),
        }
    }
}

/// Request a through-connection to a TCP port on a device.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectRequest {
    pub message_type: String,
    #[serde(rename = "DeviceID")]
    pub device_id: u64,
    /// Port in network byte order, as the daemon expects it.
    pub port_number: u16,
}

impl ConnectRequest {
    /// Connect to `port` on the device. Callers pass the plain host-order
    /// value; the byte swap happens here.
    pub fn new(device_id: u64, port: u16) -> Self {
        Self {
            message_type: "Connect".to_string(),
            device_id,
            port_number: port.to_be(),
        }
    }

    /// Connect to the device's lockdown service.
    pub fn lockdown(device_id: u64) -> Self {
        Self::new(device_id, LOCKDOWN_PORT)
    }
}

/// A lockdown `GetValue` query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertyQuery {
    pub key: String,
    pub request: String,
}

impl PropertyQuery {
    /// Ask the device for one named property.
    pub fn get_value(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            request: "GetValue".to_string(),
        }
    }
}

/// The daemon's reply to a request with no richer response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultRecord {
    pub message_type: String,
    pub number: i64,
}

impl ResultRecord {
    pub fn new(number: i64) -> Self {
        Self {
            message_type: MSG_RESULT.to_string(),
            number,
        }
    }

    /// Zero means the request was accepted.
    pub fn ok(&self) -> bool {
        self.number == 0
    }
}

/// One attached device, as reported in device lists and attach notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceRecord {
    #[serde(rename = "DeviceID")]
    pub device_id: u64,
    pub message_type: String,
    pub properties: DeviceProperties,
}

/// Per-device property bag. Which fields are present depends on the
/// transport: USB devices report bus details, network devices report their
/// Bonjour identity. Absence is normal, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceProperties {
    pub connection_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_speed: Option<i64>,
    #[serde(rename = "DeviceID", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<u64>,
    #[serde(rename = "LocationID", skip_serializing_if = "Option::is_none")]
    pub location_id: Option<i64>,
    #[serde(rename = "ProductID", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(rename = "USBSerialNumber", skip_serializing_if = "Option::is_none")]
    pub usb_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escaped_full_service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_address: Option<plist::Data>,
}

impl DeviceProperties {
    pub fn is_usb(&self) -> bool {
        self.connection_type == "USB"
    }
}

/// Container for the daemon's `ListDevices` reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceListResponse {
    pub device_list: Vec<DeviceRecord>,
}

/// Notification that a device has left the multiplexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetachRecord {
    pub message_type: String,
    #[serde(rename = "DeviceID")]
    pub device_id: u64,
}

/// A lockdown `GetValue` reply. The device echoes the key and request kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertyReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    pub value: String,
}

/// Probe used to discriminate unsolicited messages before a full decode.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageKind {
    pub message_type: String,
}
