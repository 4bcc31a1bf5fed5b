use std::collections::BTreeMap;
use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use devmux_client::{DeviceDescriptor, DeviceEvent};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_devices(devices: &BTreeMap<u64, DeviceDescriptor>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(devices).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "CONNECTION", "SERIAL"]);
            for descriptor in devices.values() {
                table.add_row(vec![
                    descriptor.device.device_id.to_string(),
                    descriptor.name.clone(),
                    descriptor.device.properties.connection_type.clone(),
                    serial_of(descriptor).to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for descriptor in devices.values() {
                println!(
                    "{} {} ({}, serial {})",
                    descriptor.device.device_id,
                    descriptor.name,
                    descriptor.device.properties.connection_type,
                    serial_of(descriptor)
                );
            }
        }
    }
}

#[derive(Serialize)]
struct EventOutput<'a> {
    event: &'a str,
    device_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    connection_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    serial_number: Option<&'a str>,
}

pub fn print_event(event: &DeviceEvent, format: OutputFormat) {
    let out = match event {
        DeviceEvent::Attached(record) => EventOutput {
            event: "attached",
            device_id: record.device_id,
            connection_type: Some(record.properties.connection_type.as_str()),
            serial_number: record.properties.serial_number.as_deref(),
        },
        DeviceEvent::Detached(device_id) => EventOutput {
            event: "detached",
            device_id: *device_id,
            connection_type: None,
            serial_number: None,
        },
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        // Event streams print one line per event in every human format;
        // tables are for the list command.
        OutputFormat::Table | OutputFormat::Pretty => match (out.connection_type, out.serial_number)
        {
            (Some(connection), Some(serial)) => println!(
                "{} device={} connection={} serial={}",
                out.event, out.device_id, connection, serial
            ),
            (Some(connection), None) => println!(
                "{} device={} connection={}",
                out.event, out.device_id, connection
            ),
            _ => println!("{} device={}", out.event, out.device_id),
        },
    }
}

fn serial_of(descriptor: &DeviceDescriptor) -> &str {
    descriptor
        .device
        .properties
        .serial_number
        .as_deref()
        .or(descriptor.device.properties.usb_serial_number.as_deref())
        .unwrap_or("-")
}
