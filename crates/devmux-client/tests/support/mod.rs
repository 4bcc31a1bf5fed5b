//! A scripted daemon for integration tests: binds a real unix socket and
//! speaks the wire protocol from the server side.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use devmux_transport::SocketStream;
use devmux_wire::{
    encode_lockdown, encode_mux, DeviceProperties, DeviceRecord, Envelope, HeaderCodec,
    StreamDecoder, MSG_ATTACHED,
};

/// A fresh socket path under a per-test scratch directory.
pub fn scratch_socket(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("devmux-{label}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join("daemon.sock")
}

/// One accepted client connection, seen from the daemon's side.
pub struct DaemonConn {
    stream: SocketStream,
    decoder: StreamDecoder,
    queue: VecDeque<Envelope>,
}

impl DaemonConn {
    pub fn new(stream: SocketStream) -> Self {
        Self {
            stream,
            decoder: StreamDecoder::new(HeaderCodec::Mux),
            queue: VecDeque::new(),
        }
    }

    /// Block until the client's next request frame arrives.
    pub fn read_request(&mut self) -> Envelope {
        loop {
            if let Some(envelope) = self.queue.pop_front() {
                return envelope;
            }
            let mut chunk = [0u8; 4096];
            let read = self.stream.read(&mut chunk).unwrap();
            assert!(read > 0, "client closed while a request was expected");
            self.queue.extend(self.decoder.process(&chunk[..read]).unwrap());
        }
    }

    pub fn send_mux<T: Serialize>(&mut self, msg: &T, tag: u32) {
        let frame = encode_mux(msg, tag).unwrap();
        self.stream.write_all(&frame).unwrap();
    }

    pub fn send_lockdown<T: Serialize>(&mut self, msg: &T) {
        let frame = encode_lockdown(msg).unwrap();
        self.stream.write_all(&frame).unwrap();
    }

    /// Write a frame in pieces with pauses in between, so the client sees
    /// it across several reads.
    pub fn send_mux_fragmented<T: Serialize>(&mut self, msg: &T, tag: u32, splits: &[usize]) {
        let frame = encode_mux(msg, tag).unwrap();
        self.write_fragmented(&frame, splits);
    }

    pub fn send_lockdown_fragmented<T: Serialize>(&mut self, msg: &T, splits: &[usize]) {
        let frame = encode_lockdown(msg).unwrap();
        self.write_fragmented(&frame, splits);
    }

    fn write_fragmented(&mut self, frame: &[u8], splits: &[usize]) {
        let mut rest = frame;
        for &len in splits {
            let (head, tail) = rest.split_at(len.min(rest.len()));
            self.stream.write_all(head).unwrap();
            self.stream.flush().unwrap();
            std::thread::sleep(Duration::from_millis(5));
            rest = tail;
        }
        self.stream.write_all(rest).unwrap();
    }

    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).unwrap();
    }

    /// After acknowledging a Connect, the daemon-side framing flips too.
    pub fn switch_to_lockdown(&mut self) {
        self.decoder.set_codec(HeaderCodec::Lockdown).unwrap();
    }
}

pub fn message_type(envelope: &Envelope) -> &str {
    envelope
        .body
        .as_dictionary()
        .and_then(|dict| dict.get("MessageType"))
        .and_then(plist::Value::as_string)
        .expect("request carries a MessageType")
}

pub fn requested_device(envelope: &Envelope) -> u64 {
    envelope
        .body
        .as_dictionary()
        .and_then(|dict| dict.get("DeviceID"))
        .and_then(plist::Value::as_unsigned_integer)
        .expect("request carries a DeviceID")
}

pub fn usb_device(device_id: u64) -> DeviceRecord {
    DeviceRecord {
        device_id,
        message_type: MSG_ATTACHED.to_string(),
        properties: DeviceProperties {
            connection_type: "USB".to_string(),
            connection_speed: Some(480_000_000),
            device_id: Some(device_id),
            location_id: Some(0x1410_0000),
            product_id: Some(0x12a8),
            serial_number: Some(format!("serial-{device_id}")),
            usb_serial_number: Some(format!("serial-{device_id}")),
            escaped_full_service_name: None,
            interface_index: None,
            network_address: None,
        },
    }
}

pub fn network_device(device_id: u64) -> DeviceRecord {
    // sockaddr_in blob: len, AF_INET, port, 192.168.1.50, zero padding.
    let sockaddr = vec![
        0x10, 0x02, 0x00, 0x00, 192, 168, 1, 50, 0, 0, 0, 0, 0, 0, 0, 0,
    ];
    DeviceRecord {
        device_id,
        message_type: MSG_ATTACHED.to_string(),
        properties: DeviceProperties {
            connection_type: "Network".to_string(),
            connection_speed: None,
            device_id: Some(device_id),
            location_id: None,
            product_id: None,
            serial_number: Some(format!("serial-{device_id}")),
            usb_serial_number: None,
            escaped_full_service_name: Some(format!(
                "serial-{device_id}._apple-mobdev2._tcp.local."
            )),
            interface_index: Some(5),
            network_address: Some(sockaddr.into()),
        },
    }
}
