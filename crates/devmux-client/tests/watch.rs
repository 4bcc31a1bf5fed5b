mod support;

use std::path::Path;
use std::thread;

use devmux_client::{ClientConfig, ClientError, DeviceEvent, NotificationListener};
use devmux_transport::Listener;
use devmux_wire::{encode_mux, DetachRecord, ResultRecord, MSG_DETACHED, TAG_LISTEN, TAG_SIDE_CHANNEL};

use support::{message_type, scratch_socket, usb_device, DaemonConn};

fn config_for(path: &Path) -> ClientConfig {
    ClientConfig {
        socket_path: path.to_path_buf(),
        ..ClientConfig::default()
    }
}

#[test]
fn subscription_streams_attach_and_detach() {
    let path = scratch_socket("watch-events");
    let listener = Listener::bind(&path).unwrap();

    let server = thread::spawn(move || {
        let mut conn = DaemonConn::new(listener.accept().unwrap());
        let request = conn.read_request();
        assert_eq!(request.tag, TAG_LISTEN);
        assert_eq!(message_type(&request), "Listen");

        // Ack and the first notification leave in one write, like a daemon
        // that already has attached devices to announce.
        let mut batch = encode_mux(&ResultRecord::new(0), TAG_LISTEN).unwrap();
        batch.extend_from_slice(&encode_mux(&usb_device(7), TAG_SIDE_CHANNEL).unwrap());
        conn.send_raw(&batch);

        conn.send_mux(
            &DetachRecord {
                message_type: MSG_DETACHED.to_string(),
                device_id: 7,
            },
            TAG_SIDE_CHANNEL,
        );
        // Dropping the connection ends the stream.
    });

    let mut events = NotificationListener::new(config_for(&path))
        .subscribe()
        .unwrap();

    match events.next().unwrap().unwrap() {
        DeviceEvent::Attached(record) => assert_eq!(record.device_id, 7),
        other => panic!("expected an attach first, got {other:?}"),
    }
    assert!(matches!(
        events.next().unwrap().unwrap(),
        DeviceEvent::Detached(7)
    ));

    let end = events.next().unwrap();
    assert!(matches!(end, Err(ClientError::ConnectionClosed)));
    assert!(events.next().is_none(), "stream is fused after the error");

    server.join().unwrap();
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn refused_listen_is_an_error() {
    let path = scratch_socket("watch-refused");
    let listener = Listener::bind(&path).unwrap();

    let server = thread::spawn(move || {
        let mut conn = DaemonConn::new(listener.accept().unwrap());
        let request = conn.read_request();
        assert_eq!(request.tag, TAG_LISTEN);
        conn.send_mux(&ResultRecord::new(1), TAG_LISTEN);
    });

    let err = NotificationListener::new(config_for(&path))
        .subscribe()
        .unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, ClientError::RequestRefused { code: 1 }));
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn foreign_notifications_are_skipped() {
    let path = scratch_socket("watch-foreign");
    let listener = Listener::bind(&path).unwrap();

    let server = thread::spawn(move || {
        let mut conn = DaemonConn::new(listener.accept().unwrap());
        let request = conn.read_request();
        assert_eq!(request.tag, TAG_LISTEN);
        conn.send_mux(&ResultRecord::new(0), TAG_LISTEN);

        // A stray result the client never asked for, then a real event.
        conn.send_mux(&ResultRecord::new(0), TAG_SIDE_CHANNEL);
        conn.send_mux(&usb_device(3), TAG_SIDE_CHANNEL);
    });

    let mut events = NotificationListener::new(config_for(&path))
        .subscribe()
        .unwrap();

    match events.next().unwrap().unwrap() {
        DeviceEvent::Attached(record) => assert_eq!(record.device_id, 3),
        other => panic!("the stray result should be skipped, got {other:?}"),
    }

    server.join().unwrap();
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
