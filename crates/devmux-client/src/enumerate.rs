use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use devmux_wire::{
    ConnectRequest, DeviceRecord, MuxRequest, PropertyQuery, PropertyReply, ResultRecord,
    TAG_CONNECT, TAG_LIST_DEVICES, TAG_SIDE_CHANNEL,
};

use crate::connection::{ClientConfig, Connection};
use crate::error::{ClientError, Result};
use crate::router::ResponseRouter;

/// Lockdown property holding the user-visible device name.
const DEVICE_NAME_KEY: &str = "DeviceName";

/// Which devices an enumeration delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumerateMode {
    /// Every device the daemon reports.
    #[default]
    All,
    /// Only devices attached over USB.
    Usb,
}

/// A device joined with the name fetched from its lockdown service.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceDescriptor {
    pub device: DeviceRecord,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitList,
    HaveList,
    AwaitConnectResult,
    SideChannelReady,
    AwaitName,
    NameResolved,
    Failed,
}

/// State owned by one enumeration run. Handlers advance `phase` and fill the
/// data slots; the pump loops observe them. A fresh session is built per run,
/// so nothing leaks between enumerations.
struct EnumSession {
    phase: Phase,
    candidates: Vec<DeviceRecord>,
    cursor: usize,
    resolved: BTreeMap<u64, DeviceDescriptor>,
    name: Option<String>,
    failure: Option<ClientError>,
}

impl EnumSession {
    fn new() -> Self {
        Self {
            phase: Phase::AwaitList,
            candidates: Vec::new(),
            cursor: 0,
            resolved: BTreeMap::new(),
            name: None,
            failure: None,
        }
    }

    fn fail(&mut self, err: ClientError) {
        self.failure = Some(err);
        self.phase = Phase::Failed;
    }

    /// Surface a failure recorded by a handler.
    fn check(&mut self) -> Result<()> {
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Enumerates attached devices: asks the daemon for its device list, then
/// fetches each device's name over a dedicated lockdown side channel.
pub struct DeviceEnumerator {
    config: ClientConfig,
}

impl DeviceEnumerator {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Run one full enumeration.
    ///
    /// Failures on the per-device side channels skip that device and the
    /// batch continues; failures on the primary connection abort the call.
    /// No step is retried. The result maps device IDs to descriptors in
    /// ascending ID order.
    pub fn enumerate(&self, mode: EnumerateMode) -> Result<BTreeMap<u64, DeviceDescriptor>> {
        let mut session = EnumSession::new();

        let mut primary = Connection::connect(&self.config)?;
        let mut router: ResponseRouter<EnumSession> = ResponseRouter::new();

        router.expect::<Vec<DeviceRecord>, _>(TAG_LIST_DEVICES, |_, session, reply| match reply {
            Ok(devices) => {
                session.candidates = devices;
                session.phase = Phase::HaveList;
            }
            Err(err) => session.fail(ClientError::ListRequest(err)),
        });
        primary.send(&MuxRequest::list_devices(), TAG_LIST_DEVICES)?;

        while session.phase == Phase::AwaitList {
            primary.pump(&mut router, &mut session)?;
        }
        session.check()?;

        debug!(count = session.candidates.len(), "daemon reported devices");

        while session.cursor < session.candidates.len() {
            let device = session.candidates[session.cursor].clone();
            session.cursor += 1;

            // Each candidate gets its own socket, dropped before the next
            // iteration, so lockdown replies (always tag 0) cannot collide.
            match self.resolve_name(&mut session, device.device_id) {
                Ok(name) => {
                    debug!(device_id = device.device_id, name = %name, "resolved device name");
                    session
                        .resolved
                        .insert(device.device_id, DeviceDescriptor { device, name });
                }
                Err(err) => {
                    warn!(device_id = device.device_id, error = %err, "skipping device");
                }
            }
        }

        let mut resolved = std::mem::take(&mut session.resolved);
        if mode == EnumerateMode::Usb {
            resolved.retain(|_, descriptor| descriptor.device.properties.is_usb());
        }

        info!(total = resolved.len(), "enumeration complete");
        Ok(resolved)
    }

    /// Fetch one device's name: ask the daemon to patch a fresh connection
    /// through to the device's lockdown port, then issue a GetValue query
    /// over lockdown framing.
    fn resolve_name(&self, session: &mut EnumSession, device_id: u64) -> Result<String> {
        let mut side = Connection::connect(&self.config)?;
        let mut router: ResponseRouter<EnumSession> = ResponseRouter::new();

        session.phase = Phase::AwaitConnectResult;
        router.expect::<ResultRecord, _>(TAG_CONNECT, |_, session, reply| match reply {
            Ok(result) if result.ok() => session.phase = Phase::SideChannelReady,
            Ok(result) => session.fail(ClientError::RequestRefused {
                code: result.number,
            }),
            Err(err) => session.fail(ClientError::Reply(err)),
        });
        side.send(&ConnectRequest::lockdown(device_id), TAG_CONNECT)?;

        while session.phase == Phase::AwaitConnectResult {
            side.pump(&mut router, session)?;
        }
        session.check()?;

        // The daemon is a dumb pipe to the device from here on.
        side.switch_to_lockdown()?;

        session.phase = Phase::AwaitName;
        router.expect::<PropertyReply, _>(TAG_SIDE_CHANNEL, |_, session, reply| match reply {
            Ok(reply) => {
                session.name = Some(reply.value);
                session.phase = Phase::NameResolved;
            }
            Err(err) => session.fail(ClientError::Reply(err)),
        });
        side.send_lockdown(&PropertyQuery::get_value(DEVICE_NAME_KEY))?;

        loop {
            if let Some(name) = session.name.take() {
                return Ok(name);
            }
            session.check()?;
            side.pump(&mut router, session)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_keeps_everything() {
        assert_eq!(EnumerateMode::default(), EnumerateMode::All);
    }

    #[test]
    fn session_failure_is_taken_once() {
        let mut session = EnumSession::new();
        session.fail(ClientError::ConnectionClosed);
        assert_eq!(session.phase, Phase::Failed);
        assert!(session.check().is_err());
        assert!(session.check().is_ok(), "failure is consumed by check");
    }
}
