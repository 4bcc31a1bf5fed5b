use std::collections::HashMap;

use tracing::{debug, warn};

use devmux_wire::{DeviceListResponse, DeviceRecord, PropertyReply, ResultRecord};

/// How a routed payload is expected to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    DeviceList,
    Result,
    Property,
}

/// A typed decode failure handed to an expectation's handler.
#[derive(Debug, thiserror::Error)]
#[error("reply did not decode as {shape:?}: {source}")]
pub struct ReplyError {
    pub shape: ReplyShape,
    #[source]
    pub source: plist::Error,
}

mod sealed {
    pub trait Sealed {}
}

/// Reply types a response can decode into. The set is closed: every
/// expectation declares one of these shapes at registration time, and the
/// decode path is fixed by the shape.
pub trait Reply: Sized + sealed::Sealed {
    const SHAPE: ReplyShape;

    fn decode(body: &plist::Value) -> Result<Self, ReplyError>;
}

fn decode_as<T: serde::de::DeserializeOwned>(
    shape: ReplyShape,
    body: &plist::Value,
) -> Result<T, ReplyError> {
    plist::from_value(body).map_err(|source| ReplyError { shape, source })
}

impl sealed::Sealed for Vec<DeviceRecord> {}
impl Reply for Vec<DeviceRecord> {
    const SHAPE: ReplyShape = ReplyShape::DeviceList;

    fn decode(body: &plist::Value) -> Result<Self, ReplyError> {
        let response: DeviceListResponse = decode_as(Self::SHAPE, body)?;
        Ok(response.device_list)
    }
}

impl sealed::Sealed for ResultRecord {}
impl Reply for ResultRecord {
    const SHAPE: ReplyShape = ReplyShape::Result;

    fn decode(body: &plist::Value) -> Result<Self, ReplyError> {
        decode_as(Self::SHAPE, body)
    }
}

impl sealed::Sealed for PropertyReply {}
impl Reply for PropertyReply {
    const SHAPE: ReplyShape = ReplyShape::Property;

    fn decode(body: &plist::Value) -> Result<Self, ReplyError> {
        decode_as(Self::SHAPE, body)
    }
}

/// Outcome of routing one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// A registered expectation consumed the payload.
    Delivered,
    /// No expectation was registered for the tag; the payload was dropped.
    Unexpected,
}

type Handler<C> = Box<dyn FnOnce(&mut ResponseRouter<C>, &mut C, &plist::Value)>;

struct Expectation<C> {
    shape: ReplyShape,
    deliver: Handler<C>,
}

/// Correlates responses back to the requests that asked for them.
///
/// Each outstanding request registers a one-shot expectation under its tag.
/// Routing removes the registration before running the handler, so a reply
/// is delivered exactly once and a handler is free to register a fresh
/// expectation for the same tag. The router belongs to exactly one
/// connection; tags are only unique per socket.
pub struct ResponseRouter<C> {
    expectations: HashMap<u32, Expectation<C>>,
    unexpected: u64,
}

impl<C> ResponseRouter<C> {
    pub fn new() -> Self {
        Self {
            expectations: HashMap::new(),
            unexpected: 0,
        }
    }

    /// Register a one-shot expectation for `tag`.
    ///
    /// When a response arrives the payload is decoded as `T` and the handler
    /// runs exactly once, receiving either the typed reply or the decode
    /// failure. Registering a tag that is already registered replaces the
    /// earlier expectation.
    pub fn expect<T, F>(&mut self, tag: u32, handler: F)
    where
        T: Reply,
        F: FnOnce(&mut Self, &mut C, Result<T, ReplyError>) + 'static,
    {
        let previous = self.expectations.insert(
            tag,
            Expectation {
                shape: T::SHAPE,
                deliver: Box::new(move |router, ctx, body| handler(router, ctx, T::decode(body))),
            },
        );
        if previous.is_some() {
            warn!(tag, "replaced an existing expectation");
        }
    }

    /// Drop the expectation for `tag`, if any.
    pub fn unexpect(&mut self, tag: u32) {
        self.expectations.remove(&tag);
    }

    /// Deliver a response body to the expectation registered under `tag`.
    ///
    /// Responses with no expectation are dropped, not errors: sockets carry
    /// unsolicited daemon traffic alongside replies.
    pub fn route(&mut self, ctx: &mut C, tag: u32, body: &plist::Value) -> Routed {
        let Some(expectation) = self.expectations.remove(&tag) else {
            self.unexpected += 1;
            warn!(tag, "no expectation registered for response; dropping");
            return Routed::Unexpected;
        };
        debug!(tag, shape = ?expectation.shape, "delivering response");
        (expectation.deliver)(self, ctx, body);
        Routed::Delivered
    }

    /// Number of responses dropped for lack of an expectation.
    pub fn unexpected(&self) -> u64 {
        self.unexpected
    }

    /// True if an expectation is registered under `tag`.
    pub fn expects(&self, tag: u32) -> bool {
        self.expectations.contains_key(&tag)
    }
}

impl<C> Default for ResponseRouter<C> {
    fn default() -> Self {
        Self::new()
    }
}
