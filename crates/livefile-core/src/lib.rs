#![cfg_attr(docsrs, feature(doc_cfg))]

//! # livefile-core
//!
//! Change detection and fan-out for the livefile dev server.
//!
//! The pipeline has three stages:
//!
//! - [`watch`] arms a watch on every configured file and normalizes editor
//!   save patterns (rename-away, recreate, chmod) into one [`ChangeEvent`] per
//!   logical change.
//! - [`Broadcaster`] reads the changed file once and queues the full content
//!   on every session in the [`ClientRegistry`].
//! - [`ClientSession`] drains its own bounded outbox onto its socket, so a slow
//!   client never holds back the others.
//!
//! The HTTP and WebSocket surface lives in `livefile-cli`; this crate only sees
//! split socket halves as a `Sink`/`Stream` of frames.

pub mod broadcast;
pub mod error;
pub mod file;
pub mod reader;
pub mod registry;
pub mod session;
pub mod update;
pub mod watch;

pub use broadcast::{BroadcastOutcome, Broadcaster};
pub use error::{ConnectionError, ReadError, WatchError};
pub use file::{WatchedFile, WatchedFiles, default_logical_id};
pub use reader::read_content;
pub use registry::ClientRegistry;
pub use session::{
    ClientSession, DEFAULT_PING_INTERVAL, DEFAULT_QUEUE_CAPACITY, Delivery, OverflowPolicy,
    SessionConfig, SessionId, SessionState,
};
pub use update::{ChangeEvent, SubscribeRequest, Update};
pub use watch::{ChangeEvents, DEFAULT_SETTLE_DELAY, WatchNormalizer};
