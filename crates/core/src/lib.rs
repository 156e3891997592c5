pub mod access;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod fuzzy;
pub mod policy;
pub mod reply;
pub mod text;

pub use access::{AccessEntry, AccessMap};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions, LogFormat};
pub use domain::{Domain, DEFAULT_DOMAIN};
pub use errors::{ApplicationError, InterfaceError};
pub use flows::{FlowEngine, FlowReply, InMemorySessionStore, SessionStore, UniformLookupFlow};
pub use policy::{PolicyBundle, PolicyPresence};
pub use reply::{ChatReply, LinkLayout, ReplyKind, ReplyLink};
