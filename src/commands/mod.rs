//! CLI subcommand implementations for ntfy-e2e.
//!
//! - [`publish`] - plain and encrypted publishing
//! - [`subscribe`] - streaming and polling a topic
//!
//! `ntfy-e2e config` is small enough to live in `main.rs`.

pub mod publish;
pub mod subscribe;

#[doc(inline)]
pub use publish::{run as publish, PublishArgs};
#[doc(inline)]
pub use subscribe::{run as subscribe, SubscribeArgs};
