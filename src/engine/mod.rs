//! Decision core: domain rules, policy lists and the cookie classifier.

pub mod classifier;
pub mod domain;
pub mod feed;
pub mod policy;

pub use classifier::{classify, Verdict};
pub use policy::{PolicyState, PolicyStore, DEFAULT_ALLOW_LIST};
