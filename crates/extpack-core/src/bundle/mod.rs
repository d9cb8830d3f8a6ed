//! Lossless conversion between an extension directory and an embedded file map.

mod codec;
mod exclude;

pub use codec::{bundle, extract, size};
pub use exclude::ExclusionPolicy;
