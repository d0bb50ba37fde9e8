//! CLI command implementations.

pub(crate) mod install;
