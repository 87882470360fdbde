//! tally: configuration front-end for a V8 coverage toolchain.
//!
//! The heart of the crate is [`config`], the resolution engine: it finds the
//! project's config dotfile, dispatches on its format (JSON, YAML, or an
//! executable script module), resolves the `extends` chain it declares, and
//! reconciles the result with command-line flags.

pub mod cli;
pub mod config;
