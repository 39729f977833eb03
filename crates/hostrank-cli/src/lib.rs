//! # hostrank CLI
//!
//! Command-line front end for the hostrank availabler.
//!
//! - `hostrank watch`: run an availabler and print a JSON snapshot per tick
//! - `hostrank probe`: run ping rounds against a fixed host list
//! - `hostrank discover`: perform one discovery fetch and print the mapping
//!
//! Everything written to stdout is JSON, one document per line. Logs go to
//! stderr.

pub mod commands;
