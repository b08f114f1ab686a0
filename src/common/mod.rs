pub mod config;
pub mod distro;
pub mod package;
pub mod paths;
pub mod process;
pub mod shell;
pub mod terminal;

#[cfg(test)]
pub(crate) mod testutil;
