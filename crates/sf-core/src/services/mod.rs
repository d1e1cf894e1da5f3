pub mod command;
pub mod config_loader;
pub mod deploy;
pub mod git;
pub mod journal;
pub mod lifecycle;
pub mod lock;
pub mod manifest;
pub mod ports;
pub mod proxy;
pub mod render;
pub mod scaffold;
pub mod supervisor;
pub mod topology;

#[cfg(test)]
pub(crate) mod fakes;
