pub mod config;
pub mod logging;

pub mod checksum;
pub mod descriptor;
pub mod manifest;
pub mod naming;
pub mod remote;
pub mod retry;
pub mod storage;
pub mod sync;
