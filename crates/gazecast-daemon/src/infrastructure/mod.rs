//! Infrastructure layer: everything that touches the OS, the network, the
//! sensor SDK, or the filesystem. The application layer depends on the
//! traits defined here, never on concrete platform code.

pub mod network;
pub mod pointer;
pub mod screen;
pub mod sensor;
pub mod storage;
pub mod ui_bridge;
