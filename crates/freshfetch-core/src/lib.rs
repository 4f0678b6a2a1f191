pub mod config;
pub mod logging;

pub mod checksum;
pub mod clock;
pub mod max_age;
pub mod meta;
pub mod resolver;
pub mod status;
pub mod storage;
pub mod transport;
pub mod updater;

pub use clock::{Clock, FixedClock, SystemClock};
pub use status::UpdateStatus;
pub use storage::{DiskStorage, MemStorage, Storage};
pub use transport::{CurlTransport, Transport, TransportOptions};
pub use updater::{Updater, UpdaterOptions};
