pub mod config;
pub mod logging;

pub mod control;
pub mod downloader;
pub mod engine;
pub mod error;
pub mod events;
pub mod factory;
pub mod link;
pub mod object;
pub mod queue;
pub mod recovery;
pub mod resolver;
pub mod scheduler;
pub mod store;

pub use engine::{Collaborators, EngineSettings, QueueEngine};
pub use error::{DownloadError, QueueError, ResolveError, StoreError};
pub use events::{Listener, QueueEvent};
pub use object::{Bitrate, DownloadObject, ItemKind, ItemStatus};
pub use queue::{QueueManager, QueueSnapshot};
pub use resolver::Client;
pub use store::QueueStore;
