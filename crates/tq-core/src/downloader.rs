//! Interface to the external track downloader.
//!
//! The byte-level pipeline (fetch, decrypt, tag, write) lives outside this
//! crate. The scheduler hands it one materialized descriptor at a time.

use async_trait::async_trait;

use crate::error::DownloadError;
use crate::events::Listener;
use crate::object::DownloadObject;
use crate::resolver::Client;

/// Runs one queue item to completion.
///
/// Implementations update the header counters (`size`, `downloaded`,
/// `failed`, `errors`, `files`, `progress`) as tracks finish, and check
/// `object.is_canceled()` between tracks. Returning `Err` means the item
/// could not run at all; the scheduler counts the remaining tracks as failed.
#[async_trait]
pub trait Downloader<C: Client>: Send + Sync {
    async fn run(
        &self,
        client: &C,
        object: &mut DownloadObject,
        listener: &dyn Listener,
    ) -> Result<(), DownloadError>;
}
