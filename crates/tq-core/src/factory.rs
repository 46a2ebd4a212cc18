//! Download object factory: link → typed descriptors.

use crate::error::{QueueError, ResolveError};
use crate::link::{parse_link, Service};
use crate::object::{
    Bitrate, CollectionObject, CollectionPayload, ConvertableObject, DownloadHeader,
    DownloadObject, SingleObject, SinglePayload,
};
use crate::resolver::{Client, PluginRegistry, ResolvedItem, ResolvedMeta, Resolver};

/// Build the descriptors for one link.
///
/// A link whose service has a registered plugin goes to that plugin;
/// primary-catalog links go to `resolver`. Anything else is unsupported.
pub async fn build<C: Client>(
    client: &C,
    link: &str,
    bitrate: Bitrate,
    resolver: &dyn Resolver<C>,
    plugins: &PluginRegistry<C>,
) -> Result<Vec<DownloadObject>, QueueError> {
    let parsed = parse_link(link)?;

    let resolved = match plugins.for_service(parsed.service) {
        Some(plugin) => plugin.generate(client, &parsed, bitrate).await,
        None if parsed.service == Service::Deezer => {
            resolver.resolve(client, &parsed, bitrate).await
        }
        None => {
            return Err(QueueError::UnsupportedLink {
                link: parsed.link,
            })
        }
    }
    .map_err(|e| e.or_link(&parsed.link))?;

    if resolved.is_empty() {
        return Err(ResolveError::new("Link resolved to nothing")
            .with_errid("emptyLink")
            .with_link(parsed.link)
            .into());
    }

    tracing::debug!(
        link = %parsed.link,
        service = %parsed.service,
        link_type = %parsed.link_type,
        items = resolved.len(),
        "link resolved"
    );
    Ok(resolved
        .into_iter()
        .map(|item| into_object(item, bitrate))
        .collect())
}

/// Type resolver output. Counters start at zero.
pub fn into_object(item: ResolvedItem, bitrate: Bitrate) -> DownloadObject {
    match item {
        ResolvedItem::Single { meta, track, album } => DownloadObject::Single(SingleObject {
            header: header(meta, bitrate, 1),
            single: SinglePayload {
                track,
                album,
                legacy_track: None,
            },
        }),
        ResolvedItem::Collection {
            meta,
            tracks,
            album,
            playlist,
        } => {
            let size = u32::try_from(tracks.len()).unwrap_or(u32::MAX);
            DownloadObject::Collection(CollectionObject {
                header: header(meta, bitrate, size),
                collection: CollectionPayload {
                    tracks,
                    album,
                    playlist,
                    legacy_tracks: None,
                },
            })
        }
        ResolvedItem::Convertable {
            meta,
            size,
            plugin,
            conversion_data,
        } => DownloadObject::Convertable(ConvertableObject {
            header: header(meta, bitrate, size),
            plugin,
            conversion_data,
        }),
    }
}

fn header(meta: ResolvedMeta, bitrate: Bitrate, size: u32) -> DownloadHeader {
    let mut header = DownloadHeader::new(meta.link_type, meta.id, bitrate, meta.title, meta.artist, size);
    header.essential.cover = meta.cover;
    header.essential.explicit = meta.explicit;
    header
}
