//! Downloads of images and stylesheets referenced by remote content

use crate::client::{RemoteClient, ResponseKind};
use crate::page::ParamSet;
use crate::storage::write_atomic;
use crate::url::{encode_component, is_remote, local_file_path};
use crate::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Downloads images that live under the remote base
///
/// Each image is stored below `output_dir` at its path relative to `base`
/// (see [`local_file_path`]). Images from other origins, images without a
/// safe local path and failed downloads are skipped. Duplicates are fetched
/// once.
///
/// # Returns
///
/// * `Ok(n)` - Number of images written
/// * `Err(SyncError)` - Writing an image failed
pub async fn download_images(
    client: &RemoteClient,
    images: &[Url],
    base: &Url,
    output_dir: &Path,
) -> Result<u32> {
    let remote = client.base_url();
    let mut seen = HashSet::new();
    let mut written = 0;

    for image in images {
        if !seen.insert(image.as_str()) {
            continue;
        }
        if !is_remote(image, remote) {
            tracing::debug!("Skipping foreign image {}", image);
            continue;
        }
        let Some(relative) = local_file_path(image, base, remote) else {
            tracing::warn!("No local path for image {}", image);
            continue;
        };

        tracing::debug!("Loading image: {}", image);
        if let Some(bytes) = client.fetch_bytes(image).await {
            write_atomic(&output_dir.join(relative), &bytes).await?;
            written += 1;
        }
    }

    Ok(written)
}

/// Name of the stylesheet belonging to a view's ODD, if it has one
fn stylesheet_name(params: &ParamSet) -> Option<&str> {
    let odd = params.get("odd")?;
    let name = odd.strip_suffix(".odd").unwrap_or(odd);

    if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
        return None;
    }
    Some(name)
}

/// Local path of the stylesheet for a view, if it has one
pub fn stylesheet_path(params: &ParamSet, base_dir: &Path) -> Option<PathBuf> {
    stylesheet_name(params).map(|name| base_dir.join("css").join(format!("{}.css", name)))
}

/// Downloads `transform/<odd>.css` into `<base_dir>/css/` unless present
///
/// # Returns
///
/// * `Ok(true)` - The stylesheet was downloaded
/// * `Ok(false)` - No ODD, already present, or the download failed
/// * `Err(SyncError)` - Writing the file failed
pub async fn ensure_stylesheet(
    client: &RemoteClient,
    params: &ParamSet,
    base_dir: &Path,
) -> Result<bool> {
    let (Some(name), Some(target)) = (stylesheet_name(params), stylesheet_path(params, base_dir))
    else {
        return Ok(false);
    };

    if tokio::fs::try_exists(&target).await.unwrap_or(false) {
        return Ok(false);
    }

    let path = format!("transform/{}.css", encode_component(name));
    match client.get(&path, &[], ResponseKind::Bytes).await {
        Some(response) => {
            write_atomic(&target, &response.body.into_bytes()).await?;
            tracing::debug!("Stored stylesheet {}", target.display());
            Ok(true)
        }
        None => {
            tracing::warn!("Failed to load CSS for {}", name);
            Ok(false)
        }
    }
}
