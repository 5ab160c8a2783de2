use percent_encoding::percent_decode_str;
use std::path::PathBuf;
use url::Url;

/// Resolves an `href`/`src` attribute value against a base URL
///
/// Returns None if the reference should be left alone:
/// - empty values
/// - javascript:, mailto:, tel: and data: references
/// - fragment-only anchors (same page)
/// - values that do not resolve to a URL
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    base.join(href).ok()
}

/// Returns true if the URL lies under the configured remote base URL
pub fn is_remote(url: &Url, remote: &Url) -> bool {
    url.as_str().starts_with(remote.as_str())
}

/// Rewrites a remote URL into a root-relative path of the local site
///
/// The remote base is stripped and the remainder (path, query and fragment)
/// is kept. URLs outside the remote yield None.
///
/// # Examples
///
/// ```
/// use tei_sync::url::to_local_path;
/// use url::Url;
///
/// let remote = Url::parse("http://remote/origin/").unwrap();
/// let link = Url::parse("http://remote/origin/doc?id=3").unwrap();
/// assert_eq!(to_local_path(&link, &remote).as_deref(), Some("/doc?id=3"));
/// ```
pub fn to_local_path(url: &Url, remote: &Url) -> Option<String> {
    if !is_remote(url, remote) {
        return None;
    }
    let rest = &url.as_str()[remote.as_str().len()..];
    Some(format!("/{}", rest))
}

/// Derives the relative file path a downloaded resource is stored under
///
/// The path is the resource URL relative to `base` (the referring document).
/// References that climb above the document fall back to the path relative
/// to the remote root. Query and fragment are dropped and segments are
/// percent-decoded. Returns None when no safe relative path exists,
/// including when a decoded segment smuggles in a separator.
pub fn local_file_path(url: &Url, base: &Url, remote: &Url) -> Option<PathBuf> {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.set_fragment(None);

    let relative = base
        .make_relative(&clean)
        .filter(|rel| !rel.is_empty() && !rel.split('/').any(|seg| seg == ".."))
        .or_else(|| remote.make_relative(&clean))?;

    let mut path = PathBuf::new();
    for segment in relative.split('/') {
        let decoded = percent_decode_str(segment).decode_utf8_lossy();
        match decoded.as_ref() {
            "" | "." => continue,
            ".." => return None,
            part if part.contains(['/', '\\']) => return None,
            part => path.push(part),
        }
    }

    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}
