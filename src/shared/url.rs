/// Final path segment of a link, without its query string or fragment.
///
/// The segment is returned as written in the link: no percent-decoding or normalization,
/// and only `/` separates segments.
pub fn url_basename(link: &str) -> &str {
    let link = link.split(['?', '#']).next().unwrap_or_default();
    // Drop the scheme and authority of absolute URLs
    let path = match link.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |start| &rest[start..]),
        None => link,
    };
    path.rsplit('/').next().unwrap_or_default()
}
