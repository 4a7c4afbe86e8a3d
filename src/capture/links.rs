use std::path::Path;

use tokio::fs;

pub const KEY_TAG: &str = "#EXT-X-KEY";
const URI_ATTRIBUTE: &str = "URI=\"";

/// A line of a manifest that references a remote resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkLine<'a> {
    /// A bare segment URL.
    Segment(&'a str),
    /// The URI attribute of an encryption key directive.
    Key(&'a str),
}

impl<'a> LinkLine<'a> {
    /// Classify an already trimmed manifest line.
    pub fn parse(line: &'a str) -> Option<Self> {
        if line.starts_with("http") {
            return Some(LinkLine::Segment(line));
        }
        key_uri(line).map(LinkLine::Key)
    }

    pub fn link(&self) -> &'a str {
        match *self {
            LinkLine::Segment(link) | LinkLine::Key(link) => link,
        }
    }
}

/// Quoted URI value of an `#EXT-X-KEY` line.
///
/// A missing closing quote yields the rest of the line.
fn key_uri(line: &str) -> Option<&str> {
    let marker = line.find(KEY_TAG)?;
    let after_marker = &line[marker + KEY_TAG.len()..];
    let uri_start = after_marker.find(URI_ATTRIBUTE)? + URI_ATTRIBUTE.len();
    let uri = &after_marker[uri_start..];
    Some(match uri.find('"') {
        Some(uri_end) => &uri[..uri_end],
        None => uri,
    })
}

/// Lines of a manifest. `\r\n`, `\n` and a lone `\r` all end a line.
pub fn manifest_lines(manifest: &str) -> impl Iterator<Item = &str> {
    let mut rest = manifest;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let (line, next) = match rest.find(['\r', '\n']) {
            Some(end) => {
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                (&rest[..end], &rest[end + terminator..])
            }
            None => (rest, ""),
        };
        rest = next;
        Some(line)
    })
}

/// All links of a manifest, in order of occurrence. Duplicates are kept.
pub fn extract_links(manifest: &str) -> Vec<String> {
    manifest_lines(manifest)
        .filter_map(|line| LinkLine::parse(line.trim()))
        .map(|link_line| link_line.link().to_owned())
        .collect()
}

/// Extract the links of the manifest at `input` and save them to `output`, one per line.
pub async fn extract_links_to_file(input: &Path, output: &Path) -> std::io::Result<Vec<String>> {
    let manifest = fs::read_to_string(input).await?;
    let links = extract_links(&manifest);
    fs::write(output, join_lines(&links)).await?;
    println!("Links extracted and saved to: {}", output.display());
    Ok(links)
}

/// Join lines, terminating each one with a newline.
pub(crate) fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    lines.iter().fold(String::new(), |mut out, line| {
        out.push_str(line.as_ref());
        out.push('\n');
        out
    })
}
