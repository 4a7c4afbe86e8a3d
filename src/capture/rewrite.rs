use std::path::Path;

use tokio::fs;

use super::links::{LinkLine, join_lines, manifest_lines};
use crate::shared::url_basename;

fn local_path(prefix: &str, link: &str) -> String {
    format!("{prefix}{}", url_basename(link))
}

/// Rewrite one manifest line so that it references the local copy of its link.
///
/// Segment lines are replaced as a whole. For key directives only the URI text is substituted,
/// at its first occurrence in the line. Every other line is returned trimmed.
pub fn simplify_line(line: &str, prefix: &str) -> String {
    let line = line.trim();
    match LinkLine::parse(line) {
        Some(LinkLine::Segment(url)) => local_path(prefix, url),
        Some(LinkLine::Key(uri)) if !uri.is_empty() => {
            line.replacen(uri, &local_path(prefix, uri), 1)
        }
        _ => line.to_owned(),
    }
}

/// Rewrite every line of a manifest, preserving line order.
pub fn simplify_manifest(manifest: &str, prefix: &str) -> Vec<String> {
    manifest_lines(manifest)
        .map(|line| simplify_line(line, prefix))
        .collect()
}

/// Rewrite the manifest at `original` and save it to `dest`, one newline-terminated line at a time.
pub async fn simplify_manifest_file(
    original: &Path,
    dest: &Path,
    prefix: &str,
) -> std::io::Result<Vec<String>> {
    let manifest = fs::read_to_string(original).await?;
    let lines = simplify_manifest(&manifest, prefix);
    fs::write(dest, join_lines(&lines)).await?;
    println!("Simplified m3u8 file saved to: {}", dest.display());
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_segment_lines() {
        assert_eq!(simplify_line("http://host/a/seg1.ts?x=1", "out/"), "out/seg1.ts");
        assert_eq!(simplify_line("  https://host/seg2.ts#frag  ", ""), "seg2.ts");
    }

    #[test]
    fn replaces_key_uri_in_place() {
        assert_eq!(
            simplify_line(
                r#"#EXT-X-KEY:METHOD=AES-128,URI="https://host/keys/key.bin?t=1",IV=0x0A"#,
                "downloads/"
            ),
            r#"#EXT-X-KEY:METHOD=AES-128,URI="downloads/key.bin",IV=0x0A"#
        );
    }

    #[test]
    fn only_first_occurrence_of_key_uri_is_replaced() {
        assert_eq!(
            simplify_line(
                r#"#EXT-X-KEY:METHOD=AES-128,KEYFORMAT="k.bin",URI="k.bin""#,
                "out/"
            ),
            r#"#EXT-X-KEY:METHOD=AES-128,KEYFORMAT="out/k.bin",URI="k.bin""#
        );
    }

    #[test]
    fn empty_key_uri_is_left_alone() {
        let line = r#"#EXT-X-KEY:METHOD=AES-128,URI="""#;
        assert_eq!(simplify_line(line, "out/"), line);
    }

    #[test]
    fn other_lines_are_trimmed() {
        assert_eq!(simplify_line("  #EXTINF:10,\t", "out/"), "#EXTINF:10,");
        assert_eq!(simplify_line("seg1.ts", "out/"), "seg1.ts");
        assert_eq!(simplify_line("   ", "out/"), "");
    }

    #[test]
    fn simplifies_cr_only_manifest() {
        let manifest = "#EXTM3U\r#EXTINF:10,\rhttp://host/seg1.ts\r#EXT-X-ENDLIST\r";
        assert_eq!(
            simplify_manifest(manifest, "out/"),
            vec!["#EXTM3U", "#EXTINF:10,", "out/seg1.ts", "#EXT-X-ENDLIST"]
        );
    }

    #[test]
    fn resimplifying_does_not_fail() {
        let manifest = "#EXTINF:10,\nhttp://host/seg1.ts\n#EXT-X-KEY:URI=\"http://host/key.bin\"\n";
        let once = simplify_manifest(manifest, "out/").join("\n");
        let twice = simplify_manifest(&once, "out/");
        assert_eq!(twice.len(), 3);
        assert_eq!(twice[1], "out/seg1.ts");
    }
}
