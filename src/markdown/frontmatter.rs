use std::borrow::Cow;

/// A document split into its YAML front matter and markdown body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatter<'a> {
    /// YAML between the `---` delimiters, if the document has a block
    pub yaml: Option<&'a str>,
    /// Everything after the closing delimiter
    pub body: &'a str,
}

/// Convert CRLF and lone CR line endings to LF.
///
/// Table detection only behaves identically across platforms on LF text.
pub fn normalize_line_endings(content: &str) -> Cow<'_, str> {
    if !content.contains('\r') {
        return Cow::Borrowed(content);
    }
    Cow::Owned(content.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Split a leading YAML front matter block off the document.
///
/// The block must start on the first line with `---` and end with a line that
/// is exactly `---` or `...`. Without a closing line the whole text is body.
pub fn split_front_matter(content: &str) -> FrontMatter<'_> {
    let no_front_matter = FrontMatter {
        yaml: None,
        body: content,
    };

    let first_line_end = match content.find('\n') {
        Some(idx) => idx,
        None => return no_front_matter,
    };
    if content[..first_line_end].trim_end() != "---" {
        return no_front_matter;
    }

    let yaml_start = first_line_end + 1;
    let mut offset = yaml_start;
    for line in content[yaml_start..].split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return FrontMatter {
                yaml: Some(&content[yaml_start..offset]),
                body: &content[offset + line.len()..],
            };
        }
        offset += line.len();
    }

    no_front_matter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_crlf_and_cr() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn test_normalize_borrows_lf_text() {
        assert!(matches!(normalize_line_endings("a\nb"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_split_front_matter() {
        let doc = "---\ntitle: Budget\n---\n# Heading\n";
        let fm = split_front_matter(doc);
        assert_eq!(fm.yaml, Some("title: Budget\n"));
        assert_eq!(fm.body, "# Heading\n");
    }

    #[test]
    fn test_split_front_matter_dot_terminator() {
        let fm = split_front_matter("---\na: 1\n...\nbody");
        assert_eq!(fm.yaml, Some("a: 1\n"));
        assert_eq!(fm.body, "body");
    }

    #[test]
    fn test_empty_front_matter_block() {
        let fm = split_front_matter("---\n---\nbody\n");
        assert_eq!(fm.yaml, Some(""));
        assert_eq!(fm.body, "body\n");
    }

    #[test]
    fn test_no_front_matter() {
        let fm = split_front_matter("# Title\n---\n");
        assert_eq!(fm.yaml, None);
        assert_eq!(fm.body, "# Title\n---\n");
    }

    #[test]
    fn test_unterminated_front_matter_is_body() {
        let doc = "---\ntitle: x\nno end";
        let fm = split_front_matter(doc);
        assert_eq!(fm.yaml, None);
        assert_eq!(fm.body, doc);
    }
}
