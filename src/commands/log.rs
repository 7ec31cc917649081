//! `hg log` via `--style xml`.

use super::args::ArgBuilder;
use crate::driver::InputProviders;
use crate::{CommandError, Result, Session};

/// One changeset from the revision history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// Local revision number.
    pub rev: i64,
    /// Full changeset hash.
    pub node: String,
    /// Tags on this changeset.
    pub tags: Vec<String>,
    /// Named branch, when not `default`.
    pub branch: Option<String>,
    /// Author display name.
    pub author: String,
    /// Author email address.
    pub email: String,
    /// Commit date as reported by the server (ISO 8601).
    pub date: String,
    /// Commit message.
    pub message: String,
}

/// Options for [`Session::log`].
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Show the specified revisions or ranges (`-r`, repeatable).
    pub revs: Vec<String>,
    /// Limit history to these files.
    pub files: Vec<String>,
    /// Limit the number of changesets shown (`--limit`).
    pub limit: Option<u32>,
    /// Follow file history across copies and renames (`-f`).
    pub follow: bool,
    /// Do not show merge changesets (`--no-merges`).
    pub no_merges: bool,
}

impl Session {
    /// Show the revision history of the repository or of files.
    ///
    /// Requests XML output and parses it into [`Revision`] values, newest
    /// first (Mercurial's default ordering).
    pub async fn log(&mut self, options: &LogOptions) -> Result<Vec<Revision>> {
        let limit = options.limit.map(|n| n.to_string());
        let argv = ArgBuilder::new("log")
            .opt("--style", Some("xml"))
            .flag(options.follow, "-f")
            .flag(options.no_merges, "--no-merges")
            .opt("--limit", limit.as_deref())
            .many("-r", &options.revs)
            .positional(&options.files)
            .finish();

        let result = self
            .get_command_output(&argv, &mut InputProviders::none())
            .await?
            .checked(0, "log failed")?;

        let stdout = result.stdout_text()?;
        match parse_log_xml(&stdout) {
            Ok(revisions) => Ok(revisions),
            Err(reason) => Err(CommandError::new(
                format!("log produced unparsable XML: {reason}"),
                result,
            )
            .into()),
        }
    }
}

/// Parse the output of `hg log --style xml`.
///
/// The style's shape is fixed by Mercurial's templates
/// (`<logentry revision=".." node="..">` with `tag`, `branch`, `author`,
/// `date`, and `msg` children), so a purpose-built scan is sufficient
/// here.
fn parse_log_xml(text: &str) -> std::result::Result<Vec<Revision>, String> {
    let mut revisions = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("<logentry") {
        let after = &rest[start..];
        let end = after
            .find("</logentry>")
            .ok_or("unterminated <logentry>")?;
        revisions.push(parse_entry(&after[..end])?);
        rest = &after[end + "</logentry>".len()..];
    }
    Ok(revisions)
}

fn parse_entry(entry: &str) -> std::result::Result<Revision, String> {
    let header_end = entry.find('>').ok_or("unterminated <logentry> tag")?;
    let header = &entry[..header_end];
    let body = &entry[header_end + 1..];

    let rev = attr(header, "revision")
        .and_then(|v| v.parse().ok())
        .ok_or("logentry without a revision attribute")?;
    let node = attr(header, "node")
        .ok_or("logentry without a node attribute")?
        .to_string();

    let tags = elements(body, "tag")
        .into_iter()
        .map(|(_, inner)| unescape(inner))
        .collect();
    let branch = element(body, "branch").map(|(_, inner)| unescape(inner));

    let (author_attrs, author_name) =
        element(body, "author").ok_or("logentry without an author")?;
    let email = attr(author_attrs, "email").unwrap_or_default().to_string();

    let date = element(body, "date")
        .map(|(_, inner)| inner.to_string())
        .unwrap_or_default();
    let message = element(body, "msg")
        .map(|(_, inner)| unescape(inner))
        .unwrap_or_default();

    Ok(Revision {
        rev,
        node,
        tags,
        branch,
        author: unescape(author_name),
        email: unescape(&email),
        date,
        message,
    })
}

/// Find an attribute value inside a tag's attribute text.
fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!("{name}=\"");
    let start = tag.find(&pattern)? + pattern.len();
    let rest = &tag[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Find the first `<name ...>inner</name>` element; self-closing elements
/// yield an empty inner text.
fn element<'a>(body: &'a str, name: &str) -> Option<(&'a str, &'a str)> {
    elements_iter(body, name).next()
}

fn elements<'a>(body: &'a str, name: &str) -> Vec<(&'a str, &'a str)> {
    elements_iter(body, name).collect()
}

fn elements_iter<'a>(
    body: &'a str,
    name: &str,
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let mut rest = body;
    std::iter::from_fn(move || loop {
        let start = rest.find(&open)?;
        let after_open = &rest[start + open.len()..];
        // Reject prefix matches like <tagline> when looking for <tag>.
        let boundary = after_open.as_bytes().first().copied();
        if !matches!(boundary, Some(b' ') | Some(b'>') | Some(b'/')) {
            rest = after_open;
            continue;
        }
        let gt = after_open.find('>')?;
        let attrs = &after_open[..gt];
        let inner_start = &after_open[gt + 1..];
        if attrs.ends_with('/') {
            rest = inner_start;
            return Some((attrs.trim_end_matches('/').trim(), ""));
        }
        let end = inner_start.find(&close)?;
        rest = &inner_start[end + close.len()..];
        return Some((attrs.trim(), &inner_start[..end]));
    })
}

/// Undo the XML escaping applied by the log style.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let (ch, advance) = if tail.starts_with("&lt;") {
            ('<', 4)
        } else if tail.starts_with("&gt;") {
            ('>', 4)
        } else if tail.starts_with("&amp;") {
            ('&', 5)
        } else if tail.starts_with("&quot;") {
            ('"', 6)
        } else if tail.starts_with("&apos;") {
            ('\'', 6)
        } else {
            ('&', 1)
        };
        out.push(ch);
        rest = &tail[advance..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<log>
<logentry revision="1" node="6c9a6b771a8f0b037f0a0c35f1f24bc2b9b0e476">
<tag>tip</tag>
<author email="alice@example.com">Alice</author>
<date>2024-03-01T10:30:00+00:00</date>
<msg xml:space="preserve">second &amp; final</msg>
</logentry>
<logentry revision="0" node="cf54cb765ecb6b6a8ee9f8df9b58ae7b5b1b08bb">
<branch>feature</branch>
<author email="bob@example.com">Bob &lt;builder&gt;</author>
<date>2024-02-28T09:00:00+00:00</date>
<msg xml:space="preserve">first
line two</msg>
</logentry>
</log>
"#;

    #[test]
    fn parses_two_entries_newest_first() {
        let revisions = parse_log_xml(SAMPLE).unwrap();
        assert_eq!(revisions.len(), 2);

        let newest = &revisions[0];
        assert_eq!(newest.rev, 1);
        assert_eq!(newest.node, "6c9a6b771a8f0b037f0a0c35f1f24bc2b9b0e476");
        assert_eq!(newest.tags, ["tip"]);
        assert_eq!(newest.branch, None);
        assert_eq!(newest.author, "Alice");
        assert_eq!(newest.email, "alice@example.com");
        assert_eq!(newest.message, "second & final");

        let oldest = &revisions[1];
        assert_eq!(oldest.rev, 0);
        assert_eq!(oldest.branch.as_deref(), Some("feature"));
        assert_eq!(oldest.author, "Bob <builder>");
        assert_eq!(oldest.message, "first\nline two");
    }

    #[test]
    fn empty_log_parses_to_no_entries() {
        let revisions = parse_log_xml("<?xml version=\"1.0\"?>\n<log>\n</log>\n").unwrap();
        assert!(revisions.is_empty());
    }

    #[test]
    fn unterminated_entry_is_an_error() {
        let err = parse_log_xml("<log><logentry revision=\"0\" node=\"x\">").unwrap_err();
        assert!(err.contains("unterminated"));
    }

    #[test]
    fn missing_revision_attribute_is_an_error() {
        let err = parse_log_xml("<log><logentry node=\"x\"></logentry></log>").unwrap_err();
        assert!(err.contains("revision"));
    }

    #[test]
    fn unescape_handles_all_entities() {
        assert_eq!(unescape("&lt;a&gt; &amp; &quot;b&quot; &apos;c&apos;"), "<a> & \"b\" 'c'");
        assert_eq!(unescape("plain"), "plain");
        assert_eq!(unescape("dangling &"), "dangling &");
    }

    #[test]
    fn attr_extraction() {
        let header = r#"logentry revision="5" node="abc""#;
        assert_eq!(attr(header, "revision"), Some("5"));
        assert_eq!(attr(header, "node"), Some("abc"));
        assert_eq!(attr(header, "missing"), None);
    }
}
