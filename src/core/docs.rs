//! developer.4d.com documentation lookup.
//!
//! Queries resolve to a topic page, a class API page, or a command page.
//! Fetching is optional and never fails the lookup: HTTP and transport
//! problems are reported as the page content.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Duration;

use crate::defaults::Skill4dConfig;
use crate::error::{Error, Result};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const TRUNCATION_MARKER: &str = "\n\n[... truncated]";

/// Checked in order; the first key equal to or prefixing the query wins.
const TOPICS: &[(&str, &str)] = &[
    ("orda", "ORDA/overview"),
    ("variables", "Concepts/variables"),
    ("methods", "Concepts/methods"),
    ("classes", "Concepts/classes"),
    ("parameters", "Concepts/parameters"),
    ("shared", "Concepts/shared"),
    ("error handling", "Concepts/error-handling"),
    ("data types", "Concepts/data-types"),
    ("collections", "Concepts/collections"),
    ("objects", "Concepts/objects"),
    ("forms", "FormEditor/forms"),
    ("listbox", "FormObjects/listbox_overview"),
    ("web server", "WebServer/webServer"),
    ("rest", "REST/gettingStarted"),
    ("preferences", "Preferences/overview"),
    ("users", "Users/overview"),
    ("backup", "Backup/overview"),
    ("compiler", "Project/compiler"),
    ("components", "Project/components"),
    ("architecture", "Project/architecture"),
];

const CLASSES: &[(&str, &str)] = &[
    ("blob", "BlobClass"),
    ("collection", "CollectionClass"),
    ("cryptokey", "CryptoKeyClass"),
    ("dataclass", "DataClassClass"),
    ("datastore", "DataStoreClass"),
    ("email", "EmailObjectClass"),
    ("entity", "EntityClass"),
    ("entityselection", "EntitySelectionClass"),
    ("file", "FileClass"),
    ("folder", "FolderClass"),
    ("formdata", "FormDataClass"),
    ("httpagent", "HTTPAgentClass"),
    ("httprequest", "HTTPRequestClass"),
    ("imap transporter", "IMAPTransporterClass"),
    ("mailbox", "MailboxClass"),
    ("object", "ObjectClass"),
    ("outgoingmessage", "OutGoingMessageClass"),
    ("pop3 transporter", "POP3TransporterClass"),
    ("session", "SessionClass"),
    ("sessionsstorage", "SessionsStorageClass"),
    ("signal", "SignalClass"),
    ("smtp transporter", "SMTPTransporterClass"),
    ("systemworker", "SystemWorkerClass"),
    ("webform", "WebFormClass"),
    ("webformitem", "WebFormItemClass"),
    ("webserver", "WebServerClass"),
    ("websocket", "WebSocketClass"),
    ("websocketconnection", "WebSocketConnectionClass"),
    ("websocketserver", "WebSocketServerClass"),
    ("ziparchive", "ZipArchiveClass"),
    ("zipfile", "ZipFileClass"),
    ("zipfolder", "ZipFolderClass"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Topic,
    Class,
    Command,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocLookup {
    pub query: String,
    #[serde(rename = "type")]
    pub kind: DocKind,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Lowercase slug used by command pages: `OPEN URL` → `open-url`.
pub fn command_slug(command: &str) -> String {
    let lowered = command.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_dash = false;

    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

pub fn resolve_url(base_url: &str, query: &str) -> (String, DocKind) {
    let base = base_url.trim_end_matches('/');
    let query = query.trim();
    let normalized = query.to_lowercase().replace("4d.", "").replace("cs.", "");

    if let Some((_, path)) = TOPICS
        .iter()
        .find(|(key, _)| normalized.starts_with(key))
    {
        return (format!("{}/{}", base, path), DocKind::Topic);
    }

    let compact = normalized.replace(' ', "");
    if let Some((_, page)) = CLASSES
        .iter()
        .find(|(key, _)| *key == normalized)
        .or_else(|| CLASSES.iter().find(|(key, _)| *key == compact))
    {
        return (format!("{}/API/{}", base, page), DocKind::Class);
    }

    (
        format!("{}/commands/{}", base, command_slug(query)),
        DocKind::Command,
    )
}

pub fn lookup(query: &str, fetch: bool, max_chars: Option<usize>, config: &Skill4dConfig) -> Result<DocLookup> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::validation_missing_argument(vec!["query".to_string()]));
    }

    let (url, kind) = resolve_url(&config.docs_base_url, query);
    let content = if fetch {
        crate::log_status!("docs", "Fetching {}", url);
        Some(fetch_text(
            &url,
            max_chars.unwrap_or(config.max_doc_chars),
            config.fetch_timeout_secs,
        ))
    } else {
        None
    };

    Ok(DocLookup {
        query: query.to_string(),
        kind,
        url,
        content,
    })
}

/// Page text, or a one-line description of why it could not be fetched.
pub fn fetch_text(url: &str, max_chars: usize, timeout_secs: u64) -> String {
    match fetch_html(url, timeout_secs) {
        Ok(html) => truncate(&extract_text(&html), max_chars),
        Err(message) => message,
    }
}

fn fetch_html(url: &str, timeout_secs: u64) -> std::result::Result<String, String> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(format!("skill4d/{}", VERSION))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| format!("Error fetching: {}", e))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| format!("Error fetching: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!(
            "HTTP {}: Page not found at {}",
            status.as_u16(),
            url
        ));
    }

    response.text().map_err(|e| format!("Error fetching: {}", e))
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

const SKIPPED_TAGS: &[&str] = &["nav", "footer", "script", "style", "header"];

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<!--.*?-->|<![^>]*>|<(/?)([a-zA-Z][a-zA-Z0-9]*)[^>]*?(/?)>")
            .expect("valid regex")
    })
}

fn raw_text_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("valid regex")
    })
}

/// Readable text of a documentation page.
///
/// Chrome (`nav`, `header`, `footer`) and scripts are dropped, headings
/// become `## ` lines, inline code is wrapped in backticks and `pre` blocks
/// in fences.
pub fn extract_text(html: &str) -> String {
    let html = raw_text_regex().replace_all(html, "");
    let mut out = String::new();
    let mut skip_depth: usize = 0;
    let mut last = 0;

    for caps in tag_regex().captures_iter(&html) {
        let Some(whole) = caps.get(0) else { continue };

        if skip_depth == 0 {
            out.push_str(&decode_entities(&html[last..whole.start()]));
        }
        last = whole.end();

        let Some(name) = caps.get(2) else { continue };
        let name = name.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let self_closing = caps.get(3).is_some_and(|m| !m.as_str().is_empty());

        if SKIPPED_TAGS.contains(&name.as_str()) {
            if closing {
                skip_depth = skip_depth.saturating_sub(1);
            } else if !self_closing {
                skip_depth += 1;
            }
            continue;
        }

        if skip_depth > 0 {
            continue;
        }

        match (name.as_str(), closing) {
            ("h1" | "h2" | "h3" | "h4", false) => out.push_str("\n## "),
            ("p", false) => out.push('\n'),
            ("code", _) => out.push('`'),
            ("pre", _) => out.push_str("\n```\n"),
            _ => {}
        }
    }

    if skip_depth == 0 {
        out.push_str(&decode_entities(&html[last..]));
    }

    out.trim().to_string()
}

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid regex"))
}

/// Named entities common in documentation pages plus numeric references.
/// Unknown names are kept as written.
pub fn decode_entities(text: &str) -> String {
    entity_regex()
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    "mdash" => Some('\u{2014}'),
                    "ndash" => Some('\u{2013}'),
                    "hellip" => Some('\u{2026}'),
                    "rarr" => Some('\u{2192}'),
                    _ => None,
                }
            };

            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://developer.4d.com/docs";

    #[test]
    fn topics_match_by_prefix() {
        assert_eq!(
            resolve_url(BASE, "ORDA"),
            (format!("{}/ORDA/overview", BASE), DocKind::Topic)
        );
        assert_eq!(
            resolve_url(BASE, "error handling in workers"),
            (format!("{}/Concepts/error-handling", BASE), DocKind::Topic)
        );
    }

    #[test]
    fn classes_resolve_with_or_without_prefix() {
        assert_eq!(
            resolve_url(BASE, "4D.File"),
            (format!("{}/API/FileClass", BASE), DocKind::Class)
        );
        assert_eq!(
            resolve_url(BASE, "Entity Selection"),
            (format!("{}/API/EntitySelectionClass", BASE), DocKind::Class)
        );
        assert_eq!(
            resolve_url(BASE, "SMTP Transporter"),
            (format!("{}/API/SMTPTransporterClass", BASE), DocKind::Class)
        );
    }

    #[test]
    fn everything_else_is_a_command() {
        assert_eq!(
            resolve_url(&format!("{}/", BASE), "  OPEN URL "),
            (format!("{}/commands/open-url", BASE), DocKind::Command)
        );
        assert_eq!(command_slug("Get database parameter"), "get-database-parameter");
        assert_eq!(command_slug("--WEB SERVICE--"), "web-service");
    }

    #[test]
    fn extracts_article_text() {
        let html = r#"<html><head><style>p { color: red; }</style></head>
<body><nav><a href="/">Home</a><ul><li>Menu</li></ul></nav>
<article><h1>String</h1><p>Returns a <code>Text</code> &amp; more.</p>
<pre>$t:=String(1)</pre><br/></article>
<footer>Copyright</footer><script>var x = "<p>";</script></body></html>"#;

        let text = extract_text(html);
        assert_eq!(
            text,
            "## String\nReturns a `Text` & more.\n\n```\n$t:=String(1)\n```"
        );
    }

    #[test]
    fn decodes_numeric_entities() {
        assert_eq!(decode_entities("a&#39;b&#x41;&unknown;"), "a'bA&unknown;");
    }

    #[test]
    fn truncates_on_characters() {
        assert_eq!(truncate("abcdef", 10), "abcdef");
        assert_eq!(truncate("éééé", 2), "éé\n\n[... truncated]");
    }

    #[test]
    fn empty_query_is_rejected() {
        let err = lookup("   ", false, None, &Skill4dConfig::default()).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.missing_argument");
    }

    /// Serves a single request with the given raw HTTP response.
    fn serve_once(response: &'static str) -> String {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.ends_with(b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{}/commands/nope", addr)
    }

    #[test]
    fn missing_page_becomes_content() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let text = fetch_text(&url, 100, 5);
        assert_eq!(text, format!("HTTP 404: Page not found at {}", url));
    }

    #[test]
    fn fetched_page_is_extracted() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 24\r\nConnection: close\r\n\r\n<p>Displays a dialog</p>",
        );
        let text = fetch_text(&url, 100, 5);
        assert!(text.contains("Displays a dialog"));
    }

    #[test]
    fn unreachable_host_becomes_content() {
        let text = fetch_text("http://127.0.0.1:9/commands/alert", 100, 2);
        assert!(text.starts_with("Error fetching: "));
    }
}
