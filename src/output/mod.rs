//! Output accumulation and rendering.
//!
//! The execution service hands back captured streams that were produced in batches.
//! Every batch is one line of the final display, so [`OutputBuffer::append`] always
//! terminates a fragment with a line break.

use std::sync::OnceLock;

use regex::Regex;

pub const OUTPUT_BANNER: &str = "=== Output ===";
pub const EMPTY_MARKER: &str = "(empty)";

const IMAGE_STYLE: &str = "max-width: 100%; height: auto; margin: 15px 0; border: 1px solid #374151; border-radius: 8px; background: white; padding: 8px;";

/// Substrings of benign interpreter/library chatter that never reach the display.
const NOISE_MARKERS: &[&str] = &[
    "InsecureRequestWarning",
    "urllib3/connectionpool.py",
    "warnings.warn",
    "certificate verification",
];

/// Append-only destination for captured output fragments.
pub trait OutputSink {
    fn append(&mut self, fragment: &str);

    /// Feed a whole captured stream, one batch per line.
    fn append_stream(&mut self, text: &str) {
        for line in text.lines() {
            self.append(line);
        }
    }
}

pub fn is_noise(fragment: &str) -> bool {
    NOISE_MARKERS.iter().any(|m| fragment.contains(m))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    fragments: Vec<String>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    pub fn contents(&self) -> String {
        self.fragments.concat()
    }

    /// Trimmed contents under the output banner, or the empty marker.
    pub fn finalize(&self) -> String {
        let text = self.contents();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            format!("{}\n{}", OUTPUT_BANNER, EMPTY_MARKER)
        } else {
            format!("{}\n{}", OUTPUT_BANNER, trimmed)
        }
    }
}

impl OutputSink for OutputBuffer {
    fn append(&mut self, fragment: &str) {
        if is_noise(fragment) {
            return;
        }
        let mut line = String::with_capacity(fragment.len() + 1);
        line.push_str(fragment);
        line.push('\n');
        self.fragments.push(line);
    }
}

fn img_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<img([^>]*)>").expect("valid regex"))
}

fn style_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\s*style\s*=\s*("[^"]*"|'[^']*')"#).expect("valid regex"))
}

fn data_uri_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"src\s*=\s*"data:[^;"]+;base64,([^"]*)""#).expect("valid regex"))
}

/// HTML rendering of finalized output.
///
/// Output is trusted as coming from the sandboxed service: markup other than `<img>`
/// passes through untouched.
pub fn render(text: &str) -> String {
    let with_breaks = text.replace('\n', "<br/>");
    img_tag_re()
        .replace_all(&with_breaks, |caps: &regex::Captures<'_>| {
            let attrs = style_attr_re().replace_all(&caps[1], "");
            let attrs = attrs.trim_end().trim_end_matches('/').trim_end();
            format!("<img{} style=\"{}\">", attrs, IMAGE_STYLE)
        })
        .into_owned()
}

/// Terminal rendering: images become a size placeholder, everything else is kept.
pub fn render_plain(text: &str) -> String {
    img_tag_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            match data_uri_re().captures(&caps[1]) {
                Some(data) => format!("[image: {} bytes]", data[1].len() * 3 / 4),
                None => "[image]".to_string(),
            }
        })
        .into_owned()
}

fn site_packages_frame_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"File "/lib/python[\d.]+/site-packages/[^"]*", line \d+, in [^\n]*\n"#)
            .expect("valid regex")
    })
}

/// Friendlier wording for common network failures; library frames are dropped.
pub fn format_error(error: &str) -> String {
    if error.contains("Connection aborted") || error.contains("HTTPException") {
        if error.contains("A network error occurred") {
            return "Network Error: Unable to connect to the server. Please check your internet connection or try again later.".into();
        }
        return "Connection Error: The request was interrupted. This could be due to network issues or server problems.".into();
    }
    if error.contains("SSL") || error.contains("certificate") {
        return "SSL Error: There was a problem with the secure connection. This is often due to server configuration issues.".into();
    }
    if error.contains("timeout") || error.contains("TimeoutError") {
        return "Timeout Error: The request took too long to complete. The server might be slow or unreachable.".into();
    }
    if error.contains("requests.exceptions") {
        if error.contains("ConnectionError") {
            return "Connection Error: Unable to establish a connection to the server.".into();
        }
        if error.contains("RequestException") {
            return "Request Error: The HTTP request failed. Please check the URL and try again.".into();
        }
    }
    site_packages_frame_re().replace_all(error, "").into_owned()
}
