//! Page titles for URLs.
//!
//! `.title <text>` and any channel message containing a web or public IPv4
//! URL get one `[ <title> ] - <domain>` line per URL. Limits live under
//! `[plugins.url]`:
//!
//! ```toml
//! [plugins.url]
//! max_urls = 5
//! max_bytes = 512000
//! timeout_secs = 5
//! max_redirects = 10
//! ```

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{RANGE, USER_AGENT};
use reqwest::{Client, Url, redirect};
use serde::Deserialize;
use tracing::{debug, warn};

use bavi_framework::prelude::*;

register_plugin! {
    pub static URL = PluginDescriptor::new("url", init)
        .with_desc("Announces the titles of linked pages");
}

/// Host names with an alphabetic top-level domain.
const WEB_URL: &str = r"https?://(?:www\.)?[-a-zA-Z0-9@:%._+~#=\x{263a}-\x{1f645}]{1,256}\.[a-z]{2,6}\b[-a-zA-Z0-9@:%_+.~#?&/=]*";

/// Dotted-quad hosts; the address is captured so non-public ones can be
/// dropped.
const IPV4_URL: &str = r"https?://((?:(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9][0-9]|[0-9])\.){3}(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9][0-9]|[0-9]))[-a-zA-Z0-9@:%_+.~#?&/=]*";

/// Media and binary files are never fetched.
const IGNORED: &str = r"(?i)\.(jpg|jpg:large|png|gif|bmp|tiff|psd|mp4|mkv|avi|mov|mpg|vob|mp3|aac|wav|flac|ogg|mka|wma|zip|rar|7z|tar|iso|exe|dll|cfg|rc|reg|pxe|efi)$";

const TITLE_END: &[u8] = b"</title>";

/// `[plugins.url]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UrlConfig {
    /// URLs fetched per message.
    pub max_urls: usize,
    /// Bytes read per page before giving up on finding a title.
    pub max_bytes: usize,
    /// Whole-request timeout.
    pub timeout_secs: u64,
    /// Redirects followed per request.
    pub max_redirects: usize,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            max_urls: 5,
            max_bytes: 512_000,
            timeout_secs: 5,
            max_redirects: 10,
        }
    }
}

fn init(bot: &mut Bot, config: &PluginConfig) -> Result<(), BoxError> {
    let config: UrlConfig = config.parse()?;
    debug!(?config, "Initializing the url plugin");
    let titles = Arc::new(TitleFetcher::new(config)?);

    let command = Arc::clone(&titles);
    bot.add_command(
        "title",
        move |ctx: CommandContext| {
            let titles = Arc::clone(&command);
            async move { titles.announce(&ctx.bot, &ctx.destination, &ctx.args).await }
        },
        &[],
    )?;

    for pattern in [titles.urls.web.clone(), titles.urls.ipv4.clone()] {
        let matcher = Arc::clone(&titles);
        bot.add_matcher(
            pattern,
            move |ctx: MatchContext| {
                let titles = Arc::clone(&matcher);
                async move { titles.announce(&ctx.bot, &ctx.destination, &ctx.text).await }
            },
            Priority::Low,
        )?;
    }
    Ok(())
}

// =============================================================================
// URL extraction
// =============================================================================

/// The compiled URL patterns.
#[derive(Debug, Clone)]
pub struct UrlPatterns {
    web: Regex,
    ipv4: Regex,
    ignored: Regex,
}

impl UrlPatterns {
    /// Compiles the patterns.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            web: Regex::new(WEB_URL)?,
            ipv4: Regex::new(IPV4_URL)?,
            ignored: Regex::new(IGNORED)?,
        })
    }

    /// Every fetchable URL in `text`: web URLs first, then public IPv4 URLs.
    pub fn find(&self, text: &str) -> Vec<String> {
        let web = self.web.find_iter(text).map(|m| m.as_str());
        let ipv4 = self
            .ipv4
            .captures_iter(text)
            .filter(|caps| caps[1].parse::<Ipv4Addr>().is_ok_and(is_public))
            .filter_map(|caps| caps.get(0))
            .map(|m| m.as_str());

        let urls: Vec<String> = web
            .chain(ipv4)
            .filter(|url| !self.ignored.is_match(url))
            .map(str::to_string)
            .collect();
        debug!(?urls, "Found URLs");
        urls
    }
}

fn is_public(addr: Ipv4Addr) -> bool {
    let [first, .., last] = addr.octets();
    !(addr.is_private() || addr.is_loopback() || first == 0 || last == 255)
}

/// `host[:port]` of `url`, or an empty string.
pub fn domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        debug!(url, "Could not get domain");
        return String::new();
    };
    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

// =============================================================================
// Titles
// =============================================================================

/// The first `<title>` in `page`, entity-decoded and whitespace-collapsed.
pub fn extract_title(page: &str) -> Option<String> {
    let lower = page.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find("</title>")?;

    let title = decode_entities(&page[start..end])
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!title.is_empty()).then_some(title)
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => name.strip_prefix('#')?.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Fetches pages and turns them into announcement lines.
#[derive(Debug)]
pub struct TitleFetcher {
    client: Client,
    urls: UrlPatterns,
    config: UrlConfig,
}

impl TitleFetcher {
    /// Creates a fetcher with its own HTTP client.
    pub fn new(config: UrlConfig) -> Result<Self, BoxError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()?;
        Ok(Self {
            client,
            urls: UrlPatterns::new()?,
            config,
        })
    }

    /// Says one line for each of the first `max_urls` URLs in `text`.
    pub async fn announce(&self, bot: &Bot, destination: &str, text: &str) -> HandlerResult {
        for url in self.urls.find(text).into_iter().take(self.config.max_urls) {
            if let Some(line) = self.describe(&url).await {
                bot.say(destination, &line).await?;
            }
        }
        Ok(())
    }

    /// The announcement for `url`: its title, or what went wrong.
    ///
    /// `None` when the page has no title.
    pub async fn describe(&self, url: &str) -> Option<String> {
        match self.fetch_title(url).await {
            Ok(Some(title)) => Some(format!("[ {title} ] - {}", domain(url))),
            Ok(None) => {
                debug!(url, "Page has no title");
                None
            }
            Err(e) => Some(explain(url, &e)),
        }
    }

    async fn fetch_title(&self, url: &str) -> reqwest::Result<Option<String>> {
        debug!(url, "Requesting page");
        let mut response = self
            .client
            .get(url)
            .header(RANGE, format!("bytes=0-{}", self.config.max_bytes))
            .header(USER_AGENT, concat!("bavi/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?
            .error_for_status()?;

        let mut page = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            page.extend_from_slice(&chunk);
            if page.len() > self.config.max_bytes || contains_title_end(&page) {
                break;
            }
        }
        Ok(extract_title(&String::from_utf8_lossy(&page)))
    }
}

fn contains_title_end(page: &[u8]) -> bool {
    page.windows(TITLE_END.len())
        .any(|w| w.eq_ignore_ascii_case(TITLE_END))
}

fn explain(url: &str, err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("Server for '{url}' timed out.")
    } else if err.is_redirect() {
        format!("URL '{url}' had too many redirects.")
    } else if err.is_status() {
        format!("An HTTP error occurred for URL '{url}'")
    } else if err.is_connect() {
        debug!(url, error = %err, "Connection error");
        format!("A connection error occurred for URL '{url}'")
    } else {
        warn!(url, error = %err, "Could not get title");
        format!("Could not get the title of URL '{url}'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const VALID: &[&str] = &[
        "http://google.com",
        "https://google.com",
        "http://www.google.com",
        "https://www.google.com",
        "https://flab.tech:443",
        "https://shitty.vodka",
        "http://www.crowneprince.horse/",
        "https://sub.domain.horse",
        "http://123.12.33.42",
        "http://123.12.33.42:80",
        "http://123.12.33.42:80/homasd/asdfgwe",
        "https://en.wikipedia.org/wiki/Harry_Potter_and_the_Philosopher%27s_Stone",
        "https://ja.wikipedia.org/wiki/%E4%BB%BB%E5%A4%A9%E5%A0%82",
        "https://implyingrigged.info/wiki//mlp/",
        "http://asdf.com/testjpg:large",
        "http://asdf.com/testflac",
    ];

    const INVALID: &[&str] = &[
        "",
        "google.com",
        "www.google.com",
        "ftp://asdf.org",
        "http://192.168.1.11/",
        "http://10.2.33.23:80",
        "12.33.23.23:80",
        "http://172.16.32.11",
        "http://127.0.0.1:8080/",
        "asdf.aqwet3awr",
        "https://tnDX47P7VAMzEIn.ZEnLb",
        "http://cKDcNsfi.nOQ2wlJWm7.g9",
        "http://asdf.com/test.jpg",
        "http://asdf.com/test.jpg:large",
        "http://asdf.com/test.PNG",
        "http://asdf.com/test.flac",
        "http://asdf.com/test.7z",
        "http://asdf.com/test.exe",
    ];

    #[test]
    fn test_find_urls() {
        let urls = UrlPatterns::new().unwrap();
        for url in VALID {
            assert_eq!(urls.find(url), [*url], "{url}");
        }
        for url in INVALID {
            assert!(urls.find(url).is_empty(), "{url}");
        }
    }

    #[test]
    fn test_find_urls_in_sentence() {
        let urls = UrlPatterns::new().unwrap();
        assert_eq!(
            urls.find("see http://first.web.site and http://8.8.8.8/x too"),
            ["http://first.web.site", "http://8.8.8.8/x"]
        );
    }

    #[test]
    fn test_domain() {
        assert_eq!(domain("http://cyzon.us/"), "cyzon.us");
        assert_eq!(domain("https://flab.tech:8443/a"), "flab.tech:8443");
        assert_eq!(domain("http://xn--yt8h.ws/"), "xn--yt8h.ws");
        assert_eq!(domain("not a url"), "");
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title("<html><head><title>sample page</title></head></html>").as_deref(),
            Some("sample page")
        );
        assert_eq!(
            extract_title("<TITLE lang=\"ja\">\n  三星集团 -\n 维基百科 </TITLE>").as_deref(),
            Some("三星集团 - 维基百科")
        );
        assert_eq!(
            extract_title("<title>Fish &amp; Chips &#8211; &#x41;&bogus;</title>").as_deref(),
            Some("Fish & Chips \u{2013} A&bogus;")
        );
        assert_eq!(extract_title("<title>  </title>"), None);
        assert_eq!(extract_title("<html>no title</html>"), None);
    }

    #[test]
    fn test_config() {
        let config: UrlConfig = PluginConfig::new(json!({ "max_urls": 2 })).parse().unwrap();
        assert_eq!(config.max_urls, 2);
        assert_eq!(config.max_bytes, 512_000);
        assert_eq!(config.timeout_secs, 5);
    }

    /// Serves one canned HTTP response per connection.
    async fn serve(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_describe_page() {
        let url = serve(
            "200 OK",
            "<html><head><title>only the finest</title></head></html>",
        )
        .await;
        let fetcher = TitleFetcher::new(UrlConfig::default()).unwrap();

        assert_eq!(
            fetcher.describe(&url).await,
            Some(format!("[ only the finest ] - {}", domain(&url)))
        );
    }

    #[tokio::test]
    async fn test_describe_untitled_page() {
        let url = serve("200 OK", "<html><body>plain</body></html>").await;
        let fetcher = TitleFetcher::new(UrlConfig::default()).unwrap();
        assert_eq!(fetcher.describe(&url).await, None);
    }

    #[tokio::test]
    async fn test_describe_http_error() {
        let url = serve("404 Not Found", "gone").await;
        let fetcher = TitleFetcher::new(UrlConfig::default()).unwrap();
        assert_eq!(
            fetcher.describe(&url).await,
            Some(format!("An HTTP error occurred for URL '{url}'"))
        );
    }

    #[tokio::test]
    async fn test_describe_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let fetcher = TitleFetcher::new(UrlConfig::default()).unwrap();
        assert_eq!(
            fetcher.describe(&url).await,
            Some(format!("A connection error occurred for URL '{url}'"))
        );
    }

    #[tokio::test]
    async fn test_private_urls_are_not_fetched() {
        use bavi_core::testing::RecordingConnection;
        use bavi_core::{InboundMessage, Source};
        use bavi_framework::{DispatchOutcome, Dispatcher};

        let url = serve("200 OK", "<title>internal</title>").await;
        let conn = Arc::new(RecordingConnection::new("TestBot", ["#test"]));
        let mut bot = Bot::new(conn.clone());
        init(&mut bot, &PluginConfig::default()).unwrap();
        let dispatcher = Dispatcher::new(bot);

        let outcome = dispatcher
            .dispatch(InboundMessage::new(Source::new("user"), "#test", &url))
            .await;
        assert_eq!(outcome, DispatchOutcome::Matched);
        assert!(conn.sent().is_empty());
    }
}
