//! Read-only static file server for the artifact directory.
//!
//! One request per connection (`Connection: close`), `GET` and `HEAD` only.
//! Request paths are resolved segment by segment under the root, so `..`
//! can never climb above it.

use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const MAX_HEAD_BYTES: usize = 16 * 1024;
const MAX_HEADERS: usize = 64;
const SERVER_NAME: &str = concat!("serve-apk/", env!("CARGO_PKG_VERSION"));

// 目錄清單中 href 需要跳脫的字元
const HREF_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub struct FileServer {
    listener: TcpListener,
    root: Arc<PathBuf>,
}

impl FileServer {
    pub async fn bind(addr: SocketAddr, root: impl Into<PathBuf>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let root = root.into();
        tracing::debug!(
            "Listening on {} for {}",
            listener.local_addr()?,
            root.display()
        );
        Ok(Self {
            listener,
            root: Arc::new(root),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` resolves. Shutting down is not an
    /// error: the listener is dropped and `Ok(())` is returned.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::debug!("Server stopped");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let root = Arc::clone(&self.root);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, peer, &root).await {
                                tracing::debug!("Connection from {} failed: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => tracing::warn!("Failed to accept connection: {}", e),
                },
            }
        }
    }
}

struct RequestHead {
    method: String,
    target: String,
}

enum Incoming {
    Request(RequestHead),
    Malformed,
    Closed,
}

async fn read_head(stream: &mut TcpStream) -> std::io::Result<Incoming> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(Incoming::Closed);
        }
        buf.extend_from_slice(&chunk[..n]);

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut request = httparse::Request::new(&mut headers);
        match request.parse(&buf) {
            Ok(httparse::Status::Complete(_)) => {
                return Ok(Incoming::Request(RequestHead {
                    method: request.method.unwrap_or_default().to_string(),
                    target: request.path.unwrap_or("/").to_string(),
                }));
            }
            Ok(httparse::Status::Partial) if buf.len() < MAX_HEAD_BYTES => continue,
            _ => return Ok(Incoming::Malformed),
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    root: &Path,
) -> std::io::Result<()> {
    let head = match read_head(&mut stream).await? {
        Incoming::Request(head) => head,
        Incoming::Malformed => {
            tracing::warn!("{} sent a malformed request", peer.ip());
            return Response::error(400, "Bad request syntax")
                .write_to(&mut stream, true)
                .await;
        }
        Incoming::Closed => return Ok(()),
    };

    let response = match head.method.as_str() {
        "GET" | "HEAD" => respond(root, &head.target).await,
        _ => Response::error(501, "Unsupported method"),
    };

    tracing::info!(
        "{} \"{} {}\" {}",
        peer.ip(),
        head.method,
        head.target,
        response.status
    );
    response.write_to(&mut stream, head.method != "HEAD").await
}

async fn respond(root: &Path, target: &str) -> Response {
    let Some(request_path) = RequestPath::parse(target) else {
        return Response::error(400, "Bad request path");
    };
    let fs_path = request_path.resolve(root);

    let metadata = match tokio::fs::metadata(&fs_path).await {
        Ok(metadata) => metadata,
        Err(_) => return Response::error(404, "File not found"),
    };

    if metadata.is_dir() {
        if !request_path.trailing_slash {
            return Response::new(301).header("Location", slash_location(target));
        }

        let index = fs_path.join("index.html");
        if let Ok(index_metadata) = tokio::fs::metadata(&index).await {
            if index_metadata.is_file() {
                return serve_file(&index, &index_metadata).await;
            }
        }
        return list_directory(&fs_path, &request_path.decoded).await;
    }
    if request_path.trailing_slash {
        return Response::error(404, "File not found");
    }

    serve_file(&fs_path, &metadata).await
}

async fn serve_file(path: &Path, metadata: &std::fs::Metadata) -> Response {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(_) => return Response::error(404, "File not found"),
    };

    let mut response = Response::new(200)
        .header("Content-Type", content_type(path))
        .header("Content-Length", metadata.len().to_string());
    if let Ok(modified) = metadata.modified() {
        response = response.header("Last-Modified", http_date(DateTime::<Utc>::from(modified)));
    }
    response.body(Body::File(file))
}

async fn list_directory(dir: &Path, display_path: &str) -> Response {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(_) => return Response::error(404, "No permission to list directory"),
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort_by_key(|name| name.to_lowercase());

    Response::html(200, directory_listing_html(display_path, &names))
}

fn directory_listing_html(display_path: &str, names: &[String]) -> String {
    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut html = format!(
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for name in names {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            utf8_percent_encode(name, HREF_SEGMENT),
            escape_html(name)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

/// Decoded request path, with `.` and `..` already applied.
#[derive(Debug, PartialEq, Eq)]
struct RequestPath {
    segments: Vec<String>,
    decoded: String,
    trailing_slash: bool,
}

impl RequestPath {
    fn parse(target: &str) -> Option<Self> {
        let raw = target.split(['?', '#']).next().unwrap_or_default();
        let decoded = percent_decode_str(raw).decode_utf8().ok()?.into_owned();

        let mut segments = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s if s.contains(['\\', '\0']) => return None,
                s if cfg!(windows) && s.contains(':') => return None,
                s => segments.push(s.to_string()),
            }
        }

        Some(Self {
            segments,
            trailing_slash: decoded.ends_with('/'),
            decoded,
        })
    }

    fn resolve(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }
}

fn slash_location(target: &str) -> String {
    let target = target.split('#').next().unwrap_or_default();
    match target.split_once('?') {
        Some((path, query)) => format!("{}/?{}", path, query),
        None => format!("{}/", target),
    }
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("apk") => "application/vnd.android.package-archive",
        Some("aab") | Some("zip") => "application/zip",
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("txt") | Some("log") => "text/plain; charset=utf-8",
        Some("json") => "application/json",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        400 => "Bad Request",
        404 => "Not Found",
        501 => "Not Implemented",
        _ => "Unknown",
    }
}

enum Body {
    Empty,
    Bytes(Vec<u8>),
    File(File),
}

struct Response {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: Body,
}

impl Response {
    fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    fn html(status: u16, html: String) -> Self {
        Self::new(status)
            .header("Content-Type", "text/html; charset=utf-8")
            .header("Content-Length", html.len().to_string())
            .body(Body::Bytes(html.into_bytes()))
    }

    fn error(status: u16, message: &str) -> Self {
        let html = format!(
            "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Error response</title>\n</head>\n<body>\n<h1>Error response</h1>\n<p>Error code: {}</p>\n<p>Message: {}.</p>\n</body>\n</html>\n",
            status,
            escape_html(message)
        );
        Self::html(status, html)
    }

    async fn write_to(self, stream: &mut TcpStream, include_body: bool) -> std::io::Result<()> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status));
        head.push_str(&format!("Server: {}\r\n", SERVER_NAME));
        head.push_str(&format!("Date: {}\r\n", http_date(Utc::now())));
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        if !self.headers.iter().any(|(name, _)| *name == "Content-Length") {
            head.push_str("Content-Length: 0\r\n");
        }
        head.push_str("Connection: close\r\n\r\n");
        stream.write_all(head.as_bytes()).await?;

        if include_body {
            match self.body {
                Body::Empty => {}
                Body::Bytes(bytes) => stream.write_all(&bytes).await?,
                Body::File(mut file) => {
                    tokio::io::copy(&mut file, stream).await?;
                }
            }
        }

        stream.flush().await?;
        stream.shutdown().await
    }
}
