use anyhow::Result;
use serve_apk::FileServer;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const APK_BYTES: &[u8] = b"PK\x03\x04 fake apk payload";

struct RunningServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<serve_apk::Result<()>>,
}

impl RunningServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(self) -> Result<()> {
        let _ = self.stop.send(());
        self.handle.await??;
        Ok(())
    }
}

/// temp/
///   outside.txt
///   www/app-debug.apk, www/output-metadata.json, www/sub/
fn fixture() -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path().join("www");
    std::fs::create_dir_all(root.join("sub"))?;
    std::fs::write(root.join("app-debug.apk"), APK_BYTES)?;
    std::fs::write(root.join("output-metadata.json"), b"{\"version\": 3}")?;
    std::fs::write(temp_dir.path().join("outside.txt"), b"top secret")?;
    Ok((temp_dir, root))
}

async fn start(root: &Path) -> Result<RunningServer> {
    let server = FileServer::bind("127.0.0.1:0".parse()?, root).await?;
    let addr = server.local_addr()?;
    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_until(async move {
        let _ = stopped.await;
    }));
    Ok(RunningServer { addr, stop, handle })
}

async fn raw_request(addr: SocketAddr, request: &str) -> Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(request.as_bytes()).await?;
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;
    Ok(String::from_utf8_lossy(&response).into_owned())
}

#[tokio::test]
async fn test_serves_artifact_bytes() -> Result<()> {
    let (_temp_dir, root) = fixture()?;
    let server = start(&root).await?;

    let response = reqwest::get(server.url("/app-debug.apk")).await?;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "application/vnd.android.package-archive"
    );
    assert!(response.headers().contains_key("last-modified"));
    assert_eq!(response.bytes().await?.as_ref(), APK_BYTES);

    // 檔案不可被修改
    assert_eq!(std::fs::read(root.join("app-debug.apk"))?, APK_BYTES);

    server.stop().await
}

#[tokio::test]
async fn test_head_has_length_without_body() -> Result<()> {
    let (_temp_dir, root) = fixture()?;
    let server = start(&root).await?;

    let response = raw_request(
        server.addr,
        "HEAD /app-debug.apk HTTP/1.1\r\nHost: localhost\r\n\r\n",
    )
    .await?;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains(&format!("Content-Length: {}\r\n", APK_BYTES.len())));
    assert!(response.ends_with("\r\n\r\n"));

    server.stop().await
}

#[tokio::test]
async fn test_missing_file_is_404() -> Result<()> {
    let (_temp_dir, root) = fixture()?;
    let server = start(&root).await?;

    let response = reqwest::get(server.url("/app-release.apk")).await?;
    assert_eq!(response.status(), 404);
    assert!(response.text().await?.contains("File not found"));

    server.stop().await
}

#[tokio::test]
async fn test_file_with_trailing_slash_is_404() -> Result<()> {
    let (_temp_dir, root) = fixture()?;
    let server = start(&root).await?;

    let response = raw_request(
        server.addr,
        "GET /app-debug.apk/ HTTP/1.1\r\nHost: localhost\r\n\r\n",
    )
    .await?;
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"), "{}", response);
    assert!(!response.contains("fake apk payload"));

    server.stop().await
}

#[tokio::test]
async fn test_directory_listing() -> Result<()> {
    let (_temp_dir, root) = fixture()?;
    let server = start(&root).await?;

    let response = reqwest::get(server.url("/")).await?;
    assert_eq!(response.status(), 200);
    let html = response.text().await?;

    assert!(html.contains("Directory listing for /"));
    assert!(html.contains("<a href=\"app-debug.apk\">app-debug.apk</a>"));
    assert!(html.contains("<a href=\"output-metadata.json\">output-metadata.json</a>"));
    assert!(html.contains("<a href=\"sub/\">sub/</a>"));
    assert!(!html.contains("outside.txt"));

    server.stop().await
}

#[tokio::test]
async fn test_directory_without_slash_redirects() -> Result<()> {
    let (_temp_dir, root) = fixture()?;
    let server = start(&root).await?;

    let response = raw_request(server.addr, "GET /sub HTTP/1.1\r\nHost: localhost\r\n\r\n").await?;
    assert!(response.starts_with("HTTP/1.1 301 Moved Permanently\r\n"));
    assert!(response.contains("Location: /sub/\r\n"));

    server.stop().await
}

#[tokio::test]
async fn test_traversal_stays_inside_root() -> Result<()> {
    let (_temp_dir, root) = fixture()?;
    let server = start(&root).await?;

    for target in ["/../outside.txt", "/%2e%2e/outside.txt", "/sub/../../outside.txt"] {
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", target);
        let response = raw_request(server.addr, &request).await?;
        assert!(response.starts_with("HTTP/1.1 404"), "{} -> {}", target, response);
        assert!(!response.contains("top secret"));
    }

    server.stop().await
}

#[tokio::test]
async fn test_unsupported_method_and_bad_request() -> Result<()> {
    let (_temp_dir, root) = fixture()?;
    let server = start(&root).await?;

    let response = raw_request(
        server.addr,
        "POST /app-debug.apk HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\n\r\n",
    )
    .await?;
    assert!(response.starts_with("HTTP/1.1 501 Not Implemented\r\n"));

    let response = raw_request(server.addr, "garbage\r\n\r\n").await?;
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));

    server.stop().await
}

#[tokio::test]
async fn test_shutdown_is_clean() -> Result<()> {
    let (_temp_dir, root) = fixture()?;

    // 已完成的 shutdown future：立即正常結束
    let server = FileServer::bind("127.0.0.1:0".parse()?, &root).await?;
    tokio_test::assert_ok!(server.serve_until(async {}).await);

    // 服務中收到中斷
    let server = start(&root).await?;
    let response = reqwest::get(server.url("/app-debug.apk")).await?;
    assert_eq!(response.status(), 200);
    server.stop().await
}
