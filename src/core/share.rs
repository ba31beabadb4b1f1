use crate::core::locator::locate;
use crate::core::network::{local_share_url, resolve_local_ip};
use crate::core::qr::print_qr;
use crate::core::server::FileServer;
use crate::core::uploader::{build_uploader, upload_and_extract};
use crate::domain::model::{Artifact, ShareMode, ShareOutcome};
use crate::domain::ports::{ConfigProvider, Uploader};
use crate::utils::error::Result;
use crate::utils::validation::validate_socket_addr;
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};

pub struct ShareEngine<C: ConfigProvider> {
    config: C,
    uploader: Option<Box<dyn Uploader>>,
}

impl<C: ConfigProvider> ShareEngine<C> {
    pub fn new(config: C) -> Self {
        Self {
            config,
            uploader: None,
        }
    }

    /// 使用自訂的上傳實作，取代設定中的 backend
    pub fn with_uploader(mut self, uploader: Box<dyn Uploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Runs one share from start to finish. In local-server mode this only
    /// returns after `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> Result<ShareOutcome>
    where
        F: Future<Output = ()>,
    {
        let artifact = locate(self.config.artifact_path(), self.config.build_hint())?;
        tracing::info!("📦 Sharing {}", artifact.path().display());

        match self.config.mode() {
            ShareMode::Upload => self.share_by_upload(artifact).await,
            ShareMode::LocalServer => self.share_locally(artifact, shutdown).await,
        }
    }

    async fn share_by_upload(&self, artifact: Artifact) -> Result<ShareOutcome> {
        let url = match &self.uploader {
            Some(uploader) => upload_and_extract(uploader.as_ref(), &artifact).await?,
            None => {
                let uploader =
                    build_uploader(self.config.upload_backend(), self.config.upload_endpoint())?;
                upload_and_extract(uploader.as_ref(), &artifact).await?
            }
        };

        println!("Uploaded {} to {}", artifact.file_name(), url);
        print_qr(&url, self.config.qr_border())?;

        Ok(ShareOutcome {
            mode: ShareMode::Upload,
            url,
            artifact,
        })
    }

    async fn share_locally<F>(&self, artifact: Artifact, shutdown: F) -> Result<ShareOutcome>
    where
        F: Future<Output = ()>,
    {
        let probe = validate_socket_addr("server.ip_probe", self.config.ip_probe())?;
        let ip = resolve_local_ip(probe)?;

        let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.config.port()));
        let server = FileServer::bind(bind_addr, artifact.directory()).await?;
        let port = server.local_addr()?.port();

        let url = local_share_url(ip, port, &artifact)?.to_string();
        print_qr(&url, self.config.qr_border())?;

        println!("Serving {} at {}", artifact.path().display(), url);
        println!("Press Ctrl+C to stop.");
        server.serve_until(shutdown).await?;

        Ok(ShareOutcome {
            mode: ShareMode::LocalServer,
            url,
            artifact,
        })
    }
}
