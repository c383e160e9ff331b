use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::Client as S3Client;
use gallery::{
    image_source::{BackendImageSource, BucketImageSource, ImageSource},
    key_enumerator::KeyEnumerator,
    media_storage::{MediaStorage, ObjectStorage},
    server,
    types::{Environment, ImageSourceKind},
    url_signer::UrlSigner,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // JSON for deployed stages, human-readable locally
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(environment.tracing_level().as_str()));
    if environment.json_logs() {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }

    info!("Starting gallery in {:?} environment", environment);

    let image_source = build_image_source(&environment).await;

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down..."),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
        signal_token.cancel();
    });

    server::start(image_source, shutdown_token).await
}

async fn build_image_source(environment: &Environment) -> Arc<dyn ImageSource> {
    match environment.image_source() {
        ImageSourceKind::Bucket => {
            let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
            let storage: Arc<dyn ObjectStorage> = Arc::new(MediaStorage::new(s3_client));
            let bucket_name = environment.s3_bucket();

            info!("✅ Serving images from bucket {bucket_name}");

            Arc::new(BucketImageSource::new(
                bucket_name,
                KeyEnumerator::new(storage.clone()),
                UrlSigner::new(
                    storage,
                    Duration::from_secs(environment.presigned_url_expiry_secs()),
                ),
            ))
        }
        ImageSourceKind::Backend { endpoint } => {
            info!("✅ Serving images from backend {endpoint}");
            Arc::new(BackendImageSource::new(reqwest::Client::new(), endpoint))
        }
    }
}
