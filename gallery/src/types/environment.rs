//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use tracing::Level;

use crate::url_signer::MAX_PRESIGNED_URL_EXPIRY;

/// Default validity window of a presigned GET URL
pub const DEFAULT_PRESIGNED_URL_EXPIRY_SECS: u64 = 60 * 60;

/// Where the gallery fetches its image URLs from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSourceKind {
    /// List and presign directly against the bucket
    Bucket,
    /// Fetch ready-made URLs from a remote backend endpoint
    Backend {
        /// Endpoint returning a JSON array of URL strings
        endpoint: String,
    },
}

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for presigned URL expiry in seconds
        presign_expiry_override: Option<u64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                let presign_expiry_override = env::var("PRESIGNED_URL_EXPIRY_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok())
                    .filter(|secs| (1..=MAX_PRESIGNED_URL_EXPIRY.as_secs()).contains(secs));

                Self::Development {
                    presign_expiry_override,
                }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the S3 bucket name for the environment
    ///
    /// # Panics
    ///
    /// Panics if the `S3_BUCKET_NAME` environment variable is not set outside development
    #[must_use]
    pub fn s3_bucket(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("S3_BUCKET_NAME").expect("S3_BUCKET_NAME environment variable is not set")
            }
            Self::Development { .. } => {
                env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "gallery-images".to_string())
            }
        }
    }

    /// Which image source the gallery view fetches through
    ///
    /// # Panics
    ///
    /// Panics if `IMAGE_SOURCE` is invalid, or if it is `backend` without `IMAGE_BACKEND_URL`
    #[must_use]
    pub fn image_source(&self) -> ImageSourceKind {
        let source = env::var("IMAGE_SOURCE")
            .unwrap_or_else(|_| "bucket".to_string())
            .trim()
            .to_lowercase();

        match source.as_str() {
            "bucket" => ImageSourceKind::Bucket,
            "backend" => ImageSourceKind::Backend {
                endpoint: env::var("IMAGE_BACKEND_URL")
                    .expect("IMAGE_BACKEND_URL environment variable is not set"),
            },
            _ => panic!("Invalid image source: {source}"),
        }
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            Self::Production | Self::Staging => None,
            Self::Development { .. } => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration with retries disabled and an operation timeout
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(RetryConfig::disabled())
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // LocalStack needs path-style addressing
        if matches!(self, Self::Development { .. }) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Presigned URL expiry time in seconds
    #[must_use]
    pub fn presigned_url_expiry_secs(&self) -> u64 {
        match self {
            Self::Production | Self::Staging => DEFAULT_PRESIGNED_URL_EXPIRY_SECS,
            Self::Development {
                presign_expiry_override,
            } => presign_expiry_override.unwrap_or(DEFAULT_PRESIGNED_URL_EXPIRY_SECS),
        }
    }

    /// Whether logs should be emitted as JSON
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Default tracing level, overridable with `TRACING_LEVEL`
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_environment_from_env() {
        env::remove_var("APP_ENV");
        env::remove_var("PRESIGNED_URL_EXPIRY_SECS");
        assert_eq!(
            Environment::from_env(),
            Environment::Development {
                presign_expiry_override: None
            }
        );

        env::set_var("APP_ENV", "development");
        assert_eq!(
            Environment::from_env(),
            Environment::Development {
                presign_expiry_override: None
            }
        );

        env::set_var("APP_ENV", "staging");
        assert_eq!(Environment::from_env(), Environment::Staging);

        env::set_var("APP_ENV", " Production ");
        assert_eq!(Environment::from_env(), Environment::Production);

        env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    #[should_panic(expected = "Invalid environment: invalid")]
    fn test_invalid_environment() {
        env::set_var("APP_ENV", "invalid");
        let result = std::panic::catch_unwind(Environment::from_env);
        env::remove_var("APP_ENV");
        if let Err(panic) = result {
            std::panic::resume_unwind(panic);
        }
    }

    #[test]
    #[serial]
    fn test_invalid_environment_is_not_left_behind() {
        env::set_var("APP_ENV", "invalid");
        assert!(std::panic::catch_unwind(Environment::from_env).is_err());
        env::remove_var("APP_ENV");
        env::remove_var("PRESIGNED_URL_EXPIRY_SECS");

        assert_eq!(
            Environment::from_env(),
            Environment::Development {
                presign_expiry_override: None
            }
        );
    }

    #[test]
    #[serial]
    fn test_presigned_url_expiry_secs() {
        let env = Environment::Development {
            presign_expiry_override: None,
        };
        assert_eq!(env.presigned_url_expiry_secs(), 3600);

        let env = Environment::Development {
            presign_expiry_override: Some(30),
        };
        assert_eq!(env.presigned_url_expiry_secs(), 30);

        assert_eq!(Environment::Production.presigned_url_expiry_secs(), 3600);
        assert_eq!(Environment::Staging.presigned_url_expiry_secs(), 3600);
    }

    #[test]
    #[serial]
    fn test_development_with_env_override() {
        env::set_var("APP_ENV", "development");
        env::set_var("PRESIGNED_URL_EXPIRY_SECS", "120");

        let env = Environment::from_env();
        assert_eq!(
            env,
            Environment::Development {
                presign_expiry_override: Some(120)
            }
        );
        assert_eq!(env.presigned_url_expiry_secs(), 120);

        // Unparseable values fall back to the default
        env::set_var("PRESIGNED_URL_EXPIRY_SECS", "invalid");
        let env = Environment::from_env();
        assert_eq!(env.presigned_url_expiry_secs(), 3600);

        // So do values a presigned URL cannot carry
        for out_of_range in ["0", "604801"] {
            env::set_var("PRESIGNED_URL_EXPIRY_SECS", out_of_range);
            let env = Environment::from_env();
            assert_eq!(
                env,
                Environment::Development {
                    presign_expiry_override: None
                }
            );
            assert_eq!(env.presigned_url_expiry_secs(), 3600);
        }

        env::set_var("PRESIGNED_URL_EXPIRY_SECS", "604800");
        assert_eq!(Environment::from_env().presigned_url_expiry_secs(), 604_800);

        env::remove_var("PRESIGNED_URL_EXPIRY_SECS");
        env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    fn test_image_source_selection() {
        let env = Environment::Staging;

        env::remove_var("IMAGE_SOURCE");
        assert_eq!(env.image_source(), ImageSourceKind::Bucket);

        env::set_var("IMAGE_SOURCE", "backend");
        env::set_var("IMAGE_BACKEND_URL", "https://images.example.com/images");
        assert_eq!(
            env.image_source(),
            ImageSourceKind::Backend {
                endpoint: "https://images.example.com/images".to_string()
            }
        );

        env::remove_var("IMAGE_SOURCE");
        env::remove_var("IMAGE_BACKEND_URL");
    }

    #[test]
    #[serial]
    #[should_panic(expected = "Invalid image source: ftp")]
    fn test_invalid_image_source() {
        env::set_var("IMAGE_SOURCE", "ftp");
        let result = std::panic::catch_unwind(|| Environment::Staging.image_source());
        env::remove_var("IMAGE_SOURCE");
        if let Err(panic) = result {
            std::panic::resume_unwind(panic);
        }
    }

    #[test]
    #[serial]
    fn test_development_bucket_default() {
        env::remove_var("S3_BUCKET_NAME");
        let env = Environment::Development {
            presign_expiry_override: None,
        };
        assert_eq!(env.s3_bucket(), "gallery-images");
        assert_eq!(env.override_aws_endpoint_url(), Some("http://localhost:4566"));
        assert_eq!(Environment::Production.override_aws_endpoint_url(), None);
    }
}
