use aws_config::BehaviorVersion;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::Client;
use ovfs_common::{
    Credentials, ObjectMeta, ObjectStore, ObjectSummary, SessionConfig, StoreAuth, StoreError,
    VfsError,
};
use std::ops::Range;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::runtime::Runtime;
use tracing::debug;

/// S3-compatible object store client
///
/// Wraps the async AWS SDK behind a synchronous facade with an owned
/// runtime. Virtual-hosted addressing is disabled when the config asks for
/// path-style, so requests go to `https://endpoint/bucket/key`.
pub struct S3Store {
    instance_id: String,
    client: Arc<Client>,
    runtime: Arc<Runtime>,
}

impl S3Store {
    /// Create a new store client.
    ///
    /// With `StoreAuth::Env`, missing credential variables fail here, at
    /// construction, not on the first request.
    pub fn new(config: &SessionConfig) -> Result<Self, VfsError> {
        let credentials = match &config.auth {
            StoreAuth::Env => Some(Credentials::from_env()?),
            StoreAuth::AccessKey {
                access_key_id,
                secret_access_key,
            } => Some(Credentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
            }),
            StoreAuth::Anonymous => None,
        };

        let instance_id = format!(
            "s3:{}{}",
            config.region,
            config
                .endpoint
                .as_deref()
                .map(|e| format!("@{}", e))
                .unwrap_or_default()
        );

        let runtime = Runtime::new().map_err(|e| {
            VfsError::Io(std::io::Error::other(format!(
                "Failed to create async runtime: {}",
                e
            )))
        })?;

        let client = runtime.block_on(Self::create_client(config, credentials))?;

        Ok(Self {
            instance_id,
            client: Arc::new(client),
            runtime: Arc::new(runtime),
        })
    }

    async fn create_client(
        config: &SessionConfig,
        credentials: Option<Credentials>,
    ) -> Result<Client, VfsError> {
        let mut aws_config_builder = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = config.endpoint_url()? {
            aws_config_builder = aws_config_builder.endpoint_url(endpoint);
        }

        let creds = match credentials {
            Some(creds) => aws_credential_types::Credentials::new(
                creds.access_key_id,
                creds.secret_access_key,
                None,
                None,
                "static",
            ),
            // Empty credentials for anonymous access to public buckets.
            None => aws_credential_types::Credentials::new("", "", None, None, "anonymous"),
        };
        aws_config_builder = aws_config_builder.credentials_provider(creds);

        let aws_config = aws_config_builder.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(config.path_style)
            .build();

        Ok(Client::from_conf(s3_config))
    }
}

fn to_system_time(dt: &aws_sdk_s3::primitives::DateTime) -> Option<SystemTime> {
    dt.secs()
        .try_into()
        .ok()
        .map(|secs| UNIX_EPOCH + std::time::Duration::from_secs(secs))
}

impl ObjectStore for S3Store {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>, StoreError> {
        self.runtime.block_on(async {
            let head_result = self
                .client
                .head_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await;

            match head_result {
                Ok(output) => Ok(Some(ObjectMeta {
                    size: output.content_length().unwrap_or(0) as u64,
                    modified: output.last_modified().and_then(to_system_time),
                })),
                Err(SdkError::ServiceError(ctx)) if ctx.err().is_not_found() => {
                    debug!("HEAD {}/{}: not found", bucket, key);
                    Ok(None)
                }
                Err(e) => Err(StoreError::Transport(format!(
                    "HEAD {}/{} failed: {}",
                    bucket, key, e
                ))),
            }
        })
    }

    fn get(
        &self,
        bucket: &str,
        key: &str,
        range: Option<Range<u64>>,
    ) -> Result<Vec<u8>, StoreError> {
        self.runtime.block_on(async {
            let mut request = self.client.get_object().bucket(bucket).key(key);

            if let Some(range) = &range {
                if range.start >= range.end {
                    return Err(StoreError::InvalidRange(format!("{}/{}", bucket, key)));
                }
                // HTTP ranges are inclusive on both ends.
                request = request.range(format!("bytes={}-{}", range.start, range.end - 1));
            }

            let output = request.send().await.map_err(|e| match e {
                SdkError::ServiceError(ctx) if ctx.err().is_no_such_key() => {
                    StoreError::NotFound(format!("{}/{}", bucket, key))
                }
                e => StoreError::Transport(format!("GET {}/{} failed: {}", bucket, key, e)),
            })?;

            let bytes = output.body.collect().await.map_err(|e| {
                StoreError::Transport(format!("GET {}/{} body read failed: {}", bucket, key, e))
            })?;

            Ok(bytes.into_bytes().to_vec())
        })
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError> {
        self.runtime.block_on(async {
            let mut summaries = Vec::new();
            let mut continuation_token: Option<String> = None;

            loop {
                let mut list_request = self
                    .client
                    .list_objects_v2()
                    .bucket(bucket)
                    .prefix(prefix);

                if let Some(token) = &continuation_token {
                    list_request = list_request.continuation_token(token);
                }

                let output = list_request.send().await.map_err(|e| {
                    StoreError::Transport(format!("LIST {}/{} failed: {}", bucket, prefix, e))
                })?;

                for object in output.contents() {
                    if let Some(key) = object.key() {
                        summaries.push(ObjectSummary {
                            key: key.to_string(),
                            size: object.size().map(|s| s as u64).unwrap_or(0),
                            modified: object.last_modified().and_then(to_system_time),
                        });
                    }
                }

                if output.is_truncated().unwrap_or(false) {
                    continuation_token = output.next_continuation_token().map(|s| s.to_string());
                } else {
                    break;
                }
            }

            debug!("LIST {}/{}: {} keys", bucket, prefix, summaries.len());
            Ok(summaries)
        })
    }
}
