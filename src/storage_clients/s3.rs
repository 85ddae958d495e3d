use crate::config::AppConfig;
use crate::error::AppError;
use crate::storage::{split_object_path, DeleteStatus, ObjectStore};
use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::{AggregatedBytes, ByteStream};
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use std::collections::BTreeMap;

// DeleteObjects accepts at most this many keys per request.
const DELETE_CHUNK: usize = 1000;

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Builds a client from the ambient AWS environment (region, credentials),
    /// with the endpoint override from the configuration for MinIO-style stores.
    pub async fn new(config: &AppConfig) -> Result<Self, AppError> {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        if let Some(url) = &config.s3_endpoint_url {
            log::debug!("Using S3 endpoint override: {}", url);
            builder = builder.endpoint_url(url);
        }
        // Path-style is what S3-compatible servers expect when an endpoint is set.
        if config.s3_force_path_style || config.s3_endpoint_url.is_some() {
            builder = builder.force_path_style(true);
        }

        let client = aws_sdk_s3::Client::from_conf(builder.build());
        log::trace!("S3 client created successfully.");
        Ok(Self { client })
    }

    pub fn from_client(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn exists(&self, path: &str) -> Result<bool, AppError> {
        let (bucket, key) = split_object_path(path)?;
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) => match map_head_err(err) {
                AppError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<(), AppError> {
        let (bucket, key) = split_object_path(path)?;
        let content_type = mime_guess::from_path(key).first_or_octet_stream();
        log::trace!("put_object s3://{}/{} ({} bytes, {})", bucket, key, bytes.len(), content_type);
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type.essence_str())
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AppError::ObjectStore(format!("s3 put_object failed for {}: {:?}", path, e)))?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let (bucket, key) = split_object_path(path)?;
        let out = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_get_err(path, e))?;
        let bytes: AggregatedBytes = out.body.collect().await.map_err(|e| {
            AppError::ObjectStore(format!("get_object body collect failed for {}: {:?}", path, e))
        })?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn delete(&self, paths: &[String]) -> Result<DeleteStatus, AppError> {
        let mut by_bucket: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for path in paths {
            let (bucket, key) = split_object_path(path)?;
            by_bucket.entry(bucket).or_default().push(key);
        }

        let mut status = DeleteStatus {
            status_code: 200,
            deleted: 0,
            failed: Vec::new(),
        };
        for (bucket, keys) in by_bucket {
            for chunk in keys.chunks(DELETE_CHUNK) {
                let objects = chunk
                    .iter()
                    .map(|key| ObjectIdentifier::builder().key(*key).build())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| AppError::ObjectStore(format!("invalid delete key: {:?}", e)))?;
                let delete = Delete::builder()
                    .set_objects(Some(objects))
                    .quiet(false)
                    .build()
                    .map_err(|e| AppError::ObjectStore(format!("invalid delete request: {:?}", e)))?;

                let out = self
                    .client
                    .delete_objects()
                    .bucket(bucket)
                    .delete(delete)
                    .send()
                    .await
                    .map_err(|e| {
                        AppError::ObjectStore(format!("s3 delete_objects failed on {}: {:?}", bucket, e))
                    })?;

                status.deleted += out.deleted().len();
                for error in out.errors() {
                    let key = error.key().unwrap_or_default();
                    log::warn!(
                        "Could not delete s3://{}/{}: {}",
                        bucket,
                        key,
                        error.message().unwrap_or("unknown error")
                    );
                    status.failed.push(format!("{}/{}", bucket, key));
                }
            }
        }
        Ok(status)
    }
}

fn map_get_err(path: &str, err: SdkError<GetObjectError>) -> AppError {
    match err {
        SdkError::ServiceError(ref se) if se.err().is_no_such_key() => {
            AppError::NotFound(path.to_string())
        }
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            AppError::Unavailable(format!("s3 get_object {}: {:?}", path, err))
        }
        other => AppError::ObjectStore(format!("s3 get_object failed for {}: {:?}", path, other)),
    }
}

fn map_head_err(err: SdkError<HeadObjectError>) -> AppError {
    match err {
        SdkError::ServiceError(ref se) if se.err().is_not_found() => {
            AppError::NotFound("no such key".to_string())
        }
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            AppError::Unavailable(format!("s3 head_object: {:?}", err))
        }
        other => AppError::ObjectStore(format!("s3 head_object failed: {:?}", other)),
    }
}
