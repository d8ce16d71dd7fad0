//! Google Cloud Storage object store
//!
//! Uploaded PDFs are written under their filename and addressed as
//! `gs://<bucket>/<filename>`.

use async_trait::async_trait;

use google_cloud_storage::client::{Client as GcsClient, ClientConfig};
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::list::ListObjectsRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use google_cloud_storage::http::Error as GcsError;

use crate::error::{Error, Result};
use crate::providers::object_store::{ObjectStore, RemoteLocator};
use crate::retry::RetryPolicy;

/// Locator scheme for GCS objects
pub const GCS_SCHEME: &str = "gs";

/// Google Cloud Storage object store
pub struct GcsObjectStore {
    client: GcsClient,
    bucket: String,
    retry: RetryPolicy,
}

impl GcsObjectStore {
    /// Create a new GCS object store using application default credentials
    pub async fn new(bucket: impl Into<String>, retry: RetryPolicy) -> Result<Self> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| Error::Config(format!("Failed to create GCS client: {}", e)))?;

        let bucket = bucket.into();
        tracing::info!("GCS object store for bucket {}", bucket);

        Ok(Self {
            client: GcsClient::new(config),
            bucket,
            retry,
        })
    }

    /// GCS URI for an object key
    pub fn gcs_uri(&self, key: &str) -> String {
        RemoteLocator::new(GCS_SCHEME, &self.bucket, key).to_string()
    }
}

/// Keep the HTTP status of GCS error responses so 429/5xx are retried
fn gcs_error(action: &str, err: GcsError) -> Error {
    match &err {
        GcsError::Response(response) => Error::Upstream {
            service: "gcs",
            status: response.code,
            message: format!("{}: {}", action, response.message),
        },
        _ => Error::object_store(format!("{}: {}", action, err)),
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn put(&self, key: &str, content_type: &str, data: Vec<u8>) -> Result<String> {
        let request = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };
        let mut media = Media::new(key.to_string());
        media.content_type = content_type.to_string().into();
        let upload_type = UploadType::Simple(media);

        let size = data.len();
        let (data, request, upload_type) = (&data, &request, &upload_type);
        self.retry
            .run("GCS upload", || {
                let data = data.clone();
                async move {
                    self.client
                        .upload_object(request, data, upload_type)
                        .await
                        .map_err(|e| gcs_error("Failed to upload to GCS", e))
                }
            })
            .await?;

        let uri = self.gcs_uri(key);
        tracing::info!(bytes = size, "Uploaded {}", uri);
        Ok(uri)
    }

    async fn fetch(&self, locator: &RemoteLocator) -> Result<Vec<u8>> {
        if locator.scheme != GCS_SCHEME {
            return Err(Error::object_store(format!(
                "Not a GCS locator: {}",
                locator
            )));
        }

        let request = GetObjectRequest {
            bucket: locator.bucket.clone(),
            object: locator.key.clone(),
            ..Default::default()
        };

        let request = &request;
        self.retry
            .run("GCS download", || async move {
                self.client
                    .download_object(request, &Range::default())
                    .await
                    .map_err(|e| gcs_error("Failed to download from GCS", e))
            })
            .await
    }

    fn scheme(&self) -> &str {
        GCS_SCHEME
    }

    async fn health_check(&self) -> Result<bool> {
        // Try to list objects (with limit 1) to check bucket access
        let list_request = ListObjectsRequest {
            bucket: self.bucket.clone(),
            max_results: Some(1),
            ..Default::default()
        };

        match self.client.list_objects(&list_request).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("GCS health check failed: {}", e);
                Ok(false)
            }
        }
    }

    fn name(&self) -> &str {
        "gcs"
    }
}
