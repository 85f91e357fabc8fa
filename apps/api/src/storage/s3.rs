use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, info};
use uuid::Uuid;

use super::{sanitize_filename, FileBlob, FileStore, FileUpload, StoredFile};

/// S3 / MinIO backed file store. Every upload lands under a fresh
/// `uploads/<uuid>/` prefix, so two files with the same name never collide.
#[derive(Clone)]
pub struct S3FileStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3FileStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

pub fn object_key(file_name: &str) -> String {
    format!("uploads/{}/{}", Uuid::new_v4(), sanitize_filename(file_name))
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn upload(&self, file: &FileUpload) -> Result<StoredFile> {
        let key = object_key(&file.name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(file.bytes.clone()))
            .content_type(&file.content_type)
            .send()
            .await
            .map_err(|e| anyhow!("S3 upload failed: {e}"))?;

        info!(
            "Uploaded {} ({} bytes) to s3://{}/{}",
            file.name,
            file.bytes.len(),
            self.bucket,
            key
        );
        Ok(StoredFile { path: key })
    }

    async fn read(&self, path: &str) -> Result<Option<FileBlob>> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                if err.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                    debug!("No object at s3://{}/{}", self.bucket, path);
                    return Ok(None);
                }
                return Err(anyhow!("S3 read failed: {err}"));
            }
        };

        let content_type = output.content_type().map(str::to_owned);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| anyhow!("S3 body read failed: {e}"))?
            .into_bytes();

        Ok(Some(FileBlob {
            bytes,
            content_type,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_layout() {
        let key = object_key("My Resume.pdf");
        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "uploads");
        assert!(Uuid::parse_str(parts[1]).is_ok());
        assert_eq!(parts[2], "My_Resume.pdf");
    }

    #[test]
    fn test_object_keys_are_unique_per_upload() {
        assert_ne!(object_key("a.pdf"), object_key("a.pdf"));
    }
}
