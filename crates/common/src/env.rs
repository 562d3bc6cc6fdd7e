//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::{info, warn};

/// Ensure the upload directory exists and is writable.
pub async fn ensure_upload_dir(upload_dir: &str) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {upload_dir}: {e}"))?;

    let meta = tokio::fs::metadata(upload_dir).await?;
    if meta.permissions().readonly() {
        warn!(%upload_dir, "upload directory is read-only; uploads will fail");
    } else {
        info!(%upload_dir, "upload directory ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_nested_upload_dir() {
        let base = std::env::temp_dir().join(format!("cms-env-{}", std::process::id()));
        let nested = base.join("a/b/uploads");
        ensure_upload_dir(nested.to_str().unwrap()).await.unwrap();
        assert!(nested.is_dir());
        let _ = std::fs::remove_dir_all(&base);
    }
}
