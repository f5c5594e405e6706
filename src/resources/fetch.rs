//! Raw asset access: existence pre-flight and chunked binary reads.
//!
//! Natively assets resolve against the crate's asset root and are read in
//! chunks so callers can observe progress; on wasm32 they are fetched
//! relative to the document origin.

use crate::resources::{LoadError, ProgressObserver};

#[cfg(not(target_arch = "wasm32"))]
const ASSET_ROOT: &str = "./assets";

#[cfg(not(target_arch = "wasm32"))]
fn asset_path(file_name: &str) -> std::path::PathBuf {
    let given = std::path::Path::new(file_name);
    if given.is_absolute() {
        given.to_path_buf()
    } else {
        std::path::Path::new(ASSET_ROOT).join(given)
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> reqwest::Url {
    let window = web_sys::window().unwrap();
    let location = window.location();
    let origin = location.origin().unwrap();
    let base = reqwest::Url::parse(&format!("{}/", origin)).unwrap();
    base.join(file_name).unwrap()
}

/// The location a load attempt actually resolved to, for error context.
pub fn resolved_location(file_name: &str) -> String {
    #[cfg(target_arch = "wasm32")]
    {
        format_url(file_name).to_string()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        asset_path(file_name).display().to_string()
    }
}

/// Check that the asset exists before committing to the full load.
///
/// Reports a non-success HTTP status ([`LoadError::Status`]) on the web and
/// a missing file ([`LoadError::NotFound`]) natively.
pub async fn preflight(file_name: &str) -> Result<(), LoadError> {
    #[cfg(target_arch = "wasm32")]
    {
        let response = reqwest::get(format_url(file_name)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }
        Ok(())
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let path = asset_path(file_name);
        match tokio::fs::metadata(&path).await {
            Ok(_) => Ok(()),
            Err(_) => Err(LoadError::NotFound(path)),
        }
    }
}

/// Read the asset's bytes, reporting `(loaded, total)` after every chunk.
pub async fn load_binary(
    file_name: &str,
    mut progress: Option<ProgressObserver<'_>>,
) -> Result<Vec<u8>, LoadError> {
    #[cfg(target_arch = "wasm32")]
    {
        let response = reqwest::get(format_url(file_name)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }
        // The browser fetch hands us the body in one piece; report the
        // completed size so observers still see the final state.
        let data = response.bytes().await?.to_vec();
        if let Some(observer) = progress.as_mut() {
            observer(data.len() as u64, data.len() as u64);
        }
        Ok(data)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use tokio::io::AsyncReadExt;

        let path = asset_path(file_name);
        let mut file = tokio::fs::File::open(&path).await?;
        let total = file.metadata().await?.len();
        let mut data = Vec::with_capacity(total as usize);
        let mut buf = [0u8; 64 * 1024];
        loop {
            let read = file.read(&mut buf).await?;
            if read == 0 {
                break;
            }
            data.extend_from_slice(&buf[..read]);
            if let Some(observer) = progress.as_mut() {
                observer(data.len() as u64, total);
            }
        }
        Ok(data)
    }
}
