//! Filesystem-backed object storage for generated and uploaded letter files.
//!
//! Files live under the configured storage root and are addressed by a
//! bucket-relative path derived from the request's reference number, e.g.
//! `surat/SUK-202501-0001.pdf`. Saving overwrites any existing object
//! (upsert semantics), so re-uploading a letter replaces the previous file
//! at the same deterministic path.
//!
//! Downloads go through `GET /files/{path}` and require a time-limited
//! signature: `signed_url` appends an expiry and a hex SHA-256 MAC over
//! `path|expiry|secret`, and `process_download` validates both before
//! serving the file.

use crate::config::Config;
use crate::error::ServiceError;
use actix_files::NamedFile;
use actix_web::{web, HttpRequest, HttpResponse};
use log::warn;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Signed URLs are valid for one hour.
const SIGNED_URL_TTL_SECS: i64 = 3600;

/// Writes `bytes` at `path` under the storage root, creating parent
/// directories and overwriting any previous object.
pub fn save(cfg: &Config, path: &str, bytes: &[u8]) -> Result<String, ServiceError> {
    let target = resolve(cfg, path)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, bytes)?;
    Ok(public_url(path))
}

/// The stable, unauthenticated URL form stored in the database.
pub fn public_url(path: &str) -> String {
    format!("/files/{}", path)
}

/// A time-limited download URL for `path`.
pub fn signed_url(cfg: &Config, path: &str) -> String {
    let exp = chrono::Utc::now().timestamp() + SIGNED_URL_TTL_SECS;
    format!("/files/{}?exp={}&sig={}", path, exp, mac(cfg, path, exp))
}

/// Signs the stored file URL of a request, falling back to the stored URL
/// when it does not point into this storage area.
pub fn sign_file_url(cfg: &Config, file_url: &str) -> String {
    match file_url.strip_prefix("/files/") {
        Some(path) => signed_url(cfg, path),
        None => {
            warn!("file url {} is not storage-backed, serving as-is", file_url);
            file_url.to_string()
        }
    }
}

fn mac(cfg: &Config, path: &str, exp: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update(b"|");
    hasher.update(exp.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(cfg.signing_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Maps a bucket-relative path onto the storage root, rejecting traversal.
fn resolve(cfg: &Config, path: &str) -> Result<PathBuf, ServiceError> {
    let rel = Path::new(path);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(ServiceError::Validation("Invalid storage path".to_string()));
    }
    Ok(Path::new(&cfg.storage_root).join(rel))
}

#[derive(Deserialize)]
pub struct DownloadQuery {
    exp: Option<i64>,
    sig: Option<String>,
}

/// `GET /files/{path}` — serves a stored object when the signature checks
/// out and has not expired.
pub async fn process_download(
    req: HttpRequest,
    cfg: web::Data<Config>,
    path: web::Path<String>,
    query: web::Query<DownloadQuery>,
) -> Result<HttpResponse, ServiceError> {
    let path = path.into_inner();
    let (exp, sig) = match (query.exp, query.sig.as_deref()) {
        (Some(exp), Some(sig)) => (exp, sig),
        _ => return Err(ServiceError::Unauthorized),
    };
    if exp < chrono::Utc::now().timestamp() || mac(&cfg, &path, exp) != sig {
        return Err(ServiceError::Unauthorized);
    }

    let target = resolve(&cfg, &path)?;
    let file = NamedFile::open(target).map_err(|_| ServiceError::NotFound("File"))?;
    Ok(file.into_response(&req))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(root: &str) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            db_path: ":memory:".to_string(),
            storage_root: root.to_string(),
            reference_prefix: "SUK".to_string(),
            signing_secret: "secret".to_string(),
            resend_api_key: None,
            site_url: "http://localhost".to_string(),
            fonts_dir: "./fonts".to_string(),
        }
    }

    #[test]
    fn save_is_overwrite_on_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path().to_str().unwrap());

        let url = save(&cfg, "surat/SUK-202501-0001.pdf", b"first").unwrap();
        assert_eq!(url, "/files/surat/SUK-202501-0001.pdf");
        save(&cfg, "surat/SUK-202501-0001.pdf", b"second").unwrap();

        let stored = fs::read(dir.path().join("surat/SUK-202501-0001.pdf")).unwrap();
        assert_eq!(stored, b"second");
    }

    #[test]
    fn traversal_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path().to_str().unwrap());
        assert!(save(&cfg, "../outside.pdf", b"x").is_err());
    }

    #[test]
    fn signed_url_round_trips_through_mac_check() {
        let cfg = test_config("/tmp/storage");
        let url = signed_url(&cfg, "surat/SUK-202501-0001.pdf");
        // /files/{path}?exp={exp}&sig={sig}
        let query = url.split_once('?').unwrap().1;
        let mut exp = 0;
        let mut sig = String::new();
        for pair in query.split('&') {
            let (k, v) = pair.split_once('=').unwrap();
            match k {
                "exp" => exp = v.parse().unwrap(),
                "sig" => sig = v.to_string(),
                _ => {}
            }
        }
        assert_eq!(mac(&cfg, "surat/SUK-202501-0001.pdf", exp), sig);
        assert!(exp > chrono::Utc::now().timestamp());
    }

    #[test]
    fn non_storage_urls_pass_through_signing() {
        let cfg = test_config("/tmp/storage");
        assert_eq!(
            sign_file_url(&cfg, "https://elsewhere.example/surat.pdf"),
            "https://elsewhere.example/surat.pdf"
        );
    }
}
