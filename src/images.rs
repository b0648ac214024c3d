//! Image upload handling for activity posts and team photos. Files land
//! in the uploads directory under a generated name; only the filename is
//! stored on the document.

use std::path::Path;

use log::info;
use rocket::fs::TempFile;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

fn extension_of(file: &TempFile<'_>) -> Option<String> {
    file.content_type()
        .and_then(|ct| ct.extension())
        .map(|e| e.to_string().to_lowercase())
        .or_else(|| {
            file.raw_name().and_then(|rn| {
                let s = rn.dangerous_unsafe_unsanitized_raw().as_str().to_string();
                s.rsplit('.').next().map(|e| e.to_lowercase())
            })
        })
}

/// Validate and persist an uploaded image. Returns the generated filename
/// to store on the document, or a user-facing error message.
pub async fn save_upload(
    file: &mut TempFile<'_>,
    prefix: &str,
    upload_dir: &Path,
) -> Result<String, String> {
    if file.len() == 0 {
        return Err("No file was uploaded".to_string());
    }
    if file.len() > MAX_UPLOAD_BYTES {
        return Err("Image must be smaller than 5MB".to_string());
    }

    let ext = extension_of(file).unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err("Only JPG, PNG and GIF images are allowed".to_string());
    }

    let filename = format!("{}_{}.{}", prefix, uuid::Uuid::new_v4().simple(), ext);
    if std::fs::create_dir_all(upload_dir).is_err() {
        return Err("Upload directory is not writable".to_string());
    }
    let dest = upload_dir.join(&filename);
    file.persist_to(&dest)
        .await
        .map_err(|e| format!("Failed to save image: {}", e))?;

    info!("image stored at {}", dest.display());
    Ok(filename)
}

/// Remove a previously stored upload. The name must be a bare filename;
/// anything path-like is refused.
pub fn delete_upload(upload_dir: &Path, filename: &str) -> bool {
    if filename.is_empty() || filename.contains('/') || filename.contains("..") {
        return false;
    }
    std::fs::remove_file(upload_dir.join(filename)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_like_names_are_refused() {
        let dir = std::env::temp_dir();
        assert!(!delete_upload(&dir, "../etc/passwd"));
        assert!(!delete_upload(&dir, "a/b.jpg"));
        assert!(!delete_upload(&dir, ""));
    }

    #[test]
    fn delete_removes_existing_file() {
        let dir = std::env::temp_dir().join(format!("hope-up-{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("pic.jpg"), b"x").unwrap();
        assert!(delete_upload(&dir, "pic.jpg"));
        assert!(!delete_upload(&dir, "pic.jpg"));
    }
}
