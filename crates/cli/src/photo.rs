use anyhow::{bail, Context, Result};
use generation::MediaPayload;
use std::path::Path;

/// Turn a `--photo` argument into something a memory can store.
///
/// URLs and data URIs are kept as they are; anything else is read from
/// disk and inlined as a data URI.
pub fn import_photo(arg: &str) -> Result<String> {
    let arg = arg.trim();
    if arg.starts_with("http://") || arg.starts_with("https://") || arg.starts_with("data:") {
        let payload = MediaPayload::parse(arg).map_err(|e| anyhow::anyhow!(e.user_message()))?;
        return Ok(payload.to_uri_string());
    }

    let path = Path::new(arg);
    let bytes = std::fs::read(path).with_context(|| format!("reading photo {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }
    let payload = MediaPayload::from_bytes(&bytes, None);
    match payload.mime() {
        Some(mime) if mime.starts_with("image/") => {
            tracing::debug!("Imported {} as {} ({} bytes)", path.display(), mime, bytes.len());
            Ok(payload.to_uri_string())
        }
        _ => bail!("{} is not a recognised image (png, jpeg, gif, webp)", path.display()),
    }
}

/// Write an inline payload to disk.
pub fn write_payload(payload: &MediaPayload, path: &Path) -> Result<usize> {
    let bytes = payload
        .decode_bytes()
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(bytes.len())
}

/// File extension for a MIME type, for default output names
pub fn extension_for(mime: Option<&str>) -> &'static str {
    match mime {
        Some("image/png") => "png",
        Some("image/jpeg") => "jpg",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        Some(m) if m.starts_with("video/") => "mp4",
        _ => "bin",
    }
}
