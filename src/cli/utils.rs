use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::config::{load_server_config, require_session};
use crate::cli::OutputFormat;
use crate::client::{HttpClient, UploadFile};
use crate::guard::{Access, RouteGuard};
use crate::session::Session;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    collection_name: []
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Left-aligned columns sized to their widest cell
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    println!("{}", line(headers.to_vec()));
    for row in rows {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
}

/// Client for the configured gateway, optionally carrying the session's token
pub fn client(session: Option<&Session>) -> anyhow::Result<HttpClient> {
    let server = load_server_config()?;
    let mut builder = HttpClient::builder(server.url);
    if let Some(session) = session {
        builder = builder.token(session.access_token.clone());
    }
    Ok(builder.build()?)
}

/// Stored session plus a client that sends its token
pub fn authed_client() -> anyhow::Result<(Session, HttpClient)> {
    let session = require_session()?;
    let client = client(Some(&session))?;
    Ok((session, client))
}

/// Refuse pages the session's roles do not cover
pub fn ensure_access(session: &Session, path: &str) -> anyhow::Result<()> {
    match RouteGuard::new().check(Some(session), path) {
        Access::Allow => Ok(()),
        Access::RedirectSignIn => Err(anyhow::anyhow!("Not logged in. Run 'reqs auth login <email>' first")),
        Access::RedirectNotFound => Err(anyhow::anyhow!("Page not found: {}", path)),
    }
}

pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let ct = match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return None,
    };
    Some(ct)
}

pub fn read_upload(path: &Path) -> anyhow::Result<UploadFile> {
    let bytes = fs::read(path).map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))?
        .to_string();
    Ok(UploadFile {
        file_name,
        content_type: content_type_for(path).map(str::to_string),
        bytes: Bytes::from(bytes),
    })
}

/// Last path component of a server-supplied name, so it cannot escape the working directory
fn local_file_name(name: &str) -> PathBuf {
    Path::new(name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("download"))
}

/// Write bytes to `target`, or to `fallback_name` in the working directory
pub fn write_output(target: Option<PathBuf>, fallback_name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    let path = target.unwrap_or_else(|| local_file_name(fallback_name));
    fs::write(&path, bytes).map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for(Path::new("quote.PDF")), Some("application/pdf"));
        assert_eq!(content_type_for(Path::new("sig.jpeg")), Some("image/jpeg"));
        assert_eq!(content_type_for(Path::new("archive.bin")), None);
        assert_eq!(content_type_for(Path::new("README")), None);
    }

    #[test]
    fn upload_reads_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.txt");
        fs::write(&path, b"net 30").unwrap();

        let file = read_upload(&path).unwrap();
        assert_eq!(file.file_name, "terms.txt");
        assert_eq!(file.content_type.as_deref(), Some("text/plain"));
        assert_eq!(&file.bytes[..], b"net 30");
    }

    #[test]
    fn server_names_are_reduced_to_file_names() {
        assert_eq!(local_file_name("../../etc/passwd"), PathBuf::from("passwd"));
        assert_eq!(local_file_name("quote.pdf"), PathBuf::from("quote.pdf"));
        assert_eq!(local_file_name(".."), PathBuf::from("download"));
    }

    #[test]
    fn explicit_target_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.pdf");
        let written = write_output(Some(target.clone()), "ignored.pdf", b"x").unwrap();
        assert_eq!(written, target);
        assert_eq!(fs::read(&target).unwrap(), b"x");
    }
}
