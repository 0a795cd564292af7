use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const DB_FILE: &str = "planbook.sqlite3";
const MANIFEST_ENTRY: &str = "manifest.json";
const DB_ENTRY: &str = "db/planbook.sqlite3";
pub const BUNDLE_FORMAT: &str = "planbook-workspace-v1";
pub const RAW_SQLITE_FORMAT: &str = "sqlite3-file";

const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub db_sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub db_sha256: String,
}

/// Fans every write out to the destination and the running digest.
struct HashingWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: Sha256,
}

impl<W: Write> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Copies `src` into `dst`, returning the SHA-256 of the bytes copied.
fn copy_hashed(src: &mut impl Read, dst: &mut impl Write) -> std::io::Result<String> {
    let mut tee = HashingWriter {
        inner: dst,
        hasher: Sha256::new(),
    };
    std::io::copy(src, &mut tee)?;
    Ok(hex::encode(tee.hasher.finalize()))
}

pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let db_path = workspace_path.join(DB_FILE);
    if !db_path.is_file() {
        return Err(anyhow!(
            "workspace database not found: {}",
            db_path.to_string_lossy()
        ));
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    // Database first so the manifest can carry its digest.
    zip.start_file(DB_ENTRY, opts)
        .context("failed to start database entry")?;
    let mut db_file = File::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.to_string_lossy()))?;
    let digest = copy_hashed(&mut db_file, &mut zip).context("failed to write database entry")?;

    let manifest = json!({
        "format": BUNDLE_FORMAT,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "dbSha256": digest,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT.to_string(),
        entry_count: 2,
        db_sha256: digest,
    })
}

/// Restores a bundle (or a bare SQLite file) into `workspace_path`. The new
/// database is staged next to the live one and renamed over it only after
/// it has been fully written and verified.
pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;
    let dst = workspace_path.join(DB_FILE);
    let tmp_dst = workspace_path.join(format!("{}.importing", DB_FILE));
    if tmp_dst.exists() {
        let _ = std::fs::remove_file(&tmp_dst);
    }

    let staged = match sniff(in_path)? {
        Kind::Zip => stage_from_bundle(in_path, &tmp_dst),
        Kind::Sqlite => stage_raw(in_path, &tmp_dst),
        Kind::Unknown => Err(anyhow!(
            "not a planbook bundle or SQLite database: {}",
            in_path.to_string_lossy()
        )),
    };
    let summary = match staged {
        Ok(s) => s,
        Err(e) => {
            let _ = std::fs::remove_file(&tmp_dst);
            return Err(e);
        }
    };

    std::fs::rename(&tmp_dst, &dst).with_context(|| {
        format!(
            "failed to move imported database to {}",
            dst.to_string_lossy()
        )
    })?;
    Ok(summary)
}

fn stage_from_bundle(in_path: &Path, tmp_dst: &Path) -> anyhow::Result<ImportSummary> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }
    let expected = manifest
        .get("dbSha256")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("manifest.json has no dbSha256"))?
        .to_ascii_lowercase();

    let mut db_out = File::create(tmp_dst).with_context(|| {
        format!(
            "failed to create temp database {}",
            tmp_dst.to_string_lossy()
        )
    })?;
    let actual = {
        let mut db_entry = archive
            .by_name(DB_ENTRY)
            .context("bundle missing db/planbook.sqlite3")?;
        copy_hashed(&mut db_entry, &mut db_out).context("failed to extract database entry")?
    };
    db_out
        .sync_all()
        .context("failed to flush extracted database")?;

    if actual != expected {
        return Err(anyhow!(
            "database digest mismatch: manifest {} but bundle contains {}",
            expected,
            actual
        ));
    }
    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT.to_string(),
        db_sha256: actual,
    })
}

fn stage_raw(in_path: &Path, tmp_dst: &Path) -> anyhow::Result<ImportSummary> {
    let mut src = File::open(in_path)
        .with_context(|| format!("failed to open {}", in_path.to_string_lossy()))?;
    let mut out = File::create(tmp_dst).with_context(|| {
        format!(
            "failed to create temp database {}",
            tmp_dst.to_string_lossy()
        )
    })?;
    let digest = copy_hashed(&mut src, &mut out).context("failed to copy database file")?;
    out.sync_all().context("failed to flush copied database")?;
    Ok(ImportSummary {
        bundle_format_detected: RAW_SQLITE_FORMAT.to_string(),
        db_sha256: digest,
    })
}

enum Kind {
    Zip,
    Sqlite,
    Unknown,
}

fn sniff(path: &Path) -> anyhow::Result<Kind> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 16];
    let mut read = 0;
    while read < sig.len() {
        let n = f
            .read(&mut sig[read..])
            .context("failed to read file signature")?;
        if n == 0 {
            break;
        }
        read += n;
    }
    if read >= 4 && sig[..4] == ZIP_MAGIC {
        return Ok(Kind::Zip);
    }
    if read == sig.len() && &sig == SQLITE_MAGIC {
        return Ok(Kind::Sqlite);
    }
    Ok(Kind::Unknown)
}
