//! Walks scan roots, registers matching files and queues them for a model.

use crate::models::{ModelCategory, ModelKind};
use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task;
use tracing::debug;
use walkdir::WalkDir;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "oga", "wav", "m4a", "opus"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "heic"];

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct ScanSummary {
    pub discovered: usize,
    pub enqueued: usize,
}

pub fn accepts(category: ModelCategory, path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_lowercase();
    let known = match category {
        ModelCategory::Audio => AUDIO_EXTENSIONS,
        ModelCategory::Image => IMAGE_EXTENSIONS,
    };
    known.contains(&ext.as_str())
}

/// Files already queued for `model` are not queued twice.
pub async fn scan(
    roots: &[PathBuf],
    excludes: &[String],
    root_id: i64,
    model: ModelKind,
    pool: &SqlitePool,
) -> anyhow::Result<ScanSummary> {
    let (tx, mut rx) = mpsc::channel::<PathBuf>(100);
    let exclude_set = build_globset(excludes)?;
    let roots = roots.to_vec();
    let category = model.category();

    let walker_handle = task::spawn_blocking(move || {
        for root in roots {
            for entry in WalkDir::new(root)
                .follow_links(true)
                .into_iter()
                .filter_entry(|e| {
                    e.depth() == 0 || (!is_hidden(e.path()) && !exclude_set.is_match(e.path()))
                })
            {
                let entry = match entry {
                    Ok(e) => e,
                    Err(_) => continue,
                };
                let path = entry.path();
                if !entry.file_type().is_file() || !accepts(category, path) {
                    continue;
                }
                if tx.blocking_send(path.to_path_buf()).is_err() {
                    // Receiver dropped, stop walking.
                    return;
                }
            }
        }
    });

    let mut summary = ScanSummary::default();
    while let Some(path) = rx.recv().await {
        let path_str = path.to_string_lossy().to_string();
        let file_id = storage::files::upsert(pool, &path_str, root_id)
            .await
            .with_context(|| format!("Failed to register file: {:?}", path))?;
        summary.discovered += 1;
        if storage::queue::push(pool, model.name(), file_id, root_id, &path_str).await? {
            summary.enqueued += 1;
        } else {
            debug!(file_id, "already queued");
        }
    }

    walker_handle.await?;
    Ok(summary)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
