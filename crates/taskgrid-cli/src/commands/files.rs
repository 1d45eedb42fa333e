//! File listing, upload and deletion.

use anyhow::anyhow;
use serde_json::json;
use taskgrid_client::FileUpload;

use crate::cli::{FileDeleteArgs, FileUploadArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{emit, files_table};

pub(crate) async fn handle_files(ctx: &AppContext) -> CliResult<()> {
    let store = ctx.file_store();
    store
        .fetch_files()
        .await
        .map_err(|err| ctx.reported(&err))?;
    emit(ctx.output, store.snapshot().files.as_slice(), files_table)
}

pub(crate) async fn handle_file_upload(ctx: &AppContext, args: FileUploadArgs) -> CliResult<()> {
    let file_name = args
        .path
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            CliError::validation(format!("'{}' does not name a file", args.path.display()))
        })?
        .to_string();
    let bytes = tokio::fs::read(&args.path).await.map_err(|err| {
        CliError::failure(anyhow!("failed to read '{}': {err}", args.path.display()))
    })?;
    tracing::debug!(file_name = %file_name, size = bytes.len(), "uploading file");

    let file_id = ctx
        .file_store()
        .upload_file(FileUpload::new(file_name, bytes))
        .await
        .map_err(|err| ctx.reported(&err))?;
    emit(ctx.output, &json!({ "file_id": &file_id }), |_| format!("{file_id}\n"))
}

pub(crate) async fn handle_file_delete(ctx: &AppContext, args: FileDeleteArgs) -> CliResult<()> {
    ctx.file_store()
        .delete_file(&args.file_id)
        .await
        .map_err(|err| ctx.reported(&err))
}
