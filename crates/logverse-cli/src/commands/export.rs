use std::path::{Path, PathBuf};

use logverse_core::export::{
    render_export, suggested_export_file_name, ExportDocument, ExportFormat as CoreExportFormat,
};
use logverse_core::remote::RemoteStore;
use logverse_core::session::Authenticator;

use crate::cli::ExportFormat;
use crate::commands::common::with_log;
use crate::context::AppContext;
use crate::error::CliError;

impl From<ExportFormat> for CoreExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}

pub async fn run_export<A: Authenticator, R: RemoteStore>(
    format: ExportFormat,
    output_path: Option<&Path>,
    context: &AppContext<A, R>,
) -> Result<(), CliError> {
    let exported_at = chrono::Utc::now().timestamp();
    let document = with_log(context, |log| {
        Ok(ExportDocument {
            exported_at,
            theme: log.theme(),
            activities: log.activities().to_vec(),
            grid_data: log.grid_data().clone(),
        })
    })
    .await?;
    let rendered = render_export(&document, format.into())?;

    if let Some(path) = output_path {
        let path = export_target(path, format.into(), exported_at);
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

/// Where an export lands: `output` itself, or a timestamped file inside it
/// when it names an existing directory.
pub fn export_target(output: &Path, format: CoreExportFormat, exported_at: i64) -> PathBuf {
    if output.is_dir() {
        output.join(suggested_export_file_name(format, exported_at))
    } else {
        output.to_path_buf()
    }
}
