use logverse_core::remote::RemoteStore;
use logverse_core::session::Authenticator;

use crate::cli::GridCommands;
use crate::commands::common::{format_grid_lines, parse_month, with_log};
use crate::context::AppContext;
use crate::error::CliError;

pub async fn run_grid<A: Authenticator, R: RemoteStore>(
    command: GridCommands,
    context: &AppContext<A, R>,
) -> Result<(), CliError> {
    let GridCommands::Show { month, json } = command;
    let month = parse_month(month.as_deref())?;

    let output = with_log(context, |log| {
        if json {
            let cells = log.month(month).cloned().unwrap_or_default();
            return Ok(serde_json::to_string_pretty(&cells)?);
        }
        Ok(format_grid_lines(month, log.month(month), log.activities()).join("\n"))
    })
    .await?;
    println!("{output}");
    Ok(())
}
