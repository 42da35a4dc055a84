use logverse_core::remote::RemoteStore;
use logverse_core::session::Authenticator;

use crate::cli::CellCommands;
use crate::commands::common::{format_cell, parse_cell_target, with_log};
use crate::context::AppContext;
use crate::error::CliError;

pub async fn run_cell<A: Authenticator, R: RemoteStore>(
    command: CellCommands,
    context: &AppContext<A, R>,
) -> Result<(), CliError> {
    match command {
        CellCommands::Set {
            date,
            hour,
            activity,
            note,
        } => {
            let target = parse_cell_target(&date, &hour)?;
            let line = with_log(context, |log| {
                log.update_cell(
                    target.month,
                    &target.date_key,
                    target.hour,
                    Some(&activity),
                    &note,
                )?;
                let cell = log
                    .cell(target.month, &target.date_key, target.hour)
                    .ok_or_else(|| CliError::CellNotFound(target.label()))?;
                Ok(format_cell(log.activities(), cell))
            })
            .await?;
            println!("{}: {line}", target.label());
        }
        CellCommands::Clear { date, hour } => {
            let target = parse_cell_target(&date, &hour)?;
            with_log(context, |log| {
                Ok(log.update_cell(target.month, &target.date_key, target.hour, None, "")?)
            })
            .await?;
            println!("Cleared {}", target.label());
        }
        CellCommands::Show { date, hour } => {
            let target = parse_cell_target(&date, &hour)?;
            let line = with_log(context, |log| {
                log.cell(target.month, &target.date_key, target.hour)
                    .map(|cell| format_cell(log.activities(), cell))
                    .ok_or_else(|| CliError::CellNotFound(target.label()))
            })
            .await?;
            println!("{}: {line}", target.label());
        }
    }
    Ok(())
}
