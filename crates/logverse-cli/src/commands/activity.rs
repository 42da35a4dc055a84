use logverse_core::remote::RemoteStore;
use logverse_core::session::Authenticator;

use crate::cli::ActivityCommands;
use crate::commands::common::{format_activity_lines, with_log};
use crate::context::AppContext;
use crate::error::CliError;

pub async fn run_activity<A: Authenticator, R: RemoteStore>(
    command: ActivityCommands,
    context: &AppContext<A, R>,
) -> Result<(), CliError> {
    match command {
        ActivityCommands::List { json } => {
            let activities = with_log(context, |log| Ok(log.activities().to_vec())).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&activities)?);
            } else {
                for line in format_activity_lines(&activities) {
                    println!("{line}");
                }
            }
        }
        ActivityCommands::Add { name, color } => {
            let id = with_log(context, |log| Ok(log.add_activity(&name, &color)?)).await?;
            println!("{id}");
        }
        ActivityCommands::Update { id, name, color } => {
            with_log(context, |log| {
                let current = log
                    .activity(&id)
                    .cloned()
                    .ok_or_else(|| CliError::ActivityNotFound(id.clone()))?;
                log.update_activity(
                    &id,
                    name.as_deref().unwrap_or(&current.name),
                    color.as_deref().unwrap_or(&current.color),
                )?;
                Ok(())
            })
            .await?;
            println!("Updated {id}");
        }
        ActivityCommands::Delete { id } => {
            let deleted = with_log(context, |log| Ok(log.delete_activity(&id))).await?;
            if !deleted {
                return Err(CliError::ActivityNotFound(id));
            }
            println!("Deleted {id}");
        }
    }
    Ok(())
}
