use logverse_core::remote::RemoteStore;
use logverse_core::session::Authenticator;
use logverse_core::Theme;

use crate::cli::{ThemeChoice, ThemeCommands};
use crate::commands::common::with_log;
use crate::context::AppContext;
use crate::error::CliError;

impl From<ThemeChoice> for Theme {
    fn from(choice: ThemeChoice) -> Self {
        match choice {
            ThemeChoice::Light => Self::Light,
            ThemeChoice::Dark => Self::Dark,
        }
    }
}

pub async fn run_theme<A: Authenticator, R: RemoteStore>(
    command: ThemeCommands,
    context: &AppContext<A, R>,
) -> Result<(), CliError> {
    let theme = with_log(context, |log| {
        Ok(match command {
            ThemeCommands::Show => log.theme(),
            ThemeCommands::Toggle => log.toggle_theme(),
            ThemeCommands::Set { theme } => {
                log.set_theme(theme.into());
                log.theme()
            }
        })
    })
    .await?;
    println!("{theme}");
    Ok(())
}
