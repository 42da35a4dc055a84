use logverse_core::auth::AuthError;
use logverse_core::remote::RemoteStore;
use logverse_core::session::Authenticator;

use crate::cli::AuthCommands;
use crate::context::AppContext;
use crate::error::CliError;

pub async fn run_auth<A: Authenticator, R: RemoteStore>(
    command: AuthCommands,
    context: &AppContext<A, R>,
) -> Result<(), CliError> {
    let sessions = &context.sessions;
    match command {
        AuthCommands::Signup { email, password } => {
            match sessions.sign_up(&email, &password).await {
                Ok(user) => println!("Signed up and signed in as {}", user.email),
                Err(AuthError::ConfirmationRequired) => {
                    println!("{}", AuthError::ConfirmationRequired);
                }
                Err(error) => return Err(context.auth_error(error)),
            }
            Ok(())
        }
        AuthCommands::Login { email, password } => {
            let user = sessions
                .sign_in(&email, &password)
                .await
                .map_err(|error| context.auth_error(error))?;
            println!("Signed in as {}", user.email);
            Ok(())
        }
        AuthCommands::Status => {
            let mode = if sessions.is_remote() {
                "remote"
            } else {
                "local-only"
            };
            match sessions.current_user().await? {
                Some(user) => println!("Signed in as {} ({}), {mode} mode", user.email, user.id),
                None => println!("Not signed in, {mode} mode"),
            }
            Ok(())
        }
        AuthCommands::Logout => {
            sessions.sign_out().await?;
            println!("Signed out");
            Ok(())
        }
    }
}
