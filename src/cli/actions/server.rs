use crate::{
    aula,
    cli::{actions::Action, globals::GlobalArgs},
};
use anyhow::Result;

/// Handle the server action
/// # Errors
/// Returns an error if the server fails to start.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port, dsn } => aula::new(port, dsn, globals).await,
    }
}
