mod cli;
mod infra;
mod routes;
mod server;

use reidentify::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
