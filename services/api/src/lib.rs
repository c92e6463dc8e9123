mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use gut_catcher::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
