use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Pool sizing assumes a handful of concurrent operators, not request
/// traffic; idle connections are released after five minutes.
fn connect_options(db_url: &str) -> ConnectOptions {
    let mut opt = ConnectOptions::new(db_url.to_owned());
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);
    opt
}

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(connect_options(db_url)).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_stays_small_for_operator_traffic() {
        let opt = connect_options("postgres://localhost:5432/dlq_manager");
        assert_eq!(opt.get_max_connections(), Some(10));
        assert_eq!(opt.get_min_connections(), Some(1));
        assert_eq!(opt.get_acquire_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(opt.get_idle_timeout(), Some(Some(Duration::from_secs(300))));
    }
}
