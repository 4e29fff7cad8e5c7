use sqlx::PgPool;

pub async fn create_pool(url: &str) -> PgPool {
    sqlx::postgres::PgPool::connect(url)
        .await
        .expect("error while connecting to db")
}

pub async fn migrate(pool: &PgPool) {
    sqlx::migrate!()
        .run(pool)
        .await
        .expect("error in migrations")
}
