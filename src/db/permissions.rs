use sqlx::SqlitePool;

/// Role/permission predicate backed by the `role_permissions` table.
/// Unknown roles simply have no rows, so the check comes back false.
pub async fn role_has_permission(
    pool: &SqlitePool,
    role: &str,
    permission: &str,
) -> Result<bool, sqlx::Error> {
    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM role_permissions WHERE role = $1 AND permission = $2",
    )
    .bind(role)
    .bind(permission)
    .fetch_one(pool)
    .await?;
    Ok(count.0 > 0)
}

pub async fn permissions_for_role(
    pool: &SqlitePool,
    role: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT permission FROM role_permissions WHERE role = $1 ORDER BY permission")
            .bind(role)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(p,)| p).collect())
}
