use sqlx::PgPool;

use crate::models::OdooCredential;

pub async fn find_by_tenant(pool: &PgPool, tenant_id: i32) -> Result<Option<OdooCredential>, sqlx::Error> {
    sqlx::query_as::<_, OdooCredential>(
        "SELECT id, tenant_id, odoo_base_url, odoo_db_name, odoo_username, encrypted_odoo_api_key \
         FROM odoo_credentials WHERE tenant_id = $1",
    )
    .bind(tenant_id)
    .fetch_optional(pool)
    .await
}

/// Inserts or replaces the tenant's single credential row.
pub async fn upsert(
    pool: &PgPool,
    tenant_id: i32,
    base_url: &str,
    db_name: &str,
    username: &str,
    encrypted_api_key: &str,
) -> Result<OdooCredential, sqlx::Error> {
    sqlx::query_as::<_, OdooCredential>(
        "INSERT INTO odoo_credentials (tenant_id, odoo_base_url, odoo_db_name, odoo_username, encrypted_odoo_api_key) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (tenant_id) DO UPDATE SET \
            odoo_base_url = EXCLUDED.odoo_base_url, \
            odoo_db_name = EXCLUDED.odoo_db_name, \
            odoo_username = EXCLUDED.odoo_username, \
            encrypted_odoo_api_key = EXCLUDED.encrypted_odoo_api_key, \
            updated_at = NOW() \
         RETURNING id, tenant_id, odoo_base_url, odoo_db_name, odoo_username, encrypted_odoo_api_key",
    )
    .bind(tenant_id)
    .bind(base_url)
    .bind(db_name)
    .bind(username)
    .bind(encrypted_api_key)
    .fetch_one(pool)
    .await
}
