//! Unity Catalog operations.

use serde_json::{json, Value};
use tracing::info;

use crate::client::ApiClient;
use crate::error::Result;
use crate::sql::{self, StatementOptions};

/// List catalogs visible to the caller.
pub async fn list_catalogs(client: &ApiClient) -> Result<Value> {
    info!("Listing catalogs");
    client.get("/api/2.1/unity-catalog/catalogs", &[]).await
}

/// Create a catalog.
pub async fn create_catalog(
    client: &ApiClient,
    name: &str,
    comment: Option<&str>,
) -> Result<Value> {
    info!(name, "Creating catalog");
    let mut payload = json!({ "name": name });
    if let Some(comment) = comment {
        payload["comment"] = json!(comment);
    }
    client.post("/api/2.1/unity-catalog/catalogs", &payload).await
}

/// List schemas within a catalog.
pub async fn list_schemas(client: &ApiClient, catalog_name: &str) -> Result<Value> {
    client
        .get(
            "/api/2.1/unity-catalog/schemas",
            &[("catalog_name", catalog_name.to_string())],
        )
        .await
}

/// Create a schema within a catalog.
pub async fn create_schema(
    client: &ApiClient,
    catalog_name: &str,
    name: &str,
    comment: Option<&str>,
) -> Result<Value> {
    info!(catalog_name, name, "Creating schema");
    let mut payload = json!({ "catalog_name": catalog_name, "name": name });
    if let Some(comment) = comment {
        payload["comment"] = json!(comment);
    }
    client.post("/api/2.1/unity-catalog/schemas", &payload).await
}

/// List tables within a schema.
pub async fn list_tables(
    client: &ApiClient,
    catalog_name: &str,
    schema_name: &str,
) -> Result<Value> {
    client
        .get(
            "/api/2.1/unity-catalog/tables",
            &[
                ("catalog_name", catalog_name.to_string()),
                ("schema_name", schema_name.to_string()),
            ],
        )
        .await
}

/// Create a table by executing a `CREATE TABLE` statement on a warehouse.
///
/// Unity Catalog has no direct create-table REST endpoint; table DDL goes
/// through the SQL statements API.
pub async fn create_table(client: &ApiClient, warehouse_id: &str, statement: &str) -> Result<Value> {
    sql::execute_statement(client, statement, warehouse_id, &StatementOptions::default()).await
}

/// Lineage of a table, addressed by its fully qualified name.
pub async fn get_table_lineage(client: &ApiClient, full_name: &str) -> Result<Value> {
    client
        .get(
            &format!("/api/2.1/unity-catalog/lineage-tracking/table-lineage/{full_name}"),
            &[],
        )
        .await
}
