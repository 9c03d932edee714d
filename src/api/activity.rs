use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::AppError;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub kind: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    50
}

#[derive(Debug, Serialize)]
pub struct ActivityEntry {
    pub id: String,
    pub kind: String,
    pub subject: String,
    pub outcome: String,
    pub detail: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub data: Vec<ActivityEntry>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// GET /admin/activity
pub async fn query_activity(
    State(state): State<AppState>,
    Query(params): Query<ActivityQuery>,
) -> Result<Json<ActivityResponse>, AppError> {
    let page = params.page.max(1);
    let per_page = params.per_page.clamp(1, 500);
    let offset = (page - 1) * per_page;

    // Build query dynamically based on provided filters.
    let mut where_clauses: Vec<String> = Vec::new();
    let mut bind_values: Vec<String> = Vec::new();

    if let Some(ref kind) = params.kind {
        bind_values.push(kind.clone());
        where_clauses.push(format!("kind = ?{}", bind_values.len()));
    }
    if let Some(ref from) = params.from {
        bind_values.push(from.clone());
        where_clauses.push(format!("created_at >= ?{}", bind_values.len()));
    }
    if let Some(ref to) = params.to {
        bind_values.push(to.clone());
        where_clauses.push(format!("created_at <= ?{}", bind_values.len()));
    }

    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM action_log {where_sql}");
    let data_sql = format!(
        "SELECT id, kind, subject, outcome, detail, created_at \
         FROM action_log {where_sql} ORDER BY created_at DESC, id LIMIT ?{} OFFSET ?{}",
        bind_values.len() + 1,
        bind_values.len() + 2,
    );

    let result = state.db.with_conn(|conn| {
        // Count total matching rows.
        let total: i64 = {
            let mut stmt = conn.prepare(&count_sql)?;
            let p: Vec<&dyn rusqlite::ToSql> =
                bind_values.iter().map(|v| v as &dyn rusqlite::ToSql).collect();
            stmt.query_row(p.as_slice(), |row| row.get(0))?
        };

        // Fetch the page of data.
        let mut data_params: Vec<Box<dyn rusqlite::ToSql>> = bind_values
            .iter()
            .map(|v| Box::new(v.clone()) as Box<dyn rusqlite::ToSql>)
            .collect();
        data_params.push(Box::new(per_page as i64));
        data_params.push(Box::new(offset as i64));

        let mut stmt = conn.prepare(&data_sql)?;
        let p: Vec<&dyn rusqlite::ToSql> = data_params.iter().map(|v| v.as_ref()).collect();
        let rows = stmt.query_map(p.as_slice(), |row| {
            Ok(ActivityEntry {
                id: row.get(0)?,
                kind: row.get(1)?,
                subject: row.get(2)?,
                outcome: row.get(3)?,
                detail: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        let data: Vec<ActivityEntry> = rows.collect::<Result<Vec<_>, _>>()?;
        Ok((data, total))
    })?;

    let (data, total) = result;

    Ok(Json(ActivityResponse {
        data,
        page,
        per_page,
        total,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
