//! Simple REST API server example for the points ledger.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /accounts` - Open a member account
//! - `GET /accounts` - List all accounts with balances
//! - `GET /accounts/:id` - Get one account
//! - `POST /entries` - Record a point transaction (earn or redeem)
//! - `GET /entries` - List entries, filterable by account and kind
//! - `GET /entries/:id` - Get one entry
//! - `PUT /entries/:id` - Rewrite an entry's kind/points
//! - `DELETE /entries/:id` - Delete an entry
//!
//! ## Example Usage
//!
//! ```bash
//! # Open an account
//! curl -X POST http://localhost:3000/accounts \
//!   -H "Content-Type: application/json" -d '{"account_id": 1}'
//!
//! # Earn points
//! curl -X POST http://localhost:3000/entries \
//!   -H "Content-Type: application/json" \
//!   -d '{"account_id": 1, "kind": "EARNED", "points": 100}'
//!
//! # Redeem points
//! curl -X POST http://localhost:3000/entries \
//!   -H "Content-Type: application/json" \
//!   -d '{"account_id": 1, "kind": "REDEEMED", "points": 40}'
//!
//! # Check the balance
//! curl http://localhost:3000/accounts/1
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use points_ledger_rs::{AccountId, EntryId, EntryKind, Ledger, LedgerEntry, LedgerError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

// === Request/Response DTOs ===

/// Request body for opening an account.
#[derive(Debug, Deserialize)]
pub struct OpenAccountRequest {
    pub account_id: u32,
}

/// Request body for recording a point transaction.
///
/// ```json
/// {"account_id": 1, "kind": "EARNED", "points": 100}
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub account_id: u32,
    pub kind: EntryKind,
    pub points: i64,
}

/// Request body for rewriting an entry.
#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
    pub kind: EntryKind,
    pub points: i64,
}

/// Optional filters for entry listings.
#[derive(Debug, Deserialize)]
pub struct EntryFilter {
    pub account_id: Option<u32>,
    pub kind: Option<EntryKind>,
}

/// Response body for account information.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub account: u32,
    pub balance: i64,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the ledger.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

// === Error Handling ===

/// Wrapper for converting `LedgerError` into HTTP responses.
pub struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            LedgerError::InvalidPoints => (StatusCode::BAD_REQUEST, "INVALID_POINTS"),
            LedgerError::AccountExists(_) => (StatusCode::CONFLICT, "ACCOUNT_EXISTS"),
            LedgerError::AccountNotFound(_) => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
            LedgerError::EntryNotFound(_) => (StatusCode::NOT_FOUND, "ENTRY_NOT_FOUND"),
            LedgerError::InsufficientBalance => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_BALANCE")
            }
            LedgerError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILURE"),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /accounts - Open a member account.
async fn open_account(
    State(state): State<AppState>,
    Json(request): Json<OpenAccountRequest>,
) -> Result<StatusCode, AppError> {
    state.ledger.open_account(AccountId(request.account_id))?;
    Ok(StatusCode::CREATED)
}

/// GET /accounts/:id - Get one account with its balance.
async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<AccountResponse>, AppError> {
    let balance = state.ledger.balance(AccountId(id))?;
    Ok(Json(AccountResponse {
        account: id,
        balance,
    }))
}

/// GET /accounts - List all accounts.
async fn list_accounts(State(state): State<AppState>) -> Json<Vec<AccountResponse>> {
    let accounts = state
        .ledger
        .accounts()
        .iter()
        .map(|account| AccountResponse {
            account: account.id().0,
            balance: account.balance(),
        })
        .collect();

    Json(accounts)
}

/// POST /entries - Record a point transaction.
async fn create_entry(
    State(state): State<AppState>,
    Json(request): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<LedgerEntry>), AppError> {
    let entry = state.ledger.create_entry(
        AccountId(request.account_id),
        request.kind,
        request.points,
    )?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /entries/:id - Get one entry.
async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<LedgerEntry>, AppError> {
    let entry = state.ledger.entry(EntryId(id))?;
    Ok(Json(entry))
}

/// GET /entries - List entries, optionally filtered by account and kind.
async fn list_entries(
    State(state): State<AppState>,
    Query(filter): Query<EntryFilter>,
) -> Json<Vec<LedgerEntry>> {
    let entries = match filter.account_id {
        Some(account_id) => state.ledger.entries_for_account(AccountId(account_id)),
        None => state.ledger.entries(),
    };

    let entries = entries
        .into_iter()
        .filter(|entry| filter.kind.is_none_or(|kind| entry.kind == kind))
        .collect();

    Json(entries)
}

/// PUT /entries/:id - Rewrite an entry's kind and points.
async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateEntryRequest>,
) -> Result<Json<LedgerEntry>, AppError> {
    let entry = state
        .ledger
        .update_entry(EntryId(id), request.kind, request.points)?;
    Ok(Json(entry))
}

/// DELETE /entries/:id - Delete an entry, rolling back its effect.
async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    state.ledger.delete_entry(EntryId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/accounts", post(open_account).get(list_accounts))
        .route("/accounts/{id}", get(get_account))
        .route("/entries", post(create_entry).get(list_entries))
        .route(
            "/entries/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    let state = AppState {
        ledger: Arc::new(Ledger::new()),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Points ledger API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST   /accounts      - Open an account");
    println!("  GET    /accounts      - List accounts");
    println!("  GET    /accounts/:id  - Get an account");
    println!("  POST   /entries       - Record a point transaction");
    println!("  GET    /entries       - List entries (?account_id=&kind=)");
    println!("  GET    /entries/:id   - Get an entry");
    println!("  PUT    /entries/:id   - Rewrite an entry");
    println!("  DELETE /entries/:id   - Delete an entry");

    axum::serve(listener, app).await.unwrap();
}
