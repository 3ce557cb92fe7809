//! HTTP surface for the gelt tracker.
//!
//! Handlers translate the shared DTOs into domain commands, call the
//! services, and map domain failures to status codes: validation problems
//! come back as 422, malformed uploads as 400, missing entities as 404 and
//! anything else as 500.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use shared::{
    BirthdayListResponse, BirthdayResponse, CreateBirthdayRequest, DeleteBirthdaysRequest,
    DeleteBirthdaysResponse, ExportToPathRequest, Gender, GeltChild, GeltStateResponse,
    ImportChildrenResponse, ImportCsvRequest, SetChildAgeRequest, SetChildIncludedRequest,
    SortBy, SortOrder, Timeframe, UpdateAgeGroupRequest, UpdateBirthdayRequest,
    UpdateBudgetConfigRequest,
};
use tracing::{error, info};

use crate::domain::commands::birthday::{
    BirthdayListQuery, CreateBirthdayCommand, DeleteBirthdaysCommand, UpdateBirthdayCommand,
};
use crate::domain::commands::gelt::{
    SetChildAgeCommand, SetChildIncludedCommand, UpdateAgeGroupCommand, UpdateBudgetConfigCommand,
};
use crate::domain::birthday_service::BirthdayValidationError;
use crate::domain::models::birthday::Birthday;
use crate::domain::models::child::Child;
use crate::domain::GeltService;
use crate::Backend;

/// Shared application state: one [`Backend`] behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<Backend>,
}

impl AppState {
    pub fn new(backend: Arc<Backend>) -> Self {
        Self { backend }
    }
}

/// The full API router, to be nested under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Birthday tracking
        .route("/birthdays", get(list_birthdays).post(create_birthday))
        .route("/birthdays/:id", put(update_birthday))
        .route("/birthdays/:id/archive", post(archive_birthday))
        .route("/birthdays/delete", post(delete_birthdays))
        // Gelt session
        .route("/gelt", get(get_gelt_state))
        .route("/gelt/import/csv", post(import_children_csv))
        .route("/gelt/import/birthdays", post(import_children_from_birthdays))
        .route("/gelt/age-groups/:id", put(update_age_group))
        .route("/gelt/budget-config", put(update_budget_config))
        .route(
            "/gelt/children/:id/age",
            put(set_child_age).delete(reset_child_age),
        )
        .route("/gelt/children/:id/included", put(set_child_included))
        .route("/gelt/settings/save", post(save_custom_settings))
        .route("/gelt/settings", delete(clear_custom_settings))
        .route("/gelt/reset", post(reset_gelt))
        .route("/gelt/export", post(export_gelt))
}

// ---------------------------------------------------------------------------
// DTO mapping

fn child_to_dto(child: &Child) -> GeltChild {
    GeltChild {
        id: child.id.clone(),
        first_name: child.first_name.clone(),
        last_name: child.last_name.clone(),
        age: child.age,
        original_age: child.original_age(),
    }
}

fn birthday_to_dto(birthday: &Birthday) -> shared::Birthday {
    shared::Birthday {
        id: birthday.id.clone(),
        first_name: birthday.first_name.clone(),
        last_name: birthday.last_name.clone(),
        birth_date: birthday.birth_date.format("%Y-%m-%d").to_string(),
        after_sunset: birthday.after_sunset,
        gender: birthday.gender,
        hebrew_date: birthday.hebrew_date.clone(),
        next_birthday: birthday
            .next_birthday
            .map(|d| d.format("%Y-%m-%d").to_string()),
        age: birthday.age,
        archived: birthday.archived,
        created_at: birthday.created_at.to_rfc3339(),
        updated_at: birthday.updated_at.to_rfc3339(),
    }
}

fn state_response(gelt: &GeltService) -> GeltStateResponse {
    let mut included: Vec<String> = gelt.included_children().iter().cloned().collect();
    included.sort();
    GeltStateResponse {
        children: gelt.children().iter().map(child_to_dto).collect(),
        age_groups: gelt.age_groups().to_vec(),
        budget_config: gelt.budget_config().clone(),
        calculation: gelt.calculation().clone(),
        included_children: included,
        has_custom_settings: gelt.has_custom_settings(),
    }
}

/// Map an error from the birthday service to a status code. Validation
/// rejections are typed; anything untyped is a storage or collaborator
/// failure.
fn birthday_error_response(e: anyhow::Error) -> (StatusCode, String) {
    match e.downcast_ref::<BirthdayValidationError>() {
        Some(BirthdayValidationError::NotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),
        Some(_) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        None => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Birthday handlers

/// Query parameters for GET /api/birthdays.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBirthdaysQuery {
    pub search_term: Option<String>,
    pub gender: Option<Gender>,
    pub timeframe: Option<Timeframe>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
    pub include_archived: Option<bool>,
}

pub async fn list_birthdays(
    State(state): State<AppState>,
    Query(query): Query<ListBirthdaysQuery>,
) -> impl IntoResponse {
    info!("GET /api/birthdays - query: {:?}", query);

    let list_query = BirthdayListQuery {
        search_term: query.search_term,
        gender: query.gender,
        timeframe: query.timeframe.unwrap_or(Timeframe::All),
        sort_by: query.sort_by.unwrap_or(SortBy::Name),
        sort_order: query.sort_order.unwrap_or(SortOrder::Asc),
        include_archived: query.include_archived.unwrap_or(false),
    };

    match state.backend.birthday_service.list_birthdays(list_query) {
        Ok(birthdays) => (
            StatusCode::OK,
            Json(BirthdayListResponse {
                birthdays: birthdays.iter().map(birthday_to_dto).collect(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error listing birthdays: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing birthdays").into_response()
        }
    }
}

pub async fn create_birthday(
    State(state): State<AppState>,
    Json(request): Json<CreateBirthdayRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/birthdays - {} {}",
        request.first_name, request.last_name
    );

    let command = CreateBirthdayCommand {
        first_name: request.first_name,
        last_name: request.last_name,
        birth_date: request.birth_date,
        after_sunset: request.after_sunset,
        gender: request.gender,
    };

    match state.backend.birthday_service.create_birthday(command).await {
        Ok(birthday) => (
            StatusCode::CREATED,
            Json(BirthdayResponse {
                success_message: format!("Added birthday for {}", birthday.full_name()),
                birthday: birthday_to_dto(&birthday),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error creating birthday: {:?}", e);
            birthday_error_response(e).into_response()
        }
    }
}

pub async fn update_birthday(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBirthdayRequest>,
) -> impl IntoResponse {
    info!("PUT /api/birthdays/{}", id);

    let command = UpdateBirthdayCommand {
        first_name: request.first_name,
        last_name: request.last_name,
        birth_date: request.birth_date,
        after_sunset: request.after_sunset,
        gender: request.gender,
    };

    match state
        .backend
        .birthday_service
        .update_birthday(&id, command)
        .await
    {
        Ok(birthday) => (
            StatusCode::OK,
            Json(BirthdayResponse {
                success_message: format!("Updated birthday for {}", birthday.full_name()),
                birthday: birthday_to_dto(&birthday),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error updating birthday {}: {:?}", id, e);
            birthday_error_response(e).into_response()
        }
    }
}

pub async fn archive_birthday(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/birthdays/{}/archive", id);

    match state.backend.birthday_service.archive_birthday(&id) {
        Ok(birthday) => (
            StatusCode::OK,
            Json(BirthdayResponse {
                success_message: format!("Archived birthday for {}", birthday.full_name()),
                birthday: birthday_to_dto(&birthday),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error archiving birthday {}: {:?}", id, e);
            birthday_error_response(e).into_response()
        }
    }
}

pub async fn delete_birthdays(
    State(state): State<AppState>,
    Json(request): Json<DeleteBirthdaysRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/birthdays/delete - {} id(s)",
        request.birthday_ids.len()
    );

    let command = DeleteBirthdaysCommand {
        birthday_ids: request.birthday_ids,
    };

    match state.backend.birthday_service.delete_birthdays(command) {
        Ok(result) => (
            StatusCode::OK,
            Json(DeleteBirthdaysResponse {
                deleted_count: result.deleted_count,
                not_found_ids: result.not_found_ids,
                success_message: result.success_message,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error deleting birthdays: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error deleting birthdays").into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Gelt handlers

pub async fn get_gelt_state(State(state): State<AppState>) -> impl IntoResponse {
    let gelt = state.backend.gelt.lock().await;
    (StatusCode::OK, Json(state_response(&gelt))).into_response()
}

pub async fn import_children_csv(
    State(state): State<AppState>,
    Json(request): Json<ImportCsvRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/gelt/import/csv - {} bytes",
        request.csv_content.len()
    );

    let report = match state
        .backend
        .import_service
        .parse_children_csv(&request.csv_content)
    {
        Ok(report) => report,
        Err(e) => {
            error!("CSV import failed: {:?}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let mut gelt = state.backend.gelt.lock().await;
    let accepted_count = report.accepted_count();
    let rejected_rows: Vec<shared::RejectedRow> = report
        .rejected
        .iter()
        .map(|r| shared::RejectedRow {
            line: r.line,
            reason: r.reason.to_string(),
        })
        .collect();
    gelt.set_children(report.children);

    (
        StatusCode::OK,
        Json(ImportChildrenResponse {
            accepted_count,
            rejected_count: rejected_rows.len(),
            rejected_rows,
            state: state_response(&gelt),
        }),
    )
        .into_response()
}

pub async fn import_children_from_birthdays(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/gelt/import/birthdays");

    let birthdays = match state
        .backend
        .birthday_service
        .list_birthdays(BirthdayListQuery::default())
    {
        Ok(birthdays) => birthdays,
        Err(e) => {
            error!("Error loading birthdays for import: {:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading birthdays")
                .into_response();
        }
    };

    let children = state.backend.import_service.children_from_birthdays(&birthdays);
    let mut gelt = state.backend.gelt.lock().await;
    let accepted_count = children.len();
    gelt.set_children(children);

    (
        StatusCode::OK,
        Json(ImportChildrenResponse {
            accepted_count,
            rejected_count: 0,
            rejected_rows: Vec::new(),
            state: state_response(&gelt),
        }),
    )
        .into_response()
}

pub async fn update_age_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAgeGroupRequest>,
) -> impl IntoResponse {
    info!("PUT /api/gelt/age-groups/{} - {:?}", id, request);

    let command = UpdateAgeGroupCommand {
        group_id: id,
        min_age: request.min_age,
        max_age: request.max_age,
        amount_per_child: request.amount_per_child,
        is_included: request.is_included,
    };

    let mut gelt = state.backend.gelt.lock().await;
    match gelt.update_age_group(command) {
        Ok(_) => (StatusCode::OK, Json(state_response(&gelt))).into_response(),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

pub async fn update_budget_config(
    State(state): State<AppState>,
    Json(request): Json<UpdateBudgetConfigRequest>,
) -> impl IntoResponse {
    info!("PUT /api/gelt/budget-config - {:?}", request);

    let mut gelt = state.backend.gelt.lock().await;
    gelt.update_budget_config(UpdateBudgetConfigCommand {
        participants: request.participants,
        allowed_overflow_percentage: request.allowed_overflow_percentage,
    });
    (StatusCode::OK, Json(state_response(&gelt))).into_response()
}

pub async fn set_child_age(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetChildAgeRequest>,
) -> impl IntoResponse {
    info!("PUT /api/gelt/children/{}/age - {}", id, request.age);

    let mut gelt = state.backend.gelt.lock().await;
    match gelt.set_child_age(SetChildAgeCommand {
        child_id: id,
        age: request.age,
    }) {
        Ok(()) => (StatusCode::OK, Json(state_response(&gelt))).into_response(),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

pub async fn reset_child_age(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/gelt/children/{}/age", id);

    let mut gelt = state.backend.gelt.lock().await;
    match gelt.reset_child_age(&id) {
        Ok(()) => (StatusCode::OK, Json(state_response(&gelt))).into_response(),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

pub async fn set_child_included(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetChildIncludedRequest>,
) -> impl IntoResponse {
    info!(
        "PUT /api/gelt/children/{}/included - {}",
        id, request.included
    );

    let mut gelt = state.backend.gelt.lock().await;
    match gelt.set_child_included(SetChildIncludedCommand {
        child_id: id,
        included: request.included,
    }) {
        Ok(()) => (StatusCode::OK, Json(state_response(&gelt))).into_response(),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

pub async fn save_custom_settings(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/gelt/settings/save");
    let mut gelt = state.backend.gelt.lock().await;
    gelt.save_custom_settings();
    (StatusCode::OK, Json(state_response(&gelt))).into_response()
}

pub async fn clear_custom_settings(State(state): State<AppState>) -> impl IntoResponse {
    info!("DELETE /api/gelt/settings");
    let mut gelt = state.backend.gelt.lock().await;
    gelt.clear_custom_settings();
    (StatusCode::OK, Json(state_response(&gelt))).into_response()
}

pub async fn reset_gelt(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/gelt/reset");
    let mut gelt = state.backend.gelt.lock().await;
    gelt.reset_to_defaults();
    (StatusCode::OK, Json(state_response(&gelt))).into_response()
}

pub async fn export_gelt(
    State(state): State<AppState>,
    Json(request): Json<ExportToPathRequest>,
) -> impl IntoResponse {
    info!("POST /api/gelt/export - {:?}", request.format);

    let gelt = state.backend.gelt.lock().await;
    let snapshot = state.backend.export_service.build_snapshot(&gelt);
    drop(gelt);

    match state.backend.export_service.export_to_path(
        &snapshot,
        request.format,
        request.custom_path.as_deref(),
    ) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Error exporting gelt snapshot: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error exporting data").into_response()
        }
    }
}
