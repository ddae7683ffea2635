//! Contact Handlers
//!
//! CRUD and birthday lookups over the authenticated user's contacts. Every
//! operation is scoped to the caller; other users' contacts read as missing.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};

use crate::{
    api::{handlers::AppState, middleware::AuthUser},
    database::Pagination,
    models::{BirthdayQuery, ContactModel, ContactResponse, ListContactsQuery},
    utils::error::AppResult,
};

/// List contacts with optional substring filters and `skip`/`limit` paging
pub async fn list_contacts(
    State(state): State<AppState>,
    Extension(AuthUser(account)): Extension<AuthUser>,
    query: Result<Query<ListContactsQuery>, QueryRejection>,
) -> AppResult<Json<Vec<ContactResponse>>> {
    let Query(query) = query?;
    let pagination = Pagination::from_skip_limit(query.skip, query.limit);

    let contacts = state
        .contact_service
        .list_contacts(account.id, query.filter(), pagination)
        .await?;

    Ok(Json(contacts.into_iter().map(Into::into).collect()))
}

/// Contacts with a birthday in the next `days` days
pub async fn upcoming_birthdays(
    State(state): State<AppState>,
    Extension(AuthUser(account)): Extension<AuthUser>,
    query: Result<Query<BirthdayQuery>, QueryRejection>,
) -> AppResult<Json<Vec<ContactResponse>>> {
    let Query(query) = query?;

    let contacts = state
        .contact_service
        .upcoming_birthdays(account.id, query.days)
        .await?;

    Ok(Json(contacts.into_iter().map(Into::into).collect()))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Extension(AuthUser(account)): Extension<AuthUser>,
    contact_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<ContactResponse>> {
    let Path(contact_id) = contact_id?;
    let contact = state
        .contact_service
        .get_contact(account.id, contact_id)
        .await?;
    Ok(Json(contact.into()))
}

pub async fn create_contact(
    State(state): State<AppState>,
    Extension(AuthUser(account)): Extension<AuthUser>,
    body: Result<Json<ContactModel>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ContactResponse>)> {
    let Json(body) = body?;
    let contact = state
        .contact_service
        .create_contact(account.id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(contact.into())))
}

pub async fn update_contact(
    State(state): State<AppState>,
    Extension(AuthUser(account)): Extension<AuthUser>,
    contact_id: Result<Path<i64>, PathRejection>,
    body: Result<Json<ContactModel>, JsonRejection>,
) -> AppResult<Json<ContactResponse>> {
    let Path(contact_id) = contact_id?;
    let Json(body) = body?;
    let contact = state
        .contact_service
        .update_contact(account.id, contact_id, body)
        .await?;
    Ok(Json(contact.into()))
}

/// Delete a contact and return it
pub async fn delete_contact(
    State(state): State<AppState>,
    Extension(AuthUser(account)): Extension<AuthUser>,
    contact_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<ContactResponse>> {
    let Path(contact_id) = contact_id?;
    let contact = state
        .contact_service
        .delete_contact(account.id, contact_id)
        .await?;
    Ok(Json(contact.into()))
}
