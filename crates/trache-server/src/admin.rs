//! Admin routes.
//!
//! Every handler loads a fresh snapshot of the document, changes it and
//! writes it back. Indexes are positions in the lists as last shown to the
//! admin; an index outside the list is ignored (deletes, moves, pricing
//! rows) or answered with 404 (edits of destinations, services and why-us
//! blocks).

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use trache_shared::constants::DESTINATIONS_SUBDIR;
use trache_shared::filename::allowed_file;
use trache_store::{remove_at, Destination, MessageRecord, SiteDocument};

use crate::api::AppState;
use crate::auth::AdminSession;
use crate::error::ServerError;
use crate::forms::{
    FamilyRowForm, HtmlForm, IndividualRowForm, ServiceForm, SiteInfoForm, VisaRowForm,
    WhyUsForm,
};
use crate::upload::IncomingFile;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard))
        .route("/admin/messages/:index", delete(delete_message))
        .route("/admin/logo", post(upload_logo))
        .route("/admin/destinations", post(add_destination))
        .route(
            "/admin/destinations/:index",
            post(edit_destination).delete(delete_destination),
        )
        .route("/admin/destinations/:index/move-up", post(move_destination_up))
        .route("/admin/destinations/:index/move-down", post(move_destination_down))
        .route("/admin/site-info", put(update_site_info))
        .route("/admin/services/:index", put(edit_service))
        .route("/admin/why-us/:index", put(edit_why_us))
        .route("/admin/insurance/html", put(update_insurance_html))
        .route("/admin/visa/html", put(update_visa_html))
        .route("/admin/insurance/individual", post(add_individual_row))
        .route(
            "/admin/insurance/individual/:index",
            put(edit_individual_row).delete(delete_individual_row),
        )
        .route("/admin/insurance/family", post(add_family_row))
        .route(
            "/admin/insurance/family/:index",
            put(edit_family_row).delete(delete_family_row),
        )
        .route("/admin/visa/rows", post(add_visa_row))
        .route(
            "/admin/visa/rows/:index",
            put(edit_visa_row).delete(delete_visa_row),
        )
}

type DocumentResponse = Result<Json<SiteDocument>, ServerError>;

/// Position in a list; negative indexes match nothing.
fn position(index: i64) -> Option<usize> {
    usize::try_from(index).ok()
}

fn edit_at<T>(items: &mut [T], index: i64, edit: impl FnOnce(&mut T)) -> bool {
    match position(index).and_then(|i| items.get_mut(i)) {
        Some(item) => {
            edit(item);
            true
        }
        None => false,
    }
}

fn delete_at<T>(items: &mut Vec<T>, index: i64) -> bool {
    position(index)
        .and_then(|i| remove_at(items, i))
        .is_some()
}

/// Save `document` if `changed`, and answer with it either way.
async fn commit(state: &AppState, document: SiteDocument, changed: bool) -> DocumentResponse {
    let document = if changed {
        state.save_document(document).await?
    } else {
        document
    };
    Ok(Json(document))
}

// ─── Multipart forms ───

#[derive(Default)]
struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, IncomingFile>,
}

impl FormData {
    async fn read(mut multipart: Multipart) -> Result<Self, ServerError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Multipart error: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(|e| {
                        ServerError::BadRequest(format!("Failed to read field: {e}"))
                    })?;
                    form.files.insert(
                        name,
                        IncomingFile {
                            file_name,
                            content_type,
                            data,
                        },
                    );
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        ServerError::BadRequest(format!("Failed to read field: {e}"))
                    })?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    /// First present field among `names`.
    fn required(&self, names: &[&str]) -> Result<String, ServerError> {
        names
            .iter()
            .find_map(|name| self.fields.get(*name))
            .cloned()
            .ok_or_else(|| ServerError::BadRequest(format!("missing field '{}'", names[0])))
    }

    /// The file part `name`, if it carries an accepted image name.
    fn image(&self, name: &str) -> Option<&IncomingFile> {
        self.files
            .get(name)
            .filter(|file| !file.file_name.is_empty() && allowed_file(&file.file_name))
    }
}

// ─── Dashboard and messages ───

#[derive(Serialize)]
struct Dashboard {
    document: SiteDocument,
    messages: Vec<MessageRecord>,
}

async fn dashboard(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Dashboard>, ServerError> {
    Ok(Json(Dashboard {
        document: state.load_document().await?,
        messages: state.load_messages().await?,
    }))
}

#[derive(Serialize)]
struct MessagesResponse {
    deleted: bool,
    messages: Vec<MessageRecord>,
}

async fn delete_message(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
) -> Result<Json<MessagesResponse>, ServerError> {
    let deleted = match position(index) {
        Some(ordinal) => state.delete_message(ordinal).await?,
        None => false,
    };
    if deleted {
        info!(index, "Deleted contact message");
    }
    Ok(Json(MessagesResponse {
        deleted,
        messages: state.load_messages().await?,
    }))
}

// ─── Logo and destinations ───

async fn upload_logo(
    _admin: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> DocumentResponse {
    let form = FormData::read(multipart).await?;
    let mut document = state.load_document().await?;

    let Some(file) = form.image("logo") else {
        return Ok(Json(document));
    };
    if let Some(reference) = state.uploads.store(file, "").await {
        info!(logo = %reference, "Logo updated");
        document.logo = reference;
    }
    commit(&state, document, true).await
}

async fn add_destination(
    _admin: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> DocumentResponse {
    let form = FormData::read(multipart).await?;
    let mut destination = Destination {
        name: form.required(&["name", "nom"])?,
        description: form.required(&["description"])?,
        price: form.required(&["price", "prix"])?,
        image: String::new(),
    };
    if let Some(file) = form.image("image") {
        if let Some(reference) = state.uploads.store(file, DESTINATIONS_SUBDIR).await {
            destination.image = reference;
        }
    }

    let mut document = state.load_document().await?;
    info!(name = %destination.name, "Added destination");
    document.destinations.push(destination);
    commit(&state, document, true).await
}

async fn edit_destination(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
    multipart: Multipart,
) -> DocumentResponse {
    let form = FormData::read(multipart).await?;
    let name = form.required(&["name", "nom"])?;
    let description = form.required(&["description"])?;
    let price = form.required(&["price", "prix"])?;

    let mut document = state.load_document().await?;
    let Some(slot) = position(index).filter(|&i| i < document.destinations.len()) else {
        return Err(ServerError::NotFound(format!("destination {index}")));
    };

    let image = match form.image("image") {
        Some(file) => state.uploads.store(file, DESTINATIONS_SUBDIR).await,
        None => None,
    };

    let destination = &mut document.destinations[slot];
    destination.name = name;
    destination.description = description;
    destination.price = price;
    if let Some(reference) = image {
        destination.image = reference;
    }
    commit(&state, document, true).await
}

async fn delete_destination(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    let removed = position(index).and_then(|i| document.remove_destination(i));
    if let Some(destination) = &removed {
        info!(name = %destination.name, "Deleted destination");
    }
    commit(&state, document, removed.is_some()).await
}

async fn move_destination_up(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    let moved = position(index).is_some_and(|i| document.move_destination_up(i));
    commit(&state, document, moved).await
}

async fn move_destination_down(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    let moved = position(index).is_some_and(|i| document.move_destination_down(i));
    commit(&state, document, moved).await
}

// ─── Site info, services, why-us ───

async fn update_site_info(
    _admin: AdminSession,
    State(state): State<AppState>,
    Json(form): Json<SiteInfoForm>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    form.apply_to(&mut document);
    commit(&state, document, true).await
}

async fn edit_service(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
    Json(form): Json<ServiceForm>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    if !edit_at(&mut document.services, index, |service| form.apply_to(service)) {
        return Err(ServerError::NotFound(format!("service {index}")));
    }
    commit(&state, document, true).await
}

async fn edit_why_us(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
    Json(form): Json<WhyUsForm>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    if !edit_at(&mut document.why_us, index, |item| form.apply_to(item)) {
        return Err(ServerError::NotFound(format!("why-us block {index}")));
    }
    commit(&state, document, true).await
}

// ─── Pricing ───

async fn update_insurance_html(
    _admin: AdminSession,
    State(state): State<AppState>,
    Json(form): Json<HtmlForm>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    document.insurance_tables_html = form.value();
    commit(&state, document, true).await
}

async fn update_visa_html(
    _admin: AdminSession,
    State(state): State<AppState>,
    Json(form): Json<HtmlForm>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    document.visa_tables_html = form.value();
    commit(&state, document, true).await
}

async fn add_individual_row(
    _admin: AdminSession,
    State(state): State<AppState>,
    Json(form): Json<IndividualRowForm>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    document.insurance_individual.push(form.to_row());
    commit(&state, document, true).await
}

async fn edit_individual_row(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
    Json(form): Json<IndividualRowForm>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    let changed = edit_at(&mut document.insurance_individual, index, |row| form.apply_to(row));
    commit(&state, document, changed).await
}

async fn delete_individual_row(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    let changed = delete_at(&mut document.insurance_individual, index);
    commit(&state, document, changed).await
}

async fn add_family_row(
    _admin: AdminSession,
    State(state): State<AppState>,
    Json(form): Json<FamilyRowForm>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    document.insurance_family.push(form.to_row());
    commit(&state, document, true).await
}

async fn edit_family_row(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
    Json(form): Json<FamilyRowForm>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    let changed = edit_at(&mut document.insurance_family, index, |row| form.apply_to(row));
    commit(&state, document, changed).await
}

async fn delete_family_row(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    let changed = delete_at(&mut document.insurance_family, index);
    commit(&state, document, changed).await
}

async fn add_visa_row(
    _admin: AdminSession,
    State(state): State<AppState>,
    Json(form): Json<VisaRowForm>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    document.visa_rows.push(form.to_row());
    commit(&state, document, true).await
}

async fn edit_visa_row(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
    Json(form): Json<VisaRowForm>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    let changed = edit_at(&mut document.visa_rows, index, |row| form.apply_to(row));
    commit(&state, document, changed).await
}

async fn delete_visa_row(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(index): Path<i64>,
) -> DocumentResponse {
    let mut document = state.load_document().await?;
    let changed = delete_at(&mut document.visa_rows, index);
    commit(&state, document, changed).await
}
