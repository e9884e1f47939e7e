use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::contact_engine::ai_reviewer::CompletionProvider;
use crate::contact_engine::store::{ContactStore, StoredContact};
use crate::contact_engine::{ContactRecord, DuplicateEngine, DuplicateReport};

pub struct ContactsState<P> {
    pub engine: DuplicateEngine<P>,
    pub store: ContactStore,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckRequest {
    #[serde(default)]
    pub contact_id: String,
    pub contact: ContactRecord,
    pub threshold: Option<f64>,
    /// Candidate pool; the stored contacts are used when omitted
    pub candidates: Option<Vec<ContactRecord>>,
}

pub fn contact_routes<P>(engine: DuplicateEngine<P>, store: ContactStore) -> Router
where
    P: CompletionProvider + 'static,
{
    let state = Arc::new(ContactsState { engine, store });

    Router::new()
        .route("/", get(list_contacts::<P>).post(upsert_contact::<P>))
        .route("/duplicates", post(find_duplicates::<P>))
        .route("/:id", get(get_contact::<P>).delete(delete_contact::<P>))
        .layer(Extension(state))
}

async fn find_duplicates<P: CompletionProvider>(
    Extension(state): Extension<Arc<ContactsState<P>>>,
    Json(payload): Json<DuplicateCheckRequest>,
) -> Result<Json<DuplicateReport>, StatusCode> {
    let contact_id = payload.contact_id.trim().to_string();
    if contact_id.is_empty() {
        tracing::warn!("Duplicate check rejected: missing contactId");
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut target = payload.contact;
    target.id = contact_id;

    let candidates = match payload.candidates {
        Some(candidates) => candidates,
        None => state.store.all_except(&target.id).await,
    };

    let report = state
        .engine
        .find_duplicates(&target, &candidates, payload.threshold)
        .await;
    Ok(Json(report))
}

async fn upsert_contact<P: CompletionProvider>(
    Extension(state): Extension<Arc<ContactsState<P>>>,
    Json(contact): Json<ContactRecord>,
) -> Result<Json<StoredContact>, StatusCode> {
    if contact.id.trim().is_empty() {
        tracing::warn!("Contact upsert rejected: missing id");
        return Err(StatusCode::BAD_REQUEST);
    }

    Ok(Json(state.store.upsert(contact).await))
}

async fn list_contacts<P: CompletionProvider>(
    Extension(state): Extension<Arc<ContactsState<P>>>,
) -> Json<Vec<StoredContact>> {
    Json(state.store.list().await)
}

async fn get_contact<P: CompletionProvider>(
    Extension(state): Extension<Arc<ContactsState<P>>>,
    Path(id): Path<String>,
) -> Result<Json<StoredContact>, StatusCode> {
    match state.store.get(&id).await {
        Some(stored) => Ok(Json(stored)),
        None => {
            tracing::debug!(contact_id = %id, "Contact not found");
            Err(StatusCode::NOT_FOUND)
        }
    }
}

async fn delete_contact<P: CompletionProvider>(
    Extension(state): Extension<Arc<ContactsState<P>>>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.store.remove(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
