use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
};
use serde::{Deserialize, Deserializer};

use crate::database::{NewAppointment, NewClient, NewDentist, NewTreatment, ScheduleRequest};
use crate::web::{error::AppError, extract::FormOrJson, views, AppState};

const DENTIST_NOT_FOUND: &str = "Dentist not found";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleForm {
    pub patient_name: String,
    pub date: String,
    pub time: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub treatment_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdField {
    Number(i64),
    Text(String),
}

/// A blank `<select>` choice arrives as an empty string; JSON clients may
/// send a number, a string or null.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IdField>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdField::Number(id)) => Ok(Some(id)),
        Some(IdField::Text(raw)) => match raw.trim() {
            "" => Ok(None),
            value => value.parse().map(Some).map_err(serde::de::Error::custom),
        },
    }
}

/// Ids that are not numbers can never match a row.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::NotFound(DENTIST_NOT_FOUND))
}

/// # GET /
pub async fn list_dentists(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    let dentists = state.store.list_dentists().await?;
    Ok(Html(views::index(&dentists)))
}

/// # GET /dentist/:id
pub async fn dentist_details(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    let dentist = state
        .store
        .get_dentist(parse_id(&id)?)
        .await?
        .ok_or(AppError::NotFound(DENTIST_NOT_FOUND))?;
    Ok(Html(views::dentist_details(&dentist)))
}

/// # POST /dentist/:id/edit
pub async fn update_dentist(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    FormOrJson(dentist): FormOrJson<NewDentist>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&id)?;
    state.store.update_dentist(id, dentist).await?;
    Ok(Redirect::to(&format!("/dentist/{id}")))
}

/// # POST /dentist/:id/delete
pub async fn delete_dentist(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Redirect, AppError> {
    state.store.delete_dentist(parse_id(&id)?).await?;
    Ok(Redirect::to("/"))
}

/// # GET /add-dentist
pub async fn add_dentist_form() -> Html<String> {
    Html(views::add_dentist())
}

/// # POST /add-dentist
pub async fn create_dentist(
    State(state): State<Arc<AppState>>,
    FormOrJson(dentist): FormOrJson<NewDentist>,
) -> Result<Redirect, AppError> {
    state.store.create_dentist(dentist).await?;
    Ok(Redirect::to("/"))
}

/// # GET /schedule/:id
pub async fn schedule_form(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    let dentist = state
        .store
        .get_dentist(parse_id(&id)?)
        .await?
        .ok_or(AppError::NotFound(DENTIST_NOT_FOUND))?;
    let treatments = state.store.list_treatments().await?;
    Ok(Html(views::schedule_appointment(&dentist, &treatments)))
}

/// # POST /schedule/:id
/// The dentist id is taken as given, like every other appointment write.
pub async fn schedule_appointment(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    FormOrJson(form): FormOrJson<ScheduleForm>,
) -> Result<Redirect, AppError> {
    let dentist_id = parse_id(&id)?;
    state
        .store
        .schedule_appointment(ScheduleRequest {
            dentist_id,
            patient_name: form.patient_name,
            treatment_id: form.treatment_id,
            date: form.date,
            time: form.time,
        })
        .await?;
    Ok(Redirect::to(&format!("/dentist/{dentist_id}")))
}

/// # GET /add-treatment
pub async fn add_treatment_form() -> Html<String> {
    Html(views::add_treatment())
}

/// # POST /add-treatment
pub async fn create_treatment(
    State(state): State<Arc<AppState>>,
    FormOrJson(treatment): FormOrJson<NewTreatment>,
) -> Result<Redirect, AppError> {
    state.store.create_treatment(treatment).await?;
    Ok(Redirect::to("/"))
}

/// # GET /add-client
pub async fn add_client_form() -> Html<String> {
    Html(views::add_client())
}

/// # POST /add-client
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    FormOrJson(client): FormOrJson<NewClient>,
) -> Result<Redirect, AppError> {
    state.store.create_client(client).await?;
    Ok(Redirect::to("/"))
}

/// # GET /add-appointment
pub async fn add_appointment_form(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    let dentists = state.store.list_dentists().await?;
    let clients = state.store.list_clients().await?;
    let treatments = state.store.list_treatments().await?;
    Ok(Html(views::add_appointment(&dentists, &clients, &treatments)))
}

/// # POST /add-appointment
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    FormOrJson(appointment): FormOrJson<NewAppointment>,
) -> Result<Redirect, AppError> {
    state.store.create_appointment(appointment).await?;
    Ok(Redirect::to("/"))
}

/// # GET /schedule
pub async fn appointment_schedule(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    let appointments = state.store.list_appointments_with_details().await?;
    Ok(Html(views::appointment_schedule(&appointments)))
}
