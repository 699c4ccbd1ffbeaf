use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::database::Gateway;

pub mod error;
pub mod extract;
pub mod handlers;
pub mod views;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub store: Gateway,
}

/// Builds the route table. Anything the table does not match is looked up
/// as a file under `public_dir`.
pub fn router(state: Arc<AppState>, public_dir: &Path) -> Router {
    Router::new()
        .route("/", get(handlers::list_dentists))
        .route("/dentist/:id", get(handlers::dentist_details))
        .route("/dentist/:id/edit", post(handlers::update_dentist))
        .route("/dentist/:id/delete", post(handlers::delete_dentist))
        .route(
            "/add-dentist",
            get(handlers::add_dentist_form).post(handlers::create_dentist),
        )
        .route(
            "/schedule/:id",
            get(handlers::schedule_form).post(handlers::schedule_appointment),
        )
        .route(
            "/add-treatment",
            get(handlers::add_treatment_form).post(handlers::create_treatment),
        )
        .route(
            "/add-client",
            get(handlers::add_client_form).post(handlers::create_client),
        )
        .route(
            "/add-appointment",
            get(handlers::add_appointment_form).post(handlers::create_appointment),
        )
        .route("/schedule", get(handlers::appointment_schedule))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serves until `shutdown` resolves, then closes the store.
pub async fn run_server(
    addr: SocketAddr,
    store: Gateway,
    public_dir: &Path,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let state = Arc::new(AppState { store: store.clone() });
    let app = router(state, public_dir);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server is running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    store.close().await.context("Failed to close the store")?;
    tracing::info!("Store closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    fn app() -> Result<(Router, Gateway)> {
        let store = Gateway::open_in_memory(true)?;
        let state = Arc::new(AppState { store: store.clone() });
        Ok((router(state, Path::new("public")), store))
    }

    async fn get(app: &Router, uri: &str) -> Result<Response> {
        let req = Request::builder().uri(uri).body(Body::empty())?;
        Ok(app.clone().oneshot(req).await?)
    }

    async fn post_form(app: &Router, uri: &str, form: &'static str) -> Result<Response> {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))?;
        Ok(app.clone().oneshot(req).await?)
    }

    async fn post_json(app: &Router, uri: &str, json: &'static str) -> Result<Response> {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json))?;
        Ok(app.clone().oneshot(req).await?)
    }

    async fn body_text(resp: Response) -> Result<String> {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    fn location(resp: &Response) -> Option<&str> {
        resp.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_index_lists_dentists() -> Result<()> {
        let (app, _) = app()?;
        let resp = get(&app, "/").await?;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await?;
        assert!(body.contains("Dr. Smith"));
        assert!(body.contains("Dr. Johnson"));
        Ok(())
    }

    #[tokio::test]
    async fn test_dentist_details_and_missing() -> Result<()> {
        let (app, _) = app()?;

        let resp = get(&app, "/dentist/1").await?;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await?.contains("Orthodontist"));

        let resp = get(&app, "/dentist/9999").await?;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(resp).await?, "Dentist not found");

        let resp = get(&app, "/dentist/abc").await?;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = get(&app, "/schedule/9999").await?;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_treatment_redirects_home() -> Result<()> {
        let (app, store) = app()?;

        let resp = get(&app, "/add-treatment").await?;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = post_form(&app, "/add-treatment", "name=X-Ray&description=Dental+X-ray").await?;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), Some("/"));

        let treatments = store.list_treatments().await?;
        assert_eq!(treatments.len(), 4);
        assert_eq!(treatments[3].name, "X-Ray");
        assert_eq!(treatments[3].description, "Dental X-ray");
        Ok(())
    }

    #[tokio::test]
    async fn test_add_client_redirects_home() -> Result<()> {
        let (app, store) = app()?;

        let resp = post_form(&app, "/add-client", "name=Ana&email=ana%40example.com").await?;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), Some("/"));

        let clients = store.list_clients().await?;
        assert_eq!(clients.len(), 4);
        assert_eq!(clients[3].email, "ana@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn test_json_bodies_are_accepted() -> Result<()> {
        let (app, store) = app()?;

        let resp = post_json(&app, "/add-client", r#"{"name":"Ana","email":"ana@example.com"}"#)
            .await?;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), Some("/"));
        let clients = store.list_clients().await?;
        assert_eq!(clients.len(), 4);
        assert_eq!(clients[3].name, "Ana");
        assert_eq!(clients[3].email, "ana@example.com");

        let resp = post_json(
            &app,
            "/add-appointment",
            r#"{"dentistId":1,"clientId":4,"treatmentId":2,"date":"2024-07-01","time":"09:00 AM"}"#,
        )
        .await?;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let raw = store.list_appointments().await?;
        assert_eq!(raw.len(), 4);
        assert_eq!(raw[3].client_id, 4);
        assert_eq!(raw[3].treatment_id, Some(2));

        let resp = post_json(
            &app,
            "/schedule/1",
            r#"{"patientName":"Ana","treatmentId":3,"date":"2024-07-02","time":"10:00 AM"}"#,
        )
        .await?;
        assert_eq!(location(&resp), Some("/dentist/1"));
        let raw = store.list_appointments().await?;
        assert_eq!(raw.len(), 5);
        assert_eq!(raw[4].client_id, 4);
        assert_eq!(raw[4].treatment_id, Some(3));

        let resp = post_json(&app, "/add-treatment", r#"{"name":"X-Ray"}"#).await?;
        assert!(resp.status().is_client_error());
        assert_eq!(store.list_treatments().await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_view_routes_render() -> Result<()> {
        let (app, _) = app()?;

        let pages = [
            ("/add-client", "<form method=\"post\" action=\"/add-client\">"),
            ("/add-dentist", "<form method=\"post\" action=\"/add-dentist\">"),
            ("/add-treatment", "<form method=\"post\" action=\"/add-treatment\">"),
            ("/add-appointment", "<select name=\"dentistId\">"),
            ("/schedule/1", "<form method=\"post\" action=\"/schedule/1\">"),
        ];
        for (uri, marker) in pages {
            let resp = get(&app, uri).await?;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            assert!(body_text(resp).await?.contains(marker), "{uri}");
        }

        let resp = get(&app, "/schedule").await?;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await?;
        assert!(body.contains("<h1>Appointment Schedule</h1>"));
        assert!(body.contains(
            "<td>Dr. Smith</td><td>John Doe</td><td>Teeth Cleaning</td>\
             <td>2024-02-15</td><td>10:00 AM</td>"
        ));
        assert!(body.contains("<td>Dr. Johnson</td><td>Jane Smith</td><td>Cavity Filling</td>"));
        assert!(!body.contains("Mike Johnson"));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_appointment_accepts_unknown_ids() -> Result<()> {
        let (app, store) = app()?;

        let resp = get(&app, "/add-appointment").await?;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await?;
        assert!(body.contains("Mike Johnson"));
        assert!(body.contains("Braces Installation"));

        let resp = post_form(
            &app,
            "/add-appointment",
            "dentistId=42&clientId=43&treatmentId=44&date=2024-05-01&time=09%3A00+AM",
        )
        .await?;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(store.list_appointments().await?.len(), 4);

        let body = body_text(get(&app, "/schedule").await?).await?;
        assert!(body.contains("2024-02-15"));
        assert!(!body.contains("2024-05-01"));
        Ok(())
    }

    #[tokio::test]
    async fn test_schedule_from_dentist_page() -> Result<()> {
        let (app, store) = app()?;

        let resp = get(&app, "/schedule/2").await?;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await?.contains("Schedule with Dr. Johnson"));

        let resp = post_form(
            &app,
            "/schedule/2",
            "patientName=John+Doe&treatmentId=2&date=2024-06-01&time=10%3A30+AM",
        )
        .await?;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), Some("/dentist/2"));

        let resp = post_form(
            &app,
            "/schedule/2",
            "patientName=Walk+In&treatmentId=&date=2024-06-02&time=11%3A00+AM",
        )
        .await?;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let raw = store.list_appointments().await?;
        assert_eq!(raw.len(), 5);
        assert_eq!(raw[3].dentist_id, 2);
        assert_eq!(raw[3].client_id, 1);
        assert_eq!(raw[4].treatment_id, None);

        let body = body_text(get(&app, "/schedule").await?).await?;
        assert!(body.contains("2024-06-01"));
        assert!(!body.contains("2024-06-02"));
        Ok(())
    }

    #[tokio::test]
    async fn test_dentist_edit_and_delete() -> Result<()> {
        let (app, store) = app()?;

        let resp = post_form(
            &app,
            "/add-dentist",
            "name=Dr.+Lee&specialty=Pediatric&image=dr_lee.jpg",
        )
        .await?;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(store.list_dentists().await?.len(), 3);

        let resp = post_form(
            &app,
            "/dentist/3/edit",
            "name=Dr.+Lee&specialty=Endodontist&image=dr_lee.jpg",
        )
        .await?;
        assert_eq!(location(&resp), Some("/dentist/3"));
        let dentist = store.get_dentist(3).await?.expect("dentist 3");
        assert_eq!(dentist.specialty, "Endodontist");

        let resp = post_form(&app, "/dentist/3/delete", "").await?;
        assert_eq!(location(&resp), Some("/"));
        assert_eq!(store.get_dentist(3).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_failure_is_generic_500() -> Result<()> {
        let (app, store) = app()?;
        store.close().await?;

        let resp = get(&app, "/").await?;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(resp).await?, "Internal Server Error");

        let resp = post_form(&app, "/add-client", "name=Ana&email=ana%40example.com").await?;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }
}
