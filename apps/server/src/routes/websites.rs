use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sitewatch_service::database::{CheckLogEntry, Monitor, MonitorUpdate};
use sitewatch_service::monitoring::UptimeSummary;
use sitewatch_service::monitoring::validation::{validate_check_interval, validate_monitor_url};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::owner::OwnerId;
use crate::state::AppState;

macros_utils::routes! {
    route create_website,
    route list_websites,
    route get_website,
    route update_website,
    route delete_website,
    route website_logs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebsite {
    pub url: String,
    pub name: Option<String>,
    pub check_interval: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebsite {
    pub url: Option<String>,
    pub name: Option<String>,
    pub check_interval: Option<i64>,
    pub is_active: Option<bool>,
}

/// A monitor with its uptime figures, as listed to its owner
#[derive(Debug, Serialize)]
pub struct WebsiteView {
    #[serde(flatten)]
    pub monitor: Monitor,
    #[serde(flatten)]
    pub summary: UptimeSummary,
}

fn parse_monitor_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidMonitorId)
}

#[post("/api/websites")]
pub async fn create_website(
    state: web::Data<AppState>,
    owner: OwnerId,
    body: web::Json<CreateWebsite>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let url = validate_monitor_url(&body.url, state.allow_private_targets)?;
    let check_interval = validate_check_interval(body.check_interval)?;
    let name = body.name.filter(|name| !name.trim().is_empty());

    let monitor = Monitor::new(owner.0, url, name, check_interval);
    let website = state.monitors.create_monitor(&monitor).await?;
    info!(monitor = %website.uuid, url = %website.url, "Website added");

    Ok(HttpResponse::Created().json(json!({ "message": "Website added", "website": website })))
}

#[get("/api/websites")]
pub async fn list_websites(
    state: web::Data<AppState>,
    owner: OwnerId,
) -> Result<HttpResponse, AppError> {
    let monitors = state.monitors.list_monitors_for_owner(&owner.0).await?;

    let mut websites = Vec::with_capacity(monitors.len());
    for monitor in monitors {
        let summary = state.uptime.summary(monitor.uuid).await?;
        websites.push(WebsiteView { monitor, summary });
    }

    Ok(HttpResponse::Ok().json(json!({ "websites": websites })))
}

#[get("/api/websites/{id}")]
pub async fn get_website(
    state: web::Data<AppState>,
    owner: OwnerId,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_monitor_id(&path)?;
    let monitor = state.monitors.get_monitor_for_owner(id, &owner.0).await?.ok_or(AppError::NotFound)?;
    let summary = state.uptime.summary(monitor.uuid).await?;

    let website = WebsiteView { monitor, summary };
    Ok(HttpResponse::Ok().json(json!({ "website": website })))
}

#[put("/api/websites/{id}")]
pub async fn update_website(
    state: web::Data<AppState>,
    owner: OwnerId,
    path: web::Path<String>,
    body: web::Json<UpdateWebsite>,
) -> Result<HttpResponse, AppError> {
    let id = parse_monitor_id(&path)?;
    let body = body.into_inner();

    let update = MonitorUpdate {
        url: body
            .url
            .map(|url| validate_monitor_url(&url, state.allow_private_targets))
            .transpose()?,
        name: body.name.filter(|name| !name.trim().is_empty()),
        check_interval: body.check_interval.map(|minutes| validate_check_interval(Some(minutes))).transpose()?,
        is_active: body.is_active,
    };
    if update.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }

    let updated = state.monitors.update_monitor(id, &owner.0, &update).await?.ok_or(AppError::NotFound)?;
    info!(monitor = %updated.uuid, "Website updated");

    Ok(HttpResponse::Ok().json(json!({ "message": "Website updated", "monitor": updated })))
}

#[delete("/api/websites/{id}")]
pub async fn delete_website(
    state: web::Data<AppState>,
    owner: OwnerId,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_monitor_id(&path)?;

    if !state.monitors.delete_monitor(id, &owner.0).await? {
        return Err(AppError::NotFound);
    }
    info!(monitor = %id, "Website deleted");

    Ok(HttpResponse::Ok().json(json!({ "message": "Website deleted" })))
}

#[get("/api/websites/{id}/logs")]
pub async fn website_logs(
    state: web::Data<AppState>,
    owner: OwnerId,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_monitor_id(&path)?;
    state.monitors.get_monitor_for_owner(id, &owner.0).await?.ok_or(AppError::NotFound)?;

    let logs: Vec<CheckLogEntry> = state.uptime.recent_logs(id).await?;
    Ok(HttpResponse::Ok().json(json!({ "logs": logs })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use chrono::{Duration, Utc};
    use serde_json::{Value, json};
    use sitewatch_service::database::{CheckLogEntry, CheckLogStore, DatabaseImpl, open_database};
    use sitewatch_service::monitoring::MonitorStatus;
    use tempfile::TempDir;
    use uuid::Uuid;

    use crate::error::json_config;
    use crate::owner::OWNER_HEADER;
    use crate::state::AppState;

    async fn test_database() -> (Arc<DatabaseImpl>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_database(&dir.path().join("api.db").to_string_lossy()).await.unwrap();
        (Arc::new(DatabaseImpl::new_from_pool(pool)), dir)
    }

    macro_rules! test_app {
        ($db:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::new($db.clone(), false)))
                    .app_data(json_config())
                    .configure(crate::routes::routes),
            )
            .await
        };
    }

    macro_rules! create {
        ($app:expr, $owner:expr, $body:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/websites")
                .insert_header((OWNER_HEADER, $owner))
                .set_json($body)
                .to_request();
            let resp = test::call_service(&$app, req).await;
            let status: StatusCode = resp.status();
            let body: Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    #[actix_web::test]
    async fn test_create_then_duplicate() {
        let (db, _dir) = test_database().await;
        let app = test_app!(db);

        let (status, body) = create!(app, "alice", json!({ "url": "https://example.com" }));
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Website added");
        assert_eq!(body["website"]["url"], "https://example.com/");
        assert_eq!(body["website"]["checkInterval"], 5);
        assert_eq!(body["website"]["isActive"], true);

        let (status, body) = create!(app, "alice", json!({ "url": "https://example.com" }));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Website already added");

        // another owner may watch the same site
        let (status, _) = create!(app, "bob", json!({ "url": "https://example.com" }));
        assert_eq!(status, StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn test_create_rejects_bad_input() {
        let (db, _dir) = test_database().await;
        let app = test_app!(db);

        for body in [
            json!({ "url": "ftp://example.com" }),
            json!({ "url": "not a url" }),
            json!({ "url": "http://127.0.0.1:8080" }),
            json!({ "url": "https://example.com", "checkInterval": 0 }),
            json!({ "url": "https://example.com", "checkInterval": 5000 }),
        ] {
            let (status, body) = create!(app, "alice", body.clone());
            assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {body}");
            assert!(body["message"].is_string());
        }

        let req = test::TestRequest::post()
            .uri("/api/websites")
            .insert_header((OWNER_HEADER, "alice"))
            .insert_header(("content-type", "application/json"))
            .set_payload("{")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_missing_identity_is_unauthorized() {
        let (db, _dir) = test_database().await;
        let app = test_app!(db);

        let req = test::TestRequest::get().uri("/api/websites").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get().uri("/api/websites").insert_header((OWNER_HEADER, "  ")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_list_includes_uptime_figures() {
        let (db, _dir) = test_database().await;
        let app = test_app!(db);

        let (_, body) = create!(app, "alice", json!({ "url": "https://a.example", "name": "A" }));
        let id = Uuid::parse_str(body["website"]["id"].as_str().unwrap()).unwrap();
        create!(app, "alice", json!({ "url": "https://b.example" }));
        create!(app, "bob", json!({ "url": "https://c.example" }));

        let base = Utc::now();
        for (i, status) in [MonitorStatus::Up, MonitorStatus::Down, MonitorStatus::Up, MonitorStatus::Up]
            .into_iter()
            .enumerate()
        {
            db.append_log(&CheckLogEntry {
                id: None,
                monitor_id: id,
                status,
                status_code: if status == MonitorStatus::Up { 200 } else { 500 },
                response_time: 100 + i as u64,
                error: None,
                checked_at: base + Duration::seconds(i as i64),
            })
            .await
            .unwrap();
        }

        let req = test::TestRequest::get().uri("/api/websites").insert_header((OWNER_HEADER, "alice")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let websites = body["websites"].as_array().unwrap();
        assert_eq!(websites.len(), 2);

        let a = websites.iter().find(|w| w["id"] == id.to_string()).unwrap();
        assert_eq!(a["name"], "A");
        assert_eq!(a["uptimePercentage"], 75.0);
        assert_eq!(a["lastStatus"], "up");
        assert_eq!(a["lastResponseTime"], 103);

        let b = websites.iter().find(|w| w["id"] != id.to_string()).unwrap();
        assert_eq!(b["uptimePercentage"], 0.0);
        assert_eq!(b["lastStatus"], "unknown");
        assert!(b["lastResponseTime"].is_null());

        let req = test::TestRequest::get()
            .uri(&format!("/api/websites/{id}"))
            .insert_header((OWNER_HEADER, "alice"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["website"]["id"], id.to_string());
        assert_eq!(body["website"]["uptimePercentage"], 75.0);
        assert_eq!(body["website"]["lastStatus"], "up");
    }

    #[actix_web::test]
    async fn test_update_and_delete_respect_owner() {
        let (db, _dir) = test_database().await;
        let app = test_app!(db);

        let (_, body) = create!(app, "alice", json!({ "url": "https://a.example", "name": "Shop" }));
        let id = body["website"]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/websites/{id}");

        // bob cannot see, edit or delete alice's monitor
        let req = test::TestRequest::get().uri(&uri).insert_header((OWNER_HEADER, "bob")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header((OWNER_HEADER, "bob"))
            .set_json(json!({ "isActive": false }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        let req = test::TestRequest::delete().uri(&uri).insert_header((OWNER_HEADER, "bob")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header((OWNER_HEADER, "alice"))
            .set_json(json!({ "isActive": false, "checkInterval": 30 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Website updated");
        assert_eq!(body["monitor"]["isActive"], false);
        assert_eq!(body["monitor"]["checkInterval"], 30);
        assert_eq!(body["monitor"]["url"], "https://a.example/");

        // a blank name is ignored rather than stored
        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header((OWNER_HEADER, "alice"))
            .set_json(json!({ "name": "   ", "checkInterval": 10 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["monitor"]["name"], "Shop");
        assert_eq!(body["monitor"]["checkInterval"], 10);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header((OWNER_HEADER, "alice"))
            .set_json(json!({ "name": "  " }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header((OWNER_HEADER, "alice"))
            .set_json(json!({}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete().uri(&uri).insert_header((OWNER_HEADER, "alice")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Website deleted");

        let req = test::TestRequest::delete().uri(&uri).insert_header((OWNER_HEADER, "alice")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_logs_are_newest_first() {
        let (db, _dir) = test_database().await;
        let app = test_app!(db);

        let (_, body) = create!(app, "alice", json!({ "url": "https://a.example" }));
        let id = Uuid::parse_str(body["website"]["id"].as_str().unwrap()).unwrap();

        let base = Utc::now();
        for i in 0..3 {
            db.append_log(&CheckLogEntry {
                id: None,
                monitor_id: id,
                status: MonitorStatus::Down,
                status_code: 0,
                response_time: i,
                error: Some("connection failed".into()),
                checked_at: base + Duration::seconds(i as i64),
            })
            .await
            .unwrap();
        }

        let req = test::TestRequest::get()
            .uri(&format!("/api/websites/{id}/logs"))
            .insert_header((OWNER_HEADER, "alice"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let logs = body["logs"].as_array().unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0]["responseTime"], 2);
        assert_eq!(logs[2]["responseTime"], 0);
        assert_eq!(logs[0]["status"], "down");
        assert_eq!(logs[0]["error"], "connection failed");
    }

    #[actix_web::test]
    async fn test_malformed_id_is_rejected() {
        let (db, _dir) = test_database().await;
        let app = test_app!(db);

        let req = test::TestRequest::get()
            .uri("/api/websites/not-a-uuid")
            .insert_header((OWNER_HEADER, "alice"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid monitor ID");
    }
}
