use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use log::{error, info, warn};
use crate::models::{AdminLogin, AppState, ErrorResponse, StatsResponse};
use crate::store::SharedConnection;

pub const ADMIN_COOKIE_NAME: &str = "wordtwist_admin_session";

fn admin_cookie(value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(ADMIN_COOKIE_NAME, value)
        .path("/api/admin")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(max_age_secs))
        .finish()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = admin_cookie(String::new(), 0);
    cookie.make_removal();
    cookie
}

fn not_configured() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(ErrorResponse::new("Admin endpoint not configured"))
}

#[post("/api/admin/login")]
pub async fn admin_login(
    data: web::Data<AppState>,
    body: web::Json<AdminLogin>,
) -> impl Responder {
    let Some(admin) = &data.admin else {
        return not_configured();
    };

    if body.username != admin.username || body.password != admin.password {
        warn!("Rejected admin login for {}", body.username);
        return HttpResponse::Unauthorized().json(ErrorResponse::new("Invalid admin credentials"));
    }

    let token = data.admin_sessions.create().await;
    let ttl = data.game.config().admin_session_ttl.num_seconds();
    info!("Admin logged in");
    HttpResponse::Ok()
        .cookie(admin_cookie(token, ttl))
        .json(serde_json::json!({ "success": true }))
}

#[post("/api/admin/logout")]
pub async fn admin_logout(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Some(cookie) = req.cookie(ADMIN_COOKIE_NAME) {
        data.admin_sessions.delete(cookie.value()).await;
    }
    HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(serde_json::json!({ "success": true }))
}

#[get("/api/admin/stats")]
pub async fn admin_stats(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if data.admin.is_none() {
        return not_configured();
    }

    let Some(cookie) = req.cookie(ADMIN_COOKIE_NAME) else {
        return HttpResponse::Unauthorized().json(ErrorResponse::new("Admin authentication required"));
    };
    if !data.admin_sessions.validate(cookie.value()).await {
        return HttpResponse::Unauthorized()
            .cookie(removal_cookie())
            .json(ErrorResponse::new("Session expired"));
    }

    let active_sessions = match data.game.active_sessions().await {
        Ok(count) => count,
        Err(e) => {
            error!("Admin stats failed: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to fetch admin stats"));
        }
    };

    HttpResponse::Ok().json(StatsResponse {
        dictionary_size: data.game.dictionary_size(),
        cached_puzzles: data.game.cached_puzzles(),
        active_sessions,
        shared_store: data.redis.as_ref().is_some_and(SharedConnection::is_connected),
    })
}
