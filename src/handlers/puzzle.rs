use actix_web::{get, post, web, HttpResponse, Responder};
use log::error;
use crate::models::{AppState, ErrorResponse, PuzzleQuery, SessionRequest, SolutionsResponse};
use crate::store::GameMode;

#[get("/api/puzzle")]
pub async fn get_puzzle(
    data: web::Data<AppState>,
    query: web::Query<PuzzleQuery>,
) -> impl Responder {
    let level = query.level.unwrap_or(1).max(1);
    let mode = GameMode::from_query(query.mode.as_deref());

    match data.game.start_round(level, mode).await {
        Ok(round) => HttpResponse::Ok().json(round),
        Err(e) => {
            error!("Failed to start level {} round: {}", level, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to create puzzle"))
        }
    }
}

// Reveal every solution at the end of a round
#[post("/api/solutions")]
pub async fn post_solutions(
    data: web::Data<AppState>,
    body: web::Json<SessionRequest>,
) -> impl Responder {
    match data.game.reveal(&body.session_id).await {
        Ok(Ok(solutions)) => HttpResponse::Ok().json(SolutionsResponse {
            words: solutions.words().to_vec(),
        }),
        Ok(Err(reason)) => HttpResponse::BadRequest().json(ErrorResponse::new(reason.message())),
        Err(e) => {
            error!("Solutions lookup failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to fetch solutions"))
        }
    }
}

#[get("/api/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
