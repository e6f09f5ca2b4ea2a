use actix_web::{post, web, HttpResponse, Responder};
use log::{error, info};
use crate::game::Submission;
use crate::models::{AppState, ErrorResponse, SessionRequest, ValidateRequest, ValidateResponse};
use crate::store::RejectReason;

fn is_well_formed(data: &AppState, word: &str) -> bool {
    let config = data.game.config();
    let len = word.trim().len();
    len >= config.min_word_length
        && len <= config.max_word_length
        && word.trim().chars().all(|c| c.is_ascii_alphabetic())
}

fn rejection(word: String, reason: RejectReason) -> HttpResponse {
    let body = ValidateResponse {
        valid: false,
        word,
        error: Some(reason.message().to_string()),
        ..ValidateResponse::default()
    };
    match reason {
        RejectReason::SessionNotFound | RejectReason::TimeExpired => HttpResponse::BadRequest().json(body),
        RejectReason::AlreadyFound => HttpResponse::Ok().json(body),
        RejectReason::InvalidWord => HttpResponse::Ok().json(ValidateResponse {
            points: Some(0),
            error: None,
            ..body
        }),
    }
}

// Check a guess against the letters the session was dealt, and credit it
#[post("/api/validate")]
pub async fn validate_word(
    data: web::Data<AppState>,
    body: web::Json<ValidateRequest>,
) -> impl Responder {
    if !is_well_formed(&data, &body.word) {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Validation failed"));
    }

    match data.game.submit_word(&body.session_id, &body.word).await {
        Ok(Submission::Accepted { word, points, score }) => HttpResponse::Ok().json(ValidateResponse {
            valid: true,
            word,
            points: Some(points),
            session_score: Some(score),
            error: None,
        }),
        Ok(Submission::Rejected { word, reason }) => rejection(word, reason),
        Err(e) => {
            error!("Word validation failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to validate word"))
        }
    }
}

// Close the round and hand back its summary for the score keeper
#[post("/api/finish")]
pub async fn finish_round(
    data: web::Data<AppState>,
    body: web::Json<SessionRequest>,
) -> impl Responder {
    match data.game.finish(&body.session_id).await {
        Ok(Ok(summary)) => {
            info!(
                "Round finished: level {} {} with {} words for {} points",
                summary.level, summary.game_mode, summary.words_found, summary.score
            );
            HttpResponse::Ok().json(summary)
        }
        Ok(Err(RejectReason::TimeExpired)) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("Time expired - score not recorded"))
        }
        Ok(Err(reason)) => HttpResponse::BadRequest().json(ErrorResponse::new(reason.message())),
        Err(e) => {
            error!("Finishing round failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to finish round"))
        }
    }
}
