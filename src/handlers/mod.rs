pub mod admin;
pub mod puzzle;
pub mod rounds;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(puzzle::get_puzzle)
        .service(puzzle::post_solutions)
        .service(puzzle::health)
        .service(rounds::validate_word)
        .service(rounds::finish_round)
        .service(admin::admin_login)
        .service(admin::admin_logout)
        .service(admin::admin_stats);
}
