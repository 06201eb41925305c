use axum::{
    Router,
    routing::{get, post, put},
};

pub mod accounts;
pub mod answers;
pub mod common;
pub mod questions;
pub mod system;
pub mod users;

/// Router for every forum endpoint. Each request carries a session context,
/// anonymous or not.
pub fn router() -> Router {
    Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route("/whoami", get(system::whoami))
        .route(
            "/questions",
            get(questions::list_questions).post(questions::create_question),
        )
        .route(
            "/questions/:id",
            get(questions::get_question)
                .put(questions::edit_question)
                .delete(questions::delete_question),
        )
        .route("/questions/:id/answers", post(answers::create_answer))
        .route(
            "/answers/:id",
            put(answers::edit_answer).delete(answers::delete_answer),
        )
        .route("/users/:id/questions", get(users::list_user_questions))
        .route("/users/:id/answers", get(users::list_user_answers))
}
