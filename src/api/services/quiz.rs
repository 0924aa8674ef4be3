//! 问答门 `/api/quiz`

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::services::quiz_gate::{QuestionView, QuizError};
use crate::services::{QuizGate, QuizGateService, QuizLedger, QuizState};
use crate::session::SessionContext;

use super::admin::{ErrorCode, error_response, success_response};

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: usize,
}

#[derive(Debug, Serialize)]
pub struct QuizView {
    #[serde(flatten)]
    pub state: QuizState,
    pub question: Option<QuestionView>,
    /// Points earned so far
    pub score: u32,
    pub correct_answers: u32,
}

impl From<&QuizGate> for QuizView {
    fn from(quiz: &QuizGate) -> Self {
        Self {
            state: quiz.state().clone(),
            question: quiz.current_question(),
            score: quiz.earned_points(),
            correct_answers: quiz.correct_answers(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub correct: bool,
    #[serde(flatten)]
    pub quiz: QuizView,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    #[serde(flatten)]
    pub quiz: QuizView,
    pub ledger: QuizLedger,
}

fn not_started() -> HttpResponse {
    error_response(
        StatusCode::NOT_FOUND,
        ErrorCode::QuizNotStarted,
        "No quiz in progress",
    )
}

fn invalid_state(err: QuizError) -> HttpResponse {
    error_response(
        StatusCode::CONFLICT,
        ErrorCode::QuizInvalidState,
        &err.to_string(),
    )
}

/// Turn a quiz operation into a response
fn respond<T: Serialize>(outcome: Option<Result<T, QuizError>>) -> HttpResponse {
    match outcome {
        None => not_started(),
        Some(Ok(data)) => success_response(data),
        Some(Err(e)) => invalid_state(e),
    }
}

pub async fn start(
    session: SessionContext,
    quizzes: web::Data<Arc<QuizGateService>>,
) -> HttpResponse {
    let quiz = quizzes.start(&session).await;
    success_response(QuizView::from(&quiz))
}

pub async fn get_quiz(
    session: SessionContext,
    quizzes: web::Data<Arc<QuizGateService>>,
) -> HttpResponse {
    match quizzes
        .with_quiz(&session, |quiz| QuizView::from(&*quiz))
        .await
    {
        Some(view) => success_response(view),
        None => not_started(),
    }
}

pub async fn select(
    body: web::Json<AnswerRequest>,
    session: SessionContext,
    quizzes: web::Data<Arc<QuizGateService>>,
) -> HttpResponse {
    let answer = body.answer;
    respond(
        quizzes
            .with_quiz(&session, |quiz| {
                quiz.select(answer).map(|_| QuizView::from(&*quiz))
            })
            .await,
    )
}

pub async fn submit(
    session: SessionContext,
    quizzes: web::Data<Arc<QuizGateService>>,
) -> HttpResponse {
    respond(
        quizzes
            .with_quiz(&session, |quiz| {
                quiz.submit().map(|correct| SubmitResponse {
                    correct,
                    quiz: QuizView::from(&*quiz),
                })
            })
            .await,
    )
}

pub async fn finish(
    session: SessionContext,
    quizzes: web::Data<Arc<QuizGateService>>,
) -> HttpResponse {
    let outcome = quizzes
        .with_quiz(&session, |quiz| {
            quiz.finish().map(|earned| (earned, QuizView::from(&*quiz)))
        })
        .await;
    match outcome {
        None => not_started(),
        Some(Err(e)) => invalid_state(e),
        Some(Ok((earned, quiz))) => {
            let ledger = quizzes.record(&session, earned, false).await;
            success_response(CompletionResponse { quiz, ledger })
        }
    }
}

pub async fn skip(
    session: SessionContext,
    quizzes: web::Data<Arc<QuizGateService>>,
) -> HttpResponse {
    let outcome = quizzes
        .with_quiz(&session, |quiz| quiz.skip().map(|_| QuizView::from(&*quiz)))
        .await;
    match outcome {
        None => not_started(),
        Some(Err(e)) => invalid_state(e),
        Some(Ok(quiz)) => {
            let ledger = quizzes.record(&session, 0, true).await;
            success_response(CompletionResponse { quiz, ledger })
        }
    }
}

pub async fn get_ledger(
    session: SessionContext,
    quizzes: web::Data<Arc<QuizGateService>>,
) -> HttpResponse {
    success_response(quizzes.ledger(&session).await)
}

pub fn quiz_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/quiz", web::get().to(get_quiz))
        .route("/quiz/start", web::post().to(start))
        .route("/quiz/select", web::post().to(select))
        .route("/quiz/submit", web::post().to(submit))
        .route("/quiz/finish", web::post().to(finish))
        .route("/quiz/skip", web::post().to(skip))
        .route("/quiz/ledger", web::get().to(get_ledger));
}
