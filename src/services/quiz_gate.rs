//! Quiz gate
//!
//! `Question { index, time_left, selected } → Result → Complete`
//!
//! A fixed trivia set, one timer per question. Running out of time scores
//! the question as wrong even if an option was selected. Earned points go
//! into a per-session ledger (`mflix_quizzes`) that nothing else reads.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GateConfig;
use crate::errors::MflixError;
use crate::services::clock::{Clock, elapsed_secs};
use crate::session::SessionContext;

pub const QUIZ_STATE_KEY: &str = "quiz_gate";
pub const QUIZ_LEDGER_KEY: &str = "mflix_quizzes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    pub question: &'static str,
    pub options: &'static [&'static str],
    pub correct_answer: usize,
    pub points: u32,
}

pub static QUESTIONS: &[QuizQuestion] = &[
    QuizQuestion {
        question: "Which film won the first Academy Award for Best Picture?",
        options: &["Wings", "Sunrise", "The Jazz Singer", "Metropolis"],
        correct_answer: 0,
        points: 10,
    },
    QuizQuestion {
        question: "Who directed 'Spirited Away'?",
        options: &[
            "Isao Takahata",
            "Hayao Miyazaki",
            "Makoto Shinkai",
            "Mamoru Hosoda",
        ],
        correct_answer: 1,
        points: 10,
    },
    QuizQuestion {
        question: "In which year was the first 'Star Wars' film released?",
        options: &["1975", "1977", "1979", "1980"],
        correct_answer: 1,
        points: 15,
    },
    QuizQuestion {
        question: "Which series is set in the fictional town of Hawkins, Indiana?",
        options: &["Dark", "Twin Peaks", "Stranger Things", "The Leftovers"],
        correct_answer: 2,
        points: 15,
    },
    QuizQuestion {
        question: "What is the name of the ship in 'Cowboy Bebop'?",
        options: &["Swordfish", "Red Tail", "Hammerhead", "Bebop"],
        correct_answer: 3,
        points: 20,
    },
];

/// Question as shown to the visitor, answer withheld
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub question: &'static str,
    pub options: &'static [&'static str],
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuizState {
    Question {
        index: usize,
        time_left: u32,
        selected: Option<usize>,
    },
    Result,
    Complete {
        skipped: bool,
        earned_points: u32,
    },
}

impl QuizState {
    /// Variant plus question index; the per-question timer restarts only
    /// when this changes
    fn timer_phase(&self) -> (std::mem::Discriminant<QuizState>, Option<usize>) {
        let index = match self {
            QuizState::Question { index, .. } => Some(*index),
            _ => None,
        };
        (std::mem::discriminant(self), index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    NotAnswering,
    InvalidAnswer(usize),
    NotAtResult,
    AlreadyComplete,
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizError::NotAnswering => write!(f, "No question is open"),
            QuizError::InvalidAnswer(i) => write!(f, "Answer {} is not an option", i),
            QuizError::NotAtResult => write!(f, "Quiz is not finished yet"),
            QuizError::AlreadyComplete => write!(f, "Quiz is already complete"),
        }
    }
}

impl std::error::Error for QuizError {}

impl From<QuizError> for MflixError {
    fn from(err: QuizError) -> Self {
        MflixError::gate(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizGate {
    state: QuizState,
    earned_points: u32,
    correct_answers: u32,
    question_secs: u32,
}

impl QuizGate {
    pub fn new(question_secs: u32) -> Self {
        let question_secs = question_secs.max(1);
        let state = if QUESTIONS.is_empty() {
            QuizState::Result
        } else {
            QuizState::Question {
                index: 0,
                time_left: question_secs,
                selected: None,
            }
        };
        Self {
            state,
            earned_points: 0,
            correct_answers: 0,
            question_secs,
        }
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn earned_points(&self) -> u32 {
        self.earned_points
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn current_question(&self) -> Option<QuestionView> {
        let QuizState::Question { index, .. } = self.state else {
            return None;
        };
        QUESTIONS.get(index).map(|q| QuestionView {
            index,
            total: QUESTIONS.len(),
            question: q.question,
            options: q.options,
            points: q.points,
        })
    }

    pub fn select(&mut self, answer: usize) -> Result<(), QuizError> {
        let QuizState::Question {
            index, selected, ..
        } = &mut self.state
        else {
            return Err(QuizError::NotAnswering);
        };
        let options = QUESTIONS.get(*index).map_or(0, |q| q.options.len());
        if answer >= options {
            return Err(QuizError::InvalidAnswer(answer));
        }
        *selected = Some(answer);
        Ok(())
    }

    /// Score the open question and move on. Returns whether it was correct.
    pub fn submit(&mut self) -> Result<bool, QuizError> {
        let QuizState::Question {
            index, selected, ..
        } = self.state
        else {
            return Err(QuizError::NotAnswering);
        };
        let correct = match (QUESTIONS.get(index), selected) {
            (Some(q), Some(answer)) if answer == q.correct_answer => {
                self.earned_points += q.points;
                self.correct_answers += 1;
                true
            }
            _ => false,
        };
        self.next_question(index);
        Ok(correct)
    }

    pub fn tick(&mut self) {
        if let QuizState::Question {
            index, time_left, ..
        } = &mut self.state
        {
            *time_left = time_left.saturating_sub(1);
            if *time_left == 0 {
                // 超时按答错处理
                let index = *index;
                self.next_question(index);
            }
        }
    }

    pub fn advance(&mut self, secs: u64) {
        let mut left = secs;
        while left > 0 && matches!(self.state, QuizState::Question { .. }) {
            self.tick();
            left -= 1;
        }
    }

    fn next_question(&mut self, index: usize) {
        let next = index + 1;
        self.state = if next < QUESTIONS.len() {
            QuizState::Question {
                index: next,
                time_left: self.question_secs,
                selected: None,
            }
        } else {
            QuizState::Result
        };
    }

    /// `Result → Complete`; returns the points to credit
    pub fn finish(&mut self) -> Result<u32, QuizError> {
        match self.state {
            QuizState::Result => {
                self.state = QuizState::Complete {
                    skipped: false,
                    earned_points: self.earned_points,
                };
                Ok(self.earned_points)
            }
            QuizState::Complete { .. } => Err(QuizError::AlreadyComplete),
            QuizState::Question { .. } => Err(QuizError::NotAtResult),
        }
    }

    pub fn skip(&mut self) -> Result<(), QuizError> {
        if matches!(self.state, QuizState::Complete { .. }) {
            return Err(QuizError::AlreadyComplete);
        }
        self.state = QuizState::Complete {
            skipped: true,
            earned_points: 0,
        };
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, QuizState::Complete { .. })
    }
}

/// Session-local points ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizLedger {
    pub total_points: u64,
    pub quizzes_completed: u32,
    pub quizzes_skipped: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredQuiz {
    quiz: QuizGate,
    last_tick_ms: i64,
}

pub struct QuizGateService {
    clock: Arc<dyn Clock>,
    question_secs: u32,
}

impl QuizGateService {
    pub fn new(clock: Arc<dyn Clock>, config: &GateConfig) -> Self {
        Self {
            clock,
            question_secs: config.quiz_question_secs,
        }
    }

    /// Replace any quiz in progress with a fresh one
    pub async fn start(&self, session: &SessionContext) -> QuizGate {
        let quiz = QuizGate::new(self.question_secs);
        let stored = StoredQuiz {
            quiz: quiz.clone(),
            last_tick_ms: self.clock.now_ms(),
        };
        session.set_json(QUIZ_STATE_KEY, &stored, None).await;
        debug!("Quiz started for session {}", session.id());
        quiz
    }

    /// Run `f` on the caught-up quiz; `None` when no quiz was started
    pub async fn with_quiz<T>(
        &self,
        session: &SessionContext,
        f: impl FnOnce(&mut QuizGate) -> T,
    ) -> Option<T> {
        let now = self.clock.now_ms();
        let mut stored = session.get_json::<StoredQuiz>(QUIZ_STATE_KEY).await?;

        let elapsed = elapsed_secs(stored.last_tick_ms, now);
        stored.quiz.advance(elapsed);
        stored.last_tick_ms = stored
            .last_tick_ms
            .saturating_add(elapsed as i64 * 1000)
            .min(now);

        // 只有换题或离开答题状态才重新计时，选择选项不影响计时
        let before = stored.quiz.state.timer_phase();
        let out = f(&mut stored.quiz);
        if stored.quiz.state.timer_phase() != before {
            stored.last_tick_ms = now;
        }

        session.set_json(QUIZ_STATE_KEY, &stored, None).await;
        Some(out)
    }

    pub async fn ledger(&self, session: &SessionContext) -> QuizLedger {
        session
            .get_json::<QuizLedger>(QUIZ_LEDGER_KEY)
            .await
            .unwrap_or_default()
    }

    /// Credit a finished quiz (or count a skipped one)
    pub async fn record(&self, session: &SessionContext, earned: u32, skipped: bool) -> QuizLedger {
        let mut ledger = self.ledger(session).await;
        if skipped {
            ledger.quizzes_skipped += 1;
        } else {
            ledger.quizzes_completed += 1;
            ledger.total_points += u64::from(earned);
        }
        session.set_json(QUIZ_LEDGER_KEY, &ledger, None).await;
        info!(
            "Quiz {} for session {}: +{} points (total {})",
            if skipped { "skipped" } else { "completed" },
            session.id(),
            if skipped { 0 } else { earned },
            ledger.total_points
        );
        ledger
    }
}
