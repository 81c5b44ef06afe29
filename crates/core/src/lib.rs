#![forbid(unsafe_code)]

pub mod model;
pub mod scorer;
pub mod time;

pub use model::{
    Question, QuestionError, Quiz, QuizError, QuizId, ScoreRecord, ScoreRecordError, UserId,
};
pub use time::Clock;
