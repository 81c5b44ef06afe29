mod ids;
mod question;
mod quiz;
mod score;

pub use ids::{QuizId, UserId};
pub use question::{Question, QuestionError};
pub use quiz::{Quiz, QuizError};
pub use score::{ScoreRecord, ScoreRecordError};
