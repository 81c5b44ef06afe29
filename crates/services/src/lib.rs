#![forbid(unsafe_code)]

pub mod analytics;
pub mod auth;
pub mod error;
pub mod queries;
pub mod reporter;
pub mod session;
pub mod source;

pub use quiz_core::Clock;

pub use analytics::{AnalyticsEvent, AnalyticsSink, HttpAnalytics, NoopAnalytics};
pub use auth::{AuthProvider, StaticAuthProvider};
pub use error::{QueryError, ReportError, SessionError, SourceError};
pub use queries::{QuizCatalogService, ScoreHistoryService};
pub use reporter::{RepositoryResultReporter, ResultReporter};
pub use session::{
    AdvanceOutcome, AdvanceReason, Phase, QuizSession, SessionEvent, SessionHandle,
    SessionRunner, SessionSettings, TickOutcome,
};
pub use source::{QuestionSource, RepositoryQuestionSource};
