pub mod question;
pub mod quiz;
pub mod quiz_attempt;
pub mod refresh_token;
pub mod subject;
pub mod user;

pub use question::{AnswerKey, Question, QuestionType, Selection};
pub use quiz::Quiz;
pub use quiz_attempt::{QuizAttempt, UserAnswer};
pub use refresh_token::RefreshToken;
pub use subject::{Chapter, Subject};
pub use user::{User, UserRole};
