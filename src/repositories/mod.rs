pub mod cascade;
pub mod chapter_repository;
pub mod question_repository;
pub mod quiz_attempt_repository;
pub mod quiz_repository;
pub mod refresh_token_repository;
pub mod subject_repository;
pub mod user_repository;

pub use chapter_repository::{ChapterRepository, MongoChapterRepository};
pub use question_repository::{MongoQuestionRepository, QuestionRepository};
pub use quiz_attempt_repository::{MongoQuizAttemptRepository, QuizAttemptRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};
pub use refresh_token_repository::{MongoRefreshTokenRepository, RefreshTokenRepository};
pub use subject_repository::{MongoSubjectRepository, SubjectRepository};
pub use user_repository::{MongoUserRepository, UserRepository};
