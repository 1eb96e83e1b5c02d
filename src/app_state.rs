use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::Config,
    db::{Database, HealthCheck},
    errors::AppResult,
    jobs::{JobQueue, JobRunner, LogMailer, Mailer, RetryPolicy},
    repositories::{
        ChapterRepository, MongoChapterRepository, MongoQuestionRepository,
        MongoQuizAttemptRepository, MongoQuizRepository, MongoRefreshTokenRepository,
        MongoSubjectRepository, MongoUserRepository, QuestionRepository, QuizAttemptRepository,
        QuizRepository, RefreshTokenRepository, SubjectRepository, UserRepository,
    },
    services::{
        AuthService, CatalogService, DashboardService, QuizAttemptService, QuizService,
        UserService,
    },
};

/// Every storage seam the services depend on.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub subjects: Arc<dyn SubjectRepository>,
    pub chapters: Arc<dyn ChapterRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub attempts: Arc<dyn QuizAttemptRepository>,
}

impl Repositories {
    pub fn mongo(db: &Database) -> Self {
        Self {
            users: Arc::new(MongoUserRepository::new(db)),
            refresh_tokens: Arc::new(MongoRefreshTokenRepository::new(db)),
            subjects: Arc::new(MongoSubjectRepository::new(db)),
            chapters: Arc::new(MongoChapterRepository::new(db)),
            quizzes: Arc::new(MongoQuizRepository::new(db)),
            questions: Arc::new(MongoQuestionRepository::new(db)),
            attempts: Arc::new(MongoQuizAttemptRepository::new(db)),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        self.users.ensure_indexes().await?;
        self.refresh_tokens.ensure_indexes().await?;
        self.subjects.ensure_indexes().await?;
        self.chapters.ensure_indexes().await?;
        self.quizzes.ensure_indexes().await?;
        self.questions.ensure_indexes().await?;
        self.attempts.ensure_indexes().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub health: Arc<dyn HealthCheck>,
    pub jwt_service: JwtService,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub catalog_service: Arc<CatalogService>,
    pub quiz_service: Arc<QuizService>,
    pub quiz_attempt_service: Arc<QuizAttemptService>,
    pub dashboard_service: Arc<DashboardService>,
    pub job_queue: JobQueue,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let repositories = Repositories::mongo(&db);
        repositories.ensure_indexes().await?;

        let mailer = Arc::new(LogMailer::new(config.mail_from.clone()));
        Ok(Self::from_parts(config, repositories, Arc::new(db), mailer))
    }

    /// Wires services over the given storage and starts the job worker.
    /// Must be called inside a tokio runtime.
    pub fn from_parts(
        config: Config,
        repos: Repositories,
        health: Arc<dyn HealthCheck>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let ladder = config.performance_ladder.clone();
        let jwt_service = JwtService::new(
            &config.jwt_secret,
            config.jwt_expiration_hours,
            config.jwt_refresh_expiration_hours,
        );

        let retry = RetryPolicy::new(config.job_max_retries);
        let runner = Arc::new(JobRunner {
            users: repos.users.clone(),
            subjects: repos.subjects.clone(),
            chapters: repos.chapters.clone(),
            quizzes: repos.quizzes.clone(),
            attempts: repos.attempts.clone(),
            mailer,
            ladder: ladder.clone(),
            retry,
        });
        let (job_queue, _worker) = JobQueue::start(runner, retry);

        Self {
            health,
            auth_service: Arc::new(AuthService::new(
                repos.users.clone(),
                repos.refresh_tokens.clone(),
                jwt_service.clone(),
            )),
            user_service: Arc::new(UserService::new(
                repos.users.clone(),
                repos.attempts.clone(),
                ladder.clone(),
            )),
            catalog_service: Arc::new(CatalogService::new(
                repos.subjects.clone(),
                repos.chapters.clone(),
                repos.quizzes.clone(),
            )),
            quiz_service: Arc::new(QuizService::new(
                repos.quizzes.clone(),
                repos.questions.clone(),
                repos.chapters.clone(),
                repos.subjects.clone(),
                repos.attempts.clone(),
            )),
            quiz_attempt_service: Arc::new(QuizAttemptService::new(
                repos.quizzes.clone(),
                repos.questions.clone(),
                repos.attempts.clone(),
                ladder.clone(),
            )),
            dashboard_service: Arc::new(DashboardService::new(
                repos.users,
                repos.subjects,
                repos.quizzes,
                repos.attempts,
                ladder,
            )),
            jwt_service,
            job_queue,
            config: Arc::new(config),
        }
    }
}
