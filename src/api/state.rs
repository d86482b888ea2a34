//! Shared application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::domain::rate_limit::{GuestRateLimitStore, RateLimitRule};
use crate::domain::LlmProvider;
use crate::infrastructure::archive::ArchiveService;
use crate::infrastructure::auth::{AuthService, JwtConfig, JwtService};
use crate::infrastructure::generation::{GenerationService, GenerationSettings};
use crate::infrastructure::note::NoteService;
use crate::infrastructure::storage::Repositories;
use crate::infrastructure::template::TemplateService;
use crate::infrastructure::usage::UsageService;
use crate::infrastructure::user::{Argon2Hasher, PasswordHasher, UserService};

/// Refresh-cookie attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub usage: Arc<UsageService>,
    pub archives: Arc<ArchiveService>,
    pub templates: Arc<TemplateService>,
    pub notes: Arc<NoteService>,
    pub generation: Arc<GenerationService>,
    pub guest_limiter: Arc<dyn GuestRateLimitStore>,
    pub guest_rule: RateLimitRule,
    pub cookies: CookieSettings,
    /// Pinged by `/ready`; absent on the in-memory backend
    pub db: Option<PgPool>,
}

impl AppState {
    /// Wire the services over an already-selected backend
    pub fn new(
        config: &AppConfig,
        repos: Repositories,
        llm: Arc<dyn LlmProvider>,
        guest_limiter: Arc<dyn GuestRateLimitStore>,
        db: Option<PgPool>,
    ) -> Self {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new());
        let jwt = Arc::new(JwtService::new(JwtConfig::new(
            config.auth.jwt_secret.clone(),
            config.auth.access_token_ttl_secs,
            config.auth.refresh_token_ttl_secs,
        )));

        let usage = Arc::new(UsageService::new(repos.usage.clone(), config.limits.clone()));

        let generation = GenerationService::new(
            repos.users.clone(),
            usage.clone(),
            repos.archives.clone(),
            llm,
            GenerationSettings {
                model: config.llm.model.clone(),
                temperature: config.llm.temperature,
                top_p: config.llm.top_p,
            },
        );

        Self {
            auth: Arc::new(AuthService::new(
                repos.users.clone(),
                repos.sessions.clone(),
                hasher.clone(),
                jwt,
            )),
            users: Arc::new(UserService::new(repos.users.clone(), usage.clone(), hasher)),
            archives: Arc::new(ArchiveService::new(
                repos.archives.clone(),
                repos.users.clone(),
            )),
            templates: Arc::new(TemplateService::new(
                repos.templates.clone(),
                repos.archives.clone(),
                repos.users.clone(),
            )),
            notes: Arc::new(NoteService::new(repos.notes.clone())),
            generation: Arc::new(generation),
            usage,
            guest_limiter,
            guest_rule: RateLimitRule::guest_daily(config.limits.guest.max_requests_per_day),
            cookies: CookieSettings {
                secure: config.auth.secure_cookies,
            },
            db,
        }
    }
}
