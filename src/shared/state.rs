use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use crate::domains::account::{SessionStore, SignOutOutcome};
use crate::media::{BitmapCache, ImageLoader};
use crate::network::{RequestQueue, RestClient, RestClientSet};
use crate::shared::lifecycle::LifecycleEvent;
use crate::shared::user_agent::UserAgent;
use crate::system::build_config::{BuildConfig, BuildConfigValue};
use crate::system::config::AppConfig;
use crate::system::locale::{
    parse_locale_preference, Locale, LocaleError, LocalizedContext, MessageLoader,
};
use crate::system::versioning::ApiVersion;

/// Process-wide facilities, built once at startup.
///
/// Everything except the localized context, the background flag and the
/// session is fixed after [`ProcessState::initialize`]. Hand out
/// `Arc<ProcessState>` to components, or install it in
/// [`crate::shared::global`] for call sites that have no handle.
pub struct ProcessState {
    config: Arc<AppConfig>,
    build_config: Arc<BuildConfig>,
    request_queue: Arc<RequestQueue>,
    bitmap_cache: Arc<BitmapCache>,
    image_loader: Arc<ImageLoader>,
    message_loader: Arc<MessageLoader>,
    localized_context: RwLock<Arc<LocalizedContext>>,
    rest_clients: RestClientSet,
    user_agent: UserAgent,
    session: Arc<SessionStore>,
    backgrounded: AtomicBool,
    initialized_at: DateTime<Utc>,
}

impl ProcessState {
    /// Builds the whole dependency graph. Any error is fatal to the process:
    /// no partially built state is ever returned.
    pub async fn initialize(config: AppConfig) -> Result<Arc<Self>> {
        info!("🚀 Initializing process state ({})", config.environment);

        let user_agent = UserAgent::new(
            config.network.default_user_agent.as_deref(),
            &config.version_name,
        );

        let mut build_config = BuildConfig::load_or_empty(
            config.build.resolved_config_path(),
            &config.build.flavor,
        );
        if let Some(debug) = config.build.debug {
            build_config = build_config.with_debug(debug);
        }
        debug!(
            "Build flavor {} (debug: {})",
            build_config.flavor, build_config.debug
        );

        let request_queue = Arc::new(
            RequestQueue::new(&config.network, &user_agent)
                .context("Failed to create request queue")?,
        );

        let bitmap_cache = Arc::new(BitmapCache::new(config.images.cache_capacity));
        let image_loader = Arc::new(ImageLoader::new(
            Arc::clone(&request_queue),
            Arc::clone(&bitmap_cache),
            config.images.max_image_bytes,
        ));

        let message_loader = Arc::new(MessageLoader::new(&config.locale.directory));
        let preloaded = message_loader.preload_all().await;
        debug!("Preloaded {} locale files", preloaded);
        let requested = parse_locale_preference(&config.locale.preferred, message_loader.registry())
            .unwrap_or_else(|e| {
                debug!("Falling back to default locale: {}", e);
                message_loader.registry().get_default_locale().clone()
            });
        let localized_context = LocalizedContext::build(&message_loader, &requested)
            .await
            .with_context(|| {
                format!(
                    "Failed to build localized context from {}",
                    config.locale.directory
                )
            })?;
        info!("🌍 Locale: {}", localized_context.locale());

        let session = Arc::new(SessionStore::new());

        let rest_clients = RestClientSet::build(
            &config.network.rest_base_url,
            Arc::clone(&request_queue),
            Arc::clone(&session),
        )
        .context("Failed to create REST clients")?;

        info!("✅ Process state ready, user agent: {}", user_agent);

        Ok(Arc::new(Self {
            config: Arc::new(config),
            build_config: Arc::new(build_config),
            request_queue,
            bitmap_cache,
            image_loader,
            message_loader,
            localized_context: RwLock::new(Arc::new(localized_context)),
            rest_clients,
            user_agent,
            session,
            // Until the host says otherwise the app is not visible
            backgrounded: AtomicBool::new(true),
            initialized_at: Utc::now(),
        }))
    }

    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    pub fn build_config(&self) -> &Arc<BuildConfig> {
        &self.build_config
    }

    pub fn request_queue(&self) -> &Arc<RequestQueue> {
        &self.request_queue
    }

    pub fn image_loader(&self) -> &Arc<ImageLoader> {
        &self.image_loader
    }

    pub fn bitmap_cache(&self) -> &Arc<BitmapCache> {
        &self.bitmap_cache
    }

    pub fn message_loader(&self) -> &Arc<MessageLoader> {
        &self.message_loader
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn rest_clients(&self) -> &RestClientSet {
        &self.rest_clients
    }

    pub fn rest_client_for(&self, version: ApiVersion) -> &Arc<RestClient> {
        self.rest_clients.get(version)
    }

    pub fn rest_client_v0(&self) -> &Arc<RestClient> {
        self.rest_clients.get(ApiVersion::V0)
    }

    /// The default (v1) client.
    pub fn rest_client(&self) -> &Arc<RestClient> {
        self.rest_clients.default_client()
    }

    pub fn rest_client_v1_1(&self) -> &Arc<RestClient> {
        self.rest_clients.get(ApiVersion::V1_1)
    }

    pub fn rest_client_v1_2(&self) -> &Arc<RestClient> {
        self.rest_clients.get(ApiVersion::V1_2)
    }

    pub fn rest_client_v1_3(&self) -> &Arc<RestClient> {
        self.rest_clients.get(ApiVersion::V1_3)
    }

    pub fn rest_client_v2(&self) -> &Arc<RestClient> {
        self.rest_clients.get(ApiVersion::V2)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_str()
    }

    pub fn default_user_agent(&self) -> &str {
        self.user_agent.default_agent()
    }

    pub fn version_name(&self) -> &str {
        &self.config.version_name
    }

    pub fn initialized_at(&self) -> DateTime<Utc> {
        self.initialized_at
    }

    /// Snapshot of the current context. Later locale changes do not affect it.
    pub fn localized_context(&self) -> Arc<LocalizedContext> {
        let guard = self
            .localized_context
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Rebuilds the localized context from a device language preference.
    /// On error the current context is kept.
    pub async fn update_locale(&self, preference: &str) -> Result<Arc<LocalizedContext>, LocaleError> {
        let locale = parse_locale_preference(preference, self.message_loader.registry())?;
        self.update_locale_to(&locale).await
    }

    pub async fn update_locale_to(&self, locale: &Locale) -> Result<Arc<LocalizedContext>, LocaleError> {
        let context = Arc::new(LocalizedContext::build(&self.message_loader, locale).await?);

        {
            let mut current = self
                .localized_context
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *current = Arc::clone(&context);
        }

        info!("🌍 Locale changed to {}", context.locale());
        Ok(context)
    }

    /// Re-reads the locale files of the current locale and its fallbacks,
    /// e.g. after new translations were downloaded.
    pub async fn refresh_locale(&self) -> Result<Arc<LocalizedContext>, LocaleError> {
        let locale = self.localized_context().locale().clone();
        self.message_loader.reload_locale(&locale).await?;
        for fallback in self.message_loader.registry().get_fallback_chain(&locale) {
            if let Err(e) = self.message_loader.reload_locale(&fallback).await {
                debug!("Fallback locale {} not reloaded: {}", fallback, e);
            }
        }
        self.update_locale_to(&locale).await
    }

    /// Clears session-scoped state. Shared facilities stay up.
    pub async fn sign_out(&self) -> SignOutOutcome {
        self.session.sign_out().await
    }

    pub fn read_build_config_value(&self, package: &str, field: &str) -> Option<BuildConfigValue> {
        self.build_config.read_value(package, field).cloned()
    }

    /// Empty outside debug builds.
    pub fn read_build_config_string(&self, package: &str, field: &str) -> String {
        self.build_config.read_string(package, field)
    }

    pub fn on_foreground(&self) {
        if self.backgrounded.swap(false, Ordering::SeqCst) {
            debug!("App moved to the foreground");
        }
    }

    pub fn on_background(&self) {
        if !self.backgrounded.swap(true, Ordering::SeqCst) {
            debug!("App moved to the background");
        }
    }

    pub fn is_backgrounded(&self) -> bool {
        self.backgrounded.load(Ordering::SeqCst)
    }

    pub async fn handle_lifecycle(&self, event: LifecycleEvent) -> Result<(), LocaleError> {
        match event {
            LifecycleEvent::Foregrounded => self.on_foreground(),
            LifecycleEvent::Backgrounded => self.on_background(),
            LifecycleEvent::LocaleChanged(preference) => {
                self.update_locale(&preference).await?;
            }
            LifecycleEvent::SignedOut => {
                self.sign_out().await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::account::{AccountSession, SessionScoped};
    use crate::shared::global::ProcessCell;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    const PACKAGE: &str = "org.example.blog";

    struct Fixture {
        _dir: TempDir,
        config: AppConfig,
    }

    fn fixture(debug: bool) -> Fixture {
        let dir = TempDir::new().unwrap();
        let locales = dir.path().join("locales");
        fs::create_dir(&locales).unwrap();
        fs::write(
            locales.join("en.json"),
            r#"{ "messages": { "hello": "Hello", "posts": "Posts" } }"#,
        )
        .unwrap();
        fs::write(
            locales.join("vi.json"),
            r#"{ "messages": { "hello": "Xin chào" } }"#,
        )
        .unwrap();

        let build_path = dir.path().join("build.wordpress.json");
        fs::write(
            &build_path,
            r#"{ "flavor": "wordpress",
                 "packages": { "org.example.blog": { "DEBUG_AUTOFILL_USERNAME": "demo" } } }"#,
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.locale.directory = locales.display().to_string();
        config.build.config_path = Some(build_path.display().to_string());
        config.build.debug = Some(debug);
        config.network.default_user_agent = Some("TestAgent/1.0".to_string());
        config.version_name = "9.9".to_string();

        Fixture { _dir: dir, config }
    }

    async fn state(debug: bool) -> (Fixture, Arc<ProcessState>) {
        let fixture = fixture(debug);
        let state = ProcessState::initialize(fixture.config.clone()).await.unwrap();
        (fixture, state)
    }

    #[tokio::test]
    async fn test_accessors_are_identity_stable() {
        let (_fixture, state) = state(true).await;

        assert!(Arc::ptr_eq(state.request_queue(), state.request_queue()));
        assert!(Arc::ptr_eq(state.image_loader(), state.image_loader()));
        assert!(Arc::ptr_eq(state.bitmap_cache(), state.bitmap_cache()));
        assert!(Arc::ptr_eq(state.image_loader().cache(), state.bitmap_cache()));
        assert!(Arc::ptr_eq(&state.localized_context(), &state.localized_context()));
        assert!(Arc::ptr_eq(state.rest_client(), state.rest_client_for(ApiVersion::V1)));
        assert!(Arc::ptr_eq(state.rest_client_v1_1(), state.rest_client_v1_1()));
        assert!(Arc::ptr_eq(state.rest_client_v2(), state.rest_clients().get(ApiVersion::V2)));
        assert_eq!(state.rest_client_v0().version(), ApiVersion::V0);
        assert_eq!(state.rest_client_v1_2().version(), ApiVersion::V1_2);
        assert_eq!(state.rest_client_v1_3().version(), ApiVersion::V1_3);
    }

    #[tokio::test]
    async fn test_user_agent() {
        let (_fixture, state) = state(true).await;

        assert_eq!(state.default_user_agent(), "TestAgent/1.0");
        assert_eq!(state.user_agent(), "TestAgent/1.0 blogclient/9.9");
        assert_eq!(state.version_name(), "9.9");
    }

    #[tokio::test]
    async fn test_update_locale_does_not_touch_old_references() {
        let (_fixture, state) = state(true).await;

        let before = state.localized_context();
        assert_eq!(before.locale(), &Locale::En);
        assert_eq!(before.text("hello"), "Hello");

        state.update_locale("vi-VN,en;q=0.8").await.unwrap();

        let after = state.localized_context();
        assert_eq!(after.locale(), &Locale::Vi);
        assert_eq!(after.text("hello"), "Xin chào");
        assert_eq!(after.text("posts"), "Posts");

        // Stale holders keep the locale they were given
        assert_eq!(before.locale(), &Locale::En);
        assert_eq!(before.text("hello"), "Hello");
    }

    #[tokio::test]
    async fn test_refresh_locale_rereads_files() {
        let (fixture, state) = state(true).await;
        fs::write(
            std::path::Path::new(&fixture.config.locale.directory).join("en.json"),
            r#"{ "messages": { "hello": "Howdy" } }"#,
        )
        .unwrap();

        assert_eq!(state.localized_context().text("hello"), "Hello");
        let refreshed = state.refresh_locale().await.unwrap();
        assert_eq!(refreshed.text("hello"), "Howdy");
        assert_eq!(state.localized_context().locale(), &Locale::En);
    }

    #[tokio::test]
    async fn test_failed_locale_update_keeps_context() {
        let (_fixture, state) = state(true).await;
        let before = state.localized_context();

        assert!(state.update_locale("<script>").await.is_err());
        assert!(state.update_locale("").await.is_err());
        assert!(Arc::ptr_eq(&before, &state.localized_context()));
    }

    #[tokio::test]
    async fn test_update_locale_picks_best_supported_entry() {
        let (_fixture, state) = state(true).await;

        let context = state.update_locale("ja-JP,vi;q=0.9").await.unwrap();
        assert_eq!(context.locale(), &Locale::Vi);
        assert_eq!(state.localized_context().locale(), &Locale::Vi);

        // Nothing supported: back to the default rather than keeping `vi`
        let context = state.update_locale("fr-FR").await.unwrap();
        assert_eq!(context.locale(), &Locale::En);
        assert_eq!(state.localized_context().text("hello"), "Hello");
    }

    #[tokio::test]
    async fn test_refresh_locale_keeps_fallbacks_fresh() {
        let (fixture, state) = state(true).await;
        state.update_locale("vi").await.unwrap();
        assert_eq!(state.localized_context().text("posts"), "Posts");

        let locales = std::path::Path::new(&fixture.config.locale.directory);
        fs::write(
            locales.join("en.json"),
            r#"{ "messages": { "posts": "Articles" } }"#,
        )
        .unwrap();
        fs::write(
            locales.join("vi.json"),
            r#"{ "messages": { "hello": "Chào" } }"#,
        )
        .unwrap();

        let refreshed = state.refresh_locale().await.unwrap();
        assert_eq!(refreshed.locale(), &Locale::Vi);
        assert_eq!(refreshed.text("hello"), "Chào");
        assert_eq!(refreshed.text("posts"), "Articles");
    }

    struct Drafts(AtomicUsize);

    #[async_trait]
    impl SessionScoped for Drafts {
        fn name(&self) -> &str {
            "drafts"
        }

        async fn clear_session_data(&self) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sign_out_is_idempotent_and_keeps_facilities() {
        let (_fixture, state) = state(true).await;
        let drafts = Arc::new(Drafts(AtomicUsize::new(0)));
        state.session().register_scoped(drafts.clone()).await;
        state
            .session()
            .sign_in(AccountSession::new(
                "1".to_string(),
                "editor".to_string(),
                "token".to_string(),
            ))
            .await;

        let queue = Arc::clone(state.request_queue());
        let client = Arc::clone(state.rest_client());

        assert!(state.sign_out().await.changed_state());
        assert_eq!(state.sign_out().await, SignOutOutcome::AlreadySignedOut);
        assert_eq!(drafts.0.load(Ordering::SeqCst), 1);
        assert!(!state.session().is_signed_in().await);

        assert!(Arc::ptr_eq(&queue, state.request_queue()));
        assert!(Arc::ptr_eq(&client, state.rest_client()));
    }

    #[tokio::test]
    async fn test_build_config_lookups() {
        let (_fixture, debug_state) = state(true).await;
        assert!(debug_state
            .read_build_config_value(PACKAGE, "DOES_NOT_EXIST")
            .is_none());
        assert_eq!(
            debug_state.read_build_config_value(PACKAGE, "DEBUG_AUTOFILL_USERNAME"),
            Some(BuildConfigValue::Text("demo".to_string()))
        );
        assert_eq!(
            debug_state.read_build_config_string(PACKAGE, "DEBUG_AUTOFILL_USERNAME"),
            "demo"
        );

        let (_fixture, release_state) = state(false).await;
        assert_eq!(
            release_state.read_build_config_string(PACKAGE, "DEBUG_AUTOFILL_USERNAME"),
            ""
        );
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let (_fixture, state) = state(true).await;
        assert!(state.is_backgrounded());

        state.handle_lifecycle(LifecycleEvent::Foregrounded).await.unwrap();
        assert!(!state.is_backgrounded());

        state
            .handle_lifecycle(LifecycleEvent::LocaleChanged("vi".to_string()))
            .await
            .unwrap();
        assert_eq!(state.localized_context().locale(), &Locale::Vi);

        state.handle_lifecycle(LifecycleEvent::SignedOut).await.unwrap();
        state.handle_lifecycle(LifecycleEvent::Backgrounded).await.unwrap();
        assert!(state.is_backgrounded());
    }

    #[tokio::test]
    async fn test_initialize_fails_without_locale_files() {
        let mut config = fixture(true).config;
        config.locale.directory = "/nonexistent/locales".to_string();

        let err = match ProcessState::initialize(config).await {
            Ok(_) => panic!("initialization should fail"),
            Err(e) => e,
        };
        assert!(format!("{:#}", err).contains("localized context"));
    }

    #[tokio::test]
    async fn test_initialize_fails_on_bad_rest_url() {
        let fixture = fixture(true);
        let mut config = fixture.config.clone();
        config.network.rest_base_url = "::not a url::".to_string();

        assert!(ProcessState::initialize(config).await.is_err());
    }

    #[tokio::test]
    async fn test_process_cell_holds_one_state() {
        let (_fixture, state) = state(true).await;
        let cell: ProcessCell<ProcessState> = ProcessCell::new("test process state");

        cell.install(Arc::clone(&state)).unwrap();
        assert!(Arc::ptr_eq(cell.get(), &state));
        assert!(cell.install(state).is_err());
    }

    #[test]
    #[should_panic(expected = "accessed before initialization")]
    fn test_state_access_before_initialize_panics() {
        let cell: ProcessCell<ProcessState> = ProcessCell::new("test process state");
        let _ = cell.get().user_agent();
    }
}
