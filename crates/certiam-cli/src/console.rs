use std::sync::{Arc, PoisonError, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use tracing::{debug, info, warn};

use certiam_core::api::{ApiClient, Notifier, ResetHook};
use certiam_core::auth::{CredentialStore, Session, SharedSession};
use certiam_core::host::{HostProps, MicroApp};
use certiam_core::Config;

/// Prints pipeline notifications for the user.
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn error(&self, message: &str) {
        eprintln!("error: {}", message);
    }
}

/// Everything a command needs: config, the app wrapping the stored session,
/// and a client whose context resets that session on 401/403.
pub struct Console {
    pub config: Config,
    pub app: MicroApp,
    pub client: ApiClient,
    pub json: bool,
}

impl Console {
    pub fn open(base_url: Option<&str>, token: Option<&str>, json: bool) -> Result<Self> {
        let mut config = Config::load()?;
        if let Some(url) = base_url {
            config.base_url = url.to_string();
        }

        let mut session = Session::new(config.cache_dir()?);
        if let Err(e) = session.load() {
            warn!(error = %e, "Ignoring unreadable session file");
        }
        if let Some(username) = keychain_username(&session) {
            match CredentialStore::get_token(&username) {
                Ok(stored) => session.set_token(stored),
                Err(e) => debug!(error = %e, "No keychain token"),
            }
        }

        let shared = session.into_shared();
        let forget = forget_remembered_token(shared.clone(), CredentialStore::delete);
        let mut app = MicroApp::new(shared).with_local_reset(forget);
        app.bootstrap();
        app.mount(HostProps {
            container: None,
            token: token.map(str::to_string),
            user_info: None,
        });

        let client = ApiClient::new(&config)?.with_context(app.request_context(Arc::new(StderrNotifier)));
        debug!(base_url = %config.base_url, "Console ready");
        Ok(Self {
            config,
            app,
            client,
            json,
        })
    }

    pub fn session(&self) -> RwLockReadGuard<'_, Session> {
        self.app.session().read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session_mut(&self) -> RwLockWriteGuard<'_, Session> {
        self.app.session().write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The account whose keychain token should fill an empty session.
fn keychain_username(session: &Session) -> Option<String> {
    if session.has_token() || !session.remember_me() {
        return None;
    }
    session.login_info().map(|l| l.username.clone())
}

/// After an auth failure the remembered token is stale too; drop it so the
/// next run does not send it again.
fn forget_remembered_token<F>(session: SharedSession, forget: F) -> ResetHook
where
    F: Fn(&str) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(move || {
        let username = {
            let session = session.read().unwrap_or_else(PoisonError::into_inner);
            if !session.remember_me() {
                return;
            }
            match session.login_info() {
                Some(login) => login.username.clone(),
                None => return,
            }
        };
        match forget(&username) {
            Ok(()) => info!(username = %username, "Dropped remembered token after auth failure"),
            Err(e) => debug!(error = %e, "No keychain token to drop"),
        }
    })
}
