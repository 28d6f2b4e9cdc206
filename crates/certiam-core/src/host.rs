//! Micro-frontend lifecycle.
//!
//! A host shell drives the app through `bootstrap`, `mount`, `update` and
//! `unmount`, hands over its token and user at mount time, and pushes later
//! changes through a global-state channel. The host's `reset_app` callback,
//! when present, replaces the local session reset on auth failures.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{Notifier, RequestContext, ResetHook};
use crate::auth::{SharedSession, UserInfo};
use crate::routes::{before_each, build_menu, GuardOptions, MenuItem, NavigationDecision, RouteSet};

/// Props passed by the host on mount and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostProps {
    /// Selector of the element the host reserved for this app.
    pub container: Option<String>,
    pub token: Option<String>,
    pub user_info: Option<UserInfo>,
}

/// State the host broadcasts to every embedded app.
#[derive(Clone, Default)]
pub struct GlobalState {
    pub user_info: Option<UserInfo>,
    pub reset_app: Option<ResetHook>,
}

impl std::fmt::Debug for GlobalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalState")
            .field("user_info", &self.user_info)
            .field("reset_app", &self.reset_app.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Created,
    Bootstrapped,
    Mounted,
    Unmounted,
}

type HookSlot = Arc<RwLock<Option<ResetHook>>>;

/// The embeddable application: session, route set and host wiring.
pub struct MicroApp {
    session: SharedSession,
    routes: RouteSet,
    props: Option<HostProps>,
    lifecycle: Lifecycle,
    guard: GuardOptions,
    host_reset: HookSlot,
    after_local_reset: Option<ResetHook>,
}

impl MicroApp {
    pub fn new(session: SharedSession) -> Self {
        Self {
            session,
            routes: RouteSet::new(),
            props: None,
            lifecycle: Lifecycle::Created,
            guard: GuardOptions::default(),
            host_reset: Arc::new(RwLock::new(None)),
            after_local_reset: None,
        }
    }

    pub fn with_guard(mut self, guard: GuardOptions) -> Self {
        self.guard = guard;
        self
    }

    /// Extra cleanup after a local session reset, e.g. dropping credentials
    /// stored outside the session file. Not run when the host resets.
    pub fn with_local_reset(mut self, hook: ResetHook) -> Self {
        self.after_local_reset = Some(hook);
        self
    }

    pub fn bootstrap(&mut self) {
        self.lifecycle = Lifecycle::Bootstrapped;
        debug!("App bootstrapped");
    }

    /// Store the host props and seed the session from them.
    pub fn mount(&mut self, props: HostProps) {
        info!(
            container = props.container.as_deref().unwrap_or("#app"),
            has_token = props.token.is_some(),
            "App mounted"
        );
        self.seed_session(&props);
        self.props = Some(props);
        self.routes = RouteSet::new();
        self.lifecycle = Lifecycle::Mounted;
    }

    pub fn update(&mut self, props: HostProps) {
        debug!(has_token = props.token.is_some(), "App props updated");
        self.props = Some(props);
    }

    /// Drop the mounted state and every registered route.
    pub fn unmount(&mut self) {
        self.props = None;
        self.routes = RouteSet::new();
        self.lifecycle = Lifecycle::Unmounted;
        info!("App unmounted");
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle == Lifecycle::Mounted
    }

    pub fn props(&self) -> Option<&HostProps> {
        self.props.as_ref()
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn routes(&self) -> &RouteSet {
        &self.routes
    }

    /// Apply one global-state change from the host.
    pub fn apply_global_state(&self, state: GlobalState) {
        apply_global_state(&self.session, &self.host_reset, state);
    }

    /// Follow the host's global state. The current value is applied
    /// immediately, then every change until the sender is dropped.
    pub fn subscribe(&self, mut rx: watch::Receiver<GlobalState>) -> JoinHandle<()> {
        let session = self.session.clone();
        let slot = self.host_reset.clone();
        tokio::spawn(async move {
            let current = rx.borrow_and_update().clone();
            apply_global_state(&session, &slot, current);
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                apply_global_state(&session, &slot, state);
            }
            debug!("Global state channel closed");
        })
    }

    /// The hook run on 401/403: the host's `reset_app` when it gave one,
    /// otherwise a local session reset that is also persisted, followed by
    /// the `with_local_reset` cleanup.
    pub fn reset_hook(&self) -> ResetHook {
        let session = self.session.clone();
        let slot = self.host_reset.clone();
        let after = self.after_local_reset.clone();
        Arc::new(move || {
            let host_hook = slot.read().unwrap_or_else(|e| e.into_inner()).clone();
            if let Some(hook) = host_hook {
                hook();
                return;
            }
            {
                let mut session = session.write().unwrap_or_else(|e| e.into_inner());
                session.reset();
                if let Err(e) = session.save() {
                    warn!(error = %e, "Failed to persist session reset");
                }
            }
            // The session lock is released; the cleanup may read it.
            if let Some(after) = &after {
                after();
            }
        })
    }

    pub fn request_context(&self, notifier: Arc<dyn Notifier>) -> RequestContext {
        let session = self.session.read().unwrap_or_else(|e| e.into_inner());
        session.request_context(notifier, Some(self.reset_hook()))
    }

    /// Run the navigation guard for a route change.
    pub fn navigate(&mut self, to_path: &str, from_redirect: Option<&str>) -> NavigationDecision {
        let mut session = self.session.write().unwrap_or_else(|e| e.into_inner());
        before_each(
            &mut self.routes,
            &mut session,
            to_path,
            from_redirect,
            self.props.as_ref(),
            self.guard,
        )
    }

    pub fn menu(&self) -> Vec<MenuItem> {
        build_menu(&self.routes)
    }

    fn seed_session(&self, props: &HostProps) {
        let mut session = self.session.write().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = props.token.as_deref().filter(|t| !t.is_empty()) {
            session.set_token(token);
        }
        if let Some(user_info) = &props.user_info {
            session.set_user_info(Some(user_info.clone()));
        }
    }
}

fn apply_global_state(session: &SharedSession, slot: &HookSlot, state: GlobalState) {
    debug!(has_user = state.user_info.is_some(), "Global state received");
    session
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .set_user_info(state.user_info);
    *slot.write().unwrap_or_else(|e| e.into_inner()) = state.reset_app;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::api::LogNotifier;
    use crate::auth::Session;

    fn app(name: &str) -> MicroApp {
        let dir = std::env::temp_dir().join(format!("certiam-host-{}-{}", name, std::process::id()));
        MicroApp::new(Session::new(dir).into_shared())
    }

    fn user(name: &str) -> UserInfo {
        UserInfo {
            username: name.into(),
            ..UserInfo::default()
        }
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut app = app("lifecycle");
        assert_eq!(app.lifecycle(), Lifecycle::Created);
        app.bootstrap();
        app.mount(HostProps {
            container: Some("#sub-app".into()),
            token: Some("t-1".into()),
            user_info: Some(user("dave")),
        });
        assert!(app.is_mounted());
        assert_eq!(app.session().read().unwrap().token(), Some("t-1"));

        app.navigate("/", None);
        assert!(app.routes().is_add_routers());

        app.unmount();
        assert_eq!(app.lifecycle(), Lifecycle::Unmounted);
        assert!(app.props().is_none());
        assert!(!app.routes().is_add_routers());
    }

    #[test]
    fn test_request_context_uses_session_token() {
        let mut app = app("ctx");
        app.mount(HostProps {
            token: Some("t-2".into()),
            ..HostProps::default()
        });
        let ctx = app.request_context(Arc::new(LogNotifier));
        assert_eq!(ctx.token.as_deref(), Some("t-2"));
        assert!(ctx.reset_hook.is_some());
    }

    #[test]
    fn test_reset_hook_prefers_host_callback() {
        let app = app("host-reset");
        app.session().write().unwrap().set_token("keep");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        app.apply_global_state(GlobalState {
            user_info: Some(user("erin")),
            reset_app: Some(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        });

        (app.reset_hook())();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.session().read().unwrap().token(), Some("keep"));
        assert_eq!(
            app.session().read().unwrap().user_info().map(|u| u.username.as_str()),
            Some("erin")
        );
    }

    #[test]
    fn test_reset_hook_falls_back_to_session_reset() {
        let app = app("local-reset");
        app.session().write().unwrap().set_token("drop");
        (app.reset_hook())();
        assert_eq!(app.session().read().unwrap().token(), None);
        let _ = app.session().write().unwrap().clear();
    }

    #[test]
    fn test_local_reset_cleanup_runs_after_session_is_saved() {
        let dir = std::env::temp_dir().join(format!("certiam-host-after-reset-{}", std::process::id()));
        let shared = Session::new(dir.clone()).into_shared();
        shared.write().unwrap().set_token("expired");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (watched, record) = (shared.clone(), seen.clone());
        let app = MicroApp::new(shared).with_local_reset(Arc::new(move || {
            let token = watched.read().unwrap().token().map(str::to_string);
            record.lock().unwrap().push(token);
        }));

        (app.reset_hook())();
        assert_eq!(*seen.lock().unwrap(), vec![None]);
        let mut reloaded = Session::new(dir.clone());
        assert!(reloaded.load().unwrap());
        assert!(!reloaded.has_token());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_local_reset_cleanup_skipped_when_host_resets() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = app("host-skips-cleanup").with_local_reset(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        app.apply_global_state(GlobalState {
            user_info: None,
            reset_app: Some(Arc::new(|| {})),
        });
        (app.reset_hook())();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_menu_after_navigation() {
        let mut app = app("menu");
        assert!(app.menu().is_empty());
        app.navigate("/", None);
        assert_eq!(app.menu().len(), 2);
    }

    #[test]
    fn test_host_props_camel_case() {
        let props: HostProps = serde_json::from_value(serde_json::json!({
            "container": "#app",
            "token": "t",
            "userInfo": {"username": "fay"}
        }))
        .unwrap();
        assert_eq!(props.user_info.map(|u| u.username), Some("fay".to_string()));
    }

    #[tokio::test]
    async fn test_subscribe_applies_initial_and_later_states() {
        let app = app("watch");
        let (tx, rx) = watch::channel(GlobalState {
            user_info: Some(user("first")),
            reset_app: None,
        });
        let handle = app.subscribe(rx);

        tx.send(GlobalState {
            user_info: Some(user("second")),
            reset_app: Some(Arc::new(|| {})),
        })
        .unwrap();
        drop(tx);
        handle.await.unwrap();

        let session = app.session().read().unwrap();
        assert_eq!(session.user_info().map(|u| u.username.as_str()), Some("second"));
        assert!(app.host_reset.read().unwrap().is_some());
    }
}
