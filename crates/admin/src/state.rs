//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{BackendClient, BackendError};
use crate::config::AdminConfig;
use crate::db::{LoginHistoryRepository, Repositories};
use crate::services::{
    AuthGateway, AuthService, ContentService, CustomerFormController, CustomerService,
    ExportService, IdentityHolder, ImageStore, LogoService, Notifier, OrderCommands,
    ProductFormController, ReportService, SearchService,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The identity holder and the
/// notifier live here, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backend: BackendClient,
    notifier: Notifier,
    auth: AuthService,
    customers: CustomerService,
    customer_form: CustomerFormController,
    products: ProductFormController,
    orders: OrderCommands,
    content: ContentService,
    logos: LogoService,
    search: SearchService,
    reports: ReportService,
    export: ExportService,
    login_history: Arc<dyn LoginHistoryRepository>,
}

impl AppState {
    /// Create the application state over the hosted backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.backend)?;
        let repos = Repositories::rest(&backend);
        let gateway: Arc<dyn AuthGateway> = Arc::new(backend.clone());
        let images: Arc<dyn ImageStore> = Arc::new(backend.clone());
        Ok(Self::from_parts(config, backend, repos, gateway, images))
    }

    /// Assemble state from explicit parts; tests pass mocks here.
    #[must_use]
    pub fn from_parts(
        config: AdminConfig,
        backend: BackendClient,
        repos: Repositories,
        gateway: Arc<dyn AuthGateway>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        let notifier = Notifier::new(config.toast_duration);
        let auth = AuthService::new(gateway, IdentityHolder::new(), Arc::clone(&repos.login_history));

        Self {
            inner: Arc::new(AppStateInner {
                customers: CustomerService::new(Arc::clone(&repos.customers), notifier.clone()),
                customer_form: CustomerFormController::new(Arc::clone(&repos.customers), notifier.clone()),
                products: ProductFormController::new(
                    Arc::clone(&repos.products),
                    Arc::clone(&images),
                    notifier.clone(),
                ),
                orders: OrderCommands::new(Arc::clone(&repos.orders), notifier.clone()),
                content: ContentService::new(Arc::clone(&repos.content), notifier.clone()),
                logos: LogoService::new(Arc::clone(&repos.settings), images, notifier.clone()),
                search: SearchService::new(
                    Arc::clone(&repos.orders),
                    Arc::clone(&repos.products),
                    Arc::clone(&repos.customers),
                    notifier.clone(),
                ),
                reports: ReportService::new(
                    Arc::clone(&repos.customers),
                    Arc::clone(&repos.products),
                    Arc::clone(&repos.orders),
                    notifier.clone(),
                ),
                export: ExportService::new(notifier.clone()),
                login_history: repos.login_history,
                config,
                backend,
                notifier,
                auth,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// The hosted backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// The process-wide identity holder.
    #[must_use]
    pub fn identity(&self) -> &IdentityHolder {
        self.inner.auth.holder()
    }

    #[must_use]
    pub fn customers(&self) -> &CustomerService {
        &self.inner.customers
    }

    #[must_use]
    pub fn customer_form(&self) -> &CustomerFormController {
        &self.inner.customer_form
    }

    #[must_use]
    pub fn products(&self) -> &ProductFormController {
        &self.inner.products
    }

    #[must_use]
    pub fn orders(&self) -> &OrderCommands {
        &self.inner.orders
    }

    #[must_use]
    pub fn content(&self) -> &ContentService {
        &self.inner.content
    }

    #[must_use]
    pub fn logos(&self) -> &LogoService {
        &self.inner.logos
    }

    #[must_use]
    pub fn search(&self) -> &SearchService {
        &self.inner.search
    }

    #[must_use]
    pub fn reports(&self) -> &ReportService {
        &self.inner.reports
    }

    #[must_use]
    pub fn export(&self) -> &ExportService {
        &self.inner.export
    }

    #[must_use]
    pub fn login_history(&self) -> &dyn LoginHistoryRepository {
        self.inner.login_history.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("backend", &self.inner.backend)
            .finish_non_exhaustive()
    }
}
