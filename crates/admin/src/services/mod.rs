//! Business logic services for admin.
//!
//! Services sit between the routes and the repositories: they run the
//! form and command flows, log failures, and publish the outcome to the
//! [`Notifier`].
//!
//! # Services
//!
//! - `notifications` - Process-wide toast queue
//! - `auth` - Identity holder, sign in/out, and the login audit trail
//! - `customers` - Customer list/delete and the customer form
//! - `products` - Product list/delete and the product form with image uploads
//! - `orders` - Order status commands
//! - `content` - Policy pages, application name, and social links
//! - `logos` - Logo uploads into the settings row
//! - `search` - Global search across orders, products, and customers
//! - `reports` - Dashboard metrics and range reports
//! - `export` - CSV export

pub mod auth;
pub mod content;
pub mod customers;
pub mod export;
pub mod images;
pub mod logos;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reports;
pub mod search;

pub use auth::{AuthError, AuthGateway, AuthService, ClientInfo, Credentials, Identity, IdentityHolder, SessionSnapshot};
pub use content::{ContentError, ContentService};
pub use customers::{CustomerFormController, CustomerFormError, CustomerService};
pub use export::ExportService;
pub use images::{ImageStore, ImageUpload};
pub use logos::{LogoService, SettingsError};
pub use notifications::{Notifier, Toast, ToastId, ToastKind};
pub use orders::{OrderCommand, OrderCommandError, OrderCommands};
pub use products::{ProductFormController, ProductFormError};
pub use reports::{DashboardMetrics, RangeSummary, ReportRange, ReportService};
pub use search::{SearchResult, SearchService};
