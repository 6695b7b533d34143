//! End-to-end tests for the NeonFlake admin dashboard.
//!
//! Every test is `#[ignore]`d: it needs a running admin server connected to
//! a real backend project and a login created with `nf-cli user create`.
//!
//! ```bash
//! cargo run -p neonflake-admin &
//! NF_TEST_EMAIL=admin@neonflake.in NF_TEST_PASSWORD=... \
//!     cargo test -p neonflake-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_BASE_URL` - server under test (default `http://localhost:3001`)
//! - `NF_TEST_EMAIL`, `NF_TEST_PASSWORD` - dashboard login

use reqwest::{Client, StatusCode, redirect};

/// An HTTP client holding a signed-in dashboard session.
#[derive(Debug, Clone)]
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

/// Errors setting up a test context.
pub type SetupError = Box<dyn std::error::Error + Send + Sync>;

impl TestContext {
    /// A client with a cookie jar and no redirect following.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn anonymous() -> Result<Self, SetupError> {
        let _ = dotenvy::dotenv();
        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()?;
        let base_url = std::env::var("ADMIN_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3001".to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self { client, base_url })
    }

    /// Sign in with `NF_TEST_EMAIL` / `NF_TEST_PASSWORD`.
    ///
    /// # Errors
    ///
    /// Returns error if the variables are missing or the login is rejected.
    pub async fn signed_in() -> Result<Self, SetupError> {
        let ctx = Self::anonymous()?;
        let email = std::env::var("NF_TEST_EMAIL").map_err(|_| "NF_TEST_EMAIL not set")?;
        let password = std::env::var("NF_TEST_PASSWORD").map_err(|_| "NF_TEST_PASSWORD not set")?;

        let response = ctx
            .client
            .post(ctx.url("/login"))
            .form(&[("email", email.as_str()), ("password", password.as_str())])
            .send()
            .await?;
        if response.status() != StatusCode::SEE_OTHER {
            return Err(format!("login failed with status {}", response.status()).into());
        }
        Ok(ctx)
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET `path` and return the status and body.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn get_text(&self, path: &str) -> Result<(StatusCode, String), SetupError> {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status();
        Ok((status, response.text().await?))
    }

    /// POST a form to `path` and return the response.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<reqwest::Response, SetupError> {
        Ok(self.client.post(self.url(path)).form(form).send().await?)
    }
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
