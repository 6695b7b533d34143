//! Site settings: content pages, application name, social links, logos.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Multipart, Path, State},
    response::{Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{ContentPage, LogoKind, SocialLinks};
use crate::services::ImageUpload;
use crate::state::AppState;

use super::{Layout, read_upload, render};

/// A link on the settings index.
#[derive(Debug, Clone)]
pub struct SettingsLink {
    pub href: String,
    pub label: &'static str,
}

#[derive(Template)]
#[template(path = "settings/index.html")]
pub struct SettingsIndexTemplate {
    pub layout: Layout,
    pub pages: Vec<SettingsLink>,
}

#[derive(Template)]
#[template(path = "settings/content.html")]
pub struct ContentEditorTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub content: String,
}

#[derive(Template)]
#[template(path = "settings/application_name.html")]
pub struct ApplicationNameTemplate {
    pub layout: Layout,
    pub name: String,
}

#[derive(Template)]
#[template(path = "settings/social_links.html")]
pub struct SocialLinksTemplate {
    pub layout: Layout,
    pub links: SocialLinks,
}

/// One logo slot on the logos page.
#[derive(Debug, Clone)]
pub struct LogoView {
    pub column: &'static str,
    pub label: &'static str,
    pub url: Option<String>,
}

#[derive(Template)]
#[template(path = "settings/logos.html")]
pub struct LogosTemplate {
    pub layout: Layout,
    pub logos: Vec<LogoView>,
}

#[derive(Debug, Deserialize)]
pub struct ContentForm {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationNameForm {
    #[serde(default)]
    pub name: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(index))
        .route("/settings/content/{slug}", get(edit_content).post(save_content))
        .route(
            "/settings/application-name",
            get(application_name).post(save_application_name),
        )
        .route("/settings/social-links", get(social_links).post(save_social_links))
        .route("/settings/logos", get(logos))
        .route("/settings/logos/{kind}", post(upload_logo))
        .route("/settings/logos/{kind}/remove", post(remove_logo))
}

fn content_page(slug: &str) -> Result<ContentPage, AppError> {
    ContentPage::from_slug(slug).ok_or_else(|| AppError::NotFound(format!("content page {slug}")))
}

fn logo_kind(column: &str) -> Result<LogoKind, AppError> {
    LogoKind::from_column(column).ok_or_else(|| AppError::NotFound(format!("logo {column}")))
}

/// GET /settings
#[instrument(skip(admin, state))]
async fn index(RequireAdminAuth(admin): RequireAdminAuth, State(state): State<AppState>) -> Response {
    let mut pages: Vec<SettingsLink> = ContentPage::ALL
        .iter()
        .map(|page| SettingsLink {
            href: format!("/settings/content/{}", page.slug()),
            label: page.title(),
        })
        .collect();
    pages.extend([
        SettingsLink {
            href: "/settings/application-name".to_string(),
            label: "Application Name",
        },
        SettingsLink {
            href: "/settings/social-links".to_string(),
            label: "Social Links",
        },
        SettingsLink {
            href: "/settings/logos".to_string(),
            label: "Logos",
        },
    ]);

    render(&SettingsIndexTemplate {
        layout: Layout::new(&state, &admin, "/settings"),
        pages,
    })
}

/// GET /settings/content/{slug}
#[instrument(skip(admin, state))]
async fn edit_content(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let page = content_page(&slug)?;
    let content = state.content().load_page(page).await;
    Ok(render(&ContentEditorTemplate {
        layout: Layout::new(&state, &admin, "/settings"),
        title: page.title(),
        action: format!("/settings/content/{}", page.slug()),
        content,
    }))
}

/// POST /settings/content/{slug}
#[instrument(skip(_admin, state, form))]
async fn save_content(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<ContentForm>,
) -> Result<Redirect, AppError> {
    let page = content_page(&slug)?;
    // Failures are reported through the notifier
    let _ = state.content().save_page(page, &form.content).await;
    Ok(Redirect::to(&format!("/settings/content/{}", page.slug())))
}

/// GET /settings/application-name
#[instrument(skip(admin, state))]
async fn application_name(RequireAdminAuth(admin): RequireAdminAuth, State(state): State<AppState>) -> Response {
    let name = state.content().application_name().await;
    render(&ApplicationNameTemplate {
        layout: Layout::new(&state, &admin, "/settings"),
        name,
    })
}

/// POST /settings/application-name
#[instrument(skip(_admin, state))]
async fn save_application_name(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Form(form): Form<ApplicationNameForm>,
) -> Redirect {
    let _ = state.content().save_application_name(&form.name).await;
    Redirect::to("/settings/application-name")
}

/// GET /settings/social-links
#[instrument(skip(admin, state))]
async fn social_links(RequireAdminAuth(admin): RequireAdminAuth, State(state): State<AppState>) -> Response {
    let links = state.content().social_links().await;
    render(&SocialLinksTemplate {
        layout: Layout::new(&state, &admin, "/settings"),
        links,
    })
}

/// POST /settings/social-links
#[instrument(skip(_admin, state))]
async fn save_social_links(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Form(links): Form<SocialLinks>,
) -> Redirect {
    let _ = state.content().save_social_links(&links).await;
    Redirect::to("/settings/social-links")
}

/// GET /settings/logos
#[instrument(skip(admin, state))]
async fn logos(RequireAdminAuth(admin): RequireAdminAuth, State(state): State<AppState>) -> Response {
    let settings = state.logos().current().await;
    let logos = LogoKind::ALL
        .into_iter()
        .map(|kind| LogoView {
            column: kind.column(),
            label: kind.label(),
            url: settings.logo(kind).map(str::to_string),
        })
        .collect();
    render(&LogosTemplate {
        layout: Layout::new(&state, &admin, "/settings"),
        logos,
    })
}

/// POST /settings/logos/{kind}
#[instrument(skip(_admin, state, multipart))]
async fn upload_logo(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(column): Path<String>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let kind = logo_kind(&column)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("logo") {
            upload = read_upload(field).await?;
        }
    }

    // A missing file is reported by the service
    let image = upload.unwrap_or_else(|| ImageUpload {
        file_name: String::new(),
        content_type: String::new(),
        bytes: Vec::new(),
    });
    let _ = state.logos().save(kind, image).await;
    Ok(Redirect::to("/settings/logos"))
}

/// POST /settings/logos/{kind}/remove
#[instrument(skip(_admin, state))]
async fn remove_logo(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(column): Path<String>,
) -> Result<Redirect, AppError> {
    let kind = logo_kind(&column)?;
    let _ = state.logos().remove(kind).await;
    Ok(Redirect::to("/settings/logos"))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use testresult::TestResult;

    use super::super::products::tests::multipart;
    use super::super::test_helpers::{Mocks, body_text, get, location, post_form, send, signed_in_app};
    use crate::models::{ContentBlock, LogoKind, Settings};

    fn toasts(state: &crate::state::AppState) -> Vec<String> {
        state.notifier().snapshot().into_iter().map(|t| t.message).collect()
    }

    #[tokio::test]
    async fn test_index_lists_every_page() -> TestResult {
        let (_state, app, cookie) = signed_in_app(Mocks::signed_in()).await;
        let body = body_text(send(&app, get("/settings", Some(&cookie))).await).await;
        assert!(body.contains("/settings/content/privacy-policy"));
        assert!(body.contains("Terms and Conditions"));
        assert!(body.contains("/settings/logos"));
        Ok(())
    }

    #[tokio::test]
    async fn test_content_editor_shows_stored_text() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks
            .content
            .expect_get()
            .withf(|slug| slug == "refund-policy")
            .returning(|_| {
                Ok(Some(ContentBlock {
                    id: "refund-policy".to_string(),
                    content: "Refunds within 7 days".to_string(),
                    updated_at: None,
                }))
            });
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let response = send(&app, get("/settings/content/refund-policy", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Refund Policy"));
        assert!(body.contains("Refunds within 7 days"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_content_page_is_not_found() -> TestResult {
        let (_state, app, cookie) = signed_in_app(Mocks::signed_in()).await;
        let response = send(&app, get("/settings/content/careers", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_content_page() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.content.expect_exists().returning(|_| Ok(true));
        mocks
            .content
            .expect_update()
            .once()
            .withf(|slug, text| slug == "about-us" && text == "<p>Made in Jaipur</p>")
            .returning(|_, _| Ok(()));
        let (state, app, cookie) = signed_in_app(mocks).await;

        let response = send(
            &app,
            post_form(
                "/settings/content/about-us",
                "content=%3Cp%3EMade+in+Jaipur%3C%2Fp%3E",
                Some(&cookie),
            ),
        )
        .await;
        assert_eq!(location(&response), Some("/settings/content/about-us"));
        assert!(toasts(&state).contains(&"About Us content saved successfully".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_application_name_is_rejected() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.content.expect_exists().never();
        let (state, app, cookie) = signed_in_app(mocks).await;

        let response = send(&app, post_form("/settings/application-name", "name=++", Some(&cookie))).await;
        assert_eq!(location(&response), Some("/settings/application-name"));
        assert!(toasts(&state).contains(&"Application name cannot be empty".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_social_links_form_fills_missing_fields_with_defaults() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.content.expect_exists().returning(|_| Ok(false));
        mocks
            .content
            .expect_insert()
            .once()
            .withf(|slug, text| {
                slug == "social-links"
                    && text.contains("https://www.instagram.com/neonflake")
                    && text.contains("https://x.com/")
            })
            .returning(|_, _| Ok(()));
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let response = send(
            &app,
            post_form(
                "/settings/social-links",
                "instagram=https%3A%2F%2Fwww.instagram.com%2Fneonflake",
                Some(&cookie),
            ),
        )
        .await;
        assert_eq!(location(&response), Some("/settings/social-links"));
        Ok(())
    }

    #[tokio::test]
    async fn test_logos_page_shows_current_urls() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.settings.expect_get().returning(|| {
            Ok(Settings {
                id: 1,
                header_logo: Some("https://cdn.example/logos/headerLogo/1.png".to_string()),
                footer_logo: None,
                admin_logo: Some(String::new()),
            })
        });
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let body = body_text(send(&app, get("/settings/logos", Some(&cookie))).await).await;
        assert!(body.contains("https://cdn.example/logos/headerLogo/1.png"));
        assert!(body.contains("Footer Logo"));
        assert!(body.contains("No logo uploaded"));
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_logo() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks
            .images
            .expect_upload()
            .once()
            .withf(|bucket, path, _, _| bucket == "logos" && path.starts_with("adminLogo/"))
            .returning(|_, path, _, _| Ok(path.to_string()));
        mocks
            .images
            .expect_public_url()
            .returning(|bucket, path| Ok(format!("https://cdn.example/{bucket}/{path}")));
        mocks
            .settings
            .expect_set_logo()
            .once()
            .withf(|kind, _| *kind == LogoKind::Admin)
            .returning(|_, _| Ok(()));
        let (state, app, cookie) = signed_in_app(mocks).await;

        let request = multipart("/settings/logos/adminLogo", &[], &[("logo", "brand.png", b"png")], &cookie);
        let response = send(&app, request).await;
        assert_eq!(location(&response), Some("/settings/logos"));
        assert!(toasts(&state).contains(&"Logo saved successfully".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_without_file_notifies() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.images.expect_upload().never();
        let (state, app, cookie) = signed_in_app(mocks).await;

        let request = multipart("/settings/logos/headerLogo", &[], &[("logo", "", b"")], &cookie);
        send(&app, request).await;
        assert!(toasts(&state).contains(&"Please select a file to upload".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_logo_and_unknown_kind() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks
            .settings
            .expect_set_logo()
            .once()
            .withf(|kind, url| *kind == LogoKind::Footer && url.is_empty())
            .returning(|_, _| Ok(()));
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let response = send(&app, post_form("/settings/logos/footerLogo/remove", "", Some(&cookie))).await;
        assert_eq!(location(&response), Some("/settings/logos"));

        let response = send(&app, post_form("/settings/logos/sidebarLogo/remove", "", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}
