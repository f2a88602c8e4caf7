//! Route guards that only let requests with a valid session cookie through.
//!
//! A request is accepted when its encrypted token cookie decodes to an
//! unexpired [Token](crate::auth::token::Token). The user's ID is then added
//! to the request extensions, so handlers can take `Extension<UserID>`, and the
//! session is pushed forward by [DEFAULT_COOKIE_DURATION] on the way out.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::{Duration, UtcOffset};

use crate::{
    AppState,
    auth::{
        DEFAULT_COOKIE_DURATION, UserID, build_log_in_redirect_url,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::build_log_in_redirect_url_from_target,
    },
    endpoints,
    timezone::get_local_offset,
};

/// The state needed for the auth guards.
#[derive(Clone)]
pub struct AuthState {
    /// The key for decrypting the auth cookie.
    pub cookie_key: Key,
    /// How long a freshly issued auth cookie is valid for.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// How an anonymous request is sent to the log-in page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RedirectStyle {
    /// A plain `303 See Other`, for full page loads.
    Page,
    /// An `HX-Redirect` header, for requests made by HTMX.
    Htmx,
}

impl RedirectStyle {
    fn redirect_to(self, url: &str) -> Response {
        match self {
            RedirectStyle::Page => Redirect::to(url).into_response(),
            RedirectStyle::Htmx => (HxRedirect(url.to_owned()), StatusCode::OK).into_response(),
        }
    }
}

/// Where to send `request` if it turns out to be anonymous.
fn log_in_url_for(request: &Request) -> String {
    if let Some(url) = build_log_in_redirect_url(request) {
        return url;
    }

    if request.uri().path().starts_with("/api") {
        tracing::warn!("No usable HX-Current-URL for {}, using dashboard", request.uri());
    } else {
        tracing::warn!("Cannot return to {} after log in, using dashboard", request.uri());
    }

    build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
        .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
}

/// Decode the session in `parts`, returning the user and their cookie jar.
async fn authenticate(
    state: &AuthState,
    parts: &mut Parts,
) -> Option<(UserID, PrivateCookieJar)> {
    let jar = PrivateCookieJar::from_request_parts(parts, state)
        .await
        .inspect_err(|error| tracing::error!("Could not read cookie jar: {error:?}"))
        .ok()?;

    match get_token_from_cookies(&jar) {
        Ok(token) => Some((token.user_id, jar)),
        Err(error) => {
            tracing::debug!("Rejected request to {}: {error}", parts.uri.path());
            None
        }
    }
}

/// Copy the refreshed auth cookie from `jar` onto `response`.
///
/// If the session cannot be extended the response goes out unchanged and the
/// current cookie stays valid until it expires.
fn refresh_session(response: Response, jar: PrivateCookieJar, local_offset: UtcOffset) -> Response {
    let extended =
        extend_auth_cookie_duration_if_needed(jar, DEFAULT_COOKIE_DURATION, local_offset);
    let jar = match extended {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Could not extend session: {error}");
            return response;
        }
    };

    let (mut parts, body) = response.into_parts();
    let cookie_response = jar.into_response();

    for value in cookie_response.headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, value.to_owned());
    }

    Response::from_parts(parts, body)
}

async fn guard(state: AuthState, request: Request, next: Next, style: RedirectStyle) -> Response {
    let log_in_url = log_in_url_for(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Unknown timezone {:?}", state.local_timezone);
        return style.redirect_to(&log_in_url);
    };

    let (mut parts, body) = request.into_parts();
    let Some((user_id, jar)) = authenticate(&state, &mut parts).await else {
        return style.redirect_to(&log_in_url);
    };

    parts.extensions.insert(user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    refresh_session(response, jar, local_offset)
}

/// Guard for pages: anonymous requests get a `303` redirect to the log-in page.
///
/// The log-in URL carries the requested page so the user returns to it afterwards.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, RedirectStyle::Page).await
}

/// Guard for the HTMX API: anonymous requests get an `HX-Redirect` to the log-in page.
///
/// The return address is the page the user was on, taken from `HX-Current-URL`.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, RedirectStyle::Htmx).await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Router, middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key, SameSite},
    };
    use axum_test::TestServer;
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime, UtcOffset};

    use crate::{
        auth::{
            DEFAULT_COOKIE_DURATION, UserID, auth_guard, auth_guard_hx, cookie::COOKIE_TOKEN,
            middleware::AuthState, set_auth_cookie,
        },
        endpoints,
    };

    const PAGE: &str = "/reports";
    const API: &str = "/api/transactions";
    const LOG_IN: &str = "/test_log_in";

    async fn whoami(Extension(user_id): Extension<UserID>) -> String {
        user_id.to_string()
    }

    fn get_test_server(cookie_duration: Duration) -> TestServer {
        let state = AuthState {
            cookie_key: Key::from(&Sha512::digest("segredo-de-teste")),
            cookie_duration,
            local_timezone: "America/Sao_Paulo".to_owned(),
        };
        let log_in_state = state.clone();

        let app = Router::new()
            .route(PAGE, get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .merge(
                Router::new()
                    .route(API, post(whoami))
                    .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
            )
            .route(
                LOG_IN,
                post(move |jar: PrivateCookieJar| async move {
                    set_auth_cookie(
                        jar,
                        UserID::new(42),
                        log_in_state.cookie_duration,
                        UtcOffset::UTC,
                    )
                }),
            )
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn log_in_location(target: &str) -> String {
        let query = serde_urlencoded::to_string([("redirect_url", target)]).unwrap();
        format!("{}?{}", endpoints::LOG_IN_VIEW, query)
    }

    #[tokio::test]
    async fn valid_session_reaches_handler_with_user_id() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let token = server.post(LOG_IN).await.cookie(COOKIE_TOKEN);

        let response = server.get(PAGE).add_cookie(token).await;

        response.assert_status_ok();
        response.assert_text("42");
    }

    #[tokio::test]
    async fn session_is_extended_on_each_request() {
        let server = get_test_server(Duration::seconds(30));
        let token = server.post(LOG_IN).await.cookie(COOKIE_TOKEN);

        let response = server.get(PAGE).add_cookie(token).await;

        let cookie = response.cookie(COOKIE_TOKEN);
        let expires_at = cookie.expires_datetime().unwrap();
        let want = OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION;
        assert!(
            (expires_at - want).abs() < Duration::seconds(2),
            "got expiry {expires_at}, want about {want}"
        );
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    }

    #[tokio::test]
    async fn anonymous_page_request_redirects_back_after_log_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server.get(PAGE).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), log_in_location(PAGE));
    }

    #[tokio::test]
    async fn garbage_and_expired_cookies_are_rejected() {
        let server = get_test_server(Duration::seconds(-10));
        let expired = server.post(LOG_IN).await.cookie(COOKIE_TOKEN);
        let garbage = Cookie::build((COOKIE_TOKEN, "FOOBAR")).build();

        for cookie in [expired, garbage] {
            let response = server.get(PAGE).add_cookie(cookie).await;

            response.assert_status_see_other();
            assert_eq!(response.header("location"), log_in_location(PAGE));
        }
    }

    #[tokio::test]
    async fn anonymous_htmx_request_returns_to_current_page() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let current_url = "https://localhost:3000/transactions?type=expense&category_id=2";

        let response = server
            .post(API)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", current_url)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header("hx-redirect"),
            log_in_location("/transactions?type=expense&category_id=2")
        );
    }

    #[tokio::test]
    async fn htmx_request_without_current_url_falls_back_to_dashboard() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server.post(API).await;

        response.assert_status_ok();
        assert_eq!(
            response.header("hx-redirect"),
            log_in_location(endpoints::DASHBOARD_VIEW)
        );
    }
}
