//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the
//! `#alert-container` element defined in [crate::html::base].

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// An alert message with an optional block of details.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with extra details.
    Success { message: String, details: String },
    /// A success message on its own.
    SuccessSimple { message: String },
    /// An error message with extra details.
    Error { message: String, details: String },
    /// An error message on its own.
    ErrorSimple { message: String },
}

impl Alert {
    fn is_error(&self) -> bool {
        matches!(self, Alert::Error { .. } | Alert::ErrorSimple { .. })
    }

    fn message(&self) -> &str {
        match self {
            Alert::Success { message, .. }
            | Alert::SuccessSimple { message }
            | Alert::Error { message, .. }
            | Alert::ErrorSimple { message } => message,
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            Alert::Success { details, .. } | Alert::Error { details, .. } => Some(details),
            _ => None,
        }
    }

    fn markup(&self) -> Markup {
        let container_style = if self.is_error() {
            "flex items-start gap-3 p-4 mb-4 rounded-lg border \
            text-red-800 bg-red-50 border-red-300 \
            dark:bg-gray-800 dark:text-red-400 dark:border-red-800"
        } else {
            "flex items-start gap-3 p-4 mb-4 rounded-lg border \
            text-green-800 bg-green-50 border-green-300 \
            dark:bg-gray-800 dark:text-green-400 dark:border-green-800"
        };
        let role = if self.is_error() { "alert" } else { "status" };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(container_style) role=(role)
                {
                    div class="flex-1"
                    {
                        p class="font-semibold" { (self.message()) }

                        @if let Some(details) = self.details() {
                            p class="text-sm mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        class="ms-auto text-sm font-medium"
                        aria-label="Dismiss"
                        onclick="this.closest('#alert-container').classList.add('hidden')"
                    {
                        "✕"
                    }
                }
            }
        }
    }

    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Html<String> {
        Html(self.markup().into_string())
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
