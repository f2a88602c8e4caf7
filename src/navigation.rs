//! The navigation bar at the top of every signed-in page, with a tab bar at the bottom on small screens.

use maud::{Markup, html};

use crate::endpoints;

const DESKTOP_LINK_STYLE: &str = "block py-2 px-3 rounded-sm lg:p-0 text-gray-900 \
    hover:bg-gray-100 lg:hover:bg-transparent lg:hover:text-blue-700 \
    dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700";
const DESKTOP_CURRENT_LINK_STYLE: &str = "block py-2 px-3 rounded-sm lg:p-0 text-white \
    bg-blue-700 lg:bg-transparent lg:text-blue-700 lg:dark:text-blue-500";
const TAB_STYLE: &str = "flex items-center justify-center rounded-lg px-2 py-2 text-xs \
    font-semibold truncate text-gray-600 hover:text-blue-700 dark:text-gray-300 \
    dark:hover:text-blue-200";
const CURRENT_TAB_STYLE: &str = "flex items-center justify-center rounded-lg px-2 py-2 text-xs \
    font-semibold truncate bg-blue-50 text-blue-700 shadow-sm \
    dark:bg-blue-900/30 dark:text-blue-200";

/// The sections of the app, in display order.
const SECTIONS: [(&str, &str); 5] = [
    (endpoints::DASHBOARD_VIEW, "Dashboard"),
    (endpoints::TRANSACTIONS_VIEW, "Transações"),
    (endpoints::CATEGORIES_VIEW, "Categorias"),
    (endpoints::REPORTS_VIEW, "Relatórios"),
    (endpoints::PROFILE_VIEW, "Perfil"),
];

/// Whether `page` is `section` itself or nested under it,
/// e.g. "/transactions/new" is in "/transactions".
fn is_in_section(page: &str, section: &str) -> bool {
    page.strip_prefix(section)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

struct Link {
    url: &'static str,
    title: &'static str,
    is_current: bool,
}

impl Link {
    fn aria_current(&self) -> Option<&'static str> {
        self.is_current.then_some("page")
    }
}

/// The navigation bar for the page at `current_page`.
pub struct NavBar {
    links: Vec<Link>,
}

impl NavBar {
    /// Highlights the section containing `current_page`, if any.
    pub fn new(current_page: &str) -> NavBar {
        let links = SECTIONS
            .into_iter()
            .map(|(url, title)| Link {
                url,
                title,
                is_current: is_in_section(current_page, url),
            })
            .collect();

        NavBar { links }
    }

    /// Render both bars.
    pub fn into_html(self) -> Markup {
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a href=(endpoints::ROOT) class="flex items-center space-x-3"
                    {
                        img src="/static/favicon-128x128.png" alt="Logo FinançasPlus" class="h-8";
                        span class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "FinançasPlus"
                        }
                    }

                    a
                        href=(endpoints::LOG_OUT)
                        class="lg:hidden text-sm font-medium text-gray-600 hover:text-blue-700 dark:text-gray-300"
                    {
                        "Sair"
                    }

                    ul
                        class="hidden lg:flex flex-row space-x-8 font-medium"
                        aria-label="Principal"
                    {
                        @for link in &self.links {
                            li {
                                a
                                    href=(link.url)
                                    class=(if link.is_current { DESKTOP_CURRENT_LINK_STYLE } else { DESKTOP_LINK_STYLE })
                                    aria-current=[link.aria_current()]
                                {
                                    (link.title)
                                }
                            }
                        }

                        li { a href=(endpoints::LOG_OUT) class=(DESKTOP_LINK_STYLE) { "Sair" } }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                ul
                    class="mx-4 mb-4 grid grid-cols-5 gap-1 rounded-xl border border-gray-200
                    bg-white/95 p-2 shadow-lg backdrop-blur dark:border-gray-700 dark:bg-gray-900/95"
                {
                    @for link in &self.links {
                        li class="min-w-0" {
                            a
                                href=(link.url)
                                class=(if link.is_current { CURRENT_TAB_STYLE } else { TAB_STYLE })
                                aria-current=[link.aria_current()]
                            {
                                (link.title)
                            }
                        }
                    }
                }
            }
        )
    }
}
