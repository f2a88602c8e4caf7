//! The shared catalog of transaction categories.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{
    count_transactions_per_category, create_category, create_category_table, delete_category,
    ensure_default_categories, get_all_categories, get_category, get_category_by_name,
    update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryId, CategoryName, CategoryPatch, NewCategory};
pub use edit::{get_edit_category_page, update_category_endpoint};
pub use list::get_categories_page;

#[cfg(test)]
pub use db::count_categories;
