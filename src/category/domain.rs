//! Core category types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// The database ID of a category.
pub type CategoryId = i64;

/// The colour given to categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#D4A5A5";

/// The name of a category.
///
/// Leading and trailing whitespace is removed and the name cannot be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyCategoryName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, coloured grouping for transactions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The unique name of the category.
    pub name: CategoryName,
    /// A short description of what belongs in the category.
    pub description: String,
    /// A CSS colour, e.g. "#FF6B6B".
    pub color: String,
    /// When the category was created.
    pub created_at: OffsetDateTime,
}

/// The data needed to create a category.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// The unique name of the category.
    pub name: CategoryName,
    /// What belongs in the category, may be empty.
    pub description: String,
    /// The hex color used to draw the category, e.g. "#3b82f6".
    pub color: String,
}

/// A partial update for a category, `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    /// The new name, it must not belong to another category.
    pub name: Option<CategoryName>,
    /// The new description.
    pub description: Option<String>,
    /// The new hex color.
    pub color: Option<String>,
}

/// The form data for creating or editing a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryFormData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
}

/// The categories created when the catalog is empty, as (name, description, colour).
pub const DEFAULT_CATEGORIES: [(&str, &str, &str); 7] = [
    ("Alimentação", "Gastos com comida e bebida", "#FF6B6B"),
    ("Transporte", "Gastos com transporte", "#4ECDC4"),
    ("Lazer", "Gastos com lazer e diversão", "#FFE66D"),
    ("Contas Fixas", "Contas fixas e obrigações", "#95E1D3"),
    ("Saúde", "Gastos com saúde", "#C7CEEA"),
    ("Educação", "Gastos com educação", "#B5EAD7"),
    ("Outros", "Outros gastos", "#D4A5A5"),
];

/// Use `color` if it is set, otherwise fall back to [DEFAULT_CATEGORY_COLOR].
pub fn color_or_default(color: &str) -> String {
    let color = color.trim();

    if color.is_empty() {
        DEFAULT_CATEGORY_COLOR.to_owned()
    } else {
        color.to_owned()
    }
}

#[cfg(test)]
mod category_name_tests {
    use crate::{
        Error,
        category::{CategoryName, domain::color_or_default},
    };

    #[test]
    fn new_fails_on_empty_string() {
        assert_eq!(CategoryName::new(""), Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        assert_eq!(CategoryName::new("\n\t \r"), Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_trims_whitespace() {
        let name = CategoryName::new("  Lazer ").unwrap();

        assert_eq!(name.as_ref(), "Lazer");
    }

    #[test]
    fn blank_color_falls_back_to_default() {
        assert_eq!(color_or_default(" "), "#D4A5A5");
        assert_eq!(color_or_default("#000000"), "#000000");
    }
}
