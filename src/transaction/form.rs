//! The transaction form shared by the create and edit pages.

use maud::{Markup, html};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    category::{Category, CategoryId},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner,
    },
    transaction::core::{Transaction, TransactionType},
};

/// The form data for creating or editing a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The amount in reais, validated by the handler so the form can show the error.
    pub amount: Decimal,
    pub date: Date,
    pub category_id: CategoryId,
    #[serde(default)]
    pub description: String,
}

/// The values to pre-fill the transaction form with.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct TransactionFormDefaults {
    pub transaction_type: TransactionType,
    pub amount: Option<Decimal>,
    pub date: Date,
    pub category_id: Option<CategoryId>,
    pub description: String,
}

impl TransactionFormDefaults {
    /// An empty expense dated `today`.
    pub fn new(today: Date) -> Self {
        Self {
            transaction_type: TransactionType::Expense,
            amount: None,
            date: today,
            category_id: None,
            description: String::new(),
        }
    }
}

impl From<&Transaction> for TransactionFormDefaults {
    fn from(transaction: &Transaction) -> Self {
        Self {
            transaction_type: transaction.transaction_type,
            amount: Some(transaction.amount.value()),
            date: transaction.date,
            category_id: Some(transaction.category_id),
            description: transaction.description.clone(),
        }
    }
}

impl From<&TransactionForm> for TransactionFormDefaults {
    fn from(form: &TransactionForm) -> Self {
        Self {
            transaction_type: form.transaction_type,
            amount: Some(form.amount),
            date: form.date,
            category_id: Some(form.category_id),
            description: form.description.clone(),
        }
    }
}

/// How the form submits: the HTMX attribute and the endpoint it points at.
pub(super) enum FormAction<'a> {
    Create(&'a str),
    Update(&'a str),
}

/// Render the full transaction form, with `error_message` shown above the submit button.
pub(super) fn transaction_form(
    action: FormAction<'_>,
    defaults: &TransactionFormDefaults,
    categories: &[Category],
    error_message: Option<&str>,
) -> Markup {
    let (hx_post, hx_put, button_text) = match action {
        FormAction::Create(endpoint) => (Some(endpoint), None, " Criar Transação"),
        FormAction::Update(endpoint) => (None, Some(endpoint), " Salvar Transação"),
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (transaction_form_fields(defaults, categories))

            @if let Some(error_message) = error_message {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                (button_text)
            }
        }
    }
}

fn transaction_form_fields(defaults: &TransactionFormDefaults, categories: &[Category]) -> Markup {
    let amount = defaults.amount.map(|amount| format!("{amount:.2}"));

    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Tipo" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                @for transaction_type in [TransactionType::Expense, TransactionType::Income] {
                    @let id = format!("transaction-type-{}", transaction_type.as_str());

                    div class="flex items-center gap-3"
                    {
                        input
                            name="type"
                            id=(id)
                            type="radio"
                            value=(transaction_type.as_str())
                            checked[transaction_type == defaults.transaction_type]
                            required
                            tabindex="0"
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for=(id) class=(FORM_RADIO_LABEL_STYLE)
                        {
                            (transaction_type.label())
                        }
                    }
                }
            }
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Valor" }

            // w-full makes a prefilled input take the full width.
            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder="0,00"
                    required
                    autofocus
                    value=[amount]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Data" }

            input
                name="date"
                id="date"
                type="date"
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="category_id" class=(FORM_LABEL_STYLE) { "Categoria" }

            select
                name="category_id"
                id="category_id"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" disabled selected[defaults.category_id.is_none()]
                {
                    "Selecione uma categoria"
                }

                @for category in categories {
                    option
                        value=(category.id)
                        selected[Some(category.id) == defaults.category_id]
                    {
                        (category.name)
                    }
                }
            }
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Descrição" }

            input
                name="description"
                id="description"
                type="text"
                placeholder="Descrição (opcional)"
                value=(defaults.description)
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}
