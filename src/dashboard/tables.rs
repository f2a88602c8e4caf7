//! Table view of the spending per category.

use maud::{Markup, html};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    aggregation::CategoryBreakdown,
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency},
};

/// The share of `total` that `value` makes up, e.g. "12,5%".
fn format_percentage(value: Decimal, total: Decimal) -> String {
    if total.is_zero() {
        return "0,0%".to_owned();
    }

    let percentage = (value * Decimal::ONE_HUNDRED / total)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);

    format!("{percentage:.1}%").replace('.', ",")
}

/// One row per category with its total and share of all the expenses in `breakdown`.
pub(crate) fn breakdown_table(breakdown: &CategoryBreakdown) -> Markup {
    let total = breakdown.total();

    html! {
        div class="w-full overflow-x-auto rounded-lg shadow"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Categoria" }
                        th scope="col" class="px-6 py-3 text-right" { "Total" }
                        th scope="col" class="px-6 py-3 text-right" { "%" }
                    }
                }

                tbody
                {
                    @for (name, value) in breakdown.entries() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                            {
                                (name)
                            }
                            td class="px-6 py-4 text-right" { (format_currency(value)) }
                            td class="px-6 py-4 text-right" { (format_percentage(value, total)) }
                        }
                    }
                }

                tfoot
                {
                    tr class="font-semibold text-gray-900 dark:text-white"
                    {
                        th scope="row" class=(TABLE_CELL_STYLE) { "Total" }
                        td class="px-6 py-4 text-right" { (format_currency(total)) }
                        td class="px-6 py-4 text-right" { "100,0%" }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod breakdown_table_tests {
    use maud::html;
    use rust_decimal::Decimal;
    use scraper::Html;

    use crate::{aggregation::CategoryBreakdown, test_utils::table_rows};

    use super::{breakdown_table, format_percentage};

    #[test]
    fn percentages_round_to_one_decimal_place() {
        assert_eq!(format_percentage(Decimal::ONE, Decimal::from(3)), "33,3%");
        assert_eq!(format_percentage(Decimal::from(2), Decimal::from(3)), "66,7%");
        assert_eq!(format_percentage(Decimal::ONE, Decimal::ONE), "100,0%");
    }

    #[test]
    fn percentage_of_nothing_is_zero() {
        assert_eq!(format_percentage(Decimal::ZERO, Decimal::ZERO), "0,0%");
    }

    #[test]
    fn table_has_row_per_category() {
        let breakdown = CategoryBreakdown {
            names: vec!["Alimentação".to_owned(), "Transporte".to_owned()],
            values: vec![Decimal::new(20000, 2), Decimal::new(5000, 2)],
        };

        let html = Html::parse_fragment(&html! { (breakdown_table(&breakdown)) }.into_string());

        assert_eq!(
            table_rows(&html),
            vec![
                vec!["Alimentação", "R$ 200,00", "80,0%"],
                vec!["Transporte", "R$ 50,00", "20,0%"],
            ]
        );
    }
}
