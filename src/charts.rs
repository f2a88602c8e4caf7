//! ECharts configuration for the spending breakdown charts.
//!
//! Charts are built with `charming`, serialised to JSON and initialised by a
//! small script in the page head, see [charts_script].

use charming::{
    Chart,
    component::{Legend, Title},
    element::{JsFunction, Orient, Tooltip, Trigger},
    series::Pie,
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::prelude::ToPrimitive;

use crate::{aggregation::CategoryBreakdown, html::HeadElement};

/// The ECharts bundle served from the static directory.
const ECHARTS_SCRIPT: &str = "/static/echarts.6.0.0.min.js";

/// A chart with its HTML container ID and ECharts configuration.
pub struct PageChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// The container the chart with `chart_id` is drawn into.
pub fn chart_container(chart_id: &str) -> Markup {
    html!(
        div
            id=(chart_id)
            class="min-h-[380px] w-full rounded dark:bg-gray-100"
        {}
    )
}

/// The head elements that load ECharts and initialise `charts`.
///
/// Each chart follows the browser's dark mode setting and resizes with the window.
pub fn charts_script(charts: &[PageChart]) -> [HeadElement; 2] {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    if (!chartDom) {{ return; }}
                    const chart = echarts.init(chartDom);
                    chart.setOption({});

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    [
        HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()),
        HeadElement::ScriptSource(PreEscaped(format!(
            "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
        ))),
    ]
}

/// A pie chart of spending per category.
pub fn category_breakdown_chart(title: &str, breakdown: &CategoryBreakdown) -> Chart {
    let data = breakdown
        .entries()
        .map(|(name, value)| (value.to_f64().unwrap_or_default(), name))
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text(title).left("center"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().orient(Orient::Vertical).left("left").top("10%"))
        .series(
            Pie::new()
                .name("Despesas")
                .radius(vec!["40%", "70%"])
                .center(vec!["60%", "55%"])
                .data(data),
        )
}

fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('pt-BR', {
              style: 'currency',
              currency: 'BRL'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}
