use scraper::{ElementRef, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &scraper::Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        got, endpoint,
        "want form with attribute {attribute}=\"{endpoint}\", got {got:?}"
    );
}

#[track_caller]
fn must_get_input<'a>(form: &ElementRef<'a>, name: &str, type_: &str) -> ElementRef<'a> {
    let input = form
        .select(&Selector::parse("input").unwrap())
        .find(|input| input.value().attr("name") == Some(name))
        .unwrap_or_else(|| panic!("No input found with name \"{name}\" and type \"{type_}\""));

    let input_type = input.value().attr("type").unwrap_or_default();
    assert_eq!(
        input_type, type_,
        "want input {name} with type \"{type_}\", got {input_type:?}"
    );

    input
}

/// Checks that the form has a required input called `name` of type `type_`.
#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    let input = must_get_input(form, name, type_);

    assert!(
        input.value().attr("required").is_some(),
        "want input with name {name} to have the required attribute but got none"
    );
}

#[track_caller]
pub(crate) fn assert_form_input_with_value(
    form: &ElementRef<'_>,
    name: &str,
    type_: &str,
    value: &str,
) {
    assert_form_input(form, name, type_);

    let input = must_get_input(form, name, type_);
    let input_value = input.value().attr("value").unwrap_or_default();
    assert_eq!(
        input_value, value,
        "want input {name} with value \"{value}\", got {input_value:?}"
    );
}

/// Checks the radio button that is checked in the group `name`.
#[track_caller]
pub(crate) fn assert_checked_radio(form: &ElementRef<'_>, name: &str, want_value: &str) {
    let selector = Selector::parse(&format!("input[type=radio][name={name}]")).unwrap();
    let checked = form
        .select(&selector)
        .find(|input| input.value().attr("checked").is_some())
        .and_then(|input| input.value().attr("value"));

    assert_eq!(
        checked,
        Some(want_value),
        "want {name} radio with value {want_value} to be checked, got {checked:?}"
    );
}

/// Checks the option values of the select called `name` and which one is selected.
#[track_caller]
pub(crate) fn assert_form_select(
    form: &ElementRef<'_>,
    name: &str,
    want_values: &[String],
    want_selected: Option<&str>,
) {
    let select = form
        .select(&Selector::parse("select").unwrap())
        .find(|select| select.value().attr("name") == Some(name))
        .unwrap_or_else(|| panic!("No select found with name \"{name}\""));
    let options = select
        .select(&Selector::parse("option").unwrap())
        .collect::<Vec<_>>();

    let values = options
        .iter()
        .filter_map(|option| option.value().attr("value"))
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect::<Vec<_>>();
    assert_eq!(values, want_values, "unexpected options for select {name}");

    let selected = options
        .iter()
        .find(|option| option.value().attr("selected").is_some())
        .and_then(|option| option.value().attr("value"));
    assert_eq!(selected, want_selected, "unexpected selection for {name}");
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    must_get_submit_button(form);
}

#[track_caller]
pub(crate) fn assert_form_submit_button_with_text(form: &ElementRef<'_>, text: &str) {
    let submit_button = must_get_submit_button(form);

    let got_text = submit_button.text().collect::<String>();
    assert_eq!(text, got_text.trim());
}

#[track_caller]
fn must_get_submit_button<'a>(form: &ElementRef<'a>) -> ElementRef<'a> {
    let submit_button = form
        .select(&Selector::parse("button").unwrap())
        .next()
        .expect("No button found");

    assert_eq!(
        submit_button.value().attr("type").unwrap_or_default(),
        "submit",
        "want submit button with type=\"submit\""
    );

    submit_button
}

/// Checks the text of the first paragraph in the form, where errors are shown.
#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want_error_message: &str) {
    let error_message = form
        .select(&Selector::parse("p").unwrap())
        .next()
        .expect("No error message found")
        .text()
        .collect::<String>();

    assert_eq!(want_error_message, error_message.trim());
}
