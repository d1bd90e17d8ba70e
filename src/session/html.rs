//! HTML page queries shared by session implementations.
//!
//! `scraper::Html` is not `Send`, so every helper parses the document, queries
//! it and returns owned data; no parsed tree outlives a call.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::SessionError;

const FORM_CONTROLS: &str = "input[name], textarea[name], select[name]";

/// Parses a CSS selector, mapping parser diagnostics into [`SessionError`].
///
/// # Errors
///
/// Returns [`SessionError::InvalidSelector`] when `css` is not a valid selector.
pub(crate) fn parse_selector(css: &str) -> Result<Selector, SessionError> {
    Selector::parse(css).map_err(|error| SessionError::invalid_selector(css, format!("{error:?}")))
}

pub(crate) fn has_selector(html: &str, css: &str) -> Result<bool, SessionError> {
    let selector = parse_selector(css)?;
    let doc = Html::parse_document(html);
    Ok(doc.select(&selector).next().is_some())
}

/// Returns the whitespace-collapsed text of the first element matching `css`.
pub(crate) fn select_text(html: &str, css: &str) -> Result<Option<String>, SessionError> {
    let selector = parse_selector(css)?;
    let doc = Html::parse_document(html);
    Ok(doc.select(&selector).next().map(|element| collapse_text(&element)))
}

/// Returns true if the page has a form control named `name`.
pub(crate) fn has_field(html: &str, name: &str) -> Result<bool, SessionError> {
    let controls = parse_selector(FORM_CONTROLS)?;
    let doc = Html::parse_document(html);
    Ok(doc
        .select(&controls)
        .any(|control| control.value().attr("name") == Some(name)))
}

/// Resolves the `href` of the first element matching `css` against `base`.
pub(crate) fn link_target(html: &str, base: &Url, css: &str) -> Result<Option<Url>, SessionError> {
    let selector = parse_selector(css)?;
    let doc = Html::parse_document(html);
    let Some(href) = doc
        .select(&selector)
        .find_map(|element| element.value().attr("href").map(str::trim))
        .filter(|href| !href.is_empty())
    else {
        return Ok(None);
    };
    base.join(href)
        .map(Some)
        .map_err(|error| SessionError::navigation(href, format!("invalid link target: {error}")))
}

fn collapse_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// HTTP method of a form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormMethod {
    Get,
    Post,
}

/// A form ready to be sent: resolved action, method and encoded field list.
#[derive(Debug, Clone)]
pub(crate) struct FormSubmission {
    pub(crate) method: FormMethod,
    pub(crate) action: Url,
    pub(crate) fields: Vec<(String, String)>,
}

impl FormSubmission {
    /// `application/x-www-form-urlencoded` body for POST submissions.
    pub(crate) fn encoded_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.fields)
            .finish()
    }

    /// Target URL for GET submissions; fields replace the action's query.
    pub(crate) fn get_url(&self) -> Url {
        let mut url = self.action.clone();
        url.set_query(None);
        if !self.fields.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.fields);
        }
        url
    }

    #[cfg(test)]
    pub(crate) fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Builds the submission for the form that contains the first staged field.
///
/// Staged values override the form's own values; other named controls keep
/// their defaults so hidden tokens travel with the submission.
pub(crate) fn build_form_submission(
    html: &str,
    base: &Url,
    staged: &[(String, String)],
) -> Result<FormSubmission, SessionError> {
    let Some((first_field, _)) = staged.first() else {
        return Err(SessionError::no_form(base.as_str(), "no fields were filled in"));
    };

    let form_selector = parse_selector("form")?;
    let controls = parse_selector(FORM_CONTROLS)?;
    let options = parse_selector("option")?;
    let doc = Html::parse_document(html);

    let Some(form) = doc.select(&form_selector).find(|form| {
        form.select(&controls)
            .any(|control| control.value().attr("name") == Some(first_field.as_str()))
    }) else {
        return Err(SessionError::no_form(
            base.as_str(),
            format!("no form contains field '{first_field}'"),
        ));
    };

    let mut fields: Vec<(String, String)> = Vec::new();
    for control in form.select(&controls) {
        let Some(name) = control.value().attr("name") else {
            continue;
        };
        if let Some((_, value)) = staged.iter().find(|(field, _)| field == name) {
            if !fields.iter().any(|(field, _)| field == name) {
                fields.push((name.to_string(), value.clone()));
            }
            continue;
        }
        if let Some(value) = default_value(&control, &options) {
            fields.push((name.to_string(), value));
        }
    }

    let action = match form
        .value()
        .attr("action")
        .map(str::trim)
        .filter(|action| !action.is_empty())
    {
        Some(action) => base.join(action).map_err(|error| {
            SessionError::no_form(base.as_str(), format!("invalid form action '{action}': {error}"))
        })?,
        None => base.clone(),
    };

    let method = if form
        .value()
        .attr("method")
        .is_some_and(|method| method.trim().eq_ignore_ascii_case("post"))
    {
        FormMethod::Post
    } else {
        FormMethod::Get
    };

    Ok(FormSubmission {
        method,
        action,
        fields,
    })
}

fn default_value(control: &ElementRef<'_>, options: &Selector) -> Option<String> {
    let element = control.value();
    match element.name() {
        "textarea" => Some(control.text().collect()),
        "select" => {
            let chosen = control
                .select(options)
                .find(|option| option.value().attr("selected").is_some())
                .or_else(|| control.select(options).next())?;
            Some(
                chosen
                    .value()
                    .attr("value")
                    .map_or_else(|| collapse_text(&chosen), ToString::to_string),
            )
        }
        _ => {
            let input_type = element.attr("type").unwrap_or("text").to_ascii_lowercase();
            match input_type.as_str() {
                "submit" | "button" | "image" | "reset" | "file" => None,
                "checkbox" | "radio" => element
                    .attr("checked")
                    .map(|_| element.attr("value").unwrap_or("on").to_string()),
                _ => Some(element.attr("value").unwrap_or_default().to_string()),
            }
        }
    }
}
