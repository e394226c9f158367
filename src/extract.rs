// Selectors track one site's markup; a missing element is an error, never a guess

use std::fmt;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing element for {field}: {selector}")]
    MissingElement { field: String, selector: String },
    #[error("missing href on {selector}")]
    MissingLink { selector: String },
    #[error("bad link {href}: {source}")]
    BadLink {
        href: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid selector {selector}: {reason}")]
    Selector { selector: String, reason: String },
}

// Home page state dropdown
#[derive(Debug, Clone, Copy)]
pub struct DirectoryProfile {
    pub container: &'static str,
    pub list: &'static str,
    pub item: &'static str,
    /// An item containing this marks the end of the flat state list.
    pub nested: &'static str,
    pub link: &'static str,
}

pub const DIRECTORY_PROFILE: DirectoryProfile = DirectoryProfile {
    container: "div.SearchBar-keywordSearch.input-group.input-group-lg",
    list: "ul.dropdown-menu.SearchBar-keywordSearch",
    item: "li",
    nested: "ul",
    link: "a",
};

#[derive(Debug, Clone, Copy)]
pub struct ListingProfile {
    pub container: &'static str,
    pub heading: &'static str,
    pub link: &'static str,
}

pub const LISTING_PROFILE: ListingProfile = ListingProfile {
    container: "div#parkListResultsArea",
    heading: "h3",
    link: "a",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Designation,
    Title,
    Locality,
    Region,
    PostalCode,
    Telephone,
}

impl fmt::Display for DetailField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetailField::Designation => "designation",
            DetailField::Title => "title",
            DetailField::Locality => "locality",
            DetailField::Region => "region",
            DetailField::PostalCode => "postal code",
            DetailField::Telephone => "telephone",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DetailRule {
    pub field: DetailField,
    pub selector: &'static str,
    pub required: bool,
}

pub const DETAIL_PROFILE: &[DetailRule] = &[
    DetailRule {
        field: DetailField::Designation,
        selector: "span.Hero-designation",
        required: true,
    },
    DetailRule {
        field: DetailField::Title,
        selector: "a.Hero-title",
        required: true,
    },
    DetailRule {
        field: DetailField::Locality,
        selector: r#"span[itemprop="addressLocality"]"#,
        required: true,
    },
    DetailRule {
        field: DetailField::Region,
        selector: "span.region",
        required: true,
    },
    DetailRule {
        field: DetailField::PostalCode,
        selector: "span.postal-code",
        required: true,
    },
    DetailRule {
        field: DetailField::Telephone,
        selector: r#"span[itemprop="telephone"]"#,
        required: true,
    },
];

/// Trimmed text per detail field; `None` only for optional rules with no match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub designation: Option<String>,
    pub title: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub telephone: Option<String>,
}

impl DetailFields {
    fn slot(&mut self, field: DetailField) -> &mut Option<String> {
        match field {
            DetailField::Designation => &mut self.designation,
            DetailField::Title => &mut self.title,
            DetailField::Locality => &mut self.locality,
            DetailField::Region => &mut self.region,
            DetailField::PostalCode => &mut self.postal_code,
            DetailField::Telephone => &mut self.telephone,
        }
    }
}

/// Returns `(lower-cased name, absolute url)` pairs in page order.
pub fn extract_directory(
    html: &str,
    base: &Url,
    profile: &DirectoryProfile,
) -> Result<Vec<(String, String)>, ExtractError> {
    let document = Html::parse_document(html);

    let container = select_first(document.root_element(), profile.container, "search bar")?;
    let list = select_first(container, profile.list, "state dropdown")?;

    let item_selector = parse_selector(profile.item)?;
    let nested_selector = parse_selector(profile.nested)?;
    let link_selector = parse_selector(profile.link)?;

    let mut entries = Vec::new();

    for item in list.select(&item_selector) {
        if item.select(&nested_selector).next().is_some() {
            break;
        }

        let link = item
            .select(&link_selector)
            .next()
            .ok_or_else(|| ExtractError::MissingElement {
                field: "state link".to_string(),
                selector: profile.link.to_string(),
            })?;
        let url = resolve_href(base, link, profile.link)?;

        entries.push((text_of(item).to_lowercase(), url));
    }

    Ok(entries)
}

pub fn extract_listing(
    html: &str,
    base: &Url,
    profile: &ListingProfile,
) -> Result<Vec<String>, ExtractError> {
    let document = Html::parse_document(html);

    let container = select_first(document.root_element(), profile.container, "results area")?;

    let heading_selector = parse_selector(profile.heading)?;
    let link_selector = parse_selector(profile.link)?;

    container
        .select(&heading_selector)
        .map(|heading| {
            let link = heading.select(&link_selector).next().ok_or_else(|| {
                ExtractError::MissingElement {
                    field: "park link".to_string(),
                    selector: profile.link.to_string(),
                }
            })?;
            resolve_href(base, link, profile.link)
        })
        .collect()
}

pub fn extract_detail(html: &str, rules: &[DetailRule]) -> Result<DetailFields, ExtractError> {
    let document = Html::parse_document(html);
    let mut fields = DetailFields::default();

    for rule in rules {
        let selector = parse_selector(rule.selector)?;

        match document.select(&selector).next() {
            Some(element) => *fields.slot(rule.field) = Some(text_of(element)),
            None if rule.required => {
                return Err(ExtractError::MissingElement {
                    field: rule.field.to_string(),
                    selector: rule.selector.to_string(),
                });
            }
            None => {}
        }
    }

    Ok(fields)
}

fn parse_selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        reason: format!("{:?}", e),
    })
}

fn select_first<'a>(
    scope: ElementRef<'a>,
    css: &str,
    what: &str,
) -> Result<ElementRef<'a>, ExtractError> {
    let selector = parse_selector(css)?;

    scope
        .select(&selector)
        .next()
        .ok_or_else(|| ExtractError::MissingElement {
            field: what.to_string(),
            selector: css.to_string(),
        })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn resolve_href(base: &Url, link: ElementRef<'_>, css: &str) -> Result<String, ExtractError> {
    let href = link
        .value()
        .attr("href")
        .ok_or_else(|| ExtractError::MissingLink {
            selector: css.to_string(),
        })?;

    base.join(href)
        .map(|url| url.to_string())
        .map_err(|source| ExtractError::BadLink {
            href: href.to_string(),
            source,
        })
}
