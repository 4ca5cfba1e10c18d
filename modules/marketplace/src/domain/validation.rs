//! Input rules applied by the Bridge before anything reaches the store.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::contract::model::{ListingPatch, NewListing, ProfilePatch};
use crate::contract::text::{canonical_escape, unescape_html};
use crate::domain::error::DomainError;

pub const MAX_TITLE: usize = 100;
pub const MAX_DESCRIPTION: usize = 1000;
pub const MAX_LABEL: usize = 100;
pub const MAX_CONDITION: usize = 50;
pub const MAX_PERSON_NAME: usize = 50;
pub const MAX_IMAGES: usize = 5;

/// 999 999.99
pub const MAX_PRICE: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

static CONTACT_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9][0-9]{6,14}$").unwrap_or_else(|e| panic!("bad contact regex: {e}"))
});

/// Trim, require non-empty, bound the length in characters, then escape.
/// Input that is already escaped is escaped only once.
pub fn free_text(field: &str, value: &str, max: usize) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "is required"));
    }
    if unescape_html(trimmed).chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(canonical_escape(trimmed))
}

/// Category and location are matched by equality, so they are kept verbatim
/// and markup characters are rejected instead of escaped.
pub fn label(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "is required"));
    }
    if trimmed.chars().count() > MAX_LABEL {
        return Err(DomainError::validation(
            field,
            format!("must be at most {MAX_LABEL} characters"),
        ));
    }
    if trimmed.contains(['<', '>', '"']) {
        return Err(DomainError::validation(field, "contains invalid characters"));
    }
    Ok(trimmed.to_string())
}

/// Empty input clears the condition.
pub fn condition(value: &str) -> Result<Option<String>, DomainError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    free_text("condition", value, MAX_CONDITION).map(Some)
}

/// Strips spaces, dashes, dots and parentheses; empty input clears the number.
pub fn contact_number(raw: &str) -> Result<Option<String>, DomainError> {
    let normalized: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    if normalized.is_empty() {
        return Ok(None);
    }
    if !CONTACT_NUMBER.is_match(&normalized) {
        return Err(DomainError::validation(
            "contactNumber",
            "must be in international format, e.g. +14155552671",
        ));
    }
    Ok(Some(normalized))
}

pub fn price(value: Decimal) -> Result<Decimal, DomainError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::validation("price", "must not be negative"));
    }
    let rounded = value.round_dp(2);
    if rounded > MAX_PRICE {
        return Err(DomainError::validation(
            "price",
            format!("must not exceed {MAX_PRICE}"),
        ));
    }
    if rounded.is_zero() {
        return Ok(Decimal::ZERO);
    }
    Ok(rounded)
}

pub fn images(list: &[String], max: usize) -> Result<Vec<String>, DomainError> {
    if list.len() > max {
        return Err(DomainError::validation(
            "images",
            format!("at most {max} images are allowed"),
        ));
    }
    list.iter()
        .map(|raw| {
            let image = raw.trim();
            let accepted = if let Some(rest) = image.strip_prefix('/') {
                !rest.is_empty() && !rest.starts_with('/')
            } else {
                url::Url::parse(image)
                    .map(|u| u.scheme() == "https" && u.host().is_some())
                    .unwrap_or(false)
            };
            if accepted {
                Ok(image.to_string())
            } else {
                Err(DomainError::validation(
                    "images",
                    format!("'{image}' is not an https URL or absolute path"),
                ))
            }
        })
        .collect()
}

/// Empty input clears the name.
pub fn person_name(field: &str, value: &str) -> Result<Option<String>, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_PERSON_NAME {
        return Err(DomainError::validation(
            field,
            format!("must be at most {MAX_PERSON_NAME} characters"),
        ));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\''))
    {
        return Err(DomainError::validation(
            field,
            "may only contain letters, spaces, hyphens and apostrophes",
        ));
    }
    Ok(Some(trimmed.to_string()))
}

pub fn new_listing(input: NewListing, max_images: usize) -> Result<NewListing, DomainError> {
    Ok(NewListing {
        title: free_text("title", &input.title, MAX_TITLE)?,
        description: free_text("description", &input.description, MAX_DESCRIPTION)?,
        price: price(input.price)?,
        category: label("category", &input.category)?,
        location: label("location", &input.location)?,
        condition: match input.condition.as_deref() {
            Some(c) => condition(c)?,
            None => None,
        },
        images: images(&input.images, max_images)?,
        contact_number: match input.contact_number.as_deref() {
            Some(n) => contact_number(n)?,
            None => None,
        },
    })
}

/// Validated patch. `condition` and `contact_number` use `Some(None)` for
/// "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub condition: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    pub contact_number: Option<Option<String>>,
    pub status: Option<crate::contract::model::ListingStatus>,
}

pub fn listing_patch(patch: ListingPatch, max_images: usize) -> Result<CleanPatch, DomainError> {
    if patch.is_empty() {
        return Err(DomainError::validation("updates", "no fields to update"));
    }
    Ok(CleanPatch {
        title: patch
            .title
            .map(|t| free_text("title", &t, MAX_TITLE))
            .transpose()?,
        description: patch
            .description
            .map(|d| free_text("description", &d, MAX_DESCRIPTION))
            .transpose()?,
        price: patch.price.map(price).transpose()?,
        category: patch
            .category
            .map(|c| label("category", &c))
            .transpose()?,
        location: patch
            .location
            .map(|l| label("location", &l))
            .transpose()?,
        condition: patch.condition.map(|c| condition(&c)).transpose()?,
        images: patch
            .images
            .map(|i| images(&i, max_images))
            .transpose()?,
        contact_number: patch
            .contact_number
            .map(|n| contact_number(&n))
            .transpose()?,
        status: patch.status,
    })
}

/// Validated profile patch; `Some(None)` clears a name.
pub fn profile_patch(
    patch: ProfilePatch,
) -> Result<(Option<Option<String>>, Option<Option<String>>), DomainError> {
    if patch.first_name.is_none() && patch.last_name.is_none() {
        return Err(DomainError::validation("updates", "no fields to update"));
    }
    let first = patch
        .first_name
        .map(|n| person_name("firstName", &n))
        .transpose()?;
    let last = patch
        .last_name
        .map(|n| person_name("lastName", &n))
        .transpose()?;
    Ok((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_is_trimmed_bounded_and_escaped() {
        assert_eq!(
            free_text("title", "  <b>Lamp</b> & 'shade' ", MAX_TITLE).unwrap(),
            "&lt;b&gt;Lamp&lt;/b&gt; &amp; &#x27;shade&#x27;"
        );
        assert!(free_text("title", "   ", MAX_TITLE).is_err());
        assert!(free_text("title", &"a".repeat(101), MAX_TITLE).is_err());
        assert!(free_text("title", &"é".repeat(100), MAX_TITLE).is_ok());
    }

    #[test]
    fn resubmitted_text_is_not_escaped_twice() {
        let stored = free_text("title", "Tom & Jerry", MAX_TITLE).unwrap();
        assert_eq!(stored, "Tom &amp; Jerry");
        assert_eq!(free_text("title", &stored, MAX_TITLE).unwrap(), stored);
        // the bound applies to the visible text, not the entities
        assert!(free_text("title", &"&amp;".repeat(100), MAX_TITLE).is_ok());
    }

    #[test]
    fn labels_are_verbatim() {
        assert_eq!(label("category", " Sports & Outdoors ").unwrap(), "Sports & Outdoors");
        assert!(label("category", "<script>").is_err());
        assert!(label("location", "").is_err());
    }

    #[test]
    fn contact_numbers_are_normalized() {
        assert_eq!(
            contact_number("+1 (415) 555-2671").unwrap().as_deref(),
            Some("+14155552671")
        );
        assert_eq!(contact_number("  ").unwrap(), None);
        assert!(contact_number("4155552671").is_err());
        assert!(contact_number("+0123456789").is_err());
        assert!(contact_number("+12345").is_err());
        assert!(contact_number("+1234567890123456").is_err());
        assert!(contact_number("+1415abc2671").is_err());
    }

    #[test]
    fn price_bounds() {
        assert_eq!(price(Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert_eq!(price(MAX_PRICE).unwrap(), MAX_PRICE);
        assert_eq!(price(Decimal::new(12345, 3)).unwrap(), Decimal::new(1234, 2));
        assert!(price(Decimal::new(-1, 2)).is_err());
        assert!(price(Decimal::new(100_000_000, 2)).is_err());
    }

    #[test]
    fn image_rules() {
        let ok = vec![
            "https://cdn.example.edu/a.png".to_string(),
            "/uploads/b.jpg".to_string(),
        ];
        assert_eq!(images(&ok, 5).unwrap(), ok);
        assert!(images(&["http://x.edu/a.png".to_string()], 5).is_err());
        assert!(images(&["//evil.example/a.png".to_string()], 5).is_err());
        assert!(images(&["javascript:alert(1)".to_string()], 5).is_err());
        let six = vec!["/a.png".to_string(); 6];
        assert!(images(&six, 5).is_err());
    }

    #[test]
    fn person_names() {
        assert_eq!(person_name("firstName", " Anne-Marie ").unwrap().as_deref(), Some("Anne-Marie"));
        assert_eq!(person_name("lastName", "O'Neil").unwrap().as_deref(), Some("O'Neil"));
        assert_eq!(person_name("firstName", "").unwrap(), None);
        assert!(person_name("firstName", "R2D2").is_err());
        assert!(person_name("firstName", &"a".repeat(51)).is_err());
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(listing_patch(ListingPatch::default(), 5).is_err());
        assert!(profile_patch(ProfilePatch::default()).is_err());
    }

    #[test]
    fn patch_clears_optional_fields() {
        let clean = listing_patch(
            ListingPatch {
                condition: Some(String::new()),
                contact_number: Some(" ".into()),
                ..Default::default()
            },
            5,
        )
        .unwrap();
        assert_eq!(clean.condition, Some(None));
        assert_eq!(clean.contact_number, Some(None));
        assert_eq!(clean.title, None);
    }
}
