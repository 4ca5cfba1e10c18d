//! Deep links for contacting a seller through WhatsApp.

use crate::contract::model::Listing;
use crate::contract::text::unescape_html;

/// `https://wa.me/<digits>?text=<message>`, or `None` when the number has no
/// digits.
pub fn whatsapp_link(number: &str, text: &str) -> Option<String> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!(
        "https://wa.me/{digits}?text={}",
        urlencoding::encode(text)
    ))
}

/// Opening message for a listing inquiry. Titles are stored escaped, so the
/// entities are turned back into text first.
pub fn inquiry_message(listing: &Listing) -> String {
    format!(
        "Hi! I'm interested in your listing: {}",
        unescape_html(&listing.title)
    )
}

/// Link for a listing, if its seller left a contact number.
pub fn listing_contact_link(listing: &Listing) -> Option<String> {
    let number = listing.contact_number.as_deref()?;
    whatsapp_link(number, &inquiry_message(listing))
}
