//! Realistic text picked from the column name.

use fake::Fake;
use fake::faker::address::en::{CityName, CountryName, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{DomainSuffix, SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use rand::Rng;

/// Name-driven text kinds, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextHint {
    Email,
    FirstName,
    LastName,
    FullName,
    Username,
    Phone,
    City,
    Country,
    Street,
    ZipCode,
    Company,
    Url,
    Title,
    Body,
}

impl TextHint {
    /// Pick a hint from a column name, if one applies.
    pub fn for_column(column_name: &str) -> Option<Self> {
        let name = column_name.to_lowercase();
        let has = |needle: &str| name.contains(needle);

        let hint = if has("email") {
            Self::Email
        } else if has("first_name") || has("firstname") {
            Self::FirstName
        } else if has("last_name") || has("lastname") || has("surname") {
            Self::LastName
        } else if has("username") || has("login") || name == "by" || name == "author" {
            Self::Username
        } else if name == "name" || has("full_name") || has("fullname") || has("customer_name") {
            Self::FullName
        } else if has("phone") || has("mobile") {
            Self::Phone
        } else if has("city") {
            Self::City
        } else if has("country") {
            Self::Country
        } else if has("street") || has("address") {
            Self::Street
        } else if has("zip") || has("postal") || has("postcode") {
            Self::ZipCode
        } else if has("company") || has("organization") || has("employer") {
            Self::Company
        } else if has("url") || has("website") || has("link") {
            Self::Url
        } else if has("title") || has("subject") || has("headline") {
            Self::Title
        } else if has("description") || has("body") || has("text") || has("comment")
            || has("content")
        {
            Self::Body
        } else {
            return None;
        };
        Some(hint)
    }

    pub fn generate(self, rng: &mut impl Rng) -> String {
        match self {
            Self::Email => SafeEmail().fake_with_rng(rng),
            Self::FirstName => FirstName().fake_with_rng(rng),
            Self::LastName => LastName().fake_with_rng(rng),
            Self::FullName => Name().fake_with_rng(rng),
            Self::Username => Username().fake_with_rng(rng),
            Self::Phone => PhoneNumber().fake_with_rng(rng),
            Self::City => CityName().fake_with_rng(rng),
            Self::Country => CountryName().fake_with_rng(rng),
            Self::Street => StreetName().fake_with_rng(rng),
            Self::ZipCode => ZipCode().fake_with_rng(rng),
            Self::Company => CompanyName().fake_with_rng(rng),
            Self::Url => {
                let host: String = Word().fake_with_rng(rng);
                let suffix: String = DomainSuffix().fake_with_rng(rng);
                format!("https://{host}.{suffix}")
            }
            Self::Title => {
                let title: String = Sentence(2..6).fake_with_rng(rng);
                title.trim_end_matches('.').to_string()
            }
            Self::Body => Paragraph(1..3).fake_with_rng(rng),
        }
    }
}

/// Short lorem sentence used when nothing better is known about a text column.
pub fn lorem_sentence(rng: &mut impl Rng) -> String {
    Sentence(3..8).fake_with_rng(rng)
}
