use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use fake::Fake;
use fake::faker::lorem::en::Word;
use rand::Rng;
use serde_json::{Map, Value, json};

use crate::generators::semantic::lorem_sentence;
use crate::generators::{ColumnType, GeneratedValue, TypeCategory};

const INT_MIN: i64 = 1;
const INT_MAX: i64 = 100_000;
const FLOAT_MIN: f64 = 0.0;
const FLOAT_MAX: f64 = 10_000.0;
const DEFAULT_SCALE: u32 = 2;
const DATE_SPAN_DAYS: i64 = 365;
const SECONDS_PER_DAY: u32 = 86_400;

/// Random value for a column type; `text` is the name-driven text, if any.
pub fn fallback_for_type(
    column_type: &ColumnType,
    text: Option<String>,
    base_date: NaiveDate,
    rng: &mut impl Rng,
) -> GeneratedValue {
    match &column_type.category {
        TypeCategory::Integer => GeneratedValue::Int(rng.random_range(INT_MIN..=INT_MAX)),
        TypeCategory::Decimal => {
            let value = rng.random_range(FLOAT_MIN..=FLOAT_MAX);
            GeneratedValue::Float(round_to(
                value,
                column_type.scale.unwrap_or(DEFAULT_SCALE),
            ))
        }
        TypeCategory::Boolean => GeneratedValue::Bool(rng.random_bool(0.5)),
        TypeCategory::Date => GeneratedValue::Date(random_date(base_date, rng)),
        TypeCategory::Time => GeneratedValue::Time(safe_time_from_seconds(
            rng.random_range(0..SECONDS_PER_DAY),
        )),
        TypeCategory::Timestamp => {
            let date = random_date(base_date, rng);
            let time = safe_time_from_seconds(rng.random_range(0..SECONDS_PER_DAY));
            GeneratedValue::Timestamp(NaiveDateTime::new(date, time))
        }
        TypeCategory::Uuid => GeneratedValue::Uuid(random_uuid(rng)),
        TypeCategory::Json => {
            let key: String = Word().fake_with_rng(rng);
            let mut object = Map::new();
            object.insert(key, json!(rng.random_range(INT_MIN..=INT_MAX)));
            GeneratedValue::Text(Value::Object(object).to_string())
        }
        TypeCategory::Enum(labels) => {
            let index = rng.random_range(0..labels.len());
            GeneratedValue::Text(labels[index].clone())
        }
        TypeCategory::Text => {
            let value = text.unwrap_or_else(|| lorem_sentence(rng));
            GeneratedValue::Text(truncate(value, column_type.max_length))
        }
    }
}

/// Deterministic value that differs for every `row_index` of a column, up to
/// [`ColumnType::unique_capacity`]; past that values repeat.
pub fn unique_for_type(
    column_type: &ColumnType,
    column_name: &str,
    row_index: u64,
    base_date: NaiveDate,
) -> GeneratedValue {
    let ordinal = row_index + 1;
    match &column_type.category {
        TypeCategory::Integer | TypeCategory::Decimal => GeneratedValue::Int(ordinal as i64),
        TypeCategory::Uuid => {
            GeneratedValue::Uuid(uuid::Uuid::from_u128(u128::from(ordinal)).to_string())
        }
        TypeCategory::Date => {
            GeneratedValue::Date(base_date + Duration::days(row_index as i64))
        }
        TypeCategory::Timestamp => {
            let date = base_date + Duration::days(row_index as i64);
            let time = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();
            GeneratedValue::Timestamp(NaiveDateTime::new(date, time))
        }
        TypeCategory::Time => GeneratedValue::Time(safe_time_from_seconds(
            (row_index % u64::from(SECONDS_PER_DAY)) as u32,
        )),
        TypeCategory::Boolean => GeneratedValue::Bool(row_index % 2 == 0),
        TypeCategory::Json => GeneratedValue::Text(json!({ "id": ordinal }).to_string()),
        TypeCategory::Enum(labels) => {
            GeneratedValue::Text(labels[(row_index as usize) % labels.len()].clone())
        }
        TypeCategory::Text => {
            GeneratedValue::Text(unique_text(column_name, ordinal, column_type.max_length))
        }
    }
}

/// `{column}_{ordinal:05}`, or the zero-padded ordinal alone when that key
/// does not fit `max_length`.
fn unique_text(column_name: &str, ordinal: u64, max_length: Option<usize>) -> String {
    let key = format!("{column_name}_{ordinal:05}");
    let Some(max_length) = max_length else {
        return key;
    };
    if key.chars().count() <= max_length {
        return key;
    }
    let ordinal = match u32::try_from(max_length)
        .ok()
        .and_then(|width| 10_u64.checked_pow(width))
    {
        Some(1) => return String::new(),
        Some(limit) => (ordinal - 1) % (limit - 1) + 1,
        None => ordinal,
    };
    format!("{ordinal:0max_length$}")
}

pub fn random_uuid(rng: &mut impl Rng) -> String {
    let mut bytes = [0_u8; 16];
    rng.fill(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

fn random_date(base_date: NaiveDate, rng: &mut impl Rng) -> NaiveDate {
    base_date + Duration::days(rng.random_range(0..=DATE_SPAN_DAYS))
}

fn safe_time_from_seconds(seconds: u32) -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or_default()
}

fn round_to(value: f64, scale: u32) -> f64 {
    let factor = 10_f64.powi(scale.min(9) as i32);
    (value * factor).round() / factor
}

fn truncate(mut value: String, max_length: Option<usize>) -> String {
    if let Some(max_length) = max_length
        && let Some((cut, _)) = value.char_indices().nth(max_length)
    {
        value.truncate(cut);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use model2data_core::SchemaCatalog;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn column_type(raw: &str) -> ColumnType {
        ColumnType::resolve(raw, &SchemaCatalog::new())
    }

    fn base_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("base date")
    }

    #[test]
    fn integers_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let value = fallback_for_type(&column_type("integer"), None, base_date(), &mut rng);
            let value = value.as_i64().expect("int");
            assert!((INT_MIN..=INT_MAX).contains(&value));
        }
    }

    #[test]
    fn decimals_respect_scale() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let value =
                fallback_for_type(&column_type("numeric(8,1)"), None, base_date(), &mut rng);
            let GeneratedValue::Float(value) = value else {
                panic!("expected float, got {value:?}");
            };
            assert_eq!((value * 10.0).round() / 10.0, value);
        }
    }

    #[test]
    fn dates_stay_within_a_year_of_base() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let GeneratedValue::Date(date) =
                fallback_for_type(&column_type("date"), None, base_date(), &mut rng)
            else {
                panic!("expected date");
            };
            assert!(date >= base_date());
            assert!(date <= base_date() + Duration::days(DATE_SPAN_DAYS));
        }
    }

    #[test]
    fn text_is_truncated_to_declared_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let value = fallback_for_type(
            &column_type("varchar(5)"),
            Some("abcdefghij".to_string()),
            base_date(),
            &mut rng,
        );
        assert_eq!(value, GeneratedValue::Text("abcde".to_string()));
    }

    #[test]
    fn unique_text_fits_declared_length() {
        let short = column_type("varchar(4)");
        let keys: BTreeSet<_> = (0..500)
            .map(|row| {
                let value = unique_for_type(&short, "product_code", row, base_date());
                let text = value.as_str().expect("text").to_string();
                assert!(text.chars().count() <= 4, "too long: {text}");
                text
            })
            .collect();
        assert_eq!(keys.len(), 500);
        assert!(keys.contains("0001"));
    }

    #[test]
    fn random_uuids_are_version_four() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let value = random_uuid(&mut rng);
        let parsed = uuid::Uuid::parse_str(&value).expect("uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn unique_values_follow_row_ordinal() {
        assert_eq!(
            unique_for_type(&column_type("bigint"), "id", 0, base_date()),
            GeneratedValue::Int(1)
        );
        assert_eq!(
            unique_for_type(&column_type("text"), "_dlt_id", 41, base_date()),
            GeneratedValue::Text("_dlt_id_00042".to_string())
        );
        assert_eq!(
            unique_for_type(&column_type("date"), "day", 2, base_date()),
            GeneratedValue::Date(base_date() + Duration::days(2))
        );
        assert_eq!(
            unique_for_type(&column_type("varchar(12)"), "sku", 6, base_date()),
            GeneratedValue::Text("sku_00007".to_string())
        );
        let first = unique_for_type(&column_type("uuid"), "id", 0, base_date());
        let second = unique_for_type(&column_type("uuid"), "id", 1, base_date());
        assert_ne!(first, second);
    }
}
