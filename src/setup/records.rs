//! Typed rows for the two CSV sources and their best-effort coercion rules.
//!
//! Coercion never fails a row. Integers and decimals that do not parse become
//! `NULL`, empty optional text becomes `NULL`, and timestamps are handed to
//! the database verbatim and cast there. Required text columns are passed
//! through untouched so the table constraints decide what is acceptable.

use rocket_db_pools::sqlx::Postgres;
use rocket_db_pools::sqlx::query_builder::Separated;
use rust_decimal::Decimal;
use std::str::FromStr;

/// A row type the bulk loader can read from CSV and insert in batches.
pub trait LoadRecord: Sized + Send + 'static {
    /// Target table.
    const TABLE: &'static str;
    /// Column used in the `ON CONFLICT (...) DO NOTHING` clause.
    const PRIMARY_KEY: &'static str;
    /// CSV headers, identical to the table columns and in insert order.
    const COLUMNS: &'static [&'static str];

    /// Build a record from one CSV row.
    fn from_fields(fields: &mut FieldReader<'_>) -> Self;

    /// Push one placeholder per column, in [`Self::COLUMNS`] order.
    fn push_binds(self, row: &mut Separated<'_, 'static, Postgres, &'static str>);
}

/// Named access to the fields of one CSV row.
///
/// Remembers whether any non-empty numeric field had to be nulled.
pub struct FieldReader<'a> {
    columns: &'static [&'static str],
    values: &'a [&'a str],
    coerced: bool,
}

impl<'a> FieldReader<'a> {
    /// `values` must be aligned with `columns`.
    pub fn new(columns: &'static [&'static str], values: &'a [&'a str]) -> Self {
        Self {
            columns,
            values,
            coerced: false,
        }
    }

    fn raw(&self, column: &str) -> &'a str {
        self.columns
            .iter()
            .position(|candidate| *candidate == column)
            .and_then(|index| self.values.get(index).copied())
            .unwrap_or("")
    }

    /// Text passed through as-is.
    pub fn text(&self, column: &str) -> String {
        self.raw(column).to_string()
    }

    /// Text, with the empty string mapped to `None`.
    pub fn optional_text(&self, column: &str) -> Option<String> {
        let value = self.raw(column);
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    pub fn int(&mut self, column: &str) -> Option<i32> {
        let value = self.raw(column).trim();
        self.coerce(value, parse_int(value))
    }

    pub fn decimal(&mut self, column: &str) -> Option<Decimal> {
        let value = self.raw(column).trim();
        self.coerce(value, parse_decimal(value))
    }

    pub fn coerced(&self) -> bool {
        self.coerced
    }

    fn coerce<T>(&mut self, raw: &str, parsed: Option<T>) -> Option<T> {
        if parsed.is_none() && !raw.is_empty() {
            self.coerced = true;
        }
        parsed
    }
}

/// Strict integer parse after trimming; anything else is `None`.
pub fn parse_int(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok()
}

/// Plain or scientific decimal notation; anything else is `None`.
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

/// One row of `users.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub state: Option<String>,
    pub street_address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub traffic_source: Option<String>,
    pub created_at: String,
}

impl LoadRecord for CustomerRecord {
    const TABLE: &'static str = "users";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "first_name",
        "last_name",
        "email",
        "age",
        "gender",
        "state",
        "street_address",
        "postal_code",
        "city",
        "country",
        "latitude",
        "longitude",
        "traffic_source",
        "created_at",
    ];

    fn from_fields(fields: &mut FieldReader<'_>) -> Self {
        Self {
            id: fields.int("id"),
            first_name: fields.text("first_name"),
            last_name: fields.text("last_name"),
            email: fields.text("email"),
            age: fields.int("age"),
            gender: fields.optional_text("gender"),
            state: fields.optional_text("state"),
            street_address: fields.optional_text("street_address"),
            postal_code: fields.optional_text("postal_code"),
            city: fields.optional_text("city"),
            country: fields.optional_text("country"),
            latitude: fields.decimal("latitude"),
            longitude: fields.decimal("longitude"),
            traffic_source: fields.optional_text("traffic_source"),
            created_at: fields.text("created_at"),
        }
    }

    fn push_binds(self, row: &mut Separated<'_, 'static, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.first_name)
            .push_bind(self.last_name)
            .push_bind(self.email)
            .push_bind(self.age)
            .push_bind(self.gender)
            .push_bind(self.state)
            .push_bind(self.street_address)
            .push_bind(self.postal_code)
            .push_bind(self.city)
            .push_bind(self.country)
            .push_bind(self.latitude)
            .push_bind(self.longitude)
            .push_bind(self.traffic_source)
            .push_bind(self.created_at)
            .push_unseparated("::timestamptz");
    }
}

/// One row of `orders.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: Option<i32>,
    pub user_id: Option<i32>,
    pub status: String,
    pub gender: Option<String>,
    pub created_at: String,
    pub returned_at: Option<String>,
    pub shipped_at: Option<String>,
    pub delivered_at: Option<String>,
    pub num_of_item: Option<i32>,
}

impl LoadRecord for OrderRecord {
    const TABLE: &'static str = "orders";
    const PRIMARY_KEY: &'static str = "order_id";
    const COLUMNS: &'static [&'static str] = &[
        "order_id",
        "user_id",
        "status",
        "gender",
        "created_at",
        "returned_at",
        "shipped_at",
        "delivered_at",
        "num_of_item",
    ];

    fn from_fields(fields: &mut FieldReader<'_>) -> Self {
        Self {
            order_id: fields.int("order_id"),
            user_id: fields.int("user_id"),
            status: fields.text("status"),
            gender: fields.optional_text("gender"),
            created_at: fields.text("created_at"),
            returned_at: fields.optional_text("returned_at"),
            shipped_at: fields.optional_text("shipped_at"),
            delivered_at: fields.optional_text("delivered_at"),
            num_of_item: fields.int("num_of_item"),
        }
    }

    fn push_binds(self, row: &mut Separated<'_, 'static, Postgres, &'static str>) {
        row.push_bind(self.order_id)
            .push_bind(self.user_id)
            .push_bind(self.status)
            .push_bind(self.gender)
            .push_bind(self.created_at)
            .push_unseparated("::timestamptz")
            .push_bind(self.returned_at)
            .push_unseparated("::timestamptz")
            .push_bind(self.shipped_at)
            .push_unseparated("::timestamptz")
            .push_bind(self.delivered_at)
            .push_unseparated("::timestamptz")
            .push_bind(self.num_of_item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer_from(values: &[&str]) -> (CustomerRecord, bool) {
        let mut reader = FieldReader::new(CustomerRecord::COLUMNS, values);
        let record = CustomerRecord::from_fields(&mut reader);
        (record, reader.coerced())
    }

    const CUSTOMER_ROW: &[&str] = &[
        "457",
        "Timothy",
        "Bush",
        "timothybush@example.net",
        "65",
        "M",
        "Acre",
        "87620 Johnson Hills",
        "69917-400",
        "Rio Branco",
        "Brasil",
        "-9.94552478",
        "-67.83555593",
        "Search",
        "2022-07-19 13:51:00+00:00",
    ];

    #[test]
    fn parses_well_formed_customer() {
        let (record, coerced) = customer_from(CUSTOMER_ROW);
        assert!(!coerced);
        assert_eq!(record.id, Some(457));
        assert_eq!(record.age, Some(65));
        assert_eq!(record.gender.as_deref(), Some("M"));
        assert_eq!(
            record.latitude,
            Some(Decimal::from_str("-9.94552478").unwrap())
        );
        assert_eq!(record.created_at, "2022-07-19 13:51:00+00:00");
    }

    #[test]
    fn malformed_age_becomes_null() {
        let mut row = CUSTOMER_ROW.to_vec();
        row[4] = "abc";
        let (record, coerced) = customer_from(&row);

        assert!(coerced);
        assert_eq!(record.age, None);
        assert_eq!(record.first_name, "Timothy");
        assert_eq!(record.country.as_deref(), Some("Brasil"));
        assert_eq!(record.longitude, Some(Decimal::from_str("-67.83555593").unwrap()));
    }

    #[test]
    fn empty_optionals_are_null_without_counting_as_coerced() {
        let mut row = CUSTOMER_ROW.to_vec();
        row[4] = "";
        row[5] = "";
        row[11] = "";
        let (record, coerced) = customer_from(&row);

        assert!(!coerced);
        assert_eq!(record.age, None);
        assert_eq!(record.gender, None);
        assert_eq!(record.latitude, None);
    }

    #[test]
    fn integer_parse_is_strict() {
        assert_eq!(parse_int(" 42 "), Some(42));
        assert_eq!(parse_int("-3"), Some(-3));
        assert_eq!(parse_int("4.5"), None);
        assert_eq!(parse_int("12abc"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn decimal_accepts_scientific_notation() {
        assert_eq!(parse_decimal("1.5e1"), Some(Decimal::from(15)));
        assert_eq!(parse_decimal("-0.25"), Some(Decimal::from_str("-0.25").unwrap()));
        assert_eq!(parse_decimal("north"), None);
    }

    #[test]
    fn order_optional_timestamps_are_independent() {
        let values = [
            "1", "457", "Shipped", "F", "2022-01-01 00:00:00+00:00", "", "2022-01-02 00:00:00+00:00",
            "", "2",
        ];
        let mut reader = FieldReader::new(OrderRecord::COLUMNS, &values);
        let record = OrderRecord::from_fields(&mut reader);

        assert!(!reader.coerced());
        assert_eq!(record.returned_at, None);
        assert_eq!(record.shipped_at.as_deref(), Some("2022-01-02 00:00:00+00:00"));
        assert_eq!(record.delivered_at, None);
        assert_eq!(record.num_of_item, Some(2));
    }
}
