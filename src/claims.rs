//! Token payload and read-only inspection of its time-related claims.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Time-related inspection options.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct TimeOptions<F = fn() -> DateTime<Utc>> {
    /// Leeway to use when checking `exp` and `nbf` claims.
    pub leeway: Duration,
    /// Source of the current timestamps.
    pub clock_fn: F,
}

impl<F: Fn() -> DateTime<Utc>> TimeOptions<F> {
    /// Creates options based on the specified time leeway and clock function.
    pub fn new(leeway: Duration, clock_fn: F) -> Self {
        Self { leeway, clock_fn }
    }
}

impl TimeOptions {
    /// Creates options based on the specified time leeway. The clock source is [`Utc::now()`].
    #[cfg(feature = "clock")]
    pub fn from_leeway(leeway: Duration) -> Self {
        Self {
            leeway,
            clock_fn: Utc::now,
        }
    }
}

/// Uses [`Utc::now()`] as the clock source and zero leeway.
#[cfg(feature = "clock")]
impl Default for TimeOptions {
    fn default() -> Self {
        Self::from_leeway(Duration::zero())
    }
}

/// Value of the `aud` claim, which can be either a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// Single audience.
    Single(String),
    /// Multiple audiences.
    Multiple(Vec<String>),
}

impl Audience {
    /// Checks whether `audience` is one of the audiences listed in the claim.
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::Single(aud) => aud == audience,
            Self::Multiple(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Token payload.
///
/// Registered claims (see [RFC 7519]) are exposed as typed fields; all other claims are kept
/// in the [`extensions`](Self::extensions) map and are preserved unchanged when the payload
/// is re-serialized. A registered claim whose value does not have the expected type
/// (e.g., a numeric `sub` or a fractional `exp`) is not an error: it is kept in `extensions`
/// verbatim, and the corresponding typed field stays empty.
///
/// Serialization order is deterministic: registered claims go first in the order of field
/// declaration, followed by the extensions sorted by key.
///
/// If the payload JSON contains duplicate claims, the last occurrence wins.
///
/// [RFC 7519]: https://tools.ietf.org/html/rfc7519#section-4.1
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Payload {
    /// Token issuer. Renamed to `iss` for serialization.
    #[serde(rename = "iss", skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Token subject. Renamed to `sub` for serialization.
    #[serde(rename = "sub", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Intended token audience. Renamed to `aud` for serialization.
    #[serde(rename = "aud", skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,

    /// Expiration time of the token.
    #[serde(
        rename = "exp",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp"
    )]
    pub expiration: Option<DateTime<Utc>>,

    /// Minimum time at which the token is valid.
    #[serde(
        rename = "nbf",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp"
    )]
    pub not_before: Option<DateTime<Utc>>,

    /// Time of token issuance.
    #[serde(
        rename = "iat",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp"
    )]
    pub issued_at: Option<DateTime<Utc>>,

    /// Unique token identifier. Renamed to `jti` for serialization.
    #[serde(rename = "jti", skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,

    /// Claims other than the registered ones, and registered claims of unexpected types.
    /// Should not contain registered claims for which the typed field is set;
    /// otherwise, the serialized payload will contain duplicate keys.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let claims = Map::<String, Value>::deserialize(deserializer)?;
        let mut payload = Self::new();
        for (name, value) in claims {
            payload.insert_claim(name, value);
        }
        Ok(payload)
    }
}

impl Payload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `sub` claim.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self.extensions.remove("sub");
        self
    }

    /// Sets the `iss` claim.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self.extensions.remove("iss");
        self
    }

    /// Sets the `exp` claim.
    #[must_use]
    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self.extensions.remove("exp");
        self
    }

    /// Sets the `iat` claim.
    #[must_use]
    pub fn with_issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self.extensions.remove("iat");
        self
    }

    /// Adds a claim. If `name` is a registered claim and `value` has the expected type,
    /// the corresponding typed field is set instead of the extension.
    ///
    /// # Examples
    ///
    /// ```
    /// # use jwt_inspector::Payload;
    /// let payload = Payload::new()
    ///     .with_extension("sub", "alice")
    ///     .with_extension("iat", 1_516_239_022);
    /// assert_eq!(payload.subject.as_deref(), Some("alice"));
    /// assert!(payload.issued_at.is_some());
    /// assert!(payload.extensions.is_empty());
    /// ```
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert_claim(name.into(), value.into());
        self
    }

    fn insert_claim(&mut self, name: String, value: Value) {
        let is_typed = match name.as_str() {
            "iss" => set_typed(&mut self.issuer, &value, string_claim),
            "sub" => set_typed(&mut self.subject, &value, string_claim),
            "aud" => set_typed(&mut self.audience, &value, |value| {
                Audience::deserialize(value).ok()
            }),
            "exp" => set_typed(&mut self.expiration, &value, timestamp_claim),
            "nbf" => set_typed(&mut self.not_before, &value, timestamp_claim),
            "iat" => set_typed(&mut self.issued_at, &value, timestamp_claim),
            "jti" => set_typed(&mut self.token_id, &value, string_claim),
            _ => false,
        };

        if is_typed {
            self.extensions.remove(&name);
        } else {
            self.extensions.insert(name, value);
        }
    }

    /// Checks whether the token has expired at the instant `now`, i.e., `now` is strictly
    /// after the `exp` claim. A payload without `exp` never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|expiration| now > expiration)
    }

    /// Checks whether the token is not yet valid at the instant `now`, i.e., `now`
    /// is strictly before the `nbf` claim. A payload without `nbf` is always valid.
    pub fn is_not_yet_valid(&self, now: DateTime<Utc>) -> bool {
        self.not_before.is_some_and(|not_before| now < not_before)
    }

    /// Derives displayable facts about time-related claims.
    pub fn inspect<F>(&self, options: &TimeOptions<F>) -> Inspection
    where
        F: Fn() -> DateTime<Utc>,
    {
        let now = (options.clock_fn)();
        Inspection {
            expired: self.expiration.is_some_and(|expiration| {
                now > saturating_add(expiration, options.leeway)
            }),
            not_yet_valid: self.not_before.is_some_and(|not_before| {
                now < saturating_add(not_before, -options.leeway)
            }),
            expiration: self.expiration.map(|time| format_timestamp(time.timestamp())),
            not_before: self.not_before.map(|time| format_timestamp(time.timestamp())),
            issued_at: self.issued_at.map(|time| format_timestamp(time.timestamp())),
        }
    }
}

/// Sets `field` to the converted `value`. If `value` cannot be converted, the field is cleared,
/// so that the claim is only present in the extensions.
fn set_typed<T>(
    field: &mut Option<T>,
    value: &Value,
    convert: impl FnOnce(&Value) -> Option<T>,
) -> bool {
    *field = convert(value);
    field.is_some()
}

fn string_claim(value: &Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

fn timestamp_claim(value: &Value) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.as_i64()?, 0)
}

// Timestamps in a token may lie arbitrarily close to the representable range.
fn saturating_add(time: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    time.checked_add_signed(delta).unwrap_or(if delta > Duration::zero() {
        DateTime::<Utc>::MAX_UTC
    } else {
        DateTime::<Utc>::MIN_UTC
    })
}

/// Read-only facts derived from a [`Payload`] by [`Payload::inspect()`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Inspection {
    /// Whether the `exp` claim is in the past. `false` if there is no such claim.
    pub expired: bool,
    /// Whether the `nbf` claim is in the future. `false` if there is no such claim.
    pub not_yet_valid: bool,
    /// Formatted `exp` claim.
    pub expiration: Option<String>,
    /// Formatted `nbf` claim.
    pub not_before: Option<String>,
    /// Formatted `iat` claim.
    pub issued_at: Option<String>,
}

/// Formats a Unix timestamp (seconds since epoch) for display.
///
/// Timestamps outside the representable date range are rendered as the plain number.
///
/// # Examples
///
/// ```
/// # use jwt_inspector::format_timestamp;
/// assert_eq!(format_timestamp(1_516_239_022), "2018-01-18 01:30:22 UTC");
/// assert_eq!(format_timestamp(i64::MAX), "9223372036854775807");
/// ```
pub fn format_timestamp(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0).map_or_else(
        || seconds.to_string(),
        |time| time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

fn serialize_timestamp<S: Serializer>(
    time: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match time {
        Some(time) => serializer.serialize_i64(time.timestamp()),
        None => serializer.serialize_none(),
    }
}
