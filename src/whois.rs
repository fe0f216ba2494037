//! Extracts registration dates from raw WHOIS replies.
//!
//! Registries do not agree on a format, so extraction is driven by an
//! ordered table of line-anchored patterns. Each pattern maps a label
//! variant to one of the date fields of [`WhoisRecord`]. Supporting a new
//! registry means appending rows to [`RULES`], nothing else.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Date attributes a WHOIS rule can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Created,
  Updated,
  Expires,
}

/// Offsets in seconds east of UTC.
const UTC: i32 = 0;
const CHINA: i32 = 8 * 3600;
const JAPAN: i32 = 9 * 3600;

/// `(label pattern, field, zone)` rows, evaluated in order against every
/// line.
///
/// Patterns are matched against the trimmed line and must capture the
/// value in group 1. The zone applies to values that carry no offset or
/// zone word of their own.
const RULES: &[(&str, Field, i32)] = &[
  // ICANN gTLD registries and registrars
  (r"^Creation Date\s*:\s*(.+)$", Field::Created, UTC),
  (r"^Updated Date\s*:\s*(.+)$", Field::Updated, UTC),
  (r"^Registry Expiry Date\s*:\s*(.+)$", Field::Expires, UTC),
  (r"^Registrar Registration Expiration Date\s*:\s*(.+)$", Field::Expires, UTC),
  // Generic wording used by many ccTLDs
  (r"^(?:Created On|Created|Registered On|Registered|Registration Date|Domain Registration Date)\s*:\s*(.+)$", Field::Created, UTC),
  (r"^(?:Last Updated On|Last Updated|Last Modified|Last-Modified|Modified|Changed|Updated)\s*:\s*(.+)$", Field::Updated, UTC),
  (r"^(?:Expiration Date|Expiry Date|Expires On|Expire Date|Expires|Renewal Date|Domain Expiration Date)\s*:\s*(.+)$", Field::Expires, UTC),
  // RIPN (.ru, .su)
  (r"^paid-till\s*:\s*(.+)$", Field::Expires, UTC),
  (r"^free-date\s*:\s*(.+)$", Field::Expires, UTC),
  // CNNIC (.cn), Beijing time
  (r"^Registration Time\s*:\s*(.+)$", Field::Created, CHINA),
  (r"^Expiration Time\s*:\s*(.+)$", Field::Expires, CHINA),
  // JPRS (.jp), Japan time
  (r"^\[(?:Created on|登録年月日)\]\s*(.+)$", Field::Created, JAPAN),
  (r"^\[(?:Last Updated|最終更新)\]\s*(.+)$", Field::Updated, JAPAN),
  (r"^\[(?:Expires on|有効期限)\]\s*(.+)$", Field::Expires, JAPAN),
];

/// Lines that never carry data: comments, banners and legal notices.
static RE_IGNORE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(?:%|#|>>>|NOTE:)").unwrap());

static COMPILED_RULES: LazyLock<Vec<(Regex, Field, i32)>> =
  LazyLock::new(|| {
    RULES
      .iter()
      .map(|(pattern, field, zone)| {
        (Regex::new(&format!("(?i){pattern}")).unwrap(), *field, *zone)
      })
      .collect()
  });

/// Timestamp layouts carrying a time of day.
const DATETIME_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S",
  "%Y/%m/%d %H:%M:%S",
  "%d-%b-%Y %H:%M:%S",
  "%d.%m.%Y %H:%M:%S",
];

/// Date-only layouts, interpreted as midnight in the value's zone.
const DATE_FORMATS: &[&str] = &[
  "%Y-%m-%d",
  "%d-%b-%Y",
  "%d-%B-%Y",
  "%d %b %Y",
  "%Y.%m.%d",
  "%Y. %m. %d.",
  "%Y/%m/%d",
  "%d.%m.%Y",
  "%d/%m/%Y",
  "%b %d %Y",
  "%Y%m%d",
];

/// Trailing zone words and the offset each one stands for.
///
/// `CST` names both China Standard Time and US Central Standard Time, so
/// it maps to `None` and the rule's own zone is used instead.
const ZONE_WORDS: &[(&str, Option<i32>)] = &[
  ("UTC", Some(UTC)),
  ("(UTC)", Some(UTC)),
  ("GMT", Some(UTC)),
  ("(GMT)", Some(UTC)),
  ("Z", Some(UTC)),
  ("JST", Some(JAPAN)),
  ("(JST)", Some(JAPAN)),
  ("CST", None),
  ("(CST)", None),
];

/// Structured view of a WHOIS reply.
///
/// A date is `None` when none of the known label variants matched a
/// parseable value. `raw_lines` always holds the reply verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoisRecord {
  pub creation_date: Option<DateTime<Utc>>,
  pub updated_date: Option<DateTime<Utc>>,
  pub registry_expiry_date: Option<DateTime<Utc>>,
  pub raw_lines: Vec<String>,
}

impl WhoisRecord {
  /// Whether any date could be recognised at all.
  #[must_use]
  pub const fn has_dates(&self) -> bool {
    self.creation_date.is_some()
      || self.updated_date.is_some()
      || self.registry_expiry_date.is_some()
  }

  /// The original reply, joined back with `\n`.
  #[must_use]
  pub fn original(&self) -> String {
    self.raw_lines.join("\n")
  }

  fn slot(&mut self, field: Field) -> &mut Option<DateTime<Utc>> {
    match field {
      Field::Created => &mut self.creation_date,
      Field::Updated => &mut self.updated_date,
      Field::Expires => &mut self.registry_expiry_date,
    }
  }
}

/// Parses a raw WHOIS reply into a [`WhoisRecord`].
///
/// Never fails: unknown layouts simply produce a record with no dates. For
/// every field the first line that yields a parseable date wins.
#[must_use]
pub fn extract(raw: &str) -> WhoisRecord {
  let normalized = raw.replace("\r\n", "\n");
  let mut record = WhoisRecord {
    raw_lines: normalized.split('\n').map(str::to_owned).collect(),
    ..WhoisRecord::default()
  };

  for line in normalized.lines() {
    let line = line.trim();
    if line.is_empty() || RE_IGNORE.is_match(line) {
      continue;
    }
    for (re, field, zone) in COMPILED_RULES.iter() {
      if record.slot(*field).is_some() {
        continue;
      }
      let Some(value) = re.captures(line).and_then(|c| c.get(1)) else {
        continue;
      };
      if let Some(date) = parse_date_in(value.as_str(), *zone) {
        *record.slot(*field) = Some(date);
        break;
      }
    }
  }

  record
}

/// Parses one of the textual date layouts registries are known to use.
///
/// Values without an offset or a zone word are read as UTC.
#[must_use]
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
  parse_date_in(value, UTC)
}

/// Like [`parse_date`], but reads zone-less values at `default_zone`
/// seconds east of UTC.
fn parse_date_in(value: &str, default_zone: i32) -> Option<DateTime<Utc>> {
  let (cleaned, zone) = split_zone_word(value.trim());
  if cleaned.is_empty() {
    return None;
  }

  if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
    return Some(dt.with_timezone(&Utc));
  }
  if let Ok(dt) = DateTime::parse_from_str(cleaned, "%Y-%m-%dT%H:%M:%S%.f%z")
  {
    return Some(dt.with_timezone(&Utc));
  }

  let offset = FixedOffset::east_opt(zone.unwrap_or(default_zone))?;
  DATETIME_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
    .or_else(|| {
      DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
    .and_then(|dt| dt.and_local_timezone(offset).single())
    .map(|dt| dt.with_timezone(&Utc))
}

/// Splits a trailing zone word such as `JST` or `(UTC)` off `value`.
fn split_zone_word(value: &str) -> (&str, Option<i32>) {
  value
    .rsplit_once(char::is_whitespace)
    .and_then(|(head, word)| {
      ZONE_WORDS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(word))
        .map(|(_, zone)| (head.trim_end(), *zone))
    })
    .unwrap_or((value, None))
}
