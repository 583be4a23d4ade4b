//! Schema-driven XML-to-attribute mapping
//!
//! The service returns the same handful of record shapes over and over: a
//! search-level series record, a full series record, an episode record,
//! an actor record and a banner record. Each shape is described by a
//! [`Schema`] listing the known fields and their types; [`map_element`]
//! converts one parsed element into an [`AttributeBag`] according to that
//! schema.
//!
//! Absent data is the norm in the source service, so conversion is
//! forgiving: numeric and date fields with empty or malformed text are
//! simply left unhydrated rather than raising an error.

use crate::attributes::{AttributeBag, AttributeValue};
use crate::xmltree::Element;
use chrono::NaiveDate;
use tracing::debug;

/// The type a schema assigns to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Free text
    Text,
    /// Whole number
    Int,
    /// Decimal number
    Float,
    /// `YYYY-MM-DD` date
    Date,
    /// Pipe-separated list of strings
    TextList,
}

/// The known fields of one record shape, in service document order.
#[derive(Debug)]
pub struct Schema {
    /// Entity kind the schema belongs to, used in error messages
    pub kind: &'static str,
    /// `(field name, type)` pairs
    pub fields: &'static [(&'static str, FieldType)],
}

impl Schema {
    /// Looks up the declared type of a field.
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, ty)| *ty)
    }

    /// True if the field belongs to this record shape, regardless of
    /// whether a particular document carried it. `ignore_case` matches the
    /// lookup mode of the owning entity's bag.
    pub fn knows(&self, name: &str, ignore_case: bool) -> bool {
        if ignore_case {
            self.fields
                .iter()
                .any(|(field, _)| field.eq_ignore_ascii_case(name))
        } else {
            self.fields.iter().any(|(field, _)| *field == name)
        }
    }
}

/// Fields of one `<Series>` element in a search response.
pub static SHOW_SEARCH_SCHEMA: Schema = Schema {
    kind: "Show",
    fields: &[
        ("id", FieldType::Int),
        ("seriesid", FieldType::Int),
        ("language", FieldType::Text),
        ("SeriesName", FieldType::Text),
        ("AliasNames", FieldType::TextList),
        ("banner", FieldType::Text),
        ("Overview", FieldType::Text),
        ("FirstAired", FieldType::Date),
        ("Network", FieldType::Text),
        ("IMDB_ID", FieldType::Text),
        ("zap2it_id", FieldType::Text),
    ],
};

/// Fields of the `<Series>` element in a full series document.
pub static SHOW_FULL_SCHEMA: Schema = Schema {
    kind: "Show",
    fields: &[
        ("id", FieldType::Int),
        ("Actors", FieldType::TextList),
        ("Airs_DayOfWeek", FieldType::Text),
        ("Airs_Time", FieldType::Text),
        ("ContentRating", FieldType::Text),
        ("FirstAired", FieldType::Date),
        ("Genre", FieldType::TextList),
        ("IMDB_ID", FieldType::Text),
        ("Language", FieldType::Text),
        ("Network", FieldType::Text),
        ("NetworkID", FieldType::Text),
        ("Overview", FieldType::Text),
        ("Rating", FieldType::Float),
        ("RatingCount", FieldType::Int),
        ("Runtime", FieldType::Int),
        ("SeriesID", FieldType::Int),
        ("SeriesName", FieldType::Text),
        ("Status", FieldType::Text),
        ("added", FieldType::Text),
        ("addedBy", FieldType::Text),
        ("banner", FieldType::Text),
        ("fanart", FieldType::Text),
        ("lastupdated", FieldType::Int),
        ("poster", FieldType::Text),
        ("zap2it_id", FieldType::Text),
    ],
};

/// Fields of one `<Episode>` element.
pub static EPISODE_SCHEMA: Schema = Schema {
    kind: "Episode",
    fields: &[
        ("id", FieldType::Int),
        ("Combined_episodenumber", FieldType::Float),
        ("Combined_season", FieldType::Int),
        ("DVD_chapter", FieldType::Text),
        ("DVD_discid", FieldType::Text),
        ("DVD_episodenumber", FieldType::Float),
        ("DVD_season", FieldType::Text),
        ("Director", FieldType::TextList),
        ("EpImgFlag", FieldType::Text),
        ("EpisodeName", FieldType::Text),
        ("EpisodeNumber", FieldType::Int),
        ("FirstAired", FieldType::Date),
        ("GuestStars", FieldType::TextList),
        ("IMDB_ID", FieldType::Text),
        ("Language", FieldType::Text),
        ("Overview", FieldType::Text),
        ("ProductionCode", FieldType::Text),
        ("Rating", FieldType::Float),
        ("RatingCount", FieldType::Int),
        ("SeasonNumber", FieldType::Int),
        ("Writer", FieldType::TextList),
        ("absolute_number", FieldType::Int),
        ("filename", FieldType::Text),
        ("lastupdated", FieldType::Int),
        ("seasonid", FieldType::Int),
        ("seriesid", FieldType::Int),
    ],
};

/// Fields of one `<Actor>` element in the actors document.
pub static ACTOR_SCHEMA: Schema = Schema {
    kind: "Actor",
    fields: &[
        ("id", FieldType::Int),
        ("Image", FieldType::Text),
        ("Name", FieldType::Text),
        ("Role", FieldType::Text),
        ("SortOrder", FieldType::Int),
    ],
};

/// Fields of one `<Banner>` element in the banners document.
pub static BANNER_SCHEMA: Schema = Schema {
    kind: "Banner",
    fields: &[
        ("id", FieldType::Int),
        ("BannerPath", FieldType::Text),
        ("BannerType", FieldType::Text),
        ("BannerType2", FieldType::Text),
        ("Colors", FieldType::Text),
        ("Language", FieldType::Text),
        ("Rating", FieldType::Float),
        ("RatingCount", FieldType::Int),
        ("Season", FieldType::Text),
        ("ThumbnailPath", FieldType::Text),
        ("VignettePath", FieldType::Text),
    ],
};

/// Converts one parsed element into an attribute bag according to `schema`.
///
/// Conversion rules per field type:
///
/// * `Int`/`Float`: empty, missing or unparseable text leaves the field
///   unhydrated; it never defaults to zero.
/// * `Date`: `YYYY-MM-DD`; malformed or empty text leaves the field
///   unhydrated.
/// * `TextList`: split on `|`, empty entries discarded. An element with no
///   text at all still sets an empty list, so "known empty" stays
///   distinguishable from "unknown".
/// * `Text`: the trimmed text; elements without text are skipped.
///
/// Child elements the schema does not list are carried through as text so
/// fields the service added later remain reachable via the generic
/// attribute access.
pub fn map_element(element: &Element, schema: &Schema, ignore_case: bool) -> AttributeBag {
    let mut bag = AttributeBag::new(ignore_case);

    for child in element.children() {
        let name = child.name();
        let text = child.text();

        match schema.field_type(name) {
            Some(FieldType::Int) => {
                if let Some(value) = text.and_then(parse_int) {
                    bag.set(name, AttributeValue::Int(value));
                }
            }
            Some(FieldType::Float) => {
                if let Some(value) = text.and_then(parse_float) {
                    bag.set(name, AttributeValue::Float(value));
                }
            }
            Some(FieldType::Date) => {
                if let Some(value) = text.and_then(parse_date) {
                    bag.set(name, AttributeValue::Date(value));
                }
            }
            Some(FieldType::TextList) => {
                bag.set(name, AttributeValue::List(split_list(text.unwrap_or(""))));
            }
            Some(FieldType::Text) => {
                if let Some(text) = text {
                    bag.set(name, AttributeValue::Text(text.to_string()));
                }
            }
            None => {
                // Field the schema does not model yet
                if let Some(text) = text {
                    debug!(field = name, kind = schema.kind, "unmodelled service field");
                    bag.set(name, AttributeValue::Text(text.to_string()));
                }
            }
        }
    }

    bag
}

fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse().ok()
}

fn parse_float(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse().ok()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

fn split_list(text: &str) -> Vec<String> {
    text.split('|')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
