//! Session selection
//!
//! Sessions of an experiment are selected by subject and by a `when`
//! criterion: session numbers or start dates, either as an exact set or as an
//! inclusive range with an open start and/or end.

use crate::session::Session;
use crate::types::{QueryError, SubjectId};
use chrono::NaiveDate;
use std::str::FromStr;

/// Date format accepted in selections
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which subjects to select sessions from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubjectSelector {
    /// Every subject in the experiment
    #[default]
    All,
    /// Only the listed subjects
    Ids(Vec<SubjectId>),
}

impl SubjectSelector {
    /// Check whether a subject is selected
    pub fn contains(&self, subject_id: &SubjectId) -> bool {
        match self {
            SubjectSelector::All => true,
            SubjectSelector::Ids(ids) => ids.contains(subject_id),
        }
    }
}

impl From<SubjectId> for SubjectSelector {
    fn from(id: SubjectId) -> Self {
        SubjectSelector::Ids(vec![id])
    }
}

impl From<Vec<SubjectId>> for SubjectSelector {
    fn from(ids: Vec<SubjectId>) -> Self {
        SubjectSelector::Ids(ids)
    }
}

/// Which sessions of the selected subjects to return
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum When {
    /// Every session
    #[default]
    All,
    /// Sessions with one of these numbers
    Numbers(Vec<u32>),
    /// Sessions started on one of these dates
    Dates(Vec<NaiveDate>),
    /// Sessions numbered within an inclusive range
    NumberRange { start: Option<u32>, end: Option<u32> },
    /// Sessions started within an inclusive date range
    DateRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

/// One element of a loosely typed selection list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhenItem {
    /// A session number
    Number(u32),
    /// A date string, `YYYY-MM-DD`
    Date(String),
    /// Open end of a range
    Open,
}

impl When {
    /// Check whether a session satisfies the criterion
    ///
    /// Sessions without a number never match a number criterion.
    pub fn matches(&self, session: &Session) -> bool {
        match self {
            When::All => true,
            When::Numbers(numbers) => session.number().is_some_and(|n| numbers.contains(&n)),
            When::Dates(dates) => dates.contains(&session.date()),
            When::NumberRange { start, end } => session
                .number()
                .is_some_and(|n| within(n, *start, *end)),
            When::DateRange { start, end } => within(session.date(), *start, *end),
        }
    }

    /// Build a criterion from a selection list
    ///
    /// Ranges take the forms `[Open, end]`, `[start, Open]` and
    /// `[start, Open, end]`, with both endpoints of the same type. Lists
    /// without `Open` must be all numbers or all dates.
    pub fn from_items(items: &[WhenItem]) -> Result<Self, QueryError> {
        let opens = items.iter().filter(|i| **i == WhenItem::Open).count();

        match (items, opens) {
            ([], _) => Err(QueryError::UnsupportedShape("empty selection".to_string())),
            (_, 0) => Self::exact(items),
            ([WhenItem::Open, end], 1) => Self::range(None, Some(end)),
            ([start, WhenItem::Open], 1) => Self::range(Some(start), None),
            ([start, WhenItem::Open, end], 1) => Self::range(Some(start), Some(end)),
            _ => Err(QueryError::UnsupportedShape(format!(
                "open range marker must be first, last or between two endpoints: {:?}",
                items
            ))),
        }
    }

    fn exact(items: &[WhenItem]) -> Result<Self, QueryError> {
        match &items[0] {
            WhenItem::Number(_) => items
                .iter()
                .map(|item| match item {
                    WhenItem::Number(n) => Ok(*n),
                    _ => Err(QueryError::MixedTypes),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(When::Numbers),
            WhenItem::Date(_) => items
                .iter()
                .map(|item| match item {
                    WhenItem::Date(d) => parse_date(d),
                    _ => Err(QueryError::MixedTypes),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(When::Dates),
            WhenItem::Open => Err(QueryError::UnsupportedShape("open marker".to_string())),
        }
    }

    fn range(start: Option<&WhenItem>, end: Option<&WhenItem>) -> Result<Self, QueryError> {
        match (start, end) {
            (Some(WhenItem::Number(_)), Some(WhenItem::Date(_)))
            | (Some(WhenItem::Date(_)), Some(WhenItem::Number(_))) => {
                Err(QueryError::MismatchedRangeTypes)
            }
            (Some(WhenItem::Number(_)), _) | (_, Some(WhenItem::Number(_))) => Ok(When::NumberRange {
                start: start.and_then(as_number),
                end: end.and_then(as_number),
            }),
            _ => Ok(When::DateRange {
                start: start.map(as_date).transpose()?.flatten(),
                end: end.map(as_date).transpose()?.flatten(),
            }),
        }
    }
}

impl From<u32> for When {
    fn from(number: u32) -> Self {
        When::Numbers(vec![number])
    }
}

impl From<NaiveDate> for When {
    fn from(date: NaiveDate) -> Self {
        When::Dates(vec![date])
    }
}

impl FromStr for When {
    type Err = QueryError;

    /// Parse `all`, `5`, `2017-07-07`, `3,5,8`, `...,10`, `5,...`,
    /// `5,...,10` or the date equivalents
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(When::All);
        }

        let items: Vec<WhenItem> = s.split(',').map(|part| parse_item(part.trim())).collect();
        When::from_items(&items)
    }
}

fn parse_item(part: &str) -> WhenItem {
    if part == "..." {
        WhenItem::Open
    } else if let Ok(n) = part.parse::<u32>() {
        WhenItem::Number(n)
    } else {
        WhenItem::Date(part.to_string())
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| QueryError::InvalidDate(raw.to_string()))
}

fn as_number(item: &WhenItem) -> Option<u32> {
    match item {
        WhenItem::Number(n) => Some(*n),
        _ => None,
    }
}

fn as_date(item: &WhenItem) -> Result<Option<NaiveDate>, QueryError> {
    match item {
        WhenItem::Date(d) => parse_date(d).map(Some),
        _ => Ok(None),
    }
}

fn within<T: PartialOrd>(value: T, start: Option<T>, end: Option<T>) -> bool {
    start.map_or(true, |s| s <= value) && end.map_or(true, |e| value <= e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_number_ranges() {
        use WhenItem::*;

        assert_eq!(
            When::from_items(&[Open, Number(5)]).unwrap(),
            When::NumberRange { start: None, end: Some(5) }
        );
        assert_eq!(
            When::from_items(&[Number(5), Open]).unwrap(),
            When::NumberRange { start: Some(5), end: None }
        );
        assert_eq!(
            When::from_items(&[Number(5), Open, Number(10)]).unwrap(),
            When::NumberRange { start: Some(5), end: Some(10) }
        );
    }

    #[test]
    fn test_date_range() {
        let when = When::from_items(&[
            WhenItem::Date("2017-07-01".to_string()),
            WhenItem::Open,
            WhenItem::Date("2017-07-07".to_string()),
        ])
        .unwrap();

        assert_eq!(
            when,
            When::DateRange {
                start: Some(date("2017-07-01")),
                end: Some(date("2017-07-07")),
            }
        );
    }

    #[test]
    fn test_mismatched_range_endpoints() {
        let result = When::from_items(&[
            WhenItem::Number(1),
            WhenItem::Open,
            WhenItem::Date("2020-01-01".to_string()),
        ]);
        assert_eq!(result, Err(QueryError::MismatchedRangeTypes));
    }

    #[test]
    fn test_mixed_exact_list() {
        let result = When::from_items(&[WhenItem::Number(1), WhenItem::Date("2020-01-01".to_string())]);
        assert_eq!(result, Err(QueryError::MixedTypes));

        let result = When::from_items(&[WhenItem::Date("2020-01-01".to_string()), WhenItem::Number(1)]);
        assert_eq!(result, Err(QueryError::MixedTypes));
    }

    #[test]
    fn test_unsupported_shapes() {
        use WhenItem::*;

        for items in [
            vec![],
            vec![Open],
            vec![Open, Open],
            vec![Open, Number(1), Number(2)],
            vec![Number(1), Number(2), Open],
            vec![Number(1), Open, Number(2), Number(3)],
        ] {
            assert!(
                matches!(When::from_items(&items), Err(QueryError::UnsupportedShape(_))),
                "accepted {:?}",
                items
            );
        }
    }

    #[test]
    fn test_invalid_date() {
        let result = When::from_items(&[WhenItem::Date("07/07/2017".to_string())]);
        assert_eq!(result, Err(QueryError::InvalidDate("07/07/2017".to_string())));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("all".parse::<When>().unwrap(), When::All);
        assert_eq!("3".parse::<When>().unwrap(), When::Numbers(vec![3]));
        assert_eq!("3, 5,8".parse::<When>().unwrap(), When::Numbers(vec![3, 5, 8]));
        assert_eq!(
            "...,10".parse::<When>().unwrap(),
            When::NumberRange { start: None, end: Some(10) }
        );
        assert_eq!(
            "2017-07-07".parse::<When>().unwrap(),
            When::Dates(vec![date("2017-07-07")])
        );
        assert_eq!(
            "2017-07-01,...".parse::<When>().unwrap(),
            When::DateRange { start: Some(date("2017-07-01")), end: None }
        );
        assert_eq!(
            "1,...,2020-01-01".parse::<When>(),
            Err(QueryError::MismatchedRangeTypes)
        );
    }

    #[test]
    fn test_within_bounds() {
        assert!(within(5, None, Some(5)));
        assert!(!within(6, None, Some(5)));
        assert!(within(5, Some(5), None));
        assert!(!within(4, Some(5), Some(10)));
        assert!(within(7, None, None));
    }

    #[test]
    fn test_subject_selector() {
        let selector = SubjectSelector::from(SubjectId::Int(3));
        assert!(selector.contains(&SubjectId::Int(3)));
        assert!(!selector.contains(&SubjectId::Int(4)));
        assert!(SubjectSelector::All.contains(&SubjectId::Int(4)));
    }
}
