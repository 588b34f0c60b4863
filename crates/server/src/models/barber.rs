//! Barber listing types.

use serde::{Deserialize, Serialize};

use barberbook_core::BarberId;

/// Number of barbers per page of filtered results.
pub const PAGE_SIZE: u32 = 3;

/// A barber as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Barber {
    pub id: BarberId,
    pub name: String,
    pub basic_info: String,
    /// Price in whole currency units.
    pub price: i32,
    pub experience: String,
    pub status: String,
    pub image_path: String,
}

/// Sort order accepted by the filtered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarberSort {
    Name,
    Price,
}

impl BarberSort {
    /// Unknown values are ignored rather than rejected.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "name" => Some(Self::Name),
            "price" => Some(Self::Price),
            _ => None,
        }
    }
}

/// Raw query string of `GET /filtered-barbers`.
#[derive(Debug, Default, Deserialize)]
pub struct BarberFilterQuery {
    pub status: Option<String>,
    pub experience: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

/// Normalized listing filter. Empty strings mean "no filter".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarberFilter {
    pub status: Option<String>,
    pub experience: Option<String>,
    pub sort: Option<BarberSort>,
    /// 1-based page number.
    pub page: u32,
}

impl BarberFilter {
    /// Row offset of the first barber on this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(PAGE_SIZE)
    }
}

impl From<BarberFilterQuery> for BarberFilter {
    fn from(query: BarberFilterQuery) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        let page = query
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|&p| p >= 1)
            .unwrap_or(1);

        Self {
            status: non_empty(query.status),
            experience: non_empty(query.experience),
            sort: query.sort.as_deref().and_then(BarberSort::parse),
            page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>) -> BarberFilterQuery {
        BarberFilterQuery {
            page: page.map(str::to_owned),
            ..BarberFilterQuery::default()
        }
    }

    #[test]
    fn test_page_defaults_to_first() {
        assert_eq!(BarberFilter::from(query(None)).page, 1);
        assert_eq!(BarberFilter::from(query(Some("0"))).page, 1);
        assert_eq!(BarberFilter::from(query(Some("-2"))).page, 1);
        assert_eq!(BarberFilter::from(query(Some("two"))).page, 1);
        assert_eq!(BarberFilter::from(query(Some("4"))).page, 4);
    }

    #[test]
    fn test_offset_uses_page_size() {
        assert_eq!(BarberFilter::from(query(Some("1"))).offset(), 0);
        assert_eq!(BarberFilter::from(query(Some("3"))).offset(), 6);
    }

    #[test]
    fn test_empty_filters_are_dropped() {
        let filter = BarberFilter::from(BarberFilterQuery {
            status: Some(String::new()),
            experience: Some("senior".to_string()),
            sort: Some("rating".to_string()),
            page: None,
        });
        assert_eq!(filter.status, None);
        assert_eq!(filter.experience.as_deref(), Some("senior"));
        assert_eq!(filter.sort, None);
    }

    #[test]
    fn test_barber_serializes_camel_case() {
        let barber = Barber {
            id: BarberId::new(1),
            name: "Sam".to_string(),
            basic_info: "Fades".to_string(),
            price: 25,
            experience: "senior".to_string(),
            status: "available".to_string(),
            image_path: "/img/sam.jpg".to_string(),
        };
        let json = serde_json::to_value(&barber).unwrap_or_default();
        assert_eq!(json["basicInfo"], "Fades");
        assert_eq!(json["imagePath"], "/img/sam.jpg");
        assert_eq!(json["price"], 25);
    }
}
