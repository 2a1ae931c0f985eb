//! Property database repository and search-filter builder

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Property record from database
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PropertyRecord {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub thumbnail_photo_url: String,
    pub cover_photo_url: String,
    pub cost_per_night: i64,
    pub street: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
    pub country: String,
    pub parking_spaces: i32,
    pub number_of_bathrooms: i32,
    pub number_of_bedrooms: i32,
}

/// Input for creating a property
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProperty {
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub thumbnail_photo_url: String,
    pub cover_photo_url: String,
    pub cost_per_night: i64,
    pub street: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
    pub country: String,
    pub parking_spaces: i32,
    pub number_of_bathrooms: i32,
    pub number_of_bedrooms: i32,
}

/// A property returned from search, with its review average attached
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PropertyWithRating {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub thumbnail_photo_url: String,
    pub cover_photo_url: String,
    pub cost_per_night: i64,
    pub street: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
    pub country: String,
    pub parking_spaces: i32,
    pub number_of_bathrooms: i32,
    pub number_of_bedrooms: i32,
    pub average_rating: Option<Decimal>,
}

/// Filter options for property search. All present filters apply
/// conjunctively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertySearch {
    /// Substring match against the city name
    pub city: Option<String>,
    /// Exact match on the owning user
    pub owner_id: Option<i64>,
    /// Exclusive lower price bound, in cents; only applied together with
    /// the maximum
    pub minimum_price_per_night: Option<i64>,
    /// Exclusive upper price bound, in cents; only applied together with
    /// the minimum
    pub maximum_price_per_night: Option<i64>,
    /// Inclusive lower bound on the joined review rating
    pub minimum_rating: Option<i16>,
}

/// One WHERE-clause predicate derived from the search options
#[derive(Debug, Clone, PartialEq)]
enum SearchPredicate {
    City(String),
    Owner(i64),
    PriceRange { min: i64, max: i64 },
    MinRating(i16),
}

/// A value bound to a positional placeholder
#[derive(Debug, Clone, PartialEq)]
enum BindValue {
    Text(String),
    Int(i64),
}

impl PropertySearch {
    /// Collapse the options into the predicate list, in clause order.
    /// A lone price bound yields no price predicate: the range requires
    /// both ends.
    fn predicates(&self) -> Vec<SearchPredicate> {
        let mut predicates = Vec::new();

        if let Some(city) = &self.city {
            predicates.push(SearchPredicate::City(format!("%{city}%")));
        }
        if let Some(owner_id) = self.owner_id {
            predicates.push(SearchPredicate::Owner(owner_id));
        }
        if let (Some(min), Some(max)) =
            (self.minimum_price_per_night, self.maximum_price_per_night)
        {
            predicates.push(SearchPredicate::PriceRange { min, max });
        }
        if let Some(rating) = self.minimum_rating {
            predicates.push(SearchPredicate::MinRating(rating));
        }

        predicates
    }
}

const SEARCH_SELECT: &str = "SELECT p.id, p.owner_id, p.title, p.description, \
     p.thumbnail_photo_url, p.cover_photo_url, p.cost_per_night, p.street, p.city, \
     p.province, p.post_code, p.country, p.parking_spaces, p.number_of_bathrooms, \
     p.number_of_bedrooms, avg(pr.rating) AS average_rating \
     FROM properties p \
     JOIN property_reviews pr ON p.id = pr.property_id";

/// Fold the predicate list into SQL text plus an ordered bind list. The
/// first emitted predicate introduces WHERE, every later one is appended
/// with AND; the result cap is always the final bind.
fn build_search_query(filter: &PropertySearch, limit: i64) -> (String, Vec<BindValue>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    for predicate in filter.predicates() {
        match predicate {
            SearchPredicate::City(pattern) => {
                binds.push(BindValue::Text(pattern));
                conditions.push(format!("p.city LIKE ${}", binds.len()));
            }
            SearchPredicate::Owner(owner_id) => {
                binds.push(BindValue::Int(owner_id));
                conditions.push(format!("p.owner_id = ${}", binds.len()));
            }
            SearchPredicate::PriceRange { min, max } => {
                binds.push(BindValue::Int(min));
                let min_param = binds.len();
                binds.push(BindValue::Int(max));
                conditions.push(format!(
                    "p.cost_per_night > ${} AND p.cost_per_night < ${}",
                    min_param,
                    binds.len()
                ));
            }
            SearchPredicate::MinRating(rating) => {
                binds.push(BindValue::Int(i64::from(rating)));
                conditions.push(format!("pr.rating >= ${}", binds.len()));
            }
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    binds.push(BindValue::Int(limit));
    let sql = format!(
        "{SEARCH_SELECT} {where_clause} GROUP BY p.id ORDER BY p.cost_per_night LIMIT ${}",
        binds.len()
    );

    (sql, binds)
}

pub struct PropertyRepository {
    pool: PgPool,
}

impl PropertyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Search properties matching the given filters, cheapest first,
    /// capped at `limit`
    pub async fn search(
        &self,
        filter: &PropertySearch,
        limit: i64,
    ) -> Result<Vec<PropertyWithRating>> {
        let (sql, binds) = build_search_query(filter, limit);
        tracing::debug!(sql = %sql, "Executing property search");

        let mut query = sqlx::query_as::<_, PropertyWithRating>(&sql);
        for value in &binds {
            query = match value {
                BindValue::Text(s) => query.bind(s.as_str()),
                BindValue::Int(i) => query.bind(*i),
            };
        }

        let records = query.fetch_all(&self.pool).await?;
        Ok(records)
    }

    /// Create a new property, returning the stored row
    pub async fn create(&self, input: CreateProperty) -> Result<PropertyRecord> {
        let record = sqlx::query_as::<_, PropertyRecord>(
            r#"
            INSERT INTO properties (
                owner_id, title, description, thumbnail_photo_url, cover_photo_url,
                cost_per_night, street, city, province, post_code, country,
                parking_spaces, number_of_bathrooms, number_of_bedrooms
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, owner_id, title, description, thumbnail_photo_url, cover_photo_url,
                      cost_per_night, street, city, province, post_code, country,
                      parking_spaces, number_of_bathrooms, number_of_bedrooms
            "#,
        )
        .bind(input.owner_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.thumbnail_photo_url)
        .bind(&input.cover_photo_url)
        .bind(input.cost_per_night)
        .bind(&input.street)
        .bind(&input.city)
        .bind(&input.province)
        .bind(&input.post_code)
        .bind(&input.country)
        .bind(input.parking_spaces)
        .bind(input.number_of_bathrooms)
        .bind(input.number_of_bedrooms)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_filters_emits_no_where_clause() {
        let (sql, binds) = build_search_query(&PropertySearch::default(), 10);

        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with("GROUP BY p.id ORDER BY p.cost_per_night LIMIT $1"));
        assert_eq!(binds, vec![BindValue::Int(10)]);
    }

    #[test]
    fn test_city_introduces_where_and_owner_joins_with_and() {
        let filter = PropertySearch {
            city: Some("van".into()),
            owner_id: Some(3),
            ..Default::default()
        };
        let (sql, binds) = build_search_query(&filter, 10);

        assert!(sql.contains("WHERE p.city LIKE $1 AND p.owner_id = $2"));
        assert!(sql.ends_with("LIMIT $3"));
        assert_eq!(
            binds,
            vec![
                BindValue::Text("%van%".into()),
                BindValue::Int(3),
                BindValue::Int(10),
            ]
        );
    }

    #[test]
    fn test_owner_alone_introduces_where() {
        let filter = PropertySearch {
            owner_id: Some(7),
            ..Default::default()
        };
        let (sql, binds) = build_search_query(&filter, 10);

        assert!(sql.contains("WHERE p.owner_id = $1"));
        assert_eq!(binds, vec![BindValue::Int(7), BindValue::Int(10)]);
    }

    #[test]
    fn test_lone_minimum_price_applies_no_price_filter() {
        let filter = PropertySearch {
            minimum_price_per_night: Some(50),
            ..Default::default()
        };

        assert_matches!(filter.predicates().as_slice(), []);

        let (sql, binds) = build_search_query(&filter, 10);
        assert!(!sql.contains("WHERE"));
        assert_eq!(binds, vec![BindValue::Int(10)]);
    }

    #[test]
    fn test_lone_maximum_price_applies_no_price_filter() {
        let filter = PropertySearch {
            maximum_price_per_night: Some(200),
            ..Default::default()
        };

        assert_matches!(filter.predicates().as_slice(), []);
    }

    #[test]
    fn test_price_range_uses_exclusive_bounds_min_first() {
        let filter = PropertySearch {
            minimum_price_per_night: Some(50),
            maximum_price_per_night: Some(200),
            ..Default::default()
        };

        assert_matches!(
            filter.predicates().as_slice(),
            [SearchPredicate::PriceRange { min: 50, max: 200 }]
        );

        let (sql, binds) = build_search_query(&filter, 10);
        assert!(sql.contains("WHERE p.cost_per_night > $1 AND p.cost_per_night < $2"));
        assert_eq!(
            binds,
            vec![BindValue::Int(50), BindValue::Int(200), BindValue::Int(10)]
        );
    }

    #[test]
    fn test_minimum_rating_is_inclusive() {
        let filter = PropertySearch {
            minimum_rating: Some(4),
            ..Default::default()
        };
        let (sql, binds) = build_search_query(&filter, 10);

        assert!(sql.contains("WHERE pr.rating >= $1"));
        assert_eq!(binds, vec![BindValue::Int(4), BindValue::Int(10)]);
    }

    #[test]
    fn test_all_filters_emit_in_clause_order_with_limit_last() {
        let filter = PropertySearch {
            city: Some("van".into()),
            owner_id: Some(3),
            minimum_price_per_night: Some(50),
            maximum_price_per_night: Some(200),
            minimum_rating: Some(4),
        };
        let (sql, binds) = build_search_query(&filter, 25);

        assert!(sql.contains(
            "WHERE p.city LIKE $1 AND p.owner_id = $2 \
             AND p.cost_per_night > $3 AND p.cost_per_night < $4 \
             AND pr.rating >= $5"
        ));
        assert!(sql.ends_with("LIMIT $6"));
        assert_eq!(
            binds,
            vec![
                BindValue::Text("%van%".into()),
                BindValue::Int(3),
                BindValue::Int(50),
                BindValue::Int(200),
                BindValue::Int(4),
                BindValue::Int(25),
            ]
        );
    }

    #[test]
    fn test_placeholder_count_matches_bind_count() {
        let filter = PropertySearch {
            city: Some("Toronto".into()),
            minimum_price_per_night: Some(100),
            maximum_price_per_night: Some(300),
            ..Default::default()
        };
        let (sql, binds) = build_search_query(&filter, 10);

        for n in 1..=binds.len() {
            assert!(sql.contains(&format!("${n}")));
        }
        assert!(!sql.contains(&format!("${}", binds.len() + 1)));
    }
}
