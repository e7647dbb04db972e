//! Queries across the app-store catalog tables.
//!
//! Expected values are those of the stage `03` dataset.

use std::time::Duration;

use crate::row;

use super::{case::QueryCase, suite::Suite};

pub const SOURCE_STAGE: &str = "03";
pub const DESTINATION_STAGE: &str = "04";

pub const FREE_APPS_QUERY: &str = "SELECT COUNT(DISTINCT apps.id) as count
    FROM apps
    JOIN apps_pricing_plans ON apps.id = apps_pricing_plans.app_id
    JOIN pricing_plans ON apps_pricing_plans.pricing_plan_id = pricing_plans.id
    WHERE pricing_plans.price = 'Free' OR pricing_plans.price = 'Free to install';";

pub const TOP_CATEGORIES_QUERY: &str = "SELECT COUNT(*) as count, categories.title as category
    FROM apps_categories
    JOIN categories ON apps_categories.category_id = categories.id
    GROUP BY categories.title
    ORDER BY count DESC
    LIMIT 3;";

pub const TOP_PRICES_QUERY: &str = "SELECT COUNT(*) as count,
        '$' || CASE
            WHEN price_num = CAST(price_num as INTEGER)
            THEN CAST(price_num as INTEGER)
            ELSE price_num
        END || '/month' as price,
        price_num as casted_price
    FROM (
        SELECT apps_pricing_plans.app_id,
               CAST(REPLACE(REPLACE(pricing_plans.price, '$', ''), '/month', '') as REAL) as price_num
        FROM apps_pricing_plans
        JOIN pricing_plans ON apps_pricing_plans.pricing_plan_id = pricing_plans.id
    ) as subquery
    WHERE price_num BETWEEN 5 AND 10
    GROUP BY price_num
    ORDER BY count DESC
    LIMIT 3;";

pub fn queries_across_tables(case_timeout: Duration) -> Suite {
    Suite::new(
        "Queries Across Tables",
        SOURCE_STAGE,
        DESTINATION_STAGE,
        case_timeout,
    )
    .case(QueryCase::single_row(
        "count of apps which have free pricing plan",
        FREE_APPS_QUERY,
        row! { "count" => 1112 },
    ))
    .case(QueryCase::rows(
        "top 3 most common categories",
        TOP_CATEGORIES_QUERY,
        vec![
            row! { "count" => 1193, "category" => "Store design" },
            row! { "count" => 723, "category" => "Sales and conversion optimization" },
            row! { "count" => 629, "category" => "Marketing" },
        ],
    ))
    .case(QueryCase::rows(
        "top 3 prices by appearance in apps in the $5 to $10 range",
        TOP_PRICES_QUERY,
        vec![
            row! { "count" => 225, "price" => "$9.99/month", "casted_price" => 9.99 },
            row! { "count" => 135, "price" => "$5/month", "casted_price" => 5.0 },
            row! { "count" => 114, "price" => "$10/month", "casted_price" => 10.0 },
        ],
    ))
}
