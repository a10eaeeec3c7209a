//! Supply planning tests
//!
//! Tests for supplier lead times, the weekly stock projection and
//! future stock alerts with order-by advice.

mod common;

use chrono::NaiveDate;
use common::*;
use inventory_analytics_backend::error::AppError;
use inventory_analytics_backend::services::supply::{
    order_timing, suggested_order_qty, OrderStatus, ProductFilter,
};
use inventory_analytics_backend::services::SupplyService;
use proptest::prelude::*;
use serde_json::json;

/// A Wednesday
fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 16).unwrap()
}

fn beans() -> ProductFilter<'static> {
    ProductFilter {
        product_name: Some("beans"),
        category_name: None,
    }
}

/// Two kinds of beans with suppliers and scheduled moves, and cups without
fn planner() -> FakeGateway {
    FakeGateway::new()
        .with(
            "product.product",
            vec![
                with(
                    product(1, "Arabica Beans", "AB-1", (3, "Raw / Beans")),
                    json!({"qty_available": 100.0, "minimum": 40.0}),
                ),
                with(
                    product(2, "Robusta Beans", "RB-2", (3, "Raw / Beans")),
                    json!({"qty_available": 30.0, "minimum": 60.0, "pending_forecast": 12.0}),
                ),
                with(
                    product(3, "Paper Cups", "PC-3", (4, "All / Packaging")),
                    json!({"qty_available": 500.0}),
                ),
            ],
        )
        .with(
            "product.category",
            vec![
                category(3, "Beans", "Raw / Beans", Some((2, "Raw"))),
                category(4, "Packaging", "All / Packaging", None),
            ],
        )
        .with(
            "product.supplierinfo",
            vec![
                supplier(101, "Backup Roasters", 5, 2),
                supplier(101, "Bean Co", 20, 1),
                supplier(102, "Island Farms", 15, 1),
            ],
        )
        .with(
            "stock.move",
            vec![
                stock_move(
                    1,
                    30.0,
                    "2025-07-20 10:00:00",
                    "confirmed",
                    (STOCK, "internal"),
                    (CUSTOMERS, "customer"),
                ),
                stock_move(
                    1,
                    50.0,
                    "2025-07-25 10:00:00",
                    "assigned",
                    (VENDORS, "supplier"),
                    (STOCK, "internal"),
                ),
                // Past every horizon used below
                stock_move(
                    1,
                    10.0,
                    "2025-08-10 10:00:00",
                    "confirmed",
                    (STOCK, "internal"),
                    (CUSTOMERS, "customer"),
                ),
                // Already shipped
                stock_move(
                    1,
                    70.0,
                    "2025-07-18 10:00:00",
                    "done",
                    (STOCK, "internal"),
                    (CUSTOMERS, "customer"),
                ),
                stock_move(
                    2,
                    25.0,
                    "2025-07-18 10:00:00",
                    "waiting",
                    (STOCK, "internal"),
                    (CUSTOMERS, "customer"),
                ),
            ],
        )
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_lead_times_longest_first() {
        let gateway = planner();
        let service = SupplyService::new(&gateway, STOCK).with_today(today());

        let report = service.get_lead_time(ProductFilter::default()).await.unwrap();

        let ids: Vec<i64> = report.products.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        // Lowest sequence wins
        assert_eq!(report.products[0].supplier, "Bean Co");
        assert_eq!(report.products[0].lead_time_days, 20);
        assert_eq!(report.products[2].supplier, "No supplier");
        assert_eq!(report.products[2].lead_time_days, 0);
    }

    #[tokio::test]
    async fn test_lead_time_summary() {
        let gateway = planner();
        let service = SupplyService::new(&gateway, STOCK).with_today(today());

        let report = service.get_lead_time(ProductFilter::default()).await.unwrap();

        assert_eq!(report.summary.total_products, 3);
        assert_eq!(report.summary.products_with_supplier, 2);
        assert_eq!(report.summary.products_without_supplier, 1);
        assert_eq!(report.summary.avg_lead_time_days, 11.7);
        assert_eq!(report.summary.max_lead_time_days, 20);
        // Products without a supplier do not count toward the minimum
        assert_eq!(report.summary.min_lead_time_days, 15);
    }

    #[tokio::test]
    async fn test_name_and_category_filters() {
        let gateway = planner();
        let service = SupplyService::new(&gateway, STOCK).with_today(today());

        let by_name = service.get_lead_time(beans()).await.unwrap();
        assert_eq!(by_name.summary.total_products, 2);

        let by_code = service
            .get_lead_time(ProductFilter {
                product_name: Some("pc-3"),
                category_name: None,
            })
            .await
            .unwrap();
        assert_eq!(by_code.products[0].name, "Paper Cups");

        let by_category = service
            .get_lead_time(ProductFilter {
                product_name: None,
                category_name: Some("packaging"),
            })
            .await
            .unwrap();
        assert_eq!(by_category.summary.total_products, 1);

        // An unknown category is ignored rather than matching nothing
        let unknown = service
            .get_lead_time(ProductFilter {
                product_name: None,
                category_name: Some("Teapots"),
            })
            .await
            .unwrap();
        assert_eq!(unknown.summary.total_products, 3);
    }

    #[tokio::test]
    async fn test_no_matching_products() {
        let gateway = planner();
        let service = SupplyService::new(&gateway, STOCK).with_today(today());

        let err = service
            .get_lead_time(ProductFilter {
                product_name: Some("kettle"),
                category_name: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.to_string(), "No products found matching criteria");
    }

    #[tokio::test]
    async fn test_weekly_projection() {
        let gateway = planner();
        let service = SupplyService::new(&gateway, STOCK).with_today(today());

        let projection = service.get_stock_forecast(beans(), 2).await.unwrap();

        assert_eq!(projection.weeks, 2);
        assert_eq!(projection.forecast_period, "2025-07-16 to 2025-07-30");

        let arabica = &projection.products[0];
        assert_eq!(arabica.current_on_hand, 100.0);
        assert_eq!(arabica.weekly_forecast[0].period, "16 Jul - 23 Jul");
        assert_eq!(arabica.weekly_forecast[0].outgoing, 30.0);
        assert_eq!(arabica.weekly_forecast[0].ending_stock, 70.0);
        assert_eq!(arabica.weekly_forecast[1].incoming, 50.0);
        assert_eq!(arabica.weekly_forecast[1].ending_stock, 120.0);
        assert_eq!(arabica.final_stock, 120.0);
        assert_eq!(arabica.total_incoming, 50.0);
        assert_eq!(arabica.total_outgoing, 30.0);

        let robusta = &projection.products[1];
        assert_eq!(robusta.final_stock, 5.0);
    }

    #[tokio::test]
    async fn test_projection_summary() {
        let gateway = planner();
        let service = SupplyService::new(&gateway, STOCK).with_today(today());

        let projection = service
            .get_stock_forecast(ProductFilter::default(), 2)
            .await
            .unwrap();

        assert_eq!(projection.summary.total_products, 3);
        assert_eq!(projection.summary.total_current_stock, 630.0);
        assert_eq!(projection.summary.total_final_stock, 625.0);
        assert_eq!(projection.summary.total_incoming, 50.0);
        assert_eq!(projection.summary.total_outgoing, 55.0);
    }

    #[tokio::test]
    async fn test_projection_weeks_clamped() {
        let gateway = planner();
        let service = SupplyService::new(&gateway, STOCK).with_today(today());

        let projection = service.get_stock_forecast(beans(), 30).await.unwrap();
        assert_eq!(projection.weeks, 12);
        assert_eq!(projection.products[0].weekly_forecast.len(), 12);
        // The August shipment now falls inside the horizon
        assert_eq!(projection.products[0].final_stock, 110.0);
    }

    #[tokio::test]
    async fn test_future_alert_too_late() {
        let gateway = planner();
        let service = SupplyService::new(&gateway, STOCK).with_today(today());

        let report = service
            .get_future_stock_alert("2025-07-26", 50.0, ProductFilter::default())
            .await
            .unwrap();

        assert_eq!(report.low_stock_alerts.len(), 1);
        let alert = &report.low_stock_alerts[0];
        assert_eq!(alert.name, "Robusta Beans");
        assert_eq!(alert.outgoing_by_target, 25.0);
        assert_eq!(alert.projected_stock, 5.0);
        assert_eq!(alert.shortage, 45.0);
        // Topping up to the product minimum asks for more than the threshold
        assert_eq!(alert.suggested_order_qty, 55.0);
        assert_eq!(alert.pending_forecast, 12.0);
        assert_eq!(alert.supplier, "Island Farms");
        assert_eq!(alert.order_by_date, "2025-07-11");
        assert_eq!(alert.order_status, OrderStatus::TooLate);
        assert_eq!(alert.order_recommendation, "Should have ordered 5 days ago");

        assert_eq!(report.summary.days_until_target, 10);
        assert_eq!(report.summary.total_products_checked, 3);
        assert_eq!(report.summary.low_stock_count, 1);
        assert_eq!(report.summary.critical_count, 1);
    }

    #[tokio::test]
    async fn test_future_alert_order_today() {
        let gateway = planner();
        let service = SupplyService::new(&gateway, STOCK).with_today(today());

        let report = service
            .get_future_stock_alert("2025-08-05", 150.0, ProductFilter::default())
            .await
            .unwrap();

        let ids: Vec<i64> = report.low_stock_alerts.iter().map(|a| a.product_id).collect();
        assert_eq!(ids, vec![2, 1]);

        let arabica = &report.low_stock_alerts[1];
        assert_eq!(arabica.projected_stock, 120.0);
        assert_eq!(arabica.order_by_date, "2025-07-16");
        assert_eq!(arabica.order_status, OrderStatus::OrderToday);
        assert_eq!(arabica.suggested_order_qty, 30.0);

        let robusta = &report.low_stock_alerts[0];
        assert_eq!(robusta.order_status, OrderStatus::Ok);
        assert_eq!(robusta.order_recommendation, "Place order within 5 days");

        assert_eq!(report.summary.order_today_count, 1);
        assert_eq!(report.summary.ok_count, 1);
        assert_eq!(report.summary.critical_count, 0);
    }

    #[tokio::test]
    async fn test_future_alert_rejects_bad_dates() {
        let gateway = planner();
        let service = SupplyService::new(&gateway, STOCK).with_today(today());

        for target in ["2025-07-16", "2025-07-01", "16/07/2025", ""] {
            let err = service
                .get_future_stock_alert(target, 50.0, ProductFilter::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{}", target);
        }
    }

    /// Test the lead time scenario: target 10 days out, 15 day lead time
    #[test]
    fn test_lead_time_exceeds_window() {
        let target = today() + chrono::Duration::days(10);
        let (order_by, status, _) = order_timing(target, 15, today());
        assert_eq!(order_by, "2025-07-11");
        assert_eq!(status, OrderStatus::TooLate);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Suggested quantities are never negative and cover the shortage
        #[test]
        fn prop_suggested_qty_covers_shortage(
            threshold in 0.0f64..1000.0,
            projected in -500.0f64..1000.0,
            minimum in 0.0f64..1000.0,
        ) {
            let qty = suggested_order_qty(threshold, projected, minimum);
            prop_assert!(qty >= 0.0);
            prop_assert!(qty + 0.01 >= threshold - projected);
        }

        /// The order status depends only on where the order-by date falls
        #[test]
        fn prop_order_status_matches_dates(days_out in 1i64..120, lead in 1i64..120) {
            let target = today() + chrono::Duration::days(days_out);
            let (_, status, _) = order_timing(target, lead, today());
            let expected = match lead.cmp(&days_out) {
                std::cmp::Ordering::Greater => OrderStatus::TooLate,
                std::cmp::Ordering::Equal => OrderStatus::OrderToday,
                std::cmp::Ordering::Less => OrderStatus::Ok,
            };
            prop_assert_eq!(status, expected);
        }
    }
}
