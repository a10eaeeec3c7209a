//! Stock level tests
//!
//! Tests for the on-hand snapshot including:
//! - Status classification against min/max reorder rules
//! - Days of stock from the trailing consumption window
//! - Reorder alert ordering and the stock summary

mod common;

use chrono::NaiveDate;
use common::*;
use inventory_analytics_backend::services::stock_levels::StockLevelFilter;
use inventory_analytics_backend::services::StockLevelService;
use proptest::prelude::*;
use serde_json::json;
use shared::{suggested_reorder_qty, StockStatus};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 16).unwrap()
}

/// Widget is healthy, Gadget is below its minimum, Gizmo has nothing on hand
fn warehouse() -> FakeGateway {
    FakeGateway::new()
        .with(
            "product.product",
            vec![
                product(1, "Widget", "WDG-1", (1, "All / Saleable")),
                with(
                    product(2, "Gadget", "GDG-2", (2, "All / Parts")),
                    json!({"incoming_qty": 5.0}),
                ),
                product(3, "Gizmo", "GZM-3", (1, "All / Saleable")),
            ],
        )
        .with(
            "stock.quant",
            vec![
                quant(1, 30.0, 10.0, "2025-06-01 08:00:00"),
                quant(1, 10.0, 0.0, "2025-07-01 08:00:00"),
                quant(2, 4.0, 0.0, "2025-05-20 08:00:00"),
            ],
        )
        .with(
            "stock.warehouse.orderpoint",
            vec![orderpoint(1, 20.0, 60.0), orderpoint(2, 10.0, 50.0)],
        )
        .with(
            "stock.move",
            vec![
                shipment(1, 40.0, "2025-07-01 10:00:00"),
                shipment(1, 20.0, "2025-07-10 10:00:00"),
                // Outside the 30 day window
                shipment(1, 500.0, "2025-05-01 10:00:00"),
                // Internal transfer, not consumption
                stock_move(
                    1,
                    70.0,
                    "2025-07-12 10:00:00",
                    "done",
                    (STOCK, "internal"),
                    (12, "internal"),
                ),
                shipment(2, 12.0, "2025-07-05 10:00:00"),
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
    async fn test_levels_skip_zero_stock_by_default() {
        let gateway = warehouse();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let levels = service
            .get_stock_levels(&StockLevelFilter::default())
            .await
            .unwrap();

        let ids: Vec<i64> = levels.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_healthy_product_is_normal() {
        let gateway = warehouse();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let levels = service
            .get_stock_levels(&StockLevelFilter::default())
            .await
            .unwrap();
        let widget = levels.iter().find(|l| l.product_id == 1).unwrap();

        assert_eq!(widget.product_name, "Widget");
        assert_eq!(widget.category, "All / Saleable");
        assert_eq!(widget.qty_on_hand, 40.0);
        assert_eq!(widget.qty_available, 30.0);
        assert_eq!(widget.qty_forecast, 30.0);
        assert_eq!(widget.reorder_min, 20.0);
        assert_eq!(widget.reorder_max, 60.0);
        assert_eq!(widget.status, StockStatus::Normal);
        // 60 shipped over 30 days against 40 on hand
        assert_eq!(widget.days_of_stock, Some(20.0));
        assert_eq!(widget.reorder_qty_suggested, 0.0);
    }

    #[tokio::test]
    async fn test_product_below_minimum_is_low() {
        let gateway = warehouse();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let levels = service
            .get_stock_levels(&StockLevelFilter::default())
            .await
            .unwrap();
        let gadget = levels.iter().find(|l| l.product_id == 2).unwrap();

        assert_eq!(gadget.qty_incoming, 5.0);
        assert_eq!(gadget.qty_forecast, 9.0);
        assert_eq!(gadget.status, StockStatus::Low);
        assert_eq!(gadget.reorder_qty_suggested, 41.0);
        assert_eq!(gadget.days_of_stock, Some(10.0));
    }

    #[tokio::test]
    async fn test_include_zero_stock() {
        let gateway = warehouse();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let levels = service
            .get_stock_levels(&StockLevelFilter {
                include_zero_stock: true,
                ..StockLevelFilter::default()
            })
            .await
            .unwrap();

        assert_eq!(levels.len(), 3);
        let gizmo = levels.iter().find(|l| l.product_id == 3).unwrap();
        assert_eq!(gizmo.qty_on_hand, 0.0);
        assert_eq!(gizmo.status, StockStatus::OutOfStock);
        assert_eq!(gizmo.days_of_stock, None);
    }

    #[tokio::test]
    async fn test_forecast_identity_holds() {
        let gateway = warehouse();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let levels = service
            .get_stock_levels(&StockLevelFilter {
                include_zero_stock: true,
                ..StockLevelFilter::default()
            })
            .await
            .unwrap();

        for level in &levels {
            assert_eq!(
                level.qty_forecast,
                level.qty_available + level.qty_incoming - level.qty_outgoing
            );
        }
    }

    #[tokio::test]
    async fn test_category_filter() {
        let gateway = warehouse();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let levels = service
            .get_stock_levels(&StockLevelFilter {
                category_ids: Some(vec![2]),
                ..StockLevelFilter::default()
            })
            .await
            .unwrap();

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].product_name, "Gadget");
    }

    #[tokio::test]
    async fn test_product_filter_reaches_quant_query() {
        let gateway = warehouse();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let levels = service
            .get_stock_levels(&StockLevelFilter {
                product_ids: Some(vec![1]),
                ..StockLevelFilter::default()
            })
            .await
            .unwrap();

        assert_eq!(levels.len(), 1);
        let domains = gateway.domains("stock.quant");
        assert!(domains[0].to_string().contains("product_id"));
    }

    #[tokio::test]
    async fn test_rules_from_other_warehouse_ignored() {
        let gateway = warehouse();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let levels = service
            .get_stock_levels(&StockLevelFilter {
                warehouse_id: Some(2),
                ..StockLevelFilter::default()
            })
            .await
            .unwrap();
        let gadget = levels.iter().find(|l| l.product_id == 2).unwrap();

        assert_eq!(gadget.reorder_min, 0.0);
        assert_eq!(gadget.status, StockStatus::Normal);
        assert_eq!(gadget.reorder_qty_suggested, 0.0);
    }

    #[tokio::test]
    async fn test_no_stock_anywhere() {
        let gateway = FakeGateway::new()
            .with("product.product", vec![product(1, "Widget", "WDG-1", (1, "All"))]);
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let levels = service
            .get_stock_levels(&StockLevelFilter::default())
            .await
            .unwrap();

        assert!(levels.is_empty());
    }

    #[tokio::test]
    async fn test_reorder_alerts_most_urgent_first() {
        let gateway = warehouse();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let alerts = service.get_reorder_alerts(7.0, None).await.unwrap();
        let ids: Vec<i64> = alerts.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn test_reorder_alerts_by_days_of_stock() {
        let gateway = warehouse();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let alerts = service.get_reorder_alerts(25.0, None).await.unwrap();
        let ids: Vec<i64> = alerts.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_stock_summary() {
        let gateway = warehouse();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let summary = service.get_stock_summary(None).await.unwrap();

        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.total_quantity, 44.0);
        assert_eq!(summary.status_breakdown[&StockStatus::OutOfStock], 1);
        assert_eq!(summary.status_breakdown[&StockStatus::Low], 1);
        assert_eq!(summary.status_breakdown[&StockStatus::Normal], 1);
        assert_eq!(summary.avg_days_of_stock, Some(15.0));
        assert_eq!(summary.products_needing_reorder, 1);
    }

    #[tokio::test]
    async fn test_empty_summary() {
        let gateway = FakeGateway::new();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let summary = service.get_stock_summary(None).await.unwrap();

        assert_eq!(summary.total_products, 0);
        assert_eq!(summary.total_quantity, 0.0);
        assert_eq!(summary.avg_days_of_stock, None);
    }

    #[tokio::test]
    async fn test_gateway_failure_propagates() {
        let gateway = FakeGateway::unreachable();
        let service = StockLevelService::new(&gateway, STOCK).with_today(today());

        let result = service.get_stock_levels(&StockLevelFilter::default()).await;
        assert!(result.is_err());
    }

    /// Test the critical scenario: 5 on hand, minimum 20, forecast 8
    #[test]
    fn test_critical_scenario() {
        assert_eq!(StockStatus::classify(5.0, 8.0, 20.0, 0.0), StockStatus::Critical);
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

        /// Nothing on hand is out of stock whatever the rule says
        #[test]
        fn prop_empty_is_out_of_stock(
            on_hand in -100.0f64..=0.0,
            forecast in -1000.0f64..1000.0,
            min in 0.0f64..500.0,
            max in 0.0f64..1000.0,
        ) {
            prop_assert_eq!(StockStatus::classify(on_hand, forecast, min, max), StockStatus::OutOfStock);
        }

        /// Without a minimum, positive stock is always normal
        #[test]
        fn prop_no_minimum_is_normal(
            on_hand in 0.01f64..10_000.0,
            forecast in -1000.0f64..1000.0,
            max in 0.0f64..1000.0,
        ) {
            prop_assert_eq!(StockStatus::classify(on_hand, forecast, 0.0, max), StockStatus::Normal);
        }

        /// Classification is deterministic
        #[test]
        fn prop_classification_is_pure(
            on_hand in -10.0f64..1000.0,
            forecast in -1000.0f64..1000.0,
            min in 0.0f64..500.0,
            max in 0.0f64..1000.0,
        ) {
            prop_assert_eq!(
                StockStatus::classify(on_hand, forecast, min, max),
                StockStatus::classify(on_hand, forecast, min, max)
            );
        }

        /// Suggested quantities are never negative and refill to the maximum
        #[test]
        fn prop_suggested_qty_non_negative(
            forecast in -1000.0f64..1000.0,
            min in 0.0f64..500.0,
            max in 0.0f64..1000.0,
        ) {
            let qty = suggested_reorder_qty(forecast, min, max);
            prop_assert!(qty >= 0.0);
            if qty > 0.0 {
                prop_assert!(forecast < min);
                prop_assert!((forecast + qty - max).abs() < 1e-9);
            }
        }
    }
}
