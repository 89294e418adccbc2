//! Basic publish/subscribe walkthrough over the in-memory broker.
//!
//! Defines a few event types, registers handlers (including two for the same
//! type and one registered twice), publishes, unsubscribes, and shuts down.
//! Run with `cargo run --example basic_usage`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use eve_bus::{BusConfig, Event, EventBus, EventData, HandlerFn, MemoryBroker};

#[derive(Serialize)]
struct UserCreated {
    user_id: String,
    username: String,
    email: String,
}

impl Event for UserCreated {
    fn event_type() -> &'static str {
        "UserCreated"
    }
}

#[derive(Serialize)]
struct OrderPlaced {
    order_id: String,
    user_id: String,
    items: Vec<OrderItem>,
    total_amount: f64,
}

#[derive(Serialize)]
struct OrderItem {
    product_id: String,
    name: String,
    quantity: u32,
    price: f64,
}

impl Event for OrderPlaced {
    fn event_type() -> &'static str {
        "OrderPlaced"
    }
}

#[derive(Serialize)]
struct UserActivity {
    user_id: String,
    activity_type: String,
}

impl Event for UserActivity {
    fn event_type() -> &'static str {
        "UserActivity"
    }
}

#[tokio::main]
async fn main() -> Result<(), eve_bus::BusError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bus = EventBus::new(Arc::new(MemoryBroker::default()), BusConfig::default());

    let on_user_created = HandlerFn::arc("user-created", |event: EventData| async move {
        println!(
            "new user created: {} ({})",
            event.get_str("username").unwrap_or("?"),
            event.get_str("email").unwrap_or("?"),
        );
        Ok(())
    });

    let on_order_placed = HandlerFn::arc("order-placed", |event: EventData| async move {
        println!(
            "new order {} placed by user {}, total ${}",
            event.get_str("order_id").unwrap_or("?"),
            event.get_str("user_id").unwrap_or("?"),
            event.get_f64("total_amount").unwrap_or(0.0),
        );
        Ok(())
    });

    let on_order_notification = HandlerFn::arc("order-notification", |event: EventData| async move {
        println!(
            "sending notification for order {}",
            event.get_str("order_id").unwrap_or("?"),
        );
        Ok(())
    });

    let on_user_activity = HandlerFn::arc("user-activity", |event: EventData| async move {
        println!(
            "user activity recorded: {} by user {}",
            event.get_str("activity_type").unwrap_or("?"),
            event.get_str("user_id").unwrap_or("?"),
        );
        Ok(())
    });

    bus.subscribe("UserCreated", on_user_created).await?;
    bus.subscribe("OrderPlaced", on_order_placed).await?;
    bus.subscribe("OrderPlaced", on_order_notification).await?;
    bus.subscribe("UserActivity", on_user_activity.clone()).await?;
    // Same handler again: idempotent, still one invocation per event.
    bus.subscribe("UserActivity", on_user_activity.clone()).await?;

    println!("event bus initialized, publishing events...");

    bus.publish(UserCreated {
        user_id: "123".to_string(),
        username: "john_doe".to_string(),
        email: "john@example.com".to_string(),
    })
    .await?;

    bus.publish(OrderPlaced {
        order_id: "ORD-001".to_string(),
        user_id: "123".to_string(),
        items: vec![
            OrderItem {
                product_id: "P001".to_string(),
                name: "Product 1".to_string(),
                quantity: 2,
                price: 19.99,
            },
            OrderItem {
                product_id: "P002".to_string(),
                name: "Product 2".to_string(),
                quantity: 1,
                price: 29.99,
            },
        ],
        total_amount: 69.97,
    })
    .await?;

    bus.publish(UserActivity {
        user_id: "123".to_string(),
        activity_type: "login".to_string(),
    })
    .await?;

    // Give the listeners a moment to drain before changing subscriptions.
    tokio::time::sleep(Duration::from_millis(200)).await;

    bus.unsubscribe("UserActivity", &on_user_activity).await?;
    println!("unsubscribed from UserActivity events");

    // No handler remains for this one; the broker drops it.
    bus.publish(UserActivity {
        user_id: "123".to_string(),
        activity_type: "logout".to_string(),
    })
    .await?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    println!("shutting down event bus...");
    bus.shutdown().await?;
    println!("done, no background work left");
    Ok(())
}
