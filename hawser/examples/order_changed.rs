use std::time::Duration;

use hawser::{Config, Hawser, OrderSide, OrderStatus, TopicType, UserData};
use hawser_core::RawDecimal;
use hawser_mock::{DynamicMockBackend, fixtures};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // 1. A mock backend stands in for the trading gateway.
    let (backend, ctl) = DynamicMockBackend::new_with_controller();
    let hawser = Hawser::builder()
        .backend(backend)
        .runtime(tokio::runtime::Handle::current())
        .build()?;

    // 2. Create a session. Credentials come from HAWSER_* when set.
    let config = Config::from_env()
        .unwrap_or_else(|_| Config::new("demo-key", "demo-secret", "demo-token"));
    let (tx, rx) = oneshot::channel();
    hawser.create(
        config,
        move |res| {
            let _ = tx.send(res.handle().ok_or_else(|| res.error().cloned()));
        },
        UserData::none(),
    );
    let handle = match rx.await? {
        Ok(handle) => handle,
        Err(e) => return Err(format!("create failed: {e:?}").into()),
    };
    println!("session {} ready", handle.id());

    // 3. Print every order change, then subscribe to the private topic.
    hawser.set_on_order_changed(
        handle,
        |h, ev, _| {
            let price = ev
                .executed_price
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            println!(
                "[{}] {} {} {} executed {} @ {price}",
                h.id(),
                ev.symbol,
                ev.side,
                ev.status,
                ev.executed_quantity
            );
        },
        UserData::none(),
    );
    let (tx, rx) = oneshot::channel();
    hawser.subscribe(
        handle,
        &[TopicType::Private],
        move |res| {
            let _ = tx.send(res.is_ok());
        },
        UserData::none(),
    );
    println!("subscribed: {}", rx.await?);

    // 4. Simulate the server pushing two updates for the same order.
    ctl.push_order_changed(fixtures::order_changed(
        "700.HK",
        OrderSide::Buy,
        OrderStatus::New,
        None,
    ));
    ctl.push_order_changed(fixtures::order_changed(
        "700.HK",
        OrderSide::Buy,
        OrderStatus::Filled,
        Some(RawDecimal::new(35_020, 2)),
    ));
    tokio::time::sleep(Duration::from_millis(200)).await;

    // 5. Dropping the last reference closes the session.
    hawser.release(handle);
    println!("session released");
    Ok(())
}
