//! Canned boundary records.

use hawser_core::{
    BoundaryEnum, OrderSide, OrderStatus, OrderTag, OrderType, RawDecimal, RawOrderChanged,
};

/// A limit order event for `symbol` at 350.00 HKD, 100 shares, submitted at a fixed instant.
///
/// `executed_price` is the only nullable field that is filled in.
#[must_use]
pub fn order_changed(
    symbol: &str,
    side: OrderSide,
    status: OrderStatus,
    executed_price: Option<RawDecimal>,
) -> RawOrderChanged {
    let executed_quantity = if executed_price.is_some() { 100 } else { 0 };
    RawOrderChanged {
        side: side.to_tag(),
        stock_name: "TENCENT".to_string(),
        submitted_quantity: 100,
        symbol: symbol.to_string(),
        order_type: OrderType::LO.to_tag(),
        submitted_price: RawDecimal::new(35_000, 2),
        executed_quantity,
        executed_price,
        order_id: "706388312699592704".to_string(),
        currency: "HKD".to_string(),
        status: status.to_tag(),
        submitted_at: 1_651_644_897,
        updated_at: 1_651_644_898,
        trigger_price: None,
        msg: String::new(),
        tag: OrderTag::Normal.to_tag(),
        trigger_status: None,
        trigger_at: None,
        trailing_amount: None,
        trailing_percent: None,
        limit_offset: None,
        account_no: "HK-0001".to_string(),
        last_share: None,
        last_price: None,
        remark: String::new(),
    }
}
