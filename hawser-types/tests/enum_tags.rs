use std::fmt::Debug;

use hawser_types::{
    BoundaryEnum, HawserError, Language, Market, OrderSide, OrderStatus, OrderTag, OrderType,
    Period, TopicType, TradeStatus, TriggerStatus,
};
use proptest::prelude::*;

fn assert_table_roundtrips<T: BoundaryEnum + PartialEq + Debug>() {
    assert!(!T::VARIANTS.is_empty());
    for v in T::VARIANTS {
        assert_eq!(T::from_tag(v.to_tag()).unwrap(), *v, "{}", T::NAME);
        assert_eq!(T::from_name(v.as_str()).unwrap(), *v, "{}", T::NAME);
    }
}

fn assert_tag_is_total<T: BoundaryEnum + Debug>(tag: i32) {
    match T::from_tag(tag) {
        Ok(v) => assert_eq!(v.to_tag(), tag),
        Err(HawserError::UnknownVariant { name, tag: got }) => {
            assert_eq!(name, T::NAME);
            assert_eq!(got, i64::from(tag));
        }
        Err(other) => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn every_table_roundtrips() {
    assert_table_roundtrips::<Language>();
    assert_table_roundtrips::<Market>();
    assert_table_roundtrips::<Period>();
    assert_table_roundtrips::<TradeStatus>();
    assert_table_roundtrips::<TopicType>();
    assert_table_roundtrips::<OrderSide>();
    assert_table_roundtrips::<OrderType>();
    assert_table_roundtrips::<OrderStatus>();
    assert_table_roundtrips::<OrderTag>();
    assert_table_roundtrips::<TriggerStatus>();
}

#[test]
fn order_status_uses_wire_names() {
    assert_eq!(OrderStatus::Filled.as_str(), "FilledStatus");
    assert_eq!(OrderStatus::from_name("PartialFilledStatus").unwrap(), OrderStatus::PartialFilled);
    assert!(matches!(
        OrderStatus::from_name("Filled"),
        Err(HawserError::InvalidFormat(_))
    ));
}

#[test]
fn string_and_integer_conversions_agree() {
    let side: OrderSide = "Buy".parse().unwrap();
    assert_eq!(side.to_string(), "Buy");
    let tag: i32 = side.into();
    assert_eq!(OrderSide::try_from(tag).unwrap(), side);
}

proptest! {
    #[test]
    fn from_tag_is_total(tag in any::<i32>()) {
        assert_tag_is_total::<Language>(tag);
        assert_tag_is_total::<OrderStatus>(tag);
        assert_tag_is_total::<OrderType>(tag);
        assert_tag_is_total::<TriggerStatus>(tag);
    }
}
