use hawser_core::{
    BoundaryEnum, Decimal, HawserError, OrderSide, OrderStatus, OrderTag, OrderType,
    PushOrderChanged, RawDecimal, RawOrderChanged, TriggerStatus,
};
use proptest::prelude::*;

fn tag_of<T: BoundaryEnum>() -> impl Strategy<Value = i32> {
    proptest::sample::select(T::VARIANTS.iter().map(|v| v.to_tag()).collect::<Vec<_>>())
}

fn arb_raw_decimal() -> impl Strategy<Value = RawDecimal> {
    (-1_000_000_000_000i128..1_000_000_000_000i128, 0u32..=8)
        .prop_map(|(m, s)| RawDecimal::new(m, s))
}

fn arb_ts() -> impl Strategy<Value = i64> {
    -2_000_000_000i64..4_000_000_000i64
}

fn arb_raw_order() -> impl Strategy<Value = RawOrderChanged> {
    (
        (
            tag_of::<OrderSide>(),
            tag_of::<OrderType>(),
            tag_of::<OrderStatus>(),
            tag_of::<OrderTag>(),
            proptest::option::of(tag_of::<TriggerStatus>()),
        ),
        (
            arb_raw_decimal(),
            proptest::option::of(arb_raw_decimal()),
            proptest::option::of(arb_raw_decimal()),
            proptest::option::of(arb_raw_decimal()),
        ),
        (arb_ts(), arb_ts(), proptest::option::of(arb_ts())),
        ("[0-9]{1,5}\\.(HK|US)", 0i64..1_000_000, 0i64..1_000_000),
    )
        .prop_map(
            |(
                (side, order_type, status, tag, trigger_status),
                (submitted_price, executed_price, trigger_price, last_price),
                (submitted_at, updated_at, trigger_at),
                (symbol, submitted_quantity, executed_quantity),
            )| RawOrderChanged {
                side,
                stock_name: "TENCENT".into(),
                submitted_quantity,
                symbol,
                order_type,
                submitted_price,
                executed_quantity,
                executed_price,
                order_id: "706388312699592704".into(),
                currency: "HKD".into(),
                status,
                submitted_at,
                updated_at,
                trigger_price,
                msg: String::new(),
                tag,
                trigger_status,
                trigger_at,
                trailing_amount: None,
                trailing_percent: None,
                limit_offset: None,
                account_no: "HK-0001".into(),
                last_share: None,
                last_price,
                remark: String::new(),
            },
        )
}

proptest! {
    #[test]
    fn well_formed_records_convert_and_come_back(raw in arb_raw_order()) {
        let rich = PushOrderChanged::try_from(raw.clone()).unwrap();
        prop_assert_eq!(rich.symbol.as_str(), raw.symbol.as_str());
        prop_assert_eq!(rich.executed_price.is_some(), raw.executed_price.is_some());
        prop_assert_eq!(rich.trigger_status.is_some(), raw.trigger_status.is_some());

        let back = RawOrderChanged::from(&rich);
        prop_assert_eq!(back.side, raw.side);
        prop_assert_eq!(back.status, raw.status);
        prop_assert_eq!(back.trigger_at, raw.trigger_at);
        prop_assert_eq!(
            back.executed_price.map(Decimal::try_from).transpose().unwrap(),
            raw.executed_price.map(Decimal::try_from).transpose().unwrap()
        );
        prop_assert_eq!(PushOrderChanged::try_from(back).unwrap(), rich);
    }

    #[test]
    fn unknown_status_tag_is_rejected(raw in arb_raw_order(), bad in 1_000i32..i32::MAX) {
        let raw = RawOrderChanged { status: bad, ..raw };
        let err = PushOrderChanged::try_from(raw).unwrap_err();
        prop_assert_eq!(err, HawserError::unknown_variant("OrderStatus", i64::from(bad)));
    }

    #[test]
    fn unknown_trigger_status_is_rejected_not_defaulted(raw in arb_raw_order(), bad in i32::MIN..-1) {
        let raw = RawOrderChanged { trigger_status: Some(bad), ..raw };
        let err = PushOrderChanged::try_from(raw).unwrap_err();
        prop_assert!(
            matches!(err, HawserError::UnknownVariant { ref name, .. } if name == "TriggerStatus"),
            "unexpected {:?}",
            err
        );
    }
}

#[test]
fn out_of_range_timestamp_is_invalid_record() {
    let mut raw = RawOrderChanged::from(&sample());
    raw.updated_at = i64::MAX;
    assert!(matches!(
        PushOrderChanged::try_from(raw),
        Err(HawserError::InvalidRecord(_))
    ));
}

#[test]
fn order_changed_serde_roundtrip() {
    let ev = sample();
    let json = serde_json::to_string(&ev).expect("serialize event");
    let de: PushOrderChanged = serde_json::from_str(&json).expect("deserialize event");
    assert_eq!(de, ev);
}

fn sample() -> PushOrderChanged {
    let raw = RawOrderChanged {
        side: OrderSide::Buy.to_tag(),
        stock_name: "TENCENT".into(),
        submitted_quantity: 100,
        symbol: "700.HK".into(),
        order_type: OrderType::LO.to_tag(),
        submitted_price: RawDecimal::new(3_502, 1),
        executed_quantity: 100,
        executed_price: Some(RawDecimal::new(35_000, 2)),
        order_id: "1".into(),
        currency: "HKD".into(),
        status: OrderStatus::Filled.to_tag(),
        submitted_at: 1_700_000_000,
        updated_at: 1_700_000_060,
        trigger_price: None,
        msg: String::new(),
        tag: OrderTag::Normal.to_tag(),
        trigger_status: None,
        trigger_at: None,
        trailing_amount: None,
        trailing_percent: None,
        limit_offset: None,
        account_no: "HK-0001".into(),
        last_share: None,
        last_price: None,
        remark: String::new(),
    };
    PushOrderChanged::try_from(raw).unwrap()
}
