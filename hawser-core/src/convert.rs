//! The boundary representation of a trade event is flat: enumerations are `i32` tags, nullable
//! decimals are `Option<RawDecimal>`, and instants are unix seconds. Callers get the rich form
//! instead: named enums, [`Decimal`] and `DateTime<Utc>`.
//!
//! Raw → rich can fail (an unknown tag is `UnknownVariant`, an impossible date or timestamp is
//! `InvalidRecord`, a decimal out of range is `InvalidFormat`). Rich → raw cannot.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use hawser_types::{
    BoundaryEnum, Decimal, HawserError, OrderSide, OrderStatus, OrderTag, OrderType, TopicType,
    TriggerStatus,
};

/// Decimal as it crosses the boundary: `mantissa × 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawDecimal {
    /// Integer mantissa.
    pub mantissa: i128,
    /// Number of fractional digits.
    pub scale: u32,
}

impl RawDecimal {
    /// Shorthand constructor.
    #[must_use]
    pub const fn new(mantissa: i128, scale: u32) -> Self {
        Self { mantissa, scale }
    }
}

impl TryFrom<RawDecimal> for Decimal {
    type Error = HawserError;

    fn try_from(raw: RawDecimal) -> Result<Self, Self::Error> {
        Self::from_i128_with_scale(raw.mantissa, raw.scale).map_err(|e| {
            HawserError::invalid_format(format!(
                "decimal {}e-{} out of range: {e}",
                raw.mantissa, raw.scale
            ))
        })
    }
}

impl From<Decimal> for RawDecimal {
    fn from(value: Decimal) -> Self {
        Self {
            mantissa: value.mantissa(),
            scale: value.scale(),
        }
    }
}

/// Calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawDate {
    /// Year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
}

impl TryFrom<RawDate> for NaiveDate {
    type Error = HawserError;

    fn try_from(raw: RawDate) -> Result<Self, Self::Error> {
        Self::from_ymd_opt(raw.year, raw.month, raw.day).ok_or_else(|| {
            HawserError::invalid_record(format!(
                "invalid date {:04}-{:02}-{:02}",
                raw.year, raw.month, raw.day
            ))
        })
    }
}

impl From<NaiveDate> for RawDate {
    fn from(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// Time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawTime {
    /// Hour, 0-23.
    pub hour: u32,
    /// Minute, 0-59.
    pub minute: u32,
    /// Second, 0-59.
    pub second: u32,
}

impl TryFrom<RawTime> for NaiveTime {
    type Error = HawserError;

    fn try_from(raw: RawTime) -> Result<Self, Self::Error> {
        Self::from_hms_opt(raw.hour, raw.minute, raw.second).ok_or_else(|| {
            HawserError::invalid_record(format!(
                "invalid time {:02}:{:02}:{:02}",
                raw.hour, raw.minute, raw.second
            ))
        })
    }
}

impl From<NaiveTime> for RawTime {
    fn from(time: NaiveTime) -> Self {
        use chrono::Timelike;
        Self {
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
        }
    }
}

/// Date and time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawDateTime {
    /// Date.
    pub date: RawDate,
    /// Time of day.
    pub time: RawTime,
}

impl TryFrom<RawDateTime> for NaiveDateTime {
    type Error = HawserError;

    fn try_from(raw: RawDateTime) -> Result<Self, Self::Error> {
        Ok(Self::new(raw.date.try_into()?, raw.time.try_into()?))
    }
}

impl From<NaiveDateTime> for RawDateTime {
    fn from(value: NaiveDateTime) -> Self {
        Self {
            date: value.date().into(),
            time: value.time().into(),
        }
    }
}

/// Order-changed event in boundary form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOrderChanged {
    /// `OrderSide` tag.
    pub side: i32,
    /// Stock name.
    pub stock_name: String,
    /// Submitted quantity.
    pub submitted_quantity: i64,
    /// Order symbol.
    pub symbol: String,
    /// `OrderType` tag.
    pub order_type: i32,
    /// Submitted price.
    pub submitted_price: RawDecimal,
    /// Executed quantity.
    pub executed_quantity: i64,
    /// Executed price, absent before the first fill.
    pub executed_price: Option<RawDecimal>,
    /// Order id.
    pub order_id: String,
    /// Currency.
    pub currency: String,
    /// `OrderStatus` tag.
    pub status: i32,
    /// Submitted time, unix seconds.
    pub submitted_at: i64,
    /// Last updated time, unix seconds.
    pub updated_at: i64,
    /// Trigger price.
    pub trigger_price: Option<RawDecimal>,
    /// Rejection message or remark.
    pub msg: String,
    /// `OrderTag` tag.
    pub tag: i32,
    /// `TriggerStatus` tag of a conditional order.
    pub trigger_status: Option<i32>,
    /// Trigger time of a conditional order, unix seconds.
    pub trigger_at: Option<i64>,
    /// Trailing amount.
    pub trailing_amount: Option<RawDecimal>,
    /// Trailing percent.
    pub trailing_percent: Option<RawDecimal>,
    /// Limit offset amount.
    pub limit_offset: Option<RawDecimal>,
    /// Account number.
    pub account_no: String,
    /// Last share.
    pub last_share: Option<RawDecimal>,
    /// Last price.
    pub last_price: Option<RawDecimal>,
    /// Remark.
    pub remark: String,
}

/// Order-changed event.
///
/// Built immediately before dispatch and lent to the handler; clone it to keep it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushOrderChanged {
    /// Order side.
    pub side: OrderSide,
    /// Stock name.
    pub stock_name: String,
    /// Submitted quantity.
    pub submitted_quantity: i64,
    /// Order symbol.
    pub symbol: String,
    /// Order type.
    pub order_type: OrderType,
    /// Submitted price.
    pub submitted_price: Decimal,
    /// Executed quantity.
    pub executed_quantity: i64,
    /// Executed price.
    pub executed_price: Option<Decimal>,
    /// Order id.
    pub order_id: String,
    /// Currency.
    pub currency: String,
    /// Order status.
    pub status: OrderStatus,
    /// Submitted time.
    pub submitted_at: DateTime<Utc>,
    /// Last updated time.
    pub updated_at: DateTime<Utc>,
    /// Trigger price.
    pub trigger_price: Option<Decimal>,
    /// Rejection message or remark.
    pub msg: String,
    /// Order tag.
    pub tag: OrderTag,
    /// Trigger status of a conditional order.
    pub trigger_status: Option<TriggerStatus>,
    /// Trigger time of a conditional order.
    pub trigger_at: Option<DateTime<Utc>>,
    /// Trailing amount.
    pub trailing_amount: Option<Decimal>,
    /// Trailing percent.
    pub trailing_percent: Option<Decimal>,
    /// Limit offset amount.
    pub limit_offset: Option<Decimal>,
    /// Account number.
    pub account_no: String,
    /// Last share.
    pub last_share: Option<Decimal>,
    /// Last price.
    pub last_price: Option<Decimal>,
    /// Remark.
    pub remark: String,
}

fn timestamp(field: &str, secs: i64) -> Result<DateTime<Utc>, HawserError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        HawserError::invalid_record(format!("{field}: timestamp {secs} out of range"))
    })
}

fn opt_decimal(raw: Option<RawDecimal>) -> Result<Option<Decimal>, HawserError> {
    raw.map(Decimal::try_from).transpose()
}

impl TryFrom<RawOrderChanged> for PushOrderChanged {
    type Error = HawserError;

    fn try_from(raw: RawOrderChanged) -> Result<Self, Self::Error> {
        let RawOrderChanged {
            side,
            stock_name,
            submitted_quantity,
            symbol,
            order_type,
            submitted_price,
            executed_quantity,
            executed_price,
            order_id,
            currency,
            status,
            submitted_at,
            updated_at,
            trigger_price,
            msg,
            tag,
            trigger_status,
            trigger_at,
            trailing_amount,
            trailing_percent,
            limit_offset,
            account_no,
            last_share,
            last_price,
            remark,
        } = raw;

        Ok(Self {
            side: OrderSide::from_tag(side)?,
            stock_name,
            submitted_quantity,
            symbol,
            order_type: OrderType::from_tag(order_type)?,
            submitted_price: submitted_price.try_into()?,
            executed_quantity,
            executed_price: opt_decimal(executed_price)?,
            order_id,
            currency,
            status: OrderStatus::from_tag(status)?,
            submitted_at: timestamp("submitted_at", submitted_at)?,
            updated_at: timestamp("updated_at", updated_at)?,
            trigger_price: opt_decimal(trigger_price)?,
            msg,
            tag: OrderTag::from_tag(tag)?,
            trigger_status: trigger_status.map(TriggerStatus::from_tag).transpose()?,
            trigger_at: trigger_at.map(|t| timestamp("trigger_at", t)).transpose()?,
            trailing_amount: opt_decimal(trailing_amount)?,
            trailing_percent: opt_decimal(trailing_percent)?,
            limit_offset: opt_decimal(limit_offset)?,
            account_no,
            last_share: opt_decimal(last_share)?,
            last_price: opt_decimal(last_price)?,
            remark,
        })
    }
}

impl From<&PushOrderChanged> for RawOrderChanged {
    fn from(event: &PushOrderChanged) -> Self {
        let raw = |d: Option<Decimal>| d.map(RawDecimal::from);
        Self {
            side: event.side.to_tag(),
            stock_name: event.stock_name.clone(),
            submitted_quantity: event.submitted_quantity,
            symbol: event.symbol.clone(),
            order_type: event.order_type.to_tag(),
            submitted_price: event.submitted_price.into(),
            executed_quantity: event.executed_quantity,
            executed_price: raw(event.executed_price),
            order_id: event.order_id.clone(),
            currency: event.currency.clone(),
            status: event.status.to_tag(),
            submitted_at: event.submitted_at.timestamp(),
            updated_at: event.updated_at.timestamp(),
            trigger_price: raw(event.trigger_price),
            msg: event.msg.clone(),
            tag: event.tag.to_tag(),
            trigger_status: event.trigger_status.map(BoundaryEnum::to_tag),
            trigger_at: event.trigger_at.map(|t| t.timestamp()),
            trailing_amount: raw(event.trailing_amount),
            trailing_percent: raw(event.trailing_percent),
            limit_offset: raw(event.limit_offset),
            account_no: event.account_no.clone(),
            last_share: raw(event.last_share),
            last_price: raw(event.last_price),
            remark: event.remark.clone(),
        }
    }
}

/// Event as delivered by a backend connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RawPushEvent {
    /// An order changed state.
    OrderChanged(RawOrderChanged),
}

/// Event as delivered to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PushEvent {
    /// An order changed state.
    OrderChanged(PushOrderChanged),
}

impl RawPushEvent {
    /// Subscription topic that carries this event.
    #[must_use]
    pub const fn topic(&self) -> TopicType {
        match self {
            Self::OrderChanged(_) => TopicType::Private,
        }
    }
}

impl TryFrom<RawPushEvent> for PushEvent {
    type Error = HawserError;

    fn try_from(raw: RawPushEvent) -> Result<Self, Self::Error> {
        match raw {
            RawPushEvent::OrderChanged(order) => Ok(Self::OrderChanged(order.try_into()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_date_rejects_impossible_days() {
        let err = NaiveDate::try_from(RawDate {
            year: 2023,
            month: 2,
            day: 29,
        })
        .unwrap_err();
        assert!(matches!(err, HawserError::InvalidRecord(_)));
    }

    #[test]
    fn raw_datetime_roundtrip() {
        let raw = RawDateTime {
            date: RawDate {
                year: 2024,
                month: 2,
                day: 29,
            },
            time: RawTime {
                hour: 23,
                minute: 59,
                second: 58,
            },
        };
        let rich = NaiveDateTime::try_from(raw).unwrap();
        assert_eq!(RawDateTime::from(rich), raw);
    }

    #[test]
    fn raw_decimal_out_of_range_is_invalid_format() {
        let err = Decimal::try_from(RawDecimal::new(1, 40)).unwrap_err();
        assert!(matches!(err, HawserError::InvalidFormat(_)));
    }
}
