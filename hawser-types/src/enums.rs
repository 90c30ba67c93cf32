//! Boundary enumerations.
//!
//! Each enum here is the rich counterpart of a compact integer tag used at the boundary. The
//! mapping is derived from the enum declaration itself, so the two directions cannot drift.
use serde::{Deserialize, Serialize};

use crate::HawserError;
use hawser_macros::BoundaryEnum;

/// Two-way mapping between an enumeration and its boundary tag and wire name.
///
/// Implement with `#[derive(BoundaryEnum)]`. `from_tag` is total over `i32`: every tag outside
/// the declared table is an [`HawserError::UnknownVariant`], never a default.
pub trait BoundaryEnum: Sized + Copy + 'static {
    /// Enumeration name used in error messages.
    const NAME: &'static str;
    /// Every variant, in declaration order.
    const VARIANTS: &'static [Self];

    /// Boundary tag for this variant.
    fn to_tag(self) -> i32;

    /// Variant for a boundary tag.
    ///
    /// # Errors
    /// Returns `UnknownVariant` if `tag` is not in the table.
    fn from_tag(tag: i32) -> Result<Self, HawserError>;

    /// Wire name of this variant.
    fn as_str(self) -> &'static str;

    /// Variant for a wire name.
    ///
    /// # Errors
    /// Returns `InvalidFormat` if `name` is not in the table.
    fn from_name(name: &str) -> Result<Self, HawserError>;
}

/// Language identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, BoundaryEnum)]
#[allow(non_camel_case_types)]
pub enum Language {
    /// zh-CN
    #[boundary(rename = "zh-CN")]
    ZH_CN,
    /// zh-HK
    #[boundary(rename = "zh-HK")]
    ZH_HK,
    /// en
    #[default]
    #[boundary(rename = "en")]
    EN,
}

/// Market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BoundaryEnum)]
#[allow(clippy::upper_case_acronyms)]
pub enum Market {
    /// Unknown
    Unknown,
    /// US market
    US,
    /// HK market
    HK,
    /// CN market
    CN,
    /// SG market
    SG,
}

/// Candlestick period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BoundaryEnum)]
pub enum Period {
    /// Unknown
    Unknown,
    /// One minute
    #[boundary(rename = "1m")]
    Min1,
    /// Five minutes
    #[boundary(rename = "5m")]
    Min5,
    /// Fifteen minutes
    #[boundary(rename = "15m")]
    Min15,
    /// Thirty minutes
    #[boundary(rename = "30m")]
    Min30,
    /// Sixty minutes
    #[boundary(rename = "60m")]
    Min60,
    /// One day
    #[boundary(rename = "day")]
    Day,
    /// One week
    #[boundary(rename = "week")]
    Week,
    /// One month
    #[boundary(rename = "month")]
    Month,
    /// One year
    #[boundary(rename = "year")]
    Year,
}

/// Security trade status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BoundaryEnum)]
pub enum TradeStatus {
    /// Normal
    Normal,
    /// Suspension
    Halted,
    /// Delisted
    Delisted,
    /// Fuse
    Fuse,
    /// Prepare List
    PrepareList,
    /// Code Moved
    CodeMoved,
    /// To Be Opened
    ToBeOpened,
    /// Split Stock Halts
    SplitStockHalts,
    /// Expired
    Expired,
    /// Warrant To BeListed
    WarrantPrepareList,
    /// Suspend
    Suspend,
}

/// Topic type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BoundaryEnum)]
pub enum TopicType {
    /// Private notification for trade
    #[boundary(rename = "private")]
    Private,
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BoundaryEnum)]
pub enum OrderSide {
    /// Unknown
    Unknown,
    /// Buy
    Buy,
    /// Sell
    Sell,
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BoundaryEnum)]
#[allow(clippy::upper_case_acronyms)]
pub enum OrderType {
    /// Unknown
    Unknown,
    /// Limit Order
    LO,
    /// Enhanced Limit Order
    ELO,
    /// Market Order
    MO,
    /// At-auction Order
    AO,
    /// At-auction Limit Order
    ALO,
    /// Odd Lots
    ODD,
    /// Limit If Touched
    LIT,
    /// Market If Touched
    MIT,
    /// Trailing Limit If Touched (Trailing Amount)
    TSLPAMT,
    /// Trailing Limit If Touched (Trailing Percent)
    TSLPPCT,
    /// Trailing Market If Touched (Trailing Amount)
    TSMAMT,
    /// Trailing Market If Touched (Trailing Percent)
    TSMPCT,
    /// Special Limit Order
    SLO,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BoundaryEnum)]
pub enum OrderStatus {
    /// Unknown
    Unknown,
    /// Not reported
    NotReported,
    /// Not reported (Replaced Order)
    ReplacedNotReported,
    /// Not reported (Protected Order)
    ProtectedNotReported,
    /// Not reported (Conditional Order)
    VarietiesNotReported,
    /// Filled
    #[boundary(rename = "FilledStatus")]
    Filled,
    /// Wait To New
    WaitToNew,
    /// New
    #[boundary(rename = "NewStatus")]
    New,
    /// Wait To Replace
    WaitToReplace,
    /// Pending Replace
    #[boundary(rename = "PendingReplaceStatus")]
    PendingReplace,
    /// Replaced
    #[boundary(rename = "ReplacedStatus")]
    Replaced,
    /// Partial Filled
    #[boundary(rename = "PartialFilledStatus")]
    PartialFilled,
    /// Wait To Cancel
    WaitToCancel,
    /// Pending Cancel
    #[boundary(rename = "PendingCancelStatus")]
    PendingCancel,
    /// Rejected
    #[boundary(rename = "RejectedStatus")]
    Rejected,
    /// Canceled
    #[boundary(rename = "CanceledStatus")]
    Canceled,
    /// Expired
    #[boundary(rename = "ExpiredStatus")]
    Expired,
    /// Partial Withdrawal
    PartialWithdrawal,
}

/// Order tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BoundaryEnum)]
pub enum OrderTag {
    /// Unknown
    Unknown,
    /// Normal Order
    Normal,
    /// Long term Order
    #[boundary(rename = "GTC")]
    LongTerm,
    /// Grey Order
    Grey,
    /// Force Selling
    MarginCall,
    /// OTC
    Offline,
    /// Option Exercise Long
    Creditor,
    /// Option Exercise Short
    Debtor,
    /// Wavier Of Option Exercise
    NonExercise,
    /// Trade Allocation
    AllocatedSub,
}

/// Conditional order trigger status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BoundaryEnum)]
pub enum TriggerStatus {
    /// Unknown
    Unknown,
    /// Deactive
    #[boundary(rename = "DEACTIVE")]
    Deactive,
    /// Active
    #[boundary(rename = "ACTIVE")]
    Active,
    /// Released
    #[boundary(rename = "RELEASED")]
    Released,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_tags_follow_declaration_order() {
        assert_eq!(Language::ZH_CN.to_tag(), 0);
        assert_eq!(Language::ZH_HK.to_tag(), 1);
        assert_eq!(Language::EN.to_tag(), 2);
        assert_eq!(Language::EN.as_str(), "en");
    }

    #[test]
    fn wire_names_differ_from_variant_names_where_declared() {
        assert_eq!(OrderStatus::Filled.as_str(), "FilledStatus");
        assert_eq!(OrderTag::LongTerm.to_string(), "GTC");
        assert_eq!(
            "RELEASED".parse::<TriggerStatus>().unwrap(),
            TriggerStatus::Released
        );
    }

    #[test]
    fn negative_tag_is_unknown_variant() {
        let err = OrderSide::from_tag(-1).unwrap_err();
        assert_eq!(err, HawserError::unknown_variant("OrderSide", -1));
    }
}
