use super::normalizer::{parse_decimal, parse_flag};
use crate::domain::{
    CardDetails, CardRecord, CardStatus, RewardSchedule, RewardType, MAX_MONTHLY_AMOUNT,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use tracing::warn;

pub(crate) const REQUIRED_COLUMNS: [&str; 2] = ["Card Name", "Fee"];

/// Raw catalog row; every cell is optional text until defaults are resolved.
#[derive(Debug, Deserialize)]
pub(crate) struct CardRow {
    #[serde(rename = "Card Name", default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(rename = "Fee", default, deserialize_with = "empty_string_as_none")]
    fee: Option<String>,
    #[serde(rename = "Min Income", default, deserialize_with = "empty_string_as_none")]
    min_income: Option<String>,
    #[serde(rename = "Online Rate", default, deserialize_with = "empty_string_as_none")]
    online_rate: Option<String>,
    #[serde(rename = "Travel Rate", default, deserialize_with = "empty_string_as_none")]
    travel_rate: Option<String>,
    #[serde(rename = "Dining Rate", default, deserialize_with = "empty_string_as_none")]
    dining_rate: Option<String>,
    #[serde(rename = "Utility Rate", default, deserialize_with = "empty_string_as_none")]
    utility_rate: Option<String>,
    #[serde(rename = "UPI Rate", default, deserialize_with = "empty_string_as_none")]
    upi_rate: Option<String>,
    #[serde(rename = "Base Rate", default, deserialize_with = "empty_string_as_none")]
    base_rate: Option<String>,
    #[serde(rename = "Monthly Cap", default, deserialize_with = "empty_string_as_none")]
    monthly_cap: Option<String>,
    #[serde(rename = "Lounge Access", default, deserialize_with = "empty_string_as_none")]
    lounge_access: Option<String>,
    #[serde(rename = "Reward Type", default, deserialize_with = "empty_string_as_none")]
    reward_type: Option<String>,
    #[serde(rename = "Pro_Reason", default, deserialize_with = "empty_string_as_none")]
    pro_reason: Option<String>,
    #[serde(rename = "Con_Reason", default, deserialize_with = "empty_string_as_none")]
    con_reason: Option<String>,
    #[serde(rename = "Market_Rating", default, deserialize_with = "empty_string_as_none")]
    market_rating: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(rename = "Warning_Text", default, deserialize_with = "empty_string_as_none")]
    warning_text: Option<String>,
    #[serde(rename = "Image_URL", default, deserialize_with = "empty_string_as_none")]
    image_url: Option<String>,
    #[serde(rename = "Apply_Link", default, deserialize_with = "empty_string_as_none")]
    apply_link: Option<String>,
}

/// Why a row could not become a card.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum RowRejection {
    #[error("missing card name")]
    MissingName,
    #[error("card '{name}' has no readable fee")]
    InvalidFee { name: String },
}

impl CardRow {
    /// Resolves defaults once so the engine never sees a missing value.
    pub(crate) fn into_record(self) -> Result<CardRecord, RowRejection> {
        let name = self.name.ok_or(RowRejection::MissingName)?;
        let fee = self
            .fee
            .as_deref()
            .and_then(parse_decimal)
            .ok_or_else(|| RowRejection::InvalidFee { name: name.clone() })?;
        let fee = non_negative(&name, "Fee", fee);

        let min_income = amount(&name, "Min Income", self.min_income.as_deref())
            .unwrap_or(Decimal::ZERO);

        let rate_or = |column, raw: &Option<String>, default| {
            rate(&name, column, raw.as_deref()).unwrap_or(default)
        };
        let base = rate_or("Base Rate", &self.base_rate, Decimal::ZERO);
        let rates = RewardSchedule {
            online: rate_or("Online Rate", &self.online_rate, Decimal::ZERO),
            travel: rate_or("Travel Rate", &self.travel_rate, Decimal::ZERO),
            dining: rate_or("Dining Rate", &self.dining_rate, Decimal::ZERO),
            utilities: rate_or("Utility Rate", &self.utility_rate, base),
            upi: rate_or("UPI Rate", &self.upi_rate, Decimal::ZERO),
            base,
        };

        let monthly_cap = amount(&name, "Monthly Cap", self.monthly_cap.as_deref());
        let lounge_access = self.lounge_access.as_deref().map(parse_flag).unwrap_or(false);
        let reward_type = self
            .reward_type
            .as_deref()
            .map(RewardType::parse)
            .unwrap_or_default();

        let defaults = CardDetails::default();
        let details = CardDetails {
            pro_reason: self.pro_reason.unwrap_or(defaults.pro_reason),
            con_reason: self.con_reason.unwrap_or(defaults.con_reason),
            market_rating: self.market_rating.as_deref().and_then(parse_decimal),
            status: self
                .status
                .as_deref()
                .map(CardStatus::parse)
                .unwrap_or_default(),
            warning_text: self.warning_text,
            image_url: self.image_url,
            apply_link: self.apply_link,
        };

        Ok(CardRecord {
            name,
            fee,
            min_income,
            lounge_access,
            rates,
            monthly_cap,
            reward_type,
            details,
        })
    }
}

fn amount(card: &str, column: &'static str, raw: Option<&str>) -> Option<Decimal> {
    let raw = raw?;
    match parse_decimal(raw) {
        Some(value) => Some(bounded(card, column, non_negative(card, column, value))),
        None => {
            warn!(card, column, value = raw, "unreadable catalog amount, using default");
            None
        }
    }
}

fn rate(card: &str, column: &'static str, raw: Option<&str>) -> Option<Decimal> {
    let value = amount(card, column, raw)?;
    if value > Decimal::ONE_HUNDRED {
        warn!(card, column, %value, "reward rate above 100%, clamping");
        return Some(Decimal::ONE_HUNDRED);
    }
    Some(value)
}

fn bounded(card: &str, column: &'static str, value: Decimal) -> Decimal {
    if value > MAX_MONTHLY_AMOUNT {
        warn!(card, column, %value, "catalog amount out of range, clamping");
        MAX_MONTHLY_AMOUNT
    } else {
        value
    }
}

fn non_negative(card: &str, column: &'static str, value: Decimal) -> Decimal {
    if value < Decimal::ZERO {
        warn!(card, column, %value, "negative catalog value, clamping to zero");
        Decimal::ZERO
    } else {
        value
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
