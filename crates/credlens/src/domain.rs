use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of months used to annualize monthly spend and monthly caps.
pub const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Largest monthly amount (₹1 lakh crore) accepted for income, spend, or catalog money
/// columns. Keeps every product in the reward and break-even math inside `Decimal` range.
pub const MAX_MONTHLY_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Spend buckets a card can reward at different rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendCategory {
    Online,
    Travel,
    Dining,
    Utilities,
    Upi,
    Offline,
}

impl SpendCategory {
    pub const ALL: [SpendCategory; 6] = [
        SpendCategory::Online,
        SpendCategory::Travel,
        SpendCategory::Dining,
        SpendCategory::Utilities,
        SpendCategory::Upi,
        SpendCategory::Offline,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SpendCategory::Online => "Online",
            SpendCategory::Travel => "Travel",
            SpendCategory::Dining => "Dining",
            SpendCategory::Utilities => "Utilities",
            SpendCategory::Upi => "UPI",
            SpendCategory::Offline => "Offline",
        }
    }
}

impl fmt::Display for SpendCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Monthly spend of one user, split by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpendProfile {
    #[serde(default)]
    pub online: Decimal,
    #[serde(default)]
    pub travel: Decimal,
    #[serde(default)]
    pub dining: Decimal,
    #[serde(default)]
    pub utilities: Decimal,
    #[serde(default)]
    pub upi: Decimal,
    #[serde(default)]
    pub offline: Decimal,
}

impl SpendProfile {
    pub fn amount(&self, category: SpendCategory) -> Decimal {
        match category {
            SpendCategory::Online => self.online,
            SpendCategory::Travel => self.travel,
            SpendCategory::Dining => self.dining,
            SpendCategory::Utilities => self.utilities,
            SpendCategory::Upi => self.upi,
            SpendCategory::Offline => self.offline,
        }
    }

    pub fn total(&self) -> Decimal {
        SpendCategory::ALL
            .iter()
            .map(|category| self.amount(*category))
            .sum()
    }

    pub fn annual_total(&self) -> Decimal {
        self.total() * MONTHS_PER_YEAR
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        for category in SpendCategory::ALL {
            let amount = self.amount(category);
            if amount < Decimal::ZERO {
                return Err(ProfileError::NegativeSpend { category });
            }
            if amount > MAX_MONTHLY_AMOUNT {
                return Err(ProfileError::SpendTooLarge { category });
            }
        }
        Ok(())
    }
}

/// Rejection raised when a spend profile cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("{category} spend must not be negative")]
    NegativeSpend { category: SpendCategory },
    #[error("{category} spend exceeds the supported maximum of {max}", max = MAX_MONTHLY_AMOUNT)]
    SpendTooLarge { category: SpendCategory },
    #[error("income must not be negative")]
    NegativeIncome,
    #[error("income exceeds the supported maximum of {max}", max = MAX_MONTHLY_AMOUNT)]
    IncomeTooLarge,
}

/// Percentage reward rates per category, with load-time defaults already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardSchedule {
    pub online: Decimal,
    pub travel: Decimal,
    pub dining: Decimal,
    pub utilities: Decimal,
    pub upi: Decimal,
    pub base: Decimal,
}

impl RewardSchedule {
    /// Offline and uncategorized spend always earns the base rate.
    pub fn rate_for(&self, category: SpendCategory) -> Decimal {
        match category {
            SpendCategory::Online => self.online,
            SpendCategory::Travel => self.travel,
            SpendCategory::Dining => self.dining,
            SpendCategory::Utilities => self.utilities,
            SpendCategory::Upi => self.upi,
            SpendCategory::Offline => self.base,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    #[default]
    Cashback,
    Points,
    Miles,
    Other(String),
}

impl RewardType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cashback" | "cash back" => Self::Cashback,
            "points" | "reward points" => Self::Points,
            "miles" | "air miles" => Self::Miles,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RewardType::Cashback => "Cashback",
            RewardType::Points => "Points",
            RewardType::Miles => "Miles",
            RewardType::Other(label) => label,
        }
    }
}

/// Devaluation tracker tag attached to a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Hot,
    #[default]
    Stable,
    Devalued,
}

impl CardStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hot" => Self::Hot,
            "devalued" => Self::Devalued,
            _ => Self::Stable,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CardStatus::Hot => "Hot",
            CardStatus::Stable => "Stable",
            CardStatus::Devalued => "Devalued",
        }
    }
}

/// Descriptive fields shown next to a recommendation; never used in the math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub pro_reason: String,
    pub con_reason: String,
    pub market_rating: Option<Decimal>,
    pub status: CardStatus,
    pub warning_text: Option<String>,
    pub image_url: Option<String>,
    pub apply_link: Option<String>,
}

impl Default for CardDetails {
    fn default() -> Self {
        Self {
            pro_reason: "Great cashback rates.".to_string(),
            con_reason: "Check fee waiver limits.".to_string(),
            market_rating: None,
            status: CardStatus::Stable,
            warning_text: None,
            image_url: None,
            apply_link: None,
        }
    }
}

/// One catalog entry. Immutable once loaded into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub name: String,
    pub fee: Decimal,
    pub min_income: Decimal,
    pub lounge_access: bool,
    pub rates: RewardSchedule,
    /// `None` means the card never caps rewards.
    pub monthly_cap: Option<Decimal>,
    pub reward_type: RewardType,
    pub details: CardDetails,
}

impl CardRecord {
    pub fn annual_cap(&self) -> Option<Decimal> {
        self.monthly_cap.map(|cap| cap * MONTHS_PER_YEAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn total_sums_every_category() {
        let profile = SpendProfile {
            online: dec!(10000),
            travel: dec!(5000),
            dining: dec!(2000),
            utilities: dec!(1500),
            upi: dec!(500),
            offline: dec!(10000),
        };
        assert_eq!(profile.total(), dec!(29000));
        assert_eq!(profile.annual_total(), dec!(348000));
    }

    #[test]
    fn validate_rejects_negative_spend() {
        let profile = SpendProfile {
            dining: dec!(-1),
            ..SpendProfile::default()
        };
        assert_eq!(
            profile.validate(),
            Err(ProfileError::NegativeSpend {
                category: SpendCategory::Dining
            })
        );
        assert!(SpendProfile::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_spend_beyond_supported_range() {
        let profile = SpendProfile {
            online: dec!(2000000000000000000000000000),
            ..SpendProfile::default()
        };
        assert_eq!(
            profile.validate(),
            Err(ProfileError::SpendTooLarge {
                category: SpendCategory::Online
            })
        );

        let at_limit = SpendProfile {
            online: MAX_MONTHLY_AMOUNT,
            offline: MAX_MONTHLY_AMOUNT,
            ..SpendProfile::default()
        };
        assert!(at_limit.validate().is_ok());
        assert_eq!(at_limit.annual_total(), dec!(24000000000000));
        assert_eq!(MAX_MONTHLY_AMOUNT, dec!(1000000000000));
    }

    #[test]
    fn offline_spend_uses_base_rate() {
        let rates = RewardSchedule {
            base: dec!(1.5),
            online: dec!(5),
            ..RewardSchedule::default()
        };
        assert_eq!(rates.rate_for(SpendCategory::Offline), dec!(1.5));
        assert_eq!(rates.rate_for(SpendCategory::Online), dec!(5));
    }

    #[test]
    fn labels_parse_loosely() {
        assert_eq!(CardStatus::parse(" devalued "), CardStatus::Devalued);
        assert_eq!(CardStatus::parse("unknown"), CardStatus::Stable);
        assert_eq!(RewardType::parse("Cash Back"), RewardType::Cashback);
        assert_eq!(
            RewardType::parse("Vouchers"),
            RewardType::Other("Vouchers".to_string())
        );
    }
}
