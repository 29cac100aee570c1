use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

const HIDDEN_GEM_MULTIPLIER: Decimal = Decimal::from_parts(3, 0, 0, false, 0);

/// Qualitative ROI tier derived from net savings and fee alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    NegativeRoi,
    HiddenGem,
    TopPick,
    FairValue,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::NegativeRoi => "Negative ROI",
            Verdict::HiddenGem => "Hidden Gem",
            Verdict::TopPick => "Top Pick",
            Verdict::FairValue => "Fair Value",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn classify(net_savings: Decimal, fee: Decimal) -> Verdict {
    // Losing money outranks every other tier, including free cards.
    if net_savings < Decimal::ZERO {
        return Verdict::NegativeRoi;
    }

    if fee > Decimal::ZERO && net_savings >= fee * HIDDEN_GEM_MULTIPLIER {
        return Verdict::HiddenGem;
    }

    if fee.is_zero() && net_savings > Decimal::ZERO {
        return Verdict::TopPick;
    }

    Verdict::FairValue
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_savings_always_negative_roi() {
        for fee in [dec!(0), dec!(1), dec!(500), dec!(10000)] {
            assert_eq!(classify(dec!(-0.01), fee), Verdict::NegativeRoi);
        }
    }

    #[test]
    fn triple_fee_is_hidden_gem() {
        assert_eq!(classify(dec!(1600), dec!(500)), Verdict::HiddenGem);
        assert_eq!(classify(dec!(1500), dec!(500)), Verdict::HiddenGem);
        assert_eq!(classify(dec!(1499), dec!(500)), Verdict::FairValue);
    }

    #[test]
    fn free_profitable_card_is_top_pick() {
        assert_eq!(classify(dec!(1), dec!(0)), Verdict::TopPick);
        assert_eq!(classify(dec!(0), dec!(0)), Verdict::FairValue);
    }

    #[test]
    fn every_pair_maps_to_one_verdict() {
        let values = [dec!(-1000), dec!(-1), dec!(0), dec!(1), dec!(499), dec!(1500)];
        for net in values {
            for fee in [dec!(0), dec!(1), dec!(500)] {
                let verdict = classify(net, fee);
                if net < Decimal::ZERO {
                    assert_eq!(verdict, Verdict::NegativeRoi);
                }
                assert!(!verdict.label().is_empty());
            }
        }
    }
}
