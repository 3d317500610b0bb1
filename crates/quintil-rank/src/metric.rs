//! Supported ranking metrics.
//!
//! The allow-list is the set of WRDS financial ratios available in the
//! index fundamentals extracts. Each metric carries its canonical column
//! name, a human-readable description and a category.

use quintil_traits::QuintilError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Metric category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricCategory {
    /// Price multiples and yields
    Valuation,
    /// Margins and returns on capital
    Profitability,
    /// Capital structure
    Capitalization,
    /// Balance sheet and cash flow health
    FinancialSoundness,
    /// Leverage and coverage
    Solvency,
    /// Short-term obligations
    Liquidity,
    /// Asset utilization and turnover
    Efficiency,
    /// Expense intensity and accruals
    Other,
}

impl MetricCategory {
    /// All categories in listing order.
    pub const ALL: [Self; 8] = [
        Self::Valuation,
        Self::Profitability,
        Self::Capitalization,
        Self::FinancialSoundness,
        Self::Solvency,
        Self::Liquidity,
        Self::Efficiency,
        Self::Other,
    ];

    /// Short identifier used on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Valuation => "valuation",
            Self::Profitability => "profitability",
            Self::Capitalization => "capitalization",
            Self::FinancialSoundness => "soundness",
            Self::Solvency => "solvency",
            Self::Liquidity => "liquidity",
            Self::Efficiency => "efficiency",
            Self::Other => "other",
        }
    }

    /// Get a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Valuation => "Price multiples and yields comparing market value to fundamentals",
            Self::Profitability => "Margins and after-tax returns on equity, assets and capital",
            Self::Capitalization => "Mix of debt and equity in invested capital",
            Self::FinancialSoundness => "Debt composition, cash coverage and asset quality",
            Self::Solvency => "Overall leverage and interest coverage",
            Self::Liquidity => "Ability to meet short-term obligations",
            Self::Efficiency => "Turnover of assets, receivables, payables and capital",
            Self::Other => "R&D, advertising and labor intensity, accruals",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricCategory {
    type Err = QuintilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', '_', ' '], "");
        Self::ALL
            .into_iter()
            .find(|c| c.name() == key || (key == "financialsoundness" && *c == Self::FinancialSoundness))
            .ok_or_else(|| QuintilError::Validation(format!("unknown metric category '{s}'")))
    }
}

macro_rules! metrics {
    ($($variant:ident => $name:literal, $category:ident, $desc:literal;)*) => {
        /// A supported ranking metric.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Metric {
            $(
                #[doc = $desc]
                #[serde(rename = $name)]
                $variant,
            )*
        }

        impl Metric {
            /// Every supported metric in listing order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            /// Canonical column name in the fundamentals data.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// Human-readable description.
            #[must_use]
            pub const fn description(&self) -> &'static str {
                match self {
                    $(Self::$variant => $desc,)*
                }
            }

            /// Category classification.
            #[must_use]
            pub const fn category(&self) -> MetricCategory {
                match self {
                    $(Self::$variant => MetricCategory::$category,)*
                }
            }
        }
    };
}

metrics! {
    Capei => "CAPEI", Valuation, "Shiller's Cyclically Adjusted P/E Ratio";
    Bm => "bm", Valuation, "Book/Market";
    Evm => "evm", Valuation, "Enterprise Value Multiple";
    PeOpBasic => "pe_op_basic", Valuation, "Price/Operating Earnings (Basic, Excl. EI)";
    PeOpDil => "pe_op_dil", Valuation, "Price/Operating Earnings (Diluted, Excl. EI)";
    PeExi => "pe_exi", Valuation, "P/E (Diluted, Excl. EI)";
    PeInc => "pe_inc", Valuation, "P/E (Diluted, Incl. EI)";
    Ps => "ps", Valuation, "Price/Sales";
    Pcf => "pcf", Valuation, "Price/Cash flow";
    Dpr => "dpr", Valuation, "Dividend Payout Ratio";
    Npm => "npm", Profitability, "Net Profit Margin";
    Opmbd => "opmbd", Profitability, "Operating Profit Margin Before Depreciation";
    Opmad => "opmad", Profitability, "Operating Profit Margin After Depreciation";
    Gpm => "gpm", Profitability, "Gross Profit Margin";
    Ptpm => "ptpm", Profitability, "Pre-tax Profit Margin";
    Cfm => "cfm", Profitability, "Cash Flow Margin";
    Roa => "roa", Profitability, "Return on Assets";
    Roe => "roe", Profitability, "Return on Equity";
    Roce => "roce", Profitability, "Return on Capital Employed";
    Efftax => "efftax", Profitability, "Effective Tax Rate";
    AftretEq => "aftret_eq", Profitability, "After-tax Return on Average Common Equity";
    AftretInvcapx => "aftret_invcapx", Profitability, "After-tax Return on Invested Capital";
    AftretEquity => "aftret_equity", Profitability, "After-tax Return on Total Stockholders' Equity";
    PretretNoa => "pretret_noa", Profitability, "Pre-tax Return on Net Operating Assets";
    PretretEarnat => "pretret_earnat", Profitability, "Pre-tax Return on Total Earning Assets";
    GProf => "GProf", Profitability, "Gross Profit/Total Assets";
    EquityInvcap => "equity_invcap", Capitalization, "Common Equity/Invested Capital";
    DebtInvcap => "debt_invcap", Capitalization, "Long-term Debt/Invested Capital";
    TotdebtInvcap => "totdebt_invcap", Capitalization, "Total Debt/Invested Capital";
    CapitalRatio => "capital_ratio", Capitalization, "Capitalization Ratio";
    IntDebt => "int_debt", FinancialSoundness, "Interest/Average Long-term Debt";
    IntTotdebt => "int_totdebt", FinancialSoundness, "Interest/Average Total Debt";
    CashLt => "cash_lt", FinancialSoundness, "Cash Balance/Total Liabilities";
    InvtAct => "invt_act", FinancialSoundness, "Inventory/Current Assets";
    RectAct => "rect_act", FinancialSoundness, "Receivables/Current Assets";
    DebtAt => "debt_at", FinancialSoundness, "Total Debt/Total Assets";
    DebtEbitda => "debt_ebitda", FinancialSoundness, "Total Debt/EBITDA";
    ShortDebt => "short_debt", FinancialSoundness, "Short-Term Debt/Total Debt";
    CurrDebt => "curr_debt", FinancialSoundness, "Current Liabilities/Total Liabilities";
    LtDebt => "lt_debt", FinancialSoundness, "Long-term Debt/Total Liabilities";
    ProfitLct => "profit_lct", FinancialSoundness, "Profit Before Depreciation/Current Liabilities";
    OcfLct => "ocf_lct", FinancialSoundness, "Operating CF/Current Liabilities";
    CashDebt => "cash_debt", FinancialSoundness, "Cash Flow/Total Debt";
    FcfOcf => "fcf_ocf", FinancialSoundness, "Free Cash Flow/Operating Cash Flow";
    LtPpent => "lt_ppent", FinancialSoundness, "Total Liabilities/Total Tangible Assets";
    DlttBe => "dltt_be", FinancialSoundness, "Long-term Debt/Book Equity";
    DebtAssets => "debt_assets", Solvency, "Total Debt/Total Assets";
    DebtCapital => "debt_capital", Solvency, "Total Debt/Capital";
    DeRatio => "de_ratio", Solvency, "Total Debt/Equity";
    Intcov => "intcov", Solvency, "After-tax Interest Coverage";
    IntcovRatio => "intcov_ratio", Solvency, "Interest Coverage Ratio";
    CashRatio => "cash_ratio", Liquidity, "Cash Ratio";
    QuickRatio => "quick_ratio", Liquidity, "Quick Ratio (Acid Test)";
    CurrRatio => "curr_ratio", Liquidity, "Current Ratio";
    CashConversion => "cash_conversion", Liquidity, "Cash Conversion Cycle (Days)";
    InvTurn => "inv_turn", Efficiency, "Inventory Turnover";
    AtTurn => "at_turn", Efficiency, "Asset Turnover";
    RectTurn => "rect_turn", Efficiency, "Receivables Turnover";
    PayTurn => "pay_turn", Efficiency, "Payables Turnover";
    SaleInvcap => "sale_invcap", Efficiency, "Sales/Invested Capital";
    SaleEquity => "sale_equity", Efficiency, "Sales/Stockholders' Equity";
    SaleNwc => "sale_nwc", Efficiency, "Sales/Working Capital";
    RdSale => "rd_sale", Other, "Research and Development/Sales";
    AdvSale => "adv_sale", Other, "Advertising Expenses/Sales";
    StaffSale => "staff_sale", Other, "Labor Expenses/Sales";
    Accrual => "accrual", Other, "Accruals/Average Assets";
    Ptb => "ptb", Valuation, "Price/Book";
    PegTrailing => "PEG_trailing", Valuation, "Trailing P/E to Growth (PEG) ratio";
    Divyield => "divyield", Valuation, "Dividend Yield";
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = QuintilError;

    /// Case-insensitive lookup on the canonical name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                QuintilError::Validation(format!(
                    "unsupported metric '{name}'; choose one of: {}",
                    Self::ALL
                        .iter()
                        .map(Self::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Metadata about a metric, for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricInfo {
    /// Canonical column name
    pub name: &'static str,

    /// Category classification
    pub category: MetricCategory,

    /// Human-readable description
    pub description: &'static str,
}

impl From<Metric> for MetricInfo {
    fn from(metric: Metric) -> Self {
        Self {
            name: metric.as_str(),
            category: metric.category(),
            description: metric.description(),
        }
    }
}

/// Get information about all supported metrics.
#[must_use]
pub fn available_metrics() -> Vec<MetricInfo> {
    Metric::ALL.iter().copied().map(MetricInfo::from).collect()
}

/// Get all metrics in a specific category.
#[must_use]
pub fn metrics_by_category(category: MetricCategory) -> Vec<MetricInfo> {
    available_metrics()
        .into_iter()
        .filter(|info| info.category == category)
        .collect()
}

/// Get information about a specific metric by name (case-insensitive).
#[must_use]
pub fn get_metric_info(name: &str) -> Option<MetricInfo> {
    name.parse::<Metric>().ok().map(MetricInfo::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_allow_list_size_and_uniqueness() {
        assert_eq!(Metric::ALL.len(), 69);
        let names: HashSet<&str> = Metric::ALL.iter().map(Metric::as_str).collect();
        assert_eq!(names.len(), 69);
    }

    #[test]
    fn test_every_category_populated() {
        let total: usize = MetricCategory::ALL
            .iter()
            .map(|c| metrics_by_category(*c).len())
            .sum();
        assert_eq!(total, 69);
        assert_eq!(metrics_by_category(MetricCategory::Liquidity).len(), 4);
        assert_eq!(metrics_by_category(MetricCategory::Valuation).len(), 13);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        assert_eq!("CAPEI".parse::<Metric>().unwrap(), Metric::Capei);
        assert_eq!("capei".parse::<Metric>().unwrap(), Metric::Capei);
        assert_eq!("gprof".parse::<Metric>().unwrap(), Metric::GProf);
        assert_eq!(" peg_trailing ".parse::<Metric>().unwrap(), Metric::PegTrailing);
    }

    #[test]
    fn test_unknown_metric_is_validation_error() {
        let err = "momentum".parse::<Metric>().unwrap_err();
        assert!(matches!(err, QuintilError::Validation(_)));
        assert!(get_metric_info("momentum").is_none());
    }

    #[test]
    fn test_metric_info() {
        let info = get_metric_info("bm").unwrap();
        assert_eq!(info.name, "bm");
        assert_eq!(info.category, MetricCategory::Valuation);
        assert_eq!(info.description, "Book/Market");
        assert_eq!(Metric::DeRatio.to_string(), "de_ratio");
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(
            "financial-soundness".parse::<MetricCategory>().unwrap(),
            MetricCategory::FinancialSoundness
        );
        assert_eq!(
            "Soundness".parse::<MetricCategory>().unwrap(),
            MetricCategory::FinancialSoundness
        );
        assert!("growth".parse::<MetricCategory>().is_err());
    }
}
