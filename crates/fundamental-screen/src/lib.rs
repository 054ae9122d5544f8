//! Financial-ratio screening: key ratios from a company's statements, a
//! per-ratio health assessment, a dividend-discount intrinsic value, and a
//! margin-of-safety investment recommendation.

use serde::{Deserialize, Serialize};

use eval_core::EvalError;

/// Point-in-time company financials used by the screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub total_current_assets: f64,
    pub total_current_liabilities: f64,
    pub total_liabilities: f64,
    pub total_shareholders_equity: f64,
    pub total_assets: f64,
    pub net_income: f64,
    pub revenue: f64,
    pub cost_of_goods_sold: f64,
    pub dividend_per_share: f64,
}

/// Key financial ratios. Margins and returns are percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialRatios {
    pub current_ratio: f64,
    pub debt_to_equity: f64,
    pub return_on_equity: f64,
    pub return_on_assets: f64,
    pub gross_margin: f64,
    pub net_profit_margin: f64,
}

/// Qualitative grade for a single ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Health {
    Strong,
    Adequate,
    Weak,
}

impl Health {
    fn score(self) -> f64 {
        match self {
            Health::Strong => 1.0,
            Health::Adequate => 0.5,
            Health::Weak => 0.0,
        }
    }
}

/// Per-ratio health grades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub current_ratio: Health,
    pub debt_to_equity: Health,
    pub return_on_equity: Health,
    pub return_on_assets: Health,
    pub gross_margin: Health,
    pub net_profit_margin: Health,
}

impl HealthAssessment {
    /// Average grade score in [0, 1].
    pub fn score(&self) -> f64 {
        let grades = [
            self.current_ratio,
            self.debt_to_equity,
            self.return_on_equity,
            self.return_on_assets,
            self.gross_margin,
            self.net_profit_margin,
        ];
        grades.iter().map(|g| g.score()).sum::<f64>() / grades.len() as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
}

/// Compute the key ratios from a statement. Zero denominators make a ratio
/// undefined and fail the whole screen.
pub fn financial_ratios(statement: &FinancialStatement) -> Result<FinancialRatios, EvalError> {
    for (name, denom) in [
        ("total_current_liabilities", statement.total_current_liabilities),
        ("total_shareholders_equity", statement.total_shareholders_equity),
        ("total_assets", statement.total_assets),
        ("revenue", statement.revenue),
    ] {
        if denom == 0.0 {
            return Err(EvalError::DegenerateInput(format!(
                "{name} is zero, ratios are undefined"
            )));
        }
    }

    Ok(FinancialRatios {
        current_ratio: statement.total_current_assets / statement.total_current_liabilities,
        debt_to_equity: statement.total_liabilities / statement.total_shareholders_equity,
        return_on_equity: statement.net_income / statement.total_shareholders_equity * 100.0,
        return_on_assets: statement.net_income / statement.total_assets * 100.0,
        gross_margin: (statement.revenue - statement.cost_of_goods_sold) / statement.revenue
            * 100.0,
        net_profit_margin: statement.net_income / statement.revenue * 100.0,
    })
}

/// Grade each ratio against fixed screening thresholds.
pub fn assess_health(ratios: &FinancialRatios) -> HealthAssessment {
    let grade = |value: f64, strong: f64, adequate: f64| {
        if value > strong {
            Health::Strong
        } else if value > adequate {
            Health::Adequate
        } else {
            Health::Weak
        }
    };

    HealthAssessment {
        current_ratio: if ratios.current_ratio > 1.5 {
            Health::Strong
        } else {
            Health::Weak
        },
        debt_to_equity: if ratios.debt_to_equity < 1.0 {
            Health::Strong
        } else {
            Health::Weak
        },
        return_on_equity: grade(ratios.return_on_equity, 15.0, 10.0),
        return_on_assets: grade(ratios.return_on_assets, 10.0, 5.0),
        gross_margin: grade(ratios.gross_margin, 50.0, 30.0),
        net_profit_margin: grade(ratios.net_profit_margin, 20.0, 10.0),
    }
}

/// Gordon growth dividend-discount intrinsic value.
pub fn intrinsic_value(
    dividend_per_share: f64,
    growth_rate: f64,
    required_rate_of_return: f64,
) -> Result<f64, EvalError> {
    if required_rate_of_return <= growth_rate {
        return Err(EvalError::DegenerateInput(format!(
            "required rate {required_rate_of_return} must exceed growth rate {growth_rate}"
        )));
    }
    Ok(dividend_per_share * (1.0 + growth_rate) / (required_rate_of_return - growth_rate))
}

/// Margin-of-safety recommendation given the current price, the intrinsic
/// value estimate and the health assessment.
pub fn recommend(
    current_price: f64,
    intrinsic_value: f64,
    health: &HealthAssessment,
) -> Result<Recommendation, EvalError> {
    if intrinsic_value == 0.0 {
        return Err(EvalError::DegenerateInput(
            "intrinsic value is zero, margin of safety is undefined".to_string(),
        ));
    }

    let margin_of_safety = (intrinsic_value - current_price) / intrinsic_value * 100.0;
    let score = health.score();

    if margin_of_safety > 20.0 && score > 0.7 {
        Ok(Recommendation::Buy)
    } else if margin_of_safety > 10.0 && score > 0.5 {
        Ok(Recommendation::Hold)
    } else {
        Ok(Recommendation::Sell)
    }
}
