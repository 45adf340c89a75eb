use serde::Serialize;

/// Display-only EMI quote for the fee calculator. No money moves here.
#[derive(Debug, Serialize, PartialEq)]
pub struct EmiQuote {
    pub principal: f64,
    pub annual_rate_pct: f64,
    pub tenure_months: u32,
    pub monthly_installment: f64,
    pub total_payable: f64,
    pub total_interest: f64,
}

/// Standard reducing-balance EMI: P * r * (1+r)^n / ((1+r)^n - 1) with r the
/// monthly rate. A zero rate degenerates to straight division. Returns
/// `None` for non-positive principal, zero tenure, or a negative/non-finite
/// rate.
pub fn calculate_emi(principal: f64, annual_rate_pct: f64, tenure_months: u32) -> Option<EmiQuote> {
    if !principal.is_finite() || principal <= 0.0 {
        return None;
    }
    if !annual_rate_pct.is_finite() || annual_rate_pct < 0.0 {
        return None;
    }
    if tenure_months == 0 {
        return None;
    }

    let n = tenure_months as f64;
    let monthly_rate = annual_rate_pct / 12.0 / 100.0;

    let monthly_installment = if monthly_rate == 0.0 {
        principal / n
    } else {
        let growth = (1.0 + monthly_rate).powf(n);
        principal * monthly_rate * growth / (growth - 1.0)
    };

    let monthly_installment = round_rupees(monthly_installment);
    let total_payable = round_rupees(monthly_installment * n);
    let total_interest = round_rupees(total_payable - principal);

    Some(EmiQuote {
        principal,
        annual_rate_pct,
        tenure_months,
        monthly_installment,
        total_payable,
        total_interest,
    })
}

fn round_rupees(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_quote() {
        // 5 lakh over 5 years at 10%: the widely published figure.
        let quote = calculate_emi(500_000.0, 10.0, 60).unwrap();
        assert!((quote.monthly_installment - 10_623.52).abs() < 0.5);
        assert!(quote.total_interest > 0.0);
    }

    #[test]
    fn zero_rate_is_straight_division() {
        let quote = calculate_emi(120_000.0, 0.0, 12).unwrap();
        assert_eq!(quote.monthly_installment, 10_000.0);
        assert_eq!(quote.total_interest, 0.0);
    }

    #[test]
    fn rejects_degenerate_input() {
        assert!(calculate_emi(0.0, 10.0, 12).is_none());
        assert!(calculate_emi(-5.0, 10.0, 12).is_none());
        assert!(calculate_emi(100.0, -1.0, 12).is_none());
        assert!(calculate_emi(100.0, 10.0, 0).is_none());
        assert!(calculate_emi(f64::NAN, 10.0, 12).is_none());
    }
}
