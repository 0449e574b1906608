//! Static per-model pricing for cost accounting.

use tracing::warn;

/// USD per 1K tokens (input, output) for known models.
const PRICING: &[(&str, f64, f64)] = &[
    ("openai/gpt-4o", 0.005, 0.015),
    ("openai/gpt-4-turbo", 0.01, 0.03),
    ("anthropic/claude-3.5-sonnet", 0.003, 0.015),
    ("meta-llama/llama-3.1-70b-instruct", 0.00054, 0.00081),
    ("gpt-oss-120b", 0.0, 0.0),
];

/// Estimated cost in USD for one call. Unknown models cost 0.0 and log a
/// warning so missing table entries surface in ops review.
pub fn cost_for(model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
    match PRICING.iter().find(|(name, _, _)| *name == model) {
        Some((_, input_rate, output_rate)) => {
            (f64::from(input_tokens) / 1000.0) * input_rate
                + (f64::from(output_tokens) / 1000.0) * output_rate
        }
        None => {
            warn!(model = %model, "Pricing not found for model");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_cost() {
        let cost = cost_for("openai/gpt-4o", 1000, 1000);
        assert!((cost - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_model_costs_zero() {
        assert_eq!(cost_for("mystery/model", 5000, 5000), 0.0);
    }

    #[test]
    fn test_zero_tokens_cost_zero() {
        assert_eq!(cost_for("openai/gpt-4o", 0, 0), 0.0);
    }
}
