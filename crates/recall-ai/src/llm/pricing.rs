//! Model pricing and cost calculation for LLM API calls.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Pricing per 1 million tokens (USD).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub cost_per_1m_input: f64,
    pub cost_per_1m_output: f64,
}

static PRICING: Lazy<HashMap<&'static str, ModelPricing>> = Lazy::new(|| {
    let entries: [(&str, f64, f64); 7] = [
        ("gpt-3.5-turbo", 0.50, 1.50),
        ("gpt-4o", 2.50, 10.00),
        ("gpt-4o-mini", 0.15, 0.60),
        ("gpt-4.1", 2.00, 8.00),
        ("gpt-4.1-mini", 0.40, 1.60),
        ("gpt-4.1-nano", 0.10, 0.40),
        ("text-embedding-3-small", 0.02, 0.0),
    ];
    entries
        .into_iter()
        .map(|(model, input, output)| {
            (
                model,
                ModelPricing {
                    cost_per_1m_input: input,
                    cost_per_1m_output: output,
                },
            )
        })
        .collect()
});

fn normalize(value: &str) -> String {
    let value = value.trim().to_ascii_lowercase();
    match value.split_once('/') {
        Some((_, tail)) => tail.to_string(),
        None => value,
    }
}

/// Look up pricing for a model, tolerating provider prefixes and dated suffixes.
pub fn get_pricing(model_name: &str) -> Option<ModelPricing> {
    let model = normalize(model_name);
    if let Some(pricing) = PRICING.get(model.as_str()) {
        return Some(*pricing);
    }

    // "gpt-4.1-mini-2025-04-14" -> longest known prefix
    PRICING
        .iter()
        .filter(|(known, _)| model.starts_with(*known))
        .max_by_key(|(known, _)| known.len())
        .map(|(_, pricing)| *pricing)
}

/// Cost in USD of a single call, if the model is priced.
pub fn calculate_cost(model_name: &str, prompt_tokens: u32, completion_tokens: u32) -> Option<f64> {
    let pricing = get_pricing(model_name)?;
    let input = prompt_tokens as f64 * pricing.cost_per_1m_input / 1_000_000.0;
    let output = completion_tokens as f64 * pricing.cost_per_1m_output / 1_000_000.0;
    Some(input + output)
}
