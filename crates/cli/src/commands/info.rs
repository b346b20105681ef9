//! `tandem info` — Static strategy descriptions.

use super::print_json;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    print_json(&tandem_agent::strategy_info())
}
