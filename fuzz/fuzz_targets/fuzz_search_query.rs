#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::json;
use socctrader::infra::search::Query;

fuzz_target!(|data: &[u8]| {
    // Limit input size to avoid OOM on pathological inputs
    if data.len() > 1024 {
        return;
    }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(query) = Query::parse(s) {
            let doc = json!({
                "id": 1,
                "version": 2,
                "teamName": "Real Club Celta",
                "amount": "1.50",
                "currency": "EUR",
                "leagueId": null
            });
            let _ = query.matches(&doc);
        }
    }
});
