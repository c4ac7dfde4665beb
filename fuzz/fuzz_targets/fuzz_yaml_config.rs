#![no_main]

use figment::Figment;
use figment::providers::{Format, Serialized, Yaml};
use libfuzzer_sys::fuzz_target;
use socckit::AppConfig;
use socctrader::config::SocctraderConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let loaded: Result<AppConfig, _> = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::string(s))
            .extract();
        if let Ok(config) = loaded {
            if let Ok(module) = config.module_config_or_default::<SocctraderConfig>("socctrader") {
                let _ = module.validate();
            }
        }
    }
});
