#![no_main]

use libfuzzer_sys::fuzz_target;
use tunerlink_core::config::TunerTestConfig;
use tunerlink_core::dataflow::determine_dataflows;
use tunerlink_core::registry::{ResourceRegistry, connect_hardware_to_test_cases};
use tunerlink_core::validator;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = TunerTestConfig::parse(text) else {
        return;
    };

    let mut registry = ResourceRegistry::new();
    connect_hardware_to_test_cases(&config, &mut registry);
    if let Ok(validated) = validator::validate(&config, &registry) {
        let plan = determine_dataflows(&validated);
        // 같은 입력에 대해 결정 결과는 항상 같아야 함
        assert_eq!(plan, determine_dataflows(&validated));
    }
});
