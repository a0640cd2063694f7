mod support;

use envcheck_core::{ValidationOptions, Validator, ValidatorConfig};
use support::FakeEnvironment;

#[test]
fn transcript_for_degraded_but_ready_container() {
    let mut cfg = ValidatorConfig::default();
    cfg.apply_remote_url("https://example.org/s.zarr");
    let env = FakeEnvironment {
        fetch: Some(200),
        ..FakeEnvironment::healthy()
            .without_driver("EOPFZARR")
            .without_package("jupyterlab")
            .offline()
    };

    let report = Validator::new(cfg).run(&env, &ValidationOptions::new("snapshot"));
    insta::assert_snapshot!("transcript", report.render());
}
